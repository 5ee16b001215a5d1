//! The diagnostic sink consulted by every front-end pass.
//!
//! Reporting is append-only and never fatal: a pass diagnoses, applies its
//! local recovery, and keeps going. Callers must therefore check the sink
//! before trusting a pass's output.

use itertools::Itertools;
use std::collections::HashMap;
use tarn_ast::Location;
use tarn_heap::{Heap, ModuleReference, PStr};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorDetail {
  BodyBeforeSignature { name: PStr },
  CannotResolveName { name: PStr },
  DuplicatePatternVariable { name: PStr },
  NameAlreadyBound { name: PStr, old_loc: Location },
  RecordMissingConstructor { name: PStr },
}

impl ErrorDetail {
  fn pretty_print(&self, heap: &Heap) -> String {
    match self {
      ErrorDetail::BodyBeforeSignature { name } => {
        format!("Function body for `{}` appears before its type signature.", name.as_str(heap))
      }
      ErrorDetail::CannotResolveName { name } => {
        format!("Cannot resolve name `{}`.", name.as_str(heap))
      }
      ErrorDetail::DuplicatePatternVariable { name } => {
        format!("Pattern variable `{}` is already bound.", name.as_str(heap))
      }
      ErrorDetail::NameAlreadyBound { name, old_loc } => format!(
        "Name `{}` collides with a previously defined name at {}.",
        name.as_str(heap),
        old_loc.pretty_print_without_file()
      ),
      ErrorDetail::RecordMissingConstructor { name } => {
        format!("Record `{}` has no constructor declaration.", name.as_str(heap))
      }
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CompileTimeError {
  pub location: Location,
  pub detail: ErrorDetail,
}

impl CompileTimeError {
  pub fn pretty_print(&self, heap: &Heap) -> String {
    format!("{}: {}", self.location.pretty_print(heap), self.detail.pretty_print(heap))
  }
}

pub struct ErrorSet {
  errors: Vec<CompileTimeError>,
}

impl Default for ErrorSet {
  fn default() -> Self {
    Self::new()
  }
}

impl ErrorSet {
  pub fn new() -> ErrorSet {
    ErrorSet { errors: Vec::new() }
  }

  pub fn has_errors(&self) -> bool {
    !self.errors.is_empty()
  }

  /// All reported errors, in reporting order.
  pub fn errors(&self) -> &Vec<CompileTimeError> {
    &self.errors
  }

  pub fn group_errors(self) -> HashMap<ModuleReference, Vec<CompileTimeError>> {
    let mut grouped: HashMap<ModuleReference, Vec<CompileTimeError>> = HashMap::new();
    for e in self.errors {
      grouped.entry(e.location.module_reference).or_default().push(e);
    }
    grouped
  }

  pub fn pretty_print_error_messages(&self, heap: &Heap) -> String {
    self
      .errors
      .iter()
      .sorted_by(|e1, e2| e1.location.cmp(&e2.location).then_with(|| e1.detail.cmp(&e2.detail)))
      .map(|e| e.pretty_print(heap))
      .join("\n")
  }

  fn report_error(&mut self, location: Location, detail: ErrorDetail) {
    self.errors.push(CompileTimeError { location, detail });
  }

  pub fn report_body_before_signature_error(&mut self, loc: Location, name: PStr) {
    self.report_error(loc, ErrorDetail::BodyBeforeSignature { name })
  }

  pub fn report_cannot_resolve_name_error(&mut self, loc: Location, name: PStr) {
    self.report_error(loc, ErrorDetail::CannotResolveName { name })
  }

  pub fn report_duplicate_pattern_variable_error(&mut self, loc: Location, name: PStr) {
    self.report_error(loc, ErrorDetail::DuplicatePatternVariable { name })
  }

  pub fn report_name_already_bound_error(&mut self, loc: Location, name: PStr, old_loc: Location) {
    self.report_error(loc, ErrorDetail::NameAlreadyBound { name, old_loc })
  }

  pub fn report_record_missing_constructor_error(&mut self, loc: Location, name: PStr) {
    self.report_error(loc, ErrorDetail::RecordMissingConstructor { name })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn message_tests() {
    let mut heap = Heap::new();
    let foo = heap.alloc_str("foo");
    let mut error_set = ErrorSet::new();
    assert!(!error_set.has_errors());

    error_set.report_cannot_resolve_name_error(Location::from_pos(0, 0, 0, 3), foo);
    error_set.report_name_already_bound_error(
      Location::from_pos(2, 0, 2, 3),
      foo,
      Location::from_pos(0, 0, 0, 3),
    );
    error_set.report_body_before_signature_error(Location::from_pos(3, 0, 3, 3), foo);
    error_set.report_duplicate_pattern_variable_error(Location::from_pos(4, 0, 4, 3), foo);
    error_set.report_record_missing_constructor_error(Location::from_pos(5, 0, 5, 3), foo);

    assert!(error_set.has_errors());
    assert_eq!(5, error_set.errors().len());
    assert_eq!(
      r#"DUMMY.tarn:1:1-1:4: Cannot resolve name `foo`.
DUMMY.tarn:3:1-3:4: Name `foo` collides with a previously defined name at 1:1-1:4.
DUMMY.tarn:4:1-4:4: Function body for `foo` appears before its type signature.
DUMMY.tarn:5:1-5:4: Pattern variable `foo` is already bound.
DUMMY.tarn:6:1-6:4: Record `foo` has no constructor declaration."#,
      error_set.pretty_print_error_messages(&heap)
    );
  }

  #[test]
  fn grouping_test() {
    let mut heap = Heap::new();
    let foo = heap.alloc_str("foo");
    let mut error_set = ErrorSet::default();
    error_set.report_cannot_resolve_name_error(Location::dummy(), foo);
    error_set.report_cannot_resolve_name_error(Location::dummy(), foo);
    let grouped = error_set.group_errors();
    assert_eq!(1, grouped.len());
    assert_eq!(2, grouped.get(&ModuleReference::DUMMY).unwrap().len());
  }
}
