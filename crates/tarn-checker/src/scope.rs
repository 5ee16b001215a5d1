//! The lexical scope table used by scope checking.
//!
//! Frames nest with the source's binding regions. Each frame owns a pending
//! variable context plus registries for the definitions, constructors, and
//! projections declared in it; a separate table records every fully
//! qualified name ever bound, for exact-path lookups.

use phf::phf_set;
use std::collections::HashMap;
use tarn_ast::abt::{Name, QualifiedName};
use tarn_ast::Location;
use tarn_errors::ErrorSet;
use tarn_heap::{Heap, ModuleReference, PStr};

/// Identifier texts that can never be bound.
static RESERVED_NAMES: phf::Set<&'static str> = phf_set! {
  "_", "->", "Type", "data", "import", "in", "let", "module", "open", "record", "where",
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameInfo {
  Definition { args: usize },
  Constructor { args: usize },
  Projection { args: usize },
}

impl NameInfo {
  pub fn is_definition(&self) -> bool {
    matches!(self, NameInfo::Definition { .. })
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BindError {
  /// The text is reserved; nothing was diagnosed or mutated.
  Reserved,
  /// The text is already taken in scope; carries the original binding site.
  Duplicate(Location),
}

struct Scope {
  module: ModuleReference,
  variables: Vec<(Name, Location)>,
  definitions: HashMap<PStr, (Name, usize, Location)>,
  constructors: HashMap<PStr, Vec<(Name, usize, Location)>>,
  projections: HashMap<PStr, Vec<(Name, usize, Location)>>,
}

impl Scope {
  fn new(module: ModuleReference) -> Scope {
    Scope {
      module,
      variables: Vec::new(),
      definitions: HashMap::new(),
      constructors: HashMap::new(),
      projections: HashMap::new(),
    }
  }
}

pub(crate) struct NameBinding<'a> {
  pub(crate) heap: &'a mut Heap,
  pub(crate) error_set: &'a mut ErrorSet,
  scopes: Vec<Scope>,
  fully_qualified: HashMap<QualifiedName, NameInfo>,
}

impl<'a> NameBinding<'a> {
  pub(crate) fn new(
    heap: &'a mut Heap,
    error_set: &'a mut ErrorSet,
    module: ModuleReference,
  ) -> NameBinding<'a> {
    NameBinding { heap, error_set, scopes: vec![Scope::new(module)], fully_qualified: HashMap::new() }
  }

  pub(crate) fn active_module(&self) -> ModuleReference {
    self.scopes.last().expect("the root scope is never popped").module
  }

  pub(crate) fn qualify(&self, name: Name) -> QualifiedName {
    QualifiedName { module: self.active_module(), name }
  }

  pub(crate) fn is_bound_variable(&self, text: PStr) -> bool {
    self.scopes.iter().rev().any(|s| s.variables.iter().any(|(n, _)| n.text == text))
  }

  pub(crate) fn bound_variable_location(&self, text: PStr) -> Option<Location> {
    self
      .scopes
      .iter()
      .rev()
      .find_map(|s| s.variables.iter().rev().find(|(n, _)| n.text == text).map(|(_, loc)| *loc))
  }

  fn is_reserved(&self, text: PStr) -> bool {
    RESERVED_NAMES.contains(text.as_str(self.heap))
  }

  /// Append a variable to the current frame's pending context. Reserved
  /// texts are rejected without mutation. Shadowing checks are the caller's
  /// responsibility, via `is_bound_variable`.
  pub(crate) fn bind_variable(&mut self, text: PStr, loc: Location) -> Option<Name> {
    if self.is_reserved(text) {
      return None;
    }
    let name = Name::new(text);
    self.scopes.last_mut().unwrap().variables.push((name, loc));
    Some(name)
  }

  pub(crate) fn bind_definition(
    &mut self,
    text: PStr,
    args: usize,
    loc: Location,
  ) -> Result<Name, BindError> {
    if self.is_reserved(text) {
      return Err(BindError::Reserved);
    }
    let scope = self.scopes.last_mut().unwrap();
    if let Some((_, _, old_loc)) = scope.definitions.get(&text) {
      return Err(BindError::Duplicate(*old_loc));
    }
    let name = Name::new(text);
    scope.definitions.insert(text, (name, args, loc));
    let module = scope.module;
    self.fully_qualified.insert(QualifiedName { module, name }, NameInfo::Definition { args });
    Ok(name)
  }

  pub(crate) fn bind_constructor(
    &mut self,
    text: PStr,
    args: usize,
    loc: Location,
  ) -> Result<Name, BindError> {
    self.bind_overloadable(text, args, loc, false)
  }

  pub(crate) fn bind_projection(
    &mut self,
    text: PStr,
    args: usize,
    loc: Location,
  ) -> Result<Name, BindError> {
    self.bind_overloadable(text, args, loc, true)
  }

  /// Constructors and projections may share a textual name at different
  /// arities; the next disambiguation index is assigned by counting every
  /// same-text entry visible in scope. An exact (text, arity) duplicate is
  /// rejected with its original location.
  fn bind_overloadable(
    &mut self,
    text: PStr,
    args: usize,
    loc: Location,
    projection: bool,
  ) -> Result<Name, BindError> {
    if self.is_reserved(text) {
      return Err(BindError::Reserved);
    }
    let mut index = 0u32;
    for scope in self.scopes.iter().rev() {
      let registry = if projection { &scope.projections } else { &scope.constructors };
      if let Some(entries) = registry.get(&text) {
        if let Some((_, _, old_loc)) = entries.iter().find(|(_, a, _)| *a == args) {
          return Err(BindError::Duplicate(*old_loc));
        }
        index += entries.len() as u32;
      }
    }
    let name = Name { text, index };
    let scope = self.scopes.last_mut().unwrap();
    let registry = if projection { &mut scope.projections } else { &mut scope.constructors };
    registry.entry(text).or_default().push((name, args, loc));
    let module = scope.module;
    let info =
      if projection { NameInfo::Projection { args } } else { NameInfo::Constructor { args } };
    self.fully_qualified.insert(QualifiedName { module, name }, info);
    Ok(name)
  }

  /// Innermost-first search through the frame stack. The result is
  /// qualified by the owning frame's module path.
  pub(crate) fn lookup_local_name(&self, text: PStr) -> Option<(QualifiedName, NameInfo)> {
    for scope in self.scopes.iter().rev() {
      if let Some((name, args, _)) = scope.definitions.get(&text) {
        return Some((
          QualifiedName { module: scope.module, name: *name },
          NameInfo::Definition { args: *args },
        ));
      }
      if let Some((name, args, _)) = scope.constructors.get(&text).and_then(|es| es.last()) {
        return Some((
          QualifiedName { module: scope.module, name: *name },
          NameInfo::Constructor { args: *args },
        ));
      }
      if let Some((name, args, _)) = scope.projections.get(&text).and_then(|es| es.last()) {
        return Some((
          QualifiedName { module: scope.module, name: *name },
          NameInfo::Projection { args: *args },
        ));
      }
    }
    None
  }

  /// Exact path match; no scope walk.
  pub(crate) fn lookup_fully_qualified_name(&self, name: &QualifiedName) -> Option<NameInfo> {
    self.fully_qualified.get(name).copied()
  }

  /// Run `f` in a fresh frame under the same module path. The frame stack
  /// is restored on every exit path.
  pub(crate) fn under_scope<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
    let module = self.active_module();
    self.under_module_scope(module, f)
  }

  pub(crate) fn under_module_scope<T>(
    &mut self,
    module: ModuleReference,
    f: impl FnOnce(&mut Self) -> T,
  ) -> T {
    let depth = self.scopes.len();
    self.scopes.push(Scope::new(module));
    let result = f(self);
    self.scopes.truncate(depth);
    result
  }
}
