//! The signature: every metavariable and every contextual definition known
//! to one type checker. The store grows monotonically over a compilation —
//! metavariables may acquire solutions, but entries never disappear.

use super::term::{Meta, Opened, Telescope, Term};
use enum_as_inner::EnumAsInner;
use std::collections::HashMap;
use tarn_ast::abt::QualifiedName;
use tarn_ast::Location;

/// How a function definition computes. `Open` functions have not had their
/// clauses elaborated yet; `Invertible` functions unfold definitionally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FunctionInstantiation {
  Open,
  Invertible(Term),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constant {
  Postulate,
  /// Constructor names, in declaration order.
  Data(Vec<QualifiedName>),
  Record { constructor: QualifiedName, projections: Vec<QualifiedName> },
  Function(FunctionInstantiation),
}

/// A type abstracted over a telescope of binders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextualType {
  pub telescope: Telescope<Term>,
  pub inside: Term,
}

#[derive(Debug, Clone, PartialEq, Eq, EnumAsInner)]
pub enum Definition {
  Constant(Term, Constant),
  /// Owning data type, number of constructor arguments, and the
  /// constructor's remaining contextual type.
  DataConstructor(QualifiedName, usize, ContextualType),
  /// Member names of a child module.
  Module(Vec<QualifiedName>),
}

/// A definition abstracted over its parameterized module's telescope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextualDefinition {
  pub telescope: Telescope<Term>,
  pub inside: Definition,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenedConstant {
  Postulate,
  Data(Vec<Opened<QualifiedName>>),
  Record { constructor: Opened<QualifiedName>, projections: Vec<Opened<QualifiedName>> },
  Function(FunctionInstantiation),
}

/// A definition specialized with the arguments it was opened with.
#[derive(Debug, Clone, PartialEq, Eq, EnumAsInner)]
pub enum OpenedDefinition {
  Constant(Term, OpenedConstant),
  DataConstructor(Opened<QualifiedName>, usize, ContextualType),
  Module(Vec<QualifiedName>),
}

#[derive(Debug)]
struct MetaEntry {
  type_: Term,
  /// Source location of the syntax this metavariable stands in for. A
  /// back-reference for diagnostics only, never an ownership edge.
  origin: Option<Location>,
  binding: Option<Term>,
}

pub struct Signature {
  metas: Vec<MetaEntry>,
  definitions: HashMap<QualifiedName, ContextualDefinition>,
}

impl Default for Signature {
  fn default() -> Self {
    Self::new()
  }
}

impl Signature {
  pub fn new() -> Signature {
    Signature { metas: Vec::new(), definitions: HashMap::new() }
  }

  pub fn add_meta(&mut self, type_: Term, origin: Option<Location>) -> Meta {
    let mv = Meta(self.metas.len() as u32);
    self.metas.push(MetaEntry { type_, origin, binding: None });
    mv
  }

  pub fn meta_count(&self) -> usize {
    self.metas.len()
  }

  pub fn meta_type(&self, mv: Meta) -> &Term {
    &self.metas[mv.0 as usize].type_
  }

  pub fn meta_origin(&self, mv: Meta) -> Option<Location> {
    self.metas[mv.0 as usize].origin
  }

  pub fn meta_binding(&self, mv: Meta) -> Option<&Term> {
    self.metas[mv.0 as usize].binding.as_ref()
  }

  /// Install a solution for a metavariable. Solving the same metavariable
  /// twice is a checker bug.
  pub fn instantiate_meta(&mut self, mv: Meta, binding: Term) {
    let entry = &mut self.metas[mv.0 as usize];
    assert!(entry.binding.is_none(), "metavariable solved twice");
    entry.binding = Some(binding);
  }

  pub fn add_definition(&mut self, name: QualifiedName, definition: ContextualDefinition) {
    self.definitions.insert(name, definition);
  }

  pub fn lookup_definition(&self, name: &QualifiedName) -> Option<&ContextualDefinition> {
    self.definitions.get(name)
  }
}
