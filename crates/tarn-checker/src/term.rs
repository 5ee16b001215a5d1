//! The type theory's term language.
//!
//! Terms use de Bruijn indices: the innermost binder is index 0, and `Pi`
//! and `Lambda` bodies are one binder deeper than their surroundings. `Var`
//! keeps the surface name purely for display.

use enum_as_inner::EnumAsInner;
use tarn_ast::abt::{Name, QualifiedName};

/// An ordered sequence of named types; later entries may depend on earlier
/// binders.
pub type Telescope<T> = Vec<(Name, T)>;

/// The ambient typing context, outermost binder first.
pub type Context = Telescope<Term>;

/// A metavariable id, unique within one signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Meta(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Var {
  pub name: Name,
  pub index: u32,
}

/// A definition-shaped value paired with the arguments its parameterized
/// module was opened with. Meaningful only after those arguments are
/// substituted in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opened<T> {
  pub key: T,
  pub args: Vec<Term>,
}

impl<T> Opened<T> {
  pub fn new(key: T, args: Vec<Term>) -> Opened<T> {
    Opened { key, args }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, EnumAsInner)]
pub enum Head {
  Variable(Var),
  Definition(Opened<QualifiedName>),
  Meta(Meta),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Elim {
  Apply(Term),
}

#[derive(Debug, Clone, PartialEq, Eq, EnumAsInner)]
pub enum Term {
  /// The type of types.
  Type,
  /// Dependent function type; the codomain is under one more binder.
  Pi(Box<Term>, Box<Term>),
  Lambda(Box<Term>),
  Apply(Head, Vec<Elim>),
}

impl Term {
  pub fn var(name: Name, index: u32) -> Term {
    Term::Apply(Head::Variable(Var { name, index }), Vec::new())
  }

  pub fn meta(mv: Meta) -> Term {
    Term::Apply(Head::Meta(mv), Vec::new())
  }

  pub fn pi(domain: Term, codomain: Term) -> Term {
    Term::Pi(Box::new(domain), Box::new(codomain))
  }

  pub fn lambda(body: Term) -> Term {
    Term::Lambda(Box::new(body))
  }

  pub fn definition(name: QualifiedName, args: Vec<Term>) -> Term {
    Term::Apply(Head::Definition(Opened::new(name, args)), Vec::new())
  }
}
