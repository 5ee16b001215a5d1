//! The well-scoped abstract syntax produced by scope checking.
//!
//! Every name is fully qualified and every bound-variable reference points at
//! a binder introduced by an enclosing lambda, Pi, or pattern in the same
//! scope-checking pass. This invariant holds by construction; nothing
//! re-validates it downstream.

use enum_as_inner::EnumAsInner;
use itertools::Itertools;
use tarn_heap::{Heap, ModuleReference, PStr};

/// A source identifier. The index disambiguates constructors/projections
/// sharing a textual name; names compare equal only on (text, index).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Name {
  pub text: PStr,
  pub index: u32,
}

impl Name {
  pub const DISCARD: Name = Name { text: PStr::UNDERSCORE, index: 0 };

  pub fn new(text: PStr) -> Name {
    Name { text, index: 0 }
  }

  pub fn pretty_print(&self, heap: &Heap) -> String {
    if self.index == 0 {
      self.text.as_str(heap).to_string()
    } else {
      format!("{}'{}", self.text.as_str(heap), self.index)
    }
  }
}

/// A name together with its enclosing module path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QualifiedName {
  pub module: ModuleReference,
  pub name: Name,
}

impl QualifiedName {
  pub fn pretty_print(&self, heap: &Heap) -> String {
    let module = self.module.pretty_print(heap);
    if module.is_empty() {
      self.name.pretty_print(heap)
    } else {
      format!("{}.{}", module, self.name.pretty_print(heap))
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumAsInner)]
pub enum ApplyHead {
  Variable(Name),
  Definition(QualifiedName),
  Constructor(QualifiedName),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Elimination {
  Apply(Expr),
}

#[derive(Debug, Clone, PartialEq, Eq, EnumAsInner)]
pub enum Expr {
  /// A head applied to zero or more eliminations.
  Apply(ApplyHead, Vec<Elimination>),
  /// The type of types.
  Type,
  /// A hole to be solved by unification.
  Meta,
  /// One bound name with its ascribed type (`Meta` when the binding was
  /// untyped) and the body.
  Lambda(Name, Box<Expr>, Box<Expr>),
  /// Dependent function type.
  Pi(Name, Box<Expr>, Box<Expr>),
  /// Non-dependent function type, produced by arrow rebinding.
  Function(Box<Expr>, Box<Expr>),
}

impl Expr {
  pub fn pretty_print(&self, heap: &Heap) -> String {
    match self {
      Expr::Apply(head, elims) => {
        let head_str = match head {
          ApplyHead::Variable(n) => n.pretty_print(heap),
          ApplyHead::Definition(qn) | ApplyHead::Constructor(qn) => qn.pretty_print(heap),
        };
        if elims.is_empty() {
          head_str
        } else {
          let args = elims
            .iter()
            .map(|Elimination::Apply(e)| {
              let printed = e.pretty_print(heap);
              if matches!(e, Expr::Apply(_, es) if es.is_empty())
                || matches!(e, Expr::Type | Expr::Meta)
              {
                printed
              } else {
                format!("({})", printed)
              }
            })
            .join(" ");
          format!("{} {}", head_str, args)
        }
      }
      Expr::Type => "Type".to_string(),
      Expr::Meta => "_".to_string(),
      Expr::Lambda(name, type_, body) => format!(
        "\\({} : {}) -> {}",
        name.pretty_print(heap),
        type_.pretty_print(heap),
        body.pretty_print(heap)
      ),
      Expr::Pi(name, domain, codomain) => format!(
        "({} : {}) -> {}",
        name.pretty_print(heap),
        domain.pretty_print(heap),
        codomain.pretty_print(heap)
      ),
      Expr::Function(domain, codomain) => {
        let dom = match domain.as_ref() {
          Expr::Pi(_, _, _) | Expr::Function(_, _) | Expr::Lambda(_, _, _) => {
            format!("({})", domain.pretty_print(heap))
          }
          _ => domain.pretty_print(heap),
        };
        format!("{} -> {}", dom, codomain.pretty_print(heap))
      }
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, EnumAsInner)]
pub enum DeclaredPattern {
  Wild,
  Variable(Name),
  Constructor(QualifiedName, Vec<DeclaredPattern>),
}

impl DeclaredPattern {
  pub fn pretty_print(&self, heap: &Heap) -> String {
    match self {
      DeclaredPattern::Wild => "_".to_string(),
      DeclaredPattern::Variable(n) => n.pretty_print(heap),
      DeclaredPattern::Constructor(qn, args) => {
        if args.is_empty() {
          qn.pretty_print(heap)
        } else {
          format!("({} {})", qn.pretty_print(heap), args.iter().map(|p| p.pretty_print(heap)).join(" "))
        }
      }
    }
  }
}

/// A named type ascription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSignature {
  pub name: Name,
  pub type_: Expr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredClause {
  pub patterns: Vec<DeclaredPattern>,
  pub body: Expr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredModule {
  pub module: ModuleReference,
  pub params: Vec<(Vec<Name>, Expr)>,
  pub decls: Vec<Decl>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decl {
  Module(DeclaredModule),
  /// A function's type signature. Always immediately followed by the
  /// matching `Function` declaration.
  Ascription(TypeSignature),
  DataSignature(TypeSignature),
  RecordSignature(TypeSignature),
  /// Data name, index parameter names in source order, constructor
  /// signatures.
  Data(Name, Vec<Name>, Vec<TypeSignature>),
  Record {
    name: Name,
    fields: Vec<Name>,
    constructor: Name,
    field_signatures: Vec<TypeSignature>,
  },
  Function(Name, Vec<DeclaredClause>),
}

impl Decl {
  pub fn as_module(&self) -> Option<&DeclaredModule> {
    match self {
      Decl::Module(m) => Some(m),
      _ => None,
    }
  }

  pub fn as_ascription(&self) -> Option<&TypeSignature> {
    match self {
      Decl::Ascription(sig) => Some(sig),
      _ => None,
    }
  }

  pub fn as_data(&self) -> Option<(&Name, &Vec<Name>, &Vec<TypeSignature>)> {
    match self {
      Decl::Data(name, params, constructors) => Some((name, params, constructors)),
      _ => None,
    }
  }

  pub fn as_function(&self) -> Option<(&Name, &Vec<DeclaredClause>)> {
    match self {
      Decl::Function(name, clauses) => Some((name, clauses)),
      _ => None,
    }
  }

  pub fn pretty_print(&self, heap: &Heap) -> String {
    match self {
      Decl::Module(m) => format!("module {}", m.module.pretty_print(heap)),
      Decl::Ascription(sig) => {
        format!("{} : {}", sig.name.pretty_print(heap), sig.type_.pretty_print(heap))
      }
      Decl::DataSignature(sig) => {
        format!("data {} : {}", sig.name.pretty_print(heap), sig.type_.pretty_print(heap))
      }
      Decl::RecordSignature(sig) => {
        format!("record {} : {}", sig.name.pretty_print(heap), sig.type_.pretty_print(heap))
      }
      Decl::Data(name, params, constructors) => format!(
        "data {} [{}] where {}",
        name.pretty_print(heap),
        params.iter().map(|n| n.pretty_print(heap)).join(", "),
        constructors
          .iter()
          .map(|c| format!("{} : {}", c.name.pretty_print(heap), c.type_.pretty_print(heap)))
          .join("; ")
      ),
      Decl::Record { name, fields, constructor, field_signatures } => format!(
        "record {} [{}] constructor {} where {}",
        name.pretty_print(heap),
        fields.iter().map(|n| n.pretty_print(heap)).join(", "),
        constructor.pretty_print(heap),
        field_signatures
          .iter()
          .map(|f| format!("{} : {}", f.name.pretty_print(heap), f.type_.pretty_print(heap)))
          .join("; ")
      ),
      Decl::Function(name, clauses) => format!(
        "{} {}",
        name.pretty_print(heap),
        clauses
          .iter()
          .map(|c| {
            format!(
              "| {} = {}",
              c.patterns.iter().map(|p| p.pretty_print(heap)).join(" "),
              c.body.pretty_print(heap)
            )
          })
          .join(" ")
      ),
    }
  }
}
