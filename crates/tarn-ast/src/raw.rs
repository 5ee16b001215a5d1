//! The parsed-but-unresolved syntax tree.
//!
//! The parser produces this tree; the scope checker consumes it. The node
//! inventory is closed: every shape the parser can emit has a variant here,
//! and the scope checker matches exhaustively over it. `ReparsedApplication`
//! and `ReparsedFunction` never come out of the parser; they are introduced
//! by arrow rebinding and by the declaration reparser respectively.

use super::loc::Location;
use enum_as_inner::EnumAsInner;
use tarn_heap::PStr;

/// A raw identifier token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ident {
  pub loc: Location,
  pub name: PStr,
}

/// A possibly-dotted name as written in source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedIdent {
  pub loc: Location,
  pub parts: Vec<Ident>,
}

impl QualifiedIdent {
  pub fn single(id: Ident) -> QualifiedIdent {
    QualifiedIdent { loc: id.loc, parts: vec![id] }
  }

  /// The final component, which names the entity itself.
  pub fn last(&self) -> &Ident {
    self.parts.last().expect("qualified identifiers have at least one part")
  }
}

/// `a b c : T` — names ascribed with one shared type expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ascription {
  pub loc: Location,
  pub bound_names: Vec<Ident>,
  pub type_expr: ExprSyntax,
}

/// A parenthesized `(a b : T)` parameter group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedParameter {
  pub loc: Location,
  pub ascription: Ascription,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
  Named(Ident),
  Typed(TypedParameter),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LambdaExpr {
  pub loc: Location,
  pub bindings: Vec<Binding>,
  pub body: Box<ExprSyntax>,
}

/// `forall (a : T) (b : U) -> body`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantifiedExpr {
  pub loc: Location,
  pub bindings: Vec<TypedParameter>,
  pub output: Box<ExprSyntax>,
}

#[derive(Debug, Clone, PartialEq, Eq, EnumAsInner)]
pub enum ExprSyntax {
  Named(QualifiedIdent),
  Type(Location),
  Underscore(Location),
  Parenthesized(Location, Box<ExprSyntax>),
  Lambda(LambdaExpr),
  /// Juxtaposed expressions, before any operator handling.
  Application(Location, Vec<ExprSyntax>),
  /// An application whose arrows have already been rebound.
  ReparsedApplication(Location, Vec<ExprSyntax>),
  Quantified(QuantifiedExpr),
  TypedParameterGroup(Location, Vec<TypedParameter>),
}

impl ExprSyntax {
  pub fn loc(&self) -> Location {
    match self {
      ExprSyntax::Named(n) => n.loc,
      ExprSyntax::Type(loc) | ExprSyntax::Underscore(loc) => *loc,
      ExprSyntax::Parenthesized(loc, _) => *loc,
      ExprSyntax::Lambda(l) => l.loc,
      ExprSyntax::Application(loc, _) | ExprSyntax::ReparsedApplication(loc, _) => *loc,
      ExprSyntax::Quantified(q) => q.loc,
      ExprSyntax::TypedParameterGroup(loc, _) => *loc,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDecl {
  pub loc: Location,
  pub name: QualifiedIdent,
  pub params: Vec<TypedParameter>,
  pub decls: Vec<DeclSyntax>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructorDecl {
  pub loc: Location,
  pub ascription: Ascription,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataDecl {
  pub loc: Location,
  pub name: Ident,
  pub params: Vec<TypedParameter>,
  /// The type-index expression after the colon, e.g. the `Type` in
  /// `data Nat : Type where ...`.
  pub indices: ExprSyntax,
  pub constructors: Vec<ConstructorDecl>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
  pub loc: Location,
  pub ascription: Ascription,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordConstructorDecl {
  pub loc: Location,
  pub name: Ident,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordElement {
  Field(FieldDecl),
  Constructor(RecordConstructorDecl),
  /// An associated declaration nested inside the record body.
  Decl(DeclSyntax),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDecl {
  pub loc: Location,
  pub name: Ident,
  pub params: Vec<TypedParameter>,
  pub indices: Option<ExprSyntax>,
  pub elements: Vec<RecordElement>,
}

/// A bare type signature `f : T`, its clauses not yet attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDecl {
  pub loc: Location,
  pub ascription: Ascription,
}

/// `f p1 p2 = rhs`. The left-hand side starts with the function name token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionClause {
  pub loc: Location,
  pub lhs: Vec<ExprSyntax>,
  pub rhs: ExprSyntax,
}

/// A function signature regrouped with all of its clauses, in source order.
/// Only the declaration reparser produces this node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReparsedFunctionDecl {
  pub loc: Location,
  pub ascription: Ascription,
  pub clauses: Vec<FunctionClause>,
}

#[derive(Debug, Clone, PartialEq, Eq, EnumAsInner)]
pub enum DeclSyntax {
  Module(ModuleDecl),
  Data(DataDecl),
  Record(RecordDecl),
  Function(FunctionDecl),
  FunctionClause(FunctionClause),
  ReparsedFunction(ReparsedFunctionDecl),
}

impl DeclSyntax {
  pub fn loc(&self) -> Location {
    match self {
      DeclSyntax::Module(d) => d.loc,
      DeclSyntax::Data(d) => d.loc,
      DeclSyntax::Record(d) => d.loc,
      DeclSyntax::Function(d) => d.loc,
      DeclSyntax::FunctionClause(d) => d.loc,
      DeclSyntax::ReparsedFunction(d) => d.loc,
    }
  }
}

pub mod test_builder {
  use super::*;

  pub fn ident(name: PStr) -> Ident {
    Ident { loc: Location::dummy(), name }
  }

  pub fn name_expr(name: PStr) -> ExprSyntax {
    ExprSyntax::Named(QualifiedIdent::single(ident(name)))
  }

  pub fn dotted_name_expr(parts: Vec<PStr>) -> ExprSyntax {
    ExprSyntax::Named(QualifiedIdent {
      loc: Location::dummy(),
      parts: parts.into_iter().map(ident).collect(),
    })
  }

  pub fn type_expr() -> ExprSyntax {
    ExprSyntax::Type(Location::dummy())
  }

  pub fn underscore_expr() -> ExprSyntax {
    ExprSyntax::Underscore(Location::dummy())
  }

  pub fn paren_expr(inner: ExprSyntax) -> ExprSyntax {
    ExprSyntax::Parenthesized(Location::dummy(), Box::new(inner))
  }

  pub fn app_expr(exprs: Vec<ExprSyntax>) -> ExprSyntax {
    ExprSyntax::Application(Location::dummy(), exprs)
  }

  /// An infix arrow juxtaposition, as the parser would produce it.
  pub fn arrow_expr(left: ExprSyntax, right: ExprSyntax) -> ExprSyntax {
    app_expr(vec![left, name_expr(PStr::ARROW), right])
  }

  pub fn lambda_expr(bindings: Vec<Binding>, body: ExprSyntax) -> ExprSyntax {
    ExprSyntax::Lambda(LambdaExpr { loc: Location::dummy(), bindings, body: Box::new(body) })
  }

  pub fn quantified_expr(bindings: Vec<TypedParameter>, output: ExprSyntax) -> ExprSyntax {
    ExprSyntax::Quantified(QuantifiedExpr {
      loc: Location::dummy(),
      bindings,
      output: Box::new(output),
    })
  }

  pub fn ascription(bound_names: Vec<PStr>, type_expr: ExprSyntax) -> Ascription {
    Ascription {
      loc: Location::dummy(),
      bound_names: bound_names.into_iter().map(ident).collect(),
      type_expr,
    }
  }

  pub fn typed_parameter(bound_names: Vec<PStr>, type_expr: ExprSyntax) -> TypedParameter {
    TypedParameter { loc: Location::dummy(), ascription: ascription(bound_names, type_expr) }
  }

  pub fn function_decl(name: PStr, type_expr: ExprSyntax) -> DeclSyntax {
    DeclSyntax::Function(FunctionDecl {
      loc: Location::dummy(),
      ascription: ascription(vec![name], type_expr),
    })
  }

  pub fn clause(name: PStr, patterns: Vec<ExprSyntax>, rhs: ExprSyntax) -> DeclSyntax {
    let mut lhs = vec![name_expr(name)];
    lhs.extend(patterns);
    DeclSyntax::FunctionClause(FunctionClause { loc: Location::dummy(), lhs, rhs })
  }

  pub fn data_decl(
    name: PStr,
    params: Vec<TypedParameter>,
    indices: ExprSyntax,
    constructors: Vec<(Vec<PStr>, ExprSyntax)>,
  ) -> DeclSyntax {
    DeclSyntax::Data(DataDecl {
      loc: Location::dummy(),
      name: ident(name),
      params,
      indices,
      constructors: constructors
        .into_iter()
        .map(|(names, type_expr)| ConstructorDecl {
          loc: Location::dummy(),
          ascription: ascription(names, type_expr),
        })
        .collect(),
    })
  }

  pub fn module_decl(name: PStr, params: Vec<TypedParameter>, decls: Vec<DeclSyntax>) -> ModuleDecl {
    ModuleDecl {
      loc: Location::dummy(),
      name: QualifiedIdent::single(ident(name)),
      params,
      decls,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use tarn_heap::Heap;

  #[test]
  fn boilerplate() {
    let mut heap = Heap::new();
    let foo = heap.alloc_str("foo");
    let e = test_builder::app_expr(vec![
      test_builder::name_expr(foo),
      test_builder::type_expr(),
      test_builder::underscore_expr(),
      test_builder::paren_expr(test_builder::name_expr(foo)),
    ]);
    assert_eq!(Location::dummy(), e.loc());
    assert!(e.as_application().is_some());
    assert!(!format!("{:?}", e.clone()).is_empty());

    let lambda = test_builder::lambda_expr(
      vec![Binding::Named(test_builder::ident(foo))],
      test_builder::name_expr(foo),
    );
    assert_eq!(Location::dummy(), lambda.loc());
    let quantified =
      test_builder::quantified_expr(vec![], test_builder::name_expr(foo));
    assert_eq!(Location::dummy(), quantified.loc());
    assert_eq!(
      Location::dummy(),
      ExprSyntax::ReparsedApplication(Location::dummy(), vec![]).loc()
    );
    assert_eq!(Location::dummy(), ExprSyntax::TypedParameterGroup(Location::dummy(), vec![]).loc());
  }

  #[test]
  fn decl_loc_test() {
    let mut heap = Heap::new();
    let f = heap.alloc_str("f");
    let decls = vec![
      test_builder::function_decl(f, test_builder::type_expr()),
      test_builder::clause(f, vec![], test_builder::name_expr(f)),
      DeclSyntax::Module(test_builder::module_decl(f, vec![], vec![])),
      test_builder::data_decl(f, vec![], test_builder::type_expr(), vec![]),
      DeclSyntax::Record(RecordDecl {
        loc: Location::dummy(),
        name: test_builder::ident(f),
        params: vec![],
        indices: None,
        elements: vec![],
      }),
      DeclSyntax::ReparsedFunction(ReparsedFunctionDecl {
        loc: Location::dummy(),
        ascription: test_builder::ascription(vec![f], test_builder::type_expr()),
        clauses: vec![],
      }),
    ];
    for d in decls {
      assert_eq!(Location::dummy(), d.loc());
    }
  }
}
