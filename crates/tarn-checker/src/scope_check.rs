//! Scope checking: lowers the raw syntax tree to the well-scoped abstract
//! syntax, qualifying every non-local name.
//!
//! When the checker detects an inconsistency it diagnoses the offending term
//! and usually drops it, but not before binding its names into scope to aid
//! recovery. The pass itself never fails, so the diagnostic sink must be
//! checked before any semantic pass runs on the output.

use super::reparse;
use super::scope::{BindError, NameBinding};
use tarn_ast::{abt, raw, Location};
use tarn_errors::ErrorSet;
use tarn_heap::{Heap, ModuleReference, PStr};

/// Scope check a whole module, the entry point of the pass.
pub fn scope_check_module(
  module: &raw::ModuleDecl,
  heap: &mut Heap,
  error_set: &mut ErrorSet,
) -> abt::DeclaredModule {
  let mut binder = NameBinding::new(heap, error_set, ModuleReference::ROOT);
  binder.scope_check_module_decl(module).unwrap_or(abt::DeclaredModule {
    module: ModuleReference::ROOT,
    params: Vec::new(),
    decls: Vec::new(),
  })
}

impl<'a> NameBinding<'a> {
  fn scope_check_module_decl(&mut self, syntax: &raw::ModuleDecl) -> Option<abt::DeclaredModule> {
    let name_id = syntax.name.last();
    match self.bind_definition(name_id.name, 0, name_id.loc) {
      Ok(_) => {}
      Err(BindError::Duplicate(old_loc)) => {
        self.error_set.report_name_already_bound_error(name_id.loc, name_id.name, old_loc);
        return None;
      }
      Err(BindError::Reserved) => return None,
    }
    let mut module = self.active_module();
    for part in &syntax.name.parts {
      module = self.heap.alloc_child_module_reference(module, part.name);
    }
    Some(self.under_module_scope(module, |s| {
      let params: Vec<_> = syntax.params.iter().map(|p| s.scope_check_parameter(p)).collect();
      let regrouped = reparse::reparse_decls(syntax.decls.clone(), s.error_set);
      let decls = regrouped.iter().flat_map(|d| s.scope_check_decl(d)).collect();
      abt::DeclaredModule { module, params, decls }
    }))
  }

  /// Scope check a declaration that may be found directly under a module.
  /// Loose function declarations must have been regrouped by the reparser.
  fn scope_check_decl(&mut self, syntax: &raw::DeclSyntax) -> Vec<abt::Decl> {
    match syntax {
      raw::DeclSyntax::Module(m) => {
        self.scope_check_module_decl(m).map(abt::Decl::Module).into_iter().collect()
      }
      raw::DeclSyntax::Data(d) => self.scope_check_data_decl(d),
      raw::DeclSyntax::Record(r) => self.scope_check_record_decl(r),
      raw::DeclSyntax::ReparsedFunction(f) => self.scope_check_function_decl(f),
      raw::DeclSyntax::Function(_) | raw::DeclSyntax::FunctionClause(_) => {
        panic!("function declarations must be regrouped by the reparser before scope checking")
      }
    }
  }

  fn scope_check_expr(&mut self, syntax: &raw::ExprSyntax) -> abt::Expr {
    match syntax {
      raw::ExprSyntax::Named(n) => abt::Expr::Apply(self.resolve_head(n), Vec::new()),
      raw::ExprSyntax::Type(_) => abt::Expr::Type,
      raw::ExprSyntax::Underscore(_) => abt::Expr::Meta,
      raw::ExprSyntax::Parenthesized(_, inner) => self.scope_check_expr(inner),
      raw::ExprSyntax::Lambda(lambda) => self.under_scope(|s| {
        let bindings = s.scope_check_binding_list(&lambda.bindings);
        let rebound_body = rebind_arrows(&lambda.body);
        let body = s.scope_check_expr(&rebound_body);
        bindings.into_iter().rev().fold(body, |acc, (names, type_)| {
          names.into_iter().rev().fold(acc, |acc, name| {
            abt::Expr::Lambda(name, Box::new(type_.clone()), Box::new(acc))
          })
        })
      }),
      raw::ExprSyntax::Application(_, exprs) | raw::ExprSyntax::ReparsedApplication(_, exprs) => {
        assert!(!exprs.is_empty(), "an application contains at least one expression");
        if exprs.len() == 1 {
          return self.scope_check_expr(&exprs[0]);
        }
        let raw::ExprSyntax::Named(head_name) = &exprs[0] else {
          panic!("cannot scope check an application headed by a non-name expression")
        };
        if head_name.parts.len() == 1 && head_name.parts[0].name == PStr::ARROW {
          assert!(exprs.len() == 3, "the function arrow connects exactly two expressions");
          return abt::Expr::Function(
            Box::new(self.scope_check_expr(&exprs[1])),
            Box::new(self.scope_check_expr(&exprs[2])),
          );
        }
        let args = exprs[1..]
          .iter()
          .map(|e| abt::Elimination::Apply(self.scope_check_expr(e)))
          .collect();
        abt::Expr::Apply(self.resolve_head(head_name), args)
      }
      raw::ExprSyntax::Quantified(q) => self.under_scope(|s| {
        assert!(!q.bindings.is_empty(), "a quantified expression binds at least one parameter");
        let telescope: Vec<_> = q.bindings.iter().map(|p| s.scope_check_parameter(p)).collect();
        let rebound_output = rebind_arrows(&q.output);
        let output = s.scope_check_expr(&rebound_output);
        roll_pi(telescope, output).0
      }),
      raw::ExprSyntax::TypedParameterGroup(_, params) => self.under_scope(|s| {
        assert!(!params.is_empty(), "a typed parameter group is never empty");
        let telescope: Vec<_> = params.iter().map(|p| s.scope_check_parameter(p)).collect();
        roll_pi1(telescope)
      }),
    }
  }

  /// Resolution priority: bound local variable, exact fully-qualified
  /// match, then the innermost local name table. Constructor matches get a
  /// constructor head. An unresolved identifier is diagnosed and recovered
  /// as a variable reference so scope checking keeps going.
  fn resolve_head(&mut self, syntax: &raw::QualifiedIdent) -> abt::ApplyHead {
    let text = syntax.last().name;
    if syntax.parts.len() == 1 && self.is_bound_variable(text) {
      return abt::ApplyHead::Variable(abt::Name::new(text));
    }
    let qualified = self.raw_to_qualified(syntax);
    if let Some(info) = self.lookup_fully_qualified_name(&qualified) {
      return if info.is_definition() {
        abt::ApplyHead::Definition(qualified)
      } else {
        abt::ApplyHead::Constructor(qualified)
      };
    }
    if let Some((fqn, info)) = self.lookup_local_name(text) {
      return if info.is_definition() {
        abt::ApplyHead::Definition(fqn)
      } else {
        abt::ApplyHead::Constructor(fqn)
      };
    }
    self.error_set.report_cannot_resolve_name_error(syntax.loc, text);
    abt::ApplyHead::Variable(abt::Name::new(text))
  }

  fn raw_to_qualified(&mut self, syntax: &raw::QualifiedIdent) -> abt::QualifiedName {
    let parts: Vec<PStr> = syntax.parts[..syntax.parts.len() - 1].iter().map(|p| p.name).collect();
    let module = self.heap.alloc_module_reference(parts);
    abt::QualifiedName { module, name: abt::Name::new(syntax.last().name) }
  }

  fn scope_check_binding_list(
    &mut self,
    bindings: &[raw::Binding],
  ) -> Vec<(Vec<abt::Name>, abt::Expr)> {
    let mut collected = Vec::new();
    for binding in bindings {
      match binding {
        raw::Binding::Named(id) => {
          // An untyped binding defaults to a metavariable-typed slot.
          let Some(bound) = self.bind_variable(id.name, id.loc) else {
            continue;
          };
          collected.push((vec![bound], abt::Expr::Meta));
        }
        raw::Binding::Typed(param) => collected.push(self.scope_check_parameter(param)),
      }
    }
    collected
  }

  fn scope_check_parameter(&mut self, syntax: &raw::TypedParameter) -> (Vec<abt::Name>, abt::Expr) {
    let rebound = rebind_arrows(&syntax.ascription.type_expr);
    let type_expr = self.scope_check_expr(&rebound);
    let mut names = Vec::new();
    for id in &syntax.ascription.bound_names {
      if self.is_bound_variable(id.name) {
        // Not a unique name; diagnose and recover by ignoring it.
        let old_loc = self.bound_variable_location(id.name).unwrap();
        self.error_set.report_name_already_bound_error(id.loc, id.name, old_loc);
        continue;
      }
      let Some(bound) = self.bind_variable(id.name, id.loc) else {
        continue;
      };
      names.push(bound);
    }
    (names, type_expr)
  }

  /// Lower a clause's pattern expressions, skipping the leading function
  /// name token. First-occurrence variables bind into the current scope; a
  /// pattern whose variable is already bound is diagnosed and dropped.
  fn scope_check_pattern(&mut self, lhs: &[raw::ExprSyntax]) -> Vec<abt::DeclaredPattern> {
    assert!(!lhs.is_empty(), "a clause's left-hand side starts with the function name");
    let mut valid = Vec::with_capacity(lhs.len() - 1);
    for syntax in &lhs[1..] {
      let pattern = self.expr_to_decl_pattern(syntax);
      if self.open_pattern_vars_into_scope(&pattern, syntax.loc()) {
        valid.push(pattern);
      }
    }
    valid
  }

  fn open_pattern_vars_into_scope(
    &mut self,
    pattern: &abt::DeclaredPattern,
    loc: Location,
  ) -> bool {
    match pattern {
      abt::DeclaredPattern::Wild => true,
      abt::DeclaredPattern::Variable(name) => {
        if self.is_bound_variable(name.text) {
          self.error_set.report_duplicate_pattern_variable_error(loc, name.text);
          false
        } else {
          self.bind_variable(name.text, loc);
          true
        }
      }
      abt::DeclaredPattern::Constructor(_, patterns) => patterns
        .iter()
        .fold(true, |acc, p| acc && self.open_pattern_vars_into_scope(p, loc)),
    }
  }

  fn expr_to_decl_pattern(&mut self, syntax: &raw::ExprSyntax) -> abt::DeclaredPattern {
    match syntax {
      raw::ExprSyntax::Named(n)
        if n.parts.len() == 1 && n.parts[0].name == PStr::UNDERSCORE =>
      {
        abt::DeclaredPattern::Wild
      }
      raw::ExprSyntax::Named(n) => abt::DeclaredPattern::Variable(abt::Name::new(n.last().name)),
      raw::ExprSyntax::Application(_, exprs) => {
        let Some(raw::ExprSyntax::Named(head)) = exprs.first() else {
          panic!("cannot scope check this pattern shape")
        };
        let qualified = self.raw_to_qualified(head);
        abt::DeclaredPattern::Constructor(
          qualified,
          exprs[1..].iter().map(|e| self.expr_to_decl_pattern(e)).collect(),
        )
      }
      raw::ExprSyntax::Parenthesized(_, inner) => self.expr_to_decl_pattern(inner),
      raw::ExprSyntax::Underscore(_) => abt::DeclaredPattern::Wild,
      _ => panic!("cannot scope check this pattern shape"),
    }
  }

  fn scope_check_function_decl(&mut self, syntax: &raw::ReparsedFunctionDecl) -> Vec<abt::Decl> {
    assert!(
      syntax.ascription.bound_names.len() == 1,
      "reparsed function declarations bind exactly one name"
    );
    let name_id = syntax.ascription.bound_names[0];
    let function_name = match self.bind_definition(name_id.name, 0, name_id.loc) {
      Ok(bound) => bound,
      Err(BindError::Duplicate(old_loc)) => {
        self.error_set.report_name_already_bound_error(name_id.loc, name_id.name, old_loc);
        return Vec::new();
      }
      Err(BindError::Reserved) => return Vec::new(),
    };
    let rebound = rebind_arrows(&syntax.ascription.type_expr);
    let ascription_expr = self.under_scope(|s| s.scope_check_expr(&rebound));
    let ascription =
      abt::Decl::Ascription(abt::TypeSignature { name: function_name, type_: ascription_expr });
    let clauses = syntax.clauses.iter().map(|c| self.scope_check_function_clause(c)).collect();
    vec![ascription, abt::Decl::Function(function_name, clauses)]
  }

  fn scope_check_function_clause(&mut self, syntax: &raw::FunctionClause) -> abt::DeclaredClause {
    self.under_scope(|s| {
      let patterns = s.scope_check_pattern(&syntax.lhs);
      let rebound = rebind_arrows(&syntax.rhs);
      let body = s.scope_check_expr(&rebound);
      abt::DeclaredClause { patterns, body }
    })
  }

  fn scope_check_data_decl(&mut self, syntax: &raw::DataDecl) -> Vec<abt::Decl> {
    let bound_data_name = match self.bind_definition(syntax.name.name, 0, syntax.name.loc) {
      Ok(bound) => bound,
      Err(BindError::Duplicate(old_loc)) => {
        self.error_set.report_name_already_bound_error(syntax.name.loc, syntax.name.name, old_loc);
        return Vec::new();
      }
      Err(BindError::Reserved) => return Vec::new(),
    };
    let (signature, body) = self.under_scope(|s| {
      let params: Vec<_> = syntax.params.iter().map(|p| s.scope_check_parameter(p)).collect();
      let rebound = rebind_arrows(&syntax.indices);
      let indices = s.scope_check_expr(&rebound);
      let (type_, param_names) = roll_pi(params, indices);
      let signature = abt::Decl::DataSignature(abt::TypeSignature { name: bound_data_name, type_ });
      let constructors: Vec<_> =
        syntax.constructors.iter().flat_map(|c| s.scope_check_constructor(c)).collect();
      (signature, abt::Decl::Data(bound_data_name, param_names, constructors))
    });

    // The body's frame is gone; re-register the surviving constructors in
    // the enclosing frame so siblings can refer to them.
    let abt::Decl::Data(_, _, constructors) = &body else { unreachable!() };
    for constructor in constructors {
      if self.bind_constructor(constructor.name.text, 0, syntax.name.loc).is_err() {
        panic!("constructor names are unique after scope checking the data body");
      }
    }
    vec![signature, body]
  }

  fn scope_check_constructor(&mut self, syntax: &raw::ConstructorDecl) -> Vec<abt::TypeSignature> {
    let mut result = Vec::with_capacity(syntax.ascription.bound_names.len());
    for id in &syntax.ascription.bound_names {
      let rebound = rebind_arrows(&syntax.ascription.type_expr);
      let type_expr = self.scope_check_expr(&rebound);
      match self.bind_constructor(id.name, 0, id.loc) {
        Ok(bound) => result.push(abt::TypeSignature { name: bound, type_: type_expr }),
        Err(BindError::Duplicate(old_loc)) => {
          // Not a unique name; diagnose and recover by ignoring it.
          self.error_set.report_name_already_bound_error(id.loc, id.name, old_loc);
        }
        Err(BindError::Reserved) => {}
      }
    }
    result
  }

  fn scope_check_record_decl(&mut self, syntax: &raw::RecordDecl) -> Vec<abt::Decl> {
    let bound_record_name = match self.bind_definition(syntax.name.name, 0, syntax.name.loc) {
      Ok(bound) => bound,
      Err(BindError::Duplicate(old_loc)) => {
        self.error_set.report_name_already_bound_error(syntax.name.loc, syntax.name.name, old_loc);
        return Vec::new();
      }
      Err(BindError::Reserved) => return Vec::new(),
    };
    self.under_scope(|s| {
      let params: Vec<_> = syntax.params.iter().map(|p| s.scope_check_parameter(p)).collect();
      let indices = match &syntax.indices {
        Some(index_expr) => {
          let rebound = rebind_arrows(index_expr);
          s.scope_check_expr(&rebound)
        }
        None => abt::Expr::Type,
      };
      let (type_, _) = roll_pi(params, indices);
      let signature =
        abt::Decl::RecordSignature(abt::TypeSignature { name: bound_record_name, type_ });

      let mut field_names = Vec::new();
      let mut field_signatures = Vec::new();
      let mut constructor = None;
      let mut associated = Vec::new();
      for element in &syntax.elements {
        match element {
          raw::RecordElement::Field(field) => {
            for (field_name, field_signature) in s.scope_check_field_decl(field) {
              field_names.push(field_name);
              field_signatures.push(field_signature);
            }
          }
          raw::RecordElement::Constructor(c) => match s.bind_constructor(c.name.name, 0, c.loc) {
            Ok(bound) => constructor = Some(bound),
            Err(BindError::Duplicate(old_loc)) => {
              s.error_set.report_name_already_bound_error(c.loc, c.name.name, old_loc)
            }
            Err(BindError::Reserved) => {}
          },
          raw::RecordElement::Decl(decl) => associated.push(decl.clone()),
        }
      }
      let Some(constructor) = constructor else {
        s.error_set.report_record_missing_constructor_error(syntax.loc, syntax.name.name);
        return Vec::new();
      };
      let mut result = vec![
        signature,
        abt::Decl::Record {
          name: bound_record_name,
          fields: field_names,
          constructor,
          field_signatures,
        },
      ];
      for decl in reparse::reparse_decls(associated, s.error_set) {
        result.extend(s.scope_check_decl(&decl));
      }
      result
    })
  }

  fn scope_check_field_decl(
    &mut self,
    syntax: &raw::FieldDecl,
  ) -> Vec<(abt::Name, abt::TypeSignature)> {
    let mut result = Vec::with_capacity(syntax.ascription.bound_names.len());
    for id in &syntax.ascription.bound_names {
      let rebound = rebind_arrows(&syntax.ascription.type_expr);
      let type_expr = self.scope_check_expr(&rebound);
      match self.bind_projection(id.name, 0, id.loc) {
        Ok(bound) => result.push((
          abt::Name::new(id.name),
          abt::TypeSignature { name: bound, type_: type_expr },
        )),
        Err(BindError::Duplicate(old_loc)) => {
          self.error_set.report_name_already_bound_error(id.loc, id.name, old_loc);
        }
        Err(BindError::Reserved) => {}
      }
    }
    result
  }
}

#[cfg(test)]
pub(crate) fn scope_check_expr_for_test(
  syntax: &raw::ExprSyntax,
  heap: &mut Heap,
  error_set: &mut ErrorSet,
) -> abt::Expr {
  let mut binder = NameBinding::new(heap, error_set, ModuleReference::ROOT);
  let rebound = rebind_arrows(syntax);
  binder.scope_check_expr(&rebound)
}

/// Give the `->` token right-associative precedence by restructuring a
/// juxtaposition, standing in for a real mixfix resolver. Idempotent:
/// already-rebound and atomic syntax pass through unchanged.
pub(crate) fn rebind_arrows(syntax: &raw::ExprSyntax) -> raw::ExprSyntax {
  match syntax {
    raw::ExprSyntax::Parenthesized(loc, inner) => {
      raw::ExprSyntax::Parenthesized(*loc, Box::new(rebind_arrows(inner)))
    }
    raw::ExprSyntax::Application(loc, exprs) => {
      if exprs.len() <= 1 {
        return match exprs.first() {
          Some(only) => rebind_arrows(only),
          None => syntax.clone(),
        };
      }
      let mut preceding = Vec::new();
      for (idx, expr) in exprs.iter().enumerate() {
        if is_arrow_token(expr) {
          let left = raw::ExprSyntax::ReparsedApplication(*loc, preceding);
          let rest = raw::ExprSyntax::Application(*loc, exprs[idx + 1..].to_vec());
          let right = raw::ExprSyntax::Parenthesized(*loc, Box::new(rebind_arrows(&rest)));
          return raw::ExprSyntax::ReparsedApplication(*loc, vec![expr.clone(), left, right]);
        }
        preceding.push(raw::ExprSyntax::Parenthesized(expr.loc(), Box::new(rebind_arrows(expr))));
      }
      syntax.clone()
    }
    raw::ExprSyntax::Quantified(q) => raw::ExprSyntax::Quantified(raw::QuantifiedExpr {
      loc: q.loc,
      bindings: q.bindings.clone(),
      output: Box::new(rebind_arrows(&q.output)),
    }),
    raw::ExprSyntax::Named(_)
    | raw::ExprSyntax::Type(_)
    | raw::ExprSyntax::Underscore(_)
    | raw::ExprSyntax::Lambda(_)
    | raw::ExprSyntax::TypedParameterGroup(_, _)
    | raw::ExprSyntax::ReparsedApplication(_, _) => syntax.clone(),
  }
}

fn is_arrow_token(syntax: &raw::ExprSyntax) -> bool {
  matches!(syntax, raw::ExprSyntax::Named(n) if n.parts.len() == 1 && n.parts[0].name == PStr::ARROW)
}

/// Fold a scope-checked telescope right-to-left into nested Pi nodes around
/// `cap`. Also returns the bound names, in source order.
fn roll_pi(
  telescope: Vec<(Vec<abt::Name>, abt::Expr)>,
  cap: abt::Expr,
) -> (abt::Expr, Vec<abt::Name>) {
  let mut type_ = cap;
  let mut names = Vec::new();
  for (group_names, group_type) in telescope.into_iter().rev() {
    for name in group_names.into_iter().rev() {
      type_ = abt::Expr::Pi(name, Box::new(group_type.clone()), Box::new(type_));
      names.push(name);
    }
  }
  names.reverse();
  (type_, names)
}

/// The anonymous-Pi form of a bare typed parameter group: the final group's
/// type is the result type, and every other binder wraps it.
fn roll_pi1(telescope: Vec<(Vec<abt::Name>, abt::Expr)>) -> abt::Expr {
  assert!(!telescope.is_empty(), "a typed parameter group is never empty");
  let (last_names, last_type) = telescope.last().cloned().unwrap();
  let mut type_ = last_type.clone();
  if !last_names.is_empty() {
    for name in last_names[..last_names.len() - 1].iter().rev() {
      type_ = abt::Expr::Pi(*name, Box::new(last_type.clone()), Box::new(type_));
    }
  }
  for (group_names, group_type) in telescope[..telescope.len() - 1].iter().rev() {
    for name in group_names.iter().rev() {
      type_ = abt::Expr::Pi(*name, Box::new(group_type.clone()), Box::new(type_));
    }
  }
  type_
}
