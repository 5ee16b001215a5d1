//! Declaration reparsing.
//!
//! The parser emits a function's type signature and its pattern-matching
//! clauses as separate declarations, possibly interleaved with unrelated
//! declarations and with each other. This pass regroups each function into a
//! single `ReparsedFunction` declaration. It never fails: malformed input
//! degrades to a diagnostic plus omission of the offending declaration.

use std::collections::HashMap;
use tarn_ast::raw;
use tarn_errors::ErrorSet;
use tarn_heap::PStr;

pub(crate) fn reparse_decls(
  decls: Vec<raw::DeclSyntax>,
  error_set: &mut ErrorSet,
) -> Vec<raw::DeclSyntax> {
  let mut reparsed = Vec::new();
  let mut order = Vec::new();
  let mut func_map: HashMap<PStr, raw::FunctionDecl> = HashMap::new();
  let mut clause_map: HashMap<PStr, Vec<raw::FunctionClause>> = HashMap::new();
  for decl in decls {
    match decl {
      raw::DeclSyntax::Function(func_decl) => {
        for bound in &func_decl.ascription.bound_names {
          if clause_map.contains_key(&bound.name) {
            let original = func_map.get(&bound.name).unwrap();
            error_set.report_name_already_bound_error(
              func_decl.ascription.loc,
              bound.name,
              original.ascription.loc,
            );
            continue;
          }
          func_map.insert(bound.name, func_decl.clone());
          clause_map.insert(bound.name, Vec::new());
          order.push(bound.name);
        }
      }
      raw::DeclSyntax::FunctionClause(clause) => {
        let name = clause_head_name(&clause);
        match clause_map.get_mut(&name) {
          Some(clauses) => clauses.push(clause),
          None => error_set.report_body_before_signature_error(clause.loc, name),
        }
      }
      other => reparsed.push(other),
    }
  }

  for name in order {
    let function = func_map.remove(&name).unwrap();
    let clauses = clause_map.remove(&name).unwrap();
    let singleton = function
      .ascription
      .bound_names
      .iter()
      .find(|id| id.name == name)
      .copied()
      .expect("the reconstituted name was taken from this ascription");
    reparsed.push(raw::DeclSyntax::ReparsedFunction(raw::ReparsedFunctionDecl {
      loc: function.loc,
      ascription: raw::Ascription {
        loc: function.ascription.loc,
        bound_names: vec![singleton],
        type_expr: function.ascription.type_expr,
      },
      clauses,
    }));
  }
  reparsed
}

/// The function a clause belongs to, read off the leftmost token of its
/// left-hand side.
fn clause_head_name(clause: &raw::FunctionClause) -> PStr {
  match clause.lhs.first() {
    Some(raw::ExprSyntax::Named(n)) => n.last().name,
    _ => panic!("a function clause must begin with the function's name"),
  }
}
