mod reparse;
mod scope;
mod scope_check;
mod signature;
mod state;
mod state_tests;
mod subst;
mod term;

pub use scope_check::scope_check_module;
pub use signature::{
  Constant, ContextualDefinition, ContextualType, Definition, FunctionInstantiation,
  OpenedConstant, OpenedDefinition, Signature,
};
pub use state::{Environment, TypeChecker};
pub use term::{Context, Elim, Head, Meta, Opened, Telescope, Term, Var};

use tarn_pipeline::{Pass, PassContext};

/// The scope checker exposed as a compiler pass. The pass always succeeds;
/// callers must consult the diagnostic sink before trusting the output.
pub struct ScopeCheckPass;

impl Pass for ScopeCheckPass {
  type Input = tarn_ast::raw::ModuleDecl;
  type Output = tarn_ast::abt::DeclaredModule;

  fn name(&self) -> &'static str {
    "scope checking"
  }

  fn run(&self, input: Self::Input, cx: &mut PassContext) -> Option<Self::Output> {
    Some(scope_check_module(&input, &mut cx.heap, &mut cx.error_set))
  }
}
