//! The type checker's contextual state: a signature of metavariables and
//! definitions plus a layered lexical environment.
//!
//! Every environment mutation is save/mutate/restore with strict stack
//! discipline keyed to syntactic nesting. The `under_*` helpers restore by
//! truncation, so the pairing holds on every exit path, including early
//! returns taken during recovery.

use super::signature::{
  Constant, ContextualDefinition, Definition, FunctionInstantiation, OpenedConstant,
  OpenedDefinition, Signature,
};
use super::subst;
use super::term::{Context, Elim, Head, Opened, Telescope, Term, Var};
use std::collections::HashMap;
use tarn_ast::abt::{Name, QualifiedName};
use tarn_ast::Location;

/// A completed scope frame. `context` holds the bindings accumulated between
/// the previous frame and this one; `opened` maps a definition to the
/// arguments it was opened with inside this frame, expressed at the scope
/// depth of the moment of opening.
pub struct ScopeFrame {
  context: Context,
  opened: HashMap<QualifiedName, Vec<Term>>,
}

pub struct Environment {
  scopes: Vec<ScopeFrame>,
  /// Bindings made since the innermost frame was completed.
  context: Context,
}

impl Environment {
  pub fn new() -> Environment {
    Environment { scopes: Vec::new(), context: Vec::new() }
  }

  pub fn context(&self) -> &Context {
    &self.context
  }

  pub fn scope_depth(&self) -> usize {
    self.scopes.len()
  }
}

impl Default for Environment {
  fn default() -> Self {
    Self::new()
  }
}

pub struct TypeChecker {
  signature: Signature,
  environment: Environment,
}

impl Default for TypeChecker {
  fn default() -> Self {
    Self::new()
  }
}

impl TypeChecker {
  pub fn new() -> TypeChecker {
    TypeChecker { signature: Signature::new(), environment: Environment::new() }
  }

  pub fn signature(&self) -> &Signature {
    &self.signature
  }

  pub fn signature_mut(&mut self) -> &mut Signature {
    &mut self.signature
  }

  pub fn environment(&self) -> &Environment {
    &self.environment
  }

  pub fn extend_environment(&mut self, ctx: Context) {
    self.environment.context.extend(ctx);
  }

  pub fn under_extended_environment<A>(
    &mut self,
    ctx: Context,
    f: impl FnOnce(&mut Self) -> A,
  ) -> A {
    let saved_len = self.environment.context.len();
    self.environment.context.extend(ctx);
    let result = f(self);
    self.environment.context.truncate(saved_len);
    result
  }

  /// Freeze the pending context into a new innermost frame, run `f`, then
  /// pop the frame and restore the pending context exactly.
  pub fn under_new_scope<A>(&mut self, f: impl FnOnce(&mut Self) -> A) -> A {
    let depth = self.environment.scopes.len();
    let pending = std::mem::take(&mut self.environment.context);
    self.environment.scopes.push(ScopeFrame { context: pending, opened: HashMap::new() });
    let result = f(self);
    self.environment.scopes.truncate(depth + 1);
    let frame = self.environment.scopes.pop().expect("the frame pushed above is still here");
    self.environment.context = frame.context;
    result
  }

  /// Every variable of `ctx` in binding order: the outermost binder carries
  /// the highest de Bruijn index.
  pub fn context_variables(ctx: &Context) -> Vec<Var> {
    let len = ctx.len();
    ctx
      .iter()
      .enumerate()
      .map(|(i, (name, _))| Var { name: *name, index: (len - 1 - i) as u32 })
      .collect()
  }

  /// Roll a context into nested dependent function types around `final_type`.
  pub fn roll_pi(&self, ctx: &Context, final_type: Term) -> Term {
    let mut type_ = final_type;
    for (_, next_type) in ctx.iter().rev() {
      type_ = Term::pi(next_type.clone(), type_);
    }
    type_
  }

  /// Unroll a Pi type into a telescope and the final type, reducing to weak
  /// head normal form before each peel. Parameters without a supplied name
  /// get the reserved discard name.
  pub fn unroll_pi(&self, type_: &Term, names: Option<&[Name]>) -> (Telescope<Term>, Term) {
    let mut telescope = Telescope::new();
    let mut ty = type_.clone();
    let mut idx = 0;
    loop {
      match self.to_weak_head_normal_form(&ty) {
        Term::Pi(domain, codomain) => {
          let name = names.and_then(|ns| ns.get(idx)).copied().unwrap_or(Name::DISCARD);
          telescope.push((name, *domain));
          ty = *codomain;
          idx += 1;
        }
        other => {
          ty = other;
          break;
        }
      }
    }
    (telescope, ty)
  }

  /// Allocate a fresh metavariable under `ctx`. Its type abstracts over the
  /// whole context so that a later solution is a closed term, and the
  /// returned term re-applies it to every bound variable in binding order.
  pub fn add_meta(&mut self, ctx: &Context, origin: Option<Location>, expected_type: Term) -> Term {
    let meta_type = self.roll_pi(ctx, expected_type);
    let mv = self.signature.add_meta(meta_type, origin);
    subst::eliminate(
      Term::meta(mv),
      Self::context_variables(ctx)
        .into_iter()
        .map(|v| Elim::Apply(Term::Apply(Head::Variable(v), Vec::new())))
        .collect(),
    )
  }

  /// Record that `name` was opened with `args` in the innermost completed
  /// frame. Opening is only legal at a frame boundary.
  pub fn open_definition(&mut self, name: QualifiedName, args: Vec<Term>) -> Opened<QualifiedName> {
    assert!(
      self.environment.context.is_empty(),
      "definitions can only be opened at a scope boundary"
    );
    let frame = self
      .environment
      .scopes
      .last_mut()
      .expect("definitions can only be opened inside a scope");
    frame.opened.insert(name, args.clone());
    Opened::new(name, args)
  }

  /// The arguments `name` was opened with, weakened to account for every
  /// binding introduced since the opening.
  fn opened_arguments(&self, name: &QualifiedName) -> Vec<Term> {
    assert!(!self.environment.scopes.is_empty());
    let mut introduced_since = self.environment.context.len() as u32;
    for frame in self.environment.scopes.iter().rev() {
      if let Some(args) = frame.opened.get(name) {
        return args.iter().map(|arg| subst::weaken(arg, introduced_since)).collect();
      }
      introduced_since += frame.context.len() as u32;
    }
    panic!("definition was never opened in an enclosing scope")
  }

  pub fn get_opened_definition(
    &self,
    name: &QualifiedName,
  ) -> (Opened<QualifiedName>, OpenedDefinition) {
    let args = self.opened_arguments(name);
    let contextual = self
      .signature
      .lookup_definition(name)
      .expect("opened definitions are always registered in the signature");
    let definition = self.open_contextual_definition(contextual, &args);
    (Opened::new(*name, args), definition)
  }

  /// Specialize a stored contextual definition with opened arguments.
  pub fn open_contextual_definition(
    &self,
    contextual: &ContextualDefinition,
    args: &[Term],
  ) -> OpenedDefinition {
    assert!(
      contextual.telescope.len() == args.len(),
      "opened a definition with the wrong number of arguments"
    );
    let open_name = |name: QualifiedName| Opened::new(name, args.to_vec());
    match subst::instantiate_definition(&contextual.inside, args) {
      Definition::Constant(type_, constant) => OpenedDefinition::Constant(
        type_,
        match constant {
          Constant::Postulate => OpenedConstant::Postulate,
          Constant::Data(constructors) => {
            OpenedConstant::Data(constructors.into_iter().map(open_name).collect())
          }
          Constant::Record { constructor, projections } => OpenedConstant::Record {
            constructor: open_name(constructor),
            projections: projections.into_iter().map(open_name).collect(),
          },
          Constant::Function(inst) => OpenedConstant::Function(inst),
        },
      ),
      Definition::DataConstructor(owner, arg_count, contextual_type) => {
        OpenedDefinition::DataConstructor(open_name(owner), arg_count, contextual_type)
      }
      Definition::Module(names) => OpenedDefinition::Module(names),
    }
  }

  pub fn get_type_of_opened_definition(&self, definition: &OpenedDefinition) -> Term {
    match definition {
      OpenedDefinition::Constant(type_, _) => type_.clone(),
      OpenedDefinition::DataConstructor(_, _, contextual_type) => {
        self.roll_pi(&contextual_type.telescope, contextual_type.inside.clone())
      }
      OpenedDefinition::Module(_) => panic!("a module has no type"),
    }
  }

  /// Reduce just far enough to expose the outermost constructor: solved
  /// metavariables and invertible function definitions unfold, nothing else.
  pub fn to_weak_head_normal_form(&self, term: &Term) -> Term {
    match term {
      Term::Apply(Head::Meta(mv), elims) => match self.signature.meta_binding(*mv) {
        Some(binding) => {
          self.to_weak_head_normal_form(&subst::eliminate(binding.clone(), elims.clone()))
        }
        None => term.clone(),
      },
      Term::Apply(Head::Definition(opened), elims) => {
        let Some(contextual) = self.signature.lookup_definition(&opened.key) else {
          return term.clone();
        };
        if let Definition::Constant(
          _,
          Constant::Function(FunctionInstantiation::Invertible(body)),
        ) = &contextual.inside
        {
          let unfolded = subst::instantiate(body, &opened.args);
          self.to_weak_head_normal_form(&subst::eliminate(unfolded, elims.clone()))
        } else {
          term.clone()
        }
      }
      _ => term.clone(),
    }
  }
}
