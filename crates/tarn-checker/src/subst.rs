//! Substitution arithmetic on terms.
//!
//! Weakening shifts free-variable indices to account for additionally
//! introduced bindings; instantiation replaces a telescope's binders with
//! concrete arguments. Both leave variables bound under inner binders
//! untouched by tracking a cutoff depth.

use super::signature::{Constant, ContextualType, Definition, FunctionInstantiation};
use super::term::{Elim, Head, Opened, Term, Var};

/// Shift every free variable of `term` up by `by`.
pub(crate) fn weaken(term: &Term, by: u32) -> Term {
  shift_from(term, 0, by)
}

fn shift_from(term: &Term, cutoff: u32, by: u32) -> Term {
  match term {
    Term::Type => Term::Type,
    Term::Pi(domain, codomain) => Term::pi(
      shift_from(domain, cutoff, by),
      shift_from(codomain, cutoff + 1, by),
    ),
    Term::Lambda(body) => Term::lambda(shift_from(body, cutoff + 1, by)),
    Term::Apply(head, elims) => {
      let head = match head {
        Head::Variable(v) if v.index >= cutoff => {
          Head::Variable(Var { name: v.name, index: v.index + by })
        }
        Head::Variable(v) => Head::Variable(*v),
        Head::Definition(opened) => Head::Definition(Opened::new(
          opened.key,
          opened.args.iter().map(|a| shift_from(a, cutoff, by)).collect(),
        )),
        Head::Meta(mv) => Head::Meta(*mv),
      };
      Term::Apply(
        head,
        elims.iter().map(|Elim::Apply(t)| Elim::Apply(shift_from(t, cutoff, by))).collect(),
      )
    }
  }
}

/// Substitute the outermost `args.len()` binders of `term` with `args`,
/// given in binding order (outermost first).
pub(crate) fn instantiate(term: &Term, args: &[Term]) -> Term {
  instantiate_under(term, 0, args)
}

pub(crate) fn instantiate_under(term: &Term, depth: u32, args: &[Term]) -> Term {
  let n = args.len() as u32;
  match term {
    Term::Type => Term::Type,
    Term::Pi(domain, codomain) => Term::pi(
      instantiate_under(domain, depth, args),
      instantiate_under(codomain, depth + 1, args),
    ),
    Term::Lambda(body) => Term::lambda(instantiate_under(body, depth + 1, args)),
    Term::Apply(head, elims) => {
      let elims: Vec<Elim> =
        elims.iter().map(|Elim::Apply(t)| Elim::Apply(instantiate_under(t, depth, args))).collect();
      match head {
        Head::Variable(v) if v.index >= depth => {
          let offset = v.index - depth;
          if offset < n {
            // Binding order puts the outermost argument first, so the
            // innermost index 0 picks the last argument.
            let replacement = weaken(&args[(n - 1 - offset) as usize], depth);
            eliminate(replacement, elims)
          } else {
            Term::Apply(Head::Variable(Var { name: v.name, index: v.index - n }), elims)
          }
        }
        Head::Variable(v) => Term::Apply(Head::Variable(*v), elims),
        Head::Definition(opened) => Term::Apply(
          Head::Definition(Opened::new(
            opened.key,
            opened.args.iter().map(|a| instantiate_under(a, depth, args)).collect(),
          )),
          elims,
        ),
        Head::Meta(mv) => Term::Apply(Head::Meta(*mv), elims),
      }
    }
  }
}

/// Append eliminations to a term, beta-reducing applied lambdas.
pub(crate) fn eliminate(term: Term, elims: Vec<Elim>) -> Term {
  if elims.is_empty() {
    return term;
  }
  match term {
    Term::Apply(head, mut existing) => {
      existing.extend(elims);
      Term::Apply(head, existing)
    }
    Term::Lambda(body) => {
      let mut rest = elims.into_iter();
      let Elim::Apply(argument) = rest.next().expect("eliminations are nonempty here");
      let reduced = instantiate(&body, &[argument]);
      eliminate(reduced, rest.collect())
    }
    Term::Type | Term::Pi(_, _) => panic!("cannot eliminate a type former"),
  }
}

/// Substitute a parameter telescope's binders inside a stored definition.
pub(crate) fn instantiate_definition(definition: &Definition, args: &[Term]) -> Definition {
  match definition {
    Definition::Constant(type_, constant) => Definition::Constant(
      instantiate(type_, args),
      match constant {
        Constant::Postulate => Constant::Postulate,
        Constant::Data(constructors) => Constant::Data(constructors.clone()),
        Constant::Record { constructor, projections } => {
          Constant::Record { constructor: *constructor, projections: projections.clone() }
        }
        Constant::Function(inst) => Constant::Function(match inst {
          FunctionInstantiation::Open => FunctionInstantiation::Open,
          FunctionInstantiation::Invertible(body) => {
            FunctionInstantiation::Invertible(instantiate(body, args))
          }
        }),
      },
    ),
    Definition::DataConstructor(owner, arg_count, contextual_type) => Definition::DataConstructor(
      *owner,
      *arg_count,
      instantiate_contextual_type(contextual_type, args),
    ),
    Definition::Module(names) => Definition::Module(names.clone()),
  }
}

pub(crate) fn instantiate_contextual_type(ct: &ContextualType, args: &[Term]) -> ContextualType {
  ContextualType {
    telescope: ct
      .telescope
      .iter()
      .enumerate()
      .map(|(i, (name, t))| (*name, instantiate_under(t, i as u32, args)))
      .collect(),
    inside: instantiate_under(&ct.inside, ct.telescope.len() as u32, args),
  }
}
