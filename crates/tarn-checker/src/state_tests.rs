#[cfg(test)]
mod tests {
  use super::super::signature::{
    Constant, ContextualDefinition, ContextualType, Definition, FunctionInstantiation,
    OpenedConstant, OpenedDefinition,
  };
  use super::super::state::TypeChecker;
  use super::super::term::{Context, Elim, Head, Opened, Term, Var};
  use pretty_assertions::assert_eq;
  use tarn_ast::abt::{Name, QualifiedName};
  use tarn_ast::Location;
  use tarn_heap::{Heap, ModuleReference};

  fn name(heap: &mut Heap, text: &str) -> Name {
    Name::new(heap.alloc_str(text))
  }

  fn qualified(heap: &mut Heap, text: &str) -> QualifiedName {
    QualifiedName { module: ModuleReference::ROOT, name: name(heap, text) }
  }

  #[test]
  fn roll_unroll_round_trip_test() {
    let mut heap = Heap::new();
    let checker = TypeChecker::new();
    let x = name(&mut heap, "x");
    let y = name(&mut heap, "y");
    let ctx: Context = vec![(x, Term::Type), (y, Term::pi(Term::Type, Term::Type))];

    let rolled = checker.roll_pi(&ctx, Term::Type);
    assert_eq!(
      Term::pi(Term::Type, Term::pi(Term::pi(Term::Type, Term::Type), Term::Type)),
      rolled
    );

    let (telescope, final_type) = checker.unroll_pi(&rolled, Some(&[x, y]));
    assert_eq!(ctx, telescope);
    assert_eq!(Term::Type, final_type);

    // Unsupplied names synthesize the reserved discard name.
    let (unnamed_telescope, _) = checker.unroll_pi(&rolled, Some(&[x]));
    assert_eq!(x, unnamed_telescope[0].0);
    assert_eq!(Name::DISCARD, unnamed_telescope[1].0);
    let (all_unnamed, _) = checker.unroll_pi(&rolled, None);
    assert!(all_unnamed.iter().all(|(n, _)| *n == Name::DISCARD));
  }

  #[test]
  fn roll_pi_empty_context_test() {
    let checker = TypeChecker::default();
    assert_eq!(Term::Type, checker.roll_pi(&vec![], Term::Type));
    let (telescope, final_type) = checker.unroll_pi(&Term::Type, None);
    assert!(telescope.is_empty());
    assert_eq!(Term::Type, final_type);
  }

  #[test]
  fn unroll_pi_reduces_to_weak_head_normal_form() {
    let mut heap = Heap::new();
    let mut checker = TypeChecker::new();

    // A Pi hidden behind a solved metavariable.
    let mv = checker.signature_mut().add_meta(Term::Type, None);
    checker.signature_mut().instantiate_meta(mv, Term::pi(Term::Type, Term::Type));
    let (telescope, final_type) = checker.unroll_pi(&Term::meta(mv), None);
    assert_eq!(1, telescope.len());
    assert_eq!(Term::Type, final_type);

    // A Pi hidden behind an invertible function definition.
    let f = qualified(&mut heap, "f");
    checker.signature_mut().add_definition(
      f,
      ContextualDefinition {
        telescope: vec![],
        inside: Definition::Constant(
          Term::Type,
          Constant::Function(FunctionInstantiation::Invertible(Term::pi(
            Term::Type,
            Term::Type,
          ))),
        ),
      },
    );
    let (telescope, final_type) = checker.unroll_pi(&Term::definition(f, vec![]), None);
    assert_eq!(1, telescope.len());
    assert_eq!(Term::Type, final_type);

    // An open function does not unfold.
    let g = qualified(&mut heap, "g");
    checker.signature_mut().add_definition(
      g,
      ContextualDefinition {
        telescope: vec![],
        inside: Definition::Constant(Term::Type, Constant::Function(FunctionInstantiation::Open)),
      },
    );
    let opaque = Term::definition(g, vec![]);
    let (telescope, final_type) = checker.unroll_pi(&opaque, None);
    assert!(telescope.is_empty());
    assert_eq!(opaque, final_type);
  }

  #[test]
  fn whnf_test() {
    let mut checker = TypeChecker::new();
    let mut heap = Heap::new();
    let x = name(&mut heap, "x");

    // Unsolved metavariables are already in weak head normal form.
    let mv = checker.signature_mut().add_meta(Term::Type, None);
    assert_eq!(Term::meta(mv), checker.to_weak_head_normal_form(&Term::meta(mv)));

    // Solving the metavariable makes its eliminations beta-reduce.
    checker.signature_mut().instantiate_meta(mv, Term::lambda(Term::var(x, 0)));
    let applied = Term::Apply(Head::Meta(mv), vec![Elim::Apply(Term::Type)]);
    assert_eq!(Term::Type, checker.to_weak_head_normal_form(&applied));

    // Unregistered definitions stay put.
    let unknown = qualified(&mut heap, "unknown");
    let opaque = Term::definition(unknown, vec![]);
    assert_eq!(opaque, checker.to_weak_head_normal_form(&opaque));
    assert_eq!(Term::Type, checker.to_weak_head_normal_form(&Term::Type));
  }

  #[test]
  fn add_meta_abstracts_over_the_context() {
    let mut heap = Heap::new();
    let mut checker = TypeChecker::new();
    let x = name(&mut heap, "x");
    let y = name(&mut heap, "y");
    let a = Term::Type;
    let b = Term::pi(Term::Type, Term::Type);
    let ctx: Context = vec![(x, a.clone()), (y, b.clone())];

    let meta_term = checker.add_meta(&ctx, Some(Location::dummy()), Term::Type);

    // The metavariable is returned pre-applied to every bound variable in
    // binding order: ?m x y, with x the outermost (index 1).
    let Term::Apply(Head::Meta(mv), elims) = meta_term else {
      panic!("add_meta returns an applied metavariable")
    };
    assert_eq!(
      vec![
        Elim::Apply(Term::Apply(Head::Variable(Var { name: x, index: 1 }), vec![])),
        Elim::Apply(Term::Apply(Head::Variable(Var { name: y, index: 0 }), vec![])),
      ],
      elims
    );
    // Its type abstracts over the whole context.
    assert_eq!(
      &Term::pi(a, Term::pi(b, Term::Type)),
      checker.signature().meta_type(mv)
    );
    assert_eq!(Some(Location::dummy()), checker.signature().meta_origin(mv));
  }

  #[test]
  fn environment_save_restore_test() {
    let mut heap = Heap::new();
    let mut checker = TypeChecker::new();
    let z = name(&mut heap, "z");
    let a = name(&mut heap, "a");

    checker.extend_environment(vec![(z, Term::Type)]);
    assert_eq!(1, checker.environment().context().len());

    checker.under_extended_environment(vec![(a, Term::Type)], |tc| {
      assert_eq!(2, tc.environment().context().len());
    });
    assert_eq!(1, checker.environment().context().len());

    let result = checker.under_new_scope(|tc| {
      // The pending context froze into the new frame.
      assert!(tc.environment().context().is_empty());
      assert_eq!(1, tc.environment().scope_depth());
      // Mutations inside the scope are discarded wholesale on exit.
      tc.extend_environment(vec![(a, Term::Type)]);
      42
    });
    assert_eq!(42, result);
    assert_eq!(0, checker.environment().scope_depth());
    assert_eq!(vec![(z, Term::Type)], *checker.environment().context());
  }

  #[test]
  fn opened_definition_weakening_test() {
    let mut heap = Heap::new();
    let mut checker = TypeChecker::new();
    let z = name(&mut heap, "z");
    let a = name(&mut heap, "a");
    let b = name(&mut heap, "b");
    let c = name(&mut heap, "c");
    let d = qualified(&mut heap, "D");
    checker.signature_mut().add_definition(
      d,
      ContextualDefinition {
        telescope: vec![(z, Term::Type)],
        inside: Definition::Constant(Term::Type, Constant::Postulate),
      },
    );

    checker.extend_environment(vec![(z, Term::Type)]);
    checker.under_new_scope(|tc| {
      // Opened at depth 1: the stored argument refers to z as index 0.
      tc.open_definition(d, vec![Term::var(z, 0)]);
      let (opened, _) = tc.get_opened_definition(&d);
      assert_eq!(vec![Term::var(z, 0)], opened.args);

      // Two more pending bindings: the argument weakens by 2.
      tc.under_extended_environment(vec![(a, Term::Type), (b, Term::Type)], |tc| {
        let (opened, definition) = tc.get_opened_definition(&d);
        assert_eq!(vec![Term::var(z, 2)], opened.args);
        assert!(definition.as_constant().is_some());
      });

      // One frozen frame of one binding plus two pending: weaken by 3.
      tc.extend_environment(vec![(a, Term::Type)]);
      tc.under_new_scope(|tc| {
        tc.extend_environment(vec![(b, Term::Type), (c, Term::Type)]);
        let (opened, _) = tc.get_opened_definition(&d);
        assert_eq!(vec![Term::var(z, 3)], opened.args);
      });
    });
  }

  #[test]
  fn open_contextual_definition_specializes_test() {
    let mut heap = Heap::new();
    let checker = TypeChecker::new();
    let p = name(&mut heap, "p");
    let x = name(&mut heap, "x");
    let nil = qualified(&mut heap, "nil");
    let cons = qualified(&mut heap, "cons");

    // data List (p : Type) with constructors nil, cons; its type mentions p.
    let contextual = ContextualDefinition {
      telescope: vec![(p, Term::Type)],
      inside: Definition::Constant(Term::var(p, 0), Constant::Data(vec![nil, cons])),
    };
    let opened = checker.open_contextual_definition(&contextual, &[Term::Type]);
    let OpenedDefinition::Constant(type_, OpenedConstant::Data(constructors)) = opened else {
      panic!("a data definition opens to a data constant")
    };
    assert_eq!(Term::Type, type_);
    assert_eq!(
      vec![Opened::new(nil, vec![Term::Type]), Opened::new(cons, vec![Term::Type])],
      constructors
    );

    // Postulates pass through unchanged.
    let postulate = ContextualDefinition {
      telescope: vec![],
      inside: Definition::Constant(Term::Type, Constant::Postulate),
    };
    assert_eq!(
      OpenedDefinition::Constant(Term::Type, OpenedConstant::Postulate),
      checker.open_contextual_definition(&postulate, &[])
    );

    // Records specialize their constructor and projection names.
    let mk = qualified(&mut heap, "mk");
    let fst = qualified(&mut heap, "fst");
    let record = ContextualDefinition {
      telescope: vec![(p, Term::Type)],
      inside: Definition::Constant(
        Term::Type,
        Constant::Record { constructor: mk, projections: vec![fst] },
      ),
    };
    let OpenedDefinition::Constant(_, OpenedConstant::Record { constructor, projections }) =
      checker.open_contextual_definition(&record, &[Term::Type])
    else {
      panic!("a record definition opens to a record constant")
    };
    assert_eq!(Opened::new(mk, vec![Term::Type]), constructor);
    assert_eq!(vec![Opened::new(fst, vec![Term::Type])], projections);

    // Data constructors substitute the module arguments into their
    // remaining telescope and report their owner.
    let list = qualified(&mut heap, "List");
    let constructor_def = ContextualDefinition {
      telescope: vec![(p, Term::Type)],
      inside: Definition::DataConstructor(
        list,
        1,
        ContextualType { telescope: vec![(x, Term::var(p, 0))], inside: Term::var(p, 1) },
      ),
    };
    let OpenedDefinition::DataConstructor(owner, arg_count, contextual_type) =
      checker.open_contextual_definition(&constructor_def, &[Term::Type])
    else {
      panic!("a constructor definition opens to a data constructor")
    };
    assert_eq!(Opened::new(list, vec![Term::Type]), owner);
    assert_eq!(1, arg_count);
    assert_eq!(vec![(x, Term::Type)], contextual_type.telescope);
    assert_eq!(Term::Type, contextual_type.inside);
  }

  #[test]
  fn type_of_opened_definition_test() {
    let mut heap = Heap::new();
    let checker = TypeChecker::new();
    let x = name(&mut heap, "x");
    let list = qualified(&mut heap, "List");

    assert_eq!(
      Term::Type,
      checker.get_type_of_opened_definition(&OpenedDefinition::Constant(
        Term::Type,
        OpenedConstant::Postulate
      ))
    );
    // A constructor's type rolls its remaining telescope into a Pi chain.
    assert_eq!(
      Term::pi(Term::Type, Term::var(x, 5)),
      checker.get_type_of_opened_definition(&OpenedDefinition::DataConstructor(
        Opened::new(list, vec![]),
        1,
        ContextualType { telescope: vec![(x, Term::Type)], inside: Term::var(x, 5) },
      ))
    );
  }

  #[should_panic]
  #[test]
  fn type_of_opened_module_panics() {
    let checker = TypeChecker::new();
    checker.get_type_of_opened_definition(&OpenedDefinition::Module(vec![]));
  }

  #[should_panic]
  #[test]
  fn open_with_wrong_arity_panics() {
    let mut heap = Heap::new();
    let checker = TypeChecker::new();
    let p = name(&mut heap, "p");
    let contextual = ContextualDefinition {
      telescope: vec![(p, Term::Type)],
      inside: Definition::Constant(Term::Type, Constant::Postulate),
    };
    checker.open_contextual_definition(&contextual, &[]);
  }

  #[should_panic]
  #[test]
  fn open_outside_any_scope_panics() {
    let mut heap = Heap::new();
    let mut checker = TypeChecker::new();
    let d = qualified(&mut heap, "D");
    checker.open_definition(d, vec![]);
  }

  #[should_panic]
  #[test]
  fn open_with_pending_context_panics() {
    let mut heap = Heap::new();
    let mut checker = TypeChecker::new();
    let z = name(&mut heap, "z");
    let d = qualified(&mut heap, "D");
    checker.under_new_scope(|tc| {
      tc.extend_environment(vec![(z, Term::Type)]);
      tc.open_definition(d, vec![]);
    });
  }

  #[should_panic]
  #[test]
  fn resolving_a_never_opened_definition_panics() {
    let mut heap = Heap::new();
    let mut checker = TypeChecker::new();
    let d = qualified(&mut heap, "D");
    checker.under_new_scope(|tc| {
      tc.get_opened_definition(&d);
    });
  }
}
