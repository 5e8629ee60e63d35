//! Property-based tests for reachability and rewriting.
//!
//! Random class hierarchies with random method bodies are shaken and
//! checked for:
//! 1. Closure: every grown method's one-step growth stays inside the grown sets
//! 2. Monotonicity: grown sets never shrink, and a quiesced grower stays put
//! 3. Rewrite safety: no surviving body refers to removed code, and
//!    everything a retained body reached before fixup is still listed
//! 4. Idempotence: a second fixup rewrites nothing
//! 5. Determinism: shaking the same program twice gives the same result

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]
#![allow(clippy::doc_markdown, reason = "Proptest macros generate code with these patterns")]

mod common;

use common::Builder;
use keel_ir::{CheckKind, ClassId, ExprId, ExprKind, FieldId, MethodId, Program};
use keel_shake::{
    grow, shake, shaken_violations, tree_shake, Fixup, GrowState, Grown, Growth, NullTreeLogger,
    PropagationFacts, Queryables, ShakeOptions, TreeGrower,
};
use proptest::prelude::*;

const NAMES: [&str; 3] = ["foo", "bar", "baz"];

// -- Program Generation Strategies --

/// One expression in a generated body. Indices wrap around the available
/// classes, names, methods, statics, or fields.
#[derive(Clone, Debug)]
enum Action {
    New(usize),
    Send(usize),
    Call(usize),
    Is(usize),
    As(usize),
    Helper(usize),
    Load(usize),
}

#[derive(Clone, Debug)]
struct ProgramShape {
    /// Super of class `i`: `0` is `Object`, `k` is generated class `k - 1`.
    supers: Vec<usize>,
    /// Instance methods as `(holder, name, body)`.
    methods: Vec<(usize, usize, Vec<Action>)>,
    main: Vec<Action>,
}

fn action_strategy() -> impl Strategy<Value = Action> {
    prop_oneof![
        3 => (0..16usize).prop_map(Action::New),
        3 => (0..16usize).prop_map(Action::Send),
        2 => (0..16usize).prop_map(Action::Call),
        1 => (0..16usize).prop_map(Action::Is),
        1 => (0..16usize).prop_map(Action::As),
        2 => (0..16usize).prop_map(Action::Helper),
        1 => (0..16usize).prop_map(Action::Load),
    ]
}

fn body_strategy() -> impl Strategy<Value = Vec<Action>> {
    prop::collection::vec(action_strategy(), 0..4)
}

fn program_strategy() -> impl Strategy<Value = ProgramShape> {
    (
        prop::collection::vec(0..16usize, 1..6),
        prop::collection::vec((0..16usize, 0..NAMES.len(), body_strategy()), 0..10),
        prop::collection::vec(action_strategy(), 1..4),
    )
        .prop_map(|(supers, methods, main)| ProgramShape { supers, methods, main })
}

struct Generated {
    builder: Builder,
    classes: Vec<ClassId>,
    constructors: Vec<MethodId>,
    /// One static per class, never instantiating it.
    statics: Vec<MethodId>,
    fields: Vec<FieldId>,
    methods: Vec<MethodId>,
}

impl Generated {
    fn body(&mut self, actions: &[Action]) -> ExprId {
        let b = &mut self.builder;
        let mut items = Vec::with_capacity(actions.len());
        for action in actions {
            let item = match *action {
                Action::New(k) => {
                    let k = k % self.classes.len();
                    b.new_object(self.classes[k], self.constructors[k], &[])
                }
                Action::Send(n) => {
                    let receiver = b.param(0);
                    b.call_virtual(NAMES[n % NAMES.len()], &[receiver])
                }
                Action::Call(_) if self.methods.is_empty() => b.nop(),
                Action::Call(m) => {
                    let receiver = b.param(0);
                    b.call_static(self.methods[m % self.methods.len()], &[receiver])
                }
                Action::Is(k) => {
                    let value = b.param(0);
                    b.typecheck(CheckKind::Is, value, self.classes[k % self.classes.len()], false)
                }
                Action::As(k) => {
                    let value = b.param(0);
                    b.typecheck(CheckKind::As, value, self.classes[k % self.classes.len()], k % 2 == 0)
                }
                Action::Helper(k) => b.call_static(self.statics[k % self.statics.len()], &[]),
                Action::Load(k) => {
                    let receiver = b.param(0);
                    b.load(receiver, self.fields[k % self.fields.len()])
                }
            };
            items.push(item);
        }
        b.seq(&items)
    }
}

fn build(shape: &ProgramShape) -> Program {
    let mut generated = Generated {
        builder: Builder::new(),
        classes: Vec::new(),
        constructors: Vec::new(),
        statics: Vec::new(),
        fields: Vec::new(),
        methods: Vec::new(),
    };
    for (i, &sup) in shape.supers.iter().enumerate() {
        let super_class = match sup % (i + 1) {
            0 => generated.builder.object,
            k => generated.classes[k - 1],
        };
        let class = generated.builder.class(&format!("C{i}"), super_class);
        generated.classes.push(class);
        let constructor = generated.builder.constructor(class);
        generated.constructors.push(constructor);
        let value = generated.builder.int(i64::try_from(i).unwrap());
        let helper = generated.builder.static_method(class, &format!("helper{i}"), 0, value);
        generated.statics.push(helper);
        let field = generated.builder.program.add_field("x", class);
        generated.fields.push(field);
    }
    for &(holder, name, _) in &shape.methods {
        let body = generated.builder.nop();
        let holder = generated.classes[holder % generated.classes.len()];
        let method = generated.builder.method(holder, NAMES[name], 1, body);
        generated.methods.push(method);
    }
    for (index, (_, _, actions)) in shape.methods.iter().enumerate() {
        let body = generated.body(actions);
        let method = generated.methods[index];
        generated.builder.program.method_mut(method).body = body;
    }
    let main = generated.body(&shape.main);
    generated.builder.entry(main);
    generated.builder.program
}

fn arena_snapshot(program: &Program) -> Vec<ExprKind> {
    (0..program.arena.len())
        .map(|index| *program.arena.kind(ExprId::new(u32::try_from(index).unwrap())))
        .collect()
}

fn grow_to_fixpoint(program: &Program) -> Grown {
    let queryables = Queryables::from_plain_shapes(program);
    TreeGrower::new(program, &queryables, &PropagationFacts::new()).run(&mut NullTreeLogger)
}

fn shaken(shape: &ProgramShape) -> Program {
    let mut program = build(shape);
    tree_shake(&mut program, &ShakeOptions::default(), &PropagationFacts::new());
    program
}

// -- Properties --

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn grown_sets_are_closed_under_one_step_growth(shape in program_strategy()) {
        let program = build(&shape);
        let queryables = Queryables::from_plain_shapes(&program);
        let oracle = PropagationFacts::new();
        let grown = TreeGrower::new(&program, &queryables, &oracle).run(&mut NullTreeLogger);
        let instantiated: Vec<ClassId> = grown
            .classes
            .iter()
            .copied()
            .filter(|&class| grown.is_instantiated(class))
            .collect();

        for &method in &grown.methods {
            let growth = grow(&program, method, &oracle);
            for class in &growth.classes {
                prop_assert!(grown.is_instantiated(*class));
            }
            for reached in &growth.methods {
                prop_assert!(grown.methods.contains(reached));
            }
            for selector in &growth.untyped {
                for &class in &instantiated {
                    if let Some(target) = queryables.get(class).lookup(selector) {
                        prop_assert!(grown.methods.contains(&target));
                    }
                }
            }
            for (selector, target) in &growth.typed {
                for &class in &instantiated {
                    if queryables.get(class).lookup(selector) == Some(*target) {
                        prop_assert!(grown.methods.contains(target));
                    }
                }
            }
        }
    }

    #[test]
    fn grown_sets_only_grow(shape in program_strategy()) {
        let program = build(&shape);
        let queryables = Queryables::from_plain_shapes(&program);
        let oracle = PropagationFacts::new();
        let mut grower = TreeGrower::new(&program, &queryables, &oracle);
        let mut logger = NullTreeLogger;

        let mut classes = 0;
        let mut methods = 0;
        loop {
            let more = grower.step(&mut logger);
            prop_assert!(grower.grown_classes().len() >= classes);
            prop_assert!(grower.grown_methods().len() >= methods);
            classes = grower.grown_classes().len();
            methods = grower.grown_methods().len();
            if !more {
                break;
            }
        }

        prop_assert_eq!(grower.state(), GrowState::Done);
        let batches = grower.batches();
        prop_assert!(!grower.step(&mut logger));
        prop_assert_eq!(grower.grown_classes().len(), classes);
        prop_assert_eq!(grower.grown_methods().len(), methods);
        prop_assert_eq!(grower.batches(), batches);
    }

    #[test]
    fn shaken_bodies_only_refer_to_kept_code(shape in program_strategy()) {
        let program = shaken(&shape);
        prop_assert!(shaken_violations(&program).is_empty());
    }

    #[test]
    fn compaction_keeps_everything_retained_bodies_reach(shape in program_strategy()) {
        let mut program = build(&shape);
        let grown = grow_to_fixpoint(&program);
        let oracle = PropagationFacts::new();
        let reach: Vec<(MethodId, Growth)> = grown
            .methods
            .iter()
            .map(|&method| (method, grow(&program, method, &oracle)))
            .collect();

        shake(&mut program, &grown);

        let listed = program.all_methods();
        for (method, growth) in &reach {
            prop_assert!(listed.contains(method));
            for reached in &growth.methods {
                prop_assert!(
                    listed.contains(reached),
                    "{} reaches {} which was dropped",
                    program.method_display_name(*method),
                    program.method_display_name(*reached)
                );
            }
            for class in &growth.classes {
                prop_assert!(program.classes.contains(class));
            }
        }
    }

    #[test]
    fn second_fixup_changes_nothing(shape in program_strategy()) {
        let mut program = build(&shape);
        let grown = grow_to_fixpoint(&program);
        let fixup = Fixup::for_grown(&program, &grown);
        shake(&mut program, &grown);
        let before = arena_snapshot(&program);
        let mut rewrites = 0;
        for method in program.all_methods() {
            rewrites += fixup.fixup_method(&mut program, method);
        }
        prop_assert_eq!(rewrites, 0);
        prop_assert_eq!(arena_snapshot(&program), before);
    }

    #[test]
    fn shaking_is_deterministic(shape in program_strategy()) {
        let first = shaken(&shape);
        let second = shaken(&shape);
        prop_assert_eq!(&first.classes, &second.classes);
        prop_assert_eq!(first.all_methods(), second.all_methods());
        prop_assert_eq!(arena_snapshot(&first), arena_snapshot(&second));
    }
}
