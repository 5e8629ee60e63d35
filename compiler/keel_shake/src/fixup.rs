//! Rewrites references to code that tree shaking removed.
//!
//! After compaction, surviving bodies can still mention classes that are
//! never instantiated and methods that were dropped. Each such node is
//! replaced in place by something that still evaluates every operand, in
//! the original order, but no longer performs the impossible operation:
//!
//! | Node | Condition | Replacement |
//! |------|-----------|-------------|
//! | `is`/`as` check | target valid, or `any` | unchanged |
//! | nullable check | target not valid | check against `null` only |
//! | `is` check | target not valid | `(expr; false)` |
//! | `as` check | target not valid | `as_check_failure(expr, "<Type>")` |
//! | static/constructor call | target not live | the argument, or `(args…)` |
//! | field load | holder not valid | the receiver |
//! | field store | holder not valid | `(receiver; value)` |
//!
//! Rewriting is idempotent: a second run over a fixed-up body changes
//! nothing.

use keel_ir::{
    ensure_sufficient_stack, CallShape, CheckKind, CheckType, ClassId, ExprId, ExprKind, ExprRange,
    MethodId, MethodKind, Name, Program,
};
use rustc_hash::FxHashSet;

use crate::Grown;

/// Classes a type check or field access can still meaningfully refer to.
///
/// That is `classes`, every interface they implement (transitively,
/// including super-interfaces), and every mixin whose membership-test stub
/// one of `classes` carries.
pub fn valid_check_targets(
    program: &Program,
    classes: impl IntoIterator<Item = ClassId>,
) -> FxHashSet<ClassId> {
    let classes: Vec<ClassId> = classes.into_iter().collect();
    let mut valid: FxHashSet<ClassId> = classes.iter().copied().collect();

    fn add_interface(program: &Program, interface: ClassId, valid: &mut FxHashSet<ClassId>) {
        if !valid.insert(interface) {
            return;
        }
        let interface = program.class(interface);
        for &sub in &interface.interfaces {
            ensure_sufficient_stack(|| add_interface(program, sub, valid));
        }
        if let Some(super_class) = interface.super_class {
            ensure_sufficient_stack(|| add_interface(program, super_class, valid));
        }
    }

    for &class in &classes {
        for &interface in &program.class(class).interfaces {
            add_interface(program, interface, &mut valid);
        }
    }

    let stub_names: FxHashSet<Name> = classes
        .iter()
        .flat_map(|&class| program.class(class).methods.iter().copied())
        .map(|method| program.method(method))
        .filter(|method| method.kind == MethodKind::IsInterfaceStub)
        .map(|method| method.name)
        .collect();
    for &class in &program.classes {
        let class_ref = program.class(class);
        if !class_ref.is_mixin() {
            continue;
        }
        if let Some(selector) = &class_ref.typecheck_selector {
            if stub_names.contains(&selector.name()) {
                valid.insert(class);
            }
        }
    }
    valid
}

/// In-place rewriter for surviving method bodies.
#[derive(Clone, Debug)]
pub struct Fixup {
    valid_targets: FxHashSet<ClassId>,
    live_methods: FxHashSet<MethodId>,
    as_check_failure: Option<MethodId>,
}

impl Fixup {
    pub fn new(
        valid_targets: FxHashSet<ClassId>,
        live_methods: FxHashSet<MethodId>,
        as_check_failure: Option<MethodId>,
    ) -> Self {
        Fixup {
            valid_targets,
            live_methods,
            as_check_failure,
        }
    }

    /// Build the fixup for a finished fixpoint. Must run before compaction:
    /// membership-test stubs that were never grown still mark their mixin
    /// as a valid target.
    pub fn for_grown(program: &Program, grown: &Grown) -> Self {
        let classes = grown.classes.iter().copied().filter(|&c| !program.class(c).is_mixin());
        Fixup::new(
            valid_check_targets(program, classes),
            grown.methods.iter().copied().collect(),
            program.as_check_failure,
        )
    }

    pub fn is_valid_target(&self, class: ClassId) -> bool {
        self.valid_targets.contains(&class)
    }

    pub fn is_live(&self, method: MethodId) -> bool {
        self.live_methods.contains(&method)
    }

    /// Rewrite the body of `method`. Returns the number of nodes replaced.
    pub fn fixup_method(&self, program: &mut Program, method: MethodId) -> usize {
        let body = program.method(method).body;
        if body.is_valid() {
            self.fixup_expr(program, body)
        } else {
            0
        }
    }

    /// Rewrite the tree rooted at `id`, children first.
    ///
    /// # Panics
    ///
    /// Panics on an unresolved `Dot` node, and on an impossible `as` check
    /// when the program has no as-check failure helper.
    pub fn fixup_expr(&self, program: &mut Program, id: ExprId) -> usize {
        let mut rewrites = 0;
        for child in program.arena.children(id) {
            rewrites += ensure_sufficient_stack(|| self.fixup_expr(program, child));
        }

        let node = *program.arena.kind(id);
        let replacement = match node {
            ExprKind::Typecheck {
                kind,
                expr,
                ty: CheckType::Class { class, nullable },
                type_name,
            } if !self.is_valid_target(class) => Some(self.impossible_check(
                program,
                id,
                ImpossibleCheck {
                    kind,
                    expr,
                    class,
                    nullable,
                    type_name,
                },
            )),
            ExprKind::CallStatic { target, args, .. } | ExprKind::CallConstructor { target, args, .. }
                if !self.is_live(target) =>
            {
                Some(discard(program, args))
            }
            ExprKind::FieldLoad { receiver, field } if !self.is_valid_target(program.field(field).holder) => {
                Some(*program.arena.kind(receiver))
            }
            ExprKind::FieldStore {
                receiver,
                field,
                value,
            } if !self.is_valid_target(program.field(field).holder) => {
                Some(ExprKind::Sequence(program.arena.alloc_list(&[receiver, value])))
            }
            ExprKind::Dot { name, .. } => panic!(
                "unresolved member access `.{}` survived to tree shaking",
                program.names.lookup(name)
            ),
            _ => None,
        };

        match replacement {
            Some(kind) => {
                program.arena.replace(id, kind);
                rewrites + 1
            }
            None => rewrites,
        }
    }

    fn impossible_check(&self, program: &mut Program, id: ExprId, check: ImpossibleCheck) -> ExprKind {
        let ImpossibleCheck {
            kind,
            expr,
            class,
            nullable,
            type_name,
        } = check;
        // Only `null` can still pass.
        if nullable {
            return ExprKind::Typecheck {
                kind,
                expr,
                ty: CheckType::NullOnly,
                type_name,
            };
        }

        let span = program.arena.span(id);
        if !kind.is_as_check() {
            let result = program.arena.alloc(ExprKind::Bool(false), span);
            return ExprKind::Sequence(program.arena.alloc_list(&[expr, result]));
        }

        let Some(failure) = self.as_check_failure else {
            panic!(
                "`as {}` can never succeed but the program has no as-check failure helper",
                program.class_name(class)
            );
        };
        let name = program.class(class).name;
        let message = program.arena.alloc(ExprKind::Str(name), span);
        let args = program.arena.alloc_list(&[expr, message]);
        let shape = program.arena.intern_shape(CallShape::for_static_call(2));
        ExprKind::CallStatic {
            target: failure,
            shape,
            args,
        }
    }
}

/// A type check against a class no surviving value can be.
struct ImpossibleCheck {
    kind: CheckKind,
    expr: ExprId,
    class: ClassId,
    nullable: bool,
    type_name: Name,
}

/// Evaluate `args` in order and drop the call.
fn discard(program: &Program, args: ExprRange) -> ExprKind {
    match program.arena.list(args) {
        [single] => *program.arena.kind(*single),
        _ => ExprKind::Sequence(args),
    }
}
