//! Debug-mode validation of a shaken program.
//!
//! Code generation must never meet a reference to something tree shaking
//! removed. After compaction and fixup every surviving body is walked and
//! each reference is checked:
//!
//! - constructor calls name a kept class and a listed constructor
//! - static calls and global accesses name listed methods
//! - field accesses name a field of a kept class
//! - type checks name a kept class, an interface, or `any`/`null`
//! - no `Dot` node survives
//!
//! [`validate_shaken`] only runs its checks in debug builds.

use std::fmt;

use keel_ir::visitor::{walk_expr, Visitor};
use keel_ir::{CheckType, ClassId, ExprArena, ExprId, ExprKind, MethodId, Program};
use rustc_hash::FxHashSet;

/// A reference in a surviving body to something that was removed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    /// Method whose body holds the reference.
    pub method: MethodId,
    pub expr: ExprId,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} in {:?}: {}", self.expr, self.method, self.message)
    }
}

/// Assert, in debug builds, that `program` holds no dangling references.
pub fn validate_shaken(program: &Program) {
    if cfg!(debug_assertions) {
        let violations = shaken_violations(program);
        debug_assert!(
            violations.is_empty(),
            "shaken program has {} dangling reference(s), first: {}",
            violations.len(),
            violations.first().map(ToString::to_string).unwrap_or_default(),
        );
    }
}

/// Every dangling reference left in `program`.
pub fn shaken_violations(program: &Program) -> Vec<Violation> {
    let methods = program.all_methods();
    let mut checker = Checker {
        program,
        kept_classes: program.classes.iter().copied().collect(),
        live_methods: methods.iter().copied().collect(),
        method: MethodId::new(0),
        violations: Vec::new(),
    };
    for method in methods {
        checker.method = method;
        checker.visit_body(program.method(method).body, &program.arena);
    }
    checker.violations
}

struct Checker<'p> {
    program: &'p Program,
    kept_classes: FxHashSet<ClassId>,
    live_methods: FxHashSet<MethodId>,
    method: MethodId,
    violations: Vec<Violation>,
}

impl Checker<'_> {
    fn report(&mut self, expr: ExprId, message: String) {
        self.violations.push(Violation {
            method: self.method,
            expr,
            message,
        });
    }

    fn check_method(&mut self, expr: ExprId, target: MethodId) {
        if !self.live_methods.contains(&target) {
            let message = format!("reference to removed method {}", self.program.method_display_name(target));
            self.report(expr, message);
        }
    }

    fn check_class(&mut self, expr: ExprId, class: ClassId) {
        if !self.kept_classes.contains(&class) {
            let message = format!("reference to removed class {}", self.program.class_name(class));
            self.report(expr, message);
        }
    }
}

impl<'a> Visitor<'a> for Checker<'_> {
    fn visit_expr(&mut self, id: ExprId, arena: &'a ExprArena) {
        match *arena.kind(id) {
            ExprKind::CallConstructor { class, target, .. } => {
                self.check_class(id, class);
                self.check_method(id, target);
            }
            ExprKind::CallStatic { target, .. }
            | ExprKind::ReferenceGlobal(target)
            | ExprKind::AssignGlobal { global: target, .. } => self.check_method(id, target),
            ExprKind::FieldLoad { field, .. } | ExprKind::FieldStore { field, .. } => {
                self.check_class(id, self.program.field(field).holder);
            }
            ExprKind::Typecheck {
                ty: CheckType::Class { class, .. },
                ..
            } => {
                // Interfaces are never instantiated and stay valid check targets.
                if !self.program.class(class).is_interface() {
                    self.check_class(id, class);
                }
            }
            ExprKind::Dot { .. } => self.report(id, "unresolved member access".to_string()),
            _ => {}
        }
        walk_expr(self, id, arena);
    }
}
