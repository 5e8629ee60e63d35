//! One-step reachability from a single method body.
//!
//! [`grow`] is a pure function: it reads one method and returns what that
//! method can reach directly. Accumulating those discoveries into the grown
//! sets is the job of [`TreeGrower`](crate::TreeGrower).
//!
//! # Rules
//!
//! | Node | Discovery |
//! |------|-----------|
//! | constructor call | the class and the constructor |
//! | static call to a function, factory, or global | the method |
//! | static call to an instance method on `super` or a mixin | the method |
//! | other static call to an instance method | typed selector `(selector, target)` |
//! | virtual call | untyped selector |
//! | global read or write | the global's initializer |
//! | `as` check | the as-check failure helper |
//! | nullable check | the `identical` primitive |
//! | check against an interface or mixin | its membership-test selector, untyped |
//!
//! Calls the oracle proves dead record nothing, but their arguments are
//! still walked.

use keel_ir::visitor::{walk_expr, Visitor};
use keel_ir::{
    CallSelector, CheckKind, CheckType, ClassId, ExprArena, ExprId, ExprKind, ExprRange, FxIndexSet,
    MethodId, Program, Selector, ShapeId,
};

use crate::TypeOracle;

/// Everything one method body reaches directly.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Growth {
    pub classes: FxIndexSet<ClassId>,
    pub methods: FxIndexSet<MethodId>,
    /// Calls whose receiver class is statically exact: only the recorded
    /// target can run, and only if some grown class resolves the selector
    /// to it.
    pub typed: FxIndexSet<(CallSelector, MethodId)>,
    /// Calls that must be matched against every grown class.
    pub untyped: FxIndexSet<CallSelector>,
}

impl Growth {
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
            && self.methods.is_empty()
            && self.typed.is_empty()
            && self.untyped.is_empty()
    }
}

/// Compute what `method` reaches directly.
///
/// Abstract methods and methods proven dead reach nothing.
pub fn grow(program: &Program, method: MethodId, oracle: &dyn TypeOracle) -> Growth {
    let method_ref = program.method(method);
    if method_ref.is_abstract() || method_ref.is_dead() || oracle.is_dead_method(method) {
        return Growth::default();
    }
    let mut grower = Grower {
        program,
        oracle,
        caller: method,
        caller_holder: method_ref.holder,
        growth: Growth::default(),
    };
    grower.visit_body(method_ref.body, &program.arena);
    grower.growth
}

struct Grower<'p> {
    program: &'p Program,
    oracle: &'p dyn TypeOracle,
    caller: MethodId,
    caller_holder: Option<ClassId>,
    growth: Growth,
}

impl Grower<'_> {
    fn static_call(&mut self, target: MethodId, shape: ShapeId, args: ExprRange, arena: &ExprArena) {
        let callee = self.program.method(target);
        let holder = match callee.holder {
            Some(holder) if callee.is_instance() => holder,
            _ => {
                self.growth.methods.insert(target);
                return;
            }
        };
        if self.program.class(holder).is_mixin() || self.is_super_call(holder, args, arena) {
            self.growth.methods.insert(target);
            return;
        }
        let selector = Selector::new(callee.name, arena.shape(shape).clone());
        self.growth.typed.insert((selector, target));
    }

    /// Whether a call on `this` to a method of `target_holder` is a super
    /// call.
    ///
    /// Static calls on `this` only ever target the caller's own class, an
    /// ancestor of it, or (after devirtualization) a subclass of it.
    /// Anything else was mis-synthesized upstream and panics.
    fn is_super_call(&self, target_holder: ClassId, args: ExprRange, arena: &ExprArena) -> bool {
        let Some(&receiver) = arena.list(args).first() else {
            return false;
        };
        if !matches!(arena.kind(receiver), ExprKind::This) {
            return false;
        }
        let Some(caller_holder) = self.caller_holder else {
            return false;
        };
        let program = self.program;
        if target_holder == caller_holder || program.is_proper_ancestor(caller_holder, target_holder) {
            return false;
        }
        if program.is_proper_ancestor(target_holder, caller_holder) {
            return true;
        }
        let caller_class = program.class(caller_holder);
        if caller_class.is_mixin() || caller_class.is_interface() {
            // Mixin code runs inside its consumers; only the root class is a
            // known ancestor.
            return program.root_class == Some(target_holder);
        }
        panic!(
            "call on `this` in {} targets {}, which is not an ancestor of {}",
            program.method_display_name(self.caller),
            program.class_name(target_holder),
            program.class_name(caller_holder),
        );
    }

    fn typecheck(&mut self, kind: CheckKind, ty: CheckType) {
        let program = self.program;
        if ty != CheckType::Any && ty.is_nullable() {
            if let Some(identical) = program.identical {
                self.growth.methods.insert(identical);
            }
        }
        if kind.is_as_check() {
            if let Some(failure) = program.as_check_failure {
                self.growth.methods.insert(failure);
            }
        }
        if let Some(class) = ty.class() {
            let class = program.class(class);
            if class.is_interface() || class.is_mixin() {
                if let Some(selector) = &class.typecheck_selector {
                    self.growth.untyped.insert(selector.clone());
                }
            }
        }
    }
}

impl<'a> Visitor<'a> for Grower<'_> {
    fn visit_expr(&mut self, id: ExprId, arena: &'a ExprArena) {
        match *arena.kind(id) {
            ExprKind::CallConstructor { class, target, .. } => {
                if !self.oracle.is_dead_call(id) {
                    self.growth.classes.insert(class);
                    self.growth.methods.insert(target);
                }
            }
            ExprKind::CallStatic { target, shape, args } => {
                if !self.oracle.is_dead_call(id) {
                    self.static_call(target, shape, args, arena);
                }
            }
            ExprKind::CallVirtual { name, shape, .. } => {
                if !self.oracle.is_dead_call(id) {
                    self.growth
                        .untyped
                        .insert(Selector::new(name, arena.shape(shape).clone()));
                }
            }
            ExprKind::ReferenceGlobal(global) | ExprKind::AssignGlobal { global, .. } => {
                self.growth.methods.insert(global);
            }
            ExprKind::Typecheck { kind, ty, .. } => self.typecheck(kind, ty),
            _ => {}
        }
        walk_expr(self, id, arena);
    }
}
