//! Program builders shared by the integration tests.
//!
//! Instance methods take the receiver as their first parameter, so `foo()`
//! has arity 1 and a call `x.foo()` has shape arity 1.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use keel_ir::{
    CallShape, CheckKind, CheckType, ClassId, ClassKind, ExprId, ExprKind, FieldId, MethodId, MethodKind,
    Program, ResolutionShape, Selector, Span,
};

/// Builds a program around a root class `Object` and an `as_check_failure`
/// helper.
pub struct Builder {
    pub program: Program,
    pub object: ClassId,
    pub as_check_failure: MethodId,
}

impl Builder {
    pub fn new() -> Self {
        let mut program = Program::new();
        let object = program.add_class("Object", ClassKind::Class, None);
        program.root_class = Some(object);
        let body = program.arena.alloc(ExprKind::Nop, Span::DUMMY);
        let as_check_failure = program.add_method(
            "as_check_failure",
            MethodKind::GlobalFunction,
            None,
            ResolutionShape::new(2),
            body,
        );
        program.as_check_failure = Some(as_check_failure);
        Builder {
            program,
            object,
            as_check_failure,
        }
    }

    pub fn class(&mut self, name: &str, super_class: ClassId) -> ClassId {
        self.program.add_class(name, ClassKind::Class, Some(super_class))
    }

    /// Interface `name` with membership selector `is-<name>`.
    pub fn interface(&mut self, name: &str) -> ClassId {
        let interface = self.program.add_class(name, ClassKind::Interface, None);
        let selector = Selector::new(self.program.names.intern(&format!("is-{name}")), CallShape::new(1));
        self.program.class_mut(interface).typecheck_selector = Some(selector);
        interface
    }

    /// Mixin `name` with membership selector `is-<name>`.
    pub fn mixin(&mut self, name: &str) -> ClassId {
        let mixin = self.program.add_class(name, ClassKind::Mixin, None);
        let selector = Selector::new(self.program.names.intern(&format!("is-{name}")), CallShape::new(1));
        self.program.class_mut(mixin).typecheck_selector = Some(selector);
        mixin
    }

    /// Membership-test stub `is-<name>` on `holder`.
    pub fn is_stub(&mut self, holder: ClassId, name: &str) -> MethodId {
        let body = self.expr(ExprKind::Bool(true));
        self.program.add_method(
            &format!("is-{name}"),
            MethodKind::IsInterfaceStub,
            Some(holder),
            ResolutionShape::new(1),
            body,
        )
    }

    pub fn expr(&mut self, kind: ExprKind) -> ExprId {
        self.program.arena.alloc(kind, Span::DUMMY)
    }

    pub fn nop(&mut self) -> ExprId {
        self.expr(ExprKind::Nop)
    }

    pub fn int(&mut self, value: i64) -> ExprId {
        self.expr(ExprKind::Int(value))
    }

    pub fn param(&mut self, index: u32) -> ExprId {
        self.expr(ExprKind::Param(index))
    }

    pub fn seq(&mut self, items: &[ExprId]) -> ExprId {
        let range = self.program.arena.alloc_list(items);
        self.expr(ExprKind::Sequence(range))
    }

    pub fn constructor(&mut self, holder: ClassId) -> MethodId {
        let body = self.nop();
        self.program
            .add_method("constructor", MethodKind::Constructor, Some(holder), ResolutionShape::new(1), body)
    }

    pub fn method(&mut self, holder: ClassId, name: &str, arity: u16, body: ExprId) -> MethodId {
        self.program
            .add_method(name, MethodKind::Instance, Some(holder), ResolutionShape::new(arity), body)
    }

    pub fn function(&mut self, name: &str, arity: u16, body: ExprId) -> MethodId {
        self.program
            .add_method(name, MethodKind::GlobalFunction, None, ResolutionShape::new(arity), body)
    }

    /// Static method of `holder`; no receiver.
    pub fn static_method(&mut self, holder: ClassId, name: &str, arity: u16, body: ExprId) -> MethodId {
        self.program
            .add_method(name, MethodKind::GlobalFunction, Some(holder), ResolutionShape::new(arity), body)
    }

    pub fn factory(&mut self, holder: ClassId, name: &str, body: ExprId) -> MethodId {
        self.program
            .add_method(name, MethodKind::Factory, Some(holder), ResolutionShape::new(0), body)
    }

    /// `main` with `body`, registered as the entry point.
    pub fn entry(&mut self, body: ExprId) -> MethodId {
        let main = self.function("main", 0, body);
        self.program.entry_points.push(main);
        main
    }

    pub fn new_object(&mut self, class: ClassId, constructor: MethodId, args: &[ExprId]) -> ExprId {
        let args = self.program.arena.alloc_list(args);
        self.expr(ExprKind::CallConstructor {
            class,
            target: constructor,
            args,
        })
    }

    pub fn call_static(&mut self, target: MethodId, args: &[ExprId]) -> ExprId {
        let shape = self.program.arena.intern_shape(CallShape::for_static_call(arity(args)));
        let args = self.program.arena.alloc_list(args);
        self.expr(ExprKind::CallStatic { target, shape, args })
    }

    pub fn call_virtual(&mut self, name: &str, args: &[ExprId]) -> ExprId {
        let name = self.program.names.intern(name);
        let shape = self.program.arena.intern_shape(CallShape::new(arity(args)));
        let args = self.program.arena.alloc_list(args);
        self.expr(ExprKind::CallVirtual { name, shape, args })
    }

    pub fn typecheck(&mut self, kind: CheckKind, checked: ExprId, class: ClassId, nullable: bool) -> ExprId {
        let type_name = self.program.class(class).name;
        self.expr(ExprKind::Typecheck {
            kind,
            expr: checked,
            ty: CheckType::Class { class, nullable },
            type_name,
        })
    }

    pub fn load(&mut self, receiver: ExprId, field: FieldId) -> ExprId {
        self.expr(ExprKind::FieldLoad { receiver, field })
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

#[expect(clippy::cast_possible_truncation, reason = "test calls have a handful of arguments")]
fn arity(args: &[ExprId]) -> u16 {
    args.len() as u16
}
