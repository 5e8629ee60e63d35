//! Shared fixtures for tree shaking unit tests.
//!
//! Instance methods take the receiver as their first parameter, so a
//! method `foo()` has arity 1 and a call `x.foo()` has shape arity 1.

use keel_ir::{
    CallShape, CheckKind, CheckType, ClassId, ClassKind, ExprId, ExprKind, FieldId, MethodId, MethodKind,
    Program, ResolutionShape, Selector, Span,
};

/// A program with a root class `Object`.
pub(crate) fn program_with_object() -> (Program, ClassId) {
    let mut program = Program::new();
    let object = program.add_class("Object", ClassKind::Class, None);
    program.root_class = Some(object);
    (program, object)
}

pub(crate) fn class(program: &mut Program, name: &str, super_class: ClassId) -> ClassId {
    program.add_class(name, ClassKind::Class, Some(super_class))
}

pub(crate) fn expr(program: &mut Program, kind: ExprKind) -> ExprId {
    program.arena.alloc(kind, Span::DUMMY)
}

pub(crate) fn nop(program: &mut Program) -> ExprId {
    expr(program, ExprKind::Nop)
}

pub(crate) fn int(program: &mut Program, value: i64) -> ExprId {
    expr(program, ExprKind::Int(value))
}

pub(crate) fn this(program: &mut Program) -> ExprId {
    expr(program, ExprKind::This)
}

pub(crate) fn param(program: &mut Program, index: u32) -> ExprId {
    expr(program, ExprKind::Param(index))
}

pub(crate) fn seq(program: &mut Program, items: &[ExprId]) -> ExprId {
    let range = program.arena.alloc_list(items);
    expr(program, ExprKind::Sequence(range))
}

pub(crate) fn new_object(program: &mut Program, class: ClassId, constructor: MethodId, args: &[ExprId]) -> ExprId {
    let args = program.arena.alloc_list(args);
    expr(
        program,
        ExprKind::CallConstructor {
            class,
            target: constructor,
            args,
        },
    )
}

pub(crate) fn call_static(program: &mut Program, target: MethodId, args: &[ExprId]) -> ExprId {
    let shape = program.arena.intern_shape(CallShape::for_static_call(arity(args)));
    let args = program.arena.alloc_list(args);
    expr(program, ExprKind::CallStatic { target, shape, args })
}

/// `args[0].name(args[1..])`.
pub(crate) fn call_virtual(program: &mut Program, name: &str, args: &[ExprId]) -> ExprId {
    let name = program.names.intern(name);
    let shape = program.arena.intern_shape(CallShape::new(arity(args)));
    let args = program.arena.alloc_list(args);
    expr(program, ExprKind::CallVirtual { name, shape, args })
}

pub(crate) fn typecheck(program: &mut Program, kind: CheckKind, checked: ExprId, ty: CheckType) -> ExprId {
    let type_name = match ty {
        CheckType::Class { class, .. } => program.class(class).name,
        CheckType::Any => program.names.intern("any"),
        CheckType::NullOnly => program.names.intern("Null"),
    };
    expr(
        program,
        ExprKind::Typecheck {
            kind,
            expr: checked,
            ty,
            type_name,
        },
    )
}

pub(crate) fn load(program: &mut Program, receiver: ExprId, field: FieldId) -> ExprId {
    expr(program, ExprKind::FieldLoad { receiver, field })
}

pub(crate) fn store(program: &mut Program, receiver: ExprId, field: FieldId, value: ExprId) -> ExprId {
    expr(program, ExprKind::FieldStore { receiver, field, value })
}

/// Instance method of `holder` with `arity` parameters including `this`.
pub(crate) fn method(program: &mut Program, holder: ClassId, name: &str, arity: u16, body: ExprId) -> MethodId {
    program.add_method(name, MethodKind::Instance, Some(holder), ResolutionShape::new(arity), body)
}

pub(crate) fn constructor(program: &mut Program, holder: ClassId) -> MethodId {
    let body = nop(program);
    program.add_method("constructor", MethodKind::Constructor, Some(holder), ResolutionShape::new(1), body)
}

pub(crate) fn function(program: &mut Program, name: &str, arity: u16, body: ExprId) -> MethodId {
    program.add_method(name, MethodKind::GlobalFunction, None, ResolutionShape::new(arity), body)
}

/// Top-level `main` with `body`, registered as the entry point.
pub(crate) fn entry(program: &mut Program, body: ExprId) -> MethodId {
    let main = function(program, "main", 0, body);
    program.entry_points.push(main);
    main
}

/// Install the `as_check_failure(value, type_name)` helper.
pub(crate) fn as_check_failure(program: &mut Program) -> MethodId {
    let body = nop(program);
    let helper = function(program, "as_check_failure", 2, body);
    program.as_check_failure = Some(helper);
    helper
}

/// Interface `name` with its membership-test selector `is-<name>`.
pub(crate) fn interface(program: &mut Program, name: &str) -> ClassId {
    let interface = program.add_class(name, ClassKind::Interface, None);
    let selector = Selector::new(program.names.intern(&format!("is-{name}")), CallShape::new(1));
    program.class_mut(interface).typecheck_selector = Some(selector);
    interface
}

/// Membership-test stub `is-<name>` on `holder`.
pub(crate) fn is_stub(program: &mut Program, holder: ClassId, name: &str) -> MethodId {
    let body = expr(program, ExprKind::Bool(true));
    program.add_method(
        &format!("is-{name}"),
        MethodKind::IsInterfaceStub,
        Some(holder),
        ResolutionShape::new(1),
        body,
    )
}

#[expect(clippy::cast_possible_truncation, reason = "test calls have a handful of arguments")]
fn arity(args: &[ExprId]) -> u16 {
    args.len() as u16
}
