//! Expression kinds of resolved, optimized method bodies.
//!
//! This is the IR the tree shaker consumes: calls are already classified
//! into constructor invocations, static calls (including devirtualized
//! instance calls), and virtual calls. Children are referenced by
//! [`ExprId`]/[`ExprRange`] into the owning [`ExprArena`](crate::ExprArena).

use crate::{ClassId, ExprId, ExprRange, FieldId, MethodId, Name, ShapeId};

/// Short-circuiting boolean operator.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum LogicalOp {
    And,
    Or,
}

/// Where a type check came from.
///
/// Only `Is` produces a boolean; every other kind is an `as` check that
/// throws when the value doesn't satisfy the type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum CheckKind {
    /// `x is T`.
    Is,
    /// `x as T`.
    As,
    /// Implicit check of a typed parameter on method entry.
    ParameterAs,
    /// Implicit check when assigning to a typed local.
    LocalAs,
    /// Implicit check of a method's return value.
    ReturnAs,
    /// Implicit check when storing into a typed field.
    FieldAs,
}

impl CheckKind {
    #[inline]
    pub fn is_as_check(self) -> bool {
        !matches!(self, CheckKind::Is)
    }
}

/// The type a check tests against.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum CheckType {
    /// Every value satisfies `any`.
    Any,
    /// Only `null` satisfies the check.
    NullOnly,
    /// Instances of `class` (or its subclasses/implementors), plus `null`
    /// when `nullable`.
    Class { class: ClassId, nullable: bool },
}

impl CheckType {
    #[inline]
    pub fn is_nullable(self) -> bool {
        match self {
            CheckType::Any | CheckType::NullOnly => true,
            CheckType::Class { nullable, .. } => nullable,
        }
    }

    /// The class the check refers to, if any.
    #[inline]
    pub fn class(self) -> Option<ClassId> {
        match self {
            CheckType::Class { class, .. } => Some(class),
            CheckType::Any | CheckType::NullOnly => None,
        }
    }
}

/// An expression node.
///
/// `Copy` so nodes can be read out of the arena and then replaced in place.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum ExprKind {
    /// Does nothing, evaluates to `null`.
    Nop,
    Null,
    Bool(bool),
    Int(i64),
    Str(Name),

    /// The receiver of the enclosing instance member.
    This,
    /// Positional parameter of the enclosing method (receiver excluded).
    Param(u32),
    Local(u32),
    AssignLocal { local: u32, value: ExprId },

    /// Read of a global. The global's initializer is the referenced method.
    ReferenceGlobal(MethodId),
    /// Write of a global.
    AssignGlobal { global: MethodId, value: ExprId },

    /// Evaluate each element in order; the value is the last element's.
    Sequence(ExprRange),
    If {
        cond: ExprId,
        then_branch: ExprId,
        /// `ExprId::INVALID` when there is no else branch.
        else_branch: ExprId,
    },
    While { cond: ExprId, body: ExprId },
    Not(ExprId),
    Logical { op: LogicalOp, left: ExprId, right: ExprId },
    /// `ExprId::INVALID` for a bare `return`.
    Return(ExprId),

    FieldLoad { receiver: ExprId, field: FieldId },
    FieldStore { receiver: ExprId, field: FieldId, value: ExprId },

    /// `Class.constructor args`: allocates an instance of `class` and runs
    /// `target` on it.
    CallConstructor { class: ClassId, target: MethodId, args: ExprRange },
    /// Call with a statically known target. For instance methods the first
    /// argument is the receiver.
    CallStatic { target: MethodId, shape: ShapeId, args: ExprRange },
    /// Dynamically dispatched call. The first argument is the receiver.
    CallVirtual { name: Name, shape: ShapeId, args: ExprRange },

    Typecheck {
        kind: CheckKind,
        expr: ExprId,
        ty: CheckType,
        /// Name used in error messages; survives rewrites of `ty`.
        type_name: Name,
    },

    /// Unresolved member access. Only exists before resolution finishes;
    /// must never reach the tree shaker's rewrite phase.
    Dot { receiver: ExprId, name: Name },
}
