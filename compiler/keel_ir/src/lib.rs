//! Keel IR - whole-program intermediate representation.
//!
//! This crate contains the data structures the back half of the Keel
//! compiler operates on once resolution, type propagation, and optimization
//! are done:
//!
//! - Names ([`Name`], [`StringInterner`]) and source spans ([`Span`])
//! - Classes, methods, and fields owned by a [`Program`] and referred to by ID
//! - Call shapes and selectors ([`CallShape`], [`ResolutionShape`], [`Selector`])
//! - Method bodies as expression trees in a shared [`ExprArena`]
//! - A [`Visitor`](visitor::Visitor) for read-only traversals
//!
//! # Design Philosophy
//!
//! - **Intern Everything**: strings → `Name(u32)`, call shapes → `ShapeId(u32)`
//! - **Flatten Everything**: no `Box<Expr>`, children are `ExprId(u32)` indices
//! - **Identity by ID**: two methods are never equal by content
//! - **Deterministic iteration**: sets whose order is observable are
//!   [`FxIndexSet`]/[`FxIndexMap`] (insertion ordered)

mod arena;
mod expr;
mod ids;
mod interner;
mod name;
mod program;
mod selector;
mod shape;
mod span;
mod stack;
pub mod visitor;

pub use arena::{ChildList, ExprArena};
pub use expr::{CheckKind, CheckType, ExprKind, LogicalOp};
pub use ids::{ClassId, ExprId, ExprRange, FieldId, MethodId, ShapeId};
pub use interner::StringInterner;
pub use name::Name;
pub use program::{
    Class, ClassFlags, ClassKind, Field, Method, MethodFlags, MethodKind, Program, SuperChain,
};
pub use selector::{CallSelector, PlainSelector, Selector};
pub use shape::{CallShape, NameList, NamedParameter, PlainShape, ResolutionShape};
pub use span::Span;
pub use stack::ensure_sufficient_stack;

/// Insertion-ordered hash map with the Fx hasher.
pub type FxIndexMap<K, V> = indexmap::IndexMap<K, V, rustc_hash::FxBuildHasher>;

/// Insertion-ordered hash set with the Fx hasher.
pub type FxIndexSet<T> = indexmap::IndexSet<T, rustc_hash::FxBuildHasher>;
