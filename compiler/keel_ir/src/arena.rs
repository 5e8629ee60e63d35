//! Expression arena shared by all method bodies of a program.
//!
//! Struct-of-arrays layout: `kinds` and `spans` are parallel arrays indexed
//! by [`ExprId`]; argument and sequence lists live in one flat `Vec<ExprId>`
//! indexed by [`ExprRange`]; call shapes are interned into a pool indexed by
//! [`ShapeId`].
//!
//! Rewrites replace a node's kind in place, so parents keep pointing at the
//! same `ExprId`. Nodes that become unreachable after a rewrite are simply
//! left behind.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::expr::ExprKind;
use crate::shape::CallShape;
use crate::{ExprId, ExprRange, ShapeId, Span};

/// Children of a single node, in evaluation order.
pub type ChildList = SmallVec<[ExprId; 4]>;

#[derive(Clone, Debug, Default)]
pub struct ExprArena {
    kinds: Vec<ExprKind>,
    spans: Vec<Span>,
    expr_lists: Vec<ExprId>,
    shapes: Vec<CallShape>,
    shape_ids: FxHashMap<CallShape, ShapeId>,
}

impl ExprArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a node, returning its ID.
    pub fn alloc(&mut self, kind: ExprKind, span: Span) -> ExprId {
        let id = ExprId::new(to_u32(self.kinds.len(), "expressions"));
        self.kinds.push(kind);
        self.spans.push(span);
        id
    }

    /// Allocate a contiguous list of expression IDs (arguments, sequence elements).
    pub fn alloc_list(&mut self, ids: &[ExprId]) -> ExprRange {
        if ids.is_empty() {
            return ExprRange::EMPTY;
        }
        let start = to_u32(self.expr_lists.len(), "expression lists");
        let len = u16::try_from(ids.len())
            .unwrap_or_else(|_| panic!("expression list of {} elements exceeds u16::MAX", ids.len()));
        self.expr_lists.extend_from_slice(ids);
        ExprRange::new(start, len)
    }

    /// Intern a call shape.
    pub fn intern_shape(&mut self, shape: CallShape) -> ShapeId {
        if let Some(&id) = self.shape_ids.get(&shape) {
            return id;
        }
        let id = ShapeId::new(to_u32(self.shapes.len(), "call shapes"));
        self.shapes.push(shape.clone());
        self.shape_ids.insert(shape, id);
        id
    }

    #[inline]
    pub fn kind(&self, id: ExprId) -> &ExprKind {
        &self.kinds[id.index()]
    }

    #[inline]
    pub fn span(&self, id: ExprId) -> Span {
        self.spans[id.index()]
    }

    #[inline]
    pub fn list(&self, range: ExprRange) -> &[ExprId] {
        let start = range.start as usize;
        &self.expr_lists[start..start + range.len()]
    }

    #[inline]
    pub fn shape(&self, id: ShapeId) -> &CallShape {
        &self.shapes[id.index()]
    }

    /// Replace the kind of an existing node, keeping its span.
    pub fn replace(&mut self, id: ExprId, kind: ExprKind) {
        self.kinds[id.index()] = kind;
    }

    /// Number of allocated nodes.
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// The direct children of `id`, in evaluation order.
    ///
    /// Sentinel (`INVALID`) children are omitted.
    pub fn children(&self, id: ExprId) -> ChildList {
        let mut out = ChildList::new();
        let mut push = |child: ExprId| {
            if child.is_valid() {
                out.push(child);
            }
        };
        match *self.kind(id) {
            ExprKind::Nop
            | ExprKind::Null
            | ExprKind::Bool(_)
            | ExprKind::Int(_)
            | ExprKind::Str(_)
            | ExprKind::This
            | ExprKind::Param(_)
            | ExprKind::Local(_)
            | ExprKind::ReferenceGlobal(_) => {}
            ExprKind::AssignLocal { value, .. } | ExprKind::AssignGlobal { value, .. } => {
                push(value);
            }
            ExprKind::Not(operand) | ExprKind::Return(operand) => push(operand),
            ExprKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                push(cond);
                push(then_branch);
                push(else_branch);
            }
            ExprKind::While { cond, body } => {
                push(cond);
                push(body);
            }
            ExprKind::Logical { left, right, .. } => {
                push(left);
                push(right);
            }
            ExprKind::FieldLoad { receiver, .. } | ExprKind::Dot { receiver, .. } => {
                push(receiver);
            }
            ExprKind::FieldStore {
                receiver, value, ..
            } => {
                push(receiver);
                push(value);
            }
            ExprKind::Typecheck { expr, .. } => push(expr),
            ExprKind::Sequence(range)
            | ExprKind::CallConstructor { args: range, .. }
            | ExprKind::CallStatic { args: range, .. }
            | ExprKind::CallVirtual { args: range, .. } => {
                for &child in self.list(range) {
                    push(child);
                }
            }
        }
        out
    }
}

#[inline]
fn to_u32(n: usize, what: &str) -> u32 {
    u32::try_from(n).unwrap_or_else(|_| panic!("too many {what}: {n} exceeds u32::MAX"))
}
