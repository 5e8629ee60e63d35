//! Expression visitor.
//!
//! A visitor can mutate its own state during traversal; the arena stays
//! immutable. Override [`Visitor::visit_expr`] to act on specific nodes and
//! call [`walk_expr`] to continue into children.
//!
//! ```text
//! struct CountVirtualCalls {
//!     count: usize,
//! }
//!
//! impl<'a> Visitor<'a> for CountVirtualCalls {
//!     fn visit_expr(&mut self, id: ExprId, arena: &'a ExprArena) {
//!         if let ExprKind::CallVirtual { .. } = arena.kind(id) {
//!             self.count += 1;
//!         }
//!         walk_expr(self, id, arena);
//!     }
//! }
//! ```

use crate::stack::ensure_sufficient_stack;
use crate::{ExprArena, ExprId};

pub trait Visitor<'a> {
    /// Visit an expression. The default walks its children.
    fn visit_expr(&mut self, id: ExprId, arena: &'a ExprArena) {
        walk_expr(self, id, arena);
    }

    /// Visit a method body; `INVALID` bodies are skipped.
    fn visit_body(&mut self, body: ExprId, arena: &'a ExprArena) {
        if body.is_valid() {
            self.visit_expr(body, arena);
        }
    }
}

/// Visit every child of `id` in evaluation order.
pub fn walk_expr<'a, V: Visitor<'a> + ?Sized>(visitor: &mut V, id: ExprId, arena: &'a ExprArena) {
    ensure_sufficient_stack(|| {
        for child in arena.children(id) {
            visitor.visit_expr(child, arena);
        }
    });
}
