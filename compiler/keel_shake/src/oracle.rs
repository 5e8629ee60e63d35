//! Facts from type propagation.
//!
//! Type propagation runs before tree shaking and can prove that a method
//! never executes or that a call site is never reached. Tree shaking
//! consults those facts through [`TypeOracle`] so it does not grow code
//! that only dead code could reach.

use keel_ir::{ExprId, MethodId};
use rustc_hash::FxHashSet;

/// Dead-code facts computed by an earlier pass.
///
/// Methods carrying [`keel_ir::MethodFlags::DEAD`] are treated as dead
/// whatever the oracle says.
pub trait TypeOracle {
    /// Whether `method` is proven never to run.
    fn is_dead_method(&self, method: MethodId) -> bool;

    /// Whether the call expression `call` is proven never to execute.
    fn is_dead_call(&self, call: ExprId) -> bool;
}

/// A [`TypeOracle`] backed by explicit sets.
///
/// The default value knows nothing, so every method and call is live.
#[derive(Clone, Debug, Default)]
pub struct PropagationFacts {
    dead_methods: FxHashSet<MethodId>,
    dead_calls: FxHashSet<ExprId>,
}

impl PropagationFacts {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_dead_method(mut self, method: MethodId) -> Self {
        self.dead_methods.insert(method);
        self
    }

    #[must_use]
    pub fn with_dead_call(mut self, call: ExprId) -> Self {
        self.dead_calls.insert(call);
        self
    }

    pub fn mark_dead_method(&mut self, method: MethodId) {
        self.dead_methods.insert(method);
    }

    pub fn mark_dead_call(&mut self, call: ExprId) {
        self.dead_calls.insert(call);
    }
}

impl TypeOracle for PropagationFacts {
    fn is_dead_method(&self, method: MethodId) -> bool {
        self.dead_methods.contains(&method)
    }

    fn is_dead_call(&self, call: ExprId) -> bool {
        self.dead_calls.contains(&call)
    }
}
