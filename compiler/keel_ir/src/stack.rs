//! Stack growth for recursive walks over expression trees.
//!
//! Method bodies produced by inlining can nest arbitrarily deep, so every
//! recursive traversal (visiting, rewriting, validating) runs its recursive
//! step through [`ensure_sufficient_stack`].

/// Keep at least this much stack available before recursing.
const RED_ZONE: usize = 128 * 1024;

/// Size of each new stack segment.
const STACK_SEGMENT: usize = 2 * 1024 * 1024;

/// Run `f`, first growing the stack if less than the red zone remains.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_SEGMENT, f)
}

/// wasm32 manages its own stack.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
