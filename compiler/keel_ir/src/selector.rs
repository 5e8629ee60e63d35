//! Selectors: the `(name, shape)` pair a call dispatches on.

use crate::shape::{CallShape, PlainShape};
use crate::Name;

/// A selector is the combination of a name and a shape.
///
/// Independent of any class: the same selector is looked up on every class
/// a dynamic call might reach.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Selector<S> {
    name: Name,
    shape: S,
}

/// Selector of a call site.
pub type CallSelector = Selector<CallShape>;

/// Selector of a method after stub insertion.
pub type PlainSelector = Selector<PlainShape>;

impl<S> Selector<S> {
    pub fn new(name: Name, shape: S) -> Self {
        Selector { name, shape }
    }

    #[inline]
    pub fn name(&self) -> Name {
        self.name
    }

    #[inline]
    pub fn shape(&self) -> &S {
        &self.shape
    }
}

impl CallSelector {
    /// The method selector a call with this selector binds to.
    pub fn to_plain(&self) -> PlainSelector {
        Selector::new(self.name, self.shape.to_plain_shape())
    }
}
