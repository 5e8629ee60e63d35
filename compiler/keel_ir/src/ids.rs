//! ID and range newtypes.
//!
//! Classes, methods, fields, and expressions live in flat storage owned by
//! the [`Program`](crate::Program); everything else refers to them by index.
//! Identity is by ID: two methods with identical content are still distinct.

use std::fmt;

/// Define a `u32` index newtype with the usual accessors.
macro_rules! define_index {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Create a new ID from a raw index.
            #[inline]
            pub const fn new(raw: u32) -> Self {
                Self(raw)
            }

            /// Get the raw `u32` value.
            #[inline]
            pub const fn raw(self) -> u32 {
                self.0
            }

            /// Get the index as `usize` (for indexing into `Vec`s).
            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "{}"), self.0)
            }
        }
    };
}

define_index!(
    /// Index of a [`Class`](crate::Class) in the program's class storage.
    ClassId,
    "c"
);

define_index!(
    /// Index of a [`Method`](crate::Method) in the program's method storage.
    ///
    /// Globals are methods too: their initializer is the method body.
    MethodId,
    "m"
);

define_index!(
    /// Index of a [`Field`](crate::Field) in the program's field storage.
    FieldId,
    "f"
);

define_index!(
    /// Index of an interned [`CallShape`](crate::CallShape) in the
    /// [`ExprArena`](crate::ExprArena) shape pool.
    ShapeId,
    "shape"
);

/// Index into an [`ExprArena`](crate::ExprArena).
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct ExprId(u32);

impl ExprId {
    /// Sentinel for "no expression" (abstract method bodies, `return`
    /// without a value, missing `else` branches).
    pub const INVALID: ExprId = ExprId(u32::MAX);

    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns `true` if this is not the sentinel.
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != u32::MAX
    }
}

impl fmt::Debug for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "e{}", self.0)
        } else {
            write!(f, "ExprId::INVALID")
        }
    }
}

/// Contiguous range of expression IDs in the arena's list storage.
///
/// Used for call arguments and sequence elements.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct ExprRange {
    pub start: u32,
    pub len: u16,
}

impl ExprRange {
    pub const EMPTY: ExprRange = ExprRange { start: 0, len: 0 };

    #[inline]
    pub const fn new(start: u32, len: u16) -> Self {
        ExprRange { start, len }
    }

    #[inline]
    pub const fn len(self) -> usize {
        self.len as usize
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.len == 0
    }
}

impl fmt::Debug for ExprRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExprRange({}..{})", self.start, self.start + u32::from(self.len))
    }
}
