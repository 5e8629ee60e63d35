//! Call shapes: how a call site passes arguments and how a method accepts them.
//!
//! There are three shape types:
//!
//! - [`CallShape`]: one specific way of calling (arity, block arguments,
//!   named arguments, setter-ness). Every call site has exactly one.
//! - [`PlainShape`]: a method's shape once optional parameters have been
//!   expanded into stubs. Structurally a `CallShape`, but a distinct type so
//!   call-site shapes and method shapes cannot be confused in selector maps.
//! - [`ResolutionShape`]: a method's shape before stub insertion. May accept
//!   several call shapes because of optional unnamed or named parameters.
//!
//! Arity always includes the implicit receiver for instance members.
//!
//! # Named arguments
//!
//! Named arguments are passed last. They are kept in two sections (non-block
//! names first, then block names), each sorted by [`Name`]. All constructors
//! canonicalize to this order, so two shapes built from the same names in a
//! different order compare equal.

use smallvec::SmallVec;

use crate::Name;

/// List of argument names. Most calls have none, a few have one or two.
pub type NameList = SmallVec<[Name; 2]>;

// ── CallShape ───────────────────────────────────────────────────────

/// The shape of a call site.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct CallShape {
    arity: u16,
    total_block_count: u16,
    names: NameList,
    named_block_count: u16,
    is_setter: bool,
}

impl CallShape {
    /// Positional call with `arity` non-block arguments.
    pub fn new(arity: u16) -> Self {
        Self::with_blocks(arity, 0)
    }

    /// Positional call where the last `block_count` of `arity` arguments are blocks.
    pub fn with_blocks(arity: u16, block_count: u16) -> Self {
        debug_assert!(block_count <= arity);
        CallShape {
            arity,
            total_block_count: block_count,
            names: NameList::new(),
            named_block_count: 0,
            is_setter: false,
        }
    }

    /// Call with named arguments.
    ///
    /// `named` lists `(name, is_block)` pairs in any order; they are
    /// canonicalized into the non-block/block sections.
    pub fn with_named(
        unnamed_non_block: u16,
        unnamed_block: u16,
        named: &[(Name, bool)],
        is_setter: bool,
    ) -> Self {
        let mut non_blocks: NameList = named.iter().filter(|(_, b)| !b).map(|(n, _)| *n).collect();
        let mut blocks: NameList = named.iter().filter(|(_, b)| *b).map(|(n, _)| *n).collect();
        non_blocks.sort_unstable();
        blocks.sort_unstable();
        let named_block_count = to_u16(blocks.len());
        let named_count = to_u16(named.len());
        non_blocks.extend(blocks);
        CallShape {
            arity: unnamed_non_block + unnamed_block + named_count,
            total_block_count: unnamed_block + named_block_count,
            names: non_blocks,
            named_block_count,
            is_setter,
        }
    }

    /// Shape of a static call with `arity` positional arguments.
    pub fn for_static_call(arity: u16) -> Self {
        Self::new(arity)
    }

    /// Shape of an instance getter call (receiver only).
    pub fn for_instance_getter() -> Self {
        Self::new(1)
    }

    /// Shape of an instance setter call (receiver and value).
    pub fn for_instance_setter() -> Self {
        CallShape {
            is_setter: true,
            ..Self::new(2)
        }
    }

    /// Number of all arguments, including blocks, named arguments, and the
    /// implicit receiver (where given).
    #[inline]
    pub fn arity(&self) -> u16 {
        self.arity
    }

    #[inline]
    pub fn is_setter(&self) -> bool {
        self.is_setter
    }

    /// Total number of block arguments, named or not.
    #[inline]
    pub fn total_block_count(&self) -> u16 {
        self.total_block_count
    }

    /// Number of named block arguments.
    #[inline]
    pub fn named_block_count(&self) -> u16 {
        self.named_block_count
    }

    /// Number of named non-block arguments.
    #[inline]
    pub fn named_non_block_count(&self) -> u16 {
        to_u16(self.names.len()) - self.named_block_count
    }

    /// Number of unnamed block arguments.
    #[inline]
    pub fn unnamed_block_count(&self) -> u16 {
        self.total_block_count - self.named_block_count
    }

    /// Number of unnamed non-block arguments.
    #[inline]
    pub fn unnamed_non_block_count(&self) -> u16 {
        self.arity - to_u16(self.names.len()) - self.unnamed_block_count()
    }

    /// Argument names, non-block section first.
    #[inline]
    pub fn names(&self) -> &[Name] {
        &self.names
    }

    #[inline]
    pub fn has_named_arguments(&self) -> bool {
        !self.names.is_empty()
    }

    /// This shape with one more unnamed argument in front.
    #[must_use]
    pub fn with_implicit_this(&self) -> Self {
        CallShape {
            arity: self.arity + 1,
            ..self.clone()
        }
    }

    /// The plain shape a method must have to be selected by this call.
    pub fn to_plain_shape(&self) -> PlainShape {
        PlainShape(self.clone())
    }
}

// ── PlainShape ──────────────────────────────────────────────────────

/// A method's shape after stub insertion: exactly one accepted call shape.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct PlainShape(CallShape);

impl PlainShape {
    #[inline]
    pub fn arity(&self) -> u16 {
        self.0.arity()
    }

    #[inline]
    pub fn is_setter(&self) -> bool {
        self.0.is_setter()
    }

    /// The call shape that selects this method.
    pub fn to_equivalent_call_shape(&self) -> CallShape {
        self.0.clone()
    }
}

// ── ResolutionShape ─────────────────────────────────────────────────

/// A named parameter of a method before stub insertion.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct NamedParameter {
    pub name: Name,
    pub is_block: bool,
    /// Whether the parameter has a default value.
    pub is_optional: bool,
}

/// A method's shape before stub insertion.
///
/// The embedded call shape is the *maximal* shape (every optional parameter
/// given); `optional_unnamed` and `optional_names` record which parts may be
/// left out. Blocks are never optional.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct ResolutionShape {
    call_shape: CallShape,
    optional_unnamed: u16,
    /// Parallel to `call_shape.names()`.
    optional_names: SmallVec<[bool; 2]>,
}

impl ResolutionShape {
    /// Positional shape without optional parameters.
    pub fn new(arity: u16) -> Self {
        Self::from_call_shape(CallShape::new(arity))
    }

    /// A shape that accepts exactly `call_shape`.
    pub fn from_call_shape(call_shape: CallShape) -> Self {
        let optional_names = SmallVec::from_elem(false, call_shape.names().len());
        ResolutionShape {
            call_shape,
            optional_unnamed: 0,
            optional_names,
        }
    }

    /// Shape with optional unnamed and/or named parameters.
    ///
    /// `max_unnamed_non_block` includes the implicit receiver for instance
    /// methods; `optional_unnamed` of those are trailing parameters with
    /// default values.
    pub fn with_optional(
        max_unnamed_non_block: u16,
        optional_unnamed: u16,
        unnamed_block: u16,
        named: &[NamedParameter],
        is_setter: bool,
    ) -> Self {
        debug_assert!(optional_unnamed <= max_unnamed_non_block);
        let pairs: SmallVec<[(Name, bool); 4]> =
            named.iter().map(|p| (p.name, p.is_block)).collect();
        let call_shape =
            CallShape::with_named(max_unnamed_non_block, unnamed_block, &pairs, is_setter);
        // Recover optionality in canonical name order.
        let optional_names = call_shape
            .names()
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let is_block = i >= usize::from(call_shape.named_non_block_count());
                named
                    .iter()
                    .find(|p| p.name == *name && p.is_block == is_block)
                    .is_some_and(|p| p.is_optional && !p.is_block)
            })
            .collect();
        ResolutionShape {
            call_shape,
            optional_unnamed,
            optional_names,
        }
    }

    #[inline]
    pub fn is_setter(&self) -> bool {
        self.call_shape.is_setter()
    }

    /// Arity with every optional parameter given.
    #[inline]
    pub fn max_arity(&self) -> u16 {
        self.call_shape.arity()
    }

    /// Minimal number of unnamed non-block arguments.
    pub fn min_unnamed_non_block(&self) -> u16 {
        self.call_shape.unnamed_non_block_count() - self.optional_unnamed
    }

    /// Maximal number of unnamed non-block arguments.
    pub fn max_unnamed_non_block(&self) -> u16 {
        self.call_shape.unnamed_non_block_count()
    }

    pub fn has_optional_parameters(&self) -> bool {
        if self.is_setter() {
            return false;
        }
        self.optional_unnamed != 0 || self.optional_names.iter().any(|&o| o)
    }

    /// The method's shape as if all optional parameters were given.
    pub fn to_plain_shape(&self) -> PlainShape {
        self.call_shape.to_plain_shape()
    }

    /// Whether a call with `call` shape can be bound to a method with this shape.
    pub fn accepts(&self, call: &CallShape) -> bool {
        if self.is_setter() != call.is_setter() {
            return false;
        }

        let call_unnamed_non_block = call.unnamed_non_block_count();
        if call_unnamed_non_block < self.min_unnamed_non_block()
            || call_unnamed_non_block > self.max_unnamed_non_block()
        {
            return false;
        }

        // Blocks are never optional, neither unnamed nor named.
        if call.unnamed_block_count() != self.call_shape.unnamed_block_count() {
            return false;
        }
        if call.named_block_count() != self.call_shape.named_block_count() {
            return false;
        }

        let call_names = call.names();
        let call_named_non_block = usize::from(call.named_non_block_count());
        let parameter_names = self.call_shape.names();
        let parameter_named_non_block = usize::from(self.call_shape.named_non_block_count());

        let mut parameter_index = 0;
        for (argument_index, argument_name) in call_names.iter().enumerate() {
            while parameter_index < parameter_names.len() {
                if parameter_names[parameter_index] == *argument_name {
                    break;
                }
                if !self.optional_names[parameter_index] {
                    return false;
                }
                parameter_index += 1;
            }
            if parameter_index == parameter_names.len() {
                // Named argument the method doesn't declare.
                return false;
            }
            let argument_is_block = argument_index >= call_named_non_block;
            let parameter_is_block = parameter_index >= parameter_named_non_block;
            if argument_is_block != parameter_is_block {
                return false;
            }
            parameter_index += 1;
        }
        self.optional_names[parameter_index..].iter().all(|&o| o)
    }
}

#[inline]
fn to_u16(n: usize) -> u16 {
    u16::try_from(n).unwrap_or_else(|_| panic!("shape component count {n} exceeds u16::MAX"))
}
