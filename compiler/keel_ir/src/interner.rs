//! String interner for identifier storage.
//!
//! The tree shaker runs single-threaded over a program it owns exclusively,
//! so the interner is a plain owned table rather than a sharded, lock-guarded
//! one.

use rustc_hash::FxHashMap;

use super::Name;

/// Owned string interner.
///
/// Index 0 is always the empty string ([`Name::EMPTY`]).
#[derive(Clone, Debug)]
pub struct StringInterner {
    /// Map from string content to its interned name.
    map: FxHashMap<Box<str>, Name>,
    /// Storage for string contents, indexed by `Name::index()`.
    strings: Vec<Box<str>>,
}

impl StringInterner {
    /// Create a new interner with the empty string pre-interned.
    pub fn new() -> Self {
        let mut interner = Self {
            map: FxHashMap::default(),
            strings: Vec::with_capacity(256),
        };
        let empty = interner.intern("");
        debug_assert_eq!(empty, Name::EMPTY);
        interner
    }

    /// Intern a string, returning its `Name`.
    pub fn intern(&mut self, s: &str) -> Name {
        if let Some(&name) = self.map.get(s) {
            return name;
        }
        let raw = u32::try_from(self.strings.len())
            .unwrap_or_else(|_| panic!("interner exceeded {} strings", u32::MAX));
        let name = Name::from_raw(raw);
        self.strings.push(s.into());
        self.map.insert(s.into(), name);
        name
    }

    /// Look up an already interned string without inserting it.
    pub fn get(&self, s: &str) -> Option<Name> {
        self.map.get(s).copied()
    }

    /// Look up the string for a `Name`.
    ///
    /// # Panics
    /// Panics if the name was produced by a different interner.
    #[inline]
    pub fn lookup(&self, name: Name) -> &str {
        &self.strings[name.index()]
    }

    /// Number of interned strings, including the empty string.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Always `false`: the empty string is pre-interned.
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}
