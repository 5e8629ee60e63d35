//! Program, classes, methods, and fields.
//!
//! All classes, methods, and fields of a compilation are stored in flat
//! vectors owned by [`Program`] and referred to by ID. The *ordered lists*
//! (`classes`, `methods`, `globals`, and each class's member lists) describe
//! what the program currently contains; entries dropped from those lists stay
//! in storage so that stale IDs remain valid to look at.

use bitflags::bitflags;

use crate::selector::CallSelector;
use crate::shape::{PlainShape, ResolutionShape};
use crate::{ClassId, ExprArena, ExprId, FieldId, MethodId, Name, Span, StringInterner};

bitflags! {
    /// Per-method facts.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct MethodFlags: u8 {
        /// Declared without a body.
        const ABSTRACT = 1 << 0;
        /// Proven never to execute by type propagation.
        const DEAD = 1 << 1;
    }
}

bitflags! {
    /// Per-class facts.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct ClassFlags: u8 {
        const ABSTRACT = 1 << 0;
        /// Class the runtime relies on (kept regardless of reachability).
        const RUNTIME = 1 << 1;
        /// Objects of exactly this class can exist at runtime.
        ///
        /// Set by tree shaking. A kept class without this flag is only
        /// retained as an ancestor of an instantiated class.
        const INSTANTIATED = 1 << 2;
    }
}

/// What kind of declaration a class is.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum ClassKind {
    Class,
    Interface,
    Mixin,
}

/// What kind of declaration a method is.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum MethodKind {
    GlobalFunction,
    /// Initializer of a global; the method *is* the global.
    GlobalInitializer,
    Instance,
    Constructor,
    Factory,
    /// Synthesized getter/setter for a field.
    FieldStub,
    /// Synthesized forwarder from a class to a mixin member.
    MixinStub,
    /// Synthesized membership test (`is-Foo`) for an interface or mixin.
    IsInterfaceStub,
}

impl MethodKind {
    /// Whether methods of this kind are dispatched on a receiver.
    #[inline]
    pub fn is_instance(self) -> bool {
        matches!(
            self,
            MethodKind::Instance
                | MethodKind::FieldStub
                | MethodKind::MixinStub
                | MethodKind::IsInterfaceStub
        )
    }
}

#[derive(Clone, Debug)]
pub struct Field {
    pub name: Name,
    pub holder: ClassId,
}

#[derive(Clone, Debug)]
pub struct Method {
    pub name: Name,
    pub kind: MethodKind,
    /// `None` for top-level functions and globals.
    pub holder: Option<ClassId>,
    pub shape: ResolutionShape,
    /// `ExprId::INVALID` when the method has no body.
    pub body: ExprId,
    pub flags: MethodFlags,
    pub span: Span,
}

impl Method {
    #[inline]
    pub fn is_abstract(&self) -> bool {
        self.flags.contains(MethodFlags::ABSTRACT)
    }

    #[inline]
    pub fn is_dead(&self) -> bool {
        self.flags.contains(MethodFlags::DEAD)
    }

    #[inline]
    pub fn is_instance(&self) -> bool {
        self.kind.is_instance()
    }

    /// The shape the method is registered under after stub insertion.
    pub fn plain_shape(&self) -> PlainShape {
        self.shape.to_plain_shape()
    }
}

#[derive(Clone, Debug)]
pub struct Class {
    pub name: Name,
    pub kind: ClassKind,
    pub flags: ClassFlags,
    pub super_class: Option<ClassId>,
    pub interfaces: Vec<ClassId>,
    /// Linearized: parent mixins come before the mixins that depend on them.
    pub mixins: Vec<ClassId>,
    /// Instance members, including synthesized stubs.
    pub methods: Vec<MethodId>,
    pub fields: Vec<FieldId>,
    pub constructors: Vec<MethodId>,
    pub factories: Vec<MethodId>,
    pub statics: Vec<MethodId>,
    /// Selector of the synthesized membership test, for interfaces and mixins.
    pub typecheck_selector: Option<CallSelector>,
    pub span: Span,
}

impl Class {
    #[inline]
    pub fn is_interface(&self) -> bool {
        self.kind == ClassKind::Interface
    }

    #[inline]
    pub fn is_mixin(&self) -> bool {
        self.kind == ClassKind::Mixin
    }

    #[inline]
    pub fn is_abstract(&self) -> bool {
        self.flags.contains(ClassFlags::ABSTRACT)
    }

    #[inline]
    pub fn is_instantiated(&self) -> bool {
        self.flags.contains(ClassFlags::INSTANTIATED)
    }
}

/// A whole program, as handed from the optimizer to code generation.
#[derive(Clone, Debug)]
pub struct Program {
    pub names: StringInterner,
    pub arena: ExprArena,

    class_store: Vec<Class>,
    method_store: Vec<Method>,
    field_store: Vec<Field>,

    /// Classes in dependency order: supers and mixins before their users.
    pub classes: Vec<ClassId>,
    /// Top-level functions.
    pub methods: Vec<MethodId>,
    /// Globals; each is a `GlobalInitializer` method.
    pub globals: Vec<MethodId>,
    /// Classes kept regardless of reachability.
    pub tree_roots: Vec<ClassId>,
    pub entry_points: Vec<MethodId>,

    /// The root of the class hierarchy every value inherits from.
    pub root_class: Option<ClassId>,
    /// Helper called when an `as` check fails.
    pub as_check_failure: Option<MethodId>,
    /// Identity primitive used by nullable checks.
    pub identical: Option<MethodId>,
}

impl Program {
    pub fn new() -> Self {
        Program {
            names: StringInterner::new(),
            arena: ExprArena::new(),
            class_store: Vec::new(),
            method_store: Vec::new(),
            field_store: Vec::new(),
            classes: Vec::new(),
            methods: Vec::new(),
            globals: Vec::new(),
            tree_roots: Vec::new(),
            entry_points: Vec::new(),
            root_class: None,
            as_check_failure: None,
            identical: None,
        }
    }

    // ── Storage ─────────────────────────────────────────────────────

    /// Allocate a class and append it to `classes`.
    pub fn add_class(&mut self, name: &str, kind: ClassKind, super_class: Option<ClassId>) -> ClassId {
        let id = ClassId::new(to_u32(self.class_store.len()));
        let name = self.names.intern(name);
        self.class_store.push(Class {
            name,
            kind,
            flags: ClassFlags::empty(),
            super_class,
            interfaces: Vec::new(),
            mixins: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
            constructors: Vec::new(),
            factories: Vec::new(),
            statics: Vec::new(),
            typecheck_selector: None,
            span: Span::DUMMY,
        });
        self.classes.push(id);
        id
    }

    /// Allocate a method and register it with its holder (or the top-level
    /// lists) according to its kind.
    pub fn add_method(
        &mut self,
        name: &str,
        kind: MethodKind,
        holder: Option<ClassId>,
        shape: ResolutionShape,
        body: ExprId,
    ) -> MethodId {
        let id = MethodId::new(to_u32(self.method_store.len()));
        let name = self.names.intern(name);
        self.method_store.push(Method {
            name,
            kind,
            holder,
            shape,
            body,
            flags: MethodFlags::empty(),
            span: Span::DUMMY,
        });
        match (kind, holder) {
            (MethodKind::GlobalInitializer, _) => self.globals.push(id),
            (MethodKind::Constructor, Some(class)) => self.class_mut(class).constructors.push(id),
            (MethodKind::Factory, Some(class)) => self.class_mut(class).factories.push(id),
            (MethodKind::GlobalFunction, Some(class)) => self.class_mut(class).statics.push(id),
            (kind, Some(class)) if kind.is_instance() => self.class_mut(class).methods.push(id),
            _ => self.methods.push(id),
        }
        id
    }

    /// Allocate a body-less instance method of `holder`.
    pub fn add_abstract_method(&mut self, name: &str, holder: ClassId, shape: ResolutionShape) -> MethodId {
        let id = self.add_method(name, MethodKind::Instance, Some(holder), shape, ExprId::INVALID);
        self.method_mut(id).flags |= MethodFlags::ABSTRACT;
        id
    }

    pub fn add_field(&mut self, name: &str, holder: ClassId) -> FieldId {
        let id = FieldId::new(to_u32(self.field_store.len()));
        let name = self.names.intern(name);
        self.field_store.push(Field { name, holder });
        self.class_mut(holder).fields.push(id);
        id
    }

    #[inline]
    pub fn class(&self, id: ClassId) -> &Class {
        &self.class_store[id.index()]
    }

    #[inline]
    pub fn class_mut(&mut self, id: ClassId) -> &mut Class {
        &mut self.class_store[id.index()]
    }

    #[inline]
    pub fn method(&self, id: MethodId) -> &Method {
        &self.method_store[id.index()]
    }

    #[inline]
    pub fn method_mut(&mut self, id: MethodId) -> &mut Method {
        &mut self.method_store[id.index()]
    }

    #[inline]
    pub fn field(&self, id: FieldId) -> &Field {
        &self.field_store[id.index()]
    }

    /// Number of classes ever allocated, kept or not.
    pub fn class_capacity(&self) -> usize {
        self.class_store.len()
    }

    /// Number of methods ever allocated, kept or not.
    pub fn method_capacity(&self) -> usize {
        self.method_store.len()
    }

    // ── Queries ─────────────────────────────────────────────────────

    /// Display name of a class.
    pub fn class_name(&self, id: ClassId) -> &str {
        self.names.lookup(self.class(id).name)
    }

    /// Display name of a method: `Holder.name` or just `name`.
    pub fn method_display_name(&self, id: MethodId) -> String {
        let method = self.method(id);
        let name = self.names.lookup(method.name);
        match method.holder {
            Some(holder) => format!("{}.{}", self.class_name(holder), name),
            None => name.to_string(),
        }
    }

    /// Iterator over `class` and its superclasses, nearest first.
    pub fn super_chain(&self, class: ClassId) -> SuperChain<'_> {
        SuperChain {
            program: self,
            next: Some(class),
        }
    }

    /// Whether `ancestor` is a proper superclass of `class`.
    pub fn is_proper_ancestor(&self, ancestor: ClassId, class: ClassId) -> bool {
        self.super_chain(class).skip(1).any(|c| c == ancestor)
    }

    /// Every method that currently belongs to the program, in program
    /// order: top-level functions, globals, then each class's constructors,
    /// factories, statics, and instance methods.
    pub fn all_methods(&self) -> Vec<MethodId> {
        let mut out = Vec::with_capacity(self.method_store.len());
        out.extend_from_slice(&self.methods);
        out.extend_from_slice(&self.globals);
        for &class in &self.classes {
            let class = self.class(class);
            out.extend_from_slice(&class.constructors);
            out.extend_from_slice(&class.factories);
            out.extend_from_slice(&class.statics);
            out.extend_from_slice(&class.methods);
        }
        out
    }
}

impl Default for Program {
    fn default() -> Self {
        Self::new()
    }
}

/// See [`Program::super_chain`].
pub struct SuperChain<'p> {
    program: &'p Program,
    next: Option<ClassId>,
}

impl Iterator for SuperChain<'_> {
    type Item = ClassId;

    fn next(&mut self) -> Option<ClassId> {
        let current = self.next?;
        self.next = self.program.class(current).super_class;
        Some(current)
    }
}

#[inline]
fn to_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or_else(|_| panic!("program storage exceeds u32::MAX entries"))
}
