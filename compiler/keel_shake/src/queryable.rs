//! Selector resolution maps.
//!
//! A [`QueryableClass`] answers "which method runs when an instance of this
//! exact class receives selector `s`?" with a single hash probe. It is built
//! from the superclass's map with the class's mixins and then its own
//! methods overlaid on top, so the last writer wins:
//!
//! ```text
//! super (or the root class, for interface and mixin roots)
//!   ◄── mixin 1 methods ◄── mixin 2 methods ◄── own methods
//! ```
//!
//! Two construction modes exist:
//!
//! - [`Queryables::from_plain_shapes`]: after stub insertion every method has
//!   exactly one shape, so it is registered once.
//! - [`Queryables::from_resolution_shapes`]: before stub insertion a method
//!   with optional or named parameters answers several call shapes. It is
//!   registered under every shape observed at a virtual call site anywhere
//!   in the program that it accepts.

use keel_ir::visitor::{walk_expr, Visitor};
use keel_ir::{
    CallSelector, CallShape, ClassId, ExprArena, ExprId, ExprKind, FxIndexMap, FxIndexSet, Method,
    MethodId, Name, PlainSelector, Program, Selector,
};
use rustc_hash::FxHashMap;

/// Every call shape used at a virtual call site, per selector name.
pub type ObservedShapes = FxIndexMap<Name, FxIndexSet<CallShape>>;

type SelectorMap = FxHashMap<PlainSelector, MethodId>;

/// Selector-to-method map of one class.
#[derive(Clone, Debug)]
pub struct QueryableClass {
    class: ClassId,
    methods: SelectorMap,
}

impl QueryableClass {
    #[inline]
    pub fn class(&self) -> ClassId {
        self.class
    }

    /// The method an instance of this class runs for `selector`.
    pub fn lookup(&self, selector: &CallSelector) -> Option<MethodId> {
        self.methods.get(&selector.to_plain()).copied()
    }

    pub fn lookup_plain(&self, selector: &PlainSelector) -> Option<MethodId> {
        self.methods.get(selector).copied()
    }

    /// Number of selectors the class answers.
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

/// Resolution maps for every class of a program.
#[derive(Clone, Debug, Default)]
pub struct Queryables {
    classes: FxHashMap<ClassId, QueryableClass>,
}

impl Queryables {
    /// Build maps keyed by each method's single plain shape.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn from_plain_shapes(program: &Program) -> Self {
        Builder::new(program, |id, method: &Method, methods: &mut SelectorMap| {
            methods.insert(Selector::new(method.name, method.plain_shape()), id);
        })
        .build()
    }

    /// Build maps keyed by every observed call shape each method accepts.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn from_resolution_shapes(program: &Program) -> Self {
        let observed = collect_call_shapes(program);
        Builder::new(program, move |id, method: &Method, methods: &mut SelectorMap| {
            if !method.shape.has_optional_parameters() {
                methods.insert(Selector::new(method.name, method.plain_shape()), id);
                return;
            }
            // Never called with any shape: nothing to register.
            let Some(shapes) = observed.get(&method.name) else {
                return;
            };
            for shape in shapes {
                if method.shape.accepts(shape) {
                    methods.insert(Selector::new(method.name, shape.to_plain_shape()), id);
                }
            }
        })
        .build()
    }

    /// The map of `class`.
    ///
    /// # Panics
    ///
    /// Panics if `class` was not part of the program the maps were built
    /// from. That means classes were not processed in dependency order.
    pub fn get(&self, class: ClassId) -> &QueryableClass {
        match self.classes.get(&class) {
            Some(queryable) => queryable,
            None => panic!("{class:?} has no selector map; classes were not resolved in dependency order"),
        }
    }

    pub fn try_get(&self, class: ClassId) -> Option<&QueryableClass> {
        self.classes.get(&class)
    }

    pub fn contains(&self, class: ClassId) -> bool {
        self.classes.contains_key(&class)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Collect, program-wide, the call shapes used at virtual call sites.
pub fn collect_call_shapes(program: &Program) -> ObservedShapes {
    struct ShapeCollector {
        shapes: ObservedShapes,
    }

    impl<'a> Visitor<'a> for ShapeCollector {
        fn visit_expr(&mut self, id: ExprId, arena: &'a ExprArena) {
            if let ExprKind::CallVirtual { name, shape, .. } = *arena.kind(id) {
                self.shapes
                    .entry(name)
                    .or_default()
                    .insert(arena.shape(shape).clone());
            }
            walk_expr(self, id, arena);
        }
    }

    let mut collector = ShapeCollector {
        shapes: ObservedShapes::default(),
    };
    for method in program.all_methods() {
        collector.visit_body(program.method(method).body, &program.arena);
    }
    collector.shapes
}

struct Builder<'p, F> {
    program: &'p Program,
    register: F,
    classes: FxHashMap<ClassId, QueryableClass>,
}

impl<'p, F> Builder<'p, F>
where
    F: FnMut(MethodId, &Method, &mut SelectorMap),
{
    fn new(program: &'p Program, register: F) -> Self {
        Builder {
            program,
            register,
            classes: FxHashMap::default(),
        }
    }

    fn build(mut self) -> Queryables {
        let program = self.program;
        // Mixins and interfaces must be complete before the classes that
        // consume them.
        for &class in &program.classes {
            let class_ref = program.class(class);
            if class_ref.is_mixin() || class_ref.is_interface() {
                self.resolve(class);
            }
        }
        for &class in &program.classes {
            self.resolve(class);
        }
        tracing::debug!(classes = self.classes.len(), "built selector maps");
        Queryables {
            classes: self.classes,
        }
    }

    fn resolve(&mut self, class: ClassId) {
        if self.classes.contains_key(&class) {
            return;
        }
        let program = self.program;
        let class_ref = program.class(class);

        let base = match class_ref.super_class {
            Some(super_class) => Some(super_class),
            // Every value answers the root class's selectors.
            None if class_ref.is_interface() || class_ref.is_mixin() => {
                program.root_class.filter(|&root| root != class)
            }
            None => None,
        };

        let mut methods = match base {
            Some(base) => {
                keel_ir::ensure_sufficient_stack(|| self.resolve(base));
                self.classes[&base].methods.clone()
            }
            None => SelectorMap::default(),
        };

        for &mixin in &class_ref.mixins {
            keel_ir::ensure_sufficient_stack(|| self.resolve(mixin));
            for &method in &program.class(mixin).methods {
                (self.register)(method, program.method(method), &mut methods);
            }
        }
        for &method in &class_ref.methods {
            (self.register)(method, program.method(method), &mut methods);
        }

        self.classes.insert(class, QueryableClass { class, methods });
    }
}
