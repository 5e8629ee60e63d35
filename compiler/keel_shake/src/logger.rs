//! Observers of the reachability fixpoint.
//!
//! The [`TreeGrower`](crate::TreeGrower) reports roots, per-method
//! discoveries, and selector matches to a [`TreeLogger`]. Loggers are purely
//! observational and never influence what is kept.
//!
//! [`GraphvizTreeLogger`] records everything and renders it as a `digraph`:
//!
//! ```text
//! c<N>  class   (doublecircle)      m<N> -> c<N>   method instantiates class
//! m<N>  method                      m<N> -> m<N>   method reaches method
//! s<N>  selector (polygon)          m<N> -> s<N>   method sends selector
//!                                   s<N> -> m<N>   selector resolved to method
//!                                   c<N> -> s<N>   holder answers selector (dashed)
//! ```

use std::fmt;

use keel_ir::{CallSelector, ClassId, FxIndexMap, FxIndexSet, MethodId, Program};

use crate::Growth;

/// Receives reachability events from the fixpoint.
pub trait TreeLogger {
    fn root_class(&mut self, _class: ClassId) {}

    fn root_method(&mut self, _method: MethodId) {}

    /// `method` was grown and reaches `growth` directly.
    fn add(&mut self, _method: MethodId, _growth: &Growth) {}

    /// `selector` was resolved to `method` on some grown class.
    fn add_method_with_selector(&mut self, _selector: &CallSelector, _method: MethodId) {}
}

/// Discards every event.
#[derive(Copy, Clone, Debug, Default)]
pub struct NullTreeLogger;

impl TreeLogger for NullTreeLogger {}

/// Records the reachability relation for a Graphviz dump.
#[derive(Clone, Debug, Default)]
pub struct GraphvizTreeLogger {
    root_classes: Vec<ClassId>,
    root_methods: Vec<MethodId>,
    method_to_classes: FxIndexMap<MethodId, Vec<ClassId>>,
    method_to_methods: FxIndexMap<MethodId, Vec<MethodId>>,
    method_to_selectors: FxIndexMap<MethodId, Vec<CallSelector>>,
    selector_to_methods: FxIndexMap<CallSelector, FxIndexSet<MethodId>>,
}

impl GraphvizTreeLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render the recorded graph; names are looked up in `program`.
    pub fn display<'a>(&'a self, program: &'a Program) -> GraphvizTree<'a> {
        GraphvizTree {
            logger: self,
            program,
        }
    }
}

impl TreeLogger for GraphvizTreeLogger {
    fn root_class(&mut self, class: ClassId) {
        self.root_classes.push(class);
    }

    fn root_method(&mut self, method: MethodId) {
        self.root_methods.push(method);
    }

    fn add(&mut self, method: MethodId, growth: &Growth) {
        self.method_to_classes
            .entry(method)
            .or_default()
            .extend(growth.classes.iter().copied());
        self.method_to_methods
            .entry(method)
            .or_default()
            .extend(growth.methods.iter().copied());
        let selectors = self.method_to_selectors.entry(method).or_default();
        selectors.extend(growth.untyped.iter().cloned());
        selectors.extend(growth.typed.iter().map(|(selector, _)| selector.clone()));
    }

    fn add_method_with_selector(&mut self, selector: &CallSelector, method: MethodId) {
        self.selector_to_methods
            .entry(selector.clone())
            .or_default()
            .insert(method);
    }
}

/// [`fmt::Display`] adapter returned by [`GraphvizTreeLogger::display`].
pub struct GraphvizTree<'a> {
    logger: &'a GraphvizTreeLogger,
    program: &'a Program,
}

/// Operators nearly every class answers; their edges would drown the graph.
const NOISY_OPERATORS: [(&str, u16); 9] = [
    ("+", 2),
    ("-", 2),
    ("<", 2),
    ("<=", 2),
    (">", 2),
    (">=", 2),
    ("==", 2),
    ("[]", 2),
    ("[]=", 3),
];

impl GraphvizTree<'_> {
    fn is_noisy(&self, selector: &CallSelector) -> bool {
        let name = self.program.names.lookup(selector.name());
        let shape = selector.shape();
        !shape.has_named_arguments()
            && shape.total_block_count() == 0
            && !shape.is_setter()
            && NOISY_OPERATORS
                .iter()
                .any(|&(op, arity)| op == name && arity == shape.arity())
    }

    fn method_label(&self, method: MethodId) -> String {
        escape(&self.program.method_display_name(method))
    }
}

impl fmt::Display for GraphvizTree<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let logger = self.logger;
        let program = self.program;

        let mut classes: FxIndexSet<ClassId> = FxIndexSet::default();
        classes.extend(logger.root_classes.iter().copied());
        for found in logger.method_to_classes.values() {
            classes.extend(found.iter().copied());
        }
        for methods in logger.selector_to_methods.values() {
            classes.extend(methods.iter().filter_map(|&m| program.method(m).holder));
        }

        let mut methods: FxIndexSet<MethodId> = FxIndexSet::default();
        methods.extend(logger.root_methods.iter().copied());
        methods.extend(logger.method_to_classes.keys().copied());
        methods.extend(logger.method_to_methods.keys().copied());
        methods.extend(logger.method_to_selectors.keys().copied());
        for found in logger.method_to_methods.values() {
            methods.extend(found.iter().copied());
        }
        for found in logger.selector_to_methods.values() {
            methods.extend(found.iter().copied());
        }

        writeln!(f, "digraph tree {{")?;
        for (id, &class) in classes.iter().enumerate() {
            writeln!(
                f,
                "  c{id} [label=\"{}\", shape=doublecircle];",
                escape(program.class_name(class))
            )?;
        }
        for (id, &method) in methods.iter().enumerate() {
            writeln!(f, "  m{id} [label=\"{}\"];", self.method_label(method))?;
        }
        for (id, selector) in logger.selector_to_methods.keys().enumerate() {
            writeln!(
                f,
                "  s{id} [label=\"{}\", shape=polygon];",
                escape(program.names.lookup(selector.name()))
            )?;
        }

        let class_id = |class: ClassId| classes.get_index_of(&class).unwrap_or_default();
        let method_id = |method: MethodId| methods.get_index_of(&method).unwrap_or_default();

        for (&method, found) in &logger.method_to_classes {
            for &class in found {
                writeln!(f, "  m{} -> c{};", method_id(method), class_id(class))?;
            }
        }
        for (&method, found) in &logger.method_to_methods {
            for &target in found {
                writeln!(f, "  m{} -> m{};", method_id(method), method_id(target))?;
            }
        }
        for (&method, selectors) in &logger.method_to_selectors {
            for selector in selectors {
                if self.is_noisy(selector) {
                    continue;
                }
                // Selectors nothing answered have no node.
                let Some(selector_id) = logger.selector_to_methods.get_index_of(selector) else {
                    continue;
                };
                writeln!(f, "  m{} -> s{selector_id};", method_id(method))?;
            }
        }
        for (selector_id, (selector, targets)) in logger.selector_to_methods.iter().enumerate() {
            let noisy = self.is_noisy(selector);
            for &target in targets {
                writeln!(f, "  s{selector_id} -> m{};", method_id(target))?;
                if noisy {
                    continue;
                }
                if let Some(holder) = program.method(target).holder {
                    writeln!(f, "  c{} -> s{selector_id} [style=dashed];", class_id(holder))?;
                }
            }
        }
        writeln!(f, "}}")
    }
}

fn escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}
