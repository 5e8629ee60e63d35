//! Fixpoint reachability over classes, methods, and selectors.
//!
//! # States
//!
//! ```text
//! Seeding ──seed()──► Draining ──step()…──► Done
//! ```
//!
//! - **Seed**: tree-root classes are grown; entry points are queued.
//! - **Drain**: each [`TreeGrower::step`] processes one batch of queued
//!   methods. Every method not yet grown (and not abstract or dead) is grown
//!   and run through [`grow`]. The batch's discoveries are then folded in:
//!   1. new methods are queued for the next batch;
//!   2. each new class is matched against every handled selector and every
//!      pending typed selector (a typed entry is consumed when the class
//!      resolves its selector to the recorded target);
//!   3. each new untyped selector is matched against every grown class and
//!      becomes handled;
//!   4. each new typed selector is matched against the grown classes, and
//!      otherwise kept pending, unless its target is grown or its selector
//!      already handled.
//! - **Done**: the queue is empty. All sets only ever grow, so this is
//!   reached in at most `|methods| + |classes| + |selectors|` batches.
//!
//! After the fixpoint every superclass of a grown class is added as
//! *ancestor only*: kept for layout and dispatch tables, never instantiated.

use keel_ir::{CallSelector, ClassId, FxIndexMap, FxIndexSet, MethodId, Program};

use crate::{grow, Queryables, TreeLogger, TypeOracle};

/// Where a [`TreeGrower`] is in its run.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GrowState {
    Seeding,
    Draining,
    Done,
}

/// Result of the fixpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Grown {
    /// Instantiated classes in discovery order, then ancestor-only classes.
    pub classes: FxIndexSet<ClassId>,
    /// Reachable methods, including globals and statics.
    pub methods: FxIndexSet<MethodId>,
    /// The subset of `classes` kept only as superclasses.
    pub ancestors: FxIndexSet<ClassId>,
}

impl Grown {
    /// Whether objects of exactly `class` can exist.
    pub fn is_instantiated(&self, class: ClassId) -> bool {
        self.classes.contains(&class) && !self.ancestors.contains(&class)
    }
}

/// Drives reachability to a fixpoint.
pub struct TreeGrower<'a> {
    program: &'a Program,
    queryables: &'a Queryables,
    oracle: &'a dyn TypeOracle,
    state: GrowState,
    queue: Vec<MethodId>,
    grown_classes: FxIndexSet<ClassId>,
    grown_methods: FxIndexSet<MethodId>,
    /// Untyped selectors already matched against every grown class.
    handled: FxIndexSet<CallSelector>,
    /// Typed selectors waiting for a class that resolves them to a target.
    typed: FxIndexMap<CallSelector, FxIndexSet<MethodId>>,
    batches: usize,
}

impl<'a> TreeGrower<'a> {
    pub fn new(program: &'a Program, queryables: &'a Queryables, oracle: &'a dyn TypeOracle) -> Self {
        TreeGrower {
            program,
            queryables,
            oracle,
            state: GrowState::Seeding,
            queue: Vec::new(),
            grown_classes: FxIndexSet::default(),
            grown_methods: FxIndexSet::default(),
            handled: FxIndexSet::default(),
            typed: FxIndexMap::default(),
            batches: 0,
        }
    }

    #[inline]
    pub fn state(&self) -> GrowState {
        self.state
    }

    pub fn grown_classes(&self) -> &FxIndexSet<ClassId> {
        &self.grown_classes
    }

    pub fn grown_methods(&self) -> &FxIndexSet<MethodId> {
        &self.grown_methods
    }

    /// Number of batches drained so far.
    pub fn batches(&self) -> usize {
        self.batches
    }

    /// Grow the tree roots and queue the entry points.
    pub fn seed(&mut self, logger: &mut dyn TreeLogger) {
        assert_eq!(self.state, GrowState::Seeding, "tree grower seeded twice");
        for &class in &self.program.tree_roots {
            logger.root_class(class);
            self.grown_classes.insert(class);
        }
        for &method in &self.program.entry_points {
            logger.root_method(method);
            self.queue.push(method);
        }
        tracing::debug!(
            roots = self.grown_classes.len(),
            entry_points = self.queue.len(),
            "seeded tree grower"
        );
        self.state = if self.queue.is_empty() {
            GrowState::Done
        } else {
            GrowState::Draining
        };
    }

    /// Drain one batch. Returns whether another batch is queued.
    ///
    /// Once [`GrowState::Done`] is reached further steps change nothing.
    pub fn step(&mut self, logger: &mut dyn TreeLogger) -> bool {
        match self.state {
            GrowState::Seeding => self.seed(logger),
            GrowState::Draining => self.drain_batch(logger),
            GrowState::Done => {}
        }
        self.state == GrowState::Draining
    }

    /// Run to the fixpoint and return the grown sets.
    pub fn run(mut self, logger: &mut dyn TreeLogger) -> Grown {
        while self.step(logger) {}
        self.finish()
    }

    /// Add ancestors of grown classes and return the grown sets.
    ///
    /// # Panics
    ///
    /// Panics if the fixpoint has not been reached.
    pub fn finish(self) -> Grown {
        assert_eq!(self.state, GrowState::Done, "tree grower finished before its fixpoint");
        let program = self.program;
        let mut classes = self.grown_classes;
        let mut ancestors = FxIndexSet::default();
        for &class in &classes {
            let mut current = program.class(class).super_class;
            while let Some(super_class) = current {
                if classes.contains(&super_class) || !ancestors.insert(super_class) {
                    break;
                }
                current = program.class(super_class).super_class;
            }
        }
        classes.extend(ancestors.iter().copied());
        tracing::debug!(
            batches = self.batches,
            classes = classes.len(),
            ancestors = ancestors.len(),
            methods = self.grown_methods.len(),
            "tree grower reached fixpoint"
        );
        Grown {
            classes,
            methods: self.grown_methods,
            ancestors,
        }
    }

    fn drain_batch(&mut self, logger: &mut dyn TreeLogger) {
        let batch = std::mem::take(&mut self.queue);
        self.batches += 1;

        let mut found_classes: FxIndexSet<ClassId> = FxIndexSet::default();
        let mut found_methods: FxIndexSet<MethodId> = FxIndexSet::default();
        let mut found_typed: FxIndexSet<(CallSelector, MethodId)> = FxIndexSet::default();
        let mut found_untyped: FxIndexSet<CallSelector> = FxIndexSet::default();

        for &method in &batch {
            if self.grown_methods.contains(&method) {
                continue;
            }
            let method_ref = self.program.method(method);
            if method_ref.is_abstract() || method_ref.is_dead() || self.oracle.is_dead_method(method) {
                continue;
            }
            self.grown_methods.insert(method);
            let growth = grow(self.program, method, self.oracle);
            logger.add(method, &growth);
            found_classes.extend(growth.classes);
            found_methods.extend(growth.methods);
            found_typed.extend(growth.typed);
            found_untyped.extend(growth.untyped);
        }

        tracing::debug!(
            batch = self.batches,
            queued = batch.len(),
            classes = found_classes.len(),
            methods = found_methods.len(),
            typed = found_typed.len(),
            untyped = found_untyped.len(),
            "drained batch"
        );

        self.queue.extend(found_methods);

        for class in found_classes {
            if self.grown_classes.insert(class) {
                self.match_new_class(class, logger);
            }
        }

        let new_untyped: Vec<CallSelector> = found_untyped
            .into_iter()
            .filter(|selector| !self.handled.contains(selector))
            .collect();
        for &class in &self.grown_classes {
            let queryable = self.queryables.get(class);
            for selector in &new_untyped {
                if let Some(method) = queryable.lookup(selector) {
                    tracing::trace!(?selector, ?method, "untyped selector matched");
                    logger.add_method_with_selector(selector, method);
                    self.queue.push(method);
                }
            }
        }
        for selector in new_untyped {
            // The untyped match subsumes any pending typed entries.
            self.typed.shift_remove(&selector);
            self.handled.insert(selector);
        }

        for (selector, target) in found_typed {
            self.add_typed(selector, target, logger);
        }

        if self.queue.is_empty() {
            self.state = GrowState::Done;
        }
    }

    fn match_new_class(&mut self, class: ClassId, logger: &mut dyn TreeLogger) {
        let queryables = self.queryables;
        let queryable = queryables.get(class);
        for selector in &self.handled {
            if let Some(method) = queryable.lookup(selector) {
                tracing::trace!(?selector, ?method, "handled selector matched new class");
                logger.add_method_with_selector(selector, method);
                self.queue.push(method);
            }
        }
        let queue = &mut self.queue;
        self.typed.retain(|selector, targets| {
            if let Some(method) = queryable.lookup(selector) {
                if targets.shift_remove(&method) {
                    tracing::trace!(?selector, ?method, "typed selector matched new class");
                    logger.add_method_with_selector(selector, method);
                    queue.push(method);
                }
            }
            !targets.is_empty()
        });
    }

    fn add_typed(&mut self, selector: CallSelector, target: MethodId, logger: &mut dyn TreeLogger) {
        if self.grown_methods.contains(&target) || self.handled.contains(&selector) {
            return;
        }
        let holder = self.program.method(target).holder;
        if !holder.is_some_and(|holder| self.queryables.contains(holder)) {
            panic!(
                "typed selector target {} has no selector map for its holder",
                self.program.method_display_name(target)
            );
        }
        let matched = self
            .grown_classes
            .iter()
            .any(|&class| self.queryables.get(class).lookup(&selector) == Some(target));
        if matched {
            tracing::trace!(?selector, method = ?target, "typed selector matched grown class");
            logger.add_method_with_selector(&selector, target);
            self.queue.push(target);
            return;
        }
        self.typed.entry(selector).or_default().insert(target);
    }
}
