//! Compaction: drop everything the fixpoint did not grow.
//!
//! 1. Keep every mixin, every grown class, and every class holding a grown
//!    method, in program order. A class kept only for its constructors,
//!    factories, or statics keeps its superclasses too and is not
//!    instantiated.
//! 2. Keep every grown top-level function and global, in program order.
//! 3. Filter each kept class's constructors, factories, statics, and
//!    instance methods to grown ones, in order.
//! 4. Run [`Fixup`] once over every method that is still listed.
//!
//! Mixins are kept unconditionally: stub insertion copied their members
//! into consuming classes and the stubs still refer to them.

use keel_ir::{ClassFlags, ClassId, MethodId, Program};
use rustc_hash::FxHashSet;

use crate::{Fixup, Grown, KeptCount, ShakeStats};

/// Compact `program` to the grown sets and fix up surviving bodies.
#[tracing::instrument(level = "debug", skip_all, fields(classes = grown.classes.len(), methods = grown.methods.len()))]
pub fn shake(program: &mut Program, grown: &Grown) -> ShakeStats {
    // Valid check targets look at membership stubs that compaction removes.
    let fixup = Fixup::for_grown(program, grown);

    let kept = kept_classes(program, grown);
    let total_classes = program.classes.len();
    program.classes.retain(|class| kept.contains(class));

    let total_functions = program.methods.len();
    program.methods = keep_grown(&program.methods, grown);
    let total_globals = program.globals.len();
    program.globals = keep_grown(&program.globals, grown);

    let mut total_instance_methods = 0;
    let mut kept_instance_methods = 0;
    for index in 0..program.classes.len() {
        let id = program.classes[index];
        let instantiated = grown.is_instantiated(id);
        let class = program.class_mut(id);
        total_instance_methods += class.methods.len();
        class.constructors = keep_grown(&class.constructors, grown);
        class.factories = keep_grown(&class.factories, grown);
        class.statics = keep_grown(&class.statics, grown);
        class.methods = keep_grown(&class.methods, grown);
        kept_instance_methods += class.methods.len();
        class.flags.set(ClassFlags::INSTANTIATED, instantiated);
    }

    let stats = ShakeStats {
        classes: KeptCount::new(program.classes.len(), total_classes),
        global_functions: KeptCount::new(program.methods.len(), total_functions),
        globals: KeptCount::new(program.globals.len(), total_globals),
        instance_methods: KeptCount::new(kept_instance_methods, total_instance_methods),
    };

    let mut seen: FxHashSet<MethodId> = FxHashSet::default();
    let mut rewrites = 0;
    for method in program.all_methods() {
        if seen.insert(method) {
            rewrites += fixup.fixup_method(program, method);
        }
    }
    tracing::debug!(
        classes = stats.classes.kept,
        methods = seen.len(),
        rewrites,
        "compacted program"
    );
    stats
}

/// Mixins, grown classes, and the holder of every grown method together
/// with the holder's superclasses.
fn kept_classes(program: &Program, grown: &Grown) -> FxHashSet<ClassId> {
    let mut kept: FxHashSet<ClassId> = grown.classes.iter().copied().collect();
    for &method in &grown.methods {
        let Some(holder) = program.method(method).holder else {
            continue;
        };
        for class in program.super_chain(holder) {
            if !kept.insert(class) {
                break;
            }
        }
    }
    kept.extend(
        program
            .classes
            .iter()
            .copied()
            .filter(|&class| program.class(class).is_mixin()),
    );
    kept
}

/// Disabled mode: remove abstract methods from every class and nothing else.
pub fn strip_abstract_methods(program: &mut Program) -> ShakeStats {
    let mut total = 0;
    let mut kept = 0;
    for index in 0..program.classes.len() {
        let class = program.classes[index];
        let methods = std::mem::take(&mut program.class_mut(class).methods);
        total += methods.len();
        let concrete: Vec<MethodId> = methods
            .into_iter()
            .filter(|&method| !program.method(method).is_abstract())
            .collect();
        kept += concrete.len();
        program.class_mut(class).methods = concrete;
    }
    tracing::debug!(removed = total - kept, "tree shaking disabled; stripped abstract methods");

    let classes = program.classes.len();
    let functions = program.methods.len();
    let globals = program.globals.len();
    ShakeStats {
        classes: KeptCount::new(classes, classes),
        global_functions: KeptCount::new(functions, functions),
        globals: KeptCount::new(globals, globals),
        instance_methods: KeptCount::new(kept, total),
    }
}

fn keep_grown(methods: &[MethodId], grown: &Grown) -> Vec<MethodId> {
    methods
        .iter()
        .copied()
        .filter(|method| grown.methods.contains(method))
        .collect()
}
