//! Keel tree shaking - whole-program reachability and dead-code removal.
//!
//! Runs after all other optimizations and decides exactly which classes,
//! methods, constructors, and globals survive into code generation. The
//! surviving code is then rewritten so it stays correct without the code
//! that was removed.
//!
//! # Pipeline
//!
//! ```text
//! Program ──► Queryables ──► TreeGrower ──► shake (compaction) ──► Fixup
//!             selector maps   fixpoint       filter lists          rewrite bodies
//! ```
//!
//! - [`Queryables`]: per-class `selector → method` maps
//! - [`grow()`]: one-step reachability from a single method body
//! - [`TreeGrower`]: fixpoint over typed and untyped selectors
//! - [`shake()`]: compaction of the program lists
//! - [`Fixup`]: rewrites references to code that no longer exists
//!
//! The whole pass is driven by [`tree_shake`].
//!
//! # Determinism
//!
//! Every set whose iteration order is observable is insertion ordered
//! ([`keel_ir::FxIndexSet`]), so identical input gives identical output and
//! identical diagnostics.

mod fixup;
mod grow;
mod logger;
mod options;
mod oracle;
mod queryable;
mod report;
mod shake;
mod tree_grower;
mod validate;

#[cfg(test)]
mod test_helpers;

use std::sync::Once;

use keel_ir::Program;

pub use fixup::{valid_check_targets, Fixup};
pub use grow::{grow, Growth};
pub use logger::{GraphvizTree, GraphvizTreeLogger, NullTreeLogger, TreeLogger};
pub use options::ShakeOptions;
pub use oracle::{PropagationFacts, TypeOracle};
pub use queryable::{collect_call_shapes, ObservedShapes, Queryables, QueryableClass};
pub use report::{KeptCount, ShakeStats};
pub use shake::{shake, strip_abstract_methods};
pub use tree_grower::{GrowState, Grown, TreeGrower};
pub use validate::{shaken_violations, validate_shaken, Violation};

static TRACING_INIT: Once = Once::new();

/// Install a tracing subscriber for the pass.
///
/// Does nothing unless `RUST_LOG` is set. With `KEEL_LOG_TREE` set, spans
/// are rendered as an indented tree instead of flat lines. Safe to call
/// more than once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_err() {
            return;
        }
        let filter = EnvFilter::from_default_env();
        if std::env::var("KEEL_LOG_TREE").is_ok() {
            tracing_subscriber::registry()
                .with(
                    tracing_tree::HierarchicalLayer::new(2)
                        .with_targets(true)
                        .with_bracketed_fields(true),
                )
                .with(filter)
                .init();
        } else {
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}

/// Run tree shaking over `program`, in place.
///
/// With `options.enabled` off, only abstract methods are stripped (later
/// stages never see a body-less abstract method) and nothing is rewritten.
///
/// Returns kept/total counts; they are also logged at info level when
/// `options.report` is set.
#[tracing::instrument(
    level = "debug",
    skip_all,
    fields(
        enabled = options.enabled,
        classes = program.classes.len(),
        entry_points = program.entry_points.len(),
    )
)]
pub fn tree_shake(program: &mut Program, options: &ShakeOptions, oracle: &dyn TypeOracle) -> ShakeStats {
    if !options.enabled {
        let stats = strip_abstract_methods(program);
        if options.report {
            stats.log();
        }
        return stats;
    }

    let queryables = Queryables::from_plain_shapes(program);
    let grown = match &options.dependency_tree {
        Some(path) => {
            let mut logger = GraphvizTreeLogger::new();
            let grown = TreeGrower::new(program, &queryables, oracle).run(&mut logger);
            if let Err(err) = std::fs::write(path, logger.display(program).to_string()) {
                tracing::warn!(path = %path.display(), %err, "could not write dependency tree");
            }
            grown
        }
        None => TreeGrower::new(program, &queryables, oracle).run(&mut NullTreeLogger),
    };

    let stats = shake(program, &grown);
    if options.report {
        stats.log();
    }
    validate_shaken(program);
    stats
}
