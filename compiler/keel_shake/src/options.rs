//! Tree shaking configuration.
//!
//! Environment variables (presence enables; the value is ignored except
//! for the dump path):
//!
//! - `KEEL_DISABLE_TREE_SHAKING`: skip reachability, only strip abstract
//!   methods
//! - `KEEL_REPORT_TREE_SHAKING`: log kept/total counts at info level
//! - `KEEL_DEPENDENCY_TREE=<path>`: write the reachability graph as a
//!   Graphviz `digraph` to `<path>`

use std::ffi::OsString;
use std::path::PathBuf;

/// Options for [`tree_shake`](crate::tree_shake).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShakeOptions {
    /// Run reachability and compaction. Off means abstract-method
    /// stripping only.
    pub enabled: bool,
    /// Log the kept/total report.
    pub report: bool,
    /// Where to write the dependency-tree dump, if anywhere.
    pub dependency_tree: Option<PathBuf>,
}

impl Default for ShakeOptions {
    fn default() -> Self {
        ShakeOptions {
            enabled: true,
            report: false,
            dependency_tree: None,
        }
    }
}

impl ShakeOptions {
    /// Read options from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var_os(key))
    }

    /// Read options through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<OsString>) -> Self {
        ShakeOptions {
            enabled: lookup("KEEL_DISABLE_TREE_SHAKING").is_none(),
            report: lookup("KEEL_REPORT_TREE_SHAKING").is_some(),
            dependency_tree: lookup("KEEL_DEPENDENCY_TREE")
                .filter(|path| !path.is_empty())
                .map(PathBuf::from),
        }
    }

    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_report(mut self, report: bool) -> Self {
        self.report = report;
        self
    }

    #[must_use]
    pub fn with_dependency_tree(mut self, path: impl Into<PathBuf>) -> Self {
        self.dependency_tree = Some(path.into());
        self
    }
}
