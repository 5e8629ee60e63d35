//! Kept/total counts produced by tree shaking.

use std::fmt;

/// How many of something survived.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct KeptCount {
    pub kept: usize,
    pub total: usize,
}

impl KeptCount {
    pub fn new(kept: usize, total: usize) -> Self {
        debug_assert!(kept <= total, "kept {kept} exceeds total {total}");
        KeptCount { kept, total }
    }

    pub fn removed(self) -> usize {
        self.total - self.kept
    }
}

/// Summary of one tree shaking run.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ShakeStats {
    pub classes: KeptCount,
    pub global_functions: KeptCount,
    pub globals: KeptCount,
    /// Instance methods summed over the classes that survived.
    pub instance_methods: KeptCount,
}

impl ShakeStats {
    /// Log the report, one line per category.
    pub fn log(&self) {
        for (what, count) in self.lines() {
            tracing::info!(kept = count.kept, total = count.total, "Kept {} out of {} {what}", count.kept, count.total);
        }
    }

    fn lines(&self) -> [(&'static str, KeptCount); 4] {
        [
            ("classes", self.classes),
            ("global functions", self.global_functions),
            ("globals", self.globals),
            ("instance methods", self.instance_methods),
        ]
    }
}

impl fmt::Display for ShakeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (what, count) in self.lines() {
            writeln!(f, "Kept {} out of {} {what}", count.kept, count.total)?;
        }
        Ok(())
    }
}
