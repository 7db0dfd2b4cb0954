//! Keep-rule (proguard flags) propagation.

use crate::domain::artifact::ArtifactInfo;
use crate::domain::depset::DepSet;
use crate::domain::edge::{DependencyKind, DependencyTag};
use std::path::PathBuf;

/// Keep-rule sets published by a module.
#[derive(Debug, Clone, Default)]
pub struct ProguardSpecInfo {
    pub export: bool,
    /// Own flags and everything inherited.
    pub files: DepSet<PathBuf>,
    /// Subset every dependent applies regardless of how it depends on this module.
    pub unconditional: DepSet<PathBuf>,
}

/// Collects keep rules from a module's direct dependencies.
///
/// Static dependencies contribute their whole set. Any other linked dependency contributes
/// only what it exports unconditionally.
#[derive(Debug, Default)]
pub struct ProguardSpecCollector {
    transitive_files: Vec<DepSet<PathBuf>>,
    transitive_unconditional: Vec<DepSet<PathBuf>>,
}

impl ProguardSpecCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_dependency(&mut self, tag: &DependencyTag, dep: &ArtifactInfo) {
        if !matches!(
            tag.kind,
            DependencyKind::Static | DependencyKind::Shared { .. } | DependencyKind::UsesLibrary { .. }
        ) {
            return;
        }
        if !dep.exported_keep_rule_files_unconditional.is_empty() {
            self.transitive_unconditional
                .push(dep.exported_keep_rule_files_unconditional.clone());
            self.transitive_files
                .push(dep.exported_keep_rule_files_unconditional.clone());
        }
        if tag.is_static() {
            self.transitive_files.push(dep.exported_keep_rule_files.clone());
        }
    }

    pub fn finish(self, own_files: Vec<PathBuf>, export: bool) -> ProguardSpecInfo {
        let files = DepSet::new(own_files.iter().cloned(), self.transitive_files.iter().cloned());
        // Exporting promotes everything this module sees to unconditional.
        let unconditional = if export {
            DepSet::new(own_files, self.transitive_files)
        } else {
            DepSet::new(Vec::new(), self.transitive_unconditional)
        };
        ProguardSpecInfo {
            export,
            files,
            unconditional,
        }
    }
}
