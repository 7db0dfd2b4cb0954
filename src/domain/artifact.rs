//! Records a module publishes once evaluated.

use crate::domain::clc::ClassLoaderContextMap;
use crate::domain::depset::DepSet;
use crate::domain::ports::DependencyCapabilities;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Jars and transitive sets a Java module exposes to its dependents.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ArtifactInfo {
    /// Jars to compile against.
    pub header_jars: Vec<PathBuf>,
    /// Jars with full implementations, for packaging.
    pub implementation_jars: Vec<PathBuf>,
    pub resource_jars: Vec<PathBuf>,

    /// Header jars of everything this module compiles against through static edges, plus
    /// the direct header jars of its shared and uses-library dependencies.
    pub transitive_header_jars: DepSet<PathBuf>,
    /// Header jars reachable through static edges only.
    pub transitive_static_header_jars: DepSet<PathBuf>,

    pub exported_keep_rule_files: DepSet<PathBuf>,
    /// Keep rules every dependent applies, whatever the edge kind.
    pub exported_keep_rule_files_unconditional: DepSet<PathBuf>,
    pub export_keep_rule_files: bool,

    /// Annotation processor jars dependents run.
    pub exported_plugins: Vec<PathBuf>,
    pub exported_plugin_classes: Vec<String>,
    /// An exported plugin generates API, so dependents can't use header-only compilation.
    pub exported_plugin_disable_turbine: bool,
}

/// Annotation processor published by a plugin module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PluginInfo {
    pub processor_class: Option<String>,
    pub generates_api: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemModulesInfo {
    pub output_dir: PathBuf,
    pub header_jars: Vec<PathBuf>,
}

/// What a class loader context entry for this library is built from.
#[derive(Debug, Clone, Serialize)]
pub struct UsesLibraryInfo {
    pub dex_jar_build_path: Option<PathBuf>,
    pub dex_jar_install_path: Option<PathBuf>,
    pub class_loader_contexts: Arc<ClassLoaderContextMap>,
}

/// The immutable record published for a module.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PublishedModule {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<ArtifactInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uses_library: Option<UsesLibraryInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sdk_library_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provides_uses_lib: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugin: Option<PluginInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_modules: Option<SystemModulesInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_files: Option<Vec<PathBuf>>,
}

impl PublishedModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl DependencyCapabilities for PublishedModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn artifact_info(&self) -> Option<&ArtifactInfo> {
        self.artifact.as_ref()
    }

    fn uses_library(&self) -> Option<&UsesLibraryInfo> {
        self.uses_library.as_ref()
    }

    fn sdk_library_name(&self) -> Option<&str> {
        self.sdk_library_name.as_deref()
    }

    fn provides_uses_lib(&self) -> Option<&str> {
        self.provides_uses_lib.as_deref()
    }

    fn plugin_info(&self) -> Option<&PluginInfo> {
        self.plugin.as_ref()
    }

    fn system_modules(&self) -> Option<&SystemModulesInfo> {
        self.system_modules.as_ref()
    }

    fn source_files(&self) -> Option<&[PathBuf]> {
        self.source_files.as_deref()
    }
}
