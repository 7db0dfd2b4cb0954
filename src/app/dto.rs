use crate::domain::classpath::SelectedSystemModules;
use crate::domain::clc::{ClassLoaderContextMap, EncodedClassLoaderContext};
use crate::domain::error::ModuleError;
use crate::domain::sdk::JavaVersion;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub declarations_path: String,
    pub module_count: usize,
    pub edge_count: usize,
    pub wave_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArtifactsResponse {
    pub module: String,
    pub module_type: String,
    pub header_jars: Vec<PathBuf>,
    pub implementation_jars: Vec<PathBuf>,
    pub resource_jars: Vec<PathBuf>,
    pub transitive_header_jars: Vec<PathBuf>,
    pub transitive_static_header_jars: Vec<PathBuf>,
    pub exported_keep_rule_files: Vec<PathBuf>,
    pub exported_keep_rule_files_unconditional: Vec<PathBuf>,
    pub exported_plugins: Vec<PathBuf>,
    pub exported_plugin_classes: Vec<String>,
    pub exported_plugin_disable_turbine: bool,
    pub dex_jar_build_path: Option<PathBuf>,
    pub dex_jar_install_path: Option<PathBuf>,
    /// Set for system modules.
    pub system_modules_dir: Option<PathBuf>,
    /// Set for file producers.
    pub source_files: Option<Vec<PathBuf>>,
    pub errors: Vec<ModuleError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClasspathResponse {
    pub module: String,
    pub sdk_version: Option<String>,
    pub java_version: Option<JavaVersion>,
    /// `-jvm-target` for kotlinc at the same language level.
    pub kotlin_target: Option<&'static str>,
    pub classpath: Vec<PathBuf>,
    pub dex_classpath: Vec<PathBuf>,
    pub bootclasspath: Vec<PathBuf>,
    pub java9_classpath: Vec<PathBuf>,
    pub system_modules: Option<SelectedSystemModules>,
    pub processor_path: Vec<PathBuf>,
    pub processor_classes: Vec<String>,
    pub disable_turbine: bool,
    pub static_jars: Vec<PathBuf>,
    pub static_header_jars: Vec<PathBuf>,
    pub static_resource_jars: Vec<PathBuf>,
    pub proguard_raise_jars: Vec<PathBuf>,
    /// Preprocessed aidl file of a prebuilt SDK.
    pub aidl_preprocess: Option<PathBuf>,
    pub missing_dependencies: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClcResponse {
    pub module: String,
    pub uses_libs: Vec<String>,
    pub contexts: Arc<ClassLoaderContextMap>,
    pub valid: bool,
    pub encoded: Option<EncodedClassLoaderContext>,
    pub error: Option<ModuleError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleDiagnostics {
    pub module: String,
    pub errors: Vec<ModuleError>,
    pub missing_dependencies: Vec<String>,
    /// Why the module's class loader context can't be consumed.
    pub clc_error: Option<ModuleError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckResponse {
    pub module_count: usize,
    pub failed_module_count: usize,
    pub invalid_clc_count: usize,
    /// Only modules with something to report.
    pub modules: Vec<ModuleDiagnostics>,
}

impl CheckResponse {
    pub fn is_clean(&self) -> bool {
        self.failed_module_count == 0 && self.invalid_clc_count == 0
    }
}
