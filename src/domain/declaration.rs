//! Module declarations as read from a build description.

use crate::domain::edge::RawDependency;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleType {
    JavaLibrary,
    /// Prebuilt jars.
    JavaImport,
    /// Shared library exposing an SDK surface through stubs.
    JavaSdkLibrary,
    JavaPlugin,
    JavaSystemModules,
    /// Plain file producer.
    Genrule,
}

impl ModuleType {
    pub fn as_str(self) -> &'static str {
        match self {
            ModuleType::JavaLibrary => "java_library",
            ModuleType::JavaImport => "java_import",
            ModuleType::JavaSdkLibrary => "java_sdk_library",
            ModuleType::JavaPlugin => "java_plugin",
            ModuleType::JavaSystemModules => "java_system_modules",
            ModuleType::Genrule => "genrule",
        }
    }

    /// Module types compiled against an SDK surface.
    pub fn resolves_sdk(self) -> bool {
        matches!(self, ModuleType::JavaLibrary | ModuleType::JavaSdkLibrary)
    }
}

impl fmt::Display for ModuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dependency declared by tag name rather than by property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedDependency {
    pub name: String,
    pub tag: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDeclaration {
    pub name: String,
    #[serde(rename = "type")]
    pub module_type: ModuleType,

    #[serde(default)]
    pub libs: Vec<String>,
    #[serde(default)]
    pub static_libs: Vec<String>,
    #[serde(default)]
    pub plugins: Vec<String>,
    #[serde(default)]
    pub exported_plugins: Vec<String>,
    #[serde(default)]
    pub jni_libs: Vec<String>,
    #[serde(default)]
    pub uses_libs: Vec<String>,
    #[serde(default)]
    pub optional_uses_libs: Vec<String>,
    #[serde(default)]
    pub extra_deps: Vec<TaggedDependency>,

    #[serde(default)]
    pub sdk_version: Option<String>,
    #[serde(default)]
    pub system_modules: Option<String>,
    #[serde(default)]
    pub java_version: Option<String>,

    #[serde(default)]
    pub proguard_flags_files: Vec<PathBuf>,
    #[serde(default)]
    pub export_proguard_flags_files: bool,
    #[serde(default)]
    pub optimize: bool,

    #[serde(default)]
    pub installable: Option<bool>,
    #[serde(default)]
    pub compile_dex: Option<bool>,
    #[serde(default)]
    pub provides_uses_lib: Option<String>,
    #[serde(default)]
    pub stem: Option<String>,
    #[serde(default)]
    pub java_resources: Vec<PathBuf>,

    /// `java_import` only.
    #[serde(default)]
    pub jars: Vec<PathBuf>,
    /// `genrule` only.
    #[serde(default)]
    pub outputs: Vec<String>,
    /// `java_plugin` only.
    #[serde(default)]
    pub processor_class: Option<String>,
    #[serde(default)]
    pub generates_api: bool,
    /// `java_sdk_library` only; defaults to true.
    #[serde(default)]
    pub shared_library: Option<bool>,
}

impl ModuleDeclaration {
    pub fn new(name: impl Into<String>, module_type: ModuleType) -> Self {
        Self {
            name: name.into(),
            module_type,
            libs: Vec::new(),
            static_libs: Vec::new(),
            plugins: Vec::new(),
            exported_plugins: Vec::new(),
            jni_libs: Vec::new(),
            uses_libs: Vec::new(),
            optional_uses_libs: Vec::new(),
            extra_deps: Vec::new(),
            sdk_version: None,
            system_modules: None,
            java_version: None,
            proguard_flags_files: Vec::new(),
            export_proguard_flags_files: false,
            optimize: false,
            installable: None,
            compile_dex: None,
            provides_uses_lib: None,
            stem: None,
            java_resources: Vec::new(),
            jars: Vec::new(),
            outputs: Vec::new(),
            processor_class: None,
            generates_api: false,
            shared_library: None,
        }
    }

    pub fn stem(&self) -> &str {
        self.stem.as_deref().unwrap_or(&self.name)
    }

    pub fn installable(&self) -> bool {
        self.installable
            .unwrap_or(matches!(self.module_type, ModuleType::JavaLibrary | ModuleType::JavaSdkLibrary))
    }

    pub fn compiles_to_dex(&self) -> bool {
        self.compile_dex.unwrap_or_else(|| self.installable())
    }

    pub fn is_shared_sdk_library(&self) -> bool {
        self.module_type == ModuleType::JavaSdkLibrary && self.shared_library.unwrap_or(true)
    }

    /// Declared dependencies in declaration order, by property.
    pub fn raw_dependencies(&self) -> Vec<RawDependency> {
        let by_property: [(&str, &Vec<String>); 7] = [
            ("libs", &self.libs),
            ("static_libs", &self.static_libs),
            ("plugins", &self.plugins),
            ("exported_plugins", &self.exported_plugins),
            ("jni_libs", &self.jni_libs),
            ("uses_libs", &self.uses_libs),
            ("optional_uses_libs", &self.optional_uses_libs),
        ];
        let mut deps: Vec<RawDependency> = by_property
            .into_iter()
            .flat_map(|(role, names)| names.iter().map(move |name| RawDependency::new(name.as_str(), role)))
            .collect();
        deps.extend(
            self.extra_deps
                .iter()
                .map(|dep| RawDependency::new(dep.name.as_str(), dep.tag.as_str())),
        );
        deps
    }
}

/// Top-level shape of a declarations file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeclarationFile {
    pub modules: Vec<ModuleDeclaration>,
}
