//! Node-local errors.
//!
//! Every error is attached to the module it was raised for and reported with it. None of
//! them stop other modules from being evaluated.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModuleError {
    // === Edge classification ===
    #[error("unknown dependency role {role:?} for {dep:?}")]
    UnknownDependencyRole { dep: String, role: String },

    #[error("depends on undefined module {dep:?}")]
    UndefinedDependency { dep: String },

    #[error("{dep:?} produces no jar and cannot be used as a {tag} dependency")]
    NotAJavaLibrary { dep: String, tag: String },

    #[error("genrule {dep:?} must generate files ending with .jar to be used as a libs or static_libs dependency, found {file:?}")]
    NotAJar { dep: String, file: PathBuf },

    #[error("a java_plugin ({dep}) cannot be used as a {tag} dependency")]
    PluginAsLibrary { dep: String, tag: String },

    #[error("{dep:?} is not a java_plugin module")]
    NotAPlugin { dep: String },

    #[error("{dep:?} is not a java_system_modules module")]
    NotSystemModules { dep: String },

    #[error("found two system modules dependencies: {first:?} and {second:?}")]
    DuplicateSystemModules { first: String, second: String },

    // === SDK / language level ===
    #[error("invalid sdk_version {raw:?}")]
    InvalidSdkVersion { raw: String },

    #[error("invalid sdk_version {raw:?}, {path:?} does not exist")]
    MissingSdkPrebuilt { raw: String, path: PathBuf },

    #[error("system_modules is required to be set to a non-empty value when sdk_version is \"none\", did you mean sdk_version: \"core_platform\"?")]
    MissingSystemModules,

    #[error("Java language level {raw} is not supported")]
    UnsupportedJavaVersion { raw: String },

    #[error("unrecognized Java language level {raw:?}")]
    UnrecognizedJavaVersion { raw: String },

    // === Class loader context ===
    #[error("a <uses-library> named {name:?} is already in class loader context, but the library paths are different")]
    ConflictingUsesLibrary { name: String },

    #[error("invalid build path for <uses-library> {name:?}")]
    InvalidClcBuildPath { name: String },

    #[error("invalid install path for <uses-library> {name:?}")]
    InvalidClcInstallPath { name: String },

    #[error("nested class loader context of {name:?} shouldn't have conditional part for sdk {sdk_version}")]
    ConditionalNestedContext { name: String, sdk_version: String },
}

impl ModuleError {
    /// Errors that only record a classification mismatch on an edge.
    pub fn is_classification(&self) -> bool {
        matches!(
            self,
            ModuleError::UnknownDependencyRole { .. }
                | ModuleError::NotAJavaLibrary { .. }
                | ModuleError::NotAJar { .. }
                | ModuleError::PluginAsLibrary { .. }
                | ModuleError::NotAPlugin { .. }
                | ModuleError::NotSystemModules { .. }
                | ModuleError::DuplicateSystemModules { .. }
        )
    }
}
