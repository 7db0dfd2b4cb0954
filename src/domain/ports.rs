use crate::domain::artifact::{ArtifactInfo, PluginInfo, SystemModulesInfo, UsesLibraryInfo};
use crate::domain::declaration::ModuleDeclaration;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Module declaration source port (implemented by Infrastructure)
pub trait DeclarationSource {
    fn load(&self) -> Result<Vec<ModuleDeclaration>>;
}

/// Prebuilt SDK file lookup port
pub trait SdkFiles: Send + Sync {
    fn exists(&self, path: &Path) -> bool;
}

/// What a published module can be used for by the modules depending on it.
///
/// Consumers never switch on the module type; they ask for the capability they need and
/// treat `None` as "this dependency doesn't provide it".
pub trait DependencyCapabilities: Send + Sync {
    fn name(&self) -> &str;

    /// Jars for compilation and packaging.
    fn artifact_info(&self) -> Option<&ArtifactInfo> {
        None
    }

    /// Dex jar and class loader context, for libraries loadable at runtime.
    fn uses_library(&self) -> Option<&UsesLibraryInfo> {
        None
    }

    /// Set for shared SDK-surface libraries.
    fn sdk_library_name(&self) -> Option<&str> {
        None
    }

    /// Opaque `<uses-library>` identity declared by the module itself.
    fn provides_uses_lib(&self) -> Option<&str> {
        None
    }

    fn plugin_info(&self) -> Option<&PluginInfo> {
        None
    }

    fn system_modules(&self) -> Option<&SystemModulesInfo> {
        None
    }

    /// Output files of a plain file producer.
    fn source_files(&self) -> Option<&[PathBuf]> {
        None
    }

    /// Library name a class loader would know this dependency by, if any.
    fn class_loader_identity(&self) -> Option<&str> {
        self.sdk_library_name().or_else(|| self.provides_uses_lib())
    }
}
