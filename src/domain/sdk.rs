//! SDK surface and Java language level resolution.
//!
//! Decides which boot classpath, system modules and classpath libraries a module compiles
//! against. Prebuilt SDK jars are looked up through the [`SdkFiles`] port; a missing
//! prebuilt is either a missing-dependency marker or a hard module error depending on
//! whether missing dependencies are allowed.

use crate::domain::error::ModuleError;
use crate::domain::ports::SdkFiles;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;

/// Java language level accepted by javac.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum JavaVersion {
    V1_6 = 6,
    V1_7 = 7,
    V1_8 = 8,
    V1_9 = 9,
    V11 = 11,
    V17 = 17,
}

impl JavaVersion {
    pub fn parse(raw: &str) -> Result<Self, ModuleError> {
        match raw {
            "1.6" | "6" => Ok(JavaVersion::V1_6),
            "1.7" | "7" => Ok(JavaVersion::V1_7),
            "1.8" | "8" => Ok(JavaVersion::V1_8),
            "1.9" | "9" => Ok(JavaVersion::V1_9),
            "11" => Ok(JavaVersion::V11),
            "17" => Ok(JavaVersion::V17),
            "10" | "12" | "13" | "14" | "15" | "16" => Err(ModuleError::UnsupportedJavaVersion {
                raw: raw.to_string(),
            }),
            _ => Err(ModuleError::UnrecognizedJavaVersion {
                raw: raw.to_string(),
            }),
        }
    }

    /// Default language level for modules that don't set one.
    pub fn default_for_sdk(sdk: &SdkSpec) -> Self {
        match sdk.api_level {
            ApiLevel::Numbered(level) if level <= 23 => JavaVersion::V1_7,
            ApiLevel::Numbered(level) if level <= 29 => JavaVersion::V1_8,
            _ => JavaVersion::V17,
        }
    }

    /// javac targeting 9+ uses system modules instead of a bootclasspath.
    pub fn uses_java_modules(self) -> bool {
        self >= JavaVersion::V1_9
    }

    pub fn for_kotlinc(self) -> &'static str {
        match self {
            JavaVersion::V1_7 => "1.6",
            JavaVersion::V1_9 => "9",
            other => other.as_str(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JavaVersion::V1_6 => "1.6",
            JavaVersion::V1_7 => "1.7",
            JavaVersion::V1_8 => "1.8",
            JavaVersion::V1_9 => "1.9",
            JavaVersion::V11 => "11",
            JavaVersion::V17 => "17",
        }
    }
}

impl fmt::Display for JavaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for JavaVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SdkKind {
    Private,
    None,
    CorePlatform,
    Public,
    System,
    Test,
    Core,
    Module,
    SystemServer,
}

impl SdkKind {
    /// Directory name under the prebuilt SDK tree.
    pub fn as_str(self) -> &'static str {
        match self {
            SdkKind::Private => "private",
            SdkKind::None => "none",
            SdkKind::CorePlatform => "core_platform",
            SdkKind::Public => "public",
            SdkKind::System => "system",
            SdkKind::Test => "test",
            SdkKind::Core => "core",
            SdkKind::Module => "module-lib",
            SdkKind::SystemServer => "system-server",
        }
    }

    /// Stub library that provides this surface when built from source.
    pub fn default_java_library_name(self) -> &'static str {
        match self {
            SdkKind::Public => "android_stubs_current",
            SdkKind::System => "android_system_stubs_current",
            SdkKind::Test => "android_test_stubs_current",
            SdkKind::Core => "core.current.stubs",
            SdkKind::Module => "android_module_lib_stubs_current",
            SdkKind::SystemServer => "android_system_server_stubs_current",
            SdkKind::Private | SdkKind::None | SdkKind::CorePlatform => "",
        }
    }

    /// Core system, test and core APIs share the public system modules; system server
    /// shares module-lib's.
    fn system_modules_kind(self) -> SdkKind {
        match self {
            SdkKind::System | SdkKind::Test | SdkKind::Core => SdkKind::Public,
            SdkKind::SystemServer => SdkKind::Module,
            other => other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiLevel {
    Current,
    Numbered(u32),
}

/// Parsed `sdk_version` property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SdkSpec {
    pub kind: SdkKind,
    pub api_level: ApiLevel,
    pub raw: String,
}

impl SdkSpec {
    pub fn parse(raw: &str) -> Result<Self, ModuleError> {
        let spec = |kind, api_level| SdkSpec {
            kind,
            api_level,
            raw: raw.to_string(),
        };
        let invalid = || ModuleError::InvalidSdkVersion {
            raw: raw.to_string(),
        };
        match raw {
            "" => return Ok(spec(SdkKind::Private, ApiLevel::Current)),
            "none" => return Ok(spec(SdkKind::None, ApiLevel::Current)),
            "core_platform" => return Ok(spec(SdkKind::CorePlatform, ApiLevel::Current)),
            _ => {}
        }
        let (kind, level) = match raw.rsplit_once('_') {
            Some(("system", level)) => (SdkKind::System, level),
            Some(("test", level)) => (SdkKind::Test, level),
            Some(("core", level)) => (SdkKind::Core, level),
            Some(("module", level)) => (SdkKind::Module, level),
            Some(("system_server", level)) => (SdkKind::SystemServer, level),
            Some(_) => return Err(invalid()),
            None => (SdkKind::Public, raw),
        };
        let api_level = match level {
            "current" => ApiLevel::Current,
            digits => ApiLevel::Numbered(digits.parse().map_err(|_| invalid())?),
        };
        if matches!(kind, SdkKind::Test | SdkKind::Core) && api_level != ApiLevel::Current {
            return Err(invalid());
        }
        Ok(spec(kind, api_level))
    }

    fn level_string(&self) -> String {
        match self.api_level {
            ApiLevel::Current => "current".to_string(),
            ApiLevel::Numbered(level) => level.to_string(),
        }
    }
}

/// SDK library names and prebuilt locations used by the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SdkConfig {
    pub prebuilt_sdk_dir: PathBuf,
    pub lambda_stubs_library: String,
    pub lambda_stubs_path: PathBuf,
    pub core_platform_system_modules: String,
    pub core_platform_bootclasspath: Vec<String>,
    pub framework_libraries: Vec<String>,
    /// Libraries the shrinker must see for platform-surface modules.
    pub legacy_core_platform_bootclasspath: Vec<String>,
    pub always_use_prebuilt_sdks: bool,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            prebuilt_sdk_dir: PathBuf::from("prebuilts/sdk"),
            lambda_stubs_library: "core-lambda-stubs".to_string(),
            lambda_stubs_path: PathBuf::from("prebuilts/sdk/tools/core-lambda-stubs.jar"),
            core_platform_system_modules: "legacy-core-platform-api-stubs-system-modules".to_string(),
            core_platform_bootclasspath: vec![
                "legacy.core.platform.api.stubs".to_string(),
                "core-lambda-stubs".to_string(),
            ],
            framework_libraries: vec!["ext".to_string(), "framework".to_string()],
            legacy_core_platform_bootclasspath: vec!["legacy.core.platform.api.stubs".to_string()],
            always_use_prebuilt_sdks: false,
        }
    }
}

/// Library set selected for a module's SDK surface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SdkDep {
    /// Libraries come from stub modules in the graph.
    pub use_module: bool,
    /// Libraries come from prebuilt jars.
    pub use_files: bool,
    /// The surface could not be resolved; `bootclasspath` and `java9_classpath` name the
    /// missing dependencies.
    pub invalid_version: bool,
    /// Added to the bootclasspath when targeting 1.8 or lower.
    pub bootclasspath: Vec<String>,
    /// Empty when no system modules are used.
    pub system_modules: String,
    /// Added to the classpath regardless of language level.
    pub classpath: Vec<String>,
    /// Added to the classpath when targeting 9 or higher.
    pub java9_classpath: Vec<String>,
    pub jars: Vec<PathBuf>,
    pub aidl: Option<PathBuf>,
    pub no_standard_libs: bool,
    pub no_frameworks_libs: bool,
}

impl SdkDep {
    pub fn has_standard_libs(&self) -> bool {
        !self.no_standard_libs
    }

    pub fn has_framework_libs(&self) -> bool {
        !self.no_standard_libs && !self.no_frameworks_libs
    }

    /// Boot classpath modules for a given language level: none when system modules
    /// replace the bootclasspath.
    pub fn bootclasspath_for(&self, java_version: JavaVersion) -> &[String] {
        if java_version.uses_java_modules() && !self.system_modules.is_empty() {
            &[]
        } else {
            &self.bootclasspath
        }
    }
}

/// Result of resolving a module's SDK properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedSdk {
    pub spec: SdkSpec,
    pub java_version: JavaVersion,
    pub dep: SdkDep,
}

/// Chooses the SDK library set for a module.
pub struct SdkVersionResolver<'a> {
    config: &'a SdkConfig,
    files: &'a dyn SdkFiles,
    allow_missing_dependencies: bool,
}

impl<'a> SdkVersionResolver<'a> {
    pub fn new(config: &'a SdkConfig, files: &'a dyn SdkFiles, allow_missing_dependencies: bool) -> Self {
        Self {
            config,
            files,
            allow_missing_dependencies,
        }
    }

    /// Resolve `sdk_version`, `system_modules` and `java_version` properties.
    pub fn resolve(
        &self,
        sdk_version: Option<&str>,
        system_modules: Option<&str>,
        java_version: Option<&str>,
    ) -> Result<ResolvedSdk, ModuleError> {
        let spec = SdkSpec::parse(sdk_version.unwrap_or(""))?;
        let java_version = match java_version {
            Some(raw) => JavaVersion::parse(raw)?,
            None => JavaVersion::default_for_sdk(&spec),
        };
        let dep = self.decode(&spec, system_modules, java_version)?;
        Ok(ResolvedSdk {
            spec,
            java_version,
            dep,
        })
    }

    fn use_prebuilt(&self, spec: &SdkSpec) -> bool {
        let prebuilt_kind = matches!(
            spec.kind,
            SdkKind::Public | SdkKind::System | SdkKind::Module | SdkKind::SystemServer
        );
        match spec.api_level {
            ApiLevel::Numbered(_) => prebuilt_kind,
            ApiLevel::Current => prebuilt_kind && self.config.always_use_prebuilt_sdks,
        }
    }

    fn decode(
        &self,
        spec: &SdkSpec,
        system_modules: Option<&str>,
        java_version: JavaVersion,
    ) -> Result<SdkDep, ModuleError> {
        if self.use_prebuilt(spec) {
            return self.decode_prebuilt(spec, java_version);
        }

        let config = self.config;
        let dep = match spec.kind {
            SdkKind::Private => SdkDep {
                use_module: true,
                system_modules: config.core_platform_system_modules.clone(),
                bootclasspath: config.core_platform_bootclasspath.clone(),
                classpath: config.framework_libraries.clone(),
                ..SdkDep::default()
            },
            SdkKind::None => match system_modules.unwrap_or("") {
                "" => return Err(ModuleError::MissingSystemModules),
                "none" => SdkDep {
                    no_standard_libs: true,
                    ..SdkDep::default()
                },
                modules => SdkDep {
                    use_module: true,
                    no_standard_libs: true,
                    system_modules: modules.to_string(),
                    bootclasspath: vec![modules.to_string()],
                    ..SdkDep::default()
                },
            },
            SdkKind::CorePlatform => SdkDep {
                use_module: true,
                system_modules: config.core_platform_system_modules.clone(),
                bootclasspath: config.core_platform_bootclasspath.clone(),
                no_frameworks_libs: true,
                ..SdkDep::default()
            },
            SdkKind::Core => SdkDep {
                use_module: true,
                bootclasspath: vec![
                    SdkKind::Core.default_java_library_name().to_string(),
                    config.lambda_stubs_library.clone(),
                ],
                system_modules: "core-public-stubs-system-modules".to_string(),
                no_frameworks_libs: true,
                ..SdkDep::default()
            },
            SdkKind::Public | SdkKind::System | SdkKind::Test | SdkKind::Module | SdkKind::SystemServer => {
                let module = spec.kind.default_java_library_name().to_string();
                SdkDep {
                    use_module: true,
                    bootclasspath: vec![module.clone(), config.lambda_stubs_library.clone()],
                    system_modules: format!(
                        "core-{}-stubs-system-modules",
                        spec.kind.system_modules_kind().as_str()
                    ),
                    java9_classpath: vec![module],
                        ..SdkDep::default()
                }
            }
        };
        Ok(dep)
    }

    fn decode_prebuilt(&self, spec: &SdkSpec, java_version: JavaVersion) -> Result<SdkDep, ModuleError> {
        let level = spec.level_string();
        let dir = self.config.prebuilt_sdk_dir.join(&level).join(spec.kind.as_str());
        let jar = dir.join("android.jar");
        // Only the public surface ships aidl files.
        let aidl = self
            .config
            .prebuilt_sdk_dir
            .join(&level)
            .join("public")
            .join("framework.aidl");

        let jar_exists = self.files.exists(&jar);
        let aidl_exists = self.files.exists(&aidl);
        if (!jar_exists || !aidl_exists) && self.allow_missing_dependencies {
            return Ok(SdkDep {
                invalid_version: true,
                bootclasspath: vec![format!("sdk_{}_{}_android", spec.kind.as_str(), level)],
                ..SdkDep::default()
            });
        }
        if !jar_exists {
            return Err(ModuleError::MissingSdkPrebuilt {
                raw: spec.raw.clone(),
                path: jar,
            });
        }
        if !aidl_exists {
            return Err(ModuleError::MissingSdkPrebuilt {
                raw: spec.raw.clone(),
                path: aidl,
            });
        }

        let system_modules = if java_version.uses_java_modules() {
            format!("sdk_{}_{}_system_modules", spec.kind.as_str(), level)
        } else {
            String::new()
        };
        Ok(SdkDep {
            use_files: true,
            jars: vec![jar, self.config.lambda_stubs_path.clone()],
            aidl: Some(aidl),
            system_modules,
            ..SdkDep::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::path::Path;

    struct Files(HashSet<PathBuf>);

    impl SdkFiles for Files {
        fn exists(&self, path: &Path) -> bool {
            self.0.contains(path)
        }
    }

    fn no_files() -> Files {
        Files(HashSet::new())
    }

    fn sdk_29_files() -> Files {
        Files(HashSet::from([
            PathBuf::from("prebuilts/sdk/29/public/android.jar"),
            PathBuf::from("prebuilts/sdk/29/public/framework.aidl"),
        ]))
    }

    #[test]
    fn test_java_version_parsing() {
        assert_eq!(JavaVersion::parse("1.8").unwrap(), JavaVersion::V1_8);
        assert_eq!(JavaVersion::parse("9").unwrap(), JavaVersion::V1_9);
        assert!(matches!(
            JavaVersion::parse("12"),
            Err(ModuleError::UnsupportedJavaVersion { .. })
        ));
        assert!(matches!(
            JavaVersion::parse("banana"),
            Err(ModuleError::UnrecognizedJavaVersion { .. })
        ));
        assert_eq!(JavaVersion::V1_7.for_kotlinc(), "1.6");
        assert_eq!(JavaVersion::V1_9.for_kotlinc(), "9");
        assert_eq!(JavaVersion::V17.for_kotlinc(), "17");
    }

    #[test]
    fn test_sdk_spec_parsing() {
        let spec = SdkSpec::parse("system_current").unwrap();
        assert_eq!(spec.kind, SdkKind::System);
        assert_eq!(spec.api_level, ApiLevel::Current);

        let spec = SdkSpec::parse("28").unwrap();
        assert_eq!(spec.kind, SdkKind::Public);
        assert_eq!(spec.api_level, ApiLevel::Numbered(28));

        assert_eq!(SdkSpec::parse("system_server_30").unwrap().kind, SdkKind::SystemServer);
        assert_eq!(SdkSpec::parse("").unwrap().kind, SdkKind::Private);
        assert!(SdkSpec::parse("vendor_current").is_err());
        assert!(SdkSpec::parse("test_29").is_err());
        assert!(SdkSpec::parse("latest").is_err());
    }

    #[test]
    fn test_default_java_version_follows_api_level() {
        let v = |raw| JavaVersion::default_for_sdk(&SdkSpec::parse(raw).unwrap());
        assert_eq!(v("21"), JavaVersion::V1_7);
        assert_eq!(v("29"), JavaVersion::V1_8);
        assert_eq!(v("33"), JavaVersion::V17);
        assert_eq!(v("current"), JavaVersion::V17);
    }

    #[test]
    fn test_current_uses_stub_modules_and_system_modules() {
        let config = SdkConfig::default();
        let files = no_files();
        let resolver = SdkVersionResolver::new(&config, &files, false);
        let resolved = resolver.resolve(Some("current"), None, None).unwrap();
        assert!(resolved.dep.use_module);
        assert_eq!(resolved.dep.system_modules, "core-public-stubs-system-modules");
        assert_eq!(resolved.dep.java9_classpath, vec!["android_stubs_current"]);
        assert_eq!(
            resolved.dep.bootclasspath,
            vec!["android_stubs_current", "core-lambda-stubs"]
        );
        // Language level 17 replaces the bootclasspath with system modules.
        assert!(resolved.dep.bootclasspath_for(resolved.java_version).is_empty());
        assert_eq!(resolved.dep.bootclasspath_for(JavaVersion::V1_8).len(), 2);
    }

    #[test]
    fn test_system_server_shares_module_lib_system_modules() {
        let config = SdkConfig::default();
        let files = no_files();
        let resolver = SdkVersionResolver::new(&config, &files, false);
        let dep = resolver.resolve(Some("system_server_current"), None, None).unwrap().dep;
        assert_eq!(dep.system_modules, "core-module-lib-stubs-system-modules");
    }

    #[test]
    fn test_numbered_sdk_uses_prebuilt_files() {
        let config = SdkConfig::default();
        let files = sdk_29_files();
        let resolver = SdkVersionResolver::new(&config, &files, false);
        let resolved = resolver.resolve(Some("29"), None, None).unwrap();
        assert!(resolved.dep.use_files);
        assert!(!resolved.dep.use_module);
        // 29 defaults to 1.8: legacy bootclasspath mode.
        assert_eq!(resolved.dep.system_modules, "");
        assert_eq!(resolved.dep.jars[0], PathBuf::from("prebuilts/sdk/29/public/android.jar"));

        let resolved = resolver.resolve(Some("29"), None, Some("11")).unwrap();
        assert_eq!(resolved.dep.system_modules, "sdk_public_29_system_modules");
    }

    #[test]
    fn test_missing_prebuilt_is_error_unless_missing_deps_allowed() {
        let config = SdkConfig::default();
        let files = no_files();

        let strict = SdkVersionResolver::new(&config, &files, false);
        assert!(matches!(
            strict.resolve(Some("30"), None, None),
            Err(ModuleError::MissingSdkPrebuilt { .. })
        ));

        let lenient = SdkVersionResolver::new(&config, &files, true);
        let dep = lenient.resolve(Some("30"), None, None).unwrap().dep;
        assert!(dep.invalid_version);
        assert_eq!(dep.bootclasspath, vec!["sdk_public_30_android"]);
    }

    #[test]
    fn test_sdk_none_requires_system_modules() {
        let config = SdkConfig::default();
        let files = no_files();
        let resolver = SdkVersionResolver::new(&config, &files, false);
        assert_eq!(
            resolver.resolve(Some("none"), None, None).unwrap_err(),
            ModuleError::MissingSystemModules
        );
        let bare = resolver.resolve(Some("none"), Some("none"), None).unwrap().dep;
        assert!(!bare.use_module);
        assert!(!bare.has_standard_libs());

        let custom = resolver.resolve(Some("none"), Some("my-modules"), None).unwrap().dep;
        assert_eq!(custom.system_modules, "my-modules");
        assert_eq!(custom.bootclasspath, vec!["my-modules"]);
    }

    #[test]
    fn test_private_platform_uses_framework_classpath() {
        let config = SdkConfig::default();
        let files = no_files();
        let resolver = SdkVersionResolver::new(&config, &files, false);
        let dep = resolver.resolve(None, None, None).unwrap().dep;
        assert_eq!(dep.classpath, vec!["ext", "framework"]);
        assert!(dep.has_framework_libs());

        let core = resolver.resolve(Some("core_platform"), None, None).unwrap().dep;
        assert!(!core.has_framework_libs());
        assert!(core.has_standard_libs());
    }
}
