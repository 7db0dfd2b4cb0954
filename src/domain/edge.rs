use crate::domain::error::ModuleError;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

/// Minimum platform version a `<uses-library>` relationship applies to.
///
/// `Any` sorts after every numbered version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SdkVersionBucket {
    Version(u32),
    Any,
}

impl fmt::Display for SdkVersionBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SdkVersionBucket::Version(v) => write!(f, "{}", v),
            SdkVersionBucket::Any => f.write_str("any"),
        }
    }
}

impl Serialize for SdkVersionBucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SharedOrigin {
    /// Declared in `libs`.
    Declared,
    /// Added from the resolved SDK surface.
    Sdk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolchainRole {
    Plugin,
    ExportedPlugin,
}

/// Semantic kind of a dependency edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DependencyKind {
    // ============ Build-time linking ============
    Static,

    // ============ Runtime linking ============
    Shared { origin: SharedOrigin },
    /// Classpath entries used only at language level 9 and above.
    Java9Classpath,
    BootClasspath,
    SystemModules,
    UsesLibrary {
        sdk_version: SdkVersionBucket,
        optional: bool,
    },
    Jni,

    // ============ Toolchain ============
    Toolchain { role: ToolchainRole },

    // ============ Shrinker input only ============
    ProguardRaise,
}

/// Immutable tag attached to a dependency edge at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DependencyTag {
    pub name: String,
    pub kind: DependencyKind,
}

impl DependencyTag {
    fn new(name: impl Into<String>, kind: DependencyKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// True if the dependency is resolved again at runtime.
    pub fn runtime_linked(&self) -> bool {
        matches!(
            self.kind,
            DependencyKind::Shared { .. }
                | DependencyKind::Java9Classpath
                | DependencyKind::BootClasspath
                | DependencyKind::SystemModules
                | DependencyKind::UsesLibrary { .. }
                | DependencyKind::Jni
        )
    }

    /// True for annotation processors and other build-only tools.
    pub fn toolchain_only(&self) -> bool {
        matches!(self.kind, DependencyKind::Toolchain { .. })
    }

    pub fn uses_library_sdk_version(&self) -> Option<SdkVersionBucket> {
        match self.kind {
            DependencyKind::UsesLibrary { sdk_version, .. } => Some(sdk_version),
            _ => None,
        }
    }

    pub fn uses_library_optional(&self) -> bool {
        matches!(self.kind, DependencyKind::UsesLibrary { optional: true, .. })
    }

    /// `libs` or SDK classpath edge.
    pub fn is_lib(&self) -> bool {
        matches!(self.kind, DependencyKind::Shared { .. })
    }

    pub fn is_static(&self) -> bool {
        matches!(self.kind, DependencyKind::Static)
    }
}

impl fmt::Display for DependencyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Edge weight in the module graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyEdge {
    pub tag: DependencyTag,
}

/// A dependency as declared, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDependency {
    pub name: String,
    /// Property name (`libs`, `static_libs`, ...) or tag name (`javalib`, `uses-library-28`, ...).
    pub role: String,
}

impl RawDependency {
    pub fn new(name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
        }
    }
}

fn uses_library_role_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(optional-)?uses-library-(any|\d+)(-optional)?$").expect("uses-library role regex")
    })
}

/// The fixed tag vocabulary, built once by the caller and passed by reference.
#[derive(Debug, Clone)]
pub struct TagRegistry {
    tags: HashMap<&'static str, DependencyTag>,
    properties: HashMap<&'static str, &'static str>,
}

impl Default for TagRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl TagRegistry {
    pub const JAVA_LIB: &'static str = "javalib";
    pub const STATIC_LIB: &'static str = "staticlib";
    pub const SDK_LIB: &'static str = "sdklib";
    pub const JAVA9_LIB: &'static str = "java9lib";
    pub const BOOT_CLASSPATH: &'static str = "bootclasspath";
    pub const SYSTEM_MODULES: &'static str = "system modules";
    pub const PLUGIN: &'static str = "plugin";
    pub const EXPORTED_PLUGIN: &'static str = "exported-plugin";
    pub const JNI_LIB: &'static str = "jnilib";
    pub const PROGUARD_RAISE: &'static str = "proguard-raise";

    pub fn standard() -> Self {
        let entries = [
            (Self::JAVA_LIB, DependencyKind::Shared { origin: SharedOrigin::Declared }),
            (Self::STATIC_LIB, DependencyKind::Static),
            (Self::SDK_LIB, DependencyKind::Shared { origin: SharedOrigin::Sdk }),
            (Self::JAVA9_LIB, DependencyKind::Java9Classpath),
            (Self::BOOT_CLASSPATH, DependencyKind::BootClasspath),
            (Self::SYSTEM_MODULES, DependencyKind::SystemModules),
            (Self::PLUGIN, DependencyKind::Toolchain { role: ToolchainRole::Plugin }),
            (
                Self::EXPORTED_PLUGIN,
                DependencyKind::Toolchain {
                    role: ToolchainRole::ExportedPlugin,
                },
            ),
            (Self::JNI_LIB, DependencyKind::Jni),
            (Self::PROGUARD_RAISE, DependencyKind::ProguardRaise),
        ];
        let tags = entries
            .into_iter()
            .map(|(name, kind)| (name, DependencyTag::new(name, kind)))
            .collect();

        let properties = HashMap::from([
            ("libs", Self::JAVA_LIB),
            ("static_libs", Self::STATIC_LIB),
            ("plugins", Self::PLUGIN),
            ("exported_plugins", Self::EXPORTED_PLUGIN),
            ("jni_libs", Self::JNI_LIB),
        ]);

        Self { tags, properties }
    }

    pub fn get(&self, name: &str) -> Option<&DependencyTag> {
        self.tags.get(name)
    }

    pub fn uses_library(&self, sdk_version: SdkVersionBucket, optional: bool) -> DependencyTag {
        DependencyTag::new(
            format!("uses-library-{}", sdk_version),
            DependencyKind::UsesLibrary {
                sdk_version,
                optional,
            },
        )
    }

    /// Compatibility libraries that became standalone at a given SDK version.
    pub fn compat_uses_library(&self, sdk_version: u32) -> Option<DependencyTag> {
        let optional = match sdk_version {
            28 | 30 => true,
            29 => false,
            _ => return None,
        };
        Some(self.uses_library(SdkVersionBucket::Version(sdk_version), optional))
    }

    /// Classify a declaration. Pure: only the role string is inspected.
    pub fn classify(&self, dep: &RawDependency) -> Result<DependencyTag, ModuleError> {
        let role = dep.role.as_str();
        match role {
            "uses_libs" => return Ok(self.uses_library(SdkVersionBucket::Any, false)),
            "optional_uses_libs" => return Ok(self.uses_library(SdkVersionBucket::Any, true)),
            _ => {}
        }
        let tag_name = self.properties.get(role).copied().unwrap_or(role);
        if let Some(tag) = self.tags.get(tag_name) {
            return Ok(tag.clone());
        }
        if let Some(caps) = uses_library_role_regex().captures(role) {
            let optional = caps.get(1).is_some() || caps.get(3).is_some();
            let sdk_version = match &caps[2] {
                "any" => SdkVersionBucket::Any,
                digits => match digits.parse() {
                    Ok(v) => SdkVersionBucket::Version(v),
                    Err(_) => return Err(unknown_role(dep)),
                },
            };
            // A bare compat tag name keeps the compat library's own optionality.
            if let (false, SdkVersionBucket::Version(v)) = (optional, sdk_version)
                && let Some(tag) = self.compat_uses_library(v)
            {
                return Ok(tag);
            }
            return Ok(self.uses_library(sdk_version, optional));
        }
        Err(unknown_role(dep))
    }
}

fn unknown_role(dep: &RawDependency) -> ModuleError {
    ModuleError::UnknownDependencyRole {
        dep: dep.name.clone(),
        role: dep.role.clone(),
    }
}
