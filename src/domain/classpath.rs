//! Per-module classpath aggregation.
//!
//! Direct edges are visited in declaration order. Each kind of edge feeds different lists:
//! static dependencies are compiled against and packaged, shared ones are compiled against
//! and linked at runtime, toolchain ones only feed the annotation processor path.

use crate::domain::artifact::ArtifactInfo;
use crate::domain::depset::DepSet;
use crate::domain::edge::{DependencyKind, DependencyTag, ToolchainRole};
use crate::domain::error::ModuleError;
use crate::domain::ports::DependencyCapabilities;
use crate::domain::sdk::{JavaVersion, SdkDep};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Ordered jar list where only the first occurrence of a path is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Classpath {
    entries: Vec<PathBuf>,
    #[serde(skip)]
    seen: HashSet<PathBuf>,
}

impl Classpath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the path was already present.
    pub fn push(&mut self, path: &Path) -> bool {
        if self.seen.contains(path) {
            return false;
        }
        self.seen.insert(path.to_path_buf());
        self.entries.push(path.to_path_buf());
        true
    }

    pub fn extend<'a>(&mut self, paths: impl IntoIterator<Item = &'a PathBuf>) {
        for path in paths {
            self.push(path);
        }
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.seen.contains(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn as_slice(&self) -> &[PathBuf] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PathBuf> {
        self.entries.iter()
    }
}

impl FromIterator<PathBuf> for Classpath {
    fn from_iter<I: IntoIterator<Item = PathBuf>>(iter: I) -> Self {
        let mut classpath = Classpath::new();
        for path in iter {
            classpath.push(&path);
        }
        classpath
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectedSystemModules {
    pub name: String,
    pub output_dir: PathBuf,
    pub header_jars: Vec<PathBuf>,
}

/// Everything a module compiles and links against.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CompileClasspaths {
    pub java_version: Option<JavaVersion>,
    pub classpath: Classpath,
    pub dex_classpath: Classpath,
    pub bootclasspath: Classpath,
    pub java9_classpath: Classpath,
    pub system_modules: Option<SelectedSystemModules>,

    pub processor_path: Classpath,
    pub processor_classes: Vec<String>,
    /// Header-only compilation can't be used because a processor generates API.
    pub disable_turbine: bool,

    pub exported_plugins: Classpath,
    pub exported_plugin_classes: Vec<String>,
    pub exported_plugin_disable_turbine: bool,

    pub static_jars: Classpath,
    pub static_header_jars: Classpath,
    pub static_resource_jars: Classpath,
    /// Library jars for the shrinker only.
    pub proguard_raise_jars: Classpath,
    pub aidl_preprocess: Option<PathBuf>,

    pub transitive_header_jars: DepSet<PathBuf>,
    pub transitive_static_header_jars: DepSet<PathBuf>,
}

/// Walks a module's direct dependencies and builds its [`CompileClasspaths`].
pub struct ClasspathAggregator {
    out: CompileClasspaths,
    direct_header_jars: Vec<PathBuf>,
    direct_static_header_jars: Vec<PathBuf>,
    transitive_header_jars: Vec<DepSet<PathBuf>>,
    transitive_static_header_jars: Vec<DepSet<PathBuf>>,
}

impl ClasspathAggregator {
    pub fn new(sdk: Option<&SdkDep>, java_version: Option<JavaVersion>) -> Self {
        let mut out = CompileClasspaths {
            java_version,
            ..CompileClasspaths::default()
        };
        if let Some(sdk) = sdk.filter(|sdk| sdk.use_files) {
            // Prebuilt SDK jars stand in for header jars of the SDK stub modules.
            out.classpath.extend(&sdk.jars);
            out.dex_classpath.extend(&sdk.jars);
            out.aidl_preprocess = sdk.aidl.clone();
        }
        Self {
            out,
            direct_header_jars: Vec::new(),
            direct_static_header_jars: Vec::new(),
            transitive_header_jars: Vec::new(),
            transitive_static_header_jars: Vec::new(),
        }
    }

    /// Fold in one direct dependency.
    pub fn add_dependency(
        &mut self,
        dep_name: &str,
        tag: &DependencyTag,
        dep: &dyn DependencyCapabilities,
    ) -> Result<(), ModuleError> {
        let not_a_library = || ModuleError::NotAJavaLibrary {
            dep: dep_name.to_string(),
            tag: tag.name.clone(),
        };

        match tag.kind {
            DependencyKind::Static | DependencyKind::Shared { .. } => {
                if dep.plugin_info().is_some() {
                    return Err(ModuleError::PluginAsLibrary {
                        dep: dep_name.to_string(),
                        tag: tag.name.clone(),
                    });
                }
                match dep.artifact_info() {
                    Some(info) if tag.is_static() => self.add_static(info),
                    Some(info) => self.add_shared(info),
                    None => match dep.source_files() {
                        Some(files) => check_produces_jars(dep_name, files)?,
                        None => return Err(not_a_library()),
                    },
                }
            }
            DependencyKind::UsesLibrary { .. } => {
                if let Some(info) = dep.artifact_info() {
                    self.direct_header_jars.extend(info.header_jars.iter().cloned());
                }
            }
            DependencyKind::Java9Classpath => {
                let info = dep.artifact_info().ok_or_else(not_a_library)?;
                self.out.java9_classpath.extend(&info.header_jars);
            }
            DependencyKind::BootClasspath => {
                if let Some(modules) = dep.system_modules() {
                    self.out.bootclasspath.extend(&modules.header_jars);
                } else {
                    let info = dep.artifact_info().ok_or_else(not_a_library)?;
                    self.out.bootclasspath.extend(&info.header_jars);
                }
            }
            DependencyKind::SystemModules => {
                let modules = dep.system_modules().ok_or_else(|| ModuleError::NotSystemModules {
                    dep: dep_name.to_string(),
                })?;
                if let Some(first) = &self.out.system_modules {
                    return Err(ModuleError::DuplicateSystemModules {
                        first: first.name.clone(),
                        second: dep_name.to_string(),
                    });
                }
                self.out.system_modules = Some(SelectedSystemModules {
                    name: dep_name.to_string(),
                    output_dir: modules.output_dir.clone(),
                    header_jars: modules.header_jars.clone(),
                });
            }
            DependencyKind::Toolchain { role } => {
                let plugin = dep.plugin_info().ok_or_else(|| ModuleError::NotAPlugin {
                    dep: dep_name.to_string(),
                })?;
                let (path, classes) = match role {
                    ToolchainRole::Plugin => {
                        self.out.disable_turbine |= plugin.generates_api;
                        (&mut self.out.processor_path, &mut self.out.processor_classes)
                    }
                    ToolchainRole::ExportedPlugin => {
                        self.out.exported_plugin_disable_turbine |= plugin.generates_api;
                        (&mut self.out.exported_plugins, &mut self.out.exported_plugin_classes)
                    }
                };
                if let Some(info) = dep.artifact_info() {
                    path.extend(&info.implementation_jars);
                    path.extend(&info.resource_jars);
                }
                if let Some(class) = &plugin.processor_class {
                    push_unique(classes, class);
                }
            }
            DependencyKind::ProguardRaise => {
                let info = dep.artifact_info().ok_or_else(not_a_library)?;
                self.out.proguard_raise_jars.extend(&info.header_jars);
            }
            DependencyKind::Jni => {}
        }
        Ok(())
    }

    fn add_static(&mut self, info: &ArtifactInfo) {
        let out = &mut self.out;
        out.classpath.extend(&info.header_jars);
        out.classpath.extend(&info.transitive_static_header_jars.to_list());
        out.static_jars.extend(&info.implementation_jars);
        out.static_header_jars.extend(&info.header_jars);
        out.static_resource_jars.extend(&info.resource_jars);

        self.direct_header_jars.extend(info.header_jars.iter().cloned());
        self.direct_static_header_jars.extend(info.header_jars.iter().cloned());
        self.transitive_header_jars.push(info.transitive_header_jars.clone());
        self.transitive_static_header_jars
            .push(info.transitive_static_header_jars.clone());
        self.add_exported_plugins(info);
    }

    fn add_shared(&mut self, info: &ArtifactInfo) {
        self.out.classpath.extend(&info.header_jars);
        self.out.dex_classpath.extend(&info.header_jars);
        // Shared libraries are linked at runtime: their own dependencies stay theirs.
        self.direct_header_jars.extend(info.header_jars.iter().cloned());
        self.add_exported_plugins(info);
    }

    fn add_exported_plugins(&mut self, info: &ArtifactInfo) {
        self.out.processor_path.extend(&info.exported_plugins);
        for class in &info.exported_plugin_classes {
            push_unique(&mut self.out.processor_classes, class);
        }
        self.out.disable_turbine |= info.exported_plugin_disable_turbine;
    }

    pub fn finish(self) -> CompileClasspaths {
        let mut out = self.out;
        if out.java_version.is_some_and(JavaVersion::uses_java_modules) {
            let java9 = out.java9_classpath.clone();
            out.classpath.extend(java9.iter());
        }
        out.transitive_header_jars = DepSet::new(self.direct_header_jars, self.transitive_header_jars);
        out.transitive_static_header_jars =
            DepSet::new(self.direct_static_header_jars, self.transitive_static_header_jars);
        out
    }
}

/// Processor class lists keep their first occurrence, like [`Classpath`].
fn push_unique(classes: &mut Vec<String>, class: &str) {
    if !classes.iter().any(|c| c == class) {
        classes.push(class.to_string());
    }
}

/// A plain file producer used as a library must only produce jars.
fn check_produces_jars(dep_name: &str, files: &[PathBuf]) -> Result<(), ModuleError> {
    match files
        .iter()
        .find(|file| file.extension().is_none_or(|ext| ext != "jar"))
    {
        Some(file) => Err(ModuleError::NotAJar {
            dep: dep_name.to_string(),
            file: file.clone(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::artifact::{PluginInfo, PublishedModule, SystemModulesInfo};
    use crate::domain::edge::TagRegistry;

    fn jar(p: &str) -> PathBuf {
        PathBuf::from(p)
    }

    fn java_lib(name: &str) -> PublishedModule {
        PublishedModule {
            artifact: Some(ArtifactInfo {
                header_jars: vec![jar(&format!("{name}.h.jar"))],
                implementation_jars: vec![jar(&format!("{name}.jar"))],
                ..ArtifactInfo::default()
            }),
            ..PublishedModule::new(name)
        }
    }

    fn tag(name: &str) -> DependencyTag {
        TagRegistry::standard().get(name).unwrap().clone()
    }

    #[test]
    fn test_classpath_keeps_first_occurrence() {
        let mut cp = Classpath::new();
        assert!(cp.push(Path::new("a.jar")));
        assert!(cp.push(Path::new("b.jar")));
        assert!(!cp.push(Path::new("a.jar")));
        assert_eq!(cp.as_slice(), &[jar("a.jar"), jar("b.jar")]);
    }

    #[test]
    fn test_static_and_shared_feed_different_lists() {
        let mut agg = ClasspathAggregator::new(None, None);
        agg.add_dependency("b", &tag(TagRegistry::STATIC_LIB), &java_lib("b"))
            .unwrap();
        agg.add_dependency("s", &tag(TagRegistry::JAVA_LIB), &java_lib("s"))
            .unwrap();
        let out = agg.finish();

        assert_eq!(out.classpath.as_slice(), &[jar("b.h.jar"), jar("s.h.jar")]);
        assert_eq!(out.dex_classpath.as_slice(), &[jar("s.h.jar")]);
        assert_eq!(out.static_jars.as_slice(), &[jar("b.jar")]);
        assert_eq!(out.transitive_static_header_jars.to_list(), vec![jar("b.h.jar")]);
        assert_eq!(
            out.transitive_header_jars.to_list(),
            vec![jar("b.h.jar"), jar("s.h.jar")]
        );
    }

    #[test]
    fn test_plugin_as_library_is_rejected() {
        let mut plugin = java_lib("proc");
        plugin.plugin = Some(PluginInfo::default());
        let mut agg = ClasspathAggregator::new(None, None);
        let err = agg
            .add_dependency("proc", &tag(TagRegistry::STATIC_LIB), &plugin)
            .unwrap_err();
        assert!(matches!(err, ModuleError::PluginAsLibrary { .. }));
    }

    #[test]
    fn test_plugins_build_processor_path() {
        let mut plugin = java_lib("proc");
        plugin.plugin = Some(PluginInfo {
            processor_class: Some("com.example.Processor".into()),
            generates_api: true,
        });
        let mut agg = ClasspathAggregator::new(None, None);
        agg.add_dependency("proc", &tag(TagRegistry::PLUGIN), &plugin)
            .unwrap();
        let err = agg
            .add_dependency("lib", &tag(TagRegistry::PLUGIN), &java_lib("lib"))
            .unwrap_err();
        assert_eq!(err, ModuleError::NotAPlugin { dep: "lib".into() });

        let out = agg.finish();
        assert_eq!(out.processor_path.as_slice(), &[jar("proc.jar")]);
        assert_eq!(out.processor_classes, vec!["com.example.Processor"]);
        assert!(out.disable_turbine);
        assert!(out.classpath.is_empty());
    }

    #[test]
    fn test_genrule_must_produce_jars() {
        let mut gen_jar = PublishedModule::new("gen");
        gen_jar.source_files = Some(vec![jar("out/gen/a.jar")]);
        let mut gen_src = PublishedModule::new("gen-src");
        gen_src.source_files = Some(vec![jar("out/gen/a.jar"), jar("out/gen/b.java")]);

        let mut agg = ClasspathAggregator::new(None, None);
        agg.add_dependency("gen", &tag(TagRegistry::JAVA_LIB), &gen_jar)
            .unwrap();
        let err = agg
            .add_dependency("gen-src", &tag(TagRegistry::JAVA_LIB), &gen_src)
            .unwrap_err();
        assert_eq!(
            err,
            ModuleError::NotAJar {
                dep: "gen-src".into(),
                file: jar("out/gen/b.java")
            }
        );
        assert!(agg.finish().classpath.is_empty());
    }

    #[test]
    fn test_only_one_system_modules_dependency() {
        let mut modules = PublishedModule::new("core-modules");
        modules.system_modules = Some(SystemModulesInfo {
            output_dir: jar("out/core-modules/system"),
            header_jars: vec![jar("core.h.jar")],
        });
        let system_modules = tag(TagRegistry::SYSTEM_MODULES);

        let mut agg = ClasspathAggregator::new(None, None);
        agg.add_dependency("core-modules", &system_modules, &modules)
            .unwrap();
        let err = agg
            .add_dependency("other", &system_modules, &modules)
            .unwrap_err();
        assert!(matches!(err, ModuleError::DuplicateSystemModules { .. }));
        let err = agg
            .add_dependency("lib", &system_modules, &java_lib("lib"))
            .unwrap_err();
        assert!(matches!(err, ModuleError::NotSystemModules { .. }));

        // System modules on the bootclasspath contribute their libraries' header jars.
        agg.add_dependency("core-modules", &tag(TagRegistry::BOOT_CLASSPATH), &modules)
            .unwrap();
        let out = agg.finish();
        assert_eq!(out.system_modules.unwrap().name, "core-modules");
        assert_eq!(out.bootclasspath.as_slice(), &[jar("core.h.jar")]);
    }

    #[test]
    fn test_java9_classpath_only_used_with_modules() {
        let java9 = tag(TagRegistry::JAVA9_LIB);

        let mut agg = ClasspathAggregator::new(None, Some(JavaVersion::V1_8));
        agg.add_dependency("stubs", &java9, &java_lib("stubs")).unwrap();
        assert!(agg.finish().classpath.is_empty());

        let mut agg = ClasspathAggregator::new(None, Some(JavaVersion::V17));
        agg.add_dependency("stubs", &java9, &java_lib("stubs")).unwrap();
        assert_eq!(agg.finish().classpath.as_slice(), &[jar("stubs.h.jar")]);
    }

    #[test]
    fn test_prebuilt_sdk_jars_lead_the_classpath() {
        let sdk = SdkDep {
            use_files: true,
            jars: vec![jar("prebuilts/sdk/29/public/android.jar")],
            ..SdkDep::default()
        };
        let mut agg = ClasspathAggregator::new(Some(&sdk), Some(JavaVersion::V1_8));
        agg.add_dependency("b", &tag(TagRegistry::JAVA_LIB), &java_lib("b"))
            .unwrap();
        let out = agg.finish();
        assert_eq!(
            out.classpath.as_slice(),
            &[jar("prebuilts/sdk/29/public/android.jar"), jar("b.h.jar")]
        );
        assert_eq!(out.dex_classpath.len(), 2);
    }
}
