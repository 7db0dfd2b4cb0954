//! Test fixture generators for integration tests.
#![allow(dead_code)]

use std::path::PathBuf;

use classpath_graph::app::engine::ArtifactEngine;
use classpath_graph::config::EngineConfig;
use classpath_graph::domain::declaration::{ModuleDeclaration, ModuleType, TaggedDependency};
use classpath_graph::domain::layout::OutputLayout;

use super::mock::MockSdkFiles;

fn declaration(name: &str, module_type: ModuleType) -> ModuleDeclaration {
    let mut decl = ModuleDeclaration::new(name, module_type);
    if module_type.resolves_sdk() {
        // Keep SDK edges out of the way unless a test asks for them.
        decl.sdk_version = Some("none".to_string());
        decl.system_modules = Some("none".to_string());
    }
    decl
}

pub fn library(name: &str) -> ModuleDeclaration {
    declaration(name, ModuleType::JavaLibrary)
}

pub fn sdk_library(name: &str) -> ModuleDeclaration {
    declaration(name, ModuleType::JavaSdkLibrary)
}

pub fn import(name: &str) -> ModuleDeclaration {
    declaration(name, ModuleType::JavaImport)
}

pub fn plugin(name: &str, processor_class: &str, generates_api: bool) -> ModuleDeclaration {
    let mut decl = declaration(name, ModuleType::JavaPlugin);
    decl.processor_class = Some(processor_class.to_string());
    decl.generates_api = generates_api;
    decl
}

pub fn genrule(name: &str, outputs: &[&str]) -> ModuleDeclaration {
    let mut decl = declaration(name, ModuleType::Genrule);
    decl.outputs = strings(outputs);
    decl
}

pub fn system_modules(name: &str, libs: &[&str]) -> ModuleDeclaration {
    let mut decl = declaration(name, ModuleType::JavaSystemModules);
    decl.libs = strings(libs);
    decl
}

fn strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// Chainable property setters for declarations.
pub trait DeclarationExt: Sized {
    fn libs(self, names: &[&str]) -> Self;
    fn static_libs(self, names: &[&str]) -> Self;
    fn uses_libs(self, names: &[&str]) -> Self;
    fn optional_uses_libs(self, names: &[&str]) -> Self;
    fn plugins(self, names: &[&str]) -> Self;
    fn exported_plugins(self, names: &[&str]) -> Self;
    fn tagged(self, name: &str, tag: &str) -> Self;
    fn keep_rules(self, files: &[&str], export: bool) -> Self;
    fn provides_uses_lib(self, name: &str) -> Self;
    fn sdk(self, sdk_version: &str, system_modules: Option<&str>) -> Self;
    fn java_version(self, version: &str) -> Self;
    fn no_dex(self) -> Self;
    fn optimize(self) -> Self;
}

impl DeclarationExt for ModuleDeclaration {
    fn libs(mut self, names: &[&str]) -> Self {
        self.libs.extend(strings(names));
        self
    }

    fn static_libs(mut self, names: &[&str]) -> Self {
        self.static_libs.extend(strings(names));
        self
    }

    fn uses_libs(mut self, names: &[&str]) -> Self {
        self.uses_libs.extend(strings(names));
        self
    }

    fn optional_uses_libs(mut self, names: &[&str]) -> Self {
        self.optional_uses_libs.extend(strings(names));
        self
    }

    fn plugins(mut self, names: &[&str]) -> Self {
        self.plugins.extend(strings(names));
        self
    }

    fn exported_plugins(mut self, names: &[&str]) -> Self {
        self.exported_plugins.extend(strings(names));
        self
    }

    fn tagged(mut self, name: &str, tag: &str) -> Self {
        self.extra_deps.push(TaggedDependency {
            name: name.to_string(),
            tag: tag.to_string(),
        });
        self
    }

    fn keep_rules(mut self, files: &[&str], export: bool) -> Self {
        self.proguard_flags_files = files.iter().map(PathBuf::from).collect();
        self.export_proguard_flags_files = export;
        self
    }

    fn provides_uses_lib(mut self, name: &str) -> Self {
        self.provides_uses_lib = Some(name.to_string());
        self
    }

    fn sdk(mut self, sdk_version: &str, system_modules: Option<&str>) -> Self {
        self.sdk_version = Some(sdk_version.to_string());
        self.system_modules = system_modules.map(str::to_string);
        self
    }

    fn java_version(mut self, version: &str) -> Self {
        self.java_version = Some(version.to_string());
        self
    }

    fn no_dex(mut self) -> Self {
        self.installable = Some(false);
        self.compile_dex = Some(false);
        self
    }

    fn optimize(mut self) -> Self {
        self.optimize = true;
        self
    }
}

pub fn engine(declarations: Vec<ModuleDeclaration>) -> ArtifactEngine {
    engine_with(declarations, EngineConfig::default(), &MockSdkFiles::new())
}

pub fn engine_allowing_missing(declarations: Vec<ModuleDeclaration>) -> ArtifactEngine {
    let config = EngineConfig {
        allow_missing_dependencies: true,
        ..EngineConfig::default()
    };
    engine_with(declarations, config, &MockSdkFiles::new())
}

pub fn engine_with(
    declarations: Vec<ModuleDeclaration>,
    config: EngineConfig,
    files: &MockSdkFiles,
) -> ArtifactEngine {
    ArtifactEngine::from_declarations(PathBuf::from("modules.json"), declarations, config, files)
        .expect("build engine")
}

/// Published paths under the default layout.
pub fn header(module: &str) -> PathBuf {
    OutputLayout::default().header_jar(module, module)
}

pub fn implementation(module: &str) -> PathBuf {
    OutputLayout::default().implementation_jar(module, module)
}

pub fn stubs(module: &str) -> PathBuf {
    OutputLayout::default().stubs_jar(module)
}

pub fn dex(module: &str) -> PathBuf {
    OutputLayout::default().dex_jar(module, module)
}

pub fn install(module: &str) -> PathBuf {
    OutputLayout::default().install_path(module)
}
