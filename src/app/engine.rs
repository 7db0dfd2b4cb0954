use crate::adapters::fs::sdk_files::FsSdkFiles;
use crate::adapters::json::loader::JsonDeclarationSource;
use crate::app::dto::*;
use crate::config::EngineConfig;
use crate::domain::builder::GraphBuilder;
use crate::domain::declaration::ModuleDeclaration;
use crate::domain::edge::TagRegistry;
use crate::domain::evaluator::{Evaluation, Evaluator, ModuleOutcome};
use crate::domain::graph::ModuleGraph;
use crate::domain::ports::{DeclarationSource, DependencyCapabilities, SdkFiles};
use crate::domain::sdk::JavaVersion;
use anyhow::{Context as _, Result, anyhow};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Builds and evaluates a module graph once, then answers queries about it.
pub struct ArtifactEngine {
    declarations_path: PathBuf,
    config: EngineConfig,
    graph: ModuleGraph,
    evaluation: Evaluation,
}

impl ArtifactEngine {
    /// Construct an engine from declarations that are already in memory.
    pub fn from_declarations(
        declarations_path: PathBuf,
        declarations: Vec<ModuleDeclaration>,
        config: EngineConfig,
        sdk_files: &dyn SdkFiles,
    ) -> Result<Self> {
        let tags = TagRegistry::standard();
        let builder = GraphBuilder::new(&tags, &config.sdk, sdk_files, config.allow_missing_dependencies);
        let graph = builder
            .build(declarations)
            .context("Failed to build module graph")?;
        let evaluation = Evaluator::new(&config.layout)
            .evaluate(&graph)
            .context("Failed to evaluate module graph")?;

        Ok(Self {
            declarations_path,
            config,
            graph,
            evaluation,
        })
    }

    /// Load a declarations file. Prebuilt SDK paths resolve against the file's directory.
    pub fn load_from_json(declarations_path: &Path, config: EngineConfig) -> Result<Self> {
        let declarations = JsonDeclarationSource::new(declarations_path).load()?;
        let root = declarations_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let sdk_files = FsSdkFiles::new(root);
        Self::from_declarations(declarations_path.to_path_buf(), declarations, config, &sdk_files)
    }

    pub fn graph(&self) -> &ModuleGraph {
        &self.graph
    }

    pub fn outcome(&self, module: &str) -> Result<&ModuleOutcome> {
        let idx = self
            .graph
            .get_node_by_name(module)
            .ok_or_else(|| anyhow!("Module not found: {}", module))?;
        self.evaluation
            .outcome(idx)
            .ok_or_else(|| anyhow!("Module was not evaluated: {}", module))
    }

    pub fn health(&self) -> HealthResponse {
        HealthResponse {
            declarations_path: self.declarations_path.to_string_lossy().to_string(),
            module_count: self.graph.node_count(),
            edge_count: self.graph.edge_count(),
            wave_count: self.evaluation.wave_count(),
        }
    }

    pub fn artifacts(&self, module: &str) -> Result<ArtifactsResponse> {
        let outcome = self.outcome(module)?;
        let published = outcome.published.as_ref();
        let artifact = published.artifact_info().cloned().unwrap_or_default();
        let uses_library = published.uses_library();

        Ok(ArtifactsResponse {
            module: outcome.name.clone(),
            module_type: outcome.module_type.to_string(),
            header_jars: artifact.header_jars,
            implementation_jars: artifact.implementation_jars,
            resource_jars: artifact.resource_jars,
            transitive_header_jars: artifact.transitive_header_jars.to_list(),
            transitive_static_header_jars: artifact.transitive_static_header_jars.to_list(),
            exported_keep_rule_files: artifact.exported_keep_rule_files.to_list(),
            exported_keep_rule_files_unconditional: artifact.exported_keep_rule_files_unconditional.to_list(),
            exported_plugins: artifact.exported_plugins,
            exported_plugin_classes: artifact.exported_plugin_classes,
            exported_plugin_disable_turbine: artifact.exported_plugin_disable_turbine,
            dex_jar_build_path: uses_library.and_then(|u| u.dex_jar_build_path.clone()),
            dex_jar_install_path: uses_library.and_then(|u| u.dex_jar_install_path.clone()),
            system_modules_dir: published.system_modules().map(|m| m.output_dir.clone()),
            source_files: published.source_files().map(<[PathBuf]>::to_vec),
            errors: outcome.errors.clone(),
        })
    }

    pub fn classpath(&self, module: &str) -> Result<ClasspathResponse> {
        let outcome = self.outcome(module)?;
        let classpaths = outcome
            .classpaths
            .as_ref()
            .ok_or_else(|| anyhow!("{} module {} has no classpath", outcome.module_type, module))?;

        Ok(ClasspathResponse {
            module: outcome.name.clone(),
            sdk_version: outcome.sdk.as_ref().map(|sdk| sdk.spec.raw.clone()),
            java_version: classpaths.java_version,
            kotlin_target: classpaths.java_version.map(JavaVersion::for_kotlinc),
            classpath: classpaths.classpath.as_slice().to_vec(),
            dex_classpath: classpaths.dex_classpath.as_slice().to_vec(),
            bootclasspath: classpaths.bootclasspath.as_slice().to_vec(),
            java9_classpath: classpaths.java9_classpath.as_slice().to_vec(),
            system_modules: classpaths.system_modules.clone(),
            processor_path: classpaths.processor_path.as_slice().to_vec(),
            processor_classes: classpaths.processor_classes.clone(),
            disable_turbine: classpaths.disable_turbine,
            static_jars: classpaths.static_jars.as_slice().to_vec(),
            static_header_jars: classpaths.static_header_jars.as_slice().to_vec(),
            static_resource_jars: classpaths.static_resource_jars.as_slice().to_vec(),
            proguard_raise_jars: classpaths.proguard_raise_jars.as_slice().to_vec(),
            aidl_preprocess: classpaths.aidl_preprocess.clone(),
            missing_dependencies: outcome.missing_dependencies.clone(),
        })
    }

    pub fn clc(&self, module: &str) -> Result<ClcResponse> {
        let outcome = self.outcome(module)?;
        let contexts = outcome.class_loader_contexts.clone();
        let (valid, encoded, error) = match contexts.validate(self.config.allow_missing_dependencies) {
            Ok(true) => match contexts.encode() {
                Ok(encoded) => (true, Some(encoded), None),
                Err(err) => (false, None, Some(err)),
            },
            Ok(false) => (false, None, None),
            Err(err) => (false, None, Some(err)),
        };

        Ok(ClcResponse {
            module: outcome.name.clone(),
            uses_libs: contexts.uses_libs().into_iter().map(str::to_string).collect(),
            contexts,
            valid,
            encoded,
            error,
        })
    }

    /// Whole-graph diagnostics. Every node-local error is logged as it is reported.
    pub fn check(&self) -> CheckResponse {
        let mut modules = Vec::new();
        let mut failed_module_count = 0;
        let mut invalid_clc_count = 0;

        for outcome in self.evaluation.outcomes() {
            for err in &outcome.errors {
                warn!(module = %outcome.name, error = %err, "module error");
            }
            let clc_error = outcome
                .class_loader_contexts
                .validate(self.config.allow_missing_dependencies)
                .err();
            if let Some(err) = &clc_error {
                warn!(module = %outcome.name, error = %err, "invalid class loader context");
                invalid_clc_count += 1;
            }
            if outcome.has_errors() {
                failed_module_count += 1;
            }
            if outcome.has_errors() || clc_error.is_some() || !outcome.missing_dependencies.is_empty() {
                modules.push(ModuleDiagnostics {
                    module: outcome.name.clone(),
                    errors: outcome.errors.clone(),
                    missing_dependencies: outcome.missing_dependencies.clone(),
                    clc_error,
                });
            }
        }

        CheckResponse {
            module_count: self.graph.node_count(),
            failed_module_count,
            invalid_clc_count,
            modules,
        }
    }
}
