//! Bottom-up evaluation of a module graph.
//!
//! Modules are grouped into waves: a module's wave is one past the deepest wave among its
//! dependencies, so every module in a wave only reads records published by earlier waves.
//! Each wave is evaluated in parallel and the results are stored by node index, which keeps
//! the output independent of scheduling.

use crate::domain::artifact::{ArtifactInfo, PluginInfo, PublishedModule, SystemModulesInfo, UsesLibraryInfo};
use crate::domain::clc::{ClassLoaderContextBuilder, ClassLoaderContextMap};
use crate::domain::classpath::{ClasspathAggregator, CompileClasspaths};
use crate::domain::declaration::{ModuleDeclaration, ModuleType};
use crate::domain::edge::{DependencyEdge, DependencyKind};
use crate::domain::error::ModuleError;
use crate::domain::graph::ModuleGraph;
use crate::domain::layout::OutputLayout;
use crate::domain::node::ModuleNode;
use crate::domain::ports::DependencyCapabilities;
use crate::domain::proguard::ProguardSpecCollector;
use crate::domain::sdk::ResolvedSdk;
use anyhow::{Result, anyhow};
use petgraph::algo::toposort;
use petgraph::graph::NodeIndex;
use rayon::prelude::*;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Everything computed for one module.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleOutcome {
    pub name: String,
    pub module_type: ModuleType,
    pub wave: usize,
    pub published: Arc<PublishedModule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sdk: Option<ResolvedSdk>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classpaths: Option<CompileClasspaths>,
    pub class_loader_contexts: Arc<ClassLoaderContextMap>,
    pub missing_dependencies: Vec<String>,
    pub errors: Vec<ModuleError>,
}

impl ModuleOutcome {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Outcomes for every module, indexed like the graph's nodes.
#[derive(Debug, Clone)]
pub struct Evaluation {
    outcomes: Vec<ModuleOutcome>,
    wave_count: usize,
}

impl Evaluation {
    pub fn outcome(&self, idx: NodeIndex) -> Option<&ModuleOutcome> {
        self.outcomes.get(idx.index())
    }

    pub fn outcomes(&self) -> impl Iterator<Item = &ModuleOutcome> {
        self.outcomes.iter()
    }

    pub fn wave_count(&self) -> usize {
        self.wave_count
    }
}

pub struct Evaluator<'a> {
    layout: &'a OutputLayout,
}

impl<'a> Evaluator<'a> {
    pub fn new(layout: &'a OutputLayout) -> Self {
        Self { layout }
    }

    /// Evaluate every module once all of its dependencies are evaluated.
    ///
    /// Fails only on a dependency cycle.
    pub fn evaluate(&self, graph: &ModuleGraph) -> Result<Evaluation> {
        let waves = schedule(graph)?;
        let mut outcomes: Vec<Option<ModuleOutcome>> = vec![None; graph.node_count()];

        for (wave, members) in waves.iter().enumerate() {
            let evaluated: Vec<(NodeIndex, ModuleOutcome)> = members
                .par_iter()
                .map(|&idx| (idx, self.evaluate_module(graph, idx, wave, &outcomes)))
                .collect();
            for (idx, outcome) in evaluated {
                outcomes[idx.index()] = Some(outcome);
            }
        }

        let outcomes: Vec<ModuleOutcome> = outcomes.into_iter().flatten().collect();
        info!(
            modules = outcomes.len(),
            waves = waves.len(),
            failed = outcomes.iter().filter(|o| o.has_errors()).count(),
            "evaluated module graph"
        );
        Ok(Evaluation {
            outcomes,
            wave_count: waves.len(),
        })
    }

    fn evaluate_module(
        &self,
        graph: &ModuleGraph,
        idx: NodeIndex,
        wave: usize,
        outcomes: &[Option<ModuleOutcome>],
    ) -> ModuleOutcome {
        let node = graph.node(idx);
        debug!(module = %node.name(), wave, "evaluating module");

        let deps: Vec<(&str, &DependencyEdge, &PublishedModule)> = graph
            .dependencies(idx)
            .into_iter()
            .filter_map(|(target, edge)| {
                let outcome = outcomes[target.index()].as_ref()?;
                Some((outcome.name.as_str(), edge, outcome.published.as_ref()))
            })
            .collect();

        let mut errors = node.errors.clone();
        let rules = ModuleRules {
            layout: self.layout,
            node,
        };
        let (published, classpaths, class_loader_contexts) = match node.declaration.module_type {
            ModuleType::JavaSystemModules => {
                let published = rules.system_modules(&deps, &mut errors);
                (published, None, Arc::new(ClassLoaderContextMap::new()))
            }
            ModuleType::Genrule => (rules.genrule(), None, Arc::new(ClassLoaderContextMap::new())),
            ModuleType::JavaLibrary
            | ModuleType::JavaImport
            | ModuleType::JavaSdkLibrary
            | ModuleType::JavaPlugin => {
                let (published, classpaths, clc) = rules.java(&deps, &mut errors);
                (published, Some(classpaths), clc)
            }
        };

        ModuleOutcome {
            name: node.name().to_string(),
            module_type: node.declaration.module_type,
            wave,
            published: Arc::new(published),
            sdk: node.sdk.clone(),
            classpaths,
            class_loader_contexts,
            missing_dependencies: node.missing_dependency_names(),
            errors,
        }
    }
}

/// Group modules into waves of mutually independent modules, dependencies first.
fn schedule(graph: &ModuleGraph) -> Result<Vec<Vec<NodeIndex>>> {
    let order = toposort(&graph.graph, None).map_err(|cycle| {
        anyhow!(
            "dependency cycle through module {:?}",
            graph.node(cycle.node_id()).name()
        )
    })?;

    let mut level = vec![0usize; graph.node_count()];
    let mut waves: Vec<Vec<NodeIndex>> = Vec::new();
    // Dependents come first in topological order; walk it backwards.
    for &idx in order.iter().rev() {
        let wave = graph
            .dependencies(idx)
            .iter()
            .map(|(target, _)| level[target.index()] + 1)
            .max()
            .unwrap_or(0);
        level[idx.index()] = wave;
        if waves.len() <= wave {
            waves.resize_with(wave + 1, Vec::new);
        }
        waves[wave].push(idx);
    }
    for members in &mut waves {
        members.sort();
    }
    Ok(waves)
}

/// Per-module-type publishing rules.
struct ModuleRules<'a> {
    layout: &'a OutputLayout,
    node: &'a ModuleNode,
}

impl ModuleRules<'_> {
    fn declaration(&self) -> &ModuleDeclaration {
        &self.node.declaration
    }

    fn java(
        &self,
        deps: &[(&str, &DependencyEdge, &PublishedModule)],
        errors: &mut Vec<ModuleError>,
    ) -> (PublishedModule, CompileClasspaths, Arc<ClassLoaderContextMap>) {
        let decl = self.declaration();
        let sdk = self.node.sdk.as_ref();
        let mut aggregator = ClasspathAggregator::new(sdk.map(|s| &s.dep), sdk.map(|s| s.java_version));
        let mut proguard = ProguardSpecCollector::new();
        let mut clc = ClassLoaderContextBuilder::new();

        for &(name, edge, dep) in deps {
            if let Err(err) = aggregator.add_dependency(name, &edge.tag, dep) {
                errors.push(err);
                continue;
            }
            if let Some(info) = dep.artifact_info() {
                proguard.add_dependency(&edge.tag, info);
            }
            if let Err(err) = clc.add_dependency(name, &edge.tag, Some(dep)) {
                errors.push(err);
            }
        }
        for missing in &self.node.missing {
            if matches!(missing.tag.kind, DependencyKind::UsesLibrary { .. })
                && let Err(err) = clc.add_dependency(&missing.name, &missing.tag, None)
            {
                errors.push(err);
            }
        }

        let classpaths = aggregator.finish();
        let keep_rules = proguard.finish(decl.proguard_flags_files.clone(), decl.export_proguard_flags_files);
        let clc = Arc::new(clc.build());

        let name = decl.name.as_str();
        let stem = decl.stem();
        let layout = self.layout;
        let (header_jars, implementation_jars) = match decl.module_type {
            ModuleType::JavaImport => {
                let jar = match decl.jars.as_slice() {
                    [single] => single.clone(),
                    _ => layout.implementation_jar(name, stem),
                };
                (vec![jar.clone()], vec![jar])
            }
            ModuleType::JavaSdkLibrary => (
                vec![layout.stubs_jar(name)],
                vec![layout.implementation_jar(name, stem)],
            ),
            _ => (
                vec![layout.header_jar(name, stem)],
                vec![layout.implementation_jar(name, stem)],
            ),
        };
        let resource_jars = if decl.java_resources.is_empty() {
            Vec::new()
        } else {
            vec![layout.resource_jar(name, stem)]
        };

        let artifact = ArtifactInfo {
            header_jars,
            implementation_jars,
            resource_jars,
            transitive_header_jars: classpaths.transitive_header_jars.clone(),
            transitive_static_header_jars: classpaths.transitive_static_header_jars.clone(),
            exported_keep_rule_files: keep_rules.files,
            exported_keep_rule_files_unconditional: keep_rules.unconditional,
            export_keep_rule_files: keep_rules.export,
            exported_plugins: classpaths.exported_plugins.as_slice().to_vec(),
            exported_plugin_classes: classpaths.exported_plugin_classes.clone(),
            exported_plugin_disable_turbine: classpaths.exported_plugin_disable_turbine,
        };

        let is_plugin = decl.module_type == ModuleType::JavaPlugin;
        let uses_library = (!is_plugin).then(|| UsesLibraryInfo {
            dex_jar_build_path: decl.compiles_to_dex().then(|| layout.dex_jar(name, stem)),
            dex_jar_install_path: decl.installable().then(|| layout.install_path(stem)),
            class_loader_contexts: Arc::clone(&clc),
        });
        let plugin = is_plugin.then(|| PluginInfo {
            processor_class: decl.processor_class.clone(),
            generates_api: decl.generates_api,
        });

        let published = PublishedModule {
            artifact: Some(artifact),
            uses_library,
            sdk_library_name: decl.is_shared_sdk_library().then(|| name.to_string()),
            provides_uses_lib: decl.provides_uses_lib.clone(),
            plugin,
            ..PublishedModule::new(name)
        };
        (published, classpaths, clc)
    }

    /// A system modules image built from its libraries' header jars.
    fn system_modules(
        &self,
        deps: &[(&str, &DependencyEdge, &PublishedModule)],
        errors: &mut Vec<ModuleError>,
    ) -> PublishedModule {
        let name = self.declaration().name.as_str();
        let mut header_jars: Vec<PathBuf> = Vec::new();
        for &(dep_name, edge, dep) in deps {
            if !edge.tag.is_lib() {
                continue;
            }
            match dep.artifact_info() {
                Some(info) => {
                    for jar in &info.header_jars {
                        if !header_jars.contains(jar) {
                            header_jars.push(jar.clone());
                        }
                    }
                }
                None => errors.push(ModuleError::NotAJavaLibrary {
                    dep: dep_name.to_string(),
                    tag: edge.tag.name.clone(),
                }),
            }
        }
        PublishedModule {
            system_modules: Some(SystemModulesInfo {
                output_dir: self.layout.system_modules_dir(name),
                header_jars,
            }),
            ..PublishedModule::new(name)
        }
    }

    fn genrule(&self) -> PublishedModule {
        let decl = self.declaration();
        let files = decl
            .outputs
            .iter()
            .map(|output| self.layout.generated_file(&decl.name, output))
            .collect();
        PublishedModule {
            source_files: Some(files),
            ..PublishedModule::new(decl.name.as_str())
        }
    }
}
