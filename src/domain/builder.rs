use crate::domain::declaration::ModuleDeclaration;
use crate::domain::edge::{DependencyEdge, DependencyTag, TagRegistry};
use crate::domain::error::ModuleError;
use crate::domain::graph::ModuleGraph;
use crate::domain::node::{MissingDependency, ModuleNode};
use crate::domain::ports::SdkFiles;
use crate::domain::sdk::{ResolvedSdk, SdkConfig, SdkVersionResolver};
use anyhow::{Result, bail};
use petgraph::graph::NodeIndex;
use tracing::{debug, info};

/// Graph builder - Domain Service for constructing ModuleGraph
pub struct GraphBuilder<'a> {
    tags: &'a TagRegistry,
    sdk_config: &'a SdkConfig,
    sdk_files: &'a dyn SdkFiles,
    allow_missing_dependencies: bool,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(
        tags: &'a TagRegistry,
        sdk_config: &'a SdkConfig,
        sdk_files: &'a dyn SdkFiles,
        allow_missing_dependencies: bool,
    ) -> Self {
        Self {
            tags,
            sdk_config,
            sdk_files,
            allow_missing_dependencies,
        }
    }

    /// Two-pass build: allocate every module, then classify and wire its edges.
    ///
    /// Only duplicate module names fail the whole build; everything else is recorded on the
    /// module it concerns.
    pub fn build(&self, declarations: Vec<ModuleDeclaration>) -> Result<ModuleGraph> {
        let mut graph = ModuleGraph::new();

        // Pass 1: Node Allocation
        for declaration in declarations {
            if graph.get_node_by_name(&declaration.name).is_some() {
                bail!("module {:?} is declared more than once", declaration.name);
            }
            graph.add_node(ModuleNode::new(declaration));
        }

        // Pass 2: Edge Classification and Wiring
        let resolver = SdkVersionResolver::new(self.sdk_config, self.sdk_files, self.allow_missing_dependencies);
        let indices: Vec<NodeIndex> = graph.graph.node_indices().collect();
        for idx in indices {
            let mut errors = Vec::new();
            let mut missing = Vec::new();
            let mut deps: Vec<(String, DependencyTag)> = Vec::new();

            let declaration = &graph.node(idx).declaration;
            let sdk = if declaration.module_type.resolves_sdk() {
                match resolver.resolve(
                    declaration.sdk_version.as_deref(),
                    declaration.system_modules.as_deref(),
                    declaration.java_version.as_deref(),
                ) {
                    Ok(resolved) => {
                        self.implicit_sdk_deps(declaration, &resolved, &mut deps, &mut missing);
                        Some(resolved)
                    }
                    Err(err) => {
                        errors.push(err);
                        None
                    }
                }
            } else {
                None
            };

            for raw in declaration.raw_dependencies() {
                match self.tags.classify(&raw) {
                    Ok(tag) => deps.push((raw.name, tag)),
                    Err(err) => errors.push(err),
                }
            }

            for (name, tag) in deps {
                match graph.get_node_by_name(&name) {
                    Some(target) => {
                        graph.add_edge(idx, target, DependencyEdge { tag });
                    }
                    None if tag.uses_library_optional() => {
                        debug!(module = %graph.node(idx).name(), dep = %name, "dropping absent optional uses-library");
                    }
                    None if self.allow_missing_dependencies => {
                        debug!(module = %graph.node(idx).name(), dep = %name, "missing dependency");
                        missing.push(MissingDependency { name, tag });
                    }
                    None => errors.push(ModuleError::UndefinedDependency { dep: name }),
                }
            }

            let node = graph.node_mut(idx);
            node.sdk = sdk;
            node.missing.extend(missing);
            node.errors.extend(errors);
        }

        info!(
            modules = graph.node_count(),
            edges = graph.edge_count(),
            "built module graph"
        );
        Ok(graph)
    }

    /// SDK libraries come before the module's declared dependencies.
    fn implicit_sdk_deps(
        &self,
        declaration: &ModuleDeclaration,
        resolved: &ResolvedSdk,
        deps: &mut Vec<(String, DependencyTag)>,
        missing: &mut Vec<MissingDependency>,
    ) {
        let tag = |name: &str| self.tags.get(name).cloned();
        let sdk = &resolved.dep;

        if sdk.invalid_version {
            let tagged = [
                (TagRegistry::BOOT_CLASSPATH, &sdk.bootclasspath),
                (TagRegistry::JAVA9_LIB, &sdk.java9_classpath),
            ];
            for (tag_name, names) in tagged {
                if let Some(tag) = tag(tag_name) {
                    missing.extend(names.iter().map(|name| MissingDependency {
                        name: name.clone(),
                        tag: tag.clone(),
                    }));
                }
            }
            return;
        }

        let mut push = |tag_name: &str, names: &[String]| {
            if let Some(tag) = tag(tag_name) {
                deps.extend(names.iter().map(|name| (name.clone(), tag.clone())));
            }
        };
        if sdk.use_module {
            push(TagRegistry::BOOT_CLASSPATH, sdk.bootclasspath_for(resolved.java_version));
            push(TagRegistry::JAVA9_LIB, &sdk.java9_classpath);
            push(TagRegistry::SDK_LIB, &sdk.classpath);
            if declaration.optimize && sdk.has_standard_libs() {
                push(
                    TagRegistry::PROGUARD_RAISE,
                    &self.sdk_config.legacy_core_platform_bootclasspath,
                );
            }
            if declaration.optimize && sdk.has_framework_libs() {
                push(TagRegistry::PROGUARD_RAISE, &self.sdk_config.framework_libraries);
            }
        }
        if !sdk.system_modules.is_empty() {
            push(TagRegistry::SYSTEM_MODULES, std::slice::from_ref(&sdk.system_modules));
        }
    }
}
