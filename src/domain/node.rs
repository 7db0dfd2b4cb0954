use crate::domain::declaration::ModuleDeclaration;
use crate::domain::edge::DependencyTag;
use crate::domain::error::ModuleError;
use crate::domain::sdk::ResolvedSdk;

/// A dependency that names a module nobody declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingDependency {
    pub name: String,
    pub tag: DependencyTag,
}

/// A module in the dependency graph, before evaluation.
#[derive(Debug, Clone)]
pub struct ModuleNode {
    pub declaration: ModuleDeclaration,
    /// Set for module types compiled against an SDK surface.
    pub sdk: Option<ResolvedSdk>,
    /// Tolerated missing dependencies.
    pub missing: Vec<MissingDependency>,
    /// Errors found while wiring the node's edges.
    pub errors: Vec<ModuleError>,
}

impl ModuleNode {
    pub fn new(declaration: ModuleDeclaration) -> Self {
        Self {
            declaration,
            sdk: None,
            missing: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name
    }

    pub fn missing_dependency_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for missing in &self.missing {
            if !names.contains(&missing.name) {
                names.push(missing.name.clone());
            }
        }
        names
    }
}
