use crate::domain::declaration::{DeclarationFile, ModuleDeclaration};
use crate::domain::ports::DeclarationSource;
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Reads `{"modules": [...]}` declaration files.
pub struct JsonDeclarationSource {
    path: PathBuf,
}

impl JsonDeclarationSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DeclarationSource for JsonDeclarationSource {
    fn load(&self) -> Result<Vec<ModuleDeclaration>> {
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read declarations: {}", self.path.display()))?;
        parse_declarations(&content)
            .with_context(|| format!("Failed to parse declarations: {}", self.path.display()))
    }
}

pub fn parse_declarations(json: &str) -> Result<Vec<ModuleDeclaration>> {
    let file: DeclarationFile = serde_json::from_str(json)?;
    Ok(file.modules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::declaration::ModuleType;
    use std::io::Write;

    #[test]
    fn test_load_declarations_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"modules": [{{"name": "a", "type": "java_library"}}, {{"name": "g", "type": "genrule", "outputs": ["g.jar"]}}]}}"#
        )
        .unwrap();

        let modules = JsonDeclarationSource::new(file.path()).load().unwrap();
        assert_eq!(modules.len(), 2);
        assert_eq!(modules[1].module_type, ModuleType::Genrule);
        assert_eq!(modules[1].outputs, vec!["g.jar"]);
    }

    #[test]
    fn test_malformed_file_names_the_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = JsonDeclarationSource::new(file.path()).load().unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse declarations"));
    }
}
