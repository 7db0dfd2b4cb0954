use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Deterministic naming of the files a module publishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputLayout {
    pub out_dir: PathBuf,
    pub install_dir: PathBuf,
}

impl Default for OutputLayout {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("out/soong/.intermediates"),
            install_dir: PathBuf::from("/system/framework"),
        }
    }
}

impl OutputLayout {
    fn module_dir(&self, module: &str) -> PathBuf {
        self.out_dir.join(module)
    }

    pub fn header_jar(&self, module: &str, stem: &str) -> PathBuf {
        self.module_dir(module).join("turbine-combined").join(format!("{stem}.jar"))
    }

    pub fn implementation_jar(&self, module: &str, stem: &str) -> PathBuf {
        self.module_dir(module).join("combined").join(format!("{stem}.jar"))
    }

    pub fn resource_jar(&self, module: &str, stem: &str) -> PathBuf {
        self.module_dir(module).join("res").join(format!("{stem}.jar"))
    }

    pub fn dex_jar(&self, module: &str, stem: &str) -> PathBuf {
        self.module_dir(module).join("dex").join(format!("{stem}.jar"))
    }

    pub fn stubs_jar(&self, module: &str) -> PathBuf {
        self.module_dir(module).join("stubs").join(format!("{module}.stubs.jar"))
    }

    pub fn generated_file(&self, module: &str, output: &str) -> PathBuf {
        self.module_dir(module).join("gen").join(output)
    }

    pub fn system_modules_dir(&self, module: &str) -> PathBuf {
        self.module_dir(module).join("system")
    }

    pub fn install_path(&self, stem: &str) -> PathBuf {
        self.install_dir.join(format!("{stem}.jar"))
    }
}
