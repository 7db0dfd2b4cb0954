use crate::domain::ports::SdkFiles;
use std::path::{Path, PathBuf};

/// Looks prebuilt SDK files up relative to a source tree root.
pub struct FsSdkFiles {
    root: PathBuf,
}

impl FsSdkFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl SdkFiles for FsSdkFiles {
    fn exists(&self, path: &Path) -> bool {
        self.root.join(path).is_file()
    }
}
