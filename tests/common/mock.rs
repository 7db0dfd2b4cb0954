//! Mock implementations for integration tests.
#![allow(dead_code)]

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use classpath_graph::domain::ports::SdkFiles;

/// Mock SdkFiles that serves existence checks from an in-memory set.
#[derive(Default)]
pub struct MockSdkFiles {
    files: HashSet<PathBuf>,
}

impl MockSdkFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        self.files.insert(path.as_ref().to_path_buf());
        self
    }

    /// Prebuilt jar and aidl file for a numbered SDK surface.
    pub fn with_prebuilt_sdk(self, level: u32, kind: &str) -> Self {
        self.with_file(format!("prebuilts/sdk/{level}/{kind}/android.jar"))
            .with_file(format!("prebuilts/sdk/{level}/public/framework.aidl"))
    }
}

impl SdkFiles for MockSdkFiles {
    fn exists(&self, path: &Path) -> bool {
        self.files.contains(path)
    }
}
