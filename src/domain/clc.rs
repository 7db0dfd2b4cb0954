//! Class loader context (CLC) trees.
//!
//! A CLC mirrors how the runtime class loader resolves `<uses-library>` dependencies: a
//! library's own shared libraries become its children, a static library's shared libraries
//! are hoisted into whoever links it. Maps are immutable once published and subtrees are
//! shared between dependents through `Arc`.

use crate::domain::edge::{DependencyKind, DependencyTag, SdkVersionBucket};
use crate::domain::error::ModuleError;
use crate::domain::ports::DependencyCapabilities;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

/// One library in a class loader context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassLoaderContext {
    pub name: String,
    pub optional: bool,
    /// Dex jar on the build host. `None` makes the context invalid at dexpreopt time.
    pub build_path: Option<PathBuf>,
    /// Location on device.
    pub install_path: Option<PathBuf>,
    pub subcontexts: Arc<ClassLoaderContextMap>,
}

/// SDK-version bucket to ordered libraries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassLoaderContextMap {
    buckets: BTreeMap<SdkVersionBucket, Vec<Arc<ClassLoaderContext>>>,
}

/// Linear form of a class loader context as passed to dex2oat.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EncodedClassLoaderContext {
    pub host: String,
    pub target: String,
}

impl ClassLoaderContextMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.values().all(|clcs| clcs.is_empty())
    }

    pub fn get(&self, bucket: SdkVersionBucket) -> &[Arc<ClassLoaderContext>] {
        self.buckets.get(&bucket).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Buckets in encoding order: `any` first, then versions from highest to lowest.
    pub fn buckets(&self) -> impl Iterator<Item = (SdkVersionBucket, &[Arc<ClassLoaderContext>])> {
        self.buckets
            .iter()
            .rev()
            .filter(|(_, clcs)| !clcs.is_empty())
            .map(|(bucket, clcs)| (*bucket, clcs.as_slice()))
    }

    /// Names of the unconditional libraries.
    pub fn uses_libs(&self) -> Vec<&str> {
        self.get(SdkVersionBucket::Any)
            .iter()
            .map(|clc| clc.name.as_str())
            .collect()
    }

    /// Add a library node. Re-adding a library with the same paths is a no-op.
    pub fn add_context(
        &mut self,
        bucket: SdkVersionBucket,
        name: &str,
        optional: bool,
        build_path: Option<PathBuf>,
        install_path: Option<PathBuf>,
        subcontexts: Arc<ClassLoaderContextMap>,
    ) -> Result<(), ModuleError> {
        let clcs = self.buckets.entry(bucket).or_default();
        if let Some(existing) = clcs.iter().find(|clc| clc.name == name) {
            if existing.build_path == build_path && existing.install_path == install_path {
                return Ok(());
            }
            return Err(ModuleError::ConflictingUsesLibrary {
                name: name.to_string(),
            });
        }
        clcs.push(Arc::new(ClassLoaderContext {
            name: name.to_string(),
            optional,
            build_path,
            install_path,
            subcontexts,
        }));
        Ok(())
    }

    /// Hoist another map's libraries into this one, bucket by bucket. Libraries already
    /// present keep their position.
    pub fn add_context_map(&mut self, other: &ClassLoaderContextMap) {
        for (bucket, other_clcs) in &other.buckets {
            let clcs = self.buckets.entry(*bucket).or_default();
            for other_clc in other_clcs {
                if !clcs.iter().any(|clc| clc.name == other_clc.name) {
                    clcs.push(Arc::clone(other_clc));
                }
            }
        }
    }

    /// Check every library has paths on host and device.
    ///
    /// Returns `Ok(false)` instead of an error for a missing path when missing dependencies
    /// are allowed: the context is unusable, but the build may go on without dexpreopt.
    pub fn validate(&self, allow_missing_dependencies: bool) -> Result<bool, ModuleError> {
        for (_, clcs) in self.buckets() {
            if !validate_rec(clcs, allow_missing_dependencies)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Render as `--host-context-for-sdk`/`--target-context-for-sdk` arguments.
    pub fn encode(&self) -> Result<EncodedClassLoaderContext, ModuleError> {
        self.validate(false)?;
        let mut host = Vec::new();
        let mut target = Vec::new();
        for (bucket, clcs) in self.buckets() {
            let (host_clc, target_clc) = encode_rec(clcs);
            host.push(format!("--host-context-for-sdk {bucket} {host_clc}"));
            target.push(format!("--target-context-for-sdk {bucket} {target_clc}"));
        }
        Ok(EncodedClassLoaderContext {
            host: host.join(" "),
            target: target.join(" "),
        })
    }
}

fn nested(clc: &ClassLoaderContext) -> Result<&[Arc<ClassLoaderContext>], ModuleError> {
    if let Some((bucket, _)) = clc
        .subcontexts
        .buckets()
        .find(|(bucket, _)| *bucket != SdkVersionBucket::Any)
    {
        return Err(ModuleError::ConditionalNestedContext {
            name: clc.name.clone(),
            sdk_version: bucket.to_string(),
        });
    }
    Ok(clc.subcontexts.get(SdkVersionBucket::Any))
}

fn validate_rec(clcs: &[Arc<ClassLoaderContext>], allow_missing_dependencies: bool) -> Result<bool, ModuleError> {
    for clc in clcs {
        if clc.build_path.is_none() || clc.install_path.is_none() {
            if allow_missing_dependencies {
                return Ok(false);
            }
            if clc.build_path.is_none() {
                return Err(ModuleError::InvalidClcBuildPath {
                    name: clc.name.clone(),
                });
            }
            return Err(ModuleError::InvalidClcInstallPath {
                name: clc.name.clone(),
            });
        }
        if !validate_rec(nested(clc)?, allow_missing_dependencies)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn encode_rec(clcs: &[Arc<ClassLoaderContext>]) -> (String, String) {
    let mut host = Vec::with_capacity(clcs.len());
    let mut target = Vec::with_capacity(clcs.len());
    for clc in clcs {
        // Validated before encoding.
        let children = clc.subcontexts.get(SdkVersionBucket::Any);
        let (mut sub_host, mut sub_target) = (String::new(), String::new());
        if !children.is_empty() {
            let (h, t) = encode_rec(children);
            sub_host = format!("{{{h}}}");
            sub_target = format!("{{{t}}}");
        }
        let display = |path: &Option<PathBuf>| path.as_ref().map(|p| p.display().to_string()).unwrap_or_default();
        host.push(format!("PCL[{}]{}", display(&clc.build_path), sub_host));
        target.push(format!("PCL[{}]{}", display(&clc.install_path), sub_target));
    }
    (host.join("#"), target.join("#"))
}

impl Serialize for ClassLoaderContextMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (bucket, clcs) in self.buckets() {
            map.serialize_entry(&bucket, clcs)?;
        }
        map.end()
    }
}

/// Builds a module's class loader context from its direct dependencies.
#[derive(Debug, Default)]
pub struct ClassLoaderContextBuilder {
    map: ClassLoaderContextMap,
}

impl ClassLoaderContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in one direct dependency. `dep` is `None` when the dependency is missing.
    pub fn add_dependency(
        &mut self,
        dep_name: &str,
        tag: &DependencyTag,
        dep: Option<&dyn DependencyCapabilities>,
    ) -> Result<(), ModuleError> {
        let uses_library = dep.and_then(|d| d.uses_library());
        let identity = dep.and_then(|d| d.class_loader_identity());

        match tag.kind {
            DependencyKind::UsesLibrary { sdk_version, optional } => match uses_library {
                Some(info) => self.map.add_context(
                    sdk_version,
                    identity.unwrap_or(dep_name),
                    optional,
                    info.dex_jar_build_path.clone(),
                    info.dex_jar_install_path.clone(),
                    Arc::clone(&info.class_loader_contexts),
                ),
                // Missing optional libraries are left out of the context entirely.
                None if optional => Ok(()),
                None => self.map.add_context(
                    sdk_version,
                    dep_name,
                    false,
                    None,
                    None,
                    Arc::new(ClassLoaderContextMap::new()),
                ),
            },
            DependencyKind::Shared { .. } => match (identity, uses_library) {
                (Some(identity), Some(info)) => self.map.add_context(
                    SdkVersionBucket::Any,
                    identity,
                    false,
                    info.dex_jar_build_path.clone(),
                    info.dex_jar_install_path.clone(),
                    Arc::clone(&info.class_loader_contexts),
                ),
                (None, Some(info)) => {
                    self.map.add_context_map(&info.class_loader_contexts);
                    Ok(())
                }
                (_, None) => Ok(()),
            },
            DependencyKind::Static => {
                if let (None, Some(info)) = (identity, uses_library) {
                    self.map.add_context_map(&info.class_loader_contexts);
                }
                Ok(())
            }
            DependencyKind::Java9Classpath
            | DependencyKind::BootClasspath
            | DependencyKind::SystemModules
            | DependencyKind::Jni
            | DependencyKind::Toolchain { .. }
            | DependencyKind::ProguardRaise => Ok(()),
        }
    }

    pub fn build(self) -> ClassLoaderContextMap {
        self.map
    }
}
