//! Class loader context construction through the engine.

mod common;

use classpath_graph::domain::edge::SdkVersionBucket;
use classpath_graph::domain::error::ModuleError;
use common::fixtures::*;

#[test]
fn test_sdk_library_becomes_node_with_its_subtree() {
    let engine = engine(vec![
        library("a").libs(&["s"]),
        sdk_library("s").uses_libs(&["inner"]),
        library("inner"),
    ]);
    let outcome = engine.outcome("a").unwrap();
    let clcs = outcome.class_loader_contexts.get(SdkVersionBucket::Any);
    assert_eq!(clcs.len(), 1);
    assert_eq!(clcs[0].name, "s");
    assert_eq!(clcs[0].build_path, Some(dex("s")));
    assert_eq!(clcs[0].install_path, Some(install("s")));
    assert_eq!(clcs[0].subcontexts.uses_libs(), vec!["inner"]);

    // The subtree is the one s published, not a copy.
    let s = engine.outcome("s").unwrap();
    assert!(std::sync::Arc::ptr_eq(&clcs[0].subcontexts, &s.class_loader_contexts));
}

#[test]
fn test_same_library_in_two_buckets_gives_two_entries() {
    let engine = engine(vec![
        library("a")
            .tagged("compat", "uses-library-28")
            .tagged("compat", "uses-library-29"),
        library("compat"),
    ]);
    let clc = &engine.outcome("a").unwrap().class_loader_contexts;
    assert_eq!(clc.get(SdkVersionBucket::Version(28)).len(), 1);
    assert_eq!(clc.get(SdkVersionBucket::Version(29)).len(), 1);
    assert!(clc.get(SdkVersionBucket::Version(28))[0].optional);
    assert!(!clc.get(SdkVersionBucket::Version(29))[0].optional);
    assert!(clc.get(SdkVersionBucket::Any).is_empty());
}

#[test]
fn test_static_dependency_subtree_is_hoisted() {
    let engine = engine(vec![
        library("a").static_libs(&["b"]),
        library("b").uses_libs(&["x"]),
        library("x"),
    ]);
    let clc = &engine.outcome("a").unwrap().class_loader_contexts;
    assert_eq!(clc.uses_libs(), vec!["x"]);
    assert!(clc.get(SdkVersionBucket::Any)[0].subcontexts.is_empty());
}

#[test]
fn test_static_dependency_on_sdk_library_adds_nothing() {
    let engine = engine(vec![
        library("a").static_libs(&["s"]),
        sdk_library("s").uses_libs(&["inner"]),
        library("inner"),
    ]);
    assert!(engine.outcome("a").unwrap().class_loader_contexts.is_empty());
}

#[test]
fn test_plugins_do_not_enter_class_loader_context() {
    let engine = engine(vec![
        library("a").plugins(&["proc"]),
        plugin("proc", "com.example.Proc", false),
    ]);
    assert!(engine.outcome("a").unwrap().class_loader_contexts.is_empty());
}

#[test]
fn test_provides_uses_lib_names_the_node() {
    let engine = engine(vec![
        library("a").libs(&["impl"]),
        library("impl").provides_uses_lib("com.example.shared"),
    ]);
    let clc = engine.clc("a").unwrap();
    assert_eq!(clc.uses_libs, vec!["com.example.shared"]);
    assert!(clc.valid);
}

#[test]
fn test_required_library_without_dex_jar_fails_only_on_consumption() {
    let engine = engine(vec![library("a").uses_libs(&["nodex"]), library("nodex").no_dex()]);
    let outcome = engine.outcome("a").unwrap();
    assert!(outcome.errors.is_empty());
    let entry = &outcome.class_loader_contexts.get(SdkVersionBucket::Any)[0];
    assert_eq!(entry.name, "nodex");
    assert_eq!(entry.build_path, None);

    let clc = engine.clc("a").unwrap();
    assert!(!clc.valid);
    assert_eq!(clc.error, Some(ModuleError::InvalidClcBuildPath { name: "nodex".into() }));

    let report = engine.check();
    assert_eq!(report.failed_module_count, 0);
    assert_eq!(report.invalid_clc_count, 1);
    assert!(!report.is_clean());
}

#[test]
fn test_missing_uses_library_is_tolerated_when_allowed() {
    let engine = engine_allowing_missing(vec![library("a").uses_libs(&["ghost"])]);
    let outcome = engine.outcome("a").unwrap();
    assert!(outcome.errors.is_empty());
    assert_eq!(outcome.missing_dependencies, vec!["ghost"]);
    assert_eq!(outcome.class_loader_contexts.uses_libs(), vec!["ghost"]);

    // Missing dependencies make the context unusable, not an error.
    let clc = engine.clc("a").unwrap();
    assert!(!clc.valid);
    assert_eq!(clc.error, None);
}

#[test]
fn test_missing_uses_library_is_an_error_otherwise() {
    let engine = engine(vec![library("a").uses_libs(&["ghost"])]);
    let outcome = engine.outcome("a").unwrap();
    assert_eq!(outcome.errors, vec![ModuleError::UndefinedDependency { dep: "ghost".into() }]);
}

#[test]
fn test_absent_optional_uses_library_is_dropped() {
    let engine = engine(vec![library("a").optional_uses_libs(&["ghost"])]);
    let outcome = engine.outcome("a").unwrap();
    assert!(outcome.errors.is_empty());
    assert!(outcome.class_loader_contexts.is_empty());
}

#[test]
fn test_conflicting_paths_for_one_library_name() {
    let engine = engine(vec![
        library("a").uses_libs(&["first", "second"]),
        library("first").provides_uses_lib("shared"),
        library("second").provides_uses_lib("shared"),
    ]);
    let outcome = engine.outcome("a").unwrap();
    assert_eq!(
        outcome.errors,
        vec![ModuleError::ConflictingUsesLibrary { name: "shared".into() }]
    );
}

#[test]
fn test_encoded_context() {
    let engine = engine(vec![
        library("a").uses_libs(&["x", "y"]),
        library("x").uses_libs(&["z"]),
        library("y"),
        library("z"),
    ]);
    let encoded = engine.clc("a").unwrap().encoded.unwrap();
    let (x, y, z) = (dex("x"), dex("y"), dex("z"));
    assert_eq!(
        encoded.host,
        format!(
            "--host-context-for-sdk any PCL[{}]{{PCL[{}]}}#PCL[{}]",
            x.display(),
            z.display(),
            y.display()
        )
    );
    assert_eq!(
        encoded.target,
        "--target-context-for-sdk any PCL[/system/framework/x.jar]{PCL[/system/framework/z.jar]}#PCL[/system/framework/y.jar]"
    );
}
