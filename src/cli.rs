//! Command implementations for `cptool`. Results go to stdout as JSON.

use crate::app::engine::ArtifactEngine;
use anyhow::Result;
use serde::Serialize;

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Module names to report on: the one asked for, or every module in declaration order.
fn selected_modules(engine: &ArtifactEngine, module: Option<&str>) -> Vec<String> {
    match module {
        Some(module) => vec![module.to_string()],
        None => engine
            .graph()
            .graph
            .node_weights()
            .map(|node| node.name().to_string())
            .collect(),
    }
}

pub fn print_artifacts(engine: &ArtifactEngine, module: Option<&str>) -> Result<()> {
    match module {
        Some(module) => print_json(&engine.artifacts(module)?),
        None => {
            let all = selected_modules(engine, None)
                .iter()
                .map(|name| engine.artifacts(name))
                .collect::<Result<Vec<_>>>()?;
            print_json(&all)
        }
    }
}

pub fn print_classpath(engine: &ArtifactEngine, module: Option<&str>) -> Result<()> {
    match module {
        Some(module) => print_json(&engine.classpath(module)?),
        None => {
            // Modules that aren't compiled have no classpath to show.
            let all: Vec<_> = selected_modules(engine, None)
                .iter()
                .filter_map(|name| engine.classpath(name).ok())
                .collect();
            print_json(&all)
        }
    }
}

pub fn print_clc(engine: &ArtifactEngine, module: Option<&str>) -> Result<()> {
    match module {
        Some(module) => print_json(&engine.clc(module)?),
        None => {
            let all = selected_modules(engine, None)
                .iter()
                .map(|name| engine.clc(name))
                .collect::<Result<Vec<_>>>()?;
            print_json(&all)
        }
    }
}

/// Print diagnostics for the whole graph, or one module. Returns false if anything failed.
pub fn run_check(engine: &ArtifactEngine, module: Option<&str>) -> Result<bool> {
    let mut report = engine.check();
    if let Some(module) = module {
        engine.outcome(module)?;
        report.modules.retain(|m| m.module == module);
        let clean = report.modules.iter().all(|m| m.errors.is_empty() && m.clc_error.is_none());
        print_json(&report.modules)?;
        return Ok(clean);
    }
    print_json(&report)?;
    Ok(report.is_clean())
}
