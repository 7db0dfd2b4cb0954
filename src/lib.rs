//! classpath-graph: dependency edge classification and per-module classpath,
//! keep-rule and class loader context aggregation for Java module graphs.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
