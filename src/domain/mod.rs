pub mod artifact;
pub mod builder;
pub mod classpath;
pub mod clc;
pub mod declaration;
pub mod depset;
pub mod edge;
pub mod error;
pub mod evaluator;
pub mod graph;
pub mod layout;
pub mod node;
pub mod ports;
pub mod proguard;
pub mod sdk;
