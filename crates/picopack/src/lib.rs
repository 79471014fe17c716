//! picopack bundles a tree of JavaScript modules, discovered via static
//! import analysis, into one self-executing file with a private synchronous
//! module loader.

pub mod asset;
pub mod config;
pub mod emitter;
pub mod error;
pub mod extractor;
pub mod graph;
pub mod lowering;
pub mod orchestrator;
pub mod parser;
