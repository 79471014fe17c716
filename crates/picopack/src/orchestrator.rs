//! Pipeline orchestration: build the graph, emit the bundle, write the file
//!
//! The orchestrator is the only place that writes to the filesystem. The
//! bundle is rendered entirely in memory first, so a failure at any earlier
//! stage never leaves a partial artifact behind.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use log::{debug, info};

use crate::{
    config::Config,
    emitter::{self, LoaderMode},
    graph::GraphBuilder,
};

/// Runs the whole pipeline for one entry path
#[derive(Debug)]
pub struct BundleOrchestrator {
    config: Config,
}

impl BundleOrchestrator {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Bundle `entry` and write the artifact to the configured output path.
    pub fn run(&self, entry: &Path) -> Result<()> {
        debug!(
            "bundling {} (dedupe: {})",
            entry.display(),
            self.config.dedupe
        );

        let graph = GraphBuilder::new(self.config.dedupe)
            .build(entry)
            .with_context(|| format!("failed to build module graph from {}", entry.display()))?;
        info!("discovered {} modules", graph.len());

        let mode = if self.config.dedupe {
            LoaderMode::Memoizing
        } else {
            LoaderMode::Reference
        };
        let bundle = emitter::emit(&graph, mode);

        fs::write(&self.config.output, &bundle)
            .with_context(|| format!("failed to write {}", self.config.output.display()))?;
        info!("wrote {}", self.config.output.display());
        Ok(())
    }
}
