//! Graph construction: breadth-first module discovery from an entry file
//!
//! The work list is processed front to back by index and never shrinks; once
//! every entry has been processed the list *is* the finished graph, with the
//! entry asset at position 0. Specifier resolution is a literal path join
//! against the importer's directory: no extension inference, no
//! package-style lookup, no normalization beyond stripping leading `./`
//! segments.
//!
//! Two build modes exist. The default deduplicating mode keeps a
//! resolved-path memo so each file is extracted once and cycles terminate.
//! Compatibility mode reproduces the reference behavior of re-extracting a
//! file for every import under a fresh identity; there a cycle would grow
//! the work list without bound, so the builder walks the importer's ancestor
//! chain and fails with [`BundleError::CycleDetected`] instead.

use std::path::{Path, PathBuf};

use log::debug;

use crate::{
    asset::{Asset, FxIndexMap, ModuleId},
    error::{BundleError, Result},
    extractor::AssetExtractor,
};

/// The ordered collection of all assets reachable from the entry
#[derive(Debug)]
pub struct ModuleGraph {
    assets: Vec<Asset>,
}

impl ModuleGraph {
    /// Assemble a graph from assets already in discovery order.
    ///
    /// The builder is the normal way to obtain a graph; this exists for
    /// callers that construct assets programmatically. Position 0 must be
    /// the entry asset.
    pub fn from_assets(assets: Vec<Asset>) -> Self {
        Self { assets }
    }

    /// The entry asset, always identity 0
    pub fn entry(&self) -> &Asset {
        &self.assets[0]
    }

    pub fn get(&self, id: ModuleId) -> Option<&Asset> {
        self.assets.get(id.as_u32() as usize)
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

/// Builds a [`ModuleGraph`] by breadth-first traversal from an entry path
#[derive(Debug)]
pub struct GraphBuilder {
    extractor: AssetExtractor,
    dedupe: bool,
}

impl GraphBuilder {
    /// `dedupe` selects the deduplicating mode; `false` reproduces the
    /// reference duplicate-extraction behavior with cycle detection.
    pub fn new(dedupe: bool) -> Self {
        Self {
            extractor: AssetExtractor::new(),
            dedupe,
        }
    }

    /// Build the graph rooted at `entry`.
    ///
    /// Any extraction failure aborts the whole build; no partial graph is
    /// returned.
    pub fn build(mut self, entry: &Path) -> Result<ModuleGraph> {
        let mut assets = vec![self.extractor.extract(entry)?];
        // Importer link per asset, for ancestor-chain cycle checks in
        // compatibility mode.
        let mut parents: Vec<Option<usize>> = vec![None];
        let mut memo: FxIndexMap<PathBuf, ModuleId> = FxIndexMap::default();
        memo.insert(entry.to_path_buf(), ModuleId::ENTRY);

        let mut index = 0;
        while index < assets.len() {
            let directory = assets[index]
                .source_path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default();
            let specifiers = assets[index].dependency_specifiers.clone();

            for specifier in specifiers {
                let target = join_specifier(&directory, &specifier);

                if self.dedupe {
                    if let Some(&existing) = memo.get(&target) {
                        debug!(
                            "reusing module {existing} for '{specifier}' ({})",
                            target.display()
                        );
                        assets[index].dependency_map.insert(specifier, existing);
                        continue;
                    }
                } else if on_ancestor_chain(&assets, &parents, index, &target) {
                    return Err(BundleError::CycleDetected { path: target });
                }

                let child = self.extractor.extract(&target)?;
                let child_id = child.id;
                if self.dedupe {
                    memo.insert(target, child_id);
                }
                assets[index].dependency_map.insert(specifier, child_id);
                parents.push(Some(index));
                assets.push(child);
            }

            index += 1;
        }

        debug!("graph complete: {} modules", assets.len());
        Ok(ModuleGraph { assets })
    }
}

/// True when `target` already occurs on the chain of importers leading to
/// `index`, entry included. A self-import counts as a cycle too.
fn on_ancestor_chain(
    assets: &[Asset],
    parents: &[Option<usize>],
    mut index: usize,
    target: &Path,
) -> bool {
    loop {
        if assets[index].source_path == target {
            return true;
        }
        match parents[index] {
            Some(parent) => index = parent,
            None => return false,
        }
    }
}

/// Literal join of an importer's directory and a specifier.
///
/// Leading `./` segments are stripped so that "a/b" + "./c.js" yields
/// exactly "a/b/c.js"; nothing else is normalized. `..` segments are left
/// for the operating system to resolve at read time.
pub fn join_specifier(directory: &Path, specifier: &str) -> PathBuf {
    let mut rest = specifier;
    while let Some(stripped) = rest.strip_prefix("./") {
        rest = stripped;
    }
    directory.join(rest)
}
