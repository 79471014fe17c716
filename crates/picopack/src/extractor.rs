//! Asset extraction: one file path in, one [`Asset`] out
//!
//! Extraction reads the file, parses it, collects the literal import
//! specifiers in encounter order (duplicates included), lowers the module to
//! the handler dialect, and stamps the asset with the next identity from the
//! allocator. The returned asset carries an empty dependency map; the graph
//! builder fills it in as children resolve.

use std::{fs, path::Path};

use log::debug;
use swc_ecma_ast::{Module, ModuleDecl, ModuleItem};

use crate::{
    asset::{Asset, FxIndexMap, IdentityAllocator},
    error::{BundleError, Result},
    lowering, parser,
};

/// Produces assets from file paths, one extraction per call
#[derive(Debug, Default)]
pub struct AssetExtractor {
    allocator: IdentityAllocator,
}

impl AssetExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract the asset for `path`.
    ///
    /// Side effects: one filesystem read, one identity drawn from the
    /// run-scoped allocator. All failures are fatal to the build.
    pub fn extract(&mut self, path: &Path) -> Result<Asset> {
        let text = fs::read_to_string(path).map_err(|source| BundleError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let parsed = parser::parse(text, path)?;
        let dependency_specifiers = collect_import_specifiers(&parsed.module);
        let transformed_code = lowering::lower(&parsed, path)?;

        let id = self.allocator.allocate();
        debug!(
            "extracted {} as module {id} ({} imports)",
            path.display(),
            dependency_specifiers.len()
        );

        Ok(Asset {
            id,
            source_path: path.to_path_buf(),
            dependency_specifiers,
            transformed_code,
            dependency_map: FxIndexMap::default(),
        })
    }
}

/// Collect import source specifiers in encounter order, duplicates preserved
fn collect_import_specifiers(module: &Module) -> Vec<String> {
    module
        .body
        .iter()
        .filter_map(|item| match item {
            ModuleItem::ModuleDecl(ModuleDecl::Import(import)) => {
                Some(import.src.value.to_string())
            }
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::asset::ModuleId;

    #[test]
    fn specifiers_keep_encounter_order_and_duplicates() {
        let parsed = parser::parse(
            concat!(
                "import { a } from \"./a.js\";\n",
                "import \"./b.js\";\n",
                "import { a2 } from \"./a.js\";\n",
            )
            .to_owned(),
            &PathBuf::from("test.js"),
        )
        .unwrap();

        let specifiers = collect_import_specifiers(&parsed.module);
        assert_eq!(specifiers, vec!["./a.js", "./b.js", "./a.js"]);
    }

    #[test]
    fn extraction_reports_missing_file_as_io_error() {
        let mut extractor = AssetExtractor::new();
        let err = extractor
            .extract(&PathBuf::from("definitely/not/here.js"))
            .unwrap_err();
        assert!(matches!(err, BundleError::Io { .. }));
    }

    #[test]
    fn extraction_assigns_sequential_identities() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.js");
        let second = dir.path().join("second.js");
        std::fs::write(&first, "const a = 1;\n").unwrap();
        std::fs::write(&second, "const b = 2;\n").unwrap();

        let mut extractor = AssetExtractor::new();
        assert_eq!(extractor.extract(&first).unwrap().id, ModuleId::ENTRY);
        assert_eq!(extractor.extract(&second).unwrap().id, ModuleId::new(1));
    }
}
