//! Module parser collaborator
//!
//! Thin wrapper around swc's ECMAScript parser. The rest of the pipeline
//! only consumes the parsed [`Module`] through typed pattern matches and the
//! code renderer, so everything swc-specific stays behind this seam.

use std::path::Path;

use swc_common::{FileName, SourceMap, sync::Lrc};
use swc_ecma_ast::Module;
use swc_ecma_parser::{Parser, StringInput, Syntax};

use crate::error::{BundleError, Result};

/// A parsed module together with the source map its spans point into.
///
/// The source map must stay alive for code rendering, which resolves
/// statement spans back to source text positions.
pub struct ParsedModule {
    pub module: Module,
    pub source_map: Lrc<SourceMap>,
}

impl std::fmt::Debug for ParsedModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParsedModule")
            .field("module", &self.module)
            .finish_non_exhaustive()
    }
}

/// Parse one file's text as an ES module.
///
/// Any parser diagnostic is fatal, including errors the parser recovered
/// from to keep lexing: a module we could not parse cleanly must not reach
/// the bundle.
pub fn parse(text: String, path: &Path) -> Result<ParsedModule> {
    let source_map: Lrc<SourceMap> = Lrc::default();
    let file = source_map.new_source_file(FileName::Real(path.to_path_buf()), text);

    let mut parser = Parser::new(Syntax::default(), StringInput::from(&*file), None);
    let module = parser.parse_module().map_err(|e| BundleError::Syntax {
        path: path.to_path_buf(),
        message: e.kind().msg().to_string(),
    })?;

    if let Some(error) = parser.take_errors().into_iter().next() {
        return Err(BundleError::Syntax {
            path: path.to_path_buf(),
            message: error.kind().msg().to_string(),
        });
    }

    Ok(ParsedModule { module, source_map })
}
