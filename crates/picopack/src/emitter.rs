//! Bundle emission: serialize a finished graph into one executable artifact
//!
//! The graph is first shaped into an explicit [`ModuleTable`], then the
//! whole artifact is rendered through a single formatter. Dependency maps
//! are emitted as JSON object literals, so the runtime reconstructs them as
//! data without re-parsing anything, and specifier strings are escaped by
//! the JSON serializer rather than by hand.
//!
//! Two loader shapes exist, matching the two build modes:
//!
//! - [`LoaderMode::Reference`] renders the reference loader verbatim. It is
//!   the cross-process compatibility surface: handlers are *not* memoized,
//!   so a second `require` of the same identity re-executes its handler.
//!   That divergence from conventional loader semantics is deliberate and
//!   documented, not a defect to patch in isolation.
//! - [`LoaderMode::Memoizing`] pairs with the deduplicating graph builder:
//!   one cache slot per identity, each handler executes at most once, and a
//!   table miss throws an explicit `ModuleNotFoundError` (unreachable under
//!   the graph invariants; seeing it means the bundler itself is broken).

use log::info;

use crate::{
    asset::{FxIndexMap, ModuleId},
    graph::ModuleGraph,
};

/// Shape of the runtime loader wrapped around the module table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderMode {
    /// Reference loader shape: no handler memoization, no table guard
    Reference,
    /// Hardened loader: per-identity module cache and an explicit
    /// `ModuleNotFoundError` on table misses
    Memoizing,
}

/// One table record: identity, wrapped handler code, dependency map
#[derive(Debug)]
struct ModuleRecord<'a> {
    id: ModuleId,
    code: &'a str,
    dependency_map: &'a FxIndexMap<String, ModuleId>,
}

/// Explicit intermediate form of the bundle, rendered by one formatter
#[derive(Debug)]
struct ModuleTable<'a> {
    records: Vec<ModuleRecord<'a>>,
}

impl<'a> ModuleTable<'a> {
    fn from_graph(graph: &'a ModuleGraph) -> Self {
        let records = graph
            .assets()
            .iter()
            .map(|asset| ModuleRecord {
                id: asset.id,
                code: &asset.transformed_code,
                dependency_map: &asset.dependency_map,
            })
            .collect();
        Self { records }
    }

    fn render(&self, mode: LoaderMode) -> String {
        let mut out = String::new();
        out.push_str("(function(modules) {\n");
        match mode {
            LoaderMode::Reference => out.push_str(REFERENCE_LOADER),
            LoaderMode::Memoizing => out.push_str(MEMOIZING_LOADER),
        }
        out.push_str("  require(0);\n");
        out.push_str("})({\n");
        for record in &self.records {
            out.push_str(&format!("  {}: {{\n", record.id));
            out.push_str("    handler: function(require, module, exports) {\n");
            out.push_str(record.code);
            if !record.code.ends_with('\n') {
                out.push('\n');
            }
            out.push_str("    },\n");
            out.push_str(&format!(
                "    dependencyMap: {},\n",
                dependency_map_literal(record.dependency_map)
            ));
            out.push_str("  },\n");
        }
        out.push_str("})\n");
        out
    }
}

const REFERENCE_LOADER: &str = "  function require(id) {
    const { handler, dependencyMap } = modules[id];
    function mappingRequire(path) {
      return require(dependencyMap[path]);
    }
    const module = { exports: {} };
    handler(mappingRequire, module, module.exports);
    return module.exports;
  }
";

const MEMOIZING_LOADER: &str = "  const cache = {};
  function require(id) {
    if (!Object.prototype.hasOwnProperty.call(modules, id)) {
      throw new Error(\"ModuleNotFoundError: \" + id);
    }
    if (cache[id]) {
      return cache[id].exports;
    }
    const { handler, dependencyMap } = modules[id];
    function mappingRequire(path) {
      return require(dependencyMap[path]);
    }
    const module = { exports: {} };
    cache[id] = module;
    handler(mappingRequire, module, module.exports);
    return module.exports;
  }
";

/// Serialize a dependency map as a JSON object literal (data, not code)
fn dependency_map_literal(map: &FxIndexMap<String, ModuleId>) -> String {
    let mut object = serde_json::Map::with_capacity(map.len());
    for (specifier, id) in map {
        object.insert(
            specifier.clone(),
            serde_json::Value::from(id.as_u32()),
        );
    }
    serde_json::Value::Object(object).to_string()
}

/// Serialize the finished graph into one self-executing artifact
pub fn emit(graph: &ModuleGraph, mode: LoaderMode) -> String {
    let bundle = ModuleTable::from_graph(graph).render(mode);
    info!(
        "emitted bundle: {} modules, {} bytes",
        graph.len(),
        bundle.len()
    );
    bundle
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::asset::Asset;

    fn asset(id: u32, code: &str, deps: &[(&str, u32)]) -> Asset {
        let mut dependency_map = FxIndexMap::default();
        for (specifier, dep) in deps {
            dependency_map.insert((*specifier).to_owned(), ModuleId::new(*dep));
        }
        Asset {
            id: ModuleId::new(id),
            source_path: PathBuf::from(format!("module_{id}.js")),
            dependency_specifiers: deps.iter().map(|(s, _)| (*s).to_owned()).collect(),
            transformed_code: code.to_owned(),
            dependency_map,
        }
    }

    fn two_module_graph() -> ModuleGraph {
        ModuleGraph::from_assets(vec![
            asset(
                0,
                "const { a } = require(\"./a.js\");\nconsole.log(a);",
                &[("./a.js", 1)],
            ),
            asset(1, "const a = 1;\nexports.a = a;", &[]),
        ])
    }

    #[test]
    fn reference_bundle_shape() {
        let bundle = emit(&two_module_graph(), LoaderMode::Reference);
        insta::assert_snapshot!(bundle, @r###"
(function(modules) {
  function require(id) {
    const { handler, dependencyMap } = modules[id];
    function mappingRequire(path) {
      return require(dependencyMap[path]);
    }
    const module = { exports: {} };
    handler(mappingRequire, module, module.exports);
    return module.exports;
  }
  require(0);
})({
  0: {
    handler: function(require, module, exports) {
const { a } = require("./a.js");
console.log(a);
    },
    dependencyMap: {"./a.js":1},
  },
  1: {
    handler: function(require, module, exports) {
const a = 1;
exports.a = a;
    },
    dependencyMap: {},
  },
})
"###);
    }

    #[test]
    fn reference_loader_does_not_memoize() {
        let bundle = emit(&two_module_graph(), LoaderMode::Reference);
        assert!(!bundle.contains("cache"));
        assert!(!bundle.contains("ModuleNotFoundError"));
    }

    #[test]
    fn memoizing_loader_caches_and_guards_lookups() {
        let bundle = emit(&two_module_graph(), LoaderMode::Memoizing);
        assert!(bundle.contains("const cache = {};"));
        assert!(bundle.contains("cache[id] = module;"));
        assert!(bundle.contains("ModuleNotFoundError"));
        assert!(bundle.contains("require(0);"));
    }

    #[test]
    fn dependency_map_is_literal_json_data() {
        let mut map = FxIndexMap::default();
        map.insert("./a.js".to_owned(), ModuleId::new(1));
        map.insert("./b's \"odd\" name.js".to_owned(), ModuleId::new(2));
        let literal = dependency_map_literal(&map);
        assert_eq!(
            literal,
            "{\"./a.js\":1,\"./b's \\\"odd\\\" name.js\":2}"
        );
    }

    #[test]
    fn empty_dependency_map_renders_as_empty_object() {
        assert_eq!(dependency_map_literal(&FxIndexMap::default()), "{}");
    }
}
