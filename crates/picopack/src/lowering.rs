//! Lowering of ES module syntax to the handler dialect
//!
//! Handlers execute inside `function(require, module, exports) { ... }`, so
//! import declarations become `require` calls and export declarations become
//! assignments onto `exports`. Every other statement is rendered verbatim
//! through the code generator. The walk is a typed `match` over the
//! statement enumeration; there is no callback-keyed dispatch.
//!
//! Constructs that cannot be expressed in the handler dialect without a
//! second, unregistered module lookup (`export ... from`, `export *`) fail
//! with a transform error, as do destructuring patterns in `export` position.

use std::path::Path;

use log::trace;
use swc_common::{SourceMap, sync::Lrc};
use swc_ecma_ast::{
    Decl, DefaultDecl, ExportSpecifier, Expr, ImportDecl, ImportSpecifier, ModuleDecl,
    ModuleExportName, ModuleItem, NamedExport, Pat,
};
use swc_ecma_codegen::{Config as CodegenConfig, Emitter, Node, text_writer::JsWriter};

use crate::{
    error::{BundleError, Result},
    parser::ParsedModule,
};

/// Lower a parsed module to a handler-dialect code body.
///
/// Statement order is preserved exactly; one import declaration lowers to
/// one `require` call regardless of how many bindings it introduces.
pub fn lower(parsed: &ParsedModule, path: &Path) -> Result<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut import_index = 0usize;

    for item in &parsed.module.body {
        match item {
            ModuleItem::ModuleDecl(decl) => {
                trace!("lowering module declaration in {}", path.display());
                lower_module_decl(decl, import_index, &parsed.source_map, path, &mut lines)?;
                if matches!(decl, ModuleDecl::Import(_)) {
                    import_index += 1;
                }
            }
            ModuleItem::Stmt(stmt) => {
                lines.push(render(stmt, &parsed.source_map, path)?);
            }
        }
    }

    Ok(lines.join("\n"))
}

fn lower_module_decl(
    decl: &ModuleDecl,
    import_index: usize,
    source_map: &Lrc<SourceMap>,
    path: &Path,
    lines: &mut Vec<String>,
) -> Result<()> {
    match decl {
        ModuleDecl::Import(import) => {
            lower_import(import, import_index, lines);
            Ok(())
        }
        ModuleDecl::ExportDecl(export) => {
            lines.push(render(&export.decl, source_map, path)?);
            for name in exported_names(&export.decl, path)? {
                lines.push(export_assignment(&name, &name));
            }
            Ok(())
        }
        ModuleDecl::ExportDefaultDecl(export) => {
            let expr = match &export.decl {
                DefaultDecl::Fn(fn_expr) => Expr::Fn(fn_expr.clone()),
                DefaultDecl::Class(class_expr) => Expr::Class(class_expr.clone()),
                DefaultDecl::TsInterfaceDecl(_) => {
                    return Err(unsupported(path, "TypeScript interface in export position"));
                }
            };
            let rendered = render(&expr, source_map, path)?;
            lines.push(format!("exports.default = {rendered};"));
            Ok(())
        }
        ModuleDecl::ExportDefaultExpr(export) => {
            let rendered = render(&*export.expr, source_map, path)?;
            lines.push(format!("exports.default = {rendered};"));
            Ok(())
        }
        ModuleDecl::ExportNamed(export) => lower_named_export(export, path, lines),
        ModuleDecl::ExportAll(_) => Err(unsupported(path, "`export *` re-exports")),
        _ => Err(unsupported(path, "TypeScript module declarations")),
    }
}

/// Lower one import declaration to exactly one `require` call.
///
/// Mixing a default binding with named or namespace bindings needs an
/// intermediate variable so the module is still required only once.
fn lower_import(import: &ImportDecl, import_index: usize, lines: &mut Vec<String>) {
    let specifier = js_string(&import.src.value);

    let mut named: Vec<(String, String)> = Vec::new();
    let mut default_local: Option<String> = None;
    let mut namespace_local: Option<String> = None;

    for item in &import.specifiers {
        match item {
            ImportSpecifier::Named(n) => {
                let local = n.local.sym.to_string();
                let imported = match &n.imported {
                    Some(ModuleExportName::Ident(ident)) => ident.sym.to_string(),
                    Some(ModuleExportName::Str(s)) => s.value.to_string(),
                    None => local.clone(),
                };
                named.push((imported, local));
            }
            ImportSpecifier::Default(d) => default_local = Some(d.local.sym.to_string()),
            ImportSpecifier::Namespace(n) => namespace_local = Some(n.local.sym.to_string()),
        }
    }

    let binding_kinds = usize::from(!named.is_empty())
        + usize::from(default_local.is_some())
        + usize::from(namespace_local.is_some());

    match binding_kinds {
        0 => lines.push(format!("require({specifier});")),
        1 => {
            if let Some(local) = namespace_local {
                lines.push(format!("const {local} = require({specifier});"));
            } else if let Some(local) = default_local {
                lines.push(format!("const {local} = require({specifier}).default;"));
            } else {
                lines.push(format!(
                    "const {} = require({specifier});",
                    destructure_pattern(&named)
                ));
            }
        }
        _ => {
            let temp = format!("__module_{import_index}");
            lines.push(format!("const {temp} = require({specifier});"));
            if let Some(local) = default_local {
                lines.push(format!("const {local} = {temp}.default;"));
            }
            if let Some(local) = namespace_local {
                lines.push(format!("const {local} = {temp};"));
            }
            if !named.is_empty() {
                lines.push(format!("const {} = {temp};", destructure_pattern(&named)));
            }
        }
    }
}

fn lower_named_export(export: &NamedExport, path: &Path, lines: &mut Vec<String>) -> Result<()> {
    if export.src.is_some() {
        return Err(unsupported(path, "re-exporting from another module"));
    }
    for item in &export.specifiers {
        match item {
            ExportSpecifier::Named(named) => {
                let orig = match &named.orig {
                    ModuleExportName::Ident(ident) => ident.sym.to_string(),
                    ModuleExportName::Str(_) => {
                        return Err(unsupported(path, "string-named local exports"));
                    }
                };
                let exported = match &named.exported {
                    Some(ModuleExportName::Ident(ident)) => ident.sym.to_string(),
                    Some(ModuleExportName::Str(s)) => s.value.to_string(),
                    None => orig.clone(),
                };
                lines.push(export_assignment(&exported, &orig));
            }
            // Namespace and default specifiers only occur together with a
            // source clause, which is rejected above.
            ExportSpecifier::Namespace(_) | ExportSpecifier::Default(_) => {
                return Err(unsupported(path, "re-exporting from another module"));
            }
        }
    }
    Ok(())
}

/// Names a declaration binds at module scope, for `exports` assignments
fn exported_names(decl: &Decl, path: &Path) -> Result<Vec<String>> {
    match decl {
        Decl::Fn(f) => Ok(vec![f.ident.sym.to_string()]),
        Decl::Class(c) => Ok(vec![c.ident.sym.to_string()]),
        Decl::Var(var) => {
            let mut names = Vec::with_capacity(var.decls.len());
            for declarator in &var.decls {
                match &declarator.name {
                    Pat::Ident(binding) => names.push(binding.id.sym.to_string()),
                    _ => {
                        return Err(unsupported(path, "destructuring patterns in export position"));
                    }
                }
            }
            Ok(names)
        }
        _ => Err(unsupported(path, "this declaration kind in export position")),
    }
}

/// Render one AST node back to source text through the code generator
fn render<N: Node>(node: &N, source_map: &Lrc<SourceMap>, path: &Path) -> Result<String> {
    let mut buf = Vec::new();
    {
        let mut emitter = Emitter {
            cfg: CodegenConfig::default(),
            cm: source_map.clone(),
            comments: None,
            wr: JsWriter::new(source_map.clone(), "\n", &mut buf, None),
        };
        node.emit_with(&mut emitter)
            .map_err(|e| BundleError::Transform {
                path: path.to_path_buf(),
                message: format!("code rendering failed: {e}"),
            })?;
    }
    String::from_utf8(buf).map_err(|e| BundleError::Transform {
        path: path.to_path_buf(),
        message: format!("code rendering produced invalid UTF-8: {e}"),
    })
}

/// `{ a, b: c, "x y": z }` destructuring pattern for named imports
fn destructure_pattern(named: &[(String, String)]) -> String {
    let fields: Vec<String> = named
        .iter()
        .map(|(imported, local)| {
            if imported == local {
                local.clone()
            } else if is_js_identifier(imported) {
                format!("{imported}: {local}")
            } else {
                format!("{}: {local}", js_string(imported))
            }
        })
        .collect();
    format!("{{ {} }}", fields.join(", "))
}

fn export_assignment(exported: &str, local: &str) -> String {
    if is_js_identifier(exported) {
        format!("exports.{exported} = {local};")
    } else {
        format!("exports[{}] = {local};", js_string(exported))
    }
}

/// JS string literal via JSON serialization, never ad hoc escaping
fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_owned()).to_string()
}

fn is_js_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn unsupported(path: &Path, what: &str) -> BundleError {
    BundleError::Transform {
        path: path.to_path_buf(),
        message: format!("{what} are not supported by the handler dialect"),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::parser;

    fn lower_source(source: &str) -> Result<String> {
        let path = PathBuf::from("test.js");
        let parsed = parser::parse(source.to_owned(), &path)?;
        lower(&parsed, &path)
    }

    #[test]
    fn named_import_becomes_destructured_require() {
        let code = lower_source("import { a, b as c } from \"./dep.js\";").unwrap();
        assert_eq!(code, "const { a, b: c } = require(\"./dep.js\");");
    }

    #[test]
    fn default_import_reads_default_member() {
        let code = lower_source("import d from \"./dep.js\";").unwrap();
        assert_eq!(code, "const d = require(\"./dep.js\").default;");
    }

    #[test]
    fn namespace_import_binds_whole_exports_object() {
        let code = lower_source("import * as ns from \"./dep.js\";").unwrap();
        assert_eq!(code, "const ns = require(\"./dep.js\");");
    }

    #[test]
    fn bare_import_keeps_side_effect_require() {
        let code = lower_source("import \"./side.js\";").unwrap();
        assert_eq!(code, "require(\"./side.js\");");
    }

    #[test]
    fn mixed_import_requires_only_once() {
        let code = lower_source("import d, { a } from \"./dep.js\";").unwrap();
        let lines: Vec<&str> = code.lines().collect();
        assert_eq!(
            lines,
            vec![
                "const __module_0 = require(\"./dep.js\");",
                "const d = __module_0.default;",
                "const { a } = __module_0;",
            ]
        );
        assert_eq!(code.matches("require(").count(), 1);
    }

    #[test]
    fn export_declaration_assigns_onto_exports() {
        let code = lower_source("export const x = 1;").unwrap();
        assert!(code.contains("exports.x = x;"), "got: {code}");
    }

    #[test]
    fn export_default_expression_assigns_default() {
        let code = lower_source("export default 42;").unwrap();
        assert_eq!(code, "exports.default = 42;");
    }

    #[test]
    fn named_export_list_assigns_each_binding() {
        let code = lower_source("const x = 1;\nexport { x as y };").unwrap();
        assert!(code.contains("exports.y = x;"), "got: {code}");
    }

    #[test]
    fn reexport_from_source_is_rejected() {
        let err = lower_source("export { x } from \"./dep.js\";").unwrap_err();
        assert!(matches!(err, BundleError::Transform { .. }));
    }

    #[test]
    fn export_star_is_rejected() {
        let err = lower_source("export * from \"./dep.js\";").unwrap_err();
        assert!(matches!(err, BundleError::Transform { .. }));
    }

    #[test]
    fn destructuring_export_is_rejected() {
        let err = lower_source("export const { x } = obj;").unwrap_err();
        assert!(matches!(err, BundleError::Transform { .. }));
    }

    #[test]
    fn statement_order_is_preserved() {
        let code = lower_source(
            "import { a } from \"./a.js\";\nconst x = a;\nimport { b } from \"./b.js\";",
        )
        .unwrap();
        let require_a = code.find("require(\"./a.js\")").unwrap();
        let body = code.find("x").unwrap();
        let require_b = code.find("require(\"./b.js\")").unwrap();
        assert!(require_a < body && body < require_b);
    }
}
