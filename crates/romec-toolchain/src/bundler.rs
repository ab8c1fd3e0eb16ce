//! Whole-program bundling.
//!
//! Walks the module graph from an entry, compiles every local module with
//! the single-file transform and emits a CommonJS-style module registry:
//! dependencies first, entry last.
//!
//! Modules are wrapped as CommonJS factories verbatim, so ES module
//! `import`/`export` statements are reported rather than rewritten.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, instrument};

use romec_core::{
    Bundler, CompileResult, CompilerConfig, Diagnostic, SourceLocation, Suppression,
    TransportError, DEFAULT_EXTENSIONS,
};

use crate::resolver::{probe, Probe};
use crate::transform::transform_source;

pub const UNRESOLVED_IMPORT: &str = "bundler/unresolvedImport";
pub const UNSUPPORTED_MODULE_SYNTAX: &str = "bundler/unsupportedModuleSyntax";

const OPERATION: &str = "bundle";

/// A module reference found in source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRef {
    pub specifier: String,
    pub line: u32,
    pub column: u32,
}

impl ImportRef {
    /// `./x`, `../x` and absolute paths are bundled; anything else is external.
    pub fn is_local(&self) -> bool {
        self.specifier.starts_with("./")
            || self.specifier.starts_with("../")
            || self.specifier.starts_with('/')
    }
}

fn import_patterns() -> Result<&'static [Regex; 3], regex::Error> {
    static PATTERNS: OnceLock<Result<[Regex; 3], regex::Error>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| {
            Ok([
                Regex::new(
                    r#"(?m)(?:^|[^\w$.])import\s+(?:[\w$*{}\s,]+?\s+from\s+)?["']([^"'\n]+)["']"#,
                )?,
                Regex::new(concat!(
                    r#"(?m)(?:^|[^\w$.])export\s+(?:\*(?:\s+as\s+[\w$]+)?|\{[^}]*\})"#,
                    r#"\s+from\s+["']([^"'\n]+)["']"#,
                ))?,
                Regex::new(r#"(?:^|[^\w$.])require\s*\(\s*["']([^"'\n]+)["']\s*\)"#)?,
            ])
        })
        .as_ref()
        .map_err(Clone::clone)
}

/// Find every import/export-from/require specifier, in source order.
///
/// Expects comment-free text so commented-out imports are not picked up.
pub fn scan_imports(text: &str) -> Result<Vec<ImportRef>, regex::Error> {
    let mut found: Vec<(usize, String)> = Vec::new();
    for pattern in import_patterns()? {
        for caps in pattern.captures_iter(text) {
            if let Some(spec) = caps.get(1) {
                // point at the opening quote
                found.push((spec.start().saturating_sub(1), spec.as_str().to_string()));
            }
        }
    }
    found.sort_by_key(|(offset, _)| *offset);

    Ok(found
        .into_iter()
        .map(|(offset, specifier)| {
            let (line, column) = line_col(text, offset);
            ImportRef {
                specifier,
                line,
                column,
            }
        })
        .collect())
}

fn line_col(text: &str, offset: usize) -> (u32, u32) {
    let before = &text[..offset.min(text.len())];
    let line = before.matches('\n').count() as u32 + 1;
    let column = before
        .rsplit('\n')
        .next()
        .map(|l| l.chars().count())
        .unwrap_or(0) as u32
        + 1;
    (line, column)
}

#[derive(Debug)]
struct ModuleRecord {
    label: String,
    code: String,
    /// (specifier, module id), first occurrence only
    deps: Vec<(String, usize)>,
    diagnostics: Vec<Diagnostic>,
    suppressions: Vec<Suppression>,
}

/// Bundles a local module graph into one script.
#[derive(Debug, Clone)]
pub struct GraphBundler {
    extensions: Vec<String>,
}

impl Default for GraphBundler {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

impl GraphBundler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &CompilerConfig) -> Self {
        Self {
            extensions: config.extensions.clone(),
        }
    }

    async fn canonical(&self, path: &Path) -> Result<PathBuf, TransportError> {
        tokio::fs::canonicalize(path).await.map_err(|e| {
            TransportError::new(
                OPERATION,
                format!("failed to canonicalize {}: {}", path.display(), e),
            )
        })
    }

    async fn read_module(&self, path: &Path) -> Result<String, TransportError> {
        tokio::fs::read_to_string(path).await.map_err(|e| {
            TransportError::new(
                OPERATION,
                format!("failed to read {}: {}", path.display(), e),
            )
        })
    }
}

#[async_trait]
impl Bundler for GraphBundler {
    #[instrument(skip(self), fields(entry = %path.display()))]
    async fn compile(&self, path: &Path) -> Result<CompileResult, TransportError> {
        let root = path.parent().map(Path::to_path_buf).unwrap_or_default();

        let mut modules: Vec<ModuleRecord> = Vec::new();
        let mut ids: HashMap<PathBuf, usize> = HashMap::new();
        let mut queue: VecDeque<PathBuf> = VecDeque::new();
        ids.insert(path.to_path_buf(), 0);
        queue.push_back(path.to_path_buf());

        // ids are handed out in discovery order, so the FIFO queue visits
        // modules in id order and `modules[id]` lines up
        while let Some(current) = queue.pop_front() {
            let source = self.read_module(&current).await?;
            let label = label_for(&root, &current);
            let transformed = transform_source(&label, &source);
            let mut diagnostics = transformed.diagnostics;
            diagnostics.extend(transformed.module_syntax.into_iter().map(|at| {
                Diagnostic::new(
                    UNSUPPORTED_MODULE_SYNTAX,
                    "ES module syntax cannot be bundled; use require/module.exports",
                )
                .with_location(at)
            }));
            let mut deps: Vec<(String, usize)> = Vec::new();
            let mut seen: HashSet<String> = HashSet::new();
            let base = current.parent().map(Path::to_path_buf).unwrap_or_default();

            let imports = scan_imports(&transformed.stripped)
                .map_err(|e| TransportError::new(OPERATION, format!("import scanner: {e}")))?;
            for import in imports {
                if !import.is_local() || !seen.insert(import.specifier.clone()) {
                    continue;
                }
                let target = if import.specifier.starts_with('/') {
                    PathBuf::from(&import.specifier)
                } else {
                    base.join(&import.specifier)
                };

                match probe(&target, &self.extensions).await {
                    Probe::Found(found, _) => {
                        let found = self.canonical(&found).await?;
                        let id = match ids.get(&found) {
                            Some(id) => *id,
                            None => {
                                let id = ids.len();
                                ids.insert(found.clone(), id);
                                queue.push_back(found);
                                id
                            }
                        };
                        deps.push((import.specifier, id));
                    }
                    Probe::NotCompilable(_) | Probe::Missing => {
                        diagnostics.push(
                            Diagnostic::new(
                                UNRESOLVED_IMPORT,
                                format!(
                                    "cannot resolve import \"{}\" from {}",
                                    import.specifier, label
                                ),
                            )
                            .with_location(SourceLocation::new(
                                label.clone(),
                                import.line,
                                import.column,
                            )),
                        );
                    }
                }
            }

            debug!(module = %label, deps = deps.len(), "bundled module");
            modules.push(ModuleRecord {
                label,
                code: transformed.code,
                deps,
                diagnostics,
                suppressions: transformed.suppressions,
            });
        }

        let order = dependency_order(&modules);
        let mut result = CompileResult::default();
        for &id in &order {
            result.diagnostics.extend(modules[id].diagnostics.iter().cloned());
            result.suppressions.extend(modules[id].suppressions.iter().cloned());
        }

        if result.diagnostics.is_empty() {
            result.compiled_code = render_bundle(&modules, &order);
        }
        Ok(result)
    }
}

fn label_for(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

/// Post-order over the dependency edges from the entry (id 0).
/// Cycles are cut at the first revisit.
fn dependency_order(modules: &[ModuleRecord]) -> Vec<usize> {
    if modules.is_empty() {
        return Vec::new();
    }

    let mut order = Vec::with_capacity(modules.len());
    let mut visited = vec![false; modules.len()];
    let mut stack: Vec<(usize, usize)> = vec![(0, 0)];
    visited[0] = true;

    while let Some((id, next)) = stack.pop() {
        match modules[id].deps.get(next) {
            Some(&(_, dep)) => {
                stack.push((id, next + 1));
                if !visited[dep] {
                    visited[dep] = true;
                    stack.push((dep, 0));
                }
            }
            None => order.push(id),
        }
    }

    order
}

fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

const RUNTIME_PRELUDE: &str = "(function (modules, entry) {
  var cache = {};
  function load(id) {
    if (cache[id]) {
      return cache[id].exports;
    }
    var record = modules[id];
    var module = (cache[id] = { exports: {} });
    record.factory(module, module.exports, function (specifier) {
      var target = record.map[specifier];
      return target === undefined ? require(specifier) : load(target);
    });
    return module.exports;
  }
  load(entry);
})({
";

fn render_bundle(modules: &[ModuleRecord], order: &[usize]) -> String {
    let mut out = String::from(RUNTIME_PRELUDE);

    for &id in order {
        let module = &modules[id];
        let map = module
            .deps
            .iter()
            .map(|(spec, dep)| format!("{}: {}", js_string(spec), dep))
            .collect::<Vec<_>>()
            .join(", ");

        // writing into a String cannot fail
        let _ = write!(
            out,
            concat!(
                "  {id}: {{\n",
                "    path: {path},\n",
                "    map: {{{map}}},\n",
                "    factory: function (module, exports, require) {{\n",
                "{code}",
                "    }},\n",
                "  }},\n",
            ),
            id = id,
            path = js_string(&module.label),
            map = map,
            code = module.code,
        );
    }

    out.push_str("}, 0);\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(deps: &[(&str, usize)]) -> ModuleRecord {
        ModuleRecord {
            label: "m.js".to_string(),
            code: String::new(),
            deps: deps.iter().map(|(s, id)| (s.to_string(), *id)).collect(),
            diagnostics: Vec::new(),
            suppressions: Vec::new(),
        }
    }

    #[test]
    fn test_scan_imports_forms() {
        let text = concat!(
            "import a from './a';\n",
            "import { b, c } from \"../b\";\n",
            "import './side';\n",
            "export * from './d';\n",
            "export { e } from './e';\n",
            "const f = require('./f');\n",
            "import React from 'react';\n",
        );
        let specs: Vec<String> = scan_imports(text)
            .unwrap()
            .into_iter()
            .map(|i| i.specifier)
            .collect();
        assert_eq!(
            specs,
            vec!["./a", "../b", "./side", "./d", "./e", "./f", "react"]
        );
    }

    #[test]
    fn test_scan_imports_multiline_and_location() {
        let text = "const x = 1;\nimport {\n  a,\n  b,\n} from './ab';\n";
        let imports = scan_imports(text).unwrap();
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].specifier, "./ab");
        assert_eq!((imports[0].line, imports[0].column), (5, 8));
    }

    #[test]
    fn test_scan_imports_ignores_member_calls() {
        let text = "loader.require('./x');\nobj.import('./y');\n";
        assert!(scan_imports(text).unwrap().is_empty());
    }

    #[test]
    fn test_is_local() {
        let local = |s: &str| ImportRef {
            specifier: s.to_string(),
            line: 1,
            column: 1,
        }
        .is_local();
        assert!(local("./a"));
        assert!(local("../a"));
        assert!(local("/abs/a"));
        assert!(!local("react"));
        assert!(!local("@scope/pkg"));
    }

    #[test]
    fn test_dependency_order_puts_entry_last() {
        // 0 -> 1 -> 2, 0 -> 2
        let modules = vec![
            record(&[("./b", 1), ("./c", 2)]),
            record(&[("./c", 2)]),
            record(&[]),
        ];
        assert_eq!(dependency_order(&modules), vec![2, 1, 0]);
    }

    #[test]
    fn test_dependency_order_tolerates_cycles() {
        // 0 -> 1 -> 0
        let modules = vec![record(&[("./b", 1)]), record(&[("./a", 0)])];
        assert_eq!(dependency_order(&modules), vec![1, 0]);
    }

    #[test]
    fn test_render_bundle_shape() {
        let mut entry = record(&[("./b", 1)]);
        entry.label = "a.js".to_string();
        entry.code = "require('./b');\n".to_string();
        let mut dep = record(&[]);
        dep.label = "b.js".to_string();
        dep.code = "module.exports = 1;\n".to_string();
        let modules = vec![entry, dep];

        let out = render_bundle(&modules, &[1, 0]);
        assert!(out.starts_with("(function (modules, entry) {"));
        assert!(out.contains("map: {\"./b\": 1}"));
        assert!(out.find("path: \"b.js\"").unwrap() < out.find("path: \"a.js\"").unwrap());
        assert!(out.ends_with("}, 0);\n"));
    }
}
