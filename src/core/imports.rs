//! Import-placement check.
//!
//! Imports belong in the module header, before the first top-level statement.
//! Only column-0 lines count as top level: function-local and conditional
//! imports are indented and never reported.

use crate::core::rules::{RuleCode, Violation, sort_violations};
use rayon::prelude::*;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static PY_IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:import[ \t]+\S|from[ \t]+\S+[ \t]+import\b)").expect("static regex")
});
static PY_DOCSTRING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^[rRuUbB]{0,2}("""|''')"#).expect("static regex"));
static JS_IMPORT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^import(?:[ \t]|\{|\*|'|")"#).expect("static regex"));
static JS_REEXPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^export[ \t]+(?:type[ \t]+)?(?:\*|\{)").expect("static regex")
});
static JS_DIRECTIVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^['"]use [\w ]+['"];?$"#).expect("static regex"));
static JS_FROM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bfrom[ \t]*['"]"#).expect("static regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Python,
    JavaScript,
}

impl Language {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "py" | "pyi" => Some(Self::Python),
            "js" | "ts" | "tsx" | "jsx" | "mjs" | "cjs" | "mts" | "cts" => Some(Self::JavaScript),
            _ => None,
        }
    }
}

fn misplaced(path: &Path, line: usize, header_end: usize) -> Violation {
    Violation::new(
        RuleCode::ImportPlacement,
        path,
        format!("import after first top-level statement (line {})", header_end),
    )
    .at_line(line)
}

fn is_indented(line: &str) -> bool {
    line.starts_with([' ', '\t'])
}

/// The triple-quote delimiter left open at the end of `line`. Quotes inside
/// ordinary string literals and comments do not count.
fn unclosed_triple_quote(line: &str) -> Option<&'static str> {
    let bytes = line.as_bytes();
    let mut triple: Option<&'static str> = None;
    let mut single: Option<u8> = None;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'\\' && (single.is_some() || triple.is_some()) {
            i += 2;
            continue;
        }
        if let Some(delim) = triple {
            if bytes[i..].starts_with(delim.as_bytes()) {
                triple = None;
                i += 3;
            } else {
                i += 1;
            }
            continue;
        }
        if let Some(quote) = single {
            if b == quote {
                single = None;
            }
            i += 1;
            continue;
        }
        match b {
            b'#' => break,
            b'"' | b'\'' => {
                let delim = if b == b'"' { "\"\"\"" } else { "'''" };
                if bytes[i..].starts_with(delim.as_bytes()) {
                    triple = Some(delim);
                    i += 3;
                } else {
                    single = Some(b);
                    i += 1;
                }
            }
            _ => i += 1,
        }
    }
    triple
}

/// Python: the header holds comments, one leading docstring and imports
/// (parenthesized imports may span lines).
pub fn check_python(path: &Path, content: &str) -> Vec<Violation> {
    let mut violations = Vec::new();
    let mut header_end: Option<usize> = None;
    let mut open_string: Option<&'static str> = None;
    let mut in_paren_import = false;
    let mut docstring_allowed = true;

    for (idx, line) in content.lines().enumerate() {
        let lineno = idx + 1;

        if let Some(delim) = open_string {
            if line.contains(delim) {
                open_string = None;
            }
            continue;
        }
        if in_paren_import {
            if line.contains(')') {
                in_paren_import = false;
            }
            continue;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        if header_end.is_none() {
            if PY_IMPORT_RE.is_match(line) {
                in_paren_import = line.contains('(') && !line.contains(')');
                continue;
            }
            if docstring_allowed && let Some(caps) = PY_DOCSTRING_RE.captures(line) {
                docstring_allowed = false;
                let delim = if &caps[1] == "\"\"\"" { "\"\"\"" } else { "'''" };
                let after_open = &line[caps.get(1).map_or(0, |m| m.end())..];
                if !after_open.contains(delim) {
                    open_string = Some(delim);
                }
                continue;
            }
            if is_indented(line) {
                continue;
            }
            header_end = Some(lineno);
        } else if !is_indented(line) && PY_IMPORT_RE.is_match(line) {
            violations.push(misplaced(path, lineno, header_end.unwrap_or(lineno)));
            in_paren_import = line.contains('(') && !line.contains(')');
            continue;
        }

        // Multi-line strings in the body may hold column-0 text that looks
        // like an import.
        if let Some(delim) = unclosed_triple_quote(line) {
            open_string = Some(delim);
        }
    }

    violations
}

/// JavaScript/TypeScript: the header holds comments, directives, a shebang,
/// imports and `export ... from` re-exports.
pub fn check_javascript(path: &Path, content: &str) -> Vec<Violation> {
    let mut violations = Vec::new();
    let mut header_end: Option<usize> = None;
    let mut in_block_comment = false;
    let mut in_import = false;
    let mut in_template = false;

    for (idx, line) in content.lines().enumerate() {
        let lineno = idx + 1;
        let trimmed = line.trim();

        if in_block_comment {
            if trimmed.contains("*/") {
                in_block_comment = false;
            }
            continue;
        }
        if in_template {
            if line.matches('`').count() % 2 == 1 {
                in_template = false;
            }
            continue;
        }
        if in_import {
            if JS_FROM_RE.is_match(line) || trimmed.ends_with(';') {
                in_import = false;
            }
            continue;
        }

        if trimmed.is_empty() || trimmed.starts_with("//") {
            continue;
        }
        if trimmed.starts_with("/*") {
            in_block_comment = !trimmed.contains("*/");
            continue;
        }

        let is_import = JS_IMPORT_RE.is_match(line);
        let import_open = |line: &str| {
            let t = line.trim();
            !(JS_FROM_RE.is_match(line)
                || t.ends_with(';')
                || t.ends_with('"')
                || t.ends_with('\'')
                || t.ends_with(')'))
        };

        if header_end.is_none() {
            if lineno == 1 && trimmed.starts_with("#!") {
                continue;
            }
            if JS_DIRECTIVE_RE.is_match(trimmed) {
                continue;
            }
            if is_import || JS_REEXPORT_RE.is_match(line) {
                in_import = import_open(line);
                continue;
            }
            header_end = Some(lineno);
        } else if is_import {
            violations.push(misplaced(path, lineno, header_end.unwrap_or(lineno)));
            in_import = import_open(line);
            continue;
        }

        if line.matches('`').count() % 2 == 1 {
            in_template = true;
        }
    }

    violations
}

pub fn check_text(language: Language, path: &Path, content: &str) -> Vec<Violation> {
    match language {
        Language::Python => check_python(path, content),
        Language::JavaScript => check_javascript(path, content),
    }
}

/// Check `paths` (relative to `root`) in parallel; unknown extensions and
/// non-UTF-8 files are skipped.
pub fn scan_files(root: &Path, paths: &[PathBuf]) -> Vec<Violation> {
    let mut violations: Vec<Violation> = paths
        .par_iter()
        .flat_map_iter(|rel| {
            let ext = rel.extension().and_then(|e| e.to_str()).unwrap_or("");
            let Some(language) = Language::from_extension(ext) else {
                return Vec::new();
            };
            match fs::read_to_string(root.join(rel)) {
                Ok(content) => check_text(language, rel, &content),
                Err(e) => {
                    tracing::warn!(path = %rel.display(), error = %e, "skipping unreadable file");
                    Vec::new()
                }
            }
        })
        .collect();
    sort_violations(&mut violations);
    violations
}
