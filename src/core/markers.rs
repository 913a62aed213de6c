//! Banned-marker detection.
//!
//! Placeholder markers (`TODO`, `FIXME`, ...) are forbidden in shipped source.
//! Matching is whole-word and case-sensitive, so `TODOS` or `mastodon` pass.

use crate::core::config::MarkersConfig;
use crate::core::error::PolicyError;
use crate::core::rules::{RuleCode, Violation, sort_violations};
use rayon::prelude::*;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

/// Compiled marker matcher.
#[derive(Debug, Clone)]
pub struct MarkerScanner {
    pattern: Regex,
    allow_token: String,
}

impl MarkerScanner {
    pub fn new(config: &MarkersConfig) -> Result<Self, PolicyError> {
        let alternation = config
            .patterns
            .iter()
            .map(|p| regex::escape(p.trim()))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = Regex::new(&format!(r"\b(?:{})\b", alternation))
            .map_err(|e| PolicyError::InvalidConfig(format!("markers.patterns: {}", e)))?;
        Ok(Self {
            pattern,
            allow_token: config.allow_token.clone(),
        })
    }

    /// Violations for one file's content. `path` is only used for reporting.
    pub fn scan_text(&self, path: &Path, content: &str) -> Vec<Violation> {
        let mut violations = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            if !self.allow_token.is_empty() && line.contains(&self.allow_token) {
                continue;
            }
            if let Some(m) = self.pattern.find(line) {
                violations.push(
                    Violation::new(
                        RuleCode::BannedMarker,
                        path,
                        format!("banned marker '{}' found", m.as_str()),
                    )
                    .at_line(idx + 1),
                );
            }
        }
        violations
    }

    /// Scan `paths` (relative to `root`) in parallel. Files that are not
    /// valid UTF-8 are skipped.
    pub fn scan_files(&self, root: &Path, paths: &[PathBuf]) -> Vec<Violation> {
        let mut violations: Vec<Violation> = paths
            .par_iter()
            .flat_map_iter(|rel| match fs::read_to_string(root.join(rel)) {
                Ok(content) => self.scan_text(rel, &content),
                Err(e) => {
                    tracing::warn!(path = %rel.display(), error = %e, "skipping unreadable file");
                    Vec::new()
                }
            })
            .collect();
        sort_violations(&mut violations);
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanner() -> MarkerScanner {
        MarkerScanner::new(&MarkersConfig::default()).unwrap()
    }

    #[test]
    fn detects_whole_word_markers() {
        let text = "fn a() {}\n// TODO: wire this up\nlet x = 1; // FIXME\n";
        let vs = scanner().scan_text(Path::new("src/a.rs"), text);
        assert_eq!(vs.len(), 2);
        assert_eq!(vs[0].line, Some(2));
        assert_eq!(vs[0].message, "banned marker 'TODO' found");
        assert_eq!(vs[1].line, Some(3));
        assert_eq!(vs[1].message, "banned marker 'FIXME' found");
    }

    #[test]
    fn ignores_substrings_and_other_case() {
        let text = "let todos = TODOS;\nlet host = \"mastodon\";\n// todo lowercase\n";
        assert!(scanner().scan_text(Path::new("a.rs"), text).is_empty());
    }

    #[test]
    fn one_violation_per_line() {
        let vs = scanner().scan_text(Path::new("a.py"), "# TODO FIXME HACK\n");
        assert_eq!(vs.len(), 1);
    }

    #[test]
    fn allow_token_exempts_line() {
        let text = "# TODO is the name of this enum variant  orgpolicy: allow\n";
        assert!(scanner().scan_text(Path::new("a.py"), text).is_empty());
    }

    #[test]
    fn custom_patterns_are_escaped() {
        let config = MarkersConfig {
            patterns: vec!["NOCOMMIT".to_string(), "X.Y".to_string()],
            ..MarkersConfig::default()
        };
        let scanner = MarkerScanner::new(&config).unwrap();
        assert_eq!(scanner.scan_text(Path::new("a"), "XzY\n").len(), 0);
        assert_eq!(scanner.scan_text(Path::new("a"), "X.Y here\n").len(), 1);
        assert_eq!(scanner.scan_text(Path::new("a"), "NOCOMMIT\n").len(), 1);
    }

    #[test]
    fn parallel_scan_is_sorted_and_skips_binary() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::write(root.join("b.rs"), "// TODO\n").unwrap();
        fs::write(root.join("a.rs"), "ok\n// HACK\n").unwrap();
        fs::write(root.join("c.rs"), [0xff, 0xfe, b'T', b'O', b'D', b'O']).unwrap();

        let paths = vec![
            PathBuf::from("c.rs"),
            PathBuf::from("b.rs"),
            PathBuf::from("a.rs"),
        ];
        let vs = scanner().scan_files(root, &paths);
        let locations: Vec<String> = vs.iter().map(|v| v.location()).collect();
        assert_eq!(locations, vec!["a.rs:2", "b.rs:1"]);
    }
}
