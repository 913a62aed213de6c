//! Principles guide discovery and anchor parsing.
//!
//! The guide is the single Markdown document that enumerates the org-wide
//! coding principles. A repository is compliant only when it carries a
//! non-empty copy at one of the canonical locations and every anchor
//! `Principle 1:` .. `Principle 18:` is present.

use crate::core::error::PolicyError;
use regex::Regex;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

pub const PRINCIPLE_COUNT: u8 = 18;

static PRINCIPLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Principle (\d+):[ \t]*(.*)$").expect("static regex"));

/// A located, readable guide.
#[derive(Debug, Clone)]
pub struct GuideDoc {
    /// Path as the user should see it (relative to the target root unless
    /// given absolute).
    pub path: String,
    pub text: String,
    pub sha256: String,
}

/// One `Principle N: Title` anchor found in the guide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principle {
    pub number: u32,
    pub title: String,
    pub line: usize,
    /// True when the anchor opens a Markdown heading line.
    #[serde(skip)]
    pub heading: bool,
}

/// `Principle 1:` .. `Principle 18:`
pub fn principle_anchors() -> Vec<String> {
    (1..=PRINCIPLE_COUNT)
        .map(|i| format!("Principle {}:", i))
        .collect()
}

fn is_nonempty_file(path: &Path) -> bool {
    fs::metadata(path)
        .map(|m| m.is_file() && m.len() > 0)
        .unwrap_or(false)
}

/// Return the first qualifying guide path, or None.
///
/// A custom path replaces the candidate list entirely.
pub fn find_guide(root: &Path, custom: Option<&str>, candidates: &[String]) -> Option<String> {
    if let Some(custom) = custom {
        return is_nonempty_file(&root.join(custom)).then(|| custom.to_string());
    }
    candidates
        .iter()
        .find(|p| is_nonempty_file(&root.join(p.as_str())))
        .cloned()
}

/// Message for a failed lookup, listing everything that was checked.
pub fn not_found_message(custom: Option<&str>, candidates: &[String]) -> String {
    format!(
        "Guide not found. Checked: {}, {}; files must exist and be non-empty.",
        custom.unwrap_or("N/A (no --guide)"),
        candidates.join(", ")
    )
}

/// Read the guide as strict UTF-8.
pub fn read_guide(root: &Path, rel: &str) -> Result<GuideDoc, PolicyError> {
    fn read_err(rel: &str, e: impl std::fmt::Display) -> PolicyError {
        PolicyError::GuideError(format!("Failed to read guide '{}': {}", rel, e))
    }

    let bytes = fs::read(root.join(rel)).map_err(|e| read_err(rel, e))?;
    let sha256 = hex_digest(&bytes);
    let text = String::from_utf8(bytes).map_err(|e| read_err(rel, e))?;

    Ok(GuideDoc {
        path: rel.to_string(),
        text,
        sha256,
    })
}

pub fn hex_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Anchors absent from `text`, in canonical order.
pub fn missing_anchors(text: &str) -> Vec<String> {
    principle_anchors()
        .into_iter()
        .filter(|a| !text.contains(a.as_str()))
        .collect()
}

/// Every `Principle N:` occurrence, one per line, in document order.
pub fn extract_principles(text: &str) -> Vec<Principle> {
    text.lines()
        .enumerate()
        .filter_map(|(idx, line)| {
            let caps = PRINCIPLE_RE.captures(line)?;
            let number = caps[1].parse::<u32>().ok()?;
            let title = caps[2]
                .trim()
                .trim_end_matches(['*', '_', '#'])
                .trim()
                .to_string();
            Some(Principle {
                number,
                title,
                line: idx + 1,
                heading: line.trim_start().starts_with('#'),
            })
        })
        .collect()
}

/// The principle catalogue: heading anchors when the guide has any,
/// otherwise the first occurrence of each number.
pub fn list_principles(text: &str) -> Vec<Principle> {
    let all = extract_principles(text);
    let headings: Vec<Principle> = all.iter().filter(|p| p.heading).cloned().collect();
    if !headings.is_empty() {
        return headings;
    }

    let mut seen = rustc_hash::FxHashSet::default();
    all.into_iter().filter(|p| seen.insert(p.number)).collect()
}
