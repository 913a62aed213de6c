//! Rule codes and violations shared by every gate.
//!
//! A violation is data, not an error: gates collect them and the reporter
//! decides the exit code.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Stable identifiers for every mechanical rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleCode {
    GuideMissing,
    GuideAnchorMissing,
    ManifestMissing,
    ManifestSchema,
    PrincipleNotCompliant,
    BannedMarker,
    ImportPlacement,
    StructureSectionOrder,
    StructureHeaderLevel,
    StructurePrincipleOrder,
    StructureCloserMissing,
}

impl RuleCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GuideMissing => "GUIDE_MISSING",
            Self::GuideAnchorMissing => "GUIDE_ANCHOR_MISSING",
            Self::ManifestMissing => "MANIFEST_MISSING",
            Self::ManifestSchema => "MANIFEST_SCHEMA",
            Self::PrincipleNotCompliant => "PRINCIPLE_NOT_COMPLIANT",
            Self::BannedMarker => "BANNED_MARKER",
            Self::ImportPlacement => "IMPORT_PLACEMENT",
            Self::StructureSectionOrder => "STRUCTURE_SECTION_ORDER",
            Self::StructureHeaderLevel => "STRUCTURE_HEADER_LEVEL",
            Self::StructurePrincipleOrder => "STRUCTURE_PRINCIPLE_ORDER",
            Self::StructureCloserMissing => "STRUCTURE_CLOSER_MISSING",
        }
    }
}

impl std::fmt::Display for RuleCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Individual violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub rule: RuleCode,
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub message: String,
}

impl Violation {
    pub fn new(rule: RuleCode, path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            rule,
            path: path.into(),
            line: None,
            message: message.into(),
        }
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// `path:line` for terminal output.
    pub fn location(&self) -> String {
        match self.line {
            Some(line) => format!("{}:{}", self.path.display(), line),
            None => self.path.display().to_string(),
        }
    }
}

/// Sort violations by path, then line, then rule so scanner output is stable
/// regardless of the order worker threads finished in.
pub fn sort_violations(violations: &mut [Violation]) {
    violations.sort_by(|a, b| {
        a.path
            .cmp(&b.path)
            .then(a.line.cmp(&b.line))
            .then(a.rule.cmp(&b.rule))
            .then(a.message.cmp(&b.message))
    });
}
