//! Result types produced by `verify` and `check`.

use crate::core::error::{EXIT_ERROR, EXIT_OK, EXIT_VIOLATION};
use crate::core::rules::Violation;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Gate counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub pass: u32,
    pub fail: u32,
    pub warn: u32,
    pub skip: u32,
}

/// Aggregated `check` result.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub ok: bool,
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    pub guide: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guide_sha256: Option<String>,
    pub manifest: String,
    pub summary: Summary,
    pub violations: Vec<Violation>,
    pub warnings: Vec<String>,
}

impl Report {
    pub fn exit_code(&self) -> i32 {
        self.code
    }
}

/// Outcome of the guide + manifest verification, stopping at the first
/// failing stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    Passed {
        guide: String,
        manifest: String,
    },
    Violation {
        error: String,
        guide: Option<String>,
        manifest: Option<String>,
    },
    Error {
        error: String,
        manifest: Option<String>,
    },
}

/// Wire shape of a `verify --json` result.
#[derive(Debug, Clone)]
pub struct VerifyJson {
    pub ok: bool,
    pub error: Option<String>,
    pub code: Option<i32>,
    pub guide: Option<String>,
    pub manifest: Option<String>,
    pub principles: Option<String>,
}

impl Serialize for VerifyJson {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("ok", &self.ok)?;
        if let Some(error) = &self.error {
            map.serialize_entry("error", error)?;
        }
        if let Some(code) = &self.code {
            map.serialize_entry("code", code)?;
        }
        // Failures name the manifest ahead of the guide.
        let paths = if self.ok {
            [("guide", &self.guide), ("manifest", &self.manifest)]
        } else {
            [("manifest", &self.manifest), ("guide", &self.guide)]
        };
        for (key, value) in paths {
            if let Some(value) = value {
                map.serialize_entry(key, value)?;
            }
        }
        if let Some(principles) = &self.principles {
            map.serialize_entry("principles", principles)?;
        }
        map.end()
    }
}

impl VerifyOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Passed { .. } => EXIT_OK,
            Self::Violation { .. } => EXIT_VIOLATION,
            Self::Error { .. } => EXIT_ERROR,
        }
    }

    pub fn to_json(&self) -> VerifyJson {
        match self {
            Self::Passed { guide, manifest } => VerifyJson {
                ok: true,
                error: None,
                code: None,
                guide: Some(guide.clone()),
                manifest: Some(manifest.clone()),
                principles: Some(format!("P1..P{}", crate::core::guide::PRINCIPLE_COUNT)),
            },
            Self::Violation {
                error,
                guide,
                manifest,
            } => VerifyJson {
                ok: false,
                error: Some(error.clone()),
                code: Some(EXIT_VIOLATION),
                guide: guide.clone(),
                manifest: manifest.clone(),
                principles: None,
            },
            Self::Error { error, manifest } => VerifyJson {
                ok: false,
                error: Some(error.clone()),
                code: Some(EXIT_ERROR),
                guide: None,
                manifest: manifest.clone(),
                principles: None,
            },
        }
    }
}
