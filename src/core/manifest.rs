//! Compliance manifest (`policy/compliance.json`).
//!
//! Minimal schema:
//!
//! ```json
//! {
//!   "project": "<string>",
//!   "run_id": "<string>",
//!   "principles": { "P1": true, "...": true, "P18": true }
//! }
//! ```
//!
//! Every key `P1`..`P18` must exist and be the boolean `true`. Validation runs
//! on the raw JSON value so that each failure gets its own message, checked
//! in a fixed order with the first failure winning.

use crate::core::error::PolicyError;
use crate::core::guide::PRINCIPLE_COUNT;
use crate::core::rules::RuleCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceManifest {
    pub project: String,
    pub run_id: String,
    pub principles: BTreeMap<String, bool>,
}

/// First schema failure found in a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    pub rule: RuleCode,
    pub message: String,
}

impl SchemaViolation {
    fn schema(message: impl Into<String>) -> Self {
        Self {
            rule: RuleCode::ManifestSchema,
            message: message.into(),
        }
    }
}

/// `P1` .. `P18`
pub fn principle_keys() -> Vec<String> {
    (1..=PRINCIPLE_COUNT).map(|i| format!("P{}", i)).collect()
}

/// Read and parse the manifest. `Ok(None)` when nothing exists at `rel`.
pub fn read_manifest(root: &Path, rel: &str) -> Result<Option<Value>, PolicyError> {
    let path = root.join(rel);
    if !path.exists() {
        return Ok(None);
    }

    fn malformed(e: impl std::fmt::Display) -> PolicyError {
        PolicyError::ManifestError(format!("Malformed compliance.json (invalid JSON): {}", e))
    }

    let content = fs::read_to_string(&path).map_err(malformed)?;
    let value = serde_json::from_str(&content).map_err(malformed)?;
    Ok(Some(value))
}

fn non_empty_str(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::String(s)) if !s.trim().is_empty())
}

/// Validate the minimal schema. `None` means the manifest is compliant.
pub fn validate_manifest_schema(obj: &Value) -> Option<SchemaViolation> {
    let Some(map) = obj.as_object() else {
        return Some(SchemaViolation::schema(
            "compliance.json root must be an object",
        ));
    };

    if !non_empty_str(map.get("project")) {
        return Some(SchemaViolation::schema(
            "compliance.json.project must be a non-empty string",
        ));
    }
    if !non_empty_str(map.get("run_id")) {
        return Some(SchemaViolation::schema(
            "compliance.json.run_id must be a non-empty string",
        ));
    }
    let Some(principles) = map.get("principles").and_then(Value::as_object) else {
        return Some(SchemaViolation::schema(
            "compliance.json.principles must be an object",
        ));
    };

    let keys = principle_keys();
    let missing: Vec<&str> = keys
        .iter()
        .filter(|k| !principles.contains_key(k.as_str()))
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        return Some(SchemaViolation::schema(format!(
            "compliance.principles missing keys: {}",
            missing.join(", ")
        )));
    }

    let not_true: Vec<&str> = keys
        .iter()
        .filter(|k| principles.get(k.as_str()) != Some(&Value::Bool(true)))
        .map(String::as_str)
        .collect();
    if !not_true.is_empty() {
        return Some(SchemaViolation {
            rule: RuleCode::PrincipleNotCompliant,
            message: format!(
                "non-compliant principles (must be true): {}",
                not_true.join(", ")
            ),
        });
    }

    None
}

impl ComplianceManifest {
    /// Validate then convert. Extra principle keys are kept only when boolean.
    pub fn try_from_value(obj: &Value) -> Result<Self, SchemaViolation> {
        if let Some(violation) = validate_manifest_schema(obj) {
            return Err(violation);
        }

        let str_field = |name: &str| {
            obj.get(name)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let principles = obj
            .get("principles")
            .and_then(Value::as_object)
            .map(|m| {
                m.iter()
                    .filter_map(|(k, v)| v.as_bool().map(|b| (k.clone(), b)))
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            project: str_field("project"),
            run_id: str_field("run_id"),
            principles,
        })
    }
}
