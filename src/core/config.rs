//! Checker configuration loaded from `.orgpolicy.toml`.
//!
//! Every section is optional; a missing file yields [`PolicyConfig::default`].

use crate::core::error::PolicyError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = ".orgpolicy.toml";

pub const CANON_GUIDE_PATHS: [&str; 2] = [
    "docs/MULTI_DOCUMENT_ENTERPRISE_CODING_PRINCIPLES_GUIDE.md",
    ".github/policy/MULTI_DOCUMENT_ENTERPRISE_CODING_PRINCIPLES_GUIDE.md",
];

pub const COMPLIANCE_JSON: &str = "policy/compliance.json";

pub const DEFAULT_ALLOW_TOKEN: &str = "orgpolicy: allow";

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyConfig {
    pub guide: GuideConfig,
    pub manifest: ManifestConfig,
    pub walk: WalkConfig,
    pub markers: MarkersConfig,
    pub imports: ImportsConfig,
    pub structure: StructureConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct GuideConfig {
    /// Candidate guide locations, tried in order.
    pub paths: Vec<String>,
}

impl Default for GuideConfig {
    fn default() -> Self {
        Self {
            paths: CANON_GUIDE_PATHS.iter().map(|p| p.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ManifestConfig {
    pub path: String,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            path: COMPLIANCE_JSON.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct WalkConfig {
    /// Directory names pruned anywhere in the tree.
    pub exclude_dirs: Vec<String>,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            exclude_dirs: [
                ".git",
                "target",
                "node_modules",
                "vendor",
                "dist",
                "build",
                ".venv",
                "venv",
                "__pycache__",
            ]
            .iter()
            .map(|d| d.to_string())
            .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarkersConfig {
    pub enabled: bool,
    pub patterns: Vec<String>,
    pub extensions: Vec<String>,
    /// Lines containing this token are exempt.
    pub allow_token: String,
}

impl Default for MarkersConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            patterns: ["TODO", "FIXME", "XXX", "HACK"]
                .iter()
                .map(|p| p.to_string())
                .collect(),
            extensions: [
                "rs", "py", "js", "ts", "tsx", "jsx", "mjs", "cjs", "go", "java", "kt", "c", "h",
                "cc", "cpp", "hpp", "cs", "rb", "sh", "bash", "zsh",
            ]
            .iter()
            .map(|e| e.to_string())
            .collect(),
            allow_token: DEFAULT_ALLOW_TOKEN.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImportsConfig {
    pub enabled: bool,
    pub extensions: Vec<String>,
}

impl Default for ImportsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            extensions: ["py", "js", "ts", "tsx", "jsx", "mjs", "cjs"]
                .iter()
                .map(|e| e.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct StructureConfig {
    pub enabled: bool,
    /// Markdown documents held to the numbering and closer rules. Empty
    /// means the located guide only.
    pub documents: Vec<String>,
    pub closer: Option<String>,
}

impl Default for StructureConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            documents: Vec::new(),
            closer: None,
        }
    }
}

impl PolicyConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, PolicyError> {
        let config: PolicyConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from an explicit path (must exist) or from `<root>/.orgpolicy.toml`
    /// (defaults when absent).
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self, PolicyError> {
        let path: PathBuf = match explicit {
            Some(p) => {
                if !p.is_file() {
                    return Err(PolicyError::NotFound(format!(
                        "config file {}",
                        p.display()
                    )));
                }
                p.to_path_buf()
            }
            None => {
                let p = root.join(CONFIG_FILE);
                if !p.is_file() {
                    tracing::debug!(root = %root.display(), "no config file, using defaults");
                    return Ok(Self::default());
                }
                p
            }
        };

        tracing::debug!(path = %path.display(), "loading config");
        let content = fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.markers.enabled {
            if self.markers.patterns.is_empty() {
                return Err(PolicyError::InvalidConfig(
                    "markers.patterns must not be empty while markers are enabled".to_string(),
                ));
            }
            if self.markers.patterns.iter().any(|p| p.trim().is_empty()) {
                return Err(PolicyError::InvalidConfig(
                    "markers.patterns must not contain empty strings".to_string(),
                ));
            }
        }
        if self.guide.paths.is_empty() {
            return Err(PolicyError::InvalidConfig(
                "guide.paths must list at least one location".to_string(),
            ));
        }
        if let Some(closer) = &self.structure.closer
            && closer.trim().is_empty()
        {
            return Err(PolicyError::InvalidConfig(
                "structure.closer must not be blank".to_string(),
            ));
        }
        Ok(())
    }
}
