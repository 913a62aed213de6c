//! Policy validation harness.
//!
//! Two entry points share the same gates:
//!
//! - [`run_verify`] checks guide presence, guide anchors and the compliance
//!   manifest, stopping at the first failure.
//! - [`run_check`] runs every enabled gate and aggregates all violations into
//!   a [`Report`].
//!
//! # Gates
//!
//! - Guide: the principles guide exists at a canonical path, is non-empty and
//!   carries every `Principle N:` anchor
//! - Manifest: `policy/compliance.json` attests to every principle
//! - Structure: numbered sections, principle headings and closers
//! - Markers: no banned placeholder markers in source files
//! - Imports: module-level imports sit in the module header
//!
//! Validation is deterministic: the same tree yields the same report, apart
//! from the `check_id` which `--deterministic` removes.

use crate::core::config::PolicyConfig;
use crate::core::error::{EXIT_OK, EXIT_VIOLATION, PolicyError};
use crate::core::guide::{self, GuideDoc};
use crate::core::imports;
use crate::core::manifest::{self, ComplianceManifest};
use crate::core::markers::MarkerScanner;
use crate::core::report::{Report, Summary, VerifyOutcome};
use crate::core::rules::{RuleCode, Violation};
use crate::core::structure::StructureGuard;
use crate::core::walk;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use ulid::Ulid;

/// Gates that `check` can skip.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Guide,
    Manifest,
    Structure,
    Markers,
    Imports,
}

impl Gate {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Guide => "guide",
            Self::Manifest => "manifest",
            Self::Structure => "structure",
            Self::Markers => "markers",
            Self::Imports => "imports",
        }
    }
}

/// Inputs for [`run_check`].
#[derive(Debug, Clone)]
pub struct CheckOptions {
    pub root: PathBuf,
    pub guide: Option<String>,
    pub config: PolicyConfig,
    pub skip: Vec<Gate>,
    pub deterministic: bool,
}

impl CheckOptions {
    pub fn new(root: impl Into<PathBuf>, config: PolicyConfig) -> Self {
        Self {
            root: root.into(),
            guide: None,
            config,
            skip: Vec::new(),
            deterministic: false,
        }
    }

    fn runs(&self, gate: Gate) -> bool {
        !self.skip.contains(&gate)
    }
}

/// Pass/fail bookkeeping shared by the gates of one run.
#[derive(Debug, Default)]
struct GateTally {
    summary: Summary,
    violations: Vec<Violation>,
    warnings: Vec<String>,
}

impl GateTally {
    fn pass(&mut self, message: &str) {
        self.summary.pass += 1;
        tracing::debug!(result = "pass", "{}", message);
    }

    fn fail(&mut self, violations: Vec<Violation>) {
        self.summary.fail += 1;
        self.violations.extend(violations);
    }

    fn record(&mut self, passed_message: &str, violations: Vec<Violation>) {
        if violations.is_empty() {
            self.pass(passed_message);
        } else {
            self.fail(violations);
        }
    }

    fn skip(&mut self, message: &str) {
        self.summary.skip += 1;
        tracing::debug!(result = "skip", "{}", message);
    }

    fn warn(&mut self, message: String) {
        self.summary.warn += 1;
        tracing::warn!("{}", message);
        self.warnings.push(message);
    }
}

fn trace_gate(name: &str) {
    tracing::debug!(gate = name, "running gate");
}

/// Guide + manifest verification with first-failure semantics.
pub fn run_verify(root: &Path, guide_override: Option<&str>, config: &PolicyConfig) -> VerifyOutcome {
    let candidates = &config.guide.paths;
    let manifest_rel = config.manifest.path.clone();

    trace_gate("guide_presence");
    let Some(guide_rel) = guide::find_guide(root, guide_override, candidates) else {
        return VerifyOutcome::Violation {
            error: guide::not_found_message(guide_override, candidates),
            guide: None,
            manifest: None,
        };
    };

    trace_gate("guide_anchors");
    let doc = match guide::read_guide(root, &guide_rel) {
        Ok(doc) => doc,
        Err(e) => {
            return VerifyOutcome::Error {
                error: e.to_string(),
                manifest: None,
            };
        }
    };
    let missing = guide::missing_anchors(&doc.text);
    if !missing.is_empty() {
        return VerifyOutcome::Violation {
            error: format!("Guide missing required anchors: {}", missing.join(", ")),
            guide: Some(guide_rel),
            manifest: None,
        };
    }

    trace_gate(Gate::Manifest.as_str());
    let value = match manifest::read_manifest(root, &manifest_rel) {
        Ok(Some(value)) => value,
        Ok(None) => {
            return VerifyOutcome::Violation {
                error: format!("Missing compliance manifest: {}", manifest_rel),
                guide: Some(guide_rel),
                manifest: None,
            };
        }
        Err(e) => {
            return VerifyOutcome::Error {
                error: e.to_string(),
                manifest: Some(manifest_rel),
            };
        }
    };

    if let Some(violation) = manifest::validate_manifest_schema(&value) {
        return VerifyOutcome::Violation {
            error: violation.message,
            guide: Some(guide_rel),
            manifest: Some(manifest_rel),
        };
    }

    VerifyOutcome::Passed {
        guide: guide_rel,
        manifest: manifest_rel,
    }
}

fn validate_guide(
    tally: &mut GateTally,
    opts: &CheckOptions,
) -> Result<Option<GuideDoc>, PolicyError> {
    let candidates = &opts.config.guide.paths;
    let located = guide::find_guide(&opts.root, opts.guide.as_deref(), candidates);
    let enforce = opts.runs(Gate::Guide);
    if !enforce {
        tally.skip("guide gate skipped");
    }

    let Some(rel) = located else {
        if enforce {
            let path = opts
                .guide
                .clone()
                .or_else(|| candidates.first().cloned())
                .unwrap_or_default();
            tally.fail(vec![Violation::new(
                RuleCode::GuideMissing,
                path,
                guide::not_found_message(opts.guide.as_deref(), candidates),
            )]);
            tally.skip("guide anchors skipped: no guide");
        }
        return Ok(None);
    };

    let doc = guide::read_guide(&opts.root, &rel)?;
    if enforce {
        tally.pass("guide present");
        let missing = guide::missing_anchors(&doc.text);
        let violations = if missing.is_empty() {
            Vec::new()
        } else {
            vec![Violation::new(
                RuleCode::GuideAnchorMissing,
                &doc.path,
                format!("Guide missing required anchors: {}", missing.join(", ")),
            )]
        };
        tally.record("guide anchors complete", violations);
    }
    Ok(Some(doc))
}

fn validate_manifest(
    tally: &mut GateTally,
    opts: &CheckOptions,
) -> Result<Option<ComplianceManifest>, PolicyError> {
    if !opts.runs(Gate::Manifest) {
        tally.skip("manifest gate skipped");
        return Ok(None);
    }

    let rel = &opts.config.manifest.path;
    let Some(value) = manifest::read_manifest(&opts.root, rel)? else {
        tally.fail(vec![Violation::new(
            RuleCode::ManifestMissing,
            rel,
            format!("Missing compliance manifest: {}", rel),
        )]);
        return Ok(None);
    };

    match ComplianceManifest::try_from_value(&value) {
        Ok(parsed) => {
            tally.pass("manifest attests every principle");
            Ok(Some(parsed))
        }
        Err(schema) => {
            tally.fail(vec![Violation::new(schema.rule, rel, schema.message)]);
            Ok(None)
        }
    }
}

fn validate_structure(
    tally: &mut GateTally,
    opts: &CheckOptions,
    guide_doc: Option<&GuideDoc>,
) -> Result<(), PolicyError> {
    if !opts.runs(Gate::Structure) || !opts.config.structure.enabled {
        tally.skip("structure gate skipped");
        return Ok(());
    }

    let documents: Vec<String> = if opts.config.structure.documents.is_empty() {
        guide_doc.map(|d| vec![d.path.clone()]).unwrap_or_default()
    } else {
        opts.config.structure.documents.clone()
    };
    if documents.is_empty() {
        tally.skip("structure gate skipped: no documents");
        return Ok(());
    }

    let guard = StructureGuard::new(opts.config.structure.closer.clone());
    let mut violations = Vec::new();
    for rel in &documents {
        let is_guide = guide_doc.is_some_and(|d| &d.path == rel);
        let text = match guide_doc {
            Some(d) if is_guide => d.text.clone(),
            _ => {
                let path = opts.root.join(rel);
                if !path.is_file() {
                    tally.warn(format!("structured document not found: {}", rel));
                    continue;
                }
                match fs::read_to_string(&path) {
                    Ok(text) => text,
                    Err(e) if e.kind() == ErrorKind::InvalidData => {
                        tally.warn(format!("structured document is not valid UTF-8: {}", rel));
                        continue;
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        };
        violations.extend(guard.check_document(Path::new(rel), &text, is_guide));
    }

    tally.record("documents are well structured", violations);
    Ok(())
}

fn validate_markers(tally: &mut GateTally, opts: &CheckOptions) -> Result<(), PolicyError> {
    let config = &opts.config.markers;
    if !opts.runs(Gate::Markers) || !config.enabled {
        tally.skip("marker gate skipped");
        return Ok(());
    }

    let scanner = MarkerScanner::new(config)?;
    let files = walk::collect_files(&opts.root, &opts.config.walk.exclude_dirs, &config.extensions)?;
    tracing::debug!(files = files.len(), "scanning for banned markers");
    tally.record("no banned markers", scanner.scan_files(&opts.root, &files));
    Ok(())
}

fn validate_imports(tally: &mut GateTally, opts: &CheckOptions) -> Result<(), PolicyError> {
    let config = &opts.config.imports;
    if !opts.runs(Gate::Imports) || !config.enabled {
        tally.skip("import gate skipped");
        return Ok(());
    }

    let files = walk::collect_files(&opts.root, &opts.config.walk.exclude_dirs, &config.extensions)?;
    tracing::debug!(files = files.len(), "checking import placement");
    tally.record("imports are in module headers", imports::scan_files(&opts.root, &files));
    Ok(())
}

/// Run every enabled gate. Violations are report data; only unexpected
/// failures (unreadable guide, malformed manifest JSON, bad marker
/// patterns) are returned as errors.
pub fn run_check(opts: &CheckOptions) -> Result<Report, PolicyError> {
    let mut tally = GateTally::default();

    trace_gate(Gate::Guide.as_str());
    let guide_doc = validate_guide(&mut tally, opts)?;
    trace_gate(Gate::Manifest.as_str());
    let manifest = validate_manifest(&mut tally, opts)?;
    trace_gate(Gate::Structure.as_str());
    validate_structure(&mut tally, opts, guide_doc.as_ref())?;
    trace_gate(Gate::Markers.as_str());
    validate_markers(&mut tally, opts)?;
    trace_gate(Gate::Imports.as_str());
    validate_imports(&mut tally, opts)?;

    let ok = tally.violations.is_empty();
    tracing::info!(
        pass = tally.summary.pass,
        fail = tally.summary.fail,
        warn = tally.summary.warn,
        skip = tally.summary.skip,
        "check complete"
    );

    Ok(Report {
        ok,
        code: if ok { EXIT_OK } else { EXIT_VIOLATION },
        check_id: (!opts.deterministic).then(|| Ulid::new().to_string()),
        project: manifest.map(|m| m.project),
        guide: guide_doc.as_ref().map(|d| d.path.clone()),
        guide_sha256: guide_doc.map(|d| d.sha256),
        manifest: opts.config.manifest.path.clone(),
        summary: tally.summary,
        violations: tally.violations,
        warnings: tally.warnings,
    })
}
