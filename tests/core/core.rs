use orgpolicy::core::assets;
use orgpolicy::core::config::{CANON_GUIDE_PATHS, COMPLIANCE_JSON, PolicyConfig};
use orgpolicy::core::error::{EXIT_OK, EXIT_VIOLATION, PolicyError};
use orgpolicy::core::guide;
use orgpolicy::core::imports::{self, Language};
use orgpolicy::core::markers::MarkerScanner;
use orgpolicy::core::rules::RuleCode;
use orgpolicy::core::scaffold::{ScaffoldOptions, scaffold_policy};
use orgpolicy::core::structure::StructureGuard;
use orgpolicy::core::validate::{self, CheckOptions, Gate};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const DESIGN_DOC: &str = "\
# 1. PURPOSE & SCOPE

Text.

# 2. SYSTEM OVERVIEW

## 2.1 Components

## 2.2 Data flow

```markdown
# 7. example heading inside a fence
```

# 3. DATA MODEL

# GLOSSARY

- **Principle**: one of the named policy statements.

<!-- END OF DOCUMENT -->
";

#[test]
fn numbered_design_document_passes_structure_guard() {
    let guard = StructureGuard::new(Some(assets::GUIDE_CLOSER.to_string()));
    let violations = guard.check_document(Path::new("docs/DESIGN.md"), DESIGN_DOC, false);
    assert!(violations.is_empty(), "{violations:?}");
}

#[test]
fn renumbered_section_is_caught_once() {
    let doc = DESIGN_DOC.replace("## 2.2 Data flow", "## 2.3 Data flow");
    let guard = StructureGuard::default();
    let violations = guard.check_document(Path::new("docs/DESIGN.md"), &doc, false);
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].rule, RuleCode::StructureSectionOrder);
    assert_eq!(violations[0].message, "section 2.3 out of order (expected 2.2)");
}

#[test]
fn scaffolded_repo_round_trips_through_check() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    scaffold_policy(&ScaffoldOptions {
        target_dir: root.to_path_buf(),
        project: "ledger".to_string(),
        run_id: "01J0000000000000000000000".to_string(),
        force: false,
        dry_run: false,
    })
    .unwrap();

    let config = PolicyConfig::load(root, None).unwrap();
    assert_eq!(config.structure.closer.as_deref(), Some(assets::GUIDE_CLOSER));

    let mut opts = CheckOptions::new(root, config.clone());
    opts.deterministic = true;
    let report = validate::run_check(&opts).unwrap();
    assert_eq!(report.code, EXIT_VIOLATION);
    assert_eq!(report.violations.len(), 1);
    assert_eq!(report.violations[0].rule, RuleCode::PrincipleNotCompliant);
    assert_eq!(report.violations[0].path, Path::new(COMPLIANCE_JSON));

    let manifest_path = root.join(COMPLIANCE_JSON);
    let attested = fs::read_to_string(&manifest_path)
        .unwrap()
        .replace("false", "true");
    fs::write(&manifest_path, attested).unwrap();

    let report = validate::run_check(&CheckOptions::new(root, config)).unwrap();
    assert_eq!(report.code, EXIT_OK);
    assert_eq!(report.project.as_deref(), Some("ledger"));
    assert_eq!(
        report.guide_sha256.as_deref(),
        Some(guide::hex_digest(assets::TEMPLATE_GUIDE.as_bytes()).as_str())
    );
}

#[test]
fn broken_guide_surfaces_in_both_modes() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    let guide_path = root.join(CANON_GUIDE_PATHS[0]);
    fs::create_dir_all(guide_path.parent().unwrap()).unwrap();
    fs::write(
        &guide_path,
        assets::TEMPLATE_GUIDE.replace("## Principle 9:", "## Principle 10:"),
    )
    .unwrap();

    // Anchor check: "Principle 9:" is gone.
    assert_eq!(
        guide::missing_anchors(&fs::read_to_string(&guide_path).unwrap()),
        vec!["Principle 9:".to_string()]
    );

    let mut opts = CheckOptions::new(root, PolicyConfig::default());
    opts.skip = vec![Gate::Manifest, Gate::Markers, Gate::Imports];
    let report = validate::run_check(&opts).unwrap();
    let rules: Vec<RuleCode> = report.violations.iter().map(|v| v.rule).collect();
    assert_eq!(
        rules,
        vec![
            RuleCode::GuideAnchorMissing,
            RuleCode::StructurePrincipleOrder,
            RuleCode::StructurePrincipleOrder,
        ]
    );
}

#[test]
fn unreadable_guide_is_an_error_not_a_violation() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    let guide_path = root.join(CANON_GUIDE_PATHS[0]);
    fs::create_dir_all(guide_path.parent().unwrap()).unwrap();
    fs::write(&guide_path, [0xc3, 0x28]).unwrap();

    let err = validate::run_check(&CheckOptions::new(root, PolicyConfig::default())).unwrap_err();
    assert!(matches!(err, PolicyError::GuideError(_)));
}

#[test]
fn scanners_agree_with_config_driven_walk() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    fs::create_dir_all(root.join("pkg")).unwrap();
    fs::write(root.join("pkg/util.py"), "import os\nVALUE = 1\nfrom sys import argv  # FIXME\n").unwrap();

    let config = PolicyConfig::default();
    let scanner = MarkerScanner::new(&config.markers).unwrap();
    let marker_hits = scanner.scan_text(Path::new("pkg/util.py"), &fs::read_to_string(root.join("pkg/util.py")).unwrap());
    assert_eq!(marker_hits.len(), 1);

    let import_hits = imports::check_text(
        Language::Python,
        Path::new("pkg/util.py"),
        &fs::read_to_string(root.join("pkg/util.py")).unwrap(),
    );
    assert_eq!(import_hits.len(), 1);
    assert_eq!(import_hits[0].line, Some(3));

    let report = validate::run_check(&CheckOptions::new(root, config)).unwrap();
    let located: Vec<(RuleCode, Option<usize>)> = report
        .violations
        .iter()
        .filter(|v| v.path == Path::new("pkg/util.py"))
        .map(|v| (v.rule, v.line))
        .collect();
    assert_eq!(
        located,
        vec![
            (RuleCode::BannedMarker, Some(3)),
            (RuleCode::ImportPlacement, Some(3)),
        ]
    );
}
