//! Repository scaffolding for `orgpolicy init`.
//!
//! Writes the canonical guide, a compliance manifest with every principle
//! unattested, and the default configuration. Existing files are never
//! overwritten without `force`.

use crate::core::assets;
use crate::core::config::{CANON_GUIDE_PATHS, COMPLIANCE_JSON, CONFIG_FILE};
use crate::core::error::PolicyError;
use std::fs;
use std::path::{Path, PathBuf};

/// Scaffolding operation configuration.
pub struct ScaffoldOptions {
    /// Target directory for scaffold output (usually the repository root)
    pub target_dir: PathBuf,
    /// Project name recorded in the manifest
    pub project: String,
    /// Run identifier recorded in the manifest
    pub run_id: String,
    /// Force overwrite of existing files
    pub force: bool,
    /// Preview mode - log actions without writing files
    pub dry_run: bool,
}

/// What happened to one scaffolded path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteAction {
    Wrote,
    WouldWrite,
    WouldSkip,
}

fn ensure_parent(path: &Path) -> Result<(), PolicyError> {
    if let Some(p) = path.parent() {
        fs::create_dir_all(p).map_err(PolicyError::IoError)?;
    }
    Ok(())
}

fn write_file(
    opts: &ScaffoldOptions,
    rel_path: &str,
    content: &str,
) -> Result<WriteAction, PolicyError> {
    let dest = opts.target_dir.join(rel_path);

    if dest.exists() && !opts.force {
        if opts.dry_run {
            println!(
                "  would-skip: {} (exists; pass --force to overwrite)",
                dest.display()
            );
            return Ok(WriteAction::WouldSkip);
        }
        return Err(PolicyError::ValidationError(format!(
            "Refusing to overwrite existing path without --force: {}",
            dest.display()
        )));
    }

    if opts.dry_run {
        println!("  would-write: {}", dest.display());
        return Ok(WriteAction::WouldWrite);
    }

    ensure_parent(&dest)?;
    fs::write(&dest, content).map_err(PolicyError::IoError)?;
    println!("  wrote: {}", dest.display());
    Ok(WriteAction::Wrote)
}

/// Write guide, manifest and config. Every target is checked before any
/// file is written, so a refusal leaves the directory untouched.
pub fn scaffold_policy(opts: &ScaffoldOptions) -> Result<Vec<(String, WriteAction)>, PolicyError> {
    println!(
        "Scaffolding org policy files into {}",
        opts.target_dir.display()
    );

    let compliance = assets::render_compliance(&opts.project, &opts.run_id);
    let files: [(&str, &str); 3] = [
        (CANON_GUIDE_PATHS[0], assets::TEMPLATE_GUIDE),
        (COMPLIANCE_JSON, compliance.as_str()),
        (CONFIG_FILE, assets::TEMPLATE_CONFIG),
    ];

    if !opts.force && !opts.dry_run {
        if let Some((rel, _)) = files
            .iter()
            .find(|(rel, _)| opts.target_dir.join(rel).exists())
        {
            return Err(PolicyError::ValidationError(format!(
                "Refusing to overwrite existing path without --force: {}",
                opts.target_dir.join(rel).display()
            )));
        }
    }

    let mut actions = Vec::with_capacity(files.len());
    for (rel, content) in files {
        let action = write_file(opts, rel, content)?;
        actions.push((rel.to_string(), action));
    }
    Ok(actions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(dir: &Path) -> ScaffoldOptions {
        ScaffoldOptions {
            target_dir: dir.to_path_buf(),
            project: "demo".to_string(),
            run_id: "init".to_string(),
            force: false,
            dry_run: false,
        }
    }

    #[test]
    fn writes_all_three_files() {
        let tmp = tempfile::tempdir().unwrap();
        let actions = scaffold_policy(&opts(tmp.path())).unwrap();
        assert_eq!(actions.len(), 3);
        assert!(actions.iter().all(|(_, a)| *a == WriteAction::Wrote));
        assert!(tmp.path().join(CANON_GUIDE_PATHS[0]).is_file());
        assert!(tmp.path().join(COMPLIANCE_JSON).is_file());
        assert!(tmp.path().join(CONFIG_FILE).is_file());
    }

    #[test]
    fn refuses_overwrite_without_force_and_writes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), "# mine\n").unwrap();

        let err = scaffold_policy(&opts(tmp.path())).unwrap_err();
        assert!(matches!(err, PolicyError::ValidationError(_)));
        assert!(!tmp.path().join(CANON_GUIDE_PATHS[0]).exists());
        assert_eq!(
            fs::read_to_string(tmp.path().join(CONFIG_FILE)).unwrap(),
            "# mine\n"
        );

        let mut forced = opts(tmp.path());
        forced.force = true;
        scaffold_policy(&forced).unwrap();
        assert_ne!(
            fs::read_to_string(tmp.path().join(CONFIG_FILE)).unwrap(),
            "# mine\n"
        );
    }

    #[test]
    fn dry_run_writes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), "# mine\n").unwrap();
        let mut dry = opts(tmp.path());
        dry.dry_run = true;
        let actions = scaffold_policy(&dry).unwrap();
        assert_eq!(actions[0].1, WriteAction::WouldWrite);
        assert_eq!(actions[2].1, WriteAction::WouldSkip);
        assert!(!tmp.path().join(COMPLIANCE_JSON).exists());
    }
}
