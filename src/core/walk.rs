use crate::core::error::PolicyError;
use std::fs;
use std::path::{Path, PathBuf};

/// Collect every regular file under `root` whose extension is in
/// `extensions`, pruning directories named in `exclude_dirs`.
///
/// Returned paths are relative to `root` and sorted.
pub fn collect_files(
    root: &Path,
    exclude_dirs: &[String],
    extensions: &[String],
) -> Result<Vec<PathBuf>, PolicyError> {
    fn recurse(
        root: &Path,
        dir: &Path,
        exclude_dirs: &[String],
        extensions: &[String],
        out: &mut Vec<PathBuf>,
    ) -> Result<(), PolicyError> {
        if !dir.is_dir() {
            return Ok(());
        }

        for entry in fs::read_dir(dir).map_err(PolicyError::IoError)? {
            let entry = entry.map_err(PolicyError::IoError)?;
            let path = entry.path();
            let file_type = entry.file_type().map_err(PolicyError::IoError)?;
            // Symlinks are not followed.
            if file_type.is_symlink() {
                continue;
            }
            if file_type.is_dir() {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                if exclude_dirs.iter().any(|d| d == name.as_ref()) {
                    continue;
                }
                recurse(root, &path, exclude_dirs, extensions, out)?;
            } else if file_type.is_file() {
                let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
                if !extensions.iter().any(|e| e == ext) {
                    continue;
                }
                let rel = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
                out.push(rel);
            }
        }
        Ok(())
    }

    let mut out = Vec::new();
    recurse(root, root, exclude_dirs, extensions, &mut out)?;
    out.sort();
    Ok(out)
}
