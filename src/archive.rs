//! Export root location and archive handling.
//!
//! `tko parse <path>` accepts either an already-extracted export directory
//! or a `.zip` archive. Archives are unpacked into a temporary directory
//! that lives for the duration of the run.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tempfile::TempDir;

/// Decompressed bytes allowed per archive entry (zip-bomb protection).
const MAX_ENTRY_BYTES: u64 = 512 * 1024 * 1024;

/// A located export root. Holds the temp directory guard alive when the
/// export came from an archive.
pub enum ExportRoot {
    Dir(PathBuf),
    Extracted { root: PathBuf, _guard: TempDir },
}

impl ExportRoot {
    pub fn path(&self) -> &Path {
        match self {
            ExportRoot::Dir(p) => p,
            ExportRoot::Extracted { root, .. } => root,
        }
    }
}

/// Resolves `path` to an export root, unpacking a zip archive if needed.
pub fn open(path: &Path) -> Result<ExportRoot> {
    if path.is_dir() {
        return Ok(ExportRoot::Dir(path.to_path_buf()));
    }
    if !path.is_file() {
        bail!("export path does not exist: {}", path.display());
    }
    match path.extension().and_then(|e| e.to_str()) {
        Some("zip") => extract_zip(path),
        _ => bail!(
            "expected a directory or .zip archive: {}",
            path.display()
        ),
    }
}

fn extract_zip(path: &Path) -> Result<ExportRoot> {
    let file = fs::File::open(path)
        .with_context(|| format!("failed to open archive: {}", path.display()))?;
    let mut archive = zip::ZipArchive::new(file)
        .with_context(|| format!("failed to read archive: {}", path.display()))?;

    let tmp = TempDir::new()?;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        // enclosed_name rejects entries that would escape the target dir.
        let Some(rel) = entry.enclosed_name() else {
            continue;
        };
        let dest = tmp.path().join(rel);
        if entry.is_dir() {
            fs::create_dir_all(&dest)?;
            continue;
        }
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = fs::File::create(&dest)?;
        let written = {
            let mut limited = (&mut entry).take(MAX_ENTRY_BYTES);
            std::io::copy(&mut limited, &mut out)?
        };
        if written >= MAX_ENTRY_BYTES {
            bail!("archive entry {} exceeds size limit", entry.name());
        }
    }

    let root = tmp.path().to_path_buf();
    Ok(ExportRoot::Extracted { root, _guard: tmp })
}
