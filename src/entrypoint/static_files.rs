//! `collectstatic`: copy static assets into the served directory.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, warn};

/// Copy every file under `source` into `root`, keeping relative paths.
///
/// Existing files are overwritten and directories created as needed. A
/// missing `source` copies nothing. Returns the number of files copied.
pub fn collect_static(source: &Path, root: &Path) -> Result<usize> {
    if !source.is_dir() {
        warn!(source = %source.display(), "Static source directory not found; nothing to collect");
        fs::create_dir_all(root)
            .with_context(|| format!("Failed to create static root {}", root.display()))?;
        return Ok(0);
    }

    fs::create_dir_all(root)
        .with_context(|| format!("Failed to create static root {}", root.display()))?;
    copy_tree(source, root)
}

fn copy_tree(from: &Path, to: &Path) -> Result<usize> {
    let mut copied = 0;
    let entries = fs::read_dir(from).with_context(|| format!("Failed to read {}", from.display()))?;

    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to read entry in {}", from.display()))?;
        let src = entry.path();
        let dest = to.join(entry.file_name());
        let file_type = entry
            .file_type()
            .with_context(|| format!("Failed to stat {}", src.display()))?;

        if file_type.is_dir() {
            fs::create_dir_all(&dest)
                .with_context(|| format!("Failed to create {}", dest.display()))?;
            copied += copy_tree(&src, &dest)?;
        } else {
            fs::copy(&src, &dest).with_context(|| {
                format!("Failed to copy {} to {}", src.display(), dest.display())
            })?;
            debug!(file = %dest.display(), "Collected");
            copied += 1;
        }
    }

    Ok(copied)
}
