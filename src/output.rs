//! Artifact persistence: filename sanitization and markdown writes.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;

/// Clean up a string for use as a file name: spaces become underscores and
/// everything outside `[A-Za-z0-9_]` is stripped.
pub fn clean_filename(s: &str) -> String {
    s.replace(' ', "_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

/// Write one markdown artifact as UTF-8 text.
pub fn save_markdown(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content)?;
    debug!("Saved {}", path.display());
    Ok(())
}

/// Build an artifact path from an output prefix, e.g.
/// `out/My_Video` + `merged_summary.md` -> `out/My_Video_merged_summary.md`.
pub fn artifact_path(prefix: &Path, suffix: &str) -> PathBuf {
    PathBuf::from(format!("{}_{suffix}", prefix.display()))
}
