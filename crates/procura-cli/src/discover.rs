//! Input discovery: every file under a directory whose name matches one of
//! the patterns, at any depth.

use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// `.htm`, `.html`, and anything else whose extension starts with `htm`.
pub const DEFAULT_PATTERNS: &[&str] = &["*.htm*"];

/// Files under `root` matching any of `patterns`, sorted and de-duplicated.
///
/// # Errors
///
/// Fails when `root` is not a directory or a pattern is not a valid glob.
pub fn discover_html_files(root: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        anyhow::bail!("Input directory not found: {}", root.display());
    }

    let mut found = BTreeSet::new();
    for pattern in patterns {
        let pattern_str = format!(
            "{}/**/{pattern}",
            glob::Pattern::escape(&root.to_string_lossy())
        );
        let matches = glob::glob(&pattern_str)
            .with_context(|| format!("Invalid glob pattern: {pattern}"))?;

        for entry in matches {
            match entry {
                Ok(path) if path.is_file() => {
                    found.insert(path);
                }
                Ok(_) => {}
                Err(e) => log::warn!("skipping unreadable entry: {e}"),
            }
        }
    }

    log::debug!("{} input files under {}", found.len(), root.display());
    Ok(found.into_iter().collect())
}
