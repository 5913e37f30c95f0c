//! Report output: directory naming and file writing.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use tavily_client::Source;

const MAX_SLUG_LEN: usize = 60;

/// Turn a topic or URL into a safe directory name.
pub fn sanitize_name(raw: &str) -> String {
    let mut slug: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    while slug.contains("--") {
        slug = slug.replace("--", "-");
    }
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        return "report".to_string();
    }
    slug.chars().take(MAX_SLUG_LEN).collect()
}

/// Output directory for a run: explicit path, or `./research/<slug>-<stamp>`.
pub fn output_dir(explicit: Option<&Path>, name: &str) -> PathBuf {
    match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let stamp = Local::now().format("%Y%m%d-%H%M%S");
            PathBuf::from("research").join(format!("{}-{}", sanitize_name(name), stamp))
        }
    }
}

/// Write `report.md` and `sources.json` into `dir`, creating it as needed.
/// Existing files are overwritten.
pub fn save_report(dir: &Path, content: &str, sources: &[Source]) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let report_path = dir.join("report.md");
    fs::write(&report_path, content)
        .with_context(|| format!("Failed to write {}", report_path.display()))?;

    let sources_path = dir.join("sources.json");
    let json = serde_json::to_string_pretty(sources).context("Failed to serialize sources")?;
    fs::write(&sources_path, json)
        .with_context(|| format!("Failed to write {}", sources_path.display()))?;

    tracing::info!(dir = %dir.display(), sources = sources.len(), "Report saved");
    Ok(())
}

/// Write a single text file into `dir`, creating it as needed.
pub fn save_text(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    let path = dir.join(filename);
    fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
