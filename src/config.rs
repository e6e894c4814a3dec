//! Run Configuration
//!
//! CLI flags and environment wiring, plus the audit target list read
//! once at startup.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

use crate::check::TokenBudget;

#[derive(Debug, Parser)]
#[command(name = "a11y_auditor", about = "LLM-driven WCAG 2.2 audit runner")]
pub struct AuditConfig {
    /// Target list: `url,folder` rows, one audit target per line.
    #[arg(long, default_value = "targets.csv")]
    pub targets: PathBuf,

    /// OpenAI-compatible chat-completions base URL.
    #[arg(long, env = "OPENAI_BASE_URL", default_value = "https://api.openai.com/v1")]
    pub api_base: String,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, env = "AUDIT_MODEL", default_value = "gpt-4o-2024-08-06")]
    pub model: String,

    /// WebDriver endpoint, e.g. a local chromedriver.
    #[arg(long, env = "WEBDRIVER_URL", default_value = "http://localhost:9515")]
    pub webdriver_url: String,

    /// Collections estimated at or under this many tokens go out as one
    /// completion request.
    #[arg(long, default_value_t = 20_000)]
    pub threshold_tokens: usize,

    /// Per-chunk token budget once a collection is split.
    #[arg(long, default_value_t = 5_000)]
    pub max_chunk_tokens: usize,

    #[arg(long, default_value_t = 30)]
    pub page_load_timeout_secs: u64,

    /// Root directory for per-target report folders.
    #[arg(long, default_value = "audit_results")]
    pub output_root: PathBuf,

    /// Repeat each target this many times into run_<n>/ subfolders.
    #[arg(long, default_value_t = 1)]
    pub runs: u32,
}

impl AuditConfig {
    pub fn budget(&self) -> TokenBudget {
        TokenBudget {
            threshold_tokens: self.threshold_tokens,
            max_chunk_tokens: self.max_chunk_tokens,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuditTarget {
    pub url: String,
    /// Folder name the target's reports land under.
    pub folder: String,
}

/// Read the target list. The format is two comma-separated columns with
/// an optional header row; blank lines are skipped.
pub fn load_targets(path: &Path) -> Result<Vec<AuditTarget>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading target list {}", path.display()))?;

    let mut targets = Vec::new();
    for (line_no, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line_no == 0 && line.to_lowercase().starts_with("url") {
            continue;
        }
        let Some((url, folder)) = line.split_once(',') else {
            bail!("line {} of {} has no folder column", line_no + 1, path.display());
        };
        let url = url.trim();
        let folder = folder.trim();
        if url.is_empty() || folder.is_empty() {
            bail!("line {} of {} has an empty column", line_no + 1, path.display());
        }
        targets.push(AuditTarget {
            url: url.to_string(),
            folder: folder.to_string(),
        });
    }

    if targets.is_empty() {
        bail!("target list {} holds no targets", path.display());
    }
    Ok(targets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_targets_skips_header_and_blanks() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "URL,Folder Name").unwrap();
        writeln!(file, "https://example.org,example").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "https://example.com/shop , shop ").unwrap();

        let targets = load_targets(file.path()).unwrap();
        assert_eq!(targets.len(), 2);
        assert_eq!(
            targets[0],
            AuditTarget {
                url: "https://example.org".to_string(),
                folder: "example".to_string(),
            }
        );
        assert_eq!(targets[1].folder, "shop");
    }

    #[test]
    fn test_load_targets_rejects_missing_column() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "https://example.org").unwrap();
        assert!(load_targets(file.path()).is_err());
    }
}
