use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context;
use cdnizer_core::{CdnizerConfig, Outcome, UploadResult};
use serde::Serialize;

/// Initialize tracing for CLI binaries.
///
/// Logs go to stderr so `--json` output on stdout stays parseable.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Load and validate the configuration used for uploads.
pub fn load_config() -> anyhow::Result<CdnizerConfig> {
    CdnizerConfig::from_env().context(
        "Invalid configuration. Set CDNIZER_BUCKET, CDNIZER_REGION, CDNIZER_SECRET_ID and CDNIZER_SECRET_KEY",
    )
}

/// Load the configuration without requiring storage credentials (cache inspection).
pub fn load_config_unchecked() -> anyhow::Result<CdnizerConfig> {
    dotenvy::from_filename(".env.local").ok();
    dotenvy::dotenv().ok();
    CdnizerConfig::from_lookup(|name| std::env::var(name).ok())
}

pub fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

/// Resolve `path` against `cwd` unless it is already absolute.
///
/// The source directory filter looks for `/src/`, which a bare `src/logo.png` lacks.
pub fn absolute_from(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

/// Outcome counts of one `upload` run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub uploaded: usize,
    pub cached: usize,
    pub not_found: usize,
    pub failed: usize,
}

impl Summary {
    pub fn from_results(results: &[UploadResult]) -> Self {
        results.iter().fold(Self::default(), |mut summary, result| {
            match result.outcome {
                Outcome::Uploaded => summary.uploaded += 1,
                Outcome::CachedHit => summary.cached += 1,
                Outcome::NotFound => summary.not_found += 1,
                Outcome::Failed => summary.failed += 1,
            }
            summary
        })
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} uploaded, {} cached, {} not found, {} failed",
            self.uploaded, self.cached, self.not_found, self.failed
        )
    }
}
