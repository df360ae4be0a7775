//! Console report printed while a build processes assets.
//!
//! One banner before the first asset, then one line per asset:
//!
//! ```text
//! [14:02:07] (success) /work/site/src/logo.png => https://cdn.example.com/site/logo.png
//! [14:02:07] (error: Upload failed: AccessDenied) /work/site/src/a.svg => https://...
//! ```

use cdnizer_core::{Outcome, UploadResult};
use owo_colors::OwoColorize;

pub const BANNER: &str = "\n-------------------------------------------------------\n\t\t cdnizer upload log\n-------------------------------------------------------";

/// Where the hook sends its human-facing output.
pub trait ReportSink: Send + Sync {
    fn banner(&self);
    fn asset(&self, source: &str, result: &UploadResult);
}

/// Colored stdout report.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReport;

impl ReportSink for ConsoleReport {
    fn banner(&self) {
        println!("{}", BANNER.bright_black().bold());
    }

    fn asset(&self, source: &str, result: &UploadResult) {
        let time = chrono::Local::now().format("%H:%M:%S").to_string();
        let line = format_line(&time, source, result);
        match result.outcome {
            Outcome::Uploaded => println!("{}", line.green().bold()),
            Outcome::CachedHit => println!("{}", line.blue().bold()),
            Outcome::Failed => println!("{}", line.red().bold()),
            Outcome::NotFound => println!("{}", line.bright_black().bold()),
        }
    }
}

/// Uncolored report line for `result`.
pub fn format_line(time: &str, source: &str, result: &UploadResult) -> String {
    let level = result.outcome.level();
    let prefix = match &result.detail {
        Some(detail) => format!("{level}: {detail}"),
        None => level.to_string(),
    };
    format!("[{time}] ({prefix}) {source} => {}", result.url)
}
