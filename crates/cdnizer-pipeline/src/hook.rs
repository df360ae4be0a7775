//! Build hook adapter.
//!
//! A bundler calls [`AssetHook::transform`] for every module it loads. Paths outside
//! the source directory or not matching the include rule are left alone; qualifying
//! assets go through the coordinator and, when the upload is usable, are replaced by
//! a module exporting their public URL.

use std::path::Path;
use std::sync::{Arc, Once};

use cdnizer_core::{normalize_path, CdnizerConfig, IncludeRule, SourceFilter};

use crate::coordinator::UploadCoordinator;
use crate::error::PipelineError;
use crate::report::{ConsoleReport, ReportSink};

pub struct AssetHook {
    coordinator: UploadCoordinator,
    include: IncludeRule,
    source_filter: SourceFilter,
    report: Arc<dyn ReportSink>,
    banner: Once,
}

impl AssetHook {
    pub fn new(
        coordinator: UploadCoordinator,
        include: IncludeRule,
        source_filter: SourceFilter,
    ) -> Self {
        Self {
            coordinator,
            include,
            source_filter,
            report: Arc::new(ConsoleReport),
            banner: Once::new(),
        }
    }

    pub async fn from_config(config: &CdnizerConfig) -> anyhow::Result<Self> {
        let coordinator = UploadCoordinator::from_config(config).await?;
        Ok(Self::new(
            coordinator,
            config.include.clone(),
            config.source_filter(),
        ))
    }

    pub fn with_report(mut self, report: Arc<dyn ReportSink>) -> Self {
        self.report = report;
        self
    }

    pub fn coordinator(&self) -> &UploadCoordinator {
        &self.coordinator
    }

    /// Whether a normalized (forward slash) path is intercepted.
    pub fn qualifies(&self, normalized_path: &str) -> bool {
        self.source_filter.matches(normalized_path) && self.include.matches(normalized_path)
    }

    /// Replacement module source for `path`, or `None` to keep the original reference.
    pub async fn transform(&self, path: &Path) -> Result<Option<String>, PipelineError> {
        let normalized = normalize_path(path);
        if !self.qualifies(&normalized) {
            return Ok(None);
        }

        self.banner.call_once(|| self.report.banner());

        let result = self.coordinator.upload(path).await?;
        self.report.asset(&normalized, &result);

        Ok(result.module_replacement())
    }
}
