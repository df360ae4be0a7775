//! Rules deciding which files the build hook intercepts.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::constants::{DEFAULT_INCLUDE_EXTENSIONS, DEFAULT_SOURCE_DIR};

/// Render a path with forward slashes regardless of platform.
pub fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Extension of a normalized path, including the leading dot (empty if none).
fn extension_of(normalized: &str) -> &str {
    let file_name = normalized.rsplit('/').next().unwrap_or(normalized);
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => &file_name[idx..],
        _ => "",
    }
}

type IncludePredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Which asset files qualify for upload.
#[derive(Clone)]
pub enum IncludeRule {
    /// Match the verbatim extension (with leading dot) against a set.
    Extensions(BTreeSet<String>),
    /// Arbitrary predicate over the normalized path.
    Predicate(IncludePredicate),
}

impl IncludeRule {
    /// Build an extension rule. Entries may be given with or without the leading dot.
    pub fn extensions<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim().to_string())
            .filter(|ext| !ext.is_empty() && ext != ".")
            .map(|ext| {
                if ext.starts_with('.') {
                    ext
                } else {
                    format!(".{ext}")
                }
            })
            .collect();
        IncludeRule::Extensions(set)
    }

    pub fn predicate<F>(predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        IncludeRule::Predicate(Arc::new(predicate))
    }

    /// Whether `normalized_path` (forward slashes) qualifies.
    pub fn matches(&self, normalized_path: &str) -> bool {
        match self {
            IncludeRule::Extensions(set) => set.contains(extension_of(normalized_path)),
            IncludeRule::Predicate(predicate) => predicate(normalized_path),
        }
    }
}

impl Default for IncludeRule {
    fn default() -> Self {
        IncludeRule::extensions(DEFAULT_INCLUDE_EXTENSIONS.iter().copied())
    }
}

impl fmt::Debug for IncludeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IncludeRule::Extensions(set) => f.debug_tuple("Extensions").field(set).finish(),
            IncludeRule::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Restricts interception to files under a named source directory.
///
/// A path qualifies when it contains `/{segment}/`. An empty segment accepts everything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFilter {
    needle: Option<String>,
}

impl SourceFilter {
    pub fn new(segment: &str) -> Self {
        let segment = segment.trim_matches('/');
        let needle = if segment.is_empty() {
            None
        } else {
            Some(format!("/{segment}/"))
        };
        Self { needle }
    }

    pub fn any() -> Self {
        Self { needle: None }
    }

    pub fn matches(&self, normalized_path: &str) -> bool {
        match &self.needle {
            Some(needle) => normalized_path.contains(needle.as_str()),
            None => true,
        }
    }
}

impl Default for SourceFilter {
    fn default() -> Self {
        SourceFilter::new(DEFAULT_SOURCE_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rule_matches_common_images() {
        let rule = IncludeRule::default();
        for path in ["/p/src/a.png", "/p/src/a.jpg", "/p/src/a.jpeg", "/p/src/a.svg", "/p/src/a.gif"] {
            assert!(rule.matches(path), "{path}");
        }
        assert!(!rule.matches("/p/src/a.ts"));
        assert!(!rule.matches("/p/src/png"));
    }

    #[test]
    fn extension_match_is_verbatim() {
        let rule = IncludeRule::default();
        assert!(!rule.matches("/p/src/A.PNG"));
    }

    #[test]
    fn extensions_accept_missing_dot() {
        let rule = IncludeRule::extensions(["webp", ".avif", ""]);
        assert!(rule.matches("/p/src/a.webp"));
        assert!(rule.matches("/p/src/a.avif"));
        assert!(!rule.matches("/p/src/noext"));
    }

    #[test]
    fn dot_in_directory_does_not_count_as_extension() {
        let rule = IncludeRule::extensions([".png"]);
        assert!(!rule.matches("/p/src.png/readme"));
    }

    #[test]
    fn predicate_rule_receives_normalized_path() {
        let rule = IncludeRule::predicate(|p| p.ends_with("/logo.svg"));
        assert!(rule.matches("/p/src/logo.svg"));
        assert!(!rule.matches("/p/src/other.svg"));
    }

    #[test]
    fn source_filter_requires_directory_segment() {
        let filter = SourceFilter::default();
        assert!(filter.matches("/home/dev/app/src/assets/a.png"));
        assert!(!filter.matches("/home/dev/app/public/a.png"));
        assert!(!filter.matches("/home/dev/app/srcs/a.png"));
        assert!(SourceFilter::new("").matches("/anything.png"));
        assert!(SourceFilter::any().matches("relative.png"));
    }

    #[test]
    fn normalize_path_uses_forward_slashes() {
        assert_eq!(
            normalize_path(Path::new("C:\\app\\src\\a.png")),
            "C:/app/src/a.png"
        );
    }
}
