#[path = "helpers/mod.rs"]
mod helpers;

use cdnizer_core::{IncludeRule, Outcome, SourceFilter};
use cdnizer_pipeline::AssetHook;
use helpers::{MockMode, MockStorage, Project, RecordingReport};
use std::sync::Arc;

async fn hook(
    project: &Project,
    storage: Arc<MockStorage>,
    include: IncludeRule,
) -> (AssetHook, Arc<RecordingReport>) {
    let report = Arc::new(RecordingReport::default());
    let coordinator = project.coordinator(storage, false, true).await;
    let hook = AssetHook::new(coordinator, include, SourceFilter::default())
        .with_report(report.clone());
    (hook, report)
}

#[tokio::test]
async fn test_transform_replaces_usable_asset() {
    let project = Project::new();
    let asset = project.asset("src/assets/logo.png", b"png");
    let storage = Arc::new(MockStorage::new());
    let (hook, report) = hook(&project, storage.clone(), IncludeRule::default()).await;

    let replacement = hook.transform(&asset).await.unwrap();
    assert_eq!(
        replacement.as_deref(),
        Some("export default 'https://cdn.example.com/shop/logo.png';")
    );

    let lines = report.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].0.ends_with("/src/assets/logo.png"));
    assert_eq!(lines[0].1.outcome, Outcome::Uploaded);
}

#[tokio::test]
async fn test_banner_printed_once_before_first_asset() {
    let project = Project::new();
    let first = project.asset("src/a.png", b"a");
    let second = project.asset("src/b.svg", b"b");
    let storage = Arc::new(MockStorage::new());
    let (hook, report) = hook(&project, storage, IncludeRule::default()).await;

    let skipped = project.asset("src/main.ts", b"export {}");
    hook.transform(&skipped).await.unwrap();
    assert_eq!(report.banners(), 0);

    hook.transform(&first).await.unwrap();
    hook.transform(&second).await.unwrap();
    hook.transform(&first).await.unwrap();

    assert_eq!(report.banners(), 1);
    assert_eq!(report.lines().len(), 3);
    assert_eq!(report.lines()[2].1.outcome, Outcome::CachedHit);
}

#[tokio::test]
async fn test_paths_outside_source_dir_are_ignored() {
    let project = Project::new();
    let asset = project.asset("public/logo.png", b"png");
    let storage = Arc::new(MockStorage::new());
    let (hook, report) = hook(&project, storage.clone(), IncludeRule::default()).await;

    assert_eq!(hook.transform(&asset).await.unwrap(), None);
    assert_eq!(storage.calls(), 0);
    assert_eq!(report.banners(), 0);
}

#[tokio::test]
async fn test_extension_rule_is_exact() {
    let project = Project::new();
    let upper = project.asset("src/photo.PNG", b"png");
    let webp = project.asset("src/photo.webp", b"webp");
    let storage = Arc::new(MockStorage::new());
    let (hook, _) = hook(&project, storage.clone(), IncludeRule::default()).await;

    assert_eq!(hook.transform(&upper).await.unwrap(), None);
    assert_eq!(hook.transform(&webp).await.unwrap(), None);
    assert_eq!(storage.calls(), 0);
}

#[tokio::test]
async fn test_predicate_rule_sees_normalized_path() {
    let project = Project::new();
    let wanted = project.asset("src/icons/x.dat", b"x");
    let unwanted = project.asset("src/other/y.dat", b"y");
    let storage = Arc::new(MockStorage::new());
    let include = IncludeRule::predicate(|path| path.contains("/src/icons/"));
    let (hook, _) = hook(&project, storage.clone(), include).await;

    assert!(hook.transform(&wanted).await.unwrap().is_some());
    assert!(hook.transform(&unwanted).await.unwrap().is_none());
    assert_eq!(storage.calls(), 1);
}

#[tokio::test]
async fn test_failed_upload_keeps_original_reference() {
    let project = Project::new();
    let asset = project.asset("src/logo.png", b"png");
    let storage = Arc::new(MockStorage::with_mode(MockMode::Fail));
    let (hook, report) = hook(&project, storage, IncludeRule::default()).await;

    assert_eq!(hook.transform(&asset).await.unwrap(), None);

    let lines = report.lines();
    assert_eq!(lines[0].1.outcome, Outcome::Failed);
    assert!(lines[0].1.detail.is_some());
}

#[tokio::test]
async fn test_not_found_keeps_original_reference() {
    let project = Project::new();
    let asset = project.asset("src/logo.png", b"png");
    let storage = Arc::new(MockStorage::with_mode(MockMode::NoResponse));
    let (hook, report) = hook(&project, storage, IncludeRule::default()).await;

    assert_eq!(hook.transform(&asset).await.unwrap(), None);
    assert_eq!(report.lines()[0].1.outcome, Outcome::NotFound);
}
