//! Tests for the container entrypoint: migrate, collect static files, hand over.

use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tempfile::TempDir;

use b2b_wallet::db::repositories::LocalRepository;
use b2b_wallet::db::{MigrationRepository, RepositoryError, RepositoryResult};
use b2b_wallet::entrypoint::{collect_static, exec_command, prepare, run_entrypoint, Handoff};

/// Migrator that records calls and optionally fails.
struct ScriptedMigrator {
    calls: AtomicUsize,
    fail: bool,
}

impl ScriptedMigrator {
    fn new(fail: bool) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail,
        }
    }
}

#[async_trait]
impl MigrationRepository for ScriptedMigrator {
    async fn run_migrations(&self) -> RepositoryResult<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(RepositoryError::connection("database is unreachable"));
        }
        Ok(vec!["20250115120000".to_string()])
    }
}

fn static_source() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("api/css")).unwrap();
    fs::write(dir.path().join("api/index.html"), "<html></html>").unwrap();
    fs::write(dir.path().join("api/css/site.css"), "body {}").unwrap();
    fs::write(dir.path().join("robots.txt"), "User-agent: *").unwrap();
    dir
}

#[test]
fn test_collect_static_copies_tree() {
    let source = static_source();
    let target = TempDir::new().unwrap();
    let root = target.path().join("staticfiles");

    let copied = collect_static(source.path(), &root).unwrap();
    assert_eq!(copied, 3);
    assert_eq!(
        fs::read_to_string(root.join("api/css/site.css")).unwrap(),
        "body {}"
    );
    assert!(root.join("api/index.html").is_file());
    assert!(root.join("robots.txt").is_file());
}

#[test]
fn test_collect_static_overwrites_and_keeps_extra_files() {
    let source = static_source();
    let target = TempDir::new().unwrap();
    let root = target.path();
    fs::create_dir_all(root.join("api")).unwrap();
    fs::write(root.join("api/index.html"), "stale").unwrap();
    fs::write(root.join("uploaded.bin"), "keep").unwrap();

    collect_static(source.path(), root).unwrap();
    assert_eq!(
        fs::read_to_string(root.join("api/index.html")).unwrap(),
        "<html></html>"
    );
    assert_eq!(fs::read_to_string(root.join("uploaded.bin")).unwrap(), "keep");

    // Running again is harmless.
    assert_eq!(collect_static(source.path(), root).unwrap(), 3);
}

#[test]
fn test_collect_static_without_source() {
    let target = TempDir::new().unwrap();
    let root = target.path().join("staticfiles");

    let copied = collect_static(&target.path().join("missing"), &root).unwrap();
    assert_eq!(copied, 0);
    assert!(root.is_dir());
}

#[tokio::test]
async fn test_prepare_runs_migrations_then_collects() {
    let source = static_source();
    let target = TempDir::new().unwrap();
    let root = target.path().join("staticfiles");
    let migrator = ScriptedMigrator::new(false);

    let prep = prepare(&migrator, source.path(), &root).await.unwrap();
    assert_eq!(migrator.calls.load(Ordering::SeqCst), 1);
    assert_eq!(prep.migrations, vec!["20250115120000".to_string()]);
    assert_eq!(prep.static_files, 3);
}

#[tokio::test]
async fn test_failed_migration_stops_before_static_files() {
    let source = static_source();
    let target = TempDir::new().unwrap();
    let root = target.path().join("staticfiles");
    let migrator = ScriptedMigrator::new(true);

    let err = prepare(&migrator, source.path(), &root).await.unwrap_err();
    assert!(format!("{:#}", err).contains("Database migration failed"));
    assert!(!root.exists());

    let err = run_entrypoint(&migrator, source.path(), &root, &["true".to_string()])
        .await
        .unwrap_err();
    assert!(format!("{:#}", err).contains("database is unreachable"));
    assert!(!root.exists());
}

#[tokio::test]
async fn test_entrypoint_without_command_serves_in_process() {
    let source = static_source();
    let target = TempDir::new().unwrap();
    let root = target.path().join("staticfiles");
    let repo = LocalRepository::new();

    let handoff = run_entrypoint(&repo, source.path(), &root, &[]).await.unwrap();
    assert_eq!(handoff, Handoff::ServeInProcess);
    assert!(root.join("robots.txt").is_file());
}

#[tokio::test]
async fn test_entrypoint_reports_unknown_command() {
    let source = static_source();
    let target = TempDir::new().unwrap();
    let root = target.path().join("staticfiles");
    let repo = LocalRepository::new();

    let argv = vec![
        "/nonexistent/wallet-command".to_string(),
        "--flag".to_string(),
    ];
    let err = run_entrypoint(&repo, source.path(), &root, &argv)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("/nonexistent/wallet-command"));
    // Preparation already happened.
    assert!(root.join("api/index.html").is_file());
}

#[test]
fn test_exec_requires_a_command() {
    let err = exec_command(&[]);
    assert!(err.to_string().contains("No command"));
}
