//! Shared test fixtures and utilities for integration tests.
//!
//! # Available Fixtures
//!
//! - `snapshot_dir`: a fresh temporary directory for the snapshot file
//! - `sample_issues`: a small mixed corpus used across engine tests
//!
//! [`FakeSource`] is an in-memory [`IssueSource`] whose responses can be
//! switched between success, failure and hanging, and which counts fetches.

use rstest::fixture;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;
use tracker_dedup::config::LogFormat;
use tracker_dedup::{CacheSettings, FetchError, Issue, IssueSource};

/// What the fake source does on the next fetch.
#[allow(dead_code)] // Variants used across different integration test crates
#[derive(Debug, Clone)]
pub enum Behavior {
    Return(Vec<Issue>),
    Fail,
    Hang,
}

/// In-memory issue source that records every fetch.
pub struct FakeSource {
    behavior: Mutex<Behavior>,
    fetches: AtomicUsize,
}

#[allow(dead_code)] // Methods used across different integration test crates
impl FakeSource {
    pub fn returning(issues: Vec<Issue>) -> Self {
        Self {
            behavior: Mutex::new(Behavior::Return(issues)),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            behavior: Mutex::new(Behavior::Fail),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn set(&self, behavior: Behavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl IssueSource for FakeSource {
    async fn fetch(&self, _filter: &str) -> Result<Vec<Issue>, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let behavior = self.behavior.lock().unwrap().clone();
        match behavior {
            Behavior::Return(issues) => Ok(issues),
            Behavior::Fail => Err(FetchError::Transport("connection refused".to_string())),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(vec![])
            }
        }
    }
}

impl IssueSource for &FakeSource {
    async fn fetch(&self, filter: &str) -> Result<Vec<Issue>, FetchError> {
        (**self).fetch(filter).await
    }
}

/// A temporary directory that holds the snapshot file for one test.
pub struct SnapshotDir {
    _temp: TempDir,
    pub path: PathBuf,
}

#[allow(dead_code)]
impl SnapshotDir {
    pub fn settings(&self) -> CacheSettings {
        CacheSettings {
            path: self.path.clone(),
            fetch_timeout: Duration::from_millis(200),
            ..CacheSettings::default()
        }
    }

    pub fn settings_with_ttl(&self, ttl: Duration) -> CacheSettings {
        CacheSettings {
            ttl,
            ..self.settings()
        }
    }
}

#[fixture]
pub fn snapshot_dir() -> SnapshotDir {
    tracker_dedup::tracing::init(LogFormat::Compact, true);
    let temp = TempDir::new().expect("Failed to create temp dir");
    let path = temp.path().join("issues.json");
    SnapshotDir { _temp: temp, path }
}

#[fixture]
pub fn sample_issues() -> Vec<Issue> {
    vec![
        Issue::new("T-1", "Login fails", "User cannot authenticate"),
        Issue::new("T-2", "Save button broken", "Button inactive after form fill"),
        Issue::new(
            "T-3",
            "Profile avatar not displayed",
            "User avatar image does not load on the profile page",
        ),
        Issue::new("T-4", "Export to CSV times out", ""),
        Issue::new(
            "T-5",
            "Login page slow",
            "Authentication takes more than ten seconds for every user",
        ),
    ]
}
