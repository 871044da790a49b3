//! Staleness-aware local cache of the issue corpus.
//!
//! The cache serves its snapshot while it is younger than the ttl and goes
//! back to the remote source otherwise. A refresh writes the new snapshot to
//! disk first and only then swaps it in memory, so readers observe either the
//! old corpus or the new one. A failed refresh leaves the previous snapshot
//! in place.

use crate::error::FetchError;
use crate::snapshot::{load_snapshot, save_snapshot};
use crate::source::IssueSource;
use crate::types::Corpus;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};
use tokio::sync::{Mutex, RwLock};

/// Default snapshot lifetime.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// Default upper bound on a single remote fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Cache behaviour, usually derived from [`crate::config::Config`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    /// Snapshot file location
    pub path: PathBuf,
    /// Maximum age of a snapshot served by `get_corpus`
    pub ttl: Duration,
    /// Timeout applied to each remote fetch
    pub fetch_timeout: Duration,
    /// Filter passed through to the remote source
    pub filter: String,
    /// Serve the stale snapshot when a ttl-triggered refresh fails
    pub serve_stale_on_error: bool,
    /// Base URL used to derive issue links from keys
    pub link_base: Option<String>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("issues.json"),
            ttl: DEFAULT_TTL,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            filter: String::new(),
            serve_stale_on_error: false,
            link_base: None,
        }
    }
}

/// Whether the current snapshot may be served without a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Younger than the ttl
    Fresh,
    /// At least as old as the ttl, or no snapshot at all
    Stale,
}

#[derive(Debug)]
struct Snapshot {
    corpus: Arc<Corpus>,
    fetched_at: SystemTime,
}

impl Snapshot {
    fn age(&self) -> Duration {
        SystemTime::now()
            .duration_since(self.fetched_at)
            .unwrap_or(Duration::ZERO)
    }
}

/// Local copy of the issue corpus, refreshed from an [`IssueSource`].
pub struct IssueCache<S> {
    source: S,
    settings: CacheSettings,
    /// Current snapshot, swapped wholesale on refresh
    current: RwLock<Option<Arc<Snapshot>>>,
    /// Serializes fetch-and-replace
    refresh_gate: Mutex<()>,
    fetches: AtomicU64,
}

impl<S> std::fmt::Debug for IssueCache<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssueCache")
            .field("settings", &self.settings)
            .field("fetches", &self.fetches.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl<S: IssueSource> IssueCache<S> {
    /// Create a cache, picking up the snapshot file if one exists.
    ///
    /// A missing or corrupt file leaves the cache empty and stale.
    pub async fn open(source: S, settings: CacheSettings) -> Self {
        let current = load_snapshot(&settings.path).await.map(|stored| {
            let corpus = build_corpus(stored.issues, settings.link_base.as_deref());
            tracing::info!(
                "Loaded snapshot {} with {} issues",
                settings.path.display(),
                corpus.len()
            );
            Arc::new(Snapshot {
                corpus: Arc::new(corpus),
                fetched_at: stored.modified,
            })
        });

        Self {
            source,
            settings,
            current: RwLock::new(current),
            refresh_gate: Mutex::new(()),
            fetches: AtomicU64::new(0),
        }
    }

    /// Get the corpus, fetching a new one if the snapshot is stale.
    pub async fn get_corpus(&self) -> Result<Arc<Corpus>, FetchError> {
        if let Some(corpus) = self.fresh_corpus().await {
            tracing::debug!("Serving cached snapshot with {} issues", corpus.len());
            return Ok(corpus);
        }

        let _gate = self.refresh_gate.lock().await;

        // Another caller may have refreshed while we waited on the gate
        if let Some(corpus) = self.fresh_corpus().await {
            return Ok(corpus);
        }

        tracing::info!("Snapshot missing or stale, refreshing from remote source");
        match self.fetch_and_replace().await {
            Ok(corpus) => Ok(corpus),
            Err(e) if self.settings.serve_stale_on_error => {
                match self.current.read().await.as_ref() {
                    Some(stale) => {
                        tracing::warn!(
                            "Refresh failed, serving stale snapshot ({:?} old): {}",
                            stale.age(),
                            e
                        );
                        Ok(Arc::clone(&stale.corpus))
                    }
                    None => Err(e),
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Fetch and replace the snapshot regardless of its age.
    pub async fn force_refresh(&self) -> Result<Arc<Corpus>, FetchError> {
        let _gate = self.refresh_gate.lock().await;
        tracing::info!("Forced refresh from remote source");
        self.fetch_and_replace().await
    }

    /// Age of the current snapshot, `None` when there is none. Never fetches.
    pub async fn snapshot_age(&self) -> Option<Duration> {
        self.current.read().await.as_ref().map(|s| s.age())
    }

    /// Number of issues in the current snapshot. Never fetches.
    pub async fn snapshot_size(&self) -> usize {
        self.current
            .read()
            .await
            .as_ref()
            .map_or(0, |s| s.corpus.len())
    }

    /// When the current snapshot was fetched. Never fetches.
    pub async fn snapshot_timestamp(&self) -> Option<SystemTime> {
        self.current.read().await.as_ref().map(|s| s.fetched_at)
    }

    /// Freshness of the current snapshot. Never fetches.
    pub async fn state(&self) -> Freshness {
        match self.current.read().await.as_ref() {
            Some(snapshot) if snapshot.age() < self.settings.ttl => Freshness::Fresh,
            _ => Freshness::Stale,
        }
    }

    /// Number of remote fetches attempted by this cache instance.
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::Relaxed)
    }

    pub const fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    async fn fresh_corpus(&self) -> Option<Arc<Corpus>> {
        let current = self.current.read().await;
        current
            .as_ref()
            .filter(|snapshot| snapshot.age() < self.settings.ttl)
            .map(|snapshot| Arc::clone(&snapshot.corpus))
    }

    /// Must be called with the refresh gate held.
    async fn fetch_and_replace(&self) -> Result<Arc<Corpus>, FetchError> {
        let start = std::time::Instant::now();
        self.fetches.fetch_add(1, Ordering::Relaxed);

        let issues = tokio::time::timeout(
            self.settings.fetch_timeout,
            self.source.fetch(&self.settings.filter),
        )
        .await
        .map_err(|_| FetchError::Timeout(self.settings.fetch_timeout))
        .and_then(|fetched| fetched)
        .inspect_err(|e| tracing::error!("Fetch failed, keeping previous snapshot: {}", e))?;

        let corpus = Arc::new(build_corpus(issues, self.settings.link_base.as_deref()));

        let written_at = save_snapshot(&self.settings.path, corpus.issues())
            .await
            .map_err(|source| FetchError::Storage {
                path: self.settings.path.clone(),
                source,
            })
            .inspect_err(|e| tracing::error!("{}", e))?;

        let mut current = self.current.write().await;
        // Timestamps never move backwards, even if the clock does
        let fetched_at = current
            .as_ref()
            .map_or(written_at, |previous| previous.fetched_at.max(written_at));
        *current = Some(Arc::new(Snapshot {
            corpus: Arc::clone(&corpus),
            fetched_at,
        }));

        tracing::info!(
            "Fetched {} issues and saved snapshot {} in {:?}",
            corpus.len(),
            self.settings.path.display(),
            start.elapsed()
        );

        Ok(corpus)
    }
}

fn build_corpus(issues: Vec<crate::types::Issue>, link_base: Option<&str>) -> Corpus {
    match link_base {
        Some(base) => issues
            .into_iter()
            .map(|issue| issue.with_link_base(base))
            .collect(),
        None => Corpus::new(issues),
    }
}
