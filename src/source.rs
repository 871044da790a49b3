//! Remote issue source contract.

use crate::error::FetchError;
use crate::types::Issue;
use std::future::Future;

/// Where the cache gets its corpus from.
///
/// A fetch returns the complete set of issues matching `filter`. The cache
/// enforces its own timeout around the call, so implementations do not need to.
pub trait IssueSource: Send + Sync {
    fn fetch(&self, filter: &str) -> impl Future<Output = Result<Vec<Issue>, FetchError>> + Send;
}
