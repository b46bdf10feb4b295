//! Registry of runs known to this process.
//!
//! The single source of truth for which runs exist locally. Reads take a
//! shared lock and never contend with each other; inserts and removals
//! take the exclusive lock. No network I/O happens under either.

use std::collections::HashMap;
use std::sync::Arc;

use hubwatch_core::types::RunToken;
use tokio::sync::RwLock;

use crate::run::Run;

/// Concurrency-safe map from run token to [`Run`].
///
/// Shared as `Arc<RunRegistry>` between the tracker and its watch tasks.
#[derive(Default)]
pub struct RunRegistry {
    runs: RwLock<HashMap<RunToken, Arc<Run>>>,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the run for `token`, inserting a fresh one if none exists.
    ///
    /// Concurrent callers for the same token all receive the same
    /// instance: the existence check is repeated under the write lock.
    pub async fn get_or_create(&self, token: &str) -> Arc<Run> {
        if let Some(run) = self.runs.read().await.get(token) {
            return Arc::clone(run);
        }

        let mut runs = self.runs.write().await;
        let run = runs
            .entry(token.to_string())
            .or_insert_with(|| {
                tracing::debug!(run_token = token, "Registering run");
                Arc::new(Run::new(token))
            });
        Arc::clone(run)
    }

    pub async fn get(&self, token: &str) -> Option<Arc<Run>> {
        self.runs.read().await.get(token).cloned()
    }

    /// Remove the entry for `token`. A missing token is a no-op.
    pub async fn remove(&self, token: &str) -> Option<Arc<Run>> {
        self.runs.write().await.remove(token)
    }

    /// Remove `run` only if the registry still holds this exact instance.
    ///
    /// A watch finishing late must not evict a run that was deleted and
    /// registered again under the same token in the meantime.
    pub async fn remove_if_same(&self, run: &Arc<Run>) -> bool {
        let mut runs = self.runs.write().await;
        match runs.get(run.token()) {
            Some(current) if Arc::ptr_eq(current, run) => {
                runs.remove(run.token());
                true
            }
            _ => false,
        }
    }

    pub async fn contains(&self, token: &str) -> bool {
        self.runs.read().await.contains_key(token)
    }

    pub async fn len(&self) -> usize {
        self.runs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.runs.read().await.is_empty()
    }

    pub async fn tokens(&self) -> Vec<RunToken> {
        self.runs.read().await.keys().cloned().collect()
    }

    /// Snapshot of every registered run.
    pub async fn runs(&self) -> Vec<Arc<Run>> {
        self.runs.read().await.values().cloned().collect()
    }
}
