//! Per-realm cache of OpenID Connect discovery documents
//!
//! Each realm maps to a single shared future, so concurrent lookups for the same
//! realm wait on one fetch. A failed fetch is evicted, which makes the next
//! lookup fetch again instead of replaying the failure.

use futures::future::{BoxFuture, FutureExt, Shared};
use log::{debug, warn};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard};

use crate::api::error::CrestError;

type DiscoveryFuture = Shared<BoxFuture<'static, Result<Value, CrestError>>>;

#[derive(Default)]
pub struct DiscoveryCache {
    entries: Mutex<HashMap<String, DiscoveryFuture>>,
}

impl DiscoveryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, DiscoveryFuture>> {
        // Entries are replaced wholesale, so a poisoned map is still consistent
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Return the cached document for `realm`, starting `fetch` if no fetch is
    /// cached or in flight
    pub async fn get_or_fetch<F, Fut>(&self, realm: &str, fetch: F) -> Result<Value, CrestError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, CrestError>> + Send + 'static,
    {
        let future = {
            let mut entries = self.entries();
            entries
                .entry(realm.to_string())
                .or_insert_with(|| {
                    debug!("Fetching discovery document for realm {}", realm);
                    fetch().boxed().shared()
                })
                .clone()
        };

        let result = future.clone().await;

        if result.is_err() {
            let mut entries = self.entries();
            // A newer fetch may already have replaced the failed one
            if entries.get(realm).is_some_and(|current| current.ptr_eq(&future)) {
                entries.remove(realm);
                warn!("Discovery fetch for realm {} failed; evicted from cache", realm);
            }
        }

        result
    }

    /// Drop the entry for `realm`; returns whether one existed
    pub fn invalidate(&self, realm: &str) -> bool {
        self.entries().remove(realm).is_some()
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    pub fn contains(&self, realm: &str) -> bool {
        self.entries().contains_key(realm)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
