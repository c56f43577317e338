//! Snapshot loader: reads every collection the dashboard needs in parallel
//! and publishes the result only if no newer load started in the meantime.

use crate::store::ManagementStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lci_core::types::{CampaignRecord, Influencer, Partner, Product};
use lci_core::LciResult;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Whole-collection reads from the backing store.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn fetch_posts(&self) -> LciResult<Vec<CampaignRecord>>;
    async fn fetch_influencers(&self) -> LciResult<Vec<Influencer>>;
    async fn fetch_products(&self) -> LciResult<Vec<Product>>;
    async fn fetch_partners(&self) -> LciResult<Vec<Partner>>;
}

#[async_trait]
impl DocumentSource for ManagementStore {
    async fn fetch_posts(&self) -> LciResult<Vec<CampaignRecord>> {
        Ok(self.list_posts())
    }

    async fn fetch_influencers(&self) -> LciResult<Vec<Influencer>> {
        Ok(self.list_influencers())
    }

    async fn fetch_products(&self) -> LciResult<Vec<Product>> {
        Ok(self.list_products())
    }

    async fn fetch_partners(&self) -> LciResult<Vec<Partner>> {
        Ok(self.list_partners())
    }
}

/// Everything the dashboard reads, loaded together.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub ticket: u64,
    pub posts: Vec<CampaignRecord>,
    pub influencers: Vec<Influencer>,
    pub products: Vec<Product>,
    pub partners: Vec<Partner>,
    pub loaded_at: Option<DateTime<Utc>>,
}

fn or_empty<T>(collection: &str, result: LciResult<Vec<T>>) -> Vec<T> {
    result.unwrap_or_else(|e| {
        warn!(collection, error = %e, "Collection fetch failed, using empty collection");
        metrics::counter!("snapshot.fetch_errors", "collection" => collection.to_string()).increment(1);
        Vec::new()
    })
}

pub struct SnapshotLoader {
    source: Arc<dyn DocumentSource>,
    next_ticket: AtomicU64,
    latest: RwLock<Arc<Snapshot>>,
}

impl SnapshotLoader {
    pub fn new(source: Arc<dyn DocumentSource>) -> Self {
        Self {
            source,
            next_ticket: AtomicU64::new(0),
            latest: RwLock::new(Arc::new(Snapshot::default())),
        }
    }

    /// Most recently published snapshot.
    pub fn current(&self) -> Arc<Snapshot> {
        self.latest.read().clone()
    }

    /// Load all collections. Returns `None` when a newer refresh started
    /// while this one was in flight; its result is discarded.
    pub async fn refresh(&self) -> Option<Arc<Snapshot>> {
        let ticket = self.next_ticket.fetch_add(1, Ordering::SeqCst) + 1;

        let (posts, influencers, products, partners) = tokio::join!(
            self.source.fetch_posts(),
            self.source.fetch_influencers(),
            self.source.fetch_products(),
            self.source.fetch_partners(),
        );

        if self.next_ticket.load(Ordering::SeqCst) != ticket {
            debug!(ticket, "Discarding superseded snapshot");
            metrics::counter!("snapshot.discarded").increment(1);
            return None;
        }

        let snapshot = Arc::new(Snapshot {
            ticket,
            posts: or_empty("posts", posts),
            influencers: or_empty("influencers", influencers),
            products: or_empty("products", products),
            partners: or_empty("partners", partners),
            loaded_at: Some(Utc::now()),
        });

        let mut latest = self.latest.write();
        // A later ticket may have been published between the check and the lock.
        if latest.ticket > ticket {
            return None;
        }
        *latest = snapshot.clone();
        debug!(ticket, posts = snapshot.posts.len(), "Snapshot published");
        Some(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::post_request;
    use lci_core::LciError;
    use std::time::Duration;
    use tokio::sync::Notify;

    #[tokio::test]
    async fn test_refresh_publishes_snapshot() {
        let store = Arc::new(ManagementStore::new());
        let req = post_request(&store);
        store.create_post(req, "admin").unwrap();

        let loader = SnapshotLoader::new(store);
        let snapshot = loader.refresh().await.unwrap();
        assert_eq!(snapshot.ticket, 1);
        assert_eq!(snapshot.posts.len(), 1);
        assert_eq!(snapshot.influencers.len(), 1);
        assert_eq!(loader.current().ticket, 1);
    }

    struct FlakySource;

    #[async_trait]
    impl DocumentSource for FlakySource {
        async fn fetch_posts(&self) -> LciResult<Vec<CampaignRecord>> {
            Err(LciError::Store("connection reset".into()))
        }
        async fn fetch_influencers(&self) -> LciResult<Vec<Influencer>> {
            Ok(Vec::new())
        }
        async fn fetch_products(&self) -> LciResult<Vec<Product>> {
            Ok(Vec::new())
        }
        async fn fetch_partners(&self) -> LciResult<Vec<Partner>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_failed_collection_becomes_empty() {
        let loader = SnapshotLoader::new(Arc::new(FlakySource));
        let snapshot = loader.refresh().await.unwrap();
        assert!(snapshot.posts.is_empty());
    }

    /// First posts fetch blocks until released; later fetches return immediately.
    struct GatedSource {
        gate: Notify,
        calls: AtomicU64,
    }

    #[async_trait]
    impl DocumentSource for GatedSource {
        async fn fetch_posts(&self) -> LciResult<Vec<CampaignRecord>> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                self.gate.notified().await;
            }
            Ok(Vec::new())
        }
        async fn fetch_influencers(&self) -> LciResult<Vec<Influencer>> {
            Ok(Vec::new())
        }
        async fn fetch_products(&self) -> LciResult<Vec<Product>> {
            Ok(Vec::new())
        }
        async fn fetch_partners(&self) -> LciResult<Vec<Partner>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_stale_refresh_is_discarded() {
        let source = Arc::new(GatedSource {
            gate: Notify::new(),
            calls: AtomicU64::new(0),
        });
        let loader = Arc::new(SnapshotLoader::new(source.clone()));

        let slow = tokio::spawn({
            let loader = loader.clone();
            async move { loader.refresh().await }
        });
        while source.calls.load(Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        let fresh = loader.refresh().await.unwrap();
        assert_eq!(fresh.ticket, 2);

        source.gate.notify_one();
        let stale = slow.await.unwrap();
        assert!(stale.is_none());
        assert_eq!(loader.current().ticket, 2);
    }
}
