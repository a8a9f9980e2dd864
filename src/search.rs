//!
//! src/search.rs  Oct 18th, 2026
//!
//! Search controller: one catalog request per submission, a whole-list
//! replace on success, and the previous list kept on any failure
//!

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use tokio::sync::watch;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use crate::errors::DiscoError;
use crate::fetch::CatalogService;
use crate::store::TrackStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    Replaced { count: usize },
    Failed,
    // a later submission was made while this one was in flight
    Superseded
}

type Pending = Arc<watch::Sender<usize>>;

/// Holds the pending count up for as long as one submission lives
struct PendingGuard(Pending);

impl PendingGuard {
    fn enter(pending: &Pending) -> Self {
        pending.send_modify(|n| *n += 1);
        Self(pending.clone())
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.send_modify(|n| *n -= 1);
    }
}

#[derive(Clone)]
pub struct SearchController {
    catalog: Arc<dyn CatalogService>,
    store: TrackStore,
    pending: Pending,
    generation: Arc<AtomicU64>
}

impl SearchController {
    pub fn new(catalog: Arc<dyn CatalogService>, store: TrackStore) -> Self {
        let (pending, _rx) = watch::channel(0);
        Self {
            catalog,
            store,
            pending: Arc::new(pending),
            generation: Arc::new(AtomicU64::new(0))
        }
    }

    pub fn is_pending(&self) -> bool {
        *self.pending.borrow() > 0
    }

    /// Number of submissions in flight; fires when a search starts or ends
    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.pending.subscribe()
    }

    /// Query goes out verbatim, empty string included. Failures stay in
    /// the log; the caller only ever sees the outcome.
    pub async fn submit(&self, query: &str) -> SearchOutcome {
        let _pending = PendingGuard::enter(&self.pending);
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let attempt = Uuid::new_v4();

        let span = info_span!("search", %attempt, query = %query, ticket);
        async {
            let tracks = match self.catalog.tracklist(query).await {
                Ok(tracks) => tracks,
                Err(e) => {
                    let e = DiscoError::search_failed(query, e);
                    warn!(error = %e, cause = ?std::error::Error::source(&e), "search.failed");
                    return SearchOutcome::Failed;
                }
            };

            if self.generation.load(Ordering::SeqCst) != ticket {
                info!(count = tracks.len(), "search.superseded");
                return SearchOutcome::Superseded;
            }

            let count = tracks.len();
            self.store.replace(tracks);
            info!(count, "search.done");
            SearchOutcome::Replaced { count }
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{collections::HashMap, sync::Mutex};

    use async_trait::async_trait;
    use tokio::sync::oneshot;

    use crate::types::Track;

    type Reply = Result<Vec<Track>, DiscoError>;

    /// Catalog whose replies are either canned or held back until released
    #[derive(Default)]
    struct FakeCatalog {
        canned: Mutex<HashMap<String, Vec<Track>>>,
        gated: Mutex<HashMap<String, oneshot::Receiver<Reply>>>,
        calls: Mutex<Vec<String>>
    }

    impl FakeCatalog {
        fn with(query: &str, tracks: Vec<Track>) -> Self {
            let fake = Self::default();
            fake.canned.lock().unwrap().insert(query.to_string(), tracks);
            fake
        }

        fn gate(&self, query: &str) -> oneshot::Sender<Reply> {
            let (tx, rx) = oneshot::channel();
            self.gated.lock().unwrap().insert(query.to_string(), rx);
            tx
        }
    }

    #[async_trait]
    impl CatalogService for FakeCatalog {
        async fn tracklist(&self, query: &str) -> Result<Vec<Track>, DiscoError> {
            self.calls.lock().unwrap().push(query.to_string());
            let gate = self.gated.lock().unwrap().remove(query);
            if let Some(rx) = gate {
                return rx.await.unwrap_or_else(|_| Err(DiscoError::Http("gate dropped".into())));
            }
            self.canned.lock().unwrap().get(query).cloned()
                .ok_or(DiscoError::Status { status: 500, url: format!("/tracklist/{query}") })
        }
    }

    fn blue() -> Vec<Track> {
        vec![Track::new("Blue Monday", "New Order"), Track::new("Blue", "Joni Mitchell")]
    }

    #[tokio::test]
    async fn success_replaces_list_in_response_order() {
        let store = TrackStore::new();
        let search = SearchController::new(Arc::new(FakeCatalog::with("blue", blue())), store.clone());

        let outcome = search.submit("blue").await;

        assert_eq!(outcome, SearchOutcome::Replaced { count: 2 });
        assert_eq!(*store.snapshot(), blue());
        assert!(!search.is_pending());
    }

    #[tokio::test]
    async fn failure_on_empty_startup_list_keeps_it_empty() {
        let store = TrackStore::new();
        let search = SearchController::new(Arc::new(FakeCatalog::default()), store.clone());

        assert_eq!(search.submit("blue").await, SearchOutcome::Failed);
        assert!(store.snapshot().is_empty());
        assert!(!search.is_pending());
    }

    #[tokio::test]
    async fn failure_keeps_previous_list() {
        let store = TrackStore::new();
        let search = SearchController::new(Arc::new(FakeCatalog::with("blue", blue())), store.clone());
        search.submit("blue").await;
        let before = store.snapshot();

        assert_eq!(search.submit("red").await, SearchOutcome::Failed);
        assert_eq!(*store.snapshot(), *before);
    }

    #[tokio::test]
    async fn empty_query_is_sent_verbatim() {
        let catalog = Arc::new(FakeCatalog::with("", Vec::new()));
        let search = SearchController::new(catalog.clone(), TrackStore::new());

        assert_eq!(search.submit("").await, SearchOutcome::Replaced { count: 0 });
        assert_eq!(*catalog.calls.lock().unwrap(), vec![String::new()]);
    }

    #[tokio::test]
    async fn pending_while_in_flight() {
        let catalog = Arc::new(FakeCatalog::default());
        let release = catalog.gate("blue");
        let store = TrackStore::new();
        let search = SearchController::new(catalog, store.clone());

        let mut pending = search.subscribe();

        let task = tokio::spawn({
            let search = search.clone();
            async move { search.submit("blue").await }
        });
        pending.changed().await.unwrap();
        assert_eq!(*pending.borrow_and_update(), 1);
        assert!(search.is_pending());

        release.send(Ok(blue())).unwrap();
        pending.changed().await.unwrap();
        assert_eq!(*pending.borrow_and_update(), 0);
        assert_eq!(task.await.unwrap(), SearchOutcome::Replaced { count: 2 });
        assert!(!search.is_pending());
    }

    #[tokio::test]
    async fn slower_older_search_does_not_clobber_newer_one() {
        let catalog = Arc::new(FakeCatalog::with("red", vec![Track::new("Red Red Wine", "UB40")]));
        let release_blue = catalog.gate("blue");
        let store = TrackStore::new();
        let search = SearchController::new(catalog, store.clone());

        let older = tokio::spawn({
            let search = search.clone();
            async move { search.submit("blue").await }
        });
        while !search.is_pending() {
            tokio::task::yield_now().await;
        }
        assert_eq!(search.submit("red").await, SearchOutcome::Replaced { count: 1 });

        release_blue.send(Ok(blue())).unwrap();
        assert_eq!(older.await.unwrap(), SearchOutcome::Superseded);
        assert_eq!(*store.snapshot(), vec![Track::new("Red Red Wine", "UB40")]);
    }
}
