//!
//! src/client.rs  Oct 18th, 2026
//!
//! Wires search, store and downloads together behind the two entry
//! points a front end calls, and renders their combined state as one
//! snapshot
//!

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::config::AppConfig;
use crate::download::{DownloadOrchestrator, DownloadOutcome};
use crate::errors::DiscoError;
use crate::fetch::{AudioClient, AudioService, CatalogClient, CatalogService};
use crate::search::{SearchController, SearchOutcome};
use crate::sink::{DiskSink, SaveSink};
use crate::store::{TrackList, TrackStore};
use crate::types::{DownloadState, Track};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackRow {
    pub track: Track,
    pub state: DownloadState
}

/// Everything a renderer needs, taken at one instant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    pub searching: bool,
    pub rows: Vec<TrackRow>
}

#[derive(Clone)]
pub struct DiscoClient {
    store: TrackStore,
    search: SearchController,
    downloads: DownloadOrchestrator
}

impl DiscoClient {
    pub fn new(cfg: &AppConfig) -> Result<Self, DiscoError> {
        let catalog = CatalogClient::new(&cfg.http, &cfg.api)?;
        let audio   = AudioClient::new(&cfg.http, &cfg.api)?;
        let sink    = DiskSink::new(&cfg.downloads.dir);

        Ok(Self::with_services(
            Arc::new(catalog),
            Arc::new(audio),
            Arc::new(sink),
            &cfg.downloads.extension
        ))
    }

    pub fn with_services(
        catalog: Arc<dyn CatalogService>,
        audio: Arc<dyn AudioService>,
        sink: Arc<dyn SaveSink>,
        extension: &str
    ) -> Self {
        let store = TrackStore::new();
        let search = SearchController::new(catalog, store.clone());
        let downloads = DownloadOrchestrator::new(audio, sink, store.clone(), extension);
        Self { store, search, downloads }
    }

    pub async fn submit(&self, query: &str) -> SearchOutcome {
        self.search.submit(query).await
    }

    pub fn download(&self, track: Track) -> JoinHandle<DownloadOutcome> {
        self.downloads.spawn(track)
    }

    pub async fn wait_idle(&self) {
        self.downloads.wait_idle().await
    }

    pub fn tracks(&self) -> TrackList {
        self.store.snapshot()
    }

    pub fn store(&self) -> &TrackStore {
        &self.store
    }

    pub fn search(&self) -> &SearchController {
        &self.search
    }

    pub fn downloads(&self) -> &DownloadOrchestrator {
        &self.downloads
    }

    pub fn view(&self) -> View {
        let rows = self.store.snapshot().iter()
            .map(|track| TrackRow { track: track.clone(), state: self.downloads.state_of(track) })
            .collect();
        View { searching: self.search.is_pending(), rows }
    }
}
