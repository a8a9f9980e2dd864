//!
//! src/download.rs  Oct 18th, 2026
//!
//! Per-track download state machine
//!
//!   NotDownloaded -> Downloading -> Downloaded
//!                         |
//!                         +--(error)--> NotDownloaded
//!
//! `Downloading` lives only here, in the in-flight set. `Downloaded` is
//! read off the stored track, and the only write this module makes to the
//! list is the identity merge of a track that finished saving.
//!

use std::{collections::HashSet, path::PathBuf, sync::Arc};

use tokio::{sync::watch, task::JoinHandle};
use tokio_util::task::TaskTracker;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::errors::DiscoError;
use crate::fetch::AudioService;
use crate::sink::SaveSink;
use crate::store::{MergeResult, TrackStore};
use crate::types::{DownloadState, Track, TrackKey};

type InFlight = Arc<watch::Sender<HashSet<TrackKey>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AlreadyDownloading,
    AlreadyDownloaded
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Saved to `path`; `merge` says whether the track was still listed
    Completed { path: PathBuf, merge: MergeResult },
    Failed,
    Skipped(SkipReason)
}

/// Marks a key as downloading; unmarks it when dropped, however the
/// download ends
struct InFlightGuard {
    in_flight: InFlight,
    key: TrackKey
}

impl InFlightGuard {
    fn claim(in_flight: &InFlight, key: TrackKey) -> Option<Self> {
        let claimed = in_flight.send_if_modified(|set| set.insert(key.clone()));
        claimed.then(|| Self { in_flight: in_flight.clone(), key })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight.send_if_modified(|set| set.remove(&self.key));
    }
}

#[derive(Clone)]
pub struct DownloadOrchestrator {
    audio: Arc<dyn AudioService>,
    sink: Arc<dyn SaveSink>,
    store: TrackStore,
    extension: String,
    in_flight: InFlight,
    tracker: TaskTracker
}

impl DownloadOrchestrator {
    pub fn new(
        audio: Arc<dyn AudioService>,
        sink: Arc<dyn SaveSink>,
        store: TrackStore,
        extension: impl Into<String>
    ) -> Self {
        let (in_flight, _rx) = watch::channel(HashSet::new());
        Self {
            audio,
            sink,
            store,
            extension: extension.into(),
            in_flight: Arc::new(in_flight),
            tracker: TaskTracker::new()
        }
    }

    pub fn state_of(&self, track: &Track) -> DownloadState {
        if track.downloaded {
            DownloadState::Downloaded
        } else if self.in_flight.borrow().contains(&track.key()) {
            DownloadState::Downloading
        } else {
            DownloadState::NotDownloaded
        }
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.borrow().len()
    }

    /// Fires whenever a track enters or leaves `Downloading`
    pub fn subscribe(&self) -> watch::Receiver<HashSet<TrackKey>> {
        self.in_flight.subscribe()
    }

    pub fn file_name(&self, track: &Track) -> String {
        format!("{}.{}", track.title, self.extension)
    }

    /// True when either the caller's copy or the listed copy is downloaded
    fn already_downloaded(&self, track: &Track) -> bool {
        track.downloaded || self.store.snapshot().iter()
            .any(|stored| stored.downloaded && stored.same_identity(track))
    }

    /// Runs one download to completion. Errors are logged and folded into
    /// the outcome, never returned.
    pub async fn download(&self, track: Track) -> DownloadOutcome {
        if self.already_downloaded(&track) {
            debug!(title = %track.title, artist = %track.artist, "download.skip.downloaded");
            return DownloadOutcome::Skipped(SkipReason::AlreadyDownloaded);
        }
        let Some(_guard) = InFlightGuard::claim(&self.in_flight, track.key()) else {
            debug!(title = %track.title, artist = %track.artist, "download.skip.in_flight");
            return DownloadOutcome::Skipped(SkipReason::AlreadyDownloading);
        };

        let attempt = Uuid::new_v4();
        let span = info_span!("download", %attempt, title = %track.title, artist = %track.artist);
        async {
            let path = match self.fetch_and_save(&track).await {
                Ok(path) => path,
                Err(e) => {
                    let e = DiscoError::download_failed(&track.title, &track.artist, e);
                    warn!(error = %e, cause = ?std::error::Error::source(&e), "download.failed");
                    return DownloadOutcome::Failed;
                }
            };

            let merge = self.store.merge_by_identity(track.as_downloaded());
            if merge == MergeResult::Dropped {
                info!(path = %path.display(), "download.done.stale");
            } else {
                info!(path = %path.display(), "download.done");
            }
            DownloadOutcome::Completed { path, merge }
        }
        .instrument(span)
        .await
    }

    /// Same as `download`, but as its own task so several tracks can be
    /// in flight while the caller keeps going
    pub fn spawn(&self, track: Track) -> JoinHandle<DownloadOutcome> {
        let this = self.clone();
        self.tracker.spawn(async move { this.download(track).await })
    }

    /// Waits for every spawned download to finish
    pub async fn wait_idle(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    async fn fetch_and_save(&self, track: &Track) -> Result<PathBuf, DiscoError> {
        let payload = self.audio.song(&track.title, &track.artist).await?;
        debug!(bytes = payload.len(), "download.fetched");
        self.sink.save(&self.file_name(track), payload).await
    }
}
