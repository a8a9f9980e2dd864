//!
//! src/store.rs  Oct 18th, 2026
//!
//! Sole owner of the visible track list. Every write publishes a new
//! snapshot; a snapshot already handed out never changes underneath
//! its reader
//!

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use crate::types::Track;

pub type TrackList = Arc<Vec<Track>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeResult {
    Applied,
    // matched, but the list already held this exact value
    Unchanged,
    // nothing in the current list has this identity
    Dropped
}

#[derive(Debug, Clone)]
pub struct TrackStore {
    tracks: Arc<watch::Sender<TrackList>>
}

impl Default for TrackStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Arc::new(Vec::new()));
        Self { tracks: Arc::new(tx) }
    }

    pub fn snapshot(&self) -> TrackList {
        self.tracks.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<TrackList> {
        self.tracks.subscribe()
    }

    pub fn replace(&self, tracks: Vec<Track>) {
        debug!(count = tracks.len(), "store.replace");
        self.tracks.send_replace(Arc::new(tracks));
    }

    /// Substitutes, in place, every element sharing `updated`'s identity.
    /// Length and order of the list never change.
    pub fn merge_by_identity(&self, updated: Track) -> MergeResult {
        let mut result = MergeResult::Dropped;
        self.tracks.send_if_modified(|current| {
            let mut matched = false;
            let mut differs = false;
            for track in current.iter().filter(|t| t.same_identity(&updated)) {
                matched = true;
                differs |= *track != updated;
            }

            result = match (matched, differs) {
                (false, _) => MergeResult::Dropped,
                (true, false) => MergeResult::Unchanged,
                (true, true) => MergeResult::Applied
            };
            if result != MergeResult::Applied {
                return false;
            }

            let next = current.iter()
                .map(|t| if t.same_identity(&updated) { updated.clone() } else { t.clone() })
                .collect();
            *current = Arc::new(next);
            true
        });

        debug!(title = %updated.title, artist = %updated.artist, ?result, "store.merge");
        result
    }
}
