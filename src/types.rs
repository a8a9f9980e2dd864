//!
//! src/types.rs  Oct 18th, 2026
//!
//! Track entity as the catalog returns it, the key its identity is
//! compared by, and the per-track download states
//!

use std::fmt;
use serde::{Deserialize, Serialize};

/// One catalog search result. The catalog calls the title `body`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    #[serde(rename = "body")]
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub downloaded: bool
}

impl Track {
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self { title: title.into(), artist: artist.into(), downloaded: false }
    }

    /// The one place track identity is decided. `same_identity`, `key`
    /// and `TrackKey::matches` all compare through this.
    fn identity(&self) -> (&str, &str) {
        (&self.title, &self.artist)
    }

    pub fn key(&self) -> TrackKey {
        let (title, artist) = self.identity();
        TrackKey { title: title.to_string(), artist: artist.to_string() }
    }

    pub fn same_identity(&self, other: &Track) -> bool {
        self.identity() == other.identity()
    }

    /// Candidate the orchestrator hands back to the store after a save
    pub fn as_downloaded(&self) -> Track {
        Track { downloaded: true, ..self.clone() }
    }
}

/// Owned identity of a track, `(title, artist)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackKey {
    pub title: String,
    pub artist: String
}

impl TrackKey {
    pub fn matches(&self, track: &Track) -> bool {
        *self == track.key()
    }
}

impl fmt::Display for TrackKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.title, self.artist)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadState {
    NotDownloaded,
    Downloading,
    Downloaded
}

impl DownloadState {
    pub fn as_str(self) -> &'static str {
        match self {
            DownloadState::NotDownloaded => "not downloaded",
            DownloadState::Downloading   => "downloading",
            DownloadState::Downloaded    => "downloaded"
        }
    }
}

impl fmt::Display for DownloadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_catalog_shape() {
        let body = r#"[
            {"body": "Blue Monday", "artist": "New Order"},
            {"body": "Blue", "artist": "Joni Mitchell", "downloaded": true, "extra": 1}
        ]"#;
        let tracks: Vec<Track> = serde_json::from_str(body).unwrap();

        assert_eq!(tracks, vec![
            Track::new("Blue Monday", "New Order"),
            Track { title: "Blue".into(), artist: "Joni Mitchell".into(), downloaded: true },
        ]);
    }

    #[test]
    fn missing_artist_is_a_parse_error() {
        let res: Result<Vec<Track>, _> = serde_json::from_str(r#"[{"body": "x"}]"#);
        assert!(res.is_err());
    }

    #[test]
    fn identity_ignores_downloaded_flag() {
        let a = Track::new("Blue Monday", "New Order");
        let b = a.as_downloaded();

        assert!(a.same_identity(&b));
        assert!(a.key().matches(&b));
        assert!(!a.same_identity(&Track::new("Blue Monday", "Orkestra Obsolete")));
        assert!(!a.same_identity(&Track::new("blue monday", "New Order")));
    }

    #[test]
    fn key_match_agrees_with_same_identity() {
        let tracks = [
            Track::new("Blue", "Joni Mitchell"),
            Track::new("Blue", "Joni Mitchell").as_downloaded(),
            Track::new("Blue", "Eiffel 65"),
            Track::new("Blue Monday", "New Order"),
        ];
        for a in &tracks {
            for b in &tracks {
                assert_eq!(a.key().matches(b), a.same_identity(b), "{a:?} vs {b:?}");
            }
        }
    }
}
