//!
//! src/errors.rs  Oct 18th, 2026
//!
//! Defines enums and methods of error conversion
//! for errors the client uses
//!
//!

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiscoError {
    #[error("config error: {0}")]
    Config(String),
    #[error("http error: {0}")]
    Http(String),
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },
    #[error("parse error: {0}")]
    Parse(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("search for {query:?} failed")]
    SearchFailed {
        query: String,
        #[source]
        source: Box<DiscoError>
    },
    #[error("download of {title:?} by {artist:?} failed")]
    DownloadFailed {
        title: String,
        artist: String,
        #[source]
        source: Box<DiscoError>
    }
}

impl DiscoError {
    pub fn search_failed(query: &str, source: DiscoError) -> Self {
        DiscoError::SearchFailed { query: query.to_string(), source: Box::new(source) }
    }

    pub fn download_failed(title: &str, artist: &str, source: DiscoError) -> Self {
        DiscoError::DownloadFailed {
            title: title.to_string(),
            artist: artist.to_string(),
            source: Box::new(source)
        }
    }
}

impl From<reqwest::Error> for DiscoError {
    fn from(e: reqwest::Error) -> Self { DiscoError::Http(e.to_string()) }
}

impl From<serde_json::Error> for DiscoError {
    fn from(e: serde_json::Error) -> Self { DiscoError::Parse(e.to_string()) }
}

impl From<url::ParseError> for DiscoError {
    fn from(e: url::ParseError) -> Self { DiscoError::Config(format!("invalid url: {e}")) }
}

impl From<tokio::task::JoinError> for DiscoError {
    fn from(e: tokio::task::JoinError) -> Self { DiscoError::Io(std::io::Error::other(e)) }
}
