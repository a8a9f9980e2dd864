//!
//! src/fetch.rs  Oct 18th, 2026
//!
//! Defines methods for hitting the catalog and audio-delivery
//! endpoints, plus the service traits the controller and orchestrator
//! are written against
//!

use async_trait::async_trait;
use reqwest::{Client, header, redirect, RequestBuilder, Response};
use url::Url;

use crate::config::{ApiConfig, HttpConfig};
use crate::errors::DiscoError;
use crate::types::Track;

/// Resolves a free text query to a list of tracks
#[async_trait]
pub trait CatalogService: Send + Sync {
    async fn tracklist(&self, query: &str) -> Result<Vec<Track>, DiscoError>;
}

/// Resolves a `(title, artist)` pair to an audio payload
#[async_trait]
pub trait AudioService: Send + Sync {
    async fn song(&self, title: &str, artist: &str) -> Result<Vec<u8>, DiscoError>;
}

/// Client building functionality
fn client_helper(http: &HttpConfig) -> reqwest::ClientBuilder {
    let builder = Client::builder()
        .timeout(http.timeout)
        .connect_timeout(http.connect_timeout)
        .pool_max_idle_per_host(http.pool_max_idle_per_host)
        .pool_idle_timeout(Some(http.pool_idle_timeout))
        .redirect(redirect::Policy::limited(http.max_redirects as usize))
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")));

    if http.system_proxy { builder } else { builder.no_proxy() }
}

fn client_with_headers(http: &HttpConfig, headers: header::HeaderMap) ->
    Result<Client, DiscoError> {
    client_helper(http)
        .default_headers(headers)
        .build()
        .map_err(|e| DiscoError::Http(format!("build client: {e}")))
}

/// Appends path segments to base, percent-encoding each one whole
fn join_segments(base: &Url, segments: &[&str]) -> Result<Url, DiscoError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| DiscoError::Config(format!("base url cannot hold a path: {base}")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Turns any non-success status into an error carrying the url
fn check_status(response: Response) -> Result<Response, DiscoError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(DiscoError::Status { status: status.as_u16(), url: response.url().to_string() })
    }
}

#[derive(Clone, Debug)]
pub struct CatalogClient {
    pub http: Client,
    pub base: Url
}

impl CatalogClient {
    pub fn new(http_config: &HttpConfig, api: &ApiConfig) -> Result<Self, DiscoError> {
        let mut h = header::HeaderMap::new();
        h.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        let http = client_with_headers(http_config, h)?;
        Ok( Self { http, base: api.base_url.clone() } )
    }

    /// GET /tracklist/{query}
    pub fn tracklist_request(&self, query: &str) -> Result<RequestBuilder, DiscoError> {
        let url = join_segments(&self.base, &["tracklist", query])?;
        Ok(self.http.get(url))
    }
}

#[async_trait]
impl CatalogService for CatalogClient {
    async fn tracklist(&self, query: &str) -> Result<Vec<Track>, DiscoError> {
        let response = check_status(self.tracklist_request(query)?.send().await?)?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[derive(Clone, Debug)]
pub struct AudioClient {
    pub http: Client,
    pub base: Url
}

impl AudioClient {
    pub fn new(http_config: &HttpConfig, api: &ApiConfig) -> Result<Self, DiscoError> {
        let mut h = header::HeaderMap::new();
        h.insert(header::CONTENT_TYPE, header::HeaderValue::from_static("application/json"));
        let http = client_with_headers(http_config, h)?;
        Ok( Self { http, base: api.base_url.clone() } )
    }

    /// GET /song?name=...&artist=...
    pub fn song_request(&self, title: &str, artist: &str) -> Result<RequestBuilder, DiscoError> {
        let mut url = join_segments(&self.base, &["song"])?;
        url.query_pairs_mut()
            .append_pair("name", title)
            .append_pair("artist", artist);
        Ok(self.http.get(url))
    }
}

#[async_trait]
impl AudioService for AudioClient {
    async fn song(&self, title: &str, artist: &str) -> Result<Vec<u8>, DiscoError> {
        let response = check_status(self.song_request(title, artist)?.send().await?)?;
        Ok(response.bytes().await?.to_vec())
    }
}
