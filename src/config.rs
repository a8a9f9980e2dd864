//!
//! src/config.rs  Oct 18th, 2026
//!
//! Reads environment (and .env) into the configuration used by the
//! http clients, the save sink and the logger
//!

use std::{path::PathBuf, time};
use url::Url;
use crate::errors::DiscoError;

/// Constants for HTTP Config
pub const HTTP_TIMEOUT: u64 = 30000;
pub const HTTP_CONNECT_TIMEOUT: u64 = 2000;
pub const HTTP_POOL_MAX_IDLE: usize = 8;
pub const HTTP_POOL_IDLE_TIMEOUT: u64 = 90000;
pub const HTTP_MAX_REDIRECTS: u8 = 4;

pub const DEFAULT_API_BASE: &str = "http://localhost:5000/api/";
pub const DEFAULT_DOWNLOAD_DIR: &str = "./downloads";
pub const DEFAULT_AUDIO_EXT: &str = "mp3";
pub const DEFAULT_LOG_FILTER: &str = "info,disco_client=debug,reqwest=warn";

/// Ensures that url is served over http(s)
fn ensure_http(url: &Url) -> Result<(), String> {
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("URL must be http or https (got {other}): {url}"))
    }
}

fn ensure_trailing_slash(url: &mut Url) {
    if !url.path().ends_with('/') {
        let mut path = url.path().to_string();
        path.push('/');
        url.set_path(&path);
    }
}

///
/// Configuration for the catalog and audio-delivery api
///
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: Url    // both services hang off the same base
}

fn build_api(env: &impl Fn(&str) -> Option<String>) -> Result<ApiConfig, DiscoError> {
    let base_url = env("DISCO_API_BASE")
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

    let mut base_url = Url::parse(base_url.trim())
        .map_err(|e| DiscoError::Config(format!("DISCO_API_BASE invalid {e}")))?;

    ensure_http(&base_url).map_err(DiscoError::Config)?;
    ensure_trailing_slash(&mut base_url);

    Ok( ApiConfig { base_url } )
}

///
/// Configuration for Http timeouts, pooling, etc.
///
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout: time::Duration,
    pub connect_timeout: time::Duration,
    pub pool_max_idle_per_host: usize,
    pub pool_idle_timeout: time::Duration,
    pub max_redirects: u8,
    pub system_proxy: bool
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: time::Duration::from_millis(HTTP_TIMEOUT),
            connect_timeout: time::Duration::from_millis(HTTP_CONNECT_TIMEOUT),
            pool_max_idle_per_host: HTTP_POOL_MAX_IDLE,
            pool_idle_timeout: time::Duration::from_millis(HTTP_POOL_IDLE_TIMEOUT),
            max_redirects: HTTP_MAX_REDIRECTS,
            system_proxy: true
        }
    }
}

fn build_http(env: &impl Fn(&str) -> Option<String>) -> HttpConfig {
    let env_to_millis = |s: &str, default: time::Duration| -> time::Duration {
        match env(s).and_then(|v| v.trim().parse::<u64>().ok()) {
            Some(ms) if ms > 0 => time::Duration::from_millis(ms),
            _ => default
        }
    };

    let defaults = HttpConfig::default();
    HttpConfig {
        timeout: env_to_millis("DISCO_HTTP_TIMEOUT_MS", defaults.timeout),
        connect_timeout: env_to_millis(
            "DISCO_HTTP_CONNECT_TIMEOUT_MS",
            defaults.connect_timeout
        ),
        system_proxy: env("DISCO_HTTP_NO_PROXY").as_deref() != Some("1"),
        ..defaults
    }
}

///
/// Configuration for where downloaded audio lands
///
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    pub dir: PathBuf,
    pub extension: String
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_DOWNLOAD_DIR),
            extension: DEFAULT_AUDIO_EXT.to_string()
        }
    }
}

fn build_downloads(env: &impl Fn(&str) -> Option<String>) -> Result<DownloadConfig, DiscoError> {
    let mut cfg = DownloadConfig::default();
    if let Some(dir) = env("DISCO_DOWNLOAD_DIR").filter(|v| !v.trim().is_empty()) {
        cfg.dir = PathBuf::from(dir);
    }
    if let Some(ext) = env("DISCO_AUDIO_EXT") {
        let ext = ext.trim().trim_start_matches('.');
        if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(DiscoError::Config(format!("DISCO_AUDIO_EXT invalid: {ext:?}")));
        }
        cfg.extension = ext.to_ascii_lowercase();
    }
    Ok(cfg)
}

///
/// Configuration for Logger
///

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub filter_directives: String,
    pub format: LogFormat,
    pub with_ansi: bool,
    pub include_file_line: bool,
    pub include_target: bool
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter_directives: DEFAULT_LOG_FILTER.to_string(),
            format: LogFormat::Pretty,
            with_ansi: true,
            include_file_line: false,
            include_target: true
        }
    }
}

fn build_logging(env: &impl Fn(&str) -> Option<String>) -> Result<LoggingConfig, DiscoError> {
    let mut cfg = LoggingConfig::default();

    match env("DISCO_LOG_FORMAT").map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        None | Some("") | Some("pretty") => {},
        Some("json") => {
            cfg.format = LogFormat::Json;
            cfg.with_ansi = false;
            cfg.include_file_line = true;
        },
        Some(other) => return Err(DiscoError::Config(
            format!("DISCO_LOG_FORMAT must be pretty or json (got {other})")
        ))
    }

    if let Some(filter) = env("DISCO_LOG_FILTER").filter(|v| !v.trim().is_empty()) {
        cfg.filter_directives = filter;
    }
    Ok(cfg)
}

///
/// AppConfig which holds everything the client needs at start
///
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub http: HttpConfig,
    pub downloads: DownloadConfig,
    pub logging: LoggingConfig
}

/// Builds the configuration from an arbitrary variable lookup
pub fn build_config(env: impl Fn(&str) -> Option<String>) -> Result<AppConfig, DiscoError> {
    let api       = build_api(&env)?;
    let http      = build_http(&env);
    let downloads = build_downloads(&env)?;
    let logging   = build_logging(&env)?;

    Ok( AppConfig { api, http, downloads, logging } )
}

///
/// Return all environment variables to caller at program start.
///
pub fn load_config() -> Result<AppConfig, DiscoError> {
    dotenvy::dotenv().ok();
    build_config(|key| std::env::var(key).ok())
}
