//!
//! src/lib.rs  Oct 18th, 2026
//!
//! Client core for searching a remote catalog and downloading tracks.
//! A search replaces the visible track list wholesale; each track then
//! downloads on its own and merges its result back by identity
//!

pub mod config;
pub mod errors;
pub mod logging;

pub mod client;
pub mod download;
pub mod fetch;
pub mod search;
pub mod sink;
pub mod store;
pub mod types;

pub use client::{DiscoClient, TrackRow, View};
pub use errors::DiscoError;
pub use types::{DownloadState, Track, TrackKey};
