//!
//! src/sink.rs  Oct 18th, 2026
//!
//! The save side effect: materializes a downloaded payload as a local
//! file. Writes go to a temp file in the target directory and are then
//! persisted under the first free name, so a reader never sees half a
//! song and an earlier download is never replaced
//!

use std::{fs, io::{self, Write}, path::{Path, PathBuf}};

use async_trait::async_trait;
use tracing::debug;

use crate::errors::DiscoError;

/// Highest `(N)` suffix tried before giving up on a name
pub const MAX_NAME_SUFFIX: u32 = 999;

#[async_trait]
pub trait SaveSink: Send + Sync {
    async fn save(&self, file_name: &str, payload: Vec<u8>) -> Result<PathBuf, DiscoError>;
}

#[derive(Debug, Clone)]
pub struct DiskSink {
    root: PathBuf
}

impl DiskSink {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn write_file(&self, file_name: &str, payload: &[u8]) -> Result<PathBuf, DiscoError> {
        let name = Self::sanitize_name(file_name);

        fs::create_dir_all(&self.root).map_err(|e| DiscoError::Io(io::Error::new(
            e.kind(),
            format!("create dir {}: {e}", self.root.display())
        )))?;

        let mut temp = tempfile::NamedTempFile::new_in(&self.root)?;
        temp.write_all(payload)?;
        temp.as_file().sync_all()?;

        // `name`, then `name (1)`, `name (2)`, ... never over an existing file
        for n in 0..=MAX_NAME_SUFFIX {
            let path = self.root.join(Self::numbered(&name, n));
            match temp.persist_noclobber(&path) {
                Ok(_) => {
                    debug!(path = %path.display(), bytes = payload.len(), "sink.write");
                    return Ok(path);
                },
                Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => temp = e.file,
                Err(e) => return Err(DiscoError::Io(io::Error::new(
                    e.error.kind(),
                    format!("persist {}: {}", path.display(), e.error)
                )))
            }
        }

        Err(DiscoError::Io(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("no free name for {name} in {}", self.root.display())
        )))
    }

    /// `Blue.mp3` -> `Blue (2).mp3`; the suffix goes before the extension
    fn numbered(name: &str, n: u32) -> String {
        if n == 0 {
            return name.to_string();
        }
        let path = Path::new(name);
        match (path.file_stem(), path.extension()) {
            (Some(stem), Some(ext)) => {
                format!("{} ({n}).{}", stem.to_string_lossy(), ext.to_string_lossy())
            },
            _ => format!("{name} ({n})")
        }
    }

    /// Keeps the title readable but never lets it name another directory
    fn sanitize_name(name: &str) -> String {
        let cleaned: String = name.chars()
            .map(|c| match c {
                '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
                c if c.is_control() => '_',
                c => c
            })
            .collect();

        let trimmed = cleaned.trim();
        if trimmed.is_empty() || trimmed.chars().all(|c| c == '.') {
            format!("_{trimmed}")
        } else {
            trimmed.to_string()
        }
    }
}

#[async_trait]
impl SaveSink for DiskSink {
    async fn save(&self, file_name: &str, payload: Vec<u8>) -> Result<PathBuf, DiscoError> {
        let this = self.clone();
        let file_name = file_name.to_string();
        tokio::task::spawn_blocking(move || this.write_file(&file_name, &payload)).await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_separators_and_dots() {
        assert_eq!(DiskSink::sanitize_name("Blue Monday.mp3"), "Blue Monday.mp3");
        assert_eq!(DiskSink::sanitize_name("AC/DC: Live?.mp3"), "AC_DC_ Live_.mp3");
        assert_eq!(DiskSink::sanitize_name("..\\x"), ".._x");
        assert_eq!(DiskSink::sanitize_name(".."), "_..");
        assert_eq!(DiskSink::sanitize_name("  "), "_");
    }

    #[tokio::test]
    async fn save_writes_file_under_root() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DiskSink::new(dir.path().join("downloads"));

        let path = sink.save("Blue Monday.mp3", vec![1, 2, 3]).await.unwrap();

        assert_eq!(path, dir.path().join("downloads").join("Blue Monday.mp3"));
        assert_eq!(fs::read(&path).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn numbered_names_keep_the_extension() {
        assert_eq!(DiskSink::numbered("Blue.mp3", 0), "Blue.mp3");
        assert_eq!(DiskSink::numbered("Blue.mp3", 2), "Blue (2).mp3");
        assert_eq!(DiskSink::numbered("Blue", 1), "Blue (1)");
        assert_eq!(DiskSink::numbered("_..", 1), "_.. (1)");
    }

    #[tokio::test]
    async fn existing_file_is_never_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DiskSink::new(dir.path());

        let first = sink.save("a/b.mp3", vec![1]).await.unwrap();
        let second = sink.save("a/b.mp3", vec![2, 2]).await.unwrap();
        let third = sink.save("a/b.mp3", vec![3]).await.unwrap();

        assert_eq!(first, dir.path().join("a_b.mp3"));
        assert_eq!(second, dir.path().join("a_b (1).mp3"));
        assert_eq!(third, dir.path().join("a_b (2).mp3"));
        assert_eq!(fs::read(&first).unwrap(), vec![1]);
        assert_eq!(fs::read(&second).unwrap(), vec![2, 2]);
        // no temp files left behind
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 3);
    }
}
