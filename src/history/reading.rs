use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Set of article ids the user has opened, optionally persisted as a JSON array.
#[derive(Debug, Clone, Default)]
pub struct ReadingHistory {
    path: Option<PathBuf>,
    read: BTreeSet<String>,
}

impl ReadingHistory {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// A missing file starts an empty history that is written on first change.
    pub fn load(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        let read = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str::<BTreeSet<String>>(&raw).map_err(|err| {
                AppError::invalid_argument(format!(
                    "malformed reading history {}: {err}",
                    path.display()
                ))
            })?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => BTreeSet::new(),
            Err(err) => {
                return Err(AppError::io_with_context(
                    err,
                    format!("failed to read reading history: {}", path.display()),
                ));
            }
        };
        Ok(Self {
            path: Some(path),
            read,
        })
    }

    pub fn from_config(path: Option<&Path>) -> AppResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::in_memory()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_read(&self, id: &str) -> bool {
        self.read.contains(id)
    }

    pub fn len(&self) -> usize {
        self.read.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read.is_empty()
    }

    /// Returns whether the id was newly recorded.
    pub fn mark_article_read(&mut self, id: &str) -> AppResult<bool> {
        if !self.read.insert(id.to_string()) {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    fn save(&self) -> AppResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|err| {
                AppError::io_with_context(
                    err,
                    format!("failed to create directory: {}", parent.display()),
                )
            })?;
        }
        let raw = serde_json::to_string(&self.read).map_err(|err| {
            AppError::invalid_argument(format!("cannot encode reading history: {err}"))
        })?;
        fs::write(path, raw).map_err(|err| {
            AppError::io_with_context(
                err,
                format!("failed to write reading history: {}", path.display()),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::ReadingHistory;

    fn temp_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after epoch")
            .as_nanos();
        std::env::temp_dir().join(format!("knav-{name}-{}-{nanos}", std::process::id()))
    }

    #[test]
    fn in_memory_history_tracks_ids() {
        let mut history = ReadingHistory::in_memory();
        assert!(
            history
                .mark_article_read("ekn:///a")
                .expect("mark should succeed")
        );
        assert!(
            !history
                .mark_article_read("ekn:///a")
                .expect("mark should succeed")
        );
        assert!(history.is_read("ekn:///a"));
        assert!(!history.is_read("ekn:///b"));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn persisted_history_survives_reload() {
        let dir = temp_dir("reading");
        let path = dir.join("nested").join("read.json");

        let mut history = ReadingHistory::load(&path).expect("missing file should load empty");
        assert!(history.is_empty());
        history
            .mark_article_read("ekn:///a")
            .expect("mark should persist");

        let reloaded = ReadingHistory::load(&path).expect("written file should load");
        assert!(reloaded.is_read("ekn:///a"));

        fs::remove_dir_all(&dir).expect("temp dir should be removable");
    }

    #[test]
    fn malformed_file_is_rejected() {
        let dir = temp_dir("reading-bad");
        fs::create_dir_all(&dir).expect("temp dir should be creatable");
        let path = dir.join("read.json");
        fs::write(&path, "{not json").expect("fixture should be writable");

        assert!(ReadingHistory::load(&path).is_err());

        fs::remove_dir_all(&dir).expect("temp dir should be removable");
    }
}
