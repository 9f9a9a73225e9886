//! historyStore - ordered, append-only log of accepted commands
//! Persisted as a JSON array of strings (default: ~/.cmdmate/history.json)
//!
//! The whole log is kept in the backing file; only the most recent
//! `recall_limit` entries are offered for interactive recall. Several stores
//! may share one file: a flush appends this store's new entries to whatever
//! the file holds at that moment.

use serde_json::Value as JsonValue;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::HistoryConfig;
use crate::error::HistoryError;

pub struct HistoryStore {
    store_path: Option<PathBuf>,
    entries: Vec<String>,
    recall_limit: usize,
    autosave_every: usize,
    /// Entries already in step with the backing file
    synced: usize,
}

impl HistoryStore {
    /// History kept in memory only
    pub fn in_memory() -> Self {
        Self {
            store_path: None,
            entries: Vec::new(),
            recall_limit: 50,
            autosave_every: 0,
            synced: 0,
        }
    }

    /// Create a store backed by a custom path (useful for testing)
    pub fn new_with_path(path: PathBuf) -> Self {
        Self {
            store_path: Some(path),
            ..Self::in_memory()
        }
    }

    pub fn from_config(config: &HistoryConfig) -> Self {
        Self {
            store_path: config.file.clone(),
            entries: Vec::new(),
            recall_limit: config.recall_limit,
            autosave_every: config.autosave_every,
            synced: 0,
        }
    }

    /// Load the backing file. A missing file is an empty history; an
    /// unreadable or malformed one is reported and leaves the store empty.
    pub fn load(&mut self) -> Result<usize, HistoryError> {
        self.entries.clear();
        self.synced = 0;

        let Some(path) = self.store_path.clone() else {
            return Ok(0);
        };
        if !path.exists() {
            return Ok(0);
        }

        self.entries = read_entries(&path)?;
        self.synced = self.entries.len();
        tracing::debug!(path = %path.display(), entries = self.entries.len(), "history loaded");
        Ok(self.entries.len())
    }

    /// Load, degrading to an empty in-memory history on failure
    pub fn load_or_empty(&mut self) {
        if let Err(e) = self.load() {
            tracing::warn!("could not load history, starting empty: {}", e);
            self.entries.clear();
        }
    }

    /// Write the log to the backing file, keeping entries other stores
    /// flushed there since this one last read it
    pub fn flush(&mut self) -> Result<(), HistoryError> {
        let Some(path) = self.store_path.clone() else {
            return Ok(());
        };

        let io_err = |source| HistoryError::Io {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let mut merged = if path.exists() {
            read_entries(&path).unwrap_or_else(|e| {
                tracing::warn!("replacing unreadable history: {}", e);
                Vec::new()
            })
        } else {
            Vec::new()
        };
        for entry in &self.entries[self.synced.min(self.entries.len())..] {
            if merged.last() != Some(entry) {
                merged.push(entry.clone());
            }
        }

        let json = serde_json::to_string(&merged).map_err(|source| HistoryError::Format {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, json).map_err(io_err)?;

        self.entries = merged;
        self.synced = self.entries.len();
        Ok(())
    }

    /// Append a command unless it repeats the immediately preceding entry.
    /// Returns whether an entry was added.
    pub fn record(&mut self, command: &str) -> bool {
        let command = command.trim();
        if command.is_empty() || self.entries.last().map(String::as_str) == Some(command) {
            return false;
        }

        self.entries.push(command.to_string());

        let unsaved = self.entries.len().saturating_sub(self.synced);
        if self.autosave_every > 0 && unsaved >= self.autosave_every {
            if let Err(e) = self.flush() {
                tracing::warn!("history autosave failed: {}", e);
            }
        }
        true
    }

    /// Last `n` entries, oldest first
    pub fn recent(&self, n: usize) -> &[String] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }

    /// Entries offered for interactive recall after load
    pub fn recall(&self) -> &[String] {
        self.recent(self.recall_limit)
    }

    pub fn all(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get_store_path(&self) -> Option<&Path> {
        self.store_path.as_deref()
    }
}

fn read_entries(path: &Path) -> Result<Vec<String>, HistoryError> {
    let content = fs::read_to_string(path).map_err(|source| HistoryError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    let format_err = |source| HistoryError::Format {
        path: path.to_path_buf(),
        source,
    };
    let value: JsonValue = serde_json::from_str(&content).map_err(format_err)?;
    serde_json::from_value(value).map_err(format_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, HistoryStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new_with_path(dir.path().join("history.json"));
        (dir, store)
    }

    #[test]
    fn test_consecutive_duplicates_are_skipped() {
        let mut store = HistoryStore::in_memory();
        assert!(store.record("ls"));
        assert!(!store.record("ls"));
        assert!(store.record("pwd"));
        assert!(store.record("ls"));
        assert_eq!(store.all(), &["ls", "pwd", "ls"]);
    }

    #[test]
    fn test_blank_commands_are_ignored() {
        let mut store = HistoryStore::in_memory();
        assert!(!store.record("   "));
        assert!(store.is_empty());
    }

    #[test]
    fn test_recent_is_chronological() {
        let mut store = HistoryStore::in_memory();
        for i in 0..5 {
            store.record(&format!("cmd {}", i));
        }
        assert_eq!(store.recent(2), &["cmd 3", "cmd 4"]);
        assert_eq!(store.recent(10).len(), 5);
        assert!(store.recent(0).is_empty());
    }

    #[test]
    fn test_flush_and_load_round_trip() {
        let (_dir, mut store) = temp_store();
        store.record("mkdir out");
        store.record("cd out");
        store.flush().unwrap();

        let path = store.get_store_path().unwrap().to_path_buf();
        let mut reloaded = HistoryStore::new_with_path(path);
        assert_eq!(reloaded.load().unwrap(), 2);
        assert_eq!(reloaded.all(), &["mkdir out", "cd out"]);
    }

    #[test]
    fn test_recall_is_bounded_but_log_is_kept() {
        let (_dir, mut store) = temp_store();
        for i in 0..60 {
            store.record(&format!("echo {}", i));
        }
        store.flush().unwrap();

        let mut reloaded = HistoryStore::new_with_path(store.get_store_path().unwrap().to_path_buf());
        reloaded.load().unwrap();
        assert_eq!(reloaded.len(), 60);
        assert_eq!(reloaded.recall().len(), 50);
        assert_eq!(reloaded.recall()[0], "echo 10");
    }

    #[test]
    fn test_corrupt_file_degrades_to_empty() {
        let (_dir, mut store) = temp_store();
        fs::write(store.get_store_path().unwrap(), "{not json").unwrap();

        assert!(store.load().is_err());
        store.load_or_empty();
        assert!(store.is_empty());
        assert!(store.record("ls"));
    }

    #[test]
    fn test_stores_sharing_a_file_keep_each_others_entries() {
        let (_dir, mut first) = temp_store();
        let path = first.get_store_path().unwrap().to_path_buf();
        first.record("old");
        first.flush().unwrap();

        let mut second = HistoryStore::new_with_path(path.clone());
        first.load().unwrap();
        second.load().unwrap();

        first.record("from first");
        second.record("from second");
        first.flush().unwrap();
        second.flush().unwrap();
        first.flush().unwrap();

        let mut reloaded = HistoryStore::new_with_path(path);
        reloaded.load().unwrap();
        assert_eq!(reloaded.all(), &["old", "from first", "from second"]);
        assert_eq!(first.all(), reloaded.all());
    }

    #[test]
    fn test_autosave_flushes_periodically() {
        let dir = tempfile::tempdir().unwrap();
        let config = HistoryConfig {
            file: Some(dir.path().join("nested").join("history.json")),
            recall_limit: 50,
            show_limit: 20,
            autosave_every: 2,
        };
        let mut store = HistoryStore::from_config(&config);
        store.record("a");
        assert!(!dir.path().join("nested").join("history.json").exists());
        store.record("b");

        let saved = fs::read_to_string(dir.path().join("nested").join("history.json")).unwrap();
        assert_eq!(saved, r#"["a","b"]"#);
    }
}
