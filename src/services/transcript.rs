// src/services/transcript.rs
use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use thiserror::Error;

use crate::message::Message;

/// Storage key the widget keeps its transcript under.
pub const TRANSCRIPT_KEY: &str = "chatHistory";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage io error: {0}")]
    Io(#[from] io::Error),
    #[error("stored transcript is not valid json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Client-side key-value storage for the transcript.
///
/// The whole sequence is written on every save; there is no incremental append.
pub trait TranscriptStore {
    /// `Ok(None)` when nothing has been stored under the key yet.
    fn load(&self) -> Result<Option<Vec<Message>>, StoreError>;
    fn save(&self, messages: &[Message]) -> Result<(), StoreError>;
}

/// One JSON file per key inside a storage directory.
#[derive(Clone, Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl AsRef<Path>, key: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!("{key}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TranscriptStore for FileStore {
    fn load(&self) -> Result<Option<Vec<Message>>, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn save(&self, messages: &[Message]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string(messages)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

/// In-process key-value storage. Clones share the same entries.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
    key: String,
}

impl MemoryStore {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            entries: Arc::default(),
            key: key.into(),
        }
    }

    /// Raw stored value, as a browser's storage inspector would show it.
    pub fn raw(&self) -> Option<String> {
        self.lock().get(&self.key).cloned()
    }

    pub fn set_raw(&self, value: impl Into<String>) {
        self.lock().insert(self.key.clone(), value.into());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map still holds whole, previously written strings.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl TranscriptStore for MemoryStore {
    fn load(&self) -> Result<Option<Vec<Message>>, StoreError> {
        match self.raw() {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn save(&self, messages: &[Message]) -> Result<(), StoreError> {
        let json = serde_json::to_string(messages)?;
        self.set_raw(json);
        Ok(())
    }
}
