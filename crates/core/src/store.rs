//! Durable storage of the conversation.
//!
//! The store keeps one snapshot of the whole message list under a fixed
//! key. It never reports failures to its caller: storage problems are
//! logged and the conversation simply keeps living in memory.

use std::collections::HashMap;
use std::error::Error;
use std::fmt::{self, Debug, Display, Formatter};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::conversation::{Message, MessageKind, Sender};

/// The key the conversation snapshot is stored under.
pub const STORAGE_KEY: &str = "vugasu_chat_history";

/// The stored form of the message list.
pub type Snapshot = Vec<StoredMessage>;

/// The stored form of a [`Message`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoredMessage {
    /// See [`Message::id`].
    pub id: String,
    /// See [`Message::content`].
    pub content: String,
    /// See [`Message::sender`].
    pub sender: Sender,
    /// ISO-8601 form of [`Message::timestamp`].
    pub timestamp: String,
    /// See [`Message::kind`].
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<MessageKind>,
}

impl From<&Message> for StoredMessage {
    fn from(msg: &Message) -> Self {
        Self {
            id: msg.id().to_owned(),
            content: msg.content().to_owned(),
            sender: msg.sender(),
            timestamp: msg.timestamp().to_rfc3339_opts(SecondsFormat::Millis, true),
            kind: msg.kind(),
        }
    }
}

impl TryFrom<StoredMessage> for Message {
    type Error = chrono::ParseError;

    fn try_from(stored: StoredMessage) -> Result<Self, Self::Error> {
        let timestamp =
            DateTime::parse_from_rfc3339(&stored.timestamp)?.with_timezone(&Utc);
        let msg = Message::new(stored.id, stored.content, stored.sender, timestamp);
        Ok(match stored.kind {
            Some(kind) => msg.with_kind(kind),
            None => msg,
        })
    }
}

/// A string key-value storage, scoped to one installation.
pub trait StorageBackend: Send + Sync {
    /// Reads the value under `key`, `None` if absent.
    fn get(&self, key: &str) -> io::Result<Option<String>>;

    /// Replaces the value under `key`.
    fn set(&self, key: &str, value: &str) -> io::Result<()>;

    /// Removes the value under `key`. Removing an absent key succeeds.
    fn remove(&self, key: &str) -> io::Result<()>;
}

/// Stores every key as a JSON file in one directory.
#[derive(Clone, Debug)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Creates a backend rooted at `dir`. The directory is created on the
    /// first write.
    #[inline]
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the directory holding the stored files.
    #[inline]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_of(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl StorageBackend for FileBackend {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.path_of(key)) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_of(key);
        // Write aside and rename, so a crash never leaves half a snapshot.
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, value)?;
        fs::rename(&tmp_path, &path)
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        match fs::remove_file(self.path_of(key)) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
            _ => Ok(()),
        }
    }
}

/// Keeps values in memory. Clones share the same entries.
#[derive(Clone, Debug, Default)]
pub struct MemoryBackend {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        let mut entries =
            self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        let mut entries =
            self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

#[derive(Debug)]
enum StoreError {
    Io(io::Error),
    Serialization(serde_json::Error),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(err) => write!(f, "storage is unavailable: {err}"),
            StoreError::Serialization(err) => {
                write!(f, "snapshot is unreadable: {err}")
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            StoreError::Io(err) => Some(err),
            StoreError::Serialization(err) => Some(err),
        }
    }
}

impl From<io::Error> for StoreError {
    fn from(err: io::Error) -> Self {
        StoreError::Io(err)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err)
    }
}

/// Saves, loads and clears the conversation snapshot.
///
/// None of the operations fail: a snapshot that cannot be written is
/// dropped, and one that cannot be read is treated as absent.
#[derive(Clone)]
pub struct ConversationStore {
    backend: Arc<dyn StorageBackend>,
}

impl ConversationStore {
    /// Creates a store on top of `backend`.
    #[inline]
    pub fn new<B: StorageBackend + 'static>(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Creates a store that keeps the snapshot in memory only.
    #[inline]
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::default())
    }

    /// Replaces the stored snapshot.
    pub fn save(&self, snapshot: &[StoredMessage]) {
        if let Err(err) = self.try_save(snapshot) {
            error!("error saving messages: {err}");
        }
    }

    /// Reads the stored snapshot, empty if there is none or it is
    /// unreadable.
    pub fn load(&self) -> Snapshot {
        self.try_load().unwrap_or_else(|err| {
            error!("error loading messages: {err}");
            Vec::new()
        })
    }

    /// Removes the stored snapshot.
    pub fn clear(&self) {
        if let Err(err) = self.backend.remove(STORAGE_KEY) {
            error!("error clearing messages: {}", StoreError::from(err));
        }
    }

    fn try_save(&self, snapshot: &[StoredMessage]) -> Result<(), StoreError> {
        let value = serde_json::to_string(snapshot)?;
        self.backend.set(STORAGE_KEY, &value)?;
        trace!("saved {} messages", snapshot.len());
        Ok(())
    }

    fn try_load(&self) -> Result<Snapshot, StoreError> {
        let Some(value) = self.backend.get(STORAGE_KEY)? else {
            return Ok(Vec::new());
        };
        let snapshot: Snapshot = serde_json::from_str(&value)?;
        trace!("loaded {} messages", snapshot.len());
        Ok(snapshot)
    }
}

impl Debug for ConversationStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversationStore").finish_non_exhaustive()
    }
}
