//! Best-effort key-value storage holding the current player's email and start time.

use std::{collections::BTreeMap, io::ErrorKind, path::PathBuf, sync::Arc};

use futures::future::BoxFuture;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tokio::sync::Mutex;
use tracing::warn;

use crate::dao::storage::{StorageError, StorageResult};

/// Key holding the email of the player currently in a session.
pub const PLAYER_EMAIL_KEY: &str = "playerEmail";
/// Key holding the RFC 3339 start time of the current session.
pub const GAME_START_TIME_KEY: &str = "gameStartTime";

/// Abstraction over a durable string map.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<String>>>;
    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: String) -> BoxFuture<'static, StorageResult<()>>;
    /// Remove `key`; removing a missing key succeeds.
    fn remove(&self, key: &str) -> BoxFuture<'static, StorageResult<()>>;
}

/// Values left behind by a session that was never reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedSession {
    /// Email of the player.
    pub email: String,
    /// When their session started, if the stored timestamp parses.
    pub start_time: Option<OffsetDateTime>,
}

/// Record the start of a session. Failures are logged and swallowed.
pub async fn persist_session(store: &dyn KeyValueStore, email: &str, start_time: OffsetDateTime) {
    if let Err(err) = store.set(PLAYER_EMAIL_KEY, email.to_string()).await {
        warn!(key = PLAYER_EMAIL_KEY, error = %err, "failed to persist session key");
    }

    match start_time.format(&Rfc3339) {
        Ok(formatted) => {
            if let Err(err) = store.set(GAME_START_TIME_KEY, formatted).await {
                warn!(key = GAME_START_TIME_KEY, error = %err, "failed to persist session key");
            }
        }
        Err(err) => warn!(error = %err, "failed to format session start time"),
    }
}

/// Remove both session keys. Failures are logged and swallowed.
pub async fn clear_session(store: &dyn KeyValueStore) {
    for key in [PLAYER_EMAIL_KEY, GAME_START_TIME_KEY] {
        if let Err(err) = store.remove(key).await {
            warn!(key, error = %err, "failed to clear session key");
        }
    }
}

/// Read back the session keys left by a previous run, if any.
pub async fn load_session(store: &dyn KeyValueStore) -> Option<PersistedSession> {
    let email = match store.get(PLAYER_EMAIL_KEY).await {
        Ok(value) => value?,
        Err(err) => {
            warn!(error = %err, "failed to read persisted session");
            return None;
        }
    };
    let start_time = store
        .get(GAME_START_TIME_KEY)
        .await
        .ok()
        .flatten()
        .and_then(|raw| OffsetDateTime::parse(&raw, &Rfc3339).ok());

    Some(PersistedSession { email, start_time })
}

type Entries = BTreeMap<String, String>;

/// Store keeping every key in a single JSON object on disk.
#[derive(Clone)]
pub struct FileKvStore {
    inner: Arc<FileInner>,
}

struct FileInner {
    path: PathBuf,
    // Serialises read-modify-write cycles on the file.
    lock: Mutex<()>,
}

impl FileKvStore {
    /// Store backed by the JSON file at `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(FileInner {
                path: path.into(),
                lock: Mutex::new(()),
            }),
        }
    }
}

impl FileInner {
    async fn read(&self) -> StorageResult<Entries> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(Entries::new()),
            Ok(bytes) => {
                serde_json::from_slice(&bytes).map_err(|source| StorageError::Corrupt {
                    path: self.path.clone(),
                    source,
                })
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Entries::new()),
            Err(err) => Err(StorageError::unavailable(
                format!("reading {}", self.path.display()),
                err,
            )),
        }
    }

    async fn write(&self, entries: &Entries) -> StorageResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|err| {
                StorageError::unavailable(format!("creating {}", parent.display()), err)
            })?;
        }
        let bytes = serde_json::to_vec_pretty(entries).map_err(|err| {
            StorageError::unavailable(format!("encoding {}", self.path.display()), err)
        })?;
        tokio::fs::write(&self.path, bytes)
            .await
            .map_err(|err| StorageError::unavailable(format!("writing {}", self.path.display()), err))
    }
}

impl KeyValueStore for FileKvStore {
    fn get(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<String>>> {
        let inner = self.inner.clone();
        let key = key.to_string();
        Box::pin(async move {
            let _guard = inner.lock.lock().await;
            Ok(inner.read().await?.remove(&key))
        })
    }

    fn set(&self, key: &str, value: String) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        let key = key.to_string();
        Box::pin(async move {
            let _guard = inner.lock.lock().await;
            let mut entries = inner.read().await?;
            entries.insert(key, value);
            inner.write(&entries).await
        })
    }

    fn remove(&self, key: &str) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        let key = key.to_string();
        Box::pin(async move {
            let _guard = inner.lock.lock().await;
            let mut entries = inner.read().await?;
            if entries.remove(&key).is_some() {
                inner.write(&entries).await?;
            }
            Ok(())
        })
    }
}

/// Volatile store used when no data path is configured.
#[derive(Clone, Default)]
pub struct MemoryKvStore {
    entries: Arc<Mutex<Entries>>,
}

impl MemoryKvStore {
    /// Empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKvStore {
    fn get(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<String>>> {
        let entries = self.entries.clone();
        let key = key.to_string();
        Box::pin(async move { Ok(entries.lock().await.get(&key).cloned()) })
    }

    fn set(&self, key: &str, value: String) -> BoxFuture<'static, StorageResult<()>> {
        let entries = self.entries.clone();
        let key = key.to_string();
        Box::pin(async move {
            entries.lock().await.insert(key, value);
            Ok(())
        })
    }

    fn remove(&self, key: &str) -> BoxFuture<'static, StorageResult<()>> {
        let entries = self.entries.clone();
        let key = key.to_string();
        Box::pin(async move {
            entries.lock().await.remove(&key);
            Ok(())
        })
    }
}
