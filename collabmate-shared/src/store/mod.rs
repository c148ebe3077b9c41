/// Snapshot-based record store
///
/// Persistence follows a load-full-collection / mutate-in-memory /
/// write-full-collection model: each of the three collections (users, teams,
/// tasks) is stored as one JSON array snapshot, and every write replaces the
/// whole snapshot. There are no transactions; multi-collection cascades are
/// applied one collection at a time, best-effort.
///
/// Mutating operations serialize per collection through
/// [`Collection::write_lock`], so two concurrent read-modify-write sequences
/// on the same collection cannot silently discard each other's changes.
/// Single-request behavior is unaffected.
///
/// # Example
///
/// ```no_run
/// use collabmate_shared::store::Datastore;
///
/// # async fn example() -> Result<(), collabmate_shared::store::StoreError> {
/// let store = Datastore::open("./data");
/// let users = store.users.load().await?;
/// println!("{} users", users.len());
/// # Ok(())
/// # }
/// ```

mod backend;

pub use backend::{JsonFileBackend, MemoryBackend, StorageBackend};

use crate::models::{task::Task, team::Team, user::User};
use serde::{de::DeserializeOwned, Serialize};
use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// Error type for record store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Underlying backend I/O failed
    #[error("storage I/O failed: {0}")]
    Io(String),

    /// A stored snapshot could not be decoded
    #[error("corrupt snapshot for collection '{collection}': {message}")]
    Corrupt {
        collection: String,
        message: String,
    },

    /// A snapshot could not be encoded for writing
    #[error("failed to encode collection '{collection}': {message}")]
    Encode {
        collection: String,
        message: String,
    },
}

/// Typed snapshot access to one named collection
///
/// A `Collection<T>` does not cache anything: `load` always reads the
/// backend, `save` always replaces the full snapshot. A missing snapshot
/// reads as the empty collection.
pub struct Collection<T> {
    backend: Arc<dyn StorageBackend>,
    name: &'static str,
    write_lock: Mutex<()>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Collection<T>
where
    T: Serialize + DeserializeOwned,
{
    fn new(backend: Arc<dyn StorageBackend>, name: &'static str) -> Self {
        Self {
            backend,
            name,
            write_lock: Mutex::new(()),
            _marker: PhantomData,
        }
    }

    /// Collection name (also the snapshot file stem for file backends)
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Loads the current snapshot, or the empty collection if none exists yet
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` on backend failure and `StoreError::Corrupt`
    /// when the stored bytes are not a valid JSON array of `T`.
    pub async fn load(&self) -> Result<Vec<T>, StoreError> {
        match self.backend.read(self.name).await? {
            None => Ok(Vec::new()),
            Some(bytes) if bytes.is_empty() => Ok(Vec::new()),
            Some(bytes) => serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt {
                collection: self.name.to_string(),
                message: e.to_string(),
            }),
        }
    }

    /// Replaces the full snapshot with `items`
    pub async fn save(&self, items: &[T]) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(items).map_err(|e| StoreError::Encode {
            collection: self.name.to_string(),
            message: e.to_string(),
        })?;
        self.backend.write(self.name, bytes).await
    }

    /// Acquires this collection's writer lock
    ///
    /// Hold the guard across a load → mutate → save sequence so concurrent
    /// writers to the same collection cannot interleave. Reads never need it.
    pub async fn write_lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().await
    }
}

/// The three CollabMate collections over one shared backend
pub struct Datastore {
    /// User accounts
    pub users: Collection<User>,

    /// Teams and their member lists
    pub teams: Collection<Team>,

    /// Tasks, both locally created and GitLab-imported
    pub tasks: Collection<Task>,
}

impl Datastore {
    /// Creates a datastore over an arbitrary backend
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            users: Collection::new(backend.clone(), "users"),
            teams: Collection::new(backend.clone(), "teams"),
            tasks: Collection::new(backend, "tasks"),
        }
    }

    /// Opens a datastore backed by JSON files under `data_dir`
    pub fn open(data_dir: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(JsonFileBackend::new(data_dir)))
    }

    /// Creates a datastore backed by process memory
    ///
    /// Used by tests; nothing survives the process.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }
}
