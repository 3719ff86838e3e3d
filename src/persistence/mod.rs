//! Persistence sidecar: best-effort JSON snapshots of the roster store.
//!
//! The file holds the class-name to class-record mapping and is overwritten
//! wholesale on every save. The in-memory store stays authoritative; write
//! failures are logged and otherwise ignored.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;

use crate::models::{ClassRecord, Student};
use crate::rollover::Clock;
use crate::store::{Repository, RosterStore};

/// Name of the class seeded on first run.
pub const SAMPLE_CLASS: &str = "Sample Class";

/// Failure to read or write a snapshot.
#[derive(Debug)]
pub enum PersistenceError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersistenceError::Io(e) => write!(f, "snapshot I/O error: {}", e),
            PersistenceError::Json(e) => write!(f, "snapshot JSON error: {}", e),
        }
    }
}

impl std::error::Error for PersistenceError {}

impl From<std::io::Error> for PersistenceError {
    fn from(err: std::io::Error) -> Self {
        PersistenceError::Io(err)
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        PersistenceError::Json(err)
    }
}

/// Dirty flag plus wake-up for the sidecar. Mutations call [`SaveTrigger::mark_dirty`].
#[derive(Debug, Default)]
pub struct SaveTrigger {
    dirty: AtomicBool,
    notify: Notify,
}

impl SaveTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
        self.notify.notify_one();
    }

    /// Clear the flag, returning whether it was set.
    pub fn take_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::AcqRel)
    }

    async fn wait(&self) {
        self.notify.notified().await;
    }
}

/// Read a snapshot. `Ok(None)` when the file does not exist.
pub async fn load_snapshot(
    path: &Path,
) -> Result<Option<BTreeMap<String, ClassRecord>>, PersistenceError> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    Ok(Some(serde_json::from_str(&raw)?))
}

/// Write a snapshot, replacing the previous file.
pub async fn save_snapshot(
    path: &Path,
    classes: &BTreeMap<String, ClassRecord>,
) -> Result<(), PersistenceError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let body = serde_json::to_vec_pretty(classes)?;
    let tmp = temp_path(path);
    tokio::fs::write(&tmp, body).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Restore the store on startup.
///
/// Falls back to an empty store when the snapshot is absent or unreadable, and
/// optionally seeds a sample class. The returned flag asks for an immediate save.
pub async fn init_store(path: &Path, seed_sample: bool, clock: &dyn Clock) -> (RosterStore, bool) {
    let store = match load_snapshot(path).await {
        Ok(Some(classes)) => {
            tracing::info!("Loaded existing classroom data from {:?}", path);
            RosterStore::from_classes(classes)
        }
        Ok(None) => {
            tracing::info!("No snapshot at {:?}, starting with fresh data", path);
            RosterStore::new()
        }
        Err(e) => {
            tracing::warn!("Ignoring unreadable snapshot {:?}: {}", path, e);
            RosterStore::new()
        }
    };

    if store.is_empty() && seed_sample {
        return (sample_store(clock), true);
    }
    (store, false)
}

/// One class with a few students holding nonzero points.
pub fn sample_store(clock: &dyn Clock) -> RosterStore {
    let now = clock.timestamp();
    let mut class = ClassRecord::new(SAMPLE_CLASS, Some(clock.week_key()), &now);
    for (name, points) in [("Alice Johnson", 3), ("Bob Smith", 7), ("Carol Davis", 12)] {
        let mut student = Student::new(name, None, false, &now);
        student.points = points;
        class.students.push(student);
    }

    let mut store = RosterStore::new();
    store.put(SAMPLE_CLASS, class);
    store
}

/// Write the current store. Errors are logged and swallowed.
pub async fn flush(repo: &Repository, path: &Path) -> bool {
    let snapshot = repo.snapshot().await;
    match save_snapshot(path, snapshot.classes()).await {
        Ok(()) => {
            tracing::debug!("Saved snapshot at revision {}", snapshot.revision());
            true
        }
        Err(e) => {
            tracing::error!("Error saving data to {:?}: {}", path, e);
            false
        }
    }
}

/// Run the sidecar: save on every interval tick and whenever a mutation marks
/// the store dirty. Performs a final save when shutdown is signalled.
pub fn spawn_persistence(
    repo: Arc<Repository>,
    trigger: Arc<SaveTrigger>,
    path: PathBuf,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    trigger.take_dirty();
                    flush(&repo, &path).await;
                }
                _ = trigger.wait() => {
                    if trigger.take_dirty() {
                        flush(&repo, &path).await;
                    }
                }
                _ = shutdown.changed() => {
                    tracing::info!("Writing final snapshot");
                    flush(&repo, &path).await;
                    break;
                }
            }
        }
    })
}
