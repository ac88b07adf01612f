//! Host-side state store
//!
//! Persists the last known state of every managed resource in
//! `.aeroform/state.json`, keeps one backup of the previous file and guards
//! writers with a lock file.

use crate::dynamic::DynamicValue;
use crate::error::{PluginError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

const STATE_VERSION: u32 = 1;
const STATE_DIR: &str = ".aeroform";
const STATE_FILE: &str = "state.json";
const STATE_BACKUP: &str = "state.json.backup";
const LOCK_FILE: &str = "lock.json";

/// Contents of the state file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateFile {
    pub version: u32,

    /// Incremented on every save
    pub serial: u64,

    pub updated_at: DateTime<Utc>,

    /// Resources indexed by address (`<type>.<name>`)
    pub resources: BTreeMap<String, ResourceState>,
}

impl Default for StateFile {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            serial: 0,
            updated_at: Utc::now(),
            resources: BTreeMap::new(),
        }
    }
}

impl StateFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, address: &str) -> Option<&ResourceState> {
        self.resources.get(address)
    }

    /// Like [`get`](Self::get) but an error when the address is unknown
    pub fn require(&self, address: &str) -> Result<&ResourceState> {
        self.get(address)
            .ok_or_else(|| PluginError::ResourceNotFound(address.to_string()))
    }

    pub fn set(&mut self, address: impl Into<String>, state: ResourceState) {
        self.resources.insert(address.into(), state);
        self.updated_at = Utc::now();
    }

    pub fn remove(&mut self, address: &str) -> Option<ResourceState> {
        let removed = self.resources.remove(address);
        if removed.is_some() {
            self.updated_at = Utc::now();
        }
        removed
    }

    pub fn addresses(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }
}

/// Stored state of a single resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceState {
    pub resource_type: String,

    /// Object returned by the resource's last create/read/update/import
    pub value: DynamicValue,

    pub updated_at: DateTime<Utc>,
}

impl ResourceState {
    pub fn new(resource_type: impl Into<String>, value: DynamicValue) -> Self {
        Self {
            resource_type: resource_type.into(),
            value,
            updated_at: Utc::now(),
        }
    }
}

/// Reads and writes the state file of one project directory
pub struct StateManager {
    project_root: PathBuf,
}

impl StateManager {
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            project_root: project_root.as_ref().to_path_buf(),
        }
    }

    fn state_dir(&self) -> PathBuf {
        self.project_root.join(STATE_DIR)
    }

    pub fn state_path(&self) -> PathBuf {
        self.state_dir().join(STATE_FILE)
    }

    fn backup_path(&self) -> PathBuf {
        self.state_dir().join(STATE_BACKUP)
    }

    fn lock_path(&self) -> PathBuf {
        self.state_dir().join(LOCK_FILE)
    }

    async fn ensure_state_dir(&self) -> Result<()> {
        let dir = self.state_dir();
        if !dir.exists() {
            fs::create_dir_all(&dir).await?;
            tracing::debug!("Created state directory: {}", dir.display());
        }
        Ok(())
    }

    /// Load the state, empty if no state file exists yet
    pub async fn load(&self) -> Result<StateFile> {
        let path = self.state_path();
        if !path.exists() {
            tracing::debug!("State file not found, returning empty state");
            return Ok(StateFile::new());
        }

        let content = fs::read_to_string(&path).await?;
        let state: StateFile = serde_json::from_str(&content)?;

        if state.version > STATE_VERSION {
            return Err(PluginError::StateError(format!(
                "State file version {} is newer than supported version {}",
                state.version, STATE_VERSION
            )));
        }

        tracing::debug!(
            serial = state.serial,
            "Loaded state with {} resources",
            state.resources.len()
        );
        Ok(state)
    }

    /// Save the state, moving the previous file to the backup slot
    pub async fn save(&self, state: &mut StateFile) -> Result<()> {
        self.ensure_state_dir().await?;

        let path = self.state_path();
        let backup = self.backup_path();

        if path.exists() {
            if backup.exists() {
                fs::remove_file(&backup).await?;
            }
            fs::rename(&path, &backup).await?;
        }

        state.serial += 1;
        let content = serde_json::to_string_pretty(state)?;
        fs::write(&path, content).await?;

        tracing::debug!(
            serial = state.serial,
            "Saved state with {} resources",
            state.resources.len()
        );
        Ok(())
    }

    /// Acquire exclusive access to the state
    ///
    /// Locks older than one hour are considered stale and replaced.
    pub async fn acquire_lock(&self) -> Result<StateLock> {
        self.ensure_state_dir().await?;

        let lock_path = self.lock_path();
        let lock_info = LockInfo {
            holder: std::env::var("HOSTNAME")
                .or_else(|_| std::env::var("HOST"))
                .unwrap_or_else(|_| "unknown".to_string()),
            pid: std::process::id(),
            acquired_at: Utc::now(),
        };
        let content = serde_json::to_string_pretty(&lock_info)?;

        if !create_lock_file(&lock_path, &content).await? {
            // An unreadable lock is either mid-write or corrupt; both count as held
            let raw = fs::read_to_string(&lock_path).await?;
            let existing: LockInfo = serde_json::from_str(&raw).map_err(|_| {
                PluginError::LockError(format!(
                    "State is locked ({} is not a valid lock file)",
                    lock_path.display()
                ))
            })?;
            let age = Utc::now().signed_duration_since(existing.acquired_at);
            if age.num_hours() < 1 {
                return Err(PluginError::LockError(format!(
                    "State is locked by {} (pid {}) since {}",
                    existing.holder, existing.pid, existing.acquired_at
                )));
            }

            tracing::warn!("Removing stale lock from {}", existing.holder);
            fs::remove_file(&lock_path).await?;
            if !create_lock_file(&lock_path, &content).await? {
                return Err(PluginError::LockError(
                    "State lock was taken by another process".to_string(),
                ));
            }
        }

        tracing::debug!("Acquired state lock");
        Ok(StateLock {
            lock_path,
            released: false,
        })
    }
}

/// Create the lock file only if it does not exist; false when it does
async fn create_lock_file(path: &Path, content: &str) -> Result<bool> {
    let file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await;
    let mut file = match file {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(e.into()),
    };
    file.write_all(content.as_bytes()).await?;
    file.flush().await?;
    Ok(true)
}

#[derive(Debug, Serialize, Deserialize)]
struct LockInfo {
    holder: String,
    pid: u32,
    acquired_at: DateTime<Utc>,
}

/// RAII guard for the state lock
pub struct StateLock {
    lock_path: PathBuf,
    released: bool,
}

impl StateLock {
    pub async fn release(mut self) -> Result<()> {
        if !self.released {
            if self.lock_path.exists() {
                fs::remove_file(&self.lock_path).await?;
                tracing::debug!("Released state lock");
            }
            self.released = true;
        }
        Ok(())
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        if !self.released && self.lock_path.exists() {
            let _ = std::fs::remove_file(&self.lock_path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_state_save_load() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());

        let mut state = StateFile::new();
        state.set(
            "aeroform_airflow_cluster.main",
            ResourceState::new(
                "aeroform_airflow_cluster",
                DynamicValue::new(json!({ "id": "c9q-1" })),
            ),
        );
        manager.save(&mut state).await.unwrap();
        assert_eq!(state.serial, 1);

        let loaded = manager.load().await.unwrap();
        assert_eq!(loaded.serial, 1);
        let stored = loaded.require("aeroform_airflow_cluster.main").unwrap();
        assert_eq!(stored.value.as_json(), &json!({ "id": "c9q-1" }));
    }

    #[tokio::test]
    async fn test_second_save_keeps_backup() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());

        let mut state = StateFile::new();
        tokio_test::assert_ok!(manager.save(&mut state).await);
        tokio_test::assert_ok!(manager.save(&mut state).await);

        assert!(temp_dir.path().join(".aeroform/state.json.backup").exists());
        assert_eq!(manager.load().await.unwrap().serial, 2);
    }

    #[tokio::test]
    async fn test_empty_state() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());

        let state = manager.load().await.unwrap();
        assert!(state.resources.is_empty());
        assert!(matches!(
            state.require("missing"),
            Err(PluginError::ResourceNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_lock_is_exclusive() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());

        let lock = manager.acquire_lock().await.unwrap();
        assert!(matches!(
            manager.acquire_lock().await,
            Err(PluginError::LockError(_))
        ));

        lock.release().await.unwrap();
        let again = manager.acquire_lock().await.unwrap();
        drop(again);
        assert!(!temp_dir.path().join(".aeroform/lock.json").exists());
    }

    #[tokio::test]
    async fn test_concurrent_lock_has_one_winner() {
        let temp_dir = tempdir().unwrap();
        let first = StateManager::new(temp_dir.path());
        let second = StateManager::new(temp_dir.path());

        let (a, b) = tokio::join!(first.acquire_lock(), second.acquire_lock());
        assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
        let loser = if a.is_ok() { b } else { a };
        assert!(matches!(loser, Err(PluginError::LockError(_))));
    }

    #[tokio::test]
    async fn test_stale_lock_is_replaced() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());
        manager.ensure_state_dir().await.unwrap();

        let stale = LockInfo {
            holder: "old-host".to_string(),
            pid: 1,
            acquired_at: Utc::now() - chrono::Duration::hours(2),
        };
        fs::write(manager.lock_path(), serde_json::to_string(&stale).unwrap())
            .await
            .unwrap();

        let lock = manager.acquire_lock().await.unwrap();
        let content = fs::read_to_string(manager.lock_path()).await.unwrap();
        let current: LockInfo = serde_json::from_str(&content).unwrap();
        assert_eq!(current.pid, std::process::id());
        lock.release().await.unwrap();
    }
}
