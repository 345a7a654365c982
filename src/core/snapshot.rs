use crate::core::registry::{PassengerRegistry, RegistrySnapshot};
use crate::core::Storage;
use crate::utils::error::Result;
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;

/// 透過 `Storage` 保存乘客資料的 JSON 快照
pub struct SnapshotStore {
    storage: Arc<dyn Storage>,
    file_name: String,
    // 快照在鎖內產生並寫入，最後寫入的一定是最新狀態
    write_lock: Mutex<()>,
}

impl SnapshotStore {
    pub fn new(storage: Arc<dyn Storage>, file_name: impl Into<String>) -> Self {
        Self {
            storage,
            file_name: file_name.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub async fn save(&self, registry: &PassengerRegistry) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let snapshot = registry.snapshot();
        let data = serde_json::to_vec_pretty(&snapshot)?;

        tracing::debug!(
            "Writing passenger snapshot ({} bytes) to {}",
            data.len(),
            self.file_name
        );
        self.storage.write_file(&self.file_name, &data).await
    }

    pub async fn load(&self) -> Result<Option<RegistrySnapshot>> {
        match self.storage.read_file(&self.file_name).await? {
            Some(data) => Ok(Some(serde_json::from_slice(&data)?)),
            None => Ok(None),
        }
    }

    /// Restores the registry from storage; returns the passenger count.
    pub async fn restore_into(&self, registry: &PassengerRegistry) -> Result<usize> {
        match self.load().await? {
            Some(snapshot) => {
                let restored = registry.restore(snapshot);
                tracing::info!(
                    "📂 Restored {} passengers from {}",
                    restored,
                    self.file_name
                );
                Ok(restored)
            }
            None => {
                tracing::info!("No passenger snapshot at {}, starting empty", self.file_name);
                Ok(0)
            }
        }
    }
}

/// 背景快照寫入器
///
/// Requests only wake the writer task and never wait for disk. Requests
/// that arrive while a save is running coalesce into one follow-up save.
pub struct SnapshotWriter {
    store: Arc<SnapshotStore>,
    registry: Arc<PassengerRegistry>,
    wake: Arc<Notify>,
    task: JoinHandle<()>,
}

impl SnapshotWriter {
    /// Must be called inside a tokio runtime.
    pub fn spawn(store: SnapshotStore, registry: Arc<PassengerRegistry>) -> Self {
        let store = Arc::new(store);
        let wake = Arc::new(Notify::new());
        let task = tokio::spawn(write_loop(
            Arc::clone(&store),
            Arc::clone(&registry),
            Arc::clone(&wake),
        ));

        Self {
            store,
            registry,
            wake,
            task,
        }
    }

    pub fn request_save(&self) {
        self.wake.notify_one();
    }

    /// Saves the current state now, after any save already in progress.
    pub async fn flush(&self) -> Result<()> {
        self.store.save(&self.registry).await
    }
}

impl Drop for SnapshotWriter {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn write_loop(store: Arc<SnapshotStore>, registry: Arc<PassengerRegistry>, wake: Arc<Notify>) {
    loop {
        wake.notified().await;
        if let Err(e) = store.save(&registry).await {
            tracing::warn!(
                "Failed to write passenger snapshot {}: {}",
                store.file_name(),
                e
            );
        }
    }
}
