use anyhow::Result;

use rosterd_core::{AppConfig, BackupStore, DocumentStore};

/// Shared handles threaded through every handler. Stores are cheap
/// clones over the configured directories; no locking is performed
/// around the read-backup-write sequence.
#[derive(Clone)]
pub struct AppState {
    pub document_store: DocumentStore,
    pub backup_store: BackupStore,
    pub config: AppConfig,
}

pub fn build_state(config: AppConfig) -> Result<AppState> {
    let backup_store = BackupStore::open(&config.backup_dir)?;
    let document_store = DocumentStore::open(&config.data_dir, backup_store.clone())?;

    Ok(AppState {
        document_store,
        backup_store,
        config,
    })
}
