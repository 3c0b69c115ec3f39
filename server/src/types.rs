// Request and response types for the REST API

use serde::{Deserialize, Serialize};

// ========== Health ==========

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    pub(crate) status: &'static str,
}

// ========== Documents ==========

#[derive(Serialize, Debug)]
pub(crate) struct UpdateDocumentResponse {
    pub(crate) success: bool,
    pub(crate) message: &'static str,
}

// ========== Backups ==========

#[derive(Deserialize)]
pub(crate) struct ListBackupsQuery {
    pub(crate) prefix: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct DeleteBackupRequest {
    pub(crate) filename: String,
}

#[derive(Serialize, Debug)]
pub(crate) struct DeleteBackupResponse {
    pub(crate) success: bool,
    pub(crate) message: &'static str,
}

#[derive(Serialize)]
pub(crate) struct BackupSettingsResponse {
    #[serde(rename = "maxBackups")]
    pub(crate) max_backups: usize,
    #[serde(rename = "backupDir")]
    pub(crate) backup_dir: String,
}
