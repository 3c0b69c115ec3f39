// Backup listing, deletion, and settings handlers

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
};
use rosterd_core::errors;

use crate::{
    error::AppError,
    state::AppState,
    types::{
        BackupSettingsResponse, DeleteBackupRequest, DeleteBackupResponse, ListBackupsQuery,
    },
};

pub(crate) async fn list_backups_handler(
    Query(query): Query<ListBackupsQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, AppError> {
    let prefix = query
        .prefix
        .as_deref()
        .filter(|prefix| !prefix.is_empty())
        .ok_or_else(|| AppError::missing_query_parameter("prefix"))?;

    let backups = state
        .backup_store
        .list(prefix)
        .await
        .map_err(AppError::from_anyhow)?;

    Ok(Json(backups))
}

pub(crate) async fn delete_backup_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<DeleteBackupResponse>, AppError> {
    let request: DeleteBackupRequest = serde_json::from_slice(&body)
        .map_err(|_| AppError::bad_request("Invalid request body."))?;

    if request.filename.trim().is_empty() {
        return Err(AppError::bad_request("Missing filename."));
    }

    if let Err(error) = state.backup_store.delete(&request.filename).await {
        if errors::is_not_found(&error) {
            return Err(AppError::backup_not_found(&request.filename));
        }
        return Err(AppError::internal(error));
    }

    Ok(Json(DeleteBackupResponse {
        success: true,
        message: "Backup deleted successfully",
    }))
}

pub(crate) async fn backup_settings_handler(
    State(state): State<AppState>,
) -> Json<BackupSettingsResponse> {
    Json(BackupSettingsResponse {
        max_backups: state.config.default_max_backups,
        backup_dir: state.config.backup_dir.display().to_string(),
    })
}
