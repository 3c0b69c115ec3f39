// Document read/update handlers

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use rosterd_core::{DocumentKind, errors};

use crate::{error::AppError, state::AppState, types::UpdateDocumentResponse};

/// Header carrying the per-request retention count for backed-up
/// documents.
pub(crate) const MAX_BACKUPS_HEADER: &str = "x-max-backups";

pub(crate) async fn read_document_handler(
    Path(document): Path<String>,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let kind = resolve_document(&document)?;
    let bytes = state
        .document_store
        .read(kind.name)
        .await
        .map_err(AppError::from_anyhow)?;

    Ok(([(CONTENT_TYPE, "application/json")], bytes).into_response())
}

pub(crate) async fn update_document_handler(
    Path(document): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<UpdateDocumentResponse>, AppError> {
    let kind = resolve_document(&document)?;

    let (result, message) = if kind.keeps_backups {
        let max_backups = max_backups_from_headers(&headers, state.config.default_max_backups);
        (
            state
                .document_store
                .update_with_backup(kind.name, &body, max_backups)
                .await,
            "File updated successfully with backup",
        )
    } else {
        (
            state.document_store.update(kind.name, &body).await,
            "File updated successfully",
        )
    };

    if let Err(error) = result {
        if errors::is_invalid_json(&error) {
            return Err(AppError::invalid_json());
        }
        return Err(AppError::internal(error));
    }

    Ok(Json(UpdateDocumentResponse {
        success: true,
        message,
    }))
}

/// Maps the `{document}` path segment (`employees.json`, ...) to a
/// registered document, stripping the `.json` extension that forms the
/// public route.
fn resolve_document(segment: &str) -> Result<DocumentKind, AppError> {
    segment
        .strip_suffix(".json")
        .and_then(DocumentKind::lookup)
        .ok_or_else(|| AppError::document_not_found(segment))
}

/// Reads the retention count from `X-Max-Backups`; absent, unparsable,
/// or non-positive values fall back to the configured default.
fn max_backups_from_headers(headers: &HeaderMap, default: usize) -> usize {
    headers
        .get(MAX_BACKUPS_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<usize>().ok())
        .filter(|&value| value > 0)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::to_bytes,
        http::{HeaderValue, StatusCode},
    };

    use crate::test_support::setup_state;

    #[tokio::test]
    async fn read_document_handler_returns_empty_object_before_first_write() {
        let (_temp_dir, state) = setup_state();

        let response = read_document_handler(Path("employees.json".into()), State(state))
            .await
            .expect("document response");

        let (parts, body) = response.into_parts();
        assert_eq!(parts.status, StatusCode::OK);
        assert_eq!(
            parts
                .headers
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok()),
            Some("application/json")
        );

        let bytes = to_bytes(body, usize::MAX).await.unwrap();
        assert_eq!(bytes.as_ref(), b"{}");
    }

    #[tokio::test]
    async fn read_document_handler_rejects_unknown_documents() {
        let (_temp_dir, state) = setup_state();

        let err = read_document_handler(Path("payroll.json".into()), State(state))
            .await
            .expect_err("unknown document is rejected");

        let (status, payload) = err.into_payload();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(payload.name, "DOCUMENT_NOT_FOUND");
    }

    #[tokio::test]
    async fn update_document_handler_round_trips_valid_json() {
        let (_temp_dir, state) = setup_state();

        let response = update_document_handler(
            Path("employees.json".into()),
            State(state.clone()),
            HeaderMap::new(),
            Bytes::from_static(br#"{"alice": {"role": "engineer"}}"#),
        )
        .await
        .expect("update response");
        assert!(response.0.success);

        let bytes = state
            .document_store
            .read("employees")
            .await
            .expect("read document");
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["alice"]["role"], "engineer");
    }

    #[tokio::test]
    async fn update_document_handler_rejects_invalid_json() {
        let (_temp_dir, state) = setup_state();
        state
            .document_store
            .update("holidays", br#"{"a": 1}"#)
            .await
            .expect("seed holidays");

        let err = update_document_handler(
            Path("holidays.json".into()),
            State(state.clone()),
            HeaderMap::new(),
            Bytes::from_static(b"not json"),
        )
        .await
        .expect_err("invalid body is rejected");

        let (status, payload) = err.into_payload();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(payload.name, "INVALID_JSON");

        // Neither the live document nor the backup set changed.
        let bytes = state
            .document_store
            .read("holidays")
            .await
            .expect("read document");
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["a"], 1);
        assert!(state
            .backup_store
            .list("holidays")
            .await
            .expect("list backups")
            .is_empty());
    }

    #[tokio::test]
    async fn update_document_handler_honors_retention_header() {
        let (_temp_dir, state) = setup_state();

        let mut headers = HeaderMap::new();
        headers.insert(MAX_BACKUPS_HEADER, HeaderValue::from_static("1"));

        for body in [&br#"{"a": 1}"#[..], br#"{"a": 2}"#, br#"{"a": 3}"#] {
            update_document_handler(
                Path("holidays.json".into()),
                State(state.clone()),
                headers.clone(),
                Bytes::copy_from_slice(body),
            )
            .await
            .expect("update holidays");
        }

        let backups = state
            .backup_store
            .list("holidays")
            .await
            .expect("list backups");
        assert_eq!(backups.len(), 1);

        let content = tokio::fs::read(state.backup_store.backup_dir().join(&backups[0]))
            .await
            .expect("read backup");
        let value: serde_json::Value = serde_json::from_slice(&content).unwrap();
        assert_eq!(value["a"], 2);
    }

    #[tokio::test]
    async fn plain_documents_do_not_accumulate_backups() {
        let (_temp_dir, state) = setup_state();

        for body in [&br#"{"rev": 1}"#[..], br#"{"rev": 2}"#] {
            update_document_handler(
                Path("employees.json".into()),
                State(state.clone()),
                HeaderMap::new(),
                Bytes::copy_from_slice(body),
            )
            .await
            .expect("update employees");
        }

        assert!(state
            .backup_store
            .list("employees")
            .await
            .expect("list backups")
            .is_empty());
    }

    #[test]
    fn max_backups_header_parsing_falls_back_to_default() {
        let mut headers = HeaderMap::new();
        assert_eq!(max_backups_from_headers(&headers, 10), 10);

        headers.insert(MAX_BACKUPS_HEADER, HeaderValue::from_static("5"));
        assert_eq!(max_backups_from_headers(&headers, 10), 5);

        headers.insert(MAX_BACKUPS_HEADER, HeaderValue::from_static("0"));
        assert_eq!(max_backups_from_headers(&headers, 10), 10);

        headers.insert(MAX_BACKUPS_HEADER, HeaderValue::from_static("many"));
        assert_eq!(max_backups_from_headers(&headers, 10), 10);
    }
}
