// Router configuration

use axum::{
    Router,
    http::Method,
    routing::get,
};
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::{
    handlers::{backup_handlers::*, document_handlers::*, health_handlers::*},
    observability,
    state::AppState,
};

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true);

    let static_files = ServeDir::new(&state.config.static_dir);

    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/backups",
            get(list_backups_handler).delete(delete_backup_handler),
        )
        .route("/api/backup-settings", get(backup_settings_handler))
        .route(
            "/api/{document}",
            get(read_document_handler).post(update_document_handler),
        )
        .fallback_service(static_files)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(observability::http_make_span())
                .on_response(observability::response_logger()),
        )
        .layer(cors)
        .with_state(state)
}
