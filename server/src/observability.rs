use std::time::Duration;

use axum::{
    extract::MatchedPath,
    http::{Request, Response},
};
use tower_http::trace::{MakeSpan, OnResponse};
use tracing::{Level, Span, event, field};

/// Span maker recording the method and matched route for every request.
pub fn http_make_span() -> HttpMakeSpan {
    HttpMakeSpan
}

#[derive(Clone, Copy, Debug, Default)]
pub struct HttpMakeSpan;

impl<B> MakeSpan<B> for HttpMakeSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        let method = request.method().as_str().to_owned();
        let target = request
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_owned())
            .unwrap_or_else(|| request.uri().to_string());
        let route = request
            .extensions()
            .get::<MatchedPath>()
            .map(|mp| mp.as_str().to_owned())
            .unwrap_or_else(|| target.clone());

        tracing::info_span!(
            "http_request",
            http.request.method = %method,
            http.route = %route,
            url.path = %target,
            http.response.status_code = field::Empty,
        )
    }
}

/// Response logger that escalates the log level for 4xx/5xx responses.
pub fn response_logger() -> ResponseLogger {
    ResponseLogger
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ResponseLogger;

impl<B> OnResponse<B> for ResponseLogger {
    fn on_response(self, response: &Response<B>, latency: Duration, span: &Span) {
        let status = response.status();
        span.record(
            "http.response.status_code",
            &field::display(status.as_u16()),
        );

        let latency_ms = latency.as_millis() as u64;
        if status.is_server_error() {
            event!(
                parent: span,
                Level::ERROR,
                http.response.status_code = status.as_u16(),
                latency_ms,
                "request completed"
            );
        } else if status.is_client_error() {
            event!(
                parent: span,
                Level::WARN,
                http.response.status_code = status.as_u16(),
                latency_ms,
                "request completed"
            );
        } else {
            event!(
                parent: span,
                Level::INFO,
                http.response.status_code = status.as_u16(),
                latency_ms,
                "request completed"
            );
        }
    }
}
