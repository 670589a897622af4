use crate::dispatcher::MethodDispatcher;
use crate::errors::AppError;
use crate::schemas::RequestContext;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, Request, State},
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use std::any::Any;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::Span;
use uuid::Uuid;

/// Inbound correlation header.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Shared application state injected into handlers.
pub struct AppState {
    pub dispatcher: MethodDispatcher,
}

/// Builds the HTTP surface: `POST /method` and a JSON 404 for everything else,
/// other verbs on `/method` included.
///
/// The body limit is enforced by the `Bytes` extractor so an oversized body
/// still goes through [`respond`].
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/method", post(method_handler).fallback(not_found))
        .route("/method/", post(method_handler).fallback(not_found))
        .fallback(not_found)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(CatchPanicLayer::custom(handle_panic))
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
}

/// Span for one HTTP exchange. `request_id` is filled in once the handler
/// has resolved it, so logs emitted below the handler (panics included)
/// carry it.
fn request_span(request: &Request) -> Span {
    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = tracing::field::Empty,
    )
}

/// Correlation id from the inbound header, or a fresh one.
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().simple().to_string())
}

/// POST /method
///
/// Parses the body as JSON and hands it to the dispatcher. Unreadable or
/// unparseable bodies never reach the core and answer 400.
pub async fn method_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let mut ctx = RequestContext::new(request_id(&headers));
    Span::current().record("request_id", ctx.request_id.as_str());

    let outcome = body
        .map_err(|e| AppError::BadRequest(e.body_text()))
        .and_then(|body| {
            serde_json::from_slice::<Value>(&body).map_err(|e| AppError::BadRequest(e.to_string()))
        })
        .and_then(|request| {
            tracing::debug!(request_id = %ctx.request_id, %request, "POST /method");
            state.dispatcher.dispatch(&request, &mut ctx)
        });

    respond(&ctx, outcome)
}

/// Fallback for every unknown path.
pub async fn not_found(uri: Uri, headers: HeaderMap) -> Response {
    let ctx = RequestContext::new(request_id(&headers));
    Span::current().record("request_id", ctx.request_id.as_str());
    respond(&ctx, Err(AppError::NotFound(uri.path().to_string())))
}

/// Logs the outcome once and renders the response envelope.
fn respond(ctx: &RequestContext, outcome: Result<Value, AppError>) -> Response {
    let context = json!(ctx);
    match outcome {
        Ok(response) => {
            tracing::info!(
                request_id = %ctx.request_id,
                code = 200,
                %context,
                %response,
                "request completed"
            );
            (
                StatusCode::OK,
                Json(json!({ "response": response, "code": StatusCode::OK.as_u16() })),
            )
                .into_response()
        }
        Err(err) => {
            let code = err.status().as_u16();
            let error = err.public_message();
            match &err {
                AppError::Internal(detail) => tracing::error!(
                    request_id = %ctx.request_id,
                    code,
                    %context,
                    %detail,
                    "request failed"
                ),
                other => tracing::warn!(
                    request_id = %ctx.request_id,
                    code,
                    %context,
                    %error,
                    cause = %other,
                    "request rejected"
                ),
            }
            err.into_response()
        }
    }
}

/// Turns a panic anywhere below the router into the opaque 500 envelope.
///
/// Runs inside the request span, which holds the request id.
fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| panic.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "unknown panic".to_string());
    tracing::error!(code = 500, %detail, "handler panicked");
    AppError::Internal(detail).into_response()
}
