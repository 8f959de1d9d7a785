use std::path::Path;

use anyhow::Context;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use phatik_server_shared::{
    deserialize, serialize, Event, EventList, ListOptions, PhaticMessage, TagList, TagListOptions,
};
use thiserror::Error;
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
};

use crate::{business::EventStore, config::Configuration};

#[derive(Debug, Error)]
pub(crate) enum ApiError {
    #[error("storage failure: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        log::error!("{self}");
        match self {
            ApiError::Storage(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "storage failure").into_response()
            }
        }
    }
}

pub(crate) async fn serve_rest_endpoint(
    store: EventStore,
    config: &Configuration,
) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("when binding {}", config.listen))?;
    log::info!("listening on http://{}", config.listen);

    axum::serve(listener, router(store, &config.static_dir))
        .await
        .context("when serving")
}

pub(crate) fn router(store: EventStore, static_dir: &Path) -> Router {
    // client side routes like /settings fall through to the app's index.html
    let app = ServeDir::new(static_dir).fallback(ServeFile::new(static_dir.join("index.html")));

    Router::new()
        .route("/api/status", get(list_status).post(post_status))
        .route("/api/tags", get(list_tags))
        .route("/api/websocket", get(websocket))
        .layer(CorsLayer::permissive())
        .fallback_service(app)
        .with_state(store)
}

async fn list_status(
    State(store): State<EventStore>,
    Query(options): Query<ListOptions>,
) -> Result<Json<EventList>, ApiError> {
    Ok(Json(store.list(options).await?))
}

async fn post_status(
    State(store): State<EventStore>,
    Json(event): Json<Event>,
) -> Result<StatusCode, ApiError> {
    store.post(event).await?;
    Ok(StatusCode::CREATED)
}

async fn list_tags(
    State(store): State<EventStore>,
    Query(options): Query<TagListOptions>,
) -> Result<Json<TagList>, ApiError> {
    Ok(Json(store.tags(options).await?))
}

async fn websocket(ws: WebSocketUpgrade, State(store): State<EventStore>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, store))
}

#[derive(Debug, PartialEq, Eq)]
enum FrameOutcome {
    Reply(String),
    Skip,
    Close,
}

/// Answers one text frame. Frames that do not decode are skipped, the
/// socket only closes when storage fails.
async fn answer_frame(store: &EventStore, incoming: &str) -> FrameOutcome {
    let message = match deserialize::<PhaticMessage>(incoming) {
        Ok(message) => message,
        Err(e) => {
            log::warn!("ignoring undecodable websocket frame: {e}");
            return FrameOutcome::Skip;
        }
    };

    match store.handle_phatic_message(message).await {
        Ok(Some(reply)) => match serialize(&reply) {
            Ok(reply) => FrameOutcome::Reply(reply),
            Err(e) => {
                log::error!("cannot encode reply: {e}");
                FrameOutcome::Skip
            }
        },
        Ok(None) => FrameOutcome::Skip,
        Err(e) => {
            log::error!("websocket request failed: {e:#}");
            FrameOutcome::Close
        }
    }
}

async fn handle_socket(mut socket: WebSocket, store: EventStore) {
    while let Some(Ok(incoming)) = socket.recv().await {
        let Message::Text(incoming) = incoming else {
            continue;
        };

        match answer_frame(&store, &incoming).await {
            FrameOutcome::Reply(reply) => {
                if socket.send(Message::Text(reply)).await.is_err() {
                    break;
                }
            }
            FrameOutcome::Skip => (),
            FrameOutcome::Close => break,
        }
    }
}
