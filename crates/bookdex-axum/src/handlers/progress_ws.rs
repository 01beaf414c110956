//! WebSocket upgrade handler for the per-job progress channel.
//!
//! `GET /ws/progress?jobId=<uuid>&token=<opaque>`. 426 without an upgrade
//! request, 400 without a job id, 401 on token mismatch or expiry. After
//! the upgrade the socket's send half is handed to the job's progress
//! actor; this handler only pumps inbound frames.

use crate::state::AppState;
use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bookdex_jobs::{ProgressHandle, ProgressSocket, SocketError};
use futures_util::SinkExt;
use futures_util::stream::{SplitSink, StreamExt};
use serde::Deserialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct ProgressParams {
    #[serde(rename = "jobId")]
    job_id: Option<Uuid>,
    token: Option<String>,
}

/// `GET /ws/progress`
pub async fn progress_ws(
    State(state): State<AppState>,
    Query(params): Query<ProgressParams>,
    upgrade: Option<WebSocketUpgrade>,
) -> Response {
    let Some(upgrade) = upgrade else {
        return (StatusCode::UPGRADE_REQUIRED, "WebSocket upgrade required").into_response();
    };
    let Some(job_id) = params.job_id else {
        return (StatusCode::BAD_REQUEST, "jobId is required").into_response();
    };
    let token = params.token.unwrap_or_default();

    // Authenticate before accepting the upgrade.
    let handle = state.jobs.registry.lookup(job_id);
    if let Err(e) = handle.validate_token(&token).await {
        debug!(%job_id, error = %e, "progress socket rejected");
        return (StatusCode::UNAUTHORIZED, "invalid or expired token").into_response();
    }

    upgrade.on_upgrade(move |socket| serve_progress_socket(socket, handle))
}

/// Send half of an axum WebSocket, as the actor sees it.
struct AxumProgressSocket {
    sink: SplitSink<WebSocket, Message>,
}

#[async_trait::async_trait]
impl ProgressSocket for AxumProgressSocket {
    async fn send_text(&mut self, text: String) -> Result<(), SocketError> {
        self.sink
            .send(Message::Text(text))
            .await
            .map_err(|_| SocketError::Closed)
    }

    async fn close(&mut self, code: u16, reason: &str) {
        let frame = CloseFrame { code, reason: reason.to_string().into() };
        let _ = self.sink.send(Message::Close(Some(frame))).await;
    }
}

async fn serve_progress_socket(socket: WebSocket, handle: ProgressHandle) {
    let (sink, mut inbound) = socket.split();
    if handle
        .attach_socket(Box::new(AxumProgressSocket { sink }))
        .await
        .is_err()
    {
        warn!(job_id = %handle.job_id(), "actor gone before socket attach");
        return;
    }
    info!(job_id = %handle.job_id(), "progress socket attached");

    while let Some(frame) = inbound.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                match serde_json::from_str::<bookdex_core::job::ClientMessage>(&text) {
                    Ok(bookdex_core::job::ClientMessage::Ready) => {
                        if handle.client_ready().await.is_err() {
                            break;
                        }
                    }
                    // Unknown or malformed frames are logged and ignored;
                    // nothing a client sends can hurt the actor.
                    Err(e) => debug!(job_id = %handle.job_id(), error = %e, "ignoring frame"),
                }
            }
            Ok(Message::Close(_)) | Err(_) => break,
            // Ping/pong/binary: ignore.
            Ok(_) => {}
        }
    }

    let _ = handle.client_closed().await;
    info!(job_id = %handle.job_id(), "progress socket detached");
}
