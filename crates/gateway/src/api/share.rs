//! Share session endpoints.
//!
//! The initiator calls `initiate` then `update-torrent`; the receiver reads
//! `session/:id`; both report progress through `update-status`.

use std::net::SocketAddr;

use axum::extract::rejection::JsonRejection;
use axum::extract::{ConnectInfo, Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;

use pb_domain::error::Error;
use pb_sessions::identity::client_fingerprint;
use pb_sessions::{FileMetadata, SessionStatus, StatusUpdate};

use crate::api::error::ApiError;
use crate::state::AppState;

type ApiResult<T> = Result<T, ApiError>;

/// Unwrap a JSON body, turning axum's rejection into a 400 `{ "error" }`.
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(v)| v)
        .map_err(|e| ApiError(Error::invalid(e.body_text())))
}

fn success() -> Response {
    Json(serde_json::json!({ "success": true })).into_response()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /v1/share/initiate
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateBody {
    pub file_metadata: FileMetadata,
}

/// Create a session for the calling browser.  Responds 201 with the
/// shareable link and public key.
pub async fn initiate(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    payload: Result<Json<InitiateBody>, JsonRejection>,
) -> ApiResult<Response> {
    let req = body(payload)?;

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let client_ip = connect_info
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_default();
    let fingerprint = client_fingerprint(user_agent, &client_ip);

    let summary = state
        .sessions
        .create_session(&fingerprint, req.file_metadata)
        .await?;
    Ok((StatusCode::CREATED, Json(summary)).into_response())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /v1/share/update-torrent
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTorrentBody {
    pub session_id: String,
    pub torrent_info_hash: String,
    pub magnet_uri: String,
}

pub async fn update_torrent(
    State(state): State<AppState>,
    payload: Result<Json<UpdateTorrentBody>, JsonRejection>,
) -> ApiResult<Response> {
    let req = body(payload)?;
    state
        .sessions
        .update_torrent(&req.session_id, &req.torrent_info_hash, &req.magnet_uri)
        .await?;
    Ok(success())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /v1/share/session/:session_id
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Response> {
    let view = state.sessions.get_session_info(&session_id).await?;
    Ok(Json(view).into_response())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /v1/share/update-status
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusBody {
    pub session_id: String,
    pub status: SessionStatus,
    #[serde(default)]
    pub peers: Option<u32>,
    #[serde(default)]
    pub progress: Option<u32>,
}

pub async fn update_status(
    State(state): State<AppState>,
    payload: Result<Json<UpdateStatusBody>, JsonRejection>,
) -> ApiResult<Response> {
    let req = body(payload)?;
    state
        .sessions
        .update_status(
            &req.session_id,
            StatusUpdate {
                status: req.status,
                peers: req.peers,
                progress: req.progress,
            },
        )
        .await?;
    Ok(success())
}
