//! Thin HTTP client for the signaling service's room endpoints
//! (`SPEC_FULL.md` §4.1, §4.2 "`POST /create` client-side retry policy: 3
//! attempts, 1 s backoff").

use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use stardewl_core::RoomCode;
use tracing::warn;

const CREATE_RETRIES: usize = 3;
const CREATE_RETRY_BACKOFF: Duration = Duration::from_secs(1);

#[derive(Deserialize)]
struct CreateRoomResponse {
    code: String,
}

#[derive(Deserialize)]
struct JoinRoomResponse {
    ready: bool,
}

/// `POST {http_base}/create`, retried up to [`CREATE_RETRIES`] times.
pub async fn create_room(http_base: &str) -> Result<RoomCode> {
    let client = reqwest::Client::new();
    let url = format!("{http_base}/create");

    let mut last_err = None;
    for attempt in 0..CREATE_RETRIES {
        match client.post(&url).send().await {
            Ok(resp) if resp.status().is_success() => {
                let body: CreateRoomResponse = resp.json().await.context("malformed /create response")?;
                return RoomCode::new(body.code).context("signaling service returned an invalid room code");
            }
            Ok(resp) => last_err = Some(anyhow::anyhow!("signaling service returned {}", resp.status())),
            Err(err) => last_err = Some(err.into()),
        }
        if attempt + 1 < CREATE_RETRIES {
            warn!(attempt, "/create failed, retrying");
            tokio::time::sleep(CREATE_RETRY_BACKOFF).await;
        }
    }
    Err(last_err.unwrap_or_else(|| anyhow::anyhow!("/create failed for an unknown reason")))
}

/// `GET {http_base}/join/{code}`. Returns whether a host is already present;
/// fails if the room does not exist.
pub async fn room_ready(http_base: &str, code: &RoomCode) -> Result<bool> {
    let client = reqwest::Client::new();
    let url = format!("{http_base}/join/{code}");
    let resp = client.get(&url).send().await.context("failed to reach signaling service")?;

    if resp.status() == reqwest::StatusCode::NOT_FOUND {
        bail!("no room with code {code} exists");
    }
    if !resp.status().is_success() {
        bail!("signaling service returned {}", resp.status());
    }

    let body: JoinRoomResponse = resp.json().await.context("malformed /join response")?;
    Ok(body.ready)
}
