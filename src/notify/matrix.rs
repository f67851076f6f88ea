use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::time::Duration;

use super::{format, Notifier, QuakeAlert};
use crate::config::MatrixConfig;

/// Posts alerts into a Matrix room through the client-server API.
///
/// Credentials are checked per send, not at construction, so a monitor with
/// a half-configured backend still classifies and logs every cycle.
#[derive(Clone)]
pub struct MatrixNotifier {
    base_url: Option<String>,
    room_id: Option<String>,
    access_token: Option<String>,
    client: Client,
    timeout: Duration,
    max_attempts: u32,
    backoff_unit: Duration,
}

impl MatrixNotifier {
    pub fn new(base_url: String, room_id: String, access_token: String) -> Self {
        Self::from_parts(Some(base_url), Some(room_id), Some(access_token))
    }

    pub fn from_config(cfg: &MatrixConfig) -> Self {
        Self::from_parts(
            cfg.base_url.clone(),
            cfg.room_id.clone(),
            cfg.access_token.clone(),
        )
    }

    fn from_parts(
        base_url: Option<String>,
        room_id: Option<String>,
        access_token: Option<String>,
    ) -> Self {
        Self {
            base_url,
            room_id,
            access_token,
            client: Client::new(),
            timeout: Duration::from_secs(30),
            max_attempts: 5,
            backoff_unit: Duration::from_secs(1),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn with_retries(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Backoff after attempt `n` is `n² × unit`.
    pub fn with_backoff_unit(mut self, unit: Duration) -> Self {
        self.backoff_unit = unit;
        self
    }

    fn credentials(&self) -> Result<(&str, &str, &str)> {
        match (&self.base_url, &self.room_id, &self.access_token) {
            (Some(b), Some(r), Some(t)) if !b.is_empty() && !r.is_empty() && !t.is_empty() => {
                Ok((b.as_str(), r.as_str(), t.as_str()))
            }
            _ => Err(anyhow!(
                "missing Matrix settings (MATRIX_BASE_URL, MATRIX_ROOM_ID, MATRIX_ACCESS_TOKEN)"
            )),
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_unit * attempt.saturating_mul(attempt)
    }
}

/// `/_matrix/client/v3/rooms/{room}/send/m.room.message/{txn}`; path
/// segments are percent-encoded.
pub fn send_url(base_url: &str, room_id: &str, txn_id: &str) -> Result<Url> {
    let mut url = Url::parse(base_url).context("invalid MATRIX_BASE_URL")?;
    url.path_segments_mut()
        .map_err(|_| anyhow!("MATRIX_BASE_URL cannot be a base URL"))?
        .pop_if_empty()
        .extend([
            "_matrix",
            "client",
            "v3",
            "rooms",
            room_id,
            "send",
            "m.room.message",
            txn_id,
        ]);
    Ok(url)
}

/// Unique per send, stable across retries of the same send.
pub fn transaction_id(alert: &QuakeAlert, now_millis: i64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(alert.current.fine_key().as_bytes());
    hasher.update(alert.current.bulletin_reference.as_bytes());
    let digest = hasher.finalize();
    let mut out = format!("{now_millis}-");
    for b in digest.iter().take(4) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

#[derive(Serialize)]
struct RoomMessage<'a> {
    msgtype: &'a str,
    body: &'a str,
    format: &'a str,
    formatted_body: &'a str,
}

#[async_trait]
impl Notifier for MatrixNotifier {
    async fn send(&self, alert: &QuakeAlert) -> Result<()> {
        let (base_url, room_id, token) = self.credentials()?;

        let txn = transaction_id(alert, chrono::Utc::now().timestamp_millis());
        let url = send_url(base_url, room_id, &txn)?;

        let msg = format::render(alert);
        let payload = RoomMessage {
            msgtype: "m.text",
            body: &msg.plain,
            format: "org.matrix.custom.html",
            formatted_body: &msg.html,
        };

        let mut last_err = anyhow!("no attempt made");
        for attempt in 1..=self.max_attempts {
            tracing::debug!(target: "notify", %url, attempt, "posting to Matrix");
            let res = self
                .client
                .put(url.clone())
                .bearer_auth(token)
                .timeout(self.timeout)
                .json(&payload)
                .send()
                .await;

            match res {
                Ok(rsp) if rsp.status().is_success() => return Ok(()),
                Ok(rsp) => {
                    let status = rsp.status();
                    let body = rsp.text().await.unwrap_or_default();
                    tracing::warn!(target: "notify", attempt, %status, body = body.trim(), "Matrix send failed");
                    last_err = anyhow!("Matrix API error (HTTP {status}): {}", body.trim());
                }
                Err(e) => {
                    tracing::warn!(target: "notify", attempt, error = %e, "Matrix send failed (network)");
                    last_err = anyhow!("Matrix request failed: {e}");
                }
            }

            if attempt < self.max_attempts {
                tokio::time::sleep(self.backoff(attempt)).await;
            }
        }

        Err(last_err.context(format!("giving up after {} attempts", self.max_attempts)))
    }

    fn name(&self) -> &'static str {
        "matrix"
    }
}
