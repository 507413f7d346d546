//! FirebaseBlobStore — concrete `BlobStore` over the Firebase Storage
//! resumable-upload protocol.
//!
//! An upload opens a resumable session, streams the payload in fixed-size
//! chunks with offset headers, and finalizes on the last chunk. A
//! `TransferEvent` is emitted after every chunk so callers can track
//! fractional progress. The chunk-span planner and URL helpers are pure and
//! unit tested without network access.

use serde_json::Value;

use super::{BlobStore, TransferEvent, TransferSender};
use crate::error::AppError;

const STORAGE_BASE_URL: &str = "https://firebasestorage.googleapis.com/v0";
const USER_AGENT: &str = "escrowdesk/0.1.0";

/// Upload chunk size: 8 MiB (a multiple of the protocol's 256 KiB quantum).
pub const UPLOAD_CHUNK_SIZE: u64 = 8_388_608;

pub struct FirebaseBlobStore {
    client: reqwest::Client,
    bucket: String,
}

impl FirebaseBlobStore {
    pub fn new(bucket: &str) -> crate::error::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(300))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            bucket: bucket.to_string(),
        })
    }

    /// Open a resumable session and return the session URL to stream
    /// chunks against.
    async fn start_session(&self, key: &str, total_bytes: u64) -> crate::error::Result<String> {
        let url = format!("{}/b/{}/o", STORAGE_BASE_URL, self.bucket);
        let resp = self
            .client
            .post(&url)
            .query(&[("uploadType", "resumable"), ("name", key)])
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", total_bytes)
            .json(&serde_json::json!({}))
            .send()
            .await?
            .error_for_status()?;
        resp.headers()
            .get("X-Goog-Upload-URL")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
            .ok_or_else(|| AppError::Network("resumable session without upload URL".into()))
    }
}

impl BlobStore for FirebaseBlobStore {
    async fn upload_blob(
        &self,
        key: &str,
        payload: Vec<u8>,
        progress: TransferSender,
    ) -> crate::error::Result<String> {
        let total_bytes = payload.len() as u64;
        let session_url = self.start_session(key, total_bytes).await?;

        let spans = chunk_spans(total_bytes, UPLOAD_CHUNK_SIZE);
        let last = spans.len().saturating_sub(1);
        let mut finalize_body: Value = Value::Null;

        for (i, (offset, len)) in spans.iter().copied().enumerate() {
            let command = if i == last { "upload, finalize" } else { "upload" };
            let chunk = payload[offset as usize..(offset + len) as usize].to_vec();
            let resp = self
                .client
                .put(&session_url)
                .header("X-Goog-Upload-Command", command)
                .header("X-Goog-Upload-Offset", offset)
                .body(chunk)
                .send()
                .await?
                .error_for_status()?;

            let _ = progress.send(TransferEvent {
                bytes_transferred: offset + len,
                total_bytes,
            });

            if i == last {
                finalize_body = resp.json().await?;
            }
        }

        let token = finalize_body
            .get("downloadTokens")
            .and_then(|t| t.as_str())
            .and_then(|t| t.split(',').next())
            .ok_or_else(|| AppError::Network("finalized upload without download token".into()))?;
        Ok(object_url(&self.bucket, key, token))
    }
}

/// Plan the `(offset, len)` spans a payload is streamed in. A zero-byte
/// payload still gets one empty finalizing span.
pub(crate) fn chunk_spans(total_bytes: u64, chunk_size: u64) -> Vec<(u64, u64)> {
    if total_bytes == 0 {
        return vec![(0, 0)];
    }
    let mut spans = Vec::new();
    let mut offset = 0;
    while offset < total_bytes {
        let len = chunk_size.min(total_bytes - offset);
        spans.push((offset, len));
        offset += len;
    }
    spans
}

/// Tokened retrieval URL for a stored object.
pub(crate) fn object_url(bucket: &str, key: &str, token: &str) -> String {
    format!(
        "{}/b/{}/o/{}?alt=media&token={}",
        STORAGE_BASE_URL,
        bucket,
        encode_object_path(key),
        token
    )
}

/// Percent-encode an object key for use as a single URL path segment.
/// Storage keys embed `/` (project id prefix), which must become `%2F`.
pub(crate) fn encode_object_path(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}
