//! Server-sent progress stream.
//!
//! The progress endpoint pushes one `data: <json>` event per update and
//! closes the stream after a terminal status. Each event carries either a
//! [`ProgressUpdate`] or an `{"error": ...}` object.

use serde::{Deserialize, Serialize};

use crate::error::UploadError;
use crate::progress::{ProgressRecord, ProgressSnapshot, ProgressStatus};

/// Progress update pushed by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub status: ProgressStatus,
    #[serde(default)]
    pub processed_rows: u64,
    #[serde(default)]
    pub total_rows: u64,
    /// Completion in percent as computed by the server.
    #[serde(default)]
    pub percentage: f64,
    #[serde(default)]
    pub error_message: String,
}

impl ProgressUpdate {
    pub fn snapshot(&self) -> ProgressSnapshot {
        let percent = if self.percentage.is_finite() {
            self.percentage.clamp(0.0, 100.0).floor() as u8
        } else {
            0
        };
        ProgressSnapshot::new(self.status, percent)
    }
}

impl From<&ProgressRecord> for ProgressUpdate {
    fn from(record: &ProgressRecord) -> Self {
        Self {
            status: record.status,
            processed_rows: record.processed_rows,
            total_rows: record.total_rows,
            percentage: f64::from(record.percent()),
            error_message: record.error_message.clone(),
        }
    }
}

/// One event of the progress stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProgressFrame {
    Update(ProgressUpdate),
    Error { error: String },
}

impl ProgressFrame {
    /// Encode as a server-sent event.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        Ok(format!("data: {}\n\n", serde_json::to_string(self)?))
    }

    /// Whether the server closes the stream after this frame.
    pub fn is_final(&self) -> bool {
        match self {
            ProgressFrame::Update(update) => update.status.is_terminal(),
            ProgressFrame::Error { .. } => true,
        }
    }
}

/// Largest event the decoder holds before rejecting the stream.
pub const MAX_FRAME_BYTES: usize = 64 * 1024;

/// Incremental decoder for the progress stream.
///
/// Accepts arbitrary chunk boundaries, including splits inside a UTF-8
/// sequence or between `\r` and `\n`. An event larger than
/// [`MAX_FRAME_BYTES`] is a `MALFORMED_FRAME` error and resets the decoder.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: Vec<u8>,
    data: Vec<String>,
    data_bytes: usize,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return every frame it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<ProgressFrame>, UploadError> {
        self.buf.extend_from_slice(chunk);
        let mut frames = Vec::new();

        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = std::str::from_utf8(&raw)
                .map_err(|e| UploadError::malformed_frame(format!("invalid UTF-8: {}", e)))?;
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                if let Some(frame) = self.dispatch()? {
                    frames.push(frame);
                }
            } else if let Some(value) = line.strip_prefix("data:") {
                let value = value.strip_prefix(' ').unwrap_or(value);
                self.data_bytes += value.len() + 1;
                if self.data_bytes > MAX_FRAME_BYTES {
                    return Err(self.overflow());
                }
                self.data.push(value.to_string());
            }
            // Comments (":keepalive") and other fields are ignored.
        }

        if self.buf.len() > MAX_FRAME_BYTES {
            return Err(self.overflow());
        }
        Ok(frames)
    }

    fn overflow(&mut self) -> UploadError {
        self.buf.clear();
        self.data.clear();
        self.data_bytes = 0;
        UploadError::malformed_frame(format!("event exceeds {} bytes", MAX_FRAME_BYTES))
    }

    /// Bytes buffered without a complete line yet.
    pub fn pending_bytes(&self) -> usize {
        self.buf.len()
    }

    fn dispatch(&mut self) -> Result<Option<ProgressFrame>, UploadError> {
        if self.data.is_empty() {
            return Ok(None);
        }
        let payload = self.data.join("\n");
        self.data.clear();
        self.data_bytes = 0;
        serde_json::from_str(&payload)
            .map(Some)
            .map_err(|e| UploadError::malformed_frame(format!("invalid frame payload: {}", e)))
    }
}
