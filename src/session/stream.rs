// SPDX-License-Identifier: GPL-3.0-only

//! Multipart MJPEG stream generator
//!
//! Produces a lazy, infinite sequence of multipart chunks ready to be
//! written straight into a persistent HTTP response body. Each chunk
//! is one JPEG frame framed as
//! `--frame\r\nContent-Type: image/jpeg\r\n\r\n<jpeg>\r\n`.
//!
//! The guarded read, filter pass, and JPEG encode are blocking work
//! and run under `spawn_blocking`; only the framing and pacing happen
//! on the async executor. The sequence terminates when the controller
//! is torn down.

use super::{SessionController, SessionInner};
use crate::constants::{STREAM_BOUNDARY, STREAM_IDLE_WAIT, STREAM_JPEG_QUALITY, STREAM_PACING};
use crate::errors::AppError;
use crate::pipelines::photo;
use futures::Stream;
use std::sync::Arc;
use tracing::{debug, warn};

impl SessionInner {
    /// Read, filter, downscale, and encode one frame as a multipart
    /// chunk.
    fn stream_chunk(&self) -> Result<Vec<u8>, AppError> {
        let frame = self.read_filtered()?;
        let frame = photo::downscale_for_stream(&frame);
        let jpeg = photo::encode_jpeg(&frame, STREAM_JPEG_QUALITY)?;

        let header = format!(
            "--{}\r\nContent-Type: image/jpeg\r\n\r\n",
            STREAM_BOUNDARY
        );
        let mut chunk = Vec::with_capacity(header.len() + jpeg.len() + 2);
        chunk.extend_from_slice(header.as_bytes());
        chunk.extend_from_slice(&jpeg);
        chunk.extend_from_slice(b"\r\n");
        Ok(chunk)
    }
}

impl SessionController {
    /// Lazy, non-restartable stream of encoded frame chunks.
    ///
    /// While no device is open the stream idles and retries; read
    /// failures without a cached fallback back off the same way. A
    /// short pacing sleep after each yielded chunk bounds CPU and
    /// bandwidth.
    pub fn stream_frames(&self) -> impl Stream<Item = Vec<u8>> + Send + 'static {
        let inner = Arc::clone(&self.inner);

        async_stream::stream! {
            while inner.is_active() {
                if !inner.is_device_open() {
                    tokio::time::sleep(STREAM_IDLE_WAIT).await;
                    continue;
                }

                let worker = Arc::clone(&inner);
                match tokio::task::spawn_blocking(move || worker.stream_chunk()).await {
                    Ok(Ok(chunk)) => {
                        yield chunk;
                        tokio::time::sleep(STREAM_PACING).await;
                    }
                    Ok(Err(e)) => {
                        debug!(error = %e, "Stream iteration skipped");
                        tokio::time::sleep(STREAM_IDLE_WAIT).await;
                    }
                    Err(e) => {
                        warn!(error = %e, "Stream worker task failed");
                        tokio::time::sleep(STREAM_IDLE_WAIT).await;
                    }
                }
            }
            debug!("Frame stream terminated");
        }
    }
}
