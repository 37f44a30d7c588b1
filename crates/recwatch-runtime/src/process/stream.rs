//! Byte-based line draining of worker output (non-UTF8-safe).
//!
//! Recorders shell out to ffmpeg and friends, which can emit non-UTF8
//! bytes. `BufReader::lines()` would abort the drain loop on the first
//! invalid sequence, so lines are read as bytes and decoded lossily.

use recwatch_core::WorkerEvent;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::debug;

use crate::bus::EventBus;

/// Read `stream` line by line until end-of-stream, publishing every
/// non-empty line as a log event. Returns once the stream closes.
pub(crate) async fn drain_lines(stream: impl AsyncRead + Unpin, bus: EventBus) {
    let mut reader = BufReader::new(stream);
    let mut buf: Vec<u8> = Vec::with_capacity(1024);

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break, // EOF: process closed its output
            Ok(_) => {
                if buf.last() == Some(&b'\n') {
                    buf.pop();
                    if buf.last() == Some(&b'\r') {
                        buf.pop();
                    }
                }

                let line = String::from_utf8_lossy(&buf);
                let trimmed = line.trim();
                if !trimmed.is_empty() {
                    bus.publish(WorkerEvent::log(trimmed));
                }
            }
            Err(e) => {
                debug!(error = %e, "drain loop exiting on read error");
                break;
            }
        }
    }
}
