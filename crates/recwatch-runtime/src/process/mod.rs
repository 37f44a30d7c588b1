//! Recorder process infrastructure.
//!
//! - [`RecorderProcess`] — one spawned worker instance with piped output.
//! - [`shutdown`] — SIGTERM → SIGKILL escalation with a bounded grace
//!   period.
//! - `stream` — byte-based line draining that survives non-UTF8 output.

mod handle;
pub mod shutdown;
mod stream;

pub use handle::{RecorderProcess, WorkerCommand};
pub(crate) use stream::drain_lines;
