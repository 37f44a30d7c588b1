//! Domain types shared by the recwatch runtime and web adapter.
//!
//! This crate holds the pure pieces: the worker lifecycle state, the
//! tagged event union streamed to viewers, and the on-disk configuration
//! store for the recorder's `config.ini` / `URL_config.ini` pair.

pub mod config;
pub mod events;

// Re-export commonly used types for convenience
pub use config::{ConfigBundle, ConfigError, ConfigStore, UrlConfig};
pub use events::{WorkerEvent, WorkerState};
