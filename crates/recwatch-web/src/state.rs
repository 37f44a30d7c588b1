//! Shared application state type.

use crate::bootstrap::WebContext;
use std::sync::Arc;

/// Application state shared across all handlers: an Arc-wrapped
/// [`WebContext`] holding the supervisor and the config store.
pub type AppState = Arc<WebContext>;
