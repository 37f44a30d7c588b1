//! Token gate for the `/api/*` surface.
//!
//! When a token is configured every API request must carry it, either as
//! `Authorization: Bearer <token>` or as a `?token=` query parameter (the
//! query form exists because `EventSource` cannot set headers). The
//! expected header value is pre-built once so the per-request check is a
//! plain string comparison.

use std::sync::Arc;

use axum::extract::Request;
use axum::http::{StatusCode, header};
use axum::middleware::Next;
use axum::response::Response;
use tracing::warn;

/// Pre-computed credentials for the auth middleware.
#[derive(Debug, Clone)]
pub struct TokenGate {
    expected_header: Arc<str>,
    expected_query: Arc<str>,
}

impl TokenGate {
    /// Build a gate for `token`.
    #[must_use]
    pub fn new(token: &str) -> Self {
        Self {
            expected_header: Arc::from(format!("Bearer {token}")),
            expected_query: Arc::from(format!("token={token}")),
        }
    }

    /// Middleware body: pass the request through when the token matches,
    /// otherwise answer 401 with a `WWW-Authenticate` challenge.
    pub async fn check(self, req: Request, next: Next) -> Result<Response, StatusCode> {
        if self.authorized(&req) {
            return Ok(next.run(req).await);
        }

        warn!(path = %req.uri().path(), "unauthorized API request");
        let mut res = Response::new(axum::body::Body::empty());
        *res.status_mut() = StatusCode::UNAUTHORIZED;
        res.headers_mut().insert(
            header::WWW_AUTHENTICATE,
            header::HeaderValue::from_static("Bearer"),
        );
        Ok(res)
    }

    fn authorized(&self, req: &Request) -> bool {
        let header_ok = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|h| h == self.expected_header.as_ref());
        if header_ok {
            return true;
        }

        req.uri()
            .query()
            .is_some_and(|q| q.split('&').any(|pair| pair == self.expected_query.as_ref()))
    }
}
