//! # Optional HTTP listener.
//!
//! [`HttpListener`] wraps an `axum::Router` and a bind address. The
//! orchestrator binds the socket up front (so a bad address fails startup
//! as a scheduling error, before any unit runs) and then serves on the
//! scheduler as one more unit of work. Routing rules are entirely the
//! application's business; the runtime only starts and stops the server.
//!
//! Requires the `http` feature.

use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;

/// An HTTP server waiting to be started by the runtime.
///
/// Either serve the built-in default router (a bare `/health` endpoint) or
/// bring a preconfigured `axum::Router`:
///
/// ```rust
/// use axum::{routing::get, Router};
/// use colony::HttpListener;
///
/// let listener = HttpListener::bind("127.0.0.1", 8080)
///     .with_router(Router::new().route("/hello", get(|| async { "hi" })));
/// ```
pub struct HttpListener {
    host: String,
    port: u16,
    router: Router,
}

impl HttpListener {
    /// Creates a listener for `host:port` with the default router.
    pub fn bind(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            router: default_router(),
        }
    }

    /// Replaces the router with a preconfigured one.
    pub fn with_router(mut self, router: Router) -> Self {
        self.router = router;
        self
    }

    /// Bind address as `host:port`.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Binds the socket. Split from serving so the orchestrator can fail
    /// startup cleanly on a bad address.
    pub(crate) async fn into_bound(self) -> std::io::Result<BoundListener> {
        let listener = TcpListener::bind(self.addr()).await?;
        Ok(BoundListener {
            listener,
            router: self.router,
        })
    }
}

/// A listener with its socket already bound, ready to serve.
pub(crate) struct BoundListener {
    listener: TcpListener,
    router: Router,
}

impl BoundListener {
    /// Serves until the process terminates.
    pub(crate) async fn serve(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router).await
    }
}

/// Default router: `GET /health` → `{ "ok": true }`.
fn default_router() -> Router {
    Router::new().route("/health", get(|| async { Json(json!({ "ok": true })) }))
}
