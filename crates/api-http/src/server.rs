//! HTTP/1.1 server over hyper
//!
//! One task per connection; every request body is collected, up to
//! `max_body_bytes`, before it reaches the handler.

use crate::error::{Result, ServerError};
use crate::handler::{error_response, GatewayHandler, HttpResponse};
use http::Request;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

/// Largest request body accepted unless configured otherwise (1 MB)
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

pub struct HttpServer {
    listener: TcpListener,
    handler: Arc<GatewayHandler>,
    max_body_bytes: usize,
}

impl HttpServer {
    /// Bind without accepting yet; port 0 picks a free port
    pub async fn bind(addr: &str, handler: Arc<GatewayHandler>) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        Ok(Self {
            listener,
            handler,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        })
    }

    /// Bodies larger than this are answered with 413
    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until `shutdown` resolves
    pub async fn serve(self, shutdown: impl Future<Output = ()>) -> Result<()> {
        info!(
            addr = %self.local_addr()?,
            max_body_bytes = self.max_body_bytes,
            "HTTP server listening"
        );
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, remote_addr)) => {
                            let handler = Arc::clone(&self.handler);
                            let max_body_bytes = self.max_body_bytes;
                            tokio::spawn(async move {
                                if let Err(e) = serve_connection(stream, handler, max_body_bytes).await {
                                    debug!(%remote_addr, error = %e, "Connection closed with error");
                                }
                            });
                        }
                        Err(e) => error!(error = %e, "Failed to accept connection"),
                    }
                }
                _ = &mut shutdown => {
                    info!("Shutdown signal received, stopping HTTP server");
                    break;
                }
            }
        }

        Ok(())
    }
}

async fn serve_connection(
    stream: tokio::net::TcpStream,
    handler: Arc<GatewayHandler>,
    max_body_bytes: usize,
) -> std::result::Result<(), hyper::Error> {
    let service = service_fn(move |req: Request<Incoming>| {
        let handler = Arc::clone(&handler);
        async move { Ok::<_, Infallible>(handle_incoming(&handler, req, max_body_bytes).await) }
    });

    http1::Builder::new()
        .serve_connection(TokioIo::new(stream), service)
        .await
}

async fn handle_incoming(
    handler: &GatewayHandler,
    req: Request<Incoming>,
    max_body_bytes: usize,
) -> HttpResponse {
    let (parts, body) = req.into_parts();
    let bytes = match Limited::new(body, max_body_bytes).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            debug!(max_body_bytes, "Request body over limit");
            return error_response(
                413,
                format!("Request body exceeds {} bytes", max_body_bytes),
            );
        }
        Err(e) => {
            debug!(error = %e, "Failed to read request body");
            return error_response(400, format!("Failed to read request body: {}", e));
        }
    };
    handler.handle(Request::from_parts(parts, bytes)).await
}
