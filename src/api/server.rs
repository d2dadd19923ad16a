//! API server lifecycle: bind → serve → graceful shutdown on Ctrl-C.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::api::router::api_router;
use crate::api::types::ApiContext;
use crate::pipeline::handwriting::HandwritingPipeline;

/// Serve the API on `addr` until Ctrl-C.
pub async fn serve(addr: SocketAddr, pipeline: Arc<HandwritingPipeline>) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    serve_with_shutdown(listener, pipeline, ctrl_c()).await
}

/// Serve on an already-bound listener until `shutdown` resolves.
pub async fn serve_with_shutdown<F>(
    listener: TcpListener,
    pipeline: Arc<HandwritingPipeline>,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    let app = api_router(ApiContext::new(pipeline));

    tracing::info!(%addr, "API server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("API server stopped");
    Ok(())
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {e}");
        return;
    }
    tracing::info!("API server received shutdown signal");
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
