// src/utils/utils.rs

use tracing::{error, info};

use crate::error::Result;
use axum::{http::StatusCode, routing::get, serve, Router};
use prometheus::{gather, Encoder, TextEncoder};
use tokio::net::TcpListener;

/// Text exposition of everything in the default registry.
fn render_metrics() -> std::result::Result<String, String> {
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&gather(), &mut buffer)
        .map_err(|e| format!("encoding failed: {}", e))?;
    String::from_utf8(buffer).map_err(|e| format!("exposition is not UTF-8: {}", e))
}

pub fn metrics_router() -> Router {
    Router::new().route(
        "/metrics",
        get(|| async {
            match render_metrics() {
                Ok(body) => (StatusCode::OK, body),
                Err(reason) => {
                    error!(reason = %reason, "Could not render metrics");
                    (StatusCode::INTERNAL_SERVER_ERROR, reason)
                }
            }
        }),
    )
}

/// Serves `/metrics` on `0.0.0.0:<port>` in a background task. The bind
/// happens before returning so a taken port is reported to the caller.
pub async fn setup_prometheus_metrics(metrics_port: Option<u16>) -> Result<()> {
    let Some(port) = metrics_port else {
        info!("Prometheus metrics endpoint not configured (no port specified).");
        return Ok(());
    };

    let listener_addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&listener_addr).await?;
    info!(
        "Metrics endpoint will be available at http://{}/metrics",
        listener_addr
    );

    tokio::spawn(async move {
        if let Err(e) = serve(listener, metrics_router()).await {
            error!("Metrics server error: {}", e);
        }
    });
    Ok(())
}
