// src/consumer_logic.rs

use std::borrow::Cow;
use std::future::Future;

use async_trait::async_trait;
use futures::{pin_mut, Stream, StreamExt};
use lapin::{
    options::{BasicConsumeOptions, BasicQosOptions},
    types::FieldTable,
    Channel, Consumer,
};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, warn};

use crate::error::{DemoError, Result};
use crate::utils::common::consumer_tag;
use crate::utils::prometheus_metrics::*;

/// Application side of a delivery. Deliveries are auto-acknowledged, so a
/// handler error means the message is gone.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, text: &str) -> Result<()>;
}

/// Writes every message on its own line to stdout.
pub struct StdoutPrinter;

#[async_trait]
impl MessageHandler for StdoutPrinter {
    async fn handle(&self, text: &str) -> Result<()> {
        let mut stdout = tokio::io::stdout();
        // One write per line so concurrent consumers in one process don't interleave.
        stdout.write_all(format!("{}\n", text).as_bytes()).await?;
        stdout.flush().await?;
        Ok(())
    }
}

/// Sets the prefetch limit (if any) and starts an auto-ack consumer on `queue`.
pub async fn start_consumer(
    channel: &Channel,
    queue: &str,
    prefetch_count: Option<u16>,
) -> Result<Consumer> {
    if let Some(prefetch) = prefetch_count {
        channel
            .basic_qos(prefetch, BasicQosOptions::default())
            .await
            .map_err(|e| DemoError::QueueError(format!("Failed to set QoS: {}", e)))?;
        info!(prefetch, "Prefetch limit set");
    }

    let tag = consumer_tag("consumer");
    let consumer = channel
        .basic_consume(
            queue,
            &tag,
            BasicConsumeOptions {
                no_ack: true,
                ..Default::default()
            },
            FieldTable::default(),
        )
        .await
        .map_err(|e| DemoError::QueueError(format!("Failed to start consuming: {}", e)))?;

    info!(consumer_tag = %tag, queue = %queue, "Consumer started");
    Ok(consumer)
}

/// Strips the AMQP envelope, leaving the payload bytes of each delivery.
pub fn payload_stream(consumer: Consumer) -> impl Stream<Item = Result<Vec<u8>>> {
    consumer.map(|delivery_result| {
        delivery_result
            .map(|delivery| delivery.data)
            .map_err(DemoError::from)
    })
}

/// UTF-8 decode; invalid sequences are replaced rather than rejected.
pub fn decode_payload(payload: &[u8]) -> String {
    match String::from_utf8_lossy(payload) {
        Cow::Borrowed(text) => text.to_string(),
        Cow::Owned(text) => {
            warn!(len = payload.len(), "Payload was not valid UTF-8, replaced invalid bytes");
            text
        }
    }
}

/// Receive loop: decodes each payload in arrival order and passes it to
/// `handler`.
///
/// Stops when the stream ends or `shutdown` resolves, returning the number of
/// messages received. A stream error stops the loop with that error.
pub async fn consume_payloads<S, H, F>(stream: S, handler: &H, shutdown: F) -> Result<u64>
where
    S: Stream<Item = Result<Vec<u8>>>,
    H: MessageHandler + ?Sized,
    F: Future<Output = ()>,
{
    pin_mut!(stream);
    pin_mut!(shutdown);
    let mut received = 0u64;

    loop {
        let next = tokio::select! {
            biased;
            _ = &mut shutdown => {
                info!(received, "Shutdown requested, consumer stopping.");
                break;
            }
            next = stream.next() => next,
        };

        match next {
            Some(Ok(payload)) => {
                received += 1;
                MESSAGES_CONSUMED_TOTAL.inc();
                let text = decode_payload(&payload);
                debug!(received, "Delivery received");
                if let Err(e) = handler.handle(&text).await {
                    MESSAGE_HANDLER_ERRORS_TOTAL.inc();
                    error!(error = %e, payload = %text, "Handler failed, message dropped");
                }
            }
            Some(Err(e)) => {
                error!(error = %e, "Error receiving message from consumer stream. Consumer will stop.");
                return Err(e);
            }
            None => {
                info!(received, "Consumer stream ended.");
                break;
            }
        }
    }

    Ok(received)
}
