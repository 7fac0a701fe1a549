// src/topology.rs

use lapin::{
    options::{ExchangeDeclareOptions, QueueBindOptions, QueueDeclareOptions},
    types::{AMQPValue, FieldTable, LongInt, ShortString},
    Channel,
};
use tracing::{debug, error, info};

use crate::config::{ExchangeConfig, TopologyConfig};
use crate::error::{DemoError, Result};

pub const AMQP_HEADERS_MESSAGE_TTL: &str = "x-message-ttl";

/// What the broker reported back after declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredTopology {
    pub queue: String,
    pub exchange: Option<String>,
    pub message_count: u32,
    pub consumer_count: u32,
}

fn ttl_table(message_ttl_ms: Option<u32>) -> FieldTable {
    let mut args = FieldTable::default();
    if let Some(ttl) = message_ttl_ms {
        args.insert(
            ShortString::from(AMQP_HEADERS_MESSAGE_TTL),
            AMQPValue::LongInt(ttl as LongInt),
        );
    }
    args
}

pub fn exchange_arguments(exchange: &ExchangeConfig) -> FieldTable {
    ttl_table(exchange.message_ttl_ms)
}

/// The broker only enforces `x-message-ttl` on queues, so an exchange TTL is
/// repeated here.
pub fn queue_arguments(topology: &TopologyConfig) -> FieldTable {
    ttl_table(topology.message_ttl_ms())
}

pub fn queue_options() -> QueueDeclareOptions {
    QueueDeclareOptions {
        durable: true,
        exclusive: false,
        auto_delete: false,
        ..Default::default()
    }
}

/// Exchanges are transient; only the queue survives a broker restart.
pub fn exchange_options() -> ExchangeDeclareOptions {
    ExchangeDeclareOptions {
        durable: false,
        auto_delete: false,
        ..Default::default()
    }
}

/// Declares exchange, queue and binding for `topology`, in that order.
///
/// Safe to call from every producer and consumer: the broker treats an
/// identical re-declaration as a no-op and rejects a mismatched one.
pub async fn declare_topology(
    channel: &Channel,
    topology: &TopologyConfig,
) -> Result<DeclaredTopology> {
    if let Some(exchange) = &topology.exchange {
        declare_exchange(channel, exchange).await?;
    }

    debug!("creating queue: {}", topology.queue);
    let queue = channel
        .queue_declare(&topology.queue, queue_options(), queue_arguments(topology))
        .await
        .map_err(|e| {
            error!(error = %e, queue = %topology.queue, "error to declare the queue");
            DemoError::DeclareError {
                entity: "queue",
                name: topology.queue.clone(),
                reason: e.to_string(),
            }
        })?;
    info!(
        queue = %topology.queue,
        messages = queue.message_count(),
        consumers = queue.consumer_count(),
        "Declared durable queue"
    );

    if let Some(exchange) = &topology.exchange {
        bind_queue(channel, &topology.queue, exchange).await?;
    }

    Ok(DeclaredTopology {
        queue: queue.name().as_str().to_string(),
        exchange: topology.exchange.as_ref().map(|e| e.name.clone()),
        message_count: queue.message_count(),
        consumer_count: queue.consumer_count(),
    })
}

async fn declare_exchange(channel: &Channel, exchange: &ExchangeConfig) -> Result<()> {
    debug!("creating exchange: {}", exchange.name);
    channel
        .exchange_declare(
            &exchange.name,
            exchange.kind.into(),
            exchange_options(),
            exchange_arguments(exchange),
        )
        .await
        .map_err(|e| {
            error!(error = %e, name = %exchange.name, "error to declare the exchange");
            DemoError::DeclareError {
                entity: "exchange",
                name: exchange.name.clone(),
                reason: e.to_string(),
            }
        })?;
    info!(exchange = %exchange.name, kind = ?exchange.kind, "Declared exchange");
    Ok(())
}

async fn bind_queue(channel: &Channel, queue: &str, exchange: &ExchangeConfig) -> Result<()> {
    channel
        .queue_bind(
            queue,
            &exchange.name,
            &exchange.routing_key,
            QueueBindOptions::default(),
            FieldTable::default(),
        )
        .await
        .map_err(|e| {
            error!(error = %e, queue = %queue, exchange = %exchange.name, "error to bind queue to exchange");
            DemoError::DeclareError {
                entity: "binding",
                name: format!("{} -> {} ({})", exchange.name, queue, exchange.routing_key),
                reason: e.to_string(),
            }
        })?;
    info!(
        queue = %queue,
        exchange = %exchange.name,
        routing_key = %exchange.routing_key,
        "Bound queue to exchange"
    );
    Ok(())
}
