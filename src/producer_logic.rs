use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use lapin::{options::BasicPublishOptions, BasicProperties, Channel};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

use crate::config::TopologyConfig;
use crate::data_model::DemoMessage;
use crate::error::{DemoError, Result};
use crate::utils::prometheus_metrics::*;

/// Where a producer sends its messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub exchange: String,
    pub routing_key: String,
}

impl Destination {
    /// Named exchange + routing key when the topology routes through an
    /// exchange, otherwise the default exchange with the queue name as key.
    pub fn for_topology(topology: &TopologyConfig) -> Self {
        match &topology.exchange {
            Some(exchange) => Destination {
                exchange: exchange.name.clone(),
                routing_key: exchange.routing_key.clone(),
            },
            None => Destination {
                exchange: String::new(),
                routing_key: topology.queue.clone(),
            },
        }
    }
}

#[async_trait]
pub trait MessagePublisher: Send + Sync {
    async fn publish(&self, destination: &Destination, payload: &[u8]) -> Result<()>;
}

#[async_trait]
impl MessagePublisher for Channel {
    async fn publish(&self, destination: &Destination, payload: &[u8]) -> Result<()> {
        // Fire-and-forget: the publisher confirm is dropped without waiting.
        let _confirm = self
            .basic_publish(
                &destination.exchange,
                &destination.routing_key,
                BasicPublishOptions::default(),
                payload,
                BasicProperties::default(),
            )
            .await?;
        Ok(())
    }
}

/// Sequence numbers for one producer instance: 0, 1, 2, ...
#[derive(Debug, Default)]
pub struct MessageSequence {
    next: u64,
}

impl MessageSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_sequence(&mut self) -> u64 {
        let current = self.next;
        self.next += 1;
        current
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducerSettings {
    pub interval: Duration,
    /// `None` runs until shutdown.
    pub max_messages: Option<u64>,
    /// Numbered `#n Hello World!` messages, or the plain greeting.
    pub numbered: bool,
}

impl Default for ProducerSettings {
    fn default() -> Self {
        ProducerSettings {
            interval: Duration::from_secs(1),
            max_messages: None,
            numbered: true,
        }
    }
}

impl ProducerSettings {
    pub fn one_shot() -> Self {
        ProducerSettings {
            max_messages: Some(1),
            numbered: false,
            ..Default::default()
        }
    }
}

/// Serializes `message` and hands it to `publisher`.
pub async fn publish_message<P>(
    publisher: &P,
    destination: &Destination,
    message: &DemoMessage,
) -> Result<()>
where
    P: MessagePublisher + ?Sized,
{
    let payload = message.to_payload().map_err(|e| {
        MESSAGE_PUBLISH_ERRORS_TOTAL.inc();
        DemoError::from(e)
    })?;

    let timer = MESSAGE_PUBLISHING_DURATION_SECONDS.start_timer();
    let outcome = publisher.publish(destination, &payload).await;
    timer.observe_duration();

    match outcome {
        Ok(()) => {
            MESSAGES_PUBLISHED_TOTAL.inc();
            info!(
                exchange = %destination.exchange,
                routing_key = %destination.routing_key,
                message = %message.message,
                "Published message"
            );
            Ok(())
        }
        Err(e) => {
            MESSAGE_PUBLISH_ERRORS_TOTAL.inc();
            error!(
                exchange = %destination.exchange,
                routing_key = %destination.routing_key,
                error = %e,
                "FATAL: Failed to publish message. Stopping."
            );
            Err(e)
        }
    }
}

/// Publishes one message per tick until `shutdown` resolves or
/// `settings.max_messages` have been sent. The first tick fires immediately.
///
/// Returns the number of messages published. A failed publish ends the loop
/// with the error.
pub async fn run_producer<P, F>(
    publisher: &P,
    destination: &Destination,
    settings: &ProducerSettings,
    shutdown: F,
) -> Result<u64>
where
    P: MessagePublisher + ?Sized,
    F: Future<Output = ()>,
{
    if settings.interval.is_zero() {
        return Err(DemoError::ConfigValidationError(
            "Producer interval must be greater than 0".to_string(),
        ));
    }

    tokio::pin!(shutdown);
    let mut ticker = interval(settings.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut sequence = MessageSequence::new();
    let mut published = 0u64;

    loop {
        if settings.max_messages.is_some_and(|max| published >= max) {
            info!(published, "Reached message limit, producer stopping.");
            break;
        }

        tokio::select! {
            biased;
            _ = &mut shutdown => {
                info!(published, "Shutdown requested, producer stopping.");
                break;
            }
            _ = ticker.tick() => {}
        }

        let message = if settings.numbered {
            DemoMessage::numbered(sequence.next_sequence())
        } else {
            DemoMessage::greeting()
        };
        publish_message(publisher, destination, &message).await?;
        published += 1;
    }

    Ok(published)
}
