// tests/producer_tests.rs

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use futures::future;
use RabbitDemos::config::{Example, TopologyConfig};
use RabbitDemos::data_model::DemoMessage;
use RabbitDemos::error::{DemoError, Result};
use RabbitDemos::producer_logic::{
    publish_message, run_producer, Destination, MessagePublisher, ProducerSettings,
};

#[derive(Default)]
struct RecordingPublisher {
    sent: Mutex<Vec<(Destination, Vec<u8>)>>,
}

impl RecordingPublisher {
    fn messages(&self) -> Vec<DemoMessage> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, payload)| serde_json::from_slice(payload).unwrap())
            .collect()
    }

    fn raw(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, payload)| String::from_utf8(payload.clone()).unwrap())
            .collect()
    }
}

#[async_trait]
impl MessagePublisher for RecordingPublisher {
    async fn publish(&self, destination: &Destination, payload: &[u8]) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((destination.clone(), payload.to_vec()));
        Ok(())
    }
}

struct BrokenPublisher;

#[async_trait]
impl MessagePublisher for BrokenPublisher {
    async fn publish(&self, _destination: &Destination, _payload: &[u8]) -> Result<()> {
        Err(DemoError::QueueError("channel closed".to_string()))
    }
}

fn fast_settings(max_messages: Option<u64>) -> ProducerSettings {
    ProducerSettings {
        interval: Duration::from_millis(5),
        max_messages,
        numbered: true,
    }
}

fn queue_destination() -> Destination {
    Destination::for_topology(&TopologyConfig::for_example(Example::Single))
}

#[tokio::test]
async fn test_sequence_numbers_increase_by_one_from_zero() {
    let publisher = RecordingPublisher::default();
    let published = run_producer(
        &publisher,
        &queue_destination(),
        &fast_settings(Some(5)),
        future::pending(),
    )
    .await
    .unwrap();

    assert_eq!(published, 5);
    let expected: Vec<DemoMessage> = (0..5).map(DemoMessage::numbered).collect();
    assert_eq!(publisher.messages(), expected);
}

#[tokio::test]
async fn test_first_message_wire_format() {
    let publisher = RecordingPublisher::default();
    run_producer(
        &publisher,
        &queue_destination(),
        &fast_settings(Some(1)),
        future::pending(),
    )
    .await
    .unwrap();

    assert_eq!(
        publisher.raw(),
        vec![r##"{"Name":"Producer","Message":"#0 Hello World!"}"##.to_string()]
    );
}

#[tokio::test]
async fn test_every_message_goes_to_the_same_destination() {
    let publisher = RecordingPublisher::default();
    let destination =
        Destination::for_topology(&TopologyConfig::for_example(Example::DirectTtl));
    run_producer(&publisher, &destination, &fast_settings(Some(3)), future::pending())
        .await
        .unwrap();

    let sent = publisher.sent.lock().unwrap();
    assert_eq!(sent.len(), 3);
    for (dest, _) in sent.iter() {
        assert_eq!(dest.exchange, "demo-direct-exchange");
        assert_eq!(dest.routing_key, "account.init");
    }
}

#[tokio::test]
async fn test_one_shot_publishes_plain_greeting() {
    let publisher = RecordingPublisher::default();
    let published = run_producer(
        &publisher,
        &queue_destination(),
        &ProducerSettings::one_shot(),
        future::pending(),
    )
    .await
    .unwrap();

    assert_eq!(published, 1);
    assert_eq!(publisher.messages(), vec![DemoMessage::greeting()]);
}

#[tokio::test]
async fn test_resolved_shutdown_publishes_nothing() {
    let publisher = RecordingPublisher::default();
    let published = run_producer(
        &publisher,
        &queue_destination(),
        &fast_settings(None),
        future::ready(()),
    )
    .await
    .unwrap();

    assert_eq!(published, 0);
    assert!(publisher.messages().is_empty());
}

#[tokio::test]
async fn test_shutdown_interrupts_the_wait_between_ticks() {
    let publisher = RecordingPublisher::default();
    let settings = ProducerSettings {
        interval: Duration::from_secs(3600),
        max_messages: None,
        numbered: true,
    };
    let published = tokio::time::timeout(
        Duration::from_secs(5),
        run_producer(
            &publisher,
            &queue_destination(),
            &settings,
            tokio::time::sleep(Duration::from_millis(50)),
        ),
    )
    .await
    .expect("producer should stop on shutdown")
    .unwrap();

    // The first tick fires immediately, the second is an hour away.
    assert_eq!(published, 1);
    assert_eq!(publisher.messages(), vec![DemoMessage::numbered(0)]);
}

#[tokio::test]
async fn test_publish_failure_is_fatal() {
    let result = run_producer(
        &BrokenPublisher,
        &queue_destination(),
        &fast_settings(Some(3)),
        future::pending(),
    )
    .await;

    match result {
        Err(DemoError::QueueError(msg)) => assert_eq!(msg, "channel closed"),
        other => panic!("Expected QueueError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_zero_interval_is_rejected() {
    let settings = ProducerSettings {
        interval: Duration::ZERO,
        max_messages: Some(1),
        numbered: true,
    };
    let publisher = RecordingPublisher::default();
    let result = run_producer(&publisher, &queue_destination(), &settings, future::pending()).await;
    assert!(matches!(result, Err(DemoError::ConfigValidationError(_))));
    assert!(publisher.messages().is_empty());
}

#[tokio::test]
async fn test_publish_message_passes_destination_through() {
    let publisher = RecordingPublisher::default();
    let destination = Destination {
        exchange: "ex".to_string(),
        routing_key: "rk".to_string(),
    };
    publish_message(&publisher, &destination, &DemoMessage::numbered(9))
        .await
        .unwrap();

    let sent = publisher.sent.lock().unwrap();
    assert_eq!(sent[0].0, destination);
    assert_eq!(
        sent[0].1,
        br##"{"Name":"Producer","Message":"#9 Hello World!"}"##.to_vec()
    );
}
