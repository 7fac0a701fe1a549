// tests/consumer_tests.rs

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use futures::{future, stream, StreamExt};
use RabbitDemos::consumer_logic::{consume_payloads, MessageHandler};
use RabbitDemos::data_model::DemoMessage;
use RabbitDemos::error::{DemoError, Result};

#[derive(Default)]
struct CollectingHandler {
    seen: Mutex<Vec<String>>,
}

impl CollectingHandler {
    fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageHandler for CollectingHandler {
    async fn handle(&self, text: &str) -> Result<()> {
        self.seen.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Fails on messages containing "boom", records everything else.
#[derive(Default)]
struct PickyHandler {
    inner: CollectingHandler,
}

#[async_trait]
impl MessageHandler for PickyHandler {
    async fn handle(&self, text: &str) -> Result<()> {
        if text.contains("boom") {
            return Err(DemoError::HandlerError("refused".to_string()));
        }
        self.inner.handle(text).await
    }
}

fn payload(sequence: u64) -> Vec<u8> {
    DemoMessage::numbered(sequence).to_payload().unwrap()
}

#[tokio::test]
async fn test_messages_are_handled_in_order() {
    let handler = CollectingHandler::default();
    let source = stream::iter(vec![Ok(payload(0)), Ok(payload(1)), Ok(payload(2))]);

    let received = consume_payloads(source, &handler, future::pending())
        .await
        .unwrap();

    assert_eq!(received, 3);
    assert_eq!(
        handler.seen(),
        vec![
            r##"{"Name":"Producer","Message":"#0 Hello World!"}"##,
            r##"{"Name":"Producer","Message":"#1 Hello World!"}"##,
            r##"{"Name":"Producer","Message":"#2 Hello World!"}"##,
        ]
    );
}

#[tokio::test]
async fn test_round_trip_text_is_identical() {
    let handler = CollectingHandler::default();
    let message = DemoMessage::numbered(17);
    let serialized = String::from_utf8(message.to_payload().unwrap()).unwrap();

    consume_payloads(
        stream::iter(vec![Ok(message.to_payload().unwrap())]),
        &handler,
        future::pending(),
    )
    .await
    .unwrap();

    assert_eq!(handler.seen(), vec![serialized.clone()]);
    let decoded: DemoMessage = serde_json::from_str(&handler.seen()[0]).unwrap();
    assert_eq!(decoded, message);
}

#[tokio::test]
async fn test_handler_failure_drops_message_and_continues() {
    let handler = PickyHandler::default();
    let source = stream::iter(vec![
        Ok(payload(0)),
        Ok(b"boom".to_vec()),
        Ok(payload(1)),
    ]);

    let received = consume_payloads(source, &handler, future::pending())
        .await
        .unwrap();

    assert_eq!(received, 3);
    assert_eq!(handler.inner.seen().len(), 2);
}

#[tokio::test]
async fn test_stream_error_stops_consumer() {
    let handler = CollectingHandler::default();
    let source = stream::iter(vec![
        Ok(payload(0)),
        Err(DemoError::QueueError("connection reset".to_string())),
        Ok(payload(1)),
    ]);

    let result = consume_payloads(source, &handler, future::pending()).await;

    match result {
        Err(DemoError::QueueError(msg)) => assert_eq!(msg, "connection reset"),
        other => panic!("Expected QueueError, got {:?}", other),
    }
    assert_eq!(handler.seen().len(), 1);
}

#[tokio::test]
async fn test_shutdown_before_any_delivery() {
    let handler = CollectingHandler::default();
    let source = stream::iter(vec![Ok(payload(0))]);

    let received = consume_payloads(source, &handler, future::ready(()))
        .await
        .unwrap();

    assert_eq!(received, 0);
    assert!(handler.seen().is_empty());
}

#[tokio::test]
async fn test_shutdown_while_idle() {
    let handler = CollectingHandler::default();
    let source = stream::iter(vec![Ok(payload(0)), Ok(payload(1))]).chain(stream::pending());

    let received = tokio::time::timeout(
        Duration::from_secs(5),
        consume_payloads(
            source,
            &handler,
            tokio::time::sleep(Duration::from_millis(50)),
        ),
    )
    .await
    .expect("consumer should stop on shutdown")
    .unwrap();

    assert_eq!(received, 2);
    assert_eq!(handler.seen().len(), 2);
}

#[tokio::test]
async fn test_invalid_utf8_is_replaced_not_rejected() {
    let handler = CollectingHandler::default();
    let source = stream::iter(vec![Ok(vec![b'h', b'i', 0xfe])]);

    consume_payloads(source, &handler, future::pending())
        .await
        .unwrap();

    assert_eq!(handler.seen(), vec!["hi\u{FFFD}".to_string()]);
}
