use serde::{Deserialize, Serialize};

pub const PRODUCER_NAME: &str = "Producer";
pub const GREETING: &str = "Hello World!";

/// Payload exchanged between the demo producer and consumers.
///
/// Serializes as `{"Name":"Producer","Message":"..."}`. Field order is part of
/// the wire format, consumers print the raw JSON they receive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemoMessage {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Message")]
    pub message: String,
}

impl DemoMessage {
    /// The un-numbered greeting sent by the one-shot producer.
    pub fn greeting() -> Self {
        DemoMessage {
            name: PRODUCER_NAME.to_string(),
            message: GREETING.to_string(),
        }
    }

    /// `#<sequence> Hello World!`
    pub fn numbered(sequence: u64) -> Self {
        DemoMessage {
            name: PRODUCER_NAME.to_string(),
            message: format!("#{} {}", sequence, GREETING),
        }
    }

    pub fn to_payload(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}
