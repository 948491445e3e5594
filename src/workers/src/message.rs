//! Messages delivered to listeners

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Header naming the domain event carried by a message
pub const EVENT_HEADER: &str = "event";

/// Message as delivered by the subscription transport
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub topic: String,

    /// Partition key, when the transport has one
    #[serde(default)]
    pub key: Option<String>,

    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Raw payload
    #[serde(default)]
    pub value: Vec<u8>,
}

impl Message {
    pub fn new(topic: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            value: value.into(),
            ..Default::default()
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_event(self, event: impl Into<String>) -> Self {
        self.with_header(EVENT_HEADER, event)
    }

    /// Value of the `event` header
    pub fn event(&self) -> Option<&str> {
        self.headers.get(EVENT_HEADER).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_header() {
        let message = Message::new("hubs", br#"{"id":1}"#.to_vec())
            .with_key("t1")
            .with_event("hubs.update.event");

        assert_eq!(message.event(), Some("hubs.update.event"));
        assert_eq!(message.key.as_deref(), Some("t1"));
        assert_eq!(Message::new("hubs", Vec::new()).event(), None);
    }
}
