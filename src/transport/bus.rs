//! In-process publish/subscribe bus. Every topic is backed by a broadcast
//! channel, so publishing never waits on slow subscribers; they lag instead.
use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
};

use tokio::sync::broadcast;

use super::{OutboundChannel, Transport, TransportError};

/// Number of values buffered for each subscriber of a topic
const BUFFER_SIZE: usize = 256;

#[derive(Debug)]
struct Topic {
    /// Declared type, set by the first publisher of the topic
    type_name: Option<String>,
    tx: broadcast::Sender<f32>,
}

impl Topic {
    fn new() -> Self {
        let (tx, _) = broadcast::channel(BUFFER_SIZE);
        Self {
            type_name: None,
            tx,
        }
    }
}

/// Message bus that routes published values to subscribers in the same
/// process.
#[derive(Debug, Default)]
pub struct MessageBus {
    topics: Mutex<HashMap<String, Topic>>,
}

impl MessageBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to values published on the given topic. The topic does not
    /// need to have a publisher yet.
    pub fn subscribe(&self, topic: &str) -> broadcast::Receiver<f32> {
        let mut topics = self.topics.lock().unwrap_or_else(PoisonError::into_inner);
        topics
            .entry(topic.to_string())
            .or_insert_with(Topic::new)
            .tx
            .subscribe()
    }

    /// Returns the declared type of the given topic
    pub fn topic_type(&self, topic: &str) -> Option<String> {
        let topics = self.topics.lock().unwrap_or_else(PoisonError::into_inner);
        topics.get(topic).and_then(|t| t.type_name.clone())
    }
}

impl Transport for MessageBus {
    fn new_publisher(
        &self,
        topic: &str,
        type_name: &str,
    ) -> Result<Box<dyn OutboundChannel>, TransportError> {
        if topic.trim().is_empty() {
            return Err(TransportError::InvalidTopic(topic.to_string()));
        }

        let mut topics = self.topics.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = topics.entry(topic.to_string()).or_insert_with(Topic::new);
        match entry.type_name.as_ref() {
            Some(existing) if existing != type_name => {
                return Err(TransportError::TypeMismatch {
                    topic: topic.to_string(),
                    existing: existing.clone(),
                    requested: type_name.to_string(),
                });
            }
            Some(_) => (),
            None => entry.type_name = Some(type_name.to_string()),
        }

        log::debug!("Created publisher for topic {topic} [{type_name}]");
        Ok(Box::new(BusPublisher {
            topic: topic.to_string(),
            tx: entry.tx.clone(),
        }))
    }
}

/// Publisher for a single topic on a [MessageBus]
#[derive(Debug)]
pub struct BusPublisher {
    topic: String,
    tx: broadcast::Sender<f32>,
}

impl OutboundChannel for BusPublisher {
    fn topic(&self) -> &str {
        self.topic.as_str()
    }

    fn send(&self, value: f32) -> Result<(), TransportError> {
        // Nobody listening is not an error
        if self.tx.send(value).is_err() {
            log::trace!("No subscribers for topic {}", self.topic);
        }
        Ok(())
    }
}
