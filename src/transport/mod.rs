pub mod bus;


use thiserror::Error;

/// Possible errors when creating or using a publisher
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("invalid topic name: {0:?}")]
    InvalidTopic(String),
    #[error("topic {topic} already has type {existing}, requested {requested}")]
    TypeMismatch {
        topic: String,
        existing: String,
        requested: String,
    },
}

/// An [OutboundChannel] publishes single values on a fixed topic. Sends are
/// fire-and-forget and must never block the caller.
pub trait OutboundChannel: Send {
    /// Name of the topic values are published on
    fn topic(&self) -> &str;

    /// Publish the given value
    fn send(&self, value: f32) -> Result<(), TransportError>;
}

/// A [Transport] hands out publishers for named topics
pub trait Transport: Send + Sync {
    /// Create a publisher for the given topic that carries values of the
    /// given type (E.g. "std_msgs/Float32").
    fn new_publisher(
        &self,
        topic: &str,
        type_name: &str,
    ) -> Result<Box<dyn OutboundChannel>, TransportError>;
}
