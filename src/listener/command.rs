use crate::sensor::SensorSample;

/// A [ListenerCommand] is a message that can be sent to a
/// [ListenerContext](super::ListenerContext) over its mailbox.
#[derive(Debug, Clone)]
pub enum ListenerCommand {
    Sample(SensorSample),
    Stop,
}
