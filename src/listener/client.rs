use thiserror::Error;
use tokio::sync::mpsc::{error::TrySendError, Sender};

use crate::sensor::SensorSample;

use super::command::ListenerCommand;

/// Possible errors for a listener client
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("listener mailbox is full")]
    MailboxFull,
    #[error("listener no longer exists")]
    ChannelClosed,
}

impl From<TrySendError<ListenerCommand>> for ClientError {
    fn from(err: TrySendError<ListenerCommand>) -> Self {
        match err {
            TrySendError::Full(_) => Self::MailboxFull,
            TrySendError::Closed(_) => Self::ChannelClosed,
        }
    }
}

/// A client for delivering sensor samples to a listener context. Sensor
/// managers hold on to a client for every registered listener.
#[derive(Debug, Clone)]
pub struct ListenerClient {
    tx: Sender<ListenerCommand>,
}

impl ListenerClient {
    pub fn new(tx: Sender<ListenerCommand>) -> Self {
        Self { tx }
    }

    /// Deliver the given sample to the listener. This never blocks; if the
    /// listener is busy the sample is rejected.
    pub fn deliver(&self, sample: SensorSample) -> Result<(), ClientError> {
        self.tx.try_send(ListenerCommand::Sample(sample))?;
        Ok(())
    }

    /// Ask the listener to stop. This never blocks.
    pub fn stop(&self) -> Result<(), ClientError> {
        self.tx.try_send(ListenerCommand::Stop)?;
        Ok(())
    }

    /// Returns true if both clients deliver to the same listener
    pub fn is_same_listener(&self, other: &ListenerClient) -> bool {
        self.tx.same_channel(&other.tx)
    }

    /// Returns true if the listener has stopped receiving samples
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
