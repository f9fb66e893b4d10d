use std::time::Duration;

use tokio::{
    sync::broadcast::{error::RecvError, Receiver},
    time::timeout,
};

use super::{ReceiveTimeoutError, TimeoutReceiver};

impl<T> TimeoutReceiver<T> for Receiver<T>
where
    T: Clone + Send + Sync,
{
    async fn recv_timeout(&mut self, duration: Duration) -> Result<T, ReceiveTimeoutError> {
        let result = timeout(duration, self.recv()).await;
        match result {
            Ok(value) => match value {
                Ok(v) => Ok(v),
                Err(RecvError::Lagged(skipped)) => Err(ReceiveTimeoutError::Lagged(skipped)),
                Err(RecvError::Closed) => Err(ReceiveTimeoutError::Closed),
            },
            Err(_) => Err(ReceiveTimeoutError::Timeout),
        }
    }
}
