#[cfg(test)]
pub mod publisher_test;

use std::{sync::Arc, time::Duration};

use thiserror::Error;

use crate::{
    constants::{NODE_NAME, TOPIC_NAME, TOPIC_TYPE},
    fusion::pipeline::BearingPipeline,
    listener::{ListenerContext, ListenerError},
    sensor::SensorManager,
    transport::{Transport, TransportError},
};

/// Possible errors when starting an [OrientationPublisher]
#[derive(Error, Debug)]
pub enum PublisherError {
    #[error("publisher is already running")]
    AlreadyRunning,
    #[error("failed to create outbound channel: {0}")]
    Transport(#[from] TransportError),
    #[error("failed to start orientation listener: {0}")]
    Listener(#[from] ListenerError),
}

/// Publishes the bearing of the device on the orientation topic.
///
/// The host calls [OrientationPublisher::on_start] when publishing should
/// begin and [OrientationPublisher::on_shutdown] when it should stop. Sensor
/// samples are processed on a dedicated listener thread that only exists
/// between those two calls.
pub struct OrientationPublisher {
    sensor_manager: Arc<dyn SensorManager>,
    /// Requested sensor delivery period
    sensor_delay: Duration,
    listener: Option<ListenerContext>,
}

impl OrientationPublisher {
    pub fn new(sensor_manager: Arc<dyn SensorManager>, sensor_delay: Duration) -> Self {
        Self {
            sensor_manager,
            sensor_delay,
            listener: None,
        }
    }

    /// Name of the node when none is configured by the host
    pub fn default_node_name() -> &'static str {
        NODE_NAME
    }

    /// Returns true while the listener thread is running. A listener thread
    /// that died on its own still has to be cleaned up with
    /// [OrientationPublisher::on_shutdown] before the publisher can start again.
    pub fn is_running(&self) -> bool {
        self.listener.as_ref().is_some_and(|l| !l.is_finished())
    }

    /// Create the bearing publisher on the given transport and start listening
    /// for sensor samples. On failure nothing is left running.
    pub fn on_start(&mut self, transport: &dyn Transport) -> Result<(), PublisherError> {
        if self.listener.is_some() {
            log::error!("Orientation publisher was started twice");
            return Err(PublisherError::AlreadyRunning);
        }

        if let Err(e) = self.start(transport) {
            log::error!("Failed to start orientation publisher: {e}");
            return Err(e);
        }

        log::info!("Publishing bearing on topic {TOPIC_NAME}");
        Ok(())
    }

    fn start(&mut self, transport: &dyn Transport) -> Result<(), PublisherError> {
        let channel = transport.new_publisher(TOPIC_NAME, TOPIC_TYPE)?;
        let pipeline = BearingPipeline::new(channel);
        let listener =
            ListenerContext::start(self.sensor_manager.clone(), pipeline, self.sensor_delay)?;
        self.listener = Some(listener);
        Ok(())
    }

    /// Stop listening for sensor samples. Blocks until the listener thread has
    /// exited, so no bearing is published after this returns. Does nothing if
    /// the publisher is not running.
    pub fn on_shutdown(&mut self) {
        let Some(mut listener) = self.listener.take() else {
            log::debug!("Orientation publisher is not running");
            return;
        };

        log::debug!("Stopping orientation listener");
        listener.shutdown();
        if let Err(e) = listener.join() {
            log::error!("Error waiting for orientation listener to stop: {e}");
        }
        log::info!("Orientation publisher stopped");
    }
}

impl Drop for OrientationPublisher {
    fn drop(&mut self) {
        self.on_shutdown();
    }
}
