pub mod client;
pub mod command;


use std::{
    io,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use thiserror::Error;
use tokio::sync::mpsc;

use crate::{
    fusion::pipeline::BearingPipeline,
    sensor::{Sensor, SensorError, SensorKind, SensorManager},
};

use self::{client::ListenerClient, command::ListenerCommand};

/// Size of the [ListenerCommand] mailbox
const BUFFER_SIZE: usize = 1024;
/// Name of the thread that sensor samples are processed on
const THREAD_NAME: &str = "orientation-listener";

/// Possible errors for a listener context
#[derive(Error, Debug)]
pub enum ListenerError {
    #[error("failed to spawn listener thread: {0}")]
    Spawn(#[from] io::Error),
    #[error("failed to register sensor listener: {0}")]
    Sensor(#[from] SensorError),
    #[error("listener thread panicked")]
    Panicked,
}

/// A [ListenerContext] owns a dedicated thread that receives sensor samples
/// and runs them through a [BearingPipeline] one at a time. All filter and
/// calibration state lives on that thread.
pub struct ListenerContext {
    sensor_manager: Arc<dyn SensorManager>,
    client: ListenerClient,
    /// Sensors the listener is currently registered with
    registrations: Vec<Sensor>,
    /// Cleared when the listener should stop processing samples
    running: Arc<AtomicBool>,
    /// Set as the very last step of the listener thread
    exited: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl ListenerContext {
    /// Spawn the listener thread and register it with the accelerometer and
    /// magnetometer of the given sensor manager. If any step fails, everything
    /// started so far is torn down again before the error is returned.
    pub fn start(
        sensor_manager: Arc<dyn SensorManager>,
        pipeline: BearingPipeline,
        period: Duration,
    ) -> Result<Self, ListenerError> {
        // Look up the sensors before anything is started
        let mut sensors = Vec::with_capacity(SensorKind::ALL.len());
        for kind in SensorKind::ALL {
            let Some(sensor) = sensor_manager.default_sensor(kind) else {
                return Err(SensorError::NotFound(kind).into());
            };
            log::debug!("Using {kind} sensor {} ({})", sensor.name, sensor.id);
            sensors.push(sensor);
        }

        let (tx, rx) = mpsc::channel(BUFFER_SIZE);
        let running = Arc::new(AtomicBool::new(true));
        let exited = Arc::new(AtomicBool::new(false));

        let thread = {
            let running = running.clone();
            let exited = exited.clone();
            thread::Builder::new()
                .name(THREAD_NAME.to_string())
                .spawn(move || run(rx, pipeline, running, exited))?
        };

        let mut context = Self {
            sensor_manager,
            client: ListenerClient::new(tx),
            registrations: Vec::with_capacity(sensors.len()),
            running,
            exited,
            thread: Some(thread),
        };

        for sensor in sensors {
            let result =
                context
                    .sensor_manager
                    .register_listener(context.client.clone(), &sensor, period);
            if let Err(e) = result {
                context.shutdown();
                if let Err(join_err) = context.join() {
                    log::error!("Failed to clean up listener thread: {join_err}");
                }
                return Err(e.into());
            }
            context.registrations.push(sensor);
        }

        Ok(context)
    }

    /// Returns a client that delivers samples to this listener
    #[cfg(test)]
    pub fn client(&self) -> ListenerClient {
        self.client.clone()
    }

    /// Returns true once the listener thread is no longer running, either
    /// because it ran to completion or because it panicked.
    pub fn is_finished(&self) -> bool {
        if self.exited.load(Ordering::Acquire) {
            return true;
        }
        match self.thread.as_ref() {
            Some(thread) => thread.is_finished(),
            None => true,
        }
    }

    /// Unregister from all sensors and signal the listener thread to stop.
    /// Call [ListenerContext::join] afterwards to wait for it to exit.
    pub fn shutdown(&mut self) {
        for sensor in self.registrations.drain(..) {
            self.sensor_manager
                .unregister_listener(&self.client, &sensor);
        }

        self.running.store(false, Ordering::Release);
        // A full mailbox still wakes the thread, which then sees the flag
        if let Err(e) = self.client.stop() {
            log::trace!("Unable to send stop command to listener: {e}");
        }
    }

    /// Block until the listener thread has exited. Does nothing if the thread
    /// has already been joined.
    pub fn join(&mut self) -> Result<(), ListenerError> {
        let Some(thread) = self.thread.take() else {
            return Ok(());
        };
        thread.join().map_err(|_| ListenerError::Panicked)
    }
}

impl Drop for ListenerContext {
    fn drop(&mut self) {
        if self.thread.is_none() {
            return;
        }
        self.shutdown();
        if let Err(e) = self.join() {
            log::error!("Failed to join listener thread: {e}");
        }
    }
}

/// Body of the listener thread. Processes commands until told to stop or
/// until every client has been dropped.
fn run(
    mut rx: mpsc::Receiver<ListenerCommand>,
    mut pipeline: BearingPipeline,
    running: Arc<AtomicBool>,
    exited: Arc<AtomicBool>,
) {
    log::debug!("Started orientation listener for topic {}", pipeline.topic());

    while let Some(command) = rx.blocking_recv() {
        if !running.load(Ordering::Acquire) {
            break;
        }
        match command {
            ListenerCommand::Sample(sample) => match pipeline.process(sample) {
                Ok(Some(bearing)) => log::trace!("Published bearing: {bearing}"),
                Ok(None) => (),
                Err(e) => log::warn!("Failed to process {} sample: {e}", sample.kind),
            },
            ListenerCommand::Stop => break,
        }
    }

    rx.close();
    let calibrated = pipeline.state().is_calibrated();
    // Release the outbound channel before reporting the thread as finished
    drop(pipeline);
    log::debug!("Orientation listener stopped (calibrated: {calibrated})");
    exited.store(true, Ordering::Release);
}
