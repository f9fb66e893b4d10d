//! [SensorManager] backed by the Linux Industrial I/O subsystem. Every
//! registered listener gets its own polling thread that reads the sensor at
//! the requested period.
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc, Arc, Mutex, PoisonError,
    },
    thread,
    time::Duration,
};

use glob_match::glob_match;

use crate::{
    config::{self, PublisherConfig},
    drivers::iio_sensor::{driver::Driver, event::AxisData, info::MountMatrix},
    iio::device::{channel_type, list_devices},
    listener::client::{ClientError, ListenerClient},
};

use super::{Sensor, SensorError, SensorKind, SensorManager, SensorSample};

/// Maximum time to wait for a polling thread to open its device
const OPEN_TIMEOUT: Duration = Duration::from_secs(5);
/// Device names matched when no name is configured
const DEFAULT_ACCEL_NAMES: &str = "{accel_3d,*accel*,bmi*,i2c-BMI*,i2c-BOSC*}";
const DEFAULT_MAGN_NAMES: &str = "{magn_3d,*magn*,ak09*,lis3mdl*}";
/// IIO reports magnetic fields in gauss
const GAUSS_TO_MICRO_TESLA: f32 = 100.0;

#[derive(Debug)]
struct Poller {
    sensor: Sensor,
    listener: ListenerClient,
    stop: Arc<AtomicBool>,
}

/// Sensor manager that reads accelerometers and magnetometers through IIO
#[derive(Debug)]
pub struct IioSensorManager {
    config: PublisherConfig,
    pollers: Mutex<Vec<Poller>>,
}

impl IioSensorManager {
    pub fn new(config: PublisherConfig) -> Self {
        Self {
            config,
            pollers: Mutex::new(Vec::new()),
        }
    }

    /// Returns true if the listener already polls the given sensor
    fn is_registered(&self, listener: &ListenerClient, sensor: &Sensor) -> bool {
        let pollers = self.pollers.lock().unwrap_or_else(PoisonError::into_inner);
        pollers
            .iter()
            .any(|p| p.sensor == *sensor && p.listener.is_same_listener(listener))
    }

    /// Returns the IIO settings for the given sensor kind
    fn sensor_config(&self, kind: SensorKind) -> Option<&config::IIO> {
        match kind {
            SensorKind::Accelerometer => self.config.accelerometer(),
            SensorKind::Magnetometer => self.config.magnetometer(),
        }
    }
}

impl SensorManager for IioSensorManager {
    fn default_sensor(&self, kind: SensorKind) -> Option<Sensor> {
        let pattern = self
            .sensor_config(kind)
            .and_then(|c| c.name.clone())
            .unwrap_or_else(|| match kind {
                SensorKind::Accelerometer => DEFAULT_ACCEL_NAMES.to_string(),
                SensorKind::Magnetometer => DEFAULT_MAGN_NAMES.to_string(),
            });

        let devices = match list_devices() {
            Ok(devices) => devices,
            Err(e) => {
                log::warn!("Unable to list IIO devices: {e}");
                return None;
            }
        };

        for device in devices {
            let (Some(id), Some(name)) = (device.id.clone(), device.name.clone()) else {
                continue;
            };
            if !device.provides(kind) || !glob_match(pattern.as_str(), name.as_str()) {
                continue;
            }
            log::info!("Detected {kind} {name} ({id})");
            return Some(Sensor { kind, id, name });
        }

        log::debug!("No IIO device matching {pattern} provides {kind} data");
        None
    }

    fn register_listener(
        &self,
        listener: ListenerClient,
        sensor: &Sensor,
        period: Duration,
    ) -> Result<(), SensorError> {
        if self.is_registered(&listener, sensor) {
            return Err(SensorError::AlreadyRegistered(sensor.id.clone()));
        }

        let matrix = self
            .sensor_config(sensor.kind)
            .and_then(|c| c.mount_matrix.as_ref())
            .map(MountMatrix::from);
        let stop = Arc::new(AtomicBool::new(false));

        // The driver is opened on the polling thread, which reports back
        // whether that succeeded.
        let (ready_tx, ready_rx) = mpsc::channel();
        let task = {
            let sensor = sensor.clone();
            let listener = listener.clone();
            let stop = stop.clone();
            move || {
                let driver = match Driver::new(
                    sensor.id.clone(),
                    sensor.name.clone(),
                    channel_type(sensor.kind),
                    matrix,
                ) {
                    Ok(driver) => {
                        let _ = ready_tx.send(Ok(()));
                        driver
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                poll(driver, sensor.kind, listener, stop, period);
            }
        };
        thread::Builder::new()
            .name(format!("iio-{}", sensor.kind))
            .spawn(task)
            .map_err(|e| SensorError::Driver(e.into()))?;

        match ready_rx.recv_timeout(OPEN_TIMEOUT) {
            Ok(Ok(())) => (),
            Ok(Err(e)) => return Err(SensorError::Driver(e)),
            Err(_) => {
                stop.store(true, Ordering::Release);
                return Err(SensorError::Driver(
                    format!("Timed out opening {}", sensor.id).into(),
                ));
            }
        }

        // The lock is not held while the device is opened, so check again
        let mut pollers = self.pollers.lock().unwrap_or_else(PoisonError::into_inner);
        if pollers
            .iter()
            .any(|p| p.sensor == *sensor && p.listener.is_same_listener(&listener))
        {
            stop.store(true, Ordering::Release);
            return Err(SensorError::AlreadyRegistered(sensor.id.clone()));
        }

        log::debug!("Polling {} every {period:?}", sensor.id);
        pollers.push(Poller {
            sensor: sensor.clone(),
            listener,
            stop,
        });
        Ok(())
    }

    fn unregister_listener(&self, listener: &ListenerClient, sensor: &Sensor) {
        let mut pollers = self.pollers.lock().unwrap_or_else(PoisonError::into_inner);
        pollers.retain(|p| {
            let matches = p.sensor == *sensor && p.listener.is_same_listener(listener);
            if matches {
                log::debug!("Stopping polling of {}", sensor.id);
                p.stop.store(true, Ordering::Release);
            }
            !matches
        });
    }
}

impl Drop for IioSensorManager {
    fn drop(&mut self) {
        let pollers = self.pollers.lock().unwrap_or_else(PoisonError::into_inner);
        for poller in pollers.iter() {
            poller.stop.store(true, Ordering::Release);
        }
    }
}

/// Convert a processed IIO reading into a [SensorSample]. Accelerations are
/// already in m/s^2 while magnetic fields are converted to micro tesla.
pub fn to_sample(kind: SensorKind, data: &AxisData) -> SensorSample {
    let values = match kind {
        SensorKind::Accelerometer => data.values(),
        SensorKind::Magnetometer => data.values().map(|v| v * GAUSS_TO_MICRO_TESLA),
    };
    SensorSample::new(kind, values)
}

/// Read the sensor every period and deliver samples to the listener until
/// stopped or until the listener goes away.
fn poll(
    driver: Driver,
    kind: SensorKind,
    listener: ListenerClient,
    stop: Arc<AtomicBool>,
    period: Duration,
) {
    log::debug!("Started polling {kind} {}", driver.name());
    while !stop.load(Ordering::Acquire) {
        match driver.poll() {
            Ok(data) => match listener.deliver(to_sample(kind, &data)) {
                Ok(_) => (),
                Err(ClientError::MailboxFull) => {
                    log::trace!("Listener busy, dropping {kind} sample");
                }
                Err(ClientError::ChannelClosed) => break,
            },
            Err(e) => {
                log::error!("Failed to read {kind} {}: {e}", driver.name());
                break;
            }
        }

        thread::sleep(period);
    }
    log::debug!("Stopped polling {kind} {}", driver.name());
}
