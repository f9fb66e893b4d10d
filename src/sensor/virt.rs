//! In-process sensor manager whose samples are injected by the caller. Used
//! by the simulator and for exercising listeners without hardware.
use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
    time::Duration,
};

use crate::listener::client::{ClientError, ListenerClient};

use super::{Sensor, SensorError, SensorKind, SensorManager, SensorSample};

#[derive(Debug)]
struct Registration {
    listener: ListenerClient,
    period: Duration,
}

/// [SensorManager] backed by samples injected with [VirtualSensorManager::inject]
#[derive(Debug)]
pub struct VirtualSensorManager {
    sensors: Vec<Sensor>,
    listeners: Mutex<HashMap<SensorKind, Vec<Registration>>>,
}

impl Default for VirtualSensorManager {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualSensorManager {
    /// Create a new virtual sensor manager with an accelerometer and a
    /// magnetometer.
    pub fn new() -> Self {
        Self::with_sensors(&SensorKind::ALL)
    }

    /// Create a new virtual sensor manager that only provides the given
    /// sensor kinds.
    pub fn with_sensors(kinds: &[SensorKind]) -> Self {
        let sensors = kinds
            .iter()
            .map(|kind| Sensor {
                kind: *kind,
                id: format!("virtual:{kind}"),
                name: format!("Virtual {kind}"),
            })
            .collect();
        Self {
            sensors,
            listeners: Mutex::new(HashMap::new()),
        }
    }

    /// Deliver the given values to every listener registered for the given
    /// sensor kind. Returns the number of listeners that accepted the sample.
    pub fn inject(&self, kind: SensorKind, values: [f32; 3]) -> usize {
        let sample = SensorSample::new(kind, values);
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(registrations) = listeners.get_mut(&kind) else {
            return 0;
        };

        let mut delivered = 0;
        for registration in registrations.iter() {
            match registration.listener.deliver(sample) {
                Ok(_) => delivered += 1,
                Err(ClientError::MailboxFull) => {
                    log::trace!("Dropping {kind} sample for busy listener");
                }
                Err(ClientError::ChannelClosed) => {
                    log::trace!("Listener for {kind} no longer exists");
                }
            }
        }

        // Forget listeners whose context has gone away
        registrations.retain(|r| !r.listener.is_closed());

        delivered
    }

    /// Returns the number of listeners registered for the given sensor kind
    pub fn listener_count(&self, kind: SensorKind) -> usize {
        let listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        listeners.get(&kind).map(|l| l.len()).unwrap_or_default()
    }

    /// Returns the delivery period requested by the first listener of the
    /// given sensor kind.
    pub fn requested_period(&self, kind: SensorKind) -> Option<Duration> {
        let listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        listeners
            .get(&kind)
            .and_then(|l| l.first())
            .map(|r| r.period)
    }
}

impl SensorManager for VirtualSensorManager {
    fn default_sensor(&self, kind: SensorKind) -> Option<Sensor> {
        self.sensors.iter().find(|s| s.kind == kind).cloned()
    }

    fn register_listener(
        &self,
        listener: ListenerClient,
        sensor: &Sensor,
        period: Duration,
    ) -> Result<(), SensorError> {
        if !self.sensors.contains(sensor) {
            return Err(SensorError::NotFound(sensor.kind));
        }

        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let registrations = listeners.entry(sensor.kind).or_default();
        if registrations
            .iter()
            .any(|r| r.listener.is_same_listener(&listener))
        {
            return Err(SensorError::AlreadyRegistered(sensor.id.clone()));
        }

        log::debug!("Registered listener with {} every {period:?}", sensor.id);
        registrations.push(Registration { listener, period });
        Ok(())
    }

    fn unregister_listener(&self, listener: &ListenerClient, sensor: &Sensor) {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(registrations) = listeners.get_mut(&sensor.kind) else {
            return;
        };
        registrations.retain(|r| !r.listener.is_same_listener(listener));
        log::debug!("Unregistered listener from {}", sensor.id);
    }
}
