use std::{
    error::Error,
    sync::{atomic::Ordering, Arc},
    time::Duration,
};

use tokio::sync::broadcast::error::TryRecvError;

use crate::{
    constants::{NODE_NAME, SENSOR_DELAY, TOPIC_NAME, TOPIC_TYPE, WARMUP_THRESHOLD},
    fusion::pipeline_test::RecordingChannel,
    listener::listener_test::{wait_for, PanickingChannel},
    publisher::{OrientationPublisher, PublisherError},
    sensor::{virt::VirtualSensorManager, SensorKind},
    sync::TimeoutReceiver,
    transport::{bus::MessageBus, OutboundChannel, Transport, TransportError},
};

const LEVEL: [f32; 3] = [0.0, 0.0, 9.81];
const NORTH: [f32; 3] = [0.0, 22.0, -42.0];
const EAST: [f32; 3] = [-22.0, 0.0, -42.0];

/// Transport that hands out a [RecordingChannel] shared with the test
struct RecordingTransport {
    channel: RecordingChannel,
}

impl Transport for RecordingTransport {
    fn new_publisher(
        &self,
        _topic: &str,
        _type_name: &str,
    ) -> Result<Box<dyn OutboundChannel>, TransportError> {
        Ok(Box::new(self.channel.clone()))
    }
}

/// Transport that cannot create publishers
struct FailingTransport;

impl Transport for FailingTransport {
    fn new_publisher(
        &self,
        topic: &str,
        _type_name: &str,
    ) -> Result<Box<dyn OutboundChannel>, TransportError> {
        Err(TransportError::InvalidTopic(topic.to_string()))
    }
}

/// Transport whose channels panic when a bearing is sent
struct PanickingTransport;

impl Transport for PanickingTransport {
    fn new_publisher(
        &self,
        _topic: &str,
        _type_name: &str,
    ) -> Result<Box<dyn OutboundChannel>, TransportError> {
        Ok(Box::new(PanickingChannel))
    }
}

/// Feed enough samples for the publisher to calibrate and publish once
fn calibrate(sensors: &VirtualSensorManager) {
    sensors.inject(SensorKind::Magnetometer, NORTH);
    for _ in 0..=WARMUP_THRESHOLD {
        sensors.inject(SensorKind::Accelerometer, LEVEL);
    }
}

#[tokio::test]
async fn test_publisher_lifecycle() -> Result<(), Box<dyn Error>> {
    let sensors = Arc::new(VirtualSensorManager::new());
    let bus = MessageBus::new();
    let mut rx = bus.subscribe(TOPIC_NAME);

    let mut publisher = OrientationPublisher::new(sensors.clone(), SENSOR_DELAY);
    assert_eq!(OrientationPublisher::default_node_name(), NODE_NAME);
    assert_eq!(NODE_NAME, "camera_controller/orientationPublisher");
    assert!(!publisher.is_running());

    publisher.on_start(&bus)?;
    assert!(publisher.is_running());
    assert_eq!(bus.topic_type(TOPIC_NAME).as_deref(), Some(TOPIC_TYPE));

    calibrate(&sensors);
    let bearing = rx.recv_timeout(Duration::from_secs(2)).await?;
    assert!((bearing - 90.0).abs() < 1e-3);

    // Turning the device moves the bearing away from 90
    let mut bearing = 90.0;
    for _ in 0..100 {
        sensors.inject(SensorKind::Magnetometer, EAST);
        bearing = rx.recv_timeout(Duration::from_secs(2)).await?;
    }
    assert!((bearing - 180.0).abs() < 0.5, "unexpected bearing {bearing}");

    publisher.on_shutdown();
    assert!(!publisher.is_running());

    Ok(())
}

#[tokio::test]
async fn test_no_bearings_after_shutdown() -> Result<(), Box<dyn Error>> {
    let sensors = Arc::new(VirtualSensorManager::new());
    let bus = MessageBus::new();
    let mut rx = bus.subscribe(TOPIC_NAME);

    let mut publisher = OrientationPublisher::new(sensors.clone(), SENSOR_DELAY);
    publisher.on_start(&bus)?;
    calibrate(&sensors);
    rx.recv_timeout(Duration::from_secs(2)).await?;

    publisher.on_shutdown();
    while rx.try_recv().is_ok() {}

    // Sensors keep producing data but nobody is registered anymore
    assert_eq!(sensors.listener_count(SensorKind::Accelerometer), 0);
    assert_eq!(sensors.listener_count(SensorKind::Magnetometer), 0);
    for _ in 0..50 {
        assert_eq!(sensors.inject(SensorKind::Magnetometer, EAST), 0);
    }
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));

    // Shutting down again does nothing
    publisher.on_shutdown();
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));

    Ok(())
}

#[test]
fn test_shutdown_waits_for_listener_thread() -> Result<(), Box<dyn Error>> {
    let sensors = Arc::new(VirtualSensorManager::new());
    let channel = RecordingChannel::default();
    let transport = RecordingTransport {
        channel: channel.clone(),
    };

    let mut publisher = OrientationPublisher::new(sensors.clone(), SENSOR_DELAY);
    publisher.on_start(&transport)?;
    calibrate(&sensors);
    assert!(!channel.dropped.load(Ordering::Acquire));

    // The listener thread releases its channel as the last thing it does
    publisher.on_shutdown();
    assert!(channel.dropped.load(Ordering::Acquire));

    // Every calibrating sample was processed or discarded, never published late
    let published = channel.published().len();
    assert!(published <= 1);
    sensors.inject(SensorKind::Accelerometer, LEVEL);
    assert_eq!(channel.published().len(), published);

    Ok(())
}

#[test]
fn test_shutdown_without_start() {
    let sensors = Arc::new(VirtualSensorManager::new());
    let mut publisher = OrientationPublisher::new(sensors, SENSOR_DELAY);
    publisher.on_shutdown();
    publisher.on_shutdown();
    assert!(!publisher.is_running());
}

#[test]
fn test_start_twice_is_rejected() -> Result<(), Box<dyn Error>> {
    let sensors = Arc::new(VirtualSensorManager::new());
    let bus = MessageBus::new();
    let mut publisher = OrientationPublisher::new(sensors.clone(), SENSOR_DELAY);
    publisher.on_start(&bus)?;

    let result = publisher.on_start(&bus);
    assert!(matches!(result, Err(PublisherError::AlreadyRunning)));
    assert!(publisher.is_running());
    assert_eq!(sensors.listener_count(SensorKind::Accelerometer), 1);

    publisher.on_shutdown();
    assert!(!publisher.is_running());

    // The publisher can be started again after a shutdown
    publisher.on_start(&bus)?;
    assert!(publisher.is_running());
    publisher.on_shutdown();

    Ok(())
}

#[test]
fn test_channel_failure_leaves_publisher_idle() {
    let sensors = Arc::new(VirtualSensorManager::new());
    let mut publisher = OrientationPublisher::new(sensors.clone(), SENSOR_DELAY);

    let result = publisher.on_start(&FailingTransport);
    assert!(matches!(result, Err(PublisherError::Transport(_))));
    assert!(!publisher.is_running());
    assert_eq!(sensors.listener_count(SensorKind::Accelerometer), 0);
    assert_eq!(sensors.listener_count(SensorKind::Magnetometer), 0);
}

#[test]
fn test_listener_failure_leaves_publisher_idle() {
    let sensors = Arc::new(VirtualSensorManager::with_sensors(&[
        SensorKind::Accelerometer,
    ]));
    let channel = RecordingChannel::default();
    let transport = RecordingTransport {
        channel: channel.clone(),
    };
    let mut publisher = OrientationPublisher::new(sensors.clone(), SENSOR_DELAY);

    let result = publisher.on_start(&transport);
    assert!(matches!(result, Err(PublisherError::Listener(_))));
    assert!(!publisher.is_running());
    assert_eq!(sensors.listener_count(SensorKind::Accelerometer), 0);
    assert!(channel.dropped.load(Ordering::Acquire));
}

#[test]
fn test_panicked_listener_returns_publisher_to_idle() -> Result<(), Box<dyn Error>> {
    let sensors = Arc::new(VirtualSensorManager::new());
    let mut publisher = OrientationPublisher::new(sensors.clone(), SENSOR_DELAY);
    publisher.on_start(&PanickingTransport)?;
    assert!(publisher.is_running());

    // The first bearing takes the listener thread down
    calibrate(&sensors);
    assert!(wait_for(|| !publisher.is_running()));

    // Shutting down still completes and leaves the publisher idle
    publisher.on_shutdown();
    assert!(!publisher.is_running());
    assert_eq!(sensors.inject(SensorKind::Magnetometer, NORTH), 0);
    assert_eq!(sensors.listener_count(SensorKind::Accelerometer), 0);

    // The publisher can be started again
    let bus = MessageBus::new();
    publisher.on_start(&bus)?;
    assert!(publisher.is_running());
    publisher.on_shutdown();

    Ok(())
}
