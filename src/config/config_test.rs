use std::{error::Error, path::Path};

use crate::config::{LoadError, PublisherConfig};

const CONFIG: &str = r#"
version: 1
sensors:
  accelerometer:
    name: "{accel_3d,bmi*}"
    mount_matrix:
      x: [0, 1, 0]
      y: [-1, 0, 0]
      z: [0, 0, 1]
  magnetometer:
    name: magn_3d
simulation:
  rotation_speed: 30.0
"#;

#[test]
fn test_load_config() -> Result<(), Box<dyn Error>> {
    let config = PublisherConfig::from_yaml(CONFIG.to_string())?;
    println!("Loaded config: {config:?}");

    let accel = config
        .accelerometer()
        .expect("should have accelerometer settings");
    assert_eq!(accel.name.as_deref(), Some("{accel_3d,bmi*}"));
    let matrix = accel
        .mount_matrix
        .as_ref()
        .expect("should have a mount matrix");
    assert_eq!(matrix.y, [-1.0, 0.0, 0.0]);

    let magn = config
        .magnetometer()
        .expect("should have magnetometer settings");
    assert_eq!(magn.name.as_deref(), Some("magn_3d"));
    assert!(magn.mount_matrix.is_none());

    let simulation = config.simulation.expect("should have simulation settings");
    assert_eq!(simulation.rotation_speed, Some(30.0));
    assert_eq!(simulation.noise, None);

    Ok(())
}

#[test]
fn test_minimal_config() -> Result<(), Box<dyn Error>> {
    let config = PublisherConfig::from_yaml("version: 1".to_string())?;
    assert_eq!(config, PublisherConfig::default());
    assert!(config.accelerometer().is_none());

    Ok(())
}

#[test]
fn test_malformed_config() {
    let result = PublisherConfig::from_yaml("sensors: [1, 2".to_string());
    assert!(matches!(result, Err(LoadError::DeserializeError(_))));
}

#[test]
fn test_missing_config_file() {
    let path = Path::new("/nonexistent/bearing-publisher/config.yaml");
    let result = PublisherConfig::load(Some(path));
    assert!(matches!(result, Err(LoadError::IoError(_))));
}

#[test]
fn test_dump_round_trip() -> Result<(), Box<dyn Error>> {
    let config = PublisherConfig::from_yaml(CONFIG.to_string())?;
    let dumped = serde_yaml::to_string(&config)?;
    let reloaded = PublisherConfig::from_yaml(dumped)?;
    assert_eq!(config, reloaded);

    Ok(())
}

#[test]
fn test_load_config_from_path() -> Result<(), Box<dyn Error>> {
    let path = std::env::temp_dir().join(format!("bearing-publisher-{}.yaml", std::process::id()));
    std::fs::write(&path, CONFIG)?;
    let result = PublisherConfig::load(Some(&path));
    std::fs::remove_file(&path)?;

    let config = result?;
    assert_eq!(config, PublisherConfig::from_yaml(CONFIG.to_string())?);

    Ok(())
}
