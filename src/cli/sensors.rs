use std::error::Error;

use clap::Subcommand;
use tabled::settings::{Panel, Style};
use tabled::{Table, Tabled};

use crate::iio::device::list_devices;

#[derive(Subcommand, Debug, Clone)]
pub enum SensorsCommand {
    /// List all IIO devices and the motion data they provide
    List,
}

#[derive(Tabled)]
struct SensorRow {
    id: String,
    name: String,
    provides: String,
}

pub async fn handle_sensors(cmd: SensorsCommand) -> Result<(), Box<dyn Error + Send + Sync>> {
    match cmd {
        SensorsCommand::List => {
            let mut devices = tokio::task::spawn_blocking(list_devices).await??;
            devices.sort_by(|a, b| a.id.cmp(&b.id));
            let count = devices.len();

            let rows: Vec<SensorRow> = devices
                .into_iter()
                .map(|device| {
                    let provides = device
                        .kinds
                        .iter()
                        .map(|kind| kind.to_string())
                        .collect::<Vec<String>>()
                        .join(", ");
                    SensorRow {
                        id: device.id.unwrap_or_default(),
                        name: device.name.unwrap_or_default(),
                        provides,
                    }
                })
                .collect();

            let mut table = Table::new(rows);
            table
                .with(Style::modern_rounded())
                .with(Panel::header("IIO Devices"));
            println!("{table}");
            println!("Found {count} IIO device(s)");
        }
    }

    Ok(())
}
