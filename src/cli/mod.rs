pub mod sensors;

use std::{error::Error, path::PathBuf};

use clap::{Parser, Subcommand};
use sensors::{handle_sensors, SensorsCommand};

use crate::config::PublisherConfig;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Publish the bearing measured by the IIO sensors (default)
    Run {
        /// Path to a config file to use instead of the search paths
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Publish the bearing of a simulated device turning in place
    Simulate {
        /// Path to a config file to use instead of the search paths
        #[arg(long)]
        config: Option<PathBuf>,
        /// Stop after the given number of seconds
        #[arg(long)]
        duration: Option<u64>,
    },
    /// Inspect motion sensors
    Sensors {
        #[command(subcommand)]
        cmd: SensorsCommand,
    },
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        cmd: ConfigCommand,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Dump the effective configuration in YAML format
    Dump {
        /// Path to a config file to use instead of the search paths
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

/// Handle commands that only inspect the system and exit
pub async fn main_cli(cmd: Commands) -> Result<(), Box<dyn Error + Send + Sync>> {
    match cmd {
        Commands::Run { .. } | Commands::Simulate { .. } => (),
        Commands::Sensors { cmd } => handle_sensors(cmd).await?,
        Commands::Config { cmd } => handle_config(cmd).await?,
    }

    Ok(())
}

async fn handle_config(cmd: ConfigCommand) -> Result<(), Box<dyn Error + Send + Sync>> {
    match cmd {
        ConfigCommand::Dump { config } => {
            let config = PublisherConfig::load(config.as_deref())?;
            let yaml = serde_yaml::to_string(&config)?;
            println!("{yaml}");
        }
    }

    Ok(())
}
