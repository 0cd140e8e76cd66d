use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cropops", version, about = "Irrigation schedule decision engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config.yaml
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override SQLite data directory
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sweep due schedules on the configured interval
    Run,
    /// Run a single sweep over due schedules and exit
    Sweep,
    /// Record a prediction and schedule irrigation for it
    Add {
        /// Crop type (Wheat, Rice, Cotton, Sugarcane, Maize, Soybean, ...)
        #[arg(long)]
        crop: String,
        /// Crop age in days
        #[arg(long)]
        crop_days: u32,
        /// Soil moisture on the 0-1000 scale
        #[arg(long)]
        moisture: f64,
        /// Temperature in Celsius
        #[arg(long)]
        temperature: f64,
        /// Relative humidity percent
        #[arg(long, default_value_t = 50.0)]
        humidity: f64,
        /// Classifier confidence in [0, 1]
        #[arg(long, default_value_t = 1.0)]
        confidence: f64,
        /// Field location for the rain forecast
        #[arg(long)]
        location: Option<String>,
        /// Notification recipient
        #[arg(long)]
        recipient: Option<String>,
        /// Minutes from now to schedule the run
        #[arg(long, default_value_t = 0)]
        in_minutes: i64,
        /// Schedule even if the threshold policy says the soil is fine
        #[arg(long)]
        force: bool,
    },
    /// Show recent schedules
    List {
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// Print a water-requirement report without scheduling anything
    Report {
        #[arg(long)]
        crop: String,
        #[arg(long)]
        crop_days: u32,
        #[arg(long)]
        moisture: f64,
        #[arg(long)]
        temperature: f64,
        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate config and test the forecast connection
    Check,
}
