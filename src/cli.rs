mod analyze;
mod forecast;
mod inputs;
mod steer;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

pub use self::{
    analyze::{analyze, show_checkpoint},
    forecast::forecast,
    steer::steer,
};
use crate::cli::inputs::InputArgs;

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    /// TOML configuration file.
    #[clap(long, env = "HEARTH_CONFIG", default_value = "hearth.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Main command: run the analysis over the forecast, print it, and update the checkpoint.
    #[clap(name = "analyze")]
    Analyze(Box<AnalyzeArgs>),

    /// Print the stored battery checkpoint.
    #[clap(name = "checkpoint")]
    Checkpoint(CheckpointArgs),

    /// Save and compare weather forecast snapshots of the same day.
    #[clap(name = "forecast")]
    Forecast(Box<ForecastArgs>),

    /// Decide whether the heater should run during the current hour.
    #[clap(name = "steer")]
    Steer(Box<SteerArgs>),
}

#[derive(Parser)]
pub struct CheckpointArgs {
    /// TOML data file holding the end-of-day battery state.
    #[clap(long = "data-file", env = "HEARTH_DATA_FILE", default_value = "data.toml")]
    pub data_file: PathBuf,
}

#[derive(Parser)]
pub struct AnalyzeArgs {
    #[clap(flatten)]
    pub inputs: InputArgs,

    #[clap(flatten)]
    pub checkpoint: CheckpointArgs,

    /// Also print the slot table of the given date.
    #[clap(long = "slots")]
    pub slots: Option<NaiveDate>,

    /// Print the analysis as JSON instead of tables.
    #[clap(long)]
    pub json: bool,

    /// Do not update the checkpoint.
    #[clap(long)]
    pub scout: bool,
}

#[derive(Parser)]
pub struct ForecastArgs {
    #[command(subcommand)]
    pub command: ForecastCommand,
}

#[derive(Subcommand)]
pub enum ForecastCommand {
    /// Freeze the current forecast of a day with the PV yield it implies.
    #[clap(name = "snapshot")]
    Snapshot {
        /// Weather forecast snapshot, JSON.
        #[clap(long = "weather", env = "HEARTH_WEATHER")]
        weather: PathBuf,

        /// Where to write the frozen forecast, JSON.
        #[clap(long = "output")]
        output: PathBuf,

        /// Day to freeze, today by default.
        #[clap(long = "date")]
        date: Option<NaiveDate>,
    },

    /// Report how much the forecast moved between a morning and an evening snapshot.
    #[clap(name = "compare")]
    Compare {
        #[clap(long = "morning")]
        morning: PathBuf,

        #[clap(long = "evening")]
        evening: PathBuf,
    },
}

#[derive(Parser)]
pub struct SteerArgs {
    #[clap(flatten)]
    pub inputs: InputArgs,

    #[clap(flatten)]
    pub checkpoint: CheckpointArgs,

    /// Keep deciding with this period instead of deciding once.
    #[clap(long = "repeat-seconds", env = "HEARTH_REPEAT_SECONDS")]
    pub repeat_seconds: Option<u64>,
}
