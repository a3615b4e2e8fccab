#![allow(clippy::doc_markdown)]
#![doc = include_str!("../README.md")]

mod api;
mod checkpoint;
mod cli;
mod config;
mod core;
mod prelude;
mod quantity;
mod tables;

use clap::{Parser, crate_version};

use crate::{
    cli::{Args, Command, analyze, forecast, show_checkpoint, steer},
    config::Config,
    prelude::*,
};

fn main() -> Result {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().without_time().compact().init();
    info!(version = crate_version!(), "starting…");

    let args = Args::parse();
    let config = Config::read_from(&args.config)?;

    match args.command {
        Command::Analyze(args) => analyze(&config, &args)?,
        Command::Checkpoint(args) => show_checkpoint(&args),
        Command::Forecast(args) => forecast(&config, &args)?,
        Command::Steer(args) => steer(&config, &args)?,
    }

    info!("done!");
    Ok(())
}
