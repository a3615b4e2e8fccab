use std::path::PathBuf;

use chrono::Local;
use clap::Parser;
use serde::Serialize;

use crate::{
    api::{load_profile::LoadProfile, market::MarketData, weather::WeatherForecast},
    checkpoint::CheckpointStore,
    config::Config,
    core::{
        aligner::{Strictness, align},
        analysis::{Analysis, Analyzer},
        preparation::prepare_slots,
    },
    prelude::*,
    quantity::percent::Percent,
};

/// Where the provider snapshots are read from.
#[derive(Parser)]
pub struct InputArgs {
    /// Weather forecast snapshot, JSON.
    #[clap(long = "weather", env = "HEARTH_WEATHER")]
    pub weather: PathBuf,

    /// Hourly market prices, JSON.
    #[clap(long = "market", env = "HEARTH_MARKET")]
    pub market: Option<PathBuf>,

    /// Household load profile, JSON. Zero load when not set.
    #[clap(long = "load-profile", env = "HEARTH_LOAD_PROFILE")]
    pub load_profile: Option<PathBuf>,

    /// Override the configured alignment strictness.
    #[clap(long, value_enum)]
    pub strictness: Option<Strictness>,
}

impl InputArgs {
    pub fn read<'a>(
        &self,
        config: &'a Config,
        initial_state_of_charge: Percent,
    ) -> Result<Snapshot<'a>> {
        let market = match &self.market {
            Some(path) => MarketData::read_from(path)?,
            None => {
                warn!("no market data, using the fallback price");
                MarketData::default()
            }
        };
        Ok(Snapshot {
            config,
            forecast: WeatherForecast::read_from(&self.weather)?,
            load_profile: LoadProfile::read_from(self.load_profile.as_deref()),
            market,
            strictness: self.strictness.unwrap_or(config.alignment.strictness),
            initial_state_of_charge,
        })
    }
}

/// Everything an analysis depends on.
#[derive(Serialize)]
pub struct Snapshot<'a> {
    config: &'a Config,
    forecast: WeatherForecast,
    load_profile: LoadProfile,
    market: MarketData,
    strictness: Strictness,
    initial_state_of_charge: Percent,
}

impl Snapshot<'_> {
    #[instrument(skip_all, fields(n_days = self.forecast.0.len()))]
    pub fn analyze(&self, checkpoint_store: Option<&dyn CheckpointStore>) -> Result<Analysis> {
        let aligned = align(&self.forecast, &self.load_profile, self.strictness)?;
        ensure!(!aligned.is_empty(), "the forecast has no slots matching the load profile");
        info!(n_slots = aligned.len(), "aligned the forecast");

        let slots = prepare_slots()
            .aligned(&aligned)
            .location(self.config.location)
            .pv_array(&self.config.pv_array()?)
            .heating_model(&self.config.building()?)
            .prices(&self.market.hourly(&Local))
            .fallback_price(self.config.market.fallback_price)
            .call();

        Ok(Analyzer::builder()
            .slots(&slots)
            .battery(self.config.battery_parameters()?)
            .initial_state_of_charge(self.initial_state_of_charge)
            .cost_evaluator(&self.config.cost_evaluator())
            .maybe_checkpoint_store(checkpoint_store)
            .run())
    }
}

/// State of charge to start from: the checkpoint when there is one, otherwise the configured one.
pub fn initial_state_of_charge(config: &Config, store: &dyn CheckpointStore) -> Percent {
    store.load().map_or(config.battery.initial_state_of_charge, |checkpoint| {
        info!(date = %checkpoint.date, state_of_charge = %checkpoint.state_of_charge, "resuming");
        checkpoint.state_of_charge
    })
}
