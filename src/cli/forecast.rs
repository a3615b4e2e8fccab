use chrono::Local;

use crate::{
    api::weather::WeatherForecast,
    cli::{ForecastArgs, ForecastCommand},
    config::Config,
    core::forecast::{ForecastSnapshot, compare, take_snapshot},
    prelude::*,
};

pub fn forecast(config: &Config, args: &ForecastArgs) -> Result {
    match &args.command {
        ForecastCommand::Snapshot { weather, output, date } => {
            let taken_at = Local::now().naive_local();
            let date = date.unwrap_or_else(|| taken_at.date());
            let forecast = WeatherForecast::read_from(weather)?;
            let pv_array = config.pv_array()?;
            let snapshot = take_snapshot()
                .forecast(&forecast)
                .date(date)
                .taken_at(taken_at)
                .location(config.location)
                .pv_array(&pv_array)
                .call()
                .with_context(|| format!("the weather forecast does not cover {date}"))?;
            snapshot.write_to(output)
        }
        ForecastCommand::Compare { morning, evening } => {
            let morning = ForecastSnapshot::read_from(morning)?;
            let evening = ForecastSnapshot::read_from(evening)?;
            let Some(deviation) = compare(&morning, &evening) else {
                bail!("no comparison available for these snapshots");
            };
            println!("{}", serde_json::to_string_pretty(&deviation)?);
            if deviation.is_large() {
                warn!(
                    average_irradiance_difference = deviation.average_irradiance_difference,
                    energy_ratio = ?deviation.energy_ratio,
                    "the forecast changed considerably since the morning"
                );
            }
            Ok(())
        }
    }
}
