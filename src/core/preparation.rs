use bon::builder;
use chrono::NaiveDate;

use crate::{
    api::market::HourlyPrices,
    core::{
        aligner::AlignedSlot,
        heating::HeatingModel,
        pv::PvArray,
        slot::Slot,
        solar::{Location, SolarDay},
    },
    prelude::*,
    quantity::rate::KilowattHourRate,
};

/// Turn the aligned weather and load into simulation slots.
///
/// Slots without a market price fall back to the configured consumer price.
#[builder]
pub fn prepare_slots(
    aligned: &[AlignedSlot],
    location: Location,
    pv_array: &PvArray,
    heating_model: &dyn HeatingModel,
    prices: &HourlyPrices,
    fallback_price: KilowattHourRate,
) -> Vec<Slot> {
    let mut solar_day: Option<(NaiveDate, SolarDay)> = None;
    let mut n_unpriced = 0_usize;

    let slots: Vec<_> = aligned
        .iter()
        .map(|aligned| {
            let date = aligned.timestamp.date();
            let solar = match solar_day {
                Some((solar_date, solar)) if solar_date == date => solar,
                _ => {
                    let solar = SolarDay::new(location, date);
                    solar_day = Some((date, solar));
                    solar
                }
            };
            let sun = solar.position_at(aligned.timestamp.time());
            let market_price = prices.price_at(aligned.timestamp).unwrap_or_else(|| {
                n_unpriced += 1;
                fallback_price
            });
            Slot {
                timestamp: aligned.timestamp,
                outdoor_temperature: aligned.weather.temperature,
                pv: pv_array.output(&aligned.weather, sun),
                load: aligned.load,
                heating: heating_model.demand(aligned.weather.temperature),
                market_price,
            }
        })
        .collect();

    if n_unpriced != 0 {
        info!(n_unpriced, %fallback_price, "using the fallback price beyond the market horizon");
    }
    debug!(n_slots = slots.len(), "prepared");
    slots
}
