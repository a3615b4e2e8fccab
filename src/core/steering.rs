use std::fmt::{Display, Formatter};

use chrono::{NaiveDateTime, TimeDelta, Timelike};
use serde::Serialize;

use crate::{
    core::{analysis::Analysis, cost::DayOption},
    quantity::power::Watts,
};

/// What the heater relay should do for the current hour.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct SteeringDecision {
    pub hour: NaiveDateTime,
    pub heater_on: bool,
    pub option: Option<DayOption>,

    /// Sum of the hour's slot difference powers.
    pub difference_power: Watts,
    pub heating_power: Watts,
}

impl Display for SteeringDecision {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: heater {} (difference {}, heating {})",
            self.hour.format("%Y-%m-%d %H:%M"),
            if self.heater_on { "on" } else { "off" },
            self.difference_power,
            self.heating_power,
        )
    }
}

/// Decide on the heater for the hour containing `now`.
///
/// The heater only runs while heating is required: for the whole hour when burning fuel is
/// cheaper that day, and otherwise when the hour is short of power. Returns `None` when the analysis does not cover
/// the hour.
pub fn decide(analysis: &Analysis, now: NaiveDateTime) -> Option<SteeringDecision> {
    let hour = now.with_minute(0)?.with_second(0)?.with_nanosecond(0)?;
    let end = hour + TimeDelta::hours(1);
    let in_hour = |timestamp: &NaiveDateTime| (hour..end).contains(timestamp);

    let difference_power: Watts = analysis
        .difference_power
        .iter()
        .filter(|(timestamp, _)| in_hour(timestamp))
        .map(|(_, power)| *power)
        .sum();
    let heating: Vec<Watts> = analysis
        .heating_power
        .iter()
        .filter(|(timestamp, _)| in_hour(timestamp))
        .map(|(_, power)| *power)
        .collect();
    if heating.is_empty() {
        return None;
    }
    let heating_power = heating.iter().copied().sum();

    let option =
        analysis.days.iter().find(|day| day.date == hour.date()).and_then(|day| day.option);
    let heater_on = heating_power > Watts::ZERO
        && (option == Some(DayOption::Heater) || difference_power < Watts::ZERO);
    Some(SteeringDecision { hour, heater_on, option, difference_power, heating_power })
}
