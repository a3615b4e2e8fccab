use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::{
    api::{
        load_profile::{LoadProfile, MonthDay},
        weather::{WeatherForecast, WeatherSample},
    },
    core::slot::SlotTime,
    prelude::*,
    quantity::power::Watts,
};

/// What to do with a weather slot the load profile has no value for.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Strictness {
    /// Drop the slot.
    #[default]
    Skip,

    /// Abort the analysis.
    Fail,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum AlignmentError {
    #[error("the load profile has no entry for {day} (forecast date {date})")]
    MissingDay { day: MonthDay, date: NaiveDate },

    #[error("the load profile has no {time} entry for {day} (forecast date {date})")]
    MissingTime { day: MonthDay, date: NaiveDate, time: SlotTime },
}

/// Weather sample and household load of one slot.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AlignedSlot {
    pub timestamp: NaiveDateTime,
    pub weather: WeatherSample,
    pub load: Watts,
}

/// Inner-join the forecast with the load profile, in chronological order.
#[instrument(skip_all, fields(strictness = ?strictness))]
pub fn align(
    forecast: &WeatherForecast,
    load_profile: &LoadProfile,
    strictness: Strictness,
) -> Result<Vec<AlignedSlot>, AlignmentError> {
    let mut aligned = Vec::new();
    let mut n_skipped = 0_usize;

    for (date, day) in &forecast.0 {
        for (time, weather) in &day.slots {
            if let Some(load) = load_profile.power_at(*date, *time) {
                let timestamp = date.and_time(time.0);
                aligned.push(AlignedSlot { timestamp, weather: *weather, load });
                continue;
            }
            let day = MonthDay::from(*date);
            let error = if load_profile.contains_day(*date) {
                AlignmentError::MissingTime { day, date: *date, time: *time }
            } else {
                AlignmentError::MissingDay { day, date: *date }
            };
            match strictness {
                Strictness::Fail => return Err(error),
                Strictness::Skip => {
                    trace!("skipping: {error}");
                    n_skipped += 1;
                }
            }
        }
    }

    if n_skipped != 0 {
        warn!(n_skipped, n_aligned = aligned.len(), "some forecast slots have no load value");
    }
    Ok(aligned)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forecast() -> Result<WeatherForecast> {
        Ok(serde_json::from_str(
            r#"{
                "2024-03-01": {
                    "00:00": {"temp": 1.0},
                    "00:15": {"temp": 1.5},
                    "daily": {"temp_min": 1.0, "temp_max": 9.0}
                },
                "2024-03-02": {"00:00": {"temp": 2.0}}
            }"#,
        )?)
    }

    fn load_profile() -> Result<LoadProfile> {
        Ok(serde_json::from_str(r#"{"01-03": {"00:00": 300.0, "00:15": 320.0}}"#)?)
    }

    #[test]
    fn test_skip() -> Result {
        let aligned = align(&forecast()?, &load_profile()?, Strictness::Skip)?;
        assert_eq!(aligned.len(), 2);
        assert_eq!(aligned[0].timestamp.to_string(), "2024-03-01 00:00:00");
        assert_eq!(aligned[1].load, Watts::from(320.0));
        Ok(())
    }

    #[test]
    fn test_fail() -> Result {
        let error = align(&forecast()?, &load_profile()?, Strictness::Fail).unwrap_err();
        assert_eq!(
            error,
            AlignmentError::MissingDay {
                day: MonthDay { month: 3, day: 2 },
                date: NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
            },
        );
        Ok(())
    }

    #[test]
    fn test_missing_time() -> Result {
        let profile: LoadProfile =
            serde_json::from_str(r#"{"01-03": {"00:00": 300.0}, "02-03": {}}"#)?;
        let error = align(&forecast()?, &profile, Strictness::Fail).unwrap_err();
        assert!(matches!(error, AlignmentError::MissingTime { .. }), "{error}");
        Ok(())
    }

    #[test]
    fn test_zero_profile_matches_everything() -> Result {
        let aligned = align(&forecast()?, &LoadProfile::zero(), Strictness::Fail)?;
        assert_eq!(aligned.len(), 3);
        assert!(aligned.iter().all(|slot| slot.load == Watts::ZERO));
        Ok(())
    }
}
