use std::{collections::BTreeMap, fs, path::Path};

use bon::builder;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::{
    api::weather::WeatherForecast,
    core::{
        pv::PvArray,
        slot::SlotTime,
        solar::{Location, SolarDay},
    },
    prelude::*,
    quantity::{energy::WattHours, percent::Percent, power::Watts, time::Hours},
};

/// Average irradiance change between two snapshots worth a warning, W/m².
pub const MAX_IRRADIANCE_DIFFERENCE: f64 = 20.0;

/// Energy ratio distance from 100 % worth a warning, percentage points.
pub const MAX_ENERGY_DEVIATION: f64 = 20.0;

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ForecastSlot {
    /// W/m².
    pub direct_normal_irradiance: f64,

    /// W/m².
    pub global_irradiance: f64,

    /// Percent.
    pub cloud_cover: f64,

    /// °C.
    pub temperature: f64,

    /// Expected PV output after the converter limit.
    pub pv_power: Watts,
}

/// What the weather forecast said about one day at the time it was taken.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ForecastSnapshot {
    pub taken_at: NaiveDateTime,
    pub date: NaiveDate,
    pub slots: BTreeMap<SlotTime, ForecastSlot>,

    /// Expected PV yield of the whole day.
    pub pv_energy: WattHours,
}

impl ForecastSnapshot {
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn read_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).context("failed to read the forecast snapshot")?;
        let snapshot: Self =
            serde_json::from_str(&contents).context("failed to parse the forecast snapshot")?;
        debug!(taken_at = %snapshot.taken_at, date = %snapshot.date, "loaded");
        Ok(snapshot)
    }

    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn write_to(&self, path: &Path) -> Result {
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents).context("failed to write the forecast snapshot")?;
        info!(date = %self.date, pv_energy = %self.pv_energy, "saved the forecast snapshot");
        Ok(())
    }
}

/// Freeze the forecast of `date` together with the PV output it implies.
///
/// Returns `None` when the forecast does not cover the date.
#[builder]
pub fn take_snapshot(
    forecast: &WeatherForecast,
    date: NaiveDate,
    taken_at: NaiveDateTime,
    location: Location,
    pv_array: &PvArray,
) -> Option<ForecastSnapshot> {
    let day = forecast.0.get(&date)?;
    let solar = SolarDay::new(location, date);
    let slots: BTreeMap<_, _> = day
        .slots
        .iter()
        .map(|(time, sample)| {
            let slot = ForecastSlot {
                direct_normal_irradiance: sample.direct_normal_irradiance,
                global_irradiance: sample.global_irradiance,
                cloud_cover: sample.cloud_cover,
                temperature: sample.temperature,
                pv_power: pv_array.output(sample, solar.position_at(time.0)).power,
            };
            (*time, slot)
        })
        .collect();
    let pv_energy = slots.values().map(|slot| slot.pv_power * Hours::QUARTER).sum();
    Some(ForecastSnapshot { taken_at, date, slots, pv_energy })
}

/// How much the forecast of a day moved between two snapshots.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct ForecastDeviation {
    /// Mean over the common slots of the absolute DNI and GHI changes added together, W/m².
    pub average_irradiance_difference: f64,

    /// Later PV yield relative to the earlier one, `None` when the earlier one is zero.
    pub energy_ratio: Option<Percent>,

    pub n_slots: usize,
}

impl ForecastDeviation {
    pub fn is_large(&self) -> bool {
        self.average_irradiance_difference > MAX_IRRADIANCE_DIFFERENCE
            || self
                .energy_ratio
                .is_some_and(|ratio| (ratio.0 - 100.0).abs() > MAX_ENERGY_DEVIATION)
    }
}

/// Compare the morning forecast of a day against the evening one.
///
/// Returns `None` unless the evening snapshot was taken later, for the same day, and shares
/// at least one slot with the morning snapshot.
pub fn compare(
    morning: &ForecastSnapshot,
    evening: &ForecastSnapshot,
) -> Option<ForecastDeviation> {
    if evening.taken_at <= morning.taken_at {
        warn!(
            morning = %morning.taken_at,
            evening = %evening.taken_at,
            "the evening snapshot is not newer"
        );
        return None;
    }
    if evening.date != morning.date {
        warn!(
            morning = %morning.date,
            evening = %evening.date,
            "the snapshots are for different days"
        );
        return None;
    }
    let (total_difference, n_slots) = evening
        .slots
        .iter()
        .filter_map(|(time, evening)| {
            let morning = morning.slots.get(time)?;
            Some(
                (evening.direct_normal_irradiance - morning.direct_normal_irradiance).abs()
                    + (evening.global_irradiance - morning.global_irradiance).abs(),
            )
        })
        .fold((0.0, 0_usize), |(total, count), difference| (total + difference, count + 1));
    if n_slots == 0 {
        return None;
    }
    let energy_ratio = (morning.pv_energy > WattHours::ZERO)
        .then(|| Percent::from(evening.pv_energy / morning.pv_energy * 100.0));
    Some(ForecastDeviation {
        average_irradiance_difference: total_difference / n_slots as f64,
        energy_ratio,
        n_slots,
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::{
        api::weather::{WeatherDay, WeatherSample},
        core::pv::{IrradianceSource, Mounting, PvString},
    };

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 21).unwrap()
    }

    fn at(hour: u32) -> NaiveDateTime {
        date().and_hms_opt(hour, 0, 0).unwrap()
    }

    fn slot_time(time: &str) -> SlotTime {
        time.parse().unwrap()
    }

    fn slot(direct_normal_irradiance: f64, global_irradiance: f64) -> ForecastSlot {
        ForecastSlot {
            direct_normal_irradiance,
            global_irradiance,
            cloud_cover: 0.0,
            temperature: 20.0,
            pv_power: Watts::ZERO,
        }
    }

    fn snapshot(
        taken_at: NaiveDateTime,
        slots: &[(&str, ForecastSlot)],
        pv_energy: f64,
    ) -> ForecastSnapshot {
        ForecastSnapshot {
            taken_at,
            date: date(),
            slots: slots.iter().map(|(time, slot)| (slot_time(time), *slot)).collect(),
            pv_energy: WattHours::from(pv_energy),
        }
    }

    #[test]
    fn test_compare() {
        let morning = snapshot(
            at(7),
            &[
                ("11:00", slot(600.0, 500.0)),
                ("12:00", slot(700.0, 550.0)),
                ("13:00", slot(0.0, 0.0)),
            ],
            10_000.0,
        );
        let evening = snapshot(
            at(19),
            &[
                ("11:00", slot(580.0, 510.0)),
                ("12:00", slot(650.0, 560.0)),
                ("14:00", slot(0.0, 0.0)),
            ],
            9_000.0,
        );
        let deviation = compare(&morning, &evening).unwrap();
        assert_eq!(deviation.n_slots, 2);
        // (20 + 10 + 50 + 10) / 2
        assert_abs_diff_eq!(deviation.average_irradiance_difference, 45.0);
        assert_abs_diff_eq!(deviation.energy_ratio.unwrap().0, 90.0, epsilon = 1e-9);
        assert!(deviation.is_large());
    }

    #[test]
    fn test_small_deviation() {
        let morning = snapshot(at(7), &[("12:00", slot(700.0, 550.0))], 10_000.0);
        let evening = snapshot(at(19), &[("12:00", slot(705.0, 545.0))], 10_500.0);
        let deviation = compare(&morning, &evening).unwrap();
        assert_abs_diff_eq!(deviation.average_irradiance_difference, 10.0);
        assert!(!deviation.is_large());
    }

    #[test]
    fn test_evening_must_be_newer() {
        let morning = snapshot(at(19), &[("12:00", slot(700.0, 550.0))], 10_000.0);
        let evening = snapshot(at(7), &[("12:00", slot(700.0, 550.0))], 10_000.0);
        assert_eq!(compare(&morning, &evening), None);
        assert_eq!(compare(&morning, &morning), None);
    }

    #[test]
    fn test_no_common_slots() {
        let morning = snapshot(at(7), &[("11:00", slot(700.0, 550.0))], 10_000.0);
        let evening = snapshot(at(19), &[("12:00", slot(700.0, 550.0))], 10_000.0);
        assert_eq!(compare(&morning, &evening), None);
    }

    #[test]
    fn test_no_morning_yield() {
        let morning = snapshot(at(7), &[("12:00", slot(0.0, 0.0))], 0.0);
        let evening = snapshot(at(19), &[("12:00", slot(0.0, 0.0))], 500.0);
        assert_eq!(compare(&morning, &evening).unwrap().energy_ratio, None);
    }

    #[test]
    fn test_take_snapshot() -> Result {
        let sample = WeatherSample {
            temperature: 20.0,
            direct_irradiance: 600.0,
            direct_normal_irradiance: 800.0,
            global_irradiance: 700.0,
            cloud_cover: 10.0,
        };
        let day = WeatherDay {
            slots: [(slot_time("00:00"), sample), (slot_time("12:00"), sample)].into(),
            daily: None,
        };
        let forecast = WeatherForecast([(date(), day)].into());
        let pv_array = PvArray::builder()
            .strings(vec![PvString {
                efficiency: 20.0,
                area: 10.0,
                tilt: 30.0,
                azimuth: 0.0,
                temperature_coefficient: 0.0,
                nominal_temperature: 25.0,
                mounting: Mounting::RoofGoodVentilation,
                irradiance: IrradianceSource::DirectNormal,
            }])
            .converter_max_power(Watts::from(10_000.0))
            .build()?;
        let location = Location { latitude: 52.52, longitude: 13.40, utc_offset: 2.0 };

        let snapshot = take_snapshot()
            .forecast(&forecast)
            .date(date())
            .taken_at(at(7))
            .location(location)
            .pv_array(&pv_array)
            .call()
            .unwrap();
        assert_eq!(snapshot.slots.len(), 2);
        let midnight = snapshot.slots[&slot_time("00:00")];
        assert_eq!(midnight.pv_power, Watts::ZERO);
        assert_abs_diff_eq!(midnight.global_irradiance, 700.0);
        let noon = snapshot.slots[&slot_time("12:00")];
        assert!(noon.pv_power > Watts::ZERO);
        assert_abs_diff_eq!(snapshot.pv_energy.0, noon.pv_power.0 / 4.0, epsilon = 1e-9);

        let missing = take_snapshot()
            .forecast(&forecast)
            .date(date().succ_opt().unwrap())
            .taken_at(at(7))
            .location(location)
            .pv_array(&pv_array)
            .call();
        assert_eq!(missing, None);
        Ok(())
    }

    #[test]
    fn test_file_round_trip() -> Result {
        let directory = tempfile::tempdir()?;
        let path = directory.path().join("morning.json");
        let snapshot = snapshot(at(7), &[("12:00", slot(700.0, 550.0))], 10_000.0);
        snapshot.write_to(&path)?;
        assert_eq!(ForecastSnapshot::read_from(&path)?, snapshot);
        Ok(())
    }
}
