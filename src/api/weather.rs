use std::{collections::BTreeMap, fs, path::Path};

use chrono::NaiveDate;
use serde::{
    Deserialize,
    Deserializer,
    Serialize,
    Serializer,
    de,
    ser::SerializeMap,
};

use crate::{core::slot::SlotTime, prelude::*};

/// Per-day summary entry that sits next to the time slots.
const DAILY_KEY: &str = "daily";

/// Weather forecast snapshot: `date → {"HH:MM" → sample, "daily" → summary}`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeatherForecast(pub BTreeMap<NaiveDate, WeatherDay>);

impl WeatherForecast {
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn read_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).context("failed to read the weather snapshot")?;
        let forecast: Self =
            serde_json::from_str(&contents).context("failed to parse the weather snapshot")?;
        info!(n_days = forecast.0.len(), "loaded the weather forecast");
        Ok(forecast)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct WeatherDay {
    pub slots: BTreeMap<SlotTime, WeatherSample>,
    pub daily: Option<DailySummary>,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherSample {
    /// Ambient temperature, °C.
    #[serde(rename = "temp")]
    pub temperature: f64,

    /// Direct radiation on the horizontal plane, W/m².
    #[serde(default, rename = "direct_radiation")]
    pub direct_irradiance: f64,

    /// Direct normal irradiance, W/m².
    #[serde(default, rename = "dni_radiation", alias = "radiation")]
    pub direct_normal_irradiance: f64,

    /// Global horizontal irradiance, W/m².
    #[serde(default, rename = "ghi_radiation")]
    pub global_irradiance: f64,

    /// Cloud cover, percent.
    #[serde(default, rename = "cloudcover")]
    pub cloud_cover: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    #[serde(default, rename = "temp_min")]
    pub min_temperature: Option<f64>,

    #[serde(default, rename = "temp_max")]
    pub max_temperature: Option<f64>,

    #[serde(default)]
    pub sunrise: Option<String>,

    #[serde(default)]
    pub sunset: Option<String>,
}

impl<'de> Deserialize<'de> for WeatherDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut day = Self::default();
        for (key, value) in BTreeMap::<String, serde_json::Value>::deserialize(deserializer)? {
            if key == DAILY_KEY {
                day.daily = Some(serde_json::from_value(value).map_err(de::Error::custom)?);
            } else {
                let time = key.parse::<SlotTime>().map_err(de::Error::custom)?;
                let sample = serde_json::from_value(value).map_err(de::Error::custom)?;
                day.slots.insert(time, sample);
            }
        }
        Ok(day)
    }
}

impl Serialize for WeatherDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.slots.len() + 1))?;
        for (time, sample) in &self.slots {
            map.serialize_entry(time, sample)?;
        }
        if let Some(daily) = &self.daily {
            map.serialize_entry(DAILY_KEY, daily)?;
        }
        map.end()
    }
}
