use std::{collections::BTreeMap, fs, path::Path};

use chrono::{DateTime, NaiveDateTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use crate::{prelude::*, quantity::rate::KilowattHourRate};

/// Day-ahead market snapshot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarketData(pub Vec<MarketRecord>);

#[serde_as]
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketRecord {
    #[serde_as(as = "serde_with::TimestampMilliSeconds<i64>")]
    pub start_timestamp: DateTime<Utc>,

    /// Gross consumer price.
    #[serde(rename = "consumerprice")]
    pub consumer_price: KilowattHourRate,
}

impl MarketData {
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn read_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).context("failed to read the market snapshot")?;
        let data: Self =
            serde_json::from_str(&contents).context("failed to parse the market snapshot")?;
        info!(n_records = data.0.len(), "loaded the market data");
        Ok(data)
    }

    /// Index the records by the start of the local hour.
    pub fn hourly<Tz: TimeZone>(&self, time_zone: &Tz) -> HourlyPrices {
        HourlyPrices(
            self.0
                .iter()
                .filter_map(|record| {
                    let start = record.start_timestamp.with_timezone(time_zone).naive_local();
                    Some((truncate_to_hour(start)?, record.consumer_price))
                })
                .collect(),
        )
    }
}

/// Market prices keyed by the local start of the hour.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HourlyPrices(pub BTreeMap<NaiveDateTime, KilowattHourRate>);

impl HourlyPrices {
    /// The same price applies to all four slots of an hour.
    pub fn price_at(&self, timestamp: NaiveDateTime) -> Option<KilowattHourRate> {
        self.0.get(&truncate_to_hour(timestamp)?).copied()
    }
}

fn truncate_to_hour(timestamp: NaiveDateTime) -> Option<NaiveDateTime> {
    timestamp.with_minute(0)?.with_second(0)?.with_nanosecond(0)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn test_price_is_constant_within_the_hour() -> Result {
        let data: MarketData = serde_json::from_str(
            r#"[
                {"start_timestamp": 1709294400000, "end_timestamp": 1709298000000, "consumerprice": 28.5},
                {"start_timestamp": 1709298000000, "end_timestamp": 1709301600000, "consumerprice": 31.0}
            ]"#,
        )?;
        let prices = data.hourly(&Utc);
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        for minute in [0, 15, 30, 45] {
            let timestamp = date.and_hms_opt(12, minute, 0).unwrap();
            assert_eq!(prices.price_at(timestamp), Some(KilowattHourRate::from(28.5)));
        }
        let next_hour = date.and_hms_opt(13, 0, 0).unwrap();
        assert_eq!(prices.price_at(next_hour), Some(KilowattHourRate::from(31.0)));
        assert_eq!(prices.price_at(date.and_hms_opt(14, 0, 0).unwrap()), None);
        Ok(())
    }
}
