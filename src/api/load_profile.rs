use std::{
    collections::BTreeMap,
    fmt::{Display, Formatter},
    fs,
    path::Path,
    str::FromStr,
};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};

use crate::{
    core::slot::SlotTime,
    prelude::*,
    quantity::power::Watts,
};

/// Calendar day without a year, written as `dd-mm`.
#[derive(
    Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, DeserializeFromStr, SerializeDisplay,
)]
pub struct MonthDay {
    pub month: u32,
    pub day: u32,
}

impl From<NaiveDate> for MonthDay {
    fn from(date: NaiveDate) -> Self {
        Self { month: date.month(), day: date.day() }
    }
}

impl Display for MonthDay {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}-{:02}", self.day, self.month)
    }
}

impl FromStr for MonthDay {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (day, month) = s.split_once('-').with_context(|| format!("invalid day `{s}`"))?;
        let day = day.parse().with_context(|| format!("invalid day of month in `{s}`"))?;
        let month = month.parse().with_context(|| format!("invalid month in `{s}`"))?;
        // 2024 is a leap year, so this also accepts the 29th of February:
        ensure!(NaiveDate::from_ymd_opt(2024, month, day).is_some(), "`{s}` is not a calendar day");
        Ok(Self { month, day })
    }
}

/// Household electrical load by calendar day and time of day.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoadProfile(pub BTreeMap<MonthDay, BTreeMap<SlotTime, Watts>>);

impl LoadProfile {
    /// All-zero profile covering every day of a leap year.
    #[must_use]
    pub fn zero() -> Self {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
        Self(
            start
                .iter_days()
                .take_while(|date| date.year() == 2024)
                .map(|date| {
                    let day = SlotTime::iter_day().map(|time| (time, Watts::ZERO)).collect();
                    (MonthDay::from(date), day)
                })
                .collect(),
        )
    }

    /// Load the profile snapshot, falling back to the all-zero profile.
    #[instrument(skip_all)]
    pub fn read_from(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            info!("no load profile configured, assuming zero load");
            return Self::zero();
        };
        Self::read_fallibly_from(path).unwrap_or_else(|error| {
            error!(path = %path.display(), "failed to load the load profile: {error:#}");
            Self::zero()
        })
    }

    fn read_fallibly_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let profile: Self = serde_json::from_str(&contents)?;
        info!(path = %path.display(), n_days = profile.0.len(), "loaded the load profile");
        Ok(profile)
    }

    pub fn contains_day(&self, date: NaiveDate) -> bool {
        self.0.contains_key(&MonthDay::from(date))
    }

    pub fn power_at(&self, date: NaiveDate, time: SlotTime) -> Option<Watts> {
        self.0.get(&MonthDay::from(date))?.get(&time).copied()
    }
}
