use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use chrono::{NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};

use crate::{
    core::{heating::HeatingDemand, pv::PvOutput},
    prelude::*,
    quantity::{power::Watts, rate::KilowattHourRate},
};

/// Number of quarter-hour slots in a full day.
pub const SLOTS_PER_DAY: usize = 96;

/// Quarter-hour time of day, written as `HH:MM`.
#[derive(
    Copy,
    Clone,
    Debug,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    DeserializeFromStr,
    SerializeDisplay,
    derive_more::From,
    derive_more::Into,
)]
pub struct SlotTime(pub NaiveTime);

impl SlotTime {
    /// All 96 slots of a day, in order.
    pub fn iter_day() -> impl Iterator<Item = Self> {
        (0..SLOTS_PER_DAY as i64).map(|index| Self(NaiveTime::MIN + TimeDelta::minutes(15 * index)))
    }
}

impl Display for SlotTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

impl FromStr for SlotTime {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let time = NaiveTime::parse_from_str(s, "%H:%M")
            .with_context(|| format!("invalid slot time `{s}`"))?;
        ensure!(time.minute() % 15 == 0, "`{s}` is not on the quarter-hour grid");
        Ok(Self(time))
    }
}

/// Everything the battery simulation needs to know about one quarter-hour.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub timestamp: NaiveDateTime,
    pub outdoor_temperature: f64,
    pub pv: PvOutput,
    pub load: Watts,
    pub heating: HeatingDemand,
    pub market_price: KilowattHourRate,
}

impl Slot {
    /// Positive is surplus, negative is deficit.
    pub fn balance(&self) -> Watts {
        self.pv.power - self.load - self.heating.electric_power()
    }
}
