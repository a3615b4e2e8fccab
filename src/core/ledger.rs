use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    core::slot::SLOTS_PER_DAY,
    quantity::{power::Watts, rate::KilowattHourRate},
};

/// Per-slot figures the daily cost comparison needs.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub difference_power: Watts,
    pub heating_power: Watts,
    pub market_price: KilowattHourRate,

    /// Average power in or out of the battery over the slot.
    pub battery_power: Watts,
}

/// One day of ledger entries, one per processed slot.
#[derive(Clone, Debug, PartialEq)]
pub struct DailyLedger {
    pub date: NaiveDate,
    entries: Vec<LedgerEntry>,
}

impl DailyLedger {
    pub fn new(date: NaiveDate) -> Self {
        Self { date, entries: Vec::with_capacity(SLOTS_PER_DAY) }
    }

    pub fn push(&mut self, entry: LedgerEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    pub const fn is_complete(&self) -> bool {
        self.entries.len() == SLOTS_PER_DAY
    }
}
