use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::{
    core::ledger::{DailyLedger, LedgerEntry},
    quantity::{cost::Cost, percent::Percent, power::Watts, time::Hours},
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Fuel {
    /// Priced per kWh of gas.
    Gas,

    /// Priced per litre.
    Oil,
}

impl Fuel {
    /// kWh per kg of heating oil.
    const OIL_ENERGY_DENSITY: f64 = 11.8;

    /// kg per litre of heating oil.
    const OIL_DENSITY: f64 = 0.85;

    /// Fuel units burned to deliver `heat_kwh` at the given heater efficiency.
    pub fn units_for(self, heat_kwh: f64, efficiency: Percent) -> f64 {
        let required_kwh = heat_kwh / (efficiency.0 / 100.0);
        match self {
            Self::Gas => required_kwh,
            Self::Oil => required_kwh / Self::OIL_ENERGY_DENSITY / Self::OIL_DENSITY,
        }
    }
}

/// The fossil-fuel alternative to heating with the heat pump.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Heater {
    pub fuel: Fuel,
    pub efficiency: Percent,

    /// Price per fuel unit.
    pub price: Cost,
}

impl Heater {
    /// Cost of covering the heating power for one slot.
    pub fn slot_cost(&self, heating_power: Watts) -> Cost {
        let heat = heating_power * Hours::QUARTER;
        self.price * self.fuel.units_for(heat.to_kilowatt_hours(), self.efficiency)
    }
}

/// Multipliers applied to the market price for self-produced energy.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tariffs {
    /// Share of the market price a PV surplus is worth.
    pub pv_cost_factor: f64,

    /// Share of the market price charged for energy taken from the battery.
    pub battery_cost_factor: f64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[repr(u8)]
pub enum DayOption {
    /// Burning fuel is cheaper: keep the battery charge.
    Heater = 1,

    /// Heat with PV and battery.
    Battery = 2,
}

impl Display for DayOption {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Heater => write!(f, "1 heater"),
            Self::Battery => write!(f, "2 battery"),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DayCost {
    /// Heating with electricity from the grid, PV and battery.
    pub electric: Cost,

    /// Heating with the fossil heater.
    pub fossil: Cost,
}

impl DayCost {
    pub fn option(&self) -> DayOption {
        if self.fossil < self.electric { DayOption::Heater } else { DayOption::Battery }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, bon::Builder)]
pub struct CostEvaluator {
    tariffs: Tariffs,
    heater: Heater,
}

impl CostEvaluator {
    /// Electricity cost of one slot's heating.
    ///
    /// Slots without heating demand cost nothing on either side of the comparison.
    pub fn electric_cost(&self, entry: &LedgerEntry) -> Cost {
        if entry.heating_power <= Watts::ZERO {
            return Cost::ZERO;
        }
        let difference = entry.difference_power.abs() * Hours::QUARTER;
        if entry.difference_power < Watts::ZERO {
            difference * entry.market_price
        } else if entry.difference_power > Watts::ZERO {
            difference * entry.market_price * self.tariffs.pv_cost_factor
        } else {
            entry.battery_power * Hours::QUARTER * entry.market_price
                * self.tariffs.battery_cost_factor
        }
    }

    pub fn fossil_cost(&self, entry: &LedgerEntry) -> Cost {
        self.heater.slot_cost(entry.heating_power)
    }

    pub fn evaluate(&self, ledger: &DailyLedger) -> DayCost {
        DayCost {
            electric: ledger.entries().iter().map(|entry| self.electric_cost(entry)).sum(),
            fossil: ledger.entries().iter().map(|entry| self.fossil_cost(entry)).sum(),
        }
    }
}
