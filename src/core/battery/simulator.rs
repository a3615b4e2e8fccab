use serde::{Deserialize, Serialize};

use crate::{
    core::battery::BatteryParameters,
    quantity::{energy::WattHours, percent::Percent, power::Watts, time::Hours},
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum BatteryMode {
    Charging,
    Discharging,

    /// Deficit, but the battery is already at the minimum state of charge.
    IdleAtFloor,

    /// Surplus, but the battery is already full.
    IdleAtCeiling,

    /// Exactly balanced.
    Idle,
}

/// Outcome of a single slot.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// What is left for the grid: positive is surplus, negative is deficit.
    ///
    /// A deficit covered by the battery does not show up here.
    pub difference_power: Watts,

    /// Energy actually moved in or out of the battery.
    pub battery_energy: WattHours,

    /// State of charge after the slot.
    pub state_of_charge: Percent,

    pub mode: BatteryMode,
}

/// Quarter-hour battery state-of-charge model.
#[derive(Copy, Clone, Debug)]
pub struct Simulator {
    parameters: BatteryParameters,
    state_of_charge: Percent,
}

impl Simulator {
    pub fn new(parameters: BatteryParameters, initial_state_of_charge: Percent) -> Self {
        Self {
            parameters,
            state_of_charge: initial_state_of_charge
                .clamp(parameters.min_state_of_charge, Percent::FULL),
        }
    }

    pub const fn state_of_charge(&self) -> Percent {
        self.state_of_charge
    }

    /// Advance the battery by one slot.
    ///
    /// `balance` is the household surplus (positive) or deficit (negative), and `overload`
    /// is the PV power clipped by the converter, which goes to the battery without losses.
    pub fn apply(&mut self, balance: Watts, overload: Watts) -> Step {
        let parameters = &self.parameters;
        let difference = balance.min(parameters.max_charge_power);
        let energy = difference * Hours::QUARTER;

        let mut netto = if energy < WattHours::ZERO {
            energy / parameters.converter_efficiency
        } else {
            energy.min(parameters.max_charge_power * Hours::QUARTER) * parameters.load_efficiency
        };
        netto += overload * Hours::QUARTER;

        let previous = self.state_of_charge;
        self.state_of_charge = (previous + Percent::from(netto / parameters.capacity * 100.0))
            .clamp(parameters.min_state_of_charge, Percent::FULL);

        let mode = if self.state_of_charge > previous {
            BatteryMode::Charging
        } else if self.state_of_charge < previous {
            BatteryMode::Discharging
        } else if netto < WattHours::ZERO {
            BatteryMode::IdleAtFloor
        } else if netto > WattHours::ZERO {
            BatteryMode::IdleAtCeiling
        } else {
            BatteryMode::Idle
        };

        Step {
            difference_power: if mode == BatteryMode::Discharging {
                difference + difference.abs()
            } else {
                difference
            },
            battery_energy: (self.state_of_charge - previous).abs() * parameters.capacity,
            state_of_charge: self.state_of_charge,
            mode,
        }
    }
}
