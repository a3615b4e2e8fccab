use bon::bon;
use serde::{Deserialize, Serialize};

use crate::{
    prelude::*,
    quantity::{energy::WattHours, percent::Percent, power::Watts},
};

#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BatteryParameters {
    pub capacity: WattHours,

    /// Lowest allowed state of charge.
    pub min_state_of_charge: Percent,

    pub max_charge_power: Watts,

    /// Charging efficiency, `0..=1`.
    pub load_efficiency: f64,

    /// Efficiency of the converter on the discharge path, `0..=1`.
    pub converter_efficiency: f64,
}

#[bon]
impl BatteryParameters {
    #[builder]
    pub fn new(
        capacity: WattHours,
        max_depth_of_discharge: Percent,
        max_charge_power: Watts,
        load_efficiency: f64,
        converter_efficiency: f64,
    ) -> Result<Self> {
        if !capacity.is_finite() || capacity <= WattHours::ZERO {
            bail!("invalid battery capacity: {capacity}");
        }
        if !max_depth_of_discharge.is_finite()
            || max_depth_of_discharge < Percent::ZERO
            || max_depth_of_discharge > Percent::FULL
        {
            bail!("invalid maximum depth of discharge: {max_depth_of_discharge}");
        }
        if !max_charge_power.is_finite() || max_charge_power < Watts::ZERO {
            bail!("invalid maximum charge power: {max_charge_power}");
        }
        if !(load_efficiency > 0.0 && load_efficiency <= 1.0) {
            bail!("invalid load efficiency: {load_efficiency}");
        }
        if !(converter_efficiency > 0.0 && converter_efficiency <= 1.0) {
            bail!("invalid converter efficiency: {converter_efficiency}");
        }
        Ok(Self {
            capacity,
            min_state_of_charge: Percent::FULL - max_depth_of_discharge,
            max_charge_power,
            load_efficiency,
            converter_efficiency,
        })
    }
}
