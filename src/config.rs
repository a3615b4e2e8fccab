use std::{fmt::Debug, fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    core::{
        aligner::Strictness,
        battery::BatteryParameters,
        cost::{CostEvaluator, Fuel, Heater, Tariffs},
        heating::{Building, CopModel, Surface, Wall},
        pv::{IrradianceSource, Mounting, PvArray, PvString},
        solar::Location,
    },
    prelude::*,
    quantity::{
        cost::Cost,
        energy::WattHours,
        percent::Percent,
        power::Watts,
        rate::KilowattHourRate,
    },
};

/// Installation settings, read from a TOML file.
///
/// Every section is optional and falls back to its default.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub location: Location,
    pub battery: BatteryConfig,
    pub converter: ConverterConfig,

    #[serde(rename = "pv")]
    pub pv_strings: Vec<PvString>,

    pub building: BuildingConfig,
    pub heater: Heater,
    pub tariffs: Tariffs,
    pub market: MarketConfig,
    pub alignment: AlignmentConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            location: Location { latitude: 52.52, longitude: 13.40, utc_offset: 1.0 },
            battery: BatteryConfig::default(),
            converter: ConverterConfig::default(),
            pv_strings: vec![PvString {
                efficiency: 20.0,
                area: 4.0,
                tilt: 30.0,
                azimuth: 0.0,
                temperature_coefficient: -0.4,
                nominal_temperature: 25.0,
                mounting: Mounting::default(),
                irradiance: IrradianceSource::default(),
            }],
            building: BuildingConfig::default(),
            heater: Heater {
                fuel: Fuel::Gas,
                efficiency: Percent::from(90.0),
                price: Cost::from(12.0),
            },
            tariffs: Tariffs { pv_cost_factor: 0.3, battery_cost_factor: 0.5 },
            market: MarketConfig::default(),
            alignment: AlignmentConfig::default(),
        }
    }
}

impl Config {
    #[instrument(name = "reading the configuration…")]
    pub fn read_from<P: AsRef<Path> + Debug>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            warn!(?path, "no configuration file, using the defaults");
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read `{}`", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("failed to parse `{}`", path.display()))
    }

    pub fn battery_parameters(&self) -> Result<BatteryParameters> {
        BatteryParameters::builder()
            .capacity(self.battery.capacity)
            .max_depth_of_discharge(self.battery.max_depth_of_discharge)
            .max_charge_power(self.battery.max_charge_power)
            .load_efficiency(self.battery.load_efficiency)
            .converter_efficiency(self.battery.converter_efficiency)
            .build()
            .context("invalid battery configuration")
    }

    pub fn pv_array(&self) -> Result<PvArray> {
        PvArray::builder()
            .strings(self.pv_strings.clone())
            .converter_max_power(self.converter.max_power)
            .build()
            .context("invalid PV configuration")
    }

    pub fn building(&self) -> Result<Building> {
        Building::builder()
            .indoor_temperature(self.building.indoor_temperature)
            .walls(self.building.walls.clone())
            .maybe_floor(self.building.floor)
            .maybe_ceiling(self.building.ceiling)
            .cop(self.building.cop)
            .build()
            .context("invalid building configuration")
    }

    pub fn cost_evaluator(&self) -> CostEvaluator {
        CostEvaluator::builder().tariffs(self.tariffs).heater(self.heater).build()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatteryConfig {
    pub capacity: WattHours,
    pub max_depth_of_discharge: Percent,
    pub max_charge_power: Watts,
    pub load_efficiency: f64,
    pub converter_efficiency: f64,

    /// Used when there is no usable checkpoint.
    pub initial_state_of_charge: Percent,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            capacity: WattHours::from(5000.0),
            max_depth_of_discharge: Percent::from(80.0),
            max_charge_power: Watts::from(1000.0),
            load_efficiency: 0.9,
            converter_efficiency: 0.95,
            initial_state_of_charge: Percent::from(50.0),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    pub max_power: Watts,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self { max_power: Watts::from(800.0) }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildingConfig {
    pub indoor_temperature: f64,
    pub walls: Vec<Wall>,
    pub floor: Option<Surface>,
    pub ceiling: Option<Surface>,
    pub cop: CopModel,
}

impl Default for BuildingConfig {
    fn default() -> Self {
        Self {
            indoor_temperature: 20.0,
            walls: Vec::new(),
            floor: None,
            ceiling: None,
            cop: CopModel::default(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// Consumer price for slots the market data does not cover.
    pub fallback_price: KilowattHourRate,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self { fallback_price: KilowattHourRate::from(30.0) }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentConfig {
    pub strictness: Strictness,
}
