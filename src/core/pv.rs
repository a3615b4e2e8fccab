use bon::bon;
use serde::{Deserialize, Serialize};

use crate::{
    api::weather::WeatherSample,
    core::solar::SunPosition,
    prelude::*,
    quantity::power::Watts,
};

/// How the modules are mounted, which drives how much they heat up under irradiance.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mounting {
    /// Pessimistic coefficient for setups that fit none of the others.
    Custom,
    FreeStanding,
    RoofWideGap,
    #[default]
    RoofGoodVentilation,
    RoofPoorVentilation,
    FacadeGoodVentilation,
    FacadePoorVentilation,
    RoofIntegratedUnventilated,
    FacadeIntegratedUnventilated,
}

impl Mounting {
    /// Ross coefficient, °C per kW/m².
    pub const fn ross_coefficient(self) -> f64 {
        match self {
            Self::Custom => 100.0,
            Self::FreeStanding => 22.0,
            Self::RoofWideGap => 28.0,
            Self::RoofGoodVentilation => 29.0,
            Self::RoofPoorVentilation => 32.0,
            Self::FacadeGoodVentilation => 35.0,
            Self::FacadePoorVentilation => 39.0,
            Self::RoofIntegratedUnventilated => 43.0,
            Self::FacadeIntegratedUnventilated => 55.0,
        }
    }
}

/// Which forecast irradiance drives the string.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IrradianceSource {
    /// Direct radiation on the horizontal plane, projected onto the module.
    #[default]
    DirectHorizontal,

    /// Direct normal irradiance, taken at the incidence angle.
    DirectNormal,
}

/// One independently oriented PV string.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PvString {
    /// Module efficiency at the nominal temperature, percent.
    pub efficiency: f64,

    /// Module area, m².
    pub area: f64,

    /// Tilt from the horizontal, degrees.
    pub tilt: f64,

    /// Deviation from south, degrees: east is negative, west is positive.
    pub azimuth: f64,

    /// Efficiency change per °C of module temperature, percent.
    pub temperature_coefficient: f64,

    /// Module temperature the efficiency is rated at, °C.
    #[serde(default = "PvString::default_nominal_temperature")]
    pub nominal_temperature: f64,

    #[serde(default)]
    pub mounting: Mounting,

    #[serde(default)]
    pub irradiance: IrradianceSource,
}

impl PvString {
    const fn default_nominal_temperature() -> f64 {
        25.0
    }

    /// Angle between the sun and the module normal, or `None` when the sun is down.
    pub fn incidence_angle(&self, sun: SunPosition) -> Option<f64> {
        if !sun.is_up() {
            return None;
        }
        let elevation = sun.elevation.to_radians();
        let tilt = self.tilt.to_radians();
        let cos_incidence = -elevation.cos()
            * tilt.sin()
            * (sun.azimuth.to_radians() - self.azimuth.to_radians()).cos()
            + elevation.sin() * tilt.cos();
        Some(cos_incidence.clamp(-1.0, 1.0).acos().to_degrees())
    }

    /// Module temperature, °C.
    pub fn module_temperature(&self, ambient_temperature: f64, irradiance: f64) -> f64 {
        ambient_temperature + self.mounting.ross_coefficient() * irradiance / 1000.0
    }

    /// Temperature-corrected efficiency as a fraction.
    pub fn current_efficiency(&self, ambient_temperature: f64, irradiance: f64) -> f64 {
        (self.efficiency
            + (self.module_temperature(ambient_temperature, irradiance) - self.nominal_temperature)
                * self.temperature_coefficient)
            / 100.0
    }

    pub fn power(&self, weather: &WeatherSample, sun: SunPosition) -> Watts {
        let Some(incidence_angle) = self.incidence_angle(sun) else {
            return Watts::ZERO;
        };
        // Sun behind the module plane:
        let cos_incidence = incidence_angle.to_radians().cos().max(0.0);
        match self.irradiance {
            IrradianceSource::DirectHorizontal => {
                let zenith = (90.0 - sun.elevation).to_radians();
                let on_module =
                    weather.direct_irradiance * cos_incidence / zenith.sin().max(0.087);
                let efficiency = self
                    .current_efficiency(weather.temperature, weather.direct_irradiance)
                    .max(0.0);
                Watts::from((on_module * efficiency * self.area).abs())
            }
            IrradianceSource::DirectNormal => {
                let on_module = weather.direct_normal_irradiance * cos_incidence;
                let efficiency = self.current_efficiency(weather.temperature, on_module).max(0.0);
                Watts::from(on_module * efficiency * self.area)
            }
        }
    }
}

/// PV output of all strings after the converter limit.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PvOutput {
    /// Power delivered through the converter.
    pub power: Watts,

    /// Generation above the converter limit.
    pub overload: Watts,
}

/// Up to four strings behind one converter.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PvArray {
    strings: Vec<PvString>,
    converter_max_power: Watts,
}

#[bon]
impl PvArray {
    #[builder]
    pub fn new(strings: Vec<PvString>, converter_max_power: Watts) -> Result<Self> {
        ensure!(!strings.is_empty(), "at least one PV string is required");
        ensure!(
            strings.len() <= Self::MAX_STRINGS,
            "at most {} PV strings are supported, got {}",
            Self::MAX_STRINGS,
            strings.len(),
        );
        ensure!(
            converter_max_power.is_finite() && converter_max_power > Watts::ZERO,
            "invalid converter maximum power: {converter_max_power}",
        );
        Ok(Self { strings, converter_max_power })
    }
}

impl PvArray {
    pub const MAX_STRINGS: usize = 4;

    pub fn output(&self, weather: &WeatherSample, sun: SunPosition) -> PvOutput {
        let total: Watts = self.strings.iter().map(|string| string.power(weather, sun)).sum();
        clip(total, self.converter_max_power)
    }
}

/// Split the generated power at the converter limit.
pub fn clip(total: Watts, converter_max_power: Watts) -> PvOutput {
    let power = total.min(converter_max_power);
    PvOutput { power, overload: total - power }
}
