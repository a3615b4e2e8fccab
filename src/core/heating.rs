use bon::bon;
use serde::{Deserialize, Serialize};

use crate::{prelude::*, quantity::power::Watts};

/// Heating need of one slot.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HeatingDemand {
    /// Thermal power the building loses.
    pub power: Watts,

    /// Heat pump coefficient of performance at the slot temperature.
    pub cop: f64,
}

impl HeatingDemand {
    /// Electrical power the heat pump draws to cover the demand.
    pub fn electric_power(&self) -> Watts {
        self.power / self.cop
    }
}

/// Source of the per-slot heating demand.
pub trait HeatingModel {
    fn demand(&self, outdoor_temperature: f64) -> HeatingDemand;
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    North,
    East,
    South,
    West,
}

/// What the other side of a surface is.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Exposure {
    /// Outside air: the difference follows the outdoor temperature.
    #[default]
    Outdoor,

    /// Ground or an unheated space kept at a fixed difference to the interior.
    Fixed { temperature_difference: f64 },
}

impl Exposure {
    pub fn temperature_difference(self, indoor: f64, outdoor: f64) -> f64 {
        match self {
            Self::Outdoor => (indoor - outdoor).max(0.0),
            Self::Fixed { temperature_difference } => temperature_difference,
        }
    }
}

/// Window or door.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Opening {
    /// m².
    pub area: f64,

    /// W/(m²·K).
    pub u_value: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Wall {
    pub orientation: Orientation,

    /// Gross area including the openings, m².
    pub area: f64,

    /// W/(m²·K).
    pub u_value: f64,

    #[serde(default)]
    pub exposure: Exposure,

    #[serde(default)]
    pub windows: Vec<Opening>,

    #[serde(default)]
    pub door: Option<Opening>,
}

impl Wall {
    fn openings(&self) -> impl Iterator<Item = &Opening> {
        self.windows.iter().chain(self.door.as_ref())
    }

    pub fn net_area(&self) -> f64 {
        self.area - self.openings().map(|opening| opening.area).sum::<f64>()
    }

    /// Heat loss per kelvin, W/K.
    pub fn conductance(&self) -> f64 {
        self.net_area() * self.u_value
            + self.openings().map(|opening| opening.area * opening.u_value).sum::<f64>()
    }
}

/// Floor or ceiling.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    pub area: f64,
    pub u_value: f64,

    #[serde(default)]
    pub exposure: Exposure,
}

/// Heat pump COP as a linear function of the outdoor temperature.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CopModel {
    /// COP at 7 °C outdoors.
    pub nominal: f64,

    /// COP change per °C.
    #[serde(default)]
    pub slope: f64,
}

impl CopModel {
    const RATING_TEMPERATURE: f64 = 7.0;

    pub fn at(self, outdoor_temperature: f64) -> f64 {
        (self.nominal + self.slope * (outdoor_temperature - Self::RATING_TEMPERATURE)).max(1.0)
    }
}

impl Default for CopModel {
    fn default() -> Self {
        Self { nominal: 3.0, slope: 0.0 }
    }
}

/// Steady-state transmission loss model of the heated envelope.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Building {
    indoor_temperature: f64,
    walls: Vec<Wall>,
    floor: Option<Surface>,
    ceiling: Option<Surface>,
    cop: CopModel,
}

#[bon]
impl Building {
    #[builder]
    pub fn new(
        indoor_temperature: f64,
        walls: Vec<Wall>,
        floor: Option<Surface>,
        ceiling: Option<Surface>,
        #[builder(default)] cop: CopModel,
    ) -> Result<Self> {
        ensure!(indoor_temperature.is_finite(), "invalid indoor temperature: {indoor_temperature}");
        for wall in &walls {
            ensure!(
                wall.net_area() >= 0.0,
                "{:?} wall openings exceed its area of {} m²",
                wall.orientation,
                wall.area,
            );
        }
        ensure!(cop.nominal.is_finite() && cop.nominal > 0.0, "invalid COP: {}", cop.nominal);
        Ok(Self { indoor_temperature, walls, floor, ceiling, cop })
    }
}

impl Building {
    /// Transmission loss, W.
    pub fn heating_power(&self, outdoor_temperature: f64) -> Watts {
        let difference = |exposure: Exposure| {
            exposure.temperature_difference(self.indoor_temperature, outdoor_temperature)
        };
        let walls: f64 =
            self.walls.iter().map(|wall| wall.conductance() * difference(wall.exposure)).sum();
        let surfaces: f64 = [self.floor, self.ceiling]
            .into_iter()
            .flatten()
            .map(|surface| surface.area * surface.u_value * difference(surface.exposure))
            .sum();
        Watts::from((walls + surfaces).max(0.0))
    }
}

impl HeatingModel for Building {
    fn demand(&self, outdoor_temperature: f64) -> HeatingDemand {
        HeatingDemand {
            power: self.heating_power(outdoor_temperature),
            cop: self.cop.at(outdoor_temperature),
        }
    }
}
