use std::{
    fmt::{Display, Formatter},
    ops::Mul,
};

use crate::quantity::{Quantity, energy::WattHours};

/// State of charge and other shares, `0..=100`.
pub type Percent = Quantity<0, 0, 0>;

impl Percent {
    pub const FULL: Self = Self(100.0);
}

impl Display for Percent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}%", self.0)
    }
}

impl Mul<WattHours> for Percent {
    type Output = WattHours;

    fn mul(self, rhs: WattHours) -> Self::Output {
        rhs * (self.0 / 100.0)
    }
}
