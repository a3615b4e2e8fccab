use std::{
    fmt::{Display, Formatter},
    ops::{Div, Mul},
};

use crate::quantity::{
    Quantity,
    cost::Cost,
    power::Watts,
    rate::KilowattHourRate,
    time::Hours,
};

pub type WattHours = Quantity<1, 1, 0>;

impl WattHours {
    pub const fn to_kilowatt_hours(self) -> f64 {
        self.0 / 1000.0
    }
}

impl Display for WattHours {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.0.abs() >= 10_000.0 {
            write!(f, "{:.1} kWh", self.to_kilowatt_hours())
        } else {
            write!(f, "{:.0} Wh", self.0)
        }
    }
}

impl Mul<KilowattHourRate> for WattHours {
    type Output = Cost;

    fn mul(self, rhs: KilowattHourRate) -> Self::Output {
        Quantity(self.to_kilowatt_hours() * rhs.0)
    }
}

impl Div<Hours> for WattHours {
    type Output = Watts;

    fn div(self, rhs: Hours) -> Self::Output {
        Quantity(self.0 / rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_cost() {
        let cost = WattHours::from(250.0) * KilowattHourRate::from(30.0);
        assert_abs_diff_eq!(cost.0, 7.5);
    }

    #[test]
    fn test_display() {
        assert_eq!(WattHours::from(250.0).to_string(), "250 Wh");
        assert_eq!(WattHours::from(12_340.0).to_string(), "12.3 kWh");
    }
}
