use std::fmt::{Display, Formatter};

use crate::quantity::Quantity;

/// Cent per kilowatt-hour.
pub type KilowattHourRate = Quantity<-1, -1, 1>;

impl Display for KilowattHourRate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2} ct/kWh", self.0)
    }
}
