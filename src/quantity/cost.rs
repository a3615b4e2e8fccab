use std::fmt::{Display, Formatter};

use crate::quantity::Quantity;

/// Money in cents.
pub type Cost = Quantity<0, 0, 1>;

impl Cost {
    /// Round the cost to hundredths of a cent.
    #[must_use]
    pub fn round_to_hundredths(self) -> Self {
        Self((self.0 * 100.0).round() / 100.0)
    }
}

impl Display for Cost {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2} ct", self.0)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_round_to_hundredths() {
        assert_abs_diff_eq!(Cost::from(1.236).round_to_hundredths().0, 1.24);
    }
}
