use chrono::{NaiveDate, NaiveDateTime};

use crate::quantity::{energy::WattHours, power::Watts, time::Hours};

pub type Point<K, V> = (K, V);
pub type Series<K, V> = Vec<Point<K, V>>;

impl<T> IntegrateSlots for T where T: ?Sized {}

pub trait IntegrateSlots {
    /// Energy of a quarter-hour power series.
    fn integrate_slots<K>(self) -> WattHours
    where
        Self: Iterator<Item = (K, Watts)> + Sized,
    {
        self.map(|(_, power)| power * Hours::QUARTER).sum()
    }
}

impl<T> SliceDay for T where T: ?Sized {}

pub trait SliceDay {
    /// Points of the series that fall on the given day.
    fn on_day<'a, V: 'a>(
        &'a self,
        date: NaiveDate,
    ) -> impl Iterator<Item = &'a Point<NaiveDateTime, V>>
    where
        Self: AsRef<[Point<NaiveDateTime, V>]>,
    {
        self.as_ref().iter().filter(move |(timestamp, _)| timestamp.date() == date)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use super::*;

    #[test]
    fn test_integrate_slots() {
        let energy =
            [((), Watts::from(1000.0)), ((), Watts::from(3000.0))].into_iter().integrate_slots();
        assert_abs_diff_eq!(energy.0, 1000.0);
    }

    #[test]
    fn test_on_day() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let series: Series<_, _> = vec![
            (day.and_hms_opt(23, 45, 0).unwrap(), 1),
            (day.succ_opt().unwrap().and_hms_opt(0, 0, 0).unwrap(), 2),
        ];
        assert_eq!(series.on_day(day).map(|(_, value)| *value).collect::<Vec<_>>(), vec![1]);
    }
}
