use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Observer location.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Degrees, north is positive.
    pub latitude: f64,

    /// Degrees, east is positive.
    pub longitude: f64,

    /// Offset of the local clock from UTC, hours.
    #[serde(default = "Location::default_utc_offset")]
    pub utc_offset: f64,
}

impl Location {
    const fn default_utc_offset() -> f64 {
        1.0
    }
}

/// Sun position in degrees.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SunPosition {
    pub elevation: f64,

    /// Compass azimuth: east is 90°, south is 180°.
    pub azimuth: f64,
}

impl SunPosition {
    pub const fn is_up(self) -> bool {
        self.elevation > 0.0
    }
}

/// Per-day solar geometry, computed once and queried for each slot of the day.
#[derive(Copy, Clone, Debug)]
pub struct SolarDay {
    location: Location,

    /// Declination, radians.
    declination: f64,

    /// Equation of time, hours.
    equation_of_time: f64,
}

impl SolarDay {
    pub fn new(location: Location, date: NaiveDate) -> Self {
        let days_in_year = if date.leap_year() { 366.0 } else { 365.0 };
        let day_angle = 360.0_f64.to_radians() * f64::from(date.ordinal0()) / days_in_year;
        let harmonic = |n: f64, phase: f64| (n * day_angle + phase.to_radians()).cos();

        let declination = (0.3948
            - 23.2559 * harmonic(1.0, 9.1)
            - 0.3915 * harmonic(2.0, 5.4)
            - 0.1764 * harmonic(3.0, 26.0))
        .to_radians();
        let equation_of_time_minutes = 0.0066
            + 7.3525 * harmonic(1.0, 85.9)
            + 9.9359 * harmonic(2.0, 108.9)
            + 0.3387 * harmonic(3.0, 105.2);

        Self { location, declination, equation_of_time: equation_of_time_minutes / 60.0 }
    }

    /// Sun position for the slot starting at the local `time`.
    ///
    /// The position is taken a quarter-hour earlier, matching how the irradiance samples
    /// are averaged over the preceding interval.
    pub fn position_at(&self, time: NaiveTime) -> SunPosition {
        let clock_hours = f64::from(time.hour()) + f64::from(time.minute()) / 60.0 - 0.25;
        let zone_meridian = 15.0 * self.location.utc_offset;
        let mean_solar_time = clock_hours + 4.0 * (self.location.longitude - zone_meridian) / 60.0;
        let true_solar_time = mean_solar_time + self.equation_of_time;
        let hour_angle = ((12.0 - true_solar_time) * 15.0).to_radians();

        let latitude = self.location.latitude.to_radians();
        let elevation = (hour_angle.cos() * latitude.cos() * self.declination.cos()
            + latitude.sin() * self.declination.sin())
        .asin();

        let cos_azimuth = ((self.declination.sin() - elevation.sin() * latitude.sin())
            / (elevation.cos() * latitude.cos()))
        .clamp(-1.0, 1.0);
        let azimuth = cos_azimuth.acos().to_degrees();
        let azimuth = if true_solar_time > 12.0 { 360.0 - azimuth } else { azimuth };

        SunPosition { elevation: elevation.to_degrees(), azimuth }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    const BERLIN: Location = Location { latitude: 52.52, longitude: 13.40, utc_offset: 1.0 };

    fn at(date: NaiveDate, hour: u32, minute: u32) -> SunPosition {
        SolarDay::new(BERLIN, date).position_at(NaiveTime::from_hms_opt(hour, minute, 0).unwrap())
    }

    #[test]
    fn test_summer_solstice_noon() {
        // Solar noon in Berlin is around 12:10 CET.
        let position = at(NaiveDate::from_ymd_opt(2024, 6, 21).unwrap(), 12, 25);
        assert_abs_diff_eq!(position.elevation, 90.0 - 52.52 + 23.44, epsilon = 1.0);
        assert_abs_diff_eq!(position.azimuth, 180.0, epsilon = 5.0);
    }

    #[test]
    fn test_winter_solstice_noon() {
        let position = at(NaiveDate::from_ymd_opt(2024, 12, 21).unwrap(), 12, 25);
        assert_abs_diff_eq!(position.elevation, 90.0 - 52.52 - 23.44, epsilon = 1.0);
    }

    #[test]
    fn test_night() {
        let position = at(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), 0, 0);
        assert!(!position.is_up());
    }

    #[test]
    fn test_morning_sun_is_in_the_east() {
        let position = at(NaiveDate::from_ymd_opt(2024, 6, 21).unwrap(), 7, 0);
        assert!(position.is_up());
        assert!(position.azimuth > 45.0 && position.azimuth < 135.0, "{position:?}");
    }
}
