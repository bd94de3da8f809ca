//! # Analytic Sun and Moon ephemerides
//!
//! Low-precision positions of the Sun and the Moon in the J2000 inertial
//! frame, from truncated analytic series (Montenbruck & Gill style). The
//! series are evaluated on the ecliptic of date and rotated back to J2000
//! through the obliquity and precession models of
//! [`crate::earth_orientation`].
//!
//! ## Accuracy bound
//!
//! - Sun: about 0.01° (sub-arc-minute) in direction, ~1e-4 in distance.
//! - Moon: a few arc-minutes in direction, a few hundred km in distance.
//!
//! This is sufficient for third-body perturbations and lighting/shadow
//! geometry, where the induced error is far below the force-model truncation;
//! it is **not** a precision ephemeris and must not be used as one.

use nalgebra::Vector3;

use crate::{
    constants::{Meter, DPI, RADEG, T2000},
    earth_orientation::{obleq, precession_matrix},
    ref_system::rotmt,
    time::Epoch,
};

/// Julian centuries of TDT since J2000.
fn centuries(epoch: &Epoch) -> f64 {
    (epoch.mjd_tdt() - T2000) / 36525.0
}

/// Ecliptic-of-date longitude/latitude/distance → J2000 equatorial vector.
fn ecliptic_to_j2000(epoch: &Epoch, lon: f64, lat: f64, distance: Meter) -> Vector3<f64> {
    let r_ecl = Vector3::new(
        distance * lat.cos() * lon.cos(),
        distance * lat.cos() * lon.sin(),
        distance * lat.sin(),
    );

    // Ecliptic → equatorial of date, then mean-of-date → J2000
    let tjm = epoch.mjd_tdt();
    let r_equ = rotmt(obleq(tjm), 0) * r_ecl;
    precession_matrix(tjm).transpose() * r_equ
}

/// Position of the Sun in the J2000 frame (meters, geocentric).
///
/// Truncated solar theory: mean anomaly plus the two leading terms of the
/// equation of center. See the module-level accuracy bound.
pub fn solar_position_j2000(epoch: &Epoch) -> Vector3<f64> {
    let t = centuries(epoch);

    // Mean anomaly and ecliptic longitude of perigee + mean anomaly
    let mean_anomaly = principal(RADEG * (357.5256 + 35_999.049 * t));

    let lon = principal(
        RADEG * 282.9400
            + mean_anomaly
            + RADEG * (6892.0 / 3600.0) * mean_anomaly.sin()
            + RADEG * (72.0 / 3600.0) * (2.0 * mean_anomaly).sin(),
    );

    let distance = (149.619 - 2.499 * mean_anomaly.cos() - 0.021 * (2.0 * mean_anomaly).cos())
        * 1.0e9;

    ecliptic_to_j2000(epoch, lon, 0.0, distance)
}

/// Position of the Moon in the J2000 frame (meters, geocentric).
///
/// Truncated lunar theory with the dominant evection, variation, annual and
/// parallactic terms. See the module-level accuracy bound.
pub fn lunar_position_j2000(epoch: &Epoch) -> Vector3<f64> {
    let t = centuries(epoch);

    // Fundamental arguments (degrees)
    let l0 = 218.31617 + 481_267.88088 * t; // mean longitude
    let l = RADEG * (134.96292 + 477_198.86753 * t); // Moon mean anomaly
    let lp = RADEG * (357.52543 + 35_999.04944 * t); // Sun mean anomaly
    let f = RADEG * (93.27283 + 483_202.01873 * t); // argument of latitude
    let d = RADEG * (297.85027 + 445_267.11135 * t); // mean elongation

    // Longitude correction, arcseconds
    let dl = 22640.0 * l.sin() - 4586.0 * (l - 2.0 * d).sin() + 2370.0 * (2.0 * d).sin()
        + 769.0 * (2.0 * l).sin()
        - 668.0 * lp.sin()
        - 412.0 * (2.0 * f).sin()
        - 212.0 * (2.0 * l - 2.0 * d).sin()
        - 206.0 * (l + lp - 2.0 * d).sin()
        + 192.0 * (l + 2.0 * d).sin()
        - 165.0 * (lp - 2.0 * d).sin()
        - 125.0 * d.sin()
        - 110.0 * (l + lp).sin()
        + 148.0 * (l - lp).sin()
        - 55.0 * (2.0 * f - 2.0 * d).sin();

    let lon = principal(RADEG * (l0 + dl / 3600.0));

    // Latitude, arcseconds
    let s = f + RADEG * (dl + 412.0 * (2.0 * f).sin() + 541.0 * lp.sin()) / 3600.0;
    let h = f - 2.0 * d;
    let n = -526.0 * h.sin() + 44.0 * (l + h).sin() - 31.0 * (h - l).sin()
        - 23.0 * (lp + h).sin()
        + 11.0 * (h - lp).sin()
        - 25.0 * (f - 2.0 * l).sin()
        + 21.0 * (f - l).sin();
    let lat = RADEG * (18_520.0 * s.sin() + n) / 3600.0;

    // Distance, kilometers
    let distance = (385_000.0 - 20_905.0 * l.cos() - 3_699.0 * (2.0 * d - l).cos()
        - 2_956.0 * (2.0 * d).cos()
        - 570.0 * (2.0 * l).cos()
        + 246.0 * (2.0 * l - 2.0 * d).cos()
        - 205.0 * (lp - 2.0 * d).cos()
        - 171.0 * (l + 2.0 * d).cos()
        - 152.0 * (l + lp - 2.0 * d).cos())
        * 1.0e3;

    ecliptic_to_j2000(epoch, lon, lat, distance)
}

/// Principal value of an angle in [0, 2π).
fn principal(a: f64) -> f64 {
    a.rem_euclid(DPI)
}

#[cfg(test)]
mod ephemeris_test {
    use super::*;
    use crate::constants::AU;
    use crate::time::CivilDate;

    #[test]
    fn test_sun_distance_annual_range() {
        // Perihelion ~0.983 AU (early January), aphelion ~1.017 AU (July)
        let jan = Epoch::from_utc(&CivilDate::new(2030, 1, 4, 0, 0, 0.0));
        let jul = Epoch::from_utc(&CivilDate::new(2030, 7, 5, 0, 0, 0.0));

        let d_jan = solar_position_j2000(&jan).norm() / AU;
        let d_jul = solar_position_j2000(&jul).norm() / AU;

        assert!((d_jan - 0.983).abs() < 0.003, "january distance {d_jan}");
        assert!((d_jul - 1.017).abs() < 0.003, "july distance {d_jul}");
    }

    #[test]
    fn test_sun_near_vernal_equinox() {
        // Around March 20 the Sun sits close to the vernal equinox direction
        let epoch = Epoch::from_utc(&CivilDate::new(2030, 3, 20, 12, 0, 0.0));
        let sun = solar_position_j2000(&epoch).normalize();
        assert!(sun.x > 0.999, "sun direction {sun:?}");
        assert!(sun.y.abs() < 0.05);
        assert!(sun.z.abs() < 0.02);
    }

    #[test]
    fn test_sun_summer_solstice_declination() {
        // At the June solstice the Sun stands near +23.44° declination
        let epoch = Epoch::from_utc(&CivilDate::new(2030, 6, 21, 12, 0, 0.0));
        let sun = solar_position_j2000(&epoch).normalize();
        let dec = sun.z.asin() / RADEG;
        assert!((dec - 23.44).abs() < 0.1, "declination {dec}");
    }

    #[test]
    fn test_moon_distance_range() {
        // Lunar distance oscillates between roughly 356e6 and 407e6 meters
        for day in 0..30 {
            let epoch = Epoch::from_mjd_tdt(62502.0 + day as f64);
            let d = lunar_position_j2000(&epoch).norm();
            assert!(
                (3.50e8..4.10e8).contains(&d),
                "day {day}: lunar distance {d}"
            );
        }
    }

    #[test]
    fn test_moon_stays_near_ecliptic() {
        // Lunar ecliptic latitude never exceeds ~5.3°; in equatorial
        // coordinates the declination stays below ~29°.
        for day in 0..30 {
            let epoch = Epoch::from_mjd_tdt(62502.0 + day as f64);
            let moon = lunar_position_j2000(&epoch).normalize();
            let dec = moon.z.asin() / RADEG;
            assert!(dec.abs() < 29.5, "day {day}: declination {dec}");
        }
    }

    #[test]
    fn test_moon_period() {
        // After one sidereal month (27.32 d) the direction nearly repeats
        let e0 = Epoch::from_mjd_tdt(62502.0);
        let e1 = Epoch::from_mjd_tdt(62502.0 + 27.321_661);
        let m0 = lunar_position_j2000(&e0).normalize();
        let m1 = lunar_position_j2000(&e1).normalize();
        let separation = m0.dot(&m1).clamp(-1.0, 1.0).acos() / RADEG;
        assert!(separation < 4.0, "separation {separation} deg");
    }
}
