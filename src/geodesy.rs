//! # Geodetic conversions
//!
//! Between Cartesian coordinates (WGS84 Earth-fixed or J2000 inertial) and
//! geodetic latitude/longitude/altitude on the WGS84 ellipsoid.
//!
//! Latitude and longitude cross the interface in **degrees**, altitude in
//! meters; this is the one place the crate departs from radians, matching the
//! unit convention of the trajectory output records.

use nalgebra::Vector3;

use crate::{
    constants::{Degree, Meter, EARTH_EQUATORIAL_RADIUS, EARTH_FLATTENING, RADEG},
    ref_system::{j2000_to_wgs84_r, wgs84_to_j2000_r},
    time::Epoch,
};

/// Geodetic position on the WGS84 ellipsoid.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GeodeticPosition {
    /// Geodetic latitude, degrees, positive north.
    pub latitude: Degree,
    /// Longitude, degrees, positive east, in (−180, 180].
    pub longitude: Degree,
    /// Height above the ellipsoid, meters.
    pub altitude: Meter,
}

/// WGS84 Cartesian position → geodetic latitude/longitude/altitude.
///
/// Iterates the geodetic latitude (Bowring-style fixed point on the
/// ellipsoid normal); five iterations converge to well below a millimeter
/// for any orbital altitude.
pub fn wgs84_to_lla(r_wgs84: &Vector3<f64>) -> GeodeticPosition {
    let a = EARTH_EQUATORIAL_RADIUS;
    let e2 = EARTH_FLATTENING * (2.0 - EARTH_FLATTENING);

    let x = r_wgs84.x;
    let y = r_wgs84.y;
    let z = r_wgs84.z;

    let lon = y.atan2(x);
    let p = (x * x + y * y).sqrt();

    // First guess ignores the ellipsoid correction
    let mut lat = z.atan2(p * (1.0 - e2));
    let mut prime_vertical = a;

    for _ in 0..5 {
        prime_vertical = a / (1.0 - e2 * lat.sin() * lat.sin()).sqrt();
        lat = (z + e2 * prime_vertical * lat.sin()).atan2(p);
    }

    // Near the poles p/cos(lat) loses precision, use the polar expression
    let alt = if lat.cos().abs() > 1e-10 {
        p / lat.cos() - prime_vertical
    } else {
        z.abs() - prime_vertical * (1.0 - e2)
    };

    GeodeticPosition {
        latitude: lat / RADEG,
        longitude: lon / RADEG,
        altitude: alt,
    }
}

/// Geodetic latitude/longitude/altitude → WGS84 Cartesian position.
pub fn lla_to_wgs84(lla: &GeodeticPosition) -> Vector3<f64> {
    let a = EARTH_EQUATORIAL_RADIUS;
    let e2 = EARTH_FLATTENING * (2.0 - EARTH_FLATTENING);

    let lat = lla.latitude * RADEG;
    let lon = lla.longitude * RADEG;
    let h = lla.altitude;

    let prime_vertical = a / (1.0 - e2 * lat.sin() * lat.sin()).sqrt();

    Vector3::new(
        (prime_vertical + h) * lat.cos() * lon.cos(),
        (prime_vertical + h) * lat.cos() * lon.sin(),
        (prime_vertical * (1.0 - e2) + h) * lat.sin(),
    )
}

/// J2000 inertial position → geodetic latitude/longitude/altitude.
pub fn j2000_to_lla(epoch: &Epoch, r_j2000: &Vector3<f64>) -> GeodeticPosition {
    wgs84_to_lla(&j2000_to_wgs84_r(epoch, r_j2000))
}

/// Geodetic latitude/longitude/altitude → J2000 inertial position.
pub fn lla_to_j2000(epoch: &Epoch, lla: &GeodeticPosition) -> Vector3<f64> {
    wgs84_to_j2000_r(epoch, &lla_to_wgs84(lla))
}

#[cfg(test)]
mod geodesy_test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_equator_prime_meridian() {
        let r = Vector3::new(EARTH_EQUATORIAL_RADIUS + 500_000.0, 0.0, 0.0);
        let lla = wgs84_to_lla(&r);
        assert_relative_eq!(lla.latitude, 0.0, epsilon = 1e-9);
        assert_relative_eq!(lla.longitude, 0.0, epsilon = 1e-9);
        assert_relative_eq!(lla.altitude, 500_000.0, epsilon = 1e-4);
    }

    #[test]
    fn test_round_trip_mid_latitude() {
        let lla = GeodeticPosition {
            latitude: 43.6,
            longitude: 1.44,
            altitude: 712_345.0,
        };
        let back = wgs84_to_lla(&lla_to_wgs84(&lla));
        assert_relative_eq!(back.latitude, lla.latitude, epsilon = 1e-9);
        assert_relative_eq!(back.longitude, lla.longitude, epsilon = 1e-9);
        assert_relative_eq!(back.altitude, lla.altitude, epsilon = 1e-4);
    }

    #[test]
    fn test_round_trip_southern_hemisphere() {
        let lla = GeodeticPosition {
            latitude: -67.9,
            longitude: -155.25,
            altitude: 1_234.5,
        };
        let back = wgs84_to_lla(&lla_to_wgs84(&lla));
        assert_relative_eq!(back.latitude, lla.latitude, epsilon = 1e-9);
        assert_relative_eq!(back.longitude, lla.longitude, epsilon = 1e-9);
        assert_relative_eq!(back.altitude, lla.altitude, epsilon = 1e-4);
    }

    #[test]
    fn test_j2000_lla_round_trip() {
        let epoch = Epoch::from_mjd_tdt(60310.3);
        let r = Vector3::new(5.1e6, -3.9e6, 2.7e6);
        let back = lla_to_j2000(&epoch, &j2000_to_lla(&epoch, &r));
        assert_relative_eq!((back - r).norm(), 0.0, epsilon = 1e-4);
    }

    #[test]
    fn test_geodetic_vs_geocentric_latitude() {
        // At 45° the geodetic latitude exceeds the geocentric one by ~0.19°.
        let r = lla_to_wgs84(&GeodeticPosition {
            latitude: 45.0,
            longitude: 0.0,
            altitude: 0.0,
        });
        let geocentric = (r.z.atan2(r.x)) / RADEG;
        assert!(45.0 - geocentric > 0.1);
        assert!(45.0 - geocentric < 0.3);
    }
}
