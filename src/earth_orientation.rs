//! # Earth orientation models
//!
//! Mean obliquity of the ecliptic (IAU 1976), nutation in longitude and
//! obliquity (leading terms of the IAU 1980 series) and precession
//! (IAU 1976), as functions of TDT. Together with the sidereal-time
//! polynomial in [`crate::time`], these form the analytic Earth-orientation
//! model behind the J2000 ↔ WGS84 rotation.
//!
//! ## Accuracy bound
//!
//! The nutation series is truncated to its 13 largest terms and polar motion
//! is not modeled (no IERS bulletin ingestion). The resulting Earth-fixed
//! axes are good to a few hundredths of an arcsecond, i.e. meter-level at the
//! Earth's surface, which bounds every transform that passes through the
//! WGS84 frame.

use nalgebra::Matrix3;

use crate::{
    constants::{ArcSec, Radian, RADEG, RADSEC, T2000},
    ref_system::rotmt,
};

/// Compute the mean obliquity of the ecliptic at a given epoch (IAU 1976 model).
///
/// Arguments
/// ---------
/// * `tjm`: Modified Julian Date (TT scale).
///
/// Return
/// ------
/// * Mean obliquity of the ecliptic in radians.
///
/// The obliquity is a cubic polynomial in Julian centuries since J2000,
/// evaluated with Horner's scheme; coefficients are in arcseconds.
pub fn obleq(tjm: f64) -> Radian {
    // Obliquity coefficients
    let ob0 = ((23.0 * 3600.0 + 26.0 * 60.0) + 21.448) * RADSEC;
    let ob1 = -46.815 * RADSEC;
    let ob2 = -0.0006 * RADSEC;
    let ob3 = 0.00181 * RADSEC;

    let t = (tjm - T2000) / 36525.0;

    ((ob3 * t + ob2) * t + ob1) * t + ob0
}

/// One term of the truncated IAU 1980 nutation series.
///
/// `arg` multipliers apply to the five fundamental arguments (l, l', F, D, Ω);
/// longitude/obliquity coefficients are in 0.0001 arcseconds, with their
/// secular rates per Julian century.
struct NutationTerm {
    arg: [i8; 5],
    dpsi: f64,
    dpsi_t: f64,
    deps: f64,
    deps_t: f64,
}

/// The 13 largest terms of the IAU 1980 (Wahr) nutation series, ordered by
/// longitude amplitude. Sufficient for the model bound stated at module
/// level; the full 106-term series buys nothing once polar motion is
/// neglected.
const NUTATION_TERMS: [NutationTerm; 13] = [
    NutationTerm { arg: [0, 0, 0, 0, 1], dpsi: -171996.0, dpsi_t: -174.2, deps: 92025.0, deps_t: 8.9 },
    NutationTerm { arg: [0, 0, 2, -2, 2], dpsi: -13187.0, dpsi_t: -1.6, deps: 5736.0, deps_t: -3.1 },
    NutationTerm { arg: [0, 0, 2, 0, 2], dpsi: -2274.0, dpsi_t: -0.2, deps: 977.0, deps_t: -0.5 },
    NutationTerm { arg: [0, 0, 0, 0, 2], dpsi: 2062.0, dpsi_t: 0.2, deps: -895.0, deps_t: 0.5 },
    NutationTerm { arg: [0, 1, 0, 0, 0], dpsi: 1426.0, dpsi_t: -3.4, deps: 54.0, deps_t: -0.1 },
    NutationTerm { arg: [1, 0, 0, 0, 0], dpsi: 712.0, dpsi_t: 0.1, deps: -7.0, deps_t: 0.0 },
    NutationTerm { arg: [0, 1, 2, -2, 2], dpsi: -517.0, dpsi_t: 1.2, deps: 224.0, deps_t: -0.6 },
    NutationTerm { arg: [0, 0, 2, 0, 1], dpsi: -386.0, dpsi_t: -0.4, deps: 200.0, deps_t: 0.0 },
    NutationTerm { arg: [1, 0, 2, 0, 2], dpsi: -301.0, dpsi_t: 0.0, deps: 129.0, deps_t: -0.1 },
    NutationTerm { arg: [0, -1, 2, -2, 2], dpsi: 217.0, dpsi_t: -0.5, deps: -95.0, deps_t: 0.3 },
    NutationTerm { arg: [1, 0, 0, -2, 0], dpsi: -158.0, dpsi_t: 0.0, deps: -1.0, deps_t: 0.0 },
    NutationTerm { arg: [0, 0, 2, -2, 1], dpsi: 129.0, dpsi_t: 0.1, deps: -70.0, deps_t: 0.0 },
    NutationTerm { arg: [-1, 0, 2, 0, 2], dpsi: 123.0, dpsi_t: 0.0, deps: -53.0, deps_t: 0.0 },
];

/// Compute the nutation angles in longitude and obliquity (truncated
/// IAU 1980 model).
///
/// Arguments
/// ---------
/// * `tjm`: Modified Julian Date (TT scale).
///
/// Return
/// ------
/// * `(Δψ, Δε)` in arcseconds: nutation in longitude and in obliquity.
///
/// The five fundamental lunar and solar arguments (mean anomaly of the Moon
/// and Sun, argument of latitude of the Moon, mean elongation of the Moon
/// from the Sun, longitude of the Moon's ascending node) are evaluated as
/// 3rd-order polynomials in Julian centuries from J2000; the series then sums
/// sinusoids of their integer combinations.
pub fn nutation_angles(tjm: f64) -> (ArcSec, ArcSec) {
    let t = (tjm - T2000) / 36525.0;
    let t2 = t * t;
    let t3 = t2 * t;

    // Fundamental arguments, radians
    let l = (485866.733 + 1717915922.633 * t + 31.310 * t2 + 0.064 * t3) * RADSEC;
    let lp = (1287099.804 + 129596581.224 * t - 0.577 * t2 - 0.012 * t3) * RADSEC;
    let f = (335778.877 + 1739527263.137 * t - 13.257 * t2 + 0.011 * t3) * RADSEC;
    let d = (1072261.307 + 1602961601.328 * t - 6.891 * t2 + 0.019 * t3) * RADSEC;
    let n = (450160.280 - 6962890.539 * t + 7.455 * t2 + 0.008 * t3) * RADSEC;

    let args = [l, lp, f, d, n];

    let mut dpsi = 0.0;
    let mut deps = 0.0;
    for term in NUTATION_TERMS.iter() {
        let phase: f64 = term
            .arg
            .iter()
            .zip(args.iter())
            .map(|(&k, &a)| k as f64 * a)
            .sum();
        dpsi += (term.dpsi + term.dpsi_t * t) * phase.sin();
        deps += (term.deps + term.deps_t * t) * phase.cos();
    }

    // Convert results from 0.0001 arcseconds to arcseconds
    (dpsi * 1e-4, deps * 1e-4)
}

/// Construct the nutation rotation matrix (mean-of-date → true-of-date).
///
/// Three successive rotations: around X by the mean obliquity ε, around Z by
/// the nutation in longitude Δψ, back around X by the true obliquity ε + Δε.
pub fn nutation_matrix(tjm: f64) -> Matrix3<f64> {
    let eps = obleq(tjm);
    let (dpsi, deps) = nutation_angles(tjm);
    let dpsi = dpsi * RADSEC;
    let deps = deps * RADSEC;

    rotmt(eps + deps, 0) * rotmt(dpsi, 2) * rotmt(-eps, 0)
}

/// Construct the precession rotation matrix (IAU 1976 model), transforming
/// mean-equinox J2000 coordinates to the mean equinox of date.
///
/// Arguments
/// ---------
/// * `tjm`: Modified Julian Date (TT scale) of the target epoch.
///
/// Return
/// ------
/// * Rotation matrix `P` such that `x_date = P · x_J2000`.
pub fn precession_matrix(tjm: f64) -> Matrix3<f64> {
    // Precession polynomial coefficients (in degrees per century power)
    let zed = 0.6406161 * RADEG;
    let zd = 0.6406161 * RADEG;
    let thd = 0.5567530 * RADEG;

    let zedd = 0.0000839 * RADEG;
    let zdd = 0.0003041 * RADEG;
    let thdd = -0.0001185 * RADEG;

    let zeddd = 0.0000050 * RADEG;
    let zddd = 0.0000051 * RADEG;
    let thddd = -0.0000116 * RADEG;

    let t = (tjm - T2000) / 36525.0;

    let zeta = ((zeddd * t + zedd) * t + zed) * t;
    let z = ((zddd * t + zdd) * t + zd) * t;
    let theta = ((thddd * t + thdd) * t + thd) * t;

    rotmt(z, 2) * rotmt(-theta, 1) * rotmt(zeta, 2)
}

#[cfg(test)]
mod earth_orientation_test {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    #[test]
    fn test_obleq_j2000() {
        // ε(J2000) = 23°26'21.448"
        let eps = obleq(T2000);
        assert_relative_eq!(eps, 23.439291111 * RADEG, epsilon = 1e-9);
    }

    #[test]
    fn test_nutation_magnitude() {
        // Nutation in longitude stays within ±20" and obliquity within ±11"
        // (the leading 18.6-year term dominates both)
        for mjd in [51544.5, 55000.0, 58849.0, 62502.0] {
            let (dpsi, deps) = nutation_angles(mjd);
            assert!(dpsi.abs() < 20.0, "dpsi = {dpsi}");
            assert!(deps.abs() < 11.0, "deps = {deps}");
        }
    }

    #[test]
    fn test_precession_identity_at_j2000() {
        let p = precession_matrix(T2000);
        assert_relative_eq!((p - Matrix3::identity()).norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_precession_is_orthonormal() {
        let p = precession_matrix(60000.0);
        let should_be_identity = p * p.transpose();
        assert_relative_eq!(
            (should_be_identity - Matrix3::identity()).norm(),
            0.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_precession_moves_equinox_forward() {
        // Over a decade the J2000 equinox acquires a positive RA of-date of
        // ζ + z ≈ 2 × 2306.2" × 0.1 ≈ 461".
        let p = precession_matrix(T2000 + 3652.5);
        let x = p * Vector3::x();
        let ra = x.y.atan2(x.x);
        assert!(ra > 0.0);
        assert_relative_eq!(ra / RADSEC, 461.3, epsilon = 2.0);
    }
}
