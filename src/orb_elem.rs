//! # Classical orbital elements
//!
//! Conversion between Cartesian position/velocity states and the classical
//! element set (a, e, i, Ω, ω, ν), orbit classification, and the longitude
//! drift rate used for near-geostationary analysis.
//!
//! ## Degeneracies
//!
//! Classical elements are singular for circular and equatorial orbits:
//!
//! - **e → 0**: the argument of perigee is undefined; the conversion sets
//!   ω = 0 and measures the anomaly from the ascending node.
//! - **i → 0**: the ascending node is undefined; the conversion sets Ω = 0
//!   and measures ω (or the anomaly, when also circular) from the x axis.
//!
//! Both fallbacks are reported through [`Degeneracy`] instead of silently
//! producing undefined angles, and the conic branch is reported through
//! [`OrbitClass`] instead of letting a parabolic state turn into NaN.

use nalgebra::Vector3;

use crate::constants::{Degree, Radian, DPI, EARTH_ROTATION_RATE, SECONDS_PER_DAY};
use crate::hpop_errors::HpopError;
use crate::kepler::principal_angle;
use crate::ref_system::{rotmt, StateVector};

/// Eccentricity / inclination tolerance below which the classical angles are
/// treated as degenerate.
const DEGENERACY_TOL: f64 = 1e-8;

/// Tolerance around e = 1 separating the conic branches.
const PARABOLIC_TOL: f64 = 1e-8;

/// Classical (Keplerian) orbital elements.
///
/// Units
/// -----
/// * `semi_major_axis`: meters. For the parabolic and hyperbolic branches of
///   [`rv_to_coe`] this field holds the **perigee distance** instead, as
///   flagged by the accompanying [`OrbitClass`].
/// * `eccentricity`: unitless, `[0, 1)` on the elliptical branch.
/// * `inclination`, `raan`, `arg_perigee`, `true_anomaly`: radians.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OrbitalElements {
    pub semi_major_axis: f64,
    pub eccentricity: f64,
    pub inclination: Radian,
    pub raan: Radian,
    pub arg_perigee: Radian,
    pub true_anomaly: Radian,
}

/// Conic branch of a classified state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum OrbitClass {
    Elliptical,
    Parabolic,
    Hyperbolic,
}

/// Which classical-element singularities were hit during conversion, and
/// therefore which fallback convention the returned angles follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Degeneracy {
    None,
    /// e below tolerance: ω set to 0, anomaly measured from the node.
    Circular,
    /// i below tolerance: Ω set to 0, ω measured from the x axis.
    Equatorial,
    /// Both: Ω = ω = 0, anomaly is the true longitude from the x axis.
    CircularEquatorial,
}

/// Cartesian → classical elements, with explicit classification.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ClassifiedElements {
    pub elements: OrbitalElements,
    pub class: OrbitClass,
    pub degeneracy: Degeneracy,
}

/// Convert classical elements to a J2000 position/velocity state.
///
/// Arguments
/// ---------
/// * `coe`: elliptical element set (the `semi_major_axis` field must hold a
///   genuine semi-major axis).
/// * `mu`: gravitational parameter of the central body (m³/s²).
///
/// Return
/// ------
/// * Cartesian state in the frame the elements are referred to (J2000 for
///   every caller inside this crate).
pub fn coe_to_rv(coe: &OrbitalElements, mu: f64) -> StateVector {
    let p = coe.semi_major_axis * (1.0 - coe.eccentricity * coe.eccentricity);
    let r_norm = p / (1.0 + coe.eccentricity * coe.true_anomaly.cos());

    // Perifocal coordinates
    let r_pf = Vector3::new(
        r_norm * coe.true_anomaly.cos(),
        r_norm * coe.true_anomaly.sin(),
        0.0,
    );
    let vf = (mu / p).sqrt();
    let v_pf = Vector3::new(
        -vf * coe.true_anomaly.sin(),
        vf * (coe.eccentricity + coe.true_anomaly.cos()),
        0.0,
    );

    // Perifocal → inertial: rotate by ω about z, i about x, Ω about z
    let rot = rotmt(coe.raan, 2) * rotmt(coe.inclination, 0) * rotmt(coe.arg_perigee, 2);

    StateVector::new(rot * r_pf, rot * v_pf)
}

/// Convert a Cartesian state to classical elements.
///
/// Arguments
/// ---------
/// * `state`: position/velocity, meters and m/s.
/// * `mu`: gravitational parameter of the central body (m³/s²).
///
/// Return
/// ------
/// * [`ClassifiedElements`] carrying the element set, the conic branch and
///   the degeneracy fallback applied, or [`HpopError::DegenerateGeometry`]
///   for rectilinear states (zero angular momentum) where no element set
///   exists.
pub fn rv_to_coe(state: &StateVector, mu: f64) -> Result<ClassifiedElements, HpopError> {
    let r = state.position;
    let v = state.velocity;
    let r_norm = r.norm();

    let h = r.cross(&v);
    let h_norm = h.norm();
    if r_norm == 0.0 || h_norm < 1e-3 {
        return Err(HpopError::DegenerateGeometry(
            "rectilinear state: angular momentum is zero".into(),
        ));
    }

    // Node vector and eccentricity (Laplace) vector
    let node = Vector3::z().cross(&h);
    let node_norm = node.norm();
    let e_vec = v.cross(&h) / mu - r / r_norm;
    let ecc = e_vec.norm();

    let energy = v.norm_squared() / 2.0 - mu / r_norm;

    let (class, first_element) = if (ecc - 1.0).abs() < PARABOLIC_TOL {
        // Parabolic: store the perigee distance q = p/2
        (OrbitClass::Parabolic, h_norm * h_norm / mu / 2.0)
    } else if ecc < 1.0 {
        (OrbitClass::Elliptical, -mu / (2.0 * energy))
    } else {
        // Hyperbolic: store the perigee distance q = a(1 - e), a < 0
        let a = -mu / (2.0 * energy);
        (OrbitClass::Hyperbolic, a * (1.0 - ecc))
    };

    let inclination = (h.z / h_norm).clamp(-1.0, 1.0).acos();

    let circular = ecc < DEGENERACY_TOL;
    let equatorial = node_norm < DEGENERACY_TOL * h_norm;

    let raan = if equatorial {
        0.0
    } else {
        principal_angle(node.y.atan2(node.x))
    };

    let arg_perigee = if circular {
        0.0
    } else if equatorial {
        // Longitude of perigee from the x axis
        principal_angle(e_vec.y.atan2(e_vec.x))
    } else {
        let cos_w = node.dot(&e_vec) / (node_norm * ecc);
        let w = cos_w.clamp(-1.0, 1.0).acos();
        if e_vec.z < 0.0 {
            principal_angle(-w)
        } else {
            w
        }
    };

    let true_anomaly = if circular && equatorial {
        // True longitude from the x axis
        principal_angle(r.y.atan2(r.x))
    } else if circular {
        // Argument of latitude from the ascending node
        let cos_u = node.dot(&r) / (node_norm * r_norm);
        let u = cos_u.clamp(-1.0, 1.0).acos();
        if r.z < 0.0 {
            principal_angle(-u)
        } else {
            u
        }
    } else {
        let cos_f = e_vec.dot(&r) / (ecc * r_norm);
        let f = cos_f.clamp(-1.0, 1.0).acos();
        if r.dot(&v) < 0.0 {
            principal_angle(-f)
        } else {
            f
        }
    };

    let degeneracy = match (circular, equatorial) {
        (false, false) => Degeneracy::None,
        (true, false) => Degeneracy::Circular,
        (false, true) => Degeneracy::Equatorial,
        (true, true) => Degeneracy::CircularEquatorial,
    };

    Ok(ClassifiedElements {
        elements: OrbitalElements {
            semi_major_axis: first_element,
            eccentricity: ecc,
            inclination,
            raan,
            arg_perigee,
            true_anomaly,
        },
        class,
        degeneracy,
    })
}

/// Test whether a Cartesian state lies on a bound elliptical orbit.
///
/// Negative specific energy, eccentricity bounded away from the parabolic
/// limit, and non-zero angular momentum.
pub fn is_elliptical_orbit(state: &StateVector, mu: f64) -> bool {
    let r_norm = state.position.norm();
    if r_norm == 0.0 {
        return false;
    }
    let h = state.position.cross(&state.velocity);
    if h.norm() < 1e-3 {
        return false;
    }

    let e_vec = state.velocity.cross(&h) / mu - state.position / r_norm;
    let energy = state.velocity.norm_squared() / 2.0 - mu / r_norm;

    energy < 0.0 && e_vec.norm() < 1.0 - PARABOLIC_TOL
}

/// Longitude drift rate of a satellite relative to the rotating Earth, in
/// degrees per day, positive eastward.
///
/// Computed from the two-body mean motion of the element set; at the
/// geostationary radius the drift vanishes, above it the satellite drifts
/// westward (negative), below it eastward (positive).
pub fn longitude_drift_rate(coe: &OrbitalElements, mu: f64) -> Degree {
    let n = (mu / coe.semi_major_axis.powi(3)).sqrt();
    (n - EARTH_ROTATION_RATE) * SECONDS_PER_DAY * 360.0 / DPI
}

#[cfg(test)]
mod orb_elem_test {
    use super::*;
    use crate::constants::GM_EARTH;
    use approx::assert_relative_eq;

    fn sample_elements(e: f64, inc: Radian) -> OrbitalElements {
        OrbitalElements {
            semi_major_axis: 7.2e6,
            eccentricity: e,
            inclination: inc,
            raan: 0.7,
            arg_perigee: 2.1,
            true_anomaly: 0.9,
        }
    }

    #[test]
    fn test_coe_rv_round_trip() {
        let coe = sample_elements(0.1, 0.9);
        let state = coe_to_rv(&coe, GM_EARTH);
        let back = rv_to_coe(&state, GM_EARTH).unwrap();

        assert_eq!(back.class, OrbitClass::Elliptical);
        assert_eq!(back.degeneracy, Degeneracy::None);
        assert_relative_eq!(
            back.elements.semi_major_axis,
            coe.semi_major_axis,
            epsilon = 1.0
        );
        assert_relative_eq!(back.elements.eccentricity, coe.eccentricity, epsilon = 1e-9);
        assert_relative_eq!(back.elements.inclination, coe.inclination, epsilon = 1e-9);
        assert_relative_eq!(back.elements.raan, coe.raan, epsilon = 1e-9);
        assert_relative_eq!(back.elements.arg_perigee, coe.arg_perigee, epsilon = 1e-8);
        assert_relative_eq!(back.elements.true_anomaly, coe.true_anomaly, epsilon = 1e-8);
    }

    #[test]
    fn test_circular_orbit_flagged() {
        let coe = OrbitalElements {
            semi_major_axis: 7.078e6,
            eccentricity: 0.0,
            inclination: 1.71,
            raan: 1.0,
            arg_perigee: 0.0,
            true_anomaly: 0.5,
        };
        let state = coe_to_rv(&coe, GM_EARTH);
        let back = rv_to_coe(&state, GM_EARTH).unwrap();

        assert_eq!(back.degeneracy, Degeneracy::Circular);
        assert_eq!(back.elements.arg_perigee, 0.0);
        // Anomaly comes back as the argument of latitude u = ω + ν = 0.5
        assert_relative_eq!(back.elements.true_anomaly, 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_equatorial_orbit_flagged() {
        let coe = OrbitalElements {
            semi_major_axis: 42.166e6,
            eccentricity: 0.2,
            inclination: 0.0,
            raan: 0.0,
            arg_perigee: 1.2,
            true_anomaly: 0.4,
        };
        let state = coe_to_rv(&coe, GM_EARTH);
        let back = rv_to_coe(&state, GM_EARTH).unwrap();

        assert_eq!(back.degeneracy, Degeneracy::Equatorial);
        assert_eq!(back.elements.raan, 0.0);
        // ω comes back as the longitude of perigee Ω + ω = 1.2
        assert_relative_eq!(back.elements.arg_perigee, 1.2, epsilon = 1e-6);
        assert_relative_eq!(back.elements.true_anomaly, 0.4, epsilon = 1e-6);
    }

    #[test]
    fn test_hyperbolic_flagged() {
        // Well above escape velocity at 7000 km
        let state = StateVector::new(
            Vector3::new(7.0e6, 0.0, 0.0),
            Vector3::new(0.0, 12_000.0, 0.0),
        );
        let back = rv_to_coe(&state, GM_EARTH).unwrap();
        assert_eq!(back.class, OrbitClass::Hyperbolic);
        assert!(back.elements.eccentricity > 1.0);
        // First element holds the perigee distance, here the current radius
        assert_relative_eq!(back.elements.semi_major_axis, 7.0e6, epsilon = 1.0);
    }

    #[test]
    fn test_rectilinear_rejected() {
        let state = StateVector::new(Vector3::new(7.0e6, 0.0, 0.0), Vector3::new(100.0, 0.0, 0.0));
        assert!(matches!(
            rv_to_coe(&state, GM_EARTH),
            Err(HpopError::DegenerateGeometry(_))
        ));
    }

    #[test]
    fn test_is_elliptical() {
        let circular = coe_to_rv(&sample_elements(0.01, 0.9), GM_EARTH);
        assert!(is_elliptical_orbit(&circular, GM_EARTH));

        let escape = StateVector::new(
            Vector3::new(7.0e6, 0.0, 0.0),
            Vector3::new(0.0, 12_000.0, 0.0),
        );
        assert!(!is_elliptical_orbit(&escape, GM_EARTH));
    }

    #[test]
    fn test_longitude_drift_rate_sign() {
        let geo = OrbitalElements {
            semi_major_axis: 42_164_169.0,
            eccentricity: 0.0,
            inclination: 0.0,
            raan: 0.0,
            arg_perigee: 0.0,
            true_anomaly: 0.0,
        };
        // Near-zero drift at the geostationary radius
        assert!(longitude_drift_rate(&geo, GM_EARTH).abs() < 0.05);

        let below = OrbitalElements {
            semi_major_axis: 42.0e6,
            ..geo
        };
        assert!(longitude_drift_rate(&below, GM_EARTH) > 0.0);

        let above = OrbitalElements {
            semi_major_axis: 42.3e6,
            ..geo
        };
        assert!(longitude_drift_rate(&above, GM_EARTH) < 0.0);
    }
}
