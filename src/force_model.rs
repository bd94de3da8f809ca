//! # Perturbation force model
//!
//! Composes the net inertial acceleration acting on the spacecraft as a
//! function of epoch, state and physical parameters. Every enabled source
//! contributes linearly:
//!
//! - two-body point mass (always),
//! - Earth zonal harmonics J₂ / J₃ / J₄,
//! - luni-solar third-body attraction,
//! - atmospheric drag on an exponential density profile,
//! - solar radiation pressure scaled by the shadow function,
//! - an externally injected maneuver acceleration (inertial, or body-frame
//!   rotated through the frame-transform layer before injection).
//!
//! Fidelity is selected through the closed [`DynamicsModel`] presets; the
//! individual sources are not independently toggleable.
//!
//! ## Accuracy limitations
//!
//! The atmosphere is a static piecewise-exponential profile with no solar
//! or geomagnetic activity dependence, and the gravity field carries zonal
//! terms only (no tesserals). Both bounds are inherent to the model, not
//! failure modes.

use nalgebra::Vector3;

use crate::{
    constants::{
        AU, EARTH_EQUATORIAL_RADIUS, EARTH_J2, EARTH_J3, EARTH_J4, EARTH_ROTATION_RATE, GM_EARTH,
        GM_MOON, GM_SUN, SOLAR_PRESSURE_AU,
    },
    ephemeris::{lunar_position_j2000, solar_position_j2000},
    geometry::{umbra_occluder, SunModel},
    ref_system::{dcm_body_to_j2000, Attitude, StateVector},
    time::Epoch,
};

/// Physical parameters of the spacecraft, immutable for the duration of one
/// propagation call.
///
/// Mass is only ever reduced through the explicit [`SpacecraftParams::after_burn`]
/// helper; no propagation entry point mutates it behind the caller's back.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SpacecraftParams {
    /// Total mass, kg.
    pub mass: f64,
    /// Fuel mass included in `mass`, kg.
    pub fuel_mass: f64,
    /// Thruster force, N.
    pub thrust: f64,
    /// Specific impulse, s.
    pub isp: f64,
    /// Cross-sectional area facing the airflow, m².
    pub drag_area: f64,
    /// Area exposed to solar radiation, m².
    pub srp_area: f64,
    /// Drag coefficient (≈ 2.2 for typical spacecraft).
    pub drag_coeff: f64,
    /// Surface reflectivity η in [0, 1]; the radiation coefficient is 1 + η.
    pub reflectivity: f64,
}

impl SpacecraftParams {
    /// Parameters after an impulsive burn of size `delta_v` (m/s), with the
    /// propellant use given by the rocket equation.
    ///
    /// Returns `None` when the burn would consume more than the available
    /// fuel, leaving the original parameters untouched.
    pub fn after_burn(&self, delta_v: f64) -> Option<SpacecraftParams> {
        const G0: f64 = 9.80665;

        let mass_after = self.mass * (-delta_v / (self.isp * G0)).exp();
        let used = self.mass - mass_after;
        if used > self.fuel_mass {
            return None;
        }

        Some(SpacecraftParams {
            mass: mass_after,
            fuel_mass: self.fuel_mass - used,
            ..*self
        })
    }
}

/// Dynamics fidelity presets. Mutually exclusive; each preset's term set is
/// fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DynamicsModel {
    /// Point-mass Earth only. The only fidelity accepted by the analytic
    /// two-body propagation path.
    TwoBody,
    /// Point mass + J₂ oblateness.
    J2Only,
    /// Point mass + J₂ + J₃ + J₄ zonals.
    J4Only,
    /// All modeled perturbations: zonals through J₄, luni-solar gravity,
    /// atmospheric drag, solar radiation pressure.
    FullPerturbation,
}

impl DynamicsModel {
    /// True when the preset includes any perturbation beyond the point mass.
    pub fn has_perturbations(&self) -> bool {
        !matches!(self, DynamicsModel::TwoBody)
    }
}

/// Externally supplied maneuver acceleration, injected on top of the natural
/// force model. One operation, tagged by how the vector is expressed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExtraAccel {
    /// No injected acceleration.
    None,
    /// Acceleration already expressed in the J2000 frame, m/s².
    Inertial(Vector3<f64>),
    /// Acceleration expressed in the body frame, with the attitude relating
    /// body axes to the orbital (VVLH) frame. Rotated to J2000 against the
    /// state at the start of the step, before injection.
    Body {
        attitude: Attitude,
        accel: Vector3<f64>,
    },
}

impl ExtraAccel {
    /// Resolve to a J2000 vector against the given reference state.
    pub fn to_inertial(&self, state: &StateVector) -> Vector3<f64> {
        match self {
            ExtraAccel::None => Vector3::zeros(),
            ExtraAccel::Inertial(a) => *a,
            ExtraAccel::Body { attitude, accel } => dcm_body_to_j2000(attitude, state) * accel,
        }
    }
}

// -------------------------------------------------------------------------------------------------
// Atmosphere
// -------------------------------------------------------------------------------------------------

/// Piecewise-exponential atmosphere: (base altitude m, density kg/m³ at the
/// base, scale height m). CIRA-72 derived layer table.
const ATMOSPHERE_LAYERS: [(f64, f64, f64); 28] = [
    (0.0, 1.225, 7_249.0),
    (25_000.0, 3.899e-2, 6_349.0),
    (30_000.0, 1.774e-2, 6_682.0),
    (40_000.0, 3.972e-3, 7_554.0),
    (50_000.0, 1.057e-3, 8_382.0),
    (60_000.0, 3.206e-4, 7_714.0),
    (70_000.0, 8.770e-5, 6_549.0),
    (80_000.0, 1.905e-5, 5_799.0),
    (90_000.0, 3.396e-6, 5_382.0),
    (100_000.0, 5.297e-7, 5_877.0),
    (110_000.0, 9.661e-8, 7_263.0),
    (120_000.0, 2.438e-8, 9_473.0),
    (130_000.0, 8.484e-9, 12_636.0),
    (140_000.0, 3.845e-9, 16_149.0),
    (150_000.0, 2.070e-9, 22_523.0),
    (180_000.0, 5.464e-10, 29_740.0),
    (200_000.0, 2.789e-10, 37_105.0),
    (250_000.0, 7.248e-11, 45_546.0),
    (300_000.0, 2.418e-11, 53_628.0),
    (350_000.0, 9.518e-12, 53_298.0),
    (400_000.0, 3.725e-12, 58_515.0),
    (450_000.0, 1.585e-12, 60_828.0),
    (500_000.0, 6.967e-13, 63_822.0),
    (600_000.0, 1.454e-13, 71_835.0),
    (700_000.0, 3.614e-14, 88_667.0),
    (800_000.0, 1.170e-14, 124_640.0),
    (900_000.0, 5.245e-15, 181_050.0),
    (1_000_000.0, 3.019e-15, 268_000.0),
];

/// Atmospheric density (kg/m³) at a geocentric altitude above the equatorial
/// radius. Static profile, no solar-activity dependence.
pub fn atmospheric_density(altitude: f64) -> f64 {
    if altitude <= 0.0 {
        return ATMOSPHERE_LAYERS[0].1;
    }

    let mut layer = &ATMOSPHERE_LAYERS[0];
    for candidate in ATMOSPHERE_LAYERS.iter() {
        if altitude >= candidate.0 {
            layer = candidate;
        } else {
            break;
        }
    }

    let (base, rho0, scale_height) = *layer;
    rho0 * (-(altitude - base) / scale_height).exp()
}

// -------------------------------------------------------------------------------------------------
// Individual accelerations
// -------------------------------------------------------------------------------------------------

/// Central-body point-mass acceleration: a = −μ r / r³.
fn point_mass_accel(r: &Vector3<f64>) -> Vector3<f64> {
    let r_norm = r.norm();
    -GM_EARTH / (r_norm * r_norm * r_norm) * r
}

/// J₂ oblateness acceleration.
fn j2_accel(r: &Vector3<f64>) -> Vector3<f64> {
    let r_norm = r.norm();
    let r2 = r_norm * r_norm;
    let r5 = r2 * r2 * r_norm;
    let re2 = EARTH_EQUATORIAL_RADIUS * EARTH_EQUATORIAL_RADIUS;

    let factor = 1.5 * EARTH_J2 * GM_EARTH * re2 / r5;
    let zz = (r.z * r.z) / r2;

    Vector3::new(
        factor * r.x * (5.0 * zz - 1.0),
        factor * r.y * (5.0 * zz - 1.0),
        factor * r.z * (5.0 * zz - 3.0),
    )
}

/// J₃ zonal acceleration (odd zonal, north-south asymmetric).
fn j3_accel(r: &Vector3<f64>) -> Vector3<f64> {
    let r_norm = r.norm();
    let r2 = r_norm * r_norm;
    let r7 = r2 * r2 * r2 * r_norm;
    let re3 = EARTH_EQUATORIAL_RADIUS.powi(3);

    let factor = 2.5 * EARTH_J3 * GM_EARTH * re3 / r7;
    let zz = r.z * r.z / r2;

    Vector3::new(
        factor * r.x * r.z * (7.0 * zz - 3.0),
        factor * r.y * r.z * (7.0 * zz - 3.0),
        factor * (r.z * r.z * (7.0 * zz - 6.0) + 0.6 * r2),
    )
}

/// J₄ zonal acceleration.
fn j4_accel(r: &Vector3<f64>) -> Vector3<f64> {
    let r_norm = r.norm();
    let r2 = r_norm * r_norm;
    let r7 = r2 * r2 * r2 * r_norm;
    let re4 = EARTH_EQUATORIAL_RADIUS.powi(4);

    let factor = 0.625 * EARTH_J4 * GM_EARTH * re4 / r7;
    let zz = r.z * r.z / r2;
    let zzzz = zz * zz;

    Vector3::new(
        factor * r.x * (3.0 - 42.0 * zz + 63.0 * zzzz),
        factor * r.y * (3.0 - 42.0 * zz + 63.0 * zzzz),
        factor * r.z * (15.0 - 70.0 * zz + 63.0 * zzzz),
    )
}

/// Third-body tidal acceleration from a perturbing body at `body_pos`
/// (geocentric J2000): direct attraction minus the pull on the Earth itself.
fn third_body_accel(mu_body: f64, body_pos: &Vector3<f64>, r: &Vector3<f64>) -> Vector3<f64> {
    let sat_to_body = body_pos - r;
    let d3 = sat_to_body.norm().powi(3);
    let s3 = body_pos.norm().powi(3);

    mu_body * (sat_to_body / d3 - body_pos / s3)
}

/// Atmospheric drag acceleration against the co-rotating atmosphere.
fn drag_accel(state: &StateVector, spacecraft: &SpacecraftParams) -> Vector3<f64> {
    let altitude = state.position.norm() - EARTH_EQUATORIAL_RADIUS;
    let density = atmospheric_density(altitude);

    let omega = Vector3::new(0.0, 0.0, EARTH_ROTATION_RATE);
    let v_rel = state.velocity - omega.cross(&state.position);

    let ballistic = spacecraft.drag_coeff * spacecraft.drag_area / spacecraft.mass;
    -0.5 * density * ballistic * v_rel.norm() * v_rel
}

/// Solar radiation pressure (cannonball model), scaled by the shadow
/// function: zero in umbra, full otherwise.
fn srp_accel(epoch: &Epoch, state: &StateVector, spacecraft: &SpacecraftParams) -> Vector3<f64> {
    if umbra_occluder(epoch, &state.position, SunModel::Parallel).is_some() {
        return Vector3::zeros();
    }

    let sun = solar_position_j2000(epoch);
    let sun_to_sat = state.position - sun;
    let distance = sun_to_sat.norm();

    let radiation_coeff = 1.0 + spacecraft.reflectivity;
    let pressure = SOLAR_PRESSURE_AU * (AU / distance) * (AU / distance);

    pressure * radiation_coeff * spacecraft.srp_area / spacecraft.mass * (sun_to_sat / distance)
}

// -------------------------------------------------------------------------------------------------
// Composition
// -------------------------------------------------------------------------------------------------

/// The composed force model: dynamics preset, spacecraft parameters and the
/// already-resolved injected acceleration.
///
/// A `ForceModel` is built once per propagation call and is a pure function
/// of its inputs afterward; it holds no mutable state.
#[derive(Debug, Clone, Copy)]
pub struct ForceModel {
    pub dynamics: DynamicsModel,
    pub spacecraft: SpacecraftParams,
    /// Injected maneuver acceleration, already rotated to J2000.
    pub extra_accel: Vector3<f64>,
}

impl ForceModel {
    pub fn new(
        dynamics: DynamicsModel,
        spacecraft: SpacecraftParams,
        extra_accel: Vector3<f64>,
    ) -> Self {
        Self {
            dynamics,
            spacecraft,
            extra_accel,
        }
    }

    /// Net inertial acceleration at `epoch` for the given J2000 state.
    pub fn acceleration(&self, epoch: &Epoch, state: &StateVector) -> Vector3<f64> {
        let r = &state.position;
        let mut accel = point_mass_accel(r) + self.extra_accel;

        match self.dynamics {
            DynamicsModel::TwoBody => {}
            DynamicsModel::J2Only => {
                accel += j2_accel(r);
            }
            DynamicsModel::J4Only => {
                accel += j2_accel(r) + j3_accel(r) + j4_accel(r);
            }
            DynamicsModel::FullPerturbation => {
                accel += j2_accel(r) + j3_accel(r) + j4_accel(r);
                accel += third_body_accel(GM_SUN, &solar_position_j2000(epoch), r);
                accel += third_body_accel(GM_MOON, &lunar_position_j2000(epoch), r);
                accel += drag_accel(state, &self.spacecraft);
                accel += srp_accel(epoch, state, &self.spacecraft);
            }
        }

        accel
    }
}

#[cfg(test)]
mod force_model_test {
    use super::*;
    use approx::assert_relative_eq;

    fn params() -> SpacecraftParams {
        SpacecraftParams {
            mass: 500.0,
            fuel_mass: 50.0,
            thrust: 1.0,
            isp: 220.0,
            drag_area: 2.0,
            srp_area: 2.0,
            drag_coeff: 2.2,
            reflectivity: 0.3,
        }
    }

    fn leo_state() -> StateVector {
        let r = EARTH_EQUATORIAL_RADIUS + 400_000.0;
        StateVector::new(
            Vector3::new(r, 0.0, 0.0),
            Vector3::new(0.0, (GM_EARTH / r).sqrt(), 0.0),
        )
    }

    #[test]
    fn test_point_mass_magnitude() {
        let state = leo_state();
        let fm = ForceModel::new(DynamicsModel::TwoBody, params(), Vector3::zeros());
        let a = fm.acceleration(&Epoch::from_mjd_tdt(60000.0), &state);

        let r = state.position.norm();
        assert_relative_eq!(a.norm(), GM_EARTH / (r * r), epsilon = 1e-9);
        // Points toward the center
        assert!(a.x < 0.0);
        assert_relative_eq!(a.y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_j2_is_small_against_point_mass() {
        let state = leo_state();
        let epoch = Epoch::from_mjd_tdt(60000.0);
        let two_body =
            ForceModel::new(DynamicsModel::TwoBody, params(), Vector3::zeros())
                .acceleration(&epoch, &state);
        let with_j2 = ForceModel::new(DynamicsModel::J2Only, params(), Vector3::zeros())
            .acceleration(&epoch, &state);

        let dj2 = (with_j2 - two_body).norm();
        let ratio = dj2 / two_body.norm();
        // J2 is of order 1e-3 of the central term
        assert!(ratio > 1e-4 && ratio < 1e-2, "ratio {ratio}");
    }

    #[test]
    fn test_j2_equatorial_direction() {
        // On the equator the J2 bulge pulls radially inward (extra mass below).
        let state = leo_state();
        let a = j2_accel(&state.position);
        assert!(a.x < 0.0);
        assert_relative_eq!(a.z, 0.0, epsilon = 1e-15);
    }

    #[test]
    fn test_atmospheric_density_decreases() {
        let d200 = atmospheric_density(200_000.0);
        let d400 = atmospheric_density(400_000.0);
        let d800 = atmospheric_density(800_000.0);
        assert!(d200 > d400 && d400 > d800);
        // Sanity anchor for the 400 km layer
        assert_relative_eq!(atmospheric_density(400_000.0), 3.725e-12, epsilon = 1e-15);
    }

    #[test]
    fn test_drag_opposes_corotating_velocity() {
        let state = leo_state();
        let a = drag_accel(&state, &params());
        // Velocity is +y, the co-rotating airflow correction is small: drag
        // must point mostly along −y.
        assert!(a.y < 0.0);
        assert!(a.y.abs() > a.x.abs());
    }

    #[test]
    fn test_third_body_tidal_form() {
        // At the sub-body point the tidal acceleration pulls toward the body.
        let body = Vector3::new(3.844e8, 0.0, 0.0);
        let r = Vector3::new(7.0e6, 0.0, 0.0);
        let a = third_body_accel(GM_MOON, &body, &r);
        assert!(a.x > 0.0);

        // On the far side it pulls away (tidal stretch).
        let r_far = Vector3::new(-7.0e6, 0.0, 0.0);
        let a_far = third_body_accel(GM_MOON, &body, &r_far);
        assert!(a_far.x < 0.0);
    }

    #[test]
    fn test_extra_accel_injection() {
        let state = leo_state();
        let epoch = Epoch::from_mjd_tdt(60000.0);
        let base = ForceModel::new(DynamicsModel::TwoBody, params(), Vector3::zeros())
            .acceleration(&epoch, &state);
        let boosted = ForceModel::new(
            DynamicsModel::TwoBody,
            params(),
            Vector3::new(0.0, 1e-3, 0.0),
        )
        .acceleration(&epoch, &state);

        let diff = boosted - base;
        assert_relative_eq!(diff.y, 1e-3, epsilon = 1e-12);
    }

    #[test]
    fn test_after_burn_consumes_fuel() {
        let p = params();
        let after = p.after_burn(10.0).unwrap();
        assert!(after.mass < p.mass);
        assert!(after.fuel_mass < p.fuel_mass);
        assert_relative_eq!(p.mass - after.mass, p.fuel_mass - after.fuel_mass, epsilon = 1e-12);

        // A burn beyond the fuel budget is refused
        assert!(p.after_burn(10_000.0).is_none());
    }
}
