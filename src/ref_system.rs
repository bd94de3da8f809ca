//! # Reference systems and frame transforms
//!
//! Rotation matrices (direction cosine matrices) and vector/state transforms
//! among the frames the propagation engine works in:
//!
//! - **J2000**: Earth-centered inertial, mean equator and equinox of J2000.
//! - **WGS84**: Earth-centered Earth-fixed, rotating with the Earth.
//! - **LVLH**: orbit-plane frame with x radial outward, z along the orbit
//!   normal and y completing the right-handed triad (along-track).
//! - **VVLH**: orbit-plane frame with z toward nadir, y opposite the orbit
//!   normal and x completing the triad.
//! - **Body**: spacecraft axes, related to VVLH (or a topocentric frame) by
//!   three attitude angles.
//! - **ESD / NED**: topocentric East-South-Down and North-East-Down frames
//!   derived from a surface position vector only.
//!
//! ## Conventions
//!
//! Every `dcm_a_to_b` function returns the matrix `C` such that
//! `x_b = C · x_a`. Attitude angles are applied as an intrinsic 3-2-1
//! sequence: yaw ψ about z, pitch θ about y, roll φ about x, in that order,
//! all in radians. Orbit-plane frames are pure functions of the instantaneous
//! position/velocity; nothing is cached between calls.
//!
//! The J2000 ↔ WGS84 pair runs through the analytic Earth-orientation model
//! (precession, truncated nutation, GMST); polar motion is not modeled, see
//! [`crate::earth_orientation`] for the resulting bound.

use nalgebra::{Matrix3, Rotation3, Vector3};

use crate::{
    constants::{Meter, Radian, EARTH_ROTATION_RATE, RADSEC},
    earth_orientation::{nutation_angles, nutation_matrix, obleq, precession_matrix},
    time::{gmst, Epoch},
};

/// Position/velocity state of a spacecraft, expressed in a single frame
/// (J2000 unless a function documents otherwise). Meters and meters/second.
///
/// Owned per call and copied by value between propagation steps; the engine
/// never shares a state buffer across calls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateVector {
    pub position: Vector3<Meter>,
    pub velocity: Vector3<f64>,
}

impl StateVector {
    pub fn new(position: Vector3<f64>, velocity: Vector3<f64>) -> Self {
        Self { position, velocity }
    }

    /// Build a state from `[x, y, z, vx, vy, vz]`.
    pub fn from_array(rv: &[f64; 6]) -> Self {
        Self {
            position: Vector3::new(rv[0], rv[1], rv[2]),
            velocity: Vector3::new(rv[3], rv[4], rv[5]),
        }
    }

    /// Flatten to `[x, y, z, vx, vy, vz]`.
    pub fn to_array(&self) -> [f64; 6] {
        [
            self.position.x,
            self.position.y,
            self.position.z,
            self.velocity.x,
            self.velocity.y,
            self.velocity.z,
        ]
    }
}

/// Attitude of the spacecraft body relative to its reference frame:
/// roll φ (about x), pitch θ (about y), yaw ψ (about z), radians.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct Attitude {
    pub roll: Radian,
    pub pitch: Radian,
    pub yaw: Radian,
}

impl Attitude {
    pub fn new(roll: Radian, pitch: Radian, yaw: Radian) -> Self {
        Self { roll, pitch, yaw }
    }
}

/// Construct a right-handed 3×3 rotation matrix around one of the principal
/// axes (X, Y, or Z).
///
/// Builds an **active rotation** of a 3D vector by an angle `alpha` around
/// the chosen axis, in the direct (counter-clockwise) sense.
///
/// # Arguments
///
/// * `alpha` - Rotation angle in **radians**.
/// * `k` - Index of the axis of rotation: `0` → X, `1` → Y, `2` → Z.
///
/// # Returns
///
/// A 3×3 rotation matrix `R` such that the rotated vector is `x' = R · x`.
/// The returned matrix is orthonormal, so `R.transpose() == R.inverse()`.
///
/// # Panics
///
/// Panics if `k > 2`, as only axes 0–2 are valid.
pub fn rotmt(alpha: f64, k: usize) -> Matrix3<f64> {
    let axis = match k {
        0 => Vector3::x_axis(),
        1 => Vector3::y_axis(),
        2 => Vector3::z_axis(),
        _ => panic!("**** ROTMT: invalid axis index {k} (must be 0,1,2) ****"),
    };

    Rotation3::from_axis_angle(&axis, alpha).into()
}

// -------------------------------------------------------------------------------------------------
// J2000 ↔ WGS84
// -------------------------------------------------------------------------------------------------

/// Rotation matrix from J2000 to the WGS84 Earth-fixed frame at `epoch`.
///
/// Composition: precession to mean-of-date, nutation to true-of-date, then
/// Earth rotation by the Greenwich apparent sidereal time (GMST plus the
/// equation of the equinoxes). Polar motion is neglected.
pub fn dcm_j2000_to_wgs84(epoch: &Epoch) -> Matrix3<f64> {
    let tjm = epoch.mjd_tdt();

    let prec = precession_matrix(tjm);
    let nut = nutation_matrix(tjm);

    let (dpsi, _) = nutation_angles(tjm);
    let equation_of_equinoxes = dpsi * RADSEC * obleq(tjm).cos();
    let gast = gmst(epoch.mjd_utc()) + equation_of_equinoxes;

    rotmt(-gast, 2) * nut * prec
}

/// Rotation matrix from WGS84 to J2000 at `epoch`.
pub fn dcm_wgs84_to_j2000(epoch: &Epoch) -> Matrix3<f64> {
    dcm_j2000_to_wgs84(epoch).transpose()
}

/// Rotate a position vector from J2000 to WGS84.
pub fn j2000_to_wgs84_r(epoch: &Epoch, r_j2000: &Vector3<f64>) -> Vector3<f64> {
    dcm_j2000_to_wgs84(epoch) * r_j2000
}

/// Rotate a position vector from WGS84 to J2000.
pub fn wgs84_to_j2000_r(epoch: &Epoch, r_wgs84: &Vector3<f64>) -> Vector3<f64> {
    dcm_wgs84_to_j2000(epoch) * r_wgs84
}

/// Transform a position/velocity state from J2000 to WGS84.
///
/// The velocity picks up the frame-rotation term: `v_e = C·v_i − ω⊕ × r_e`.
pub fn j2000_to_wgs84_rv(epoch: &Epoch, state: &StateVector) -> StateVector {
    let c = dcm_j2000_to_wgs84(epoch);
    let omega = Vector3::new(0.0, 0.0, EARTH_ROTATION_RATE);

    let r = c * state.position;
    let v = c * state.velocity - omega.cross(&r);
    StateVector::new(r, v)
}

/// Transform a position/velocity state from WGS84 to J2000.
pub fn wgs84_to_j2000_rv(epoch: &Epoch, state: &StateVector) -> StateVector {
    let c = dcm_wgs84_to_j2000(epoch);
    let omega = Vector3::new(0.0, 0.0, EARTH_ROTATION_RATE);

    let r = c * state.position;
    let v = c * (state.velocity + omega.cross(&state.position));
    StateVector::new(r, v)
}

// -------------------------------------------------------------------------------------------------
// Orbit-plane frames (LVLH / VVLH)
// -------------------------------------------------------------------------------------------------

/// Unit triad (radial, along-track, normal) of the orbit at `state`.
///
/// # Panics
///
/// Panics if the state is degenerate (zero radius or zero angular momentum):
/// the orbit-plane frames are undefined there, a contract violation on the
/// caller's side.
fn orbit_triad(state: &StateVector) -> (Vector3<f64>, Vector3<f64>, Vector3<f64>) {
    let r_norm = state.position.norm();
    let h = state.position.cross(&state.velocity);
    let h_norm = h.norm();
    if r_norm == 0.0 || h_norm == 0.0 {
        panic!("**** orbit frame undefined for degenerate state (r or r x v is zero) ****");
    }

    let radial = state.position / r_norm;
    let normal = h / h_norm;
    let along = normal.cross(&radial);
    (radial, along, normal)
}

/// Rotation matrix from LVLH to J2000, given the J2000 state.
///
/// LVLH axes: x = radial outward, y = along-track, z = orbit normal.
pub fn dcm_lvlh_to_j2000(state: &StateVector) -> Matrix3<f64> {
    let (radial, along, normal) = orbit_triad(state);
    Matrix3::from_columns(&[radial, along, normal])
}

/// Rotation matrix from J2000 to LVLH, given the J2000 state.
pub fn dcm_j2000_to_lvlh(state: &StateVector) -> Matrix3<f64> {
    dcm_lvlh_to_j2000(state).transpose()
}

/// Rotation matrix from VVLH to J2000, given the J2000 state.
///
/// VVLH axes: z = nadir (−radial), y = −orbit normal, x completes the triad
/// (close to the velocity direction for near-circular orbits).
pub fn dcm_vvlh_to_j2000(state: &StateVector) -> Matrix3<f64> {
    let (radial, along, normal) = orbit_triad(state);
    Matrix3::from_columns(&[along, -normal, -radial])
}

/// Rotation matrix from J2000 to VVLH, given the J2000 state.
pub fn dcm_j2000_to_vvlh(state: &StateVector) -> Matrix3<f64> {
    dcm_vvlh_to_j2000(state).transpose()
}

/// Constant relabeling matrix from LVLH to VVLH.
///
/// `x_V = y_L`, `y_V = −z_L`, `z_V = −x_L`; independent of the state.
pub fn dcm_lvlh_to_vvlh() -> Matrix3<f64> {
    Matrix3::new(
        0.0, 1.0, 0.0, //
        0.0, 0.0, -1.0, //
        -1.0, 0.0, 0.0,
    )
}

/// Constant relabeling matrix from VVLH to LVLH.
pub fn dcm_vvlh_to_lvlh() -> Matrix3<f64> {
    dcm_lvlh_to_vvlh().transpose()
}

// -------------------------------------------------------------------------------------------------
// Body frame
// -------------------------------------------------------------------------------------------------

/// Rotation matrix from the reference frame to the body frame for a 3-2-1
/// attitude sequence (yaw about z, then pitch about y, then roll about x).
fn dcm_ref_to_body(attitude: &Attitude) -> Matrix3<f64> {
    rotmt(-attitude.roll, 0) * rotmt(-attitude.pitch, 1) * rotmt(-attitude.yaw, 2)
}

/// Rotation matrix from VVLH to the body frame.
pub fn dcm_vvlh_to_body(attitude: &Attitude) -> Matrix3<f64> {
    dcm_ref_to_body(attitude)
}

/// Rotation matrix from the body frame to VVLH.
pub fn dcm_body_to_vvlh(attitude: &Attitude) -> Matrix3<f64> {
    dcm_vvlh_to_body(attitude).transpose()
}

/// Rotation matrix from the body frame to J2000.
///
/// The attitude angles are understood relative to the VVLH frame of the
/// given J2000 state, as produced by the attitude-control convention of the
/// engine: body → VVLH → J2000.
pub fn dcm_body_to_j2000(attitude: &Attitude, state: &StateVector) -> Matrix3<f64> {
    dcm_vvlh_to_j2000(state) * dcm_body_to_vvlh(attitude)
}

/// Rotation matrix from J2000 to the body frame.
pub fn dcm_j2000_to_body(attitude: &Attitude, state: &StateVector) -> Matrix3<f64> {
    dcm_body_to_j2000(attitude, state).transpose()
}

// -------------------------------------------------------------------------------------------------
// Topocentric frames (ESD / NED)
// -------------------------------------------------------------------------------------------------

/// East / north-tangent / geocentric-down triad above a surface position.
///
/// # Panics
///
/// Panics for a zero or polar-axis position vector, where east is undefined.
fn topocentric_triad(r: &Vector3<f64>) -> (Vector3<f64>, Vector3<f64>, Vector3<f64>) {
    let r_norm = r.norm();
    if r_norm == 0.0 {
        panic!("**** topocentric frame undefined at the geocenter ****");
    }
    let up = r / r_norm;

    let east_raw = Vector3::z().cross(&up);
    let east_norm = east_raw.norm();
    if east_norm < 1e-12 {
        panic!("**** topocentric frame undefined on the polar axis ****");
    }
    let east = east_raw / east_norm;
    let north = up.cross(&east);
    let down = -up;
    (east, north, down)
}

/// Rotation matrix from the topocentric East-South-Down frame to J2000,
/// derived from the surface position vector only (geocentric vertical).
pub fn dcm_esd_to_j2000(r_j2000: &Vector3<f64>) -> Matrix3<f64> {
    let (east, north, down) = topocentric_triad(r_j2000);
    Matrix3::from_columns(&[east, -north, down])
}

/// Rotation matrix from J2000 to the East-South-Down frame.
pub fn dcm_j2000_to_esd(r_j2000: &Vector3<f64>) -> Matrix3<f64> {
    dcm_esd_to_j2000(r_j2000).transpose()
}

/// Rotation matrix from the topocentric North-East-Down frame to J2000,
/// derived from the surface position vector only.
pub fn dcm_ned_to_j2000(r_j2000: &Vector3<f64>) -> Matrix3<f64> {
    let (east, north, down) = topocentric_triad(r_j2000);
    Matrix3::from_columns(&[north, east, down])
}

/// Rotation matrix from J2000 to the North-East-Down frame.
pub fn dcm_j2000_to_ned(r_j2000: &Vector3<f64>) -> Matrix3<f64> {
    dcm_ned_to_j2000(r_j2000).transpose()
}

/// Rotation matrix from the body frame to East-South-Down for a 3-2-1
/// attitude sequence relative to ESD.
pub fn dcm_body_to_esd(attitude: &Attitude) -> Matrix3<f64> {
    dcm_ref_to_body(attitude).transpose()
}

/// Rotation matrix from East-South-Down to the body frame.
pub fn dcm_esd_to_body(attitude: &Attitude) -> Matrix3<f64> {
    dcm_ref_to_body(attitude)
}
