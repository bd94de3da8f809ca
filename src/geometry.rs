//! # Lighting and eclipse geometry
//!
//! Derived quantities over spacecraft positions and trajectories:
//!
//! - **Illumination angles**: the angle between a pointing (or target)
//!   direction and the Sun, Moon and Earth directions, for stray-light and
//!   sensor-blinding analysis.
//! - **Umbra test**: whether a position sits inside the Earth's or the
//!   Moon's shadow, under a parallel-ray (cylindrical) or point-source
//!   (conical) Sun model selected per call.
//! - **Shadow-interval extraction**: partition of an analysis window into
//!   Earth-caused and Moon-caused eclipse intervals from a propagated
//!   trajectory.
//!
//! Interval boundaries are located at the sampling cadence only; no sub-step
//! root finding is performed. A coarser propagation step therefore yields
//! proportionally coarser interval edges.

use itertools::Itertools;
use nalgebra::Vector3;
use smallvec::SmallVec;

use crate::{
    constants::{EARTH_EQUATORIAL_RADIUS, GM_EARTH, MOON_RADIUS, Radian, SUN_RADIUS},
    ephemeris::{lunar_position_j2000, solar_position_j2000},
    hpop_errors::HpopError,
    orb_elem::{coe_to_rv, OrbitalElements},
    propagation::{propagate_step, PropagationConfig},
    ref_system::StateVector,
    force_model::ExtraAccel,
    time::{CivilDate, Epoch},
};

/// Sun model for the shadow test: parallel rays give a cylindrical shadow,
/// a point source gives the finite umbra cone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SunModel {
    Parallel,
    Conical,
}

/// Which body casts the shadow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum OccludingBody {
    Earth,
    Moon,
}

/// Angles between a reference direction and the Sun, Moon and Earth
/// directions, radians.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LightAngles {
    pub sun: Radian,
    pub moon: Radian,
    pub earth: Radian,
}

/// Illumination angles for an explicit pointing vector.
///
/// Arguments
/// ---------
/// * `epoch`: evaluation epoch.
/// * `r_sat`: spacecraft J2000 position, meters.
/// * `pointing`: pointing direction in J2000, any non-zero length.
///
/// Return
/// ------
/// * Angles between the pointing direction and the Sun, Moon and Earth
///   (center) directions as seen from the spacecraft.
pub fn illumination_angles(
    epoch: &Epoch,
    r_sat: &Vector3<f64>,
    pointing: &Vector3<f64>,
) -> Result<LightAngles, HpopError> {
    let p = pointing.try_normalize(0.0).ok_or_else(|| {
        HpopError::DegenerateGeometry("illumination angles need a non-zero pointing vector".into())
    })?;

    let to_sun = solar_position_j2000(epoch) - r_sat;
    let to_moon = lunar_position_j2000(epoch) - r_sat;
    let to_earth = -r_sat;

    Ok(LightAngles {
        sun: separation(&p, &to_sun),
        moon: separation(&p, &to_moon),
        earth: separation(&p, &to_earth),
    })
}

/// Illumination angles for the direction toward a target spacecraft.
///
/// Same as [`illumination_angles`] with the pointing direction taken as
/// `r_target − r_sat`; answers whether the line of sight to the target is
/// close to a bright body.
pub fn illumination_angles_to_target(
    epoch: &Epoch,
    r_sat: &Vector3<f64>,
    r_target: &Vector3<f64>,
) -> Result<LightAngles, HpopError> {
    illumination_angles(epoch, r_sat, &(r_target - r_sat))
}

fn separation(unit: &Vector3<f64>, other: &Vector3<f64>) -> Radian {
    let cos = unit.dot(&other.normalize()).clamp(-1.0, 1.0);
    cos.acos()
}

/// Shadow test against one occluding body.
///
/// `r_rel` is the spacecraft position relative to the body center and
/// `sun_from_body` the Sun position relative to the same center.
fn in_body_shadow(
    r_rel: &Vector3<f64>,
    sun_from_body: &Vector3<f64>,
    body_radius: f64,
    model: SunModel,
) -> bool {
    let s_hat = sun_from_body.normalize();

    // Distance behind the body center along the anti-sun direction
    let behind = -r_rel.dot(&s_hat);
    if behind <= 0.0 {
        return false;
    }
    let perp = (r_rel + behind * s_hat).norm();

    match model {
        SunModel::Parallel => perp < body_radius,
        SunModel::Conical => {
            // Umbra cone apex distance behind the body
            let apex = body_radius * sun_from_body.norm() / (SUN_RADIUS - body_radius);
            if behind >= apex {
                return false;
            }
            perp < body_radius * (1.0 - behind / apex)
        }
    }
}

/// Which body, if any, shadows the given J2000 position at `epoch`.
///
/// Earth is tested first; when both shadows overlap (a rare syzygy
/// geometry) the Earth tag wins.
pub fn umbra_occluder(
    epoch: &Epoch,
    r_sat: &Vector3<f64>,
    model: SunModel,
) -> Option<OccludingBody> {
    let sun = solar_position_j2000(epoch);

    if in_body_shadow(r_sat, &sun, EARTH_EQUATORIAL_RADIUS, model) {
        return Some(OccludingBody::Earth);
    }

    let moon = lunar_position_j2000(epoch);
    if in_body_shadow(&(r_sat - moon), &(sun - moon), MOON_RADIUS, model) {
        return Some(OccludingBody::Moon);
    }

    None
}

/// Umbra flag for a propagated state: true when the spacecraft is in the
/// Earth's or the Moon's shadow.
pub fn is_in_umbra(epoch: &Epoch, state: &StateVector, model: SunModel) -> bool {
    umbra_occluder(epoch, &state.position, model).is_some()
}

/// One eclipse interval: a closed time span in the shadow of one body.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EclipseInterval {
    pub start: Epoch,
    pub end: Epoch,
    pub body: OccludingBody,
}

impl EclipseInterval {
    /// Interval start as civil UTC fields.
    pub fn start_utc(&self) -> CivilDate {
        self.start.to_utc()
    }

    /// Interval end as civil UTC fields.
    pub fn end_utc(&self) -> CivilDate {
        self.end.to_utc()
    }

    /// Interval length in seconds.
    pub fn duration(&self) -> f64 {
        self.end.seconds_since(&self.start)
    }
}

/// Eclipse intervals over an analysis window, split by occluding body. Each
/// sequence is ordered by time and non-overlapping.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct ShadowSchedule {
    pub earth: SmallVec<[EclipseInterval; 4]>,
    pub moon: SmallVec<[EclipseInterval; 2]>,
}

/// Extract the shadow intervals of an orbit across a time window.
///
/// Arguments
/// ---------
/// * `window_start`, `window_end`: analysis window; the orbit state is
///   `elements` at `window_start`.
/// * `elements`: initial orbital elements (elliptical).
/// * `step`: propagation and sampling cadence, seconds. Interval boundaries
///   are resolved to this cadence.
/// * `model`: Sun model for the umbra test.
/// * `config`: propagation configuration driving the trajectory.
///
/// Return
/// ------
/// * A [`ShadowSchedule`] with the Earth-caused and Moon-caused intervals.
pub fn shadow_intervals(
    window_start: &Epoch,
    window_end: &Epoch,
    elements: &OrbitalElements,
    step: f64,
    model: SunModel,
    config: &PropagationConfig,
) -> Result<ShadowSchedule, HpopError> {
    config.validate()?;
    if step <= 0.0 {
        return Err(HpopError::InvalidConfiguration(format!(
            "sampling step must be positive, got {step} s"
        )));
    }
    let window = window_end.seconds_since(window_start);
    if window <= 0.0 {
        return Err(HpopError::InvalidConfiguration(
            "analysis window must end after it starts".into(),
        ));
    }

    let n_steps = (window / step + 1e-9).floor() as usize;

    // Sample the umbra state at the propagation cadence
    let mut samples: Vec<(Epoch, Option<OccludingBody>)> = Vec::with_capacity(n_steps + 1);
    let mut epoch = *window_start;
    let mut state = coe_to_rv(elements, GM_EARTH);
    samples.push((epoch, umbra_occluder(&epoch, &state.position, model)));

    for _ in 0..n_steps {
        let (next_epoch, next_state) =
            propagate_step(&epoch, &state, step, config, &ExtraAccel::None)?;
        epoch = next_epoch;
        state = next_state;
        samples.push((epoch, umbra_occluder(&epoch, &state.position, model)));
    }

    // Contiguous runs of identical shadow state become intervals bounded by
    // their first and last sample
    let mut schedule = ShadowSchedule::default();
    for (key, group) in &samples.iter().chunk_by(|(_, body)| *body) {
        let Some(body) = key else { continue };

        let mut run = group.map(|(epoch, _)| *epoch);
        let first = run.next().expect("chunk_by yields non-empty groups");
        let last = run.last().unwrap_or(first);

        let interval = EclipseInterval {
            start: first,
            end: last,
            body,
        };
        match body {
            OccludingBody::Earth => schedule.earth.push(interval),
            OccludingBody::Moon => schedule.moon.push(interval),
        }
    }

    Ok(schedule)
}
