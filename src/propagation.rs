//! # Propagation engine
//!
//! Orchestrates single-step and multi-step propagation: validates the
//! caller's configuration, builds the force model, drives the selected
//! integrator (or the closed-form two-body path) and assembles time-stamped
//! output samples.
//!
//! ## Entry points
//!
//! - [`propagate_step`]: one step, with the maneuver acceleration supplied as
//!   a tagged [`ExtraAccel`] (none / inertial vector / body vector plus
//!   attitude).
//! - [`propagate_duration`] and [`propagate_duration_into`]: duration-based
//!   multi-step propagation into a growable trajectory or a caller-owned
//!   buffer, with identical semantics through one internal builder.
//! - [`propagate_steps`]: step-count-based propagation, emitting geodetic
//!   latitude/longitude/altitude with every sample for direct consumption by
//!   visibility tooling.
//! - [`apply_impulse_lvlh`]: instantaneous LVLH-frame velocity impulse.
//!
//! ## Error policy
//!
//! An invalid configuration (incompatible integrator/fidelity pairing,
//! non-positive step, duration or step count, undersized buffer) is rejected
//! before any integration starts; a rejected call never yields samples.
//! Convergence failures inside the integrator surface as
//! [`HpopError::StepControl`] carrying the best reached state.

use crate::{
    constants::GM_EARTH,
    force_model::{DynamicsModel, ExtraAccel, ForceModel, SpacecraftParams},
    geodesy::{j2000_to_lla, GeodeticPosition},
    hpop_errors::HpopError,
    integrator::{Integrator, IntegratorKind, Tolerances},
    kepler::{mean_from_true_anomaly, true_from_mean_anomaly, AnomalySolver},
    orb_elem::{coe_to_rv, rv_to_coe, OrbitClass},
    ref_system::{dcm_lvlh_to_j2000, StateVector},
    time::{CivilDate, Epoch},
};

use nalgebra::Vector3;

/// Full configuration of one propagation call: integrator kind, dynamics
/// fidelity, spacecraft physical parameters and integrator tolerances.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct PropagationConfig {
    pub integrator: IntegratorKind,
    pub dynamics: DynamicsModel,
    pub spacecraft: SpacecraftParams,
    pub tolerances: Tolerances,
}

impl PropagationConfig {
    pub fn new(
        integrator: IntegratorKind,
        dynamics: DynamicsModel,
        spacecraft: SpacecraftParams,
    ) -> Self {
        Self {
            integrator,
            dynamics,
            spacecraft,
            tolerances: Tolerances::default(),
        }
    }

    /// Validate the integrator/fidelity pairing.
    ///
    /// Every numerical integrator accepts every dynamics preset. The
    /// analytic two-body path accepts only [`DynamicsModel::TwoBody`]:
    /// pairing it with a perturbation-inclusive preset is a configuration
    /// error, not a silent fallback.
    pub fn validate(&self) -> Result<(), HpopError> {
        if self.integrator == IntegratorKind::TwoBodyAnalytic && self.dynamics.has_perturbations() {
            return Err(HpopError::InvalidConfiguration(format!(
                "the analytic two-body propagator cannot honor the {:?} dynamics preset",
                self.dynamics
            )));
        }
        if self.spacecraft.mass <= 0.0 {
            return Err(HpopError::InvalidConfiguration(
                "spacecraft mass must be positive".into(),
            ));
        }
        Ok(())
    }

    fn integrator(&self) -> Integrator {
        Integrator::new(self.integrator).with_tolerances(self.tolerances)
    }
}

/// One record of a propagated trajectory: civil UTC epoch, J2000 position
/// and velocity, and (for the step-count entry point) the geodetic
/// latitude/longitude/altitude of the sub-satellite point.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PropagatedSample {
    /// 1-based index of the sample within the call.
    pub number: usize,
    /// Civil UTC epoch of the sample.
    pub epoch: CivilDate,
    /// J2000 position, meters.
    pub position: [f64; 3],
    /// J2000 velocity, meters/second.
    pub velocity: [f64; 3],
    /// Geodetic coordinates, when requested (degrees, degrees, meters).
    pub geodetic: Option<GeodeticPosition>,
}

/// An ordered, caller-owned sequence of samples, index-ordered by increasing
/// time.
pub type Trajectory = Vec<PropagatedSample>;

/// Advance one step of size `h` seconds.
///
/// Arguments
/// ---------
/// * `epoch`: epoch of `state`.
/// * `state`: J2000 position/velocity.
/// * `h`: step size in seconds, strictly positive.
/// * `config`: integrator/dynamics/spacecraft selection, validated before
///   any work is done.
/// * `extra`: maneuver acceleration injection. A body-frame vector is
///   rotated to J2000 against `state` before the step begins.
///
/// Return
/// ------
/// * The epoch and state after the step.
pub fn propagate_step(
    epoch: &Epoch,
    state: &StateVector,
    h: f64,
    config: &PropagationConfig,
    extra: &ExtraAccel,
) -> Result<(Epoch, StateVector), HpopError> {
    config.validate()?;
    if h <= 0.0 {
        return Err(HpopError::InvalidConfiguration(format!(
            "step size must be positive, got {h} s"
        )));
    }
    if config.integrator == IntegratorKind::TwoBodyAnalytic && !matches!(extra, ExtraAccel::None) {
        return Err(HpopError::InvalidConfiguration(
            "the analytic two-body propagator cannot apply an injected acceleration".into(),
        ));
    }

    let next = advance_one_step(epoch, state, h, config, extra)?;
    Ok((epoch.add_seconds(h), next))
}

/// Duration-based multi-step propagation into a growable trajectory.
///
/// Emits one sample per step of size `h` across `t_max` seconds, the first
/// at `epoch + h`. A trailing fraction of `t_max` shorter than one step is
/// not sampled: the output cadence is exactly `h`.
pub fn propagate_duration(
    epoch: &Epoch,
    state: &StateVector,
    h: f64,
    t_max: f64,
    config: &PropagationConfig,
) -> Result<Trajectory, HpopError> {
    let n_steps = duration_step_count(h, t_max)?;
    let mut trajectory = Vec::with_capacity(n_steps);
    run_propagation(epoch, state, h, n_steps, config, false, &mut |sample| {
        trajectory.push(sample)
    })?;
    Ok(trajectory)
}

/// Duration-based multi-step propagation into a caller-owned buffer.
///
/// Identical sampling semantics to [`propagate_duration`]; the number of
/// samples written is returned. A buffer smaller than the sample count is a
/// configuration error detected before any integration.
pub fn propagate_duration_into(
    epoch: &Epoch,
    state: &StateVector,
    h: f64,
    t_max: f64,
    config: &PropagationConfig,
    buffer: &mut [PropagatedSample],
) -> Result<usize, HpopError> {
    let n_steps = duration_step_count(h, t_max)?;
    if buffer.len() < n_steps {
        return Err(HpopError::InvalidConfiguration(format!(
            "output buffer holds {} samples but the propagation produces {n_steps}",
            buffer.len()
        )));
    }

    let mut index = 0;
    run_propagation(epoch, state, h, n_steps, config, false, &mut |sample| {
        buffer[index] = sample;
        index += 1;
    })?;
    Ok(index)
}

/// Step-count-based multi-step propagation with geodetic output.
///
/// Emits exactly `step_count` samples at cadence `h`, each carrying the
/// geodetic latitude/longitude/altitude of the propagated position. This is
/// the variant meant for direct consumption by geometry and visibility
/// tooling.
pub fn propagate_steps(
    epoch: &Epoch,
    state: &StateVector,
    h: f64,
    step_count: usize,
    config: &PropagationConfig,
) -> Result<Trajectory, HpopError> {
    if h <= 0.0 {
        return Err(HpopError::InvalidConfiguration(format!(
            "step size must be positive, got {h} s"
        )));
    }
    if step_count == 0 {
        return Err(HpopError::InvalidConfiguration(
            "step count must be positive".into(),
        ));
    }

    let mut trajectory = Vec::with_capacity(step_count);
    run_propagation(epoch, state, h, step_count, config, true, &mut |sample| {
        trajectory.push(sample)
    })?;
    Ok(trajectory)
}

/// Apply an instantaneous velocity impulse expressed in the LVLH frame of
/// the current state, returning the post-impulse J2000 state.
pub fn apply_impulse_lvlh(state: &StateVector, dv_lvlh: &Vector3<f64>) -> StateVector {
    let dv_j2000 = dcm_lvlh_to_j2000(state) * dv_lvlh;
    StateVector::new(state.position, state.velocity + dv_j2000)
}

/// Number of whole output steps across a duration, with both inputs
/// validated.
fn duration_step_count(h: f64, t_max: f64) -> Result<usize, HpopError> {
    if h <= 0.0 {
        return Err(HpopError::InvalidConfiguration(format!(
            "step size must be positive, got {h} s"
        )));
    }
    if t_max <= 0.0 {
        return Err(HpopError::InvalidConfiguration(format!(
            "propagation duration must be positive, got {t_max} s"
        )));
    }

    // A hair of slack so that t_max = n·h is not truncated to n−1 by
    // floating-point representation.
    let n = (t_max / h + 1e-9).floor() as usize;
    if n == 0 {
        return Err(HpopError::InvalidConfiguration(format!(
            "duration {t_max} s is shorter than one step of {h} s"
        )));
    }
    Ok(n)
}

/// Shared multi-step driver behind every trajectory-producing entry point.
fn run_propagation(
    epoch: &Epoch,
    state: &StateVector,
    h: f64,
    n_steps: usize,
    config: &PropagationConfig,
    with_geodetic: bool,
    sink: &mut dyn FnMut(PropagatedSample),
) -> Result<(), HpopError> {
    config.validate()?;

    let mut current = *state;
    for i in 1..=n_steps {
        current = advance_one_step(
            &epoch.add_seconds((i - 1) as f64 * h),
            &current,
            h,
            config,
            &ExtraAccel::None,
        )?;

        let sample_epoch = epoch.add_seconds(i as f64 * h);
        let geodetic = if with_geodetic {
            Some(j2000_to_lla(&sample_epoch, &current.position))
        } else {
            None
        };

        sink(PropagatedSample {
            number: i,
            epoch: sample_epoch.to_utc(),
            position: [current.position.x, current.position.y, current.position.z],
            velocity: [current.velocity.x, current.velocity.y, current.velocity.z],
            geodetic,
        });
    }
    Ok(())
}

/// One output step: numerical integration or the closed-form Kepler shift.
fn advance_one_step(
    epoch: &Epoch,
    state: &StateVector,
    h: f64,
    config: &PropagationConfig,
    extra: &ExtraAccel,
) -> Result<StateVector, HpopError> {
    if config.integrator == IntegratorKind::TwoBodyAnalytic {
        return kepler_shift(state, h, GM_EARTH);
    }

    let extra_inertial = extra.to_inertial(state);
    let force = ForceModel::new(config.dynamics, config.spacecraft, extra_inertial);
    let epoch0 = *epoch;
    let accel =
        move |dt: f64, s: &StateVector| force.acceleration(&epoch0.add_seconds(dt), s);

    config
        .integrator()
        .advance(&accel, 0.0, state, h)
        .map_err(|failure| HpopError::StepControl {
            seconds_reached: failure.seconds_reached,
            error_norm: failure.error_norm,
            best: failure.best.to_array(),
        })
}

/// Closed-form two-body propagation over `dt` seconds via Kepler's equation.
///
/// Valid for bound elliptical states only; anything else cannot be advanced
/// by the elliptical mean-anomaly shift and is reported as degenerate.
fn kepler_shift(state: &StateVector, dt: f64, mu: f64) -> Result<StateVector, HpopError> {
    let classified = rv_to_coe(state, mu)?;
    if classified.class != OrbitClass::Elliptical {
        return Err(HpopError::DegenerateGeometry(format!(
            "analytic two-body propagation requires an elliptical orbit, got {:?}",
            classified.class
        )));
    }

    let mut coe = classified.elements;
    let mean_motion = (mu / coe.semi_major_axis.powi(3)).sqrt();

    let m0 = mean_from_true_anomaly(coe.eccentricity, coe.true_anomaly);
    let m1 = m0 + mean_motion * dt;
    coe.true_anomaly = true_from_mean_anomaly(coe.eccentricity, m1, AnomalySolver::Newton)?;

    Ok(coe_to_rv(&coe, mu))
}

/// Orbital period of a bound state, seconds. Convenience for sizing
/// propagation windows.
pub fn orbital_period(state: &StateVector, mu: f64) -> Result<f64, HpopError> {
    let classified = rv_to_coe(state, mu)?;
    if classified.class != OrbitClass::Elliptical {
        return Err(HpopError::DegenerateGeometry(
            "orbital period is defined for elliptical orbits only".into(),
        ));
    }
    let a = classified.elements.semi_major_axis;
    Ok(crate::constants::DPI * (a.powi(3) / mu).sqrt())
}
