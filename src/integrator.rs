//! # Numerical integrators
//!
//! Advances a position/velocity state across one requested output step under
//! a caller-supplied acceleration function. Four numerical schemes:
//!
//! - **Fixed-step RK4**: one classical Runge-Kutta step per call, no error
//!   control.
//! - **Adaptive RK4**: step doubling with Richardson extrapolation; the
//!   cheapest scheme with error control.
//! - **RKF5(6)**: Fehlberg's 8-stage embedded 5(6) pair.
//! - **RKF7(8)**: Fehlberg's 13-stage embedded 7(8) pair (NASA TR R-287),
//!   the workhorse for high-precision propagation.
//!
//! The adaptive schemes substep internally as needed but always return the
//! state at exactly `t + h`: the caller's output cadence is never affected by
//! the internal step-size control.
//!
//! Step control guarantees forward progress through a minimum step floor.
//! Rejections beyond the retry budget surface as
//! [`StepFailure`], carrying the best state reached so far together with the
//! achieved error, never silently swallowed.
//!
//! The fifth [`IntegratorKind`], the analytic two-body path, performs no
//! integration at all; it is dispatched by the propagation engine and
//! rejected here.

use nalgebra::Vector3;

use crate::ref_system::StateVector;

/// Integrator selection, matching the closed set the propagation engine
/// validates against the dynamics fidelity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum IntegratorKind {
    /// Fehlberg 7(8) embedded pair.
    Rk78,
    /// Fehlberg 5(6) embedded pair.
    Rk56,
    /// Step-doubling classical RK4.
    AdaptiveRk4,
    /// Classical RK4, constant step, no error control.
    FixedRk4,
    /// Closed-form Kepler propagation; no numerical integration. Only legal
    /// with the point-mass dynamics preset.
    TwoBodyAnalytic,
}

/// Absolute/relative tolerance pair for the local error test.
///
/// The scaled error of a component y is |err| / (abs + rel·|y|); a step is
/// accepted when the largest scaled component is at most 1.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Tolerances {
    pub abs: f64,
    pub rel: f64,
}

impl Tolerances {
    pub fn new(abs: f64, rel: f64) -> Self {
        Self { abs, rel }
    }
}

impl Default for Tolerances {
    fn default() -> Self {
        // Millimeter-class absolute floor, 1e-10 relative: tight enough for
        // sub-meter trajectories over thousands of steps, loose enough to
        // keep RKF78 near its maximum step.
        Self {
            abs: 1e-3,
            rel: 1e-10,
        }
    }
}

/// Step-size control failure: the error test kept failing after the retry
/// budget, including at the minimum step floor.
///
/// Carries the best state reached (explicit approximate result) so the
/// caller can inspect how far the integration got before giving up.
#[derive(Debug, Clone, PartialEq)]
pub struct StepFailure {
    /// Best state reached within the requested step.
    pub best: StateVector,
    /// Seconds actually covered out of the requested step.
    pub seconds_reached: f64,
    /// Scaled error of the last attempt (> 1 means tolerance missed).
    pub error_norm: f64,
}

/// Acceleration callback: seconds since the step's reference epoch and the
/// current state, returning the net inertial acceleration in m/s².
pub type AccelFn<'a> = dyn Fn(f64, &StateVector) -> Vector3<f64> + 'a;

/// One numerical integrator instance: scheme, tolerances and step-control
/// limits. Holds no mutable state; each [`Integrator::advance`] call is
/// independent.
#[derive(Debug, Clone, Copy)]
pub struct Integrator {
    pub kind: IntegratorKind,
    pub tolerances: Tolerances,
    /// Smallest internal substep (seconds); guarantees forward progress.
    pub min_step: f64,
    /// Retry budget for rejected substeps within one `advance` call.
    pub max_rejections: u32,
}

const SAFETY: f64 = 0.9;
const MAX_SHRINK: f64 = 0.1;
const MAX_GROWTH: f64 = 5.0;

impl Integrator {
    pub fn new(kind: IntegratorKind) -> Self {
        Self {
            kind,
            tolerances: Tolerances::default(),
            min_step: 1e-3,
            max_rejections: 32,
        }
    }

    pub fn with_tolerances(mut self, tolerances: Tolerances) -> Self {
        self.tolerances = tolerances;
        self
    }

    /// Advance `state` from `t0` to `t0 + h` seconds under `accel`.
    ///
    /// Adaptive kinds substep internally; the returned state is always at
    /// exactly `t0 + h`.
    pub fn advance(
        &self,
        accel: &AccelFn,
        t0: f64,
        state: &StateVector,
        h: f64,
    ) -> Result<StateVector, StepFailure> {
        match self.kind {
            IntegratorKind::FixedRk4 => Ok(rk4_step(accel, t0, state, h)),
            IntegratorKind::AdaptiveRk4 => self.drive(accel, t0, state, h, Scheme::DoubledRk4),
            IntegratorKind::Rk56 => self.drive(accel, t0, state, h, Scheme::Rkf56),
            IntegratorKind::Rk78 => self.drive(accel, t0, state, h, Scheme::Rkf78),
            IntegratorKind::TwoBodyAnalytic => Err(StepFailure {
                best: *state,
                seconds_reached: 0.0,
                error_norm: f64::INFINITY,
            }),
        }
    }

    /// Common adaptive driver: substep from 0 to `h`, controlling the local
    /// error of each substep against the tolerances.
    fn drive(
        &self,
        accel: &AccelFn,
        t0: f64,
        state: &StateVector,
        h: f64,
        scheme: Scheme,
    ) -> Result<StateVector, StepFailure> {
        let mut t = 0.0;
        let mut y = *state;
        let mut hs = h;
        let mut rejections = 0u32;

        while t < h {
            let step = hs.min(h - t);
            let (y_new, err) = scheme.step(accel, t0 + t, &y, step);
            let err_norm = scaled_error_norm(&err, &y, &y_new, &self.tolerances);

            let at_floor = step <= self.min_step;
            if err_norm <= 1.0 || at_floor {
                if err_norm > 1.0 {
                    // Forced acceptance at the floor still counts against the
                    // retry budget so a hopeless integration cannot crawl to
                    // the end and report success.
                    rejections += 1;
                    if rejections > self.max_rejections {
                        return Err(StepFailure {
                            best: y_new,
                            seconds_reached: t + step,
                            error_norm: err_norm,
                        });
                    }
                }
                t += step;
                y = y_new;

                let factor = if err_norm > 1e-14 {
                    SAFETY * err_norm.powf(-1.0 / scheme.order())
                } else {
                    MAX_GROWTH
                };
                hs = (step * factor.clamp(MAX_SHRINK, MAX_GROWTH)).max(self.min_step);
            } else {
                rejections += 1;
                if rejections > self.max_rejections {
                    return Err(StepFailure {
                        best: y,
                        seconds_reached: t,
                        error_norm: err_norm,
                    });
                }
                let factor = SAFETY * err_norm.powf(-1.0 / scheme.order());
                hs = (step * factor.clamp(MAX_SHRINK, 1.0)).max(self.min_step);
            }
        }

        Ok(y)
    }
}

/// Largest error component scaled by the mixed absolute/relative tolerance.
fn scaled_error_norm(
    err: &[f64; 6],
    y0: &StateVector,
    y1: &StateVector,
    tol: &Tolerances,
) -> f64 {
    let a0 = y0.to_array();
    let a1 = y1.to_array();

    let mut norm: f64 = 0.0;
    for i in 0..6 {
        let scale = tol.abs + tol.rel * a0[i].abs().max(a1[i].abs());
        norm = norm.max(err[i].abs() / scale);
    }
    norm
}

/// Internal scheme marker for the shared adaptive driver.
#[derive(Clone, Copy)]
enum Scheme {
    DoubledRk4,
    Rkf56,
    Rkf78,
}

impl Scheme {
    /// Step-control exponent base: local truncation order + 1 of the lower
    /// member (5 for doubled RK4, 6 for RKF5(6), 8 for RKF7(8)).
    fn order(&self) -> f64 {
        match self {
            Scheme::DoubledRk4 => 5.0,
            Scheme::Rkf56 => 6.0,
            Scheme::Rkf78 => 8.0,
        }
    }

    /// One trial substep: returns the propagated state (higher-order member)
    /// and the raw component-wise error estimate.
    fn step(&self, accel: &AccelFn, t: f64, y: &StateVector, h: f64) -> (StateVector, [f64; 6]) {
        match self {
            Scheme::DoubledRk4 => doubled_rk4_step(accel, t, y, h),
            Scheme::Rkf56 => embedded_step::<8>(accel, t, y, h, &RKF56),
            Scheme::Rkf78 => embedded_step::<13>(accel, t, y, h, &RKF78),
        }
    }
}

/// Derivative of the state: (velocity, acceleration).
#[derive(Clone, Copy)]
struct Deriv {
    dr: Vector3<f64>,
    dv: Vector3<f64>,
}

fn eval(accel: &AccelFn, t: f64, y: &StateVector) -> Deriv {
    Deriv {
        dr: y.velocity,
        dv: accel(t, y),
    }
}

/// Classical fixed-step RK4.
fn rk4_step(accel: &AccelFn, t: f64, y: &StateVector, h: f64) -> StateVector {
    let k1 = eval(accel, t, y);
    let y2 = offset(y, &[(0.5 * h, &k1)]);
    let k2 = eval(accel, t + 0.5 * h, &y2);
    let y3 = offset(y, &[(0.5 * h, &k2)]);
    let k3 = eval(accel, t + 0.5 * h, &y3);
    let y4 = offset(y, &[(h, &k3)]);
    let k4 = eval(accel, t + h, &y4);

    StateVector::new(
        y.position + h / 6.0 * (k1.dr + 2.0 * k2.dr + 2.0 * k3.dr + k4.dr),
        y.velocity + h / 6.0 * (k1.dv + 2.0 * k2.dv + 2.0 * k3.dv + k4.dv),
    )
}

/// State plus a weighted sum of derivatives.
fn offset(y: &StateVector, terms: &[(f64, &Deriv)]) -> StateVector {
    let mut r = y.position;
    let mut v = y.velocity;
    for (w, k) in terms {
        r += *w * k.dr;
        v += *w * k.dv;
    }
    StateVector::new(r, v)
}

/// Step doubling: one full RK4 step against two half steps, with the
/// Richardson-extrapolated result as the propagated state.
fn doubled_rk4_step(accel: &AccelFn, t: f64, y: &StateVector, h: f64) -> (StateVector, [f64; 6]) {
    let full = rk4_step(accel, t, y, h);
    let half = rk4_step(accel, t, y, 0.5 * h);
    let two_halves = rk4_step(accel, t + 0.5 * h, &half, 0.5 * h);

    let better = StateVector::new(
        two_halves.position + (two_halves.position - full.position) / 15.0,
        two_halves.velocity + (two_halves.velocity - full.velocity) / 15.0,
    );

    let mut err = [0.0; 6];
    let a = two_halves.to_array();
    let b = full.to_array();
    for i in 0..6 {
        err[i] = (a[i] - b[i]) / 15.0;
    }
    (better, err)
}

/// An embedded Runge-Kutta pair with S stages.
///
/// `b` holds the weights of the propagated (higher-order) solution and `e`
/// the error weights, so that the local error estimate is `h · Σ e_i k_i`.
struct EmbeddedPair<const S: usize> {
    c: [f64; S],
    a: [[f64; S]; S],
    b: [f64; S],
    e: [f64; S],
}

fn embedded_step<const S: usize>(
    accel: &AccelFn,
    t: f64,
    y: &StateVector,
    h: f64,
    pair: &EmbeddedPair<S>,
) -> (StateVector, [f64; 6]) {
    let mut k: [Deriv; S] = [Deriv {
        dr: Vector3::zeros(),
        dv: Vector3::zeros(),
    }; S];

    k[0] = eval(accel, t, y);
    for i in 1..S {
        let mut r = y.position;
        let mut v = y.velocity;
        for (j, kj) in k.iter().enumerate().take(i) {
            let a_ij = pair.a[i][j];
            if a_ij != 0.0 {
                r += h * a_ij * kj.dr;
                v += h * a_ij * kj.dv;
            }
        }
        let stage = StateVector::new(r, v);
        k[i] = eval(accel, t + pair.c[i] * h, &stage);
    }

    let mut r = y.position;
    let mut v = y.velocity;
    let mut err_r = Vector3::zeros();
    let mut err_v = Vector3::zeros();
    for i in 0..S {
        if pair.b[i] != 0.0 {
            r += h * pair.b[i] * k[i].dr;
            v += h * pair.b[i] * k[i].dv;
        }
        if pair.e[i] != 0.0 {
            err_r += h * pair.e[i] * k[i].dr;
            err_v += h * pair.e[i] * k[i].dv;
        }
    }

    (
        StateVector::new(r, v),
        [err_r.x, err_r.y, err_r.z, err_v.x, err_v.y, err_v.z],
    )
}

/// Builds an all-zero S×S array with the given lower-triangular rows filled
/// in; keeps the tableau constants readable.
macro_rules! tableau_rows {
    ($s:expr, $( $i:expr => [ $( $v:expr ),* $(,)? ] );* $(;)?) => {{
        let mut a = [[0.0; $s]; $s];
        $(
            let row: &[f64] = &[ $( $v ),* ];
            let mut j = 0;
            while j < row.len() {
                a[$i][j] = row[j];
                j += 1;
            }
        )*
        a
    }};
}

/// Fehlberg 5(6): 8 stages, propagating the 6th-order member. The error
/// estimate collapses to (5/66)(k₁ + k₆ − k₇ − k₈)h.
static RKF56: EmbeddedPair<8> = EmbeddedPair {
    c: [
        0.0,
        1.0 / 6.0,
        4.0 / 15.0,
        2.0 / 3.0,
        4.0 / 5.0,
        1.0,
        0.0,
        1.0,
    ],
    a: tableau_rows!(8,
        1 => [1.0 / 6.0];
        2 => [4.0 / 75.0, 16.0 / 75.0];
        3 => [5.0 / 6.0, -8.0 / 3.0, 5.0 / 2.0];
        4 => [-8.0 / 5.0, 144.0 / 25.0, -4.0, 16.0 / 25.0];
        5 => [361.0 / 320.0, -18.0 / 5.0, 407.0 / 128.0, -11.0 / 80.0, 55.0 / 128.0];
        6 => [-11.0 / 640.0, 0.0, 11.0 / 256.0, -11.0 / 160.0, 11.0 / 256.0, 0.0];
        7 => [93.0 / 640.0, -18.0 / 5.0, 803.0 / 256.0, -11.0 / 160.0, 99.0 / 256.0, 0.0, 1.0];
    ),
    b: [
        7.0 / 1408.0,
        0.0,
        1125.0 / 2816.0,
        9.0 / 32.0,
        125.0 / 768.0,
        0.0,
        5.0 / 66.0,
        5.0 / 66.0,
    ],
    e: [
        5.0 / 66.0,
        0.0,
        0.0,
        0.0,
        0.0,
        5.0 / 66.0,
        -5.0 / 66.0,
        -5.0 / 66.0,
    ],
};

/// Fehlberg 7(8): 13 stages (NASA TR R-287), propagating the 8th-order
/// member. The error estimate collapses to (41/840)(k₁ + k₁₁ − k₁₂ − k₁₃)h.
static RKF78: EmbeddedPair<13> = EmbeddedPair {
    c: [
        0.0,
        2.0 / 27.0,
        1.0 / 9.0,
        1.0 / 6.0,
        5.0 / 12.0,
        1.0 / 2.0,
        5.0 / 6.0,
        1.0 / 6.0,
        2.0 / 3.0,
        1.0 / 3.0,
        1.0,
        0.0,
        1.0,
    ],
    a: tableau_rows!(13,
        1 => [2.0 / 27.0];
        2 => [1.0 / 36.0, 1.0 / 12.0];
        3 => [1.0 / 24.0, 0.0, 1.0 / 8.0];
        4 => [5.0 / 12.0, 0.0, -25.0 / 16.0, 25.0 / 16.0];
        5 => [1.0 / 20.0, 0.0, 0.0, 1.0 / 4.0, 1.0 / 5.0];
        6 => [-25.0 / 108.0, 0.0, 0.0, 125.0 / 108.0, -65.0 / 27.0, 125.0 / 54.0];
        7 => [31.0 / 300.0, 0.0, 0.0, 0.0, 61.0 / 225.0, -2.0 / 9.0, 13.0 / 900.0];
        8 => [2.0, 0.0, 0.0, -53.0 / 6.0, 704.0 / 45.0, -107.0 / 9.0, 67.0 / 90.0, 3.0];
        9 => [-91.0 / 108.0, 0.0, 0.0, 23.0 / 108.0, -976.0 / 135.0, 311.0 / 54.0, -19.0 / 60.0,
              17.0 / 6.0, -1.0 / 12.0];
        10 => [2383.0 / 4100.0, 0.0, 0.0, -341.0 / 164.0, 4496.0 / 1025.0, -301.0 / 82.0,
               2133.0 / 4100.0, 45.0 / 82.0, 45.0 / 164.0, 18.0 / 41.0];
        11 => [3.0 / 205.0, 0.0, 0.0, 0.0, 0.0, -6.0 / 41.0, -3.0 / 205.0, -3.0 / 41.0,
               3.0 / 41.0, 6.0 / 41.0, 0.0];
        12 => [-1777.0 / 4100.0, 0.0, 0.0, -341.0 / 164.0, 4496.0 / 1025.0, -289.0 / 82.0,
               2193.0 / 4100.0, 51.0 / 82.0, 33.0 / 164.0, 12.0 / 41.0, 0.0, 1.0];
    ),
    b: [
        0.0,
        0.0,
        0.0,
        0.0,
        0.0,
        34.0 / 105.0,
        9.0 / 35.0,
        9.0 / 35.0,
        9.0 / 280.0,
        9.0 / 280.0,
        0.0,
        41.0 / 840.0,
        41.0 / 840.0,
    ],
    e: [
        41.0 / 840.0,
        0.0,
        0.0,
        0.0,
        0.0,
        0.0,
        0.0,
        0.0,
        0.0,
        0.0,
        41.0 / 840.0,
        -41.0 / 840.0,
        -41.0 / 840.0,
    ],
};
