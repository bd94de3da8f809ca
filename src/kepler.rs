//! Kepler's-equation solvers: true anomaly from mean anomaly (Newton
//! iteration or a series expansion for low eccentricities) and the closed
//! form back-conversion.

use crate::constants::DPI;
use crate::hpop_errors::HpopError;
use std::f64::consts::PI;

const NEWTON_MAX_ITER: usize = 30;
const NEWTON_TOL: f64 = 1e-12;

/// Solver selection for the mean → true anomaly conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum AnomalySolver {
    /// Newton iteration on the eccentric anomaly, robust up to e ≈ 0.99.
    Newton,
    /// Equation-of-center series through e⁴, a fast path for small
    /// eccentricities (error ~e⁵, so usable below e ≈ 0.3).
    Series,
}

/// Principal value of an angle in [0, 2π).
pub(crate) fn principal_angle(a: f64) -> f64 {
    a.rem_euclid(DPI)
}

/// Solve Kepler's equation E − e·sinE = M for the eccentric anomaly.
///
/// Newton iteration with a bounded budget; exceeding the budget surfaces
/// [`HpopError::Convergence`] carrying the last iterate, never a silent
/// best-effort value.
pub fn eccentric_from_mean_anomaly(e: f64, mean_anomaly: f64) -> Result<f64, HpopError> {
    let m = principal_angle(mean_anomaly);

    // Danby's starter keeps the iteration monotone for high eccentricities
    let mut ecc_anomaly = if e < 0.8 { m } else { PI };

    for _ in 0..NEWTON_MAX_ITER {
        let f = ecc_anomaly - e * ecc_anomaly.sin() - m;
        let fp = 1.0 - e * ecc_anomaly.cos();
        let delta = -f / fp;
        ecc_anomaly += delta;

        if delta.abs() < NEWTON_TOL {
            return Ok(principal_angle(ecc_anomaly));
        }
    }

    Err(HpopError::Convergence {
        context: "Kepler equation Newton iteration",
        best: principal_angle(ecc_anomaly),
    })
}

/// True anomaly from mean anomaly.
///
/// Arguments
/// ---------
/// * `e`: eccentricity, elliptical branch ([0, 1)).
/// * `mean_anomaly`: radians.
/// * `solver`: [`AnomalySolver::Newton`] or the series fast path.
///
/// Return
/// ------
/// * True anomaly in [0, 2π), or [`HpopError::Convergence`] if the Newton
///   budget is exhausted.
pub fn true_from_mean_anomaly(
    e: f64,
    mean_anomaly: f64,
    solver: AnomalySolver,
) -> Result<f64, HpopError> {
    match solver {
        AnomalySolver::Newton => {
            let ecc_anomaly = eccentric_from_mean_anomaly(e, mean_anomaly)?;
            let sin_f = (1.0 - e * e).sqrt() * ecc_anomaly.sin();
            let cos_f = ecc_anomaly.cos() - e;
            Ok(principal_angle(sin_f.atan2(cos_f)))
        }
        AnomalySolver::Series => {
            let m = principal_angle(mean_anomaly);
            let e2 = e * e;
            let e3 = e2 * e;
            let e4 = e3 * e;

            // Equation of center through e⁴
            let f = m
                + (2.0 * e - 0.25 * e3) * m.sin()
                + (1.25 * e2 - 11.0 / 24.0 * e4) * (2.0 * m).sin()
                + (13.0 / 12.0 * e3) * (3.0 * m).sin()
                + (103.0 / 96.0 * e4) * (4.0 * m).sin();
            Ok(principal_angle(f))
        }
    }
}

/// Mean anomaly from true anomaly (closed form, no iteration).
pub fn mean_from_true_anomaly(e: f64, true_anomaly: f64) -> f64 {
    let sin_e = (1.0 - e * e).sqrt() * true_anomaly.sin();
    let cos_e = e + true_anomaly.cos();
    let ecc_anomaly = sin_e.atan2(cos_e);
    principal_angle(ecc_anomaly - e * ecc_anomaly.sin())
}
