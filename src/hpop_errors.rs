use thiserror::Error;

/// Error taxonomy of the propagation engine.
///
/// Three failure classes cross the API boundary:
///
/// - [`HpopError::InvalidConfiguration`]: an inconsistent combination of
///   integrator kind, dynamics fidelity, step size, step count or buffer
///   capacity. Always detected before any computation starts; a rejected call
///   never returns partial results.
/// - [`HpopError::Convergence`]: an iterative solver (Kepler Newton iteration,
///   adaptive step-size control) exhausted its retry budget without meeting
///   tolerance. The variant carries the best available approximation so the
///   caller can decide whether it is usable.
/// - [`HpopError::DegenerateGeometry`]: a geometric construction is
///   ill-defined for the given inputs (zero angular momentum, polar surface
///   point for a topocentric frame).
///
/// Documented accuracy bounds (leap-second table currency, analytic ephemeris
/// precision, exponential-atmosphere simplification) are properties of the
/// relevant items, not error variants: they bound the result, they do not
/// invalidate it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HpopError {
    #[error("invalid propagation configuration: {0}")]
    InvalidConfiguration(String),

    #[error("{context} failed to converge (best estimate: {best})")]
    Convergence { context: &'static str, best: f64 },

    #[error(
        "step-size control failed to converge {seconds_reached} s into a step \
         (scaled error {error_norm})"
    )]
    StepControl {
        /// Seconds covered before the retry budget ran out.
        seconds_reached: f64,
        /// Scaled local error of the last attempt (> 1 means tolerance missed).
        error_norm: f64,
        /// Best available state `[x, y, z, vx, vy, vz]` at `seconds_reached`.
        best: [f64; 6],
    },

    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),
}
