use approx::assert_relative_eq;

use hpop::force_model::SpacecraftParams;
use hpop::ref_system::StateVector;

/// Spacecraft parameters shared by the integration tests: a small LEO
/// platform with typical area and drag figures.
pub fn test_spacecraft() -> SpacecraftParams {
    SpacecraftParams {
        mass: 400.0,
        fuel_mass: 40.0,
        thrust: 1.0,
        isp: 230.0,
        drag_area: 2.5,
        srp_area: 2.5,
        drag_coeff: 2.2,
        reflectivity: 0.3,
    }
}

/// Assert two states agree component-wise within the given absolute
/// tolerances (meters, meters/second).
pub fn assert_state_close(actual: &StateVector, expected: &StateVector, tol_r: f64, tol_v: f64) {
    for i in 0..3 {
        assert_relative_eq!(actual.position[i], expected.position[i], epsilon = tol_r);
        assert_relative_eq!(actual.velocity[i], expected.velocity[i], epsilon = tol_v);
    }
}
