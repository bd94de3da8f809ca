pub mod constants;
pub mod earth_orientation;
pub mod ephemeris;
pub mod force_model;
pub mod geodesy;
pub mod geometry;
pub mod hpop_errors;
pub mod integrator;
pub mod kepler;
pub mod orb_elem;
pub mod propagation;
pub mod ref_system;
pub mod time;
