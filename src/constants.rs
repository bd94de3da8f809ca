//! # Constants and type definitions for hpop
//!
//! This module centralizes the **physical constants**, **conversion factors**, and **common type
//! definitions** used throughout the `hpop` library.
//!
//! ## Overview
//!
//! - Geophysical and astronomical constants (WGS84 / IAU values)
//! - Unit conversions (degrees ↔ radians, days ↔ seconds)
//! - Core type aliases used across the crate
//! - Pure zero-argument accessors for every constant a caller may need
//!   (gravitational parameters, Earth radii, zonal harmonics, rotation rate,
//!   flattening)
//!
//! All constants are compile-time `const` data. Nothing in this module is
//! mutable at run time, so every accessor is a pure function.

// -------------------------------------------------------------------------------------------------
// Physical constants and unit conversions
// -------------------------------------------------------------------------------------------------

/// 2π, useful for trigonometric conversions
pub const DPI: f64 = 2. * std::f64::consts::PI;

/// Number of seconds in a Julian day
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Astronomical Unit in meters (IAU 2012)
pub const AU: f64 = 1.495_978_707e11;

/// Numerical epsilon used for floating-point comparisons
pub const EPS: f64 = 1e-6;

/// MJD epoch of J2000.0 (2000-01-01 12:00:00 TT)
pub const T2000: f64 = 51544.5;

/// Conversion factor between Julian Date and Modified Julian Date
pub const JDTOMJD: f64 = 2400000.5;

/// Degrees → radians
pub const RADEG: f64 = std::f64::consts::PI / 180.0;

/// Arcseconds → radians
pub const RADSEC: f64 = std::f64::consts::PI / 648000.0;

/// Earth gravitational parameter μ⊕ in m³/s² (WGS84)
pub const GM_EARTH: f64 = 3.986_004_418e14;

/// Moon gravitational parameter in m³/s² (DE405)
pub const GM_MOON: f64 = 4.902_800_066e12;

/// Sun gravitational parameter in m³/s² (DE405)
pub const GM_SUN: f64 = 1.327_124_400_18e20;

/// Earth equatorial radius in meters (WGS84 semi-major axis)
pub const EARTH_EQUATORIAL_RADIUS: f64 = 6_378_137.0;

/// Earth mean radius in meters (IUGG mean radius R1)
pub const EARTH_MEAN_RADIUS: f64 = 6_371_008.8;

/// Earth flattening (WGS84)
pub const EARTH_FLATTENING: f64 = 1.0 / 298.257_223_563;

/// Earth rotation rate in rad/s (WGS84)
pub const EARTH_ROTATION_RATE: f64 = 7.292_115_146_7e-5;

/// Earth second zonal harmonic J₂ (oblateness)
pub const EARTH_J2: f64 = 1.082_626_68e-3;

/// Earth third zonal harmonic J₃
pub const EARTH_J3: f64 = -2.532_656_5e-6;

/// Earth fourth zonal harmonic J₄
pub const EARTH_J4: f64 = -1.619_621_0e-6;

/// Sun mean radius in meters
pub const SUN_RADIUS: f64 = 6.957e8;

/// Moon mean radius in meters
pub const MOON_RADIUS: f64 = 1.737_4e6;

/// Solar radiation pressure at 1 AU in N/m²
pub const SOLAR_PRESSURE_AU: f64 = 4.560e-6;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Angle in arcseconds
pub type ArcSec = f64;
/// Angle in radians
pub type Radian = f64;
/// Distance in meters
pub type Meter = f64;
/// Duration in seconds
pub type Second = f64;

/// Modified Julian Date (days)
pub type MJD = f64;

// -------------------------------------------------------------------------------------------------
// Zero-argument accessors
// -------------------------------------------------------------------------------------------------

/// Earth gravitational parameter μ⊕ (m³/s²).
#[inline]
pub const fn earth_gravity_constant() -> f64 {
    GM_EARTH
}

/// Moon gravitational parameter (m³/s²).
#[inline]
pub const fn lunar_gravity_constant() -> f64 {
    GM_MOON
}

/// Sun gravitational parameter (m³/s²).
#[inline]
pub const fn solar_gravity_constant() -> f64 {
    GM_SUN
}

/// Earth equatorial radius (m).
#[inline]
pub const fn earth_equatorial_radius() -> Meter {
    EARTH_EQUATORIAL_RADIUS
}

/// Earth mean radius (m).
#[inline]
pub const fn earth_mean_radius() -> Meter {
    EARTH_MEAN_RADIUS
}

/// Earth J₂ zonal harmonic coefficient.
#[inline]
pub const fn earth_j2_coefficient() -> f64 {
    EARTH_J2
}

/// Earth J₃ zonal harmonic coefficient.
#[inline]
pub const fn earth_j3_coefficient() -> f64 {
    EARTH_J3
}

/// Earth J₄ zonal harmonic coefficient.
#[inline]
pub const fn earth_j4_coefficient() -> f64 {
    EARTH_J4
}

/// Earth rotation rate ω⊕ (rad/s).
#[inline]
pub const fn earth_rotation_rate() -> f64 {
    EARTH_ROTATION_RATE
}

/// Earth flattening (WGS84).
#[inline]
pub const fn earth_flattening() -> f64 {
    EARTH_FLATTENING
}

/// Radians → degrees.
#[inline]
pub fn rad2deg(alpha: Radian) -> Degree {
    alpha / RADEG
}

/// Degrees → radians.
#[inline]
pub fn deg2rad(alpha: Degree) -> Radian {
    alpha * RADEG
}
