//! Declarative building blocks of an atomic system: energy levels, laser
//! drives, a cavity, and spontaneous decay channels.
//!
//! These are plain values. They are owned by an
//! [`AtomSystem`][crate::system::AtomSystem], which re-derives its operators
//! only when asked to via [`rebuild`][crate::system::AtomSystem::rebuild].

use serde::{ Deserialize, Serialize };
use crate::{
    error::{ Error, Result },
    polarization::{ self, Vec3 },
};

pub mod level;
pub mod laser;
pub mod cavity;
pub mod decay;

pub use level::Level;
pub use laser::Laser;
pub use cavity::Cavity;
pub use decay::Decay;

/// Propagation direction of a field, either as an angle (in degrees) from the
/// z-axis in the x-z plane or as an explicit vector.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Direction {
    Angle(f64),
    Vector(Vec3),
}

impl Default for Direction {
    fn default() -> Self { Self::Angle(0.0) }
}

impl From<f64> for Direction {
    fn from(angle: f64) -> Self { Self::Angle(angle) }
}

impl From<Vec3> for Direction {
    fn from(k: Vec3) -> Self { Self::Vector(k) }
}

impl Direction {
    /// Cartesian direction vector (not necessarily normalized).
    pub fn vector(&self) -> Vec3 {
        match *self {
            Self::Angle(angle) => polarization::k_from_angle(angle),
            Self::Vector(k) => k,
        }
    }

    pub(crate) fn validate(&self, by: &str) -> Result<()> {
        let k = self.vector();
        if k.iter().any(|x| !x.is_finite()) || k.iter().all(|x| *x == 0.0) {
            return Err(Error::InvalidPolarization {
                by: by.to_string(),
                reason: "propagation direction must be finite and non-zero",
            });
        }
        Ok(())
    }
}

/// Fail with [`Error::InvalidParams`] unless `value` is finite.
pub(crate) fn check_finite(by: &str, what: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(Error::InvalidParams(format!("{}: {} must be finite", by, what)))
    }
}

/// Fail with [`Error::InvalidParams`] unless `value` is finite and
/// non-negative.
pub(crate) fn check_rate(by: &str, what: &str, value: f64) -> Result<()> {
    check_finite(by, what, value)?;
    if value < 0.0 {
        return Err(Error::InvalidParams(
            format!("{}: {} must be non-negative", by, what)));
    }
    Ok(())
}

/// Fail with [`Error::SelfCoupling`] if a coupling joins a level to itself.
pub(crate) fn check_distinct(by: &str, L1: &str, L2: &str) -> Result<()> {
    if L1 == L2 {
        return Err(Error::SelfCoupling {
            level: L1.to_string(),
            by: by.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_forms() {
        let d: Direction = serde_json::from_str("90.0").unwrap();
        assert_eq!(d, Direction::Angle(90.0));
        let d: Direction = serde_json::from_str("[0.0, 1.0, 0.0]").unwrap();
        assert_eq!(d.vector(), [0.0, 1.0, 0.0]);
        assert!(Direction::Vector([0.0; 3]).validate("laser").is_err());
        assert!(Direction::default().validate("laser").is_ok());
    }
}
