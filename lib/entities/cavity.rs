use serde::{ Deserialize, Serialize };
use crate::{
    c,
    error::{ Error, Result },
    polarization::Vec3,
    utils::C64,
};
use super::{ Direction, check_distinct, check_finite, check_rate };

fn default_N() -> usize { 2 }

fn default_modes() -> usize { 1 }

fn default_pol() -> Vec3 { [1.0, 0.0, 1.0] }

/// A quantized cavity field coupling levels `L1` and `L2`.
///
/// The field has one or two modes, each truncated to `N` Fock states and
/// starting in Fock state `n` (`n2` for the second mode). `pol` is a
/// spherical polarization vector `[σ+, π, σ-]` relative to the cavity axis
/// `k`. With two modes, the first couples through the σ+ component of `pol`
/// and the second through the σ- component.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cavity {
    pub L1: String,
    pub L2: String,
    #[serde(default)]
    pub g: f64,
    #[serde(default)]
    pub kappa: f64,
    #[serde(default)]
    pub Delta: f64,
    #[serde(default = "default_N")]
    pub N: usize,
    #[serde(default)]
    pub n: usize,
    #[serde(default)]
    pub n2: usize,
    #[serde(default = "default_modes")]
    pub modes: usize,
    #[serde(default)]
    pub k: Direction,
    #[serde(default = "default_pol")]
    pub pol: Vec3,
}

impl Cavity {
    /// New single-mode cavity with two Fock states, initially empty.
    pub fn new(L1: &str, L2: &str, g: f64, kappa: f64) -> Self {
        Self {
            L1: L1.to_string(),
            L2: L2.to_string(),
            g,
            kappa,
            Delta: 0.0,
            N: default_N(),
            n: 0,
            n2: 0,
            modes: default_modes(),
            k: Direction::default(),
            pol: default_pol(),
        }
    }

    pub fn with_detuning(mut self, Delta: f64) -> Self {
        self.Delta = Delta;
        self
    }

    /// Set the Fock-space truncation.
    pub fn with_cutoff(mut self, N: usize) -> Self {
        self.N = N;
        self
    }

    /// Set the number of modes and their initial photon numbers.
    pub fn with_modes(mut self, modes: usize, n: usize, n2: usize) -> Self {
        self.modes = modes;
        self.n = n;
        self.n2 = n2;
        self
    }

    pub fn with_direction<D>(mut self, k: D) -> Self
    where D: Into<Direction>
    {
        self.k = k.into();
        self
    }

    pub fn with_polarization(mut self, pol: Vec3) -> Self {
        self.pol = pol;
        self
    }

    pub fn label(&self) -> String { format!("{}-{}", self.L1, self.L2) }

    /// Initial photon number of each mode.
    pub fn initial_photons(&self) -> Vec<usize> {
        [self.n, self.n2].into_iter().take(self.modes).collect()
    }

    /// Spherical polarization `[σ+, π, σ-]` seen by each mode in the cavity
    /// frame.
    pub fn mode_polarizations(&self) -> Vec<[C64; 3]> {
        let [p, z, m] = self.pol;
        match self.modes {
            1 => vec![[c!(p), c!(z), c!(m)]],
            _ => vec![
                [c!(p), c!(0.0), c!(0.0)],
                [c!(0.0), c!(0.0), c!(m)],
            ],
        }
    }

    /// Relative weight of each mode when polarization is ignored (no Zeeman
    /// structure): the magnitude of its component of `pol` relative to the
    /// σ± total, or 1 for a single mode.
    pub fn mode_weights(&self) -> Vec<f64> {
        match self.modes {
            1 => vec![1.0],
            _ => {
                let [p, _, m] = self.pol;
                let norm = (p * p + m * m).sqrt();
                if norm > 0.0 {
                    vec![p.abs() / norm, m.abs() / norm]
                } else {
                    vec![0.0, 0.0]
                }
            },
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        let by = format!("cavity {}", self.label());
        check_distinct(&by, &self.L1, &self.L2)?;
        check_finite(&by, "g", self.g)?;
        check_finite(&by, "Delta", self.Delta)?;
        check_rate(&by, "kappa", self.kappa)?;
        self.k.validate(&by)?;
        if !(1..=2).contains(&self.modes) {
            return Err(Error::InvalidCavity(
                format!("{} modes requested; only 1 or 2 are supported", self.modes)));
        }
        if self.N == 0 {
            return Err(Error::InvalidCavity("Fock cutoff N must be at least 1".into()));
        }
        if let Some(n) = self.initial_photons().into_iter().find(|n| *n >= self.N) {
            return Err(Error::InvalidCavity(
                format!("initial photon number {} exceeds cutoff N = {}", n, self.N)));
        }
        if self.pol.iter().any(|p| !p.is_finite()) {
            return Err(Error::InvalidPolarization {
                by,
                reason: "polarization components must be finite",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn two_mode_split() {
        let cav = Cavity::new("2", "3", 1.0, 0.1)
            .with_modes(2, 1, 0)
            .with_polarization([3.0, 0.0, 4.0]);
        assert!(cav.validate().is_ok());
        assert_eq!(cav.initial_photons(), vec![1, 0]);
        let pols = cav.mode_polarizations();
        assert_eq!(pols[0][2], c!(0.0));
        assert_eq!(pols[1][2], c!(4.0));
        let w = cav.mode_weights();
        assert_relative_eq!(w[0], 0.6);
        assert_relative_eq!(w[1], 0.8);
    }

    #[test]
    fn invalid_cavities() {
        let too_many = Cavity::new("1", "2", 1.0, 0.0).with_modes(3, 0, 0);
        assert!(matches!(too_many.validate(), Err(Error::InvalidCavity(_))));
        let overfull = Cavity::new("1", "2", 1.0, 0.0).with_modes(1, 2, 0);
        assert!(matches!(overfull.validate(), Err(Error::InvalidCavity(_))));
        let leaky = Cavity::new("1", "2", 1.0, -0.5);
        assert!(matches!(leaky.validate(), Err(Error::InvalidParams(_))));
    }

    #[test]
    fn deserialize_defaults() {
        let cav: Cavity = serde_json::from_str(
            r#"{"L1": "2", "L2": "3", "g": 0.5, "kappa": 0.1}"#
        ).unwrap();
        assert_eq!(cav.N, 2);
        assert_eq!(cav.modes, 1);
        assert_eq!(cav.pol, [1.0, 0.0, 1.0]);
    }
}
