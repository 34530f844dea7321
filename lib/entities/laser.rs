use serde::{ Deserialize, Serialize };
use crate::{
    envelope::Args,
    error::{ Error, Result },
    polarization::{ self, Vec3 },
    utils::C64,
};
use super::{ Direction, check_distinct, check_finite, check_rate };

fn default_stokes() -> Vec3 { [0.0, 0.0, 1.0] }

/// A coherent drive between levels `L1` and `L2` with Rabi frequency `Omega`
/// and detuning `Delta`.
///
/// Polarization is given by Stokes parameters `S` relative to the propagation
/// direction `k`. A nonzero linewidth `lw` adds a dephasing channel between the
/// two levels. If `func` names a registered envelope, the coupling is
/// modulated in time with parameters `args`, which are namespaced under
/// [`Self::label`] when the system is solved.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Laser {
    pub L1: String,
    pub L2: String,
    #[serde(default)]
    pub Omega: f64,
    #[serde(default)]
    pub Delta: f64,
    #[serde(default)]
    pub lw: f64,
    #[serde(default)]
    pub k: Direction,
    #[serde(default = "default_stokes")]
    pub S: Vec3,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub func: Option<String>,
    #[serde(default, skip_serializing_if = "Args::is_empty")]
    pub args: Args,
}

impl Laser {
    /// New resonant, σ+-polarized drive along z.
    pub fn new(L1: &str, L2: &str, Omega: f64) -> Self {
        Self {
            L1: L1.to_string(),
            L2: L2.to_string(),
            Omega,
            Delta: 0.0,
            lw: 0.0,
            k: Direction::default(),
            S: default_stokes(),
            func: None,
            args: Args::new(),
        }
    }

    pub fn with_detuning(mut self, Delta: f64) -> Self {
        self.Delta = Delta;
        self
    }

    pub fn with_linewidth(mut self, lw: f64) -> Self {
        self.lw = lw;
        self
    }

    pub fn with_direction<D>(mut self, k: D) -> Self
    where D: Into<Direction>
    {
        self.k = k.into();
        self
    }

    pub fn with_stokes(mut self, S: Vec3) -> Self {
        self.S = S;
        self
    }

    /// Modulate the coupling with the registered envelope `func`.
    pub fn with_envelope<'a, I>(mut self, func: &str, args: I) -> Self
    where I: IntoIterator<Item = (&'a str, f64)>
    {
        self.func = Some(func.to_string());
        self.args = args.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
        self
    }

    /// Identifier `"L1-L2"`, also the namespace of the envelope arguments.
    pub fn label(&self) -> String { format!("{}-{}", self.L1, self.L2) }

    fn by(&self) -> String { format!("laser {}", self.label()) }

    /// Clamped and normalized Stokes vector.
    pub fn stokes(&self) -> Result<Vec3> {
        polarization::normalize_stokes(self.S)
            .ok_or_else(|| Error::InvalidPolarization {
                by: self.by(),
                reason: "Stokes vector must be finite and non-zero",
            })
    }

    /// Spherical polarization `[σ+, π, σ-]` in the laser's own frame.
    pub fn polarization(&self) -> Result<[C64; 3]> {
        self.stokes().map(polarization::stokes_to_spherical)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        let by = self.by();
        check_distinct(&by, &self.L1, &self.L2)?;
        check_finite(&by, "Omega", self.Omega)?;
        check_finite(&by, "Delta", self.Delta)?;
        check_rate(&by, "lw", self.lw)?;
        self.k.validate(&by)?;
        self.stokes()?;
        self.args.iter()
            .try_for_each(|(k, v)| check_finite(&by, k, *v))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_names_and_defaults() {
        let laser: Laser = serde_json::from_str(
            r#"{"L1": "1", "L2": "2", "Omega": 2.0, "k": 90}"#
        ).unwrap();
        assert_eq!(laser.label(), "1-2");
        assert_eq!(laser.S, [0.0, 0.0, 1.0]);
        assert_eq!(laser.k, Direction::Angle(90.0));
        assert!(laser.func.is_none());
        assert!(laser.validate().is_ok());

        let json = serde_json::to_value(&laser).unwrap();
        assert!(json.get("Omega").is_some());
        assert!(json.get("func").is_none());
    }

    #[test]
    fn invalid_lasers() {
        let looped = Laser::new("1", "1", 1.0);
        assert!(matches!(looped.validate(), Err(Error::SelfCoupling { .. })));
        let dark = Laser::new("1", "2", 1.0).with_stokes([0.0; 3]);
        assert!(matches!(dark.validate(), Err(Error::InvalidPolarization { .. })));
        let broad = Laser::new("1", "2", 1.0).with_linewidth(-1.0);
        assert!(matches!(broad.validate(), Err(Error::InvalidParams(_))));
    }

    #[test]
    fn stokes_clamped_before_normalizing() {
        let laser = Laser::new("1", "2", 1.0).with_stokes([4.0, 0.0, 1.0]);
        let s = laser.stokes().unwrap();
        assert!((s[0] - s[2]).abs() < 1e-12);
    }
}
