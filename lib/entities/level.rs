use serde::{ Deserialize, Serialize };
use crate::{
    error::{ Error, Result },
    spin::SpinTotal,
};

fn default_S() -> f64 { 0.5 }

/// An atomic energy level with fine-structure quantum numbers `L`, `S`, `J`.
///
/// The level splits into `2J + 1` magnetic sublevels when Zeeman structure is
/// enabled on the owning system; `pop` holds one initial population per
/// sublevel. `energy` is carried for display only and does not enter the
/// dynamics.
///
/// The name is not part of the serialized form; descriptions key levels by
/// name instead.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Level {
    #[serde(skip)]
    pub name: String,
    #[serde(default = "default_S")]
    pub S: f64,
    #[serde(default)]
    pub L: f64,
    #[serde(default)]
    J: f64,
    #[serde(default)]
    pub pop: Vec<f64>,
    #[serde(default)]
    pub energy: f64,
}

impl Level {
    /// New level with `S = 1/2`, `L = 0` and zero population in every
    /// sublevel.
    pub fn new(name: &str, J: f64) -> Self {
        let mut level = Self {
            name: name.to_string(),
            S: default_S(),
            L: 0.0,
            J,
            pop: Vec::new(),
            energy: 0.0,
        };
        level.fill_default_pop();
        level
    }

    /// Set the spin and orbital angular momenta.
    pub fn with_sl(mut self, S: f64, L: f64) -> Self {
        self.S = S;
        self.L = L;
        self
    }

    /// Set the initial sublevel populations.
    pub fn with_pop<I>(mut self, pop: I) -> Self
    where I: IntoIterator<Item = f64>
    {
        self.pop = pop.into_iter().collect();
        self
    }

    /// Total angular momentum quantum number.
    pub fn J(&self) -> f64 { self.J }

    /// Change the total angular momentum.
    ///
    /// The population list is truncated or zero-padded to the new number of
    /// sublevels. The owning system must be rebuilt with
    /// [`RebuildScope::Full`][crate::system::RebuildScope::Full] afterwards.
    pub fn set_j(&mut self, J: f64) {
        self.J = J;
        let n = self.N();
        self.pop.resize(n, 0.0);
    }

    /// Validated total angular momentum.
    pub fn total(&self) -> Result<SpinTotal> {
        SpinTotal::from_f64(self.J)
            .ok_or_else(|| Error::InvalidQuantumNumber {
                level: self.name.clone(),
                what: "J",
                value: self.J,
            })
    }

    /// Number of magnetic sublevels, `2J + 1` (1 if `J` is invalid).
    pub fn N(&self) -> usize {
        SpinTotal::from_f64(self.J).map(|j| j.multiplicity()).unwrap_or(1)
    }

    /// Total initial population over all sublevels.
    pub fn total_pop(&self) -> f64 { self.pop.iter().sum() }

    pub(crate) fn fill_default_pop(&mut self) {
        if self.pop.is_empty() {
            self.pop = vec![0.0; self.N()];
        }
    }

    /// Check quantum numbers and populations.
    ///
    /// `zeeman` selects whether one population entry per sublevel is required;
    /// without Zeeman structure the entries are summed into a single state and
    /// any non-empty list is accepted.
    pub fn validate(&self, zeeman: bool) -> Result<()> {
        let invalid = |what: &'static str, value: f64| {
            Error::InvalidQuantumNumber { level: self.name.clone(), what, value }
        };
        self.total()?;
        if SpinTotal::from_f64(self.S).is_none() {
            return Err(invalid("S", self.S));
        }
        if SpinTotal::from_f64(self.L).map(|l| l.halves() % 2 != 0).unwrap_or(true) {
            return Err(invalid("L", self.L));
        }
        if let Some(p) = self.pop.iter().find(|p| !p.is_finite() || **p < 0.0) {
            return Err(invalid("population", *p));
        }
        if (zeeman && self.pop.len() != self.N()) || self.pop.is_empty() {
            return Err(Error::PopulationMismatch {
                level: self.name.clone(),
                expected: self.N(),
                found: self.pop.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sublevels_follow_j() {
        let mut level = Level::new("P", 1.5).with_sl(0.5, 1.0);
        assert_eq!(level.N(), 4);
        assert_eq!(level.pop, vec![0.0; 4]);
        let m: Vec<f64>
            = level.total().unwrap().iter().map(|s| s.proj().f()).collect();
        assert_eq!(m, vec![-1.5, -0.5, 0.5, 1.5]);

        level.set_j(0.5);
        assert_eq!(level.N(), 2);
        assert_eq!(level.pop.len(), 2);
        assert!(level.validate(true).is_ok());
    }

    #[test]
    fn validation_failures_name_the_level() {
        let level = Level::new("S", 0.5).with_pop([1.0]);
        match level.validate(true) {
            Err(Error::PopulationMismatch { level, expected, found }) => {
                assert_eq!(level, "S");
                assert_eq!(expected, 2);
                assert_eq!(found, 1);
            },
            other => panic!("unexpected {:?}", other),
        }
        // accepted once sublevels collapse
        assert!(level.validate(false).is_ok());

        let bad_j = Level::new("D", 0.7);
        assert!(matches!(
            bad_j.validate(true),
            Err(Error::InvalidQuantumNumber { what: "J", .. }),
        ));
        let bad_l = Level::new("D", 1.0).with_sl(0.5, 0.5);
        assert!(matches!(
            bad_l.validate(true),
            Err(Error::InvalidQuantumNumber { what: "L", .. }),
        ));
        let neg = Level::new("S", 0.0).with_pop([-1.0]);
        assert!(neg.validate(true).is_err());
    }

    #[test]
    fn missing_pop_deserializes_empty() {
        let mut level: Level = serde_json::from_str(r#"{"J": 1, "L": 1}"#).unwrap();
        level.fill_default_pop();
        assert_eq!(level.pop, vec![0.0; 3]);
        assert_eq!(level.S, 0.5);
    }
}
