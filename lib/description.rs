//! Declarative, serializable description of an atomic system.
//!
//! ```json
//! {
//!   "levels": { "g": { "J": 0.5, "pop": [0.5, 0.5] }, "e": { "J": 0.5, "L": 1 } },
//!   "lasers": [ { "L1": "g", "L2": "e", "Omega": 1.0, "S": [0, 0, 1] } ],
//!   "cavities": [],
//!   "decays": [ { "L1": "e", "L2": "g", "gamma": 1.0 } ],
//!   "params": { "zeeman": true, "t_max": 10.0 }
//! }
//! ```

use std::path::Path;
use indexmap::IndexMap;
use serde::{ Deserialize, Serialize };
use crate::{
    entities::{ Cavity, Decay, Laser, Level },
    envelope::EnvelopeRegistry,
    error::{ Error, Result },
    params::SystemParams,
    system::AtomSystem,
};

/// Every entity of a system plus its parameters, keyed the way saved
/// descriptions are laid out. Levels are keyed by name.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemDescription {
    #[serde(default)]
    pub levels: IndexMap<String, Level>,
    #[serde(default)]
    pub lasers: Vec<Laser>,
    #[serde(default)]
    pub cavities: Vec<Cavity>,
    #[serde(default)]
    pub decays: Vec<Decay>,
    #[serde(default)]
    pub params: SystemParams,
}

impl SystemDescription {
    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str::<Self>(s)?.named())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_toml(s: &str) -> Result<Self> {
        Ok(toml::from_str::<Self>(s)?.named())
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    /// Read a description from a JSON or TOML file, chosen by extension.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::InvalidParams(
                format!("cannot read {}: {}", path.display(), e)))?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml(&content),
            _ => Self::from_json(&content),
        }
    }

    /// Copy map keys into level names and fill in missing populations.
    fn named(mut self) -> Self {
        for (name, level) in self.levels.iter_mut() {
            level.name = name.clone();
            level.fill_default_pop();
        }
        self
    }

    /// Add a level under its own name.
    pub fn with_level(mut self, level: Level) -> Self {
        self.levels.insert(level.name.clone(), level);
        self
    }
}

impl AtomSystem {
    /// Build a system from a description using the built-in envelopes.
    pub fn from_description(desc: SystemDescription) -> Result<Self> {
        Self::from_description_with(desc, EnvelopeRegistry::default())
    }

    /// Build a system from a description, resolving envelope names in
    /// `envelopes`.
    pub fn from_description_with(
        desc: SystemDescription,
        envelopes: EnvelopeRegistry,
    ) -> Result<Self>
    {
        let SystemDescription { levels, lasers, cavities, decays, params }
            = desc.named();
        if cavities.len() > 1 {
            return Err(Error::InvalidCavity(
                format!("at most one cavity is supported, got {}", cavities.len())));
        }
        let levels: Vec<Level> = levels.into_values().collect();
        let cavity = cavities.into_iter().next();
        Self::build_with(levels, lasers, params, decays, cavity, envelopes)
    }

    /// Describe the current configuration.
    pub fn to_description(&self) -> SystemDescription {
        SystemDescription {
            levels: self.levels().iter()
                .map(|l| (l.name.clone(), l.clone()))
                .collect(),
            lasers: self.lasers().to_vec(),
            cavities: self.cavity().into_iter().cloned().collect(),
            decays: self.decays().to_vec(),
            params: self.params().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Direction;

    const JSON: &str = r#"{
        "levels": {
            "S": { "J": 0.5, "pop": [0.5, 0.5], "energy": 0.0 },
            "P": { "S": 0.5, "L": 1, "J": 0.5, "energy": 1.0 }
        },
        "lasers": [
            {
                "L1": "S", "L2": "P", "Omega": 1.5, "Delta": -0.5, "lw": 0.1,
                "k": 90, "S": [1, 0, 0],
                "func": "gaussian", "args": { "sigma": 0.3 }
            }
        ],
        "cavities": [ { "L1": "S", "L2": "P", "g": 0.2, "kappa": 0.05, "N": 3 } ],
        "decays": [ { "L1": "P", "L2": "S", "gamma": 1.0 } ],
        "params": { "B": 2.0, "zeeman": true, "t_max": 4.0, "n_step": 41 }
    }"#;

    #[test]
    fn json_defaults_and_names() {
        let desc = SystemDescription::from_json(JSON).unwrap();
        assert_eq!(desc.levels["P"].name, "P");
        assert_eq!(desc.levels["P"].pop, vec![0.0, 0.0]);
        assert_eq!(desc.levels["S"].L, 0.0);
        assert_eq!(desc.lasers[0].k, Direction::Angle(90.0));
        assert_eq!(desc.cavities[0].modes, 1);
        assert_eq!(desc.cavities[0].pol, [1.0, 0.0, 1.0]);
        assert!(desc.params.mixed);
    }

    #[test]
    fn system_round_trip() {
        let desc = SystemDescription::from_json(JSON).unwrap();
        let sys = AtomSystem::from_description(desc.clone()).unwrap();
        assert_eq!(sys.dims(), &[4, 3]);
        assert_eq!(sys.args().get("S-P.sigma"), Some(&0.3));
        let back = sys.to_description();
        assert_eq!(back, desc);

        let json = back.to_json().unwrap();
        assert_eq!(SystemDescription::from_json(&json).unwrap(), desc);
        let toml = back.to_toml().unwrap();
        assert_eq!(SystemDescription::from_toml(&toml).unwrap(), desc);
    }

    #[test]
    fn multiple_cavities_rejected() {
        let mut desc = SystemDescription::from_json(JSON).unwrap();
        desc.cavities.push(desc.cavities[0].clone());
        assert!(matches!(
            AtomSystem::from_description(desc),
            Err(Error::InvalidCavity(_)),
        ));
    }
}
