//! Ready-made system descriptions.

use crate::{
    description::SystemDescription,
    entities::{ Cavity, Decay, Laser, Level },
    params::SystemParams,
};

/// Names accepted by [`by_name`].
pub const NAMES: &[&str] = &[
    "two_level",
    "two_level_decay",
    "two_level_cavity",
    "lambda",
    "lambda_cavity",
];

/// Look up a preset by name.
pub fn by_name(name: &str) -> Option<SystemDescription> {
    match name {
        "two_level" => Some(two_level()),
        "two_level_decay" => Some(two_level_decay()),
        "two_level_cavity" => Some(two_level_cavity()),
        "lambda" => Some(lambda()),
        "lambda_cavity" => Some(lambda_cavity()),
        _ => None,
    }
}

fn params(t_max: f64, n_step: usize) -> SystemParams {
    SystemParams { t_max, n_step, ..SystemParams::default() }
}

/// Resonantly driven two-level atom starting in the ground state.
pub fn two_level() -> SystemDescription {
    SystemDescription {
        lasers: vec![Laser::new("1", "2", 1.0)],
        params: params(5.0, 200),
        ..Default::default()
    }
    .with_level(Level::new("1", 0.0).with_pop([1.0]))
    .with_level(Level::new("2", 0.0))
}

/// Excited two-level atom decaying into its ground state.
pub fn two_level_decay() -> SystemDescription {
    SystemDescription {
        decays: vec![Decay::new("e", "g", 1.0)],
        params: params(5.0, 200),
        ..Default::default()
    }
    .with_level(Level::new("g", 0.0))
    .with_level(Level::new("e", 0.0).with_sl(0.5, 1.0).with_pop([1.0]))
}

/// Excited two-level atom exchanging a photon with a lossless cavity that
/// starts with one photon.
pub fn two_level_cavity() -> SystemDescription {
    SystemDescription {
        cavities: vec![Cavity::new("g", "e", 1.0, 0.0).with_cutoff(10).with_modes(1, 1, 0)],
        params: params(10.0, 200),
        ..Default::default()
    }
    .with_level(Level::new("g", 0.0))
    .with_level(Level::new("e", 0.0).with_pop([1.0]))
}

/// Three-level Λ system driven by two equal resonant lasers.
pub fn lambda() -> SystemDescription {
    SystemDescription {
        lasers: vec![Laser::new("1", "2", 1.0), Laser::new("3", "2", 1.0)],
        params: params(10.0, 200),
        ..Default::default()
    }
    .with_level(Level::new("1", 0.0).with_pop([1.0]))
    .with_level(Level::new("2", 0.0))
    .with_level(Level::new("3", 0.0))
}

/// Λ system in which a Gaussian pump pulse on `1-2` transfers the atom to `3`
/// by emitting a photon into a lossy, detuned cavity on `3-2`.
pub fn lambda_cavity() -> SystemDescription {
    let pump = Laser::new("1", "2", 1.0)
        .with_envelope(
            "gaussian",
            [("sigma", 4.0), ("mu", 10.0), ("t_on", 0.0), ("t_off", 20.0)],
        );
    SystemDescription {
        lasers: vec![pump],
        cavities: vec![
            Cavity::new("3", "2", 1.0, 0.5).with_detuning(5.0).with_cutoff(3),
        ],
        params: params(20.0, 200),
        ..Default::default()
    }
    .with_level(Level::new("1", 0.0).with_pop([1.0]))
    .with_level(Level::new("2", 0.0))
    .with_level(Level::new("3", 0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::AtomSystem;

    #[test]
    fn every_preset_builds() {
        for name in NAMES {
            let desc = by_name(name).unwrap();
            let sys = AtomSystem::from_description(desc.clone()).unwrap();
            assert_eq!(sys.to_description(), desc, "{name}");
        }
        assert!(by_name("four_level").is_none());
    }

    #[test]
    fn lambda_cavity_layout() {
        let sys = AtomSystem::from_description(lambda_cavity()).unwrap();
        assert_eq!(sys.dims(), &[3, 3]);
        assert_eq!(sys.time_dependent_terms().len(), 1);
        assert_eq!(sys.args().get("1-2.mu"), Some(&10.0));
        assert_eq!(sys.collapse_operators().len(), 1);
    }
}
