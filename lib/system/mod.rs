//! The atomic system: configuration entities plus every operator derived from
//! them.
//!
//! Derived operators are produced by a fixed pipeline:
//! 1. basis allocation and sublevel projectors
//! 2. transition operators for every ordered pair of levels
//! 3. extension onto the cavity Fock space
//! 4. Zeeman Hamiltonian
//! 5. laser and cavity interactions
//! 6. detuning Hamiltonian
//! 7. total Hamiltonian
//! 8. collapse operators
//! 9. expectation-value operators
//! 10. initial state
//!
//! Entities are edited through the `*_mut` accessors and the system is then
//! brought up to date with [`AtomSystem::rebuild`]. A rebuild either fully
//! succeeds or leaves the previously derived operators untouched.

use std::time::Instant;
use ndarray as nd;
use indexmap::IndexMap;
use rustc_hash::FxHashSet as HashSet;
use tracing::{ debug, info };
use crate::{
    entities::{ Cavity, Decay, Laser, Level },
    envelope::{ Args, EnvelopeRegistry },
    error::{ Error, Result },
    integrate::{ TimeDependentTerm, Trajectory },
    params::SystemParams,
    utils::C64,
};

pub mod operators;
pub mod hamiltonian;
pub mod dissipation;
pub mod observables;
pub mod solve;

pub use operators::{ TransitionKey, TransitionOp };
pub use hamiltonian::{ cavity_reference_detuning, reference_level };
pub use solve::{ Solution, SolveOptions };

use operators::Structure;
use hamiltonian::Interactions;

/// Which derived operators to regenerate after editing the configuration.
///
/// A scoped rebuild escalates to [`Full`][Self::Full] on its own whenever the
/// layout of the Hilbert space no longer matches the configuration (a level
/// added, removed, or given a new `J`; Zeeman structure toggled; the cavity
/// cutoff or mode count changed).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RebuildScope {
    /// Laser and cavity couplings (`Omega`, `g`, polarizations, envelopes)
    /// and the total Hamiltonian.
    Interaction,
    /// Everything in the Hamiltonian, including detunings and the magnetic
    /// field.
    Hamiltonian,
    /// Collapse operators (`gamma`, `kappa`, laser linewidths).
    Dissipation,
    /// The whole pipeline.
    Full,
}

/// Borrowed view of the configuration, as consumed by the pipeline.
#[derive(Copy, Clone)]
struct Config<'a> {
    levels: &'a [Level],
    lasers: &'a [Laser],
    cavity: Option<&'a Cavity>,
    decays: &'a [Decay],
    params: &'a SystemParams,
    envelopes: &'a EnvelopeRegistry,
}

impl<'a> Config<'a> {
    /// Check every entity and every cross-reference between them.
    fn validate(&self) -> Result<()> {
        self.params.validate()?;
        let mut names: HashSet<&str> = HashSet::default();
        for level in self.levels.iter() {
            if !names.insert(level.name.as_str()) {
                return Err(Error::DuplicateLevel(level.name.clone()));
            }
            level.validate(self.params.zeeman)?;
        }
        let resolve = |name: &str, by: String| -> Result<()> {
            if names.contains(name) {
                Ok(())
            } else {
                Err(Error::UnknownLevel { name: name.to_string(), by })
            }
        };
        for laser in self.lasers.iter() {
            laser.validate()?;
            resolve(&laser.L1, format!("laser {}", laser.label()))?;
            resolve(&laser.L2, format!("laser {}", laser.label()))?;
        }
        for decay in self.decays.iter() {
            decay.validate()?;
            resolve(&decay.L1, format!("decay {}", decay.label()))?;
            resolve(&decay.L2, format!("decay {}", decay.label()))?;
        }
        if let Some(cav) = self.cavity {
            cav.validate()?;
            resolve(&cav.L1, format!("cavity {}", cav.label()))?;
            resolve(&cav.L2, format!("cavity {}", cav.label()))?;
        }
        Ok(())
    }
}

/// Everything produced by the pipeline.
#[derive(Clone, Debug)]
struct Derived {
    structure: Structure,
    HB: nd::Array2<C64>,
    H0: nd::Array2<C64>,
    interactions: Interactions,
    H: nd::Array2<C64>,
    c_ops: Vec<nd::Array2<C64>>,
    e_ops: IndexMap<String, nd::Array2<C64>>,
    rho0: nd::Array2<C64>,
}

impl Derived {
    fn build(config: Config<'_>) -> Result<Self> {
        let Config { levels, lasers, cavity, decays, params, envelopes } = config;
        let structure = Structure::build(levels, cavity, params.zeeman)?;
        let HB = hamiltonian::zeeman_term(&structure, levels, params);
        let interactions
            = hamiltonian::interactions(&structure, lasers, cavity, params, envelopes)?;
        let H0 = hamiltonian::detuning_term(&structure, lasers, cavity)?;
        let H = hamiltonian::total(&H0, &HB, &interactions);
        let c_ops = dissipation::collapse_operators(&structure, decays, cavity, lasers)?;
        let e_ops = observables::expectation_operators(&structure, params.zeeman);
        let rho0 = observables::initial_state(
            &structure, levels, cavity, params.zeeman, params.mixed)?;
        Ok(Self { structure, HB, H0, interactions, H, c_ops, e_ops, rho0 })
    }

    /// Copy of `self` with the stages covered by `scope` regenerated. The
    /// initial state is always regenerated since populations never affect the
    /// layout.
    fn update(&self, scope: RebuildScope, config: Config<'_>) -> Result<Self> {
        let Config { levels, lasers, cavity, decays, params, envelopes } = config;
        if scope == RebuildScope::Full {
            return Self::build(config);
        }
        let mut new = self.clone();
        let s = &self.structure;
        if scope == RebuildScope::Hamiltonian {
            new.HB = hamiltonian::zeeman_term(s, levels, params);
            new.H0 = hamiltonian::detuning_term(s, lasers, cavity)?;
        }
        if matches!(scope, RebuildScope::Interaction | RebuildScope::Hamiltonian) {
            new.interactions
                = hamiltonian::interactions(s, lasers, cavity, params, envelopes)?;
            new.H = hamiltonian::total(&new.H0, &new.HB, &new.interactions);
        }
        if scope == RebuildScope::Dissipation {
            new.c_ops = dissipation::collapse_operators(s, decays, cavity, lasers)?;
        }
        new.rho0 = observables::initial_state(
            s, levels, cavity, params.zeeman, params.mixed)?;
        Ok(new)
    }
}

/// A multilevel atom, optionally coupled to a cavity, together with its
/// derived Lindblad operators.
#[derive(Clone, Debug)]
pub struct AtomSystem {
    levels: Vec<Level>,
    lasers: Vec<Laser>,
    cavity: Option<Cavity>,
    decays: Vec<Decay>,
    params: SystemParams,
    envelopes: EnvelopeRegistry,
    derived: Derived,
    last_state: Option<nd::Array2<C64>>,
    result: Option<Trajectory>,
}

impl AtomSystem {
    /// Validate a configuration and run the full pipeline with the built-in
    /// envelope functions.
    pub fn build(
        levels: Vec<Level>,
        lasers: Vec<Laser>,
        params: SystemParams,
        decays: Vec<Decay>,
        cavity: Option<Cavity>,
    ) -> Result<Self>
    {
        Self::build_with(levels, lasers, params, decays, cavity, EnvelopeRegistry::default())
    }

    /// Like [`build`][Self::build], resolving envelope names in `envelopes`.
    pub fn build_with(
        levels: Vec<Level>,
        lasers: Vec<Laser>,
        params: SystemParams,
        decays: Vec<Decay>,
        cavity: Option<Cavity>,
        envelopes: EnvelopeRegistry,
    ) -> Result<Self>
    {
        let t0 = Instant::now();
        let config = Config {
            levels: &levels,
            lasers: &lasers,
            cavity: cavity.as_ref(),
            decays: &decays,
            params: &params,
            envelopes: &envelopes,
        };
        config.validate()?;
        let derived = Derived::build(config)?;
        info!(
            dim = derived.structure.dim(),
            n_levels = levels.len(),
            n_lasers = lasers.len(),
            n_decays = decays.len(),
            cavity = cavity.is_some(),
            elapsed = ?t0.elapsed(),
            "system built",
        );
        Ok(Self {
            levels,
            lasers,
            cavity,
            decays,
            params,
            envelopes,
            derived,
            last_state: None,
            result: None,
        })
    }

    fn config(&self) -> Config<'_> {
        Config {
            levels: &self.levels,
            lasers: &self.lasers,
            cavity: self.cavity.as_ref(),
            decays: &self.decays,
            params: &self.params,
            envelopes: &self.envelopes,
        }
    }

    /// Regenerate the derived operators covered by `scope` from the current
    /// configuration.
    ///
    /// On failure the previously derived operators are kept. A full rebuild
    /// that changes the dimension of the Hilbert space discards the state
    /// stored for continuation.
    pub fn rebuild(&mut self, scope: RebuildScope) -> Result<()> {
        let t0 = Instant::now();
        let config = self.config();
        config.validate()?;
        let scope
            = if self.derived.structure.matches(
                config.levels, config.cavity, config.params.zeeman)
            {
                scope
            } else {
                debug!(requested = ?scope, "layout changed; escalating to a full rebuild");
                RebuildScope::Full
            };
        let derived = self.derived.update(scope, config)?;
        if derived.structure.dims != self.derived.structure.dims {
            self.last_state = None;
        }
        self.derived = derived;
        info!(?scope, dim = self.dim(), elapsed = ?t0.elapsed(), "system rebuilt");
        Ok(())
    }

    /// Apply a change to the configuration and rebuild everything, restoring
    /// the previous configuration if the rebuild fails.
    fn try_structural<F>(&mut self, change: F) -> Result<()>
    where F: FnOnce(&mut Self)
    {
        let saved = (
            self.levels.clone(),
            self.lasers.clone(),
            self.cavity.clone(),
            self.decays.clone(),
        );
        change(self);
        if let Err(err) = self.rebuild(RebuildScope::Full) {
            (self.levels, self.lasers, self.cavity, self.decays) = saved;
            return Err(err);
        }
        Ok(())
    }

    /// Append a level and rebuild.
    pub fn add_level(&mut self, level: Level) -> Result<()> {
        self.try_structural(|sys| sys.levels.push(level))
    }

    /// Remove a level by name and rebuild. Fails (leaving the system as it
    /// was) if anything still references the level.
    pub fn remove_level(&mut self, name: &str) -> Result<Level> {
        let index = self.levels.iter().position(|l| l.name == name)
            .ok_or_else(|| Error::UnknownLevel {
                name: name.to_string(),
                by: "remove_level".to_string(),
            })?;
        let mut removed: Option<Level> = None;
        self.try_structural(|sys| { removed = Some(sys.levels.remove(index)); })?;
        removed.ok_or(Error::NoSuchEntity("level", index))
    }

    /// Append a laser and rebuild.
    pub fn add_laser(&mut self, laser: Laser) -> Result<()> {
        self.try_structural(|sys| sys.lasers.push(laser))
    }

    /// Remove the laser at `index` and rebuild.
    pub fn remove_laser(&mut self, index: usize) -> Result<Laser> {
        if index >= self.lasers.len() {
            return Err(Error::NoSuchEntity("laser", index));
        }
        let mut removed: Option<Laser> = None;
        self.try_structural(|sys| { removed = Some(sys.lasers.remove(index)); })?;
        removed.ok_or(Error::NoSuchEntity("laser", index))
    }

    /// Append a decay channel and rebuild.
    pub fn add_decay(&mut self, decay: Decay) -> Result<()> {
        self.try_structural(|sys| sys.decays.push(decay))
    }

    /// Remove the decay channel at `index` and rebuild.
    pub fn remove_decay(&mut self, index: usize) -> Result<Decay> {
        if index >= self.decays.len() {
            return Err(Error::NoSuchEntity("decay", index));
        }
        let mut removed: Option<Decay> = None;
        self.try_structural(|sys| { removed = Some(sys.decays.remove(index)); })?;
        removed.ok_or(Error::NoSuchEntity("decay", index))
    }

    /// Replace (or remove, with `None`) the cavity and rebuild, returning the
    /// previous one.
    pub fn set_cavity(&mut self, cavity: Option<Cavity>) -> Result<Option<Cavity>> {
        let mut previous: Option<Cavity> = None;
        self.try_structural(|sys| {
            previous = std::mem::replace(&mut sys.cavity, cavity);
        })?;
        Ok(previous)
    }

    /// Register a custom envelope function. Lasers naming it take effect after
    /// the next [`RebuildScope::Interaction`] (or wider) rebuild.
    pub fn register_envelope<'a, D, F>(&mut self, name: &str, defaults: D, f: F)
    where
        D: IntoIterator<Item = (&'a str, f64)>,
        F: Fn(f64, &Args, &str) -> f64 + 'static,
    {
        self.envelopes.register(name, defaults, f);
    }

    pub fn levels(&self) -> &[Level] { &self.levels }

    pub fn lasers(&self) -> &[Laser] { &self.lasers }

    pub fn cavity(&self) -> Option<&Cavity> { self.cavity.as_ref() }

    pub fn decays(&self) -> &[Decay] { &self.decays }

    pub fn params(&self) -> &SystemParams { &self.params }

    pub fn envelopes(&self) -> &EnvelopeRegistry { &self.envelopes }

    pub fn level(&self, name: &str) -> Option<&Level> {
        self.levels.iter().find(|l| l.name == name)
    }

    /// Mutable access to a level by name. Changing `J` requires a
    /// [`RebuildScope::Full`] rebuild; other fields are picked up by any
    /// scope.
    pub fn level_mut(&mut self, name: &str) -> Option<&mut Level> {
        self.levels.iter_mut().find(|l| l.name == name)
    }

    /// Mutable access to a laser. `Omega` needs
    /// [`RebuildScope::Interaction`], `Delta` needs
    /// [`RebuildScope::Hamiltonian`], `lw` needs
    /// [`RebuildScope::Dissipation`].
    pub fn laser_mut(&mut self, index: usize) -> Option<&mut Laser> {
        self.lasers.get_mut(index)
    }

    /// Mutable access to a decay channel; follow with
    /// [`RebuildScope::Dissipation`].
    pub fn decay_mut(&mut self, index: usize) -> Option<&mut Decay> {
        self.decays.get_mut(index)
    }

    /// Mutable access to the cavity.
    pub fn cavity_mut(&mut self) -> Option<&mut Cavity> { self.cavity.as_mut() }

    /// Mutable access to the parameters. A new field magnitude needs
    /// [`RebuildScope::Hamiltonian`]; the time grid needs no rebuild and is
    /// validated by the next solve.
    pub fn params_mut(&mut self) -> &mut SystemParams { &mut self.params }

    /// Dimension of the full Hilbert space.
    pub fn dim(&self) -> usize { self.derived.structure.dim() }

    /// Tensor factor dimensions: atom first, then each cavity mode.
    pub fn dims(&self) -> &[usize] { &self.derived.structure.dims }

    /// Static part of the total Hamiltonian.
    pub fn hamiltonian(&self) -> &nd::Array2<C64> { &self.derived.H }

    /// Envelope-modulated laser couplings.
    pub fn time_dependent_terms(&self) -> &[TimeDependentTerm] {
        &self.derived.interactions.td_terms
    }

    /// Namespaced arguments of every envelope.
    pub fn args(&self) -> &Args { &self.derived.interactions.args }

    pub fn zeeman_hamiltonian(&self) -> &nd::Array2<C64> { &self.derived.HB }

    pub fn detuning_hamiltonian(&self) -> &nd::Array2<C64> { &self.derived.H0 }

    pub fn cavity_hamiltonian(&self) -> Option<&nd::Array2<C64>> {
        self.derived.interactions.cavity.as_ref()
    }

    pub fn collapse_operators(&self) -> &[nd::Array2<C64>] { &self.derived.c_ops }

    /// Labeled operators whose expectation values are reported by a solve.
    pub fn expectation_operators(&self) -> &IndexMap<String, nd::Array2<C64>> {
        &self.derived.e_ops
    }

    /// Initial state built from the declared populations.
    pub fn initial_state(&self) -> &nd::Array2<C64> { &self.derived.rho0 }

    /// Transition operator `Σ |from><to|`.
    pub fn transition(&self, from: &str, to: &str) -> Result<&TransitionOp> {
        self.derived.structure.lookup(from, to)
    }

    /// Sum of the projectors onto all sublevels of a level.
    pub fn level_projector(&self, name: &str) -> Option<nd::Array2<C64>> {
        self.derived.structure.level_projector(name)
    }

    /// Annihilation operator of each cavity mode.
    pub fn annihilation_operators(&self) -> &[nd::Array2<C64>] { &self.derived.structure.a }

    /// Final state of the previous solve, used for continuation.
    pub fn last_state(&self) -> Option<&nd::Array2<C64>> { self.last_state.as_ref() }

    /// Forget the final state of the previous solve.
    pub fn clear_last_state(&mut self) { self.last_state = None; }

    /// Trajectory of the previous solve.
    pub fn result(&self) -> Option<&Trajectory> { self.result.as_ref() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hilbert::dagger;

    fn lambda() -> AtomSystem {
        AtomSystem::build(
            vec![
                Level::new("1", 0.0).with_pop([1.0]),
                Level::new("2", 0.0),
                Level::new("3", 0.0),
            ],
            vec![
                Laser::new("1", "2", 1.0).with_detuning(0.5),
                Laser::new("3", "2", 1.0),
            ],
            SystemParams::default(),
            vec![Decay::new("2", "1", 0.5)],
            None,
        ).unwrap()
    }

    #[test]
    fn built_operators() {
        let sys = lambda();
        assert_eq!(sys.dim(), 3);
        assert_eq!(sys.hamiltonian(), &dagger(sys.hamiltonian()));
        assert_eq!(sys.collapse_operators().len(), 1);
        assert_eq!(sys.expectation_operators().len(), 3);
        // detuning of 1-2 sits on level 1, the unshared level
        assert_eq!(sys.detuning_hamiltonian()[[0, 0]], C64::from(0.5));
        assert_eq!(sys.detuning_hamiltonian()[[1, 1]], C64::from(0.0));
        assert_eq!(sys.initial_state()[[0, 0]], C64::from(1.0));
    }

    #[test]
    fn configuration_errors() {
        let dangling = AtomSystem::build(
            vec![Level::new("g", 0.0).with_pop([1.0])],
            vec![Laser::new("g", "e", 1.0)],
            SystemParams::default(),
            Vec::new(),
            None,
        );
        assert!(matches!(
            dangling,
            Err(Error::UnknownLevel { ref name, ref by }) if name == "e" && by == "laser g-e"
        ));

        let duplicate = AtomSystem::build(
            vec![Level::new("g", 0.0).with_pop([1.0]), Level::new("g", 0.0)],
            Vec::new(),
            SystemParams::default(),
            Vec::new(),
            None,
        );
        assert!(matches!(duplicate, Err(Error::DuplicateLevel(ref n)) if n == "g"));

        let zeeman = SystemParams { zeeman: true, ..Default::default() };
        let mismatch = AtomSystem::build(
            vec![Level::new("g", 0.5).with_pop([1.0])],
            Vec::new(),
            zeeman,
            Vec::new(),
            None,
        );
        assert!(matches!(
            mismatch,
            Err(Error::PopulationMismatch { expected: 2, found: 1, .. })
        ));
    }

    #[test]
    fn scoped_rebuilds() {
        let mut sys = lambda();
        let h_before = sys.hamiltonian().clone();

        sys.laser_mut(0).unwrap().Omega = 2.0;
        sys.rebuild(RebuildScope::Interaction).unwrap();
        assert_eq!(sys.hamiltonian()[[0, 1]], C64::from(2.0));
        assert_ne!(sys.hamiltonian(), &h_before);

        sys.laser_mut(0).unwrap().Delta = 1.5;
        sys.rebuild(RebuildScope::Interaction).unwrap();
        // detunings untouched by an interaction-only rebuild
        assert_eq!(sys.detuning_hamiltonian()[[0, 0]], C64::from(0.5));
        sys.rebuild(RebuildScope::Hamiltonian).unwrap();
        assert_eq!(sys.detuning_hamiltonian()[[0, 0]], C64::from(1.5));
        assert_eq!(sys.hamiltonian()[[0, 0]], C64::from(1.5));

        sys.decay_mut(0).unwrap().gamma = 2.0;
        sys.rebuild(RebuildScope::Dissipation).unwrap();
        assert_eq!(sys.collapse_operators()[0][[0, 1]], C64::from(2.0_f64.sqrt()));
    }

    #[test]
    fn layout_changes_escalate() {
        let mut sys = lambda();
        sys.params_mut().zeeman = true;
        sys.level_mut("2").unwrap().set_j(1.0);
        // populations of J = 0 levels are still one entry each
        sys.rebuild(RebuildScope::Interaction).unwrap();
        assert_eq!(sys.dim(), 5);
        assert_eq!(sys.expectation_operators().len(), 5);
        assert!(sys.expectation_operators().contains_key("2 mJ=-1"));
    }

    #[test]
    fn failed_rebuild_is_atomic() {
        let mut sys = lambda();
        let h_before = sys.hamiltonian().clone();
        sys.laser_mut(1).unwrap().L1 = "4".to_string();
        assert!(sys.rebuild(RebuildScope::Full).is_err());
        assert_eq!(sys.hamiltonian(), &h_before);
        sys.laser_mut(1).unwrap().L1 = "3".to_string();

        // structural edits roll back on failure
        assert!(sys.remove_level("3").is_err());
        assert_eq!(sys.levels().len(), 3);
        assert_eq!(sys.dim(), 3);

        let removed = sys.remove_laser(1).unwrap();
        assert_eq!(removed.label(), "3-2");
        let level = sys.remove_level("3").unwrap();
        assert_eq!(level.name, "3");
        assert_eq!(sys.dim(), 2);
        assert!(sys.add_laser(Laser::new("1", "3", 1.0)).is_err());
        assert_eq!(sys.lasers().len(), 1);
    }

    #[test]
    fn cavity_can_be_attached() {
        let mut sys = lambda();
        let previous = sys.set_cavity(Some(Cavity::new("3", "2", 1.0, 0.1))).unwrap();
        assert!(previous.is_none());
        assert_eq!(sys.dims(), &[3, 2]);
        assert_eq!(sys.collapse_operators().len(), 2);
        assert!(sys.expectation_operators().contains_key("n"));
        assert!(sys.cavity_hamiltonian().is_some());
    }
}
