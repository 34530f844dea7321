//! Solve orchestration: packaging the derived operators into a
//! [`MasterEquation`], choosing the initial state, and keeping the final state
//! for continuation.

use std::time::Instant;
use ndarray as nd;
use indexmap::IndexMap;
use tracing::info;
use crate::{
    error::Result,
    integrate::{ MasterEquation, MasterEquationSolver, Rk4Solver, Trajectory },
    utils::C64,
};
use super::{ AtomSystem, observables };

/// Options for a single solve.
#[derive(Clone, Debug, Default)]
pub struct SolveOptions {
    /// Initial state to use instead of the one built from the declared
    /// populations.
    pub rho0: Option<nd::Array2<C64>>,
    /// Start from the final state of the previous solve, if there is one.
    /// Takes precedence over `rho0`.
    pub continue_from_last: bool,
}

impl SolveOptions {
    pub fn new() -> Self { Self::default() }

    pub fn with_rho0(mut self, rho0: nd::Array2<C64>) -> Self {
        self.rho0 = Some(rho0);
        self
    }

    pub fn continuing(mut self) -> Self {
        self.continue_from_last = true;
        self
    }
}

/// Output of a solve: the state trajectory together with the labeled
/// operators needed to read populations off it.
#[derive(Clone, Debug)]
pub struct Solution {
    pub trajectory: Trajectory,
    pub e_ops: IndexMap<String, nd::Array2<C64>>,
}

impl Solution {
    pub fn times(&self) -> &nd::Array1<f64> { &self.trajectory.times }

    /// Expectation values of the operator with the given label.
    pub fn expect(&self, label: &str) -> Option<nd::Array1<f64>> {
        self.e_ops.get(label).map(|op| self.trajectory.expect(op))
    }

    /// Expectation values of every labeled operator.
    pub fn expect_all(&self) -> IndexMap<String, nd::Array1<f64>> {
        self.trajectory.expect_all(&self.e_ops)
    }
}

impl AtomSystem {
    /// Package the current operators and time grid with the given initial
    /// state.
    pub fn master_equation(&self, rho0: nd::Array2<C64>) -> MasterEquation {
        MasterEquation {
            H: self.derived.H.clone(),
            H_t: self.derived.interactions.td_terms.clone(),
            rho0,
            times: self.params.time_grid(),
            c_ops: self.derived.c_ops.clone(),
            args: self.derived.interactions.args.clone(),
        }
    }

    /// Initial state for a solve: the previous final state when continuing,
    /// else `opts.rho0`, else the state built from the declared populations.
    fn select_initial_state(&self, opts: SolveOptions) -> Result<nd::Array2<C64>> {
        let dim = self.dim();
        let continued
            = self.last_state.as_ref()
            .filter(|_| opts.continue_from_last)
            .cloned();
        match (continued, opts.rho0) {
            (Some(rho), _) => {
                observables::check_initial_state(&rho, dim)?;
                Ok(rho)
            },
            (None, Some(rho)) => {
                observables::check_initial_state(&rho, dim)?;
                Ok(rho)
            },
            (None, None) => Ok(self.derived.rho0.clone()),
        }
    }

    /// Integrate over the configured time grid with the reference
    /// [`Rk4Solver`].
    pub fn solve(&mut self, opts: SolveOptions) -> Result<Solution> {
        self.solve_with(&Rk4Solver::default(), opts)
    }

    /// Integrate over the configured time grid with any solver.
    ///
    /// The final state is kept for a later solve with
    /// [`SolveOptions::continue_from_last`]; the time grid always starts again
    /// at `t_start`. Parameters edited through
    /// [`params_mut`][AtomSystem::params_mut] are checked here.
    pub fn solve_with<S>(&mut self, solver: &S, opts: SolveOptions)
        -> Result<Solution>
    where S: MasterEquationSolver + ?Sized
    {
        self.params.validate()?;
        let t0 = Instant::now();
        let continued = opts.continue_from_last && self.last_state.is_some();
        let rho0 = self.select_initial_state(opts)?;
        let problem = self.master_equation(rho0);
        let trajectory = solver.integrate(&problem)?;
        self.last_state = trajectory.final_state().cloned();
        self.result = Some(trajectory.clone());
        info!(
            dim = problem.dim(),
            n_times = trajectory.len(),
            continued,
            elapsed = ?t0.elapsed(),
            "solve finished",
        );
        Ok(Solution { trajectory, e_ops: self.derived.e_ops.clone() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use crate::{
        entities::{ Laser, Level },
        error::Error,
        hilbert::projector,
        params::SystemParams,
    };

    fn two_level(t_max: f64, n_step: usize) -> AtomSystem {
        AtomSystem::build(
            vec![Level::new("g", 0.0).with_pop([1.0]), Level::new("e", 0.0)],
            vec![Laser::new("g", "e", 1.0)],
            SystemParams { t_max, n_step, ..Default::default() },
            Vec::new(),
            None,
        ).unwrap()
    }

    #[test]
    fn initial_state_precedence() {
        let mut sys = two_level(1.0, 11);
        let excited = projector(2, 1);
        let sol = sys.solve(SolveOptions::new().with_rho0(excited.clone())).unwrap();
        assert_relative_eq!(sol.expect("e").unwrap()[0], 1.0);

        // continuation beats an explicit initial state
        let last = sys.last_state().unwrap().clone();
        let sol = sys.solve(SolveOptions::new().with_rho0(excited).continuing()).unwrap();
        assert_eq!(sol.trajectory.states[0], last);

        sys.clear_last_state();
        let sol = sys.solve(SolveOptions::new().continuing()).unwrap();
        assert_relative_eq!(sol.expect("g").unwrap()[0], 1.0);
    }

    #[test]
    fn wrong_shape_rejected() {
        let mut sys = two_level(1.0, 11);
        let res = sys.solve(SolveOptions::new().with_rho0(projector(3, 0)));
        assert!(matches!(res, Err(Error::InitialStateShape { expected: [2, 2], found: [3, 3] })));
        assert!(sys.result().is_none());
    }

    #[test]
    fn edited_time_grid_is_validated() {
        let mut sys = two_level(1.0, 11);
        sys.params_mut().n_step = 0;
        let res = sys.solve(SolveOptions::default());
        assert!(matches!(res, Err(Error::InvalidParams(_))));

        sys.params_mut().n_step = 11;
        sys.params_mut().t_max = -1.0;
        let res = sys.solve(SolveOptions::default());
        assert!(matches!(res, Err(Error::InvalidParams(_))));
        assert!(sys.result().is_none());

        sys.params_mut().t_max = 1.0;
        assert!(sys.solve(SolveOptions::default()).is_ok());
    }

    #[test]
    fn expectation_labels() {
        let mut sys = two_level(1.0, 11);
        let sol = sys.solve(SolveOptions::default()).unwrap();
        let all = sol.expect_all();
        assert_eq!(all.keys().collect::<Vec<_>>(), vec!["g", "e"]);
        assert_eq!(sol.times().len(), 11);
        assert!(sol.expect("n").is_none());
        for (pg, pe) in all["g"].iter().zip(all["e"].iter()) {
            assert_relative_eq!(pg + pe, 1.0, epsilon = 1e-10);
        }
    }
}
