//! Interface to master-equation integrators, plus a reference fourth-order
//! Runge-Kutta implementation.
//!
//! The system builder never integrates anything itself: it packages a
//! [`MasterEquation`] and hands it to some [`MasterEquationSolver`]. Any solver
//! satisfying the trait can be swapped in.

use ndarray as nd;
use indexmap::IndexMap;
use crate::{
    envelope::{ Args, Envelope },
    error::SolverError,
    utils::C64,
};

pub mod lindblad;
pub mod rk4;

pub use rk4::Rk4Solver;

/// An operator multiplied by a named time envelope, `f(t) · op`.
#[derive(Clone, Debug)]
pub struct TimeDependentTerm {
    pub op: nd::Array2<C64>,
    pub envelope: Envelope,
}

/// A complete Lindblad problem
/// ```text
/// dρ/dt = -i[H(t), ρ] + Σ_c (c ρ c† - {c† c, ρ} / 2)
/// H(t) = H + Σ_k f_k(t, args) H_k
/// ```
/// to be integrated over the output grid `times`.
#[derive(Clone, Debug)]
pub struct MasterEquation {
    /// Static part of the Hamiltonian.
    pub H: nd::Array2<C64>,
    /// Envelope-modulated parts of the Hamiltonian.
    pub H_t: Vec<TimeDependentTerm>,
    /// Initial density matrix.
    pub rho0: nd::Array2<C64>,
    /// Output time grid.
    pub times: nd::Array1<f64>,
    /// Collapse operators.
    pub c_ops: Vec<nd::Array2<C64>>,
    /// Envelope arguments, namespaced per laser.
    pub args: Args,
}

impl MasterEquation {
    /// Dimension of the Hilbert space.
    pub fn dim(&self) -> usize { self.rho0.nrows() }

    /// Total Hamiltonian at time `t`.
    pub fn hamiltonian_at(&self, t: f64) -> nd::Array2<C64> {
        let mut h = self.H.clone();
        for term in self.H_t.iter() {
            let f = term.envelope.eval(t, &self.args);
            if f != 0.0 {
                h.scaled_add(C64::from(f), &term.op);
            }
        }
        h
    }

    /// Check shapes and the time grid.
    pub fn check(&self) -> Result<(), SolverError> {
        let n = self.dim();
        let expect_shape = |what: String, op: &nd::Array2<C64>| {
            let (r, c) = op.dim();
            if (r, c) == (n, n) {
                Ok(())
            } else {
                Err(SolverError::DimensionMismatch {
                    what,
                    expected: [n, n],
                    found: [r, c],
                })
            }
        };
        expect_shape("rho0".into(), &self.rho0)?;
        expect_shape("H".into(), &self.H)?;
        self.H_t.iter()
            .try_for_each(|term| {
                expect_shape(
                    format!("H_t[{}]", term.envelope.namespace()), &term.op)
            })?;
        self.c_ops.iter().enumerate()
            .try_for_each(|(k, c)| expect_shape(format!("c_ops[{}]", k), c))?;
        let increasing
            = self.times.iter().zip(self.times.iter().skip(1))
            .all(|(t0, t1)| t1 > t0);
        if self.times.is_empty()
            || !increasing
            || self.times.iter().any(|t| !t.is_finite())
        {
            return Err(SolverError::InvalidTimeGrid);
        }
        Ok(())
    }
}

/// Anything that can integrate a [`MasterEquation`].
pub trait MasterEquationSolver {
    fn integrate(&self, problem: &MasterEquation)
        -> Result<Trajectory, SolverError>;
}

/// Density matrices at each point of a time grid.
#[derive(Clone, Debug, PartialEq)]
pub struct Trajectory {
    pub times: nd::Array1<f64>,
    pub states: Vec<nd::Array2<C64>>,
}

/// Expectation value `Tr(op ρ)`.
pub fn expect(op: &nd::Array2<C64>, rho: &nd::Array2<C64>) -> C64 {
    (op * &rho.t()).sum()
}

impl Trajectory {
    pub fn len(&self) -> usize { self.states.len() }

    pub fn is_empty(&self) -> bool { self.states.is_empty() }

    /// State at the last time point.
    pub fn final_state(&self) -> Option<&nd::Array2<C64>> { self.states.last() }

    /// Real part of `<op>` at every time point.
    pub fn expect(&self, op: &nd::Array2<C64>) -> nd::Array1<f64> {
        self.states.iter().map(|rho| expect(op, rho).re).collect()
    }

    /// Expectation values of a whole set of labeled operators.
    pub fn expect_all(&self, e_ops: &IndexMap<String, nd::Array2<C64>>)
        -> IndexMap<String, nd::Array1<f64>>
    {
        e_ops.iter()
            .map(|(label, op)| (label.clone(), self.expect(op)))
            .collect()
    }

    /// Trace of the state at every time point.
    pub fn traces(&self) -> nd::Array1<f64> {
        self.states.iter().map(|rho| rho.diag().sum().re).collect()
    }
}
