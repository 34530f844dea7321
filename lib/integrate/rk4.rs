//! Fixed-step fourth-order Runge-Kutta integration of the Lindblad equation.

use ndarray as nd;
use tracing::debug;
use crate::{ error::SolverError, utils::C64 };
use super::{
    MasterEquation,
    MasterEquationSolver,
    Trajectory,
    lindblad::{ Dissipator, rhs },
};

/// Reference integrator: classic RK4 with uniform sub-steps between output
/// times.
///
/// Each output interval is divided into the smallest number of equal sub-steps
/// no longer than `max_step`. When `renormalize` is set, the state is rescaled
/// to unit trace after every sub-step.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Rk4Solver {
    pub max_step: f64,
    pub renormalize: bool,
}

impl Default for Rk4Solver {
    fn default() -> Self { Self { max_step: 1e-2, renormalize: true } }
}

impl Rk4Solver {
    pub fn new(max_step: f64) -> Self { Self { max_step, ..Self::default() } }

    fn check_state(rho: &nd::Array2<C64>, time: f64)
        -> Result<(), SolverError>
    {
        if rho.iter().any(|z| !z.re.is_finite() || !z.im.is_finite()) {
            return Err(SolverError::NonFinite { time });
        }
        Ok(())
    }
}

impl MasterEquationSolver for Rk4Solver {
    fn integrate(&self, problem: &MasterEquation)
        -> Result<Trajectory, SolverError>
    {
        problem.check()?;
        if !(self.max_step.is_finite() && self.max_step > 0.0) {
            return Err(SolverError::InvalidTimeGrid);
        }
        let dissipators: Vec<Dissipator>
            = problem.c_ops.iter().map(Dissipator::new).collect();
        let t = &problem.times;
        debug!(
            dim = problem.dim(),
            n_times = t.len(),
            n_td = problem.H_t.len(),
            n_c = dissipators.len(),
            "rk4 start",
        );

        let static_h = problem.H_t.is_empty();
        let h_static = problem.H.clone();
        let h_at = |tk: f64| -> nd::Array2<C64> {
            if static_h { h_static.clone() } else { problem.hamiltonian_at(tk) }
        };

        let mut states: Vec<nd::Array2<C64>> = Vec::with_capacity(t.len());
        let mut rho: nd::Array2<C64> = problem.rho0.clone();
        Self::check_state(&rho, t[0])?;
        states.push(rho.clone());
        let mut k1: nd::Array2<C64>;
        let mut k2: nd::Array2<C64>;
        let mut k3: nd::Array2<C64>;
        let mut k4: nd::Array2<C64>;
        let mut norm: C64;
        for (&t0, &t1) in t.iter().zip(t.iter().skip(1)) {
            let nsub = ((t1 - t0) / self.max_step).ceil().max(1.0) as usize;
            let dt = (t1 - t0) / nsub as f64;
            for j in 0..nsub {
                let tj = t0 + dt * j as f64;
                let hk = h_at(tj);
                let hkp1h = h_at(tj + dt / 2.0);
                let hkp1 = h_at(tj + dt);
                k1 = rhs(&hk, &dissipators, &rho);
                k2 = rhs(&hkp1h, &dissipators, &(&rho + &k1 * (dt / 2.0)));
                k3 = rhs(&hkp1h, &dissipators, &(&rho + &k2 * (dt / 2.0)));
                k4 = rhs(&hkp1, &dissipators, &(&rho + &k3 * dt));
                rho = &rho + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (dt / 6.0);
                if self.renormalize {
                    norm = rho.diag().sum();
                    if norm.norm() < f64::EPSILON {
                        return Err(SolverError::VanishingTrace { time: tj + dt });
                    }
                    rho /= norm;
                }
            }
            Self::check_state(&rho, t1)?;
            states.push(rho.clone());
        }
        Ok(Trajectory { times: t.clone(), states })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use crate::{ envelope::Args, hilbert::{ projector, transition } };

    fn two_level(H: nd::Array2<C64>, c_ops: Vec<nd::Array2<C64>>) -> MasterEquation {
        MasterEquation {
            H,
            H_t: Vec::new(),
            rho0: projector(2, 0),
            times: nd::Array1::linspace(0.0, 3.0, 61),
            c_ops,
            args: Args::new(),
        }
    }

    #[test]
    fn rabi_flopping() {
        let omega: f64 = 1.3;
        let h = (transition(2, 0, 1) + transition(2, 1, 0)) * C64::from(omega);
        let traj = Rk4Solver::default().integrate(&two_level(h, Vec::new())).unwrap();
        let pe = traj.expect(&projector(2, 1));
        for (t, p) in traj.times.iter().zip(pe.iter()) {
            assert_relative_eq!(*p, (omega * t).sin().powi(2), epsilon = 1e-8);
        }
    }

    #[test]
    fn exponential_decay_without_renormalization() {
        let gamma: f64 = 0.8;
        let mut problem = two_level(
            nd::Array2::zeros((2, 2)),
            vec![transition(2, 0, 1) * C64::from(gamma.sqrt())],
        );
        problem.rho0 = projector(2, 1);
        let solver = Rk4Solver { renormalize: false, ..Rk4Solver::default() };
        let traj = solver.integrate(&problem).unwrap();
        let pe = traj.expect(&projector(2, 1));
        for ((t, p), tr) in traj.times.iter().zip(pe.iter()).zip(traj.traces()) {
            assert_relative_eq!(*p, (-gamma * t).exp(), epsilon = 1e-8);
            assert_relative_eq!(tr, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn non_finite_states_reported() {
        let h = projector(2, 0) * C64::from(f64::NAN);
        let res = Rk4Solver::default().integrate(&two_level(h, Vec::new()));
        assert!(matches!(res, Err(SolverError::NonFinite { .. })
            | Err(SolverError::VanishingTrace { .. })));
    }
}
