#![allow(non_snake_case)]

//! Single-photon emission from a Λ system: a Gaussian pump on `1-2` drives
//! the atom into `3` through a lossy cavity on `3-2`. Prints the fraction of
//! the excitation emitted through the cavity, `2κ ∫ <n> dt`, for a sweep of
//! cavity detunings.

use tracing_subscriber::EnvFilter;
use atomsys::{
    AtomSystem,
    RebuildScope,
    SolveOptions,
    presets,
};

const DETUNINGS: [f64; 5] = [0.0, 1.0, 2.5, 5.0, 10.0];

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn"))
        )
        .init();

    let mut system = AtomSystem::from_description(presets::lambda_cavity())?;
    let dt = {
        let p = system.params();
        (p.t_max - p.t_start) / (p.n_step - 1) as f64
    };
    println!("{:>8}  {:>10}", "Delta_c", "efficiency");
    for Delta in DETUNINGS {
        if let Some(cavity) = system.cavity_mut() {
            cavity.Delta = Delta;
        }
        system.rebuild(RebuildScope::Hamiltonian)?;
        let kappa = system.cavity().map(|c| c.kappa).unwrap_or(0.0);
        let solution = system.solve(SolveOptions::default())?;
        let n = solution.expect("n").unwrap_or_default();
        let eff = 2.0 * kappa * n.sum() * dt;
        println!("{:>8.2}  {:>9.2}%", Delta, 100.0 * eff);
    }
    Ok(())
}
