//! Expectation-value operators (stage 9) and the initial state (stage 10).

use ndarray::{ self as nd, linalg::kron };
use indexmap::IndexMap;
use crate::{
    entities::{ Cavity, Level },
    error::{ Error, Result },
    hilbert::{ basis_ket, outer_prod },
    utils::C64,
};
use super::operators::Structure;

/// Labeled projectors onto every sublevel (every level without Zeeman
/// structure), plus photon numbers `n` and `n2` for the cavity modes.
pub(crate) fn expectation_operators(structure: &Structure, zeeman: bool)
    -> IndexMap<String, nd::Array2<C64>>
{
    let mut e_ops: IndexMap<String, nd::Array2<C64>> = IndexMap::new();
    for (name, block) in structure.blocks.iter() {
        let projs = &structure.projectors[name];
        for (i, proj) in block.indices().zip(projs) {
            let label
                = if zeeman {
                    structure.basis.get_index(i)
                        .map(|(s, _)| s.label())
                        .unwrap_or_else(|| name.clone())
                } else {
                    name.clone()
                };
            e_ops.insert(label, proj.clone());
        }
    }
    for (k, n) in structure.photon_numbers().into_iter().enumerate() {
        let label = if k == 0 { "n".to_string() } else { format!("n{}", k + 1) };
        e_ops.insert(label, n);
    }
    e_ops
}

/// Per-state populations of the atomic basis, in index order.
fn atomic_populations(levels: &[Level], zeeman: bool) -> Vec<f64> {
    levels.iter()
        .flat_map(|level| {
            if zeeman { level.pop.clone() } else { vec![level.total_pop()] }
        })
        .collect()
}

/// Initial density matrix.
///
/// Mixed mode gives `Σ_i p_i |i><i| / Σ_i p_i`; coherent mode gives `|ψ><ψ|`
/// with `|ψ> ∝ Σ_i √p_i |i>`. The cavity starts in Fock state `|n>` (`|n2>`
/// for the second mode).
///
/// The coherent amplitudes are `√p_i` rather than `p_i`, so that the diagonal
/// of `ρ` reproduces the declared populations in both modes. With amplitudes
/// `p_i` a superposition declared as `[3, 1]` would start with populations
/// `[0.9, 0.1]` instead of `[0.75, 0.25]`.
pub(crate) fn initial_state(
    structure: &Structure,
    levels: &[Level],
    cavity: Option<&Cavity>,
    zeeman: bool,
    mixed: bool,
) -> Result<nd::Array2<C64>>
{
    let pops = atomic_populations(levels, zeeman);
    let n_atom = structure.dims[0];
    if pops.len() != n_atom {
        // only reachable if populations changed shape after the last build
        return Err(Error::InitialStateShape {
            expected: [n_atom, n_atom],
            found: [pops.len(), pops.len()],
        });
    }
    let total: f64 = pops.iter().sum();
    if !(total > 0.0) {
        return Err(Error::EmptyInitialState);
    }
    let atom: nd::Array2<C64>
        = if mixed {
            structure.basis.get_density_diag(|_, i, _| pops[i] / total)
        } else {
            let psi: nd::Array1<C64>
                = structure.basis.get_vector_weighted(|_, i, _| {
                    C64::from((pops[i] / total).sqrt())
                });
            outer_prod(&psi, &psi)
        };
    let rho0
        = match cavity {
            Some(cav) => {
                cav.initial_photons().into_iter()
                    .fold(atom, |acc, n| {
                        let fock = outer_prod(&basis_ket(cav.N, n), &basis_ket(cav.N, n));
                        kron(&acc, &fock)
                    })
            },
            None => atom,
        };
    Ok(rho0)
}

/// Check a user-supplied initial state against the system dimension.
pub(crate) fn check_initial_state(rho0: &nd::Array2<C64>, dim: usize) -> Result<()> {
    let (r, c) = rho0.dim();
    if (r, c) != (dim, dim) {
        return Err(Error::InitialStateShape { expected: [dim, dim], found: [r, c] });
    }
    if rho0.diag().sum().norm() == 0.0 {
        return Err(Error::EmptyInitialState);
    }
    Ok(())
}
