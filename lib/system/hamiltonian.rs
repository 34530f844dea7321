//! Hamiltonian stages of a build: Zeeman term, laser and cavity interactions,
//! detunings, and their total.

use ndarray as nd;
use tracing::{ debug, warn };
use crate::{
    entities::{ Cavity, Laser, Level },
    envelope::{ Args, EnvelopeRegistry },
    error::{ Error, Result },
    gfactors::{ self, GAUSS },
    hilbert::{ Basis, Sublevel, SpinState, dagger, embed },
    integrate::TimeDependentTerm,
    params::SystemParams,
    polarization,
    utils::C64,
};
use super::operators::Structure;

/// Stage 4: diagonal Zeeman Hamiltonian `Σ M w_J B |J M><J M|`.
///
/// Levels with `J = 0` (and every level when Zeeman structure is disabled)
/// contribute nothing.
pub(crate) fn zeeman_term(
    structure: &Structure,
    levels: &[Level],
    params: &SystemParams,
) -> nd::Array2<C64>
{
    let n = structure.dim();
    if !params.zeeman || params.B == 0.0 {
        return nd::Array2::zeros((n, n));
    }
    let shifted: Basis<Sublevel>
        = structure.basis.iter()
        .map(|(state, _)| {
            let w = levels.iter()
                .find(|l| l.name == state.level)
                .and_then(|l| {
                    gfactors::zeeman_shift(l.J(), l.S, l.L, GAUSS, params.freq_scaling)
                })
                .unwrap_or(0.0);
            (state.clone(), state.spin().proj().f() * w * params.B)
        })
        .collect();
    embed(&shifted.energy_operator(), 0, &structure.dims)
}

/// Interaction terms of stage 5.
#[derive(Clone, Debug)]
pub(crate) struct Interactions {
    /// Static laser couplings.
    pub static_terms: Vec<nd::Array2<C64>>,
    /// Envelope-modulated laser couplings.
    pub td_terms: Vec<TimeDependentTerm>,
    /// Namespaced arguments of all envelopes.
    pub args: Args,
    /// Atom-cavity coupling.
    pub cavity: Option<nd::Array2<C64>>,
}

/// Stage 5: laser and cavity couplings.
pub(crate) fn interactions(
    structure: &Structure,
    lasers: &[Laser],
    cavity: Option<&Cavity>,
    params: &SystemParams,
    envelopes: &EnvelopeRegistry,
) -> Result<Interactions>
{
    let n = structure.dim();
    let mut static_terms: Vec<nd::Array2<C64>> = Vec::new();
    let mut td_terms: Vec<TimeDependentTerm> = Vec::new();
    let mut args = Args::new();
    for laser in lasers.iter() {
        let label = laser.label();
        let op = structure.lookup(&laser.L1, &laser.L2)?;
        if op.is_zero() {
            warn!(laser = %label, "laser drives a dipole-forbidden transition");
        }
        let pol_at
            = if params.zeeman {
                let pol = laser.polarization()?;
                Some(
                    polarization::to_atomic_frame(&pol, laser.k.vector(), params.Bdir)
                    .ok_or_else(|| Error::InvalidPolarization {
                        by: format!("laser {}", label),
                        reason: "propagation direction must be non-zero",
                    })?
                )
            } else {
                None
            };
        let HL = op.weighted(pol_at.as_ref());
        let HL_0 = (&HL + &dagger(&HL)) * laser.Omega;
        match laser.func.as_deref() {
            Some(func) => {
                if td_terms.iter().any(|term| term.envelope.namespace() == label) {
                    return Err(Error::EnvelopeNamespaceClash(label));
                }
                let (envelope, laser_args)
                    = envelopes.bind(func, &label, &laser.args, &format!("laser {}", label))?;
                args.extend(laser_args);
                td_terms.push(TimeDependentTerm { op: HL_0, envelope });
            },
            None => { static_terms.push(HL_0); },
        }
    }

    let cavity_term
        = cavity.map(|cav| -> Result<nd::Array2<C64>> {
            let op = structure.lookup(&cav.L1, &cav.L2)?;
            if op.is_zero() {
                warn!(cavity = %cav.label(), "cavity couples a dipole-forbidden transition");
            }
            let mut Hc: nd::Array2<C64> = nd::Array2::zeros((n, n));
            let pols = cav.mode_polarizations();
            let weights = cav.mode_weights();
            for ((a, pol), w) in structure.a.iter().zip(pols.iter()).zip(weights) {
                let HL
                    = if params.zeeman {
                        let pol_at
                            = polarization::to_atomic_frame(pol, cav.k.vector(), params.Bdir)
                            .ok_or_else(|| Error::InvalidPolarization {
                                by: format!("cavity {}", cav.label()),
                                reason: "propagation direction must be non-zero",
                            })?;
                        op.weighted(Some(&pol_at))
                    } else {
                        op.weighted(None) * w
                    };
                let ad = dagger(a);
                Hc = Hc + ad.dot(&HL) * cav.g + a.dot(&dagger(&HL)) * cav.g;
            }
            Ok(Hc)
        })
        .transpose()?;

    debug!(
        n_static = static_terms.len(),
        n_td = td_terms.len(),
        cavity = cavity_term.is_some(),
        "interaction terms built",
    );
    Ok(Interactions { static_terms, td_terms, args, cavity: cavity_term })
}

/// Number of couplings (lasers plus cavity) touching each level.
fn coupling_count(name: &str, lasers: &[Laser], cavity: Option<&Cavity>) -> usize {
    let touches = |L1: &str, L2: &str| usize::from(L1 == name || L2 == name);
    lasers.iter().map(|l| touches(&l.L1, &l.L2)).sum::<usize>()
        + cavity.map(|c| touches(&c.L1, &c.L2)).unwrap_or(0)
}

/// Level of a laser on which its detuning is placed: whichever of its two
/// levels appears in fewer couplings, `L1` on a tie.
pub fn reference_level<'a>(laser: &'a Laser, lasers: &[Laser], cavity: Option<&Cavity>)
    -> &'a str
{
    let n1 = coupling_count(&laser.L1, lasers, cavity);
    let n2 = coupling_count(&laser.L2, lasers, cavity);
    if n2 < n1 { &laser.L2 } else { &laser.L1 }
}

/// Detuning of the first laser sharing a level with the cavity, or 0.
pub fn cavity_reference_detuning(cavity: &Cavity, lasers: &[Laser]) -> f64 {
    lasers.iter()
        .find(|l| {
            [&l.L1, &l.L2].into_iter()
                .any(|x| *x == cavity.L1 || *x == cavity.L2)
        })
        .map(|l| l.Delta)
        .unwrap_or(0.0)
}

/// Stage 6: detuning Hamiltonian `H0`.
pub(crate) fn detuning_term(
    structure: &Structure,
    lasers: &[Laser],
    cavity: Option<&Cavity>,
) -> Result<nd::Array2<C64>>
{
    let n = structure.dim();
    let mut H0: nd::Array2<C64> = nd::Array2::zeros((n, n));
    for laser in lasers.iter() {
        let reference = reference_level(laser, lasers, cavity);
        let proj = structure.level_projector(reference)
            .ok_or_else(|| Error::UnknownLevel {
                name: reference.to_string(),
                by: format!("laser {}", laser.label()),
            })?;
        H0.scaled_add(C64::from(laser.Delta), &proj);
    }
    if let Some(cav) = cavity {
        let delta = cav.Delta - cavity_reference_detuning(cav, lasers);
        for n in structure.photon_numbers().iter() {
            H0.scaled_add(C64::from(delta), n);
        }
    }
    Ok(H0)
}

/// Stage 7: static part of the total Hamiltonian.
pub(crate) fn total(
    H0: &nd::Array2<C64>,
    HB: &nd::Array2<C64>,
    interactions: &Interactions,
) -> nd::Array2<C64>
{
    let mut H = H0 + HB;
    interactions.static_terms.iter().for_each(|h| { H += h; });
    if let Some(Hc) = interactions.cavity.as_ref() {
        H += Hc;
    }
    H
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_level_prefers_unshared() {
        let lasers = vec![
            Laser::new("1", "2", 1.0),
            Laser::new("3", "2", 1.0),
        ];
        assert_eq!(reference_level(&lasers[0], &lasers, None), "1");
        assert_eq!(reference_level(&lasers[1], &lasers, None), "3");

        let ladder = vec![Laser::new("2", "1", 1.0), Laser::new("2", "3", 1.0)];
        assert_eq!(reference_level(&ladder[0], &ladder, None), "1");

        // ties go to L1
        let single = vec![Laser::new("e", "g", 1.0)];
        assert_eq!(reference_level(&single[0], &single, None), "e");

        // the cavity counts as a coupling
        let cav = Cavity::new("2", "3", 1.0, 0.0);
        let one = vec![Laser::new("2", "1", 1.0)];
        assert_eq!(reference_level(&one[0], &one, Some(&cav)), "1");
    }

    #[test]
    fn cavity_detuning_reference() {
        let cav = Cavity::new("2", "3", 1.0, 0.0).with_detuning(0.5);
        let lasers = vec![
            Laser::new("4", "5", 1.0).with_detuning(9.0),
            Laser::new("1", "2", 1.0).with_detuning(0.2),
        ];
        assert_eq!(cavity_reference_detuning(&cav, &lasers), 0.2);
        assert_eq!(cavity_reference_detuning(&cav, &lasers[..1]), 0.0);
    }
}
