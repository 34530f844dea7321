//! Collapse operators (stage 8).

use ndarray as nd;
use tracing::debug;
use crate::{
    entities::{ Cavity, Decay, Laser },
    error::{ Error, Result },
    utils::C64,
};
use super::operators::Structure;

/// Collapse operators for spontaneous decay, cavity loss, and laser dephasing.
///
/// A decay from `L1` into `L2` contributes `√γ A_q(L2 -> L1)` for every
/// nonvanishing polarization component `q`; these take population from `L1`
/// to `L2` with Clebsch-Gordan weights normalized so that every sublevel of
/// `L1` decays at total rate `γ`. Each cavity mode contributes `√(2κ) a`, and
/// every laser with nonzero linewidth contributes `√lw (P(L1) - P(L2))`.
pub(crate) fn collapse_operators(
    structure: &Structure,
    decays: &[Decay],
    cavity: Option<&Cavity>,
    lasers: &[Laser],
) -> Result<Vec<nd::Array2<C64>>>
{
    let mut c_ops: Vec<nd::Array2<C64>> = Vec::new();
    for decay in decays.iter() {
        let rate = C64::from(decay.gamma.sqrt());
        let op = structure.lookup(&decay.L2, &decay.L1)?;
        c_ops.extend(
            op.components().iter()
                .filter(|A| A.iter().any(|z| z.norm() > 0.0))
                .map(|A| A * rate)
        );
    }
    if let Some(cav) = cavity {
        let rate = C64::from((2.0 * cav.kappa).sqrt());
        c_ops.extend(structure.a.iter().map(|a| a * rate));
    }
    for laser in lasers.iter().filter(|l| l.lw > 0.0) {
        let proj = |name: &str| {
            structure.level_projector(name)
                .ok_or_else(|| Error::UnknownLevel {
                    name: name.to_string(),
                    by: format!("laser {}", laser.label()),
                })
        };
        let c = (proj(&laser.L1)? - proj(&laser.L2)?) * C64::from(laser.lw.sqrt());
        c_ops.push(c);
    }
    debug!(n_c_ops = c_ops.len(), "collapse operators built");
    Ok(c_ops)
}
