//! Structural stages of a build: basis allocation, dipole transition
//! operators, and extension onto the cavity Fock space.

use std::fmt;
use ndarray as nd;
use indexmap::IndexMap;
use rustc_hash::FxHashMap as HashMap;
use tracing::debug;
use crate::{
    entities::{ Cavity, Level },
    error::{ Error, Result },
    hilbert::{
        Basis,
        BasisState,
        LevelBlock,
        Sublevel,
        SpinState,
        destroy,
        embed,
        number,
        sublevels,
        transition,
    },
    spin::{ self, SpinTotal },
    utils::C64,
};

/// Ordered pair of level names identifying a transition operator
/// `Σ |from, m><to, m'|`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransitionKey {
    pub from: String,
    pub to: String,
}

impl TransitionKey {
    pub fn new(from: &str, to: &str) -> Self {
        Self { from: from.to_string(), to: to.to_string() }
    }
}

impl fmt::Display for TransitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// Dipole transition operator between two levels.
#[derive(Clone, Debug, PartialEq)]
pub enum TransitionOp {
    /// Unweighted sum over all sublevel pairs, used when neither level has
    /// magnetic structure. Insensitive to polarization.
    Combined(nd::Array2<C64>),
    /// Clebsch-Gordan-weighted components for `q = -1, 0, +1`.
    Spherical([nd::Array2<C64>; 3]),
}

impl TransitionOp {
    /// All stored components.
    pub fn components(&self) -> &[nd::Array2<C64>] {
        match self {
            Self::Combined(op) => std::slice::from_ref(op),
            Self::Spherical(ops) => ops,
        }
    }

    /// `Σ_q pol_q A_q`, with `pol` in `[σ+, π, σ-]` order paired index-wise
    /// with `q = -1, 0, +1`. Without a polarization, or for a combined
    /// operator, this is the plain sum of components.
    pub fn weighted(&self, pol: Option<&[C64; 3]>) -> nd::Array2<C64> {
        match (self, pol) {
            (Self::Combined(op), _) => op.clone(),
            (Self::Spherical(ops), Some(pol)) => {
                let mut acc = nd::Array2::zeros(ops[0].raw_dim());
                ops.iter().zip(pol)
                    .for_each(|(op, p)| acc.scaled_add(*p, op));
                acc
            },
            (Self::Spherical(ops), None) => {
                ops.iter().fold(nd::Array2::zeros(ops[0].raw_dim()), |acc, op| acc + op)
            },
        }
    }

    /// Return `true` if every component vanishes, as for dipole-forbidden
    /// transitions.
    pub fn is_zero(&self) -> bool {
        self.components().iter().all(|op| op.iter().all(|z| *z == C64::from(0.0)))
    }

    fn map<F>(&self, f: F) -> Self
    where F: Fn(&nd::Array2<C64>) -> nd::Array2<C64>
    {
        match self {
            Self::Combined(op) => Self::Combined(f(op)),
            Self::Spherical([a, b, c]) => Self::Spherical([f(a), f(b), f(c)]),
        }
    }
}

/// Output of the structural stages, everything expressed on the full
/// (atom ⊗ cavity) space.
#[derive(Clone, Debug)]
pub(crate) struct Structure {
    /// Atomic sublevels in index order.
    pub basis: Basis<Sublevel>,
    pub blocks: IndexMap<String, LevelBlock>,
    /// Effective total angular momentum of each level.
    pub totals: IndexMap<String, SpinTotal>,
    /// Tensor factor dimensions: atom first, then one per cavity mode.
    pub dims: Vec<usize>,
    pub projectors: IndexMap<String, Vec<nd::Array2<C64>>>,
    pub transitions: HashMap<TransitionKey, TransitionOp>,
    /// Annihilation operator of each cavity mode.
    pub a: Vec<nd::Array2<C64>>,
}

/// Total angular momentum used for the build: the declared one with Zeeman
/// structure, 0 without.
pub(crate) fn effective_total(level: &Level, zeeman: bool) -> Result<SpinTotal> {
    if zeeman { level.total() } else { Ok(SpinTotal::new(0)) }
}

/// Tensor factor dimensions for a set of levels and optional cavity.
pub(crate) fn factor_dims(levels: &[Level], cavity: Option<&Cavity>, zeeman: bool)
    -> Result<Vec<usize>>
{
    let n_atom: usize
        = levels.iter()
        .map(|l| effective_total(l, zeeman).map(|j| j.multiplicity()))
        .sum::<Result<usize>>()?;
    let mut dims = vec![n_atom];
    if let Some(cav) = cavity {
        dims.extend(std::iter::repeat(cav.N).take(cav.modes));
    }
    Ok(dims)
}

impl Structure {
    /// Stages 1-3.
    pub fn build(levels: &[Level], cavity: Option<&Cavity>, zeeman: bool)
        -> Result<Self>
    {
        // 1. basis allocation and projectors
        let mut blocks: IndexMap<String, LevelBlock> = IndexMap::new();
        let mut totals: IndexMap<String, SpinTotal> = IndexMap::new();
        let mut offset: usize = 0;
        let mut states: Vec<(Sublevel, f64)> = Vec::new();
        for level in levels.iter() {
            let j = effective_total(level, zeeman)?;
            let len = j.multiplicity();
            blocks.insert(level.name.clone(), LevelBlock { offset, len });
            totals.insert(level.name.clone(), j);
            states.extend(sublevels(&level.name, j).map(|s| (s, 0.0)));
            offset += len;
        }
        let basis: Basis<Sublevel> = states.into_iter().collect();
        let n_atom = offset;
        let dims = factor_dims(levels, cavity, zeeman)?;
        debug!(n_atom, ?dims, "basis allocated");

        let projectors: IndexMap<String, Vec<nd::Array2<C64>>>
            = blocks.iter()
            .map(|(name, block)| {
                let projs: Vec<nd::Array2<C64>>
                    = block.indices()
                    .map(|i| embed(&transition(n_atom, i, i), 0, &dims))
                    .collect();
                (name.clone(), projs)
            })
            .collect();

        // 2. transition operators for every ordered pair of distinct levels
        let mut transitions: HashMap<TransitionKey, TransitionOp>
            = HashMap::default();
        for (g, bg) in blocks.iter() {
            for (e, be) in blocks.iter() {
                if g == e { continue; }
                let op = transition_op(&basis, n_atom, (*bg, totals[g]), (*be, totals[e]));
                transitions.insert(TransitionKey::new(g, e), op);
            }
        }
        debug!(n_pairs = transitions.len(), "transition operators built");

        // 3. cavity extension
        let a: Vec<nd::Array2<C64>>
            = dims.iter().enumerate().skip(1)
            .map(|(k, n)| embed(&destroy(*n), k, &dims))
            .collect();
        if !a.is_empty() {
            transitions.values_mut()
                .for_each(|op| { *op = op.map(|x| embed(x, 0, &dims)); });
            debug!(modes = a.len(), total_dim = dims.iter().product::<usize>(), "cavity extension");
        }

        Ok(Self { basis, blocks, totals, dims, projectors, transitions, a })
    }

    /// Dimension of the full space.
    pub fn dim(&self) -> usize { self.dims.iter().product() }

    /// Photon-number operator of each cavity mode on the full space.
    pub fn photon_numbers(&self) -> Vec<nd::Array2<C64>> {
        self.dims.iter().enumerate().skip(1)
            .map(|(k, n)| embed(&number(*n), k, &self.dims))
            .collect()
    }

    /// Return `true` if the layout implied by the given configuration agrees
    /// with `self`, i.e. no structural rebuild is needed.
    pub fn matches(&self, levels: &[Level], cavity: Option<&Cavity>, zeeman: bool)
        -> bool
    {
        let same_levels
            = levels.len() == self.totals.len()
            && levels.iter().zip(self.totals.iter())
            .all(|(l, (name, j))| {
                l.name == *name
                    && effective_total(l, zeeman).map(|jj| jj == *j).unwrap_or(false)
            });
        same_levels
            && factor_dims(levels, cavity, zeeman)
                .map(|dims| dims == self.dims)
                .unwrap_or(false)
    }

    /// Transition operator `Σ |from><to|`, failing if either level is unknown.
    pub fn lookup(&self, from: &str, to: &str) -> Result<&TransitionOp> {
        self.transitions.get(&TransitionKey::new(from, to))
            .ok_or_else(|| Error::UnknownLevel {
                name: (if self.blocks.contains_key(from) { to } else { from })
                    .to_string(),
                by: format!("transition {} -> {}", from, to),
            })
    }

    /// Sum of the projectors onto every sublevel of a level.
    pub fn level_projector(&self, name: &str) -> Option<nd::Array2<C64>> {
        let projs = self.projectors.get(name)?;
        let n = self.dim();
        Some(projs.iter().fold(nd::Array2::zeros((n, n)), |acc, p| acc + p))
    }
}

/// Atomic-space transition operator `Σ |g, Mg><e, Me|` between two levels.
fn transition_op(
    basis: &Basis<Sublevel>,
    n: usize,
    (bg, jg): (LevelBlock, SpinTotal),
    (be, je): (LevelBlock, SpinTotal),
) -> TransitionOp
{
    if jg.halves() == 0 && je.halves() == 0 {
        return TransitionOp::Combined(transition(n, bg.offset, be.offset));
    }
    let mut ops: [nd::Array2<C64>; 3] = [
        nd::Array2::zeros((n, n)),
        nd::Array2::zeros((n, n)),
        nd::Array2::zeros((n, n)),
    ];
    for i in bg.indices() {
        for j in be.indices() {
            let (Some((sg, _)), Some((se, _))) = (basis.get_index(i), basis.get_index(j))
            else { continue; };
            if !sg.couples_to(se) { continue; }
            let (mg, me) = (sg.spin().proj(), se.spin().proj());
            let q = (me.halves() - mg.halves()) / 2;
            let w = spin::clebsch(jg.f(), je.f(), mg.f(), q, me.f());
            if w != 0.0 {
                ops[(q + 1) as usize][[i, j]] = C64::from(w);
            }
        }
    }
    TransitionOp::Spherical(ops)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn levels() -> Vec<Level> {
        vec![
            Level::new("S", 0.5).with_pop([0.5, 0.5]),
            Level::new("P", 1.5).with_sl(0.5, 1.0),
            Level::new("D", 2.5).with_sl(0.5, 2.0),
        ]
    }

    #[test]
    fn blocks_are_contiguous() {
        let s = Structure::build(&levels(), None, true).unwrap();
        assert_eq!(s.blocks["S"], LevelBlock { offset: 0, len: 2 });
        assert_eq!(s.blocks["P"], LevelBlock { offset: 2, len: 4 });
        assert_eq!(s.blocks["D"], LevelBlock { offset: 6, len: 6 });
        assert_eq!(s.dim(), 12);
        assert_eq!(s.projectors["P"].len(), 4);
        let total = s.level_projector("S").unwrap()
            + s.level_projector("P").unwrap()
            + s.level_projector("D").unwrap();
        assert_eq!(total, nd::Array2::eye(12));
        // every ordered pair is present
        assert_eq!(s.transitions.len(), 6);
    }

    #[test]
    fn forbidden_transitions_are_zero() {
        let s = Structure::build(&levels(), None, true).unwrap();
        // |ΔJ| = 2
        assert!(s.transitions[&TransitionKey::new("S", "D")].is_zero());
        assert!(s.transitions[&TransitionKey::new("D", "S")].is_zero());
        assert!(!s.transitions[&TransitionKey::new("S", "P")].is_zero());
    }

    #[test]
    fn clebsch_weights_are_normalized() {
        // each excited sublevel of S1/2 -> P3/2 sees total weight 1
        let s = Structure::build(&levels(), None, true).unwrap();
        let TransitionOp::Spherical(ops) = &s.transitions[&TransitionKey::new("S", "P")]
        else { panic!("expected spherical components"); };
        for j in s.blocks["P"].indices() {
            let total: f64 = ops.iter()
                .map(|op| op.column(j).iter().map(|z| z.norm_sqr()).sum::<f64>())
                .sum();
            assert_relative_eq!(total, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn without_zeeman_every_level_is_one_state() {
        let s = Structure::build(&levels(), None, false).unwrap();
        assert_eq!(s.dim(), 3);
        let op = &s.transitions[&TransitionKey::new("S", "D")];
        assert!(matches!(op, TransitionOp::Combined(_)));
        assert_eq!(op.weighted(None), transition(3, 0, 2));
        assert!(s.matches(&levels(), None, false));
        assert!(!s.matches(&levels(), None, true));
    }

    #[test]
    fn cavity_extension() {
        let lv = vec![Level::new("g", 0.0), Level::new("e", 0.0)];
        let cav = Cavity::new("g", "e", 1.0, 0.1).with_cutoff(3).with_modes(2, 0, 0);
        let s = Structure::build(&lv, Some(&cav), false).unwrap();
        assert_eq!(s.dims, vec![2, 3, 3]);
        assert_eq!(s.dim(), 18);
        assert_eq!(s.a.len(), 2);
        let numbers = s.photon_numbers();
        assert_eq!(numbers.len(), 2);
        for (a, n) in s.a.iter().zip(&numbers) {
            assert_eq!(&crate::hilbert::dagger(a).dot(a), n);
        }
        assert_eq!(s.projectors["g"][0].dim(), (18, 18));
        assert_eq!(s.transitions[&TransitionKey::new("g", "e")].components()[0].dim(), (18, 18));
    }
}
