//! Definitions to describe basis states, bases, and the dense operators built
//! on them.

use std::{ hash::Hash, ops::{ Deref, Range } };
use ndarray::{ self as nd, linalg::kron };
use indexmap::IndexMap;
use itertools::Itertools;
use num_traits::{ Zero, One };
use crate::{ spin::{ Spin, SpinTotal }, utils::C64 };

/* States *********************************************************************/

/// A single basis state.
pub trait BasisState: Clone + Eq + Hash + std::fmt::Debug {
    /// Return `true` if two states can be coupled by an electric dipole
    /// transition.
    ///
    /// This method should be reflexive in its inputs.
    fn couples_to(&self, other: &Self) -> bool;
}

/// Extends [`BasisState`] to include spin state properties.
pub trait SpinState: BasisState {
    /// Get the [`Spin`] of the basis state.
    fn spin(&self) -> Spin;
}

/// A single magnetic sublevel `|name, mJ>` of a named atomic level.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Sublevel {
    pub level: String,
    pub spin: Spin,
}

impl Sublevel {
    pub fn new(level: &str, spin: Spin) -> Self {
        Self { level: level.to_string(), spin }
    }

    /// Expectation-value label for this sublevel, e.g. `P1/2 mJ=-1/2`.
    pub fn label(&self) -> String {
        format!("{} mJ={}", self.level, self.spin.proj().as_fraction())
    }
}

impl BasisState for Sublevel {
    fn couples_to(&self, other: &Self) -> bool {
        let (j1, m1) = self.spin.halves();
        let (j2, m2) = other.spin.halves();
        self.level != other.level
            && (m1 - m2).abs() <= 2
            && (j1 as i32 - j2 as i32).abs() <= 2
            && (j1 + j2) % 2 == 0
    }
}

impl SpinState for Sublevel {
    fn spin(&self) -> Spin { self.spin }
}

/// Iterate over all sublevels of a level with total angular momentum `J`, by
/// ascending projection.
pub fn sublevels(level: &str, J: SpinTotal) -> impl Iterator<Item = Sublevel> + '_ {
    J.iter().map(move |spin| Sublevel::new(level, spin))
}

/* Bases **********************************************************************/

/// A collection of unique [`BasisState`]s with associated energies in units of
/// angular frequency.
///
/// This collection is backed by a single [`IndexMap`], which can be accessed
/// via [`AsRef`] and [`Deref`]. Insertion order fixes the matrix index of each
/// state.
#[derive(Clone, Debug, PartialEq)]
pub struct Basis<S>
where S: Clone + Eq + Hash
{
    energies: IndexMap<S, f64>,
}

impl<S> AsRef<IndexMap<S, f64>> for Basis<S>
where S: Clone + Eq + Hash
{
    fn as_ref(&self) -> &IndexMap<S, f64> { &self.energies }
}

impl<S> Deref for Basis<S>
where S: Clone + Eq + Hash
{
    type Target = IndexMap<S, f64>;

    fn deref(&self) -> &Self::Target { &self.energies }
}

impl<S> Default for Basis<S>
where S: Clone + Eq + Hash
{
    fn default() -> Self { Self { energies: IndexMap::default() } }
}

impl<S> FromIterator<(S, f64)> for Basis<S>
where S: Clone + Eq + Hash
{
    fn from_iter<I>(iter: I) -> Self
    where I: IntoIterator<Item = (S, f64)>
    {
        Self { energies: iter.into_iter().collect() }
    }
}

impl<S> Basis<S>
where S: Clone + Eq + Hash
{
    /// Get an array representation of a linear combination of basis states,
    /// with weights determined by a weighting function.
    ///
    /// The weighting function will be passed a state, its index, and its
    /// energy.
    pub fn get_vector_weighted<F>(&self, weights: F) -> nd::Array1<C64>
    where F: Fn(&S, usize, f64) -> C64
    {
        self.energies.iter().enumerate()
            .map(|(index, (state, energy))| weights(state, index, *energy))
            .collect()
    }

    /// Get an array representiation of a density matrix for a completely
    /// classical mixture (i.e. a diagonal matrix) of basis states with weights
    /// determined by a weighting function.
    pub fn get_density_diag<F>(&self, weights: F) -> nd::Array2<C64>
    where F: Fn(&S, usize, f64) -> f64
    {
        let diag: nd::Array1<C64>
            = self.energies.iter().enumerate()
            .map(|(index, (state, energy))| {
                C64::from(weights(state, index, *energy))
            })
            .collect();
        nd::Array2::from_diag(&diag)
    }

    /// Diagonal operator whose entries are the state energies.
    pub fn energy_operator(&self) -> nd::Array2<C64> {
        self.get_density_diag(|_, _, e| e)
    }
}

/// A contiguous block of basis indices belonging to a single level.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LevelBlock {
    pub offset: usize,
    pub len: usize,
}

impl LevelBlock {
    /// Range of basis indices covered by the block.
    pub fn indices(&self) -> Range<usize> { self.offset..self.offset + self.len }
}

/* Operators ******************************************************************/

/// Compute the outer product `|a><b|` of two state vectors.
pub fn outer_prod(a: &nd::Array1<C64>, b: &nd::Array1<C64>)
    -> nd::Array2<C64>
{
    let na = a.len();
    let nb = b.len();
    nd::Array2::from_shape_vec(
        (na, nb),
        a.iter().cartesian_product(b)
            .map(|(ai, bj)| *ai * bj.conj())
            .collect(),
    )
    .unwrap_or_else(|_| nd::Array2::zeros((na, nb)))
}

/// Unit vector `|i>` in an `n`-dimensional space.
pub fn basis_ket(n: usize, i: usize) -> nd::Array1<C64> {
    (0..n).map(|j| if j == i { C64::one() } else { C64::zero() }).collect()
}

/// Matrix unit `|i><j|` in an `n`-dimensional space.
pub fn transition(n: usize, i: usize, j: usize) -> nd::Array2<C64> {
    let mut op = nd::Array2::zeros((n, n));
    op[[i, j]] = C64::one();
    op
}

/// Projector `|i><i|` in an `n`-dimensional space.
pub fn projector(n: usize, i: usize) -> nd::Array2<C64> { transition(n, i, i) }

/// Conjugate transpose.
pub fn dagger(op: &nd::Array2<C64>) -> nd::Array2<C64> {
    op.t().mapv(|z| z.conj())
}

/// Identity operator.
pub fn eye(n: usize) -> nd::Array2<C64> { nd::Array2::eye(n) }

/// Truncated bosonic annihilation operator on `n` Fock states.
pub fn destroy(n: usize) -> nd::Array2<C64> {
    let mut a = nd::Array2::zeros((n, n));
    (1..n).for_each(|k| { a[[k - 1, k]] = C64::from((k as f64).sqrt()); });
    a
}

/// Truncated photon-number operator on `n` Fock states.
pub fn number(n: usize) -> nd::Array2<C64> {
    nd::Array2::from_diag(&(0..n).map(|k| C64::from(k as f64)).collect::<nd::Array1<C64>>())
}

/// Place `op` on tensor factor `idx` of a space whose factors have dimensions
/// `dims`, i.e. `I ⊗ .. ⊗ op ⊗ .. ⊗ I`.
pub fn embed(op: &nd::Array2<C64>, idx: usize, dims: &[usize])
    -> nd::Array2<C64>
{
    let eyesize1: usize = dims.iter().take(idx).product();
    let eyesize2: usize = dims.iter().skip(idx + 1).product();
    if eyesize1 == 1 && eyesize2 == 1 { return op.clone(); }
    kron(&kron(&eye(eyesize1), op), &eye(eyesize2))
}
