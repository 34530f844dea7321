//! Right-hand side of the Lindblad master equation.

use ndarray as nd;
use crate::utils::C64;

/// Compute the commutator `[A, B] = A B - B A`.
pub fn commutator<SA, SB>(
    A: &nd::ArrayBase<SA, nd::Ix2>,
    B: &nd::ArrayBase<SB, nd::Ix2>,
) -> nd::Array2<C64>
where
    SA: nd::Data<Elem = C64>,
    SB: nd::Data<Elem = C64>,
{
    A.dot(B) - B.dot(A)
}

/// Compute the anti-commutator `{A, B} = A B + B A`.
pub fn anti_commutator<SA, SB>(
    A: &nd::ArrayBase<SA, nd::Ix2>,
    B: &nd::ArrayBase<SB, nd::Ix2>,
) -> nd::Array2<C64>
where
    SA: nd::Data<Elem = C64>,
    SB: nd::Data<Elem = C64>,
{
    A.dot(B) + B.dot(A)
}

/// Precomputed pieces of a single collapse operator `c`.
#[derive(Clone, Debug)]
pub struct Dissipator {
    c: nd::Array2<C64>,
    c_dag: nd::Array2<C64>,
    c_dag_c: nd::Array2<C64>,
}

impl Dissipator {
    pub fn new(c: &nd::Array2<C64>) -> Self {
        let c_dag = c.t().mapv(|z| z.conj());
        let c_dag_c = c_dag.dot(c);
        Self { c: c.clone(), c_dag, c_dag_c }
    }

    /// `c ρ c† - {c† c, ρ} / 2`
    pub fn apply(&self, rho: &nd::Array2<C64>) -> nd::Array2<C64> {
        self.c.dot(rho).dot(&self.c_dag)
            - anti_commutator(&self.c_dag_c, rho) * 0.5
    }
}

/// Full Lindblad RHS for Hamiltonian `h` and a set of dissipators.
pub fn rhs(
    h: &nd::Array2<C64>,
    dissipators: &[Dissipator],
    rho: &nd::Array2<C64>,
) -> nd::Array2<C64>
{
    let mut drho = commutator(h, rho) * (-C64::i());
    for d in dissipators.iter() {
        drho += &d.apply(rho);
    }
    drho
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hilbert::{ projector, transition };

    #[test]
    fn rhs_is_traceless_and_hermitian() {
        let h = transition(3, 0, 1) + transition(3, 1, 0) + projector(3, 2);
        let c = transition(3, 2, 1) * C64::from(0.7);
        let rho = projector(3, 1) * C64::from(0.6)
            + projector(3, 0) * C64::from(0.4)
            + (transition(3, 0, 1) + transition(3, 1, 0)) * C64::from(0.1);
        let d = rhs(&h, &[Dissipator::new(&c)], &rho);
        assert!(d.diag().sum().norm() < 1e-14);
        let herm = &d - &d.t().mapv(|z| z.conj());
        assert!(herm.iter().all(|z| z.norm() < 1e-14));
    }

    #[test]
    fn decay_moves_population_down() {
        // c = |0><1| takes the excited state 1 into 0
        let c = transition(2, 0, 1);
        let d = Dissipator::new(&c).apply(&projector(2, 1));
        assert_eq!(d[[0, 0]], C64::from(1.0));
        assert_eq!(d[[1, 1]], C64::from(-1.0));
    }
}
