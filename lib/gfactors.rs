//! Landé g-factors and linear Zeeman shifts for fine-structure levels.

/// Bohr magneton [J / T]
pub const MU_B: f64 = 9.274078e-24;

/// Reduced Planck constant [J s]
pub const HBAR: f64 = 1.054572669125e-34;

/// Conversion from Gauss to Tesla.
pub const GAUSS: f64 = 1e-4;

/// Landé g-factor of a fine-structure level,
/// ```text
/// g_J = 1 + (J(J+1) + S(S+1) - L(L+1)) / (2 J(J+1))
/// ```
///
/// Returns `None` for `J = 0`, where the expression is undefined.
pub fn lande_g(J: f64, S: f64, L: f64) -> Option<f64> {
    let jj = J * (J + 1.0);
    (jj > 0.0).then(|| 1.0 + (jj + S * (S + 1.0) - L * (L + 1.0)) / (2.0 * jj))
}

/// Angular-frequency shift per unit change of the magnetic quantum number for
/// a level in a field `B` (in Tesla), expressed in units of the reference
/// linewidth `gamma_ref` (in radians per second):
/// ```text
/// w = g_J μ_B B / (ħ γ_ref)
/// ```
///
/// Returns `None` for `J = 0`; such levels have no linear Zeeman structure.
pub fn zeeman_shift(J: f64, S: f64, L: f64, B: f64, gamma_ref: f64) -> Option<f64> {
    lande_g(J, S, L).map(|g| g * MU_B * B / (HBAR * gamma_ref))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::TAU;
    use approx::assert_relative_eq;

    #[test]
    fn lande_values() {
        assert_relative_eq!(lande_g(0.5, 0.5, 0.0).unwrap(), 2.0, epsilon = 1e-12);
        assert_relative_eq!(lande_g(0.5, 0.5, 1.0).unwrap(), 2.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(lande_g(1.5, 0.5, 1.0).unwrap(), 4.0 / 3.0, epsilon = 1e-12);
        assert!(lande_g(0.0, 0.5, 0.0).is_none());
    }

    #[test]
    fn zeeman_reference_values() {
        // 1 G field, shift quoted in MHz
        let cases = [
            ((0.5, 0.5, 0.0), 2.7993),
            ((0.5, 0.5, 1.0), 0.9331),
            ((1.5, 0.5, 1.0), 1.8662),
            ((1.5, 0.5, 2.0), 1.1197),
            ((2.5, 0.5, 2.0), 1.6796),
        ];
        for ((J, S, L), expected) in cases {
            let w = zeeman_shift(J, S, L, GAUSS, TAU * 1e6).unwrap();
            assert_relative_eq!(w, expected, epsilon = 1e-4);
        }
    }

    #[test]
    fn zeeman_undefined_for_j_zero() {
        assert!(zeeman_shift(0.0, 0.0, 0.0, 1.0, 1.0).is_none());
    }
}
