//! Angular momentum quantum numbers and dipole coupling coefficients.

use std::{ fmt, hash::Hash };
use wigner_symbols::ClebschGordan;

/// A single spin-projection quantum number.
///
/// This type is backed by a single `i32` representing the number of halves.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpinProj(i32);

impl SpinProj {
    /// Create a new spin projection from a number of halves.
    pub fn new(m: i32) -> Self { Self(m) }

    /// Return `self` as a bare number of halves.
    pub fn halves(self) -> i32 { self.0 }

    /// Return `self` as an `f64`.
    ///
    /// This reflects the "true" value of the projection quantum number; i.e.
    /// there is a relative factor of 2 between this and [`Self::halves`].
    pub fn f(self) -> f64 { f64::from(self.0) / 2.0 }

    /// Create a new spin-projection quantum number from a `f64` value, rounding
    /// to the nearest half-integer.
    pub fn from_f64(f: f64) -> Self { Self((2.0 * f).round() as i32) }

    /// Render as an exact fraction, e.g. `-1/2`, `0`, `3/2`.
    pub fn as_fraction(self) -> String {
        if self.0 % 2 == 0 {
            format!("{}", self.0 / 2)
        } else {
            format!("{}/2", self.0)
        }
    }
}

impl From<SpinProj> for f64 {
    fn from(m: SpinProj) -> Self { m.f() }
}

impl fmt::Display for SpinProj {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_fraction())
    }
}

/// A single total-spin quantum number.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpinTotal(u32);

impl SpinTotal {
    /// Create a new total spin from a number of halves.
    pub fn new(j: u32) -> Self { Self(j) }

    /// Return `self` as a bare number of halves.
    pub fn halves(self) -> u32 { self.0 }

    /// Return `self` as an `f64`.
    ///
    /// This reflects the "true" numerical value of the total-spin quantum
    /// number; i.e. there is a relative factor of 2 between this and
    /// [`Self::halves`].
    pub fn f(self) -> f64 { f64::from(self.0) / 2.0 }

    /// Create a new total-spin quantum number from a `f64` value, if it is a
    /// non-negative integer or half-integer.
    pub fn from_f64(f: f64) -> Option<Self> {
        let halves = 2.0 * f;
        (f.is_finite() && f >= 0.0 && (halves - halves.round()).abs() < 1e-9)
            .then(|| Self(halves.round() as u32))
    }

    /// Number of projection states, `2J + 1`.
    pub fn multiplicity(self) -> usize { self.0 as usize + 1 }

    /// Return an iterator over available [`Spin`] pairs by ascending projection
    /// number.
    pub fn iter(self) -> SpinProjections {
        SpinProjections { j: self, next: Some(-(self.0 as i32)) }
    }
}

impl IntoIterator for SpinTotal {
    type IntoIter = SpinProjections;
    type Item = Spin;

    fn into_iter(self) -> Self::IntoIter { self.iter() }
}

impl From<SpinTotal> for f64 {
    fn from(j: SpinTotal) -> Self { j.f() }
}

/// A `(total, projection)` spin quantum number pair.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Spin(SpinTotal, SpinProj);

impl Spin {
    /// Create a new spin if the given spin-projection number is valid for the
    /// given total-spin number (both in halves).
    pub fn new(j: u32, m: i32) -> Option<Self> {
        let j_i64 = i64::from(j);
        let m_i64 = i64::from(m);
        (
            (-j_i64..=j_i64).contains(&m_i64)
            && (m_i64 - j_i64) % 2 == 0
        )
        .then_some(Self(SpinTotal(j), SpinProj(m)))
    }

    /// Return the [total-spin][SpinTotal] quantum number.
    pub fn total(self) -> SpinTotal { self.0 }

    /// Return the [spin-projection][SpinProj] quantum number.
    pub fn proj(self) -> SpinProj { self.1 }

    /// Return `self` as a bare pair of halves.
    pub fn halves(self) -> (u32, i32) { (self.0.halves(), self.1.halves()) }

    /// Return `self` as a `(f64, f64)`.
    pub fn f(self) -> (f64, f64) { (self.0.f(), self.1.f()) }
}

/// Iterator over spin projection states for a fixed total spin magnitude.
///
/// Projection states are visited in ascending order.
#[derive(Copy, Clone, Debug)]
pub struct SpinProjections {
    j: SpinTotal,
    next: Option<i32>,
}

impl Iterator for SpinProjections {
    type Item = Spin;

    fn next(&mut self) -> Option<Self::Item> {
        let m = self.next?;
        let item = Spin::new(self.j.0, m);
        self.next = (m + 2 <= self.j.0 as i32).then_some(m + 2);
        item
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.next
            .map(|m| ((self.j.0 as i32 - m) / 2 + 1) as usize)
            .unwrap_or(0);
        (n, Some(n))
    }
}

impl ExactSizeIterator for SpinProjections { }

/// Return `true` if total spins `j1, j2, j3` (in halves) satisfy the triangle
/// condition with an integer sum.
fn triangle(j1: u32, j2: u32, j3: u32) -> bool {
    let (j1, j2, j3) = (i64::from(j1), i64::from(j2), i64::from(j3));
    (j1 - j2).abs() <= j3 && j3 <= j1 + j2 && (j1 + j2 + j3) % 2 == 0
}

/// Calculate the appropriate Clebsch-Gordan coefficient for the angular
/// momentum addition `s1 + s2 = s3`, i.e. `<j1 m1; j2 m2 | j3 m3>`.
///
/// Returns zero whenever projections do not add up or the triangle condition
/// fails.
pub fn cg(s1: Spin, s2: Spin, s3: Spin) -> f64 {
    let (tj1, tm1) = s1.halves();
    let (tj2, tm2) = s2.halves();
    let (tj3, tm3) = s3.halves();
    if tm1 + tm2 != tm3 || !triangle(tj1, tj2, tj3) { return 0.0; }
    ClebschGordan {
        tj1: tj1 as i32,
        tm1,
        tj2: tj2 as i32,
        tm2,
        tj12: tj3 as i32,
        tm12: tm3,
    }
    .value()
    .into()
}

/// Clebsch-Gordan coefficient `<Jg Mg; 1 q | Je Me>` for a rank-1 (electric
/// dipole) coupling with spherical component `q ∈ {-1, 0, +1}`.
///
/// Total spins and projections are given in their true (not halved) values.
/// Returns zero if any quantum number is invalid or a selection rule fails;
/// this includes `|Jg - Je| > 1`.
pub fn clebsch(Jg: f64, Je: f64, Mg: f64, q: i32, Me: f64) -> f64 {
    let Some(jg) = SpinTotal::from_f64(Jg) else { return 0.0; };
    let Some(je) = SpinTotal::from_f64(Je) else { return 0.0; };
    if !(-1..=1).contains(&q) { return 0.0; }
    let mg = SpinProj::from_f64(Mg).halves();
    let me = SpinProj::from_f64(Me).halves();
    let (Some(g), Some(p), Some(e))
        = (Spin::new(jg.halves(), mg), Spin::new(2, 2 * q), Spin::new(je.halves(), me))
    else {
        return 0.0;
    };
    cg(g, p, e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn projections_ascend() {
        let j = SpinTotal::new(3);
        let ms: Vec<i32> = j.iter().map(|s| s.proj().halves()).collect();
        assert_eq!(ms, vec![-3, -1, 1, 3]);
        assert_eq!(j.iter().len(), 4);
        assert_eq!(SpinTotal::new(0).iter().count(), 1);
    }

    #[test]
    fn total_from_f64_rejects_non_half_integers() {
        assert_eq!(SpinTotal::from_f64(1.5), Some(SpinTotal::new(3)));
        assert_eq!(SpinTotal::from_f64(0.3), None);
        assert_eq!(SpinTotal::from_f64(-0.5), None);
    }

    #[test]
    fn fraction_labels() {
        assert_eq!(SpinProj::new(-1).as_fraction(), "-1/2");
        assert_eq!(SpinProj::new(0).as_fraction(), "0");
        assert_eq!(SpinProj::new(3).as_fraction(), "3/2");
        assert_eq!(SpinProj::new(-4).as_fraction(), "-2");
    }

    #[test]
    fn clebsch_known_values() {
        // |<1/2 1/2; 1 0 | 1/2 1/2>|^2 = 1/3
        assert_relative_eq!(
            clebsch(0.5, 0.5, 0.5, 0, 0.5).powi(2), 1.0 / 3.0,
            epsilon = 1e-12,
        );
        // <0 0; 1 q | 1 q> = 1
        for q in -1..=1 {
            assert_relative_eq!(
                clebsch(0.0, 1.0, 0.0, q, q as f64), 1.0, epsilon = 1e-12);
        }
        // <1/2 -1/2; 1 1 | 3/2 1/2> = sqrt(1/3)
        assert_relative_eq!(
            clebsch(0.5, 1.5, -0.5, 1, 0.5), (1.0_f64 / 3.0).sqrt(),
            epsilon = 1e-12,
        );
    }

    #[test]
    fn clebsch_selection_rules() {
        // projections must add up
        assert_eq!(clebsch(0.5, 0.5, 0.5, 1, 0.5), 0.0);
        // |Jg - Je| > 1 is forbidden for every component
        for (Jg, Je) in [(0.0, 2.0), (0.5, 2.5), (2.0, 0.0), (1.5, 3.5)] {
            let jg = SpinTotal::from_f64(Jg).unwrap();
            let je = SpinTotal::from_f64(Je).unwrap();
            for g in jg.iter() {
                for e in je.iter() {
                    for q in -1..=1 {
                        assert_eq!(clebsch(Jg, Je, g.proj().f(), q, e.proj().f()), 0.0);
                    }
                }
            }
        }
        // integer <-> half-integer cannot couple
        assert_eq!(clebsch(0.5, 0.0, 0.5, -1, 0.0), 0.0);
    }
}
