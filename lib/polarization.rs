//! Light polarization: Stokes parameters, spherical-basis amplitudes, and the
//! change of frame between a field's propagation axis and the atomic
//! quantization axis.
//!
//! Spherical polarization vectors are ordered `[σ+, π, σ-]` throughout.

use std::f64::consts::FRAC_1_SQRT_2;
use ndarray as nd;
use crate::c;
use crate::utils::C64;

/// A real 3-vector.
pub type Vec3 = [f64; 3];

fn dot(a: &Vec3, b: &Vec3) -> f64 { a[0] * b[0] + a[1] * b[1] + a[2] * b[2] }

fn cross(a: &Vec3, b: &Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn norm(a: &Vec3) -> f64 { dot(a, a).sqrt() }

fn unit(a: &Vec3) -> Option<Vec3> {
    let n = norm(a);
    (n > 0.0 && n.is_finite()).then(|| [a[0] / n, a[1] / n, a[2] / n])
}

/// Propagation direction in the x-z plane at `angle` degrees from the z-axis.
pub fn k_from_angle(angle: f64) -> Vec3 {
    let th = angle.to_radians();
    [th.sin(), 0.0, th.cos()]
}

/// Clamp each Stokes parameter to `[-1, 1]` and normalize the result.
///
/// Returns `None` for a zero (or non-finite) vector.
pub fn normalize_stokes(S: Vec3) -> Option<Vec3> {
    if S.iter().any(|s| !s.is_finite()) { return None; }
    unit(&S.map(|s| s.clamp(-1.0, 1.0)))
}

/// Real field amplitudes `Ex`, `Ey` and their relative phase `δ` for a
/// normalized Stokes vector.
pub fn ex_ey_delta_from_stokes(S: Vec3) -> (f64, f64, f64) {
    let [S1, S2, S3] = S;
    let ex = ((1.0 + S1) / 2.0).max(0.0).sqrt();
    let ey = ((1.0 - S1) / 2.0).max(0.0).sqrt();
    (ex, ey, S3.atan2(S2))
}

/// Stokes parameters (assuming `S0 = Ex^2 + Ey^2 = 1`) for real amplitudes
/// `Ex`, `Ey` with relative phase `δ`.
pub fn stokes_from_ex_ey_delta(ex: f64, ey: f64, delta: f64) -> Vec3 {
    [
        ex.powi(2) - ey.powi(2),
        2.0 * ex * ey * delta.cos(),
        2.0 * ex * ey * delta.sin(),
    ]
}

/// Spherical-basis amplitudes `[E+, 0, E-]` of a field with normalized Stokes
/// parameters `S`, in the field's own frame.
pub fn stokes_to_spherical(S: Vec3) -> [C64; 3] {
    let (ex, ey, delta) = ex_ey_delta_from_stokes(S);
    let eyd = c!(i ey) * C64::from_polar(1.0, -delta);
    let ep = -(c!(ex) + eyd) * FRAC_1_SQRT_2;
    let em = (c!(ex) - eyd) * FRAC_1_SQRT_2;
    [ep, c!(0.0), em]
}

/// Cartesian-to-spherical conversion matrix.
fn cart_to_sph() -> nd::Array2<C64> {
    let s = FRAC_1_SQRT_2;
    nd::array![
        [c!(-s),  c!(0.0, -s), c!(0.0)],
        [c!(0.0), c!(0.0),     c!(1.0)],
        [c!(s),   c!(0.0, -s), c!(0.0)],
    ]
}

/// Orthonormal frame `(ex, ey, ez)` with `ez` along `axis`, `ey` in the global
/// x-y plane (`ẑ × ez`), falling back to `ŷ` when `axis ∥ ẑ`.
fn frame(ez: Vec3) -> [Vec3; 3] {
    let ey = unit(&cross(&[0.0, 0.0, 1.0], &ez)).unwrap_or([0.0, 1.0, 0.0]);
    let ex = unit(&cross(&ey, &ez)).unwrap_or([1.0, 0.0, 0.0]);
    [ex, ey, ez]
}

/// Unitary change-of-basis matrix `U` for spherical polarization vectors
/// between the frame of a field propagating along `k` and the atomic frame
/// quantized along `B`.
///
/// A zero `B` makes the atomic frame identical to the field frame. Returns
/// `None` if `k` is zero.
pub fn polarization_rotation(k: Vec3, B: Vec3) -> Option<nd::Array2<C64>> {
    let ez_l = unit(&k)?;
    let ez_a = unit(&B).unwrap_or(ez_l);
    let fl = frame(ez_l);
    let fa = frame(ez_a);
    let R: nd::Array2<C64>
        = nd::Array2::from_shape_fn((3, 3), |(i, j)| c!(dot(&fl[i], &fa[j])));
    let S = cart_to_sph();
    let Sdag = S.t().mapv(|z| z.conj());
    let U = S.dot(&R.t().dot(&Sdag));
    Some(U.reversed_axes())
}

/// Express a spherical polarization vector given in the frame of a field
/// propagating along `k` in the atomic frame quantized along `B`, i.e.
/// `U† · pol`.
pub fn to_atomic_frame(pol: &[C64; 3], k: Vec3, B: Vec3) -> Option<[C64; 3]> {
    let U = polarization_rotation(k, B)?;
    let pol_at: nd::Array1<C64>
        = U.t().mapv(|z| z.conj()).dot(&nd::aview1(pol));
    Some([pol_at[0], pol_at[1], pol_at[2]])
}
