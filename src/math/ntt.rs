//! Number-Theoretic Transform (NTT) for negacyclic ring multiplication.
//!
//! Converts a [`RingElement`] between coefficient and evaluation form over
//! R_q = Z_q[X]/(X^d + 1), so that ring multiplication becomes pointwise.
//!
//! # Theory
//!
//! With ψ a primitive 2d-th root of unity (ψ^d = -1) and ω = ψ², the forward
//! transform first twists coefficient i by ψ^i and then runs a cyclic radix-2
//! NTT over ω. The inverse runs the same network over ω^{-1} and undoes the
//! twist together with the 1/d normalisation in one final scaling pass.
//!
//! # Layout compatibility
//!
//! The white-box tables are compiled against the evaluation vector produced by
//! exactly this schedule: twist, in-place bit reversal, then butterflies whose
//! twiddles are read from the table of *even* powers of the root collected
//! during the twist. Evaluation slot `i` is what table `i` is keyed on, so the
//! order must not change.

use super::modular::ModQ;
use super::poly::{Domain, RingElement};
use crate::error::{Result, WhiteboxError};
use crate::params::RingParams;

/// Reverse the lowest `bits` bits of `x`
#[inline]
fn reverse_bits(x: usize, bits: u32) -> usize {
    if bits == 0 {
        0
    } else {
        x.reverse_bits() >> (usize::BITS - bits)
    }
}

/// In-place bit-reversal permutation
fn bit_reverse_permute(values: &mut [u64]) {
    let n = values.len();
    let levels = n.trailing_zeros();
    for i in 0..n {
        let j = reverse_bits(i, levels);
        if j > i {
            values.swap(i, j);
        }
    }
}

/// Radix-2 butterfly network; `pow_table[k]` holds the k-th even power of the root
fn butterflies(values: &mut [u64], pow_table: &[u64], q: u64) {
    let n = values.len();
    let mut size = 2;
    while size <= n {
        let halfsize = size / 2;
        let tablestep = n / size;
        for start in (0..n).step_by(size) {
            let mut k = 0;
            for j in start..start + halfsize {
                let l = j + halfsize;
                let left = values[j];
                let right = ModQ::mul(values[l], pow_table[k], q);
                values[j] = ModQ::add(left, right, q);
                values[l] = ModQ::sub(left, right, q);
                k += tablestep;
            }
        }
        size *= 2;
    }
}

fn ensure_power_of_two(n: usize) -> Result<()> {
    if n == 0 || !n.is_power_of_two() {
        return Err(WhiteboxError::InvalidDegree(n));
    }
    Ok(())
}

/// Forward transform, in place: coefficient form → evaluation form.
///
/// `root` must be a primitive 2d-th root of unity modulo q.
pub fn forward(element: &mut RingElement, root: u64) -> Result<()> {
    if element.domain() != Domain::Coefficient {
        return Err(WhiteboxError::AlreadyTransformed);
    }
    let n = element.degree();
    ensure_power_of_two(n)?;
    let q = element.modulus();
    let values = element.coeffs_mut();

    // Twist by root^i; only even powers feed the butterflies
    let mut pow_table = Vec::with_capacity(n / 2 + 1);
    let mut temp = 1 % q;
    for (i, v) in values.iter_mut().enumerate() {
        *v = ModQ::mul(*v, temp, q);
        if i % 2 == 0 {
            pow_table.push(temp);
        }
        temp = ModQ::mul(temp, root, q);
    }

    bit_reverse_permute(values);
    butterflies(values, &pow_table, q);

    element.set_domain(Domain::Evaluation);
    Ok(())
}

/// Inverse transform, in place: evaluation form → coefficient form.
///
/// `unroot` is the inverse of the forward root and `ninv` the inverse of the
/// degree, both modulo q. Incoming values need not be reduced.
pub fn inverse(element: &mut RingElement, unroot: u64, ninv: u64) -> Result<()> {
    if element.domain() != Domain::Evaluation {
        return Err(WhiteboxError::NotTransformed);
    }
    let n = element.degree();
    ensure_power_of_two(n)?;
    let q = element.modulus();
    let values = element.coeffs_mut();

    for v in values.iter_mut() {
        *v = ModQ::reduce(*v, q);
    }

    let mut pow_table = Vec::with_capacity(n / 2 + 1);
    let mut untwist = Vec::with_capacity(n);
    let mut temp = 1 % q;
    for i in 0..n {
        if i % 2 == 0 {
            pow_table.push(temp);
        }
        untwist.push(temp);
        temp = ModQ::mul(temp, unroot, q);
    }

    bit_reverse_permute(values);
    butterflies(values, &pow_table, q);

    for (v, &u) in values.iter_mut().zip(&untwist) {
        *v = ModQ::mul(ModQ::mul(*v, ninv, q), u, q);
    }

    element.set_domain(Domain::Coefficient);
    Ok(())
}

/// Find a primitive `order`-th root of unity modulo prime `q`.
///
/// `order` must be a power of two dividing q - 1. Returns the smallest
/// candidate `g^((q-1)/order)` over g = 2, 3, ... that has full order.
pub fn primitive_root(order: u64, q: u64) -> Option<u64> {
    if order < 2 || !order.is_power_of_two() || q < 3 || (q - 1) % order != 0 {
        return None;
    }
    let exp = (q - 1) / order;
    (2..q)
        .map(|g| ModQ::pow(g, exp, q))
        .find(|&candidate| ModQ::pow(candidate, order / 2, q) != 1)
}

/// Transform constants for one ring: forward root, inverse root, 1/d
///
/// The white-box table artifact carries these as `root`, `unroot` and `ninv`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NttContext {
    root: u64,
    unroot: u64,
    ninv: u64,
}

impl NttContext {
    /// Bundle externally supplied constants
    pub fn new(root: u64, unroot: u64, ninv: u64) -> Self {
        Self { root, unroot, ninv }
    }

    /// Derive constants for a ring with q ≡ 1 (mod 2d)
    pub fn for_ring(params: &RingParams) -> Result<Self> {
        params.validate()?;
        let q = params.modulus;
        let root = primitive_root(2 * params.degree as u64, q).ok_or_else(|| {
            WhiteboxError::malformed(
                "public key",
                format!(
                    "modulus {} has no primitive {}-th root of unity",
                    q,
                    2 * params.degree
                ),
            )
        })?;
        let unroot = super::crt::mod_inverse(root, q)?;
        let ninv = super::crt::mod_inverse(params.degree as u64, q)?;
        Ok(Self { root, unroot, ninv })
    }

    /// Forward root ψ
    pub fn root(&self) -> u64 {
        self.root
    }

    /// Inverse root ψ^{-1}
    pub fn unroot(&self) -> u64 {
        self.unroot
    }

    /// d^{-1} mod q
    pub fn ninv(&self) -> u64 {
        self.ninv
    }

    /// Forward transform in place
    pub fn forward(&self, element: &mut RingElement) -> Result<()> {
        forward(element, self.root)
    }

    /// Inverse transform in place
    pub fn inverse(&self, element: &mut RingElement) -> Result<()> {
        inverse(element, self.unroot, self.ninv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn small_ctx(degree: usize, modulus: u64) -> NttContext {
        NttContext::for_ring(&RingParams { degree, modulus }).unwrap()
    }

    #[test]
    fn test_reverse_bits() {
        let perm: Vec<usize> = (0..8).map(|i| reverse_bits(i, 3)).collect();
        assert_eq!(perm, vec![0, 4, 2, 6, 1, 5, 3, 7]);
        assert_eq!(reverse_bits(0, 0), 0);
    }

    #[test]
    fn test_bit_reverse_permute() {
        let mut x = [0, 1, 2, 3, 4, 5, 6, 7];
        bit_reverse_permute(&mut x);
        assert_eq!(x, [0, 4, 2, 6, 1, 5, 3, 7]);
    }

    #[test]
    fn test_primitive_root() {
        let psi = primitive_root(16, 17).unwrap();
        assert_eq!(ModQ::pow(psi, 8, 17), 16);

        let q = 1231873;
        let psi = primitive_root(1024, q).unwrap();
        assert_eq!(ModQ::pow(psi, 512, q), q - 1);

        assert_eq!(primitive_root(32, 17), None);
        assert_eq!(primitive_root(12, 97), None);
    }

    #[test]
    fn test_ntt_inverse_roundtrip_small() {
        let ctx = small_ctx(8, 17);
        let original = RingElement::from_coeffs(vec![6, 0, 10, 7, 2, 8, 7, 4], 17);
        let mut e = original.clone();

        ctx.forward(&mut e).unwrap();
        assert!(e.is_evaluation());
        ctx.inverse(&mut e).unwrap();

        assert_eq!(e, original);
    }

    #[test]
    fn test_ntt_inverse_roundtrip_reference_ring() {
        let params = RingParams::reference();
        let ctx = NttContext::for_ring(&params).unwrap();
        let mut rng = rand_chacha::ChaCha20Rng::seed_from_u64(7);

        let original = RingElement::random_with_rng(params.degree, params.modulus, &mut rng);
        let mut e = original.clone();
        ctx.forward(&mut e).unwrap();
        assert_ne!(e.coeffs(), original.coeffs());
        ctx.inverse(&mut e).unwrap();

        assert_eq!(e, original);
    }

    #[test]
    fn test_inverse_reduces_unreduced_input() {
        let ctx = small_ctx(8, 17);
        let mut e = RingElement::from_coeffs(vec![1, 2, 3, 4, 5, 6, 7, 8], 17);
        ctx.forward(&mut e).unwrap();

        let lifted: Vec<u64> = e.coeffs().iter().map(|&v| v + 17 * 1000).collect();
        let mut lifted = RingElement::from_evaluations(lifted, 17);

        ctx.inverse(&mut e).unwrap();
        ctx.inverse(&mut lifted).unwrap();
        assert_eq!(e, lifted);
    }

    #[test]
    fn test_zero_element() {
        let ctx = small_ctx(16, 97);
        let mut e = RingElement::zero(16, 97);
        ctx.forward(&mut e).unwrap();
        assert!(e.coeffs().iter().all(|&c| c == 0));
        ctx.inverse(&mut e).unwrap();
        assert!(e.is_zero());
    }

    #[test]
    fn test_convolution_agreement() {
        let ctx = small_ctx(8, 17);
        let a = RingElement::from_coeffs(vec![1, 5, 0, 16, 3, 3, 9, 2], 17);
        let b = RingElement::from_coeffs(vec![4, 0, 11, 1, 0, 7, 2, 15], 17);
        let direct = a.mul(&b).unwrap();

        let (mut a_hat, mut b_hat) = (a.clone(), b.clone());
        ctx.forward(&mut a_hat).unwrap();
        ctx.forward(&mut b_hat).unwrap();
        let mut product = a_hat.mul(&b_hat).unwrap();
        ctx.inverse(&mut product).unwrap();

        assert_eq!(product, direct);
    }

    #[test]
    fn test_negacyclic_through_transform() {
        // x * x^(n-1) = -1 in R_q
        let n = 16;
        let q = 97;
        let ctx = small_ctx(n, q);
        let mut a = RingElement::zero(n, q);
        a.coeffs_mut()[1] = 1;
        let mut b = RingElement::zero(n, q);
        b.coeffs_mut()[n - 1] = 1;

        ctx.forward(&mut a).unwrap();
        ctx.forward(&mut b).unwrap();
        let mut c = a.mul(&b).unwrap();
        ctx.inverse(&mut c).unwrap();

        assert_eq!(c.coeff(0), q - 1);
        assert!(c.coeffs()[1..].iter().all(|&v| v == 0));
    }

    #[test]
    fn test_out_of_sequence_calls() {
        let ctx = small_ctx(8, 17);
        let mut e = RingElement::from_coeffs(vec![1; 8], 17);
        assert!(matches!(
            ctx.inverse(&mut e),
            Err(WhiteboxError::NotTransformed)
        ));
        ctx.forward(&mut e).unwrap();
        assert!(matches!(
            ctx.forward(&mut e),
            Err(WhiteboxError::AlreadyTransformed)
        ));
    }

    #[test]
    fn test_non_power_of_two_length() {
        let mut e = RingElement::from_coeffs(vec![1; 6], 13);
        assert!(matches!(
            forward(&mut e, 2),
            Err(WhiteboxError::InvalidDegree(6))
        ));
        assert_eq!(e.domain(), Domain::Coefficient);
    }
}
