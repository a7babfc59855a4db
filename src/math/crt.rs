//! CRT (Chinese Remainder Theorem) helpers.
//!
//! A [`CrtBase`] is a set of pairwise-coprime moduli `b_0..b_{k-1}` with product
//! `M`. An integer `x < M` is represented by its residues `x mod b_i`, and is
//! reconstructed with the standard formula
//!
//! ```text
//! x = Σ r_i · (M / b_i) · ((M / b_i)^{-1} mod b_i)  mod M
//! ```
//!
//! The white-box multiplier works in two such bases at once, so both directions
//! are exposed here alongside the extended Euclidean algorithm they rely on.

use crate::error::{corrupt_table, Result, WhiteboxError};

/// Extended Euclidean algorithm.
///
/// Returns `(g, x, y)` with `b * x + n * y = g = gcd(b, n)`.
pub fn extended_gcd(mut b: i64, mut n: i64) -> (i64, i64, i64) {
    let (mut x0, mut x1, mut y0, mut y1) = (1i64, 0i64, 0i64, 1i64);
    while n != 0 {
        let q = b.div_euclid(n);
        (b, n) = (n, b - q * n);
        (x0, x1) = (x1, x0 - q * x1);
        (y0, y1) = (y1, y0 - q * y1);
    }
    (b, x0, y0)
}

/// Compute a modular inverse using the extended Euclidean algorithm.
///
/// Returns `x` in `[0, modulus)` such that `(a * x) % modulus == 1`.
pub fn mod_inverse(a: u64, modulus: u64) -> Result<u64> {
    let not_invertible = WhiteboxError::NotInvertible { value: a, modulus };
    if modulus < 2 || modulus > i64::MAX as u64 {
        return Err(not_invertible);
    }
    let (g, x, _) = extended_gcd((a % modulus) as i64, modulus as i64);
    if g != 1 {
        return Err(not_invertible);
    }
    Ok(x.rem_euclid(modulus as i64) as u64)
}

/// Pairwise-coprime residue base with precomputed reconstruction weights
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CrtBase {
    moduli: Vec<u64>,
    product: u64,
    /// `(M / b_i) * ((M / b_i)^{-1} mod b_i) mod M`, one per slot.
    weights: Vec<u64>,
}

impl CrtBase {
    /// Validates the moduli and precomputes reconstruction weights.
    ///
    /// Fails with `NotInvertible` when two moduli share a factor.
    pub fn new(moduli: &[u64]) -> Result<Self> {
        if moduli.is_empty() {
            return Err(corrupt_table!("CRT base is empty"));
        }
        if let Some(&m) = moduli.iter().find(|&&m| m < 2) {
            return Err(corrupt_table!("CRT modulus {} is smaller than 2", m));
        }
        let product = moduli
            .iter()
            .try_fold(1u64, |acc, &m| acc.checked_mul(m))
            .filter(|&p| p <= i64::MAX as u64)
            .ok_or_else(|| corrupt_table!("CRT base {:?} overflows 63 bits", moduli))?;

        let mut weights = Vec::with_capacity(moduli.len());
        for &m in moduli {
            let cofactor = product / m;
            let inv = mod_inverse(cofactor % m, m)?;
            let weight = ((cofactor as u128 * inv as u128) % product as u128) as u64;
            weights.push(weight);
        }

        Ok(Self {
            moduli: moduli.to_vec(),
            product,
            weights,
        })
    }

    /// The moduli, in slot order
    pub fn moduli(&self) -> &[u64] {
        &self.moduli
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.moduli.len()
    }

    /// Always false for a constructed base
    pub fn is_empty(&self) -> bool {
        self.moduli.is_empty()
    }

    /// Product of all moduli
    pub fn product(&self) -> u64 {
        self.product
    }

    /// Split a value into its residues, `residues[i] = x mod b_i`.
    pub fn decompose(&self, x: u64) -> Vec<u64> {
        self.moduli.iter().map(|&m| x % m).collect()
    }

    /// Reconstruct the unique value in `[0, M)` with the given residues.
    ///
    /// Residues may exceed their modulus; only their class matters.
    pub fn recompose(&self, residues: &[u64]) -> Result<u64> {
        if residues.len() != self.moduli.len() {
            return Err(WhiteboxError::DomainMismatch(format!(
                "expected {} residues, got {}",
                self.moduli.len(),
                residues.len()
            )));
        }
        let m = self.product as u128;
        let x = residues
            .iter()
            .zip(&self.weights)
            .fold(0u128, |acc, (&r, &w)| (acc + (r as u128 % m) * w as u128) % m);
        Ok(x as u64)
    }
}
