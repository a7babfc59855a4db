//! Table-driven Montgomery multiplication
//!
//! For evaluation values `a`, `b` of coefficient `dim` the multiplier returns
//! `r * M` where `M = prod(beta)` and
//!
//! ```text
//! q  = -(a·b)·N^{-1}       mod M     (first box, residues in beta)
//! r  = (a·b + q·N) · M^{-1} mod M'   (second box, residues in beta_p)
//! ```
//!
//! so `r * M = a·b + q·N ≡ a·b (mod N)`. The boxes hold the secret-dependent
//! part of `a·b`; the multiplier only ever sees residues and packed words.

use rayon::prelude::*;

use super::table::WhiteBoxTable;
use crate::error::{corrupt_table, Result, WhiteboxError};
use crate::math::{ModQ, PointwiseMul, RingElement};

/// White-box pointwise multiplication strategy over a shared table
#[derive(Debug, Clone, Copy)]
pub struct WhiteBoxMultiplier<'t> {
    table: &'t WhiteBoxTable,
}

impl<'t> WhiteBoxMultiplier<'t> {
    /// Borrow a loaded table
    pub fn new(table: &'t WhiteBoxTable) -> Self {
        Self { table }
    }

    /// The table this multiplier reads
    pub fn table(&self) -> &'t WhiteBoxTable {
        self.table
    }

    /// Montgomery product of one evaluation pair, scaled by `M`
    ///
    /// The result is congruent to the table's product modulo `n` but is not
    /// reduced; it stays below `M * M'`.
    pub fn montgomery_multiply(&self, dim: usize, a: u64, b: u64, n: u64) -> Result<u64> {
        let table = self.table;
        let (beta, beta_p) = (table.beta(), table.beta_p());
        let layout = table.layout();
        let (first, second) = table.boxes(dim)?;

        let a_m = beta.decompose(a);
        let b_m = beta.decompose(b);
        let a_mp = beta_p.decompose(a);
        let b_mp = beta_p.decompose(b);
        let n_mp = beta_p.decompose(n);

        let q = a_m
            .iter()
            .zip(&b_m)
            .enumerate()
            .map(|(i, (&x, &y))| first.get(x, y).map(|w| layout.extract(w, i)))
            .collect::<Result<Vec<u64>>>()?;
        let q_mp = beta_p.decompose(beta.recompose(&q)?);

        let minv = table.minv_mp();
        let r = beta_p
            .moduli()
            .iter()
            .enumerate()
            .map(|(i, &m)| {
                let quotient_term = ModQ::mul(ModQ::mul(q_mp[i], n_mp[i], m), minv[i], m);
                let w = second.get(a_mp[i], b_mp[i])?;
                quotient_term.checked_add(layout.extract(w, i)).ok_or_else(|| {
                    corrupt_table!("second box field {} overflows at dim {}", i, dim)
                })
            })
            .collect::<Result<Vec<u64>>>()?;

        Ok(beta_p.recompose(&r)? * beta.product())
    }

    /// Pointwise white-box product of two evaluation-form elements, parallel over coefficients
    pub fn multiply(&self, a: &RingElement, b: &RingElement) -> Result<RingElement> {
        a.mul_with(b, self)
    }

    /// Same as [`multiply`](Self::multiply) on the calling thread only
    pub fn multiply_sequential(&self, a: &RingElement, b: &RingElement) -> Result<RingElement> {
        a.mul_with(b, &Sequential(self))
    }

    fn check_degree(&self, len: usize) -> Result<()> {
        let degree = self.table.ring().degree;
        if len != degree {
            return Err(WhiteboxError::DomainMismatch(format!(
                "element of degree {} against table of degree {}",
                len, degree
            )));
        }
        Ok(())
    }
}

impl PointwiseMul for WhiteBoxMultiplier<'_> {
    fn mul_at(&self, dim: usize, a: u64, b: u64, modulus: u64) -> Result<u64> {
        self.montgomery_multiply(dim, a, b, modulus)
    }

    fn mul_all(&self, a: &[u64], b: &[u64], modulus: u64) -> Result<Vec<u64>> {
        self.check_degree(a.len())?;
        a.par_iter()
            .zip(b.par_iter())
            .enumerate()
            .map(|(dim, (&x, &y))| self.montgomery_multiply(dim, x, y, modulus))
            .collect()
    }
}

/// Runs the default (sequential) slot loop of an inner strategy
struct Sequential<'a, 't>(&'a WhiteBoxMultiplier<'t>);

impl PointwiseMul for Sequential<'_, '_> {
    fn mul_at(&self, dim: usize, a: u64, b: u64, modulus: u64) -> Result<u64> {
        self.0.montgomery_multiply(dim, a, b, modulus)
    }

    fn mul_all(&self, a: &[u64], b: &[u64], modulus: u64) -> Result<Vec<u64>> {
        self.0.check_degree(a.len())?;
        a.iter()
            .zip(b)
            .enumerate()
            .map(|(dim, (&x, &y))| self.mul_at(dim, x, y, modulus))
            .collect()
    }
}
