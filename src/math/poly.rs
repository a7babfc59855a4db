//! Ring elements of R_q = Z_q[X]/(X^d + 1).
//!
//! A [`RingElement`] is a fixed-length coefficient vector tagged with the
//! representation it is currently in. The tag is a two-state machine:
//!
//! ```text
//! Coefficient --forward--> Evaluation --inverse--> Coefficient
//! ```
//!
//! Transforms flip the tag in place; calling one out of sequence is an error
//! rather than a silent no-op.
//!
//! Multiplication in evaluation form is pointwise and goes through a
//! [`PointwiseMul`] strategy, so the same element type serves both the plain
//! arithmetic path and the white-box table path.

use rand::Rng;

use super::modular::ModQ;
use super::ntt::NttContext;
use crate::error::{Result, WhiteboxError};

/// Representation a ring element is currently held in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Domain {
    /// Polynomial coefficients
    #[default]
    Coefficient,
    /// NTT evaluations at the odd powers of a primitive 2d-th root of unity
    Evaluation,
}

/// Pointwise multiplication strategy for evaluation-form elements
///
/// `dim` is the coefficient index; strategies backed by per-coefficient tables
/// select their table with it.
pub trait PointwiseMul: Sync {
    /// Multiply one pair of evaluations
    fn mul_at(&self, dim: usize, a: u64, b: u64, modulus: u64) -> Result<u64>;

    /// Multiply two evaluation vectors slot by slot
    fn mul_all(&self, a: &[u64], b: &[u64], modulus: u64) -> Result<Vec<u64>> {
        a.iter()
            .zip(b)
            .enumerate()
            .map(|(dim, (&x, &y))| self.mul_at(dim, x, y, modulus))
            .collect()
    }
}

/// Ordinary integer product `a * b`, reduced later by the inverse transform
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainPointwise;

impl PointwiseMul for PlainPointwise {
    #[inline]
    fn mul_at(&self, dim: usize, a: u64, b: u64, _modulus: u64) -> Result<u64> {
        a.checked_mul(b).ok_or_else(|| {
            WhiteboxError::DomainMismatch(format!(
                "evaluation product {} * {} at dim {} overflows 64 bits",
                a, b, dim
            ))
        })
    }
}

/// Element of R_q in coefficient or evaluation form
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RingElement {
    /// Coefficients or evaluations, depending on `domain`.
    coeffs: Vec<u64>,
    /// Prime modulus q.
    modulus: u64,
    /// Current representation.
    domain: Domain,
}

impl RingElement {
    /// Create zero element with given degree and modulus
    pub fn zero(degree: usize, modulus: u64) -> Self {
        Self {
            coeffs: vec![0; degree],
            modulus,
            domain: Domain::Coefficient,
        }
    }

    /// Create element from coefficient vector, reducing every entry
    pub fn from_coeffs(coeffs: Vec<u64>, modulus: u64) -> Self {
        let coeffs = coeffs.into_iter().map(|c| ModQ::reduce(c, modulus)).collect();
        Self {
            coeffs,
            modulus,
            domain: Domain::Coefficient,
        }
    }

    /// Create element from signed coefficients (artifact form)
    pub fn from_signed(coeffs: &[i64], modulus: u64) -> Self {
        Self {
            coeffs: coeffs
                .iter()
                .map(|&c| ModQ::from_signed(c, modulus))
                .collect(),
            modulus,
            domain: Domain::Coefficient,
        }
    }

    /// Wrap values that are already in evaluation form
    pub fn from_evaluations(values: Vec<u64>, modulus: u64) -> Self {
        Self {
            coeffs: values,
            modulus,
            domain: Domain::Evaluation,
        }
    }

    /// Generate a uniformly random element with given RNG
    pub fn random_with_rng<R: Rng>(degree: usize, modulus: u64, rng: &mut R) -> Self {
        let coeffs = (0..degree).map(|_| rng.gen_range(0..modulus)).collect();
        Self {
            coeffs,
            modulus,
            domain: Domain::Coefficient,
        }
    }

    /// Ring dimension
    pub fn degree(&self) -> usize {
        self.coeffs.len()
    }

    /// Modulus q
    pub fn modulus(&self) -> u64 {
        self.modulus
    }

    /// Current representation
    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Check if in evaluation domain
    pub fn is_evaluation(&self) -> bool {
        self.domain == Domain::Evaluation
    }

    /// Coefficient (or evaluation) at index
    pub fn coeff(&self, i: usize) -> u64 {
        self.coeffs[i]
    }

    /// Get reference to coefficient/evaluation vector
    pub fn coeffs(&self) -> &[u64] {
        &self.coeffs
    }

    pub(crate) fn coeffs_mut(&mut self) -> &mut [u64] {
        &mut self.coeffs
    }

    pub(crate) fn set_domain(&mut self, domain: Domain) {
        self.domain = domain;
    }

    /// Consume the element, returning its raw vector
    pub fn into_coeffs(self) -> Vec<u64> {
        self.coeffs
    }

    /// Convert to evaluation form in place
    pub fn to_evaluation(&mut self, ctx: &NttContext) -> Result<()> {
        ctx.forward(self)
    }

    /// Convert to coefficient form in place
    pub fn to_coefficient(&mut self, ctx: &NttContext) -> Result<()> {
        ctx.inverse(self)
    }

    fn ensure_compatible(&self, other: &Self) -> Result<()> {
        if self.degree() != other.degree() {
            return Err(WhiteboxError::DomainMismatch(format!(
                "degree {} vs {}",
                self.degree(),
                other.degree()
            )));
        }
        if self.modulus != other.modulus {
            return Err(WhiteboxError::DomainMismatch(format!(
                "modulus {} vs {}",
                self.modulus, other.modulus
            )));
        }
        if self.domain != other.domain {
            return Err(WhiteboxError::DomainMismatch(format!(
                "{:?} vs {:?} form",
                self.domain, other.domain
            )));
        }
        Ok(())
    }

    fn zip_with(&self, other: &Self, f: impl Fn(u64, u64, u64) -> u64) -> Result<Self> {
        self.ensure_compatible(other)?;
        let q = self.modulus;
        let coeffs = self
            .coeffs
            .iter()
            .zip(&other.coeffs)
            .map(|(&a, &b)| f(ModQ::reduce(a, q), ModQ::reduce(b, q), q))
            .collect();
        Ok(Self {
            coeffs,
            modulus: q,
            domain: self.domain,
        })
    }

    /// Coefficient-wise addition
    pub fn add(&self, other: &Self) -> Result<Self> {
        self.zip_with(other, ModQ::add)
    }

    /// Coefficient-wise subtraction
    pub fn sub(&self, other: &Self) -> Result<Self> {
        self.zip_with(other, ModQ::sub)
    }

    /// Additive inverse
    pub fn neg(&self) -> Self {
        let q = self.modulus;
        Self {
            coeffs: self
                .coeffs
                .iter()
                .map(|&c| ModQ::negate(ModQ::reduce(c, q), q))
                .collect(),
            modulus: q,
            domain: self.domain,
        }
    }

    /// Ring multiplication
    ///
    /// Pointwise in evaluation form, negacyclic convolution in coefficient form.
    pub fn mul(&self, other: &Self) -> Result<Self> {
        match self.domain {
            Domain::Evaluation => self.mul_with(other, &PlainPointwise),
            Domain::Coefficient => self.mul_negacyclic(other),
        }
    }

    /// Pointwise product of two evaluation-form elements under a strategy
    ///
    /// The result keeps whatever representative the strategy returns; it is not
    /// reduced here.
    pub fn mul_with<S: PointwiseMul + ?Sized>(&self, other: &Self, strategy: &S) -> Result<Self> {
        self.ensure_compatible(other)?;
        if !self.is_evaluation() {
            return Err(WhiteboxError::NotTransformed);
        }
        let coeffs = strategy.mul_all(&self.coeffs, &other.coeffs, self.modulus)?;
        Ok(Self {
            coeffs,
            modulus: self.modulus,
            domain: Domain::Evaluation,
        })
    }

    /// Schoolbook multiplication modulo X^d + 1
    fn mul_negacyclic(&self, other: &Self) -> Result<Self> {
        self.ensure_compatible(other)?;
        let n = self.degree();
        let q = self.modulus;
        let mut coeffs = vec![0u64; n];

        for (i, &a) in self.coeffs.iter().enumerate() {
            for (j, &b) in other.coeffs.iter().enumerate() {
                let c = ModQ::mul(a, b, q);
                let k = i + j;
                if k < n {
                    coeffs[k] = ModQ::add(coeffs[k], c, q);
                } else {
                    // X^n = -1
                    coeffs[k % n] = ModQ::sub(coeffs[k % n], c, q);
                }
            }
        }

        Ok(Self {
            coeffs,
            modulus: q,
            domain: Domain::Coefficient,
        })
    }

    /// Check if every coefficient is zero
    pub fn is_zero(&self) -> bool {
        self.coeffs.iter().all(|&c| ModQ::reduce(c, self.modulus) == 0)
    }
}
