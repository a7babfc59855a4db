//! Scalar arithmetic in Z_q
//!
//! Ring moduli here are below 2^32 while CRT products and Montgomery outputs
//! use the full word, so products go through `u128`.

/// Arithmetic over Z_q for `q < 2^63`
///
/// `add`, `sub` and `negate` expect reduced operands. `mul`, `pow`, `reduce`
/// and `from_signed` accept any representative.
pub struct ModQ;

impl ModQ {
    /// `a + b mod q`
    #[inline]
    pub fn add(a: u64, b: u64, q: u64) -> u64 {
        let sum = a + b;
        if sum >= q {
            sum - q
        } else {
            sum
        }
    }

    /// `a - b mod q`
    #[inline]
    pub fn sub(a: u64, b: u64, q: u64) -> u64 {
        if a >= b {
            a - b
        } else {
            a + q - b
        }
    }

    /// `a * b mod q` through a 128-bit product
    #[inline]
    pub fn mul(a: u64, b: u64, q: u64) -> u64 {
        (u128::from(a) * u128::from(b) % u128::from(q)) as u64
    }

    /// `-a mod q`
    #[inline]
    pub fn negate(a: u64, q: u64) -> u64 {
        match a {
            0 => 0,
            _ => q - a,
        }
    }

    /// Canonical residue of a signed artifact coefficient
    #[inline]
    pub fn from_signed(val: i64, q: u64) -> u64 {
        i128::from(val).rem_euclid(i128::from(q)) as u64
    }

    /// Canonical residue of an unreduced value
    #[inline]
    pub fn reduce(a: u64, q: u64) -> u64 {
        a % q
    }

    /// `base^exp mod q` by square-and-multiply
    pub fn pow(base: u64, mut exp: u64, q: u64) -> u64 {
        let mut result = 1 % q;
        let mut base = base % q;
        while exp > 0 {
            if exp & 1 == 1 {
                result = Self::mul(result, base, q);
            }
            exp >>= 1;
            base = Self::mul(base, base, q);
        }
        result
    }
}
