//! Ring parameters and challenge levels
//!
//! The ring is R_q = Z_q[X]/(X^d + 1) with d a power of two and q an odd prime
//! satisfying q ≡ 1 (mod 2d), so that the negacyclic NTT exists.

use crate::error::{Result, WhiteboxError};

/// Core ring parameters shared by the public key, ciphertext and table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingParams {
    /// Ring dimension d (power of two)
    pub degree: usize,

    /// Prime modulus q
    pub modulus: u64,
}

impl RingParams {
    /// Parameters used by the reference artifacts: d = 512, q = 1231873 = 1203 · 1024 + 1
    pub fn reference() -> Self {
        Self {
            degree: 512,
            modulus: 1231873,
        }
    }

    /// Rounding threshold: residues above q/2 encode negative values
    pub fn half_modulus(&self) -> u64 {
        self.modulus / 2
    }

    /// Check if parameters are usable by the transform and the bit extraction
    pub fn validate(&self) -> Result<()> {
        // Ring dimension must be power of two for the bit-reversal step
        if self.degree < 2 || !self.degree.is_power_of_two() {
            return Err(WhiteboxError::InvalidDegree(self.degree));
        }

        // Parity extraction relies on an odd modulus
        if self.modulus < 3 || self.modulus % 2 == 0 || self.modulus > i64::MAX as u64 {
            return Err(WhiteboxError::malformed(
                "public key",
                format!("modulus {} must be an odd integer in [3, 2^63)", self.modulus),
            ));
        }

        Ok(())
    }

    /// Whether q ≡ 1 (mod 2d), i.e. a primitive 2d-th root of unity exists
    pub fn supports_negacyclic_ntt(&self) -> bool {
        self.modulus % (2 * self.degree as u64) == 1
    }
}

impl Default for RingParams {
    fn default() -> Self {
        Self::reference()
    }
}

/// Challenge level of the message-extraction step
///
/// The artifact stores this as an integer code `chal`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ChallengeLevel {
    /// Codes 0 and 1: bit = parity of the rounded coefficient
    ///
    /// Code 0 tables embed the secret directly, code 1 tables embed it through
    /// encryptions of one and zero. Both decode identically.
    #[default]
    Unmasked,

    /// Code 2: coefficients are read at a secret rotation and XOR-masked
    Masked {
        /// Per-coefficient 0/1 mask
        mask: Vec<u8>,
        /// Rotation applied to the read index
        rotate: usize,
    },
}

impl ChallengeLevel {
    /// Artifact code for this level (`Unmasked` reports 1)
    pub fn code(&self) -> u8 {
        match self {
            Self::Unmasked => 1,
            Self::Masked { .. } => 2,
        }
    }

    /// Build a level from its artifact code plus the optional masking data
    ///
    /// `degree` fixes the mask length; the rotation is reduced modulo it.
    pub fn from_code(
        code: u8,
        mask: Option<Vec<u8>>,
        rotate: Option<usize>,
        degree: usize,
    ) -> Result<Self> {
        match code {
            0 | 1 => Ok(Self::Unmasked),
            2 => {
                let mask = mask.ok_or_else(|| {
                    WhiteboxError::malformed("white-box table", "chal 2 requires `mask`")
                })?;
                let rotate = rotate.ok_or_else(|| {
                    WhiteboxError::malformed("white-box table", "chal 2 requires `rotate`")
                })?;
                if mask.len() != degree {
                    return Err(WhiteboxError::malformed(
                        "white-box table",
                        format!("mask has {} entries, ring degree is {}", mask.len(), degree),
                    ));
                }
                if let Some(i) = mask.iter().position(|&b| b > 1) {
                    return Err(WhiteboxError::malformed(
                        "white-box table",
                        format!("mask[{}] = {} is not a bit", i, mask[i]),
                    ));
                }
                let rotate = rotate.checked_rem(degree).ok_or_else(|| {
                    WhiteboxError::malformed("white-box table", "chal 2 on an empty ring")
                })?;
                Ok(Self::Masked { mask, rotate })
            }
            other => Err(WhiteboxError::malformed(
                "white-box table",
                format!("unknown challenge level {}", other),
            )),
        }
    }
}
