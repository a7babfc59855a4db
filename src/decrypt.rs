//! Decryption pipeline
//!
//! ```text
//! (a1, a2) --forward--> (â1, â2) --white-box ⊙--> p̂ --inverse--> p --threshold--> bits
//! ```
//!
//! The white-box product folds the secret key into `â1 ⊙ â2`, so `p` is the
//! noisy message polynomial (rotated and masked under challenge level 2).
//! Each coefficient is then rounded to its sign-corrected parity.

use std::time::Instant;

use tracing::debug;

use crate::artifact::Ciphertext;
use crate::codec::{bits_to_bytes, bytes_to_text};
use crate::error::{Result, WhiteboxError};
use crate::math::RingElement;
use crate::params::{ChallengeLevel, RingParams};
use crate::whitebox::{WhiteBoxMultiplier, WhiteBoxTable};

/// Recover one plaintext bit from a coefficient of the decrypted product
///
/// Residues above `q/2` stand for negative values, whose parity is flipped
/// relative to the residue since `q` is odd. `mask_bit` is XORed in first.
#[inline]
pub fn extract_bit(v: u64, q: u64, mask_bit: u8) -> u8 {
    let v = v % q;
    let parity = ((v + u64::from(mask_bit)) % 2) as u8;
    if v > q / 2 {
        1 - parity
    } else {
        parity
    }
}

/// Decrypts ciphertexts against one loaded table
#[derive(Debug, Clone, Copy)]
pub struct DecryptionPipeline<'t> {
    table: &'t WhiteBoxTable,
    ring: RingParams,
}

impl<'t> DecryptionPipeline<'t> {
    /// Bind a table to the ring of the public key
    pub fn new(table: &'t WhiteBoxTable, ring: RingParams) -> Result<Self> {
        ring.validate()?;
        if table.ring() != ring {
            return Err(WhiteboxError::DomainMismatch(format!(
                "table compiled for {:?}, key uses {:?}",
                table.ring(),
                ring
            )));
        }
        Ok(Self { table, ring })
    }

    /// Ring parameters
    pub fn ring(&self) -> RingParams {
        self.ring
    }

    /// Decrypt to one bit per ring coefficient
    pub fn decrypt(&self, ciphertext: &Ciphertext) -> Result<Vec<u8>> {
        let (a1, a2) = ciphertext.to_elements(&self.ring)?;
        self.decrypt_elements(&a1, &a2)
    }

    /// Decrypt coefficient-form ciphertext halves; the inputs are left untouched
    pub fn decrypt_elements(&self, a1: &RingElement, a2: &RingElement) -> Result<Vec<u8>> {
        for e in [a1, a2] {
            if e.degree() != self.ring.degree || e.modulus() != self.ring.modulus {
                return Err(WhiteboxError::DomainMismatch(format!(
                    "ciphertext in degree {} mod {}, expected degree {} mod {}",
                    e.degree(),
                    e.modulus(),
                    self.ring.degree,
                    self.ring.modulus
                )));
            }
        }
        let start = Instant::now();
        let ntt = self.table.ntt();

        let mut a1 = a1.clone();
        let mut a2 = a2.clone();
        a1.to_evaluation(ntt)?;
        a2.to_evaluation(ntt)?;

        let mut product = WhiteBoxMultiplier::new(self.table).multiply(&a1, &a2)?;
        product.to_coefficient(ntt)?;

        let bits = self.extract_bits(&product);
        debug!(
            "Decrypted {} coefficients in {:.2?}",
            bits.len(),
            start.elapsed()
        );
        Ok(bits)
    }

    fn extract_bits(&self, product: &RingElement) -> Vec<u8> {
        let n = self.ring.degree;
        let q = self.ring.modulus;
        match self.table.challenge() {
            ChallengeLevel::Unmasked => (0..n)
                .map(|i| extract_bit(product.coeff(i), q, 0))
                .collect(),
            ChallengeLevel::Masked { mask, rotate } => (0..n)
                .map(|i| extract_bit(product.coeff((i + rotate) % n), q, mask[i]))
                .collect(),
        }
    }

    /// Decrypt and pack into bytes (trailing zero padding kept)
    pub fn decrypt_bytes(&self, ciphertext: &Ciphertext) -> Result<Vec<u8>> {
        Ok(bits_to_bytes(&self.decrypt(ciphertext)?))
    }

    /// Decrypt and render as Latin-1 text (trailing NULs kept)
    pub fn decrypt_text(&self, ciphertext: &Ciphertext) -> Result<String> {
        Ok(bytes_to_text(&self.decrypt_bytes(ciphertext)?))
    }
}
