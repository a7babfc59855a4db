//! White-box NTRU decryption engine
//!
//! Decrypts ciphertexts of an NTRU-style scheme over R_q = Z_q[X]/(X^d + 1)
//! without ever handling the secret key in the clear. The secret-dependent
//! product is evaluated as a Montgomery multiplication whose quotient and
//! remainder steps are lookups into precompiled per-coefficient boxes over two
//! coprime CRT bases.
//!
//! Key components:
//! - `math`: modular arithmetic, CRT bases, the twisted negacyclic NTT and ring elements
//! - `whitebox`: the immutable table and the table-driven multiplier
//! - `decrypt`: transform, multiply, transform back, threshold
//! - `artifact`: JSON artifacts and the fail-fast loader
//! - `codec`: bits, bytes and Latin-1 text
//!
//! # Example
//!
//! ```ignore
//! use whitebox_ntru::{Artifacts, ArtifactPaths, DecryptionPipeline};
//!
//! let artifacts = Artifacts::load(&ArtifactPaths::in_dir("data"))?;
//! let pipeline = DecryptionPipeline::new(&artifacts.table, artifacts.ring())?;
//! let text = pipeline.decrypt_text(&artifacts.ciphertext)?;
//! ```

pub mod artifact;
pub mod codec;
pub mod decrypt;
pub mod error;
pub mod math;
pub mod params;
pub mod whitebox;

pub use artifact::{ArtifactPaths, Artifacts, Ciphertext, PublicKey, RawWhiteBoxTable};
pub use decrypt::{extract_bit, DecryptionPipeline};
pub use error::{Result, WhiteboxError};
pub use math::{Domain, NttContext, PlainPointwise, PointwiseMul, RingElement};
pub use params::{ChallengeLevel, RingParams};
pub use whitebox::{FieldLayout, WhiteBoxMultiplier, WhiteBoxTable};
