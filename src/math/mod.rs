//! Arithmetic primitives for the decryption engine.
//!
//! - **Modular arithmetic** over Z_q with `u128` intermediates
//! - **CRT bases** for the residue-number representation used by the white-box tables
//! - **Number-Theoretic Transform (NTT)** for negacyclic multiplication
//! - **Ring elements** over R_q = Z_q[X]/(X^d + 1) with an explicit domain tag
//!
//! # Example
//!
//! ```
//! use whitebox_ntru::math::{NttContext, RingElement};
//! use whitebox_ntru::params::RingParams;
//!
//! let params = RingParams { degree: 64, modulus: 1231873 };
//! let ctx = NttContext::for_ring(&params).unwrap();
//! let mut e = RingElement::from_coeffs(vec![3; 64], params.modulus);
//! e.to_evaluation(&ctx).unwrap();
//! e.to_coefficient(&ctx).unwrap();
//! assert_eq!(e.coeffs(), &[3; 64][..]);
//! ```

pub mod crt;
pub mod modular;
pub mod ntt;
pub mod poly;

pub use crt::{extended_gcd, mod_inverse, CrtBase};
pub use modular::ModQ;
pub use ntt::{primitive_root, NttContext};
pub use poly::{Domain, PlainPointwise, PointwiseMul, RingElement};
