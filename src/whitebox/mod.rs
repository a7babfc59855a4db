//! White-box Montgomery multiplication
//!
//! The secret-dependent factor of the decryption product is compiled into two
//! families of lookup boxes, one per CRT base and per coefficient. Multiplying
//! in evaluation form then reduces to residue decomposition, box lookups and
//! CRT recomposition.

pub mod multiplier;
pub mod table;

#[cfg(test)]
pub(crate) mod testing;

pub use multiplier::WhiteBoxMultiplier;
pub use table::{FieldLayout, PackedTable, WhiteBoxTable};
