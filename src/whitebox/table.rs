//! Immutable white-box table
//!
//! The table is loaded once, validated once, and then shared read-only by every
//! multiplier and pipeline that needs it. Nothing in here mutates after
//! [`WhiteBoxTable::from_raw`] returns.

use serde::Deserialize;

use crate::artifact::RawWhiteBoxTable;
use crate::error::{corrupt_table, Result, WhiteboxError};
use crate::math::{mod_inverse, CrtBase, ModQ, NttContext};
use crate::params::{ChallengeLevel, RingParams};

/// Bit layout of one packed table word
///
/// A word holds `count` fields of `width` bits, field `i` at bit offset
/// `width * i`. Every field but the last is masked; the last one is read with a
/// shift only, so any bits above it belong to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLayout {
    width: u32,
    count: usize,
}

impl FieldLayout {
    /// Field width used by every known table compiler
    pub const DEFAULT_WIDTH: u32 = 5;

    /// Create a layout, rejecting widths that cannot be packed into a `u64`
    pub fn new(width: u32, count: usize) -> Result<Self> {
        if width == 0 || count == 0 || u64::from(width) * count as u64 > 63 {
            return Err(corrupt_table!(
                "{} fields of {} bits do not fit a table word",
                count,
                width
            ));
        }
        Ok(Self { width, count })
    }

    /// Bits per field
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Fields per word
    pub fn count(&self) -> usize {
        self.count
    }

    /// Exclusive upper bound of a field value
    pub fn capacity(&self) -> u64 {
        1 << self.width
    }

    /// Read field `i` of `word`
    #[inline]
    pub fn extract(&self, word: u64, i: usize) -> u64 {
        let shift = self.width * i as u32;
        if i + 1 < self.count {
            (word % (1 << (shift + self.width))) >> shift
        } else {
            word >> shift
        }
    }

    /// Pack field values into one word
    ///
    /// Inverse of [`extract`](Self::extract) for values below
    /// [`capacity`](Self::capacity).
    pub fn pack(&self, fields: &[u64]) -> u64 {
        fields
            .iter()
            .take(self.count)
            .enumerate()
            .fold(0, |word, (i, &f)| word + (f << (self.width * i as u32)))
    }
}

/// One `fb_dim_<i>` or `sb_dim_<i>` box, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedTable {
    rows: usize,
    cols: usize,
    words: Vec<u64>,
}

impl PackedTable {
    /// Flatten a rectangular matrix; ragged rows are rejected
    pub fn from_rows(rows: Vec<Vec<u64>>) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        if let Some(i) = rows.iter().position(|r| r.len() != cols) {
            return Err(corrupt_table!(
                "row {} has {} entries, expected {}",
                i,
                rows[i].len(),
                cols
            ));
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            words: rows.into_iter().flatten().collect(),
        })
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Packed word at `(row, col)`
    #[inline]
    pub fn get(&self, row: u64, col: u64) -> Result<u64> {
        let (r, c) = (row as usize, col as usize);
        if r >= self.rows || c >= self.cols {
            return Err(corrupt_table!(
                "lookup ({}, {}) outside {}x{} box",
                row,
                col,
                self.rows,
                self.cols
            ));
        }
        Ok(self.words[r * self.cols + c])
    }
}

/// Validated white-box decryption table
#[derive(Debug, Clone)]
pub struct WhiteBoxTable {
    ring: RingParams,
    beta: CrtBase,
    beta_p: CrtBase,
    layout: FieldLayout,
    ntt: NttContext,
    challenge: ChallengeLevel,
    first_boxes: Vec<PackedTable>,
    second_boxes: Vec<PackedTable>,
    /// Residues of M^{-1} mod M' in the secondary base
    minv_mp: Vec<u64>,
}

impl WhiteBoxTable {
    /// Validate a raw artifact against the ring it will decrypt in
    pub fn from_raw(raw: &RawWhiteBoxTable, ring: RingParams) -> Result<Self> {
        ring.validate()?;
        raw.verify_checksums()?;

        let k = raw.k;
        if raw.beta.len() != k || raw.beta_p.len() != k {
            return Err(corrupt_table!(
                "k = {} but beta has {} and beta_p has {} moduli",
                k,
                raw.beta.len(),
                raw.beta_p.len()
            ));
        }
        let layout = FieldLayout::new(
            raw.field_width.unwrap_or(FieldLayout::DEFAULT_WIDTH),
            k,
        )?;
        if let Some(&b) = raw
            .beta
            .iter()
            .chain(&raw.beta_p)
            .find(|&&b| b > layout.capacity())
        {
            return Err(corrupt_table!(
                "modulus {} does not fit a {}-bit field",
                b,
                layout.width()
            ));
        }

        let beta = CrtBase::new(&raw.beta)?;
        let beta_p = CrtBase::new(&raw.beta_p)?;
        let (m, m_p) = (beta.product(), beta_p.product());
        if m.checked_mul(m_p).is_none() {
            return Err(corrupt_table!("M * M' = {} * {} overflows 64 bits", m, m_p));
        }
        let minv_mp = beta_p.decompose(mod_inverse(m % m_p, m_p)?);

        let ntt = Self::check_ntt_constants(raw, &ring)?;
        let challenge =
            ChallengeLevel::from_code(raw.chal, raw.mask.clone(), raw.rotate, ring.degree)?;

        let row_bound = |base: &CrtBase| base.moduli().iter().copied().max().unwrap_or(0) as usize;
        let (fb_bound, sb_bound) = (row_bound(&beta), row_bound(&beta_p));

        let mut first_boxes = Vec::with_capacity(ring.degree);
        let mut second_boxes = Vec::with_capacity(ring.degree);
        for dim in 0..ring.degree {
            let fb = Self::load_box(raw, &format!("fb_dim_{}", dim), fb_bound)?;
            let sb = Self::load_box(raw, &format!("sb_dim_{}", dim), sb_bound)?;
            first_boxes.push(fb);
            second_boxes.push(sb);
        }

        Ok(Self {
            ring,
            beta,
            beta_p,
            layout,
            ntt,
            challenge,
            first_boxes,
            second_boxes,
            minv_mp,
        })
    }

    fn check_ntt_constants(raw: &RawWhiteBoxTable, ring: &RingParams) -> Result<NttContext> {
        let q = ring.modulus;
        let n = ring.degree as u64;
        let (root, unroot, ninv) = (
            ModQ::from_signed(raw.root, q),
            ModQ::from_signed(raw.unroot, q),
            ModQ::from_signed(raw.ninv, q),
        );
        if ModQ::pow(root, n, q) != q - 1 {
            return Err(corrupt_table!(
                "root {} is not a primitive {}-th root of unity mod {}",
                raw.root,
                2 * n,
                q
            ));
        }
        if ModQ::mul(root, unroot, q) != 1 {
            return Err(corrupt_table!("unroot {} is not the inverse of root", raw.unroot));
        }
        if ModQ::mul(ninv, n, q) != 1 {
            return Err(corrupt_table!("ninv {} is not the inverse of {}", raw.ninv, n));
        }
        Ok(NttContext::new(root, unroot, ninv))
    }

    fn load_box(raw: &RawWhiteBoxTable, key: &str, bound: usize) -> Result<PackedTable> {
        let value = raw
            .boxes
            .get(key)
            .ok_or_else(|| corrupt_table!("missing `{}`", key))?;
        let rows = Vec::<Vec<u64>>::deserialize(value)
            .map_err(|e| corrupt_table!("`{}` is not a matrix of table words: {}", key, e))?;
        let table = PackedTable::from_rows(rows)
            .map_err(|e| corrupt_table!("`{}`: {}", key, e))?;
        if table.rows() < bound || table.cols() < bound {
            return Err(corrupt_table!(
                "`{}` is {}x{}, residues need {}x{}",
                key,
                table.rows(),
                table.cols(),
                bound,
                bound
            ));
        }
        Ok(table)
    }

    /// Ring the table was compiled for
    pub fn ring(&self) -> RingParams {
        self.ring
    }

    /// Primary CRT base (beta)
    pub fn beta(&self) -> &CrtBase {
        &self.beta
    }

    /// Secondary CRT base (beta_p)
    pub fn beta_p(&self) -> &CrtBase {
        &self.beta_p
    }

    /// Field layout of the packed words
    pub fn layout(&self) -> FieldLayout {
        self.layout
    }

    /// Transform constants
    pub fn ntt(&self) -> &NttContext {
        &self.ntt
    }

    /// Extraction mode
    pub fn challenge(&self) -> &ChallengeLevel {
        &self.challenge
    }

    /// Residues of M^{-1} mod M' in the secondary base
    pub fn minv_mp(&self) -> &[u64] {
        &self.minv_mp
    }

    /// First and second box for coefficient `dim`
    pub fn boxes(&self, dim: usize) -> Result<(&PackedTable, &PackedTable)> {
        match (self.first_boxes.get(dim), self.second_boxes.get(dim)) {
            (Some(fb), Some(sb)) => Ok((fb, sb)),
            _ => Err(WhiteboxError::CorruptWhiteBoxTable(format!(
                "no boxes for dimension {} (degree {})",
                dim, self.ring.degree
            ))),
        }
    }
}
