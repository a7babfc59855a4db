//! Box compiler for the plain product `a·b`, used by unit tests

use crate::artifact::RawWhiteBoxTable;
use crate::math::{mod_inverse, primitive_root, ModQ};
use crate::params::RingParams;
use crate::whitebox::{FieldLayout, WhiteBoxTable};

pub(crate) const Q: u64 = 1231873;
pub(crate) const BETA: [u64; 5] = [13, 16, 19, 27, 29];
pub(crate) const BETA_P: [u64; 5] = [11, 17, 23, 25, 31];

/// 32x32 box whose field `i` is `(j·l·factor) mod base[i]`
fn compile_box(base: &[u64], factor: u64, layout: FieldLayout) -> Vec<Vec<u64>> {
    (0..32u64)
        .map(|j| {
            (0..32u64)
                .map(|l| {
                    let fields: Vec<u64> = base
                        .iter()
                        .map(|&b| (j % b) * (l % b) % b * (factor % b) % b)
                        .collect();
                    layout.pack(&fields)
                })
                .collect()
        })
        .collect()
}

/// Raw table whose multiplier computes `a·b` in every slot
pub(crate) fn product_raw_table(degree: usize) -> RawWhiteBoxTable {
    let m: u64 = BETA.iter().product();
    let m_p: u64 = BETA_P.iter().product();
    let neg_ninv = ModQ::negate(mod_inverse(Q % m, m).unwrap(), m);
    let minv = mod_inverse(m % m_p, m_p).unwrap();
    let layout = FieldLayout::new(5, 5).unwrap();
    let fb = compile_box(&BETA, neg_ninv, layout);
    let sb = compile_box(&BETA_P, minv, layout);

    let root = primitive_root(2 * degree as u64, Q).unwrap();
    let mut raw = RawWhiteBoxTable {
        beta: BETA.to_vec(),
        beta_p: BETA_P.to_vec(),
        k: 5,
        root: root as i64,
        unroot: mod_inverse(root, Q).unwrap() as i64,
        ninv: mod_inverse(degree as u64, Q).unwrap() as i64,
        chal: 1,
        ..Default::default()
    };
    for dim in 0..degree {
        raw.insert_boxes(dim, fb.clone(), sb.clone());
    }
    raw
}

pub(crate) fn ring(degree: usize) -> RingParams {
    RingParams { degree, modulus: Q }
}

pub(crate) fn product_table(degree: usize) -> WhiteBoxTable {
    WhiteBoxTable::from_raw(&product_raw_table(degree), ring(degree)).unwrap()
}
