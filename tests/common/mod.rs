//! Test fixtures: key generation, table compilation and encryption
//!
//! These play the role of the external table compiler and encryptor so the
//! decryption engine can be exercised end to end.

#![allow(dead_code)]

use std::path::Path;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use whitebox_ntru::artifact::save_json;
use whitebox_ntru::codec::bytes_to_bits;
use whitebox_ntru::math::{mod_inverse, ModQ, NttContext, RingElement};
use whitebox_ntru::{
    extract_bit, ArtifactPaths, Ciphertext, FieldLayout, PublicKey, RawWhiteBoxTable,
    RingParams, WhiteBoxTable,
};

pub const MODULUS: u64 = 1231873;
pub const BETA: [u64; 5] = [13, 16, 19, 27, 29];
pub const BETA_P: [u64; 5] = [11, 17, 23, 25, 31];

pub fn test_ring(degree: usize) -> RingParams {
    RingParams {
        degree,
        modulus: MODULUS,
    }
}

/// Rounded Box-Muller sample, σ = 1
pub fn gaussian<R: Rng>(rng: &mut R) -> i64 {
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    z.round() as i64
}

fn gaussian_element<R: Rng>(ring: &RingParams, scale: i64, rng: &mut R) -> RingElement {
    let coeffs: Vec<i64> = (0..ring.degree).map(|_| scale * gaussian(rng)).collect();
    RingElement::from_signed(&coeffs, ring.modulus)
}

/// Centered lift into `[-q/2, q/2]`, the form artifacts store
fn signed(e: &RingElement) -> Vec<i64> {
    let q = e.modulus();
    e.coeffs()
        .iter()
        .map(|&c| if c <= q / 2 { c as i64 } else { c as i64 - q as i64 })
        .collect()
}

fn message_element(ring: &RingParams, bits: &[u8]) -> RingElement {
    assert!(bits.len() <= ring.degree, "message too long for the ring");
    let mut coeffs = vec![0u64; ring.degree];
    for (c, &b) in coeffs.iter_mut().zip(bits) {
        *c = u64::from(b);
    }
    RingElement::from_coeffs(coeffs, ring.modulus)
}

fn to_ntt(e: &RingElement, ctx: &NttContext) -> RingElement {
    let mut e = e.clone();
    e.to_evaluation(ctx).unwrap();
    e
}

/// Per-dimension first and second boxes for a secret part `P(dim, x, y) mod b`
pub fn compile_boxes<F>(degree: usize, part: F) -> Vec<(Vec<Vec<u64>>, Vec<Vec<u64>>)>
where
    F: Fn(usize, u64, u64, u64) -> u64,
{
    let m: u64 = BETA.iter().product();
    let m_p: u64 = BETA_P.iter().product();
    let neg_ninv = ModQ::negate(mod_inverse(MODULUS % m, m).unwrap(), m);
    let minv = mod_inverse(m % m_p, m_p).unwrap();
    let layout = FieldLayout::new(FieldLayout::DEFAULT_WIDTH, BETA.len()).unwrap();

    let boxes_for = |dim: usize, base: &[u64], factor: u64| -> Vec<Vec<u64>> {
        (0..32u64)
            .map(|j| {
                (0..32u64)
                    .map(|l| {
                        let fields: Vec<u64> = base
                            .iter()
                            .map(|&b| part(dim, j % b, l % b, b) * (factor % b) % b)
                            .collect();
                        layout.pack(&fields)
                    })
                    .collect()
            })
            .collect()
    };

    (0..degree)
        .map(|dim| (boxes_for(dim, &BETA, neg_ninv), boxes_for(dim, &BETA_P, minv)))
        .collect()
}

fn raw_table(ring: &RingParams, chal: u8) -> RawWhiteBoxTable {
    let ctx = NttContext::for_ring(ring).unwrap();
    RawWhiteBoxTable {
        beta: BETA.to_vec(),
        beta_p: BETA_P.to_vec(),
        k: BETA.len(),
        root: ctx.root() as i64,
        unroot: ctx.unroot() as i64,
        ninv: ctx.ninv() as i64,
        chal,
        ..Default::default()
    }
}

/// Table whose multiplier returns the plain product `a·b` in every slot
pub fn product_raw_table(ring: &RingParams) -> RawWhiteBoxTable {
    let mut raw = raw_table(ring, 1);
    for (dim, (fb, sb)) in compile_boxes(ring.degree, |_, x, y, b| x * y % b)
        .into_iter()
        .enumerate()
    {
        raw.insert_boxes(dim, fb, sb);
    }
    raw
}

/// Key pair plus a compiled white-box table
pub struct Fixture {
    pub ring: RingParams,
    pub public_key: PublicKey,
    pub secret: RingElement,
    pub raw_table: RawWhiteBoxTable,
}

impl Fixture {
    /// Generate keys and compile a table of the given challenge level
    pub fn generate(degree: usize, chal: u8, seed: u64) -> Self {
        let ring = test_ring(degree);
        let mut rng = ChaCha20Rng::seed_from_u64(seed);

        let secret = gaussian_element(&ring, 1, &mut rng);
        let pka = RingElement::random_with_rng(degree, MODULUS, &mut rng);
        let noise = gaussian_element(&ring, 2, &mut rng);
        let pkb = noise.add(&pka.mul(&secret).unwrap()).unwrap().neg();

        let mut public_key = PublicKey {
            degree,
            modulus: MODULUS,
            pka: signed(&pka),
            pkb: signed(&pkb),
            data_checksum: None,
        };
        public_key.seal();

        let mut fixture = Self {
            ring,
            public_key,
            secret,
            raw_table: RawWhiteBoxTable::default(),
        };
        fixture.raw_table = fixture.compile(chal, &mut rng);
        fixture
    }

    /// `a2 + a1·sk` in coefficient form
    fn plain_decrypt(&self, ct: &Ciphertext) -> RingElement {
        let (a1, a2) = ct.to_elements(&self.ring).unwrap();
        a2.add(&a1.mul(&self.secret).unwrap()).unwrap()
    }

    fn compile(&self, chal: u8, rng: &mut ChaCha20Rng) -> RawWhiteBoxTable {
        let ring = self.ring;
        let n = ring.degree;
        let q = ring.modulus;
        let ctx = NttContext::for_ring(&ring).unwrap();
        let mut raw = raw_table(&ring, chal);

        // part(a, b) = a·ca + b·cb + cc, coefficients in evaluation form
        let (ca, cb, cc) = match chal {
            0 => (
                to_ntt(&self.secret, &ctx),
                RingElement::from_evaluations(vec![1; n], q),
                RingElement::from_evaluations(vec![0; n], q),
            ),
            1 => {
                let mut unit = vec![0u8; n];
                unit[0] = 1;
                let one = self.plain_decrypt(&self.encrypt_bits(&unit, rng));
                let zero = self
                    .plain_decrypt(&self.encrypt_bits(&vec![0u8; n], rng))
                    .neg();
                let s = to_ntt(&self.secret.mul(&one).unwrap(), &ctx);
                let sz = to_ntt(&self.secret.mul(&zero).unwrap(), &ctx);
                let o = to_ntt(&one, &ctx);
                let z = to_ntt(&zero, &ctx);
                (
                    s.add(&sz).unwrap(),
                    o.add(&z).unwrap(),
                    RingElement::from_evaluations(vec![0; n], q),
                )
            }
            2 => {
                let rotate = rng.gen_range(0..n);
                let mask: Vec<u8> = (0..n).map(|_| rng.gen_range(0..2u8)).collect();

                let mut monomial = vec![0u8; n];
                monomial[rotate] = 1;
                let rot = self.plain_decrypt(&self.encrypt_bits(&monomial, rng));
                let mask_neg = self.plain_decrypt(&self.encrypt_bits(&mask, rng)).neg();
                let s = to_ntt(&self.secret.mul(&rot).unwrap(), &ctx);
                let r = to_ntt(&rot, &ctx);
                let maskc = to_ntt(&mask_neg, &ctx);

                raw.mask = Some(mask);
                raw.rotate = Some(rotate);
                let shift = r.mul(&maskc).unwrap();
                (s, r, shift)
            }
            other => panic!("unknown challenge level {}", other),
        };

        let boxes = compile_boxes(n, |dim, x, y, b| {
            (x * (ca.coeff(dim) % b) + y * (cb.coeff(dim) % b) + cc.coeff(dim) % b) % b
        });
        for (dim, (fb, sb)) in boxes.into_iter().enumerate() {
            raw.insert_boxes(dim, fb, sb);
        }
        raw.seal();
        raw
    }

    /// Validated table
    pub fn table(&self) -> WhiteBoxTable {
        WhiteBoxTable::from_raw(&self.raw_table, self.ring).unwrap()
    }

    /// Encrypt a bit sequence (zero-padded to the ring degree)
    pub fn encrypt_bits<R: Rng>(&self, bits: &[u8], rng: &mut R) -> Ciphertext {
        let ring = &self.ring;
        let q = ring.modulus;
        let pka = RingElement::from_signed(&self.public_key.pka, q);
        let pkb = RingElement::from_signed(&self.public_key.pkb, q);

        let u = gaussian_element(ring, 1, rng);
        let e1 = gaussian_element(ring, 2, rng);
        let e2 = gaussian_element(ring, 2, rng);
        let m = message_element(ring, bits);

        let a1 = pka.mul(&u).unwrap().add(&e1).unwrap();
        let a2 = pkb.mul(&u).unwrap().add(&e2).unwrap().add(&m).unwrap();
        Ciphertext {
            a1: signed(&a1),
            a2: signed(&a2),
        }
    }

    /// Encrypt text, MSB-first bits per byte
    pub fn encrypt_text<R: Rng>(&self, text: &str, rng: &mut R) -> Ciphertext {
        self.encrypt_bits(&bytes_to_bits(text.as_bytes()), rng)
    }

    /// Decrypt with the secret key in the clear
    pub fn reference_decrypt(&self, ct: &Ciphertext) -> Vec<u8> {
        let p = self.plain_decrypt(ct);
        p.coeffs()
            .iter()
            .map(|&v| extract_bit(v, self.ring.modulus, 0))
            .collect()
    }

    /// Write the three artifacts with their default names
    pub fn write_artifacts(&self, dir: &Path, ct: &Ciphertext) -> ArtifactPaths {
        let paths = ArtifactPaths::in_dir(dir);
        save_json("public key", &self.public_key, &paths.public_key).unwrap();
        save_json("white-box table", &self.raw_table, &paths.table).unwrap();
        save_json("ciphertext", ct, &paths.ciphertext).unwrap();
        paths
    }
}

/// Uniformly random bits
pub fn random_bits<R: Rng>(len: usize, rng: &mut R) -> Vec<u8> {
    (0..len).map(|_| rng.gen_range(0..2u8)).collect()
}
