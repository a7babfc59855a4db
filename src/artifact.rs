//! On-disk artifacts: public key, white-box table, ciphertext
//!
//! All three are JSON documents. Loading is fail-fast: every path is probed
//! before any file is parsed, and nothing is decrypted unless all three load
//! and validate.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, WhiteboxError};
use crate::math::RingElement;
use crate::params::RingParams;
use crate::whitebox::WhiteBoxTable;

const PUBLIC_KEY: &str = "public key";
const TABLE: &str = "white-box table";
const CIPHERTEXT: &str = "ciphertext";

/// blake3 digest over the little-endian `i64` encoding of `values`
pub fn integer_checksum<I: IntoIterator<Item = i64>>(values: I) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    for v in values {
        hasher.update(&v.to_le_bytes());
    }
    *hasher.finalize().as_bytes()
}

fn ring_checksum(degree: usize, modulus: u64) -> [u8; 32] {
    *blake3::hash(format!("{}:{}", degree, modulus).as_bytes()).as_bytes()
}

/// Public encryption key `(pka, pkb)` and the ring it lives in
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PublicKey {
    /// Ring dimension
    pub degree: usize,
    /// Ring modulus
    pub modulus: u64,
    /// Uniform component
    pub pka: Vec<i64>,
    /// `-(2e + pka·sk)`
    pub pkb: Vec<i64>,
    /// Digest of `"<degree>:<modulus>"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_checksum: Option<[u8; 32]>,
}

impl PublicKey {
    /// Ring parameters declared by the key
    pub fn ring(&self) -> RingParams {
        RingParams {
            degree: self.degree,
            modulus: self.modulus,
        }
    }

    /// Fill in the ring digest
    pub fn seal(&mut self) {
        self.data_checksum = Some(ring_checksum(self.degree, self.modulus));
    }

    /// Check ring parameters, key lengths and the optional ring digest
    pub fn validate(&self) -> Result<()> {
        self.ring().validate()?;
        for (field, v) in [("pka", &self.pka), ("pkb", &self.pkb)] {
            if v.len() != self.degree {
                return Err(WhiteboxError::malformed(
                    PUBLIC_KEY,
                    format!("{} has {} coefficients, degree is {}", field, v.len(), self.degree),
                ));
            }
        }
        match self.data_checksum {
            Some(sum) if sum != ring_checksum(self.degree, self.modulus) => {
                Err(WhiteboxError::ChecksumMismatch { field: "data" })
            }
            _ => Ok(()),
        }
    }
}

/// Ciphertext pair in coefficient form
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ciphertext {
    /// `pka·u + e1`
    pub a1: Vec<i64>,
    /// `pkb·u + e2 + m`
    pub a2: Vec<i64>,
}

impl Ciphertext {
    /// Check both halves have one coefficient per ring slot
    pub fn validate(&self, ring: &RingParams) -> Result<()> {
        for (field, v) in [("a1", &self.a1), ("a2", &self.a2)] {
            if v.len() != ring.degree {
                return Err(WhiteboxError::malformed(
                    CIPHERTEXT,
                    format!("{} has {} coefficients, degree is {}", field, v.len(), ring.degree),
                ));
            }
        }
        Ok(())
    }

    /// Lift both halves into coefficient-form ring elements
    pub fn to_elements(&self, ring: &RingParams) -> Result<(RingElement, RingElement)> {
        self.validate(ring)?;
        Ok((
            RingElement::from_signed(&self.a1, ring.modulus),
            RingElement::from_signed(&self.a2, ring.modulus),
        ))
    }
}

/// White-box table exactly as stored on disk
///
/// The per-dimension boxes sit at the top level under `fb_dim_<i>` and
/// `sb_dim_<i>`; they are collected into `boxes` and only decoded when the
/// table is validated.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RawWhiteBoxTable {
    /// Primary CRT base
    pub beta: Vec<u64>,
    /// Secondary CRT base
    pub beta_p: Vec<u64>,
    /// Number of moduli per base, and fields per packed word
    pub k: usize,
    /// Forward NTT root
    pub root: i64,
    /// Inverse NTT root
    pub unroot: i64,
    /// Inverse of the degree
    pub ninv: i64,
    /// Challenge level code
    pub chal: u8,
    /// Per-coefficient mask (code 2)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<Vec<u8>>,
    /// Read rotation (code 2)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotate: Option<usize>,
    /// Bits per packed field, 5 when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_width: Option<u32>,
    /// Digest of `beta`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beta_checksum: Option<[u8; 32]>,
    /// Digest of `beta_p`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beta_p_checksum: Option<[u8; 32]>,
    /// Digest of `mask`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask_checksum: Option<[u8; 32]>,
    /// Digest of `[root, unroot, ninv, k, rotate, chal]`, `rotate` 0 when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_checksum: Option<[u8; 32]>,
    /// `fb_dim_<i>` / `sb_dim_<i>` matrices, plus any other top-level keys
    #[serde(flatten)]
    pub boxes: BTreeMap<String, serde_json::Value>,
}

impl RawWhiteBoxTable {
    /// Store the first and second box of one coefficient
    pub fn insert_boxes(&mut self, dim: usize, first: Vec<Vec<u64>>, second: Vec<Vec<u64>>) {
        self.boxes
            .insert(format!("fb_dim_{}", dim), serde_json::Value::from(first));
        self.boxes
            .insert(format!("sb_dim_{}", dim), serde_json::Value::from(second));
    }

    fn digests(&self) -> [(&'static str, [u8; 32]); 4] {
        let mask = self.mask.as_deref().unwrap_or_default();
        let data = [
            self.root,
            self.unroot,
            self.ninv,
            self.k as i64,
            self.rotate.unwrap_or(0) as i64,
            i64::from(self.chal),
        ];
        [
            ("beta", integer_checksum(self.beta.iter().map(|&b| b as i64))),
            ("beta_p", integer_checksum(self.beta_p.iter().map(|&b| b as i64))),
            ("mask", integer_checksum(mask.iter().map(|&b| i64::from(b)))),
            ("data", integer_checksum(data)),
        ]
    }

    /// Record digests of the CRT bases, the mask and the scalar settings
    pub fn seal(&mut self) {
        let [(_, beta), (_, beta_p), (_, mask), (_, data)] = self.digests();
        self.beta_checksum = Some(beta);
        self.beta_p_checksum = Some(beta_p);
        self.mask_checksum = Some(mask);
        self.data_checksum = Some(data);
    }

    /// Compare every stored digest against the current contents
    ///
    /// Absent digests are not checked.
    pub fn verify_checksums(&self) -> Result<()> {
        let stored = [
            self.beta_checksum,
            self.beta_p_checksum,
            self.mask_checksum,
            self.data_checksum,
        ];
        for ((field, actual), expected) in self.digests().into_iter().zip(stored) {
            if expected.is_some_and(|e| e != actual) {
                return Err(WhiteboxError::ChecksumMismatch { field });
            }
        }
        Ok(())
    }
}

/// Locations of the three artifacts
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// Public key document
    pub public_key: PathBuf,
    /// White-box table document
    pub table: PathBuf,
    /// Ciphertext document
    pub ciphertext: PathBuf,
}

impl ArtifactPaths {
    /// Default public key file name
    pub const PUBLIC_KEY_FILE: &'static str = "pub_enc_data.json";
    /// Default table file name
    pub const TABLE_FILE: &'static str = "wb_dec_data.json";
    /// Default ciphertext file name
    pub const CIPHERTEXT_FILE: &'static str = "ciphertext.json";

    /// Default file names inside `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            public_key: dir.join(Self::PUBLIC_KEY_FILE),
            table: dir.join(Self::TABLE_FILE),
            ciphertext: dir.join(Self::CIPHERTEXT_FILE),
        }
    }

    fn entries(&self) -> [(&'static str, &Path); 3] {
        [
            (PUBLIC_KEY, self.public_key.as_path()),
            (TABLE, self.table.as_path()),
            (CIPHERTEXT, self.ciphertext.as_path()),
        ]
    }

    /// Fail with `MissingArtifact` on the first path that does not exist
    pub fn check_exist(&self) -> Result<()> {
        for (name, path) in self.entries() {
            if !path.is_file() {
                return Err(WhiteboxError::MissingArtifact {
                    name,
                    path: path.to_path_buf(),
                });
            }
        }
        Ok(())
    }
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self::in_dir(".")
    }
}

/// Everything one decryption needs, loaded and validated
#[derive(Debug)]
pub struct Artifacts {
    /// Public key (carries the ring parameters)
    pub public_key: PublicKey,
    /// Validated white-box table
    pub table: WhiteBoxTable,
    /// Ciphertext to decrypt
    pub ciphertext: Ciphertext,
}

impl Artifacts {
    /// Load and cross-check all three artifacts
    pub fn load(paths: &ArtifactPaths) -> Result<Self> {
        paths.check_exist()?;

        let public_key: PublicKey = read_json(PUBLIC_KEY, &paths.public_key)?;
        public_key.validate()?;
        let ring = public_key.ring();
        info!(
            "Loaded public key: degree {}, modulus {}",
            ring.degree, ring.modulus
        );

        let ciphertext: Ciphertext = read_json(CIPHERTEXT, &paths.ciphertext)?;
        ciphertext.validate(&ring)?;
        info!("Loaded ciphertext");

        let raw: RawWhiteBoxTable = read_json(TABLE, &paths.table)?;
        debug!(
            "Raw table: k = {}, chal = {}, {} top-level boxes",
            raw.k,
            raw.chal,
            raw.boxes.len()
        );
        let table = WhiteBoxTable::from_raw(&raw, ring)?;
        info!(
            "Loaded white-box table: challenge level {}, beta {:?}, beta_p {:?}",
            table.challenge().code(),
            table.beta().moduli(),
            table.beta_p().moduli()
        );

        Ok(Self {
            public_key,
            table,
            ciphertext,
        })
    }

    /// Ring parameters shared by all three artifacts
    pub fn ring(&self) -> RingParams {
        self.public_key.ring()
    }
}

fn read_json<T: DeserializeOwned>(name: &'static str, path: &Path) -> Result<T> {
    let file = File::open(path).map_err(|source| WhiteboxError::Io {
        name,
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| WhiteboxError::malformed(name, format!("{}: {}", path.display(), e)))
}

/// Write an artifact as JSON
pub fn save_json<T: Serialize>(name: &'static str, value: &T, path: &Path) -> Result<()> {
    let io_err = |source| WhiteboxError::Io {
        name,
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, value)
        .map_err(|e| WhiteboxError::malformed(name, e.to_string()))?;
    writer.flush().map_err(io_err)?;
    debug!("Wrote {} to {}", name, path.display());
    Ok(())
}
