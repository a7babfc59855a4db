//! wb-decrypt: decrypt a ciphertext with a white-box table
//!
//! Reads the public key, white-box table and ciphertext artifacts and prints
//! the recovered plaintext.

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use eyre::{Context, Result};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use whitebox_ntru::codec::{bits_to_bytes, bits_to_string, bytes_to_text, trim_padding};
use whitebox_ntru::{ArtifactPaths, Artifacts, DecryptionPipeline};

#[derive(Parser)]
#[command(name = "wb-decrypt")]
#[command(about = "Decrypt a ciphertext using a white-box table")]
#[command(version)]
struct Args {
    /// Directory holding pub_enc_data.json, wb_dec_data.json and ciphertext.json
    #[arg(long, default_value = ".")]
    dir: PathBuf,

    /// Public key path (overrides --dir)
    #[arg(long)]
    public_key: Option<PathBuf>,

    /// White-box table path (overrides --dir)
    #[arg(long)]
    table: Option<PathBuf>,

    /// Ciphertext path (overrides --dir)
    #[arg(long)]
    ciphertext: Option<PathBuf>,

    /// Print the raw bit string instead of text
    #[arg(long)]
    bits: bool,

    /// Keep trailing NUL padding in the text output
    #[arg(long)]
    keep_padding: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn paths(&self) -> ArtifactPaths {
        let mut paths = ArtifactPaths::in_dir(&self.dir);
        if let Some(p) = &self.public_key {
            paths.public_key = p.clone();
        }
        if let Some(p) = &self.table {
            paths.table = p.clone();
        }
        if let Some(p) = &self.ciphertext {
            paths.ciphertext = p.clone();
        }
        paths
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let paths = args.paths();
    let total_start = Instant::now();

    info!("Loading artifacts...");
    let load_start = Instant::now();
    let artifacts = Artifacts::load(&paths).wrap_err_with(|| {
        format!(
            "Failed to load artifacts ({}, {}, {})",
            paths.public_key.display(),
            paths.table.display(),
            paths.ciphertext.display()
        )
    })?;
    info!("Load time: {:.2?}", load_start.elapsed());

    let pipeline = DecryptionPipeline::new(&artifacts.table, artifacts.ring())
        .wrap_err("Table does not match the public key")?;

    info!("Decrypting...");
    let decrypt_start = Instant::now();
    let bits = pipeline
        .decrypt(&artifacts.ciphertext)
        .wrap_err("Decryption failed")?;
    info!("Decrypt time: {:.2?}", decrypt_start.elapsed());

    if args.bits {
        println!("{}", bits_to_string(&bits)?);
    } else {
        let bytes = bits_to_bytes(&bits);
        let bytes = if args.keep_padding {
            &bytes[..]
        } else {
            trim_padding(&bytes)
        };
        println!("{}", bytes_to_text(bytes));
    }

    info!("Total time: {:.2?}", total_start.elapsed());
    Ok(())
}
