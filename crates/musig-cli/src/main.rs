//! MuSig Party CLI
//!
//! Command-line interface for driving multi-signature ceremonies with
//! local JSON state:
//! - Key generation (random or seed-derived)
//! - Nonce rounds with a persisted per-party nonce store
//! - Key aggregation, partial signing, aggregation and verification

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use musig_core::{
    combine_public_keys, combine_public_keys_salted, sum_signatures, verify, AggregationMode,
    CombinedPublicKey, KeyPair, MusigSigner, PublicKey, PublicNonces, Signature, SignatureOutput,
};
use std::path::{Path, PathBuf};
use tracing::{info, Level};

/// MuSig Party - local multi-signature ceremonies
#[derive(Parser)]
#[command(name = "musig-cli")]
#[command(about = "Schnorr multi-signature party tool")]
#[command(version)]
struct Cli {
    /// Data directory for keys and nonce stores
    #[arg(short, long, env = "DEST", default_value = "./data")]
    dest: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a key pair
    Keygen {
        /// Party name, used for the key file
        #[arg(short, long)]
        name: String,

        /// Derive the key deterministically from a seed instead of randomly
        #[arg(short, long)]
        seed: Option<String>,
    },

    /// Open a nonce round and print the public nonces to exchange
    Nonces {
        /// Party name
        #[arg(short, long)]
        name: String,
    },

    /// Aggregate participant public keys into a combined key
    Aggregate {
        /// Compressed public keys (hex, comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        keys: Vec<String>,

        /// Optional aggregation secret (hex, 33 bytes or less)
        #[arg(short, long, conflicts_with = "salted")]
        secret: Option<String>,

        /// Salt the aggregation with a fresh random secret
        #[arg(long)]
        salted: bool,
    },

    /// Produce a partial signature for an open nonce round
    Sign {
        /// Party name
        #[arg(short, long)]
        name: String,

        /// Message to sign
        #[arg(short, long)]
        message: String,

        /// Compressed public keys of all participants (hex, comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        keys: Vec<String>,

        /// Aggregation secret the combined key was built with, if any
        #[arg(long)]
        secret: Option<String>,

        /// File holding the exchanged public nonces (JSON array)
        #[arg(long)]
        nonces: PathBuf,
    },

    /// Sum partial signatures into the final signature
    Combine {
        /// Partial signatures (hex, comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        signatures: Vec<String>,
    },

    /// Verify a signature
    Verify {
        /// Signature scalar (hex)
        #[arg(short, long)]
        signature: String,

        /// Message that was signed
        #[arg(short, long)]
        message: String,

        /// Final public nonce R (hex)
        #[arg(long)]
        nonce: String,

        /// Public key or combined key to verify against (hex)
        #[arg(short, long)]
        key: String,
    },

    /// Run a full in-process ceremony
    Demo {
        /// Number of parties
        #[arg(short, long, default_value_t = 3)]
        parties: usize,

        /// Message to sign
        #[arg(short, long, default_value = "musig demo message")]
        message: String,
    },
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    std::fs::create_dir_all(&cli.dest)?;

    match cli.command {
        Commands::Keygen { ref name, ref seed } => run_keygen(&cli, name, seed.as_deref())?,
        Commands::Nonces { ref name } => run_nonces(&cli, name)?,
        Commands::Aggregate {
            ref keys,
            ref secret,
            salted,
        } => run_aggregate(keys, secret.as_deref(), salted)?,
        Commands::Sign {
            ref name,
            ref message,
            ref keys,
            ref secret,
            ref nonces,
        } => run_sign(&cli, name, message, keys, secret.as_deref(), nonces)?,
        Commands::Combine { ref signatures } => run_combine(signatures)?,
        Commands::Verify {
            ref signature,
            ref message,
            ref nonce,
            ref key,
        } => run_verify(signature, message, nonce, key)?,
        Commands::Demo {
            parties,
            ref message,
        } => run_demo(parties, message)?,
    }

    Ok(())
}

fn key_path(cli: &Cli, name: &str) -> PathBuf {
    cli.dest.join(format!("{name}.key.json"))
}

fn store_path(cli: &Cli, name: &str) -> PathBuf {
    cli.dest.join(format!("{name}.nonces.json"))
}

fn load_key_pair(cli: &Cli, name: &str) -> Result<KeyPair> {
    let path = key_path(cli, name);
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("no key file for party '{name}' at {}", path.display()))?;
    Ok(serde_json::from_str(&json)?)
}

fn load_signer(path: &Path) -> Result<MusigSigner> {
    if path.exists() {
        let json = std::fs::read_to_string(path)?;
        Ok(MusigSigner::from_json(&json)?)
    } else {
        Ok(MusigSigner::new())
    }
}

fn save_signer(path: &Path, signer: &MusigSigner) -> Result<()> {
    std::fs::write(path, signer.to_json()?)?;
    Ok(())
}

fn parse_keys(keys: &[String]) -> Result<Vec<PublicKey>> {
    keys.iter()
        .map(|raw| PublicKey::from_hex(raw).map_err(Into::into))
        .collect()
}

fn run_keygen(cli: &Cli, name: &str, seed: Option<&str>) -> Result<()> {
    let key_pair = match seed {
        Some(seed) => KeyPair::from_seed(seed)?,
        None => KeyPair::random()?,
    };

    let path = key_path(cli, name);
    std::fs::write(&path, serde_json::to_string_pretty(&key_pair)?)?;

    info!(
        party = name,
        public_key = %key_pair.public_key,
        path = %path.display(),
        "Key pair written"
    );
    println!("{}", key_pair.public_key);
    Ok(())
}

fn run_nonces(cli: &Cli, name: &str) -> Result<()> {
    let key_pair = load_key_pair(cli, name)?;
    let path = store_path(cli, name);

    let mut signer = load_signer(&path)?;
    let public_nonces = signer.generate_public_nonces(&key_pair.private_key)?;
    save_signer(&path, &signer)?;

    info!(party = name, "Nonce round opened");
    println!("{}", serde_json::to_string_pretty(&public_nonces)?);
    Ok(())
}

fn aggregate_keys(
    public_keys: &[PublicKey],
    secret: Option<&str>,
    salted: bool,
) -> Result<CombinedPublicKey> {
    let combined = if salted {
        combine_public_keys_salted(public_keys)?
    } else {
        combine_public_keys(public_keys, AggregationMode::Deterministic { secret })?
    };
    Ok(combined)
}

fn run_aggregate(keys: &[String], secret: Option<&str>, salted: bool) -> Result<()> {
    let public_keys = parse_keys(keys)?;
    let combined = aggregate_keys(&public_keys, secret, salted)?;

    info!(
        participants = public_keys.len(),
        combined_key = %combined.combined_key,
        "Public keys aggregated"
    );
    println!("{}", serde_json::to_string_pretty(&combined)?);
    Ok(())
}

fn run_sign(
    cli: &Cli,
    name: &str,
    message: &str,
    keys: &[String],
    secret: Option<&str>,
    nonces: &Path,
) -> Result<()> {
    let key_pair = load_key_pair(cli, name)?;
    let public_keys = parse_keys(keys)?;

    let json = std::fs::read_to_string(nonces)
        .with_context(|| format!("cannot read nonce file {}", nonces.display()))?;
    let public_nonces: Vec<PublicNonces> = serde_json::from_str(&json)?;

    let path = store_path(cli, name);
    let mut signer = load_signer(&path)?;

    let output = match secret {
        Some(secret) => {
            let combined = combine_public_keys(
                &public_keys,
                AggregationMode::Deterministic {
                    secret: Some(secret),
                },
            )?;
            signer.multi_sig_sign_with_key(&key_pair.private_key, message, &combined, &public_nonces)?
        }
        None => signer.multi_sig_sign(&key_pair.private_key, message, &public_keys, &public_nonces)?,
    };

    // The round is consumed whether or not anything else succeeds below.
    save_signer(&path, &signer)?;

    info!(party = name, "Partial signature produced");
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn run_combine(signatures: &[String]) -> Result<()> {
    let partials: Vec<Signature> = signatures
        .iter()
        .map(|raw| Signature::from_hex(raw).map_err(anyhow::Error::from))
        .collect::<Result<_>>()?;

    let summed = sum_signatures(&partials)?;
    println!("{summed}");
    Ok(())
}

fn run_verify(signature: &str, message: &str, nonce: &str, key: &str) -> Result<()> {
    let signature = Signature::from_hex(signature)?;
    let final_public_nonce = PublicKey::from_hex(nonce)?;
    let public_key = PublicKey::from_hex(key)?;

    let valid = verify(&signature, message, &final_public_nonce, &public_key)?;
    println!("{valid}");

    if !valid {
        std::process::exit(1);
    }
    Ok(())
}

fn run_demo(parties: usize, message: &str) -> Result<()> {
    if parties < 2 {
        bail!("a ceremony needs at least 2 parties");
    }

    info!(parties, message, "Starting ceremony");

    let key_pairs: Vec<KeyPair> = (0..parties)
        .map(|_| KeyPair::random().map_err(anyhow::Error::from))
        .collect::<Result<_>>()?;
    let public_keys: Vec<PublicKey> = key_pairs.iter().map(|pair| pair.public_key).collect();

    let mut signers: Vec<MusigSigner> = (0..parties).map(|_| MusigSigner::new()).collect();

    // Round 1: exchange nonce commitments.
    let public_nonces: Vec<PublicNonces> = signers
        .iter_mut()
        .zip(&key_pairs)
        .map(|(signer, pair)| {
            signer
                .generate_public_nonces(&pair.private_key)
                .map_err(anyhow::Error::from)
        })
        .collect::<Result<_>>()?;
    info!("Round 1 complete: nonces exchanged");

    let combined = combine_public_keys(&public_keys, AggregationMode::Deterministic { secret: None })?;
    info!(combined_key = %combined.combined_key, "Keys aggregated");

    // Round 2: every party signs against the full commitment set.
    let outputs: Vec<SignatureOutput> = signers
        .iter_mut()
        .zip(&key_pairs)
        .map(|(signer, pair)| {
            signer
                .multi_sig_sign(&pair.private_key, message, &public_keys, &public_nonces)
                .map_err(anyhow::Error::from)
        })
        .collect::<Result<_>>()?;
    info!("Round 2 complete: partial signatures produced");

    let partials: Vec<Signature> = outputs.iter().map(|output| output.signature).collect();
    let summed = sum_signatures(&partials)?;

    let valid = verify(
        &summed,
        message,
        &outputs[0].final_public_nonce,
        &combined.combined_key,
    )?;

    info!(
        signature = %summed,
        final_public_nonce = %outputs[0].final_public_nonce,
        valid,
        "Ceremony finished"
    );

    if !valid {
        bail!("aggregated signature failed verification");
    }
    println!("{}", serde_json::to_string_pretty(&outputs[0])?);
    println!("{summed}");
    Ok(())
}
