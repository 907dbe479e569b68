//! `lockbox`: encrypt and decrypt single configuration values so they can be
//! pasted into a properties file and read back through an `encrypted` field.

use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use config_provider::crypto::{Algorithm, Decrypter, Encrypter};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lockbox", version, about = "Encrypt and decrypt configuration values")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Encrypt a value
    Encrypt(CryptoArgs),
    /// Decrypt a value
    Decrypt(CryptoArgs),
    /// Show the supported algorithms
    #[command(visible_alias = "l")]
    ListAlgorithms,
}

#[derive(Args)]
#[command(after_help = "Examples:\n  lockbox encrypt -c aesgcm mysecret myvalue\n  lockbox decrypt -c aesgcm mysecret myencryptedvalue")]
struct CryptoArgs {
    /// Crypto algorithm (see `lockbox list-algorithms`)
    #[arg(short = 'c', long = "crypto-algorithm")]
    algorithm: Algorithm,
    /// Secret key for encryption/decryption (can be passed positionally)
    #[arg(short = 's', long = "secret-key", env = "LOCKBOX_SECRET_KEY", hide_env_values = true)]
    secret: Option<String>,
    /// Value to encrypt/decrypt (can be passed positionally)
    #[arg(short = 'v', long = "value")]
    value: Option<String>,
    /// [SECRET] [VALUE], used for whichever of the two is not given as a flag
    #[arg(value_name = "ARGS", num_args = 0..=2)]
    positional: Vec<String>,
}

impl CryptoArgs {
    /// Flags win; positionals fill in what is left, secret first.
    fn resolve(self) -> Result<(Algorithm, String, String)> {
        let mut positional = self.positional.into_iter().map(|arg| arg.trim().to_string());
        let secret = self.secret.or_else(|| positional.next());
        let value = self.value.or_else(|| positional.next());

        match (secret, value) {
            (Some(secret), Some(value)) if !secret.is_empty() && !value.is_empty() => {
                Ok((self.algorithm, secret, value))
            }
            _ => bail!("--crypto-algorithm, secret, and value are required"),
        }
    }
}

fn run(command: Command) -> Result<String> {
    match command {
        Command::Encrypt(args) => {
            let (algorithm, secret, value) = args.resolve()?;
            let cipher = algorithm
                .with_secret(&secret)
                .with_context(|| format!("unable to set up {algorithm}"))?;
            tracing::debug!(%algorithm, "encrypting value");
            cipher.encrypt(&value).context("encryption failed")
        }
        Command::Decrypt(args) => {
            let (algorithm, secret, value) = args.resolve()?;
            let cipher = algorithm
                .with_secret(&secret)
                .with_context(|| format!("unable to set up {algorithm}"))?;
            tracing::debug!(%algorithm, "decrypting value");
            cipher.decrypt(&value).context("decryption failed")
        }
        Command::ListAlgorithms => Ok(list_algorithms()),
    }
}

fn list_algorithms() -> String {
    let mut out = String::from("Supported Algorithms:");
    for algorithm in Algorithm::ALL {
        out.push_str(&format!("\n  {:<18} - {}", algorithm.name(), algorithm.description()));
    }
    out
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
