//! OAT key database administration.
//!
//! # Usage
//!
//! ```bash
//! export OAT_PASS='vault password of 16+ bytes'
//! export OAT_DOMAIN=api.example
//!
//! # Every initialized client id
//! oat-keys --db /var/lib/oat/keys.redb list
//!
//! # Verify a record opens under the configured password
//! oat-keys check 3F2A...
//!
//! # Force a client to re-initialize
//! oat-keys deinit 3F2A...
//! ```

use std::{io::Write, path::PathBuf};

use clap::{Parser, Subcommand};
use oat_keystore::{KeystoreConfig, KeystoreError, open_server};
use oat_proto::ClientId;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// OAT server key database tool
#[derive(Parser, Debug)]
#[command(name = "oat-keys")]
#[command(about = "Inspect and maintain an OAT server key database")]
#[command(version)]
struct Args {
    /// Database path (overrides OAT_DB)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Server domain (overrides OAT_DOMAIN)
    #[arg(long)]
    domain: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every initialized client id
    List,
    /// Open every sealed field of a client record
    Check {
        /// Client id (40 hex digits)
        client_id: ClientId,
    },
    /// Erase a client's key material
    Deinit {
        /// Client id (40 hex digits)
        client_id: ClientId,
    },
}

fn main() -> Result<(), KeystoreError> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer().with_writer(std::io::stderr)).with(filter).init();

    let mut config = KeystoreConfig::from_env()?;
    if let Some(db) = args.db {
        config.db_path = db;
    }
    if let Some(domain) = args.domain {
        config.domain = Some(domain);
    }

    let server = open_server(&config)?;
    let mut out = std::io::stdout().lock();

    match args.command {
        Command::List => {
            for client_id in server.list_clients()? {
                writeln!(out, "{client_id}")?;
            }
        },
        Command::Check { client_id } => {
            server.check_client(&client_id)?;
            writeln!(out, "{client_id} ok")?;
        },
        Command::Deinit { client_id } => {
            server.deinit(&client_id)?;
            writeln!(out, "{client_id} removed")?;
        },
    }

    Ok(())
}
