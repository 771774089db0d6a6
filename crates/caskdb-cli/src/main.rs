//! caskdb command-line driver.
//!
//! A thin demo/operator shell around the `caskdb-storage` engine: every
//! subcommand opens the store at `<dir>` (replaying its log if needed),
//! performs one operation, and closes it again. There is no server and no
//! long-lived process — each invocation is a fresh `Engine::open`.
//!
//! # Quick start
//!
//! ```bash
//! caskdb init ./data
//! caskdb put ./data key value
//! caskdb get ./data key
//! caskdb merge ./data
//! ```

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// caskdb - an embeddable, persistent Bitcask-style key-value store.
#[derive(Parser)]
#[command(name = "caskdb")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version information.
    Version,

    /// Write a default `caskdb.toml` into a new or existing directory.
    Init {
        /// Directory to initialize.
        dir: PathBuf,
    },

    /// Write a key/value pair.
    Put {
        /// Store directory.
        dir: PathBuf,
        /// Key.
        key: String,
        /// Value.
        value: String,
        /// Fsync the active segment immediately after the write.
        #[arg(long)]
        sync: bool,
    },

    /// Read a key's value.
    Get {
        /// Store directory.
        dir: PathBuf,
        /// Key.
        key: String,
    },

    /// Delete a key.
    Delete {
        /// Store directory.
        dir: PathBuf,
        /// Key.
        key: String,
    },

    /// List every live key, in ascending order.
    ListKeys {
        /// Store directory.
        dir: PathBuf,
    },

    /// Iterate live keys and values.
    Iter {
        /// Store directory.
        dir: PathBuf,
        /// Only visit keys starting with this prefix.
        #[arg(long, default_value = "")]
        prefix: String,
        /// Iterate in descending key order.
        #[arg(long)]
        reverse: bool,
    },

    /// Commit a batch of put/delete operations atomically.
    Batch {
        /// Store directory.
        dir: PathBuf,
        /// Operations as `put:key:value` or `del:key`, applied in order and
        /// committed together.
        #[arg(required = true)]
        ops: Vec<String>,
    },

    /// Compact archived segments, discarding superseded and deleted records.
    Merge {
        /// Store directory.
        dir: PathBuf,
    },

    /// Flush the active segment to disk.
    Sync {
        /// Store directory.
        dir: PathBuf,
    },

    /// Show segment and key counts for a store.
    Info {
        /// Store directory.
        dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = caskdb_config::CaskConfig::load(".").unwrap_or_default();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(&config.log.level)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Commands::Version => {
            commands::version::run();
            Ok(())
        }
        Commands::Init { dir } => commands::init::run(&dir),
        Commands::Put {
            dir,
            key,
            value,
            sync,
        } => commands::put::run(&dir, &key, &value, sync),
        Commands::Get { dir, key } => commands::get::run(&dir, &key),
        Commands::Delete { dir, key } => commands::delete::run(&dir, &key),
        Commands::ListKeys { dir } => commands::list_keys::run(&dir),
        Commands::Iter {
            dir,
            prefix,
            reverse,
        } => commands::iter::run(&dir, &prefix, reverse),
        Commands::Batch { dir, ops } => commands::batch::run(&dir, &ops),
        Commands::Merge { dir } => commands::merge::run(&dir),
        Commands::Sync { dir } => commands::sync::run(&dir),
        Commands::Info { dir } => commands::info::run(&dir),
    }
}
