//! `pack` command-line entry point.
//!
//! # Responsibility
//! - Load configuration, start logging, and run one pack use-case against
//!   the configured store.
//! - Print every result as JSON on stdout.
//!
//! # Invariants
//! - A failed envelope or unhealthy store exits non-zero after printing.

use anyhow::{bail, Context, Result};
use clap::{ArgGroup, Parser, Subcommand};
use log::info;
use pack_api::{ActionResponse, PackApi, PackCommand};
use pack_core::{init_logging, Pack, PackKeys, ServiceConfig};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "pack")]
#[command(about = "Pack catalog maintenance", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to /etc/pack/conf/conf.toml, then conf/conf.toml)
    #[arg(long, env = "PACK_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Store file, overriding `store.path`
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report service and store health
    Health,

    /// Show one pack
    #[command(group(ArgGroup::new("key").required(true).args(["id", "code", "product_id"])))]
    Show {
        #[arg(long)]
        id: Option<String>,

        #[arg(long)]
        code: Option<String>,

        #[arg(long)]
        product_id: Option<String>,
    },

    /// Check whether a product id or pack code is taken under an operator
    Exists {
        #[arg(long)]
        mno_id: i32,

        #[arg(long)]
        product_id: Option<String>,

        #[arg(long)]
        pack_code: Option<String>,
    },

    /// Create a pack from a JSON document
    Create {
        #[arg(long)]
        file: PathBuf,
    },

    /// Run a JSON command (`{"op": "change_name", ...}`)
    Apply {
        #[arg(long)]
        file: PathBuf,
    },

    /// Add stock to a pack; negative amounts take stock away
    MoveStock {
        #[arg(long)]
        id: String,

        #[arg(long, allow_hyphen_values = true)]
        amount: i64,
    },

    /// Delete a pack
    Delete {
        #[arg(long)]
        id: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ServiceConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(store) = cli.store {
        config.store.path = store;
    }

    init_logging(&config.app.log_level, config.app.log_dir.as_deref())
        .map_err(anyhow::Error::msg)
        .context("starting logger")?;
    info!(
        "event=cli_start module=cli status=ok store={} stock_policy={:?}",
        config.store.path.display(),
        config.stock.policy
    );

    let api = PackApi::from_config(&config);

    match cli.command {
        Commands::Health => {
            let status = api.health();
            print_json(&status)?;
            if !status.is_healthy() {
                bail!("pack store is unhealthy");
            }
            Ok(())
        }
        Commands::Show {
            id,
            code,
            product_id,
        } => {
            let response = match (id, code, product_id) {
                (Some(id), _, _) => api.get_by_id(&id),
                (None, Some(code), _) => api.get_by_code(&code),
                (None, None, Some(product_id)) => api.get_by_product_id(&product_id),
                (None, None, None) => bail!("one of --id, --code or --product-id is required"),
            };
            print_json(&response)?;
            if !response.success {
                bail!("{}", response.msg);
            }
            Ok(())
        }
        Commands::Exists {
            mno_id,
            product_id,
            pack_code,
        } => {
            let keys = PackKeys {
                mno_id,
                product_id,
                pack_code,
            };
            let response = api.exists(&keys);
            print_json(&response)?;
            if !response.success {
                bail!("{}", response.msg);
            }
            Ok(())
        }
        Commands::Create { file } => {
            let pack: Pack = serde_json::from_str(&read_input(&file)?)
                .with_context(|| format!("parsing pack document `{}`", file.display()))?;
            report(api.execute(PackCommand::Create { pack: Some(pack) }))
        }
        Commands::Apply { file } => report(api.execute_json(&read_input(&file)?)),
        Commands::MoveStock { id, amount } => report(api.execute(PackCommand::MoveStock { id, amount })),
        Commands::Delete { id } => report(api.execute(PackCommand::Delete { id })),
    }
}

fn report(response: ActionResponse) -> Result<()> {
    print_json(&response)?;
    if !response.success {
        bail!("[{}] {}", response.code, response.msg);
    }
    Ok(())
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_input(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading `{}`", path.display()))
}
