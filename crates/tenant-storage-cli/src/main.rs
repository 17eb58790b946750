//! tenant-storage: inspect and exercise a tenant's storage mapping.
//!
//! Configuration comes from the environment (and `.env` files); at minimum set
//! STORAGE_MAPPING_API_URL plus the secret store variables.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tenant_storage_adapter::{AdapterDeps, StorageAdapter};
use tenant_storage_cli::{init_tracing, ErrorView, SessionView};
use tenant_storage_core::{AdapterError, Config, SignedUrlAction};

#[derive(Parser)]
#[command(name = "tenant-storage", about = "Tenant storage routing CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a tenant and show its storage session
    Show {
        tenant: String,
    },
    /// Report whether the tenant's session can issue signed URLs
    CanSign {
        tenant: String,
    },
    /// Generate a signed URL for one object
    Sign {
        tenant: String,
        /// Object key inside the tenant's container
        key: String,
        /// upload | download
        #[arg(long, default_value = "download")]
        action: String,
        /// Lifetime in seconds (defaults to SIGNED_URL_TTL_SECS)
        #[arg(long)]
        ttl_secs: Option<u64>,
    },
    /// Upload a local file
    Upload {
        tenant: String,
        key: String,
        file: PathBuf,
        /// Fail if the object already exists
        #[arg(long)]
        no_overwrite: bool,
    },
    /// Download an object to a local file
    Download {
        tenant: String,
        key: String,
        file: PathBuf,
    },
}

impl Commands {
    fn tenant(&self) -> &str {
        match self {
            Commands::Show { tenant }
            | Commands::CanSign { tenant }
            | Commands::Sign { tenant, .. }
            | Commands::Upload { tenant, .. }
            | Commands::Download { tenant, .. } => tenant,
        }
    }
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

async fn run(command: Commands, deps: AdapterDeps) -> Result<serde_json::Value, AdapterError> {
    let adapter = StorageAdapter::create(command.tenant(), deps).await?;

    let value = match command {
        Commands::Show { .. } => {
            let (mapping, session) = adapter.into_parts()?;
            serde_json::to_value(SessionView::new(&mapping, &session)).unwrap_or_default()
        }
        Commands::CanSign { tenant } => serde_json::json!({
            "tenant_id": tenant,
            "can_sign": adapter.can_generate_signed_url(),
        }),
        Commands::Sign {
            key,
            action,
            ttl_secs,
            ..
        } => {
            let action: SignedUrlAction = action.parse()?;
            let signed = match ttl_secs {
                Some(secs) => {
                    adapter
                        .generate_signed_url_with_ttl(&key, action, Duration::from_secs(secs))
                        .await?
                }
                None => adapter.generate_signed_url(&key, action).await?,
            };
            serde_json::to_value(&signed).unwrap_or_default()
        }
        Commands::Upload {
            key,
            file,
            no_overwrite,
            ..
        } => {
            let size = adapter.upload_with(&key, &file, !no_overwrite).await?;
            serde_json::json!({ "key": key, "size_bytes": size })
        }
        Commands::Download { key, file, .. } => {
            let size = adapter.download(&key, &file).await?;
            serde_json::json!({ "key": key, "path": file, "size_bytes": size })
        }
    };

    Ok(value)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;
    let deps = AdapterDeps::from_config(&config).context("Failed to set up storage adapter")?;

    match run(cli.command, deps).await {
        Ok(value) => {
            print_json(&value)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            print_json(&ErrorView::from(&error))?;
            Ok(ExitCode::FAILURE)
        }
    }
}
