mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;
use std::time::Duration;

use vitrine_core::config::Config;
use vitrine_server::context::AppContext;

/// Layer configuration: defaults, JSON file, `.env`, then the environment.
fn load_config(path: Option<&Path>) -> Result<Config> {
    // A missing .env file is normal.
    if let Ok(path) = dotenv::dotenv() {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    let mut config = Config::load_or_default(path);
    config
        .apply_env()
        .context("invalid configuration in environment")?;
    Ok(config)
}

async fn serve(config: Config) -> Result<()> {
    tracing::info!("Starting vitrine {}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    vitrine_server::start(config).await?;
    Ok(())
}

async fn sweep(config: Config, dry_run: bool, grace: Duration) -> Result<()> {
    let ctx = AppContext::open(config)?;
    let orphans = ctx.catalog.sweep_orphans(dry_run, grace).await?;

    if orphans.is_empty() {
        println!("No orphaned uploads");
        return Ok(());
    }

    let verb = if dry_run { "Would delete" } else { "Deleted" };
    for name in &orphans {
        println!("{verb} {name}");
    }
    println!("{} orphaned upload(s)", orphans.len());
    Ok(())
}

fn check_config(config: &Config) -> Result<()> {
    println!("Server: {}:{}", config.server.host, config.server.port);
    println!("Database: {}", config.database.sqlite_path().display());
    println!("  Pool size: {}", config.database.pool_size);
    println!("Uploads: {}", config.uploads.dir.display());
    println!("  Image mode: {:?}", config.uploads.image_mode);
    println!("  Upload mode: {:?}", config.uploads.upload_mode);
    println!("  Max upload: {} bytes", config.server.max_upload_bytes);
    if let Some(ref dir) = config.server.public_dir {
        println!("Public dir: {}", dir.display());
    }

    let warnings = config.validate();
    if warnings.is_empty() {
        println!("✓ Configuration is valid");
    } else {
        for warning in warnings {
            println!("! {warning}");
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG if set, otherwise pick defaults from the verbose flag.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "vitrine=trace,vitrine_server=trace,vitrine_media=trace,vitrine_db=debug,\
             vitrine_core=debug,tower_http=debug"
                .to_string()
        } else {
            "vitrine=info,vitrine_server=info,vitrine_media=info,vitrine_db=info,tower_http=info"
                .to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    let command = cli.command.unwrap_or(Commands::Serve {
        host: None,
        port: None,
    });

    match command {
        Commands::Serve { host, port } => {
            let mut config = load_config(cli.config.as_deref())?;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(serve(config))
        }
        Commands::Sweep {
            dry_run,
            grace_secs,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(sweep(config, dry_run, Duration::from_secs(grace_secs)))
        }
        Commands::CheckConfig => {
            let config = load_config(cli.config.as_deref())?;
            check_config(&config)
        }
        Commands::Version => {
            println!("vitrine {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
