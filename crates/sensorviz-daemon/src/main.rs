//! Sensorviz Daemon - Main entry point
//!
//! Builds the sensor sprite scene, hands it to the renderer adapter and
//! animates it until interrupted or a tick limit is reached.

mod animator;
mod auth;
mod config;
mod renderer;
mod session;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use crate::auth::TokenFetcher;
use crate::config::Environment;
use crate::renderer::TracingRenderer;
use crate::session::Session;

#[derive(Parser, Debug)]
#[command(name = "sensorviz")]
#[command(about = "Animated sensor sprites for a building viewer")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "sensorviz.toml")]
    config: PathBuf,

    /// Deployment environment (local, dev, stage, prod)
    #[arg(short, long, default_value = "local")]
    env: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Stop after this many ticks
    #[arg(long)]
    ticks: Option<u64>,

    /// Seed for drift vectors and subset selection (overrides config)
    #[arg(long)]
    seed: Option<u64>,

    /// Write every patch as a JSON line on stdout
    #[arg(long)]
    emit_json: bool,

    /// Print the site settings as SCSS variables and exit
    #[arg(long)]
    print_scss: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Logs go to stderr so stdout stays clean for --emit-json
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Sensorviz v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = config::load_config(&args.config)?;
    let env = Environment::from_name(&args.env);
    let site = config.site_for(env);

    if args.print_scss {
        println!("{}", site.to_scss_env());
        return Ok(());
    }

    info!(
        env = %env,
        assets = %site.asset_url_prefix,
        tick_ms = config.animation.tick_interval_ms,
        "Configuration loaded"
    );

    // Fetch the viewer token before anything is built
    let token = match TokenFetcher::from_config(&config.auth)? {
        Some(fetcher) => {
            info!(url = %fetcher.url(), "Requesting viewer access token");
            let token = fetcher
                .fetch()
                .await
                .context("Failed to acquire viewer access token")?;
            Some(token)
        }
        None => None,
    };

    let registry = session::load_registry(&config)?;
    let seed = args.seed.or(config.animation.seed);
    let scene = session::build_scene(&config, &site, &registry, seed)?;

    let mut renderer = TracingRenderer::new(token);
    if args.emit_json {
        renderer = renderer.with_json_sink(Box::new(std::io::stdout()));
    }
    let renderer = Arc::new(renderer);

    let session = Session::start(
        scene,
        renderer.clone(),
        config.animation.tick_interval(),
        args.ticks,
    )?;

    info!(
        viewables = session.viewables(),
        animated = session.animated(),
        "Session started"
    );

    // Ctrl-C takes the same stop path with or without a tick limit
    let ticks = session
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    info!(
        ticks,
        viewables = renderer.viewable_count(),
        patches = renderer.patch_count(),
        "Session ended"
    );

    Ok(())
}

