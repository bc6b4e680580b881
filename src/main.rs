//! Zoomify tiler - turns uploaded images into Zoomify tile sets in S3.
//!
//! This binary wires the CLI subcommands to the library components.

use std::io::Read;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use zoomify_tiler::{
    config::{CheckConfig, Cli, Command, HandleConfig, ServeConfig, StorageArgs, TileConfig},
    create_s3_client,
    event::S3Event,
    orchestrator::{locate_original, OriginalLookup, TileOrchestrator, TileOutcome},
    server::{create_router, RouterConfig},
    tile::Tiler,
    S3ObjectStore,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Handle(config) => run_handle(config).await,
        Command::Serve(config) => run_serve(config).await,
        Command::Tile(config) => run_tile(config).await,
        Command::Check(config) => run_check(config).await,
    }
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "zoomify_tiler=debug,tower_http=debug"
    } else {
        "zoomify_tiler=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn object_store(storage: &StorageArgs) -> S3ObjectStore {
    let client = create_s3_client(storage.s3_endpoint.as_deref(), &storage.s3_region).await;
    S3ObjectStore::new(client)
}

// =============================================================================
// Handle Command
// =============================================================================

async fn run_handle(config: HandleConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let payload = match read_event(&config) {
        Ok(payload) => payload,
        Err(e) => {
            error!("Failed to read event from {}: {}", config.event, e);
            return ExitCode::FAILURE;
        }
    };

    let event = match S3Event::from_slice(&payload) {
        Ok(event) => event,
        Err(e) => {
            error!("Invalid notification document: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let orchestrator = TileOrchestrator::new(
        object_store(&config.storage).await,
        config.pipeline.tiler(),
        config.pipeline.orchestrator_config(),
    );

    let outcomes = match orchestrator.handle_event(&event).await {
        Ok(outcomes) => outcomes,
        Err(e) => {
            error!("Invocation failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match serde_json::to_string_pretty(&outcomes) {
        Ok(json) => println!("{}", json),
        Err(e) => warn!("Failed to render outcomes: {}", e),
    }

    if outcomes.iter().all(TileOutcome::is_complete) {
        ExitCode::SUCCESS
    } else {
        error!("Some tiles were not uploaded");
        ExitCode::FAILURE
    }
}

fn read_event(config: &HandleConfig) -> std::io::Result<Vec<u8>> {
    if config.reads_stdin() {
        let mut buf = Vec::new();
        std::io::stdin().read_to_end(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read(&config.event)
    }
}

// =============================================================================
// Serve Command
// =============================================================================

async fn run_serve(config: ServeConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let orchestrator_config = config.pipeline.orchestrator_config();

    info!("Configuration:");
    if let Some(ref endpoint) = config.storage.s3_endpoint {
        info!("  S3 endpoint: {}", endpoint);
    }
    info!("  S3 region: {}", config.storage.s3_region);
    info!("  Scratch root: {}", orchestrator_config.scratch_root.display());
    info!(
        "  Tiles: {}px, {} uploads in flight",
        config.pipeline.tile_size, config.pipeline.upload_concurrency
    );

    let mut router_config = RouterConfig::new().with_tracing(!config.no_tracing);
    match config.auth_token {
        Some(ref token) => {
            info!("  Auth: bearer token");
            router_config = router_config.with_auth_token(token.clone());
        }
        None => warn!("  Auth: DISABLED - anyone can post events"),
    }

    let orchestrator = TileOrchestrator::new(
        object_store(&config.storage).await,
        config.pipeline.tiler(),
        orchestrator_config,
    );
    let router = create_router(orchestrator, router_config);

    let addr = config.bind_address();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    info!("Listening on http://{}", addr);
    info!("  Point bucket notifications at http://{}/events", addr);

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

// =============================================================================
// Tile Command
// =============================================================================

async fn run_tile(config: TileConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let source = match tokio::fs::read(&config.input).await {
        Ok(source) => source,
        Err(e) => {
            error!("Failed to read {}: {}", config.input.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let tiler = zoomify_tiler::tile::ZoomifyTiler::with_tile_size(config.tile_size);
    let output = config.output.clone();
    let result = tokio::task::spawn_blocking(move || tiler.tile(&source, &output)).await;

    match result {
        Ok(Ok(summary)) => {
            println!(
                "{}x{} image: {} tiers, {} tiles written to {}",
                summary.width,
                summary.height,
                summary.tiers,
                summary.tiles,
                config.output.display()
            );
            ExitCode::SUCCESS
        }
        Ok(Err(e)) => {
            error!("Tiling failed: {}", e);
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("Tiling task failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

// =============================================================================
// Check Command
// =============================================================================

async fn run_check(config: CheckConfig) -> ExitCode {
    if config.verbose {
        init_logging(true);
    }

    println!("Zoomify Tiler Configuration Check");
    println!("═════════════════════════════════");
    println!();

    if let Err(e) = config.validate() {
        println!("✗ Configuration: {}", e);
        return ExitCode::FAILURE;
    }

    println!("✓ Bucket: {}", config.bucket);
    if let Some(ref endpoint) = config.storage.s3_endpoint {
        println!("✓ Endpoint: {}", endpoint);
    }
    println!("✓ Region: {}", config.storage.s3_region);
    println!();

    print!("Testing S3 connection... ");

    let store = object_store(&config.storage).await;

    match store
        .client()
        .list_objects_v2()
        .bucket(&config.bucket)
        .max_keys(1)
        .send()
        .await
    {
        Ok(_) => println!("✓ success"),
        Err(e) => {
            println!("✗ failed");
            println!();
            println!("Error: {}", e);
            println!();
            println!("Please check:");
            println!("  - Your AWS credentials are configured correctly");
            println!("  - The bucket '{}' exists and is accessible", config.bucket);
            if config.storage.s3_endpoint.is_some() {
                println!("  - The S3 endpoint is correct and reachable");
            }
            return ExitCode::FAILURE;
        }
    }

    if let Some(ref prefix) = config.prefix {
        println!();
        print!("Looking for original under '{}'... ", prefix);

        let orchestrator_config = config.pipeline.orchestrator_config();
        match locate_original(
            &store,
            &config.bucket,
            prefix,
            &orchestrator_config.matcher(),
            orchestrator_config.list_page_size,
        )
        .await
        {
            Ok(OriginalLookup::Proceed(entry)) => {
                println!("✓ found");
                println!("  Would tile: {}", entry.key);
            }
            Ok(OriginalLookup::Skip(entry)) => {
                println!("✓ found (backfill)");
                println!("  Would skip: {}", entry.key);
            }
            Err(e) => {
                println!("✗ {}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    println!();
    println!("═════════════════════════════════");
    println!("✓ All checks passed!");

    ExitCode::SUCCESS
}
