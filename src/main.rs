//! Course CMS - REST backend for a course platform.
//!
//! This binary starts the HTTP server and configures all components.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use course_cms::{
    blob::LocalBlobStore,
    config::{CheckConfig, Cli, Command, MediaConfig, ServeConfig, StoreConfig},
    server::{create_router, AppState, RouterConfig},
    store::{DocumentStore, MemoryStore, MongoStore},
    Collection, MediaKind,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Serve(config) => run_serve(config).await,
        Command::Check(config) => run_check(config).await,
    }
}

// =============================================================================
// Serve Command
// =============================================================================

async fn run_serve(config: ServeConfig) -> ExitCode {
    // Initialize logging
    init_logging(config.verbose);

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    // Print startup banner and info
    print_banner();

    info!("Configuration:");
    info!("  Store: {}", config.store.describe());
    info!("  Video dir: {}", config.media.video_dir.display());
    info!("  PDF dir: {}", config.media.pdf_dir.display());
    info!("  JSON body limit: {} bytes", config.max_json_body);
    match config.cors_origins {
        Some(ref origins) if !origins.is_empty() => info!("  CORS: {}", origins.join(", ")),
        Some(_) => info!("  CORS: disabled"),
        None => warn!("  CORS: any origin"),
    }

    if config.store.memory_store {
        warn!("  In-memory store: all data is lost when the server stops");
    }

    // Connect to the document store
    info!("");
    info!("Connecting to document store...");
    let store = match open_store(&config.store).await {
        Ok(store) => {
            info!("  Connected successfully ({})", store.backend());
            store
        }
        Err(e) => {
            error!("  Failed to open document store: {}", e);
            error!("");
            error!("  Please check:");
            for hint in store_hints(&config.store.db_cluster) {
                error!("    - {}", hint);
            }
            return ExitCode::FAILURE;
        }
    };

    // Prepare upload directories
    let blobs = match open_blob_store(&config.media).await {
        Ok(blobs) => blobs,
        Err(e) => {
            error!("Failed to prepare upload directories: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let state = AppState::new(store.clone(), Arc::new(blobs));
    let router = create_router(state, build_router_config(&config));

    // Bind and serve
    let addr = config.bind_address();

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Try these endpoints:");
    info!("    curl http://{}/health", addr);
    for collection in [Collection::Courses, Collection::Ebooks] {
        info!("    curl http://{}/{}", addr, collection.name());
    }
    info!("");
    info!("  Upload a video:");
    info!(
        "    curl -F {}=@lecture.mp4 http://{}/upload-video",
        MediaKind::Video.form_field(),
        addr
    );
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            store.close().await;
            return ExitCode::FAILURE;
        }
    };

    let served = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    info!("Closing document store");
    store.close().await;

    if let Err(e) = served {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Server stopped");
    ExitCode::SUCCESS
}

/// Open the configured document store and make sure it answers.
/// Likely causes of a failed store startup, one line each.
fn store_hints(db_cluster: &str) -> Vec<String> {
    let mut hints = vec![
        "The connection string or DB_USER/DB_PASS are correct".to_string(),
        format!("The cluster '{}' is reachable", db_cluster),
    ];
    for collection in Collection::ALL {
        if let Some(field) = collection.unique_field() {
            hints.push(format!(
                "No two documents in '{}' share the same {} (duplicates block the unique index)",
                collection.name(),
                field
            ));
        }
    }
    hints
}

async fn open_store(config: &StoreConfig) -> Result<Arc<dyn DocumentStore>, String> {
    let Some(uri) = config.mongo_uri()? else {
        return Ok(Arc::new(MemoryStore::new()));
    };

    let store = MongoStore::connect(&uri, &config.db_name)
        .await
        .map_err(|e| e.to_string())?;
    store.ping().await.map_err(|e| e.to_string())?;
    store.ensure_indexes().await.map_err(|e| e.to_string())?;

    Ok(Arc::new(store))
}

/// Create the local blob store and both of its directories.
async fn open_blob_store(config: &MediaConfig) -> Result<LocalBlobStore, String> {
    let blobs = LocalBlobStore::new(&config.video_dir, &config.pdf_dir);
    for kind in [MediaKind::Video, MediaKind::Pdf] {
        blobs
            .ensure_root(kind)
            .await
            .map_err(|e| format!("{}: {}", blobs.root(kind).display(), e))?;
    }
    Ok(blobs)
}

/// Resolve when the process receives SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
}

/// Print the startup banner.
fn print_banner() {
    let version = env!("CARGO_PKG_VERSION");
    info!("");
    info!(" ██████╗ ██████╗ ██╗   ██╗██████╗ ███████╗███████╗");
    info!("██╔════╝██╔═══██╗██║   ██║██╔══██╗██╔════╝██╔════╝");
    info!("██║     ██║   ██║██║   ██║██████╔╝███████╗█████╗  ");
    info!("██║     ██║   ██║██║   ██║██╔══██╗╚════██║██╔══╝  ");
    info!("╚██████╗╚██████╔╝╚██████╔╝██║  ██║███████║███████╗");
    info!(" ╚═════╝ ╚═════╝  ╚═════╝ ╚═╝  ╚═╝╚══════╝╚══════╝");
    info!("");
    info!("                  CMS v{}", version);
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "course_cms=debug,tower_http=debug"
    } else {
        "course_cms=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application ServeConfig.
fn build_router_config(config: &ServeConfig) -> RouterConfig {
    let mut router_config = RouterConfig::new().with_max_json_body(config.max_json_body);

    // Apply CORS origins
    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    // Apply tracing setting
    router_config.with_tracing(!config.no_tracing)
}

// =============================================================================
// Check Command
// =============================================================================

async fn run_check(config: CheckConfig) -> ExitCode {
    // Initialize minimal logging for check command
    if config.verbose {
        init_logging(true);
    }

    println!("Course CMS Configuration Check");
    println!("═══════════════════════════════");
    println!();

    if let Err(e) = config.store.validate().and_then(|_| config.media.validate()) {
        println!("✗ Configuration: {}", e);
        return ExitCode::FAILURE;
    }
    println!("✓ Store: {}", config.store.describe());
    println!("✓ Video dir: {}", config.media.video_dir.display());
    println!("✓ PDF dir: {}", config.media.pdf_dir.display());
    println!();

    // Test store connectivity
    print!("Testing document store... ");
    let store = match open_store(&config.store).await {
        Ok(store) => {
            println!("✓ success ({})", store.backend());
            store
        }
        Err(e) => {
            println!("✗ failed");
            println!();
            println!("Error: {}", e);
            println!();
            println!("Please check:");
            for hint in store_hints(&config.store.db_cluster) {
                println!("  - {}", hint);
            }
            return ExitCode::FAILURE;
        }
    };

    // Test upload directories
    print!("Testing upload directories... ");
    let result = match open_blob_store(&config.media).await {
        Ok(blobs) => check_writable(&blobs).await,
        Err(e) => Err(e),
    };
    store.close().await;

    if let Err(e) = result {
        println!("✗ failed");
        println!();
        println!("Error: {}", e);
        return ExitCode::FAILURE;
    }
    println!("✓ writable");

    println!();
    println!("═══════════════════════════════");
    println!("✓ All checks passed!");

    ExitCode::SUCCESS
}

/// Write and remove a probe file in each upload directory.
async fn check_writable(blobs: &LocalBlobStore) -> Result<(), String> {
    for kind in [MediaKind::Video, MediaKind::Pdf] {
        let probe = blobs.root(kind).join(".course-cms-check");
        tokio::fs::write(&probe, b"ok")
            .await
            .map_err(|e| format!("{}: {}", probe.display(), e))?;
        tokio::fs::remove_file(&probe)
            .await
            .map_err(|e| format!("{}: {}", probe.display(), e))?;
    }
    Ok(())
}
