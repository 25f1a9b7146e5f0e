use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use nimbusdb_core::config;
use nimbusdb_core::hnsw::{HnswConfig, HnswIndex};
use nimbusdb_core::storage::WriteAheadLog;
use nimbusdb_server::api::handlers::AppState;
use nimbusdb_server::api::{create_router, metrics};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nimbusdb", about = "In-memory ANN vector database")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value_t = config::DEFAULT_PORT)]
    port: u16,

    /// Write-ahead log path
    #[arg(short, long, default_value = config::DEFAULT_WAL_PATH)]
    wal_path: String,

    /// HNSW out-degree per layer (layer 0 uses twice this)
    #[arg(long, default_value_t = config::HNSW_DEFAULT_M)]
    m: usize,

    /// Candidate-set width during index construction
    #[arg(long, default_value_t = config::HNSW_DEFAULT_EF_CONSTRUCTION)]
    ef_construction: usize,

    /// Candidate-set width during search (raised to k per query)
    #[arg(long, default_value_t = config::HNSW_DEFAULT_EF_SEARCH)]
    ef_search: usize,

    /// Seed for the layer-sampling RNG (omit for OS entropy)
    #[arg(long)]
    level_seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(
                    "nimbusdb_server=info"
                        .parse()
                        .expect("valid directive literal"),
                )
                .add_directive(
                    "nimbusdb_core=info"
                        .parse()
                        .expect("valid directive literal"),
                ),
        )
        .init();

    let args = Args::parse();
    if args.port == 0 {
        eprintln!("Error: port must be > 0");
        std::process::exit(1);
    }

    let mut hnsw_config = HnswConfig::with_m(args.m);
    hnsw_config.ef_construction = args.ef_construction;
    hnsw_config.ef_search = args.ef_search;
    hnsw_config.level_seed = args.level_seed;
    let index = Arc::new(HnswIndex::new(hnsw_config));

    let wal = Arc::new(WriteAheadLog::open(&args.wal_path)?);

    // Rehydrate the index through its normal insert path. Per-record
    // failures (e.g. a duplicate the WAL retained after a racing insert
    // lost) are logged and skipped, matching how the original write was
    // answered.
    let mut restored = 0usize;
    let mut refused = 0usize;
    let stats = wal.replay(|id, v| match index.insert(id, &v) {
        Ok(()) => restored += 1,
        Err(e) => {
            refused += 1;
            tracing::warn!(id, error = %e, "replayed record refused by index");
        }
    })?;
    if stats.truncated || stats.crc_mismatches > 0 {
        tracing::warn!(
            truncated = stats.truncated,
            crc_mismatches = stats.crc_mismatches,
            skipped = stats.skipped,
            "damaged WAL tail dropped during replay"
        );
    }
    tracing::info!(restored, refused, "WAL replay complete");

    let prometheus_handle = PrometheusBuilder::new().install_recorder()?;

    let state = AppState {
        index: Arc::clone(&index),
        wal: Arc::clone(&wal),
        prometheus_handle,
        start_time: Instant::now(),
    };
    let app = create_router(state);

    // Background gauge refresh.
    {
        let index = Arc::clone(&index);
        let wal = Arc::clone(&wal);
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(Duration::from_secs(config::METRICS_UPDATE_INTERVAL_SECS));
            loop {
                interval.tick().await;
                metrics::update_index_metrics(&index, wal.path());
            }
        });
    }

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        port = args.port,
        wal_path = %args.wal_path,
        vectors = index.len(),
        "nimbusdb ready"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_signal())
        .await?;

    match wal.flush() {
        Ok(()) => tracing::info!("WAL flushed on shutdown"),
        Err(e) => tracing::error!(error = %e, "final WAL flush failed"),
    }
    Ok(())
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }

    tracing::info!("Shutting down gracefully, draining in-flight requests...");
}
