use duckdb::Connection;
use parking_lot::Mutex;
use simple_stats::api::admin::PurgeTokenStore;
use simple_stats::api::auth::hash_token;
use simple_stats::config::Config;
use simple_stats::ingest::handler::AppState;
use simple_stats::server;
use simple_stats::storage::{migrations, visits::VisitStore};
use std::sync::atomic::AtomicU64;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "simple_stats=info,tower_http=info".into()),
        )
        .init();

    // Load configuration
    let config_path = std::env::args().nth(1);
    let config = Config::load(config_path.as_deref().map(std::path::Path::new));

    tracing::info!(
        host = %config.host,
        port = config.port,
        db_path = %config.db_path.display(),
        "Starting Simple Stats"
    );

    // Open the visit log
    let conn = if config.db_path.as_os_str() == ":memory:" {
        Connection::open_in_memory().expect("Failed to open in-memory DuckDB")
    } else {
        if let Some(parent) = config.db_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create data directory");
        }
        Connection::open(&config.db_path).expect("Failed to open DuckDB")
    };
    migrations::run_migrations(&conn).expect("Failed to run migrations");

    let admin_token_hash = config.admin_token.as_deref().map(hash_token);
    if admin_token_hash.is_none() {
        tracing::warn!(
            "No admin_token configured; stats summary and purge will refuse all requests. \
             Set SST_ADMIN_TOKEN or admin_token in the config file."
        );
    }

    let store = VisitStore::new(Arc::new(Mutex::new(conn)));
    let state = Arc::new(AppState {
        store,
        admin_token_hash,
        agent_marker: config.agent_marker.clone(),
        purge_tokens: PurgeTokenStore::new(),
        visits_recorded_total: AtomicU64::new(0),
    });

    let app = server::build_router(state);
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind to {addr}: {e}"));

    tracing::info!(addr = %addr, "Listening");
    axum::serve(listener, app).await.expect("Server error");
}
