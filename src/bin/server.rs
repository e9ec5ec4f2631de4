use std::{
    env::{self},
    fs::OpenOptions,
    net::SocketAddr,
    path::{Path, PathBuf},
    process::ExitCode,
    sync::Arc,
};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware,
};
use axum_server::{Handle, tls_rustls::RustlsConfig};
use clap::Parser;
use rusqlite::Connection;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use ledgerline::{
    AppState, ChatCompletionClient, DEFAULT_COMPLETION_MODEL, DEFAULT_COMPLETION_TIMEOUT,
    DEFAULT_COMPLETION_URL, build_router, graceful_shutdown, logging_middleware,
};

/// The REST API server for ledgerline.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// Directory containing an SSL certificate `cert.pem` and key `key.pem`.
    ///
    /// The server uses plain HTTP when this is not set.
    #[arg(long)]
    cert_path: Option<String>,

    /// The port to serve the API from.
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// The OpenAI compatible chat completions endpoint used for insights.
    #[arg(long, default_value_t = DEFAULT_COMPLETION_URL.to_owned())]
    completion_url: String,

    /// The model requested from the completions endpoint.
    #[arg(long, default_value_t = DEFAULT_COMPLETION_MODEL.to_owned())]
    completion_model: String,

    /// The symbol printed before amounts in reports and insights.
    #[arg(long, default_value = "₹")]
    currency_symbol: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(error) = setup_logging() {
        eprintln!("Could not set up logging: {error}");
        return ExitCode::FAILURE;
    }

    match run(Args::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!("{error}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), String> {
    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));

    let secret = env::var("JWT_SECRET")
        .map_err(|_| "The environment variable 'JWT_SECRET' must be set".to_owned())?;
    let api_key = env::var("MISTRAL_API_KEY").ok();
    if api_key.is_none() {
        tracing::warn!("MISTRAL_API_KEY is not set, insights will use the local summary");
    }

    let completion_client = ChatCompletionClient::new(
        &args.completion_url,
        &args.completion_model,
        api_key,
        DEFAULT_COMPLETION_TIMEOUT,
    )
    .map_err(|error| format!("Could not create completion client: {error}"))?;

    let connection = Connection::open(&args.db_path)
        .map_err(|error| format!("Could not open database file {}: {error}", args.db_path))?;
    let state = AppState::new(
        connection,
        &secret,
        Arc::new(completion_client),
        &args.currency_symbol,
    )
    .map_err(|error| format!("Could not initialize database: {error}"))?;

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = add_tracing_layer(
        build_router(state).layer(middleware::from_fn(logging_middleware)),
    );

    let result = match args.cert_path {
        Some(cert_path) => {
            let tls_config = load_tls_config(Path::new(&cert_path)).await?;

            tracing::info!("HTTPS server listening on {}", addr);
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(router.into_make_service())
                .await
        }
        None => {
            tracing::info!("HTTP server listening on {}", addr);
            axum_server::bind(addr)
                .handle(handle)
                .serve(router.into_make_service())
                .await
        }
    };

    result.map_err(|error| format!("Server error: {error}"))
}

async fn load_tls_config(cert_path: &Path) -> Result<RustlsConfig, String> {
    RustlsConfig::from_pem_file(
        PathBuf::from(cert_path).join("cert.pem"),
        PathBuf::from(cert_path).join("key.pem"),
    )
    .await
    .map_err(|error| {
        format!(
            "Could not open TLS certificates in {}: {error}",
            cert_path.display()
        )
    })
}

fn setup_logging() -> std::io::Result<()> {
    let stdout_log = tracing_subscriber::fmt::layer().pretty();

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")?;

    let debug_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(Arc::new(log_file));

    tracing_subscriber::registry()
        .with(
            stdout_log
                .with_filter(filter::LevelFilter::INFO)
                .and_then(debug_log)
                .with_filter(filter::LevelFilter::DEBUG),
        )
        .init();

    Ok(())
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // Errors are logged where they are converted to responses.
        .on_failure(());

    router.layer(tracing_layer)
}
