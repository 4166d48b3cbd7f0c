use crate::{
    cli::Args,
    config::CleanerConfig,
    coordinator::MultiCleaner,
    errors::Result,
    vars::{PROBE_BIND, init_started_at},
};
use axum::{
    Router,
    body::Body,
    extract::MatchedPath,
    http::Request,
    routing::{get, put},
};
use clap::Parser;
use log::{error, info};
use std::sync::Arc;
use tokio::{signal, sync::watch};
use tower_http::trace::TraceLayer;
use tracing::info_span;

mod cli;
mod config;
mod coordinator;
mod errors;
mod janitor;
mod logger;
mod models;
mod routes;
mod scanner;
mod scheduler;
mod space;
mod threshold;
mod unit;
mod vars;
mod volume;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    if args.healthcheck {
        cli::healthcheck::run(args, PROBE_BIND.clone());
        return Ok(());
    }

    // Initialize the logger
    logger::init();
    // Set up the application environment variables
    env_setup().await?;
    // Merge command line arguments over environment variables
    let config = CleanerConfig::load(&args)?;

    if args.once {
        cli::once::run(config).await
    } else {
        serve(config).await
    }
}

async fn serve(config: CleanerConfig) -> Result<()> {
    // Resolve the cleaners, an empty wildcard match is fatal here
    let multi_cleaner = Arc::new(MultiCleaner::new(&config)?);
    coordinator::init(Arc::clone(&multi_cleaner));

    // Bind the probe first so that a taken port fails the startup
    info!("Starting probe server at http://{}", *PROBE_BIND);
    let listener = tokio::net::TcpListener::bind(PROBE_BIND.as_str()).await?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let probe = tokio::spawn(probe_serve(listener, shutdown_rx));

    init_started_at();
    let result = multi_cleaner.serve(shutdown_signal()).await;
    if let Err(e) = &result {
        error!("got cleaner error: {e}");
    }

    let _ = shutdown_tx.send(true);
    match probe.await {
        Ok(Err(e)) => error!("got probe server error: {e}"),
        Err(e) => error!("probe server task failed: {e}"),
        Ok(Ok(())) => {}
    }

    result
}

async fn probe_serve(
    listener: tokio::net::TcpListener,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Result<()> {
    let app = Router::new()
        .route(cli::healthcheck::LIVENESS_PATH, get(routes::liveness))
        .route("/readiness", get(routes::readiness))
        .route("/api/cleaner/status", get(routes::cleaner::status))
        .route("/api/cleaner/schedule", put(routes::cleaner::schedule))
        .layer(trace_layer());

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.wait_for(|stopped| *stopped).await;
        })
        .await?;

    Ok(())
}

type MyTraceLayer<M> = TraceLayer<
    tower_http::classify::SharedClassifier<tower_http::classify::ServerErrorsAsFailures>,
    M,
>;

fn trace_layer() -> MyTraceLayer<impl Fn(&Request<Body>) -> tracing::Span + Clone> {
    TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
        // 获取匹配的路由路径
        let matched_path = request
            .extensions()
            .get::<MatchedPath>()
            .map(MatchedPath::as_str);

        info_span!(
            "http_request",
            method = %request.method(),
            matched_path = matched_path,
        )
    })
}

async fn env_setup() -> Result<()> {
    // Load environment variables from .env file if it exists
    if dotenvy::dotenv().is_ok() {
        info!("loaded .env file");
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, stopping cleaners");
}
