use axum::middleware::from_fn;
use clap::Parser;
use dotenvy::dotenv;
use flashcard_vault::api::middleware::request_id::request_id_middleware;
use flashcard_vault::config::AppConfig;
use flashcard_vault::infrastructure::database;
use flashcard_vault::{AppState, create_app};
use std::net::SocketAddr;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind the API server to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port for the API server
    #[arg(short, long, default_value_t = 5000)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment & logging
    dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flashcard_vault=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Starting Flashcard Vault...");

    // 2. Configuration & database
    let config = match std::env::var("APP_ENV").as_deref() {
        Ok("production") => AppConfig::production()?,
        Ok("development") => AppConfig::development(),
        _ => AppConfig::from_env()?,
    };
    info!(
        "🛡️  Config: Max PDF={}MB, Token TTL={}h, Origins={:?}",
        config.max_pdf_size / 1024 / 1024,
        config.token_ttl_hours,
        config.allowed_origins
    );
    if config.jwt_secret == AppConfig::default().jwt_secret {
        tracing::warn!("⚠️  JWT_SECRET is not set, using the insecure default");
    }

    let db = database::setup_database(&config.database_url).await?;

    // 3. API service
    let state = AppState::new(db, config);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &axum::http::Request<_>| {
            let request_id = request
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("unknown");
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri().path(),
                request_id = %request_id,
            )
        })
        .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
            info!("📥 {} {}", request.method(), request.uri().path());
        })
        .on_response(
            |response: &axum::http::Response<_>,
             latency: std::time::Duration,
             _span: &tracing::Span| {
                info!(
                    "📤 Finished in {:?} with status {}",
                    latency,
                    response.status()
                );
            },
        );

    // The request id is assigned before the trace span is opened
    let app = create_app(state)
        .layer(trace_layer)
        .layer(from_fn(request_id_middleware));

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("✅ API Server listening on: http://{}", addr);
    info!(
        "📖 Swagger UI documentation: http://localhost:{}/swagger-ui",
        args.port
    );

    // 4. Serve until a shutdown signal arrives
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("❌ Server runtime error: {}", e);
        return Err(e.into());
    }

    info!("👋 Backend exited cleanly.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
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
        _ = ctrl_c => {
            info!("⌨️  Ctrl+C received, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("💤 SIGTERM received, initiating graceful shutdown...");
        },
    }
}
