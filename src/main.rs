use anyhow::Context;
use axum::{
    Json, Router,
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use clap::Parser;
use multidb_pinning::{
    ChannelKind, PinState, PinningConfig, PinningLayer, SessionKey, Wrote, read_target,
};
use serde::Serialize;
use std::net::SocketAddr;
use tower_http::trace::TraceLayer;

/// Demo server showing where reads are routed for each request
#[derive(Debug, Parser)]
#[command(name = "multidb-pinning", version)]
struct Args {
    /// Address to listen on
    #[arg(long, env = "MULTIDB_BIND_ADDR", default_value = "127.0.0.1:8080")]
    bind: SocketAddr,

    /// Name of the propagation cookie
    #[arg(long, env = "MULTIDB_PINNING_COOKIE", default_value = "multidb_pin_writes")]
    cookie_name: String,

    /// Seconds reads stay on the primary after a write
    #[arg(long, env = "MULTIDB_PINNING_SECONDS", default_value_t = 15)]
    pinning_seconds: u64,

    /// Propagation channel: cookie or cache
    #[arg(long, env = "MULTIDB_PINNING_CHANNEL", default_value = "cookie")]
    channel: ChannelKind,
}

#[derive(Debug, Serialize)]
struct RouteReport {
    target: &'static str,
}

impl RouteReport {
    fn for_state(pin: &PinState) -> Self {
        Self {
            target: read_target(pin).as_str(),
        }
    }
}

async fn read(pin: PinState) -> Json<RouteReport> {
    Json(RouteReport::for_state(&pin))
}

async fn write(pin: PinState) -> Json<RouteReport> {
    Json(RouteReport::for_state(&pin))
}

// GET that writes anyway, e.g. a view counter.
async fn touch(pin: PinState) -> Wrote<Json<RouteReport>> {
    Wrote(Json(RouteReport::for_state(&pin)))
}

// Stand-in for a real session layer: the client names its session.
async fn session_from_header(mut request: Request, next: Next) -> Response {
    let session = request
        .headers()
        .get("x-session-key")
        .and_then(|value| value.to_str().ok())
        .map(SessionKey::new);
    if let Some(session) = session {
        request.extensions_mut().insert(session);
    }
    next.run(request).await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = PinningConfig::new()
        .cookie_name(&args.cookie_name)
        .pinning_seconds(args.pinning_seconds)
        .channel(args.channel);
    let pinning = PinningLayer::from_config(&config).context("invalid pinning configuration")?;

    let app = Router::new()
        .route("/read", get(read))
        .route("/write", post(write))
        .route("/touch", get(touch))
        .layer(pinning)
        .layer(middleware::from_fn(session_from_header))
        .layer(TraceLayer::new_for_http());

    tracing::info!(addr = %args.bind, channel = ?config.channel, "multidb-pinning listening");

    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("bind {}", args.bind))?;
    axum::serve(listener, app).await?;
    Ok(())
}
