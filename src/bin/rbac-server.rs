//! Sample server: seeds the demo snapshot and serves the sign-in router.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use rs_rbac::axum::{AppState, router};
use rs_rbac::seed::demo_snapshot;
use rs_rbac::{JwtTokenService, TokenConfig};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Secret used when none is configured. Anyone who knows it can mint tokens.
const FALLBACK_SECRET: &str = "default-token";

#[derive(Debug, Parser)]
#[command(name = "rbac-server", about = "Serve the RBAC demo endpoints")]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "RBAC_LISTEN", default_value = "127.0.0.1:8080")]
    listen: SocketAddr,

    /// HMAC secret used to sign bearer tokens.
    #[arg(long, env = "RBAC_TOKEN_SECRET", hide_env_values = true)]
    secret: Option<String>,

    /// Token lifetime in seconds.
    #[arg(long, env = "RBAC_TOKEN_TTL_SECS", default_value_t = 24 * 60 * 60)]
    token_ttl_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let secret = args.secret.unwrap_or_else(|| {
        tracing::warn!("RBAC_TOKEN_SECRET is not set, signing with the built-in fallback secret");
        FALLBACK_SECRET.to_string()
    });
    let tokens = JwtTokenService::new(
        TokenConfig::new(secret).ttl(Duration::from_secs(args.token_ttl_secs)),
    );
    let snapshot = demo_snapshot().context("seeding demo snapshot")?;
    let app = router(AppState::new(snapshot, Arc::new(tokens)));

    let listener = tokio::net::TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("binding {}", args.listen))?;
    tracing::info!(addr = %args.listen, "listening");
    axum::serve(listener, app).await.context("serving")?;
    Ok(())
}
