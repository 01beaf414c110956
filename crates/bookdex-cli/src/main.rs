//! bookdex server binary.

mod parser;

use anyhow::Context;
use bookdex_axum::{ProviderCredentials, build_state, serve};
use bookdex_core::config::CoreConfig;
use bookdex_core::ports::Credential;
use clap::Parser;
use parser::{Cli, Command};
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

/// Apply `BOOKDEX_*` environment overrides onto the defaults.
fn config_from_env() -> CoreConfig {
    let mut config = CoreConfig::default();

    fn env_u64(name: &str, target: &mut u64) {
        if let Ok(value) = std::env::var(name) {
            if let Ok(parsed) = value.parse() {
                *target = parsed;
            }
        }
    }

    env_u64("BOOKDEX_PROVIDER_TIMEOUT_MS", &mut config.provider_timeout_ms);
    env_u64("BOOKDEX_RATE_WINDOW_SECONDS", &mut config.rate_window_seconds);
    if let Ok(value) = std::env::var("BOOKDEX_RATE_MAX_REQUESTS") {
        if let Ok(parsed) = value.parse() {
            config.rate_max_requests = parsed;
        }
    }
    env_u64("BOOKDEX_READY_TIMEOUT_MS", &mut config.ready_handshake_timeout_ms);
    env_u64("BOOKDEX_BATCH_TIMEOUT_MS", &mut config.batch_timeout_ms);
    if let Ok(value) = std::env::var("BOOKDEX_BATCH_CONCURRENCY") {
        if let Ok(parsed) = value.parse() {
            config.batch_concurrency = parsed;
        }
    }
    env_u64("BOOKDEX_TOKEN_LIFETIME_SECONDS", &mut config.token_lifetime_seconds);
    env_u64("BOOKDEX_CLEANUP_HOURS", &mut config.cleanup_after_terminal_hours);

    config
}

fn credential_from_env(name: &str) -> Credential {
    std::env::var(name).map_or(Credential::Absent, Credential::Direct)
}

fn credentials_from_env() -> ProviderCredentials {
    ProviderCredentials {
        volume_catalog: credential_from_env("BOOKDEX_VOLUME_CATALOG_API_KEY"),
        isbn_registry: credential_from_env("BOOKDEX_ISBN_REGISTRY_API_KEY"),
        vision_model: credential_from_env("BOOKDEX_VISION_MODEL_API_KEY"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve { host, port } => {
            let addr: SocketAddr = format!("{host}:{port}")
                .parse()
                .with_context(|| format!("invalid bind address {host}:{port}"))?;
            let config = config_from_env();
            let state = build_state(config, credentials_from_env());
            serve(addr, state).await
        }
        Command::Config => {
            let config = config_from_env();
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}
