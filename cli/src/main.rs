// Copyright (c) 2026 Crossdock Maintainers
// SPDX-License-Identifier: AGPL-3.0

//! # Crossdock server
//!
//! Single binary carrying both protocol roles: the local-facing API a
//! browser session talks to, and the internal endpoints a peer instance's
//! agent transport calls back into.
//!
//! Development wiring: in-memory agent store and a user directory seeded
//! from the `--admin-user`/`--admin-password` flags. Production deployments
//! supply their own stores through the library crate.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use crossdock_core::application::copy::CopyOrchestrator;
use crossdock_core::application::directory::AgentDirectory;
use crossdock_core::application::negotiation::TrustNegotiator;
use crossdock_core::application::progress::ProgressRegistry;
use crossdock_core::application::session::SessionIssuer;
use crossdock_core::domain::user::{AllowAll, Permissions, User};
use crossdock_core::infrastructure::gateway::HttpAgentGateway;
use crossdock_core::infrastructure::probe::UnixAccessProbe;
use crossdock_core::infrastructure::repositories::InMemoryAgentRepository;
use crossdock_core::infrastructure::users::StaticUserDirectory;
use crossdock_core::presentation::api::{app, ApiConfig, AppState};

/// Crossdock - trusted remote transfers between file-management instances
#[derive(Parser)]
#[command(name = "crossdock")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Listen address
    #[arg(long, env = "CROSSDOCK_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Listen port
    #[arg(long, env = "CROSSDOCK_PORT", default_value = "8080")]
    port: u16,

    /// Base URL of the co-located agent transport
    #[arg(
        long,
        env = "CROSSDOCK_TRANSPORT_ADDRESS",
        default_value = "http://127.0.0.1:9925"
    )]
    transport_address: String,

    /// Origin under which this instance addresses itself for loopback
    /// calls; defaults to the listen address
    #[arg(long, env = "CROSSDOCK_INTERNAL_ADDRESS")]
    internal_address: Option<String>,

    /// Filesystem root served to users
    #[arg(long, env = "CROSSDOCK_ROOT", default_value = "/srv")]
    root: String,

    /// Seed administrator account
    #[arg(long, env = "CROSSDOCK_ADMIN_USER", default_value = "admin")]
    admin_user: String,

    /// Seed administrator password
    #[arg(long, env = "CROSSDOCK_ADMIN_PASSWORD", default_value = "admin")]
    admin_password: String,

    /// Log filter (tracing env-filter syntax)
    #[arg(long, env = "CROSSDOCK_LOG", default_value = "info")]
    log: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&cli.log))
        .context("invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let listen = format!("{}:{}", cli.host, cli.port);
    let internal_address = cli
        .internal_address
        .clone()
        .unwrap_or_else(|| format!("http://{listen}"));

    let users = Arc::new(StaticUserDirectory::new(vec![User {
        id: 1,
        username: cli.admin_user.clone(),
        scope: ".".into(),
        perm: Permissions {
            admin: true,
            modify: true,
        },
        password_hash: cli.admin_password.clone(),
    }]));

    let gateway = Arc::new(
        HttpAgentGateway::new(cli.transport_address.clone())
            .context("building agent transport client")?,
    );
    let directory = Arc::new(AgentDirectory::new(Arc::new(
        InMemoryAgentRepository::new(),
    )));
    let negotiator = Arc::new(TrustNegotiator::new(gateway.clone(), directory.clone()));
    let orchestrator = Arc::new(CopyOrchestrator::new(
        gateway.clone(),
        Arc::new(UnixAccessProbe),
        Arc::new(AllowAll),
        cli.root.clone(),
    ));
    let issuer = Arc::new(SessionIssuer::new(users.clone()));

    let state = Arc::new(AppState {
        directory,
        negotiator,
        orchestrator,
        issuer,
        registry: Arc::new(ProgressRegistry::new()),
        gateway,
        sessions: users,
        config: ApiConfig {
            internal_address,
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
    });

    let listener = TcpListener::bind(&listen)
        .await
        .with_context(|| format!("binding {listen}"))?;
    info!(
        address = %listen,
        transport = %cli.transport_address,
        root = %cli.root,
        "crossdock listening"
    );

    axum::serve(listener, app(state))
        .await
        .context("server error")?;
    Ok(())
}
