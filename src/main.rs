// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;
use std::time::Duration;

use axum_server::{tls_rustls::RustlsConfig, Handle};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use profile_auth_server::{
    api::router,
    config::{Config, TlsConfig},
    providers::{cognito::CognitoClient, IdentityProvider},
    state::AppState,
    storage::UserStore,
    telemetry,
};

/// Time allowed for in-flight requests once shutdown begins.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };
    telemetry::init_tracing(config.log_format);

    if let Err(e) = run(config).await {
        error!(error = %e, "Server terminated with an error");
        std::process::exit(1);
    }
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let db_path = config.user_db_path();
    let store = UserStore::open(&db_path)?;
    info!(path = %db_path.display(), "Opened user database");

    let provider: Arc<dyn IdentityProvider> = Arc::new(CognitoClient::new(&config.cognito)?);
    let state = AppState::from_config(&config, store, provider);
    let app = router(state);

    let shutdown = CancellationToken::new();
    tokio::spawn(wait_for_signal(shutdown.clone()));

    let addr = config.bind_addr;
    match &config.tls {
        Some(tls) => serve_tls(app, addr, tls, shutdown).await?,
        None => {
            let listener = tokio::net::TcpListener::bind(addr).await?;
            info!(%addr, issuer = %config.cognito.issuer(), "Listening on http (docs at /docs)");
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown.cancelled_owned())
                .await?;
        }
    }

    info!("Server stopped");
    Ok(())
}

async fn serve_tls(
    app: axum::Router,
    addr: std::net::SocketAddr,
    tls: &TlsConfig,
    shutdown: CancellationToken,
) -> Result<(), Box<dyn std::error::Error>> {
    // Must happen before any TLS configuration is built
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        tracing::debug!("rustls crypto provider already installed");
    }

    let tls_config = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path).await?;

    let handle = Handle::new();
    let shutdown_handle = handle.clone();
    tokio::spawn(async move {
        shutdown.cancelled().await;
        shutdown_handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
    });

    info!(%addr, "Listening on https (docs at /docs)");
    axum_server::bind_rustls(addr, tls_config)
        .handle(handle)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}

/// Cancel `shutdown` on SIGINT (Ctrl+C) or SIGTERM.
async fn wait_for_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
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
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received SIGINT"),
        () = terminate => info!("Received SIGTERM"),
    }
    shutdown.cancel();
}
