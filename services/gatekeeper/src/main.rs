use std::{future::pending, net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use axum::serve;
use notify::{recommended_watcher, Event, RecursiveMode, Watcher};
use tenant_access_gatekeeper::{
    config::GatekeeperConfig, create_router, registry::snapshot_changes, TenantRegistry,
};
use tokio::{net::TcpListener, signal, sync::mpsc};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let config = GatekeeperConfig::from_env().context("failed to load configuration")?;
    init_tracing(&config);

    info!("tenant-access-gatekeeper starting");

    let registry = Arc::new(TenantRegistry::new(config.tenants_dir.clone()));
    let tenants_loaded = registry
        .load_all()
        .context("failed to load tenant snapshots")?;
    info!(tenants_loaded, "initial tenant snapshots loaded");

    if config.enable_hot_reload {
        spawn_hot_reload_watcher(Arc::clone(&registry), config.tenants_dir.clone())
            .context("failed to start hot reload watcher")?;
    } else {
        info!("hot reload watcher disabled by configuration");
    }

    let router = create_router(Arc::clone(&registry));

    let addr: SocketAddr = format!("{}:{}", config.server_host, config.server_port)
        .parse()
        .context("invalid server bind address")?;

    let listener = TcpListener::bind(addr)
        .await
        .context("failed to bind TCP listener")?;
    let local_addr = listener
        .local_addr()
        .context("failed to read bound address")?;
    info!(%local_addr, "tenant-access-gatekeeper listening");

    serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server encountered an unrecoverable error")?;

    info!("tenant-access-gatekeeper shutdown complete");
    Ok(())
}

fn init_tracing(config: &GatekeeperConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| std::env::var("LOG_LEVEL").map(EnvFilter::new))
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn spawn_hot_reload_watcher(registry: Arc<TenantRegistry>, watch_path: PathBuf) -> Result<()> {
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = recommended_watcher({
        move |res: Result<Event, notify::Error>| match res {
            Ok(event) => {
                if event_tx.send(event).is_err() {
                    warn!("hot reload watcher receiver dropped");
                }
            }
            Err(err) => error!(error = ?err, "hot reload watch error"),
        }
    })
    .context("failed to create filesystem watcher")?;

    // Snapshots live directly in the tenants directory.
    watcher
        .watch(&watch_path, RecursiveMode::NonRecursive)
        .with_context(|| {
            format!(
                "failed to watch tenants directory '{}'",
                watch_path.display()
            )
        })?;

    info!(path = %watch_path.display(), "hot reload watcher started");

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            for change in snapshot_changes(&watch_path, &event.kind, &event.paths) {
                match registry.apply_change(&change) {
                    Ok(()) => info!(
                        tenant = %change.tenant_id(),
                        ?change,
                        "tenant registry updated after filesystem change"
                    ),
                    Err(err) => error!(
                        tenant = %change.tenant_id(),
                        error = ?err,
                        "failed to apply snapshot change"
                    ),
                }
            }
        }
    });

    // Dropping the watcher stops event delivery.
    tokio::spawn(async move {
        let _watcher = watcher;
        pending::<()>().await;
    });

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
