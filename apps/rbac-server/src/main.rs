//! `rbac-server`: runs the policy enforcement gateway, the decision point,
//! or both in one process.

mod config;
mod logging;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use clap::{Parser, Subcommand};
use pep_gateway::PepGateway;
use rbac_pdp::{DecisionEngine, RbacPdpConfig, RbacPdpLocalClient, Service, VisibilityTable};
use rbac_pdp_sdk::PolicyRepository;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;

#[derive(Debug, Parser)]
#[command(name = "rbac-server", version, about = "RBAC gateway with field-level redaction")]
struct Cli {
    /// YAML configuration file.
    #[arg(short, long, default_value = "config/rbac.yaml")]
    config: PathBuf,

    /// Print the effective configuration as JSON and exit.
    #[arg(long)]
    print_config: bool,

    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Debug, Clone, Copy, Subcommand)]
enum Mode {
    /// Gateway only; decisions come from the PDP at `pep.pdp.url`.
    Pep,
    /// Decision point only (`POST /evaluation`).
    Pdp,
    /// Gateway with an in-process PDP, plus the PDP REST surface.
    All,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(&cli.config)?;

    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&cfg)?);
        return Ok(());
    }

    logging::init(&cfg.logging)?;
    let mode = cli.mode.unwrap_or(Mode::All);
    tracing::info!(?mode, config = %cli.config.display(), "starting rbac-server");

    let repo = policy_store::connect(&cfg.store)
        .await
        .context("failed to open policy store")?;

    let cancel = CancellationToken::new();
    tokio::spawn(shutdown_signal(cancel.clone()));

    let result = run(mode, &cfg, repo.clone(), cancel).await;
    repo.close().await;
    tracing::info!("rbac-server stopped");
    result
}

async fn run(
    mode: Mode,
    cfg: &AppConfig,
    repo: Arc<dyn PolicyRepository>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    match mode {
        Mode::Pep => {
            let gateway = PepGateway::with_remote_pdp(&cfg.pep, repo)?;
            serve("pep", &cfg.pep.listen, gateway.router(), cancel).await
        }
        Mode::Pdp => {
            let pdp = pdp_router(&cfg.pdp, pdp_service(&cfg.pdp, repo)?);
            serve("pdp", &cfg.pdp.listen, pdp, cancel).await
        }
        Mode::All => {
            let svc = pdp_service(&cfg.pdp, repo.clone())?;
            let local = RbacPdpLocalClient::new(svc.clone());
            let gateway = PepGateway::new(&cfg.pep, Arc::new(local), repo)?;
            let pdp = pdp_router(&cfg.pdp, svc);
            tokio::try_join!(
                serve("pep", &cfg.pep.listen, gateway.router(), cancel.clone()),
                serve("pdp", &cfg.pdp.listen, pdp, cancel),
            )
            .map(|_| ())
        }
    }
}

/// Build the PDP service; invalid visibility policies abort startup.
fn pdp_service(
    cfg: &RbacPdpConfig,
    repo: Arc<dyn PolicyRepository>,
) -> anyhow::Result<Arc<Service>> {
    let table = VisibilityTable::from_config(&cfg.policies)
        .context("invalid visibility policies in `pdp.policies`")?;
    tracing::info!(resource_types = cfg.policies.len(), "visibility policies loaded");
    Ok(Arc::new(Service::new(repo, DecisionEngine::new(Arc::new(table)))))
}

fn pdp_router(cfg: &RbacPdpConfig, svc: Arc<Service>) -> Router {
    rbac_pdp::api::router(svc, cfg.max_request_bytes)
}

async fn serve(
    name: &'static str,
    addr: &str,
    app: Router,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {name} listener on {addr}"))?;
    tracing::info!(server = name, addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .with_context(|| format!("{name} server failed"))?;

    tracing::info!(server = name, "server stopped");
    Ok(())
}

async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    tracing::info!("shutdown signal received");
    cancel.cancel();
}
