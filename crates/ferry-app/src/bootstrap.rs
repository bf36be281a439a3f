use std::future::Future;

use ferry_api::{AccessControl, ApiServer};
use ferry_config::{FerryConfig, LogFormatSetting, LoggingSettings};
use ferry_fsops::{DirectoryIndex, TransferEngine};
use ferry_telemetry::{GlobalContextGuard, LogFormat, LoggingConfig, Metrics};
use nix::unistd::geteuid;
use tokio::signal;
use tracing::{error, info, warn};

use crate::error::{AppError, AppResult};

/// Dependencies required to bootstrap the ferry service.
pub(crate) struct BootstrapDependencies {
    config: FerryConfig,
    telemetry: Metrics,
    euid: u32,
}

impl BootstrapDependencies {
    /// Construct production dependencies from the environment for the binary entrypoint.
    pub(crate) fn from_env() -> AppResult<Self> {
        let config =
            ferry_config::load_from_env().map_err(|err| AppError::config("config.load", err))?;
        let telemetry =
            Metrics::new().map_err(|err| AppError::telemetry("telemetry.metrics", err))?;
        Ok(Self {
            config,
            telemetry,
            euid: geteuid().as_raw(),
        })
    }
}

/// Entry point for the ferry boot sequence.
///
/// # Errors
///
/// Returns an error if configuration, logging, privilege checks, or the
/// listener fail.
pub async fn run_app() -> AppResult<()> {
    let dependencies = BootstrapDependencies::from_env()?;
    ferry_telemetry::init_logging(&logging_config(&dependencies.config.logging))
        .map_err(|err| AppError::telemetry("telemetry.init", err))?;
    run_app_with(dependencies, shutdown_signal()).await
}

/// Boot sequence that relies entirely on injected dependencies to simplify testing.
///
/// The global subscriber is installed by the caller.
pub(crate) async fn run_app_with<F>(
    dependencies: BootstrapDependencies,
    shutdown: F,
) -> AppResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let BootstrapDependencies {
        config,
        telemetry,
        euid,
    } = dependencies;

    let _context = GlobalContextGuard::new("bootstrap");

    info!("ferry bootstrap starting");

    ensure_privileges(config.require_root, euid)?;
    let api = build_server(&config, telemetry)?;

    let addr = config.bind_addr();
    info!(addr = %addr, "launching api listener");
    api.serve(addr, shutdown)
        .await
        .map_err(|err| AppError::api_server("api_server.serve", err))?;
    info!("api server shutdown complete");
    Ok(())
}

/// Wire the directory index, transfer engine, and access control into an API server.
pub(crate) fn build_server(config: &FerryConfig, telemetry: Metrics) -> AppResult<ApiServer> {
    let access = AccessControl::new(&config.allowed_cidrs)
        .map_err(|err| AppError::access("access_control.new", err))?;
    let index = DirectoryIndex::new(&config.layout);
    let engine = TransferEngine::new(index, config.ownership, telemetry.clone());

    let static_dir = &config.server.static_dir;
    if !static_dir.join("index.html").is_file() {
        warn!(static_dir = %static_dir.display(), "index.html not found; / will return 404");
    }
    info!(
        source_roots = config.layout.source_roots.len(),
        destination_root = %config.layout.destination_root.display(),
        allowed_networks = access.networks().len(),
        uid = config.ownership.uid,
        gid = config.ownership.gid,
        "transfer services ready"
    );

    Ok(ApiServer::new(engine, access, telemetry, static_dir.clone()))
}

/// Ownership rewrites need root unless the operator opted out.
pub(crate) fn ensure_privileges(require_root: bool, euid: u32) -> AppResult<()> {
    if require_root && euid != 0 {
        return Err(AppError::PrivilegeRequired { euid });
    }
    Ok(())
}

fn logging_config(settings: &LoggingSettings) -> LoggingConfig<'_> {
    let format = match settings.format {
        Some(LogFormatSetting::Json) => LogFormat::Json,
        Some(LogFormatSetting::Pretty) => LogFormat::Pretty,
        None => LogFormat::infer(),
    };
    LoggingConfig {
        level: &settings.level,
        format,
        ..LoggingConfig::default()
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received; draining connections");
}
