use std::future::Future;
use std::sync::Arc;

use crate::error::{AppError, AppResult};
use stemsplit_api::ApiServer;
use stemsplit_config::{LogFormatPreference, LoggingSettings, ServerConfig};
use stemsplit_runs::{CommandSeparator, RunService, RunWorkspace, Separator};
use stemsplit_telemetry::{GlobalContextGuard, LogFormat, LoggingConfig, Metrics};
use tracing::{info, warn};

/// Dependencies required to bootstrap the Stemsplit service.
pub(crate) struct BootstrapDependencies {
    config: ServerConfig,
    telemetry: Metrics,
    separator: Arc<dyn Separator>,
}

impl BootstrapDependencies {
    /// Construct production dependencies from the environment for the binary entrypoint.
    pub(crate) fn from_env() -> AppResult<Self> {
        let config =
            ServerConfig::from_env().map_err(|err| AppError::config("server_config.from_env", err))?;
        Self::from_config(config)
    }

    /// Construct dependencies around an already resolved configuration.
    pub(crate) fn from_config(config: ServerConfig) -> AppResult<Self> {
        let separator: Arc<dyn Separator> =
            Arc::new(CommandSeparator::from_settings(&config.separator));
        Self::with_separator(config, separator)
    }

    pub(crate) fn with_separator(
        config: ServerConfig,
        separator: Arc<dyn Separator>,
    ) -> AppResult<Self> {
        let telemetry =
            Metrics::new().map_err(|err| AppError::telemetry("telemetry.metrics", err))?;
        Ok(Self {
            config,
            telemetry,
            separator,
        })
    }
}

/// Entry point for the Stemsplit boot sequence.
///
/// Serves until the process receives Ctrl-C.
///
/// # Errors
///
/// Returns an error if configuration, logging, workspace setup, or the API
/// listener fails.
pub async fn run_app() -> AppResult<()> {
    let dependencies = BootstrapDependencies::from_env()?;
    run_app_with(dependencies, shutdown_signal()).await
}

/// Boot sequence that relies entirely on injected dependencies.
pub(crate) async fn run_app_with<F>(dependencies: BootstrapDependencies, shutdown: F) -> AppResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let logging = logging_config(&dependencies.config.logging);
    stemsplit_telemetry::init_logging(&logging)
        .map_err(|err| AppError::telemetry("telemetry.init", err))?;
    let _context = GlobalContextGuard::new("bootstrap");

    info!("Stemsplit bootstrap starting");
    launch(dependencies, shutdown).await
}

/// Open the workspace, build the API, and serve until `shutdown` resolves.
pub(crate) async fn launch<F>(dependencies: BootstrapDependencies, shutdown: F) -> AppResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let BootstrapDependencies {
        config,
        telemetry,
        separator,
    } = dependencies;

    let workspace = RunWorkspace::open(&config.workspace_root)
        .await
        .map_err(|err| AppError::runs("run_workspace.open", err))?;
    let runs = RunService::new(workspace, separator, telemetry.clone());
    let api = ApiServer::new(runs, telemetry, config.max_upload_bytes);

    let addr = config.socket_addr();
    info!(
        addr = %addr,
        workspace_root = %config.workspace_root.display(),
        max_upload_bytes = config.max_upload_bytes,
        separator = %config.separator.program,
        model = %config.separator.model,
        "Launching API listener"
    );

    api.serve(addr, shutdown)
        .await
        .map_err(|err| AppError::api_server("api_server.serve", err))?;
    info!("Stemsplit shut down cleanly");
    Ok(())
}

fn logging_config(settings: &LoggingSettings) -> LoggingConfig<'_> {
    LoggingConfig {
        level: &settings.level,
        format: settings.format.map_or_else(LogFormat::infer, log_format),
        ..LoggingConfig::default()
    }
}

const fn log_format(preference: LogFormatPreference) -> LogFormat {
    match preference {
        LogFormatPreference::Json => LogFormat::Json,
        LogFormatPreference::Pretty => LogFormat::Pretty,
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
