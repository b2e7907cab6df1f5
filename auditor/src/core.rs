use audit::pipeline::AuditPipeline;
use audit::storage::{PostgresStorage, Storage};
use audit::stream::TwitterStreamClient;
use audit::twitter::{TwitterApiClient, extract_users, refresh_user_mappings};
use audit_config::shared::AuditorConfig;
use tokio::signal::unix::{SignalKind, signal};
use tracing::info;

/// Runs the audit pipeline until the stream breaks or a signal arrives.
pub async fn run_pipeline(config: AuditorConfig) -> anyhow::Result<()> {
    info!("starting auditor service");

    let storage = PostgresStorage::connect(&config.storage).await?;
    let client = TwitterStreamClient::new(&config.twitter);

    let mut pipeline = AuditPipeline::new(config.pipeline, client, storage);
    pipeline.start().await?;

    // Listen for SIGINT and SIGTERM and translate them into a pipeline
    // shutdown broadcast.
    let shutdown_tx = pipeline.shutdown_tx();
    let shutdown_handle = tokio::spawn(async move {
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to register SIGTERM handler");

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("sigint (ctrl+c) received, shutting down pipeline");
            }
            _ = sigterm.recv() => {
                info!("sigterm received, shutting down pipeline");
            }
        }

        shutdown_tx.shutdown();
    });

    let result = pipeline.wait().await;

    // If the pipeline finished on its own, the signal listener is still
    // pending and can be dropped.
    shutdown_handle.abort();

    result?;

    info!("auditor service completed");

    Ok(())
}

/// Creates the audit schema in the configured database.
pub async fn init_db(config: AuditorConfig) -> anyhow::Result<()> {
    let storage = PostgresStorage::connect(&config.storage).await?;
    storage.init_schema().await?;

    info!("audit schema initialized");

    Ok(())
}

/// Replaces the deployed stream rules with ones tracking the configured
/// accounts and refreshes the stored author directory to match.
pub async fn sync_rules(config: AuditorConfig) -> anyhow::Result<()> {
    let storage = PostgresStorage::connect(&config.storage).await?;
    let api = TwitterApiClient::new(&config.twitter);

    let rules = api.replace_rules(&config.tracked_accounts).await?;
    info!(
        rules = rules.len(),
        accounts = config.tracked_accounts.len(),
        "stream rules replaced"
    );

    let mappings = refresh_user_mappings(&api, &storage, &config.tracked_accounts).await?;
    info!(mappings, "author directory refreshed");

    Ok(())
}

/// Logs the rules currently deployed on the stream.
pub async fn show_rules(config: AuditorConfig) -> anyhow::Result<()> {
    let api = TwitterApiClient::new(&config.twitter);

    let rules = api.get_rules().await?;
    if rules.is_empty() {
        info!("no rules deployed on the stream");
        return Ok(());
    }

    for rule in &rules {
        info!(id = %rule.id, value = %rule.value, "deployed rule");
    }

    let users = extract_users(&rules);
    info!(accounts = users.len(), "accounts tracked by deployed rules");

    Ok(())
}
