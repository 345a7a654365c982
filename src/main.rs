use clap::Parser;
use flight_booking::core::ConfigProvider;
use flight_booking::utils::{logger, validation::Validate};
use flight_booking::{
    router, BookingService, CliConfig, HttpPassportClient, LocalStorage, PassengerRegistry,
    SnapshotStore,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 設定檔讀不到時日誌尚未初始化，直接輸出到 stderr
    let config = match cli.load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e);
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    let verbose = cli.verbose || config.verbose_logs();
    if cli.json_logs || config.json_logs() {
        logger::init_json_logger(verbose);
    } else {
        logger::init_cli_logger(verbose);
    }

    tracing::info!("Starting {}", config.service_name());
    if verbose {
        tracing::debug!("Resolved config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    let schedule = Arc::new(config.schedule()?);
    let registry = Arc::new(PassengerRegistry::new(&schedule));
    let passports = Arc::new(HttpPassportClient::new(&config)?);
    tracing::info!(
        "🔍 Verifying passports against {}",
        config.passport_api_endpoint()
    );

    let mut service = BookingService::new(Arc::clone(&schedule), Arc::clone(&registry), passports);
    if let Some((dir, file)) = config.snapshot_location() {
        let snapshots = SnapshotStore::new(Arc::new(LocalStorage::new(dir)), file);
        snapshots.restore_into(&registry).await?;
        service = service.with_snapshots(snapshots);
    }
    let service = Arc::new(service);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!(
        "✅ Serving {} flights on {}",
        schedule.len(),
        listener.local_addr()?
    );

    axum::serve(listener, router(Arc::clone(&service)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Err(e) = service.flush().await {
        tracing::error!("❌ Failed to write final passenger snapshot: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
    }
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
