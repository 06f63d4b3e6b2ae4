use champ_r::config::Config;
use champ_r::http::{Fetcher, HttpFetcher};
use champ_r::import::{ImportConfig, ImportRequest, ImportService, RunState};
use champ_r::item_map::{fetch_item_map, fetch_latest_version};
use std::sync::Arc;
use tracing::{error, info, warn};

fn main() {
    // Use RUST_LOG env var if set, otherwise default to info level
    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt().with_env_filter(log_filter).init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(2);
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to start tokio runtime: {}", e);
            std::process::exit(1);
        }
    };

    let state = match runtime.block_on(run(config)) {
        Ok(state) => state,
        Err(e) => {
            error!("Import failed: {}", e);
            std::process::exit(1);
        }
    };

    match state {
        RunState::Completed => {}
        RunState::PartiallyFailed => std::process::exit(3),
        _ => std::process::exit(130),
    }
}

async fn run(config: Config) -> Result<RunState, Box<dyn std::error::Error>> {
    let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(config.request_timeout)?);

    let version = fetch_latest_version(fetcher.as_ref()).await?;
    let item_map = fetch_item_map(fetcher.as_ref(), &version, &config.item_language).await?;

    let service = ImportService::new(
        tokio::runtime::Handle::current(),
        fetcher,
        ImportConfig {
            max_concurrent_requests: config.max_concurrent,
            score_weight: config.score_weight,
            score_settings: config.score_settings.clone(),
        },
    );

    let run = service.begin(ImportRequest {
        sources: config.sources,
        target_dir: config.lol_dir,
        keep_old: config.keep_old,
        item_map: Arc::new(item_map),
    });

    let canceller = run.canceller();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling import");
            canceller.cancel_all();
        }
    });

    let report = run.execute().await;
    for (source, source_report) in &report.sources {
        info!(
            "{} (version {}): {} written, {} failed, {} cancelled",
            source,
            source_report
                .version
                .as_ref()
                .map(|v| v.as_str())
                .unwrap_or("unknown"),
            source_report.written.len(),
            source_report.failed.len(),
            source_report.cancelled
        );
        if let Some(fatal) = &source_report.fatal {
            warn!("{}: {}", source, fatal);
        }
        for failure in &source_report.failed {
            warn!("{}", failure);
        }
    }

    Ok(report.state)
}
