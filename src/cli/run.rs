use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::watch;

use steamcast::config::Config;
use steamcast::metrics;
use steamcast::poller::{DispatchSettings, Dispatcher, TrackedTarget};
use steamcast::scheduler::Scheduler;
use steamcast::status::{self, StatusState};
use steamcast::storage::SeenLedger;

use super::Components;

fn dispatcher(config: &Config, components: &Components) -> Dispatcher {
    let target = TrackedTarget {
        feed_key: config.feed.app_id.trim().to_string(),
        destination: config.redacted().delivery.webhook_url,
    };

    Dispatcher::new(
        target,
        DispatchSettings::from_config(config),
        SeenLedger::load(&config.poller.ledger_path),
        components.feed.clone(),
        components.gate.clone(),
        components.sink.clone(),
    )
    .with_catalog(components.feed.clone())
}

/// Run the poll loop until Ctrl-C
pub async fn run(config: Config) -> Result<()> {
    config.validate()?;
    if let Err(e) = metrics::init_metrics() {
        tracing::warn!(error = %e, "Metrics initialization failed, continuing without metrics");
    }

    let components = Components::build(&config)?;
    let (stop_tx, stop_rx) = watch::channel(false);

    let status_task = match &config.status.listen_addr {
        Some(addr) => {
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .with_context(|| format!("Failed to bind status endpoint on {addr}"))?;
            let state = Arc::new(StatusState::new(config.feed.app_id.trim()));
            let mut stop = stop_rx.clone();
            Some(tokio::spawn(status::serve(listener, state, async move {
                let _ = stop.changed().await;
            })))
        }
        None => None,
    };

    let mut scheduler = Scheduler::new(
        dispatcher(&config, &components),
        config.poller.interval(),
        config.poller.ready_retry(),
    );

    println!(
        "Polling app {} every {}s (Ctrl-C to stop)",
        config.feed.app_id.trim(),
        config.poller.interval_secs
    );

    let report = scheduler
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await;

    let _ = stop_tx.send(true);
    if let Some(task) = status_task {
        match task.await {
            Ok(Err(e)) => tracing::warn!(error = %e, "Status endpoint stopped with an error"),
            Err(e) => tracing::warn!(error = %e, "Status task failed"),
            Ok(Ok(())) => {}
        }
    }

    println!(
        "Stopped after {} cycles ({} ticks skipped)",
        report.cycles, report.ticks_skipped
    );
    Ok(())
}

/// Run one poll cycle and print its report
pub async fn once(config: Config) -> Result<()> {
    config.validate()?;
    let components = Components::build(&config)?;
    let mut dispatcher = dispatcher(&config, &components);

    let report = dispatcher.run_cycle().await;

    println!("Poll cycle complete");
    println!("===================");
    println!("  Fetched:       {}", report.fetched);
    println!("  Already seen:  {}", report.already_seen);
    println!("  Delivered:     {}", report.delivered);
    println!("  Failed:        {}", report.failed);
    println!("  Ledger errors: {}", report.ledger_errors);
    Ok(())
}
