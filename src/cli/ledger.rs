use anyhow::{Context, Result};

use steamcast::config::Config;
use steamcast::storage::SeenLedger;

pub fn ledger_show(config: &Config) -> Result<()> {
    let ledger = SeenLedger::load(&config.poller.ledger_path);

    println!("Ledger: {}", ledger.path().display());
    println!("Seen articles: {}", ledger.len());
    for id in ledger.ids() {
        println!("  {id}");
    }
    Ok(())
}

pub fn ledger_reset(config: &Config, confirmed: bool) -> Result<()> {
    let mut ledger = SeenLedger::load(&config.poller.ledger_path);

    if !confirmed {
        println!(
            "This forgets {} seen articles; current news will be announced again.",
            ledger.len()
        );
        println!("Re-run with --yes to confirm.");
        return Ok(());
    }

    let count = ledger.len();
    ledger
        .reset()
        .with_context(|| format!("Failed to reset {}", ledger.path().display()))?;
    tracing::info!(path = %ledger.path().display(), forgotten = count, "Ledger reset");
    println!("Ledger reset ({count} ids forgotten)");
    Ok(())
}
