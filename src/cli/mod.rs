pub mod ledger;
pub mod news;
pub mod run;

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

use steamcast::config::Config;
use steamcast::feed::SteamFeedClient;
use steamcast::notifications::DiscordWebhookSink;
use steamcast::translation::{GoogleTranslator, TranslationGate};

pub use ledger::{ledger_reset, ledger_show};
pub use news::news;
pub use run::{once, run};

/// Collaborators shared by the poll loop and on-demand requests
pub struct Components {
    pub feed: Arc<SteamFeedClient>,
    pub gate: Arc<TranslationGate>,
    pub sink: Arc<DiscordWebhookSink>,
}

impl Components {
    pub fn build(config: &Config) -> Result<Self> {
        let feed = SteamFeedClient::from_config(&config.feed)
            .context("Failed to create Steam client")?;

        let backend = GoogleTranslator::new(
            &config.translation.endpoint,
            Duration::from_secs(config.translation.timeout_secs),
        )
        .context("Failed to create translation client")?;
        let gate = TranslationGate::from_config(Arc::new(backend), &config.translation);

        config.require_webhook()?;
        let sink = DiscordWebhookSink::from_config(&config.delivery)
            .context("Failed to create webhook sink")?;

        Ok(Self {
            feed: Arc::new(feed),
            gate: Arc::new(gate),
            sink: Arc::new(sink),
        })
    }
}

/// Validate and print the configuration with secrets masked
pub fn config_check(config: &Config) -> Result<()> {
    config.validate()?;

    println!("Configuration OK");
    println!("================");
    println!("{}", toml::to_string_pretty(&config.redacted())?);

    if config.delivery.webhook_url.is_empty() {
        println!("Note: delivery.webhook_url is empty; run, once and news need it.");
    }
    Ok(())
}
