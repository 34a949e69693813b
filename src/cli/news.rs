use anyhow::Result;

use steamcast::commands::NewsRequestHandler;
use steamcast::config::Config;
use steamcast::error::Error;
use steamcast::poller::DispatchSettings;

use super::Components;

/// Run one on-demand request and wait for it
pub async fn news(config: Config, game: String, requester: String) -> Result<()> {
    let components = Components::build(&config)?;
    let handler = NewsRequestHandler::new(
        components.feed.clone(),
        components.feed.clone(),
        components.gate.clone(),
        DispatchSettings::from_config(&config),
        config.commands.cooldown_secs,
    );

    let handle = handler.spawn(requester, game, components.sink.clone());
    match handle.await? {
        Ok(report) => {
            println!(
                "Delivered {} article(s) for {} (app {}), {} failed",
                report.delivered, report.app.name, report.app.app_id, report.failed
            );
            Ok(())
        }
        Err(e) => {
            let err = Error::from(e);
            println!("{}", err.user_notice(&config.translation.target_lang));
            Err(err.into())
        }
    }
}
