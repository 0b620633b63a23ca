use anyhow::Result;
use log::info;
use std::io;

use utility_billing::cli::{build_cli, handle_subcommands, write_config_if_requested, Shell};
use utility_billing::output::formatter_for;
use utility_billing::{BillingService, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = build_cli().get_matches();
    let config = Config::from_matches(&matches)?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.logging.level.as_str()))
        .init();

    info!("🚀 Utility billing v{} starting", utility_billing::VERSION);

    if write_config_if_requested(&matches, &config, &mut io::stdout().lock())? {
        return Ok(());
    }

    let formatter = formatter_for(&config.output.default_format);
    let service = BillingService::new(config).await?;

    let handled = {
        let mut out = io::stdout().lock();
        handle_subcommands(&matches, &service, formatter.as_ref(), &mut out).await
    };

    let outcome = match handled {
        Ok(true) => Ok(()),
        Ok(false) => {
            let mut shell = Shell::new(&service, formatter.as_ref(), io::stdin().lock(), io::stdout().lock());
            shell.run().await
        }
        Err(e) => Err(e),
    };

    // Release the database before reporting any failure
    service.close().await;
    outcome?;

    Ok(())
}
