use clap::ArgMatches;
use log::info;
use std::io::Write;

use crate::config::Config;
use crate::output::LedgerFormatter;
use crate::services::BillingService;
use crate::utils::error::BillingError;

/// Run a one-shot subcommand. Returns `false` when none was given (or `shell`
/// was asked for) so the caller can start the interactive menu.
pub async fn handle_subcommands<W: Write>(
    matches: &ArgMatches,
    service: &BillingService,
    formatter: &dyn LedgerFormatter,
    out: &mut W,
) -> Result<bool, BillingError> {
    if let Some(matches) = matches.subcommand_matches("add-tenant") {
        let name = required::<String>(matches, "name")?;
        let tenant = service.add_tenant(name).await?;
        writeln!(out, "Tenant added: {} - {}", tenant.id, tenant.name)?;
        return Ok(true);
    }

    if let Some(matches) = matches.subcommand_matches("add-meter") {
        let tenant_id = *required::<i64>(matches, "tenant_id")?;
        let category = required::<String>(matches, "category")?;
        let initial = *required::<f64>(matches, "initial")?;

        let meter = service.add_meter(tenant_id, category, initial).await?;
        writeln!(out, "Meter added: {} ({}) for tenant {}", meter.id, meter.meter_type, meter.tenant_id)?;
        return Ok(true);
    }

    if let Some(matches) = matches.subcommand_matches("record") {
        let meter_id = *required::<i64>(matches, "meter_id")?;
        let value = *required::<f64>(matches, "value")?;

        let outcome = service.record_reading(meter_id, value).await?;
        write!(out, "{}", formatter.format_reading(&outcome))?;
        return Ok(true);
    }

    if matches.subcommand_matches("tenants").is_some() {
        let tenants = service.list_tenants().await?;
        write!(out, "{}", formatter.format_tenants(&tenants))?;
        return Ok(true);
    }

    if matches.subcommand_matches("meters").is_some() {
        let meters = service.list_meters().await?;
        write!(out, "{}", formatter.format_meters(&meters))?;
        return Ok(true);
    }

    if let Some(matches) = matches.subcommand_matches("payments") {
        match matches.get_one::<i64>("meter") {
            Some(&meter_id) => {
                let ledger = service.list_meter_payments(meter_id).await?;
                write!(out, "{}", formatter.format_meter_ledger(meter_id, &ledger))?;
            }
            None => {
                let payments = service.list_payments().await?;
                write!(out, "{}{}", formatter.format_header(), formatter.format_payments(&payments))?;
            }
        }
        return Ok(true);
    }

    if matches.subcommand_matches("stats").is_some() {
        let stats = service.ledger_stats().await?;
        writeln!(out, "Tenants:  {}", stats.tenant_count)?;
        writeln!(out, "Meters:   {}", stats.meter_count)?;
        writeln!(out, "Payments: {}", stats.payment_count)?;
        writeln!(out, "Billed:   {:.2}", stats.total_cost)?;
        return Ok(true);
    }

    if let Some(matches) = matches.subcommand_matches("export") {
        let written = match matches.get_one::<String>("path") {
            Some(path) => service.export_payments_csv(path).await?,
            None => service.export_payments_csv_default().await?,
        };
        writeln!(out, "Export complete: {}", written.display())?;
        return Ok(true);
    }

    Ok(false)
}

/// Handle `init-config` without touching the database. Must run before the
/// service is opened; returns `true` when the file was written.
pub fn write_config_if_requested<W: Write>(
    matches: &ArgMatches,
    config: &Config,
    out: &mut W,
) -> Result<bool, BillingError> {
    let Some(matches) = matches.subcommand_matches("init-config") else {
        return Ok(false);
    };

    let path = required::<String>(matches, "path")?;
    info!("📝 Writing default configuration to {}", path);
    config.save_to_file(path)?;
    writeln!(out, "Configuration written: {}", path)?;
    Ok(true)
}

fn required<'a, T>(matches: &'a ArgMatches, name: &str) -> Result<&'a T, BillingError>
where
    T: std::any::Any + Clone + Send + Sync + 'static,
{
    matches
        .get_one::<T>(name)
        .ok_or_else(|| BillingError::InvalidInput(format!("missing argument '{}'", name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::build_cli;
    use crate::config::SqliteConfig;
    use crate::output::ConsoleFormatter;
    use tempfile::tempdir;

    async fn service() -> BillingService {
        let config = Config {
            database: SqliteConfig::in_memory(),
            ..Config::default()
        };
        BillingService::new(config).await.unwrap()
    }

    async fn run(service: &BillingService, args: &[&str]) -> (bool, String) {
        let mut argv = vec!["utility_billing"];
        argv.extend_from_slice(args);
        let matches = build_cli().try_get_matches_from(argv).unwrap();

        let mut out = Vec::new();
        let handled = handle_subcommands(&matches, service, &ConsoleFormatter, &mut out)
            .await
            .unwrap();
        (handled, String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn test_one_shot_commands() {
        let service = service().await;

        let (_, text) = run(&service, &["add-tenant", "Alice"]).await;
        assert_eq!(text, "Tenant added: 1 - Alice\n");

        let (_, text) = run(&service, &["add-meter", "1", "water", "10"]).await;
        assert_eq!(text, "Meter added: 1 (water) for tenant 1\n");

        let (_, text) = run(&service, &["record", "1", "15"]).await;
        assert_eq!(text, "Usage: 5, Cost: 210\n");

        let (_, text) = run(&service, &["stats"]).await;
        assert!(text.contains("Payments: 1"));
        assert!(text.contains("Billed:   210.00"));
    }

    #[tokio::test]
    async fn test_no_subcommand_falls_through_to_shell() {
        let service = service().await;
        let (handled, text) = run(&service, &[]).await;
        assert!(!handled);
        assert!(text.is_empty());

        let (handled, _) = run(&service, &["shell"]).await;
        assert!(!handled);
    }

    #[tokio::test]
    async fn test_record_unknown_meter_errors() {
        let service = service().await;
        let matches = build_cli()
            .try_get_matches_from(["utility_billing", "record", "999", "5"])
            .unwrap();

        let mut out = Vec::new();
        let err = handle_subcommands(&matches, &service, &ConsoleFormatter, &mut out)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_payments_for_one_meter() {
        let service = service().await;
        run(&service, &["add-tenant", "Alice"]).await;
        run(&service, &["add-meter", "1", "water", "10"]).await;
        run(&service, &["add-meter", "1", "gas", "0"]).await;
        run(&service, &["record", "1", "15"]).await;
        run(&service, &["record", "2", "3"]).await;

        let (handled, text) = run(&service, &["payments", "--meter", "1"]).await;
        assert!(handled);
        assert!(text.starts_with("Meter 1 ledger:\n"));
        assert!(text.contains("10 -> 15, usage 5, cost 210"));
        assert!(!text.contains("0 -> 3"));

        let matches = build_cli()
            .try_get_matches_from(["utility_billing", "payments", "-m", "42"])
            .unwrap();
        let mut out = Vec::new();
        let err = handle_subcommands(&matches, &service, &ConsoleFormatter, &mut out)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_init_config_does_not_create_database() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("utilities.db");
        let config_path = dir.path().join("billing.toml");

        let mut config = Config::default();
        config.database.database_path = db_path.to_string_lossy().to_string();

        let matches = build_cli()
            .try_get_matches_from(["utility_billing", "init-config", config_path.to_str().unwrap()])
            .unwrap();
        let mut out = Vec::new();
        assert!(write_config_if_requested(&matches, &config, &mut out).unwrap());

        assert!(config_path.exists());
        assert!(!db_path.exists());
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Configuration written: "));

        let other = build_cli().try_get_matches_from(["utility_billing", "stats"]).unwrap();
        assert!(!write_config_if_requested(&other, &config, &mut Vec::new()).unwrap());
    }
}
