pub mod commands;
pub mod shell;

use clap::{value_parser, Arg, Command};

pub use commands::{handle_subcommands, write_config_if_requested};
pub use shell::Shell;

pub fn build_cli() -> Command {
    Command::new("utility_billing")
        .version(crate::VERSION)
        .about("Track tenants, their utility meters and the payments derived from readings")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("database")
                .short('d')
                .long("database")
                .value_name("FILE")
                .help("SQLite database file (overrides config)"),
        )
        .arg(
            Arg::new("format")
                .short('f')
                .long("format")
                .value_name("FORMAT")
                .value_parser(["console", "json", "csv"])
                .help("Output format for listings"),
        )
        .subcommand(Command::new("shell").about("Interactive menu (default)"))
        .subcommand(
            Command::new("add-tenant")
                .about("Add a tenant")
                .arg(Arg::new("name").required(true)),
        )
        .subcommand(
            Command::new("add-meter")
                .about("Add a meter for a tenant")
                .arg(Arg::new("tenant_id").required(true).value_parser(value_parser!(i64)))
                .arg(Arg::new("category").required(true).help("electricity, water, gas or any other name"))
                .arg(
                    Arg::new("initial")
                        .required(true)
                        .allow_negative_numbers(true)
                        .value_parser(value_parser!(f64)),
                ),
        )
        .subcommand(
            Command::new("record")
                .about("Record a new meter reading")
                .arg(Arg::new("meter_id").required(true).value_parser(value_parser!(i64)))
                .arg(
                    Arg::new("value")
                        .required(true)
                        .allow_negative_numbers(true)
                        .value_parser(value_parser!(f64)),
                ),
        )
        .subcommand(Command::new("tenants").about("List tenants"))
        .subcommand(Command::new("meters").about("List meters with tenant names"))
        .subcommand(
            Command::new("payments")
                .about("List payments, newest first")
                .arg(
                    Arg::new("meter")
                        .short('m')
                        .long("meter")
                        .value_name("ID")
                        .value_parser(value_parser!(i64))
                        .help("Only show the ledger of one meter"),
                ),
        )
        .subcommand(Command::new("stats").about("Show ledger totals"))
        .subcommand(
            Command::new("export")
                .about("Export the payment ledger to CSV")
                .arg(Arg::new("path").help("Target file (defaults to export.csv_path)")),
        )
        .subcommand(
            Command::new("init-config")
                .about("Write a default configuration file")
                .arg(Arg::new("path").default_value("utility_billing.toml")),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        build_cli().debug_assert();
    }

    #[test]
    fn test_record_accepts_negative_values() {
        let matches = build_cli()
            .try_get_matches_from(["utility_billing", "record", "3", "-2.5"])
            .unwrap();
        let record = matches.subcommand_matches("record").unwrap();
        assert_eq!(record.get_one::<i64>("meter_id"), Some(&3));
        assert_eq!(record.get_one::<f64>("value"), Some(&-2.5));
    }

    #[test]
    fn test_rejects_unknown_format() {
        let result = build_cli().try_get_matches_from(["utility_billing", "--format", "xml", "payments"]);
        assert!(result.is_err());
    }
}
