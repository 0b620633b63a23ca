pub mod formatters;
pub mod csv_export;

pub use formatters::{formatter_for, ConsoleFormatter, CsvFormatter, JsonFormatter, LedgerFormatter};
pub use csv_export::{read_payments_csv, write_payments_csv, PaymentCsvRecord};
