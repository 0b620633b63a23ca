//! Tenant utility billing
//!
//! Keeps tenants, their utility meters and an append-only ledger of payments
//! in SQLite. Each recorded reading is priced with the meter category's tariff
//! and advances the meter's last value in the same transaction. The ledger can
//! be listed in several formats or exported to CSV.

pub mod billing;
pub mod config;
pub mod services;
pub mod output;
pub mod utils;
pub mod cli;
pub mod storage;

// Re-export commonly used types
pub use billing::{MeterCategory, NegativeUsagePolicy};
pub use config::Config;
pub use services::BillingService;
pub use output::{LedgerFormatter, ConsoleFormatter, JsonFormatter, CsvFormatter};
pub use utils::error::BillingError;
pub use storage::{SqliteManager, Tenant, Meter, Payment, MeterView, PaymentView, ReadingOutcome, LedgerStats};

pub const VERSION: &str = "0.1.0";
