pub mod sqlite_manager;
pub mod models;

pub use models::{Meter, MeterView, Payment, PaymentView, ReadingOutcome, Tenant};
pub use sqlite_manager::{LedgerStats, SqliteManager};
