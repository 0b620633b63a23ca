pub mod tariff;
pub mod reading;

pub use reading::{compute_charge, ensure_finite, Charge, NegativeUsagePolicy};
pub use tariff::{MeterCategory, DEFAULT_TARIFF};
