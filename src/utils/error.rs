use thiserror::Error;

#[derive(Error, Debug)]
pub enum BillingError {
    #[error("Meter not found: id {0}")]
    MeterNotFound(i64),

    #[error("Reading {reading} for meter {meter_id} is below the previous value {previous}")]
    ReadingBelowPrevious {
        meter_id: i64,
        previous: f64,
        reading: f64,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl BillingError {
    /// True for failures caused by a missing referenced row.
    pub fn is_not_found(&self) -> bool {
        matches!(self, BillingError::MeterNotFound(_))
    }
}

impl From<sqlx::Error> for BillingError {
    fn from(err: sqlx::Error) -> Self {
        BillingError::Database(err.to_string())
    }
}

impl From<std::io::Error> for BillingError {
    fn from(err: std::io::Error) -> Self {
        BillingError::Io(err.to_string())
    }
}

impl From<csv::Error> for BillingError {
    fn from(err: csv::Error) -> Self {
        BillingError::Csv(err.to_string())
    }
}

impl From<serde_json::Error> for BillingError {
    fn from(err: serde_json::Error) -> Self {
        BillingError::Serialization(format!("JSON error: {}", err))
    }
}

impl From<toml::de::Error> for BillingError {
    fn from(err: toml::de::Error) -> Self {
        BillingError::ConfigError(format!("TOML parse error: {}", err))
    }
}

impl From<toml::ser::Error> for BillingError {
    fn from(err: toml::ser::Error) -> Self {
        BillingError::ConfigError(format!("TOML write error: {}", err))
    }
}
