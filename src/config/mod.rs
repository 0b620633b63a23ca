pub mod settings;

pub use settings::{
    Config,
    SqliteConfig,
    BillingConfig,
    ExportConfig,
    OutputConfig,
    LoggingConfig
};
