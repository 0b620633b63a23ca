use chrono::Local;
use log::{info, warn};
use std::path::{Path, PathBuf};

use crate::billing::MeterCategory;
use crate::config::Config;
use crate::output::csv_export;
use crate::storage::{LedgerStats, Meter, MeterView, Payment, PaymentView, ReadingOutcome, SqliteManager, Tenant};
use crate::utils::error::BillingError;

/// Entry point for every ledger operation. Owns the database handle.
pub struct BillingService {
    config: Config,
    sqlite_manager: SqliteManager,
}

impl BillingService {
    pub async fn new(config: Config) -> Result<Self, BillingError> {
        let sqlite_manager = SqliteManager::new(config.database.clone()).await?;

        Ok(Self {
            config,
            sqlite_manager,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn add_tenant(&self, name: &str) -> Result<Tenant, BillingError> {
        let tenant = self.sqlite_manager.add_tenant(name).await?;
        info!("👤 Added tenant {} ({})", tenant.id, tenant.name);
        Ok(tenant)
    }

    pub async fn add_meter(
        &self,
        tenant_id: i64,
        category: &str,
        initial_value: f64,
    ) -> Result<Meter, BillingError> {
        let category = MeterCategory::parse(category);
        if !category.is_recognized() {
            warn!(
                "⚠️  Unrecognized meter category '{}', billing at default tariff {}",
                category,
                category.tariff()
            );
        }

        let meter = self.sqlite_manager.add_meter(tenant_id, &category, initial_value).await?;
        info!(
            "🔌 Added {} meter {} for tenant {} starting at {}",
            meter.meter_type, meter.id, tenant_id, initial_value
        );
        Ok(meter)
    }

    /// Record a reading stamped with today's local date.
    pub async fn record_reading(&self, meter_id: i64, new_value: f64) -> Result<ReadingOutcome, BillingError> {
        let today = Local::now().date_naive();
        let outcome = self
            .sqlite_manager
            .record_reading(meter_id, new_value, today, self.config.billing.negative_usage)
            .await?;

        info!(
            "📈 Meter {}: {} -> {}, usage {}, cost {}",
            meter_id, outcome.old_value, outcome.new_value, outcome.usage, outcome.cost
        );
        Ok(outcome)
    }

    pub async fn get_meter(&self, meter_id: i64) -> Result<Option<Meter>, BillingError> {
        self.sqlite_manager.get_meter(meter_id).await
    }

    pub async fn list_tenants(&self) -> Result<Vec<Tenant>, BillingError> {
        self.sqlite_manager.list_tenants().await
    }

    pub async fn list_meters(&self) -> Result<Vec<MeterView>, BillingError> {
        self.sqlite_manager.list_meters().await
    }

    pub async fn list_payments(&self) -> Result<Vec<PaymentView>, BillingError> {
        self.sqlite_manager.list_payments().await
    }

    /// Ledger rows of one meter, newest first. An unknown meter is an error
    /// rather than an empty list.
    pub async fn list_meter_payments(&self, meter_id: i64) -> Result<Vec<Payment>, BillingError> {
        if self.sqlite_manager.get_meter(meter_id).await?.is_none() {
            return Err(BillingError::MeterNotFound(meter_id));
        }
        self.sqlite_manager.list_meter_payments(meter_id).await
    }

    pub async fn ledger_stats(&self) -> Result<LedgerStats, BillingError> {
        self.sqlite_manager.get_ledger_stats().await
    }

    pub async fn export_payments_csv<P: AsRef<Path>>(&self, path: P) -> Result<PathBuf, BillingError> {
        let payments = self.sqlite_manager.list_payments().await?;
        let written = csv_export::write_payments_csv(path.as_ref(), &payments)?;

        info!("📤 Exported {} payments to {}", payments.len(), written.display());
        Ok(written)
    }

    pub async fn export_payments_csv_default(&self) -> Result<PathBuf, BillingError> {
        let path = self.config.export.csv_path.clone();
        self.export_payments_csv(path).await
    }

    pub async fn close(&self) {
        self.sqlite_manager.close().await;
    }
}
