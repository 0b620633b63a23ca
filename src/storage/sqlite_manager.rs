use chrono::NaiveDate;
use log::{debug, info, warn};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{FromRow, SqlitePool};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::billing::{compute_charge, ensure_finite, MeterCategory, NegativeUsagePolicy};
use crate::config::settings::SqliteConfig;
use crate::storage::models::{Meter, MeterView, Payment, PaymentView, ReadingOutcome, Tenant};
use crate::utils::error::BillingError;

#[derive(Clone)]
pub struct SqliteManager {
    pool: SqlitePool,
}

impl SqliteManager {
    pub async fn new(config: SqliteConfig) -> Result<Self, BillingError> {
        let options = if config.is_in_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")?
        } else {
            // Create database directory if it doesn't exist
            if let Some(parent) = Path::new(&config.database_path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        BillingError::Io(format!("Failed to create database directory: {}", e))
                    })?;
                }
            }

            SqliteConnectOptions::new()
                .filename(&config.database_path)
                .create_if_missing(true)
                .journal_mode(if config.enable_wal {
                    SqliteJournalMode::Wal
                } else {
                    SqliteJournalMode::Delete
                })
        };

        let options = options
            .foreign_keys(true)
            .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
            .synchronous(match config.sync_mode.as_str() {
                "OFF" => SqliteSynchronous::Off,
                "NORMAL" => SqliteSynchronous::Normal,
                "FULL" => SqliteSynchronous::Full,
                _ => SqliteSynchronous::Normal,
            });

        info!("🗄️  Opening SQLite database: {}", config.database_path);

        // An in-memory database lives only as long as its one connection
        let pool = if config.is_in_memory() {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await
        } else {
            SqlitePoolOptions::new()
                .max_connections(config.max_connections.max(1))
                .connect_with(options)
                .await
        }
        .map_err(|e| BillingError::Database(format!("Failed to connect to SQLite: {}", e)))?;

        let manager = Self { pool };
        manager.initialize_schema().await?;

        info!("✅ SQLite database ready");
        Ok(manager)
    }

    async fn initialize_schema(&self) -> Result<(), BillingError> {
        debug!("🔧 Ensuring tenants/meters/payments tables exist");

        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS tenants (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL
            )
        "#)
        .execute(&self.pool)
        .await?;

        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS meters (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                tenant_id INTEGER NOT NULL,
                meter_type TEXT NOT NULL,
                last_value REAL NOT NULL,
                FOREIGN KEY (tenant_id) REFERENCES tenants(id)
            )
        "#)
        .execute(&self.pool)
        .await?;

        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS payments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                meter_id INTEGER NOT NULL,
                date TEXT NOT NULL,
                old_value REAL NOT NULL,
                new_value REAL NOT NULL,
                usage REAL NOT NULL,
                cost REAL NOT NULL,
                FOREIGN KEY (meter_id) REFERENCES meters(id)
            )
        "#)
        .execute(&self.pool)
        .await?;

        let indexes = [
            "CREATE INDEX IF NOT EXISTS idx_payments_meter ON payments(meter_id)",
            "CREATE INDEX IF NOT EXISTS idx_payments_date ON payments(date DESC)",
        ];

        for index_sql in indexes {
            sqlx::query(index_sql).execute(&self.pool).await?;
        }

        Ok(())
    }

    pub async fn add_tenant(&self, name: &str) -> Result<Tenant, BillingError> {
        let id = sqlx::query("INSERT INTO tenants (name) VALUES (?)")
            .bind(name)
            .execute(&self.pool)
            .await?
            .last_insert_rowid();

        Ok(Tenant {
            id,
            name: name.to_string(),
        })
    }

    pub async fn add_meter(
        &self,
        tenant_id: i64,
        category: &MeterCategory,
        initial_value: f64,
    ) -> Result<Meter, BillingError> {
        ensure_finite("initial reading", initial_value)?;

        let id = sqlx::query("INSERT INTO meters (tenant_id, meter_type, last_value) VALUES (?, ?, ?)")
            .bind(tenant_id)
            .bind(category.as_str())
            .bind(initial_value)
            .execute(&self.pool)
            .await?
            .last_insert_rowid();

        Ok(Meter {
            id,
            tenant_id,
            meter_type: category.as_str().to_string(),
            last_value: initial_value,
        })
    }

    pub async fn get_meter(&self, meter_id: i64) -> Result<Option<Meter>, BillingError> {
        let meter = sqlx::query_as::<_, Meter>(
            "SELECT id, tenant_id, meter_type, last_value FROM meters WHERE id = ?",
        )
        .bind(meter_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(meter)
    }

    /// Insert a payment for `new_value` and advance the meter in one transaction.
    ///
    /// Nothing is written when the reading is not finite, the meter is missing
    /// or the policy refuses the reading; the transaction is dropped and rolls back.
    pub async fn record_reading(
        &self,
        meter_id: i64,
        new_value: f64,
        date: NaiveDate,
        policy: NegativeUsagePolicy,
    ) -> Result<ReadingOutcome, BillingError> {
        ensure_finite("reading", new_value)?;

        let mut tx = self.pool.begin().await?;

        let meter = sqlx::query_as::<_, Meter>(
            "SELECT id, tenant_id, meter_type, last_value FROM meters WHERE id = ?",
        )
        .bind(meter_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(BillingError::MeterNotFound(meter_id))?;

        let category = meter.category();
        let old_value = meter.last_value;
        let charge = compute_charge(meter_id, &category, old_value, new_value, policy)?;

        if charge.usage < 0.0 {
            warn!(
                "⚠️  Meter {} reading {} is below previous {}; recording negative usage",
                meter_id, new_value, old_value
            );
        }

        let payment_id = sqlx::query(r#"
            INSERT INTO payments (meter_id, date, old_value, new_value, usage, cost)
            VALUES (?, ?, ?, ?, ?, ?)
        "#)
        .bind(meter_id)
        .bind(date)
        .bind(old_value)
        .bind(new_value)
        .bind(charge.usage)
        .bind(charge.cost)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        sqlx::query("UPDATE meters SET last_value = ? WHERE id = ?")
            .bind(new_value)
            .bind(meter_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(ReadingOutcome {
            payment_id,
            meter_id,
            date,
            old_value,
            new_value,
            usage: charge.usage,
            cost: charge.cost,
        })
    }

    pub async fn list_tenants(&self) -> Result<Vec<Tenant>, BillingError> {
        let tenants = sqlx::query_as::<_, Tenant>("SELECT id, name FROM tenants ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(tenants)
    }

    pub async fn list_meters(&self) -> Result<Vec<MeterView>, BillingError> {
        let meters = sqlx::query_as::<_, MeterView>(r#"
            SELECT meters.id AS id,
                   tenants.name AS tenant_name,
                   meters.meter_type AS meter_type,
                   meters.last_value AS last_value
            FROM meters
            JOIN tenants ON meters.tenant_id = tenants.id
            ORDER BY meters.id
        "#)
        .fetch_all(&self.pool)
        .await?;

        Ok(meters)
    }

    pub async fn list_payments(&self) -> Result<Vec<PaymentView>, BillingError> {
        let payments = sqlx::query_as::<_, PaymentView>(r#"
            SELECT payments.id AS id,
                   tenants.name AS tenant_name,
                   meters.meter_type AS meter_type,
                   payments.date AS date,
                   payments.usage AS usage,
                   payments.cost AS cost
            FROM payments
            JOIN meters ON payments.meter_id = meters.id
            JOIN tenants ON meters.tenant_id = tenants.id
            ORDER BY payments.date DESC, payments.id DESC
        "#)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    pub async fn list_meter_payments(&self, meter_id: i64) -> Result<Vec<Payment>, BillingError> {
        let payments = sqlx::query_as::<_, Payment>(r#"
            SELECT id, meter_id, date, old_value, new_value, usage, cost
            FROM payments
            WHERE meter_id = ?
            ORDER BY date DESC, id DESC
        "#)
        .bind(meter_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    pub async fn get_ledger_stats(&self) -> Result<LedgerStats, BillingError> {
        let stats = sqlx::query_as::<_, LedgerStats>(r#"
            SELECT
                (SELECT COUNT(*) FROM tenants) AS tenant_count,
                (SELECT COUNT(*) FROM meters) AS meter_count,
                (SELECT COUNT(*) FROM payments) AS payment_count,
                (SELECT COALESCE(SUM(cost), 0.0) FROM payments) AS total_cost
        "#)
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }

    // Close all connections gracefully
    pub async fn close(&self) {
        info!("🔒 Closing SQLite database connections");
        self.pool.close().await;
    }
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct LedgerStats {
    pub tenant_count: i64,
    pub meter_count: i64,
    pub payment_count: i64,
    pub total_cost: f64,
}
