use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::billing::MeterCategory;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Tenant {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Meter {
    pub id: i64,
    pub tenant_id: i64,
    pub meter_type: String,
    pub last_value: f64,
}

impl Meter {
    pub fn category(&self) -> MeterCategory {
        MeterCategory::parse(&self.meter_type)
    }
}

// Append-only ledger row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub id: i64,
    pub meter_id: i64,
    pub date: NaiveDate,
    pub old_value: f64,
    pub new_value: f64,
    pub usage: f64,
    pub cost: f64,
}

/// Meter joined with its tenant's name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct MeterView {
    pub id: i64,
    pub tenant_name: String,
    pub meter_type: String,
    pub last_value: f64,
}

/// Payment joined with tenant name and meter category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PaymentView {
    pub id: i64,
    pub tenant_name: String,
    pub meter_type: String,
    pub date: NaiveDate,
    pub usage: f64,
    pub cost: f64,
}

/// Result of recording one reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadingOutcome {
    pub payment_id: i64,
    pub meter_id: i64,
    pub date: NaiveDate,
    pub old_value: f64,
    pub new_value: f64,
    pub usage: f64,
    pub cost: f64,
}
