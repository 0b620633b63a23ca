use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::storage::PaymentView;
use crate::utils::error::BillingError;

/// One line of the exported ledger. Field names double as the CSV header:
/// `ID,Tenant,Meter Type,Date,Usage,Cost`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentCsvRecord {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "Tenant")]
    pub tenant: String,
    #[serde(rename = "Meter Type")]
    pub meter_type: String,
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Usage")]
    pub usage: f64,
    #[serde(rename = "Cost")]
    pub cost: f64,
}

impl From<&PaymentView> for PaymentCsvRecord {
    fn from(payment: &PaymentView) -> Self {
        Self {
            id: payment.id,
            tenant: payment.tenant_name.clone(),
            meter_type: payment.meter_type.clone(),
            date: payment.date,
            usage: payment.usage,
            cost: payment.cost,
        }
    }
}

pub const CSV_HEADER: [&str; 6] = ["ID", "Tenant", "Meter Type", "Date", "Usage", "Cost"];

/// Serialize payments, header first, to any writer.
pub fn write_payments<W: Write>(writer: W, payments: &[PaymentView]) -> Result<(), BillingError> {
    let mut csv_writer = csv::WriterBuilder::new().has_headers(false).from_writer(writer);

    // Written explicitly so an empty ledger still gets a header row
    csv_writer.write_record(CSV_HEADER)?;
    for payment in payments {
        csv_writer.serialize(PaymentCsvRecord::from(payment))?;
    }

    csv_writer.flush()?;
    Ok(())
}

pub fn write_payments_csv(path: &Path, payments: &[PaymentView]) -> Result<PathBuf, BillingError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = std::fs::File::create(path)
        .map_err(|e| BillingError::Io(format!("Failed to create {}: {}", path.display(), e)))?;
    write_payments(file, payments)?;

    Ok(path.to_path_buf())
}

pub fn read_payments_csv(path: &Path) -> Result<Vec<PaymentCsvRecord>, BillingError> {
    let mut reader = csv::Reader::from_path(path)?;
    let records = reader
        .deserialize::<PaymentCsvRecord>()
        .collect::<Result<Vec<_>, _>>()?;
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<PaymentView> {
        vec![
            PaymentView {
                id: 2,
                tenant_name: "Alice".to_string(),
                meter_type: "water".to_string(),
                date: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
                usage: 5.0,
                cost: 210.0,
            },
            PaymentView {
                id: 1,
                tenant_name: "Smith, John".to_string(),
                meter_type: "electricity".to_string(),
                date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                usage: 50.0,
                cost: 310.0,
            },
        ]
    }

    #[test]
    fn test_header_and_rows() {
        let mut buffer = Vec::new();
        write_payments(&mut buffer, &sample()).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "ID,Tenant,Meter Type,Date,Usage,Cost");
        assert_eq!(lines[1], "2,Alice,water,2024-05-02,5.0,210.0");
        assert_eq!(lines[2], "1,\"Smith, John\",electricity,2024-05-01,50.0,310.0");
    }

    #[test]
    fn test_empty_ledger_has_header_only() {
        let mut buffer = Vec::new();
        write_payments(&mut buffer, &[]).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "ID,Tenant,Meter Type,Date,Usage,Cost\n");
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("payments.csv");

        let written = write_payments_csv(&path, &sample()).unwrap();
        assert_eq!(written, path);

        let records = read_payments_csv(&path).unwrap();
        let expected: Vec<PaymentCsvRecord> = sample().iter().map(PaymentCsvRecord::from).collect();
        assert_eq!(records, expected);
    }

    #[test]
    fn test_unwritable_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened as a file
        let err = write_payments_csv(dir.path(), &sample()).unwrap_err();
        assert!(matches!(err, BillingError::Io(_)));
    }
}
