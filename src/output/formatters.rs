use chrono::Local;

use crate::output::csv_export;
use crate::storage::{MeterView, Payment, PaymentView, ReadingOutcome, Tenant};

pub trait LedgerFormatter: Send + Sync {
    fn format_tenants(&self, tenants: &[Tenant]) -> String;
    fn format_meters(&self, meters: &[MeterView]) -> String;
    fn format_payments(&self, payments: &[PaymentView]) -> String;
    fn format_meter_ledger(&self, meter_id: i64, payments: &[Payment]) -> String;
    fn format_reading(&self, outcome: &ReadingOutcome) -> String;
    fn format_header(&self) -> String;
}

/// Pick a formatter by name; unknown names fall back to console output.
pub fn formatter_for(name: &str) -> Box<dyn LedgerFormatter> {
    match name {
        "json" => Box::new(JsonFormatter),
        "csv" => Box::new(CsvFormatter),
        _ => Box::new(ConsoleFormatter),
    }
}

pub struct ConsoleFormatter;

impl LedgerFormatter for ConsoleFormatter {
    fn format_tenants(&self, tenants: &[Tenant]) -> String {
        if tenants.is_empty() {
            return "No tenants yet.\n".to_string();
        }

        let mut output = String::from("Tenants:\n");
        for tenant in tenants {
            output.push_str(&format!("{} - {}\n", tenant.id, tenant.name));
        }
        output
    }

    fn format_meters(&self, meters: &[MeterView]) -> String {
        if meters.is_empty() {
            return "No meters yet.\n".to_string();
        }

        let mut output = String::from("Meters:\n");
        for meter in meters {
            output.push_str(&format!(
                "{} - {}, {}, current {}\n",
                meter.id, meter.tenant_name, meter.meter_type, meter.last_value
            ));
        }
        output
    }

    fn format_payments(&self, payments: &[PaymentView]) -> String {
        if payments.is_empty() {
            return "No payments recorded.\n".to_string();
        }

        let mut output = format!(
            "{:<6} {:<20} {:<12} {:<10} {:>12} {:>12}\n",
            "ID", "Tenant", "Meter Type", "Date", "Usage", "Cost"
        );
        output.push_str(&"-".repeat(77));
        output.push('\n');

        for payment in payments {
            output.push_str(&format!(
                "{:<6} {:<20} {:<12} {:<10} {:>12.2} {:>12.2}\n",
                payment.id, payment.tenant_name, payment.meter_type, payment.date, payment.usage, payment.cost
            ));
        }
        output
    }

    fn format_meter_ledger(&self, meter_id: i64, payments: &[Payment]) -> String {
        if payments.is_empty() {
            return format!("No payments recorded for meter {}.\n", meter_id);
        }

        let mut output = format!("Meter {} ledger:\n", meter_id);
        for payment in payments {
            output.push_str(&format!(
                "{} - {}: {} -> {}, usage {}, cost {}\n",
                payment.id, payment.date, payment.old_value, payment.new_value, payment.usage, payment.cost
            ));
        }
        output
    }

    fn format_reading(&self, outcome: &ReadingOutcome) -> String {
        format!("Usage: {}, Cost: {}\n", outcome.usage, outcome.cost)
    }

    fn format_header(&self) -> String {
        format!("Utility billing ledger - {}\n", Local::now().format("%Y-%m-%d %H:%M:%S"))
    }
}

pub struct JsonFormatter;

impl JsonFormatter {
    fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> String {
        let mut json = serde_json::to_string_pretty(value).unwrap_or_default();
        json.push('\n');
        json
    }
}

impl LedgerFormatter for JsonFormatter {
    fn format_tenants(&self, tenants: &[Tenant]) -> String {
        Self::to_json(tenants)
    }

    fn format_meters(&self, meters: &[MeterView]) -> String {
        Self::to_json(meters)
    }

    fn format_payments(&self, payments: &[PaymentView]) -> String {
        Self::to_json(payments)
    }

    fn format_meter_ledger(&self, _meter_id: i64, payments: &[Payment]) -> String {
        Self::to_json(payments)
    }

    fn format_reading(&self, outcome: &ReadingOutcome) -> String {
        Self::to_json(outcome)
    }

    fn format_header(&self) -> String {
        String::new() // JSON doesn't need headers
    }
}

pub struct CsvFormatter;

impl CsvFormatter {
    fn rows<I, R>(header: &[&str], rows: I) -> String
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = String>,
    {
        Self::try_rows(header, rows).unwrap_or_default()
    }

    fn try_rows<I, R>(header: &[&str], rows: I) -> Result<String, csv::Error>
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = String>,
    {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(header)?;
        for row in rows {
            writer.write_record(row)?;
        }

        let bytes = writer.into_inner().map_err(|e| csv::Error::from(e.into_error()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl LedgerFormatter for CsvFormatter {
    fn format_tenants(&self, tenants: &[Tenant]) -> String {
        Self::rows(
            &["ID", "Name"],
            tenants.iter().map(|t| vec![t.id.to_string(), t.name.clone()]),
        )
    }

    fn format_meters(&self, meters: &[MeterView]) -> String {
        Self::rows(
            &["ID", "Tenant", "Meter Type", "Last Value"],
            meters.iter().map(|m| {
                vec![
                    m.id.to_string(),
                    m.tenant_name.clone(),
                    m.meter_type.clone(),
                    m.last_value.to_string(),
                ]
            }),
        )
    }

    fn format_payments(&self, payments: &[PaymentView]) -> String {
        let mut buffer = Vec::new();
        if csv_export::write_payments(&mut buffer, payments).is_err() {
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }

    fn format_meter_ledger(&self, _meter_id: i64, payments: &[Payment]) -> String {
        Self::rows(
            &["ID", "Meter ID", "Date", "Old Value", "New Value", "Usage", "Cost"],
            payments.iter().map(|p| {
                vec![
                    p.id.to_string(),
                    p.meter_id.to_string(),
                    p.date.to_string(),
                    p.old_value.to_string(),
                    p.new_value.to_string(),
                    p.usage.to_string(),
                    p.cost.to_string(),
                ]
            }),
        )
    }

    fn format_reading(&self, outcome: &ReadingOutcome) -> String {
        Self::rows(
            &["Payment ID", "Meter ID", "Date", "Old Value", "New Value", "Usage", "Cost"],
            std::iter::once(vec![
                outcome.payment_id.to_string(),
                outcome.meter_id.to_string(),
                outcome.date.to_string(),
                outcome.old_value.to_string(),
                outcome.new_value.to_string(),
                outcome.usage.to_string(),
                outcome.cost.to_string(),
            ]),
        )
    }

    fn format_header(&self) -> String {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn payments() -> Vec<PaymentView> {
        vec![PaymentView {
            id: 7,
            tenant_name: "Alice".to_string(),
            meter_type: "gas".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            usage: 2.0,
            cost: 16.2,
        }]
    }

    #[test]
    fn test_console_lists_tenants() {
        let tenants = vec![
            Tenant { id: 1, name: "Alice".to_string() },
            Tenant { id: 2, name: "Bob".to_string() },
        ];
        let text = ConsoleFormatter.format_tenants(&tenants);
        assert!(text.contains("1 - Alice"));
        assert!(text.contains("2 - Bob"));
    }

    #[test]
    fn test_console_payments_table() {
        let text = ConsoleFormatter.format_payments(&payments());
        assert!(text.starts_with("ID"));
        assert!(text.contains("Alice"));
        assert!(text.contains("16.20"));
        assert_eq!(ConsoleFormatter.format_payments(&[]), "No payments recorded.\n");
    }

    #[test]
    fn test_json_payments() {
        let text = JsonFormatter.format_payments(&payments());
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value[0]["tenant_name"], "Alice");
        assert_eq!(value[0]["date"], "2024-01-31");
    }

    #[test]
    fn test_csv_meters() {
        let meters = vec![MeterView {
            id: 3,
            tenant_name: "Bob".to_string(),
            meter_type: "water".to_string(),
            last_value: 12.5,
        }];
        let text = CsvFormatter.format_meters(&meters);
        assert_eq!(text, "ID,Tenant,Meter Type,Last Value\n3,Bob,water,12.5\n");
    }

    #[test]
    fn test_meter_ledger_formats() {
        let ledger = vec![Payment {
            id: 4,
            meter_id: 2,
            date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            old_value: 10.0,
            new_value: 15.0,
            usage: 5.0,
            cost: 210.0,
        }];

        assert_eq!(
            ConsoleFormatter.format_meter_ledger(2, &ledger),
            "Meter 2 ledger:\n4 - 2024-02-01: 10 -> 15, usage 5, cost 210\n"
        );
        assert_eq!(ConsoleFormatter.format_meter_ledger(9, &[]), "No payments recorded for meter 9.\n");
        assert_eq!(
            CsvFormatter.format_meter_ledger(2, &ledger),
            "ID,Meter ID,Date,Old Value,New Value,Usage,Cost\n4,2,2024-02-01,10,15,5,210\n"
        );
    }

    #[test]
    fn test_formatter_for_falls_back_to_console() {
        let text = formatter_for("yaml").format_tenants(&[]);
        assert_eq!(text, "No tenants yet.\n");
    }
}
