use serde::{Deserialize, Serialize};

use crate::billing::tariff::MeterCategory;
use crate::utils::error::BillingError;

/// What to do with a reading that is lower than the meter's last value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NegativeUsagePolicy {
    /// Refuse the reading; nothing is written.
    #[default]
    Reject,
    /// Record it anyway (meter replacement, rollover). Usage and cost go negative.
    Allow,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Charge {
    pub usage: f64,
    pub cost: f64,
}

/// Readings and initial values must be finite; `inf` or `nan` would poison a
/// meter's `last_value`.
pub fn ensure_finite(field: &str, value: f64) -> Result<(), BillingError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(BillingError::InvalidInput(format!("{} must be a finite number, got {}", field, value)))
    }
}

/// Derive usage and cost for a new cumulative reading.
pub fn compute_charge(
    meter_id: i64,
    category: &MeterCategory,
    previous: f64,
    reading: f64,
    policy: NegativeUsagePolicy,
) -> Result<Charge, BillingError> {
    let usage = reading - previous;

    if usage < 0.0 && policy == NegativeUsagePolicy::Reject {
        return Err(BillingError::ReadingBelowPrevious {
            meter_id,
            previous,
            reading,
        });
    }

    Ok(Charge {
        usage,
        cost: usage * category.tariff(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_electricity_charge() {
        let charge = compute_charge(1, &MeterCategory::Electricity, 100.0, 150.0, NegativeUsagePolicy::Reject).unwrap();
        assert_eq!(charge.usage, 50.0);
        assert!((charge.cost - 310.0).abs() < 1e-9);
    }

    #[test]
    fn test_water_charge() {
        let charge = compute_charge(2, &MeterCategory::Water, 10.0, 15.0, NegativeUsagePolicy::Reject).unwrap();
        assert_eq!(charge, Charge { usage: 5.0, cost: 210.0 });
    }

    #[test]
    fn test_unknown_category_charge() {
        let category = MeterCategory::parse("unknown_type");
        let charge = compute_charge(3, &category, 0.0, 10.0, NegativeUsagePolicy::Reject).unwrap();
        assert_eq!(charge, Charge { usage: 10.0, cost: 10.0 });
    }

    #[test]
    fn test_negative_usage_rejected() {
        let err = compute_charge(4, &MeterCategory::Gas, 20.0, 15.0, NegativeUsagePolicy::Reject).unwrap_err();
        assert!(matches!(err, BillingError::ReadingBelowPrevious { meter_id: 4, .. }));
    }

    #[test]
    fn test_negative_usage_allowed() {
        let charge = compute_charge(4, &MeterCategory::Other("x".into()), 20.0, 15.0, NegativeUsagePolicy::Allow).unwrap();
        assert_eq!(charge, Charge { usage: -5.0, cost: -5.0 });
    }

    #[test]
    fn test_ensure_finite() {
        assert!(ensure_finite("reading", 12.5).is_ok());
        assert!(matches!(ensure_finite("reading", f64::INFINITY), Err(BillingError::InvalidInput(_))));
        assert!(matches!(ensure_finite("reading", f64::NAN), Err(BillingError::InvalidInput(_))));
    }

    #[test]
    fn test_equal_reading_is_zero_usage() {
        let charge = compute_charge(5, &MeterCategory::Gas, 7.5, 7.5, NegativeUsagePolicy::Reject).unwrap();
        assert_eq!(charge.usage, 0.0);
        assert_eq!(charge.cost, 0.0);
    }
}
