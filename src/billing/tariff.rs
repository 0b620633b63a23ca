use serde::{Deserialize, Serialize};
use std::fmt;

/// Unit price applied to meters whose category is not recognized.
pub const DEFAULT_TARIFF: f64 = 1.0;

pub const ELECTRICITY_TARIFF: f64 = 6.2;
pub const WATER_TARIFF: f64 = 42.0;
pub const GAS_TARIFF: f64 = 8.1;

/// Utility category of a meter.
///
/// Categories are stored as plain text in the `meters` table. Only the exact
/// lowercase names match a known utility; anything else (including `Water` or
/// ` gas`) is kept verbatim in `Other` and billed at [`DEFAULT_TARIFF`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MeterCategory {
    Electricity,
    Water,
    Gas,
    Other(String),
}

impl MeterCategory {
    pub fn parse(name: &str) -> Self {
        match name {
            "electricity" => MeterCategory::Electricity,
            "water" => MeterCategory::Water,
            "gas" => MeterCategory::Gas,
            _ => MeterCategory::Other(name.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            MeterCategory::Electricity => "electricity",
            MeterCategory::Water => "water",
            MeterCategory::Gas => "gas",
            MeterCategory::Other(name) => name,
        }
    }

    pub fn tariff(&self) -> f64 {
        match self {
            MeterCategory::Electricity => ELECTRICITY_TARIFF,
            MeterCategory::Water => WATER_TARIFF,
            MeterCategory::Gas => GAS_TARIFF,
            MeterCategory::Other(_) => DEFAULT_TARIFF,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, MeterCategory::Other(_))
    }

    /// Names accepted as known categories, in menu order.
    pub fn known_names() -> [&'static str; 3] {
        ["electricity", "water", "gas"]
    }
}

impl fmt::Display for MeterCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for MeterCategory {
    fn from(name: String) -> Self {
        MeterCategory::parse(&name)
    }
}

impl From<MeterCategory> for String {
    fn from(category: MeterCategory) -> Self {
        category.as_str().to_string()
    }
}
