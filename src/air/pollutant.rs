//! Pollutant kinds, concentrations and per-pollutant health flags.

use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;

/// Measured airborne substances reported by the data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
pub enum PollutantKind {
    #[serde(rename = "pm2_5", alias = "pm25")]
    Pm25,
    #[serde(rename = "pm10")]
    Pm10,
    #[serde(rename = "no2")]
    No2,
    #[serde(rename = "o3")]
    O3,
    #[serde(rename = "co")]
    Co,
    #[serde(rename = "no")]
    No,
    #[serde(rename = "so2")]
    So2,
    #[serde(rename = "nh3")]
    Nh3,
}

impl PollutantKind {
    pub const ALL: [PollutantKind; 8] = [
        PollutantKind::Pm25,
        PollutantKind::Pm10,
        PollutantKind::No2,
        PollutantKind::O3,
        PollutantKind::Co,
        PollutantKind::No,
        PollutantKind::So2,
        PollutantKind::Nh3,
    ];

    /// Human-readable name with subscripts.
    pub fn display_name(&self) -> &'static str {
        match self {
            PollutantKind::Pm25 => "PM2.5",
            PollutantKind::Pm10 => "PM10",
            PollutantKind::No2 => "NO₂",
            PollutantKind::O3 => "O₃",
            PollutantKind::Co => "CO",
            PollutantKind::No => "NO",
            PollutantKind::So2 => "SO₂",
            PollutantKind::Nh3 => "NH₃",
        }
    }
}

impl fmt::Display for PollutantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Concentration was negative, NaN or infinite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvalidConcentration(pub f64);

impl fmt::Display for InvalidConcentration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid concentration {} (must be finite and non-negative)", self.0)
    }
}

impl std::error::Error for InvalidConcentration {}

/// A concentration in µg/m³. Always finite and non-negative.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Concentration(f64);

impl Concentration {
    pub fn new(value: f64) -> Result<Self, InvalidConcentration> {
        if value.is_finite() && value >= 0.0 {
            // Normalize -0.0
            Ok(Self(value.abs()))
        } else {
            Err(InvalidConcentration(value))
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for Concentration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Qualitative health flag for a single pollutant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StatusFlag {
    Good,
    Moderate,
    Unhealthy,
    Hazardous,
}

impl StatusFlag {
    pub fn glyph(&self) -> &'static str {
        match self {
            StatusFlag::Good => "✅",
            StatusFlag::Moderate => "⚠️",
            StatusFlag::Unhealthy => "🔴",
            StatusFlag::Hazardous => "🚨",
        }
    }
}

/// Ascending upper limits for the Good, Moderate and Unhealthy flags.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Thresholds {
    pub good: f64,
    pub moderate: f64,
    pub unhealthy: f64,
}

impl Thresholds {
    pub const fn new(good: f64, moderate: f64, unhealthy: f64) -> Self {
        Self { good, moderate, unhealthy }
    }

    /// True when all limits are finite and strictly ascending.
    pub fn is_ascending(&self) -> bool {
        [self.good, self.moderate, self.unhealthy].iter().all(|v| v.is_finite())
            && self.good < self.moderate
            && self.moderate < self.unhealthy
    }

    pub fn flag(&self, value: Concentration) -> StatusFlag {
        let v = value.value();
        if v <= self.good {
            StatusFlag::Good
        } else if v <= self.moderate {
            StatusFlag::Moderate
        } else if v <= self.unhealthy {
            StatusFlag::Unhealthy
        } else {
            StatusFlag::Hazardous
        }
    }
}

/// Threshold lookup by pollutant kind. Kinds without an entry get no flag.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdTable {
    entries: HashMap<PollutantKind, Thresholds>,
}

impl ThresholdTable {
    /// A table with nothing registered.
    pub fn empty() -> Self {
        Self { entries: HashMap::new() }
    }

    /// Register or replace the thresholds for `kind`.
    pub fn insert(&mut self, kind: PollutantKind, thresholds: Thresholds) -> Option<Thresholds> {
        self.entries.insert(kind, thresholds)
    }

    pub fn get(&self, kind: PollutantKind) -> Option<&Thresholds> {
        self.entries.get(&kind)
    }

    /// Flag `value` for `kind`, or `None` if the kind has no thresholds.
    pub fn evaluate(&self, value: Concentration, kind: PollutantKind) -> Option<StatusFlag> {
        self.entries.get(&kind).map(|t| t.flag(value))
    }
}

impl Default for ThresholdTable {
    fn default() -> Self {
        let mut table = Self::empty();
        table.insert(PollutantKind::Pm25, Thresholds::new(5.0, 15.0, 25.0));
        table.insert(PollutantKind::Pm10, Thresholds::new(15.0, 45.0, 75.0));
        table.insert(PollutantKind::No2, Thresholds::new(10.0, 25.0, 40.0));
        table.insert(PollutantKind::O3, Thresholds::new(60.0, 100.0, 140.0));
        table
    }
}

impl Extend<(PollutantKind, Thresholds)> for ThresholdTable {
    fn extend<I: IntoIterator<Item = (PollutantKind, Thresholds)>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(v: f64) -> Concentration {
        Concentration::new(v).unwrap()
    }

    #[test]
    fn test_concentration_rejects_bad_values() {
        assert!(Concentration::new(-0.1).is_err());
        assert!(Concentration::new(f64::NAN).is_err());
        assert!(Concentration::new(f64::INFINITY).is_err());
        assert_eq!(Concentration::new(-0.0).unwrap().value(), 0.0);
        assert_eq!(c(12.5).value(), 12.5);
    }

    #[test]
    fn test_pm25_flags() {
        let table = ThresholdTable::default();
        assert_eq!(table.evaluate(c(5.0), PollutantKind::Pm25), Some(StatusFlag::Good));
        assert_eq!(table.evaluate(c(5.01), PollutantKind::Pm25), Some(StatusFlag::Moderate));
        assert_eq!(table.evaluate(c(15.0), PollutantKind::Pm25), Some(StatusFlag::Moderate));
        assert_eq!(table.evaluate(c(16.0), PollutantKind::Pm25), Some(StatusFlag::Unhealthy));
        assert_eq!(table.evaluate(c(25.0), PollutantKind::Pm25), Some(StatusFlag::Unhealthy));
        assert_eq!(table.evaluate(c(25.1), PollutantKind::Pm25), Some(StatusFlag::Hazardous));
    }

    #[test]
    fn test_other_registered_kinds() {
        let table = ThresholdTable::default();
        assert_eq!(table.evaluate(c(45.0), PollutantKind::Pm10), Some(StatusFlag::Moderate));
        assert_eq!(table.evaluate(c(41.0), PollutantKind::No2), Some(StatusFlag::Hazardous));
        assert_eq!(table.evaluate(c(60.0), PollutantKind::O3), Some(StatusFlag::Good));
    }

    #[test]
    fn test_unregistered_kind_has_no_flag() {
        let table = ThresholdTable::default();
        for v in [0.0, 1.0, 250.0, 1e9] {
            assert_eq!(table.evaluate(c(v), PollutantKind::So2), None);
            assert_eq!(table.evaluate(c(v), PollutantKind::Co), None);
        }
        assert_eq!(ThresholdTable::empty().evaluate(c(1.0), PollutantKind::Pm25), None);
    }

    #[test]
    fn test_table_is_extendable() {
        let mut table = ThresholdTable::default();
        table.insert(PollutantKind::So2, Thresholds::new(20.0, 40.0, 80.0));
        assert_eq!(table.evaluate(c(30.0), PollutantKind::So2), Some(StatusFlag::Moderate));

        table.extend([(PollutantKind::Pm25, Thresholds::new(10.0, 20.0, 30.0))]);
        assert_eq!(table.evaluate(c(16.0), PollutantKind::Pm25), Some(StatusFlag::Moderate));
    }

    #[test]
    fn test_thresholds_ascending() {
        assert!(Thresholds::new(1.0, 2.0, 3.0).is_ascending());
        assert!(!Thresholds::new(1.0, 1.0, 3.0).is_ascending());
        assert!(!Thresholds::new(3.0, 2.0, 1.0).is_ascending());
        assert!(!Thresholds::new(1.0, 2.0, f64::NAN).is_ascending());
    }

    #[test]
    fn test_kind_deserializes_from_component_key() {
        let kind: PollutantKind = serde_json::from_str(r#""pm2_5""#).unwrap();
        assert_eq!(kind, PollutantKind::Pm25);
        let kind: PollutantKind = serde_json::from_str(r#""pm25""#).unwrap();
        assert_eq!(kind, PollutantKind::Pm25);
        let kind: PollutantKind = serde_json::from_str(r#""so2""#).unwrap();
        assert_eq!(kind, PollutantKind::So2);
    }
}
