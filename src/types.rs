use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

/// Identifier of one simulated path within an ensemble. Also selects the
/// ChaCha stream the path draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PathId(pub u64);

/// One month of observed history: the composite indicator and its four
/// structural components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservedPoint {
    /// Accepts `YYYY-MM` or `YYYY-MM-DD`; stored as the first of the month.
    #[serde(deserialize_with = "deserialize_month")]
    pub date: NaiveDate,
    /// Thrust: growth impulse.
    pub momentum: f64,
    /// Productivity; enters the composite squared.
    pub efficiency: f64,
    /// Headroom / underutilisation.
    pub slack: f64,
    /// Drag: cost and resistance.
    pub friction: f64,
    /// Composite indicator (NIV).
    pub indicator: f64,
    #[serde(default)]
    pub adverse_event: bool,
}

impl ObservedPoint {
    /// The five numeric fields by name, in a fixed order. Used for finiteness checks.
    pub fn numeric_fields(&self) -> [(&'static str, f64); 5] {
        [
            ("indicator", self.indicator),
            ("momentum", self.momentum),
            ("efficiency", self.efficiency),
            ("slack", self.slack),
            ("friction", self.friction),
        ]
    }
}

/// Parse a calendar-month-or-finer date, normalised to the first of the month.
pub fn parse_month(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d").ok())?;
    date.with_day(1)
}

fn deserialize_month<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_month(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("unparseable date `{raw}` (expected YYYY-MM or YYYY-MM-DD)")))
}

/// Calendar date `years` after `from`. Saturates at the input date on overflow.
pub fn horizon_date(from: NaiveDate, years: u32) -> NaiveDate {
    from.checked_add_months(Months::new(years.saturating_mul(12)))
        .unwrap_or(from)
}
