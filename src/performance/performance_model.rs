use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::constants::DECIMAL_PRECISION;

/// Portfolio valuation on a calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformancePoint {
    pub date: NaiveDate,
    pub value: Decimal,
}

/// Named lookback window used to filter the performance series for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RangeLabel {
    #[serde(rename = "1W")]
    OneWeek,
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "3M")]
    ThreeMonths,
    #[serde(rename = "6M")]
    SixMonths,
    #[serde(rename = "1Y")]
    OneYear,
    #[serde(rename = "YTD")]
    YearToDate,
    #[serde(rename = "ALL")]
    All,
}

impl RangeLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RangeLabel::OneWeek => "1W",
            RangeLabel::OneMonth => "1M",
            RangeLabel::ThreeMonths => "3M",
            RangeLabel::SixMonths => "6M",
            RangeLabel::OneYear => "1Y",
            RangeLabel::YearToDate => "YTD",
            RangeLabel::All => "ALL",
        }
    }

    /// Earliest date (inclusive) admitted by this label, relative to
    /// `today`. `None` means no cutoff.
    pub fn cutoff(&self, today: NaiveDate) -> Option<NaiveDate> {
        let days_back = match self {
            RangeLabel::OneWeek => 7,
            RangeLabel::OneMonth => 30,
            RangeLabel::ThreeMonths => 90,
            RangeLabel::SixMonths => 180,
            RangeLabel::OneYear => 365,
            RangeLabel::YearToDate => {
                return NaiveDate::from_ymd_opt(today.year(), 1, 1);
            }
            RangeLabel::All => return None,
        };
        Some(today - Duration::days(days_back))
    }
}

impl std::fmt::Display for RangeLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Change over a filtered range, computed on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeMetrics {
    pub absolute_change: Decimal,
    pub percent_change: Decimal,
}

impl RangeMetrics {
    /// Metrics between the first and last point of a range; `None` for an
    /// empty range.
    pub fn from_points(points: &[PerformancePoint]) -> Option<RangeMetrics> {
        let first = points.first()?;
        let last = points.last()?;
        let absolute_change = last.value - first.value;
        let percent_change = if first.value.is_zero() {
            Decimal::ZERO
        } else {
            (absolute_change / first.value * dec!(100)).round_dp(DECIMAL_PRECISION)
        };
        Some(RangeMetrics {
            absolute_change,
            percent_change,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip_through_serde() {
        for (label, text) in [
            (RangeLabel::OneWeek, "\"1W\""),
            (RangeLabel::YearToDate, "\"YTD\""),
            (RangeLabel::All, "\"ALL\""),
        ] {
            assert_eq!(serde_json::to_string(&label).unwrap(), text);
            let parsed: RangeLabel = serde_json::from_str(text).unwrap();
            assert_eq!(parsed, label);
        }
    }

    #[test]
    fn ytd_cutoff_is_january_first() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 20).unwrap();
        assert_eq!(
            RangeLabel::YearToDate.cutoff(today),
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
    }

    #[test]
    fn all_has_no_cutoff() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 20).unwrap();
        assert_eq!(RangeLabel::All.cutoff(today), None);
    }

    #[test]
    fn metrics_guard_zero_first_value() {
        let points = vec![
            PerformancePoint {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                value: Decimal::ZERO,
            },
            PerformancePoint {
                date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                value: dec!(50),
            },
        ];
        let metrics = RangeMetrics::from_points(&points).unwrap();
        assert_eq!(metrics.absolute_change, dec!(50));
        assert_eq!(metrics.percent_change, Decimal::ZERO);
        assert!(RangeMetrics::from_points(&[]).is_none());
    }
}
