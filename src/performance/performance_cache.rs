use chrono::{NaiveDate, Utc};
use log::debug;

use crate::performance::performance_model::{PerformancePoint, RangeLabel, RangeMetrics};

/// Holds the historical portfolio value series and exposes range-filtered
/// views. The series is replaced wholesale on each performance fetch and is
/// read-only afterwards.
#[derive(Debug, Default, Clone)]
pub struct PerformanceCache {
    series: Vec<PerformancePoint>,
}

impl PerformanceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn series(&self) -> &[PerformancePoint] {
        &self.series
    }

    /// Replaces the stored series. Input is normalized defensively: sorted
    /// ascending by date, with same-day duplicates collapsed keeping the
    /// last occurrence.
    pub fn set_series(&mut self, points: Vec<PerformancePoint>) {
        let mut points = points;
        // Stable sort keeps supply order within a date, so "last wins"
        // below is the last-supplied point.
        points.sort_by_key(|p| p.date);

        let mut normalized: Vec<PerformancePoint> = Vec::with_capacity(points.len());
        for point in points {
            match normalized.last_mut() {
                Some(last) if last.date == point.date => *last = point,
                _ => normalized.push(point),
            }
        }

        debug!("Storing performance series: {} points", normalized.len());
        self.series = normalized;
    }

    pub fn clear(&mut self) {
        self.series.clear();
    }

    /// Sub-sequence with `date >= cutoff(label, today)`, boundary inclusive.
    /// Empty ranges are empty sequences, not errors.
    pub fn range_as_of(&self, label: RangeLabel, today: NaiveDate) -> Vec<PerformancePoint> {
        match label.cutoff(today) {
            None => self.series.clone(),
            Some(cutoff) => self
                .series
                .iter()
                .filter(|p| p.date >= cutoff)
                .cloned()
                .collect(),
        }
    }

    /// Range filter relative to the current date.
    pub fn range(&self, label: RangeLabel) -> Vec<PerformancePoint> {
        self.range_as_of(label, Utc::now().date_naive())
    }

    /// Change metrics for a labelled range, computed on demand.
    pub fn range_metrics_as_of(&self, label: RangeLabel, today: NaiveDate) -> Option<RangeMetrics> {
        RangeMetrics::from_points(&self.range_as_of(label, today))
    }
}
