//! Eligibility of prior starts for aggregation.

use chrono::{Datelike, NaiveDate};

use crate::config::AnalysisConfig;
use crate::types::PastPerformanceRecord;

/// Selects which prior starts count toward a horse's profile.
#[derive(Debug, Clone, Copy)]
pub struct PerformanceFilter {
    cutoff_year: Option<i32>,
    strict: bool,
    max_strict_distance: f64,
}

impl PerformanceFilter {
    pub fn new(cutoff_year: Option<i32>, strict: bool) -> Self {
        Self {
            cutoff_year,
            strict,
            max_strict_distance: 12.0,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            cutoff_year: config.cutoff_year,
            strict: config.strict_fractions,
            max_strict_distance: config.max_strict_distance,
        }
    }

    /// Oldest year counted when analysing on `today`.
    pub fn cutoff(&self, today: NaiveDate) -> i32 {
        self.cutoff_year.unwrap_or_else(|| today.year())
    }

    pub fn eligible(&self, record: &PastPerformanceRecord, today: NaiveDate) -> bool {
        if !record.has_track_code() {
            return false;
        }
        match record.year() {
            Some(year) if year >= self.cutoff(today) => {}
            _ => return false,
        }
        if self.strict {
            if record.two_furlong_fraction == 0.0 || record.four_furlong_fraction == 0.0 {
                return false;
            }
            if record.furlongs() > self.max_strict_distance {
                return false;
            }
        }
        true
    }
}
