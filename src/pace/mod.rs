//! Pace figure pipeline.
//!
//! A prior start flows through [`PerformanceFilter`], then [`BiasAdjuster`]
//! and [`FractionCalculator`], and a horse's eligible figures are averaged by
//! [`aggregate`] into a [`HorsePaceProfile`].

pub mod aggregate;
pub mod bias;
pub mod filter;
pub mod fractions;

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

pub use aggregate::{aggregate, HorsePaceProfile};
pub use bias::{AdjustedFractions, BiasAdjuster, SectionalTimes};
pub use filter::PerformanceFilter;
pub use fractions::{resolve_course, Figure, FractionCalculator, PaceFigures};

use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::types::{name_key, Course, FieldEntry, PastPerformanceRecord};
use crate::variants::{resolve_average_variant, VariantSource};

/// Round to `places` decimals, ties to even.
pub fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round_ties_even() / scale
}

/// Everything derived from one prior start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PerformanceFigures {
    pub furlongs: f64,
    pub course: Option<Course>,
    pub average_variant: i32,
    pub adjusted: AdjustedFractions,
    pub figures: PaceFigures,
}

/// Profiles by case-insensitive horse name.
pub type ProfileIndex = HashMap<String, HorsePaceProfile>;

/// Result of profiling one horse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileOutcome {
    pub profile: HorsePaceProfile,
    /// Eligible starts dropped for degenerate fractions
    pub skipped: usize,
}

/// Runs the per-start and per-horse stages with one configuration.
#[derive(Debug, Clone, Copy)]
pub struct PacePipeline<'a> {
    config: &'a AnalysisConfig,
    filter: PerformanceFilter,
    adjuster: BiasAdjuster,
    calculator: FractionCalculator,
}

impl<'a> PacePipeline<'a> {
    pub fn new(config: &'a AnalysisConfig) -> Self {
        Self {
            config,
            filter: PerformanceFilter::from_config(config),
            adjuster: BiasAdjuster::new(config.sprint_threshold),
            calculator: FractionCalculator::from_config(config),
        }
    }

    pub fn filter(&self) -> &PerformanceFilter {
        &self.filter
    }

    /// Bias-correct and compute figures for one start.
    pub fn figures(
        &self,
        record: &PastPerformanceRecord,
        variants: &dyn VariantSource,
    ) -> Result<PerformanceFigures> {
        let furlongs = record.furlongs();
        let course = resolve_course(&record.surface, &record.all_weather_flag, &record.start_code);
        let average_variant = resolve_average_variant(record, variants, self.config);
        let times = SectionalTimes::from_record(record, self.config.is_sprint(furlongs));
        let adjusted = self
            .adjuster
            .adjust(average_variant, record.track_variant, furlongs, times);
        let figures = self.calculator.compute(record, &adjusted)?;

        Ok(PerformanceFigures {
            furlongs,
            course,
            average_variant,
            adjusted,
            figures,
        })
    }

    /// Average the eligible starts of one horse.
    ///
    /// Starts with degenerate fractions are left out and counted in
    /// [`ProfileOutcome::skipped`].
    pub fn profile(
        &self,
        records: &[PastPerformanceRecord],
        today: NaiveDate,
        variants: &dyn VariantSource,
    ) -> Result<ProfileOutcome> {
        let mut eligible = Vec::new();
        let mut skipped = 0;

        for record in records.iter().filter(|r| self.filter.eligible(r, today)) {
            match self.figures(record, variants) {
                Ok(pf) => eligible.push(pf.figures),
                Err(e) if e.is_insufficient_data() => {
                    tracing::warn!(
                        "Skipping {} start on {}: {}",
                        record.track_code,
                        record.date,
                        e
                    );
                    skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(ProfileOutcome {
            profile: aggregate(&eligible),
            skipped,
        })
    }

    /// Profile every horse in one day's field, keyed by name.
    ///
    /// Horses with no eligible start are left out of the index.
    pub fn profile_field(
        &self,
        field: &[FieldEntry],
        variants: &dyn VariantSource,
    ) -> Result<ProfileIndex> {
        let mut index = ProfileIndex::new();
        for entry in field {
            let outcome = self.profile(&entry.past_performances, entry.race_date, variants)?;
            if outcome.profile.is_empty() {
                tracing::debug!("No eligible starts for {}", entry.name);
                continue;
            }
            index.entry(name_key(&entry.name)).or_insert(outcome.profile);
        }
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variants::VariantTable;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn start(date: &str, t1: f64, t2: f64, t3: f64) -> PastPerformanceRecord {
        PastPerformanceRecord {
            date: date.to_string(),
            track_code: "AQU".to_string(),
            distance: 1320.0,
            surface: "D".to_string(),
            two_furlong_fraction: t1,
            four_furlong_fraction: t2,
            final_time: t3,
            track_variant: 17,
            first_call_beaten_lengths: 2.0,
            second_call_beaten_lengths: 3.0,
            finish_beaten_lengths: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(57.7777, 2), 57.78);
        assert_eq!(round_to(0.46399, 4), 0.464);
        assert_eq!(round_to(-1.234, 1), -1.2);
    }

    #[test]
    fn test_round_to_ties_even() {
        // exact binary ties at the second decimal
        assert_eq!(round_to(0.125, 2), 0.12);
        assert_eq!(round_to(0.375, 2), 0.38);
        assert_eq!(round_to(-0.125, 2), -0.12);
        assert_eq!(round_to(62.5, 0), 62.0);
    }

    #[test]
    fn test_figures_use_variant_table() {
        let config = AnalysisConfig::default();
        let pipeline = PacePipeline::new(&config);
        let mut variants = VariantTable::default();
        variants.insert("AQU", 1320, "D", "", 17);

        let pf = pipeline.figures(&start("20250412", 22.5, 45.0, 65.0), &variants).unwrap();
        assert_eq!(pf.average_variant, 17);
        assert_eq!(pf.course, Some(Course::Dirt));
        assert_eq!(pf.adjusted.adj3, 0);
        assert_eq!(pf.figures.f1, 57.78);
        assert_eq!(pf.figures.ep, 58.0);
    }

    #[test]
    fn test_lookup_failure_uses_fallback() {
        let config = AnalysisConfig::default();
        let pipeline = PacePipeline::new(&config);
        let record = PastPerformanceRecord {
            track_variant: 27,
            ..start("20250412", 22.5, 45.0, 65.0)
        };

        let pf = pipeline.figures(&record, &VariantTable::default()).unwrap();
        assert_eq!(pf.average_variant, 17);
        // floor((17 + 1 - 27) / 2)
        assert_eq!(pf.adjusted.adj3, -5);
    }

    #[test]
    fn test_profile_skips_ineligible_and_degenerate() {
        let config = AnalysisConfig {
            cutoff_year: Some(2025),
            ..Default::default()
        };
        let pipeline = PacePipeline::new(&config);
        let records = vec![
            start("20250412", 22.5, 45.0, 65.0),
            start("20250501", 22.5, 45.0, 65.0),
            // previous year
            start("20241201", 30.0, 60.0, 90.0),
            // zero middle segment
            start("20250520", 22.5, 22.5, 65.0),
        ];

        let outcome = pipeline
            .profile(&records, today(), &VariantTable::default())
            .unwrap();
        assert_eq!(outcome.skipped, 1);
        assert_eq!(outcome.profile.starts, 2);
        assert_eq!(outcome.profile.f1, 57.78);
    }

    #[test]
    fn test_profile_field_drops_horses_without_starts() {
        let config = AnalysisConfig {
            cutoff_year: Some(2025),
            ..Default::default()
        };
        let pipeline = PacePipeline::new(&config);
        let entry = |name: &str, pps: Vec<PastPerformanceRecord>| FieldEntry {
            race_date: today(),
            race_number: 1,
            classification: "Clm 20000".to_string(),
            program_number: "1".to_string(),
            name: name.to_string(),
            past_performances: pps,
        };
        let field = vec![
            entry("Quick Study", vec![start("20250412", 22.5, 45.0, 65.0)]),
            entry("First Timer", Vec::new()),
        ];

        let index = pipeline
            .profile_field(&field, &VariantTable::default())
            .unwrap();
        assert_eq!(index.len(), 1);
        assert!(index.contains_key("quick study"));
    }
}
