//! Sectional speed figures and pace-distribution metrics for a single start.
//!
//! Each segment figure is feet covered by the horse (leader's distance minus
//! ten feet per beaten length) over the bias-corrected segment time.

use serde::{Deserialize, Serialize};

use crate::config::{AnalysisConfig, AverageMode};
use crate::error::{PaceError, Result};
use crate::pace::bias::{AdjustedFractions, SectionalTimes};
use crate::pace::round_to;
use crate::types::{Course, PastPerformanceRecord};

/// Feet per beaten length
const FEET_PER_LENGTH: f64 = 10.0;

/// Feet per furlong
const FEET_PER_FURLONG: f64 = 660.0;

/// A figure column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Figure {
    F1,
    F2,
    F3,
    Ep,
    Sp,
    Ap,
    Fx,
    Energy,
}

impl Figure {
    /// Columns ranked per race.
    pub const RANKED: [Figure; 7] = [
        Figure::F1,
        Figure::F2,
        Figure::F3,
        Figure::Ep,
        Figure::Sp,
        Figure::Ap,
        Figure::Fx,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Figure::F1 => "f1",
            Figure::F2 => "f2",
            Figure::F3 => "f3",
            Figure::Ep => "ep",
            Figure::Sp => "sp",
            Figure::Ap => "ap",
            Figure::Fx => "fx",
            Figure::Energy => "energy",
        }
    }
}

/// Figures for one start.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PaceFigures {
    /// Early segment
    pub f1: f64,
    /// Middle segment
    pub f2: f64,
    /// Late segment
    pub f3: f64,
    /// Early pace to the second call
    pub ep: f64,
    /// Sustained pace
    pub sp: f64,
    /// Average pace
    pub ap: f64,
    /// Fade index
    pub fx: f64,
    /// Share of effort spent early, in [0, 1]
    pub energy: f64,
    /// `false` for the sentinel (no first call recorded)
    pub recorded: bool,
}

impl PaceFigures {
    /// All-zero figures for a start with no first call.
    pub fn sentinel() -> Self {
        Self::default()
    }

    pub fn get(&self, figure: Figure) -> f64 {
        match figure {
            Figure::F1 => self.f1,
            Figure::F2 => self.f2,
            Figure::F3 => self.f3,
            Figure::Ep => self.ep,
            Figure::Sp => self.sp,
            Figure::Ap => self.ap,
            Figure::Fx => self.fx,
            Figure::Energy => self.energy,
        }
    }
}

/// Segment distances in feet: early, middle, late, and start to second call.
#[derive(Debug, Clone, Copy, PartialEq)]
struct SegmentFeet {
    early: f64,
    middle: f64,
    late: f64,
    to_second_call: f64,
}

impl SegmentFeet {
    fn new(furlongs: f64, sprint: bool) -> Self {
        if sprint {
            Self {
                early: 1320.0,
                middle: 1320.0,
                late: FEET_PER_FURLONG * (furlongs - 4.0),
                to_second_call: 2640.0,
            }
        } else {
            Self {
                early: 2640.0,
                middle: 1320.0,
                late: FEET_PER_FURLONG * (furlongs - 6.0),
                to_second_call: 3960.0,
            }
        }
    }
}

/// Resolve the course from a start's surface, all-weather flag and start code.
///
/// Turf races taken off the turf (`x` in the start code) count as dirt.
pub fn resolve_course(surface: &str, all_weather_flag: &str, start_code: &str) -> Option<Course> {
    let all_weather = all_weather_flag == "A";
    match surface {
        "D" if !all_weather => Some(Course::Dirt),
        "T" if !all_weather && start_code.contains('x') => Some(Course::Dirt),
        "D" => Some(Course::AllWeatherTrack),
        "T" => Some(Course::Turf),
        "d" => Some(Course::InnerTurf),
        "t" => Some(Course::OuterTurf),
        other => {
            tracing::warn!("Unrecognized surface code: {:?}", other);
            None
        }
    }
}

/// Computes [`PaceFigures`] from a start and its bias corrections.
#[derive(Debug, Clone, Copy)]
pub struct FractionCalculator {
    sprint_threshold: f64,
    ap_mode: AverageMode,
}

impl Default for FractionCalculator {
    fn default() -> Self {
        Self::new(8.0, AverageMode::default())
    }
}

impl FractionCalculator {
    pub fn new(sprint_threshold: f64, ap_mode: AverageMode) -> Self {
        Self {
            sprint_threshold,
            ap_mode,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(config.sprint_threshold, config.ap_mode)
    }

    /// Compute figures for `record`.
    ///
    /// Returns the sentinel when the first call is missing, and
    /// [`PaceError::InsufficientData`] when a segment time or the energy
    /// denominator is zero.
    pub fn compute(
        &self,
        record: &PastPerformanceRecord,
        adjusted: &AdjustedFractions,
    ) -> Result<PaceFigures> {
        let furlongs = record.furlongs();
        let sprint = furlongs < self.sprint_threshold;

        if !SectionalTimes::from_record(record, sprint).has_first_call() {
            return Ok(PaceFigures::sentinel());
        }

        let feet = SegmentFeet::new(furlongs, sprint);
        let bl1 = record.first_call_beaten_lengths;
        let bl2 = record.second_call_beaten_lengths;
        let bl3 = record.finish_beaten_lengths;

        let f1 = round_to(
            ratio(feet.early - FEET_PER_LENGTH * bl1, adjusted.adj_t1, "first call time")?,
            2,
        );
        let f2 = round_to(
            ratio(
                feet.middle - FEET_PER_LENGTH * (bl2 - bl1),
                adjusted.adj_t2 - adjusted.adj_t1,
                "middle segment time",
            )?,
            2,
        );
        let f3 = round_to(
            ratio(
                feet.late - FEET_PER_LENGTH * (bl3 - bl2),
                adjusted.adj_t3 - adjusted.adj_t2,
                "late segment time",
            )?,
            2,
        );
        let ep = round_to(
            ratio(
                feet.to_second_call - FEET_PER_LENGTH * bl2,
                adjusted.adj_t2,
                "second call time",
            )?,
            2,
        );

        let sp = round_to((ep + f3) / 2.0, 2);
        let ap = match (self.ap_mode, sprint) {
            (AverageMode::Three, _) | (AverageMode::Mixed, true) => round_to((f1 + f2 + f3) / 3.0, 2),
            (AverageMode::Two, _) | (AverageMode::Mixed, false) => round_to((f1 + f3) / 2.0, 2),
        };
        let fx = round_to((f1 + f3) / 2.0, 2);
        let energy = round_to(ratio(ep, ep + f3, "early plus late pace")?, 4);

        Ok(PaceFigures {
            f1,
            f2,
            f3,
            ep,
            sp,
            ap,
            fx,
            energy,
            recorded: true,
        })
    }
}

fn ratio(numerator: f64, denominator: f64, what: &str) -> Result<f64> {
    if denominator == 0.0 {
        return Err(PaceError::insufficient(format!("zero {}", what)));
    }
    let value = numerator / denominator;
    if !value.is_finite() {
        return Err(PaceError::insufficient(format!("non-finite figure over {}", what)));
    }
    Ok(value)
}
