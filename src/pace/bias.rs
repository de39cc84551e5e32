//! Track-bias correction of sectional times.
//!
//! A start's daily track variant is compared against the average variant for
//! that track and surface. The difference, in bias units of 0.2s, is split
//! across the three race segments with progressively smaller corrections for
//! the earlier, shorter segments.

use serde::{Deserialize, Serialize};

use crate::types::PastPerformanceRecord;

/// Seconds per bias unit
pub const SECONDS_PER_BIAS_UNIT: f64 = 0.2;

/// Cumulative leader times at the two calls and the finish.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SectionalTimes {
    pub t1: f64,
    pub t2: f64,
    pub t3: f64,
}

impl SectionalTimes {
    /// Sprints use the 2f and 4f calls, routes the 4f and 6f calls.
    pub fn from_record(record: &PastPerformanceRecord, sprint: bool) -> Self {
        if sprint {
            Self {
                t1: record.two_furlong_fraction,
                t2: record.four_furlong_fraction,
                t3: record.final_time,
            }
        } else {
            Self {
                t1: record.four_furlong_fraction,
                t2: record.six_furlong_fraction,
                t3: record.final_time,
            }
        }
    }

    /// Whether the first call was recorded.
    pub fn has_first_call(&self) -> bool {
        self.t1 != 0.0 && !self.t1.is_nan()
    }
}

/// Per-segment corrections and the corrected cumulative times.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AdjustedFractions {
    pub adj1: i32,
    pub adj2: i32,
    pub adj3: i32,
    pub adj_t1: f64,
    pub adj_t2: f64,
    pub adj_t3: f64,
}

/// Splits a track-variant difference into segment corrections.
#[derive(Debug, Clone, Copy)]
pub struct BiasAdjuster {
    sprint_threshold: f64,
}

impl Default for BiasAdjuster {
    fn default() -> Self {
        Self::new(8.0)
    }
}

impl BiasAdjuster {
    pub fn new(sprint_threshold: f64) -> Self {
        Self { sprint_threshold }
    }

    /// Correct `times` for the gap between `average_variant` and `track_variant`.
    pub fn adjust(
        &self,
        average_variant: i32,
        track_variant: i32,
        distance: f64,
        times: SectionalTimes,
    ) -> AdjustedFractions {
        let adj3 = late_adjustment(average_variant, track_variant);
        let adj2 = middle_adjustment(adj3);
        let adj1 = early_adjustment(adj2, adj3, distance < self.sprint_threshold);

        AdjustedFractions {
            adj1,
            adj2,
            adj3,
            adj_t1: times.t1 + SECONDS_PER_BIAS_UNIT * adj1 as f64,
            adj_t2: times.t2 + SECONDS_PER_BIAS_UNIT * adj2 as f64,
            adj_t3: times.t3 + SECONDS_PER_BIAS_UNIT * adj3 as f64,
        }
    }
}

/// Correction applied to the final time.
pub fn late_adjustment(average_variant: i32, track_variant: i32) -> i32 {
    let diff = average_variant - track_variant;
    if diff.abs() <= 1 {
        0
    } else if diff > 4 {
        diff - 3
    } else if track_variant > average_variant {
        half_floor(average_variant + 1 - track_variant)
    } else {
        half_ceil(average_variant - 1 - track_variant)
    }
}

/// Half the late correction, truncated toward zero.
pub fn middle_adjustment(adj3: i32) -> i32 {
    if adj3 > 0 {
        half_floor(adj3)
    } else {
        half_ceil(adj3)
    }
}

/// Rounds half to even.
pub fn early_adjustment(adj2: i32, adj3: i32, sprint: bool) -> i32 {
    if sprint {
        if adj3.abs() > 3 {
            (adj2 as f64 / 2.0).round_ties_even() as i32
        } else {
            0
        }
    } else {
        (2.0 * adj2 as f64 / 3.0).round_ties_even() as i32
    }
}

fn half_floor(v: i32) -> i32 {
    v.div_euclid(2)
}

fn half_ceil(v: i32) -> i32 {
    -(-v).div_euclid(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMES: SectionalTimes = SectionalTimes {
        t1: 22.5,
        t2: 45.0,
        t3: 65.0,
    };

    #[test]
    fn test_no_adjustment_within_one_unit() {
        let adjuster = BiasAdjuster::default();
        for tv in [16, 17, 18] {
            let adj = adjuster.adjust(17, tv, 6.0, TIMES);
            assert_eq!((adj.adj1, adj.adj2, adj.adj3), (0, 0, 0));
            assert_eq!(adj.adj_t1, 22.5);
            assert_eq!(adj.adj_t2, 45.0);
            assert_eq!(adj.adj_t3, 65.0);
        }
    }

    #[test]
    fn test_large_slow_variant() {
        // diff = 10 -> adj3 = 7, adj2 = 3, sprint adj1 = round(1.5) = 2
        let adj = BiasAdjuster::default().adjust(20, 10, 6.0, TIMES);
        assert_eq!(adj.adj3, 7);
        assert_eq!(adj.adj2, 3);
        assert_eq!(adj.adj1, 2);
        assert!((adj.adj_t3 - 66.4).abs() < 1e-9);
        assert!((adj.adj_t2 - 45.6).abs() < 1e-9);
        assert!((adj.adj_t1 - 22.9).abs() < 1e-9);
    }

    #[test]
    fn test_fast_track_rounds_down() {
        // tv above average: floor((17 + 1 - 21) / 2) = floor(-1.5) = -2
        assert_eq!(late_adjustment(17, 21), -2);
        // floor((17 + 1 - 30) / 2) = -6
        assert_eq!(late_adjustment(17, 30), -6);
    }

    #[test]
    fn test_moderate_slow_rounds_up() {
        // diff = 3: ceil((20 - 1 - 17) / 2) = 1
        assert_eq!(late_adjustment(20, 17), 1);
        // diff = 4: ceil(3 / 2) = 2
        assert_eq!(late_adjustment(21, 17), 2);
        // diff = 5: 5 - 3 = 2
        assert_eq!(late_adjustment(22, 17), 2);
    }

    #[test]
    fn test_middle_truncates_toward_zero() {
        assert_eq!(middle_adjustment(7), 3);
        assert_eq!(middle_adjustment(-7), -3);
        assert_eq!(middle_adjustment(-1), 0);
        assert_eq!(middle_adjustment(0), 0);
    }

    #[test]
    fn test_early_adjustment_half_even() {
        // Sprint, |adj3| > 3: round(adj2 / 2), half to even
        assert_eq!(early_adjustment(1, 4, true), 0);
        assert_eq!(early_adjustment(3, 7, true), 2);
        assert_eq!(early_adjustment(-3, -6, true), -2);
        // Sprint, small adj3
        assert_eq!(early_adjustment(1, 3, true), 0);
        // Route: round(2 * adj2 / 3)
        assert_eq!(early_adjustment(3, 7, false), 2);
        assert_eq!(early_adjustment(1, 2, false), 1);
        assert_eq!(early_adjustment(-2, -4, false), -1);
    }

    #[test]
    fn test_route_uses_two_thirds() {
        let adj = BiasAdjuster::default().adjust(20, 10, 8.5, TIMES);
        assert_eq!((adj.adj1, adj.adj2, adj.adj3), (2, 3, 7));

        let small = BiasAdjuster::default().adjust(20, 17, 8.5, TIMES);
        assert_eq!((small.adj1, small.adj2, small.adj3), (0, 0, 1));
    }

    #[test]
    fn test_adjust_is_pure() {
        let adjuster = BiasAdjuster::default();
        let first = adjuster.adjust(15, 24, 6.5, TIMES);
        let second = adjuster.adjust(15, 24, 6.5, TIMES);
        assert_eq!(first, second);
    }

    #[test]
    fn test_sectional_times_by_distance() {
        let record = PastPerformanceRecord {
            two_furlong_fraction: 22.1,
            four_furlong_fraction: 45.3,
            six_furlong_fraction: 1.0e2,
            final_time: 110.2,
            ..Default::default()
        };
        let sprint = SectionalTimes::from_record(&record, true);
        assert_eq!((sprint.t1, sprint.t2), (22.1, 45.3));
        let route = SectionalTimes::from_record(&record, false);
        assert_eq!((route.t1, route.t2, route.t3), (45.3, 100.0, 110.2));
        assert!(route.has_first_call());
        assert!(!SectionalTimes::default().has_first_call());
    }
}
