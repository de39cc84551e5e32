//! Post-position bias summary.
//!
//! Compares actual wins from each post against the wins the betting public
//! expected, using the final odds net of takeout.

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};
use std::collections::BTreeMap;

use crate::pace::round_to;
use crate::types::ChartRace;

/// Share of the pool retained by the track
pub const TAKEOUT: f64 = 0.2;

/// Wins from one post position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostPositionSummary {
    pub post_position: u32,
    pub starters: usize,
    pub expected_wins: f64,
    pub actual_wins: usize,
    pub variance: f64,
    /// P(wins ≤ actual) under a normal approximation, `None` with zero variance
    pub cdf: Option<f64>,
}

/// Public's implied win probability from odds ×100.
pub fn implied_win_probability(odds: f64) -> f64 {
    let fair_odds = odds / 100.0 * (1.0 - TAKEOUT);
    1.0 / (1.0 + fair_odds)
}

/// Summarize every post position across `races`. Finishers without odds are ignored.
///
/// Wins from a post are approximated as normal with mean `Σp` and standard
/// deviation `sqrt(Σ p(1-p))`; the scale is the standard deviation, not the
/// variance.
pub fn summarize_post_positions(races: &[ChartRace]) -> Vec<PostPositionSummary> {
    // post -> (starters, expected, actual, variance)
    let mut totals: BTreeMap<u32, (usize, f64, usize, f64)> = BTreeMap::new();

    for entry in races.iter().flat_map(|r| r.entries.iter()) {
        if entry.odds == 0.0 {
            continue;
        }
        let p = implied_win_probability(entry.odds);
        let t = totals.entry(entry.post_position).or_default();
        t.0 += 1;
        t.1 += p;
        t.2 += usize::from(entry.is_winner());
        t.3 += p * (1.0 - p);
    }

    totals
        .into_iter()
        .map(|(post_position, (starters, expected, actual, variance))| {
            let cdf = Normal::new(expected, variance.sqrt())
                .ok()
                .map(|n| round_to(n.cdf(actual as f64), 2));
            PostPositionSummary {
                post_position,
                starters,
                expected_wins: round_to(expected, 2),
                actual_wins: actual,
                variance: round_to(variance, 2),
                cdf,
            }
        })
        .collect()
}
