//! Averaging a horse's figures into one profile.

use serde::{Deserialize, Serialize};

use crate::pace::fractions::{Figure, PaceFigures};
use crate::pace::round_to;

/// A horse's mean figures across its eligible starts.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HorsePaceProfile {
    pub f1: f64,
    pub f2: f64,
    pub f3: f64,
    pub ep: f64,
    pub sp: f64,
    pub ap: f64,
    pub fx: f64,
    pub energy: f64,
    /// Number of starts averaged
    pub starts: usize,
}

impl HorsePaceProfile {
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

    pub fn is_empty(&self) -> bool {
        self.starts == 0
    }
}

/// Mean of each column, rounded to 2 decimals. Empty input gives all zeros.
pub fn aggregate(figures: &[PaceFigures]) -> HorsePaceProfile {
    if figures.is_empty() {
        return HorsePaceProfile::default();
    }

    let mean = |figure: Figure| {
        let sum: f64 = figures.iter().map(|f| f.get(figure)).sum();
        round_to(sum / figures.len() as f64, 2)
    };

    HorsePaceProfile {
        f1: mean(Figure::F1),
        f2: mean(Figure::F2),
        f3: mean(Figure::F3),
        ep: mean(Figure::Ep),
        sp: mean(Figure::Sp),
        ap: mean(Figure::Ap),
        fx: mean(Figure::Fx),
        energy: mean(Figure::Energy),
        starts: figures.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn figures(f1: f64, f3: f64) -> PaceFigures {
        PaceFigures {
            f1,
            f2: 58.0,
            f3,
            ep: 57.0,
            sp: 60.0,
            ap: 59.5,
            fx: (f1 + f3) / 2.0,
            energy: 0.4812,
            recorded: true,
        }
    }

    #[test]
    fn test_empty_is_all_zero() {
        let profile = aggregate(&[]);
        assert_eq!(profile, HorsePaceProfile::default());
        assert!(profile.is_empty());
    }

    #[test]
    fn test_mean_of_identical() {
        let one = figures(57.78, 67.0);
        let profile = aggregate(&[one, one, one]);
        assert_eq!(profile.f1, one.f1);
        assert_eq!(profile.f3, one.f3);
        assert_eq!(profile.ep, one.ep);
        assert_eq!(profile.fx, 62.39);
        assert_eq!(profile.starts, 3);
    }

    #[test]
    fn test_mean_rounds_to_two_places() {
        let profile = aggregate(&[figures(57.0, 60.0), figures(58.0, 61.0), figures(58.0, 61.0)]);
        // 173 / 3
        assert_eq!(profile.f1, 57.67);
        // 182 / 3
        assert_eq!(profile.f3, 60.67);
        // energy keeps only two places once averaged
        assert_eq!(profile.energy, 0.48);
    }

    #[test]
    fn test_sentinel_counts_as_zero() {
        let profile = aggregate(&[figures(60.0, 60.0), PaceFigures::sentinel()]);
        assert_eq!(profile.f1, 30.0);
        assert_eq!(profile.starts, 2);
    }
}
