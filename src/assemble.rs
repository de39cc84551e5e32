//! Per-race analysis table.
//!
//! Joins each horse's pace profile with the result chart for the race it ran
//! in, keeps races that match the target conditions, and ranks every figure
//! within the race.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;

use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::pace::{Figure, HorsePaceProfile, PacePipeline, ProfileIndex};
use crate::types::{name_key, race_key, ChartRace, FieldEntry, RaceDay};
use crate::variants::VariantSource;

/// Per-figure ranks within a race (1 = best, ties averaged).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct FigureRanks {
    pub rank_f1: f64,
    pub rank_f2: f64,
    pub rank_f3: f64,
    pub rank_ep: f64,
    pub rank_sp: f64,
    pub rank_ap: f64,
    pub rank_fx: f64,
}

impl FigureRanks {
    pub fn get(&self, figure: Figure) -> Option<f64> {
        match figure {
            Figure::F1 => Some(self.rank_f1),
            Figure::F2 => Some(self.rank_f2),
            Figure::F3 => Some(self.rank_f3),
            Figure::Ep => Some(self.rank_ep),
            Figure::Sp => Some(self.rank_sp),
            Figure::Ap => Some(self.rank_ap),
            Figure::Fx => Some(self.rank_fx),
            Figure::Energy => None,
        }
    }

    fn set(&mut self, figure: Figure, rank: f64) {
        match figure {
            Figure::F1 => self.rank_f1 = rank,
            Figure::F2 => self.rank_f2 = rank,
            Figure::F3 => self.rank_f3 = rank,
            Figure::Ep => self.rank_ep = rank,
            Figure::Sp => self.rank_sp = rank,
            Figure::Ap => self.rank_ap = rank,
            Figure::Fx => self.rank_fx = rank,
            Figure::Energy => {}
        }
    }
}

/// One horse in one analysed race.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RaceAnalysisRow {
    /// `YYYYMMDD` + race number
    pub key: u64,
    pub race_date: NaiveDate,
    pub race_number: u32,
    pub program_number: String,
    pub name: String,
    /// Today's distance in furlongs
    pub distance: f64,
    pub winner: bool,
    #[serde(flatten)]
    pub profile: HorsePaceProfile,
    #[serde(flatten)]
    pub ranks: FigureRanks,
}

/// Rows from every analysed race.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisTable {
    pub rows: Vec<RaceAnalysisRow>,
}

impl AnalysisTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of distinct races.
    pub fn num_races(&self) -> usize {
        self.rows.iter().map(|r| r.key).collect::<HashSet<_>>().len()
    }

    pub fn winners(&self) -> impl Iterator<Item = &RaceAnalysisRow> {
        self.rows.iter().filter(|r| r.winner)
    }

    /// Share of winners ranked (or tied) first on `figure`.
    pub fn top_rank_win_rate(&self, figure: Figure) -> f64 {
        let winners: Vec<_> = self.winners().collect();
        if winners.is_empty() {
            return 0.0;
        }
        let top = winners
            .iter()
            .filter(|r| {
                let same_race: Vec<f64> = self
                    .rows
                    .iter()
                    .filter(|o| o.key == r.key)
                    .filter_map(|o| o.ranks.get(figure))
                    .collect();
                let best = same_race.iter().copied().fold(f64::INFINITY, f64::min);
                r.ranks.get(figure) == Some(best)
            })
            .count();
        top as f64 / winners.len() as f64
    }
}

/// Rank descending with averaged ties: `[10, 20, 20, 30]` → `[4, 2.5, 2.5, 1]`.
pub fn rank_descending(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[b].total_cmp(&values[a]));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // positions start+1 ..= end share their mean
        let rank = (start + 1 + end) as f64 / 2.0;
        for &i in &order[start..end] {
            ranks[i] = rank;
        }
        start = end;
    }
    ranks
}

/// Builds the analysis table from charts, today's fields and profiles.
pub struct RaceAssembler<'a> {
    config: &'a AnalysisConfig,
}

impl<'a> RaceAssembler<'a> {
    pub fn new(config: &'a AnalysisConfig) -> Self {
        Self { config }
    }

    /// Assemble every race day, oldest first.
    ///
    /// Profiles are built from each day's own field, so a horse running on
    /// several days is ranked on the past performances it carried that day.
    pub fn assemble(
        &self,
        days: &[RaceDay],
        pipeline: &PacePipeline<'_>,
        variants: &dyn VariantSource,
    ) -> Result<AnalysisTable> {
        let mut table = AnalysisTable::default();
        for day in days {
            let profiles = pipeline.profile_field(&day.field, variants)?;
            let rows = self.assemble_day(&day.charts, &day.field, &profiles);
            tracing::debug!(
                "{}: {} profiles, {} rows",
                day.race_date,
                profiles.len(),
                rows.len()
            );
            table.rows.extend(rows);
        }
        tracing::info!(
            "Assembled {} rows across {} races",
            table.len(),
            table.num_races()
        );
        Ok(table)
    }

    /// Assemble one day's races.
    pub fn assemble_day(
        &self,
        charts: &[ChartRace],
        field: &[FieldEntry],
        profiles: &ProfileIndex,
    ) -> Vec<RaceAnalysisRow> {
        charts
            .iter()
            .flat_map(|race| self.assemble_race(race, field, profiles))
            .collect()
    }

    /// Rows for one race, or nothing when the race is filtered out.
    pub fn assemble_race(
        &self,
        race: &ChartRace,
        field: &[FieldEntry],
        profiles: &ProfileIndex,
    ) -> Vec<RaceAnalysisRow> {
        if self.config.is_maiden(&race.classification) {
            tracing::debug!("Skipping maiden race {}", race.key());
            return Vec::new();
        }

        let winner = race.winner().map(|w| name_key(&w.name));
        let distance = race.distance.abs();

        // Join
        let joined: Vec<(&FieldEntry, &HorsePaceProfile)> = field
            .iter()
            .filter(|e| e.race_number == race.race_number)
            .filter(|e| !self.config.is_maiden(&e.classification))
            .filter_map(|e| profiles.get(&name_key(&e.name)).map(|p| (e, p)))
            .collect();
        if joined.is_empty() {
            tracing::debug!("No pace data for race {}", race.key());
            return Vec::new();
        }

        // Target conditions
        if !self.config.is_sprint(distance) {
            return Vec::new();
        }
        if let Some(surface) = self.config.surface {
            if race.course != Some(surface) {
                return Vec::new();
            }
        }

        let mut seen = HashSet::new();
        let mut rows: Vec<RaceAnalysisRow> = joined
            .into_iter()
            .filter(|(e, _)| seen.insert(name_key(&e.name)))
            .map(|(e, p)| RaceAnalysisRow {
                key: race_key(race.race_date, race.race_number),
                race_date: race.race_date,
                race_number: race.race_number,
                program_number: e.program_number.clone(),
                name: e.name.clone(),
                distance,
                winner: winner.as_deref() == Some(name_key(&e.name).as_str()),
                profile: *p,
                ranks: FigureRanks::default(),
            })
            .collect();

        if rows.len() < self.config.min_field_size || !rows.iter().any(|r| r.winner) {
            tracing::debug!(
                "Dropping race {}: {} runners, winner present: {}",
                race.key(),
                rows.len(),
                rows.iter().any(|r| r.winner)
            );
            return Vec::new();
        }

        for figure in Figure::RANKED {
            let values: Vec<f64> = rows.iter().map(|r| r.profile.get(figure)).collect();
            for (row, rank) in rows.iter_mut().zip(rank_descending(&values)) {
                row.ranks.set(figure, rank);
            }
        }

        rows
    }
}
