//! Figures for each eligible prior start, one row per start.

use serde::Serialize;

use crate::error::Result;
use crate::pace::{AdjustedFractions, PacePipeline, PaceFigures};
use crate::types::{Course, FieldEntry};
use crate::variants::VariantSource;

/// One prior start of a horse in today's field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FigureRow {
    pub race_number: u32,
    pub program_number: String,
    pub name: String,
    /// Date of the prior start
    pub date: String,
    pub track_code: String,
    pub furlongs: f64,
    pub course: Option<Course>,
    pub average_variant: i32,
    pub track_variant: i32,
    pub winner: bool,
    pub adjusted: AdjustedFractions,
    pub figures: PaceFigures,
}

/// Figures for every eligible start of every horse in `field`.
///
/// Starts with degenerate fractions are logged and left out.
pub fn figure_rows(
    field: &[FieldEntry],
    pipeline: &PacePipeline<'_>,
    variants: &dyn VariantSource,
) -> Result<Vec<FigureRow>> {
    let mut rows = Vec::new();

    for entry in field {
        let eligible = entry
            .past_performances
            .iter()
            .filter(|r| pipeline.filter().eligible(r, entry.race_date));

        for record in eligible {
            let pf = match pipeline.figures(record, variants) {
                Ok(pf) => pf,
                Err(e) if e.is_insufficient_data() => {
                    tracing::warn!("{} on {}: {}", entry.name, record.date, e);
                    continue;
                }
                Err(e) => return Err(e),
            };

            rows.push(FigureRow {
                race_number: entry.race_number,
                program_number: entry.program_number.clone(),
                name: entry.name.clone(),
                date: record.date.clone(),
                track_code: record.track_code.clone(),
                furlongs: pf.furlongs,
                course: pf.course,
                average_variant: pf.average_variant,
                track_variant: record.track_variant,
                winner: record.is_winner(),
                adjusted: pf.adjusted,
                figures: pf.figures,
            });
        }
    }

    tracing::info!("Computed figures for {} starts", rows.len());
    Ok(rows)
}

/// Keep dirt starts shorter than `sprint_threshold` furlongs.
pub fn dirt_sprints_only(rows: Vec<FigureRow>, sprint_threshold: f64) -> Vec<FigureRow> {
    rows.into_iter()
        .filter(|r| r.course == Some(Course::Dirt) && r.furlongs < sprint_threshold)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::types::PastPerformanceRecord;
    use crate::variants::VariantTable;
    use chrono::NaiveDate;

    fn start(date: &str, distance: f64, surface: &str) -> PastPerformanceRecord {
        PastPerformanceRecord {
            date: date.to_string(),
            track_code: "AQU".to_string(),
            distance,
            surface: surface.to_string(),
            two_furlong_fraction: 22.5,
            four_furlong_fraction: 45.0,
            six_furlong_fraction: 70.0,
            final_time: if distance < 1760.0 { 65.0 } else { 96.0 },
            track_variant: 17,
            first_call_beaten_lengths: 2.0,
            second_call_beaten_lengths: 3.0,
            finish_beaten_lengths: 1.0,
            finish_position: "1".to_string(),
            ..Default::default()
        }
    }

    fn field() -> Vec<FieldEntry> {
        vec![FieldEntry {
            race_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            race_number: 4,
            classification: "Clm 20000".to_string(),
            program_number: "3".to_string(),
            name: "Quick Study".to_string(),
            past_performances: vec![
                start("20250412", 1320.0, "D"),
                start("20250420", 1320.0, "T"),
                start("20250501", 1760.0, "D"),
                // no track code: never eligible
                PastPerformanceRecord {
                    track_code: String::new(),
                    ..start("20250510", 1320.0, "D")
                },
                // last year
                start("20241101", 1320.0, "D"),
            ],
        }]
    }

    #[test]
    fn test_figure_rows() {
        let config = AnalysisConfig::default();
        let pipeline = PacePipeline::new(&config);
        let rows = figure_rows(&field(), &pipeline, &VariantTable::default()).unwrap();

        assert_eq!(rows.len(), 3);
        let first = &rows[0];
        assert_eq!(first.name, "Quick Study");
        assert_eq!(first.program_number, "3");
        assert_eq!(first.course, Some(Course::Dirt));
        assert_eq!(first.furlongs, 6.0);
        assert!(first.winner);
        assert_eq!(first.figures.f1, 57.78);
        assert_eq!(rows[1].course, Some(Course::Turf));
        assert_eq!(rows[2].furlongs, 8.0);
    }

    #[test]
    fn test_dirt_sprints_only() {
        let config = AnalysisConfig::default();
        let pipeline = PacePipeline::new(&config);
        let rows = figure_rows(&field(), &pipeline, &VariantTable::default()).unwrap();

        let sprints = dirt_sprints_only(rows, config.sprint_threshold);
        assert_eq!(sprints.len(), 1);
        assert_eq!(sprints[0].date, "20250412");
    }
}
