//! Record types for past performances, today's field and chart results.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{PaceError, Result};
use crate::pace::round_to;

/// Yards per furlong
pub const YARDS_PER_FURLONG: f64 = 220.0;

/// Racing surface a start was run over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Course {
    Dirt,
    AllWeatherTrack,
    Turf,
    InnerTurf,
    OuterTurf,
}

impl Course {
    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "DIRT" | "D" => Some(Course::Dirt),
            "ALL_WEATHER_TRACK" | "AW" => Some(Course::AllWeatherTrack),
            "TURF" | "T" => Some(Course::Turf),
            "INNER_TURF" => Some(Course::InnerTurf),
            "OUTER_TURF" => Some(Course::OuterTurf),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Course::Dirt => "DIRT",
            Course::AllWeatherTrack => "ALL_WEATHER_TRACK",
            Course::Turf => "TURF",
            Course::InnerTurf => "INNER_TURF",
            Course::OuterTurf => "OUTER_TURF",
        }
    }
}

/// One prior start for a horse, as supplied by the past-performance parser.
///
/// Fraction times of `0.0` mean the call was not recorded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PastPerformanceRecord {
    /// Race date, year first (`YYYYMMDD`)
    pub date: String,
    pub track_code: String,
    /// Distance in yards, negative for "about" distances
    pub distance: f64,
    pub surface: String,
    pub all_weather_flag: String,
    pub start_code: String,
    pub two_furlong_fraction: f64,
    pub four_furlong_fraction: f64,
    pub six_furlong_fraction: f64,
    pub final_time: f64,
    /// Daily track variant in bias units
    pub track_variant: i32,
    pub first_call_beaten_lengths: f64,
    pub second_call_beaten_lengths: f64,
    pub finish_beaten_lengths: f64,
    pub finish_position: String,
}

impl PastPerformanceRecord {
    /// Distance in furlongs, rounded to 2 decimals.
    pub fn furlongs(&self) -> f64 {
        round_to(self.distance.abs() / YARDS_PER_FURLONG, 2)
    }

    /// Year prefix of the race date.
    pub fn year(&self) -> Option<i32> {
        self.date.trim().get(..4)?.parse().ok()
    }

    pub fn has_track_code(&self) -> bool {
        !self.track_code.trim().is_empty()
    }

    pub fn is_winner(&self) -> bool {
        self.finish_position.trim() == "1"
    }
}

/// A horse entered in today's card, with its past performances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldEntry {
    pub race_date: NaiveDate,
    pub race_number: u32,
    /// Today's race classification (e.g. `Alw 50000`, `Md Sp Wt`)
    pub classification: String,
    pub program_number: String,
    pub name: String,
    #[serde(default)]
    pub past_performances: Vec<PastPerformanceRecord>,
}

/// Drop entries scratched from today's card, matching names case-insensitively.
pub fn remove_scratches(field: Vec<FieldEntry>, scratches: &[String]) -> Vec<FieldEntry> {
    if scratches.is_empty() {
        return field;
    }
    let scratched: std::collections::HashSet<String> =
        scratches.iter().map(|s| name_key(s)).collect();

    field
        .into_iter()
        .filter(|e| {
            let keep = !scratched.contains(&name_key(&e.name));
            if !keep {
                tracing::info!("Removing a scratch: {}", e.name);
            }
            keep
        })
        .collect()
}

/// A finisher in a result chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartEntry {
    pub name: String,
    pub program_number: String,
    pub post_position: u32,
    /// Final odds ×100, `0` when unknown
    pub odds: f64,
    pub finish_position: u32,
    pub finish_beaten_lengths: f64,
}

impl ChartEntry {
    pub fn is_winner(&self) -> bool {
        self.finish_position == 1
    }
}

/// One race from a result chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartRace {
    pub race_date: NaiveDate,
    pub race_number: u32,
    pub classification: String,
    /// Distance in furlongs, negative for "about" distances
    pub distance: f64,
    pub course: Option<Course>,
    /// Winner's final time in seconds
    pub final_time: f64,
    pub track_condition: String,
    pub entries: Vec<ChartEntry>,
}

impl ChartRace {
    pub fn winner(&self) -> Option<&ChartEntry> {
        self.entries.iter().find(|e| e.is_winner())
    }

    pub fn key(&self) -> u64 {
        race_key(self.race_date, self.race_number)
    }
}

/// A race day: the result charts and the field that ran that day.
#[derive(Debug, Clone, PartialEq)]
pub struct RaceDay {
    pub race_date: NaiveDate,
    pub charts: Vec<ChartRace>,
    pub field: Vec<FieldEntry>,
}

impl RaceDay {
    /// Group charts and field entries by race date, oldest first.
    ///
    /// Days missing either charts or field entries are dropped.
    pub fn group(charts: Vec<ChartRace>, field: Vec<FieldEntry>) -> Vec<RaceDay> {
        let mut days: std::collections::BTreeMap<NaiveDate, RaceDay> =
            std::collections::BTreeMap::new();

        for race in charts {
            days.entry(race.race_date)
                .or_insert_with(|| RaceDay::empty(race.race_date))
                .charts
                .push(race);
        }
        for entry in field {
            if let Some(day) = days.get_mut(&entry.race_date) {
                day.field.push(entry);
            } else {
                tracing::debug!(
                    "No chart for {} race {}, skipping {}",
                    entry.race_date,
                    entry.race_number,
                    entry.name
                );
            }
        }

        days.into_values()
            .filter(|d| !d.field.is_empty())
            .collect()
    }

    fn empty(race_date: NaiveDate) -> Self {
        Self {
            race_date,
            charts: Vec::new(),
            field: Vec::new(),
        }
    }
}

/// `YYYYMMDD` followed by a two-digit race number.
pub fn race_key(date: NaiveDate, race_number: u32) -> u64 {
    let ymd = date.year() as u64 * 10_000 + date.month() as u64 * 100 + date.day() as u64;
    ymd * 100 + race_number as u64
}

/// Parse `YYYYMMDD` or `YYYY-MM-DD`.
pub fn parse_race_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y%m%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .map_err(|_| PaceError::InvalidDate(s.to_string()))
}

/// Case-insensitive key used to join horses across sources.
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_furlongs_from_yards() {
        let pp = PastPerformanceRecord {
            distance: 1320.0,
            ..Default::default()
        };
        assert_eq!(pp.furlongs(), 6.0);

        let about = PastPerformanceRecord {
            distance: -1430.0,
            ..Default::default()
        };
        assert_eq!(about.furlongs(), 6.5);

        let mile_70 = PastPerformanceRecord {
            distance: 1830.0,
            ..Default::default()
        };
        assert!((mile_70.furlongs() - 8.32).abs() < 1e-9);
    }

    #[test]
    fn test_year_and_winner() {
        let pp = PastPerformanceRecord {
            date: "20250412".to_string(),
            finish_position: "1".to_string(),
            ..Default::default()
        };
        assert_eq!(pp.year(), Some(2025));
        assert!(pp.is_winner());

        let empty = PastPerformanceRecord::default();
        assert_eq!(empty.year(), None);
        assert!(!empty.is_winner());
        assert!(!empty.has_track_code());
    }

    #[test]
    fn test_course_from_name() {
        assert_eq!(Course::from_name("DIRT"), Some(Course::Dirt));
        assert_eq!(Course::from_name("inner_turf"), Some(Course::InnerTurf));
        assert_eq!(Course::from_name("swamp"), None);
        assert_eq!(Course::AllWeatherTrack.name(), "ALL_WEATHER_TRACK");
    }

    #[test]
    fn test_race_key() {
        assert_eq!(race_key(date(2025, 4, 12), 3), 2025041203);
        assert_eq!(race_key(date(2025, 12, 31), 11), 2025123111);
    }

    #[test]
    fn test_parse_race_date() {
        assert_eq!(parse_race_date("20250412").unwrap(), date(2025, 4, 12));
        assert_eq!(parse_race_date("2025-04-12").unwrap(), date(2025, 4, 12));
        assert!(parse_race_date("April 12").is_err());
    }

    #[test]
    fn test_remove_scratches() {
        let entry = |name: &str| FieldEntry {
            race_date: date(2025, 5, 1),
            race_number: 1,
            classification: "Clm 10000".to_string(),
            program_number: "1".to_string(),
            name: name.to_string(),
            past_performances: Vec::new(),
        };
        let field = vec![entry("Alpha"), entry("Bravo"), entry("Charlie")];

        let kept = remove_scratches(field.clone(), &["BRAVO".to_string()]);
        let names: Vec<_> = kept.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Charlie"]);

        assert_eq!(remove_scratches(field, &[]).len(), 3);
    }

    #[test]
    fn test_group_race_days() {
        let chart = |d: NaiveDate, n: u32| ChartRace {
            race_date: d,
            race_number: n,
            classification: "Clm 10000".to_string(),
            distance: 6.0,
            course: Some(Course::Dirt),
            final_time: 70.0,
            track_condition: "FT".to_string(),
            entries: Vec::new(),
        };
        let entry = |d: NaiveDate, n: u32, name: &str| FieldEntry {
            race_date: d,
            race_number: n,
            classification: "Clm 10000".to_string(),
            program_number: "1".to_string(),
            name: name.to_string(),
            past_performances: Vec::new(),
        };

        let days = RaceDay::group(
            vec![chart(date(2025, 5, 2), 1), chart(date(2025, 5, 1), 1), chart(date(2025, 5, 3), 1)],
            vec![
                entry(date(2025, 5, 1), 1, "Alpha"),
                entry(date(2025, 5, 2), 1, "Bravo"),
                entry(date(2025, 5, 9), 1, "Orphan"),
            ],
        );

        assert_eq!(days.len(), 2);
        assert_eq!(days[0].race_date, date(2025, 5, 1));
        assert_eq!(days[1].field[0].name, "Bravo");
    }
}
