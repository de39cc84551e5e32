//! CSV record source for past performances and result charts.
//!
//! The chart and past-performance parsers write flat CSV files; this module
//! turns them back into typed records.

use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::HashMap;
use std::path::Path;

use crate::error::Result;
use crate::types::{
    parse_race_date, ChartEntry, ChartRace, Course, FieldEntry, PastPerformanceRecord,
};

fn read_csv<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.as_ref().to_path_buf()))?
        .finish()?;
    Ok(df)
}

/// Column as strings, nulls as empty.
pub(crate) fn string_column(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    let col = df.column(name)?.cast(&DataType::String)?;
    Ok(col
        .str()?
        .into_iter()
        .map(|v| v.unwrap_or("").trim().to_string())
        .collect())
}

/// Column as floats, nulls as zero.
pub(crate) fn float_column(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let col = df.column(name)?.cast(&DataType::Float64)?;
    Ok(col.f64()?.into_iter().map(|v| v.unwrap_or(0.0)).collect())
}

/// Like [`string_column`], but a missing column reads as all empty.
fn optional_string_column(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    if df.get_column_names().iter().any(|c| c.as_str() == name) {
        string_column(df, name)
    } else {
        Ok(vec![String::new(); df.height()])
    }
}

/// Load today's fields with their past performances.
///
/// One row per prior start. Entry columns: race_date, race_number,
/// classification, program_number, name. Start columns: pp_date, track_code,
/// distance, surface, all_weather_flag, start_code, two_furlong_fraction,
/// four_furlong_fraction, six_furlong_fraction, final_time, track_variant,
/// first_call_beaten_lengths, second_call_beaten_lengths,
/// finish_beaten_lengths, finish_position. A row with an empty pp_date is an
/// entry with no prior starts.
pub fn load_field<P: AsRef<Path>>(path: P) -> Result<Vec<FieldEntry>> {
    let df = read_csv(path)?;

    let race_dates = string_column(&df, "race_date")?;
    let race_numbers = float_column(&df, "race_number")?;
    let classifications = string_column(&df, "classification")?;
    let program_numbers = string_column(&df, "program_number")?;
    let names = string_column(&df, "name")?;

    let pp_dates = string_column(&df, "pp_date")?;
    let track_codes = string_column(&df, "track_code")?;
    let distances = float_column(&df, "distance")?;
    let surfaces = string_column(&df, "surface")?;
    let all_weather_flags = optional_string_column(&df, "all_weather_flag")?;
    let start_codes = optional_string_column(&df, "start_code")?;
    let two_furlongs = float_column(&df, "two_furlong_fraction")?;
    let four_furlongs = float_column(&df, "four_furlong_fraction")?;
    let six_furlongs = float_column(&df, "six_furlong_fraction")?;
    let final_times = float_column(&df, "final_time")?;
    let track_variants = float_column(&df, "track_variant")?;
    let bl1s = float_column(&df, "first_call_beaten_lengths")?;
    let bl2s = float_column(&df, "second_call_beaten_lengths")?;
    let bl3s = float_column(&df, "finish_beaten_lengths")?;
    let finish_positions = string_column(&df, "finish_position")?;

    let mut entries: Vec<FieldEntry> = Vec::new();
    let mut index: HashMap<(NaiveDate, u32, String, String), usize> = HashMap::new();

    for i in 0..df.height() {
        let race_date = parse_race_date(&race_dates[i])?;
        let race_number = race_numbers[i] as u32;
        let key = (
            race_date,
            race_number,
            program_numbers[i].clone(),
            names[i].clone(),
        );

        let idx = *index.entry(key).or_insert_with(|| {
            entries.push(FieldEntry {
                race_date,
                race_number,
                classification: classifications[i].clone(),
                program_number: program_numbers[i].clone(),
                name: names[i].clone(),
                past_performances: Vec::new(),
            });
            entries.len() - 1
        });

        if pp_dates[i].is_empty() {
            continue;
        }

        entries[idx].past_performances.push(PastPerformanceRecord {
            date: pp_dates[i].clone(),
            track_code: track_codes[i].clone(),
            distance: distances[i],
            surface: surfaces[i].clone(),
            all_weather_flag: all_weather_flags[i].clone(),
            start_code: start_codes[i].clone(),
            two_furlong_fraction: two_furlongs[i],
            four_furlong_fraction: four_furlongs[i],
            six_furlong_fraction: six_furlongs[i],
            final_time: final_times[i],
            track_variant: track_variants[i] as i32,
            first_call_beaten_lengths: bl1s[i],
            second_call_beaten_lengths: bl2s[i],
            finish_beaten_lengths: bl3s[i],
            finish_position: finish_positions[i].clone(),
        });
    }

    tracing::info!("Loaded {} field entries", entries.len());
    Ok(entries)
}

/// Load result charts.
///
/// One row per finisher. Race columns: race_date, race_number,
/// classification, distance (furlongs), surface, final_time,
/// track_condition. Finisher columns: name, program_number, post_position,
/// odds, finish_position, finish_beaten_lengths.
pub fn load_charts<P: AsRef<Path>>(path: P) -> Result<Vec<ChartRace>> {
    let df = read_csv(path)?;

    let race_dates = string_column(&df, "race_date")?;
    let race_numbers = float_column(&df, "race_number")?;
    let classifications = string_column(&df, "classification")?;
    let distances = float_column(&df, "distance")?;
    let surfaces = string_column(&df, "surface")?;
    let final_times = float_column(&df, "final_time")?;
    let track_conditions = optional_string_column(&df, "track_condition")?;
    let names = string_column(&df, "name")?;
    let program_numbers = string_column(&df, "program_number")?;
    let post_positions = float_column(&df, "post_position")?;
    let odds = float_column(&df, "odds")?;
    let finish_positions = float_column(&df, "finish_position")?;
    let beaten_lengths = float_column(&df, "finish_beaten_lengths")?;

    let mut races: Vec<ChartRace> = Vec::new();
    let mut index: HashMap<(NaiveDate, u32), usize> = HashMap::new();

    for i in 0..df.height() {
        let race_date = parse_race_date(&race_dates[i])?;
        let race_number = race_numbers[i] as u32;

        let idx = *index.entry((race_date, race_number)).or_insert_with(|| {
            let course = Course::from_name(&surfaces[i]);
            if course.is_none() {
                tracing::warn!(
                    "Unrecognized chart surface {:?} for {} race {}",
                    surfaces[i],
                    race_date,
                    race_number
                );
            }
            races.push(ChartRace {
                race_date,
                race_number,
                classification: classifications[i].clone(),
                distance: distances[i],
                course,
                final_time: final_times[i],
                track_condition: track_conditions[i].clone(),
                entries: Vec::new(),
            });
            races.len() - 1
        });

        races[idx].entries.push(ChartEntry {
            name: names[i].clone(),
            program_number: program_numbers[i].clone(),
            post_position: post_positions[i] as u32,
            odds: odds[i],
            finish_position: finish_positions[i] as u32,
            finish_beaten_lengths: beaten_lengths[i],
        });
    }

    tracing::info!("Loaded {} chart races", races.len());
    Ok(races)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn csv_file(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_field_groups_starts() {
        let file = csv_file(&[
            "race_date,race_number,classification,program_number,name,pp_date,track_code,distance,surface,all_weather_flag,start_code,two_furlong_fraction,four_furlong_fraction,six_furlong_fraction,final_time,track_variant,first_call_beaten_lengths,second_call_beaten_lengths,finish_beaten_lengths,finish_position",
            "20250601,3,Clm 20000,1,Quick Study,20250412,AQU,1320,D,,,22.5,45.0,0,65.0,17,2,3,1,2",
            "20250601,3,Clm 20000,1,Quick Study,20250301,AQU,-1430,D,,,22.8,46.1,0,77.2,15,1,1,0,1",
            "20250601,3,Clm 20000,2,First Timer,,,,,,,,,,,,,,,",
            "20250601,4,Alw 50000,1A,Route Guy,20250420,BEL,1870,T,,x,0,47.0,71.0,103.0,12,1,2,2,4",
        ]);

        let entries = load_field(file.path()).unwrap();
        assert_eq!(entries.len(), 3);

        let quick = &entries[0];
        assert_eq!(quick.race_number, 3);
        assert_eq!(quick.race_date, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        assert_eq!(quick.past_performances.len(), 2);
        assert_eq!(quick.past_performances[1].distance, -1430.0);
        assert!(quick.past_performances[1].is_winner());

        assert!(entries[1].past_performances.is_empty());

        let route = &entries[2];
        assert_eq!(route.program_number, "1A");
        assert_eq!(route.past_performances[0].start_code, "x");
        assert_eq!(route.past_performances[0].track_variant, 12);
    }

    #[test]
    fn test_load_charts_groups_finishers() {
        let file = csv_file(&[
            "race_date,race_number,classification,distance,surface,final_time,track_condition,name,program_number,post_position,odds,finish_position,finish_beaten_lengths",
            "2025-06-01,3,Clm 20000,6,DIRT,70.12,FT,Quick Study,1,1,250,1,0",
            "2025-06-01,3,Clm 20000,6,DIRT,70.12,FT,Also Ran,2,2,1200,2,1.5",
            "2025-06-01,4,Alw 50000,-8.5,TURF,103.4,FM,Route Guy,1A,1,310,1,0",
        ]);

        let races = load_charts(file.path()).unwrap();
        assert_eq!(races.len(), 2);
        assert_eq!(races[0].entries.len(), 2);
        assert_eq!(races[0].course, Some(Course::Dirt));
        assert_eq!(races[0].winner().unwrap().name, "Quick Study");
        assert_eq!(races[0].key(), 2025060103);
        assert_eq!(races[1].distance, -8.5);
        assert_eq!(races[1].entries[0].program_number, "1A");
    }

    #[test]
    fn test_missing_column_is_error() {
        let file = csv_file(&["race_date,race_number", "20250601,1"]);
        assert!(load_charts(file.path()).is_err());
    }
}
