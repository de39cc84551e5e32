//! Average track variant reference.
//!
//! The average variant for a track, distance and surface is the baseline a
//! start's daily variant is compared against.

use polars::prelude::*;
use std::collections::HashMap;
use std::path::Path;

use crate::config::AnalysisConfig;
use crate::error::{PaceError, Result};
use crate::loader::{float_column, string_column};
use crate::types::PastPerformanceRecord;

/// Source of average track variants.
pub trait VariantSource {
    /// Average variant for a track, raw distance in yards, surface code and
    /// all-weather flag.
    fn average_variant(
        &self,
        track_code: &str,
        distance: f64,
        surface: &str,
        all_weather_flag: &str,
    ) -> Result<i32>;
}

/// (track code, distance in yards, surface code, all-weather flag)
type VariantKey = (String, i64, String, String);

/// In-memory average variant table.
#[derive(Debug, Clone, Default)]
pub struct VariantTable {
    data: HashMap<VariantKey, i32>,
}

impl VariantTable {
    /// Load from a CSV file.
    ///
    /// Expected columns: track_code, distance, surface, all_weather_flag,
    /// average_variant
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.as_ref().to_path_buf()))?
            .finish()?;

        let tracks = string_column(&df, "track_code")?;
        let distances = float_column(&df, "distance")?;
        let surfaces = string_column(&df, "surface")?;
        let flags = string_column(&df, "all_weather_flag")?;
        let averages = float_column(&df, "average_variant")?;

        let mut table = Self::default();
        for i in 0..df.height() {
            if tracks[i].is_empty() {
                continue;
            }
            table.insert(
                &tracks[i],
                distances[i].abs().round() as i64,
                &surfaces[i],
                &flags[i],
                averages[i] as i32,
            );
        }

        tracing::info!("Loaded {} average variants", table.len());
        Ok(table)
    }

    pub fn insert(
        &mut self,
        track_code: &str,
        distance: i64,
        surface: &str,
        all_weather_flag: &str,
        average_variant: i32,
    ) {
        self.data
            .insert(key(track_code, distance, surface, all_weather_flag), average_variant);
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl VariantSource for VariantTable {
    fn average_variant(
        &self,
        track_code: &str,
        distance: f64,
        surface: &str,
        all_weather_flag: &str,
    ) -> Result<i32> {
        let distance = distance.abs().round() as i64;
        self.data
            .get(&key(track_code, distance, surface, all_weather_flag))
            .copied()
            .ok_or_else(|| PaceError::VariantNotFound {
                track_code: track_code.to_string(),
                distance,
                surface: surface.to_string(),
            })
    }
}

fn key(track_code: &str, distance: i64, surface: &str, all_weather_flag: &str) -> VariantKey {
    (
        track_code.trim().to_uppercase(),
        distance,
        surface.trim().to_string(),
        all_weather_flag.trim().to_uppercase(),
    )
}

/// Average variant for a start, falling back when the reference has none.
///
/// Starts without a track code get `missing_track_variant`; failed lookups
/// get `fallback_variant`.
pub fn resolve_average_variant(
    record: &PastPerformanceRecord,
    source: &dyn VariantSource,
    config: &AnalysisConfig,
) -> i32 {
    if !record.has_track_code() {
        return config.missing_track_variant;
    }
    match source.average_variant(
        &record.track_code,
        record.distance,
        &record.surface,
        &record.all_weather_flag,
    ) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!("{}, using {}", e, config.fallback_variant);
            config.fallback_variant
        }
    }
}
