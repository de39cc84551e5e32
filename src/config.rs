//! Configuration for the pace pipeline.

use serde::{Deserialize, Serialize};

use crate::types::Course;

/// How a figure with no early fraction is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentinelStyle {
    /// Numeric zero
    #[default]
    Zero,
    /// Display placeholder (`-`)
    Placeholder,
}

impl SentinelStyle {
    pub const PLACEHOLDER: &'static str = "-";

    /// Format a figure for table output.
    pub fn display(&self, value: f64, recorded: bool, decimals: usize) -> String {
        match (recorded, self) {
            (false, SentinelStyle::Placeholder) => Self::PLACEHOLDER.to_string(),
            (false, SentinelStyle::Zero) => "0".to_string(),
            (true, _) => format!("{:.*}", decimals, value),
        }
    }

    /// Figure as a JSON value.
    pub fn json(&self, value: f64, recorded: bool) -> serde_json::Value {
        match (recorded, self) {
            (false, SentinelStyle::Placeholder) => serde_json::Value::from(Self::PLACEHOLDER),
            (false, SentinelStyle::Zero) => serde_json::Value::from(0),
            (true, _) => serde_json::Value::from(value),
        }
    }
}

/// How the average pace `ap` is formed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AverageMode {
    /// `(f1 + f2 + f3) / 3` for sprints, `(f1 + f3) / 2` for routes
    #[default]
    Mixed,
    /// `(f1 + f2 + f3) / 3`
    Three,
    /// `(f1 + f3) / 2`
    Two,
}

/// Analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Oldest race year counted; `None` means the current year
    #[serde(default)]
    pub cutoff_year: Option<i32>,
    /// Also require recorded 2f and 4f fractions
    #[serde(default)]
    pub strict_fractions: bool,
    #[serde(default)]
    pub sentinel: SentinelStyle,
    #[serde(default)]
    pub ap_mode: AverageMode,
    /// Furlongs below which a race is a sprint
    #[serde(default = "default_sprint_threshold")]
    pub sprint_threshold: f64,
    /// Smallest field kept in the analysis table
    #[serde(default = "default_min_field_size")]
    pub min_field_size: usize,
    /// Longest start (furlongs) counted by the strict filter
    #[serde(default = "default_max_strict_distance")]
    pub max_strict_distance: f64,
    /// Average variant used when the reference lookup fails
    #[serde(default = "default_fallback_variant")]
    pub fallback_variant: i32,
    /// Average variant used when a start has no track code
    #[serde(default)]
    pub missing_track_variant: i32,
    /// Classification marker for maiden races
    #[serde(default = "default_maiden_marker")]
    pub maiden_marker: String,
    /// Only keep races run on this course
    #[serde(default)]
    pub surface: Option<Course>,
}

fn default_sprint_threshold() -> f64 {
    8.0
}

fn default_min_field_size() -> usize {
    5
}

fn default_max_strict_distance() -> f64 {
    12.0
}

fn default_fallback_variant() -> i32 {
    17
}

fn default_maiden_marker() -> String {
    "Md".to_string()
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            cutoff_year: None,
            strict_fractions: false,
            sentinel: SentinelStyle::default(),
            ap_mode: AverageMode::default(),
            sprint_threshold: default_sprint_threshold(),
            min_field_size: default_min_field_size(),
            max_strict_distance: default_max_strict_distance(),
            fallback_variant: default_fallback_variant(),
            missing_track_variant: 0,
            maiden_marker: default_maiden_marker(),
            surface: None,
        }
    }
}

impl AnalysisConfig {
    pub fn is_sprint(&self, furlongs: f64) -> bool {
        furlongs < self.sprint_threshold
    }

    pub fn is_maiden(&self, classification: &str) -> bool {
        !self.maiden_marker.is_empty() && classification.contains(&self.maiden_marker)
    }
}

/// Data file locations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataConfig {
    /// Past-performance CSV (one row per prior start)
    #[serde(default)]
    pub past_performances: Option<String>,
    /// Result chart CSV (one row per finisher)
    #[serde(default)]
    pub charts: Option<String>,
    /// Average variant reference CSV
    #[serde(default)]
    pub variants: Option<String>,
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub data: DataConfig,
}

impl AppConfig {
    /// Load configuration from environment and config file
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            // Start with defaults
            .add_source(config::Config::try_from(&AppConfig::default())?)
            // Add config file if exists
            .add_source(config::File::with_name("gallop").required(false))
            // Override with environment variables (GALLOP_ANALYSIS__CUTOFF_YEAR, etc.)
            .add_source(
                config::Environment::with_prefix("GALLOP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
