//! Gallop: pace and energy figures for thoroughbred races.
//!
//! Prior starts are bias-corrected against the track's average variant,
//! turned into sectional speed figures, averaged per horse, and joined with
//! result charts so each race's figures can be ranked against its winner.

pub mod assemble;
pub mod config;
pub mod error;
pub mod figures;
pub mod loader;
pub mod pace;
pub mod post_position;
pub mod report;
pub mod speed;
pub mod types;
pub mod variants;

pub use assemble::{AnalysisTable, RaceAnalysisRow, RaceAssembler};
pub use config::{AnalysisConfig, AppConfig};
pub use error::{PaceError, Result};
pub use pace::{HorsePaceProfile, PaceFigures, PacePipeline};
pub use types::{ChartRace, FieldEntry, PastPerformanceRecord, RaceDay};
pub use variants::{VariantSource, VariantTable};
