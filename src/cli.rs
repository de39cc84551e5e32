//! CLI commands for gallop.
//!
//! Every command reads CSV exports, runs one stage of the pipeline and prints
//! a table or JSON.

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use gallop::assemble::RaceAssembler;
use gallop::config::{AppConfig, AverageMode, SentinelStyle};
use gallop::figures::{dirt_sprints_only, figure_rows};
use gallop::loader::{load_charts, load_field};
use gallop::pace::PacePipeline;
use gallop::post_position::summarize_post_positions;
use gallop::report;
use gallop::speed::speed_table;
use gallop::types::{remove_scratches, Course, FieldEntry, RaceDay};
use gallop::variants::VariantTable;

#[derive(Parser)]
#[command(name = "gallop")]
#[command(version, about = "Gallop: pace and energy figures from past performances", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rank each race's field on its pace profiles and mark the winner
    Analyze {
        /// Past-performance CSV (overrides data.past_performances)
        #[arg(long)]
        field: Option<PathBuf>,

        /// Result chart CSV (overrides data.charts)
        #[arg(long)]
        charts: Option<PathBuf>,

        #[command(flatten)]
        analysis: AnalysisArgs,

        /// Output format (json, table)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Figures for every eligible prior start in a field
    Figures {
        /// Past-performance CSV (overrides data.past_performances)
        #[arg(long)]
        field: Option<PathBuf>,

        /// Only dirt sprints
        #[arg(long)]
        dirt_sprints: bool,

        #[command(flatten)]
        analysis: AnalysisArgs,

        /// Output format (json, table)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Estimated final time for every finisher in the result charts
    Speed {
        /// Result chart CSV (overrides data.charts)
        #[arg(long)]
        charts: Option<PathBuf>,

        /// Output format (json, table)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Actual against expected wins by post position
    PostPositions {
        /// Result chart CSV (overrides data.charts)
        #[arg(long)]
        charts: Option<PathBuf>,

        /// Output format (json, table)
        #[arg(short, long, default_value = "table")]
        format: String,
    },
}

/// Overrides for the analysis section of the config.
#[derive(Args, Debug, Default)]
pub struct AnalysisArgs {
    /// Average variant CSV (overrides data.variants)
    #[arg(long)]
    pub variants: Option<PathBuf>,

    /// Oldest race year counted (default: the race's own year)
    #[arg(long)]
    pub cutoff_year: Option<i32>,

    /// Require recorded 2f and 4f fractions
    #[arg(long)]
    pub strict: bool,

    /// Unrecorded figures as zero or placeholder
    #[arg(long)]
    pub sentinel: Option<String>,

    /// Average pace: mixed, three or two
    #[arg(long)]
    pub ap_mode: Option<String>,

    /// Only keep races on this course (DIRT, TURF, ...)
    #[arg(long)]
    pub surface: Option<String>,

    /// Scratched horses, comma separated
    #[arg(long, value_delimiter = ',')]
    pub scratches: Vec<String>,
}

impl AnalysisArgs {
    /// Apply the flags over the loaded config.
    fn apply(&self, config: &mut AppConfig) -> anyhow::Result<()> {
        if let Some(path) = &self.variants {
            config.data.variants = Some(path.to_string_lossy().to_string());
        }
        if let Some(year) = self.cutoff_year {
            config.analysis.cutoff_year = Some(year);
        }
        if self.strict {
            config.analysis.strict_fractions = true;
        }
        if let Some(s) = &self.sentinel {
            config.analysis.sentinel = match s.as_str() {
                "zero" => SentinelStyle::Zero,
                "placeholder" => SentinelStyle::Placeholder,
                other => bail!("Unknown sentinel style: {}", other),
            };
        }
        if let Some(m) = &self.ap_mode {
            config.analysis.ap_mode = match m.as_str() {
                "mixed" => AverageMode::Mixed,
                "three" => AverageMode::Three,
                "two" => AverageMode::Two,
                other => bail!("Unknown ap mode: {}", other),
            };
        }
        if let Some(s) = &self.surface {
            let course = Course::from_name(s).with_context(|| format!("Unknown surface: {}", s))?;
            config.analysis.surface = Some(course);
        }
        Ok(())
    }
}

fn resolve_path(
    flag: Option<PathBuf>,
    configured: &Option<String>,
    what: &str,
) -> anyhow::Result<PathBuf> {
    match flag.or_else(|| configured.as_ref().map(PathBuf::from)) {
        Some(path) => Ok(path),
        None => bail!("No {} file given (flag or config)", what),
    }
}

fn load_variants(config: &AppConfig) -> anyhow::Result<VariantTable> {
    match &config.data.variants {
        Some(path) => {
            tracing::info!("Loading average variants from: {}", path);
            VariantTable::from_csv(path).with_context(|| format!("reading {}", path))
        }
        None => {
            tracing::warn!(
                "No average variant file, using {} for every start",
                config.analysis.fallback_variant
            );
            Ok(VariantTable::default())
        }
    }
}

fn load_today(path: &Path, scratches: &[String]) -> anyhow::Result<Vec<FieldEntry>> {
    tracing::info!("Loading past performances from: {}", path.display());
    let field = load_field(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(remove_scratches(field, scratches))
}

/// Run the race analysis.
pub fn run_analyze(
    field: Option<PathBuf>,
    charts: Option<PathBuf>,
    analysis: AnalysisArgs,
    format: String,
) -> anyhow::Result<()> {
    let mut config = AppConfig::load()?;
    analysis.apply(&mut config)?;

    let field_path = resolve_path(field, &config.data.past_performances, "past-performance")?;
    let charts_path = resolve_path(charts, &config.data.charts, "chart")?;

    let field = load_today(&field_path, &analysis.scratches)?;
    tracing::info!("Loading charts from: {}", charts_path.display());
    let charts = load_charts(&charts_path)
        .with_context(|| format!("reading {}", charts_path.display()))?;
    let variants = load_variants(&config)?;

    let pipeline = PacePipeline::new(&config.analysis);
    let days = RaceDay::group(charts, field);
    tracing::info!("Analyzing {} race days", days.len());
    let table = RaceAssembler::new(&config.analysis).assemble(&days, &pipeline, &variants)?;

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&table.rows)?),
        "table" => report::print_analysis_table(&table),
        other => {
            eprintln!("Unknown format: {}. Using table.", other);
            report::print_analysis_table(&table);
        }
    }

    Ok(())
}

/// Print figures for each eligible start.
pub fn run_figures(
    field: Option<PathBuf>,
    dirt_sprints: bool,
    analysis: AnalysisArgs,
    format: String,
) -> anyhow::Result<()> {
    let mut config = AppConfig::load()?;
    analysis.apply(&mut config)?;

    let field_path = resolve_path(field, &config.data.past_performances, "past-performance")?;
    let field = load_today(&field_path, &analysis.scratches)?;
    let variants = load_variants(&config)?;

    let pipeline = PacePipeline::new(&config.analysis);
    let mut rows = figure_rows(&field, &pipeline, &variants)?;
    if dirt_sprints {
        rows = dirt_sprints_only(rows, config.analysis.sprint_threshold);
    }

    let sentinel = config.analysis.sentinel;
    match format.as_str() {
        "json" => println!(
            "{}",
            serde_json::to_string_pretty(&report::figure_rows_json(&rows, sentinel))?
        ),
        "table" => report::print_figure_rows(&rows, sentinel),
        other => {
            eprintln!("Unknown format: {}. Using table.", other);
            report::print_figure_rows(&rows, sentinel);
        }
    }

    Ok(())
}

/// Print final times from the result charts.
pub fn run_speed(charts: Option<PathBuf>, format: String) -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    let charts_path = resolve_path(charts, &config.data.charts, "chart")?;
    let charts = load_charts(&charts_path)
        .with_context(|| format!("reading {}", charts_path.display()))?;

    let rows: Vec<_> = charts.iter().flat_map(speed_table).collect();

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&rows)?),
        _ => report::print_speed_table(&rows),
    }

    Ok(())
}

/// Print the post-position summary.
pub fn run_post_positions(charts: Option<PathBuf>, format: String) -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    let charts_path = resolve_path(charts, &config.data.charts, "chart")?;
    let charts = load_charts(&charts_path)
        .with_context(|| format!("reading {}", charts_path.display()))?;

    let summary = summarize_post_positions(&charts);

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&summary)?),
        _ => report::print_post_positions(&summary),
    }

    Ok(())
}
