//! Table and JSON output for the CLI.

use serde_json::json;

use crate::assemble::AnalysisTable;
use crate::config::SentinelStyle;
use crate::figures::FigureRow;
use crate::pace::{Figure, PaceFigures};
use crate::post_position::PostPositionSummary;
use crate::speed::SpeedRow;

/// Figure cells in [`Figure::RANKED`] order, then energy.
pub fn figure_cells(figures: &PaceFigures, sentinel: SentinelStyle) -> Vec<String> {
    Figure::RANKED
        .iter()
        .map(|&f| sentinel.display(figures.get(f), figures.recorded, 2))
        .chain(std::iter::once(sentinel.display(
            figures.energy,
            figures.recorded,
            4,
        )))
        .collect()
}

/// Figure rows as JSON, with unrecorded figures rendered per `sentinel`.
pub fn figure_rows_json(rows: &[FigureRow], sentinel: SentinelStyle) -> serde_json::Value {
    let rows: Vec<_> = rows
        .iter()
        .map(|r| {
            let mut figures = serde_json::Map::new();
            for figure in Figure::RANKED.iter().chain(std::iter::once(&Figure::Energy)) {
                figures.insert(
                    figure.name().to_string(),
                    sentinel.json(r.figures.get(*figure), r.figures.recorded),
                );
            }
            json!({
                "race_number": r.race_number,
                "program_number": r.program_number,
                "name": r.name,
                "date": r.date,
                "track_code": r.track_code,
                "furlongs": r.furlongs,
                "course": r.course,
                "average_variant": r.average_variant,
                "track_variant": r.track_variant,
                "winner": r.winner,
                "adjusted": r.adjusted,
                "figures": figures,
            })
        })
        .collect();
    serde_json::Value::Array(rows)
}

pub fn print_analysis_table(table: &AnalysisTable) {
    println!("=== Race Analysis ===");
    println!();
    println!("  Races:   {}", table.num_races());
    println!("  Horses:  {}", table.len());
    println!();

    if table.is_empty() {
        return;
    }

    println!("Winners ranked first:");
    for figure in Figure::RANKED {
        println!(
            "  {:8} {:>6.1}%",
            figure.name(),
            table.top_rank_win_rate(figure) * 100.0
        );
    }
    println!();

    println!(
        "  {:>10} {:>4} {:24} {:>7} {:>7} {:>7} {:>7} {:>7} {:>7} {:>7} {:>7}",
        "Key", "PN", "Name", "F1", "F2", "F3", "EP", "SP", "AP", "FX", "Energy"
    );
    println!("  {}", "-".repeat(106));
    for row in &table.rows {
        let p = &row.profile;
        println!(
            "  {:>10} {:>4} {:24} {:>7.2} {:>7.2} {:>7.2} {:>7.2} {:>7.2} {:>7.2} {:>7.2} {:>7.2}{}",
            row.key,
            row.program_number,
            row.name,
            p.f1,
            p.f2,
            p.f3,
            p.ep,
            p.sp,
            p.ap,
            p.fx,
            p.energy,
            if row.winner { "  *" } else { "" }
        );
    }
}

pub fn print_figure_rows(rows: &[FigureRow], sentinel: SentinelStyle) {
    println!("=== Pace Figures ===");
    println!();
    println!(
        "  {:>4} {:24} {:>8} {:>5} {:>6} {:18} {:>7} {:>7} {:>7} {:>7} {:>7} {:>7} {:>7} {:>7}",
        "PN", "Name", "Date", "Trk", "Dist", "Course", "F1", "F2", "F3", "EP", "SP", "AP", "FX",
        "Energy"
    );
    println!("  {}", "-".repeat(136));
    for row in rows {
        let cells: Vec<String> = figure_cells(&row.figures, sentinel)
            .into_iter()
            .map(|c| format!("{:>7}", c))
            .collect();
        println!(
            "  {:>4} {:24} {:>8} {:>5} {:>6.2} {:18} {}",
            row.program_number,
            row.name,
            row.date,
            row.track_code,
            row.furlongs,
            row.course.map(|c| c.name()).unwrap_or("?"),
            cells.join(" ")
        );
    }
}

pub fn print_speed_table(rows: &[SpeedRow]) {
    println!("=== Final Times ===");
    println!();
    println!(
        "  {:>10} {:16} {:>5} {:18} {:>4} {:24} {:>8} {:>6}",
        "Key", "Class", "Dist", "Surface", "Cond", "Name", "Time", "Finish"
    );
    println!("  {}", "-".repeat(102));
    for row in rows {
        println!(
            "  {:>10} {:16} {:>5.1} {:18} {:>4} {:24} {:>8.2} {:>6}",
            row.key,
            row.class,
            row.distance,
            row.surface.map(|c| c.name()).unwrap_or("?"),
            row.track_condition,
            row.name,
            row.final_time,
            row.finish
        );
    }
}

pub fn print_post_positions(summary: &[PostPositionSummary]) {
    println!("=== Post Positions ===");
    println!();
    println!(
        "  {:>4} {:>8} {:>9} {:>7} {:>9} {:>6}",
        "Post", "Starters", "Expected", "Actual", "Variance", "CDF"
    );
    println!("  {}", "-".repeat(48));
    for pp in summary {
        println!(
            "  {:>4} {:>8} {:>9.2} {:>7} {:>9.2} {:>6}",
            pp.post_position,
            pp.starters,
            pp.expected_wins,
            pp.actual_wins,
            pp.variance,
            pp.cdf.map(|c| format!("{:.2}", c)).unwrap_or_else(|| "-".to_string())
        );
    }
}
