//! Final-time speed table from result charts.

use serde::Serialize;

use crate::pace::round_to;
use crate::types::{ChartRace, Course};

/// Seconds a beaten length is worth at the winner's average speed.
///
/// `furlongs * 660 / final_time` is feet per second; a length is ten feet.
pub fn time_of_beaten_length(furlongs: f64, final_time: f64) -> Option<f64> {
    if furlongs == 0.0 || final_time == 0.0 {
        return None;
    }
    Some(round_to(1.0 / (furlongs * 660.0 / final_time / 10.0), 2))
}

/// One finisher's estimated final time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeedRow {
    pub key: u64,
    pub class: String,
    pub distance: f64,
    pub surface: Option<Course>,
    pub track_condition: String,
    pub name: String,
    pub final_time: f64,
    pub finish: u32,
    pub winner: bool,
}

/// Final time for every finisher: the winner's time plus beaten lengths.
///
/// Races with no distance or final time give no rows.
pub fn speed_table(race: &ChartRace) -> Vec<SpeedRow> {
    let distance = race.distance.abs();
    let Some(per_length) = time_of_beaten_length(distance, race.final_time) else {
        tracing::warn!("No final time for race {}, skipping speed table", race.key());
        return Vec::new();
    };

    race.entries
        .iter()
        .map(|e| SpeedRow {
            key: race.key(),
            class: race.classification.clone(),
            distance,
            surface: race.course,
            track_condition: race.track_condition.clone(),
            name: e.name.clone(),
            final_time: round_to(per_length * e.finish_beaten_lengths + race.final_time, 2),
            finish: e.finish_position,
            winner: e.is_winner(),
        })
        .collect()
}
