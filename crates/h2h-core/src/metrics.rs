// Per-squad performance metrics.

use serde::{Deserialize, Serialize};

use crate::squad::{Chip, EnrichedSquad};

/// Aggregate figures for one manager's gameweek.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    /// Gameweek total as reported in the entry history.
    pub total_points: i32,
    /// Sum over slots 1-11.
    pub starting_points: i32,
    /// Sum over slots 12-15.
    pub bench_points: i32,
    pub captain_points: i32,
    pub captain_multiplier: u8,
    pub captain_name: Option<String>,
    pub vice_captain_points: i32,
    /// Points of bench players promoted by auto-substitution.
    pub autosub_points: i32,
    pub chip_used: Option<Chip>,
    pub transfers_made: u32,
    pub transfer_cost: i32,
}

/// Derive metrics from an enriched squad.
///
/// Pure: the same squad always yields the same metrics.
pub fn compute_metrics(squad: &EnrichedSquad) -> Metrics {
    let starting_points = squad.starters().map(|p| p.points).sum();
    let bench_points = squad.bench().map(|p| p.points).sum();

    let captain = squad.captain();
    let autosub_points = squad
        .auto_subs
        .iter()
        .filter_map(|sub| squad.pick(sub.element_in))
        .map(|p| p.points)
        .sum();

    Metrics {
        total_points: squad.total_points,
        starting_points,
        bench_points,
        captain_points: captain.map(|p| p.points).unwrap_or(0),
        captain_multiplier: captain.map(|p| p.multiplier).unwrap_or(0),
        captain_name: captain.map(|p| p.name.clone()),
        vice_captain_points: squad.vice_captain().map(|p| p.points).unwrap_or(0),
        autosub_points,
        chip_used: squad.chip.clone(),
        transfers_made: squad.transfers_made,
        transfer_cost: squad.transfer_cost,
    }
}

/// One flag per pick, in pick order: was this player auto-subbed in?
pub fn auto_sub_flags(squad: &EnrichedSquad) -> Vec<bool> {
    squad
        .picks
        .iter()
        .map(|p| squad.was_subbed_in(p.player_id))
        .collect()
}
