// Differential resolution: players held by exactly one of two squads.
//
// Membership is decided by player id alone. Ownership percentage plays no
// part, so a widely owned player is still a differential when only one of
// the two managers holds him.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::player::PlayerId;
use crate::squad::{EnrichedPick, EnrichedSquad};

/// Squad differences between manager A and manager B.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Differential {
    /// A's picks whose player B does not hold, in A's slot order.
    pub only_a: Vec<EnrichedPick>,
    /// B's picks whose player A does not hold, in B's slot order.
    pub only_b: Vec<EnrichedPick>,
    /// Points scored by `only_a`.
    pub only_a_points: i32,
    /// Points scored by `only_b`.
    pub only_b_points: i32,
    /// Number of A's picks whose player B also holds.
    pub shared_count: usize,
    /// Whether the two managers captained different players (or only one
    /// named a captain).
    pub captain_differs: bool,
}

impl Differential {
    /// Net differential impact from A's point of view.
    pub fn net_impact(&self) -> i32 {
        self.only_a_points - self.only_b_points
    }
}

/// Picks of `squad` whose player is not in `other`, ordered by slot. The
/// sort is stable, so picks sharing a slot keep their list order.
fn exclusive(squad: &EnrichedSquad, other: &HashSet<PlayerId>) -> Vec<EnrichedPick> {
    let mut picks: Vec<EnrichedPick> = squad
        .picks
        .iter()
        .filter(|p| !other.contains(&p.player_id))
        .cloned()
        .collect();
    picks.sort_by_key(|p| p.slot);
    picks
}

/// Compute the differential between two enriched squads.
pub fn resolve_differentials(a: &EnrichedSquad, b: &EnrichedSquad) -> Differential {
    let a_ids = a.player_ids();
    let b_ids = b.player_ids();

    let only_a = exclusive(a, &b_ids);
    let only_b = exclusive(b, &a_ids);

    let captain_differs =
        a.captain().map(|p| p.player_id) != b.captain().map(|p| p.player_id);

    Differential {
        only_a_points: only_a.iter().map(|p| p.points).sum(),
        only_b_points: only_b.iter().map(|p| p.points).sum(),
        shared_count: a.picks.len() - only_a.len(),
        only_a,
        only_b,
        captain_differs,
    }
}
