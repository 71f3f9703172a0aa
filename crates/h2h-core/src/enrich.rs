// Pick enrichment: joins raw picks with the player reference table.
//
// This is the single place where missing upstream values are defaulted.
// Everything downstream (metrics, differentials, presentation) reads the
// enriched form and never has to second-guess a field.

use tracing::{debug, warn};

use crate::player::PlayerTable;
use crate::squad::{Chip, EnrichedPick, EnrichedSquad, Pick, SquadSnapshot, SQUAD_SIZE};

/// Name shown for players missing from the reference table.
pub const UNKNOWN_PLAYER_NAME: &str = "Unknown";

/// Enrich one pick. Never fails: an unknown player id gets placeholder
/// values instead of an error.
///
/// `index` is the pick's position in the source list and stands in for the
/// slot number when the source omitted it.
pub fn enrich_pick(pick: &Pick, index: usize, players: &PlayerTable) -> EnrichedPick {
    let slot = if pick.slot == 0 {
        u8::try_from(index + 1).unwrap_or(u8::MAX)
    } else {
        pick.slot
    };

    let reference = players.get(pick.element);
    if reference.is_none() {
        debug!("Player {} not found in reference table", pick.element);
    }

    EnrichedPick {
        player_id: pick.element,
        slot,
        multiplier: pick.multiplier,
        is_captain: pick.is_captain,
        is_vice_captain: pick.is_vice_captain,
        name: reference
            .map(|p| p.name.clone())
            .unwrap_or_else(|| UNKNOWN_PLAYER_NAME.to_string()),
        position: reference.and_then(|p| p.position),
        ownership_pct: reference.and_then(|p| p.ownership_pct),
        price: pick.selling_price.or(reference.map(|p| p.price)),
        points: pick.points.unwrap_or(0),
    }
}

/// Enrich a pick list. Output has the same length and order as the input.
pub fn enrich_picks(picks: &[Pick], players: &PlayerTable) -> Vec<EnrichedPick> {
    picks
        .iter()
        .enumerate()
        .map(|(i, pick)| enrich_pick(pick, i, players))
        .collect()
}

/// Enrich a whole snapshot, defaulting absent aggregates to zero.
pub fn enrich_squad(snapshot: &SquadSnapshot, players: &PlayerTable) -> EnrichedSquad {
    if snapshot.picks.len() != SQUAD_SIZE {
        warn!(
            "Manager {} {} has {} picks (expected {})",
            snapshot.manager_id,
            snapshot.gameweek,
            snapshot.picks.len(),
            SQUAD_SIZE
        );
    }

    let history = snapshot.entry_history.clone().unwrap_or_default();

    EnrichedSquad {
        manager_id: snapshot.manager_id,
        gameweek: snapshot.gameweek,
        picks: enrich_picks(&snapshot.picks, players),
        chip: snapshot.active_chip.as_deref().map(Chip::from_api),
        auto_subs: snapshot.automatic_subs.clone(),
        total_points: history.points.unwrap_or(0),
        transfers_made: history.event_transfers.unwrap_or(0),
        transfer_cost: history.event_transfers_cost.unwrap_or(0),
    }
}
