// Squad snapshot types: raw picks as fetched, and their enriched form.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::gameweek::Gameweek;
use crate::player::{tenths_to_millions, PlayerId, Position};

/// Upstream manager (entry) identifier.
pub type ManagerId = u64;

/// Number of picks in a complete squad.
pub const SQUAD_SIZE: usize = 15;

/// Highest slot number belonging to the starting XI.
pub const STARTING_XI: u8 = 11;

// ---------------------------------------------------------------------------
// Chips
// ---------------------------------------------------------------------------

/// One-time gameweek modifier a manager can activate.
///
/// Identifiers the engine does not know yet are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Chip {
    Wildcard,
    FreeHit,
    BenchBoost,
    TripleCaptain,
    AssistantManager,
    Other(String),
}

impl Chip {
    pub fn from_api(id: &str) -> Self {
        match id {
            "wildcard" => Chip::Wildcard,
            "freehit" => Chip::FreeHit,
            "bboost" => Chip::BenchBoost,
            "3xc" => Chip::TripleCaptain,
            "manager" => Chip::AssistantManager,
            other => Chip::Other(other.to_string()),
        }
    }

    /// The identifier used by the upstream API.
    pub fn api_id(&self) -> &str {
        match self {
            Chip::Wildcard => "wildcard",
            Chip::FreeHit => "freehit",
            Chip::BenchBoost => "bboost",
            Chip::TripleCaptain => "3xc",
            Chip::AssistantManager => "manager",
            Chip::Other(id) => id,
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &str {
        match self {
            Chip::Wildcard => "Wildcard",
            Chip::FreeHit => "Free Hit",
            Chip::BenchBoost => "Bench Boost",
            Chip::TripleCaptain => "Triple Captain",
            Chip::AssistantManager => "Assistant Manager",
            Chip::Other(id) => id,
        }
    }
}

impl From<String> for Chip {
    fn from(id: String) -> Self {
        Chip::from_api(&id)
    }
}

impl From<Chip> for String {
    fn from(chip: Chip) -> String {
        chip.api_id().to_string()
    }
}

impl fmt::Display for Chip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ---------------------------------------------------------------------------
// Raw snapshot
// ---------------------------------------------------------------------------

/// A single squad selection as delivered by the data source.
///
/// Every field past `element` may be missing in third-party payloads, so all
/// of them default instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pick {
    /// Player id.
    pub element: PlayerId,
    /// Slot order, 1-15. Zero means the source omitted it.
    #[serde(default, rename = "position")]
    pub slot: u8,
    #[serde(default)]
    pub multiplier: u8,
    #[serde(default)]
    pub is_captain: bool,
    #[serde(default)]
    pub is_vice_captain: bool,
    /// Selling price in tenths of a million.
    #[serde(default)]
    pub selling_price: Option<u32>,
    /// Gameweek points for this player, resolved by the data source.
    #[serde(default)]
    pub points: Option<i32>,
}

/// A bench player promoted into the XI after a starter did not play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoSub {
    pub element_in: PlayerId,
    pub element_out: PlayerId,
}

/// Aggregate gameweek record for one manager.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryHistory {
    #[serde(default)]
    pub points: Option<i32>,
    #[serde(default)]
    pub event_transfers: Option<u32>,
    #[serde(default)]
    pub event_transfers_cost: Option<i32>,
}

/// One manager's squad for one gameweek, exactly as fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SquadSnapshot {
    pub manager_id: ManagerId,
    pub gameweek: Gameweek,
    #[serde(default)]
    pub picks: Vec<Pick>,
    #[serde(default)]
    pub active_chip: Option<String>,
    #[serde(default)]
    pub automatic_subs: Vec<AutoSub>,
    #[serde(default)]
    pub entry_history: Option<EntryHistory>,
}

// ---------------------------------------------------------------------------
// Enriched snapshot
// ---------------------------------------------------------------------------

/// A pick joined with reference data; every optional number already
/// defaulted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedPick {
    pub player_id: PlayerId,
    pub slot: u8,
    pub multiplier: u8,
    pub is_captain: bool,
    pub is_vice_captain: bool,
    pub name: String,
    pub position: Option<Position>,
    pub ownership_pct: Option<f64>,
    /// Selling price if recorded, else the current reference price, in
    /// tenths of a million. `None` only for unknown players with no
    /// recorded price.
    pub price: Option<u32>,
    pub points: i32,
}

impl EnrichedPick {
    pub fn is_starter(&self) -> bool {
        self.slot <= STARTING_XI
    }

    pub fn is_bench(&self) -> bool {
        !self.is_starter()
    }

    pub fn price_millions(&self) -> Option<f64> {
        self.price.map(tenths_to_millions)
    }
}

/// One manager's squad after enrichment: the form every calculator consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedSquad {
    pub manager_id: ManagerId,
    pub gameweek: Gameweek,
    pub picks: Vec<EnrichedPick>,
    pub chip: Option<Chip>,
    pub auto_subs: Vec<AutoSub>,
    pub total_points: i32,
    pub transfers_made: u32,
    pub transfer_cost: i32,
}

impl EnrichedSquad {
    pub fn starters(&self) -> impl Iterator<Item = &EnrichedPick> {
        self.picks.iter().filter(|p| p.is_starter())
    }

    pub fn bench(&self) -> impl Iterator<Item = &EnrichedPick> {
        self.picks.iter().filter(|p| p.is_bench())
    }

    pub fn captain(&self) -> Option<&EnrichedPick> {
        self.picks.iter().find(|p| p.is_captain)
    }

    pub fn vice_captain(&self) -> Option<&EnrichedPick> {
        self.picks.iter().find(|p| p.is_vice_captain)
    }

    pub fn pick(&self, player_id: PlayerId) -> Option<&EnrichedPick> {
        self.picks.iter().find(|p| p.player_id == player_id)
    }

    pub fn player_ids(&self) -> HashSet<PlayerId> {
        self.picks.iter().map(|p| p.player_id).collect()
    }

    /// Whether `player_id` was promoted from the bench by an auto-sub.
    pub fn was_subbed_in(&self, player_id: PlayerId) -> bool {
        self.auto_subs.iter().any(|s| s.element_in == player_id)
    }
}
