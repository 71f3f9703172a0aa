// Player reference data: positions, players, and the id-indexed lookup table.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Upstream player identifier (the `element` id).
pub type PlayerId = u32;

// ---------------------------------------------------------------------------
// Upstream element type constants
// ---------------------------------------------------------------------------

pub const ELEMENT_TYPE_GKP: u8 = 1;
pub const ELEMENT_TYPE_DEF: u8 = 2;
pub const ELEMENT_TYPE_MID: u8 = 3;
pub const ELEMENT_TYPE_FWD: u8 = 4;

/// Football positions a squad member can hold.
///
/// Serialized as the short code ("GKP", "DEF", "MID", "FWD"); decoding goes
/// through `from_code`, so "GK" and any casing are accepted too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Position {
    Goalkeeper,
    Defender,
    Midfielder,
    Forward,
}

impl Position {
    /// Parse a position code into a Position.
    ///
    /// Accepts the short codes used by the game ("GKP", "DEF", "MID", "FWD")
    /// plus the common "GK" spelling. Case-insensitive.
    pub fn from_code(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "GKP" | "GK" => Some(Position::Goalkeeper),
            "DEF" => Some(Position::Defender),
            "MID" => Some(Position::Midfielder),
            "FWD" => Some(Position::Forward),
            _ => None,
        }
    }

    /// Map the upstream numeric `element_type` to a Position.
    pub fn from_element_type(element_type: u8) -> Option<Self> {
        match element_type {
            ELEMENT_TYPE_GKP => Some(Position::Goalkeeper),
            ELEMENT_TYPE_DEF => Some(Position::Defender),
            ELEMENT_TYPE_MID => Some(Position::Midfielder),
            ELEMENT_TYPE_FWD => Some(Position::Forward),
            _ => None,
        }
    }

    /// Return the short display code for this position.
    pub fn code(&self) -> &'static str {
        match self {
            Position::Goalkeeper => "GKP",
            Position::Defender => "DEF",
            Position::Midfielder => "MID",
            Position::Forward => "FWD",
        }
    }
}

impl TryFrom<String> for Position {
    type Error = String;

    fn try_from(code: String) -> Result<Self, Self::Error> {
        Position::from_code(&code).ok_or_else(|| format!("unknown position code `{code}`"))
    }
}

impl From<Position> for String {
    fn from(pos: Position) -> String {
        pos.code().to_string()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Convert a price in tenths of a million (upstream unit) to millions.
pub fn tenths_to_millions(tenths: u32) -> f64 {
    tenths as f64 / 10.0
}

/// One row of the competition-wide player reference table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    /// Short display name (e.g. "Salah").
    pub name: String,
    pub position: Option<Position>,
    /// Percentage of all managers selecting this player, if reported.
    #[serde(default)]
    pub ownership_pct: Option<f64>,
    /// Current price in tenths of a million.
    pub price: u32,
}

impl Player {
    pub fn price_millions(&self) -> f64 {
        tenths_to_millions(self.price)
    }
}

/// Id-indexed view over the player reference table.
///
/// Built once per season load and shared read-only between fetches.
#[derive(Debug, Clone, Default)]
pub struct PlayerTable {
    players: HashMap<PlayerId, Player>,
}

impl PlayerTable {
    /// Index the given players by id. A later duplicate id replaces an
    /// earlier one.
    pub fn new(players: Vec<Player>) -> Self {
        let players = players.into_iter().map(|p| (p.id, p)).collect();
        PlayerTable { players }
    }

    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

impl FromIterator<Player> for PlayerTable {
    fn from_iter<I: IntoIterator<Item = Player>>(iter: I) -> Self {
        PlayerTable::new(iter.into_iter().collect())
    }
}
