// Gameweek index, bounds-checked navigation, and current-gameweek detection.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const FIRST_GAMEWEEK: u8 = 1;
pub const LAST_GAMEWEEK: u8 = 38;

/// A gameweek index guaranteed to lie in `FIRST_GAMEWEEK..=LAST_GAMEWEEK`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Gameweek(u8);

impl Gameweek {
    pub const FIRST: Gameweek = Gameweek(FIRST_GAMEWEEK);
    pub const LAST: Gameweek = Gameweek(LAST_GAMEWEEK);

    pub fn new(value: u8) -> Result<Self, CoreError> {
        Self::checked(value as i64)
    }

    /// Validate an arbitrary integer (e.g. `current + delta`).
    pub fn checked(value: i64) -> Result<Self, CoreError> {
        if (FIRST_GAMEWEEK as i64..=LAST_GAMEWEEK as i64).contains(&value) {
            Ok(Gameweek(value as u8))
        } else {
            Err(CoreError::GameweekOutOfRange {
                value,
                min: FIRST_GAMEWEEK,
                max: LAST_GAMEWEEK,
            })
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// The gameweek `delta` steps away, or `None` if that leaves the season.
    pub fn offset(self, delta: i32) -> Option<Gameweek> {
        Gameweek::checked(self.0 as i64 + delta as i64).ok()
    }
}

impl TryFrom<u8> for Gameweek {
    type Error = CoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Gameweek::new(value)
    }
}

impl From<Gameweek> for u8 {
    fn from(gw: Gameweek) -> u8 {
        gw.0
    }
}

impl fmt::Display for Gameweek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GW{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Navigator
// ---------------------------------------------------------------------------

/// Stepper over the valid gameweek range.
///
/// `advance` returns the new gameweek when the selection changed; the caller
/// treats that as the signal to refetch both managers' squads. Out-of-range
/// proposals leave the state untouched and return `None`, so an invalid
/// gameweek can never be requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameweekNavigator {
    current: Gameweek,
}

impl GameweekNavigator {
    pub fn new(start: Gameweek) -> Self {
        GameweekNavigator { current: start }
    }

    pub fn current(&self) -> Gameweek {
        self.current
    }

    /// Move by `delta` gameweeks. No-op (returns `None`) when the target is
    /// outside the season or `delta` is zero.
    pub fn advance(&mut self, delta: i32) -> Option<Gameweek> {
        let next = self.current.offset(delta)?;
        self.jump_to(next)
    }

    /// Select `target` directly. Returns `None` if it is already selected.
    pub fn jump_to(&mut self, target: Gameweek) -> Option<Gameweek> {
        if target == self.current {
            return None;
        }
        self.current = target;
        Some(target)
    }
}

// ---------------------------------------------------------------------------
// Current gameweek detection
// ---------------------------------------------------------------------------

/// One scheduled round as listed in the reference data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: u8,
    #[serde(default)]
    pub deadline_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_current: bool,
    #[serde(default)]
    pub finished: bool,
}

/// Pick the gameweek a fresh session should open on.
///
/// Preference order: the event flagged current, then the latest event that
/// has started (finished, or deadline passed at `now`), then the first
/// gameweek. A finished event counts even when its deadline is missing.
pub fn current_gameweek(events: &[Event], now: DateTime<Utc>) -> Gameweek {
    let flagged = events
        .iter()
        .filter(|e| e.is_current)
        .find_map(|e| Gameweek::new(e.id).ok());
    if let Some(gw) = flagged {
        return gw;
    }

    events
        .iter()
        .filter(|e| e.finished || e.deadline_time.is_some_and(|d| d <= now))
        .filter_map(|e| Gameweek::new(e.id).ok())
        .max()
        .unwrap_or(Gameweek::FIRST)
}
