// Message types exchanged between the event loop, fetch tasks, and the
// front end.

use std::sync::Arc;

use h2h_core::gameweek::Gameweek;
use h2h_core::presenter::ComparisonResult;
use h2h_core::squad::{ManagerId, SquadSnapshot};

/// Commands sent from the front end to the event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    /// Step the selected gameweek by the given delta.
    Advance(i32),
    /// Select a gameweek directly.
    JumpTo(Gameweek),
    /// Compare a different pair of managers.
    SetManagers { a: ManagerId, b: ManagerId },
    /// Refetch the current selection, bypassing the cache.
    Refresh,
    Quit,
}

impl UserCommand {
    /// Parse one line of console input.
    ///
    /// Accepted forms: `n`/`next`, `p`/`prev`, `g <gw>`, `m <a> <b>`,
    /// `r`/`refresh`, `q`/`quit`. Anything else yields `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let head = parts.next()?.to_lowercase();
        let args: Vec<&str> = parts.collect();

        match (head.as_str(), args.as_slice()) {
            ("n" | "next", []) => Some(UserCommand::Advance(1)),
            ("p" | "prev", []) => Some(UserCommand::Advance(-1)),
            ("g" | "gw", [n]) => {
                let gw = n.parse::<u8>().ok()?;
                Gameweek::new(gw).ok().map(UserCommand::JumpTo)
            }
            ("m" | "managers", [a, b]) => {
                let a = a.parse::<ManagerId>().ok().filter(|&id| id > 0)?;
                let b = b.parse::<ManagerId>().ok().filter(|&id| id > 0)?;
                Some(UserCommand::SetManagers { a, b })
            }
            ("r" | "refresh", []) => Some(UserCommand::Refresh),
            ("q" | "quit", []) => Some(UserCommand::Quit),
            _ => None,
        }
    }
}

/// What the view is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Loading,
    Ready,
    Error,
}

/// Updates pushed from the event loop to the front end.
#[derive(Debug, Clone)]
pub enum UiUpdate {
    Loading { gameweek: Gameweek },
    Ready(Arc<ComparisonResult>),
    Error { gameweek: Gameweek, message: String },
}

/// Completion of a fetch task. `generation` identifies the request so the
/// loop can drop responses that were overtaken by a newer selection.
#[derive(Debug)]
pub enum FetchEvent {
    Loaded {
        generation: u64,
        gameweek: Gameweek,
        squad_a: SquadSnapshot,
        squad_b: SquadSnapshot,
    },
    Failed {
        generation: u64,
        gameweek: Gameweek,
        message: String,
    },
}

impl FetchEvent {
    pub fn generation(&self) -> u64 {
        match self {
            FetchEvent::Loaded { generation, .. } => *generation,
            FetchEvent::Failed { generation, .. } => *generation,
        }
    }
}
