// Data source seam: where squads and the player reference table come from.

use async_trait::async_trait;
use h2h_core::gameweek::{Event, Gameweek};
use h2h_core::player::Player;
use h2h_core::squad::{ManagerId, SquadSnapshot};
use thiserror::Error;

/// A failed fetch. Any of these puts the view into its error state; the
/// comparison core never sees the partial data.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Season-wide reference data fetched once at startup.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    pub players: Vec<Player>,
    pub events: Vec<Event>,
}

/// Anything that can supply squads for a (manager, gameweek) pair.
///
/// Taking a `Gameweek` rather than a bare integer means an out-of-range
/// request cannot be expressed.
#[async_trait]
pub trait SquadSource: Send + Sync {
    async fn fetch_reference(&self) -> Result<ReferenceData, FetchError>;

    async fn fetch_squad(
        &self,
        manager_id: ManagerId,
        gameweek: Gameweek,
    ) -> Result<SquadSnapshot, FetchError>;
}
