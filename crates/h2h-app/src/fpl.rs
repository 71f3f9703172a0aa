// HTTP data source for the public fantasy game API.
//
// Three endpoints are used: bootstrap-static (players and events), the
// per-entry picks endpoint, and the per-gameweek live endpoint, whose
// per-player points are merged into each pick. Decoding is permissive:
// absent arrays become empty and absent numbers become `None`.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use h2h_core::gameweek::{Event, Gameweek};
use h2h_core::player::{Player, PlayerId, Position};
use h2h_core::squad::{AutoSub, EntryHistory, ManagerId, Pick, SquadSnapshot};
use reqwest::header::USER_AGENT;
use serde::Deserialize;
use tracing::debug;

use crate::config::ApiConfig;
use crate::source::{FetchError, ReferenceData, SquadSource};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct BootstrapResponse {
    #[serde(default)]
    elements: Vec<ElementRow>,
    #[serde(default)]
    events: Vec<Event>,
}

#[derive(Debug, Deserialize)]
struct ElementRow {
    id: PlayerId,
    #[serde(default)]
    web_name: String,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    second_name: String,
    #[serde(default)]
    element_type: u8,
    /// Reported as a decimal string, e.g. "23.4".
    #[serde(default)]
    selected_by_percent: Option<String>,
    #[serde(default)]
    now_cost: u32,
}

impl ElementRow {
    fn into_player(self) -> Player {
        let name = if self.web_name.trim().is_empty() {
            format!("{} {}", self.first_name, self.second_name)
                .trim()
                .to_string()
        } else {
            self.web_name
        };

        Player {
            id: self.id,
            name,
            position: Position::from_element_type(self.element_type),
            ownership_pct: self
                .selected_by_percent
                .as_deref()
                .and_then(|s| s.trim().parse::<f64>().ok()),
            price: self.now_cost,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PicksResponse {
    #[serde(default)]
    active_chip: Option<String>,
    #[serde(default)]
    automatic_subs: Vec<AutoSub>,
    #[serde(default)]
    entry_history: Option<EntryHistory>,
    #[serde(default)]
    picks: Vec<Pick>,
}

#[derive(Debug, Deserialize)]
struct LiveResponse {
    #[serde(default)]
    elements: Vec<LiveElement>,
}

#[derive(Debug, Deserialize)]
struct LiveElement {
    id: PlayerId,
    #[serde(default)]
    stats: LiveStats,
}

#[derive(Debug, Default, Deserialize)]
struct LiveStats {
    #[serde(default)]
    total_points: Option<i32>,
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Decode a bootstrap-static body into reference data.
pub fn parse_bootstrap(body: &str) -> Result<ReferenceData, serde_json::Error> {
    let resp: BootstrapResponse = serde_json::from_str(body)?;
    Ok(ReferenceData {
        players: resp.elements.into_iter().map(ElementRow::into_player).collect(),
        events: resp.events,
    })
}

/// Decode a picks body for one manager and gameweek.
pub fn parse_picks(
    body: &str,
    manager_id: ManagerId,
    gameweek: Gameweek,
) -> Result<SquadSnapshot, serde_json::Error> {
    let resp: PicksResponse = serde_json::from_str(body)?;
    Ok(SquadSnapshot {
        manager_id,
        gameweek,
        picks: resp.picks,
        active_chip: resp.active_chip,
        automatic_subs: resp.automatic_subs,
        entry_history: resp.entry_history,
    })
}

/// Decode a live body into per-player gameweek points. Players without a
/// reported total are left out.
pub fn parse_live_points(body: &str) -> Result<HashMap<PlayerId, i32>, serde_json::Error> {
    let resp: LiveResponse = serde_json::from_str(body)?;
    Ok(resp
        .elements
        .into_iter()
        .filter_map(|e| e.stats.total_points.map(|pts| (e.id, pts)))
        .collect())
}

/// Fill in each pick's points from live data. Points already present on a
/// pick are kept.
pub fn apply_live_points(snapshot: &mut SquadSnapshot, live: &HashMap<PlayerId, i32>) {
    for pick in &mut snapshot.picks {
        if pick.points.is_none() {
            pick.points = live.get(&pick.element).copied();
        }
    }
}

// ---------------------------------------------------------------------------
// FplClient
// ---------------------------------------------------------------------------

/// `SquadSource` backed by the public HTTP API.
pub struct FplClient {
    http: reqwest::Client,
    base_url: String,
    user_agent: String,
}

impl FplClient {
    pub fn from_config(api: &ApiConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(api.timeout_secs))
            .build()
            .context("failed to build http client")?;
        Ok(FplClient {
            http,
            base_url: api.base_url.trim_end_matches('/').to_string(),
            user_agent: api.user_agent.clone(),
        })
    }

    pub fn bootstrap_url(&self) -> String {
        format!("{}/bootstrap-static/", self.base_url)
    }

    pub fn picks_url(&self, manager_id: ManagerId, gameweek: Gameweek) -> String {
        format!(
            "{}/entry/{}/event/{}/picks/",
            self.base_url,
            manager_id,
            gameweek.get()
        )
    }

    pub fn live_url(&self, gameweek: Gameweek) -> String {
        format!("{}/event/{}/live/", self.base_url, gameweek.get())
    }

    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        debug!("GET {url}");
        let resp = self
            .http
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(|source| FetchError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        resp.text().await.map_err(|source| FetchError::Http {
            url: url.to_string(),
            source,
        })
    }
}

fn decode_err(url: &str) -> impl FnOnce(serde_json::Error) -> FetchError + '_ {
    move |source| FetchError::Decode {
        url: url.to_string(),
        source,
    }
}

#[async_trait]
impl SquadSource for FplClient {
    async fn fetch_reference(&self) -> Result<ReferenceData, FetchError> {
        let url = self.bootstrap_url();
        let body = self.get_text(&url).await?;
        let data = parse_bootstrap(&body).map_err(decode_err(&url))?;
        debug!(
            players = data.players.len(),
            events = data.events.len(),
            "reference data loaded"
        );
        Ok(data)
    }

    async fn fetch_squad(
        &self,
        manager_id: ManagerId,
        gameweek: Gameweek,
    ) -> Result<SquadSnapshot, FetchError> {
        let picks_url = self.picks_url(manager_id, gameweek);
        let live_url = self.live_url(gameweek);

        let (picks_body, live_body) =
            tokio::try_join!(self.get_text(&picks_url), self.get_text(&live_url))?;

        let mut snapshot =
            parse_picks(&picks_body, manager_id, gameweek).map_err(decode_err(&picks_url))?;
        let live = parse_live_points(&live_body).map_err(decode_err(&live_url))?;
        apply_live_points(&mut snapshot, &live);

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gw(n: u8) -> Gameweek {
        Gameweek::new(n).unwrap()
    }

    const BOOTSTRAP: &str = r#"{
        "events": [
            {"id": 1, "name": "Gameweek 1", "deadline_time": "2025-08-15T17:30:00Z",
             "finished": true, "is_current": false, "is_next": false},
            {"id": 2, "name": "Gameweek 2", "deadline_time": "2025-08-22T17:30:00Z",
             "finished": false, "is_current": true, "is_next": false}
        ],
        "elements": [
            {"id": 1, "web_name": "Raya", "first_name": "David", "second_name": "Raya",
             "element_type": 1, "selected_by_percent": "23.4", "now_cost": 55, "team": 1},
            {"id": 2, "web_name": "", "first_name": "Mo", "second_name": "Salah",
             "element_type": 3, "selected_by_percent": "n/a", "now_cost": 145},
            {"id": 3}
        ],
        "element_types": []
    }"#;

    const PICKS: &str = r#"{
        "active_chip": "3xc",
        "automatic_subs": [{"entry": 99, "element_in": 12, "element_out": 4, "event": 2}],
        "entry_history": {"event": 2, "points": 71, "total_points": 140, "rank": 5000,
                          "event_transfers": 1, "event_transfers_cost": 4, "points_on_bench": 3},
        "picks": [
            {"element": 1, "position": 1, "multiplier": 1, "is_captain": false, "is_vice_captain": false, "element_type": 1},
            {"element": 2, "position": 2, "multiplier": 3, "is_captain": true, "is_vice_captain": false, "element_type": 3},
            {"element": 12, "position": 12, "multiplier": 0, "is_captain": false, "is_vice_captain": true, "element_type": 2}
        ]
    }"#;

    const LIVE: &str = r#"{
        "elements": [
            {"id": 1, "stats": {"minutes": 90, "total_points": 6}},
            {"id": 2, "stats": {"minutes": 90, "total_points": 13}},
            {"id": 12, "stats": {"minutes": 30, "total_points": -1}},
            {"id": 40, "stats": {"minutes": 0}}
        ]
    }"#;

    #[test]
    fn bootstrap_parses_players_and_events() {
        let data = parse_bootstrap(BOOTSTRAP).unwrap();
        assert_eq!(data.players.len(), 3);
        assert_eq!(data.events.len(), 2);
        assert!(data.events[1].is_current);

        let raya = &data.players[0];
        assert_eq!(raya.name, "Raya");
        assert_eq!(raya.position, Some(Position::Goalkeeper));
        assert_eq!(raya.ownership_pct, Some(23.4));
        assert_eq!(raya.price, 55);
    }

    #[test]
    fn bootstrap_falls_back_to_full_name_and_tolerates_bad_ownership() {
        let data = parse_bootstrap(BOOTSTRAP).unwrap();
        let salah = &data.players[1];
        assert_eq!(salah.name, "Mo Salah");
        assert_eq!(salah.ownership_pct, None);
        assert_eq!(salah.position, Some(Position::Midfielder));

        let bare = &data.players[2];
        assert_eq!(bare.name, "");
        assert_eq!(bare.position, None);
        assert_eq!(bare.price, 0);
    }

    #[test]
    fn bootstrap_with_missing_arrays_is_empty() {
        let data = parse_bootstrap("{}").unwrap();
        assert!(data.players.is_empty());
        assert!(data.events.is_empty());
    }

    #[test]
    fn picks_parse_into_snapshot() {
        let snap = parse_picks(PICKS, 99, gw(2)).unwrap();
        assert_eq!(snap.manager_id, 99);
        assert_eq!(snap.gameweek, gw(2));
        assert_eq!(snap.picks.len(), 3);
        assert_eq!(snap.picks[1].slot, 2);
        assert!(snap.picks[1].is_captain);
        assert_eq!(snap.active_chip.as_deref(), Some("3xc"));
        assert_eq!(snap.automatic_subs[0].element_in, 12);
        let history = snap.entry_history.unwrap();
        assert_eq!(history.points, Some(71));
        assert_eq!(history.event_transfers_cost, Some(4));
    }

    #[test]
    fn picks_with_missing_sections_default() {
        let snap = parse_picks(r#"{"picks": []}"#, 1, gw(1)).unwrap();
        assert!(snap.automatic_subs.is_empty());
        assert!(snap.entry_history.is_none());
        assert!(snap.active_chip.is_none());
    }

    #[test]
    fn picks_with_null_chip() {
        let snap = parse_picks(r#"{"active_chip": null, "picks": []}"#, 1, gw(1)).unwrap();
        assert!(snap.active_chip.is_none());
    }

    #[test]
    fn live_points_skip_players_without_total() {
        let live = parse_live_points(LIVE).unwrap();
        assert_eq!(live.get(&1), Some(&6));
        assert_eq!(live.get(&12), Some(&-1));
        assert!(!live.contains_key(&40));
    }

    #[test]
    fn live_points_merge_into_picks() {
        let mut snap = parse_picks(PICKS, 99, gw(2)).unwrap();
        snap.picks[0].points = Some(100);
        let live = parse_live_points(LIVE).unwrap();
        apply_live_points(&mut snap, &live);

        assert_eq!(snap.picks[0].points, Some(100));
        assert_eq!(snap.picks[1].points, Some(13));
        assert_eq!(snap.picks[2].points, Some(-1));
    }

    #[test]
    fn live_points_leave_unknown_players_empty() {
        let mut snap = parse_picks(PICKS, 99, gw(2)).unwrap();
        apply_live_points(&mut snap, &HashMap::new());
        assert!(snap.picks.iter().all(|p| p.points.is_none()));
    }

    #[test]
    fn malformed_body_is_an_error() {
        assert!(parse_picks("not json", 1, gw(1)).is_err());
        assert!(parse_live_points("[1, 2]").is_err());
    }

    #[test]
    fn urls_are_built_from_base() {
        let client = FplClient::from_config(&ApiConfig {
            base_url: "https://example.test/api/".into(),
            timeout_secs: 5,
            user_agent: "test".into(),
        })
        .unwrap();
        assert_eq!(client.bootstrap_url(), "https://example.test/api/bootstrap-static/");
        assert_eq!(
            client.picks_url(1234, gw(7)),
            "https://example.test/api/entry/1234/event/7/picks/"
        );
        assert_eq!(client.live_url(gw(38)), "https://example.test/api/event/38/live/");
    }
}
