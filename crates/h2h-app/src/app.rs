// Application state and orchestration logic.
//
// The event loop owns the navigator, the manager pair, and the snapshot
// cache. User commands change the selection; each change issues one fetch
// for both managers. Fetch completions come back over a channel tagged with
// a generation counter, and only the latest generation is ever applied.

use std::sync::Arc;

use h2h_core::cache::{SnapshotCache, SnapshotKey};
use h2h_core::enrich::enrich_squad;
use h2h_core::gameweek::{Gameweek, GameweekNavigator};
use h2h_core::player::PlayerTable;
use h2h_core::presenter::{compare, ComparisonResult};
use h2h_core::squad::{EnrichedSquad, ManagerId, SquadSnapshot};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::protocol::{FetchEvent, UiUpdate, UserCommand, ViewState};
use crate::source::SquadSource;

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// The complete application state.
pub struct AppState {
    pub manager_a: ManagerId,
    pub manager_b: ManagerId,
    pub navigator: GameweekNavigator,
    pub players: Arc<PlayerTable>,
    pub cache: SnapshotCache,
    pub source: Arc<dyn SquadSource>,
    /// Sender handed to spawned fetch tasks.
    pub fetch_tx: mpsc::Sender<FetchEvent>,
    /// Incremented on every request. Fetch events carrying any other value
    /// are stale and discarded in `handle_fetch_event`.
    pub fetch_generation: u64,
    pub current_fetch: Option<JoinHandle<()>>,
    pub view_state: ViewState,
    /// The comparison currently on screen, if any.
    pub current: Option<Arc<ComparisonResult>>,
}

impl AppState {
    pub fn new(
        manager_a: ManagerId,
        manager_b: ManagerId,
        start: Gameweek,
        players: Arc<PlayerTable>,
        cache_capacity: usize,
        source: Arc<dyn SquadSource>,
        fetch_tx: mpsc::Sender<FetchEvent>,
    ) -> Self {
        AppState {
            manager_a,
            manager_b,
            navigator: GameweekNavigator::new(start),
            players,
            cache: SnapshotCache::new(cache_capacity),
            source,
            fetch_tx,
            fetch_generation: 0,
            current_fetch: None,
            view_state: ViewState::Loading,
            current: None,
        }
    }

    pub fn gameweek(&self) -> Gameweek {
        self.navigator.current()
    }

    fn cached_pair(&self, gameweek: Gameweek) -> Option<(Arc<EnrichedSquad>, Arc<EnrichedSquad>)> {
        let a = self.cache.get(&SnapshotKey::new(self.manager_a, gameweek))?;
        let b = self.cache.get(&SnapshotKey::new(self.manager_b, gameweek))?;
        Some((a, b))
    }

    /// Show the comparison for the current selection: straight from the
    /// cache when both squads are there, otherwise by spawning a fetch.
    ///
    /// Either way the generation is bumped first, so anything still in
    /// flight for an earlier selection is ignored when it lands.
    pub async fn request_comparison(&mut self, ui_tx: &mpsc::Sender<UiUpdate>) {
        self.fetch_generation += 1;
        let generation = self.fetch_generation;
        let gameweek = self.gameweek();

        if let Some(handle) = self.current_fetch.take() {
            handle.abort();
        }

        if let Some((a, b)) = self.cached_pair(gameweek) {
            debug!("Cache hit for {} ({} vs {})", gameweek, self.manager_a, self.manager_b);
            self.present(&a, &b, ui_tx).await;
            return;
        }

        self.view_state = ViewState::Loading;
        let _ = ui_tx.send(UiUpdate::Loading { gameweek }).await;

        let source = Arc::clone(&self.source);
        let tx = self.fetch_tx.clone();
        let (manager_a, manager_b) = (self.manager_a, self.manager_b);

        self.current_fetch = Some(tokio::spawn(async move {
            let event = match tokio::try_join!(
                source.fetch_squad(manager_a, gameweek),
                source.fetch_squad(manager_b, gameweek)
            ) {
                Ok((squad_a, squad_b)) => FetchEvent::Loaded {
                    generation,
                    gameweek,
                    squad_a,
                    squad_b,
                },
                Err(e) => FetchEvent::Failed {
                    generation,
                    gameweek,
                    message: e.to_string(),
                },
            };
            let _ = tx.send(event).await;
        }));

        info!(
            "Fetching {} for managers {} and {} (gen: {})",
            gameweek, manager_a, manager_b, generation
        );
    }

    /// Enrich freshly fetched squads, cache them, and present the result.
    async fn apply_snapshots(
        &mut self,
        squad_a: SquadSnapshot,
        squad_b: SquadSnapshot,
        ui_tx: &mpsc::Sender<UiUpdate>,
    ) {
        let a = Arc::new(enrich_squad(&squad_a, &self.players));
        let b = Arc::new(enrich_squad(&squad_b, &self.players));
        self.cache.insert(Arc::clone(&a));
        self.cache.insert(Arc::clone(&b));
        self.present(&a, &b, ui_tx).await;
    }

    async fn present(
        &mut self,
        a: &EnrichedSquad,
        b: &EnrichedSquad,
        ui_tx: &mpsc::Sender<UiUpdate>,
    ) {
        match compare(a, b) {
            Ok(result) => {
                let result = Arc::new(result);
                self.current = Some(Arc::clone(&result));
                self.view_state = ViewState::Ready;
                let _ = ui_tx.send(UiUpdate::Ready(result)).await;
            }
            Err(e) => {
                warn!("Comparison failed: {}", e);
                self.view_state = ViewState::Error;
                let _ = ui_tx
                    .send(UiUpdate::Error {
                        gameweek: a.gameweek,
                        message: e.to_string(),
                    })
                    .await;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Event loop
// ---------------------------------------------------------------------------

/// Run the application event loop until `Quit` arrives or the command
/// channel closes.
///
/// Listens on two channels with `tokio::select!`: user commands and fetch
/// completions. The first comparison is requested before the loop starts.
pub async fn run(
    mut cmd_rx: mpsc::Receiver<UserCommand>,
    mut fetch_rx: mpsc::Receiver<FetchEvent>,
    ui_tx: mpsc::Sender<UiUpdate>,
    mut state: AppState,
) -> anyhow::Result<()> {
    info!("Application event loop started at {}", state.gameweek());
    state.request_comparison(&ui_tx).await;

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UserCommand::Quit) => {
                        info!("Quit requested");
                        break;
                    }
                    Some(cmd) => handle_user_command(&mut state, cmd, &ui_tx).await,
                    None => {
                        info!("Command channel closed, shutting down");
                        break;
                    }
                }
            }

            // AppState holds a sender, so this channel never closes while
            // the loop runs.
            Some(event) = fetch_rx.recv() => {
                handle_fetch_event(&mut state, event, &ui_tx).await;
            }
        }
    }

    if let Some(handle) = state.current_fetch.take() {
        handle.abort();
    }

    info!("Application event loop stopped");
    Ok(())
}

/// Apply one user command.
pub async fn handle_user_command(
    state: &mut AppState,
    cmd: UserCommand,
    ui_tx: &mpsc::Sender<UiUpdate>,
) {
    match cmd {
        UserCommand::Advance(delta) => match state.navigator.advance(delta) {
            Some(gw) => {
                debug!("Navigated to {}", gw);
                state.request_comparison(ui_tx).await;
            }
            None => debug!(
                "Ignoring navigation by {} from {} (out of range or no-op)",
                delta,
                state.gameweek()
            ),
        },
        UserCommand::JumpTo(target) => {
            if state.navigator.jump_to(target).is_some() {
                state.request_comparison(ui_tx).await;
            }
        }
        UserCommand::SetManagers { a, b } => {
            if (a, b) == (state.manager_a, state.manager_b) {
                return;
            }
            info!("Comparing managers {} and {}", a, b);
            state.manager_a = a;
            state.manager_b = b;
            state.cache.retain_managers(&[a, b]);
            state.current = None;
            state.request_comparison(ui_tx).await;
        }
        UserCommand::Refresh => {
            let gw = state.gameweek();
            state.cache.remove(&SnapshotKey::new(state.manager_a, gw));
            state.cache.remove(&SnapshotKey::new(state.manager_b, gw));
            state.request_comparison(ui_tx).await;
        }
        UserCommand::Quit => {}
    }
}

/// Handle a fetch completion.
///
/// **Generation check**: a completion whose generation is not the latest
/// belongs to a selection the user has already moved away from. It is
/// dropped without touching the view, so a slow response for gameweek N
/// can never overwrite what is shown for gameweek M.
pub async fn handle_fetch_event(
    state: &mut AppState,
    event: FetchEvent,
    ui_tx: &mpsc::Sender<UiUpdate>,
) {
    if event.generation() != state.fetch_generation {
        debug!(
            "Discarding stale fetch result (event gen: {}, current gen: {})",
            event.generation(),
            state.fetch_generation
        );
        return;
    }
    state.current_fetch = None;

    match event {
        FetchEvent::Loaded {
            squad_a, squad_b, ..
        } => {
            state.apply_snapshots(squad_a, squad_b, ui_tx).await;
        }
        FetchEvent::Failed {
            gameweek, message, ..
        } => {
            warn!("Fetch for {} failed: {}", gameweek, message);
            state.view_state = ViewState::Error;
            let _ = ui_tx.send(UiUpdate::Error { gameweek, message }).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{FetchError, ReferenceData};
    use async_trait::async_trait;
    use h2h_core::player::Player;
    use h2h_core::squad::{EntryHistory, Pick};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Source that serves 15-pick squads built from the manager id and
    /// counts how often it was asked.
    struct StubSource {
        calls: AtomicUsize,
        fail: bool,
    }

    impl StubSource {
        fn new() -> Self {
            StubSource {
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }
    }

    fn squad(manager_id: ManagerId, gameweek: Gameweek) -> SquadSnapshot {
        let base = (manager_id as u32) * 100;
        SquadSnapshot {
            manager_id,
            gameweek,
            picks: (1..=15u32)
                .map(|i| Pick {
                    // Players 1-10 are shared; 11-15 are per manager.
                    element: if i <= 10 { i } else { base + i },
                    slot: i as u8,
                    multiplier: if i <= 11 { 1 } else { 0 },
                    is_captain: i == 1,
                    is_vice_captain: i == 2,
                    selling_price: None,
                    points: Some(gameweek.get() as i32),
                })
                .collect(),
            active_chip: None,
            automatic_subs: vec![],
            entry_history: Some(EntryHistory {
                points: Some(gameweek.get() as i32 * 11),
                event_transfers: None,
                event_transfers_cost: None,
            }),
        }
    }

    #[async_trait]
    impl SquadSource for StubSource {
        async fn fetch_reference(&self) -> Result<ReferenceData, FetchError> {
            Ok(ReferenceData::default())
        }

        async fn fetch_squad(
            &self,
            manager_id: ManagerId,
            gameweek: Gameweek,
        ) -> Result<SquadSnapshot, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(FetchError::Status {
                    url: format!("stub://{manager_id}/{}", gameweek.get()),
                    status: 503,
                });
            }
            Ok(squad(manager_id, gameweek))
        }
    }

    fn gw(n: u8) -> Gameweek {
        Gameweek::new(n).unwrap()
    }

    fn players() -> Arc<PlayerTable> {
        Arc::new(PlayerTable::new(vec![Player {
            id: 1,
            name: "Captain".into(),
            position: None,
            ownership_pct: None,
            price: 100,
        }]))
    }

    fn test_state(
        source: Arc<StubSource>,
        start: u8,
    ) -> (AppState, mpsc::Receiver<FetchEvent>) {
        let (fetch_tx, fetch_rx) = mpsc::channel(16);
        let state = AppState::new(1, 2, gw(start), players(), 8, source, fetch_tx);
        (state, fetch_rx)
    }

    #[tokio::test]
    async fn request_then_fetch_event_produces_ready() {
        let source = Arc::new(StubSource::new());
        let (mut state, mut fetch_rx) = test_state(source.clone(), 5);
        let (ui_tx, mut ui_rx) = mpsc::channel(16);

        state.request_comparison(&ui_tx).await;
        assert_eq!(state.view_state, ViewState::Loading);
        assert!(matches!(
            ui_rx.recv().await.unwrap(),
            UiUpdate::Loading { gameweek } if gameweek == gw(5)
        ));

        let event = fetch_rx.recv().await.unwrap();
        handle_fetch_event(&mut state, event, &ui_tx).await;

        match ui_rx.recv().await.unwrap() {
            UiUpdate::Ready(result) => {
                assert_eq!(result.gameweek, gw(5));
                assert_eq!(result.shared_count(), 10);
                assert_eq!(result.only_a().len(), 5);
                assert_eq!(result.manager_a.metrics.total_points, 55);
                assert_eq!(result.manager_a.metrics.captain_name.as_deref(), Some("Captain"));
            }
            other => panic!("Expected Ready, got {:?}", other),
        }
        assert_eq!(state.view_state, ViewState::Ready);
        assert_eq!(state.cache.len(), 2);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn stale_fetch_event_is_discarded() {
        let source = Arc::new(StubSource::new());
        let (mut state, _fetch_rx) = test_state(source, 10);
        let (ui_tx, mut ui_rx) = mpsc::channel(16);

        // A newer request has been issued (generation 2) while an older
        // response (generation 1, gameweek 9) is still arriving.
        state.fetch_generation = 2;
        let stale = FetchEvent::Loaded {
            generation: 1,
            gameweek: gw(9),
            squad_a: squad(1, gw(9)),
            squad_b: squad(2, gw(9)),
        };
        handle_fetch_event(&mut state, stale, &ui_tx).await;

        assert!(ui_rx.try_recv().is_err());
        assert!(state.current.is_none());
        assert_eq!(state.view_state, ViewState::Loading);
        assert!(state.cache.is_empty());
    }

    #[tokio::test]
    async fn stale_failure_does_not_flip_view_to_error() {
        let source = Arc::new(StubSource::new());
        let (mut state, _fetch_rx) = test_state(source, 10);
        let (ui_tx, mut ui_rx) = mpsc::channel(16);
        state.fetch_generation = 3;
        state.view_state = ViewState::Ready;

        let stale = FetchEvent::Failed {
            generation: 2,
            gameweek: gw(9),
            message: "timeout".into(),
        };
        handle_fetch_event(&mut state, stale, &ui_tx).await;

        assert!(ui_rx.try_recv().is_err());
        assert_eq!(state.view_state, ViewState::Ready);
    }

    #[tokio::test]
    async fn failed_fetch_sets_error_state() {
        let source = Arc::new(StubSource {
            calls: AtomicUsize::new(0),
            fail: true,
        });
        let (mut state, mut fetch_rx) = test_state(source, 3);
        let (ui_tx, mut ui_rx) = mpsc::channel(16);

        state.request_comparison(&ui_tx).await;
        let _loading = ui_rx.recv().await.unwrap();
        let event = fetch_rx.recv().await.unwrap();
        handle_fetch_event(&mut state, event, &ui_tx).await;

        match ui_rx.recv().await.unwrap() {
            UiUpdate::Error { gameweek, message } => {
                assert_eq!(gameweek, gw(3));
                assert!(message.contains("503"), "unexpected message: {message}");
            }
            other => panic!("Expected Error, got {:?}", other),
        }
        assert_eq!(state.view_state, ViewState::Error);
        assert!(state.cache.is_empty());
    }

    #[tokio::test]
    async fn cached_selection_skips_fetch() {
        let source = Arc::new(StubSource::new());
        let (mut state, mut fetch_rx) = test_state(source.clone(), 5);
        let (ui_tx, mut ui_rx) = mpsc::channel(16);

        state.request_comparison(&ui_tx).await;
        let _loading = ui_rx.recv().await.unwrap();
        let event = fetch_rx.recv().await.unwrap();
        handle_fetch_event(&mut state, event, &ui_tx).await;
        let _ready = ui_rx.recv().await.unwrap();

        // Away and back again: the second visit to GW5 is served from cache.
        handle_user_command(&mut state, UserCommand::Advance(1), &ui_tx).await;
        let _loading = ui_rx.recv().await.unwrap();
        let event = fetch_rx.recv().await.unwrap();
        handle_fetch_event(&mut state, event, &ui_tx).await;
        let _ready = ui_rx.recv().await.unwrap();

        handle_user_command(&mut state, UserCommand::Advance(-1), &ui_tx).await;
        match ui_rx.recv().await.unwrap() {
            UiUpdate::Ready(result) => assert_eq!(result.gameweek, gw(5)),
            other => panic!("Expected Ready from cache, got {:?}", other),
        }
        assert_eq!(source.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn out_of_range_advance_requests_nothing() {
        let source = Arc::new(StubSource::new());
        let (mut state, _fetch_rx) = test_state(source.clone(), 38);
        let (ui_tx, mut ui_rx) = mpsc::channel(16);

        handle_user_command(&mut state, UserCommand::Advance(1), &ui_tx).await;
        assert_eq!(state.gameweek(), gw(38));
        assert_eq!(state.fetch_generation, 0);
        assert!(ui_rx.try_recv().is_err());
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn refresh_bypasses_cache() {
        let source = Arc::new(StubSource::new());
        let (mut state, mut fetch_rx) = test_state(source.clone(), 5);
        let (ui_tx, mut ui_rx) = mpsc::channel(16);

        state.request_comparison(&ui_tx).await;
        let _ = ui_rx.recv().await.unwrap();
        let event = fetch_rx.recv().await.unwrap();
        handle_fetch_event(&mut state, event, &ui_tx).await;
        let _ = ui_rx.recv().await.unwrap();

        handle_user_command(&mut state, UserCommand::Refresh, &ui_tx).await;
        assert!(matches!(ui_rx.recv().await.unwrap(), UiUpdate::Loading { .. }));
        let event = fetch_rx.recv().await.unwrap();
        assert_eq!(event.generation(), 2);
        assert_eq!(source.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn set_managers_prunes_cache_and_refetches() {
        let source = Arc::new(StubSource::new());
        let (mut state, mut fetch_rx) = test_state(source, 5);
        let (ui_tx, mut ui_rx) = mpsc::channel(16);

        state.request_comparison(&ui_tx).await;
        let _ = ui_rx.recv().await.unwrap();
        let event = fetch_rx.recv().await.unwrap();
        handle_fetch_event(&mut state, event, &ui_tx).await;
        let _ = ui_rx.recv().await.unwrap();

        handle_user_command(&mut state, UserCommand::SetManagers { a: 1, b: 3 }, &ui_tx).await;
        assert_eq!(state.cache.len(), 1);
        assert!(state.current.is_none());
        assert!(matches!(ui_rx.recv().await.unwrap(), UiUpdate::Loading { .. }));

        let event = fetch_rx.recv().await.unwrap();
        handle_fetch_event(&mut state, event, &ui_tx).await;
        match ui_rx.recv().await.unwrap() {
            UiUpdate::Ready(result) => {
                assert_eq!(result.manager_a.manager_id, 1);
                assert_eq!(result.manager_b.manager_id, 3);
            }
            other => panic!("Expected Ready, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn event_loop_quits_on_command() {
        let source = Arc::new(StubSource::new());
        let (state, fetch_rx) = test_state(source, 1);
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (ui_tx, mut ui_rx) = mpsc::channel(16);

        let handle = tokio::spawn(run(cmd_rx, fetch_rx, ui_tx, state));

        assert!(matches!(ui_rx.recv().await.unwrap(), UiUpdate::Loading { .. }));
        assert!(matches!(ui_rx.recv().await.unwrap(), UiUpdate::Ready(_)));

        cmd_tx.send(UserCommand::Quit).await.unwrap();
        handle.await.unwrap().unwrap();
    }
}
