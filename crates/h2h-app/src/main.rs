// Head-to-head comparison entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, stdout is the front end)
// 2. Load config
// 3. Build the HTTP source and fetch reference data
// 4. Resolve the starting gameweek
// 5. Create mpsc channels and AppState
// 6. Spawn app logic task
// 7. Spawn printer task
// 8. Read commands from stdin until quit or EOF
// 9. Cleanup on exit

use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use h2h_app::app;
use h2h_app::config;
use h2h_app::fpl::FplClient;
use h2h_app::protocol::UserCommand;
use h2h_app::source::SquadSource;
use h2h_app::summary::format_update;
use h2h_core::gameweek::current_gameweek;
use h2h_core::player::PlayerTable;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    info!("h2h starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: managers {} vs {}, api={}",
        config.comparison.manager_a, config.comparison.manager_b, config.api.base_url
    );

    // 3. Build the source and load reference data
    let client = Arc::new(FplClient::from_config(&config.api)?);
    let reference = client
        .fetch_reference()
        .await
        .context("failed to fetch reference data")?;
    info!(
        "Loaded {} players, {} gameweeks",
        reference.players.len(),
        reference.events.len()
    );

    // 4. Starting gameweek: configured, else the live one
    let start = match config.start_gameweek() {
        Some(gw) => gw,
        None => current_gameweek(&reference.events, Utc::now()),
    };
    info!("Starting at {}", start);

    // 5. Channels and state
    let (fetch_tx, fetch_rx) = mpsc::channel(16);
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (ui_tx, mut ui_rx) = mpsc::channel(64);

    let source: Arc<dyn SquadSource> = client;
    let state = app::AppState::new(
        config.comparison.manager_a,
        config.comparison.manager_b,
        start,
        Arc::new(PlayerTable::new(reference.players)),
        config.cache.capacity,
        source,
        fetch_tx,
    );

    // 6. App logic
    let app_handle = tokio::spawn(async move {
        if let Err(e) = app::run(cmd_rx, fetch_rx, ui_tx, state).await {
            error!("Application loop error: {}", e);
        }
    });

    // 7. Printer: exits once the app task drops its sender
    let printer = tokio::spawn(async move {
        while let Some(update) = ui_rx.recv().await {
            println!("{}\n", format_update(&update));
        }
    });

    // 8. Console commands
    println!("Commands: n(ext), p(rev), g <gw>, m <a> <b>, r(efresh), q(uit)");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        if line.trim().is_empty() {
            continue;
        }
        match UserCommand::parse(&line) {
            Some(cmd) => {
                let quit = cmd == UserCommand::Quit;
                if cmd_tx.send(cmd).await.is_err() || quit {
                    break;
                }
            }
            None => {
                warn!("Unrecognized command: {:?}", line.trim());
                println!("Unrecognized command: {}", line.trim());
            }
        }
    }
    drop(cmd_tx);

    // 9. Cleanup: wait for the app task and printer (with timeout)
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), async {
        let _ = app_handle.await;
        let _ = printer.await;
    })
    .await;

    info!("h2h shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to a file, keeping stdout for the comparison
/// output.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = match directories::ProjectDirs::from("", "", "h2h") {
        Some(dirs) => dirs.data_local_dir().join("logs"),
        None => std::env::current_dir()?.join("logs"),
    };
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("h2h.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("h2h_app=info,h2h_core=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
