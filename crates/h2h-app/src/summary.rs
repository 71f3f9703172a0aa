// Plain-text rendering of UI updates for the console front end.

use std::fmt::Write;

use h2h_core::metrics::Metrics;
use h2h_core::presenter::{ComparisonResult, ManagerSide};
use h2h_core::squad::EnrichedPick;

use crate::protocol::UiUpdate;

/// Render one update as a block of text ready for stdout.
pub fn format_update(update: &UiUpdate) -> String {
    match update {
        UiUpdate::Loading { gameweek } => format!("{gameweek}: loading..."),
        UiUpdate::Error { gameweek, message } => format!("{gameweek}: error: {message}"),
        UiUpdate::Ready(result) => format_comparison(result),
    }
}

fn format_comparison(result: &ComparisonResult) -> String {
    let mut out = String::new();
    let a = &result.manager_a;
    let b = &result.manager_b;

    let _ = writeln!(
        out,
        "{}: {} vs {}  ({} - {}, gap {:+})",
        result.gameweek,
        a.manager_id,
        b.manager_id,
        a.metrics.total_points,
        b.metrics.total_points,
        result.points_gap()
    );
    write_metrics(&mut out, a);
    write_metrics(&mut out, b);

    let diff = &result.differential;
    let _ = writeln!(
        out,
        "Shared: {}  Differentials: {} ({} pts) vs {} ({} pts), net {:+}",
        diff.shared_count,
        diff.only_a.len(),
        diff.only_a_points,
        diff.only_b.len(),
        diff.only_b_points,
        diff.net_impact()
    );
    if diff.captain_differs {
        let _ = writeln!(out, "Captains differ");
    }
    write_picks(&mut out, a.manager_id, &diff.only_a);
    write_picks(&mut out, b.manager_id, &diff.only_b);

    out.truncate(out.trim_end().len());
    out
}

fn write_metrics(out: &mut String, side: &ManagerSide) {
    let Metrics {
        starting_points,
        bench_points,
        captain_points,
        captain_multiplier,
        captain_name,
        autosub_points,
        chip_used,
        transfers_made,
        transfer_cost,
        ..
    } = &side.metrics;

    let captain = captain_name.as_deref().unwrap_or("-");
    let chip = chip_used.as_ref().map(|c| c.label()).unwrap_or("none");
    let _ = writeln!(
        out,
        "  [{}] XI {} | bench {} | C {} {}x{} | autosubs {} | chip {} | transfers {} (-{})",
        side.manager_id,
        starting_points,
        bench_points,
        captain,
        captain_points,
        captain_multiplier,
        autosub_points,
        chip,
        transfers_made,
        transfer_cost
    );
}

fn write_picks(out: &mut String, manager_id: u64, picks: &[EnrichedPick]) {
    if picks.is_empty() {
        return;
    }
    let _ = writeln!(out, "  Only {manager_id}:");
    for pick in picks {
        let position = pick.position.map(|p| p.code()).unwrap_or("---");
        let price = pick
            .price_millions()
            .map(|m| format!("{m:.1}m"))
            .unwrap_or_else(|| "?".to_string());
        let owned = pick
            .ownership_pct
            .map(|o| format!("{o:.1}%"))
            .unwrap_or_else(|| "?".to_string());
        let _ = writeln!(
            out,
            "    {:<3} {:<20} {:>3} pts  {:>6}  {:>6}{}",
            position,
            pick.name,
            pick.points,
            price,
            owned,
            if pick.is_bench() { "  (bench)" } else { "" }
        );
    }
}
