// Comparison assembly: bundles both managers' metrics and the differential
// into one immutable result for the rendering layer.

use serde::{Deserialize, Serialize};

use crate::differential::{resolve_differentials, Differential};
use crate::error::CoreError;
use crate::gameweek::Gameweek;
use crate::metrics::{auto_sub_flags, compute_metrics, Metrics};
use crate::squad::{EnrichedPick, EnrichedSquad, ManagerId};

/// A pick as shown in the lineup view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickView {
    pub pick: EnrichedPick,
    /// Promoted from the bench by an auto-substitution.
    pub subbed_in: bool,
}

/// Everything the view needs about one side of the comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagerSide {
    pub manager_id: ManagerId,
    pub metrics: Metrics,
    pub picks: Vec<PickView>,
}

impl ManagerSide {
    /// Pair each pick with its auto-sub flag. Flags beyond the pick count are
    /// ignored; missing flags read as `false`.
    pub fn new(squad: &EnrichedSquad, metrics: Metrics, auto_sub_flags: &[bool]) -> Self {
        let picks = squad
            .picks
            .iter()
            .enumerate()
            .map(|(i, pick)| PickView {
                pick: pick.clone(),
                subbed_in: auto_sub_flags.get(i).copied().unwrap_or(false),
            })
            .collect();

        ManagerSide {
            manager_id: squad.manager_id,
            metrics,
            picks,
        }
    }
}

/// The final, read-only comparison of two managers for one gameweek.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub gameweek: Gameweek,
    pub manager_a: ManagerSide,
    pub manager_b: ManagerSide,
    pub differential: Differential,
}

impl ComparisonResult {
    pub fn new(
        gameweek: Gameweek,
        manager_a: ManagerSide,
        manager_b: ManagerSide,
        differential: Differential,
    ) -> Self {
        ComparisonResult {
            gameweek,
            manager_a,
            manager_b,
            differential,
        }
    }

    pub fn only_a(&self) -> &[EnrichedPick] {
        &self.differential.only_a
    }

    pub fn only_b(&self) -> &[EnrichedPick] {
        &self.differential.only_b
    }

    pub fn shared_count(&self) -> usize {
        self.differential.shared_count
    }

    /// A's gameweek total minus B's. Positive means A is ahead.
    pub fn points_gap(&self) -> i32 {
        self.manager_a.metrics.total_points - self.manager_b.metrics.total_points
    }
}

/// Run the whole pipeline over two enriched squads of the same gameweek.
pub fn compare(a: &EnrichedSquad, b: &EnrichedSquad) -> Result<ComparisonResult, CoreError> {
    if a.gameweek != b.gameweek {
        return Err(CoreError::GameweekMismatch {
            a: a.gameweek.get(),
            b: b.gameweek.get(),
        });
    }

    let side_a = ManagerSide::new(a, compute_metrics(a), &auto_sub_flags(a));
    let side_b = ManagerSide::new(b, compute_metrics(b), &auto_sub_flags(b));

    Ok(ComparisonResult::new(
        a.gameweek,
        side_a,
        side_b,
        resolve_differentials(a, b),
    ))
}
