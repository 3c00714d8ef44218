// File: src/services/summary.rs
//
// Merges one cycle's probe results into a StatusSummary. Proxy front-ends
// (aggregate semantics) report a federation-wide player count; those are
// summed into one totals row instead of being conflated with the
// per-server populations.

use crate::models::{AggregateTotals, EndpointSpec, ProbeResult, StatusSummary};

/// Builds the summary for one cycle. `results` must be aligned with
/// `specs` (same order, same length) — both come from walking the registry.
pub fn summarize(
    results: Vec<ProbeResult>,
    specs: &[EndpointSpec],
    next_due_epoch: i64,
) -> StatusSummary {
    debug_assert_eq!(results.len(), specs.len());

    let mut totals = AggregateTotals {
        players_online: 0,
        players_max: 0,
    };
    let mut saw_online_aggregate = false;

    for (result, spec) in results.iter().zip(specs) {
        if spec.is_aggregate() && result.online {
            saw_online_aggregate = true;
            totals.players_online += result.players_online;
            totals.players_max += result.players_max;
        }
    }

    // An all-zero totals row carries no information; suppress it.
    let aggregate_totals =
        (saw_online_aggregate && totals.players_max > 0).then_some(totals);

    StatusSummary {
        entries: results,
        aggregate_totals,
        next_due_epoch,
    }
}
