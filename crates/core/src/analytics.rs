use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::ProgressEntry;

//
// ─── SCOPE ─────────────────────────────────────────────────────────────────────
//

/// Which entries the per-period counters and the streak consider.
///
/// `Today` selects entries whose UTC date equals the reference instant's UTC
/// date. The full-history aggregates (`total_exercises`, `average_accuracy`,
/// `best_score`) are unaffected by the scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    #[default]
    All,
    Today,
}

//
// ─── SUMMARY ───────────────────────────────────────────────────────────────────
//

/// Derived statistics over a progress history.
///
/// Always recomputed from the entry sequence on demand; never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AnalyticsSummary {
    /// Sum of completed exercises over the full history.
    pub total_exercises: u64,
    /// Mean accuracy over the full history; `0.0` when the history is empty.
    /// Carries the exact quotient, no rounding.
    pub average_accuracy: f64,
    /// Highest score in the full history, folded from a `0.0` accumulator.
    /// A history whose every score is negative therefore reports `0.0`; this
    /// floor is intentional, kept behavior.
    pub best_score: f64,
    /// Number of entries in the selected scope.
    pub progress_count: u32,
    /// Entries in scope with accuracy exactly 100.
    pub correct_count: u32,
    /// Entries in scope with accuracy exactly 0.
    pub incorrect_count: u32,
    /// Consecutive perfect entries counted from the newest backward.
    pub streak: u32,
}

//
// ─── ENGINE ────────────────────────────────────────────────────────────────────
//

/// Fold a time-ordered progress sequence (oldest first) into summary
/// statistics.
///
/// Pure function of its inputs: no side effects, safe to call repeatedly and
/// from concurrent requests. An empty sequence yields the all-zero summary.
///
/// The streak scans from the newest entry backward, counting entries with
/// accuracy exactly 100 and stopping at the first one below that. Under
/// [`Scope::Today`] the scan also stops at the first entry recorded on a
/// day other than `as_of`'s, even if that entry is perfect.
#[must_use]
pub fn summarize(entries: &[ProgressEntry], scope: Scope, as_of: DateTime<Utc>) -> AnalyticsSummary {
    let day = as_of.date_naive();
    let in_scope = |entry: &ProgressEntry| match scope {
        Scope::All => true,
        Scope::Today => entry.recorded_at().date_naive() == day,
    };

    let mut summary = AnalyticsSummary::default();

    for entry in entries {
        summary.total_exercises += u64::from(entry.completed_exercises());
        if entry.score() > summary.best_score {
            summary.best_score = entry.score();
        }

        if !in_scope(entry) {
            continue;
        }
        summary.progress_count = summary.progress_count.saturating_add(1);
        if entry.accuracy() == 100.0 {
            summary.correct_count = summary.correct_count.saturating_add(1);
        }
        if entry.accuracy() == 0.0 {
            summary.incorrect_count = summary.incorrect_count.saturating_add(1);
        }
    }

    if !entries.is_empty() {
        let total: f64 = entries.iter().map(ProgressEntry::accuracy).sum();
        // Histories are capped far below any precision-relevant length.
        #[allow(clippy::cast_precision_loss)]
        let count = entries.len() as f64;
        summary.average_accuracy = total / count;
    }

    for entry in entries.iter().rev() {
        if !in_scope(entry) || entry.accuracy() != 100.0 {
            break;
        }
        summary.streak = summary.streak.saturating_add(1);
    }

    summary
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
