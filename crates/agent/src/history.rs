//! History repair and windowing.
//!
//! Providers reject transcripts that don't strictly alternate user and
//! assistant turns, and long transcripts blow the context budget. Both
//! passes run on every orchestration before anything else sees the history.

use plume_core::turn::{Role, Turn};
use tracing::debug;

/// Default context window size in turns.
pub const DEFAULT_WINDOW_TURNS: usize = 11;

/// Repair a raw history into a strictly alternating user/assistant sequence
/// that starts with a user turn.
///
/// - System and tool turns are dropped (the system prompt is assembled
///   separately; tool turns only exist inside a single orchestration).
/// - Leading assistant turns are dropped until the first user turn.
/// - A turn whose role matches the last kept turn's role is dropped. This is
///   best-effort repair, not strict validation.
pub fn normalize(history: &[Turn]) -> Vec<Turn> {
    let mut repaired: Vec<Turn> = Vec::with_capacity(history.len());

    for turn in history {
        if turn.role != Role::User && turn.role != Role::Assistant {
            continue;
        }
        if repaired.is_empty() && turn.role == Role::Assistant {
            continue;
        }

        match repaired.last() {
            Some(prev) if prev.role == turn.role => continue,
            _ => repaired.push(turn.clone()),
        }
    }

    if repaired.len() != history.len() {
        debug!(
            raw = history.len(),
            repaired = repaired.len(),
            "Repaired non-alternating history"
        );
    }
    repaired
}

/// Cap a normalized history at `n` turns, keeping the first turn (the
/// conversation's framing) plus the most recent `n - 1` turns.
///
/// After windowing a gap may appear between the first and second kept turn;
/// that is accepted in exchange for always preserving the opening context.
pub fn window(turns: Vec<Turn>, n: usize) -> Vec<Turn> {
    if n == 0 || turns.len() <= n {
        return turns;
    }

    let tail_start = turns.len() - (n - 1);
    let mut windowed = Vec::with_capacity(n);
    windowed.push(turns[0].clone());
    windowed.extend_from_slice(&turns[tail_start..]);
    windowed
}
