//! Chat history window.
//!
//! Only the most recent turns are kept for the prompt. The window is always a
//! strict suffix of the conversation: older turns are dropped, never reordered
//! or deduplicated.

use super::types::HistoryTurn;

/// Returns the last `window_size` turns of `history`, in chronological order.
pub fn history_window(history: &[HistoryTurn], window_size: usize) -> &[HistoryTurn] {
    let start = history.len().saturating_sub(window_size);
    &history[start..]
}
