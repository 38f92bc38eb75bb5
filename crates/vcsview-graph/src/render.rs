//! Plain-text rendering of graph rows.

use std::fmt::Write;

use crate::builder::GraphHistory;

/// Render each row as its lane symbols, padded to the widest row, followed
/// by the short id and subject of the row's commit.
///
/// # Examples
///
/// ```
/// use vcsview_graph::builder::{GraphHistory, GraphRow, LaneSymbol};
/// use vcsview_graph::render::render_text;
///
/// let history = GraphHistory {
///     rows: vec![GraphRow { commit: None, lanes: vec![LaneSymbol::Commit, LaneSymbol::Left] }],
///     open_lanes: Vec::new(),
/// };
/// assert_eq!(render_text(&history), "*\\\n");
/// ```
pub fn render_text(history: &GraphHistory) -> String {
    let width = history
        .rows
        .iter()
        .map(|row| row.lanes.len())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for row in &history.rows {
        let pieces = row.pieces();
        match &row.commit {
            Some(commit) => {
                let _ = writeln!(
                    out,
                    "{pieces:<width$}  {} {}",
                    commit.short_id(),
                    commit.subject()
                );
            }
            None => {
                let _ = writeln!(out, "{pieces}");
            }
        }
    }

    if !history.open_lanes.is_empty() {
        let _ = writeln!(out);
        for open in &history.open_lanes {
            let short: String = open.awaiting.chars().take(7).collect();
            let _ = writeln!(out, "lane {} continues to {short}", open.lane);
        }
    }
    out
}
