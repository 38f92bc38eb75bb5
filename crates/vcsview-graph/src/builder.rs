//! Lane assignment for commit graph rows.
//!
//! Commits are processed newest first. Each open lane remembers the id of
//! the commit expected to appear on it next; a commit takes the lowest lane
//! awaiting it (or the lowest free lane if none does) and hands that lane on
//! to its primary parent. Extra parents of a merge open new lanes unless a
//! lane already awaits them. Lane numbering depends only on input order.

use std::fmt;

use serde::{Deserialize, Serialize};
use vcsview_core::Commit;

/// One cell of a graph row.
///
/// # Examples
///
/// ```
/// use vcsview_graph::builder::LaneSymbol;
///
/// assert_eq!(LaneSymbol::from_char('*'), LaneSymbol::Commit);
/// assert_eq!(LaneSymbol::from_char('x'), LaneSymbol::Space);
/// assert_eq!(LaneSymbol::Left.as_char(), '\\');
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LaneSymbol {
    /// `/`: a lane joining from the right, or branching off to the left.
    #[serde(rename = "/")]
    Right,
    /// `\`: a lane branching off to the right, or joining from the left.
    #[serde(rename = "\\")]
    Left,
    /// `|`: a lane passing through this row.
    #[serde(rename = "|")]
    Direct,
    /// ` `: no lane.
    #[serde(rename = " ")]
    Space,
    /// `*`: the row's commit.
    #[serde(rename = "*")]
    Commit,
}

impl LaneSymbol {
    /// The glyph for this symbol.
    pub fn as_char(self) -> char {
        match self {
            LaneSymbol::Right => '/',
            LaneSymbol::Left => '\\',
            LaneSymbol::Direct => '|',
            LaneSymbol::Space => ' ',
            LaneSymbol::Commit => '*',
        }
    }

    /// Map a glyph back to a symbol. Anything outside the alphabet becomes a space.
    pub fn from_char(c: char) -> Self {
        match c {
            '/' => LaneSymbol::Right,
            '\\' => LaneSymbol::Left,
            '|' => LaneSymbol::Direct,
            '*' => LaneSymbol::Commit,
            _ => LaneSymbol::Space,
        }
    }
}

impl fmt::Display for LaneSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// One rendered row of the history graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphRow {
    /// The commit on this row, with its lane set.
    pub commit: Option<Commit>,
    /// Lane symbols left to right, trailing spaces trimmed.
    pub lanes: Vec<LaneSymbol>,
}

impl GraphRow {
    /// `true` if the row contains the commit symbol.
    pub fn has_commit_piece(&self) -> bool {
        self.lanes.contains(&LaneSymbol::Commit)
    }

    /// Lane symbols as a string, e.g. `"*\\"`.
    pub fn pieces(&self) -> String {
        self.lanes.iter().map(|s| s.as_char()).collect()
    }
}

/// A lane still waiting for a commit when the window ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenLane {
    /// Lane index.
    pub lane: usize,
    /// Id of the commit the lane leads to.
    pub awaiting: String,
}

/// Lane placement of a single commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowLayout {
    /// The commit's lane.
    pub level: usize,
    /// Symbols for this row.
    pub lanes: Vec<LaneSymbol>,
}

/// Rows for a whole window plus the lanes left open at its end.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphHistory {
    /// One row per input commit, in input order.
    pub rows: Vec<GraphRow>,
    /// Lanes awaiting commits outside the window.
    pub open_lanes: Vec<OpenLane>,
}

/// Incremental lane assigner.
///
/// Owns the lane map for one window; rows must be fed in order.
///
/// # Examples
///
/// ```
/// use vcsview_graph::builder::GraphBuilder;
///
/// let mut builder = GraphBuilder::new();
/// let merge = builder.next_row("c", &["b1".into(), "b2".into()]);
/// assert_eq!(merge.level, 0);
/// assert_eq!(builder.open_lanes().len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct GraphBuilder {
    lanes: Vec<Option<String>>,
}

impl GraphBuilder {
    /// Create a builder with no open lanes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Place the next commit and return its row.
    pub fn next_row(&mut self, id: &str, parent_ids: &[String]) -> RowLayout {
        let before: Vec<bool> = self.lanes.iter().map(Option::is_some).collect();

        let matching: Vec<usize> = self
            .lanes
            .iter()
            .enumerate()
            .filter(|(_, awaited)| awaited.as_deref() == Some(id))
            .map(|(idx, _)| idx)
            .collect();

        let level = match matching.first() {
            Some(&idx) => idx,
            None => self.free_lane(&[]),
        };

        // Extra lanes that led to this commit merge into its lane.
        let converging: Vec<usize> = matching.iter().skip(1).copied().collect();
        for &idx in &converging {
            self.lanes[idx] = None;
        }

        self.set_lane(level, parent_ids.first().cloned());

        let mut diverging = Vec::new();
        let mut joined = Vec::new();
        for parent in parent_ids.iter().skip(1) {
            match self.position_of(parent) {
                Some(existing) if existing == level => {}
                Some(existing) => joined.push(existing),
                None => {
                    let lane = self.free_lane(&converging);
                    self.set_lane(lane, Some(parent.clone()));
                    diverging.push(lane);
                }
            }
        }

        let width = before.len().max(self.lanes.len());
        let mut lanes: Vec<LaneSymbol> = (0..width)
            .map(|idx| {
                if idx == level {
                    LaneSymbol::Commit
                } else if converging.contains(&idx) {
                    if idx > level {
                        LaneSymbol::Right
                    } else {
                        LaneSymbol::Left
                    }
                } else if diverging.contains(&idx) || joined.contains(&idx) {
                    if idx > level {
                        LaneSymbol::Left
                    } else {
                        LaneSymbol::Right
                    }
                } else if self.is_open(idx) {
                    LaneSymbol::Direct
                } else {
                    LaneSymbol::Space
                }
            })
            .collect();

        while lanes.last() == Some(&LaneSymbol::Space) {
            lanes.pop();
        }
        while self.lanes.last().is_some_and(Option::is_none) {
            self.lanes.pop();
        }

        RowLayout { level, lanes }
    }

    /// Lanes still awaiting a commit, lowest index first.
    pub fn open_lanes(&self) -> Vec<OpenLane> {
        self.lanes
            .iter()
            .enumerate()
            .filter_map(|(lane, awaited)| {
                awaited.as_ref().map(|id| OpenLane {
                    lane,
                    awaiting: id.clone(),
                })
            })
            .collect()
    }

    fn is_open(&self, idx: usize) -> bool {
        self.lanes.get(idx).is_some_and(Option::is_some)
    }

    fn position_of(&self, id: &str) -> Option<usize> {
        self.lanes
            .iter()
            .position(|awaited| awaited.as_deref() == Some(id))
    }

    fn free_lane(&self, reserved: &[usize]) -> usize {
        self.lanes
            .iter()
            .enumerate()
            .position(|(idx, awaited)| awaited.is_none() && !reserved.contains(&idx))
            .unwrap_or(self.lanes.len())
    }

    fn set_lane(&mut self, idx: usize, awaited: Option<String>) {
        if idx >= self.lanes.len() {
            self.lanes.resize(idx + 1, None);
        }
        self.lanes[idx] = awaited;
    }
}

/// Lay out a window of commits, newest first.
///
/// Each returned commit carries its lane in [`Commit::graph_level`].
/// Parents outside the window stay listed in [`GraphHistory::open_lanes`].
pub fn build_graph(commits: Vec<Commit>) -> GraphHistory {
    let mut builder = GraphBuilder::new();
    let rows = commits
        .into_iter()
        .map(|commit| {
            let layout = builder.next_row(commit.id(), commit.parent_ids());
            GraphRow {
                commit: Some(commit.with_graph_level(layout.level)),
                lanes: layout.lanes,
            }
        })
        .collect();

    GraphHistory {
        rows,
        open_lanes: builder.open_lanes(),
    }
}

/// Apply `skip`/`limit` and lay out only the commits inside the window.
///
/// Lane numbers are relative to the window: nothing outside it is consulted.
pub fn build_graph_window(commits: Vec<Commit>, skip: usize, limit: usize) -> GraphHistory {
    build_graph(commits.into_iter().skip(skip).take(limit).collect())
}
