//! Binary-insertion search procedure
//!
//! Pure decision logic for placing one new item into an already-ordered
//! sequence (descending preference, index 0 = best) with the fewest pairwise
//! comparisons. No IO and no async; the session feeds user answers back one
//! at a time and stores the window between them.

/// Half-open search window over the ranked sequence.
///
/// Invariant while a search is mid-flight:
/// `min <= compare_index < max <= ranked_len`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchWindow {
    pub min: usize,
    pub max: usize,
    /// Index of the ranked item the new item is currently compared against
    pub compare_index: usize,
}

impl SearchWindow {
    fn midpoint(min: usize, max: usize) -> usize {
        (min + max) / 2
    }
}

/// Outcome of starting a placement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// The ranked sequence is empty; insert at this index without comparing
    Direct(usize),
    /// Present the item at `compare_index` for the first decision
    Compare(SearchWindow),
}

/// Outcome of one decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Window narrowed; present the item now at `compare_index`
    Continue(SearchWindow),
    /// Search terminated; splice the new item in at this index
    /// (items at indices >= the index shift down one position)
    Settled(usize),
}

/// Start placing a new item into a ranked sequence of the given length
pub fn begin(ranked_len: usize) -> Placement {
    if ranked_len == 0 {
        // Nothing to compare against
        return Placement::Direct(0);
    }

    let min = 0;
    let max = ranked_len;
    Placement::Compare(SearchWindow {
        min,
        max,
        compare_index: SearchWindow::midpoint(min, max),
    })
}

/// Apply one answer to "is the new item better than the item at
/// `compare_index`?" and either narrow the window or settle the insertion
/// index.
pub fn decide(window: SearchWindow, is_better: bool) -> Step {
    let mut min = window.min;
    let mut max = window.max;

    if is_better {
        max = window.compare_index;
    } else {
        min = window.compare_index + 1;
    }

    if min == max {
        return Step::Settled(min);
    }

    Step::Continue(SearchWindow {
        min,
        max,
        compare_index: SearchWindow::midpoint(min, max),
    })
}
