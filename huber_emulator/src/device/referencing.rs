//! Reference search (homing) tracking.
//!
//! The `eref` command drives the axis toward the reference mark at
//! coordinate 0 at high speed. When the axis comes to rest there the search
//! completes and the axis adopts the configured reference point as its
//! coordinate:
//!
//! ```text
//! Unreferenced ──start()──► Searching ──axis idle at 0──► Referenced
//!                              │
//!                              └──abort() (stop/goto/move/fast)──► Unreferenced
//! ```

use super::Direction;
use tracing::debug;

/// Coordinate of the reference mark the search drives to.
pub const REFERENCE_MARK: f64 = 0.0;

/// Referencing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferencingState {
    /// No reference installed and no search running
    Unreferenced,
    /// Moving toward the reference mark
    Searching(Direction),
    /// Reference installed
    Referenced,
}

/// Tracks the reference search across ticks.
#[derive(Debug, Clone)]
pub struct ReferenceSearch {
    state: ReferencingState,
    /// State to fall back to when a search is aborted
    before_search: ReferencingState,
}

impl ReferenceSearch {
    pub const fn new() -> Self {
        Self {
            state: ReferencingState::Unreferenced,
            before_search: ReferencingState::Unreferenced,
        }
    }

    /// Begin a search in the given direction.
    pub fn start(&mut self, direction: Direction) {
        if !self.is_active() {
            self.before_search = self.state;
        }
        self.state = ReferencingState::Searching(direction);
        debug!("Reference search started ({:?})", direction);
    }

    /// Cancel a running search, keeping any previously installed reference.
    pub fn abort(&mut self) {
        if self.is_active() {
            debug!("Reference search aborted");
            self.state = self.before_search;
        }
    }

    /// Check for completion. Returns `true` exactly once, on the tick the
    /// search finishes.
    pub fn update(&mut self, idle: bool, position: f64) -> bool {
        if self.is_active() && idle && position == REFERENCE_MARK {
            self.state = ReferencingState::Referenced;
            return true;
        }
        false
    }

    #[inline]
    pub fn state(&self) -> ReferencingState {
        self.state
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(self.state, ReferencingState::Searching(_))
    }

    #[inline]
    pub fn is_referenced(&self) -> bool {
        self.state == ReferencingState::Referenced
    }

    /// Force the installed flag (backdoor).
    pub fn set_referenced(&mut self, referenced: bool) {
        self.state = if referenced {
            ReferencingState::Referenced
        } else {
            ReferencingState::Unreferenced
        };
        self.before_search = self.state;
    }
}

impl Default for ReferenceSearch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_completes_at_mark_when_idle() {
        let mut search = ReferenceSearch::new();
        search.start(Direction::Negative);
        assert!(search.is_active());

        assert!(!search.update(false, 0.0));
        assert!(!search.update(true, 12.5));
        assert!(search.update(true, 0.0));
        assert!(search.is_referenced());

        // Completion is reported once.
        assert!(!search.update(true, 0.0));
    }

    #[test]
    fn test_abort_restores_previous_state() {
        let mut search = ReferenceSearch::new();
        search.start(Direction::Positive);
        search.abort();
        assert_eq!(search.state(), ReferencingState::Unreferenced);

        search.set_referenced(true);
        search.start(Direction::Positive);
        search.abort();
        assert_eq!(search.state(), ReferencingState::Referenced);
    }

    #[test]
    fn test_restart_while_searching_keeps_fallback() {
        let mut search = ReferenceSearch::new();
        search.set_referenced(true);
        search.start(Direction::Positive);
        search.start(Direction::Negative);
        assert_eq!(search.state(), ReferencingState::Searching(Direction::Negative));
        search.abort();
        assert!(search.is_referenced());
    }
}
