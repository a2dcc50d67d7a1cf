//! Viewport windowing over an ordered collection.
//!
//! Keeps a half-open window `[start, end)` of at most `window_size` items and
//! a focused `idx` inside it. Every operation stages its changes on a copy of
//! the state, validates the bounds, and only then commits, so a broken
//! transition surfaces as [`EngineError::InvariantViolation`] instead of a
//! corrupted window.

use std::ops::Range;

use crate::core::error::{EngineError, EngineResult};

/// How the window follows the focused index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScrollMode {
    /// Move only when `idx` leaves the window, one position at a time.
    #[default]
    Edge,
    /// Re-center on `idx` after every move.
    Centered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportOptions {
    pub window_size: usize,
    pub circular: bool,
    pub scroll: ScrollMode,
    pub start_index: usize,
}

impl ViewportOptions {
    pub fn new(window_size: usize) -> Self {
        Self {
            window_size,
            circular: false,
            scroll: ScrollMode::Edge,
            start_index: 0,
        }
    }

    pub fn circular(mut self, circular: bool) -> Self {
        self.circular = circular;
        self
    }

    pub fn centered(mut self) -> Self {
        self.scroll = ScrollMode::Centered;
        self
    }

    pub fn start_index(mut self, index: usize) -> Self {
        self.start_index = index;
        self
    }
}

/// Raw window bounds, exposed read-only through [`Viewport::snapshot`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewportState {
    pub idx: usize,
    pub start: usize,
    pub end: usize,
    pub window_size: usize,
    pub length: usize,
}

impl ViewportState {
    fn width(&self) -> usize {
        self.end - self.start
    }

    fn target_width(&self) -> usize {
        self.window_size.min(self.length)
    }

    /// Bring the window back in line with the current length.
    fn reconcile(&mut self) {
        let len = self.length;
        if len == 0 {
            self.idx = 0;
            self.start = 0;
            self.end = 0;
            return;
        }

        self.idx = self.idx.min(len - 1);
        if self.end > len {
            let overflow = self.end - len;
            self.end = len;
            self.start = self.start.saturating_sub(overflow);
        }
        self.start = self.start.min(self.end);

        if self.window_size == 0 {
            self.start = self.idx;
            self.end = self.idx;
            return;
        }

        let target = self.target_width();
        while self.width() < target {
            if self.end < len {
                self.end += 1;
            } else {
                self.start -= 1;
            }
        }
        while self.width() > target {
            self.shrink_once();
        }

        if self.idx < self.start {
            let shift = self.start - self.idx;
            self.start -= shift;
            self.end -= shift;
        } else if self.idx >= self.end {
            let shift = self.idx + 1 - self.end;
            self.start += shift;
            self.end += shift;
        }
    }

    /// Reposition the window after `idx` changed.
    fn follow(&mut self, scroll: ScrollMode) {
        if self.length == 0 || self.window_size == 0 {
            self.start = self.idx;
            self.end = self.idx;
            return;
        }

        let width = self.width();
        match scroll {
            ScrollMode::Edge => {
                while self.idx < self.start {
                    self.start -= 1;
                    self.end -= 1;
                }
                while self.idx >= self.end {
                    self.start += 1;
                    self.end += 1;
                }
            }
            ScrollMode::Centered => {
                let start = self.idx.saturating_sub(width / 2).min(self.length - width);
                self.start = start;
                self.end = start + width;
            }
        }
    }

    fn grow_once(&mut self) {
        let collapsed = self.start == self.end;
        let before = self.idx - self.start;
        let after = self.end.saturating_sub(self.idx + 1);
        let prefer_end = collapsed || after >= before;

        if prefer_end && self.end < self.length {
            self.end += 1;
        } else if self.start > 0 {
            self.start -= 1;
        } else {
            self.end += 1;
        }
    }

    fn shrink_once(&mut self) {
        let before = self.idx.saturating_sub(self.start);
        let after = self.end.saturating_sub(self.idx + 1);
        if after >= before {
            self.end -= 1;
        } else {
            self.start += 1;
        }
    }

    fn resize(&mut self, size: usize) {
        self.window_size = size;
        if self.length == 0 {
            return;
        }
        if size == 0 {
            self.start = self.idx;
            self.end = self.idx;
            return;
        }

        let target = self.target_width();
        while self.width() < target {
            self.grow_once();
        }
        while self.width() > target {
            self.shrink_once();
        }
    }

    fn check(&self) -> EngineResult<()> {
        let fail = |detail: String| Err(EngineError::invariant("viewport", detail));

        if self.start > self.end || self.end > self.length {
            return fail(format!(
                "window [{}, {}) outside length {}",
                self.start, self.end, self.length
            ));
        }
        if self.length == 0 {
            if self.idx != 0 || self.end != 0 {
                return fail(format!("empty collection with idx {} end {}", self.idx, self.end));
            }
            return Ok(());
        }
        if self.idx >= self.length {
            return fail(format!("idx {} past length {}", self.idx, self.length));
        }
        if self.window_size == 0 {
            if self.start != self.idx || self.end != self.idx {
                return fail(format!(
                    "hidden window [{}, {}) not collapsed on idx {}",
                    self.start, self.end, self.idx
                ));
            }
            return Ok(());
        }
        if self.idx < self.start || self.idx >= self.end {
            return fail(format!(
                "idx {} outside window [{}, {})",
                self.idx, self.start, self.end
            ));
        }
        if self.width() != self.target_width() {
            return fail(format!(
                "window width {} expected {}",
                self.width(),
                self.target_width()
            ));
        }
        Ok(())
    }
}

/// Scrollable window over `length` items with a focused index.
#[derive(Debug, Clone)]
pub struct Viewport {
    state: ViewportState,
    circular: bool,
    scroll: ScrollMode,
}

impl Viewport {
    pub fn new(length: usize, options: ViewportOptions) -> EngineResult<Self> {
        let idx = options.start_index.min(length.saturating_sub(1));
        let mut viewport = Self {
            state: ViewportState {
                idx,
                start: idx,
                end: idx,
                window_size: options.window_size,
                length,
            },
            circular: options.circular,
            scroll: options.scroll,
        };
        viewport.apply(|state, scroll| state.follow(scroll))?;
        Ok(viewport)
    }

    fn apply<F>(&mut self, op: F) -> EngineResult<()>
    where
        F: FnOnce(&mut ViewportState, ScrollMode),
    {
        let mut staged = self.state;
        staged.reconcile();
        op(&mut staged, self.scroll);
        staged.check()?;
        self.state = staged;
        Ok(())
    }

    /// Record a new collection length and reconcile the window against it.
    pub fn set_length(&mut self, length: usize) -> EngineResult<()> {
        self.apply(|state, scroll| {
            state.length = length;
            state.reconcile();
            state.follow(scroll);
        })
    }

    pub fn reconcile(&mut self) -> EngineResult<()> {
        self.apply(|_, _| {})
    }

    pub fn next_item(&mut self) -> EngineResult<()> {
        let circular = self.circular;
        self.apply(|state, scroll| {
            if state.length == 0 {
                return;
            }
            if state.idx + 1 < state.length {
                state.idx += 1;
            } else if circular {
                state.idx = 0;
            } else {
                return;
            }
            state.follow(scroll);
        })
    }

    pub fn prev_item(&mut self) -> EngineResult<()> {
        let circular = self.circular;
        self.apply(|state, scroll| {
            if state.length == 0 {
                return;
            }
            if state.idx > 0 {
                state.idx -= 1;
            } else if circular {
                state.idx = state.length - 1;
            } else {
                return;
            }
            state.follow(scroll);
        })
    }

    /// Focus `index`, clamped into the collection.
    pub fn go_to_index(&mut self, index: usize) -> EngineResult<()> {
        self.apply(|state, scroll| {
            if state.length == 0 {
                return;
            }
            state.idx = index.min(state.length - 1);
            state.follow(scroll);
        })
    }

    pub fn scroll_down(&mut self) -> EngineResult<()> {
        let circular = self.circular;
        self.apply(|state, scroll| {
            if state.length == 0 {
                return;
            }
            let step = (state.target_width() / 2).max(1);
            let target = state.idx + step;
            state.idx = if target < state.length {
                target
            } else if circular {
                target % state.length
            } else {
                state.length - 1
            };
            state.follow(scroll);
        })
    }

    pub fn scroll_up(&mut self) -> EngineResult<()> {
        let circular = self.circular;
        self.apply(|state, scroll| {
            if state.length == 0 {
                return;
            }
            let step = (state.target_width() / 2).max(1);
            state.idx = if state.idx >= step {
                state.idx - step
            } else if circular {
                (state.idx + state.length - step % state.length) % state.length
            } else {
                0
            };
            state.follow(scroll);
        })
    }

    /// Resize the window toward `size` without pushing `idx` out of frame.
    pub fn modify_win_size(&mut self, size: usize) -> EngineResult<()> {
        self.apply(|state, scroll| {
            state.resize(size);
            if scroll == ScrollMode::Centered {
                state.follow(scroll);
            }
        })
    }

    pub fn current_index(&self) -> usize {
        self.state.idx
    }

    pub fn start(&self) -> usize {
        self.state.start
    }

    pub fn end(&self) -> usize {
        self.state.end
    }

    pub fn window_size(&self) -> usize {
        self.state.window_size
    }

    pub fn length(&self) -> usize {
        self.state.length
    }

    pub fn circular(&self) -> bool {
        self.circular
    }

    pub fn set_circular(&mut self, circular: bool) {
        self.circular = circular;
    }

    pub fn scroll_mode(&self) -> ScrollMode {
        self.scroll
    }

    pub fn snapshot(&self) -> ViewportState {
        self.state
    }

    pub fn visible_range(&self) -> Range<usize> {
        self.state.start..self.state.end
    }

    pub fn is_visible(&self, index: usize) -> bool {
        self.visible_range().contains(&index)
    }

    pub fn is_focused(&self, index: usize) -> bool {
        self.state.length > 0 && self.state.idx == index
    }
}

#[cfg(test)]
mod tests {
    use super::{ScrollMode, Viewport, ViewportOptions, ViewportState};

    fn bounds(viewport: &Viewport) -> (usize, usize, usize) {
        (viewport.current_index(), viewport.start(), viewport.end())
    }

    #[test]
    fn edge_mode_bumps_one_position() {
        let mut viewport = Viewport::new(10, ViewportOptions::new(3)).unwrap();
        assert_eq!(bounds(&viewport), (0, 0, 3));
        viewport.next_item().unwrap();
        viewport.next_item().unwrap();
        assert_eq!(bounds(&viewport), (2, 0, 3));
        viewport.next_item().unwrap();
        assert_eq!(bounds(&viewport), (3, 1, 4));
        viewport.prev_item().unwrap();
        viewport.prev_item().unwrap();
        assert_eq!(bounds(&viewport), (1, 1, 4));
        viewport.prev_item().unwrap();
        assert_eq!(bounds(&viewport), (0, 0, 3));
    }

    #[test]
    fn clamped_moves_are_noops_at_boundaries() {
        let mut viewport = Viewport::new(4, ViewportOptions::new(2)).unwrap();
        viewport.prev_item().unwrap();
        assert_eq!(bounds(&viewport), (0, 0, 2));
        viewport.go_to_index(99).unwrap();
        assert_eq!(bounds(&viewport), (3, 2, 4));
        viewport.next_item().unwrap();
        assert_eq!(bounds(&viewport), (3, 2, 4));
    }

    #[test]
    fn circular_wraps_both_ways() {
        let mut viewport = Viewport::new(5, ViewportOptions::new(2).circular(true)).unwrap();
        viewport.prev_item().unwrap();
        assert_eq!(bounds(&viewport), (4, 3, 5));
        viewport.next_item().unwrap();
        assert_eq!(bounds(&viewport), (0, 0, 2));
    }

    #[test]
    fn centered_mode_tracks_midpoint_within_bounds() {
        let mut viewport = Viewport::new(10, ViewportOptions::new(5).centered()).unwrap();
        assert_eq!(viewport.scroll_mode(), ScrollMode::Centered);
        assert_eq!(bounds(&viewport), (0, 0, 5));
        viewport.go_to_index(5).unwrap();
        assert_eq!(bounds(&viewport), (5, 3, 8));
        assert_eq!((viewport.start() + viewport.end()) / 2, 5);
        viewport.go_to_index(9).unwrap();
        assert_eq!(bounds(&viewport), (9, 5, 10));
    }

    #[test]
    fn scroll_jumps_half_a_window() {
        let mut viewport = Viewport::new(20, ViewportOptions::new(6)).unwrap();
        viewport.scroll_down().unwrap();
        assert_eq!(viewport.current_index(), 3);
        viewport.scroll_down().unwrap();
        assert_eq!(bounds(&viewport), (6, 1, 7));
        viewport.scroll_up().unwrap();
        viewport.scroll_up().unwrap();
        viewport.scroll_up().unwrap();
        assert_eq!(viewport.current_index(), 0);

        let mut wrapping = Viewport::new(10, ViewportOptions::new(4).circular(true)).unwrap();
        wrapping.scroll_up().unwrap();
        assert_eq!(wrapping.current_index(), 8);
        wrapping.scroll_down().unwrap();
        assert_eq!(wrapping.current_index(), 0);
    }

    #[test]
    fn resize_keeps_idx_in_frame() {
        let mut viewport = Viewport::new(10, ViewportOptions::new(3)).unwrap();
        viewport.go_to_index(5).unwrap();
        assert_eq!(bounds(&viewport), (5, 3, 6));

        viewport.modify_win_size(6).unwrap();
        assert_eq!(viewport.window_size(), 6);
        assert_eq!(viewport.end() - viewport.start(), 6);
        assert!(viewport.is_visible(5));

        viewport.modify_win_size(1).unwrap();
        assert_eq!(bounds(&viewport), (5, 5, 6));
    }

    #[test]
    fn resize_to_zero_hides_window_and_regrows_around_idx() {
        let mut viewport = Viewport::new(8, ViewportOptions::new(4)).unwrap();
        viewport.go_to_index(6).unwrap();
        viewport.modify_win_size(0).unwrap();
        assert_eq!(bounds(&viewport), (6, 6, 6));
        viewport.next_item().unwrap();
        assert_eq!(bounds(&viewport), (7, 7, 7));
        viewport.modify_win_size(3).unwrap();
        assert_eq!(bounds(&viewport), (7, 5, 8));
    }

    #[test]
    fn shrinking_length_self_heals_window() {
        let mut viewport = Viewport::new(6, ViewportOptions::new(3)).unwrap();
        viewport.go_to_index(5).unwrap();
        assert_eq!(bounds(&viewport), (5, 3, 6));

        viewport.set_length(4).unwrap();
        assert_eq!(bounds(&viewport), (3, 1, 4));

        viewport.set_length(2).unwrap();
        assert_eq!(bounds(&viewport), (1, 0, 2));

        viewport.set_length(0).unwrap();
        assert_eq!(bounds(&viewport), (0, 0, 0));
        viewport.next_item().unwrap();
        assert_eq!(bounds(&viewport), (0, 0, 0));

        viewport.set_length(5).unwrap();
        assert_eq!(bounds(&viewport), (0, 0, 3));
    }

    #[test]
    fn invariant_check_rejects_corrupted_state() {
        let broken = ViewportState {
            idx: 4,
            start: 0,
            end: 3,
            window_size: 3,
            length: 10,
        };
        let err = broken.check().unwrap_err();
        assert!(err.is_defect());
    }
}
