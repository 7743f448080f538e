//! View history: default, current and active views with undo/redo.
//!
//! The active view collects edits that have not been applied yet. Applying
//! promotes it to the current view and pushes the old current view onto the
//! undo stack.

use crate::view::{PlotView, ViewParams};

/// Holds the views that drive each reduction request.
#[derive(Debug, Clone)]
pub struct PlotViewState {
    default: PlotView,
    current: PlotView,
    /// View being edited; becomes current on [`PlotViewState::apply`].
    pub active: PlotView,
    previous: Vec<PlotView>,
    subsequent: Vec<PlotView>,
    rendered: Option<ViewParams>,
}

impl PlotViewState {
    /// Starts from a default view.
    #[must_use]
    pub fn new(default: PlotView) -> Self {
        Self {
            current: default.clone(),
            active: default.clone(),
            default,
            previous: Vec::new(),
            subsequent: Vec::new(),
            rendered: None,
        }
    }

    /// The default view.
    #[must_use]
    pub fn default_view(&self) -> &PlotView {
        &self.default
    }

    /// The displayed view.
    #[must_use]
    pub fn current(&self) -> &PlotView {
        &self.current
    }

    /// Returns true if undo has something to restore.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.previous.is_empty()
    }

    /// Returns true if redo has something to restore.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.subsequent.is_empty()
    }

    /// Applies the active view, recording the current one for undo.
    ///
    /// A fresh edit invalidates the redo history. Returns false, leaving the
    /// history untouched, if there are no changes to apply.
    pub fn apply(&mut self) -> bool {
        if self.active == self.current {
            return false;
        }
        self.store_current();
        self.subsequent.clear();
        self.make_current();
        true
    }

    /// Reverts to the previous view. Returns false if there is none.
    pub fn undo(&mut self) -> bool {
        let Some(view) = self.previous.pop() else {
            return false;
        };
        self.subsequent.push(self.current.clone());
        self.active = view;
        self.make_current();
        true
    }

    /// Re-applies an undone view. Returns false if there is none.
    pub fn redo(&mut self) -> bool {
        let Some(view) = self.subsequent.pop() else {
            return false;
        };
        self.store_current();
        self.active = view;
        self.make_current();
        true
    }

    /// Moves back to the default geometry, keeping the current one for undo.
    ///
    /// Only origin, size, resolution and basis are reset; the tally,
    /// statistic, selection and coloring stay as they are. Returns false if
    /// the current geometry already is the default.
    pub fn restore_default(&mut self) -> bool {
        let params = self.default.params();
        if self.current.params() == params {
            return false;
        }
        self.active.adopt_params(params);
        self.apply()
    }

    /// Returns true if the geometry maps must be recomputed for the active
    /// view: nothing has been rendered yet, or its geometry differs.
    #[must_use]
    pub fn needs_geometry_refresh(&self) -> bool {
        self.rendered != Some(self.active.params())
    }

    /// Records that the engine produced maps for the active view.
    pub fn mark_rendered(&mut self) {
        self.rendered = Some(self.active.params());
    }

    fn store_current(&mut self) {
        self.previous.push(self.current.clone());
    }

    fn make_current(&mut self) {
        self.current = self.active.clone();
    }
}
