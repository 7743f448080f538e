//! User selections: which filter bins, scores and nuclides take part in a
//! reduction.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Error, Result};
use crate::filter::Filter;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Name of the aggregate score/nuclide.
pub const TOTAL: &str = "total";

/// Bin selection for a single filter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum FilterSelection {
    /// Every bin is included.
    All,
    /// Only the listed bin indices are included.
    Partial(Vec<usize>),
    /// No bin is included; the filter contributes zero.
    #[default]
    None,
}

impl FilterSelection {
    /// Resolves the selection against a filter's bin count.
    ///
    /// Returns `None` when nothing is selected, including an empty
    /// `Partial` list.
    ///
    /// # Errors
    /// Returns [`Error::BinOutOfRange`] if a partial index is not a bin of
    /// `filter`.
    pub fn indices(&self, filter: &Filter) -> Result<Option<Vec<usize>>> {
        let n_bins = filter.num_bins();
        match self {
            FilterSelection::All => Ok(Some((0..n_bins).collect())),
            FilterSelection::None => Ok(None),
            FilterSelection::Partial(indices) if indices.is_empty() => Ok(None),
            FilterSelection::Partial(indices) => {
                if let Some(&index) = indices.iter().find(|&&index| index >= n_bins) {
                    return Err(Error::BinOutOfRange {
                        filter: filter.id,
                        index,
                        n_bins,
                    });
                }
                Ok(Some(indices.clone()))
            }
        }
    }

    /// Returns true if no bin is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            FilterSelection::All => false,
            FilterSelection::Partial(indices) => indices.is_empty(),
            FilterSelection::None => true,
        }
    }
}

/// Applied bin selections keyed by filter id.
///
/// A filter without an entry is treated as [`FilterSelection::None`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct AppliedFilters(BTreeMap<u32, FilterSelection>);

impl AppliedFilters {
    /// Creates an empty set of selections.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects every bin of every filter.
    #[must_use]
    pub fn all<'a>(filters: impl IntoIterator<Item = &'a Filter>) -> Self {
        Self(
            filters
                .into_iter()
                .map(|filter| (filter.id, FilterSelection::All))
                .collect(),
        )
    }

    /// Sets the selection for a filter.
    pub fn set(&mut self, filter_id: u32, selection: FilterSelection) {
        self.0.insert(filter_id, selection);
    }

    /// Builder form of [`AppliedFilters::set`].
    #[must_use]
    pub fn with(mut self, filter_id: u32, selection: FilterSelection) -> Self {
        self.set(filter_id, selection);
        self
    }

    /// Selection for a filter id.
    #[must_use]
    pub fn get(&self, filter_id: u32) -> &FilterSelection {
        const NONE: &FilterSelection = &FilterSelection::None;
        self.0.get(&filter_id).unwrap_or(NONE)
    }

    /// Resolves the selected indices for `filter`.
    ///
    /// # Errors
    /// Returns [`Error::BinOutOfRange`] for invalid partial indices.
    pub fn indices(&self, filter: &Filter) -> Result<Option<Vec<usize>>> {
        self.get(filter.id).indices(filter)
    }
}

/// Everything the user has applied for the selected tally.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Selection {
    /// Filter bin selections.
    #[cfg_attr(feature = "serde", serde(default))]
    pub filters: AppliedFilters,
    /// Selected score names.
    #[cfg_attr(feature = "serde", serde(default))]
    pub scores: BTreeSet<String>,
    /// Selected nuclide names.
    #[cfg_attr(feature = "serde", serde(default))]
    pub nuclides: BTreeSet<String>,
}

impl Selection {
    /// Creates an empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the filter selections.
    #[must_use]
    pub fn with_filters(mut self, filters: AppliedFilters) -> Self {
        self.filters = filters;
        self
    }

    /// Adds a score, keeping `"total"` exclusive.
    #[must_use]
    pub fn with_score(mut self, score: &str) -> Self {
        self.select_score(score);
        self
    }

    /// Adds a nuclide, keeping `"total"` exclusive.
    #[must_use]
    pub fn with_nuclide(mut self, nuclide: &str) -> Self {
        self.select_nuclide(nuclide);
        self
    }

    /// Selects a score. Selecting `"total"` clears every other score and
    /// selecting anything else clears `"total"`.
    pub fn select_score(&mut self, score: &str) {
        select_exclusive(&mut self.scores, score);
    }

    /// Selects a nuclide with the same `"total"` rule as scores.
    pub fn select_nuclide(&mut self, nuclide: &str) {
        select_exclusive(&mut self.nuclides, nuclide);
    }

    /// Removes a score.
    pub fn deselect_score(&mut self, score: &str) {
        self.scores.remove(score);
    }

    /// Removes a nuclide.
    pub fn deselect_nuclide(&mut self, nuclide: &str) {
        self.nuclides.remove(nuclide);
    }
}

fn select_exclusive(set: &mut BTreeSet<String>, name: &str) {
    if name == TOTAL {
        set.clear();
    } else {
        set.remove(TOTAL);
    }
    set.insert(name.to_string());
}

/// Indices of `names` that appear in `selected`, in `names` order.
#[must_use]
pub fn selected_positions(names: &[String], selected: &BTreeSet<String>) -> Vec<usize> {
    names
        .iter()
        .enumerate()
        .filter(|(_, name)| selected.contains(name.as_str()))
        .map(|(index, _)| index)
        .collect()
}
