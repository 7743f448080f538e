//! Tally results and the statepoint that holds them.

use std::collections::BTreeMap;

use ndarray::ArrayD;

use crate::error::{Error, Result};
use crate::filter::Filter;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Which tally value to display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum Statistic {
    /// Sample mean.
    #[default]
    Mean,
    /// Standard deviation of the mean.
    StdDev,
    /// `100 * std_dev / mean`, in percent.
    RelError,
}

impl std::fmt::Display for Statistic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Statistic::Mean => write!(f, "Mean"),
            Statistic::StdDev => write!(f, "Std. Dev."),
            Statistic::RelError => write!(f, "Rel. Error"),
        }
    }
}

/// A tally read from a statepoint.
///
/// Both result arrays have axes `[filter0, filter1, ..., score, nuclide]`.
#[derive(Debug, Clone)]
pub struct Tally {
    /// Tally id.
    pub id: u32,
    /// Optional display name.
    pub name: Option<String>,
    filters: Vec<Filter>,
    scores: Vec<String>,
    nuclides: Vec<String>,
    mean: ArrayD<f64>,
    std_dev: ArrayD<f64>,
}

impl Tally {
    /// Creates a tally, checking both arrays against the filters, scores and
    /// nuclides.
    ///
    /// # Errors
    /// Returns [`Error::ShapeMismatch`] if either array has the wrong shape,
    /// or [`Error::MultipleMeshFilters`] if more than one mesh filter is given.
    pub fn new(
        id: u32,
        filters: Vec<Filter>,
        scores: Vec<String>,
        nuclides: Vec<String>,
        mean: ArrayD<f64>,
        std_dev: ArrayD<f64>,
    ) -> Result<Self> {
        let expected: Vec<usize> = filters
            .iter()
            .map(Filter::num_bins)
            .chain([scores.len(), nuclides.len()])
            .collect();

        for array in [&mean, &std_dev] {
            if array.shape() != expected.as_slice() {
                return Err(Error::ShapeMismatch {
                    tally: id,
                    expected,
                    found: array.shape().to_vec(),
                });
            }
        }

        if filters.iter().filter(|f| f.as_mesh().is_some()).count() > 1 {
            return Err(Error::MultipleMeshFilters(id));
        }

        Ok(Self {
            id,
            name: None,
            filters,
            scores,
            nuclides,
            mean,
            std_dev,
        })
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Filters in axis order.
    #[must_use]
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Score names in axis order.
    #[must_use]
    pub fn scores(&self) -> &[String] {
        &self.scores
    }

    /// Nuclide names in axis order.
    #[must_use]
    pub fn nuclides(&self) -> &[String] {
        &self.nuclides
    }

    /// Mean values.
    #[must_use]
    pub fn mean(&self) -> &ArrayD<f64> {
        &self.mean
    }

    /// Standard deviations.
    #[must_use]
    pub fn std_dev(&self) -> &ArrayD<f64> {
        &self.std_dev
    }

    /// Result array for a stored statistic.
    ///
    /// Relative error is derived, not stored, so it maps to `None`.
    #[must_use]
    pub fn data(&self, statistic: Statistic) -> Option<&ArrayD<f64>> {
        match statistic {
            Statistic::Mean => Some(&self.mean),
            Statistic::StdDev => Some(&self.std_dev),
            Statistic::RelError => None,
        }
    }

    /// Position of the mesh filter, if any.
    #[must_use]
    pub fn mesh_filter_index(&self) -> Option<usize> {
        self.filters.iter().position(|f| f.as_mesh().is_some())
    }

    /// Returns true if any filter is a distribcell or cell instance filter.
    #[must_use]
    pub fn has_instance_filter(&self) -> bool {
        self.filters.iter().any(Filter::is_instance)
    }

    /// Returns true if any filter partitions space.
    #[must_use]
    pub fn has_spatial_filter(&self) -> bool {
        self.filters.iter().any(Filter::is_spatial)
    }
}

/// Cells that make up each universe, from the statepoint summary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct UniverseCells(BTreeMap<i32, Vec<i32>>);

impl UniverseCells {
    /// Creates an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the cells of a universe.
    pub fn insert(&mut self, universe: i32, cells: Vec<i32>) {
        self.0.insert(universe, cells);
    }

    /// Cells of a universe; empty for unknown universes.
    #[must_use]
    pub fn cells(&self, universe: i32) -> &[i32] {
        self.0.get(&universe).map(Vec::as_slice).unwrap_or_default()
    }
}

impl FromIterator<(i32, Vec<i32>)> for UniverseCells {
    fn from_iter<I: IntoIterator<Item = (i32, Vec<i32>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Tallies and geometry summary loaded from a statepoint.
#[derive(Debug, Clone, Default)]
pub struct StatePoint {
    tallies: BTreeMap<u32, Tally>,
    /// Universe membership from the summary.
    pub universes: UniverseCells,
}

impl StatePoint {
    /// Creates an empty statepoint.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tally, replacing any tally with the same id.
    pub fn add_tally(&mut self, tally: Tally) {
        self.tallies.insert(tally.id, tally);
    }

    /// Looks up a tally.
    ///
    /// # Errors
    /// Returns [`Error::UnknownTally`] if the id is not present.
    pub fn tally(&self, id: u32) -> Result<&Tally> {
        self.tallies.get(&id).ok_or(Error::UnknownTally(id))
    }

    /// Iterates over tallies in id order.
    pub fn tallies(&self) -> impl Iterator<Item = &Tally> {
        self.tallies.values()
    }

    /// Number of tallies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tallies.len()
    }

    /// Returns true if there are no tallies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tallies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterKind;
    use ndarray::IxDyn;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_shape_is_checked() {
        let filters = vec![Filter::new(1, FilterKind::Cell { bins: vec![10, 20] })];
        let good = ArrayD::zeros(IxDyn(&[2, 1, 1]));
        let tally = Tally::new(
            1,
            filters.clone(),
            names(&["flux"]),
            names(&["total"]),
            good.clone(),
            good.clone(),
        )
        .unwrap();
        assert_eq!(tally.data(Statistic::Mean).unwrap().shape(), &[2, 1, 1]);
        assert!(tally.data(Statistic::RelError).is_none());

        let bad = ArrayD::zeros(IxDyn(&[3, 1, 1]));
        let err = Tally::new(1, filters, names(&["flux"]), names(&["total"]), good, bad)
            .unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { tally: 1, .. }));
    }

    #[test]
    fn test_statepoint_lookup() {
        let tally = Tally::new(
            4,
            Vec::new(),
            names(&["flux"]),
            names(&["total"]),
            ArrayD::zeros(IxDyn(&[1, 1])),
            ArrayD::zeros(IxDyn(&[1, 1])),
        )
        .unwrap()
        .with_name("core flux");
        let mut statepoint = StatePoint::new();
        statepoint.add_tally(tally);
        assert_eq!(statepoint.len(), 1);
        assert_eq!(statepoint.tally(4).unwrap().name.as_deref(), Some("core flux"));
        assert_eq!(statepoint.tally(5).unwrap_err(), Error::UnknownTally(5));
    }

    #[test]
    fn test_universe_cells() {
        let universes: UniverseCells = [(1, vec![10, 11])].into_iter().collect();
        assert_eq!(universes.cells(1), &[10, 11]);
        assert!(universes.cells(2).is_empty());
    }
}
