//! Axis reduction shared by every reducer.

use ndarray::{ArrayD, Axis, IxDyn};
use tallyview_core::selection::selected_positions;
use tallyview_core::units::unit_for;
use tallyview_core::{Filter, Result, ScoreUnit, Selection, Statistic, Tally};

/// How bins are combined when an axis is collapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    /// Plain sum, for mean values.
    Sum,
    /// Square root of the sum of squares, for standard deviations.
    RootSumSquare,
}

impl Aggregate {
    /// Aggregate for a stored statistic; `None` for relative error, which is
    /// derived from two passes.
    #[must_use]
    pub fn for_statistic(statistic: Statistic) -> Option<Self> {
        match statistic {
            Statistic::Mean => Some(Aggregate::Sum),
            Statistic::StdDev => Some(Aggregate::RootSumSquare),
            Statistic::RelError => None,
        }
    }

    /// The tally array this aggregate applies to.
    #[must_use]
    pub fn source(self, tally: &Tally) -> &ArrayD<f64> {
        match self {
            Aggregate::Sum => tally.mean(),
            Aggregate::RootSumSquare => tally.std_dev(),
        }
    }
}

/// Collapses `axis` of `data` over the bins in `indices`.
///
/// `None` or an empty list means nothing is selected: the result is a zero
/// array with `axis` removed, not the untouched data.
///
/// # Panics
/// Panics if `axis` is out of bounds or an index exceeds the axis length.
#[must_use]
pub fn reduce_axis(
    data: &ArrayD<f64>,
    axis: usize,
    indices: Option<&[usize]>,
    aggregate: Aggregate,
) -> ArrayD<f64> {
    let axis = Axis(axis);
    match indices {
        Some(indices) if !indices.is_empty() => {
            let selected = data.select(axis, indices);
            match aggregate {
                Aggregate::Sum => selected.sum_axis(axis),
                Aggregate::RootSumSquare => {
                    selected.mapv(|v| v * v).sum_axis(axis).mapv(f64::sqrt)
                }
            }
        }
        _ => {
            let mut shape = data.shape().to_vec();
            shape.remove(axis.index());
            ArrayD::zeros(IxDyn(&shape))
        }
    }
}

/// Collapses a filter axis according to the filter's applied selection.
///
/// # Errors
/// Returns an error if a selected bin is out of range.
pub(crate) fn reduce_filter(
    data: &ArrayD<f64>,
    axis: usize,
    filter: &Filter,
    selection: &Selection,
    aggregate: Aggregate,
) -> Result<ArrayD<f64>> {
    let indices = selection.filters.indices(filter)?;
    Ok(reduce_axis(data, axis, indices.as_deref(), aggregate))
}

/// Collapses the trailing `[.., score, nuclide]` axes over the selected
/// scores and nuclides. Scores are reduced first.
pub(crate) fn reduce_scores_then_nuclides(
    data: &ArrayD<f64>,
    tally: &Tally,
    selection: &Selection,
    aggregate: Aggregate,
) -> ArrayD<f64> {
    let scores = selected_positions(tally.scores(), &selection.scores);
    let nuclides = selected_positions(tally.nuclides(), &selection.nuclides);
    let score_axis = data.ndim() - 2;
    let data = reduce_axis(data, score_axis, Some(scores.as_slice()), aggregate);
    let nuclide_axis = data.ndim() - 1;
    reduce_axis(&data, nuclide_axis, Some(nuclides.as_slice()), aggregate)
}

/// Unit category of the first selected score in tally order.
pub(crate) fn first_score_unit(tally: &Tally, selection: &Selection) -> ScoreUnit {
    tally
        .scores()
        .iter()
        .find(|score| selection.scores.contains(score.as_str()))
        .map_or(ScoreUnit::Reaction, |score| unit_for(score).0)
}

/// `(min, max)` of all values; `(0, 0)` when there are none.
#[must_use]
pub fn value_range<'a>(values: impl IntoIterator<Item = &'a f64>) -> (f64, f64) {
    values
        .into_iter()
        .fold(None, |acc: Option<(f64, f64)>, &v| {
            Some(match acc {
                Some((lo, hi)) => (lo.min(v), hi.max(v)),
                None => (v, v),
            })
        })
        .unwrap_or((0.0, 0.0))
}
