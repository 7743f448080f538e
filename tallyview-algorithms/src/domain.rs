//! Images of tallies indexed by cell, material or universe.
//!
//! Every spatial filter bin corresponds to a set of pixels in the id map.
//! The tally is reduced down to one value per combination of selected
//! spatial bins, and each value is painted onto the pixels that match the
//! whole combination.

use log::debug;
use ndarray::{indices, Array2, ArrayD, Dimension, IxDyn, Zip};
use tallyview_core::{
    Filter, FilterKind, IdMap, MaskedImage, Result, Selection, Statistic, Tally, TallyImage,
    UniverseCells,
};

use crate::reduce::{
    first_score_unit, reduce_axis, reduce_filter, reduce_scores_then_nuclides, value_range,
    Aggregate,
};
use crate::relative;

/// Value of pixels that no bin was painted on.
const UNPAINTED: f64 = -1.0;

/// Reduces a domain-indexed tally to an image over `ids`.
///
/// Cell, material and universe filters are kept as painting axes; all other
/// filters are collapsed over their selected bins. Pixels no bin maps to
/// stay masked, as do pixels whose value is exactly zero. The image has no
/// extents of its own and covers the view that produced `ids`.
///
/// # Errors
/// Returns an error if a selected filter bin is out of range.
pub fn reduce_domain(
    tally: &Tally,
    statistic: Statistic,
    selection: &Selection,
    ids: &IdMap,
    universes: &UniverseCells,
) -> Result<TallyImage> {
    match Aggregate::for_statistic(statistic) {
        Some(aggregate) => domain_pass(tally, aggregate, selection, ids, universes),
        None => {
            let mean = domain_pass(tally, Aggregate::Sum, selection, ids, universes)?;
            let std_dev = domain_pass(tally, Aggregate::RootSumSquare, selection, ids, universes)?;
            relative::combine_masked(&mean, &std_dev)
        }
    }
}

fn domain_pass(
    tally: &Tally,
    aggregate: Aggregate,
    selection: &Selection,
    ids: &IdMap,
    universes: &UniverseCells,
) -> Result<TallyImage> {
    let mut data = aggregate.source(tally).clone();

    // filters kept for painting, with their selected bins
    let mut painted: Vec<(&Filter, Vec<usize>)> = Vec::new();
    for filter in tally.filters() {
        let axis = painted.len();
        let selected = selection.filters.indices(filter)?;
        match selected {
            Some(bins) if filter.is_domain() => painted.push((filter, bins)),
            _ if filter.is_domain() => {
                // an unselected spatial filter suppresses the whole image
                data = reduce_axis(&data, axis, None, aggregate);
            }
            _ => data = reduce_filter(&data, axis, filter, selection, aggregate)?,
        }
    }
    let data = reduce_scores_then_nuclides(&data, tally, selection, aggregate);
    let (data_min, data_max) = value_range(&data);

    debug!(
        "tally {}: painting {} spatial filter(s) over {:?} combinations",
        tally.id,
        painted.len(),
        data.shape()
    );

    let out = paint(&data, &painted, ids, universes);
    Ok(TallyImage {
        image: MaskedImage::masked_where(out, |v| v < 0.0),
        extents: None,
        data_min,
        data_max,
        units: first_score_unit(tally, selection).label().to_string(),
    })
}

/// Paints every combination of selected spatial bins onto the id map.
#[allow(clippy::float_cmp)]
fn paint(
    data: &ArrayD<f64>,
    painted: &[(&Filter, Vec<usize>)],
    ids: &IdMap,
    universes: &UniverseCells,
) -> Array2<f64> {
    let mut out = Array2::from_elem(ids.dim(), UNPAINTED);
    if painted.iter().any(|(_, bins)| bins.is_empty()) {
        return out;
    }

    let shape: Vec<usize> = painted.iter().map(|(_, bins)| bins.len()).collect();
    let mut bins = vec![0; painted.len()];
    for combination in indices(IxDyn(&shape)) {
        for (axis, &position) in combination.slice().iter().enumerate() {
            bins[axis] = painted[axis].1[position];
        }

        let value = data[bins.as_slice()];
        // zero is treated as no data
        if value == 0.0 {
            continue;
        }

        Zip::from(&mut out)
            .and(ids.cells())
            .and(ids.materials())
            .for_each(|pixel, &cell, &material| {
                let matches = painted.iter().zip(&bins).all(|((filter, _), &bin)| {
                    bin_matches(filter, bin, cell, material, universes)
                });
                if matches {
                    *pixel = value;
                }
            });
    }
    out
}

/// Returns true if a pixel with `cell` and `material` belongs to `bin`.
fn bin_matches(
    filter: &Filter,
    bin: usize,
    cell: i32,
    material: i32,
    universes: &UniverseCells,
) -> bool {
    match &filter.kind {
        FilterKind::Cell { bins } => bins.get(bin) == Some(&cell),
        FilterKind::Material { bins } => bins.get(bin) == Some(&material),
        FilterKind::Universe { bins } => bins
            .get(bin)
            .is_some_and(|&universe| universes.cells(universe).contains(&cell)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array};
    use tallyview_core::{AppliedFilters, FilterSelection};

    fn ids(cells: Array2<i32>, materials: Array2<i32>) -> IdMap {
        let instances = Array2::zeros(cells.dim());
        IdMap::new(cells, instances, materials).unwrap()
    }

    #[test]
    fn test_universe_bins_paint_member_cells() {
        let filter = Filter::new(3, FilterKind::Universe { bins: vec![1, 2] });
        let mean = array![[[4.0]], [[8.0]]].into_dyn();
        let tally = Tally::new(
            1,
            vec![filter.clone()],
            vec!["fission".into()],
            vec!["total".into()],
            mean.clone(),
            mean,
        )
        .unwrap();
        let universes: UniverseCells = [(1, vec![10, 11]), (2, vec![12])].into_iter().collect();
        let selection = Selection::new()
            .with_filters(AppliedFilters::all([&filter]))
            .with_score("fission")
            .with_nuclide("total");

        let map = ids(array![[10, 11, 12, -2]], Array2::zeros((1, 4)));
        let image = reduce_domain(&tally, Statistic::Mean, &selection, &map, &universes).unwrap();
        assert_eq!(image.image.get(0, 0), Some(4.0));
        assert_eq!(image.image.get(0, 1), Some(4.0));
        assert_eq!(image.image.get(0, 2), Some(8.0));
        assert_eq!(image.image.get(0, 3), None);
        assert_eq!(image.units, "Reactions per Source Particle");
    }

    #[test]
    fn test_cell_and_material_combination() {
        let cells = Filter::new(1, FilterKind::Cell { bins: vec![5, 6] });
        let materials = Filter::new(2, FilterKind::Material { bins: vec![1, 2] });
        let mean = array![[1.0, 2.0], [3.0, 4.0]]
            .into_shape_with_order((2, 2, 1, 1))
            .unwrap()
            .into_dyn();
        let tally = Tally::new(
            1,
            vec![cells.clone(), materials.clone()],
            vec!["flux".into()],
            vec!["total".into()],
            mean.clone(),
            mean,
        )
        .unwrap();
        let selection = Selection::new()
            .with_filters(AppliedFilters::all([&cells, &materials]))
            .with_score("flux")
            .with_nuclide("total");

        let map = ids(array![[5, 5, 6, 6]], array![[1, 2, 1, 2]]);
        let image = reduce_domain(&tally, Statistic::Mean, &selection, &map, &UniverseCells::new())
            .unwrap();
        let painted: Vec<Option<f64>> = (0..4).map(|c| image.image.get(0, c)).collect();
        assert_eq!(painted, vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0)]);
        assert_eq!((image.data_min, image.data_max), (1.0, 4.0));
    }

    #[test]
    fn test_energy_filter_collapsed() {
        let cells = Filter::new(1, FilterKind::Cell { bins: vec![5] });
        let energy = Filter::new(
            2,
            FilterKind::Energy {
                edges: vec![0.0, 1.0, 2.0, 3.0],
            },
        );
        let mean = Array::from_shape_vec((1, 3, 1, 1), vec![1.0, 10.0, 100.0])
            .unwrap()
            .into_dyn();
        let tally = Tally::new(
            1,
            vec![cells.clone(), energy.clone()],
            vec!["flux".into()],
            vec!["total".into()],
            mean.clone(),
            mean,
        )
        .unwrap();
        let map = ids(array![[5]], array![[0]]);

        let selection = Selection::new()
            .with_filters(
                AppliedFilters::all([&cells]).with(2, FilterSelection::Partial(vec![0, 2])),
            )
            .with_score("flux")
            .with_nuclide("total");
        let image = reduce_domain(&tally, Statistic::Mean, &selection, &map, &UniverseCells::new())
            .unwrap();
        assert_eq!(image.image.get(0, 0), Some(101.0));

        // deselecting every energy bin leaves no data at all
        let selection = Selection {
            filters: AppliedFilters::all([&cells]),
            ..selection
        };
        let image = reduce_domain(&tally, Statistic::Mean, &selection, &map, &UniverseCells::new())
            .unwrap();
        assert_eq!(image.image.count_valid(), 0);
    }

    #[test]
    fn test_empty_scores_mask_everything() {
        let cells = Filter::new(1, FilterKind::Cell { bins: vec![5] });
        let mean = array![[[2.0]]].into_dyn();
        let tally = Tally::new(
            1,
            vec![cells.clone()],
            vec!["flux".into()],
            vec!["total".into()],
            mean.clone(),
            mean,
        )
        .unwrap();
        let selection = Selection::new()
            .with_filters(AppliedFilters::all([&cells]))
            .with_nuclide("total");
        let image = reduce_domain(
            &tally,
            Statistic::Mean,
            &selection,
            &ids(array![[5]], array![[0]]),
            &UniverseCells::new(),
        )
        .unwrap();
        assert_eq!(image.image.count_valid(), 0);
        assert_eq!((image.data_min, image.data_max), (0.0, 0.0));
    }
}
