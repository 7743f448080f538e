//! Images of distribcell and cell-instance tallies.

use std::collections::HashMap;

use log::debug;
use ndarray::{Array2, Zip};
use tallyview_core::{
    Error, Filter, FilterKind, IdMap, MaskedImage, Result, Selection, Statistic, Tally, TallyImage,
};

use crate::reduce::{
    first_score_unit, reduce_filter, reduce_scores_then_nuclides, value_range, Aggregate,
};
use crate::relative;

/// Reduces a tally with a distribcell or cell-instance filter to an image
/// over `ids`.
///
/// Every other filter, the scores and the nuclides are collapsed, leaving one
/// value per instance bin. Each selected bin is painted on the pixels whose
/// cell and instance match it; all other pixels stay masked.
///
/// # Errors
/// Returns [`Error::MissingInstanceFilter`] if the tally has no instance
/// filter, or an error if a selected filter bin is out of range.
pub fn reduce_distribcell(
    tally: &Tally,
    statistic: Statistic,
    selection: &Selection,
    ids: &IdMap,
) -> Result<TallyImage> {
    match Aggregate::for_statistic(statistic) {
        Some(aggregate) => instance_pass(tally, aggregate, selection, ids),
        None => {
            let mean = instance_pass(tally, Aggregate::Sum, selection, ids)?;
            let std_dev = instance_pass(tally, Aggregate::RootSumSquare, selection, ids)?;
            relative::combine_masked(&mean, &std_dev)
        }
    }
}

fn instance_pass(
    tally: &Tally,
    aggregate: Aggregate,
    selection: &Selection,
    ids: &IdMap,
) -> Result<TallyImage> {
    let instance_index = tally
        .filters()
        .iter()
        .position(Filter::is_instance)
        .ok_or(Error::MissingInstanceFilter(tally.id))?;
    let instance_filter = &tally.filters()[instance_index];

    let mut data = aggregate.source(tally).clone();
    for (index, filter) in tally.filters().iter().enumerate() {
        if index == instance_index {
            continue;
        }
        // the instance axis sits at 0 until it has been passed
        let axis = usize::from(index > instance_index);
        data = reduce_filter(&data, axis, filter, selection, aggregate)?;
    }
    let data = reduce_scores_then_nuclides(&data, tally, selection, aggregate);
    let (data_min, data_max) = value_range(&data);

    let selected = selection.filters.indices(instance_filter)?.unwrap_or_default();
    let values: HashMap<(i32, i32), f64> = selected
        .into_iter()
        .filter_map(|bin| Some((instance_key(instance_filter, bin)?, data[[bin].as_slice()])))
        .collect();
    debug!(
        "tally {}: painting {} of {} instances",
        tally.id,
        values.len(),
        instance_filter.num_bins()
    );

    let mut out = Array2::from_elem(ids.dim(), f64::NAN);
    Zip::from(&mut out)
        .and(ids.cells())
        .and(ids.instances())
        .for_each(|pixel, &cell, &instance| {
            if let Some(&value) = values.get(&(cell, instance)) {
                *pixel = value;
            }
        });

    Ok(TallyImage {
        image: MaskedImage::masked_where(out, |v| v.is_nan() || v < 0.0),
        extents: None,
        data_min,
        data_max,
        units: first_score_unit(tally, selection).label().to_string(),
    })
}

/// `(cell id, instance)` of an instance filter bin.
fn instance_key(filter: &Filter, bin: usize) -> Option<(i32, i32)> {
    match &filter.kind {
        FilterKind::Distribcell { cell, num_instances } if bin < *num_instances => {
            Some((*cell, i32::try_from(bin).ok()?))
        }
        FilterKind::CellInstance { bins } => bins.get(bin).copied(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array};
    use tallyview_core::{AppliedFilters, FilterSelection};

    fn distribcell_tally() -> (Tally, Filter) {
        let filter = Filter::new(
            4,
            FilterKind::Distribcell {
                cell: 21,
                num_instances: 3,
            },
        );
        let mean = Array::from_shape_vec((3, 1, 1), vec![1.0, 2.0, 3.0])
            .unwrap()
            .into_dyn();
        let std_dev = mean.mapv(|v| v / 10.0);
        let tally = Tally::new(
            9,
            vec![filter.clone()],
            vec!["heating".into()],
            vec!["total".into()],
            mean,
            std_dev,
        )
        .unwrap();
        (tally, filter)
    }

    fn map() -> IdMap {
        IdMap::new(
            array![[21, 21, 21, 5]],
            array![[0, 1, 2, 0]],
            Array2::zeros((1, 4)),
        )
        .unwrap()
    }

    #[test]
    fn test_instances_painted() {
        let (tally, filter) = distribcell_tally();
        let selection = Selection::new()
            .with_filters(AppliedFilters::all([&filter]))
            .with_score("heating")
            .with_nuclide("total");
        let image = reduce_distribcell(&tally, Statistic::Mean, &selection, &map()).unwrap();
        assert_eq!(image.image.get(0, 0), Some(1.0));
        assert_eq!(image.image.get(0, 2), Some(3.0));
        assert_eq!(image.image.get(0, 3), None);
        assert_eq!(image.units, "eV per Source Particle");
        assert_eq!((image.data_min, image.data_max), (1.0, 3.0));
    }

    #[test]
    fn test_partial_instances() {
        let (tally, filter) = distribcell_tally();
        let selection = Selection::new()
            .with_filters(AppliedFilters::new().with(filter.id, FilterSelection::Partial(vec![1])))
            .with_score("heating")
            .with_nuclide("total");
        let image = reduce_distribcell(&tally, Statistic::RelError, &selection, &map()).unwrap();
        assert_eq!(image.image.count_valid(), 1);
        assert!((image.image.get(0, 1).unwrap() - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_cell_instance_bins() {
        let filter = Filter::new(
            2,
            FilterKind::CellInstance {
                bins: vec![(5, 0), (21, 2)],
            },
        );
        assert_eq!(instance_key(&filter, 1), Some((21, 2)));
        assert_eq!(instance_key(&filter, 2), None);

        let (tally, _) = distribcell_tally();
        let no_instances = Tally::new(
            1,
            Vec::new(),
            tally.scores().to_vec(),
            tally.nuclides().to_vec(),
            array![[1.0]].into_dyn(),
            array![[1.0]].into_dyn(),
        )
        .unwrap();
        let err = reduce_distribcell(&no_instances, Statistic::Mean, &Selection::new(), &map())
            .unwrap_err();
        assert_eq!(err, Error::MissingInstanceFilter(1));
    }
}
