//! Choosing a reducer for the selected tally.

use log::{debug, info};
use thiserror::Error;
use tallyview_core::{
    resolve_units, IdMap, IncompatibleUnits, PlotView, Result, StatePoint, TallyImage,
    UnitWarnings,
};

use crate::distribcell::reduce_distribcell;
use crate::domain::reduce_domain;
use crate::mesh::reduce_mesh;

/// Why no tally image was produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NoImage {
    /// The view has no tally selected.
    #[error("no tally is selected")]
    NoTallySelected,
    /// The tally overlay is switched off.
    #[error("the tally overlay is hidden")]
    TallyHidden,
    /// No score or no nuclide is selected.
    #[error("at least one score and one nuclide must be selected")]
    EmptySelection,
    /// The selected scores cannot be summed.
    #[error(transparent)]
    IncompatibleUnits(IncompatibleUnits),
    /// The view plane does not cross the tally's mesh.
    #[error("the current view does not intersect the mesh of tally {tally}")]
    SliceOutOfRange {
        /// Tally id.
        tally: u32,
    },
}

/// Result of a tally image request.
#[derive(Debug, Clone, PartialEq)]
pub enum TallyImageOutcome {
    /// A reduced image.
    Image(TallyImage),
    /// Nothing to draw, and why.
    NoImage(NoImage),
}

impl TallyImageOutcome {
    /// The image, if one was produced.
    #[must_use]
    pub fn image(&self) -> Option<&TallyImage> {
        match self {
            TallyImageOutcome::Image(image) => Some(image),
            TallyImageOutcome::NoImage(_) => None,
        }
    }

    /// Consumes the outcome, returning the image if one was produced.
    #[must_use]
    pub fn into_image(self) -> Option<TallyImage> {
        match self {
            TallyImageOutcome::Image(image) => Some(image),
            TallyImageOutcome::NoImage(_) => None,
        }
    }

    /// Message for the user when no image was produced.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        match self {
            TallyImageOutcome::Image(_) => None,
            TallyImageOutcome::NoImage(reason) => Some(reason.to_string()),
        }
    }
}

impl From<NoImage> for TallyImageOutcome {
    fn from(reason: NoImage) -> Self {
        TallyImageOutcome::NoImage(reason)
    }
}

/// Produces the overlay image for the tally selected in `view`.
///
/// Mesh tallies go to the mesh reducer, tallies with a distribcell or
/// cell-instance filter to the instance reducer, and everything else to the
/// domain reducer. User-level conditions such as an empty selection or
/// incompatible score units come back as [`TallyImageOutcome::NoImage`].
///
/// # Errors
/// Returns an error for malformed input: an unknown tally, an id map that
/// does not match the view resolution, or an out-of-range filter bin.
pub fn create_tally_image(
    statepoint: &StatePoint,
    view: &PlotView,
    ids: &IdMap,
    warnings: &mut UnitWarnings,
) -> Result<TallyImageOutcome> {
    let Some(tally_id) = view.selected_tally else {
        return Ok(NoImage::NoTallySelected.into());
    };
    if !view.tally_visible {
        return Ok(NoImage::TallyHidden.into());
    }
    let selection = &view.selection;
    if selection.scores.is_empty() || selection.nuclides.is_empty() {
        return Ok(NoImage::EmptySelection.into());
    }

    let tally = statepoint.tally(tally_id)?;
    ids.check_resolution(view.v_res, view.h_res)?;

    if let Err(err) = resolve_units(selection.scores.iter().map(String::as_str), warnings) {
        info!("tally {tally_id}: {err}");
        return Ok(NoImage::IncompatibleUnits(err).into());
    }

    let mesh_filter = tally
        .mesh_filter_index()
        .and_then(|index| tally.filters()[index].as_mesh());
    let image = if let Some(mesh_filter) = mesh_filter {
        debug!("tally {tally_id}: mesh image, basis {}", view.basis);
        match reduce_mesh(tally, view.statistic, selection, mesh_filter, view)? {
            Some(image) => image,
            None => return Ok(NoImage::SliceOutOfRange { tally: tally_id }.into()),
        }
    } else if tally.has_instance_filter() {
        debug!("tally {tally_id}: distribcell image");
        reduce_distribcell(tally, view.statistic, selection, ids)?
    } else {
        debug!("tally {tally_id}: domain image");
        reduce_domain(tally, view.statistic, selection, ids, &statepoint.universes)?
    };
    Ok(TallyImageOutcome::Image(image))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array, Array2};
    use tallyview_core::{AppliedFilters, Filter, FilterKind, Selection, Statistic, Tally};

    fn statepoint() -> (StatePoint, Filter) {
        let filter = Filter::new(1, FilterKind::Cell { bins: vec![10] });
        let mean = Array::from_shape_vec((1, 2, 1), vec![2.0, 3.0])
            .unwrap()
            .into_dyn();
        let tally = Tally::new(
            5,
            vec![filter.clone()],
            vec!["flux".into(), "fission".into()],
            vec!["total".into()],
            mean.clone(),
            mean,
        )
        .unwrap();
        let mut statepoint = StatePoint::new();
        statepoint.add_tally(tally);
        (statepoint, filter)
    }

    fn view(filter: &Filter) -> PlotView {
        let mut view = PlotView::new([0.0; 3], 1.0, 1.0);
        view.h_res = 2;
        view.v_res = 1;
        view.selected_tally = Some(5);
        view.selection = Selection::new()
            .with_filters(AppliedFilters::all([filter]))
            .with_score("flux")
            .with_nuclide("total");
        view
    }

    fn ids() -> IdMap {
        IdMap::new(array![[10, 11]], Array2::zeros((1, 2)), Array2::zeros((1, 2))).unwrap()
    }

    #[test]
    fn test_no_image_reasons() {
        let (statepoint, filter) = statepoint();
        let mut warnings = UnitWarnings::new();

        let mut unselected = view(&filter);
        unselected.selected_tally = None;
        let outcome = create_tally_image(&statepoint, &unselected, &ids(), &mut warnings).unwrap();
        assert_eq!(outcome, TallyImageOutcome::NoImage(NoImage::NoTallySelected));

        let mut hidden = view(&filter);
        hidden.tally_visible = false;
        let outcome = create_tally_image(&statepoint, &hidden, &ids(), &mut warnings).unwrap();
        assert_eq!(outcome, TallyImageOutcome::NoImage(NoImage::TallyHidden));

        let mut empty = view(&filter);
        empty.selection.nuclides.clear();
        let outcome = create_tally_image(&statepoint, &empty, &ids(), &mut warnings).unwrap();
        assert_eq!(outcome, TallyImageOutcome::NoImage(NoImage::EmptySelection));
        assert!(outcome.message().is_some());
    }

    #[test]
    fn test_incompatible_units_refused() {
        let (statepoint, filter) = statepoint();
        let mut mixed = view(&filter);
        mixed.selection.select_score("fission");
        let outcome =
            create_tally_image(&statepoint, &mixed, &ids(), &mut UnitWarnings::new()).unwrap();
        assert!(outcome.image().is_none());
        assert!(matches!(
            outcome,
            TallyImageOutcome::NoImage(NoImage::IncompatibleUnits(_))
        ));
        assert!(outcome
            .message()
            .unwrap()
            .contains("incompatible units"));
    }

    #[test]
    fn test_domain_dispatch() {
        let (statepoint, filter) = statepoint();
        let mut view = view(&filter);
        view.statistic = Statistic::Mean;
        let outcome =
            create_tally_image(&statepoint, &view, &ids(), &mut UnitWarnings::new()).unwrap();
        let image = outcome.into_image().unwrap();
        assert_eq!(image.image.get(0, 0), Some(2.0));
        assert_eq!(image.image.get(0, 1), None);
        assert_eq!(image.units, "Particle-cm per Source Particle");
    }

    #[test]
    fn test_resolution_mismatch_is_an_error() {
        let (statepoint, filter) = statepoint();
        let mut view = view(&filter);
        view.h_res = 3;
        assert!(create_tally_image(&statepoint, &view, &ids(), &mut UnitWarnings::new()).is_err());
    }
}
