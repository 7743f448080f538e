//! Images of mesh tallies.
//!
//! The view plane cuts one layer out of the mesh. Which layer, and which two
//! mesh axes end up horizontal and vertical, depends only on the view basis
//! and the view origin along the depth axis.

use log::debug;
use ndarray::{s, Array2, ArrayD, Axis, Ix2, IxDyn};
use tallyview_core::selection::selected_positions;
use tallyview_core::{
    Error, MeshFilter, MaskedImage, PlotView, RegularMesh, Result, Selection, Statistic, Tally,
    TallyImage,
};

use crate::reduce::{first_score_unit, reduce_axis, reduce_filter, value_range, Aggregate};
use crate::relative;

/// Reduces a mesh tally to the mesh layer cut by `view`.
///
/// The result has one pixel per voxel with row 0 at the top, and carries the
/// physical extents of the (translated) mesh. Returns `Ok(None)` when the
/// view plane does not cross the mesh. An empty score or nuclide selection
/// yields an all-zero layer.
///
/// # Errors
/// Returns [`Error::MissingMeshFilter`] if the tally has no mesh filter, or
/// an error if the tally data does not fit the mesh or a selected bin is out
/// of range.
pub fn reduce_mesh(
    tally: &Tally,
    statistic: Statistic,
    selection: &Selection,
    mesh_filter: &MeshFilter,
    view: &PlotView,
) -> Result<Option<TallyImage>> {
    let mesh_index = tally
        .mesh_filter_index()
        .ok_or(Error::MissingMeshFilter(tally.id))?;
    let mesh = mesh_filter.effective_mesh();
    let Some(k) = slice_index(&mesh, view) else {
        debug!(
            "tally {}: view at {:?} does not cross mesh {}",
            tally.id, view.origin, mesh.id
        );
        return Ok(None);
    };

    let layer = MeshLayer {
        tally,
        selection,
        mesh_index,
        mesh: &mesh,
        k,
        view,
    };
    let image = match Aggregate::for_statistic(statistic) {
        Some(aggregate) => layer.image(aggregate)?,
        None => {
            let mean = layer.image(Aggregate::Sum)?;
            let std_dev = layer.image(Aggregate::RootSumSquare)?;
            relative::combine_mesh(&mean, &std_dev)
        }
    };
    Ok(Some(image))
}

/// Index of the mesh layer cut by the view plane, if any.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn slice_index(mesh: &RegularMesh, view: &PlotView) -> Option<usize> {
    let (_, _, depth) = view.basis.axes();
    let width = mesh.width()[depth];
    let k = ((view.origin[depth] - mesh.lower_left[depth]) / width).floor();
    if k >= 0.0 && k < mesh.dimension[depth] as f64 {
        Some(k as usize)
    } else {
        None
    }
}

struct MeshLayer<'a> {
    tally: &'a Tally,
    selection: &'a Selection,
    mesh_index: usize,
    mesh: &'a RegularMesh,
    k: usize,
    view: &'a PlotView,
}

impl MeshLayer<'_> {
    fn image(&self, aggregate: Aggregate) -> Result<TallyImage> {
        let mut values = self.reduce(aggregate)?;
        let unit = first_score_unit(self.tally, self.selection);
        let units = if self.view.volume_norm {
            values /= self.mesh.voxel_volume();
            unit.volume_label()
        } else {
            unit.label()
        };

        // row 0 is the top of the image
        let values = values.slice(s![..;-1, ..]).to_owned();
        let (data_min, data_max) = value_range(&values);

        let (h, v, _) = self.view.basis.axes();
        let (ll, ur) = (self.mesh.lower_left, self.mesh.upper_right);
        Ok(TallyImage {
            image: MaskedImage::unmasked(values),
            extents: Some([ll[h], ur[h], ll[v], ur[v]]),
            data_min,
            data_max,
            units: units.to_string(),
        })
    }

    /// Layer `k` with every other axis collapsed, indexed `(v, h)` with the
    /// vertical coordinate increasing along rows.
    fn reduce(&self, aggregate: Aggregate) -> Result<Array2<f64>> {
        let mut data = self.layer(aggregate.source(self.tally))?;

        // remaining axes: [other filters.., score, nuclide, v, h]
        for (index, filter) in self.tally.filters().iter().enumerate() {
            if index != self.mesh_index {
                data = reduce_filter(&data, 0, filter, self.selection, aggregate)?;
            }
        }
        let nuclides = selected_positions(self.tally.nuclides(), &self.selection.nuclides);
        let scores = selected_positions(self.tally.scores(), &self.selection.scores);
        let data = reduce_axis(&data, 1, Some(nuclides.as_slice()), aggregate);
        let data = reduce_axis(&data, 0, Some(scores.as_slice()), aggregate);
        Ok(data.into_dimensionality::<Ix2>()?)
    }

    /// Moves the mesh axis last, unfolds it into `(z, y, x)` and takes layer
    /// `k` along the depth axis.
    fn layer(&self, data: &ArrayD<f64>) -> Result<ArrayD<f64>> {
        let ndim = data.ndim();
        let mut order: Vec<usize> = (0..ndim).filter(|&axis| axis != self.mesh_index).collect();
        order.push(self.mesh_index);

        let [nx, ny, nz] = self.mesh.dimension;
        let mut shape: Vec<usize> = order[..ndim - 1]
            .iter()
            .map(|&axis| data.shape()[axis])
            .collect();
        shape.extend([nz, ny, nx]);

        let grid = data
            .view()
            .permuted_axes(IxDyn(&order))
            .as_standard_layout()
            .into_owned()
            .into_shape_with_order(IxDyn(&shape))?;

        // grid axes end in (z, y, x); depth 0 is x
        let (_, _, depth) = self.view.basis.axes();
        let depth_axis = ndim - 1 + (2 - depth);
        Ok(grid.index_axis_move(Axis(depth_axis), self.k))
    }
}
