//! Volumetric export: a stack of `xy` slices through a box.
//!
//! Each slice is rendered by the geometry engine at the slice height and the
//! tally is reduced exactly as for an interactive view. Slices are stacked
//! into `(z, y, x)` arrays with `y` increasing along the second axis.

use log::{info, warn};
use ndarray::{s, Array2, Array3, ArrayView2};
use tallyview_core::{
    Basis, Error, GeometryEngine, PlotView, Result, StatePoint, TallyImage, UnitWarnings,
};

use crate::pipeline::create_tally_image;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Box and voxel counts of a volumetric export.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExportRegion {
    /// Lower-left corner.
    pub lower_left: [f64; 3],
    /// Upper-right corner.
    pub upper_right: [f64; 3],
    /// Voxel counts along x, y, z.
    pub resolution: [usize; 3],
}

impl ExportRegion {
    /// Creates a region.
    ///
    /// # Errors
    /// Returns [`Error::InvalidView`] if a bound is not finite, a corner is
    /// inverted or a resolution is zero.
    pub fn new(
        lower_left: [f64; 3],
        upper_right: [f64; 3],
        resolution: [usize; 3],
    ) -> Result<Self> {
        for axis in 0..3 {
            if !(lower_left[axis].is_finite() && upper_right[axis].is_finite()) {
                return Err(Error::InvalidView(format!(
                    "export bounds must be finite along axis {axis}"
                )));
            }
            if lower_left[axis] >= upper_right[axis] {
                return Err(Error::InvalidView(format!(
                    "export lower-left {} is not below upper-right {} along axis {axis}",
                    lower_left[axis], upper_right[axis]
                )));
            }
            if resolution[axis] == 0 {
                return Err(Error::InvalidView(format!(
                    "export resolution is zero along axis {axis}"
                )));
            }
        }
        Ok(Self {
            lower_left,
            upper_right,
            resolution,
        })
    }

    /// Voxel size along each axis.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn spacing(&self) -> [f64; 3] {
        std::array::from_fn(|axis| {
            (self.upper_right[axis] - self.lower_left[axis]) / self.resolution[axis] as f64
        })
    }

    /// Heights of the slice planes, through the voxel centers.
    #[allow(clippy::cast_precision_loss)]
    pub fn slice_heights(&self) -> impl Iterator<Item = f64> + '_ {
        let dz = self.spacing()[2];
        let z0 = self.lower_left[2] + dz / 2.0;
        (0..self.resolution[2]).map(move |k| z0 + k as f64 * dz)
    }

    /// The `xy` view of slice `z`, carrying the tally settings of `base`.
    #[must_use]
    pub fn slice_view(&self, base: &PlotView, z: f64) -> PlotView {
        let (ll, ur) = (self.lower_left, self.upper_right);
        let mut view = base.clone();
        view.origin = [(ll[0] + ur[0]) / 2.0, (ll[1] + ur[1]) / 2.0, z];
        view.width = ur[0] - ll[0];
        view.height = ur[1] - ll[1];
        view.h_res = self.resolution[0];
        view.v_res = self.resolution[1];
        view.basis = Basis::Xy;
        view
    }
}

/// Which layers to export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExportOptions {
    /// Tally values of the view's selected tally.
    pub tally: bool,
    /// Cell ids.
    pub cells: bool,
    /// Material ids.
    pub materials: bool,
    /// Temperatures.
    pub temperature: bool,
    /// Densities.
    pub density: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            tally: true,
            cells: false,
            materials: false,
            temperature: false,
            density: false,
        }
    }
}

/// Exported layers, each shaped `(z, y, x)`.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeData {
    /// The exported box.
    pub region: ExportRegion,
    /// Unit label of the tally layer.
    pub units: Option<String>,
    /// Tally values; NaN where a slice has no value.
    pub tally: Option<Array3<f64>>,
    /// Cell ids.
    pub cells: Option<Array3<i32>>,
    /// Material ids.
    pub materials: Option<Array3<i32>>,
    /// Temperatures; NaN where missing.
    pub temperature: Option<Array3<f64>>,
    /// Densities; NaN where missing.
    pub density: Option<Array3<f64>>,
}

impl VolumeData {
    fn empty(region: &ExportRegion, options: &ExportOptions) -> Self {
        let [nx, ny, nz] = region.resolution;
        let shape = (nz, ny, nx);
        let float_layer = |enabled: bool| enabled.then(|| Array3::from_elem(shape, f64::NAN));
        let id_layer = |enabled: bool| enabled.then(|| Array3::zeros(shape));
        Self {
            region: region.clone(),
            units: None,
            tally: float_layer(options.tally),
            cells: id_layer(options.cells),
            materials: id_layer(options.materials),
            temperature: float_layer(options.temperature),
            density: float_layer(options.density),
        }
    }
}

/// Sweeps `xy` slices through `region` and stacks the requested layers.
///
/// Every slice reuses the tally, statistic and selection of `base`. A slice
/// that yields no tally image is left as NaN.
///
/// # Errors
/// Returns an error if the engine fails to render a slice or the tally
/// cannot be reduced.
pub fn export_volume<E: GeometryEngine + ?Sized>(
    region: &ExportRegion,
    base: &PlotView,
    statepoint: &StatePoint,
    engine: &mut E,
    options: &ExportOptions,
    warnings: &mut UnitWarnings,
) -> Result<VolumeData> {
    let mut volume = VolumeData::empty(region, options);
    info!(
        "exporting {:?} voxels between {:?} and {:?}",
        region.resolution, region.lower_left, region.upper_right
    );

    for (k, z) in region.slice_heights().enumerate() {
        let view = region.slice_view(base, z);
        let ids = engine.id_map(&view)?;

        if let Some(layer) = volume.tally.as_mut() {
            let outcome = create_tally_image(statepoint, &view, &ids, warnings)?;
            match outcome.image() {
                Some(image) => {
                    stack(layer, k, sample_on_view(image, &view).view());
                    if volume.units.is_none() {
                        volume.units = Some(image.units.clone());
                    }
                }
                None => {
                    if let Some(message) = outcome.message() {
                        warn!("slice {k} at z = {z}: {message}");
                    }
                }
            }
        }
        if let Some(layer) = volume.cells.as_mut() {
            stack(layer, k, ids.cells());
        }
        if let Some(layer) = volume.materials.as_mut() {
            stack(layer, k, ids.materials());
        }
        if options.temperature || options.density {
            let properties = engine.property_map(&view)?;
            if let Some(layer) = volume.temperature.as_mut() {
                stack(layer, k, properties.temperatures());
            }
            if let Some(layer) = volume.density.as_mut() {
                stack(layer, k, properties.densities());
            }
        }
    }
    Ok(volume)
}

/// Stores an image (row 0 at the top) as layer `k` with `y` increasing.
fn stack<T: Copy>(layer: &mut Array3<T>, k: usize, image: ArrayView2<'_, T>) {
    layer
        .slice_mut(s![k, .., ..])
        .assign(&image.slice(s![..;-1, ..]));
}

/// Samples a tally image on the pixel grid of `view`.
///
/// Images without extents already match the view. Images with extents
/// (mesh layers) are looked up at each pixel center; pixels outside the
/// image or masked in it are NaN.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn sample_on_view(image: &TallyImage, view: &PlotView) -> Array2<f64> {
    let Some([h_min, h_max, v_min, v_max]) = image.extents else {
        return image.image.filled(f64::NAN);
    };
    let (rows, cols) = image.image.dim();
    let [view_left, _, _, view_top] = view.extents();
    let dh = view.width / view.h_res as f64;
    let dv = view.height / view.v_res as f64;

    Array2::from_shape_fn((view.v_res, view.h_res), |(r, c)| {
        let h = view_left + (c as f64 + 0.5) * dh;
        let v = view_top - (r as f64 + 0.5) * dv;
        let col = ((h - h_min) / (h_max - h_min) * cols as f64).floor();
        let row = ((v_max - v) / (v_max - v_min) * rows as f64).floor();
        if col < 0.0 || row < 0.0 {
            return f64::NAN;
        }
        image
            .image
            .get(row as usize, col as usize)
            .unwrap_or(f64::NAN)
    })
}
