//! Plot view parameters.

use crate::error::{Error, Result};
use crate::selection::Selection;
use crate::tally::Statistic;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Margin applied around the geometry bounds in the default view.
const DEFAULT_VIEW_MARGIN: f64 = 1.005;

/// Width and height used when the geometry is unbounded.
const UNBOUNDED_VIEW_SIZE: f64 = 25.0;

/// Default horizontal and vertical resolution.
const DEFAULT_RESOLUTION: usize = 600;

/// Plane of the 2D slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum Basis {
    /// x horizontal, y vertical, sliced along z.
    #[default]
    Xy,
    /// x horizontal, z vertical, sliced along y.
    Xz,
    /// y horizontal, z vertical, sliced along x.
    Yz,
}

impl Basis {
    /// Returns `(horizontal, vertical, depth)` axis indices.
    #[must_use]
    pub fn axes(self) -> (usize, usize, usize) {
        match self {
            Basis::Xy => (0, 1, 2),
            Basis::Xz => (0, 2, 1),
            Basis::Yz => (1, 2, 0),
        }
    }
}

impl std::fmt::Display for Basis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Basis::Xy => write!(f, "xy"),
            Basis::Xz => write!(f, "xz"),
            Basis::Yz => write!(f, "yz"),
        }
    }
}

/// Property used to color the geometry plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum ColorBy {
    /// Color by cell id.
    Cell,
    /// Color by material id.
    #[default]
    Material,
    /// Color by temperature.
    Temperature,
    /// Color by density.
    Density,
}

/// Geometry parameters of a view.
///
/// The engine only has to recompute the id and property maps when these
/// change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewParams {
    /// Center of the view.
    pub origin: [f64; 3],
    /// Horizontal extent in model units.
    pub width: f64,
    /// Vertical extent in model units.
    pub height: f64,
    /// Horizontal pixel count.
    pub h_res: usize,
    /// Vertical pixel count.
    pub v_res: usize,
    /// Slice plane.
    pub basis: Basis,
}

/// Everything that parameterizes one plot and its tally overlay.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlotView {
    /// Center of the view.
    pub origin: [f64; 3],
    /// Horizontal extent in model units.
    pub width: f64,
    /// Vertical extent in model units.
    pub height: f64,
    /// Horizontal pixel count.
    pub h_res: usize,
    /// Vertical pixel count.
    pub v_res: usize,
    /// Slice plane.
    pub basis: Basis,
    /// Geometry coloring.
    pub color_by: ColorBy,
    /// Tally shown as overlay.
    pub selected_tally: Option<u32>,
    /// Whether the tally overlay is drawn.
    pub tally_visible: bool,
    /// Statistic shown in the overlay.
    pub statistic: Statistic,
    /// Divide mesh tally values by voxel volume.
    pub volume_norm: bool,
    /// Applied filter, score and nuclide selections.
    pub selection: Selection,
}

impl Default for PlotView {
    fn default() -> Self {
        Self::new([0.0; 3], UNBOUNDED_VIEW_SIZE, UNBOUNDED_VIEW_SIZE)
    }
}

impl PlotView {
    /// Creates a view with default display settings.
    #[must_use]
    pub fn new(origin: [f64; 3], width: f64, height: f64) -> Self {
        Self {
            origin,
            width,
            height,
            h_res: DEFAULT_RESOLUTION,
            v_res: DEFAULT_RESOLUTION,
            basis: Basis::Xy,
            color_by: ColorBy::Material,
            selected_tally: None,
            tally_visible: true,
            statistic: Statistic::Mean,
            volume_norm: false,
            selection: Selection::default(),
        }
    }

    /// Default view for a geometry bounding box.
    ///
    /// Centers on the bounds in every finite direction, with a small margin
    /// around x and y. Falls back to a 25 x 25 view at the origin when x or y
    /// is unbounded, and to `z = 0` when z is unbounded.
    #[must_use]
    pub fn from_bounding_box(lower_left: [f64; 3], upper_right: [f64; 3]) -> Self {
        let xy_bounded = lower_left[..2].iter().all(|v| v.is_finite())
            && upper_right[..2].iter().all(|v| v.is_finite());

        let (x, y, width, height) = if xy_bounded {
            (
                (upper_right[0] + lower_left[0]) / 2.0,
                (upper_right[1] + lower_left[1]) / 2.0,
                (upper_right[0] - lower_left[0]).abs() * DEFAULT_VIEW_MARGIN,
                (upper_right[1] - lower_left[1]).abs() * DEFAULT_VIEW_MARGIN,
            )
        } else {
            (0.0, 0.0, UNBOUNDED_VIEW_SIZE, UNBOUNDED_VIEW_SIZE)
        };

        let z = if lower_left[2].is_finite() && upper_right[2].is_finite() {
            (upper_right[2] + lower_left[2]) / 2.0
        } else {
            0.0
        };

        Self::new([x, y, z], width, height)
    }

    /// Geometry parameters.
    #[must_use]
    pub fn params(&self) -> ViewParams {
        ViewParams {
            origin: self.origin,
            width: self.width,
            height: self.height,
            h_res: self.h_res,
            v_res: self.v_res,
            basis: self.basis,
        }
    }

    /// Takes the geometry parameters of `params`, keeping the tally and
    /// display settings.
    pub fn adopt_params(&mut self, params: ViewParams) {
        self.origin = params.origin;
        self.width = params.width;
        self.height = params.height;
        self.h_res = params.h_res;
        self.v_res = params.v_res;
        self.basis = params.basis;
    }

    /// Lower-left corner of the view in model coordinates.
    #[must_use]
    pub fn llc(&self) -> [f64; 3] {
        let (h, v, _) = self.basis.axes();
        let mut corner = self.origin;
        corner[h] -= self.width / 2.0;
        corner[v] -= self.height / 2.0;
        corner
    }

    /// Upper-right corner of the view in model coordinates.
    #[must_use]
    pub fn urc(&self) -> [f64; 3] {
        let (h, v, _) = self.basis.axes();
        let mut corner = self.origin;
        corner[h] += self.width / 2.0;
        corner[v] += self.height / 2.0;
        corner
    }

    /// `[h_min, h_max, v_min, v_max]` of the view.
    #[must_use]
    pub fn extents(&self) -> [f64; 4] {
        let (h, v, _) = self.basis.axes();
        let (llc, urc) = (self.llc(), self.urc());
        [llc[h], urc[h], llc[v], urc[v]]
    }

    /// Checks that the view can be rendered.
    ///
    /// # Errors
    /// Returns [`Error::InvalidView`] for non-positive sizes or resolutions.
    pub fn validate(&self) -> Result<()> {
        if !(self.width > 0.0 && self.height > 0.0) {
            return Err(Error::InvalidView(format!(
                "width and height must be positive, got {} x {}",
                self.width, self.height
            )));
        }
        if self.h_res == 0 || self.v_res == 0 {
            return Err(Error::InvalidView(format!(
                "resolution must be non-zero, got {} x {}",
                self.h_res, self.v_res
            )));
        }
        if self.origin.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidView(format!(
                "origin must be finite, got {:?}",
                self.origin
            )));
        }
        Ok(())
    }
}
