//! Interface to the geometry engine.

use crate::error::Result;
use crate::idmap::{IdMap, PropertyMap};
use crate::view::PlotView;

/// Geometry queries answered by the simulation engine.
///
/// The reducers only read the maps; computing them is the engine's job.
pub trait GeometryEngine {
    /// Cell, instance and material ids for every pixel of `view`.
    ///
    /// # Errors
    /// Returns an error if the engine cannot rasterize the view.
    fn id_map(&mut self, view: &PlotView) -> Result<IdMap>;

    /// Temperature and density for every pixel of `view`.
    ///
    /// # Errors
    /// Returns an error if the engine cannot rasterize the view.
    fn property_map(&mut self, view: &PlotView) -> Result<PropertyMap>;

    /// Axis-aligned bounds of the whole geometry, possibly infinite.
    fn bounding_box(&self) -> ([f64; 3], [f64; 3]);
}
