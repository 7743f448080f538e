//! Voxelized geometry fixtures.
//!
//! A [`VoxelGeometry`] answers id and property queries by sampling a regular
//! grid of cell and material ids at pixel centers. It stands in for the
//! simulation engine when reducing tallies from the command line.

use std::fs;
use std::path::Path;

use ndarray::{Array2, Array3};
use serde::{Deserialize, Serialize};
use tallyview_core::idmap::NOT_FOUND;
use tallyview_core::{GeometryEngine, IdMap, PlotView, PropertyMap};

use crate::error::{Error, Result};

/// Ids and properties on a regular grid, x varying fastest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoxelGeometry {
    /// Lower-left corner of the grid.
    pub lower_left: [f64; 3],
    /// Upper-right corner of the grid.
    pub upper_right: [f64; 3],
    /// Voxel counts along x, y, z.
    pub dimension: [usize; 3],
    /// Cell id of each voxel.
    pub cells: Vec<i32>,
    /// Cell instance of each voxel; all zero when omitted.
    #[serde(default)]
    pub instances: Vec<i32>,
    /// Material id of each voxel.
    pub materials: Vec<i32>,
    /// Temperature of each voxel in K; missing when omitted.
    #[serde(default)]
    pub temperatures: Vec<f64>,
    /// Density of each voxel in g/cm³; missing when omitted.
    #[serde(default)]
    pub densities: Vec<f64>,
}

impl VoxelGeometry {
    /// Checks that every layer has one entry per voxel.
    ///
    /// # Errors
    /// Returns [`Error::InvalidFormat`] for a malformed grid.
    pub fn validate(&self) -> Result<()> {
        let n: usize = self.dimension.iter().product();
        if n == 0 {
            return Err(Error::InvalidFormat(
                "geometry grid has no voxels".to_string(),
            ));
        }
        if (0..3).any(|axis| self.lower_left[axis] >= self.upper_right[axis]) {
            return Err(Error::InvalidFormat(format!(
                "geometry lower-left {:?} is not below upper-right {:?}",
                self.lower_left, self.upper_right
            )));
        }
        let layers = [
            ("cells", self.cells.len(), false),
            ("instances", self.instances.len(), true),
            ("materials", self.materials.len(), false),
            ("temperatures", self.temperatures.len(), true),
            ("densities", self.densities.len(), true),
        ];
        for (name, len, optional) in layers {
            if len != n && !(optional && len == 0) {
                return Err(Error::InvalidFormat(format!(
                    "geometry layer {name} has {len} entries, expected {n}"
                )));
            }
        }
        Ok(())
    }

    /// Flat index of the voxel containing `point`.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn voxel(&self, point: [f64; 3]) -> Option<usize> {
        let mut ijk = [0usize; 3];
        for axis in 0..3 {
            let n = self.dimension[axis];
            let width = (self.upper_right[axis] - self.lower_left[axis]) / n as f64;
            let index = ((point[axis] - self.lower_left[axis]) / width).floor();
            if !(index >= 0.0 && index < n as f64) {
                return None;
            }
            ijk[axis] = index as usize;
        }
        let [nx, ny, _] = self.dimension;
        Some(ijk[0] + nx * (ijk[1] + ny * ijk[2]))
    }

    /// Model coordinates of every pixel center of `view`.
    #[allow(clippy::cast_precision_loss)]
    fn pixel_centers(view: &PlotView) -> Array2<[f64; 3]> {
        let (h, v, _) = view.basis.axes();
        let [left, _, _, top] = view.extents();
        let dh = view.width / view.h_res as f64;
        let dv = view.height / view.v_res as f64;
        Array2::from_shape_fn((view.v_res, view.h_res), |(r, c)| {
            let mut point = view.origin;
            point[h] = left + (c as f64 + 0.5) * dh;
            point[v] = top - (r as f64 + 0.5) * dv;
            point
        })
    }
}

impl GeometryEngine for VoxelGeometry {
    fn id_map(&mut self, view: &PlotView) -> tallyview_core::Result<IdMap> {
        view.validate()?;
        let voxels = Self::pixel_centers(view).mapv(|point| self.voxel(point));
        let layer = |values: &[i32], missing: i32| {
            voxels.mapv(|voxel| match voxel {
                Some(index) => values.get(index).copied().unwrap_or(missing),
                None => missing,
            })
        };
        IdMap::new(
            layer(&self.cells, NOT_FOUND),
            layer(&self.instances, 0),
            layer(&self.materials, NOT_FOUND),
        )
    }

    fn property_map(&mut self, view: &PlotView) -> tallyview_core::Result<PropertyMap> {
        view.validate()?;
        let voxels = Self::pixel_centers(view).mapv(|point| self.voxel(point));
        let mut stacked = Array3::from_elem((view.v_res, view.h_res, 2), -1.0);
        for ((r, c), voxel) in voxels.indexed_iter() {
            let Some(index) = *voxel else { continue };
            if let Some(&temperature) = self.temperatures.get(index) {
                stacked[[r, c, 0]] = temperature;
            }
            if let Some(&density) = self.densities.get(index) {
                stacked[[r, c, 1]] = density;
            }
        }
        PropertyMap::from_stacked(&stacked)
    }

    fn bounding_box(&self) -> ([f64; 3], [f64; 3]) {
        (self.lower_left, self.upper_right)
    }
}

/// Reads a voxel geometry from a JSON file.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed, or the grid is
/// malformed.
pub fn read_geometry<P: AsRef<Path>>(path: P) -> Result<VoxelGeometry> {
    let geometry: VoxelGeometry = serde_json::from_str(&fs::read_to_string(path)?)?;
    geometry.validate()?;
    Ok(geometry)
}
