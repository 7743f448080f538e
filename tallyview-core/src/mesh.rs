//! Regular mesh geometry.
//!
//! Meshes are always stored in three dimensions. A 2D mesh becomes a 3D mesh
//! with a single z layer that spans `[-1e50, 1e50]`, so the slicing code can
//! treat both the same way.

use crate::error::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Bound used for the infinite axis of a 2D mesh.
pub const INFINITE_EXTENT: f64 = 1.0e50;

/// A rectilinear grid of equally sized voxels.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "RawMesh", into = "RawMesh")
)]
pub struct RegularMesh {
    /// Mesh id.
    pub id: u32,
    /// Lower-left corner.
    pub lower_left: [f64; 3],
    /// Upper-right corner.
    pub upper_right: [f64; 3],
    /// Voxel counts along x, y, z.
    pub dimension: [usize; 3],
    /// Number of real dimensions (2 or 3).
    pub n_dimension: usize,
}

impl RegularMesh {
    /// Creates a 3D mesh.
    ///
    /// # Errors
    /// Returns an error if any dimension is zero or a corner is inverted.
    pub fn new_3d(
        id: u32,
        lower_left: [f64; 3],
        upper_right: [f64; 3],
        dimension: [usize; 3],
    ) -> Result<Self> {
        for axis in 0..3 {
            if dimension[axis] == 0 {
                return Err(Error::InvalidMesh(format!(
                    "mesh {id} has zero voxels along axis {axis}"
                )));
            }
            if lower_left[axis] >= upper_right[axis] {
                return Err(Error::InvalidMesh(format!(
                    "mesh {id} lower-left {} is not below upper-right {} along axis {axis}",
                    lower_left[axis], upper_right[axis]
                )));
            }
        }
        Ok(Self {
            id,
            lower_left,
            upper_right,
            dimension,
            n_dimension: 3,
        })
    }

    /// Creates a 2D mesh in the xy plane with one infinitely deep layer.
    ///
    /// # Errors
    /// Returns an error if any dimension is zero or a corner is inverted.
    pub fn new_2d(
        id: u32,
        lower_left: [f64; 2],
        upper_right: [f64; 2],
        dimension: [usize; 2],
    ) -> Result<Self> {
        let mut mesh = Self::new_3d(
            id,
            [lower_left[0], lower_left[1], -INFINITE_EXTENT],
            [upper_right[0], upper_right[1], INFINITE_EXTENT],
            [dimension[0], dimension[1], 1],
        )?;
        mesh.n_dimension = 2;
        Ok(mesh)
    }

    /// Voxel width along each axis.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn width(&self) -> [f64; 3] {
        std::array::from_fn(|axis| {
            (self.upper_right[axis] - self.lower_left[axis]) / self.dimension[axis] as f64
        })
    }

    /// Total number of voxels.
    #[must_use]
    pub fn num_bins(&self) -> usize {
        self.dimension.iter().product()
    }

    /// Converts a flat bin index into `(i, j, k)`; x varies fastest.
    #[must_use]
    pub fn ijk(&self, bin: usize) -> [usize; 3] {
        let [nx, ny, _] = self.dimension;
        [bin % nx, (bin / nx) % ny, bin / (nx * ny)]
    }

    /// Volume of one voxel (area for 2D meshes).
    #[must_use]
    pub fn voxel_volume(&self) -> f64 {
        self.width().iter().take(self.n_dimension).product()
    }

    /// Returns a copy shifted by `offset`.
    #[must_use]
    pub fn translated(&self, offset: [f64; 3]) -> Self {
        let mut mesh = self.clone();
        for axis in 0..3 {
            mesh.lower_left[axis] += offset[axis];
            mesh.upper_right[axis] += offset[axis];
        }
        mesh
    }
}

/// A mesh referenced by a tally filter, possibly translated.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MeshFilter {
    /// The mesh.
    pub mesh: RegularMesh,
    /// Offset applied to the mesh by the filter.
    #[cfg_attr(feature = "serde", serde(default))]
    pub translation: Option<[f64; 3]>,
}

impl MeshFilter {
    /// Creates an untranslated mesh filter.
    #[must_use]
    pub fn new(mesh: RegularMesh) -> Self {
        Self {
            mesh,
            translation: None,
        }
    }

    /// Sets the translation offset.
    #[must_use]
    pub fn with_translation(mut self, translation: [f64; 3]) -> Self {
        self.translation = Some(translation);
        self
    }

    /// The mesh as seen by the tally, with the translation applied.
    #[must_use]
    pub fn effective_mesh(&self) -> RegularMesh {
        match self.translation {
            Some(offset) => self.mesh.translated(offset),
            None => self.mesh.clone(),
        }
    }
}

/// Serialized mesh form: 2 or 3 entries per corner and dimension.
#[cfg(feature = "serde")]
#[derive(Serialize, Deserialize)]
struct RawMesh {
    id: u32,
    lower_left: Vec<f64>,
    upper_right: Vec<f64>,
    dimension: Vec<usize>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawMesh> for RegularMesh {
    type Error = Error;

    fn try_from(raw: RawMesh) -> Result<Self> {
        match (
            raw.lower_left.as_slice(),
            raw.upper_right.as_slice(),
            raw.dimension.as_slice(),
        ) {
            (&[x0, y0], &[x1, y1], &[nx, ny]) => {
                RegularMesh::new_2d(raw.id, [x0, y0], [x1, y1], [nx, ny])
            }
            (&[x0, y0, z0], &[x1, y1, z1], &[nx, ny, nz]) => {
                RegularMesh::new_3d(raw.id, [x0, y0, z0], [x1, y1, z1], [nx, ny, nz])
            }
            _ => Err(Error::InvalidMesh(format!(
                "mesh {} must have 2 or 3 matching coordinates per corner and dimension",
                raw.id
            ))),
        }
    }
}

#[cfg(feature = "serde")]
impl From<RegularMesh> for RawMesh {
    fn from(mesh: RegularMesh) -> Self {
        let n = mesh.n_dimension;
        Self {
            id: mesh.id,
            lower_left: mesh.lower_left[..n].to_vec(),
            upper_right: mesh.upper_right[..n].to_vec(),
            dimension: mesh.dimension[..n].to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_2d_mesh_is_one_infinite_layer() {
        let mesh = RegularMesh::new_2d(1, [-2.0, -2.0], [2.0, 2.0], [4, 2]).unwrap();
        assert_eq!(mesh.dimension, [4, 2, 1]);
        assert_eq!(mesh.n_dimension, 2);
        assert_relative_eq!(mesh.lower_left[2], -INFINITE_EXTENT);
        assert_relative_eq!(mesh.upper_right[2], INFINITE_EXTENT);
        assert_relative_eq!(mesh.voxel_volume(), 2.0);
    }

    #[test]
    fn test_width_and_ijk() {
        let mesh = RegularMesh::new_3d(1, [0.0; 3], [4.0, 6.0, 8.0], [4, 3, 2]).unwrap();
        let width = mesh.width();
        assert_relative_eq!(width[0], 1.0);
        assert_relative_eq!(width[1], 2.0);
        assert_relative_eq!(width[2], 4.0);
        assert_relative_eq!(mesh.voxel_volume(), 8.0);
        assert_eq!(mesh.ijk(0), [0, 0, 0]);
        assert_eq!(mesh.ijk(5), [1, 1, 0]);
        assert_eq!(mesh.ijk(13), [1, 0, 1]);
    }

    #[test]
    fn test_invalid_mesh() {
        assert!(RegularMesh::new_3d(1, [0.0; 3], [1.0; 3], [1, 0, 1]).is_err());
        assert!(RegularMesh::new_2d(1, [1.0, 0.0], [0.0, 1.0], [1, 1]).is_err());
    }

    #[test]
    fn test_translation() {
        let mesh = RegularMesh::new_3d(1, [0.0; 3], [1.0; 3], [1, 1, 1]).unwrap();
        let filter = MeshFilter::new(mesh).with_translation([1.0, -1.0, 0.5]);
        let moved = filter.effective_mesh();
        assert_relative_eq!(moved.lower_left[0], 1.0);
        assert_relative_eq!(moved.upper_right[1], 0.0);
        assert_relative_eq!(moved.lower_left[2], 0.5);
    }
}
