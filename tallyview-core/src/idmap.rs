//! Per-pixel geometry maps supplied by the simulation engine.

use ndarray::{s, Array2, Array3, ArrayView2};

use crate::error::{Error, Result};

/// Pixel in a region with no material.
pub const VOID: i32 = -1;
/// Pixel outside the geometry.
pub const NOT_FOUND: i32 = -2;
/// Pixel where cells overlap.
pub const OVERLAP: i32 = -3;

/// Cell id, cell instance and material id for every pixel of a view.
///
/// Row 0 is the top of the image.
#[derive(Debug, Clone, PartialEq)]
pub struct IdMap {
    cells: Array2<i32>,
    instances: Array2<i32>,
    materials: Array2<i32>,
}

impl IdMap {
    /// Builds a map from three equally shaped layers.
    ///
    /// # Errors
    /// Returns [`Error::IdMapShape`] if the layers differ in shape.
    pub fn new(cells: Array2<i32>, instances: Array2<i32>, materials: Array2<i32>) -> Result<Self> {
        let expected = cells.dim();
        for layer in [&instances, &materials] {
            if layer.dim() != expected {
                return Err(Error::IdMapShape {
                    expected,
                    found: layer.dim(),
                });
            }
        }
        Ok(Self {
            cells,
            instances,
            materials,
        })
    }

    /// Builds a map from the engine's `(v_res, h_res, 3)` array holding
    /// cell id, instance and material id in that order.
    ///
    /// # Errors
    /// Returns [`Error::IdMapShape`] if the last axis is not of length 3.
    pub fn from_stacked(ids: &Array3<i32>) -> Result<Self> {
        let (rows, _, layers) = ids.dim();
        if layers != 3 {
            return Err(Error::IdMapShape {
                expected: (rows, 3),
                found: (rows, layers),
            });
        }
        Self::new(
            ids.slice(s![.., .., 0]).to_owned(),
            ids.slice(s![.., .., 1]).to_owned(),
            ids.slice(s![.., .., 2]).to_owned(),
        )
    }

    /// `(rows, columns)` of the map.
    #[must_use]
    pub fn dim(&self) -> (usize, usize) {
        self.cells.dim()
    }

    /// Cell ids.
    #[must_use]
    pub fn cells(&self) -> ArrayView2<'_, i32> {
        self.cells.view()
    }

    /// Cell instances.
    #[must_use]
    pub fn instances(&self) -> ArrayView2<'_, i32> {
        self.instances.view()
    }

    /// Material ids.
    #[must_use]
    pub fn materials(&self) -> ArrayView2<'_, i32> {
        self.materials.view()
    }

    /// Checks the map against a view's resolution.
    ///
    /// # Errors
    /// Returns [`Error::IdMapShape`] if the shapes disagree.
    pub fn check_resolution(&self, v_res: usize, h_res: usize) -> Result<()> {
        if self.dim() == (v_res, h_res) {
            Ok(())
        } else {
            Err(Error::IdMapShape {
                expected: (v_res, h_res),
                found: self.dim(),
            })
        }
    }
}

/// Per-pixel temperature and density.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyMap {
    temperatures: Array2<f64>,
    densities: Array2<f64>,
}

impl PropertyMap {
    /// Builds a map from the engine's `(v_res, h_res, 2)` array holding
    /// temperature and density. Negative values mark pixels without a
    /// property and are stored as NaN.
    ///
    /// # Errors
    /// Returns [`Error::IdMapShape`] if the last axis is not of length 2.
    pub fn from_stacked(properties: &Array3<f64>) -> Result<Self> {
        let (rows, cols, layers) = properties.dim();
        if layers != 2 {
            return Err(Error::IdMapShape {
                expected: (rows, cols),
                found: (rows, layers),
            });
        }
        let clean = |layer: usize| {
            properties
                .slice(s![.., .., layer])
                .mapv(|v| if v < 0.0 { f64::NAN } else { v })
        };
        Ok(Self {
            temperatures: clean(0),
            densities: clean(1),
        })
    }

    /// Temperatures in K.
    #[must_use]
    pub fn temperatures(&self) -> ArrayView2<'_, f64> {
        self.temperatures.view()
    }

    /// Densities in g/cm³.
    #[must_use]
    pub fn densities(&self) -> ArrayView2<'_, f64> {
        self.densities.view()
    }

    /// `(min, max)` of temperature and of density, counting missing values
    /// as zero.
    #[must_use]
    pub fn extents(&self) -> [(f64, f64); 2] {
        [
            nan_as_zero_extent(self.temperatures.view()),
            nan_as_zero_extent(self.densities.view()),
        ]
    }
}

fn nan_as_zero_extent(values: ArrayView2<'_, f64>) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    values
        .iter()
        .map(|&v| if v.is_nan() { 0.0 } else { v })
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        })
}
