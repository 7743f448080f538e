//! Reduced tally images.

use ndarray::{Array2, Zip};

use crate::error::{Error, Result};

/// A 2D image where some pixels carry no value.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskedImage {
    values: Array2<f64>,
    mask: Array2<bool>,
}

impl MaskedImage {
    /// An image with every pixel valid.
    #[must_use]
    pub fn unmasked(values: Array2<f64>) -> Self {
        let mask = Array2::from_elem(values.dim(), false);
        Self { values, mask }
    }

    /// Masks every pixel where `predicate` holds.
    #[must_use]
    pub fn masked_where(values: Array2<f64>, predicate: impl Fn(f64) -> bool) -> Self {
        let mask = values.mapv(predicate);
        Self { values, mask }
    }

    /// Pairs values with an existing mask.
    ///
    /// # Errors
    /// Returns [`Error::Shape`] if the shapes differ.
    pub fn with_mask(values: Array2<f64>, mask: Array2<bool>) -> Result<Self> {
        if values.dim() != mask.dim() {
            return Err(Error::Shape(format!(
                "image shape {:?} does not match mask shape {:?}",
                values.dim(),
                mask.dim()
            )));
        }
        Ok(Self { values, mask })
    }

    /// `(rows, columns)`.
    #[must_use]
    pub fn dim(&self) -> (usize, usize) {
        self.values.dim()
    }

    /// Raw values, including those under the mask.
    #[must_use]
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// True where a pixel is masked.
    #[must_use]
    pub fn mask(&self) -> &Array2<bool> {
        &self.mask
    }

    /// Value at `(row, col)`, or `None` if masked or out of bounds.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        match self.mask.get((row, col)) {
            Some(false) => self.values.get((row, col)).copied(),
            _ => None,
        }
    }

    /// Number of pixels with a value.
    #[must_use]
    pub fn count_valid(&self) -> usize {
        self.mask.iter().filter(|&&masked| !masked).count()
    }

    /// Values with masked pixels replaced by `fill`.
    #[must_use]
    pub fn filled(&self, fill: f64) -> Array2<f64> {
        let mut out = self.values.clone();
        Zip::from(&mut out)
            .and(&self.mask)
            .for_each(|value, &masked| {
                if masked {
                    *value = fill;
                }
            });
        out
    }

    /// `(min, max)` over unmasked pixels; `None` if every pixel is masked.
    #[must_use]
    pub fn valid_extent(&self) -> Option<(f64, f64)> {
        Zip::from(&self.values)
            .and(&self.mask)
            .fold(None, |acc: Option<(f64, f64)>, &value, &masked| {
                if masked {
                    return acc;
                }
                Some(match acc {
                    Some((lo, hi)) => (lo.min(value), hi.max(value)),
                    None => (value, value),
                })
            })
    }
}

/// A tally projected onto the current plane, ready for plotting.
#[derive(Debug, Clone, PartialEq)]
pub struct TallyImage {
    /// Pixel values.
    pub image: MaskedImage,
    /// `[h_min, h_max, v_min, v_max]`; `None` means the view's own bounds.
    pub extents: Option<[f64; 4]>,
    /// Smallest value of the reduced data.
    pub data_min: f64,
    /// Largest value of the reduced data.
    pub data_max: f64,
    /// Unit label.
    pub units: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_masked_where() {
        let image = MaskedImage::masked_where(array![[1.0, -1.0], [-1.0, 4.0]], |v| v < 0.0);
        assert_eq!(image.count_valid(), 2);
        assert_eq!(image.get(0, 0), Some(1.0));
        assert_eq!(image.get(0, 1), None);
        assert_eq!(image.get(5, 5), None);
        assert_eq!(image.valid_extent(), Some((1.0, 4.0)));
        assert_eq!(image.filled(f64::NAN)[[1, 1]], 4.0);
        assert!(image.filled(f64::NAN)[[1, 0]].is_nan());
    }

    #[test]
    fn test_fully_masked_extent() {
        let image = MaskedImage::masked_where(Array2::from_elem((2, 2), -1.0), |v| v < 0.0);
        assert_eq!(image.valid_extent(), None);
        assert_eq!(MaskedImage::unmasked(Array2::zeros((1, 3))).count_valid(), 3);
    }
}
