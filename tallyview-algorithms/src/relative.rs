//! Relative error from mean and standard deviation images.

use ndarray::{Array2, Zip};
use tallyview_core::units::PERCENT_ERROR;
use tallyview_core::{MaskedImage, Result, TallyImage};

use crate::reduce::value_range;

/// `100 * std_dev / mean` per pixel, zero where the mean is zero.
#[must_use]
pub fn relative_error(mean: &Array2<f64>, std_dev: &Array2<f64>) -> Array2<f64> {
    Zip::from(mean).and(std_dev).map_collect(|&m, &s| {
        if m == 0.0 {
            0.0
        } else {
            100.0 * s / m
        }
    })
}

/// Combines the two passes of a painted reducer.
///
/// The mean pass decides which pixels are valid; masked pixels hold zero
/// and count towards the value range. A pixel the deviation pass left
/// unpainted has a deviation of zero.
pub(crate) fn combine_masked(mean: &TallyImage, std_dev: &TallyImage) -> Result<TallyImage> {
    let mask = mean.image.mask().clone();
    let mut values = relative_error(mean.image.values(), &std_dev.image.filled(0.0));
    Zip::from(&mut values).and(&mask).for_each(|value, &masked| {
        if masked {
            *value = 0.0;
        }
    });

    let (data_min, data_max) = value_range(&values);
    let image = MaskedImage::with_mask(values, mask)?;
    Ok(TallyImage {
        image,
        extents: mean.extents,
        data_min,
        data_max,
        units: PERCENT_ERROR.to_string(),
    })
}

/// Combines the two passes of the mesh reducer.
///
/// Any non-finite ratio is replaced by zero.
pub(crate) fn combine_mesh(mean: &TallyImage, std_dev: &TallyImage) -> TallyImage {
    let values = relative_error(mean.image.values(), std_dev.image.values())
        .mapv(|v| if v.is_finite() { v } else { 0.0 });
    let (data_min, data_max) = value_range(&values);
    TallyImage {
        image: MaskedImage::unmasked(values),
        extents: mean.extents,
        data_min,
        data_max,
        units: PERCENT_ERROR.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_zero_mean_guard() {
        let mean = array![[2.0, 0.0], [4.0, -1.0]];
        let std_dev = array![[0.5, 3.0], [1.0, 0.1]];
        let rel = relative_error(&mean, &std_dev);
        assert_relative_eq!(rel[[0, 0]], 25.0);
        assert_eq!(rel[[0, 1]], 0.0);
        assert_relative_eq!(rel[[1, 0]], 25.0);
        assert_relative_eq!(rel[[1, 1]], -10.0);
    }

    #[test]
    fn test_mesh_replaces_non_finite() {
        let image = |values| TallyImage {
            image: MaskedImage::unmasked(values),
            extents: Some([0.0, 1.0, 0.0, 1.0]),
            data_min: 0.0,
            data_max: 0.0,
            units: String::new(),
        };
        let mean = image(array![[1.0e-320, 1.0]]);
        let std_dev = image(array![[1.0e10, f64::NAN]]);
        let rel = combine_mesh(&mean, &std_dev);
        assert_eq!(rel.image.values(), &array![[0.0, 0.0]]);
        assert_eq!(rel.units, PERCENT_ERROR);
        assert_eq!(rel.extents, mean.extents);
    }

    #[test]
    fn test_masked_range_includes_zero_fill() {
        let mean = TallyImage {
            image: MaskedImage::masked_where(array![[-1.0, 4.0, 8.0]], |v| v < 0.0),
            extents: None,
            data_min: 4.0,
            data_max: 8.0,
            units: String::new(),
        };
        let std_dev = TallyImage {
            image: MaskedImage::masked_where(array![[-1.0, 1.0, 4.0]], |v| v < 0.0),
            ..mean.clone()
        };
        let rel = combine_masked(&mean, &std_dev).unwrap();
        assert_eq!(rel.image.values()[[0, 0]], 0.0);
        assert_relative_eq!(rel.data_min, 0.0);
        assert_relative_eq!(rel.data_max, 50.0);
    }

    #[test]
    fn test_masked_pixels_follow_mean() {
        let mean = TallyImage {
            image: MaskedImage::masked_where(array![[-1.0, 5.0]], |v| v < 0.0),
            extents: None,
            data_min: 5.0,
            data_max: 5.0,
            units: String::new(),
        };
        let std_dev = TallyImage {
            image: MaskedImage::masked_where(array![[-1.0, 1.0]], |v| v < 0.0),
            ..mean.clone()
        };
        let rel = combine_masked(&mean, &std_dev).unwrap();
        assert_eq!(rel.image.get(0, 0), None);
        assert_relative_eq!(rel.image.get(0, 1).unwrap(), 20.0);
        assert_eq!((rel.data_min, rel.data_max), (0.0, 20.0));
    }
}
