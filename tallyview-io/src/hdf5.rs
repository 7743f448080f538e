//! HDF5 output of volumetric exports.
//!
//! Layout:
//!
//! ```text
//! /volume                  attrs: lower_left, upper_right, resolution, units
//! /volume/tally            f64 (z, y, x)
//! /volume/cells            i32 (z, y, x)
//! /volume/materials        i32 (z, y, x)
//! /volume/temperature      f64 (z, y, x)
//! /volume/density          f64 (z, y, x)
//! ```

use std::path::Path;
use std::str::FromStr;

use hdf5::types::{H5Type, VarLenUnicode};
use hdf5::{File, Group};
use log::info;
use ndarray::{Array3, ArrayView1};
use tallyview_algorithms::VolumeData;

use crate::{Error, Result};

const FORMAT_VERSION: &str = "0.1";

/// Options for HDF5 volume output.
#[derive(Clone, Debug, Default)]
pub struct VolumeWriteOptions {
    /// Deflate level for every layer; uncompressed when `None`.
    pub compression: Option<u8>,
}

/// Writes a volume to an HDF5 file.
///
/// # Errors
/// Returns an error if the file, group or datasets cannot be written.
pub fn write_volume_hdf5<P: AsRef<Path>>(
    path: P,
    volume: &VolumeData,
    options: &VolumeWriteOptions,
) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let value = to_var_len_unicode(FORMAT_VERSION)?;
    file.new_attr::<VarLenUnicode>()
        .create("tallyview_format_version")?
        .write_scalar(&value)?;

    let group = file.create_group("volume")?;
    let region = &volume.region;
    group
        .new_attr::<f64>()
        .shape((3,))
        .create("lower_left")?
        .write(ArrayView1::from(&region.lower_left[..]))?;
    group
        .new_attr::<f64>()
        .shape((3,))
        .create("upper_right")?
        .write(ArrayView1::from(&region.upper_right[..]))?;
    let resolution: Vec<u64> = region.resolution.iter().map(|&n| n as u64).collect();
    group
        .new_attr::<u64>()
        .shape((3,))
        .create("resolution")?
        .write(ArrayView1::from(resolution.as_slice()))?;
    if let Some(units) = &volume.units {
        let value = to_var_len_unicode(units)?;
        group
            .new_attr::<VarLenUnicode>()
            .create("units")?
            .write_scalar(&value)?;
    }

    write_layer(&group, "tally", volume.tally.as_ref(), options)?;
    write_layer(&group, "cells", volume.cells.as_ref(), options)?;
    write_layer(&group, "materials", volume.materials.as_ref(), options)?;
    write_layer(&group, "temperature", volume.temperature.as_ref(), options)?;
    write_layer(&group, "density", volume.density.as_ref(), options)?;

    info!("wrote volume to {}", path.display());
    Ok(())
}

fn write_layer<T: H5Type>(
    group: &Group,
    name: &str,
    layer: Option<&Array3<T>>,
    options: &VolumeWriteOptions,
) -> Result<()> {
    let Some(layer) = layer else {
        return Ok(());
    };
    let mut builder = group.new_dataset::<T>().shape(layer.dim());
    if let Some(level) = options.compression {
        builder = builder.chunk(layer.dim()).deflate(level);
    }
    let dataset = builder.create(name)?;
    dataset.write(layer.view())?;
    Ok(())
}

fn to_var_len_unicode(value: &str) -> Result<VarLenUnicode> {
    VarLenUnicode::from_str(value)
        .map_err(|e| Error::InvalidFormat(format!("invalid utf-8 attribute: {e}")))
}
