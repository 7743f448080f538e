//! JSON output of volumetric exports.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use log::info;
use ndarray::Array3;
use serde::Serialize;
use tallyview_algorithms::{ExportRegion, VolumeData};

use crate::error::Result;

/// Flattened volume, each layer in `(z, y, x)` order with x fastest.
///
/// NaN values are written as `null`.
#[derive(Debug, Clone, Serialize)]
pub struct VolumeDocument {
    /// The exported box.
    pub region: ExportRegion,
    /// Unit label of the tally layer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    /// Tally values.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tally: Option<Vec<f64>>,
    /// Cell ids.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cells: Option<Vec<i32>>,
    /// Material ids.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub materials: Option<Vec<i32>>,
    /// Temperatures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<Vec<f64>>,
    /// Densities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub density: Option<Vec<f64>>,
}

fn flatten<T: Copy>(layer: Option<&Array3<T>>) -> Option<Vec<T>> {
    layer.map(|layer| layer.iter().copied().collect())
}

impl From<&VolumeData> for VolumeDocument {
    fn from(volume: &VolumeData) -> Self {
        Self {
            region: volume.region.clone(),
            units: volume.units.clone(),
            tally: flatten(volume.tally.as_ref()),
            cells: flatten(volume.cells.as_ref()),
            materials: flatten(volume.materials.as_ref()),
            temperature: flatten(volume.temperature.as_ref()),
            density: flatten(volume.density.as_ref()),
        }
    }
}

/// Writes a volume as a JSON document.
///
/// # Errors
/// Returns an error if the file cannot be created or written.
pub fn write_volume_json<P: AsRef<Path>>(path: P, volume: &VolumeData) -> Result<()> {
    let path = path.as_ref();
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(writer, &VolumeDocument::from(volume))?;
    info!("wrote volume to {}", path.display());
    Ok(())
}
