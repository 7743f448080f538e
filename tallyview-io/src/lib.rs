//! tallyview-io: file formats for tallyview.
//!
//! Statepoints and voxel geometries are read from JSON documents. Exported
//! volumes are written as JSON, or as HDF5 with the `hdf5` feature.
//!

mod error;
pub mod geometry;
#[cfg(feature = "hdf5")]
pub mod hdf5;
pub mod statepoint;
mod volume;

pub use error::{Error, Result};
pub use geometry::{read_geometry, VoxelGeometry};
#[cfg(feature = "hdf5")]
pub use hdf5::{write_volume_hdf5, VolumeWriteOptions};
pub use statepoint::{parse_statepoint, read_statepoint, StatePointDocument, TallyDocument};
pub use volume::{write_volume_json, VolumeDocument};
