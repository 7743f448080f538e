//! tallyview-algorithms: Tally reducers.
//!
//! This crate turns tally results into 2D images aligned with a plot view:
//! - **Domain** - cell, material and universe filters painted through the id map
//! - **Distribcell** - one value per cell instance
//! - **Mesh** - the mesh layer cut by the view plane
//!
//! [`create_tally_image`] picks the reducer for a tally, and
//! [`export_volume`] stacks slices into a volume.
//!
#![warn(missing_docs)]

mod distribcell;
mod domain;
pub mod export;
mod mesh;
mod pipeline;
pub mod reduce;
mod relative;

pub use distribcell::reduce_distribcell;
pub use domain::reduce_domain;
pub use export::{export_volume, sample_on_view, ExportOptions, ExportRegion, VolumeData};
pub use mesh::{reduce_mesh, slice_index};
pub use pipeline::{create_tally_image, NoImage, TallyImageOutcome};
pub use reduce::{reduce_axis, Aggregate};
pub use relative::relative_error;
