//! Error types for tallyview-core.

use thiserror::Error;

/// Result type alias for tallyview operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types.
///
/// These cover malformed input only. Outcomes that a user can reach through
/// normal interaction (incompatible units, a mesh that does not intersect the
/// current slice, an empty selection) are not errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Tally result array does not match its filters, scores and nuclides.
    #[error("tally {tally} result shape {found:?} does not match expected {expected:?}")]
    ShapeMismatch {
        tally: u32,
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    /// Selected bin index outside the filter's bin range.
    #[error("bin index {index} out of range for filter {filter} with {n_bins} bins")]
    BinOutOfRange {
        filter: u32,
        index: usize,
        n_bins: usize,
    },

    /// Id map layers disagree in shape, or the map does not match the view.
    #[error("id map shape {found:?} does not match expected {expected:?}")]
    IdMapShape {
        expected: (usize, usize),
        found: (usize, usize),
    },

    /// Mesh reduction requested on a tally without a mesh filter.
    #[error("tally {0} has no mesh filter")]
    MissingMeshFilter(u32),

    /// More than one mesh filter on a single tally.
    #[error("tally {0} has more than one mesh filter")]
    MultipleMeshFilters(u32),

    /// Instance reduction requested on a tally without a distribcell filter.
    #[error("tally {0} has no distribcell or cell instance filter")]
    MissingInstanceFilter(u32),

    /// Mesh definition is inconsistent.
    #[error("invalid mesh: {0}")]
    InvalidMesh(String),

    /// View parameters are unusable.
    #[error("invalid view: {0}")]
    InvalidView(String),

    /// Tally id not present in the statepoint.
    #[error("unknown tally: {0}")]
    UnknownTally(u32),

    /// Array reshape failed.
    #[error("array shape error: {0}")]
    Shape(String),
}

impl From<ndarray::ShapeError> for Error {
    fn from(err: ndarray::ShapeError) -> Self {
        Error::Shape(err.to_string())
    }
}
