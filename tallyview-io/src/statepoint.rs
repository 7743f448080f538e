//! JSON statepoint documents.
//!
//! Tally results are stored as flat row-major arrays next to the filters,
//! scores and nuclides that give them their shape:
//!
//! ```json
//! {
//!   "universes": { "1": [10, 20] },
//!   "tallies": [{
//!     "id": 1,
//!     "filters": [{ "id": 1, "type": "cell", "bins": [10, 20] }],
//!     "scores": ["flux"],
//!     "nuclides": ["total"],
//!     "mean": [3.5, 7.25],
//!     "std_dev": [0.1, 0.2]
//!   }]
//! }
//! ```

use std::fs;
use std::path::Path;

use log::debug;
use ndarray::{ArrayD, IxDyn};
use serde::{Deserialize, Serialize};
use tallyview_core::{Filter, StatePoint, Tally, UniverseCells};

use crate::error::Result;

/// A whole statepoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatePointDocument {
    /// Member cells of each universe.
    #[serde(default)]
    pub universes: UniverseCells,
    /// Tallies.
    #[serde(default)]
    pub tallies: Vec<TallyDocument>,
}

/// One tally with flattened result arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TallyDocument {
    /// Tally id.
    pub id: u32,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Filters in axis order.
    #[serde(default)]
    pub filters: Vec<Filter>,
    /// Score names.
    pub scores: Vec<String>,
    /// Nuclide names.
    pub nuclides: Vec<String>,
    /// Mean values, row-major over `[filters.., score, nuclide]`.
    pub mean: Vec<f64>,
    /// Standard deviations, same layout as `mean`.
    pub std_dev: Vec<f64>,
}

impl TallyDocument {
    /// Shape of the result arrays.
    #[must_use]
    pub fn shape(&self) -> Vec<usize> {
        self.filters
            .iter()
            .map(Filter::num_bins)
            .chain([self.scores.len(), self.nuclides.len()])
            .collect()
    }

    /// Builds the tally.
    ///
    /// # Errors
    /// Returns an error if the flat arrays do not match the filter, score and
    /// nuclide counts.
    pub fn into_tally(self) -> Result<Tally> {
        let shape = self.shape();
        let mean = ArrayD::from_shape_vec(IxDyn(&shape), self.mean)
            .map_err(tallyview_core::Error::from)?;
        let std_dev = ArrayD::from_shape_vec(IxDyn(&shape), self.std_dev)
            .map_err(tallyview_core::Error::from)?;
        let tally = Tally::new(
            self.id,
            self.filters,
            self.scores,
            self.nuclides,
            mean,
            std_dev,
        )?;
        Ok(match self.name {
            Some(name) => tally.with_name(name),
            None => tally,
        })
    }
}

impl StatePointDocument {
    /// Builds the statepoint.
    ///
    /// # Errors
    /// Returns an error if any tally is malformed.
    pub fn into_statepoint(self) -> Result<StatePoint> {
        let mut statepoint = StatePoint::new();
        statepoint.universes = self.universes;
        for tally in self.tallies {
            statepoint.add_tally(tally.into_tally()?);
        }
        Ok(statepoint)
    }
}

/// Parses a statepoint from JSON text.
///
/// # Errors
/// Returns an error if the JSON is malformed or a tally is inconsistent.
pub fn parse_statepoint(json: &str) -> Result<StatePoint> {
    let document: StatePointDocument = serde_json::from_str(json)?;
    document.into_statepoint()
}

/// Reads a statepoint from a JSON file.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub fn read_statepoint<P: AsRef<Path>>(path: P) -> Result<StatePoint> {
    let path = path.as_ref();
    let statepoint = parse_statepoint(&fs::read_to_string(path)?)?;
    debug!(
        "read {} tallies from {}",
        statepoint.len(),
        path.display()
    );
    Ok(statepoint)
}
