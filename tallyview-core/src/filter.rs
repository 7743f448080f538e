//! Tally filter types.
//!
//! A filter is one axis of a tally's result array. The variant decides how the
//! reducers treat that axis: domain filters are painted through the id map,
//! instance filters through the id map's instance layer, mesh filters through
//! slicing, and everything else is collapsed according to the bin selection.

use crate::mesh::MeshFilter;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Bins of a tally filter, one variant per filter type.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(tag = "type", rename_all = "snake_case")
)]
pub enum FilterKind {
    /// Cell ids.
    Cell { bins: Vec<i32> },
    /// Material ids.
    Material { bins: Vec<i32> },
    /// Universe ids.
    Universe { bins: Vec<i32> },
    /// Every instance of a single cell, one bin per instance.
    Distribcell { cell: i32, num_instances: usize },
    /// Explicit `(cell id, instance)` pairs.
    CellInstance { bins: Vec<(i32, i32)> },
    /// Surface ids.
    Surface { bins: Vec<i32> },
    /// Regular mesh voxels.
    Mesh(MeshFilter),
    /// Incoming energy group edges (`n + 1` edges for `n` bins).
    Energy { edges: Vec<f64> },
    /// Outgoing energy group edges.
    EnergyOut { edges: Vec<f64> },
    /// Particle types.
    Particle { bins: Vec<String> },
    /// Any other filter, known only by name and bin count.
    Generic { name: String, num_bins: usize },
}

/// A tally filter: an id plus its bins.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Filter {
    /// Filter id, unique within a statepoint.
    pub id: u32,
    /// Filter bins.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub kind: FilterKind,
}

impl Filter {
    /// Creates a filter.
    #[must_use]
    pub fn new(id: u32, kind: FilterKind) -> Self {
        Self { id, kind }
    }

    /// Returns the number of bins (length of this filter's tally axis).
    #[must_use]
    pub fn num_bins(&self) -> usize {
        match &self.kind {
            FilterKind::Cell { bins }
            | FilterKind::Material { bins }
            | FilterKind::Universe { bins }
            | FilterKind::Surface { bins } => bins.len(),
            FilterKind::Distribcell { num_instances, .. } => *num_instances,
            FilterKind::CellInstance { bins } => bins.len(),
            FilterKind::Mesh(mesh_filter) => mesh_filter.mesh.num_bins(),
            FilterKind::Energy { edges } | FilterKind::EnergyOut { edges } => {
                edges.len().saturating_sub(1)
            }
            FilterKind::Particle { bins } => bins.len(),
            FilterKind::Generic { num_bins, .. } => *num_bins,
        }
    }

    /// Returns true for filters that partition space.
    #[must_use]
    pub fn is_spatial(&self) -> bool {
        matches!(
            self.kind,
            FilterKind::Cell { .. }
                | FilterKind::Material { .. }
                | FilterKind::Universe { .. }
                | FilterKind::Distribcell { .. }
                | FilterKind::CellInstance { .. }
                | FilterKind::Surface { .. }
                | FilterKind::Mesh(_)
        )
    }

    /// Returns true for filters painted by the domain reducer.
    #[must_use]
    pub fn is_domain(&self) -> bool {
        matches!(
            self.kind,
            FilterKind::Cell { .. } | FilterKind::Material { .. } | FilterKind::Universe { .. }
        )
    }

    /// Returns true for distribcell and cell instance filters.
    #[must_use]
    pub fn is_instance(&self) -> bool {
        matches!(
            self.kind,
            FilterKind::Distribcell { .. } | FilterKind::CellInstance { .. }
        )
    }

    /// Returns the mesh filter if this is one.
    #[must_use]
    pub fn as_mesh(&self) -> Option<&MeshFilter> {
        match &self.kind {
            FilterKind::Mesh(mesh_filter) => Some(mesh_filter),
            _ => None,
        }
    }

    /// Short type name, as shown in filter lists.
    #[must_use]
    pub fn type_name(&self) -> &str {
        match &self.kind {
            FilterKind::Cell { .. } => "cell",
            FilterKind::Material { .. } => "material",
            FilterKind::Universe { .. } => "universe",
            FilterKind::Distribcell { .. } => "distribcell",
            FilterKind::CellInstance { .. } => "cellinstance",
            FilterKind::Surface { .. } => "surface",
            FilterKind::Mesh(_) => "mesh",
            FilterKind::Energy { .. } => "energy",
            FilterKind::EnergyOut { .. } => "energyout",
            FilterKind::Particle { .. } => "particle",
            FilterKind::Generic { name, .. } => name,
        }
    }

    /// Human-readable label for a single bin.
    #[must_use]
    pub fn bin_label(&self, index: usize) -> Option<String> {
        if index >= self.num_bins() {
            return None;
        }
        let label = match &self.kind {
            FilterKind::Cell { bins }
            | FilterKind::Material { bins }
            | FilterKind::Universe { bins }
            | FilterKind::Surface { bins } => bins[index].to_string(),
            FilterKind::Distribcell { cell, .. } => format!("{cell}[{index}]"),
            FilterKind::CellInstance { bins } => {
                let (cell, instance) = bins[index];
                format!("{cell}[{instance}]")
            }
            FilterKind::Mesh(mesh_filter) => {
                let [i, j, k] = mesh_filter.mesh.ijk(index);
                format!("({i}, {j}, {k})")
            }
            FilterKind::Energy { edges } | FilterKind::EnergyOut { edges } => {
                format!("{:e} - {:e} eV", edges[index], edges[index + 1])
            }
            FilterKind::Particle { bins } => bins[index].clone(),
            FilterKind::Generic { .. } => index.to_string(),
        };
        Some(label)
    }
}
