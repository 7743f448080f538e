//! tallyview-core: Core types for tally reduction.
//!
//! This crate provides the data model shared by the reducers: tallies and
//! their filters, user selections, meshes, plot views and their history,
//! the per-pixel geometry maps and the score unit table.
//!

pub mod engine;
pub mod error;
pub mod filter;
pub mod idmap;
pub mod image;
pub mod mesh;
pub mod selection;
pub mod state;
pub mod tally;
pub mod units;
pub mod view;

pub use engine::GeometryEngine;
pub use error::{Error, Result};
pub use filter::{Filter, FilterKind};
pub use idmap::{IdMap, PropertyMap};
pub use image::{MaskedImage, TallyImage};
pub use mesh::{MeshFilter, RegularMesh};
pub use selection::{AppliedFilters, FilterSelection, Selection, TOTAL};
pub use state::PlotViewState;
pub use tally::{StatePoint, Statistic, Tally, UniverseCells};
pub use units::{resolve_units, IncompatibleUnits, ScoreUnit, UnitWarnings};
pub use view::{Basis, ColorBy, PlotView, ViewParams};
