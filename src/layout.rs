//! Automatic table placement for freshly imported diagrams.
//!
//! Connected tables are grown into clusters around their most related
//! neighbors; tables without relationships are parked on a grid below them.

mod collision;
mod engine;
mod graph;
mod placement;
mod types;

pub use collision::{CollisionResolver, Resolution};
pub use engine::LayoutEngine;
pub use graph::ConnectivityGraph;
pub use types::{LayoutOptions, LayoutOutcome, PlacedTable, Placements, Point};
