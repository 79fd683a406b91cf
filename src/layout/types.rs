//! Data structures for layout computation.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::Table;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A table rectangle already fixed in the layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedTable {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PlacedTable {
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

/// Tables positioned so far, in placement order.
#[derive(Debug, Clone, Default)]
pub struct Placements {
    tables: IndexMap<String, PlacedTable>,
}

impl Placements {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, placed: PlacedTable) {
        self.tables.insert(id.into(), placed);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tables.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&PlacedTable> {
        self.tables.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PlacedTable)> {
        self.tables.iter().map(|(id, placed)| (id.as_str(), placed))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Lowest bottom edge among placed tables.
    pub fn bottom(&self) -> Option<f64> {
        self.tables
            .values()
            .map(PlacedTable::bottom)
            .reduce(f64::max)
    }
}

/// Layout tuning knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutOptions {
    pub start_x: f64,
    pub start_y: f64,
    pub gap_x: f64,
    pub gap_y: f64,
    /// Connected-table count from which cluster growth is replaced by a plain grid.
    pub small_graph_threshold: usize,
    pub small_grid_columns: usize,
    pub large_grid_columns: usize,
    pub isolated_grid_columns: usize,
    pub max_spiral_iterations: usize,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            start_x: 100.0,
            start_y: 100.0,
            gap_x: 100.0,
            gap_y: 100.0,
            small_graph_threshold: 100,
            small_grid_columns: 6,
            large_grid_columns: 10,
            isolated_grid_columns: 8,
            max_spiral_iterations: 1000,
        }
    }
}

/// The complete layout result.
#[derive(Debug, Clone)]
pub struct LayoutOutcome {
    /// Input tables in input order, with engine-assigned positions.
    pub tables: Vec<Table>,
    /// Tables whose spiral search ran out of iterations and may overlap.
    pub unresolved: Vec<String>,
}

impl LayoutOutcome {
    pub fn is_fully_resolved(&self) -> bool {
        self.unresolved.is_empty()
    }
}
