//! Table placement: seeding grids, neighbor clusters and the isolated region.

use std::collections::HashMap;
use std::f64::consts::TAU;

use crate::measure::{Size, TableMetrics};
use crate::model::Table;

use super::collision::{CollisionResolver, Resolution};
use super::graph::ConnectivityGraph;
use super::types::{LayoutOptions, PlacedTable, Placements, Point};

/// A placed table whose neighbors are still being distributed around it.
struct Frame<'a> {
    origin: Point,
    size: Size,
    neighbors: Vec<&'a str>,
    next: usize,
    angle: f64,
    angle_step: f64,
}

/// Mutable placement state for a single layout run.
pub struct Placer<'a> {
    tables: HashMap<&'a str, &'a Table>,
    graph: &'a ConnectivityGraph,
    options: &'a LayoutOptions,
    metrics: &'a TableMetrics,
    resolver: CollisionResolver,
    placements: Placements,
    unresolved: Vec<String>,
}

impl<'a> Placer<'a> {
    pub fn new(
        tables: &'a [Table],
        graph: &'a ConnectivityGraph,
        options: &'a LayoutOptions,
        metrics: &'a TableMetrics,
    ) -> Self {
        let mut lookup: HashMap<&str, &Table> = HashMap::with_capacity(tables.len());
        for table in tables {
            // First occurrence wins for duplicate ids.
            lookup.entry(table.id.as_str()).or_insert(table);
        }

        Self {
            tables: lookup,
            graph,
            options,
            metrics,
            resolver: CollisionResolver::new(options),
            placements: Placements::new(),
            unresolved: Vec::new(),
        }
    }

    pub fn finish(self) -> (Placements, Vec<String>) {
        (self.placements, self.unresolved)
    }

    fn size_of(&self, id: &str) -> Size {
        self.metrics.table_size(self.tables.get(id).copied())
    }

    fn is_pending(&self, id: &str) -> bool {
        !self.placements.contains(id) && self.tables.contains_key(id)
    }

    fn commit(&mut self, id: &str, size: Size, resolution: Resolution) {
        if resolution.exhausted {
            tracing::warn!(
                table = %id,
                iterations = resolution.iterations,
                x = resolution.point.x,
                y = resolution.point.y,
                "no free spot found, table may overlap"
            );
            self.unresolved.push(id.to_string());
        }
        self.placements.insert(
            id,
            PlacedTable {
                x: resolution.point.x,
                y: resolution.point.y,
                width: size.width,
                height: size.height,
            },
        );
    }

    /// Resolve `id` near `base` and record it.
    fn place(&mut self, id: &str, base: Point) -> (Point, Size) {
        let size = self.size_of(id);
        let resolution = self.resolver.resolve(base, size, &self.placements);
        let point = resolution.point;
        self.commit(id, size, resolution);
        (point, size)
    }

    fn open_frame(&mut self, id: &'a str, base: Point) -> Frame<'a> {
        let (origin, size) = self.place(id, base);
        let graph = self.graph;
        let neighbors: Vec<&'a str> = graph.neighbors(id).collect();
        let angle_step = TAU / neighbors.len().max(1) as f64;

        Frame {
            origin,
            size,
            neighbors,
            next: 0,
            angle: 0.0,
            angle_step,
        }
    }

    /// Place `root` and grow its cluster depth-first: each unplaced neighbor is
    /// anchored on a circle around the table that reached it, then expanded in
    /// turn before the next sibling is considered.
    pub fn place_cluster(&mut self, root: &'a str, base: Point) {
        if !self.is_pending(root) {
            return;
        }

        let gap_x = self.options.gap_x;
        let gap_y = self.options.gap_y;
        let mut stack = vec![self.open_frame(root, base)];

        while let Some(frame) = stack.last_mut() {
            let Some(offset) = frame.neighbors[frame.next..]
                .iter()
                .position(|id| self.is_pending(id))
            else {
                stack.pop();
                continue;
            };

            let child = frame.neighbors[frame.next + offset];
            frame.next += offset + 1;

            let child_size = self.size_of(child);
            let avg_width = (frame.size.width + child_size.width) / 2.0;
            let avg_height = (frame.size.height + child_size.height) / 2.0;
            let anchor = Point::new(
                frame.origin.x + frame.angle.cos() * (avg_width + gap_x * 2.0),
                frame.origin.y + frame.angle.sin() * (avg_height + gap_y * 2.0),
            );
            frame.angle += frame.angle_step;

            let child_frame = self.open_frame(child, anchor);
            stack.push(child_frame);
        }
    }

    /// Double-spaced grid seeds; each seed grows its own cluster.
    pub fn seed_clusters(&mut self, connected: &[&'a Table]) {
        let columns = self.options.small_grid_columns.max(1);

        for (index, &table) in connected.iter().enumerate() {
            if !self.is_pending(&table.id) {
                continue;
            }
            let size = self.size_of(&table.id);
            let row = (index / columns) as f64;
            let col = (index % columns) as f64;
            let base = Point::new(
                self.options.start_x + col * (size.width + self.options.gap_x * 2.0),
                self.options.start_y + row * (size.height + self.options.gap_y * 2.0),
            );
            self.place_cluster(&table.id, base);
        }
    }

    /// Dense single-spaced grid without cluster growth, for large schemas.
    pub fn seed_grid(&mut self, connected: &[&'a Table]) {
        let columns = self.options.large_grid_columns.max(1);

        for (index, &table) in connected.iter().enumerate() {
            if !self.is_pending(&table.id) {
                continue;
            }
            let size = self.size_of(&table.id);
            let row = (index / columns) as f64;
            let col = (index % columns) as f64;
            let base = Point::new(
                self.options.start_x + col * (size.width + self.options.gap_x),
                self.options.start_y + row * (size.height + self.options.gap_y),
            );
            self.place(&table.id, base);
        }
    }

    /// Grid below everything placed so far. Starts at `start_y` when nothing is
    /// placed yet.
    pub fn place_isolated(&mut self, isolated: &[&'a Table]) {
        if isolated.is_empty() {
            return;
        }

        let floor_y = match self.placements.bottom() {
            Some(bottom) => bottom + self.options.gap_y * 2.0,
            None => self.options.start_y,
        };
        let columns = self.options.isolated_grid_columns.max(1);

        for (index, &table) in isolated.iter().enumerate() {
            if !self.is_pending(&table.id) {
                continue;
            }
            let size = self.size_of(&table.id);
            let row = (index / columns) as f64;
            let col = (index % columns) as f64;
            let base = Point::new(
                self.options.start_x + col * (size.width + self.options.gap_x),
                floor_y + row * (size.height + self.options.gap_y),
            );
            let resolution = self
                .resolver
                .resolve_below(base, size, &self.placements, floor_y);
            self.commit(&table.id, size, resolution);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Cardinality, Relationship};

    fn rel(source: &str, target: &str) -> Relationship {
        Relationship {
            id: format!("{source}-{target}"),
            name: format!("{source}_{target}_fk"),
            source_schema: None,
            source_table_id: source.to_string(),
            target_schema: None,
            target_table_id: target.to_string(),
            source_field_id: "f".to_string(),
            target_field_id: "f".to_string(),
            source_cardinality: Cardinality::Many,
            target_cardinality: Cardinality::One,
            created_at: 0,
        }
    }

    #[test]
    fn test_star_neighbors_on_circle() {
        let tables: Vec<Table> = ["hub", "a", "b", "c", "d"]
            .iter()
            .map(|id| Table::new(*id, *id))
            .collect();
        let relationships = vec![
            rel("hub", "a"),
            rel("hub", "b"),
            rel("hub", "c"),
            rel("hub", "d"),
        ];
        let graph = ConnectivityGraph::build(&relationships);
        let options = LayoutOptions::default();
        let metrics = TableMetrics::default();

        let mut placer = Placer::new(&tables, &graph, &options, &metrics);
        placer.place_cluster("hub", Point::new(100.0, 100.0));
        let (placements, unresolved) = placer.finish();

        assert!(unresolved.is_empty());
        assert_eq!(placements.len(), 5);
        let hub = placements.get("hub").unwrap();
        assert_eq!((hub.x, hub.y), (100.0, 100.0));

        // First neighbor is anchored straight to the right at
        // avg width (224) + 2 * gap (200) and is free there.
        let a = placements.get("a").unwrap();
        assert!((a.x - 524.0).abs() < 1e-9);
        assert!((a.y - 100.0).abs() < 1e-9);

        let order: Vec<&str> = placements.iter().map(|(id, _)| id).collect();
        assert_eq!(order, vec!["hub", "a", "b", "c", "d"]);
    }

    #[test]
    fn test_cluster_is_depth_first() {
        // chain: root - x - y, and root - z. y is placed before z.
        let tables: Vec<Table> = ["root", "x", "y", "z"]
            .iter()
            .map(|id| Table::new(*id, *id))
            .collect();
        let relationships = vec![rel("root", "x"), rel("x", "y"), rel("root", "z")];
        let graph = ConnectivityGraph::build(&relationships);
        let options = LayoutOptions::default();
        let metrics = TableMetrics::default();

        let mut placer = Placer::new(&tables, &graph, &options, &metrics);
        placer.place_cluster("root", Point::new(0.0, 0.0));
        let (placements, _) = placer.finish();

        let order: Vec<&str> = placements.iter().map(|(id, _)| id).collect();
        assert_eq!(order, vec!["root", "x", "y", "z"]);
    }

    #[test]
    fn test_place_cluster_skips_placed_root() {
        let tables = vec![Table::new("a", "a")];
        let graph = ConnectivityGraph::default();
        let options = LayoutOptions::default();
        let metrics = TableMetrics::default();

        let mut placer = Placer::new(&tables, &graph, &options, &metrics);
        placer.place_cluster("a", Point::new(10.0, 10.0));
        placer.place_cluster("a", Point::new(999.0, 999.0));
        let (placements, _) = placer.finish();

        let a = placements.get("a").unwrap();
        assert_eq!((a.x, a.y), (10.0, 10.0));
    }

    #[test]
    fn test_isolated_grid_without_connected_tables() {
        let tables: Vec<Table> = (0..10)
            .map(|i| Table::new(format!("t{i}"), format!("t{i}")))
            .collect();
        let refs: Vec<&Table> = tables.iter().collect();
        let graph = ConnectivityGraph::default();
        let options = LayoutOptions::default();
        let metrics = TableMetrics::default();

        let mut placer = Placer::new(&tables, &graph, &options, &metrics);
        placer.place_isolated(&refs);
        let (placements, _) = placer.finish();

        // Empty tables are 42 high: rows are 142 apart, columns 324 apart.
        let t0 = placements.get("t0").unwrap();
        assert_eq!((t0.x, t0.y), (100.0, 100.0));
        let t7 = placements.get("t7").unwrap();
        assert_eq!((t7.x, t7.y), (100.0 + 7.0 * 324.0, 100.0));
        let t8 = placements.get("t8").unwrap();
        assert_eq!((t8.x, t8.y), (100.0, 242.0));
    }
}
