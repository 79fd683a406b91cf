//! Layout engine core implementation.

use crate::measure::TableMetrics;
use crate::model::{Relationship, Table};

use super::graph::ConnectivityGraph;
use super::placement::Placer;
use super::types::{LayoutOptions, LayoutOutcome};

/// Layout engine configuration and computation.
#[derive(Debug, Clone, Default)]
pub struct LayoutEngine {
    pub(crate) options: LayoutOptions,
    pub(crate) metrics: TableMetrics,
}

impl LayoutEngine {
    pub fn new(options: LayoutOptions, metrics: TableMetrics) -> Self {
        Self { options, metrics }
    }

    pub fn options(&self) -> &LayoutOptions {
        &self.options
    }

    pub fn metrics(&self) -> &TableMetrics {
        &self.metrics
    }

    /// Compute positions for `tables`. The result has the same tables in the
    /// same order with only `x`/`y` changed.
    pub fn layout(&self, tables: &[Table], relationships: &[Relationship]) -> Vec<Table> {
        self.layout_with_report(tables, relationships).tables
    }

    /// Same as [`layout`](Self::layout), also reporting tables that could not
    /// be moved clear of their neighbors.
    pub fn layout_with_report(
        &self,
        tables: &[Table],
        relationships: &[Relationship],
    ) -> LayoutOutcome {
        // Phase 1: Connectivity and partition
        let graph = ConnectivityGraph::build_for(tables, relationships);
        let (mut connected, isolated): (Vec<&Table>, Vec<&Table>) =
            tables.iter().partition(|t| graph.is_connected(&t.id));

        // Phase 2: Most connected first (stable)
        connected.sort_by(|a, b| graph.degree(&b.id).cmp(&graph.degree(&a.id)));

        tracing::debug!(
            tables = tables.len(),
            connected = connected.len(),
            isolated = isolated.len(),
            "computing layout"
        );

        // Phase 3: Seeding and cluster growth
        let mut placer = Placer::new(tables, &graph, &self.options, &self.metrics);
        if connected.len() < self.options.small_graph_threshold {
            placer.seed_clusters(&connected);
        } else {
            tracing::debug!(
                connected = connected.len(),
                threshold = self.options.small_graph_threshold,
                "large schema, placing connected tables on a plain grid"
            );
            placer.seed_grid(&connected);
        }

        // Phase 4: Isolated region
        placer.place_isolated(&isolated);

        let (placements, unresolved) = placer.finish();
        let tables = tables
            .iter()
            .map(|table| {
                let mut table = table.clone();
                if let Some(placed) = placements.get(&table.id) {
                    table.x = placed.x;
                    table.y = placed.y;
                }
                table
            })
            .collect();

        LayoutOutcome { tables, unresolved }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Cardinality, DataType, Field};

    fn table(id: &str, fields: usize) -> Table {
        let mut table = Table::new(id, id);
        for i in 0..fields {
            table
                .fields
                .push(Field::new(format!("{id}_f{i}"), format!("c{i}"), DataType::new("int")));
        }
        table
    }

    fn rel(source: &str, target: &str) -> Relationship {
        Relationship {
            id: format!("{source}-{target}"),
            name: format!("{source}_{target}_fk"),
            source_schema: None,
            source_table_id: source.to_string(),
            target_schema: None,
            target_table_id: target.to_string(),
            source_field_id: format!("{source}_f0"),
            target_field_id: format!("{target}_f0"),
            source_cardinality: Cardinality::Many,
            target_cardinality: Cardinality::One,
            created_at: 0,
        }
    }

    #[test]
    fn test_empty_input() {
        let engine = LayoutEngine::default();
        assert!(engine.layout(&[], &[]).is_empty());
    }

    #[test]
    fn test_preserves_order_and_identity() {
        let tables = vec![table("a", 2), table("b", 3), table("c", 1)];
        let relationships = vec![rel("c", "a")];
        let out = LayoutEngine::default().layout(&tables, &relationships);

        assert_eq!(out.len(), 3);
        for (before, after) in tables.iter().zip(&out) {
            assert_eq!(before.id, after.id);
            assert_eq!(before.fields, after.fields);
            assert_eq!(before.color, after.color);
        }
    }

    #[test]
    fn test_highest_degree_table_seeds_first() {
        let tables = vec![table("leaf", 1), table("hub", 1), table("x", 1), table("y", 1)];
        let relationships = vec![rel("leaf", "hub"), rel("x", "hub"), rel("y", "hub")];
        let out = LayoutEngine::default().layout(&tables, &relationships);

        let hub = out.iter().find(|t| t.id == "hub").unwrap();
        assert_eq!((hub.x, hub.y), (100.0, 100.0));
    }

    #[test]
    fn test_self_reference_terminates() {
        let tables = vec![table("employees", 4)];
        let relationships = vec![rel("employees", "employees")];
        let outcome = LayoutEngine::default().layout_with_report(&tables, &relationships);

        assert_eq!(outcome.tables.len(), 1);
        assert_eq!((outcome.tables[0].x, outcome.tables[0].y), (100.0, 100.0));
        assert!(outcome.is_fully_resolved());
    }

    #[test]
    fn test_cycle_terminates() {
        let tables = vec![table("a", 1), table("b", 1), table("c", 1)];
        let relationships = vec![rel("a", "b"), rel("b", "c"), rel("c", "a")];
        let out = LayoutEngine::default().layout(&tables, &relationships);

        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|t| t.x.is_finite() && t.y.is_finite()));
    }

    #[test]
    fn test_dangling_reference_leaves_table_isolated() {
        let tables = vec![table("a", 1), table("b", 1)];
        let relationships = vec![rel("a", "ghost"), rel("b", "b")];
        let out = LayoutEngine::default().layout(&tables, &relationships);

        // b is the only connected table and sits at the start; a goes below it.
        let b = &out[1];
        let a = &out[0];
        assert_eq!((b.x, b.y), (100.0, 100.0));
        let b_bottom = b.y + TableMetrics::default().table_height(Some(&tables[1]));
        assert!(a.y >= b_bottom + 200.0);
    }

    #[test]
    fn test_zero_relationships_isolated_grid() {
        let tables: Vec<Table> = (0..9).map(|i| table(&format!("t{i}"), 2)).collect();
        let out = LayoutEngine::default().layout(&tables, &[]);

        for (i, t) in out.iter().take(8).enumerate() {
            assert_eq!(t.y, 100.0);
            assert_eq!(t.x, 100.0 + i as f64 * 324.0);
        }
        assert_eq!(out[8].x, 100.0);
        // 2 fields: 42 + 64 = 106 high, next row 206 further down.
        assert_eq!(out[8].y, 306.0);
    }

    #[test]
    fn test_large_schema_uses_dense_grid() {
        let count = 120;
        let tables: Vec<Table> = (0..count).map(|i| table(&format!("t{i}"), 1)).collect();
        let relationships: Vec<Relationship> = (0..count / 2)
            .map(|i| rel(&format!("t{}", 2 * i), &format!("t{}", 2 * i + 1)))
            .collect();
        let outcome = LayoutEngine::default().layout_with_report(&tables, &relationships);

        assert!(outcome.is_fully_resolved());
        // Every table has degree one; the first row of the 10-column grid is
        // free and lands exactly on its grid cells.
        for (i, t) in outcome.tables.iter().take(10).enumerate() {
            assert_eq!(t.x, 100.0 + i as f64 * 324.0);
            assert_eq!(t.y, 100.0);
        }
    }

    #[test]
    fn test_custom_options() {
        let options = LayoutOptions {
            start_x: 0.0,
            start_y: 0.0,
            ..LayoutOptions::default()
        };
        let engine = LayoutEngine::new(options, TableMetrics::default());
        let out = engine.layout(&[table("solo", 1)], &[]);
        assert_eq!((out[0].x, out[0].y), (0.0, 0.0));
    }
}
