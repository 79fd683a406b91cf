//! Undirected table connectivity derived from relationships.

use std::collections::HashSet;

use indexmap::{IndexMap, IndexSet};

use crate::model::{Relationship, Table};

/// Table id -> neighbor table ids. Neighbor sets keep first-insertion order
/// so that layouts are reproducible.
#[derive(Debug, Clone, Default)]
pub struct ConnectivityGraph {
    adjacency: IndexMap<String, IndexSet<String>>,
}

impl ConnectivityGraph {
    /// Build from every relationship, including ones pointing at unknown tables.
    pub fn build(relationships: &[Relationship]) -> Self {
        let mut graph = Self::default();
        for rel in relationships {
            graph.add_edge(&rel.source_table_id, &rel.target_table_id);
        }
        graph
    }

    /// Build from the relationships whose both ends are present in `tables`.
    /// Dangling references contribute no edge.
    pub fn build_for(tables: &[Table], relationships: &[Relationship]) -> Self {
        let known: HashSet<&str> = tables.iter().map(|t| t.id.as_str()).collect();
        let mut graph = Self::default();
        for rel in relationships {
            if known.contains(rel.source_table_id.as_str())
                && known.contains(rel.target_table_id.as_str())
            {
                graph.add_edge(&rel.source_table_id, &rel.target_table_id);
            } else {
                tracing::debug!(
                    relationship = %rel.id,
                    source = %rel.source_table_id,
                    target = %rel.target_table_id,
                    "skipping relationship with unknown table"
                );
            }
        }
        graph
    }

    fn add_edge(&mut self, a: &str, b: &str) {
        self.adjacency
            .entry(a.to_string())
            .or_default()
            .insert(b.to_string());
        self.adjacency
            .entry(b.to_string())
            .or_default()
            .insert(a.to_string());
    }

    pub fn degree(&self, id: &str) -> usize {
        self.adjacency.get(id).map_or(0, IndexSet::len)
    }

    pub fn neighbors(&self, id: &str) -> impl Iterator<Item = &str> {
        self.adjacency
            .get(id)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    pub fn is_isolated(&self, id: &str) -> bool {
        self.degree(id) == 0
    }

    pub fn is_connected(&self, id: &str) -> bool {
        !self.is_isolated(id)
    }

    /// Number of tables with at least one edge.
    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }
}
