use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use schemavis::layout::{CollisionResolver, PlacedTable, Point};
use schemavis::model::DataType;
use schemavis::{Cardinality, Field, LayoutEngine, LayoutOptions, Relationship, Table, TableMetrics};

fn table(id: &str, fields: usize) -> Table {
    let mut table = Table::new(id, id);
    for i in 0..fields {
        table
            .fields
            .push(Field::new(format!("{id}.{i}"), format!("col_{i}"), DataType::new("int")));
    }
    table
}

fn rel(source: &str, target: &str) -> Relationship {
    Relationship {
        id: format!("{source}->{target}"),
        name: format!("fk_{source}_{target}"),
        source_schema: None,
        source_table_id: source.to_string(),
        target_schema: None,
        target_table_id: target.to_string(),
        source_field_id: format!("{source}.0"),
        target_field_id: format!("{target}.0"),
        source_cardinality: Cardinality::Many,
        target_cardinality: Cardinality::One,
        created_at: 0,
    }
}

fn random_schema(rng: &mut StdRng) -> (Vec<Table>, Vec<Relationship>) {
    let count = rng.gen_range(1..=50);
    let tables: Vec<Table> = (0..count)
        .map(|i| table(&format!("t{i}"), rng.gen_range(0..16)))
        .collect();

    let edges = rng.gen_range(0..=count * 2);
    let relationships = (0..edges)
        .map(|_| {
            let a = rng.gen_range(0..count);
            let b = rng.gen_range(0..count);
            rel(&format!("t{a}"), &format!("t{b}"))
        })
        .collect();

    (tables, relationships)
}

fn placed(table: &Table, metrics: &TableMetrics) -> PlacedTable {
    let size = metrics.table_size(Some(table));
    PlacedTable {
        x: table.x,
        y: table.y,
        width: size.width,
        height: size.height,
    }
}

#[test]
fn random_schemas_have_finite_positions() {
    let mut rng = StdRng::seed_from_u64(7);
    let engine = LayoutEngine::default();

    for _ in 0..40 {
        let (tables, relationships) = random_schema(&mut rng);
        let out = engine.layout(&tables, &relationships);

        assert_eq!(out.len(), tables.len());
        assert!(out.iter().all(|t| t.x.is_finite() && t.y.is_finite()));
    }
}

#[test]
fn random_schemas_do_not_overlap() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let engine = LayoutEngine::default();
    let resolver = CollisionResolver::default();
    let metrics = TableMetrics::default();

    for round in 0..40 {
        let (tables, relationships) = random_schema(&mut rng);
        let outcome = engine.layout_with_report(&tables, &relationships);

        // Exhausted searches are reported, never silently accepted.
        for id in &outcome.unresolved {
            assert!(tables.iter().any(|t| &t.id == id));
        }

        let resolved: Vec<&Table> = outcome
            .tables
            .iter()
            .filter(|t| !outcome.unresolved.contains(&t.id))
            .collect();

        for (i, a) in resolved.iter().enumerate() {
            for b in &resolved[i + 1..] {
                // Whichever was placed later was tested against the earlier one.
                let a_clear = !resolver.overlaps(Point::new(a.x, a.y), &placed(b, &metrics));
                let b_clear = !resolver.overlaps(Point::new(b.x, b.y), &placed(a, &metrics));
                assert!(
                    a_clear || b_clear,
                    "round {round}: {} at ({}, {}) overlaps {} at ({}, {})",
                    a.id,
                    a.x,
                    a.y,
                    b.id,
                    b.x,
                    b.y
                );
            }
        }
    }
}

#[test]
fn zero_relationships_use_eight_column_grid() {
    let tables: Vec<Table> = (0..20).map(|i| table(&format!("t{i}"), 3)).collect();
    let out = LayoutEngine::default().layout(&tables, &[]);

    let first_row: Vec<&Table> = out.iter().take(8).collect();
    assert!(first_row.iter().all(|t| t.y == 100.0));
    assert_eq!(first_row[0].x, 100.0);
    assert!(first_row.windows(2).all(|w| w[1].x > w[0].x));

    // The ninth table starts the second row back at the left edge.
    assert_eq!(out[8].x, 100.0);
    assert!(out[8].y > 100.0);
    assert!(out.iter().all(|t| t.y >= 100.0));
}

#[test]
fn self_reference_is_placed_once() {
    let tables = vec![table("node", 3), table("other", 1)];
    let relationships = vec![rel("node", "node")];
    let outcome = LayoutEngine::default().layout_with_report(&tables, &relationships);

    assert_eq!(outcome.tables.len(), 2);
    assert_eq!(outcome.tables.iter().filter(|t| t.id == "node").count(), 1);
    assert!(outcome.is_fully_resolved());
}

#[test]
fn inputs_are_not_mutated() {
    let mut rng = StdRng::seed_from_u64(42);
    let (tables, relationships) = random_schema(&mut rng);
    let tables_before = tables.clone();
    let relationships_before = relationships.clone();

    let engine = LayoutEngine::default();
    let first = engine.layout(&tables.clone(), &relationships.clone());
    let second = engine.layout(&tables, &relationships);

    assert_eq!(tables, tables_before);
    assert_eq!(relationships, relationships_before);
    assert_eq!(first, second);
}

#[test]
fn isolated_tables_sit_below_connected_region() {
    let mut rng = StdRng::seed_from_u64(99);
    let options = LayoutOptions::default();
    let metrics = TableMetrics::default();

    for _ in 0..20 {
        let (tables, relationships) = random_schema(&mut rng);
        let out = LayoutEngine::default().layout(&tables, &relationships);

        let connected: Vec<&String> = relationships
            .iter()
            .flat_map(|r| [&r.source_table_id, &r.target_table_id])
            .collect();
        let (linked, isolated): (Vec<&Table>, Vec<&Table>) =
            out.iter().partition(|t| connected.contains(&&t.id));

        let Some(max_bottom) = linked
            .iter()
            .map(|t| t.y + metrics.table_height(Some(*t)))
            .reduce(f64::max)
        else {
            continue;
        };
        for table in isolated {
            assert!(table.y >= max_bottom + 2.0 * options.gap_y);
        }
    }
}

#[test]
fn table_heights() {
    let metrics = TableMetrics::default();
    assert_eq!(metrics.table_height(Some(&table("a", 5))), 202.0);
    assert_eq!(metrics.table_height(Some(&table("b", 15))), 394.0);

    let mut expanded = table("c", 15);
    expanded.expanded = Some(true);
    assert_eq!(metrics.table_height(Some(&expanded)), 522.0);
}
