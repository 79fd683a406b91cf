//! Turns parsed DDL into a [`Diagram`] with generated ids.

use std::collections::HashSet;

use crate::model::{
    Cardinality, DataType, DatabaseType, Diagram, Field, Index, IndexType, Relationship, Table,
    TABLE_COLORS,
};

use super::parser::{ParsedSchema, QualifiedName, RawColumn, RawForeignKey, RawTable};

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Assemble a diagram from parsed statements. Tables sit at the origin until laid out.
pub fn build_diagram(parsed: ParsedSchema, name: &str, database_type: DatabaseType) -> Diagram {
    let now = now_millis();

    let mut tables: Vec<Table> = parsed
        .tables
        .iter()
        .enumerate()
        .map(|(order, raw)| build_table(raw, order, now))
        .collect();

    for raw in &parsed.indexes {
        let Some(position) = find_table(&tables, &raw.table) else {
            tracing::debug!(table = %raw.table.name, "index on unknown table skipped");
            continue;
        };
        let table = &tables[position];
        let field_ids = field_ids(table, &raw.columns);
        if field_ids.is_empty() {
            continue;
        }
        let index = Index {
            id: new_id(),
            name: raw
                .name
                .clone()
                .unwrap_or_else(|| format!("{}_{}_idx", table.name, raw.columns.join("_"))),
            unique: raw.unique,
            field_ids,
            index_type: raw.method.as_deref().and_then(IndexType::from_str),
            is_primary_key: None,
            created_at: now,
        };
        tables[position].indexes.push(index);
    }

    let relationships = build_relationships(&tables, &parsed.foreign_keys, now);

    Diagram {
        id: new_id(),
        name: name.to_string(),
        database_type,
        created_at: now,
        updated_at: now,
        tables,
        relationships,
    }
}

fn build_table(raw: &RawTable, order: usize, now: i64) -> Table {
    let mut table = Table::new(new_id(), raw.name.name.clone());
    table.schema = raw.name.schema.clone();
    table.color = TABLE_COLORS[order % TABLE_COLORS.len()].to_string();
    table.is_view = raw.is_view;
    table.is_materialized_view = raw.is_view.then_some(raw.is_materialized);
    table.order = Some(order as i64);
    table.created_at = now;

    let single_unique: HashSet<&str> = raw
        .unique_keys
        .iter()
        .filter(|key| key.columns.len() == 1)
        .map(|key| key.columns[0].as_str())
        .collect();

    table.fields = raw
        .columns
        .iter()
        .map(|column| {
            let primary_key = column.primary_key || raw.primary_key.contains(&column.name);
            let unique = column.unique || single_unique.contains(column.name.as_str());
            build_field(column, primary_key, unique, now)
        })
        .collect();

    let pk_ids: Vec<String> = table
        .fields
        .iter()
        .filter(|f| f.primary_key)
        .map(|f| f.id.clone())
        .collect();
    if !pk_ids.is_empty() {
        table.indexes.push(Index {
            id: new_id(),
            name: format!("{}_pkey", table.name),
            unique: true,
            field_ids: pk_ids,
            index_type: None,
            is_primary_key: Some(true),
            created_at: now,
        });
    }

    for key in &raw.unique_keys {
        let field_ids = field_ids(&table, &key.columns);
        if field_ids.is_empty() {
            continue;
        }
        table.indexes.push(Index {
            id: new_id(),
            name: key
                .name
                .clone()
                .unwrap_or_else(|| format!("{}_{}_key", table.name, key.columns.join("_"))),
            unique: true,
            field_ids,
            index_type: None,
            is_primary_key: None,
            created_at: now,
        });
    }

    table
}

fn build_field(column: &RawColumn, primary_key: bool, unique: bool, now: i64) -> Field {
    let ty = &column.column_type;
    let type_name = if ty.name.is_empty() { "unknown" } else { ty.name.as_str() };

    let mut field = Field::new(new_id(), column.name.clone(), DataType::new(type_name));
    field.primary_key = primary_key;
    field.unique = unique;
    field.nullable = !(column.not_null || primary_key);
    field.increment = column.increment.then_some(true);
    field.is_array = ty.is_array.then_some(true);
    field.character_maximum_length = ty.character_maximum_length.clone();
    field.precision = ty.precision;
    field.scale = ty.scale;
    field.default = column.default.clone();
    field.collation = column.collation.clone();
    field.comments = column.comment.clone();
    field.created_at = now;
    field
}

fn field_ids(table: &Table, columns: &[String]) -> Vec<String> {
    columns
        .iter()
        .filter_map(|name| find_field(table, name))
        .map(|f| f.id.clone())
        .collect()
}

fn find_field<'a>(table: &'a Table, name: &str) -> Option<&'a Field> {
    table
        .field_by_name(name)
        .or_else(|| table.fields.iter().find(|f| f.name.eq_ignore_ascii_case(name)))
}

/// Exact schema match first, then any table with the same name.
fn find_table(tables: &[Table], name: &QualifiedName) -> Option<usize> {
    let same_name = |t: &Table| t.name.eq_ignore_ascii_case(&name.name);
    let same_schema = |t: &Table| match (&t.schema, &name.schema) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        (None, None) => true,
        _ => false,
    };

    tables
        .iter()
        .position(|t| same_name(t) && same_schema(t))
        .or_else(|| tables.iter().position(same_name))
}

fn build_relationships(tables: &[Table], foreign_keys: &[RawForeignKey], now: i64) -> Vec<Relationship> {
    let mut relationships = Vec::new();
    let mut seen: HashSet<(String, String)> = HashSet::new();

    for fk in foreign_keys {
        let (Some(source), Some(target)) = (
            find_table(tables, &fk.table).map(|i| &tables[i]),
            find_table(tables, &fk.target).map(|i| &tables[i]),
        ) else {
            tracing::debug!(
                source = %fk.table.name,
                target = %fk.target.name,
                "foreign key references an unknown table"
            );
            continue;
        };

        let target_columns: Vec<String> = if fk.target_columns.is_empty() {
            let pk: Vec<String> = target
                .fields
                .iter()
                .filter(|f| f.primary_key)
                .map(|f| f.name.clone())
                .collect();
            if pk.is_empty() { vec!["id".to_string()] } else { pk }
        } else {
            fk.target_columns.clone()
        };

        let source_pk_count = source.fields.iter().filter(|f| f.primary_key).count();

        for (column, target_column) in fk.columns.iter().zip(&target_columns) {
            let (Some(source_field), Some(target_field)) =
                (find_field(source, column), find_field(target, target_column))
            else {
                tracing::debug!(
                    table = %source.name,
                    column = %column,
                    "foreign key column not found"
                );
                continue;
            };

            if !seen.insert((source_field.id.clone(), target_field.id.clone())) {
                continue;
            }

            let source_is_one =
                source_field.unique || (source_field.primary_key && source_pk_count == 1);

            relationships.push(Relationship {
                id: new_id(),
                name: fk.name.clone().unwrap_or_else(|| {
                    format!("fk_{}_{}_{}", source.name, source_field.name, target.name)
                }),
                source_schema: source.schema.clone(),
                source_table_id: source.id.clone(),
                target_schema: target.schema.clone(),
                target_table_id: target.id.clone(),
                source_field_id: source_field.id.clone(),
                target_field_id: target_field.id.clone(),
                source_cardinality: if source_is_one {
                    Cardinality::One
                } else {
                    Cardinality::Many
                },
                target_cardinality: Cardinality::One,
                created_at: now,
            });
        }
    }

    relationships
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::{parse_sql, Dialect};

    fn build(sql: &str) -> Diagram {
        build_diagram(
            parse_sql(sql, Dialect::Generic).unwrap(),
            "test",
            DatabaseType::Generic,
        )
    }

    #[test]
    fn test_fields_and_primary_key_index() {
        let diagram = build(
            "CREATE TABLE users (id INT PRIMARY KEY, email VARCHAR(100) NOT NULL, bio TEXT);",
        );
        let users = &diagram.tables[0];

        assert_eq!(users.fields.len(), 3);
        assert!(users.fields[0].primary_key);
        assert!(!users.fields[0].nullable);
        assert!(!users.fields[1].nullable);
        assert!(users.fields[2].nullable);
        assert_eq!(users.fields[1].character_maximum_length.as_deref(), Some("100"));

        let pk = &users.indexes[0];
        assert_eq!(pk.name, "users_pkey");
        assert_eq!(pk.is_primary_key, Some(true));
        assert_eq!(pk.field_ids, vec![users.fields[0].id.clone()]);
        assert_eq!(users.x, 0.0);
        assert_eq!(users.order, Some(0));
    }

    #[test]
    fn test_relationship_cardinality() {
        let diagram = build(
            r#"
            CREATE TABLE users (id INT PRIMARY KEY);
            CREATE TABLE profiles (user_id INT PRIMARY KEY REFERENCES users(id));
            CREATE TABLE posts (id INT PRIMARY KEY, author_id INT REFERENCES users(id));
        "#,
        );
        assert_eq!(diagram.relationships.len(), 2);

        let users = &diagram.tables[0];
        let profile_rel = &diagram.relationships[0];
        assert_eq!(profile_rel.target_table_id, users.id);
        assert_eq!(profile_rel.source_table_id, diagram.tables[1].id);
        assert_eq!(profile_rel.source_cardinality, Cardinality::One);
        assert_eq!(profile_rel.target_cardinality, Cardinality::One);

        let post_rel = &diagram.relationships[1];
        assert_eq!(post_rel.source_cardinality, Cardinality::Many);
        assert_eq!(post_rel.name, "fk_posts_author_id_users");
    }

    #[test]
    fn test_reference_without_columns_uses_primary_key() {
        let diagram = build(
            r#"
            CREATE TABLE teams (code TEXT PRIMARY KEY);
            CREATE TABLE players (id INT, team TEXT REFERENCES teams);
        "#,
        );
        let rel = &diagram.relationships[0];
        let teams = &diagram.tables[0];
        assert_eq!(rel.target_field_id, teams.fields[0].id);
    }

    #[test]
    fn test_unknown_target_and_duplicates_dropped() {
        let diagram = build(
            r#"
            CREATE TABLE a (id INT PRIMARY KEY, b_id INT REFERENCES b(id), ghost_id INT REFERENCES ghost(id));
            CREATE TABLE b (id INT PRIMARY KEY);
            ALTER TABLE a ADD FOREIGN KEY (b_id) REFERENCES b (id);
        "#,
        );
        assert_eq!(diagram.relationships.len(), 1);
    }

    #[test]
    fn test_indexes_and_unique_constraints() {
        let diagram = build(
            r#"
            CREATE TABLE t (id INT, email TEXT, CONSTRAINT t_email_key UNIQUE (email));
            CREATE INDEX t_email_hash ON t USING hash (email);
            CREATE INDEX ON t (missing_column);
        "#,
        );
        let table = &diagram.tables[0];
        assert!(table.fields[1].unique);
        assert_eq!(table.indexes.len(), 2);
        assert_eq!(table.indexes[0].name, "t_email_key");
        assert!(table.indexes[0].unique);
        assert_eq!(table.indexes[1].index_type, Some(IndexType::Hash));
        assert!(!table.indexes[1].unique);
    }

    #[test]
    fn test_views_and_colors() {
        let diagram = build(
            r#"
            CREATE TABLE a (id INT);
            CREATE MATERIALIZED VIEW v AS SELECT * FROM a;
        "#,
        );
        assert_eq!(diagram.tables[0].is_materialized_view, None);
        assert!(diagram.tables[1].is_view);
        assert_eq!(diagram.tables[1].is_materialized_view, Some(true));
        assert_eq!(diagram.tables[0].color, TABLE_COLORS[0]);
        assert_eq!(diagram.tables[1].color, TABLE_COLORS[1]);
        assert_ne!(diagram.tables[0].id, diagram.tables[1].id);
    }
}
