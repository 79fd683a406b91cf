//! SQL column type normalization.

use super::Dialect;

/// A column type as written in DDL, split into its parts.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawType {
    /// Type words, e.g. `["double", "precision"]`
    pub words: Vec<String>,
    /// Parenthesized arguments, e.g. `["10", "2"]`
    pub args: Vec<String>,
    pub is_array: bool,
}

impl RawType {
    pub fn base(&self) -> String {
        self.words.join(" ").to_lowercase()
    }
}

/// Normalized type plus the size attributes a field keeps.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnType {
    pub name: String,
    pub character_maximum_length: Option<String>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub is_array: bool,
    /// SERIAL-style types imply an auto-incrementing column.
    pub implies_increment: bool,
}

pub fn resolve_type(raw: &RawType, dialect: Dialect) -> ColumnType {
    let base = raw.base();
    let name = map_type(&base, &raw.args, dialect);

    let mut column = ColumnType {
        implies_increment: base.contains("serial"),
        name,
        character_maximum_length: None,
        precision: None,
        scale: None,
        is_array: raw.is_array,
    };

    match column.name.as_str() {
        "varchar" | "char" | "binary" | "varbinary" | "bit" => {
            column.character_maximum_length = raw.args.first().cloned();
        }
        "decimal" | "float" | "double" | "timestamp" | "time" => {
            column.precision = raw.args.first().and_then(|a| a.parse().ok());
            column.scale = raw.args.get(1).and_then(|a| a.parse().ok());
        }
        _ => {}
    }

    column
}

/// Map a lowercase base type to the diagram's type vocabulary.
pub fn map_type(base: &str, args: &[String], dialect: Dialect) -> String {
    let mapped = match dialect {
        Dialect::PostgreSQL => map_postgres_type(base),
        Dialect::MySQL => map_mysql_type(base, args),
        Dialect::SQLite => map_sqlite_type(base),
        _ => map_generic_type(base),
    };
    mapped.to_string()
}

fn map_postgres_type(base: &str) -> &str {
    match base {
        "int" | "int4" | "integer" | "serial" | "serial4" => "int",
        "bigint" | "int8" | "bigserial" | "serial8" => "bigint",
        "smallint" | "int2" | "smallserial" | "serial2" => "smallint",
        "real" | "float4" => "float",
        "double precision" | "float8" => "double",
        "decimal" | "numeric" => "decimal",
        "varchar" | "character varying" => "varchar",
        "char" | "character" | "bpchar" => "char",
        "text" | "citext" => "text",
        "timestamp" | "timestamptz" | "timestamp with time zone"
        | "timestamp without time zone" => "timestamp",
        "date" => "date",
        "time" | "timetz" | "time with time zone" | "time without time zone" => "time",
        "interval" => "interval",
        "boolean" | "bool" => "boolean",
        "bytea" => "bytea",
        "uuid" => "uuid",
        "json" | "jsonb" => "json",
        other => other,
    }
}

fn map_mysql_type<'a>(base: &'a str, args: &[String]) -> &'a str {
    match base {
        "int" | "integer" => "int",
        "bigint" => "bigint",
        "smallint" => "smallint",
        "mediumint" => "mediumint",
        // TINYINT(1) is the conventional boolean
        "tinyint" if args.first().is_some_and(|a| a == "1") => "boolean",
        "tinyint" => "tinyint",
        "float" => "float",
        "double" | "double precision" => "double",
        "decimal" | "numeric" => "decimal",
        "varchar" => "varchar",
        "char" => "char",
        "text" | "longtext" | "mediumtext" | "tinytext" => "text",
        "datetime" | "timestamp" => "timestamp",
        "date" => "date",
        "time" => "time",
        "year" => "year",
        "blob" | "longblob" | "mediumblob" | "tinyblob" => "blob",
        "binary" | "varbinary" => "binary",
        "json" => "json",
        "enum" | "set" => "enum",
        "bool" | "boolean" => "boolean",
        other => other,
    }
}

fn map_sqlite_type(base: &str) -> &str {
    // SQLite column affinity rules, in precedence order.
    if base.contains("int") {
        "int"
    } else if base.contains("char") || base.contains("clob") || base.contains("text") {
        "text"
    } else if base.contains("blob") || base.is_empty() {
        "blob"
    } else if base.contains("real") || base.contains("floa") || base.contains("doub") {
        "float"
    } else {
        match base {
            "boolean" | "bool" => "boolean",
            "date" => "date",
            "datetime" | "timestamp" => "timestamp",
            _ => "numeric",
        }
    }
}

fn map_generic_type(base: &str) -> &str {
    match base {
        "int" | "integer" => "int",
        "bigint" => "bigint",
        "smallint" => "smallint",
        "real" | "float" => "float",
        "double" | "double precision" => "double",
        "decimal" | "numeric" => "decimal",
        "varchar" | "character varying" => "varchar",
        "char" | "character" => "char",
        "text" => "text",
        "timestamp" | "datetime" => "timestamp",
        "date" => "date",
        "time" => "time",
        "boolean" | "bool" => "boolean",
        "blob" => "blob",
        other => other,
    }
}
