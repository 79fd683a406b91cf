//! SQL DDL to diagram import.

mod builder;
mod dialect;
mod lexer;
mod parser;
mod types;

use thiserror::Error;

use crate::layout::LayoutEngine;
use crate::model::{DatabaseType, Diagram};

pub use builder::build_diagram;
pub use dialect::Dialect;
pub use lexer::Token;
pub use parser::{
    parse_sql, ParsedSchema, QualifiedName, RawColumn, RawForeignKey, RawIndex, RawTable,
    RawUniqueKey, SqlParseError,
};
pub use types::ColumnType;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("no SQL to import")]
    Empty,
    #[error("no CREATE TABLE or CREATE VIEW statements found")]
    NoTables,
    #[error("invalid SQL: {0}")]
    Parse(#[from] SqlParseError),
}

/// Boundary between SQL text and the diagram model.
pub trait SchemaImporter {
    fn import_sql(
        &self,
        sql: &str,
        source: Dialect,
        target: DatabaseType,
    ) -> Result<Diagram, ImportError>;
}

/// Importer for CREATE / ALTER TABLE scripts and schema dumps.
#[derive(Debug, Clone)]
pub struct DdlImporter {
    diagram_name: String,
}

impl Default for DdlImporter {
    fn default() -> Self {
        Self {
            diagram_name: "Diagram".to_string(),
        }
    }
}

impl DdlImporter {
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            diagram_name: name.into(),
        }
    }
}

impl SchemaImporter for DdlImporter {
    fn import_sql(
        &self,
        sql: &str,
        source: Dialect,
        target: DatabaseType,
    ) -> Result<Diagram, ImportError> {
        if sql.trim().is_empty() {
            return Err(ImportError::Empty);
        }

        let source = source.resolve(sql);
        let parsed = parse_sql(sql, source)?;
        if parsed.tables.is_empty() {
            return Err(ImportError::NoTables);
        }

        tracing::debug!(
            dialect = ?source,
            tables = parsed.tables.len(),
            foreign_keys = parsed.foreign_keys.len(),
            indexes = parsed.indexes.len(),
            "parsed schema"
        );

        Ok(build_diagram(parsed, &self.diagram_name, target))
    }
}

/// Import `sql` and position its tables.
pub fn import_and_layout(
    importer: &impl SchemaImporter,
    engine: &LayoutEngine,
    sql: &str,
    source: Dialect,
    target: DatabaseType,
) -> Result<Diagram, ImportError> {
    let diagram = importer.import_sql(sql, source, target)?;
    Ok(diagram.laid_out(engine))
}
