pub mod config;
pub mod layout;
pub mod measure;
pub mod model;
pub mod sql;
pub mod svg;

use wasm_bindgen::prelude::*;

pub use config::{Config, ConfigError, load_config};
pub use layout::{LayoutEngine, LayoutOptions, LayoutOutcome};
pub use measure::TableMetrics;
pub use model::{Cardinality, DatabaseType, Diagram, Field, Index, Relationship, Table};
pub use sql::{DdlImporter, Dialect, ImportError, SchemaImporter, import_and_layout};
pub use svg::SvgRenderer;

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

#[derive(serde::Deserialize)]
struct LayoutRequest {
    tables: Vec<Table>,
    #[serde(default)]
    relationships: Vec<Relationship>,
}

/// Lay out `{ "tables": [...], "relationships": [...] }` and return the
/// positioned tables as a JSON array.
#[wasm_bindgen(js_name = "layoutTables")]
pub fn layout_tables(json: &str) -> Result<String, String> {
    let request: LayoutRequest = serde_json::from_str(json).map_err(|e| e.to_string())?;
    let tables = LayoutEngine::default().layout(&request.tables, &request.relationships);
    serde_json::to_string(&tables).map_err(|e| e.to_string())
}

/// Import a DDL script and return the laid-out diagram as JSON.
#[wasm_bindgen(js_name = "importSql")]
pub fn import_sql(
    sql: &str,
    source: Option<String>,
    target: Option<String>,
) -> Result<String, String> {
    let source = match source.as_deref() {
        Some(name) => Dialect::from_str(name).ok_or_else(|| format!("unknown dialect: {name}"))?,
        None => Dialect::Auto,
    };
    let target = match target.as_deref() {
        Some(name) => {
            DatabaseType::from_str(name).ok_or_else(|| format!("unknown database type: {name}"))?
        }
        None => source.resolve(sql).database_type(),
    };

    let diagram = import_and_layout(
        &DdlImporter::default(),
        &LayoutEngine::default(),
        sql,
        source,
        target,
    )
    .map_err(|e| e.to_string())?;
    serde_json::to_string(&diagram).map_err(|e| e.to_string())
}
