//! Diagram domain model shared by the importer, the layout engine and renderers.

use serde::{Deserialize, Serialize};

pub const MIN_TABLE_SIZE: f64 = 224.0;
pub const MID_TABLE_SIZE: f64 = 337.0;
pub const MAX_TABLE_SIZE: f64 = 450.0;
pub const TABLE_MINIMIZED_FIELDS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataType {
    pub id: String,
    pub name: String,
}

impl DataType {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: name.replace(' ', "_"),
            name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: DataType,
    pub primary_key: bool,
    pub unique: bool,
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub increment: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_array: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_maximum_length: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    pub created_at: i64,
}

impl Field {
    pub fn new(id: impl Into<String>, name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            data_type,
            primary_key: false,
            unique: false,
            nullable: true,
            increment: None,
            is_array: None,
            character_maximum_length: None,
            precision: None,
            scale: None,
            default: None,
            collation: None,
            comments: None,
            created_at: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexType {
    Btree,
    Hash,
    Gist,
    Gin,
    Spgist,
    Brin,
}

impl IndexType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "btree" => Some(Self::Btree),
            "hash" => Some(Self::Hash),
            "gist" => Some(Self::Gist),
            "gin" => Some(Self::Gin),
            "spgist" => Some(Self::Spgist),
            "brin" => Some(Self::Brin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Index {
    pub id: String,
    pub name: String,
    pub unique: bool,
    pub field_ids: Vec<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub index_type: Option<IndexType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_primary_key: Option<bool>,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    pub x: f64,
    pub y: f64,
    pub fields: Vec<Field>,
    pub indexes: Vec<Index>,
    pub color: String,
    pub is_view: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_materialized_view: Option<bool>,
    /// Explicit rendered width; the layout falls back to [`MIN_TABLE_SIZE`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expanded: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_area_id: Option<String>,
    pub created_at: i64,
}

impl Table {
    /// Bare table at the origin, as the importer creates it before layout.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            schema: None,
            x: 0.0,
            y: 0.0,
            fields: Vec::new(),
            indexes: Vec::new(),
            color: DEFAULT_TABLE_COLOR.to_string(),
            is_view: false,
            is_materialized_view: None,
            width: None,
            comments: None,
            order: None,
            expanded: None,
            parent_area_id: None,
            created_at: 0,
        }
    }

    pub fn field(&self, id: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == id)
    }

    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded.unwrap_or(false)
    }
}

pub const DEFAULT_TABLE_COLOR: &str = "#8eb7ff";

pub const TABLE_COLORS: &[&str] = &[
    "#8eb7ff", "#ff6363", "#ffe374", "#ff9f74", "#7175fa", "#4dee8a", "#9ef07a", "#c05dcf",
    "#b067e9", "#ff6b8a", "#42e0c0", "#ffa07a",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    One,
    Many,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_schema: Option<String>,
    pub source_table_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_schema: Option<String>,
    pub target_table_id: String,
    pub source_field_id: String,
    pub target_field_id: String,
    pub source_cardinality: Cardinality,
    pub target_cardinality: Cardinality,
    pub created_at: i64,
}

impl Relationship {
    pub fn is_self_reference(&self) -> bool {
        self.source_table_id == self.target_table_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    #[default]
    Generic,
    Postgresql,
    Mysql,
    Sqlite,
}

impl DatabaseType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "generic" => Some(Self::Generic),
            "postgres" | "postgresql" => Some(Self::Postgresql),
            "mysql" => Some(Self::Mysql),
            "sqlite" => Some(Self::Sqlite),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagram {
    pub id: String,
    pub name: String,
    pub database_type: DatabaseType,
    pub created_at: i64,
    pub updated_at: i64,
    pub tables: Vec<Table>,
    pub relationships: Vec<Relationship>,
}

impl Diagram {
    pub fn table(&self, id: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.id == id)
    }

    /// Copy of this diagram with engine-assigned table positions.
    pub fn laid_out(&self, engine: &crate::layout::LayoutEngine) -> Diagram {
        Diagram {
            tables: engine.layout(&self.tables, &self.relationships),
            ..self.clone()
        }
    }
}
