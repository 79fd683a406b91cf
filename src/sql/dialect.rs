//! SQL dialect detection and handling.

use crate::model::DatabaseType;

/// SQL dialect variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// Auto-detect from dump content
    #[default]
    Auto,
    Generic,
    PostgreSQL,
    MySQL,
    SQLite,
}

impl Dialect {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "generic" => Some(Self::Generic),
            "postgres" | "postgresql" => Some(Self::PostgreSQL),
            "mysql" | "mariadb" => Some(Self::MySQL),
            "sqlite" => Some(Self::SQLite),
            _ => None,
        }
    }

    /// Detect dialect from SQL content.
    pub fn detect(content: &str) -> Self {
        let lower = content.to_lowercase();

        // Dump headers
        if lower.contains("postgresql database dump")
            || lower.contains("pg_dump")
            || lower.contains("-- postgres")
        {
            return Self::PostgreSQL;
        }
        if lower.contains("mysql dump") || lower.contains("mysqldump") || lower.contains("-- mysql")
        {
            return Self::MySQL;
        }
        if lower.contains("pragma ") || lower.contains("sqlite_") {
            return Self::SQLite;
        }

        // Type and option keywords
        if lower.contains("serial")
            || lower.contains("text[]")
            || lower.contains("::text")
            || lower.contains("timestamptz")
            || lower.contains("jsonb")
        {
            return Self::PostgreSQL;
        }
        if lower.contains("auto_increment")
            || lower.contains("tinyint")
            || lower.contains("engine=")
            || lower.contains("unsigned")
        {
            return Self::MySQL;
        }
        if lower.contains("autoincrement") || lower.contains("without rowid") {
            return Self::SQLite;
        }

        Self::Generic
    }

    /// Resolve Auto to a concrete dialect.
    pub fn resolve(self, content: &str) -> Self {
        match self {
            Self::Auto => Self::detect(content),
            other => other,
        }
    }

    pub fn database_type(self) -> DatabaseType {
        match self {
            Self::Auto | Self::Generic => DatabaseType::Generic,
            Self::PostgreSQL => DatabaseType::Postgresql,
            Self::MySQL => DatabaseType::Mysql,
            Self::SQLite => DatabaseType::Sqlite,
        }
    }
}

impl From<DatabaseType> for Dialect {
    fn from(value: DatabaseType) -> Self {
        match value {
            DatabaseType::Generic => Self::Generic,
            DatabaseType::Postgresql => Self::PostgreSQL,
            DatabaseType::Mysql => Self::MySQL,
            DatabaseType::Sqlite => Self::SQLite,
        }
    }
}
