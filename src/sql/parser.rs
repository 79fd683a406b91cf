//! SQL parser for CREATE TABLE / CREATE INDEX / CREATE VIEW / ALTER TABLE statements.

use thiserror::Error;

use super::dialect::Dialect;
use super::lexer::{Lexer, Spanned, Token};
use super::types::{ColumnType, RawType, resolve_type};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SqlParseError {
    #[error("line {line}: expected {expected}, found {found:?}")]
    Expected {
        expected: &'static str,
        found: Token,
        line: usize,
    },
    #[error("line {line}: unexpected end of input")]
    UnexpectedEof { line: usize },
}

/// Possibly schema-qualified object name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QualifiedName {
    pub schema: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawColumn {
    pub name: String,
    pub column_type: ColumnType,
    pub primary_key: bool,
    pub not_null: bool,
    pub unique: bool,
    pub increment: bool,
    pub default: Option<String>,
    pub collation: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawUniqueKey {
    pub name: Option<String>,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTable {
    pub name: QualifiedName,
    pub columns: Vec<RawColumn>,
    pub primary_key: Vec<String>,
    pub unique_keys: Vec<RawUniqueKey>,
    pub is_view: bool,
    pub is_materialized: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawForeignKey {
    pub name: Option<String>,
    pub table: QualifiedName,
    pub columns: Vec<String>,
    pub target: QualifiedName,
    /// Empty when the reference names only the table (its primary key).
    pub target_columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawIndex {
    pub name: Option<String>,
    pub table: QualifiedName,
    pub unique: bool,
    pub method: Option<String>,
    pub columns: Vec<String>,
}

/// Schema objects collected from a DDL script, before ids are assigned.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedSchema {
    pub tables: Vec<RawTable>,
    pub foreign_keys: Vec<RawForeignKey>,
    pub indexes: Vec<RawIndex>,
}

enum TableConstraint {
    PrimaryKey(Vec<String>),
    Unique(RawUniqueKey),
    ForeignKey(RawForeignKey),
    Index(RawIndex),
}

/// Words that may follow a type's argument list, as in `timestamp(3) with time zone`.
const TYPE_SUFFIX_WORDS: &[&str] = &["VARYING", "PRECISION", "WITH", "WITHOUT", "TIME", "ZONE"];

/// Words that end a type name and start a column option.
const TYPE_STOP_WORDS: &[&str] = &[
    "COLLATE", "GENERATED", "COMMENT", "CHARSET", "CHARACTER", "AS", "UNSIGNED", "SIGNED",
    "ZEROFILL", "IDENTITY",
];

/// Parse a DDL script.
pub fn parse_sql(input: &str, dialect: Dialect) -> Result<ParsedSchema, SqlParseError> {
    let dialect = dialect.resolve(input);
    let tokens = Lexer::new(input).tokenize();
    Parser::new(tokens, dialect).parse()
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    dialect: Dialect,
    schema: ParsedSchema,
}

impl Parser {
    fn new(tokens: Vec<Spanned>, dialect: Dialect) -> Self {
        Self {
            tokens,
            pos: 0,
            dialect,
            schema: ParsedSchema::default(),
        }
    }

    fn current(&self) -> &Token {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> &Token {
        self.tokens
            .get(self.pos + offset)
            .map_or(&Token::Eof, |s| &s.token)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(1, |s| s.line)
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.current() == token {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_word(&mut self, word: &str) -> bool {
        if self.current().is_word(word) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn error(&self, expected: &'static str) -> SqlParseError {
        match self.current() {
            Token::Eof => SqlParseError::UnexpectedEof { line: self.line() },
            found => SqlParseError::Expected {
                expected,
                found: found.clone(),
                line: self.line(),
            },
        }
    }

    fn expect(&mut self, token: Token, expected: &'static str) -> Result<(), SqlParseError> {
        if self.eat(&token) {
            Ok(())
        } else {
            Err(self.error(expected))
        }
    }

    fn expect_ident(&mut self, expected: &'static str) -> Result<String, SqlParseError> {
        match self.current() {
            Token::Ident(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.error(expected)),
        }
    }

    fn parse(mut self) -> Result<ParsedSchema, SqlParseError> {
        while self.current() != &Token::Eof {
            match self.current() {
                Token::Create => self.parse_create()?,
                Token::Alter => self.parse_alter_table()?,
                _ => self.skip_statement(),
            }
        }
        Ok(self.schema)
    }

    fn parse_qualified_name(&mut self, expected: &'static str) -> Result<QualifiedName, SqlParseError> {
        let mut name = QualifiedName {
            schema: None,
            name: self.expect_ident(expected)?,
        };
        while self.eat(&Token::Dot) {
            let next = self.expect_ident(expected)?;
            name.schema = Some(std::mem::replace(&mut name.name, next));
        }
        Ok(name)
    }

    fn skip_if_not_exists(&mut self) {
        if self.eat(&Token::If) {
            self.eat(&Token::Not);
            self.eat(&Token::Exists);
        }
    }

    fn parse_create(&mut self) -> Result<(), SqlParseError> {
        self.advance(); // CREATE

        let mut unique = false;
        let mut materialized = false;
        loop {
            match self.current() {
                Token::Unique => unique = true,
                Token::Materialized => materialized = true,
                t if ["OR", "REPLACE", "TEMP", "TEMPORARY", "UNLOGGED", "GLOBAL", "LOCAL"]
                    .iter()
                    .any(|w| t.is_word(w)) => {}
                _ => break,
            }
            self.advance();
        }

        match self.current() {
            Token::Table => {
                self.advance();
                self.skip_if_not_exists();
                self.parse_create_table()
            }
            Token::View => {
                self.advance();
                self.skip_if_not_exists();
                let name = self.parse_qualified_name("view name")?;
                self.skip_statement();
                self.schema.tables.push(RawTable {
                    name,
                    is_view: true,
                    is_materialized: materialized,
                    ..RawTable::default()
                });
                Ok(())
            }
            Token::Index => {
                self.advance();
                self.parse_create_index(unique)
            }
            // Sequences, types, functions, ...
            _ => {
                self.skip_statement();
                Ok(())
            }
        }
    }

    fn parse_create_table(&mut self) -> Result<(), SqlParseError> {
        let mut table = RawTable {
            name: self.parse_qualified_name("table name")?,
            ..RawTable::default()
        };

        if !self.eat(&Token::LParen) {
            // CREATE TABLE ... AS SELECT, LIKE, PARTITION OF
            self.skip_statement();
            self.schema.tables.push(table);
            return Ok(());
        }

        let mut constraint_name: Option<String> = None;
        loop {
            match self.current() {
                Token::RParen => {
                    self.advance();
                    break;
                }
                Token::Eof => return Err(self.error(")")),
                Token::Comma => self.advance(),
                Token::Constraint => {
                    self.advance();
                    constraint_name = self.expect_ident("constraint name").ok();
                    continue;
                }
                Token::Primary | Token::Foreign | Token::Unique => {
                    let constraint = self.parse_table_constraint(&table.name, constraint_name.take())?;
                    apply_constraint(&mut table, &mut self.schema, constraint);
                    self.skip_until(&[Token::Comma, Token::RParen]);
                }
                Token::Index | Token::Key if self.starts_inline_index() => {
                    let constraint = self.parse_table_constraint(&table.name, constraint_name.take())?;
                    apply_constraint(&mut table, &mut self.schema, constraint);
                    self.skip_until(&[Token::Comma, Token::RParen]);
                }
                Token::Check => {
                    self.advance();
                    self.skip_parenthesized();
                }
                t if t.is_word("FULLTEXT") || t.is_word("SPATIAL") || t.is_word("EXCLUDE") => {
                    self.skip_until(&[Token::Comma, Token::RParen]);
                }
                Token::Ident(name) => {
                    let name = name.clone();
                    self.advance();
                    let column = self.parse_column(name, &table.name)?;
                    table.columns.push(column);
                }
                // Unquoted keyword used as a column name
                Token::Key | Token::Index => {
                    let name = format!("{:?}", self.current()).to_lowercase();
                    self.advance();
                    let column = self.parse_column(name, &table.name)?;
                    table.columns.push(column);
                }
                _ => self.advance(),
            }
            constraint_name = None;
        }

        // Table options (ENGINE=, WITHOUT ROWID, ...)
        self.skip_statement();
        self.schema.tables.push(table);
        Ok(())
    }

    /// `KEY name (cols)` / `INDEX (cols)` rather than a column called `key`.
    fn starts_inline_index(&self) -> bool {
        matches!(self.peek_at(1), Token::LParen | Token::Using)
            || (matches!(self.peek_at(1), Token::Ident(_))
                && matches!(self.peek_at(2), Token::LParen | Token::Using))
    }

    fn parse_table_constraint(
        &mut self,
        table: &QualifiedName,
        name: Option<String>,
    ) -> Result<TableConstraint, SqlParseError> {
        match self.current() {
            Token::Primary => {
                self.advance();
                self.expect(Token::Key, "KEY")?;
                Ok(TableConstraint::PrimaryKey(self.parse_column_list()?))
            }
            Token::Foreign => Ok(TableConstraint::ForeignKey(
                self.parse_foreign_key(table, name)?,
            )),
            Token::Unique => {
                self.advance();
                if !self.eat(&Token::Key) {
                    self.eat(&Token::Index);
                }
                let name = match self.current() {
                    Token::Ident(n) => {
                        let n = n.clone();
                        self.advance();
                        Some(n)
                    }
                    _ => name,
                };
                Ok(TableConstraint::Unique(RawUniqueKey {
                    name,
                    columns: self.parse_column_list()?,
                }))
            }
            _ => {
                // INDEX / KEY [name] [USING method] (cols)
                self.advance();
                let name = match self.current() {
                    Token::Ident(n) => {
                        let n = n.clone();
                        self.advance();
                        Some(n)
                    }
                    _ => name,
                };
                let method = self.parse_index_method();
                Ok(TableConstraint::Index(RawIndex {
                    name,
                    table: table.clone(),
                    unique: false,
                    method,
                    columns: self.parse_column_list()?,
                }))
            }
        }
    }

    fn parse_index_method(&mut self) -> Option<String> {
        if self.eat(&Token::Using) {
            self.expect_ident("index method").ok()
        } else {
            None
        }
    }

    fn parse_column(&mut self, name: String, table: &QualifiedName) -> Result<RawColumn, SqlParseError> {
        let raw_type = self.parse_type()?;
        let column_type = resolve_type(&raw_type, self.dialect);

        let mut column = RawColumn {
            name,
            primary_key: false,
            not_null: false,
            unique: false,
            increment: column_type.implies_increment,
            default: None,
            collation: None,
            comment: None,
            column_type,
        };
        let mut constraint_name = None;

        loop {
            match self.current() {
                Token::Comma | Token::RParen | Token::Eof => break,
                Token::Primary => {
                    self.advance();
                    self.eat(&Token::Key);
                    column.primary_key = true;
                }
                Token::Not => {
                    self.advance();
                    if self.eat(&Token::Null) {
                        column.not_null = true;
                    }
                }
                Token::Unique => {
                    self.advance();
                    self.eat(&Token::Key);
                    column.unique = true;
                }
                Token::Default => {
                    self.advance();
                    let value = self.parse_default_value()?;
                    if value.to_lowercase().starts_with("nextval(") {
                        column.increment = true;
                    }
                    column.default = Some(value);
                }
                Token::References => {
                    self.advance();
                    let (target, target_columns) = self.parse_reference()?;
                    self.schema.foreign_keys.push(RawForeignKey {
                        name: constraint_name.take(),
                        table: table.clone(),
                        columns: vec![column.name.clone()],
                        target,
                        target_columns,
                    });
                    self.skip_on_actions();
                }
                Token::Increment => {
                    self.advance();
                    column.increment = true;
                }
                Token::Auto => {
                    self.advance();
                    if self.eat(&Token::Increment) {
                        column.increment = true;
                    }
                }
                Token::Check => {
                    self.advance();
                    self.skip_parenthesized();
                }
                Token::Constraint => {
                    self.advance();
                    constraint_name = self.expect_ident("constraint name").ok();
                }
                Token::On => self.skip_on_actions(),
                t if t.is_word("GENERATED") => {
                    self.advance();
                    // ALWAYS | BY DEFAULT AS IDENTITY [(...)] | AS (expr) STORED
                    loop {
                        match self.current() {
                            Token::LParen => self.skip_parenthesized(),
                            Token::Default => self.advance(),
                            t @ Token::Ident(_) => {
                                if t.is_word("IDENTITY") {
                                    column.increment = true;
                                }
                                self.advance();
                            }
                            _ => break,
                        }
                    }
                }
                // SQL Server IDENTITY(1,1)
                t if t.is_word("IDENTITY") => {
                    self.advance();
                    self.skip_parenthesized();
                    column.increment = true;
                }
                Token::LParen => self.skip_parenthesized(),
                t if t.is_word("COLLATE") => {
                    self.advance();
                    if let Token::Ident(c) | Token::Str(c) = self.current() {
                        column.collation = Some(c.clone());
                        self.advance();
                    }
                }
                t if t.is_word("COMMENT") => {
                    self.advance();
                    if let Token::Str(c) = self.current() {
                        column.comment = Some(c.clone());
                        self.advance();
                    }
                }
                _ => self.advance(),
            }
        }

        Ok(column)
    }

    fn parse_type(&mut self) -> Result<RawType, SqlParseError> {
        let mut raw = RawType::default();

        while let Token::Ident(word) = self.current() {
            let upper = word.to_uppercase();
            if upper == "ARRAY" {
                raw.is_array = true;
                self.advance();
                continue;
            }
            if !raw.words.is_empty() && TYPE_STOP_WORDS.contains(&upper.as_str()) {
                break;
            }
            if !raw.args.is_empty() && !TYPE_SUFFIX_WORDS.contains(&upper.as_str()) {
                break;
            }
            raw.words.push(word.clone());
            self.advance();

            if raw.args.is_empty() && self.current() == &Token::LParen {
                raw.args = self.parse_type_args()?;
            }
        }

        while self.eat(&Token::Brackets) {
            raw.is_array = true;
        }

        Ok(raw)
    }

    fn parse_type_args(&mut self) -> Result<Vec<String>, SqlParseError> {
        self.advance(); // (
        let mut args = Vec::new();
        loop {
            match self.current() {
                Token::RParen => {
                    self.advance();
                    break;
                }
                Token::Eof => return Err(self.error(")")),
                Token::Num(v) | Token::Ident(v) | Token::Str(v) => {
                    args.push(v.clone());
                    self.advance();
                }
                Token::LParen => self.skip_parenthesized(),
                _ => self.advance(),
            }
        }
        Ok(args)
    }

    fn parse_default_value(&mut self) -> Result<String, SqlParseError> {
        let value = match self.current() {
            Token::Str(s) => format!("'{s}'"),
            Token::Num(n) => n.clone(),
            Token::Null => "NULL".to_string(),
            Token::Ident(s) => {
                let mut value = s.clone();
                self.advance();
                // Function calls like NOW() or nextval('seq')
                if self.current() == &Token::LParen {
                    self.advance();
                    value.push('(');
                    value.push_str(&self.collect_until_paren()?);
                    value.push(')');
                }
                return Ok(value);
            }
            Token::LParen => {
                self.advance();
                return Ok(format!("({})", self.collect_until_paren()?));
            }
            _ => return Ok(String::new()),
        };
        self.advance();
        Ok(value)
    }

    /// Text of the tokens up to the matching `)`, which is consumed.
    fn collect_until_paren(&mut self) -> Result<String, SqlParseError> {
        let mut parts = Vec::new();
        let mut depth = 1;

        loop {
            let part = match self.current() {
                Token::LParen => {
                    depth += 1;
                    "(".to_string()
                }
                Token::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        self.advance();
                        break;
                    }
                    ")".to_string()
                }
                Token::Ident(s) | Token::Num(s) => s.clone(),
                Token::Str(s) => format!("'{s}'"),
                Token::Comma => ",".to_string(),
                Token::Eof => return Err(self.error(")")),
                other => format!("{other:?}").to_uppercase(),
            };
            parts.push(part);
            self.advance();
        }

        Ok(parts.join(" "))
    }

    fn parse_reference(&mut self) -> Result<(QualifiedName, Vec<String>), SqlParseError> {
        let target = self.parse_qualified_name("referenced table name")?;
        let columns = if self.current() == &Token::LParen {
            self.parse_column_list()?
        } else {
            Vec::new()
        };
        Ok((target, columns))
    }

    fn parse_foreign_key(
        &mut self,
        table: &QualifiedName,
        name: Option<String>,
    ) -> Result<RawForeignKey, SqlParseError> {
        self.advance(); // FOREIGN
        self.expect(Token::Key, "KEY")?;

        // MySQL allows an index name here
        let name = match self.current() {
            Token::Ident(n) => {
                let n = n.clone();
                self.advance();
                Some(n)
            }
            _ => name,
        };

        let columns = self.parse_column_list()?;
        self.expect(Token::References, "REFERENCES")?;
        let (target, target_columns) = self.parse_reference()?;
        self.skip_on_actions();

        Ok(RawForeignKey {
            name,
            table: table.clone(),
            columns,
            target,
            target_columns,
        })
    }

    /// `(a, b DESC, lower(c))`: the leading identifier of each item.
    fn parse_column_list(&mut self) -> Result<Vec<String>, SqlParseError> {
        self.expect(Token::LParen, "(")?;

        let mut columns = Vec::new();
        let mut item_started = false;
        loop {
            match self.current() {
                Token::RParen => {
                    self.advance();
                    break;
                }
                Token::Eof => return Err(self.error(")")),
                Token::Comma => {
                    item_started = false;
                    self.advance();
                }
                Token::LParen => {
                    item_started = true;
                    self.skip_parenthesized();
                }
                Token::Ident(name) if !item_started => {
                    columns.push(name.clone());
                    item_started = true;
                    self.advance();
                }
                _ => {
                    item_started = true;
                    self.advance();
                }
            }
        }

        Ok(columns)
    }

    fn parse_create_index(&mut self, unique: bool) -> Result<(), SqlParseError> {
        self.eat_word("CONCURRENTLY");
        self.skip_if_not_exists();

        let name = match self.current() {
            Token::On | Token::Using => None,
            _ => Some(self.parse_qualified_name("index name")?.name),
        };
        let mut method = self.parse_index_method();

        self.expect(Token::On, "ON")?;
        self.eat(&Token::Only);
        let table = self.parse_qualified_name("table name")?;
        if method.is_none() {
            method = self.parse_index_method();
        }
        let columns = self.parse_column_list()?;

        // WHERE, INCLUDE, WITH (...)
        self.skip_statement();
        self.schema.indexes.push(RawIndex {
            name,
            table,
            unique,
            method,
            columns,
        });
        Ok(())
    }

    /// ALTER TABLE ... ADD [COLUMN | CONSTRAINT ...], ...
    fn parse_alter_table(&mut self) -> Result<(), SqlParseError> {
        self.advance(); // ALTER

        if !self.eat(&Token::Table) {
            self.skip_statement();
            return Ok(());
        }
        if self.eat(&Token::If) {
            self.eat(&Token::Exists);
        }
        self.eat(&Token::Only);
        let name = self.parse_qualified_name("table name")?;

        loop {
            match self.current() {
                Token::Semicolon => {
                    self.advance();
                    break;
                }
                Token::Eof => break,
                Token::Comma => self.advance(),
                Token::Add => {
                    self.advance();
                    self.parse_alter_add(&name)?;
                }
                _ => self.skip_until(&[Token::Comma, Token::Semicolon]),
            }
        }
        Ok(())
    }

    fn parse_alter_add(&mut self, table_name: &QualifiedName) -> Result<(), SqlParseError> {
        let mut constraint_name = None;
        if self.eat(&Token::Constraint) {
            constraint_name = Some(self.expect_ident("constraint name")?);
        }

        match self.current() {
            Token::Primary | Token::Foreign | Token::Unique => {
                let constraint = self.parse_table_constraint(table_name, constraint_name)?;
                match self.find_table(table_name) {
                    Some(index) => {
                        let mut table = std::mem::take(&mut self.schema.tables[index]);
                        apply_constraint(&mut table, &mut self.schema, constraint);
                        self.schema.tables[index] = table;
                    }
                    None => {
                        // Keep foreign keys even when the table is unknown; they are
                        // dropped later with the other dangling references.
                        if let TableConstraint::ForeignKey(fk) = constraint {
                            self.schema.foreign_keys.push(fk);
                        }
                    }
                }
            }
            _ => {
                self.eat_word("COLUMN");
                self.skip_if_not_exists();
                if let Token::Ident(name) = self.current() {
                    let name = name.clone();
                    self.advance();
                    let column = self.parse_column(name, table_name)?;
                    if let Some(index) = self.find_table(table_name) {
                        self.schema.tables[index].columns.push(column);
                    }
                }
            }
        }

        self.skip_until(&[Token::Comma, Token::Semicolon]);
        Ok(())
    }

    fn find_table(&self, name: &QualifiedName) -> Option<usize> {
        self.schema.tables.iter().position(|t| {
            t.name.name.eq_ignore_ascii_case(&name.name)
                && match (&t.name.schema, &name.schema) {
                    (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
                    _ => true,
                }
        })
    }

    fn skip_on_actions(&mut self) {
        while self.eat(&Token::On) {
            // DELETE or UPDATE
            if matches!(self.current(), Token::Delete | Token::Update) {
                self.advance();
            }
            // CASCADE, RESTRICT, SET NULL, SET DEFAULT, NO ACTION
            match self.current() {
                Token::Cascade | Token::Restrict => self.advance(),
                t if t.is_word("SET") => {
                    self.advance();
                    if matches!(self.current(), Token::Null | Token::Default) {
                        self.advance();
                    }
                }
                t if t.is_word("NO") => {
                    self.advance();
                    self.eat_word("ACTION");
                }
                _ => {}
            }
        }
    }

    fn skip_parenthesized(&mut self) {
        if !self.eat(&Token::LParen) {
            return;
        }
        let mut depth = 1;
        while depth > 0 {
            match self.current() {
                Token::LParen => depth += 1,
                Token::RParen => depth -= 1,
                Token::Eof => break,
                _ => {}
            }
            self.advance();
        }
    }

    fn skip_statement(&mut self) {
        while !matches!(self.current(), Token::Semicolon | Token::Eof) {
            self.advance();
        }
        self.eat(&Token::Semicolon);
    }

    /// Skip to one of `tokens` at the current nesting level, without consuming it.
    fn skip_until(&mut self, tokens: &[Token]) {
        while !tokens.contains(self.current()) && self.current() != &Token::Eof {
            if self.current() == &Token::LParen {
                self.skip_parenthesized();
            } else {
                self.advance();
            }
        }
    }
}

fn apply_constraint(table: &mut RawTable, schema: &mut ParsedSchema, constraint: TableConstraint) {
    match constraint {
        TableConstraint::PrimaryKey(columns) => table.primary_key = columns,
        TableConstraint::Unique(key) => table.unique_keys.push(key),
        TableConstraint::ForeignKey(fk) => schema.foreign_keys.push(fk),
        TableConstraint::Index(index) => schema.indexes.push(index),
    }
}
