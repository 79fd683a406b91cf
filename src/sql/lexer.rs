//! SQL lexer for DDL statements.

use std::iter::Peekable;
use std::str::Chars;

/// SQL token types.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Keywords
    Create,
    Alter,
    Add,
    Table,
    View,
    Materialized,
    Only,
    Primary,
    Key,
    Foreign,
    References,
    Not,
    Null,
    Unique,
    Default,
    On,
    Using,
    Delete,
    Update,
    Cascade,
    Restrict,
    Constraint,
    Index,
    If,
    Exists,
    Auto,
    Increment,
    Check,

    // Identifiers and literals
    Ident(String),
    Str(String),
    Num(String),

    // Symbols
    LParen,
    RParen,
    Comma,
    Semicolon,
    Dot,
    /// `[]` array suffix on a type
    Brackets,

    Eof,
}

impl Token {
    /// Case-insensitive match against a word that is lexed as an identifier.
    pub fn is_word(&self, word: &str) -> bool {
        matches!(self, Token::Ident(s) if s.eq_ignore_ascii_case(word))
    }
}

/// A token and the 1-based line it starts on.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub line: usize,
}

pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    current_char: Option<char>,
    line: usize,
    token_line: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        let mut chars = input.chars().peekable();
        let current_char = chars.next();
        Self {
            chars,
            current_char,
            line: 1,
            token_line: 1,
        }
    }

    fn advance(&mut self) {
        if self.current_char == Some('\n') {
            self.line += 1;
        }
        self.current_char = self.chars.next();
    }

    fn peek(&mut self) -> Option<&char> {
        self.chars.peek()
    }

    fn skip_whitespace(&mut self) {
        while self.current_char.is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.current_char {
            self.advance();
            if c == '\n' {
                break;
            }
        }
    }

    fn skip_block_comment(&mut self) {
        // current is '/', next is '*'
        self.advance();
        self.advance();
        while let Some(c) = self.current_char {
            self.advance();
            if c == '*' && self.current_char == Some('/') {
                self.advance();
                break;
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut ident = String::new();
        while let Some(c) = self.current_char {
            if c.is_alphanumeric() || c == '_' || c == '$' {
                ident.push(c);
                self.advance();
            } else {
                break;
            }
        }
        ident
    }

    /// Quoted text up to `close`; a doubled closing character is an escape.
    fn read_quoted(&mut self, close: char, backslash_escapes: bool) -> String {
        self.advance();
        let mut text = String::new();
        while let Some(c) = self.current_char {
            if c == close {
                if self.peek() == Some(&close) {
                    text.push(c);
                    self.advance();
                    self.advance();
                } else {
                    self.advance();
                    break;
                }
            } else if backslash_escapes && c == '\\' {
                self.advance();
                if let Some(escaped) = self.current_char {
                    text.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        other => other,
                    });
                    self.advance();
                }
            } else {
                text.push(c);
                self.advance();
            }
        }
        text
    }

    fn read_number(&mut self) -> String {
        let mut num = String::new();
        let mut has_dot = false;

        if self.current_char == Some('-') {
            num.push('-');
            self.advance();
        }

        while let Some(c) = self.current_char {
            if c.is_ascii_digit() {
                num.push(c);
            } else if c == '.' && !has_dot {
                has_dot = true;
                num.push(c);
            } else {
                break;
            }
            self.advance();
        }
        num
    }

    fn keyword_or_ident(s: String) -> Token {
        match s.to_uppercase().as_str() {
            "CREATE" => Token::Create,
            "ALTER" => Token::Alter,
            "ADD" => Token::Add,
            "TABLE" => Token::Table,
            "VIEW" => Token::View,
            "MATERIALIZED" => Token::Materialized,
            "ONLY" => Token::Only,
            "PRIMARY" => Token::Primary,
            "KEY" => Token::Key,
            "FOREIGN" => Token::Foreign,
            "REFERENCES" => Token::References,
            "NOT" => Token::Not,
            "NULL" => Token::Null,
            "UNIQUE" => Token::Unique,
            "DEFAULT" => Token::Default,
            "ON" => Token::On,
            "USING" => Token::Using,
            "DELETE" => Token::Delete,
            "UPDATE" => Token::Update,
            "CASCADE" => Token::Cascade,
            "RESTRICT" => Token::Restrict,
            "CONSTRAINT" => Token::Constraint,
            "INDEX" => Token::Index,
            "IF" => Token::If,
            "EXISTS" => Token::Exists,
            "AUTO" => Token::Auto,
            "AUTO_INCREMENT" | "AUTOINCREMENT" | "INCREMENT" => Token::Increment,
            "CHECK" => Token::Check,
            _ => Token::Ident(s),
        }
    }

    pub fn next_token(&mut self) -> Token {
        loop {
            self.skip_whitespace();
            self.token_line = self.line;

            let current = self.current_char;
            match current {
                None => return Token::Eof,

                Some('-') => {
                    if self.peek() == Some(&'-') {
                        self.skip_line_comment();
                        continue;
                    }
                    if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                        return Token::Num(self.read_number());
                    }
                    self.advance();
                }

                Some('/') if self.peek() == Some(&'*') => self.skip_block_comment(),
                Some('#') => self.skip_line_comment(),

                Some('(') => {
                    self.advance();
                    return Token::LParen;
                }
                Some(')') => {
                    self.advance();
                    return Token::RParen;
                }
                Some(',') => {
                    self.advance();
                    return Token::Comma;
                }
                Some(';') => {
                    self.advance();
                    return Token::Semicolon;
                }
                Some('.') => {
                    self.advance();
                    return Token::Dot;
                }

                Some('[') => {
                    if self.peek() == Some(&']') {
                        self.advance();
                        self.advance();
                        return Token::Brackets;
                    }
                    // SQL Server style [identifier]
                    return Token::Ident(self.read_quoted(']', false));
                }
                Some('"') => return Token::Ident(self.read_quoted('"', false)),
                Some('`') => return Token::Ident(self.read_quoted('`', false)),
                Some('\'') => return Token::Str(self.read_quoted('\'', true)),

                Some(c) if c.is_ascii_digit() => return Token::Num(self.read_number()),

                Some(c) if c.is_alphabetic() || c == '_' => {
                    return Self::keyword_or_ident(self.read_identifier());
                }

                // Casts, operators and other punctuation carry no schema information
                Some(_) => self.advance(),
            }
        }
    }

    /// Collect all tokens with their line numbers, ending with `Eof`.
    pub fn tokenize(&mut self) -> Vec<Spanned> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token == Token::Eof;
            tokens.push(Spanned {
                token,
                line: self.token_line,
            });
            if done {
                break;
            }
        }
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(sql: &str) -> Vec<Token> {
        Lexer::new(sql)
            .tokenize()
            .into_iter()
            .map(|s| s.token)
            .collect()
    }

    #[test]
    fn test_simple_create_table() {
        let toks = tokens("CREATE TABLE users (id INT);");

        assert_eq!(toks[0], Token::Create);
        assert_eq!(toks[1], Token::Table);
        assert_eq!(toks[2], Token::Ident("users".to_string()));
        assert_eq!(toks[3], Token::LParen);
        assert_eq!(toks[4], Token::Ident("id".to_string()));
        assert_eq!(toks[5], Token::Ident("INT".to_string()));
        assert_eq!(toks[6], Token::RParen);
        assert_eq!(toks[7], Token::Semicolon);
        assert_eq!(toks[8], Token::Eof);
    }

    #[test]
    fn test_quoted_identifiers() {
        let toks = tokens(r#"CREATE TABLE "User Table" (`column name` INT, [other] INT);"#);

        assert_eq!(toks[2], Token::Ident("User Table".to_string()));
        assert_eq!(toks[4], Token::Ident("column name".to_string()));
        assert_eq!(toks[7], Token::Ident("other".to_string()));
    }

    #[test]
    fn test_array_suffix_is_not_identifier() {
        let toks = tokens("tags text[]");
        assert_eq!(toks[1], Token::Ident("text".to_string()));
        assert_eq!(toks[2], Token::Brackets);
    }

    #[test]
    fn test_comments_and_lines() {
        let spanned = Lexer::new("-- comment\nCREATE /* block\n */ TABLE t (id INT);").tokenize();

        assert_eq!(spanned[0].token, Token::Create);
        assert_eq!(spanned[0].line, 2);
        assert_eq!(spanned[1].token, Token::Table);
        assert_eq!(spanned[1].line, 3);
    }

    #[test]
    fn test_string_escapes() {
        let toks = tokens(r"DEFAULT 'it''s' 'a\nb'");
        assert_eq!(toks[1], Token::Str("it's".to_string()));
        assert_eq!(toks[2], Token::Str("a\nb".to_string()));
    }

    #[test]
    fn test_serial_is_type_name_and_increment_is_keyword() {
        let toks = tokens("id BIGSERIAL, n INTEGER AUTOINCREMENT");
        assert_eq!(toks[1], Token::Ident("BIGSERIAL".to_string()));
        assert_eq!(toks[5], Token::Increment);
    }
}
