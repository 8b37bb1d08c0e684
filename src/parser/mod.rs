//! Recursive-descent grammar producing [`SchemaBlueprint`] records.

mod column;
mod entities;
mod reference;
mod table;

use crate::blueprint::SchemaBlueprint;
use crate::config::GrammarConfig;
use crate::lexer::{LexError, Lexer, Spanned, Token};
use crate::model::QualifiedName;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ParseError {
    #[error("Lex error: {0}")]
    Lex(#[from] LexError),
    #[error("line {line}: unexpected token {found:?}, expected {expected}")]
    Unexpected {
        found: Token,
        expected: &'static str,
        line: usize,
    },
    #[error("line {line}: unknown column setting '{name}'")]
    UnknownSetting { name: String, line: usize },
    #[error("line {line}: column '{column}' is declared both null and not null")]
    ConflictingNullability { column: String, line: usize },
    #[error("line {line}: invalid number: {raw}")]
    InvalidNumber { raw: String, line: usize },
}

pub struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Spanned>,
    pos: usize,
    config: &'a GrammarConfig,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, config: &'a GrammarConfig) -> Result<Self, ParseError> {
        let tokens = Lexer::new(source, config).tokenize()?;
        Ok(Self {
            source,
            tokens,
            pos: 0,
            config,
        })
    }

    fn current(&self) -> &Spanned {
        // the lexer always terminates the stream with Eof
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.pos.min(last)]
    }

    fn peek(&self) -> &Token {
        &self.current().token
    }

    fn peek_nth(&self, n: usize) -> &Token {
        self.tokens
            .get(self.pos + n)
            .map_or(&Token::Eof, |t| &t.token)
    }

    fn line(&self) -> usize {
        self.current().line
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn unexpected<T>(&self, expected: &'static str) -> Result<T, ParseError> {
        Err(ParseError::Unexpected {
            found: self.peek().clone(),
            expected,
            line: self.line(),
        })
    }

    fn expect(&mut self, expected: Token, what: &'static str) -> Result<(), ParseError> {
        if *self.peek() == expected {
            self.advance();
            Ok(())
        } else {
            self.unexpected(what)
        }
    }

    fn check_keyword(&self, kw: &str) -> bool {
        self.peek().is_keyword(kw)
    }

    fn expect_keyword(&mut self, kw: &str, what: &'static str) -> Result<(), ParseError> {
        if self.check_keyword(kw) {
            self.advance();
            Ok(())
        } else {
            self.unexpected(what)
        }
    }

    /// Bare or quoted identifier.
    fn expect_name(&mut self, what: &'static str) -> Result<String, ParseError> {
        match self.peek().clone() {
            Token::Ident(s) | Token::Str(s) => {
                self.advance();
                Ok(s)
            }
            _ => self.unexpected(what),
        }
    }

    fn expect_string(&mut self, what: &'static str) -> Result<String, ParseError> {
        match self.peek().clone() {
            Token::Str(s) => {
                self.advance();
                Ok(s)
            }
            _ => self.unexpected(what),
        }
    }

    /// `name` or `schema.name`.
    fn parse_qualified_name(&mut self, what: &'static str) -> Result<QualifiedName, ParseError> {
        let first = self.expect_name(what)?;
        if *self.peek() == Token::Dot {
            self.advance();
            let second = self.expect_name(what)?;
            Ok(QualifiedName::with_schema(first, second))
        } else {
            Ok(QualifiedName::new(first))
        }
    }

    fn skip_newlines(&mut self) {
        while *self.peek() == Token::Newline {
            self.advance();
        }
    }

    fn take_comment(&mut self) -> Option<String> {
        match self.peek().clone() {
            Token::Comment(text) => {
                self.advance();
                Some(text)
            }
            _ => None,
        }
    }

    /// Consume blank lines and whole-line comments; returns the comments in
    /// source order.
    fn take_leading_comments(&mut self) -> Vec<String> {
        let mut comments = Vec::new();
        loop {
            match self.peek().clone() {
                Token::Newline => {
                    self.advance();
                }
                Token::Comment(text) => {
                    self.advance();
                    comments.push(text);
                }
                _ => return comments,
            }
        }
    }

    /// Open a bracketed settings list. Settings may span several lines.
    fn open_settings(&mut self) -> Result<(), ParseError> {
        self.expect(Token::LBracket, "[")?;
        self.skip_newlines();
        Ok(())
    }

    /// After one setting: `,` continues the list, `]` closes it.
    fn next_setting(&mut self) -> Result<bool, ParseError> {
        self.skip_newlines();
        match self.peek() {
            Token::Comma => {
                self.advance();
                self.skip_newlines();
                Ok(true)
            }
            Token::RBracket => {
                self.advance();
                Ok(false)
            }
            _ => self.unexpected(", or ]"),
        }
    }

    /// A construct ends at a newline, or right before `}` or end of input.
    fn expect_line_end(&mut self) -> Result<(), ParseError> {
        match self.peek() {
            Token::Newline => {
                self.advance();
                Ok(())
            }
            Token::RBrace | Token::Eof => Ok(()),
            _ => self.unexpected("end of line"),
        }
    }

    /// `: 'text'` or `{ 'text' }` following a `Note` keyword.
    fn parse_note_body(&mut self) -> Result<String, ParseError> {
        match self.peek() {
            Token::Colon => {
                self.advance();
                self.expect_string("note text")
            }
            Token::LBrace => {
                self.advance();
                self.skip_newlines();
                let text = self.expect_string("note text")?;
                self.skip_newlines();
                self.expect(Token::RBrace, "}")?;
                Ok(text)
            }
            _ => self.unexpected(": or {"),
        }
    }

    /// Parse every construct in the source.
    pub fn parse(&mut self) -> Result<SchemaBlueprint, ParseError> {
        let mut schema = SchemaBlueprint::default();

        loop {
            let leading = self.take_leading_comments();
            let comment = (!leading.is_empty()).then(|| leading.join("\n"));

            if *self.peek() == Token::Eof {
                break;
            } else if self.check_keyword("table") {
                self.advance();
                let mut table = self.parse_table()?;
                table.comment = comment;
                schema.tables.push(table);
            } else if self.check_keyword("ref") {
                self.advance();
                let mut reference = self.parse_reference()?;
                reference.comment = reference.comment.or(comment);
                schema.refs.push(reference);
            } else if self.check_keyword("enum") {
                self.advance();
                let mut item = self.parse_enum()?;
                item.comment = comment;
                schema.enums.push(item);
            } else if self.check_keyword("tablegroup") {
                self.advance();
                let mut group = self.parse_table_group()?;
                group.comment = comment;
                schema.table_groups.push(group);
            } else if self.check_keyword("project") {
                self.advance();
                let mut project = self.parse_project()?;
                project.comment = comment;
                schema.projects.push(project);
            } else if self.check_keyword("note") {
                self.advance();
                schema.notes.push(self.parse_sticky_note()?);
            } else {
                return self.unexpected("Table, Ref, Enum, TableGroup, Project or Note");
            }
            self.expect_line_end()?;
        }

        Ok(schema)
    }
}
