//! Column grammar:
//!
//! ```text
//! <name> <type> [unique | pk]* [ '[' setting (',' setting)* ']' ]
//! ```

use super::{ParseError, Parser};
use crate::blueprint::{ColumnBlueprint, ColumnSetting, ColumnSettings};
use crate::lexer::Token;
use crate::model::DefaultValue;

impl Parser<'_> {
    /// Parse one column line. `leading` holds the whole-line comments
    /// directly above it.
    pub(super) fn parse_column(&mut self, leading: Vec<String>) -> Result<ColumnBlueprint, ParseError> {
        let name = self.expect_name("column name")?;
        let typ = self.parse_column_type()?;

        let mut settings = ColumnSettings::default();

        // bare constraints, kept for older sources
        loop {
            if self.check_keyword("unique") {
                self.advance();
                self.apply_setting(&mut settings, ColumnSetting::Unique, &name)?;
            } else if self.check_keyword("pk") {
                self.advance();
                self.apply_setting(&mut settings, ColumnSetting::PrimaryKey, &name)?;
            } else {
                break;
            }
        }

        let mut trailing = self.take_comment();
        if *self.peek() == Token::LBracket {
            self.parse_column_settings(&mut settings, &name)?;
            if let Some(comment) = self.take_comment() {
                trailing = Some(comment);
            }
        }
        self.expect_line_end()?;

        // a same-line comment wins over the block above
        let comment = trailing.or_else(|| (!leading.is_empty()).then(|| leading.join("\n")));

        Ok(ColumnBlueprint {
            name,
            typ,
            settings,
            comment,
        })
    }

    /// Type forms, first match wins: `name[]`, `schema.name`, `name(args)`, `name`.
    fn parse_column_type(&mut self) -> Result<String, ParseError> {
        let base = self.expect_name("column type")?;
        match self.peek() {
            Token::ArraySuffix => {
                self.advance();
                Ok(format!("{}[]", base))
            }
            Token::Dot => {
                self.advance();
                let name = self.expect_name("type name")?;
                Ok(format!("{}.{}", base, name))
            }
            Token::LParen => {
                let args = self.capture_parenthesized()?;
                Ok(format!("{}({})", base, args))
            }
            _ => Ok(base),
        }
    }

    /// Source text between balanced parentheses, verbatim.
    fn capture_parenthesized(&mut self) -> Result<String, ParseError> {
        let start = self.current().end;
        self.expect(Token::LParen, "(")?;
        let mut depth = 1usize;
        loop {
            match self.peek() {
                Token::LParen => depth += 1,
                Token::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        let end = self.current().start;
                        self.advance();
                        return Ok(self.source[start..end].trim().to_string());
                    }
                }
                Token::Newline | Token::Eof => return self.unexpected(")"),
                _ => {}
            }
            self.advance();
        }
    }

    fn apply_setting(
        &self,
        settings: &mut ColumnSettings,
        setting: ColumnSetting,
        column: &str,
    ) -> Result<(), ParseError> {
        settings
            .apply(setting)
            .map_err(|_| ParseError::ConflictingNullability {
                column: column.to_string(),
                line: self.line(),
            })
    }

    fn parse_column_settings(
        &mut self,
        settings: &mut ColumnSettings,
        column: &str,
    ) -> Result<(), ParseError> {
        self.open_settings()?;
        loop {
            let setting = self.parse_column_setting()?;
            self.apply_setting(settings, setting, column)?;
            if !self.next_setting()? {
                return Ok(());
            }
        }
    }

    fn parse_column_setting(&mut self) -> Result<ColumnSetting, ParseError> {
        let word = match self.peek() {
            Token::Ident(w) => w.to_ascii_lowercase(),
            _ => return self.unexpected("column setting"),
        };
        let keyed = *self.peek_nth(1) == Token::Colon;

        let setting = match word.as_str() {
            "not" if self.peek_nth(1).is_keyword("null") => {
                self.advance();
                self.advance();
                ColumnSetting::Nullability(true)
            }
            "null" if !keyed => {
                self.advance();
                ColumnSetting::Nullability(false)
            }
            "primary" if self.peek_nth(1).is_keyword("key") => {
                self.advance();
                self.advance();
                ColumnSetting::PrimaryKey
            }
            "pk" if !keyed => {
                self.advance();
                ColumnSetting::PrimaryKey
            }
            "unique" if !keyed => {
                self.advance();
                ColumnSetting::Unique
            }
            "increment" if !keyed => {
                self.advance();
                ColumnSetting::Increment
            }
            "note" if keyed => {
                self.advance();
                self.advance();
                ColumnSetting::Note(self.expect_string("note text")?)
            }
            "ref" if keyed => {
                self.advance();
                self.advance();
                ColumnSetting::Ref(self.parse_inline_ref()?)
            }
            "default" if keyed => {
                self.advance();
                self.advance();
                ColumnSetting::Default(self.parse_default_value()?)
            }
            _ if keyed => return self.parse_property(),
            _ => return self.unexpected("column setting"),
        };
        Ok(setting)
    }

    /// Alternatives in fixed order: string, expression, boolean/null, number.
    fn parse_default_value(&mut self) -> Result<DefaultValue, ParseError> {
        let line = self.line();
        let value = match self.peek().clone() {
            Token::Str(s) => DefaultValue::Str(s),
            Token::Expr(e) => DefaultValue::Expr(e),
            Token::Ident(w) if w.eq_ignore_ascii_case("true") => DefaultValue::Bool(true),
            Token::Ident(w) if w.eq_ignore_ascii_case("false") => DefaultValue::Bool(false),
            Token::Ident(w) if w.eq_ignore_ascii_case("null") => DefaultValue::Null,
            Token::Num(raw) => parse_number(&raw, line)?,
            _ => return self.unexpected("default value"),
        };
        self.advance();
        Ok(value)
    }

    /// `<name>: <string>`, only in extended properties mode.
    fn parse_property(&mut self) -> Result<ColumnSetting, ParseError> {
        let line = self.line();
        let name = self.expect_name("property name")?;
        if !self.config.allow_properties() {
            return Err(ParseError::UnknownSetting { name, line });
        }
        self.expect(Token::Colon, ":")?;
        let value = self.expect_string("property value")?;
        Ok(ColumnSetting::Property(name, value))
    }
}

/// Float when the literal has a decimal point, integer otherwise.
fn parse_number(raw: &str, line: usize) -> Result<DefaultValue, ParseError> {
    let invalid = || ParseError::InvalidNumber {
        raw: raw.to_string(),
        line,
    };
    if raw.contains('.') {
        raw.parse().map(DefaultValue::Float).map_err(|_| invalid())
    } else {
        raw.parse().map(DefaultValue::Int).map_err(|_| invalid())
    }
}
