use super::{ParseError, Parser};
use crate::blueprint::{EndpointBlueprint, InlineRefBlueprint, ReferenceBlueprint};
use crate::lexer::Token;
use crate::model::{QualifiedName, RefKind};

impl Parser<'_> {
    /// `Ref [name]: a.b > c.d [settings]` or `Ref [name] { a.b > c.d [settings] }`.
    pub(super) fn parse_reference(&mut self) -> Result<ReferenceBlueprint, ParseError> {
        let name = match self.peek() {
            Token::Ident(_) | Token::Str(_) => Some(self.expect_name("reference name")?),
            _ => None,
        };

        match self.peek() {
            Token::Colon => {
                self.advance();
                self.parse_reference_body(name)
            }
            Token::LBrace => {
                self.advance();
                let leading = self.take_leading_comments();
                let mut reference = self.parse_reference_body(name)?;
                if reference.comment.is_none() && !leading.is_empty() {
                    reference.comment = Some(leading.join("\n"));
                }
                self.skip_newlines();
                self.expect(Token::RBrace, "}")?;
                Ok(reference)
            }
            _ => self.unexpected(": or {"),
        }
    }

    fn parse_reference_body(&mut self, name: Option<String>) -> Result<ReferenceBlueprint, ParseError> {
        let from = self.parse_endpoint()?;
        let kind = self.parse_ref_kind()?;
        let to = self.parse_endpoint()?;

        let mut on_delete = None;
        let mut on_update = None;
        if *self.peek() == Token::LBracket {
            self.open_settings()?;
            loop {
                let key = self.expect_name("reference setting")?.to_ascii_lowercase();
                self.expect(Token::Colon, ":")?;
                match key.as_str() {
                    "delete" => on_delete = Some(self.parse_ref_action()?),
                    "update" => on_update = Some(self.parse_ref_action()?),
                    "color" => match self.peek() {
                        Token::Color(_) => {
                            self.advance();
                        }
                        _ => return self.unexpected("color"),
                    },
                    _ => return self.unexpected("delete, update or color"),
                }
                if !self.next_setting()? {
                    break;
                }
            }
        }

        Ok(ReferenceBlueprint {
            name,
            kind,
            from,
            to,
            on_delete,
            on_update,
            comment: self.take_comment(),
            inline: false,
        })
    }

    /// Referential action words up to the next `,` or `]`: `cascade`, `set null`, ...
    fn parse_ref_action(&mut self) -> Result<String, ParseError> {
        let mut words = vec![self.expect_name("referential action")?];
        while let Token::Ident(w) = self.peek().clone() {
            self.advance();
            words.push(w);
        }
        Ok(words.join(" "))
    }

    pub(super) fn parse_inline_ref(&mut self) -> Result<InlineRefBlueprint, ParseError> {
        let kind = self.parse_ref_kind()?;
        let target = self.parse_endpoint()?;
        Ok(InlineRefBlueprint { kind, target })
    }

    fn parse_ref_kind(&mut self) -> Result<RefKind, ParseError> {
        let kind = match self.peek() {
            Token::Gt => RefKind::ManyToOne,
            Token::Lt => RefKind::OneToMany,
            Token::Dash => RefKind::OneToOne,
            Token::LtGt => RefKind::ManyToMany,
            _ => return self.unexpected("relationship symbol (<, >, -, <>)"),
        };
        self.advance();
        Ok(kind)
    }

    /// `table.col`, `schema.table.col`, `table.(a, b)` or `schema.table.(a, b)`.
    fn parse_endpoint(&mut self) -> Result<EndpointBlueprint, ParseError> {
        let mut path = vec![self.expect_name("table name")?];
        let mut columns = None;

        while *self.peek() == Token::Dot {
            self.advance();
            if *self.peek() == Token::LParen {
                self.advance();
                let mut list = vec![self.expect_name("column name")?];
                while *self.peek() == Token::Comma {
                    self.advance();
                    list.push(self.expect_name("column name")?);
                }
                self.expect(Token::RParen, ")")?;
                columns = Some(list);
                break;
            }
            path.push(self.expect_name("name")?);
        }

        let columns = match columns {
            Some(list) => list,
            None if path.len() >= 2 => path.pop().into_iter().collect(),
            None => return self.unexpected("table.column"),
        };
        let table = match path.as_slice() {
            [name] => QualifiedName::new(name.clone()),
            [schema, name] => QualifiedName::with_schema(schema.clone(), name.clone()),
            _ => return self.unexpected("[schema.]table.column"),
        };

        Ok(EndpointBlueprint { table, columns })
    }
}
