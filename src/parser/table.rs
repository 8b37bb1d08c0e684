use super::{ParseError, Parser};
use crate::blueprint::{IndexBlueprint, TableBlueprint};
use crate::lexer::Token;
use crate::model::IndexSubject;

impl Parser<'_> {
    /// `Table [schema.]name [as alias] [settings] { ... }`
    pub(super) fn parse_table(&mut self) -> Result<TableBlueprint, ParseError> {
        let name = self.parse_qualified_name("table name")?;

        let alias = if self.check_keyword("as") {
            self.advance();
            Some(self.expect_name("table alias")?)
        } else {
            None
        };

        let mut note = None;
        let mut header_color = None;
        if *self.peek() == Token::LBracket {
            self.open_settings()?;
            loop {
                let key = self.expect_name("table setting")?.to_ascii_lowercase();
                self.expect(Token::Colon, ":")?;
                match key.as_str() {
                    "note" => note = Some(self.expect_string("note text")?),
                    "headercolor" => match self.peek().clone() {
                        Token::Color(c) => {
                            self.advance();
                            header_color = Some(c);
                        }
                        _ => return self.unexpected("#color"),
                    },
                    _ => return self.unexpected("note or headercolor"),
                }
                if !self.next_setting()? {
                    break;
                }
            }
        }

        self.expect(Token::LBrace, "{")?;

        let mut columns = Vec::new();
        let mut indexes = Vec::new();

        loop {
            let leading = self.take_leading_comments();
            if *self.peek() == Token::RBrace {
                break;
            }
            let keyed_note = self.check_keyword("note")
                && matches!(self.peek_nth(1), Token::Colon | Token::LBrace);

            if self.check_keyword("indexes") && *self.peek_nth(1) == Token::LBrace {
                self.advance();
                indexes.extend(self.parse_indexes()?);
            } else if keyed_note {
                self.advance();
                note = Some(self.parse_note_body()?);
            } else {
                columns.push(self.parse_column(leading)?);
                continue;
            }
            self.expect_line_end()?;
        }
        self.expect(Token::RBrace, "}")?;

        Ok(TableBlueprint {
            name,
            alias,
            columns,
            indexes,
            note,
            header_color,
            comment: None,
        })
    }

    fn parse_indexes(&mut self) -> Result<Vec<IndexBlueprint>, ParseError> {
        self.expect(Token::LBrace, "{")?;
        let mut indexes = Vec::new();
        loop {
            let leading = self.take_leading_comments();
            if *self.peek() == Token::RBrace {
                break;
            }
            let mut index = self.parse_index()?;
            if index.comment.is_none() && !leading.is_empty() {
                index.comment = Some(leading.join("\n"));
            }
            indexes.push(index);
        }
        self.expect(Token::RBrace, "}")?;
        Ok(indexes)
    }

    /// `col`, `` `expr` `` or `(col, `expr`, ...)`, then optional settings.
    fn parse_index(&mut self) -> Result<IndexBlueprint, ParseError> {
        let mut index = IndexBlueprint::default();

        if *self.peek() == Token::LParen {
            self.advance();
            index.subjects.push(self.parse_index_subject()?);
            while *self.peek() == Token::Comma {
                self.advance();
                index.subjects.push(self.parse_index_subject()?);
            }
            self.expect(Token::RParen, ")")?;
        } else {
            index.subjects.push(self.parse_index_subject()?);
        }

        if *self.peek() == Token::LBracket {
            self.open_settings()?;
            loop {
                let word = self.expect_name("index setting")?.to_ascii_lowercase();
                match word.as_str() {
                    "pk" => index.pk = true,
                    "unique" => index.unique = true,
                    "name" | "type" | "note" => {
                        self.expect(Token::Colon, ":")?;
                        let value = self.expect_name("setting value")?;
                        match word.as_str() {
                            "name" => index.name = Some(value),
                            "type" => index.kind = Some(value),
                            _ => index.note = Some(value),
                        }
                    }
                    _ => return self.unexpected("pk, unique, name, type or note"),
                }
                if !self.next_setting()? {
                    break;
                }
            }
        }

        index.comment = self.take_comment();
        self.expect_line_end()?;
        Ok(index)
    }

    fn parse_index_subject(&mut self) -> Result<IndexSubject, ParseError> {
        match self.peek().clone() {
            Token::Expr(e) => {
                self.advance();
                Ok(IndexSubject::Expr(e))
            }
            _ => Ok(IndexSubject::Column(self.expect_name("index column")?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GrammarConfig;
    use crate::model::QualifiedName;

    fn parse_table(input: &str) -> Result<TableBlueprint, ParseError> {
        let config = GrammarConfig::line_oriented();
        let mut schema = Parser::new(input, &config)?.parse()?;
        Ok(schema.tables.remove(0))
    }

    #[test]
    fn test_header() {
        let t = parse_table(
            "Table billing.invoices as inv [headercolor: #3498DB, note: 'money'] {\n id int\n}",
        )
        .unwrap();
        assert_eq!(t.name, QualifiedName::with_schema("billing", "invoices"));
        assert_eq!(t.alias.as_deref(), Some("inv"));
        assert_eq!(t.header_color.as_deref(), Some("#3498DB"));
        assert_eq!(t.note.as_deref(), Some("money"));
    }

    #[test]
    fn test_body_note_forms() {
        let t = parse_table("Table a {\n id int\n Note: 'short'\n}").unwrap();
        assert_eq!(t.note.as_deref(), Some("short"));
        let t = parse_table("Table a {\n id int\n note {\n  '''\n  long\n  '''\n }\n}").unwrap();
        assert_eq!(t.note.as_deref(), Some("long"));
    }

    #[test]
    fn test_column_named_note() {
        let t = parse_table("Table a {\n note text\n}").unwrap();
        assert_eq!(t.columns[0].name, "note");
        assert_eq!(t.note, None);
    }

    #[test]
    fn test_column_order_preserved() {
        let t = parse_table("Table a {\n z int\n\n a int\n m int\n}").unwrap();
        let names: Vec<_> = t.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_indexes() {
        let input = r#"Table a {
            id int
            name varchar
            indexes {
                id [pk]
                (id, `lower(name)`) [unique, name: 'idx_name', type: hash]
                // by name
                name
            }
        }"#;
        let t = parse_table(input).unwrap();
        assert_eq!(t.indexes.len(), 3);
        assert!(t.indexes[0].pk);
        assert_eq!(
            t.indexes[1].subjects,
            vec![
                IndexSubject::Column("id".into()),
                IndexSubject::Expr("lower(name)".into()),
            ]
        );
        assert!(t.indexes[1].unique);
        assert_eq!(t.indexes[1].name.as_deref(), Some("idx_name"));
        assert_eq!(t.indexes[1].kind.as_deref(), Some("hash"));
        assert_eq!(t.indexes[2].comment.as_deref(), Some("by name"));
    }

    #[test]
    fn test_settings_across_lines() {
        let t = parse_table(
            "Table a [\n  headercolor: #fff,\n  note: 'n'\n] {\n id int\n indexes {\n  id [\n   unique,\n   name: 'u'\n  ]\n }\n}",
        )
        .unwrap();
        assert_eq!(t.header_color.as_deref(), Some("#fff"));
        assert_eq!(t.note.as_deref(), Some("n"));
        assert!(t.indexes[0].unique);
        assert_eq!(t.indexes[0].name.as_deref(), Some("u"));
    }

    #[test]
    fn test_bad_separator_reports_offending_token() {
        let err = parse_table("Table a [note: 'x' 'y'] {\n id int\n}").unwrap_err();
        assert_eq!(
            err,
            ParseError::Unexpected {
                found: Token::Str("y".into()),
                expected: ", or ]",
                line: 1,
            }
        );
        let err = parse_table("Table a {\n id int\n indexes {\n  id [pk unique]\n }\n}").unwrap_err();
        assert!(matches!(
            err,
            ParseError::Unexpected { found: Token::Ident(ref w), line: 4, .. } if w == "unique"
        ));
    }

    #[test]
    fn test_unclosed_table() {
        assert!(parse_table("Table a {\n id int\n").is_err());
    }
}
