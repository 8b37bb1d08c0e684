//! Enum, TableGroup, Project and sticky Note grammars.

use super::{ParseError, Parser};
use crate::blueprint::{
    EnumBlueprint, EnumItemBlueprint, NoteBlueprint, ProjectBlueprint, TableGroupBlueprint,
};
use crate::lexer::Token;

impl Parser<'_> {
    /// `enum [schema.]name { item [note: '...'] ... }`
    pub(super) fn parse_enum(&mut self) -> Result<EnumBlueprint, ParseError> {
        let name = self.parse_qualified_name("enum name")?;
        self.expect(Token::LBrace, "{")?;

        let mut items = Vec::new();
        loop {
            let leading = self.take_leading_comments();
            if *self.peek() == Token::RBrace {
                break;
            }
            let item_name = self.expect_name("enum item")?;
            let mut note = None;
            if *self.peek() == Token::LBracket {
                self.open_settings()?;
                self.expect_keyword("note", "note")?;
                self.expect(Token::Colon, ":")?;
                note = Some(self.expect_string("note text")?);
                self.skip_newlines();
                self.expect(Token::RBracket, "]")?;
            }
            let comment = self
                .take_comment()
                .or_else(|| (!leading.is_empty()).then(|| leading.join("\n")));
            self.expect_line_end()?;
            items.push(EnumItemBlueprint {
                name: item_name,
                note,
                comment,
            });
        }
        self.expect(Token::RBrace, "}")?;

        Ok(EnumBlueprint {
            name,
            items,
            comment: None,
        })
    }

    /// `TableGroup name { [schema.]table ... }`
    pub(super) fn parse_table_group(&mut self) -> Result<TableGroupBlueprint, ParseError> {
        let name = self.expect_name("table group name")?;
        self.expect(Token::LBrace, "{")?;

        let mut tables = Vec::new();
        loop {
            self.take_leading_comments();
            if *self.peek() == Token::RBrace {
                break;
            }
            tables.push(self.parse_qualified_name("table name")?);
            self.take_comment();
            self.expect_line_end()?;
        }
        self.expect(Token::RBrace, "}")?;

        Ok(TableGroupBlueprint {
            name,
            tables,
            comment: None,
        })
    }

    /// `Project name { key: 'value' ... Note: '...' }`
    pub(super) fn parse_project(&mut self) -> Result<ProjectBlueprint, ParseError> {
        let name = self.expect_name("project name")?;
        self.expect(Token::LBrace, "{")?;

        let mut items = Vec::new();
        let mut note = None;
        loop {
            self.take_leading_comments();
            if *self.peek() == Token::RBrace {
                break;
            }
            if self.check_keyword("note") {
                self.advance();
                note = Some(self.parse_note_body()?);
            } else {
                let key = self.expect_name("project setting")?;
                self.expect(Token::Colon, ":")?;
                let value = self.expect_string("setting value")?;
                items.push((key, value));
            }
            self.take_comment();
            self.expect_line_end()?;
        }
        self.expect(Token::RBrace, "}")?;

        Ok(ProjectBlueprint {
            name,
            items,
            note,
            comment: None,
        })
    }

    /// `Note name { '...' }`
    pub(super) fn parse_sticky_note(&mut self) -> Result<NoteBlueprint, ParseError> {
        let name = self.expect_name("note name")?;
        if *self.peek() != Token::LBrace {
            return self.unexpected("{");
        }
        let text = self.parse_note_body()?;
        Ok(NoteBlueprint { name, text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::SchemaBlueprint;
    use crate::config::GrammarConfig;
    use crate::model::QualifiedName;

    fn parse(input: &str) -> Result<SchemaBlueprint, ParseError> {
        let config = GrammarConfig::line_oriented();
        Parser::new(input, &config)?.parse()
    }

    #[test]
    fn test_enum() {
        let input = "enum shop.status {\n  // first one\n  active\n  'on hold' [note: 'paused'] // why\n}";
        let e = parse(input).unwrap().enums.remove(0);
        assert_eq!(e.name, QualifiedName::with_schema("shop", "status"));
        assert_eq!(e.items.len(), 2);
        assert_eq!(e.items[0].comment.as_deref(), Some("first one"));
        assert_eq!(e.items[1].name, "on hold");
        assert_eq!(e.items[1].note.as_deref(), Some("paused"));
        assert_eq!(e.items[1].comment.as_deref(), Some("why"));
    }

    #[test]
    fn test_enum_item_note_across_lines() {
        let e = parse("enum s {\n  active [\n    note: 'live'\n  ]\n}").unwrap().enums.remove(0);
        assert_eq!(e.items[0].note.as_deref(), Some("live"));
    }

    #[test]
    fn test_table_group() {
        let g = parse("TableGroup core {\n users\n shop.orders\n}")
            .unwrap()
            .table_groups
            .remove(0);
        assert_eq!(g.name, "core");
        assert_eq!(
            g.tables,
            vec![
                QualifiedName::new("users"),
                QualifiedName::with_schema("shop", "orders"),
            ]
        );
    }

    #[test]
    fn test_project() {
        let input = "Project \"my shop\" {\n  database_type: 'PostgreSQL'\n  Note: 'hello'\n}";
        let p = parse(input).unwrap().projects.remove(0);
        assert_eq!(p.name, "my shop");
        assert_eq!(
            p.items,
            vec![("database_type".to_string(), "PostgreSQL".to_string())]
        );
        assert_eq!(p.note.as_deref(), Some("hello"));
    }

    #[test]
    fn test_sticky_note() {
        let n = parse("Note reminder {\n  'ship it'\n}").unwrap().notes.remove(0);
        assert_eq!(n.name, "reminder");
        assert_eq!(n.text, "ship it");
        assert!(parse("Note reminder: 'x'").is_err());
    }
}
