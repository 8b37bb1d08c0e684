//! Renders a Database back into the modeling language.

use unicode_width::UnicodeWidthStr;

use super::{Renderer, quote_string};
use crate::database::Database;
use crate::model::{
    Column, ColumnKey, Enum, Index, IndexSubject, Project, QualifiedName, Reference, StickyNote,
    Table, TableGroup,
};

pub struct DbmlRenderer {
    indent: String,
}

impl Default for DbmlRenderer {
    fn default() -> Self {
        Self {
            indent: "    ".to_string(),
        }
    }
}

impl Renderer for DbmlRenderer {
    fn render_db(&self, db: &Database) -> String {
        let mut blocks = Vec::new();

        if let Some(project) = db.project() {
            blocks.push(self.render_project(project));
        }
        for item in db.enums() {
            blocks.push(self.render_enum(item));
        }
        for table in db.tables() {
            blocks.push(self.render_table(db, table));
        }
        for reference in db.refs().iter().filter(|r| !renders_inline(r)) {
            blocks.push(render_reference(reference));
        }
        for group in db.table_groups() {
            blocks.push(self.render_table_group(db, group));
        }
        for note in db.sticky_notes() {
            blocks.push(self.render_sticky_note(note));
        }

        blocks.join("\n")
    }
}

impl DbmlRenderer {
    fn render_project(&self, project: &Project) -> String {
        let mut output = comment_lines(project.comment.as_deref(), "");
        output.push_str(&format!("Project {} {{\n", quote_name(&project.name)));
        for (key, value) in &project.items {
            output.push_str(&format!("{}{}: {}\n", self.indent, key, quote_string(value)));
        }
        if let Some(note) = &project.note {
            output.push_str(&format!("{}Note: {}\n", self.indent, quote_note(note)));
        }
        output.push_str("}\n");
        output
    }

    fn render_enum(&self, item: &Enum) -> String {
        let mut output = comment_lines(item.comment.as_deref(), "");
        let name = QualifiedName::with_schema(item.schema.as_str(), item.name.as_str());
        output.push_str(&format!("enum {} {{\n", render_qualified(&name)));
        for value in &item.items {
            output.push_str(&comment_lines(value.comment.as_deref(), &self.indent));
            output.push_str(&format!("{}{}", self.indent, quote_name(&value.name)));
            if let Some(note) = &value.note {
                output.push_str(&format!(" [note: {}]", quote_string(note)));
            }
            output.push('\n');
        }
        output.push_str("}\n");
        output
    }

    fn render_table(&self, db: &Database, table: &Table) -> String {
        let mut output = comment_lines(table.comment.as_deref(), "");
        output.push_str(&format!("Table {}", render_qualified(&table.name)));
        if let Some(alias) = &table.alias {
            output.push_str(&format!(" as {}", quote_name(alias)));
        }
        let mut settings = Vec::new();
        if let Some(color) = &table.header_color {
            settings.push(format!("headercolor: {}", color));
        }
        if !settings.is_empty() {
            output.push_str(&format!(" [{}]", settings.join(", ")));
        }
        output.push_str(" {\n");

        // align types by display width of the column names
        let width = table
            .columns()
            .iter()
            .map(|c| quote_name(&c.name).width())
            .max()
            .unwrap_or(0);

        for column in table.columns() {
            output.push_str(&comment_lines(column.comment.as_deref(), &self.indent));
            output.push_str(&self.indent);
            output.push_str(&self.render_column(db, table, column, width));
            output.push('\n');
        }

        if !table.indexes().is_empty() {
            output.push_str(&format!("\n{}indexes {{\n", self.indent));
            for index in table.indexes() {
                output.push_str(&comment_lines(index.comment.as_deref(), &self.indent.repeat(2)));
                output.push_str(&self.indent.repeat(2));
                output.push_str(&render_index(index));
                output.push('\n');
            }
            output.push_str(&format!("{}}}\n", self.indent));
        }

        if let Some(note) = &table.note {
            output.push_str(&format!("\n{}Note: {}\n", self.indent, quote_note(note)));
        }
        output.push_str("}\n");
        output
    }

    fn render_column(&self, db: &Database, table: &Table, column: &Column, width: usize) -> String {
        let name = quote_name(&column.name);
        let pad = " ".repeat(width.saturating_sub(name.width()));
        let mut line = format!("{}{} {}", name, pad, render_type(&column.typ));

        let mut settings = Vec::new();
        if column.pk {
            settings.push("pk".to_string());
        }
        if column.autoinc {
            settings.push("increment".to_string());
        }
        if column.not_null {
            settings.push("not null".to_string());
        }
        if column.unique {
            settings.push("unique".to_string());
        }
        if let Some(default) = &column.default {
            settings.push(format!("default: {}", default));
        }
        for reference in db.refs().iter().filter(|r| renders_inline(r)) {
            let from = &reference.col1()[0];
            if from.table == table.id() && from.column == column.name {
                settings.push(format!(
                    "ref: {} {}",
                    reference.kind.symbol(),
                    render_keys(reference.col2())
                ));
            }
        }
        if let Some(note) = &column.note {
            settings.push(format!("note: {}", quote_string(note)));
        }
        if db.allow_properties() {
            for (key, value) in &column.properties {
                settings.push(format!("{}: {}", key, quote_string(value)));
            }
        }

        if !settings.is_empty() {
            line.push_str(&format!(" [{}]", settings.join(", ")));
        }
        line
    }

    fn render_table_group(&self, db: &Database, group: &TableGroup) -> String {
        let mut output = comment_lines(group.comment.as_deref(), "");
        output.push_str(&format!("TableGroup {} {{\n", quote_name(&group.name)));
        for table in group.tables.iter().filter_map(|id| db.table_by_id(*id)) {
            output.push_str(&format!("{}{}\n", self.indent, render_qualified(&table.name)));
        }
        output.push_str("}\n");
        output
    }

    fn render_sticky_note(&self, note: &StickyNote) -> String {
        format!(
            "Note {} {{\n{}{}\n}}\n",
            quote_name(&note.name),
            self.indent,
            quote_note(&note.text)
        )
    }
}

/// Single-column inline references are written back on their column.
fn renders_inline(reference: &Reference) -> bool {
    reference.inline && reference.col1().len() == 1
}

fn render_reference(reference: &Reference) -> String {
    let mut output = comment_lines(reference.comment.as_deref(), "");
    output.push_str("Ref");
    if let Some(name) = &reference.name {
        output.push_str(&format!(" {}", quote_name(name)));
    }
    output.push_str(&format!(
        ": {} {} {}",
        render_keys(reference.col1()),
        reference.kind.symbol(),
        render_keys(reference.col2())
    ));
    let mut actions = Vec::new();
    if let Some(action) = &reference.on_delete {
        actions.push(format!("delete: {}", action));
    }
    if let Some(action) = &reference.on_update {
        actions.push(format!("update: {}", action));
    }
    if !actions.is_empty() {
        output.push_str(&format!(" [{}]", actions.join(", ")));
    }
    output.push('\n');
    output
}

fn render_index(index: &Index) -> String {
    let subjects: Vec<String> = index
        .subjects
        .iter()
        .map(|s| match s {
            IndexSubject::Column(name) => quote_name(name),
            IndexSubject::Expr(expr) => format!("`{}`", expr),
        })
        .collect();
    let mut line = if subjects.len() == 1 {
        subjects[0].clone()
    } else {
        format!("({})", subjects.join(", "))
    };

    let mut settings = Vec::new();
    if index.pk {
        settings.push("pk".to_string());
    }
    if index.unique {
        settings.push("unique".to_string());
    }
    if let Some(name) = &index.name {
        settings.push(format!("name: {}", quote_string(name)));
    }
    if let Some(kind) = &index.kind {
        settings.push(format!("type: {}", kind));
    }
    if let Some(note) = &index.note {
        settings.push(format!("note: {}", quote_string(note)));
    }
    if !settings.is_empty() {
        line.push_str(&format!(" [{}]", settings.join(", ")));
    }
    line
}

/// `table.col` or `table.(a, b)`.
fn render_keys(keys: &[ColumnKey]) -> String {
    let Some(first) = keys.first() else {
        return String::new();
    };
    let table = render_qualified(&first.table_name);
    if keys.len() == 1 {
        format!("{}.{}", table, quote_name(&first.column))
    } else {
        let columns: Vec<String> = keys.iter().map(|k| quote_name(&k.column)).collect();
        format!("{}.({})", table, columns.join(", "))
    }
}

fn render_qualified(name: &QualifiedName) -> String {
    if name.schema == crate::model::DEFAULT_SCHEMA {
        quote_name(&name.name)
    } else {
        format!("{}.{}", quote_name(&name.schema), quote_name(&name.name))
    }
}

/// Column types are written bare unless they contain spaces.
fn render_type(typ: &str) -> String {
    if typ.contains(' ') && !typ.contains('(') {
        format!("\"{}\"", typ)
    } else {
        typ.to_string()
    }
}

fn quote_name(name: &str) -> String {
    let plain = name
        .chars()
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_alphanumeric() || c == '_');
    if plain {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "\\\""))
    }
}

fn quote_note(text: &str) -> String {
    if text.contains('\n') {
        format!("'''\n{}\n'''", text.replace("'''", "\\'''"))
    } else {
        quote_string(text)
    }
}

fn comment_lines(comment: Option<&str>, indent: &str) -> String {
    comment
        .map(|c| c.lines().map(|l| format!("{}// {}\n", indent, l)).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GrammarConfig;
    use crate::parse_dbml;

    fn round_trip(input: &str) -> String {
        let db = parse_dbml(input, &GrammarConfig::line_oriented()).unwrap();
        db.dbml()
    }

    #[test]
    fn test_render_table_aligned() {
        let out = round_trip("Table users {\n id integer [pk, increment]\n nickname varchar [not null]\n}");
        assert!(out.contains("Table users {\n"));
        assert!(out.contains("    id       integer [pk, increment]\n"));
        assert!(out.contains("    nickname varchar [not null]\n"));
    }

    #[test]
    fn test_unicode_alignment() {
        let out = round_trip("Table t {\n 名前 text\n id int\n}");
        // 名前 is four columns wide
        assert!(out.contains("    名前 text\n"));
        assert!(out.contains("    id   int\n"));
    }

    #[test]
    fn test_inline_ref_stays_inline() {
        let out = round_trip(
            "Table users {\n id int\n}\nTable orders {\n user_id int [ref: > users.id]\n}",
        );
        assert!(out.contains("user_id int [ref: > users.id]"));
        assert!(!out.contains("Ref:"));
    }

    #[test]
    fn test_standalone_ref() {
        let out = round_trip(
            "Table a {\n id int\n}\nTable b {\n a_id int\n}\nRef fk: b.a_id > a.id [delete: cascade]",
        );
        assert!(out.contains("Ref fk: b.a_id > a.id [delete: cascade]\n"));
    }

    #[test]
    fn test_output_parses_again() {
        let input = r#"
            Project shop {
                database_type: 'PostgreSQL'
            }
            enum billing.state {
                open
                "on hold" [note: 'it\'s paused']
            }
            // main table
            Table billing.invoices as inv [headercolor: #AABBCC] {
                id int [pk]
                total "double precision" [default: 0.5]
                state billing.state
                indexes {
                    (id, `lower(state)`) [unique, name: 'idx']
                }
                Note: '''
                    line one
                    line two
                '''
            }
            TableGroup money {
                billing.invoices
            }
            Note hint {
                'remember'
            }
        "#;
        let first = round_trip(input);
        let second = round_trip(&first);
        assert_eq!(first, second);
        assert!(first.contains("// main table\nTable billing.invoices as inv [headercolor: #AABBCC] {"));
    }

    #[test]
    fn test_large_float_default_reparses() {
        let first = round_trip("Table t {\n big float [default: 100000000000000000000.0]\n}");
        assert!(first.contains("[default: 100000000000000000000.0]"));
        assert_eq!(round_trip(&first), first);
    }

    #[test]
    fn test_properties_rendered_when_allowed() {
        let config = GrammarConfig::line_oriented().with_properties(true);
        let db = parse_dbml("Table t {\n id int [foo: 'a', foo: 'b']\n}", &config).unwrap();
        assert!(db.dbml().contains("id int [foo: 'a', foo: 'b']"));
    }
}
