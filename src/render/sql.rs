//! PostgreSQL-flavoured DDL.

use super::Renderer;
use crate::database::Database;
use crate::model::{
    Column, ColumnKey, DefaultValue, Enum, Index, IndexSubject, QualifiedName, RefKind, Reference,
    Table,
};

#[derive(Debug, Default, Clone, Copy)]
pub struct SqlRenderer;

impl Renderer for SqlRenderer {
    fn render_db(&self, db: &Database) -> String {
        let mut statements = Vec::new();

        for item in db.enums() {
            statements.push(render_enum(item));
        }
        for table in db.tables() {
            statements.push(render_table(table));
            for index in table.indexes().iter().filter(|i| !i.pk) {
                statements.push(render_index(table, index));
            }
        }
        for reference in db.refs() {
            statements.extend(render_reference(db, reference));
        }
        for table in db.tables() {
            statements.extend(render_comments(table));
        }

        statements.join("\n\n") + if statements.is_empty() { "" } else { "\n" }
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

fn qualified(name: &QualifiedName) -> String {
    if name.schema == crate::model::DEFAULT_SCHEMA {
        quote_ident(&name.name)
    } else {
        format!("{}.{}", quote_ident(&name.schema), quote_ident(&name.name))
    }
}

fn render_enum(item: &Enum) -> String {
    let name = QualifiedName::with_schema(item.schema.as_str(), item.name.as_str());
    let values: Vec<String> = item
        .items
        .iter()
        .map(|i| format!("  {}", quote_literal(&i.name)))
        .collect();
    format!(
        "CREATE TYPE {} AS ENUM (\n{}\n);",
        qualified(&name),
        values.join(",\n")
    )
}

fn render_default(value: &DefaultValue) -> String {
    match value {
        DefaultValue::Str(s) => quote_literal(s),
        DefaultValue::Expr(e) => e.clone(),
        DefaultValue::Bool(true) => "TRUE".to_string(),
        DefaultValue::Bool(false) => "FALSE".to_string(),
        DefaultValue::Null => "NULL".to_string(),
        DefaultValue::Int(n) => n.to_string(),
        DefaultValue::Float(_) => value.to_string(),
    }
}

/// Columns of a multi-column primary key, from column flags or a pk index.
fn composite_pk(table: &Table) -> Vec<String> {
    let flagged: Vec<&Column> = table.columns().iter().filter(|c| c.pk).collect();
    if flagged.len() > 1 {
        return flagged.iter().map(|c| quote_ident(&c.name)).collect();
    }
    table
        .indexes()
        .iter()
        .find(|i| i.pk)
        .map(|i| i.subjects.iter().map(render_subject).collect())
        .unwrap_or_default()
}

fn render_column(column: &Column, inline_pk: bool) -> String {
    let mut parts = vec![quote_ident(&column.name), column.typ.clone()];
    if column.pk && inline_pk {
        parts.push("PRIMARY KEY".to_string());
    }
    if column.autoinc {
        parts.push("GENERATED BY DEFAULT AS IDENTITY".to_string());
    }
    if column.unique {
        parts.push("UNIQUE".to_string());
    }
    if column.not_null {
        parts.push("NOT NULL".to_string());
    }
    if let Some(default) = &column.default {
        parts.push(format!("DEFAULT {}", render_default(default)));
    }
    parts.join(" ")
}

fn render_table(table: &Table) -> String {
    let composite = composite_pk(table);
    let mut body: Vec<String> = table
        .columns()
        .iter()
        .map(|c| format!("  {}", render_column(c, composite.is_empty())))
        .collect();
    if !composite.is_empty() {
        body.push(format!("  PRIMARY KEY ({})", composite.join(", ")));
    }

    let mut output = String::new();
    if let Some(comment) = &table.comment {
        for line in comment.lines() {
            output.push_str(&format!("-- {}\n", line));
        }
    }
    output.push_str(&format!(
        "CREATE TABLE {} (\n{}\n);",
        qualified(&table.name),
        body.join(",\n")
    ));
    output
}

fn render_subject(subject: &IndexSubject) -> String {
    match subject {
        IndexSubject::Column(name) => quote_ident(name),
        IndexSubject::Expr(expr) => format!("({})", expr),
    }
}

fn render_index(table: &Table, index: &Index) -> String {
    let mut output = String::from("CREATE ");
    if index.unique {
        output.push_str("UNIQUE ");
    }
    output.push_str("INDEX ");
    if let Some(name) = &index.name {
        output.push_str(&format!("{} ", quote_ident(name)));
    }
    output.push_str(&format!("ON {}", qualified(&table.name)));
    if let Some(kind) = &index.kind {
        output.push_str(&format!(" USING {}", kind.to_uppercase()));
    }
    let subjects: Vec<String> = index.subjects.iter().map(render_subject).collect();
    output.push_str(&format!(" ({});", subjects.join(", ")));
    output
}

fn column_list(keys: &[ColumnKey]) -> String {
    keys.iter()
        .map(|k| quote_ident(&k.column))
        .collect::<Vec<_>>()
        .join(", ")
}

fn foreign_key(reference: &Reference, from: &[ColumnKey], to: &[ColumnKey]) -> String {
    let mut output = format!("ALTER TABLE {} ADD ", qualified(&from[0].table_name));
    if let Some(name) = &reference.name {
        output.push_str(&format!("CONSTRAINT {} ", quote_ident(name)));
    }
    output.push_str(&format!(
        "FOREIGN KEY ({}) REFERENCES {} ({})",
        column_list(from),
        qualified(&to[0].table_name),
        column_list(to)
    ));
    if let Some(action) = &reference.on_delete {
        output.push_str(&format!(" ON DELETE {}", action.to_uppercase()));
    }
    if let Some(action) = &reference.on_update {
        output.push_str(&format!(" ON UPDATE {}", action.to_uppercase()));
    }
    output.push(';');
    output
}

fn render_reference(db: &Database, reference: &Reference) -> Vec<String> {
    let (col1, col2) = (reference.col1(), reference.col2());
    match reference.kind {
        RefKind::ManyToOne | RefKind::OneToOne => vec![foreign_key(reference, col1, col2)],
        RefKind::OneToMany => vec![foreign_key(reference, col2, col1)],
        RefKind::ManyToMany => render_junction(db, reference),
    }
}

/// A many-to-many reference becomes a junction table with two foreign keys.
fn render_junction(db: &Database, reference: &Reference) -> Vec<String> {
    let (col1, col2) = (reference.col1(), reference.col2());
    let t1 = &col1[0].table_name;
    let t2 = &col2[0].table_name;
    let junction = QualifiedName::with_schema(
        t1.schema.as_str(),
        format!("{}_{}", t1.name, t2.name),
    );

    let column_type = |key: &ColumnKey| {
        db.table_by_id(key.table)
            .and_then(|t| t.column(&key.column))
            .map(|c| c.typ.clone())
    };

    let mut body = Vec::new();
    let mut pk = Vec::new();
    let mut fks = Vec::new();
    for (keys, table) in [(col1, t1), (col2, t2)] {
        let mut local = Vec::new();
        for key in keys {
            let Some(typ) = column_type(key) else {
                return vec![format!(
                    "-- skipped {} <> {}: column types unknown",
                    t1.full_name(),
                    t2.full_name()
                )];
            };
            let name = format!("{}_{}", table.name, key.column);
            body.push(format!("  {} {}", quote_ident(&name), typ));
            pk.push(quote_ident(&name));
            local.push(quote_ident(&name));
        }
        fks.push(format!(
            "ALTER TABLE {} ADD FOREIGN KEY ({}) REFERENCES {} ({});",
            qualified(&junction),
            local.join(", "),
            qualified(table),
            column_list(keys)
        ));
    }
    body.push(format!("  PRIMARY KEY ({})", pk.join(", ")));

    let mut statements = vec![format!(
        "CREATE TABLE {} (\n{}\n);",
        qualified(&junction),
        body.join(",\n")
    )];
    statements.extend(fks);
    statements
}

fn render_comments(table: &Table) -> Vec<String> {
    let mut statements = Vec::new();
    if let Some(note) = &table.note {
        statements.push(format!(
            "COMMENT ON TABLE {} IS {};",
            qualified(&table.name),
            quote_literal(note)
        ));
    }
    for column in table.columns() {
        if let Some(note) = &column.note {
            statements.push(format!(
                "COMMENT ON COLUMN {}.{} IS {};",
                qualified(&table.name),
                quote_ident(&column.name),
                quote_literal(note)
            ));
        }
    }
    statements
}
