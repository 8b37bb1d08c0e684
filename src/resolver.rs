//! Promote parsed records into a linked, validated [`Database`].
//!
//! Enums and tables go in first; table groups and references are resolved
//! by name only once every table is known, so forward mentions are fine.

use tracing::{debug, trace};

use crate::blueprint::{
    ColumnBlueprint, EndpointBlueprint, IndexBlueprint, ReferenceBlueprint, SchemaBlueprint,
    TableBlueprint,
};
use crate::database::Database;
use crate::model::{
    Column, ColumnKey, Enum, EnumItem, Index, Project, Reference, StickyNote, Table, TableGroup,
    ValidationError,
};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ResolveError {
    #[error("Unresolved names: {}", .0.join(", "))]
    Unresolved(Vec<String>),
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

pub fn resolve(schema: SchemaBlueprint, allow_properties: bool) -> Result<Database, ResolveError> {
    let mut db = Database::new().with_properties(allow_properties);

    for bp in schema.enums {
        let items = bp
            .items
            .into_iter()
            .map(|i| EnumItem {
                name: i.name,
                note: i.note,
                comment: i.comment,
            })
            .collect();
        let mut item = Enum::new(bp.name.name, items).with_schema(bp.name.schema);
        item.comment = bp.comment;
        db.add_enum(item)?;
    }

    let mut pending = Vec::new();
    for bp in schema.tables {
        let (table, inline) = build_table(bp)?;
        pending.extend(inline);
        db.add_table(table)?;
    }
    pending.extend(schema.refs);

    let mut unresolved = Vec::new();

    let mut groups = Vec::new();
    for bp in schema.table_groups {
        let mut tables = Vec::new();
        for name in &bp.tables {
            match db.table(&name.full_name()) {
                Some(t) => tables.push(t.id()),
                None => unresolved.push(format!("table {}", name)),
            }
        }
        let mut group = TableGroup::new(bp.name, tables);
        group.comment = bp.comment;
        groups.push(group);
    }

    let mut refs = Vec::new();
    for bp in pending {
        let col1 = resolve_endpoint(&db, &bp.from, &mut unresolved);
        let col2 = resolve_endpoint(&db, &bp.to, &mut unresolved);
        if let (Some(col1), Some(col2)) = (col1, col2) {
            refs.push(build_reference(bp, col1, col2)?);
        }
    }

    if !unresolved.is_empty() {
        return Err(ResolveError::Unresolved(unresolved));
    }

    for group in groups {
        db.add_table_group(group)?;
    }
    for reference in refs {
        trace!(kind = reference.kind.symbol(), "reference resolved");
        db.add_reference(reference)?;
    }

    for bp in schema.projects {
        let mut project = Project::new(bp.name);
        project.items = bp.items;
        project.note = bp.note;
        project.comment = bp.comment;
        db.add_project(project);
    }
    for bp in schema.notes {
        db.add_sticky_note(StickyNote::new(bp.name, bp.text));
    }

    debug!(
        tables = db.tables().len(),
        refs = db.refs().len(),
        enums = db.enums().len(),
        "schema resolved"
    );
    Ok(db)
}

/// Build a table and the inline references its columns declare.
fn build_table(bp: TableBlueprint) -> Result<(Table, Vec<ReferenceBlueprint>), ValidationError> {
    let mut table = Table::new(bp.name.clone());
    table.alias = bp.alias;
    table.note = bp.note;
    table.header_color = bp.header_color;
    table.comment = bp.comment;

    let mut inline = Vec::new();
    for column in bp.columns {
        for r in &column.settings.refs {
            inline.push(ReferenceBlueprint {
                name: None,
                kind: r.kind,
                from: EndpointBlueprint {
                    table: bp.name.clone(),
                    columns: vec![column.name.clone()],
                },
                to: r.target.clone(),
                on_delete: None,
                on_update: None,
                comment: None,
                inline: true,
            });
        }
        table.add_column(build_column(column))?;
    }

    for index in bp.indexes {
        table.add_index(build_index(index))?;
    }

    Ok((table, inline))
}

fn build_column(bp: ColumnBlueprint) -> Column {
    let s = bp.settings;
    let mut column = Column::new(bp.name, bp.typ);
    column.not_null = s.not_null.unwrap_or(false);
    column.pk = s.pk;
    column.unique = s.unique;
    column.autoinc = s.autoinc;
    column.default = s.default;
    // an explicit note setting wins over the source comment
    column.note = s.note.or_else(|| bp.comment.clone());
    column.comment = bp.comment;
    column.properties = s.properties;
    column
}

fn build_index(bp: IndexBlueprint) -> Index {
    Index {
        subjects: bp.subjects,
        pk: bp.pk,
        unique: bp.unique,
        name: bp.name,
        kind: bp.kind,
        note: bp.note,
        comment: bp.comment,
    }
}

fn build_reference(
    bp: ReferenceBlueprint,
    col1: Vec<ColumnKey>,
    col2: Vec<ColumnKey>,
) -> Result<Reference, ValidationError> {
    let mut reference = Reference::new(bp.kind, col1, col2)?;
    reference.name = bp.name;
    reference.on_delete = bp.on_delete;
    reference.on_update = bp.on_update;
    reference.comment = bp.comment;
    reference.inline = bp.inline;
    Ok(reference)
}

/// Endpoint columns by table full name or alias; misses are recorded.
fn resolve_endpoint(
    db: &Database,
    endpoint: &EndpointBlueprint,
    unresolved: &mut Vec<String>,
) -> Option<Vec<ColumnKey>> {
    let Some(table) = db.table(&endpoint.table.full_name()) else {
        unresolved.push(format!("table {}", endpoint.table));
        return None;
    };
    let mut keys = Vec::new();
    for column in &endpoint.columns {
        match table.column_key(column) {
            Some(key) => keys.push(key),
            None => unresolved.push(format!("column {}.{}", endpoint.table, column)),
        }
    }
    (keys.len() == endpoint.columns.len()).then_some(keys)
}
