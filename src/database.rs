//! The validated model container.

use std::collections::HashMap;
use std::ops::Index;

use tracing::debug;

use crate::model::{
    Column, DatabaseId, Enum, EnumId, Project, ProjectId, Reference, ReferenceId, StickyNote,
    StickyNoteId, Table, TableGroup, TableGroupId, TableId, ValidationError,
};
use crate::render::{DbmlRenderer, Renderer, SqlRenderer};

/// Any entity the generic [`Database::add`] entry point accepts.
///
/// `Column` is listed so that it is rejected explicitly: columns belong to
/// tables, never directly to a Database.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Table(Table),
    Column(Column),
    Reference(Reference),
    Enum(Enum),
    TableGroup(TableGroup),
    Project(Project),
    StickyNote(StickyNote),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityId {
    Table(TableId),
    Reference(ReferenceId),
    Enum(EnumId),
    TableGroup(TableGroupId),
    Project(ProjectId),
    StickyNote(StickyNoteId),
}

macro_rules! impl_from_entity {
    ($($variant:ident),*) => {
        $(
            impl From<$variant> for Entity {
                fn from(value: $variant) -> Self {
                    Entity::$variant(value)
                }
            }
        )*
    };
}

impl_from_entity!(Table, Column, Reference, Enum, TableGroup, Project, StickyNote);

#[derive(Debug, Clone)]
pub struct Database {
    id: DatabaseId,
    tables: Vec<Table>,
    /// Keyed by full name and by alias; both keys resolve to the same table.
    table_index: HashMap<String, TableId>,
    refs: Vec<Reference>,
    enums: Vec<Enum>,
    table_groups: Vec<TableGroup>,
    sticky_notes: Vec<StickyNote>,
    project: Option<Project>,
    allow_properties: bool,
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}

impl Database {
    pub fn new() -> Self {
        Self {
            id: DatabaseId::fresh(),
            tables: Vec::new(),
            table_index: HashMap::new(),
            refs: Vec::new(),
            enums: Vec::new(),
            table_groups: Vec::new(),
            sticky_notes: Vec::new(),
            project: None,
            allow_properties: false,
        }
    }

    /// Whether column properties are carried into rendered output.
    pub fn with_properties(mut self, allow: bool) -> Self {
        self.allow_properties = allow;
        self
    }

    pub fn id(&self) -> DatabaseId {
        self.id
    }

    pub fn allow_properties(&self) -> bool {
        self.allow_properties
    }

    // ---- read surface, insertion ordered ----

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// Look up a table by full name or alias.
    pub fn table(&self, key: &str) -> Option<&Table> {
        self.table_index
            .get(key)
            .and_then(|id| self.table_by_id(*id))
    }

    pub fn table_by_id(&self, id: TableId) -> Option<&Table> {
        self.tables.iter().find(|t| t.id() == id)
    }

    pub fn refs(&self) -> &[Reference] {
        &self.refs
    }

    pub fn enums(&self) -> &[Enum] {
        &self.enums
    }

    pub fn table_groups(&self) -> &[TableGroup] {
        &self.table_groups
    }

    pub fn sticky_notes(&self) -> &[StickyNote] {
        &self.sticky_notes
    }

    pub fn project(&self) -> Option<&Project> {
        self.project.as_ref()
    }

    pub fn owns_table(&self, id: TableId) -> bool {
        self.tables.iter().any(|t| t.id() == id)
    }

    // ---- generic dispatch ----

    /// Route `entity` to its kind-specific `add_*`.
    ///
    /// Adding a Project through here drops the project it replaces; call
    /// [`Database::add_project`] to get the detached one back.
    pub fn add(&mut self, entity: impl Into<Entity>) -> Result<EntityId, ValidationError> {
        match entity.into() {
            Entity::Table(t) => self.add_table(t).map(EntityId::Table),
            Entity::Reference(r) => self.add_reference(r).map(EntityId::Reference),
            Entity::Enum(e) => self.add_enum(e).map(EntityId::Enum),
            Entity::TableGroup(g) => self.add_table_group(g).map(EntityId::TableGroup),
            Entity::Project(p) => {
                let id = p.id();
                self.add_project(p);
                Ok(EntityId::Project(id))
            }
            Entity::StickyNote(n) => Ok(EntityId::StickyNote(self.add_sticky_note(n))),
            Entity::Column(c) => Err(ValidationError::new(format!(
                "Unsupported type Column ({}): columns are added to tables",
                c.name
            ))),
        }
    }

    /// Add every entity or none of them.
    ///
    /// Entities are staged against a copy of this Database; on the first
    /// failure the copy is discarded and `self` is left untouched.
    pub fn add_all<I>(&mut self, entities: I) -> Result<Vec<EntityId>, ValidationError>
    where
        I: IntoIterator,
        I::Item: Into<Entity>,
    {
        let mut staged = self.clone();
        let ids = entities
            .into_iter()
            .map(|e| staged.add(e))
            .collect::<Result<Vec<_>, _>>()?;
        *self = staged;
        Ok(ids)
    }

    pub fn delete(&mut self, id: EntityId) -> Result<Entity, ValidationError> {
        match id {
            EntityId::Table(id) => self.delete_table(id).map(Entity::Table),
            EntityId::Reference(id) => self.delete_reference(id).map(Entity::Reference),
            EntityId::Enum(id) => self.delete_enum(id).map(Entity::Enum),
            EntityId::TableGroup(id) => self.delete_table_group(id).map(Entity::TableGroup),
            EntityId::Project(id) => match &self.project {
                Some(p) if p.id() != id => Err(ValidationError::new(
                    "Project is not the current project of the database",
                )),
                _ => self.delete_project().map(Entity::Project),
            },
            EntityId::StickyNote(id) => self.delete_sticky_note(id).map(Entity::StickyNote),
        }
    }

    // ---- tables ----

    pub fn add_table(&mut self, mut table: Table) -> Result<TableId, ValidationError> {
        let full_name = table.full_name();
        if self.owns_table(table.id()) {
            return Err(ValidationError::new(format!(
                "Table {} is already in the database",
                full_name
            )));
        }
        if table.database().is_some() {
            return Err(ValidationError::new(format!(
                "Table {} belongs to another database",
                full_name
            )));
        }
        if self.table_index.contains_key(&full_name) {
            return Err(ValidationError::new(format!(
                "Table {} is already in the database",
                full_name
            )));
        }
        if let Some(alias) = &table.alias {
            if self.table_index.contains_key(alias) {
                return Err(ValidationError::new(format!(
                    "Table {} is already in the database",
                    alias
                )));
            }
        }

        let id = table.id();
        table.set_database(Some(self.id));
        self.table_index.insert(full_name.clone(), id);
        if let Some(alias) = &table.alias {
            self.table_index.insert(alias.clone(), id);
        }
        self.tables.push(table);
        debug!(table = %full_name, "table added");
        Ok(id)
    }

    pub fn delete_table(&mut self, id: TableId) -> Result<Table, ValidationError> {
        let pos = self
            .tables
            .iter()
            .position(|t| t.id() == id)
            .ok_or_else(|| ValidationError::new("Table is not in the database"))?;
        let mut table = self.tables.remove(pos);
        self.table_index.remove(&table.full_name());
        if let Some(alias) = &table.alias {
            self.table_index.remove(alias);
        }
        table.set_database(None);
        debug!(table = %table.full_name(), "table deleted");
        Ok(table)
    }

    // ---- references ----

    pub fn add_reference(&mut self, mut reference: Reference) -> Result<ReferenceId, ValidationError> {
        if self.refs.iter().any(|r| r.id() == reference.id()) {
            return Err(ValidationError::new("Reference is already in the database"));
        }
        if reference.database().is_some() {
            return Err(ValidationError::new(
                "Reference belongs to another database",
            ));
        }
        if !reference.endpoints().any(|k| self.owns_table(k.table)) {
            return Err(ValidationError::new(
                "Cannot add reference. At least one of the referenced tables \
                 should belong to this database",
            ));
        }

        let id = reference.id();
        reference.set_database(Some(self.id));
        self.refs.push(reference);
        debug!(count = self.refs.len(), "reference added");
        Ok(id)
    }

    pub fn delete_reference(&mut self, id: ReferenceId) -> Result<Reference, ValidationError> {
        let pos = self
            .refs
            .iter()
            .position(|r| r.id() == id)
            .ok_or_else(|| ValidationError::new("Reference is not in the database"))?;
        let mut reference = self.refs.remove(pos);
        reference.set_database(None);
        Ok(reference)
    }

    // ---- enums ----

    pub fn add_enum(&mut self, mut item: Enum) -> Result<EnumId, ValidationError> {
        if self.enums.iter().any(|e| e.id() == item.id()) {
            return Err(ValidationError::new(format!(
                "Enum {} is already in the database",
                item.name
            )));
        }
        if item.database().is_some() {
            return Err(ValidationError::new(format!(
                "Enum {} belongs to another database",
                item.name
            )));
        }
        if self
            .enums
            .iter()
            .any(|e| e.name == item.name && e.schema == item.schema)
        {
            return Err(ValidationError::new(format!(
                "Enum {}.{} is already in the database",
                item.schema, item.name
            )));
        }

        let id = item.id();
        item.set_database(Some(self.id));
        debug!(name = %item.name, schema = %item.schema, "enum added");
        self.enums.push(item);
        Ok(id)
    }

    pub fn delete_enum(&mut self, id: EnumId) -> Result<Enum, ValidationError> {
        let pos = self
            .enums
            .iter()
            .position(|e| e.id() == id)
            .ok_or_else(|| ValidationError::new("Enum is not in the database"))?;
        let mut item = self.enums.remove(pos);
        item.set_database(None);
        Ok(item)
    }

    // ---- table groups ----

    pub fn add_table_group(&mut self, mut group: TableGroup) -> Result<TableGroupId, ValidationError> {
        if self.table_groups.iter().any(|g| g.id() == group.id()) {
            return Err(ValidationError::new(format!(
                "TableGroup {} is already in the database",
                group.name
            )));
        }
        if group.database().is_some() {
            return Err(ValidationError::new(format!(
                "TableGroup {} belongs to another database",
                group.name
            )));
        }
        if self.table_groups.iter().any(|g| g.name == group.name) {
            return Err(ValidationError::new(format!(
                "TableGroup {} is already in the database",
                group.name
            )));
        }

        let id = group.id();
        group.set_database(Some(self.id));
        debug!(name = %group.name, "table group added");
        self.table_groups.push(group);
        Ok(id)
    }

    pub fn delete_table_group(&mut self, id: TableGroupId) -> Result<TableGroup, ValidationError> {
        let pos = self
            .table_groups
            .iter()
            .position(|g| g.id() == id)
            .ok_or_else(|| ValidationError::new("TableGroup is not in the database"))?;
        let mut group = self.table_groups.remove(pos);
        group.set_database(None);
        Ok(group)
    }

    // ---- project ----

    /// Install `project`, returning the detached previous one if any.
    pub fn add_project(&mut self, mut project: Project) -> Option<Project> {
        let previous = self.delete_project().ok();
        if let Some(p) = &previous {
            debug!(name = %p.name, "previous project detached");
        }
        project.set_database(Some(self.id));
        self.project = Some(project);
        previous
    }

    pub fn delete_project(&mut self) -> Result<Project, ValidationError> {
        let mut project = self
            .project
            .take()
            .ok_or_else(|| ValidationError::new("Project is not set"))?;
        project.set_database(None);
        Ok(project)
    }

    // ---- sticky notes ----

    pub fn add_sticky_note(&mut self, mut note: StickyNote) -> StickyNoteId {
        let id = note.id();
        note.set_database(Some(self.id));
        self.sticky_notes.push(note);
        id
    }

    pub fn delete_sticky_note(&mut self, id: StickyNoteId) -> Result<StickyNote, ValidationError> {
        let pos = self
            .sticky_notes
            .iter()
            .position(|n| n.id() == id)
            .ok_or_else(|| ValidationError::new("Note is not in the database"))?;
        let mut note = self.sticky_notes.remove(pos);
        note.set_database(None);
        Ok(note)
    }

    // ---- rendering ----

    pub fn render_with(&self, renderer: &impl Renderer) -> String {
        renderer.render_db(self)
    }

    pub fn sql(&self) -> String {
        self.render_with(&SqlRenderer)
    }

    pub fn dbml(&self) -> String {
        self.render_with(&DbmlRenderer::default())
    }
}

impl Index<usize> for Database {
    type Output = Table;

    fn index(&self, index: usize) -> &Table {
        &self.tables[index]
    }
}

impl Index<&str> for Database {
    type Output = Table;

    fn index(&self, key: &str) -> &Table {
        match self.table(key) {
            Some(t) => t,
            None => panic!("no table named {key}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ColumnKey, EnumItem, QualifiedName, RefKind};

    fn table(name: &str, column: &str) -> Table {
        let mut t = Table::new(QualifiedName::new(name));
        t.add_column(Column::new(column, "integer")).unwrap();
        t
    }

    fn key(t: &Table, column: &str) -> ColumnKey {
        t.column_key(column).unwrap()
    }

    #[test]
    fn test_add_table() {
        let mut db = Database::new();
        let id = db.add_table(table("test_table", "test")).unwrap();
        assert_eq!(db.tables().len(), 1);
        assert_eq!(db[0].id(), id);
        assert_eq!(db["test_table"].database(), Some(db.id()));
    }

    #[test]
    fn test_add_table_same_name_rejected() {
        let mut db = Database::new();
        db.add_table(table("test_table", "test")).unwrap();
        assert!(db.add_table(table("test_table", "other")).is_err());
        assert_eq!(db.tables().len(), 1);
    }

    #[test]
    fn test_add_table_clone_rejected() {
        let mut db = Database::new();
        let t = table("test_table", "test");
        db.add_table(t.clone()).unwrap();
        let err = db.add_table(t).unwrap_err();
        assert!(err.0.contains("already in the database"));
    }

    #[test]
    fn test_table_owned_elsewhere_rejected() {
        let mut db1 = Database::new();
        let mut db2 = Database::new();
        let id = db1.add_table(table("a", "id")).unwrap();
        let owned = db1.table_by_id(id).unwrap().clone();
        assert!(db2.add_table(owned).is_err());
    }

    #[test]
    fn test_alias_uniqueness() {
        let mut db = Database::new();
        db.add_table(table("users", "id").with_alias("u")).unwrap();

        // alias collides with existing alias
        assert!(db.add_table(table("members", "id").with_alias("u")).is_err());
        // full name collides with existing alias
        assert!(db.add_table(table("u", "id")).is_err());
        // alias collides with existing full name
        assert!(db.add_table(table("people", "id").with_alias("users")).is_err());

        let id = db.add_table(table("orders", "id").with_alias("o")).unwrap();
        assert_eq!(db.table("orders").map(|t| t.id()), Some(id));
        assert_eq!(db.table("o").map(|t| t.id()), Some(id));
    }

    #[test]
    fn test_schema_qualified_names_are_distinct() {
        let mut db = Database::new();
        db.add_table(table("users", "id")).unwrap();
        let mut other = Table::new(QualifiedName::with_schema("billing", "users"));
        other.add_column(Column::new("id", "integer")).unwrap();
        db.add_table(other).unwrap();
        assert!(db.table("billing.users").is_some());
        assert_eq!(db.tables().len(), 2);
    }

    #[test]
    fn test_delete_table() {
        let mut db = Database::new();
        let id = db.add_table(table("users", "id").with_alias("u")).unwrap();
        let t = db.delete_table(id).unwrap();
        assert_eq!(t.database(), None);
        assert!(db.table("users").is_none());
        assert!(db.table("u").is_none());
        assert!(db.tables().is_empty());
        // both keys are free again
        db.add_table(t).unwrap();
    }

    #[test]
    fn test_delete_missing_table() {
        let mut db = Database::new();
        let t = table("users", "id");
        assert!(db.delete_table(t.id()).is_err());
        assert_eq!(t.database(), None);
    }

    #[test]
    fn test_add_reference() {
        let mut db = Database::new();
        let t1 = table("test_table", "test");
        let t2 = table("test_table2", "test2");
        let r = Reference::new(RefKind::ManyToOne, vec![key(&t1, "test")], vec![key(&t2, "test2")])
            .unwrap();
        db.add_table(t1).unwrap();
        db.add_table(t2).unwrap();
        let id = db.add_reference(r).unwrap();
        assert_eq!(db.refs()[0].id(), id);
        assert_eq!(db.refs()[0].database(), Some(db.id()));
    }

    #[test]
    fn test_add_reference_foreign_tables_rejected() {
        let mut db = Database::new();
        let mut other = Database::new();
        let t1 = table("a", "id");
        let t2 = table("b", "a_id");
        let r = Reference::new(RefKind::OneToMany, vec![key(&t1, "id")], vec![key(&t2, "a_id")])
            .unwrap();
        other.add_table(t1).unwrap();
        other.add_table(t2).unwrap();
        assert!(db.add_reference(r.clone()).is_err());
        assert!(db.refs().is_empty());
        other.add_reference(r).unwrap();
    }

    #[test]
    fn test_add_reference_one_side_dangling() {
        let mut db = Database::new();
        let local = table("a", "id");
        let remote = table("b", "a_id");
        let r = Reference::new(RefKind::OneToMany, vec![key(&local, "id")], vec![key(&remote, "a_id")])
            .unwrap();
        db.add_table(local).unwrap();
        db.add_reference(r).unwrap();
    }

    #[test]
    fn test_add_reference_twice_rejected() {
        let mut db = Database::new();
        let t = table("a", "id");
        let r = Reference::new(RefKind::OneToOne, vec![key(&t, "id")], vec![key(&t, "id")]).unwrap();
        db.add_table(t).unwrap();
        db.add_reference(r.clone()).unwrap();
        assert!(db.add_reference(r).is_err());
        assert_eq!(db.refs().len(), 1);
    }

    #[test]
    fn test_delete_reference() {
        let mut db = Database::new();
        let t = table("a", "id");
        let r = Reference::new(RefKind::OneToOne, vec![key(&t, "id")], vec![key(&t, "id")]).unwrap();
        let orphan = r.clone();
        db.add_table(t).unwrap();
        let id = db.add_reference(r).unwrap();
        let removed = db.delete_reference(id).unwrap();
        assert_eq!(removed.database(), None);
        assert!(db.refs().is_empty());
        assert!(db.delete_reference(orphan.id()).is_err());
        assert_eq!(orphan.database(), None);
    }

    #[test]
    fn test_enum_uniqueness_by_name_and_schema() {
        let mut db = Database::new();
        db.add_enum(Enum::new("mood", vec![EnumItem::new("happy")])).unwrap();
        db.add_enum(Enum::new("mood", vec![EnumItem::new("sad")]).with_schema("other"))
            .unwrap();
        assert!(db.add_enum(Enum::new("mood", vec![])).is_err());
        assert_eq!(db.enums().len(), 2);
    }

    #[test]
    fn test_delete_enum() {
        let mut db = Database::new();
        let e = Enum::new("mood", vec![EnumItem::new("a"), EnumItem::new("b")]);
        let stray = Enum::new("stray", vec![]);
        let id = db.add_enum(e).unwrap();
        assert_eq!(db.delete_enum(id).unwrap().database(), None);
        assert!(db.delete_enum(stray.id()).is_err());
        assert_eq!(stray.database(), None);
    }

    #[test]
    fn test_table_group_uniqueness() {
        let mut db = Database::new();
        let g = TableGroup::new("core", vec![]);
        db.add_table_group(g.clone()).unwrap();
        assert!(db.add_table_group(g).is_err());
        assert!(db.add_table_group(TableGroup::new("core", vec![])).is_err());
        let id = db.add_table_group(TableGroup::new("extra", vec![])).unwrap();
        assert_eq!(db.delete_table_group(id).unwrap().database(), None);
        assert_eq!(db.table_groups().len(), 1);
    }

    #[test]
    fn test_add_another_project_detaches_first() {
        let mut db = Database::new();
        assert!(db.add_project(Project::new("first")).is_none());
        let first = db.add_project(Project::new("second")).unwrap();
        assert_eq!(first.name, "first");
        assert_eq!(first.database(), None);
        let current = db.project().unwrap();
        assert_eq!(current.name, "second");
        assert_eq!(current.database(), Some(db.id()));
    }

    #[test]
    fn test_delete_project() {
        let mut db = Database::new();
        assert!(db.delete_project().is_err());
        db.add_project(Project::new("p"));
        let p = db.delete_project().unwrap();
        assert_eq!(p.database(), None);
        assert!(db.project().is_none());
    }

    #[test]
    fn test_sticky_notes() {
        let mut db = Database::new();
        let note = StickyNote::new("todo", "write docs");
        let stray = StickyNote::new("stray", "");
        let id = db.add_sticky_note(note);
        assert_eq!(db.sticky_notes()[0].database(), Some(db.id()));
        assert!(db.delete_sticky_note(stray.id()).is_err());
        assert_eq!(db.delete_sticky_note(id).unwrap().database(), None);
    }

    #[test]
    fn test_generic_dispatch() {
        let mut db = Database::new();
        let id = db.add(table("users", "id")).unwrap();
        assert!(matches!(id, EntityId::Table(_)));
        let p = db.add(Project::new("p")).unwrap();
        assert!(matches!(db.delete(p).unwrap(), Entity::Project(_)));
        assert!(matches!(db.delete(id).unwrap(), Entity::Table(_)));
    }

    #[test]
    fn test_generic_add_replaces_project() {
        let mut db = Database::new();
        let first = Project::new("first");
        let first_id = first.id();
        db.add(first).unwrap();
        let second = db.add(Project::new("second")).unwrap();
        assert_eq!(db.project().map(|p| p.name.as_str()), Some("second"));
        assert!(db.delete(EntityId::Project(first_id)).is_err());
        assert!(matches!(db.delete(second).unwrap(), Entity::Project(p) if p.name == "second"));

        db.add(Project::new("third")).unwrap();
        let detached = db.add_project(Project::new("fourth")).unwrap();
        assert_eq!(detached.name, "third");
        assert_eq!(detached.database(), None);
    }

    #[test]
    fn test_column_is_unsupported() {
        let mut db = Database::new();
        let err = db.add(Column::new("id", "integer")).unwrap_err();
        assert!(err.0.starts_with("Unsupported type Column"));
    }

    #[test]
    fn test_add_all_is_all_or_nothing() {
        let mut db = Database::new();
        let result = db.add_all(vec![
            Entity::from(table("a", "id")),
            Entity::from(Enum::new("mood", vec![])),
            Entity::from(table("a", "other")),
        ]);
        assert!(result.is_err());
        assert!(db.tables().is_empty());
        assert!(db.enums().is_empty());

        let ids = db
            .add_all(vec![
                Entity::from(table("a", "id")),
                Entity::from(Enum::new("mood", vec![])),
            ])
            .unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(db.tables().len(), 1);
        assert_eq!(db.enums().len(), 1);
    }

    #[test]
    fn test_users_orders_scenario() {
        let mut db = Database::new();
        let mut users = Table::new(QualifiedName::new("users"));
        let mut id = Column::new("id", "integer");
        id.pk = true;
        users.add_column(id).unwrap();
        let orders = table("orders", "user_id");
        let r = Reference::new(
            RefKind::ManyToOne,
            vec![key(&orders, "user_id")],
            vec![key(&users, "id")],
        )
        .unwrap();

        db.add_table(users).unwrap();
        db.add_table(orders).unwrap();
        let ref_id = db.add_reference(r).unwrap();

        let names: Vec<_> = db.tables().iter().map(|t| t.full_name()).collect();
        assert_eq!(names, vec!["users", "orders"]);
        let stored = db.refs().iter().find(|r| r.id() == ref_id).unwrap();
        assert_eq!(stored.kind, RefKind::ManyToOne);
        assert_eq!(stored.col2()[0].column, "id");
    }
}
