use super::{
    DEFAULT_SCHEMA, DatabaseId, EnumId, ProjectId, StickyNoteId, TableGroupId, TableId,
};

#[derive(Debug, Clone, PartialEq)]
pub struct EnumItem {
    pub name: String,
    pub note: Option<String>,
    pub comment: Option<String>,
}

impl EnumItem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            note: None,
            comment: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enum {
    id: EnumId,
    pub name: String,
    pub schema: String,
    pub items: Vec<EnumItem>,
    pub comment: Option<String>,
    database: Option<DatabaseId>,
}

impl Enum {
    pub fn new(name: impl Into<String>, items: Vec<EnumItem>) -> Self {
        Self {
            id: EnumId::fresh(),
            name: name.into(),
            schema: DEFAULT_SCHEMA.to_string(),
            items,
            comment: None,
            database: None,
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    pub fn id(&self) -> EnumId {
        self.id
    }

    pub fn database(&self) -> Option<DatabaseId> {
        self.database
    }

    pub(crate) fn set_database(&mut self, db: Option<DatabaseId>) {
        self.database = db;
    }
}

/// Named set of tables. Membership only; the Database owns the tables.
#[derive(Debug, Clone, PartialEq)]
pub struct TableGroup {
    id: TableGroupId,
    pub name: String,
    pub tables: Vec<TableId>,
    pub comment: Option<String>,
    database: Option<DatabaseId>,
}

impl TableGroup {
    pub fn new(name: impl Into<String>, tables: Vec<TableId>) -> Self {
        Self {
            id: TableGroupId::fresh(),
            name: name.into(),
            tables,
            comment: None,
            database: None,
        }
    }

    pub fn id(&self) -> TableGroupId {
        self.id
    }

    pub fn database(&self) -> Option<DatabaseId> {
        self.database
    }

    pub(crate) fn set_database(&mut self, db: Option<DatabaseId>) {
        self.database = db;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    id: ProjectId,
    pub name: String,
    /// `key: 'value'` pairs in source order.
    pub items: Vec<(String, String)>,
    pub note: Option<String>,
    pub comment: Option<String>,
    database: Option<DatabaseId>,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ProjectId::fresh(),
            name: name.into(),
            items: Vec::new(),
            note: None,
            comment: None,
            database: None,
        }
    }

    pub fn id(&self) -> ProjectId {
        self.id
    }

    pub fn database(&self) -> Option<DatabaseId> {
        self.database
    }

    pub(crate) fn set_database(&mut self, db: Option<DatabaseId>) {
        self.database = db;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StickyNote {
    id: StickyNoteId,
    pub name: String,
    pub text: String,
    database: Option<DatabaseId>,
}

impl StickyNote {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: StickyNoteId::fresh(),
            name: name.into(),
            text: text.into(),
            database: None,
        }
    }

    pub fn id(&self) -> StickyNoteId {
        self.id
    }

    pub fn database(&self) -> Option<DatabaseId> {
        self.database
    }

    pub(crate) fn set_database(&mut self, db: Option<DatabaseId>) {
        self.database = db;
    }
}
