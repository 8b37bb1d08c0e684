use super::{DatabaseId, QualifiedName, ReferenceId, TableId, ValidationError};

/// Relationship cardinality symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    ManyToOne,  // >
    OneToMany,  // <
    OneToOne,   // -
    ManyToMany, // <>
}

impl RefKind {
    pub fn symbol(self) -> &'static str {
        match self {
            RefKind::ManyToOne => ">",
            RefKind::OneToMany => "<",
            RefKind::OneToOne => "-",
            RefKind::ManyToMany => "<>",
        }
    }
}

/// A column endpoint, identified by its owning table.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnKey {
    pub table: TableId,
    pub table_name: QualifiedName,
    pub column: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    id: ReferenceId,
    pub kind: RefKind,
    col1: Vec<ColumnKey>,
    col2: Vec<ColumnKey>,
    pub name: Option<String>,
    pub on_delete: Option<String>,
    pub on_update: Option<String>,
    pub comment: Option<String>,
    /// Declared inside a column's settings.
    pub inline: bool,
    database: Option<DatabaseId>,
}

impl Reference {
    pub fn new(
        kind: RefKind,
        col1: Vec<ColumnKey>,
        col2: Vec<ColumnKey>,
    ) -> Result<Self, ValidationError> {
        if col1.is_empty() || col2.is_empty() {
            return Err(ValidationError::new(
                "Reference must have at least one column on each side",
            ));
        }
        if col1.len() != col2.len() {
            return Err(ValidationError::new(format!(
                "Reference sides differ in size: {} vs {}",
                col1.len(),
                col2.len()
            )));
        }
        Ok(Self {
            id: ReferenceId::fresh(),
            kind,
            col1,
            col2,
            name: None,
            on_delete: None,
            on_update: None,
            comment: None,
            inline: false,
            database: None,
        })
    }

    pub fn id(&self) -> ReferenceId {
        self.id
    }

    pub fn col1(&self) -> &[ColumnKey] {
        &self.col1
    }

    pub fn col2(&self) -> &[ColumnKey] {
        &self.col2
    }

    pub fn endpoints(&self) -> impl Iterator<Item = &ColumnKey> {
        self.col1.iter().chain(self.col2.iter())
    }

    pub fn database(&self) -> Option<DatabaseId> {
        self.database
    }

    pub(crate) fn set_database(&mut self, db: Option<DatabaseId>) {
        self.database = db;
    }
}
