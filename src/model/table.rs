use std::fmt;

use super::{DatabaseId, QualifiedName, TableId, ValidationError};
use super::reference::ColumnKey;

/// Typed column default.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    Str(String),
    /// Raw SQL expression from a backtick literal.
    Expr(String),
    Bool(bool),
    Null,
    Int(i64),
    Float(f64),
}

impl fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Str(s) => f.write_str(&crate::render::quote_string(s)),
            DefaultValue::Expr(e) => write!(f, "`{}`", e),
            DefaultValue::Bool(b) => write!(f, "{}", b),
            DefaultValue::Null => f.write_str("null"),
            DefaultValue::Int(n) => write!(f, "{}", n),
            DefaultValue::Float(x) => f.write_str(&fixed_point(*x)),
        }
    }
}

/// Plain decimal notation that always keeps a decimal point, so a float
/// default reads back as a float.
fn fixed_point(x: f64) -> String {
    let s = x.to_string();
    if s.contains('.') || !x.is_finite() {
        s
    } else {
        format!("{}.0", s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub typ: String,
    pub pk: bool,
    pub unique: bool,
    pub not_null: bool,
    pub autoinc: bool,
    pub default: Option<DefaultValue>,
    pub note: Option<String>,
    /// Source comments attached to the column line.
    pub comment: Option<String>,
    /// Extended properties in appearance order; duplicate keys are kept.
    pub properties: Vec<(String, String)>,
    table: Option<TableId>,
}

impl Column {
    pub fn new(name: impl Into<String>, typ: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            typ: typ.into(),
            pk: false,
            unique: false,
            not_null: false,
            autoinc: false,
            default: None,
            note: None,
            comment: None,
            properties: Vec::new(),
            table: None,
        }
    }

    /// Owning table, set by [`Table::add_column`].
    pub fn table(&self) -> Option<TableId> {
        self.table
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndexSubject {
    Column(String),
    Expr(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Index {
    pub subjects: Vec<IndexSubject>,
    pub pk: bool,
    pub unique: bool,
    pub name: Option<String>,
    /// Index method such as `btree` or `hash`.
    pub kind: Option<String>,
    pub note: Option<String>,
    pub comment: Option<String>,
}

impl Index {
    pub fn new(subjects: Vec<IndexSubject>) -> Self {
        Self {
            subjects,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    id: TableId,
    pub name: QualifiedName,
    pub alias: Option<String>,
    columns: Vec<Column>,
    indexes: Vec<Index>,
    pub note: Option<String>,
    pub header_color: Option<String>,
    pub comment: Option<String>,
    database: Option<DatabaseId>,
}

impl Table {
    pub fn new(name: QualifiedName) -> Self {
        Self {
            id: TableId::fresh(),
            name,
            alias: None,
            columns: Vec::new(),
            indexes: Vec::new(),
            note: None,
            header_color: None,
            comment: None,
            database: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn id(&self) -> TableId {
        self.id
    }

    pub fn full_name(&self) -> String {
        self.name.full_name()
    }

    pub fn database(&self) -> Option<DatabaseId> {
        self.database
    }

    pub(crate) fn set_database(&mut self, db: Option<DatabaseId>) {
        self.database = db;
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn indexes(&self) -> &[Index] {
        &self.indexes
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Endpoint handle for a column of this table, for building references.
    pub fn column_key(&self, name: &str) -> Option<ColumnKey> {
        self.column(name).map(|c| ColumnKey {
            table: self.id,
            table_name: self.name.clone(),
            column: c.name.clone(),
        })
    }

    pub fn add_column(&mut self, mut column: Column) -> Result<(), ValidationError> {
        if column.table.is_some_and(|t| t != self.id) {
            return Err(ValidationError::new(format!(
                "Column {} already belongs to another table",
                column.name
            )));
        }
        if self.column(&column.name).is_some() {
            return Err(ValidationError::new(format!(
                "Column {} is already in table {}",
                column.name,
                self.full_name()
            )));
        }
        column.table = Some(self.id);
        self.columns.push(column);
        Ok(())
    }

    pub fn delete_column(&mut self, name: &str) -> Result<Column, ValidationError> {
        let pos = self
            .columns
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| {
                ValidationError::new(format!(
                    "Column {} is not in table {}",
                    name,
                    self.full_name()
                ))
            })?;
        let mut column = self.columns.remove(pos);
        column.table = None;
        Ok(column)
    }

    /// Add an index; column subjects must name columns of this table.
    pub fn add_index(&mut self, index: Index) -> Result<(), ValidationError> {
        if index.subjects.is_empty() {
            return Err(ValidationError::new("Index must have at least one subject"));
        }
        for subject in &index.subjects {
            if let IndexSubject::Column(name) = subject {
                if self.column(name).is_none() {
                    return Err(ValidationError::new(format!(
                        "Cannot add index: column {} is not in table {}",
                        name,
                        self.full_name()
                    )));
                }
            }
        }
        self.indexes.push(index);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_column_sets_owner() {
        let mut table = Table::new(QualifiedName::new("users"));
        table.add_column(Column::new("id", "integer")).unwrap();
        assert_eq!(table.columns()[0].table(), Some(table.id()));
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let mut table = Table::new(QualifiedName::new("users"));
        table.add_column(Column::new("id", "integer")).unwrap();
        assert!(table.add_column(Column::new("id", "bigint")).is_err());
        assert_eq!(table.columns().len(), 1);
    }

    #[test]
    fn test_column_of_other_table_rejected() {
        let mut a = Table::new(QualifiedName::new("a"));
        let mut b = Table::new(QualifiedName::new("b"));
        a.add_column(Column::new("id", "integer")).unwrap();
        let stolen = a.columns()[0].clone();
        assert!(b.add_column(stolen).is_err());
    }

    #[test]
    fn test_delete_column_unsets_owner() {
        let mut table = Table::new(QualifiedName::new("users"));
        table.add_column(Column::new("id", "integer")).unwrap();
        let column = table.delete_column("id").unwrap();
        assert_eq!(column.table(), None);
        assert!(table.delete_column("id").is_err());
    }

    #[test]
    fn test_index_requires_known_columns() {
        let mut table = Table::new(QualifiedName::new("users"));
        table.add_column(Column::new("id", "integer")).unwrap();
        let bad = Index::new(vec![IndexSubject::Column("missing".into())]);
        assert!(table.add_index(bad).is_err());
        let good = Index::new(vec![
            IndexSubject::Column("id".into()),
            IndexSubject::Expr("lower(id)".into()),
        ]);
        table.add_index(good).unwrap();
        assert_eq!(table.indexes().len(), 1);
    }

    #[test]
    fn test_default_display() {
        assert_eq!(DefaultValue::Float(3.0).to_string(), "3.0");
        assert_eq!(DefaultValue::Float(0.5).to_string(), "0.5");
        assert_eq!(
            DefaultValue::Float(1e20).to_string(),
            "100000000000000000000.0"
        );
        assert_eq!(DefaultValue::Float(-2.5e-3).to_string(), "-0.0025");
        assert_eq!(DefaultValue::Expr("now()".into()).to_string(), "`now()`");
        assert_eq!(DefaultValue::Str("it's".into()).to_string(), "'it\\'s'");
    }
}
