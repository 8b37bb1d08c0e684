//! Typed model entities owned by a [`Database`](crate::database::Database).

mod entities;
mod reference;
mod table;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

pub use entities::{Enum, EnumItem, Project, StickyNote, TableGroup};
pub use reference::{ColumnKey, RefKind, Reference};
pub use table::{Column, DefaultValue, Index, IndexSubject, Table};

/// The single model validation failure.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn fresh_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

macro_rules! identity {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
            pub struct $name(u64);

            impl $name {
                pub(crate) fn fresh() -> Self {
                    Self(fresh_id())
                }
            }
        )*
    };
}

identity! {
    /// Identity of a Database; entities hold it as their owner link.
    DatabaseId,
    TableId,
    ReferenceId,
    EnumId,
    TableGroupId,
    ProjectId,
    StickyNoteId,
}

pub const DEFAULT_SCHEMA: &str = "public";

/// Schema-plus-name identity of a table or enum.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    pub schema: String,
    pub name: String,
}

impl QualifiedName {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: DEFAULT_SCHEMA.to_string(),
            name: name.into(),
        }
    }

    pub fn with_schema(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }

    /// `name` for the default schema, `schema.name` otherwise.
    pub fn full_name(&self) -> String {
        if self.schema == DEFAULT_SCHEMA {
            self.name.clone()
        } else {
            format!("{}.{}", self.schema, self.name)
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_name() {
        assert_eq!(QualifiedName::new("users").full_name(), "users");
        assert_eq!(
            QualifiedName::with_schema("billing", "users").full_name(),
            "billing.users"
        );
    }

    #[test]
    fn test_ids_are_distinct() {
        assert_ne!(TableId::fresh(), TableId::fresh());
    }
}
