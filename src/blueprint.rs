//! Loosely validated records produced by the grammar, one per construct.
//!
//! Names are still textual here; the resolver turns them into linked model
//! entities.

use crate::model::{DefaultValue, IndexSubject, QualifiedName, RefKind};

/// One side of a relationship as written in source: `table.col` or
/// `schema.table.(a, b)`.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointBlueprint {
    pub table: QualifiedName,
    pub columns: Vec<String>,
}

/// `ref: > table.col` inside a column's settings.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineRefBlueprint {
    pub kind: RefKind,
    pub target: EndpointBlueprint,
}

/// One entry of a column settings block.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnSetting {
    /// `not null` is `true`, `null` is `false`.
    Nullability(bool),
    PrimaryKey,
    Unique,
    Increment,
    Note(String),
    Default(DefaultValue),
    Ref(InlineRefBlueprint),
    Property(String, String),
}

/// The fixed set of outputs a settings block can produce.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColumnSettings {
    pub not_null: Option<bool>,
    pub pk: bool,
    pub unique: bool,
    pub autoinc: bool,
    pub note: Option<String>,
    pub default: Option<DefaultValue>,
    pub properties: Vec<(String, String)>,
    pub refs: Vec<InlineRefBlueprint>,
}

impl ColumnSettings {
    /// Fold one setting into the result.
    ///
    /// Returns the previous nullability when `setting` contradicts it.
    pub fn apply(&mut self, setting: ColumnSetting) -> Result<(), bool> {
        match setting {
            ColumnSetting::Nullability(not_null) => match self.not_null {
                Some(prev) if prev != not_null => return Err(prev),
                _ => self.not_null = Some(not_null),
            },
            ColumnSetting::PrimaryKey => self.pk = true,
            ColumnSetting::Unique => self.unique = true,
            ColumnSetting::Increment => self.autoinc = true,
            ColumnSetting::Note(note) => self.note = Some(note),
            ColumnSetting::Default(value) => self.default = Some(value),
            ColumnSetting::Ref(r) => self.refs.push(r),
            ColumnSetting::Property(key, value) => self.properties.push((key, value)),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnBlueprint {
    pub name: String,
    pub typ: String,
    pub settings: ColumnSettings,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct IndexBlueprint {
    pub subjects: Vec<IndexSubject>,
    pub pk: bool,
    pub unique: bool,
    pub name: Option<String>,
    pub kind: Option<String>,
    pub note: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableBlueprint {
    pub name: QualifiedName,
    pub alias: Option<String>,
    pub columns: Vec<ColumnBlueprint>,
    pub indexes: Vec<IndexBlueprint>,
    pub note: Option<String>,
    pub header_color: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceBlueprint {
    pub name: Option<String>,
    pub kind: RefKind,
    pub from: EndpointBlueprint,
    pub to: EndpointBlueprint,
    pub on_delete: Option<String>,
    pub on_update: Option<String>,
    pub comment: Option<String>,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumItemBlueprint {
    pub name: String,
    pub note: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumBlueprint {
    pub name: QualifiedName,
    pub items: Vec<EnumItemBlueprint>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableGroupBlueprint {
    pub name: String,
    pub tables: Vec<QualifiedName>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectBlueprint {
    pub name: String,
    pub items: Vec<(String, String)>,
    pub note: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NoteBlueprint {
    pub name: String,
    pub text: String,
}

/// Everything parsed from one source, in declaration order per kind.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SchemaBlueprint {
    pub tables: Vec<TableBlueprint>,
    pub refs: Vec<ReferenceBlueprint>,
    pub enums: Vec<EnumBlueprint>,
    pub table_groups: Vec<TableGroupBlueprint>,
    pub projects: Vec<ProjectBlueprint>,
    pub notes: Vec<NoteBlueprint>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_settings() {
        let mut settings = ColumnSettings::default();
        settings.apply(ColumnSetting::Nullability(true)).unwrap();
        settings.apply(ColumnSetting::Unique).unwrap();
        settings
            .apply(ColumnSetting::Property("a".into(), "1".into()))
            .unwrap();
        settings
            .apply(ColumnSetting::Property("a".into(), "2".into()))
            .unwrap();
        assert_eq!(settings.not_null, Some(true));
        assert!(settings.unique);
        assert!(!settings.pk);
        assert_eq!(
            settings.properties,
            vec![("a".into(), "1".into()), ("a".into(), "2".into())]
        );
    }

    #[test]
    fn test_conflicting_nullability() {
        let mut settings = ColumnSettings::default();
        settings.apply(ColumnSetting::Nullability(false)).unwrap();
        settings.apply(ColumnSetting::Nullability(false)).unwrap();
        assert_eq!(settings.apply(ColumnSetting::Nullability(true)), Err(false));
    }
}
