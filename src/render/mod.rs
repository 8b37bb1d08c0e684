//! Renderers turning a finished [`Database`] into text.

mod dbml;
mod sql;

pub use dbml::DbmlRenderer;
pub use sql::SqlRenderer;

use crate::database::Database;

/// A renderer takes a fully built Database and returns text. Output
/// follows the Database's insertion order, so it is deterministic.
pub trait Renderer {
    fn render_db(&self, db: &Database) -> String;
}

/// Single-quoted literal with `\` escapes, as the lexer reads it back.
pub(crate) fn quote_string(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}
