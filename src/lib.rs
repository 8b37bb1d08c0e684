pub mod blueprint;
pub mod config;
pub mod database;
pub mod lexer;
pub mod model;
pub mod parser;
pub mod render;
pub mod resolver;

use wasm_bindgen::prelude::*;

pub use config::{ConfigError, GrammarConfig};
pub use database::{Database, Entity, EntityId};
pub use model::ValidationError;
pub use parser::ParseError;
pub use resolver::ResolveError;

use parser::Parser;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// Parse source text and resolve it into a validated Database.
pub fn parse_dbml(source: &str, config: &GrammarConfig) -> Result<Database, Error> {
    let mut parser = Parser::new(source, config)?;
    let schema = parser.parse()?;
    Ok(resolver::resolve(schema, config.allow_properties())?)
}

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

/// Compile DBML source to PostgreSQL DDL
#[wasm_bindgen(js_name = "dbmlToSql")]
pub fn dbml_to_sql(source: &str, allow_properties: bool) -> Result<String, String> {
    let config = GrammarConfig::line_oriented().with_properties(allow_properties);
    let db = parse_dbml(source, &config).map_err(|e| e.to_string())?;
    Ok(db.sql())
}

/// Normalize DBML source by parsing and rendering it back
#[wasm_bindgen(js_name = "dbmlToDbml")]
pub fn dbml_to_dbml(source: &str, allow_properties: bool) -> Result<String, String> {
    let config = GrammarConfig::line_oriented().with_properties(allow_properties);
    let db = parse_dbml(source, &config).map_err(|e| e.to_string())?;
    Ok(db.dbml())
}
