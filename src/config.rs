//! Grammar configuration threaded into lexer and parser construction.

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("Whitespace set must not contain a newline")]
    NewlineInWhitespace,
    #[error("Whitespace set is empty")]
    EmptyWhitespace,
}

/// Grammar settings shared by every construct grammar.
///
/// Newlines are never whitespace: column lines and comment lines are
/// delimited by the grammar itself.
#[derive(Debug, Clone, PartialEq)]
pub struct GrammarConfig {
    whitespace: Vec<char>,
    allow_properties: bool,
}

impl GrammarConfig {
    /// Declare the active whitespace set.
    pub fn new(whitespace: &str) -> Result<Self, ConfigError> {
        if whitespace.is_empty() {
            return Err(ConfigError::EmptyWhitespace);
        }
        if whitespace.contains('\n') {
            return Err(ConfigError::NewlineInWhitespace);
        }
        Ok(Self {
            whitespace: whitespace.chars().collect(),
            allow_properties: false,
        })
    }

    /// Spaces, tabs and carriage returns.
    pub fn line_oriented() -> Self {
        Self {
            whitespace: vec![' ', '\t', '\r'],
            allow_properties: false,
        }
    }

    /// Enable or disable extended properties mode.
    pub fn with_properties(mut self, allow: bool) -> Self {
        self.allow_properties = allow;
        self
    }

    pub fn is_whitespace(&self, c: char) -> bool {
        self.whitespace.contains(&c)
    }

    pub fn allow_properties(&self) -> bool {
        self.allow_properties
    }
}
