use std::iter::Peekable;
use std::str::CharIndices;

use crate::config::GrammarConfig;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ident(String),
    Str(String),
    /// Backtick expression, kept verbatim.
    Expr(String),
    /// Raw numeric text; classified by the parser.
    Num(String),
    /// `#rrggbb` header color.
    Color(String),
    Comment(String),

    LBrace,      // {
    RBrace,      // }
    LParen,      // (
    RParen,      // )
    LBracket,    // [
    RBracket,    // ]
    ArraySuffix, // []
    Comma,       // ,
    Colon,       // :
    Dot,         // .
    Lt,          // <
    Gt,          // >
    Dash,        // -
    LtGt,        // <>
    Newline,

    Eof,
}

impl Token {
    /// Case-insensitive keyword check.
    pub fn is_keyword(&self, kw: &str) -> bool {
        matches!(self, Token::Ident(s) if s.eq_ignore_ascii_case(kw))
    }
}

/// A token with its byte span and 1-based line.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub start: usize,
    pub end: usize,
    pub line: usize,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum LexError {
    #[error("line {1}: unexpected character: {0}")]
    UnexpectedChar(char, usize),
    #[error("line {0}: unterminated string")]
    UnterminatedString(usize),
    #[error("line {0}: unterminated expression")]
    UnterminatedExpression(usize),
    #[error("line {0}: unterminated comment")]
    UnterminatedComment(usize),
}

pub struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
    config: &'a GrammarConfig,
    line: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str, config: &'a GrammarConfig) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
            config,
            line: 1,
        }
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn offset(&mut self) -> usize {
        self.chars.peek().map_or(self.input.len(), |&(i, _)| i)
    }

    fn bump(&mut self) -> Option<char> {
        let (_, c) = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if self.config.is_whitespace(c) {
                self.bump();
            } else {
                break;
            }
        }
    }

    fn read_ident(&mut self, first: char) -> String {
        self.continue_ident(String::from(first))
    }

    fn continue_ident(&mut self, mut s: String) -> String {
        while let Some(c) = self.peek_char() {
            if c.is_alphanumeric() || c == '_' {
                s.push(c);
                self.bump();
            } else {
                break;
            }
        }
        s
    }

    fn read_string(&mut self, quote: char) -> Result<String, LexError> {
        let line = self.line;
        let at = self.offset();
        if quote == '\'' && self.input[at..].starts_with("''") {
            self.bump();
            self.bump();
            return self.read_multiline_string(line);
        }
        let mut s = String::new();
        loop {
            match self.bump() {
                Some(c) if c == quote => return Ok(s),
                Some('\\') => {
                    if let Some(c) = self.bump() {
                        match c {
                            'n' => s.push('\n'),
                            't' => s.push('\t'),
                            'r' => s.push('\r'),
                            _ => s.push(c),
                        }
                    }
                }
                Some('\n') | None => return Err(LexError::UnterminatedString(line)),
                Some(c) => s.push(c),
            }
        }
    }

    fn read_multiline_string(&mut self, line: usize) -> Result<String, LexError> {
        let mut s = String::new();
        loop {
            let at = self.offset();
            if self.input[at..].starts_with("'''") {
                self.bump();
                self.bump();
                self.bump();
                return Ok(dedent(&s));
            }
            match self.bump() {
                Some('\\') => {
                    if let Some(c) = self.bump() {
                        s.push(c);
                    }
                }
                Some(c) => s.push(c),
                None => return Err(LexError::UnterminatedString(line)),
            }
        }
    }

    fn read_expression(&mut self) -> Result<String, LexError> {
        let line = self.line;
        let mut s = String::new();
        loop {
            match self.bump() {
                Some('`') => return Ok(s),
                Some(c) => s.push(c),
                None => return Err(LexError::UnterminatedExpression(line)),
            }
        }
    }

    fn read_number(&mut self, first: char) -> String {
        let mut s = String::from(first);
        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() || c == '.' {
                s.push(c);
                self.bump();
            } else {
                break;
            }
        }
        s
    }

    fn read_line_comment(&mut self) -> String {
        let mut s = String::new();
        while let Some(c) = self.peek_char() {
            if c == '\n' {
                break;
            }
            s.push(c);
            self.bump();
        }
        s.trim().to_string()
    }

    fn read_block_comment(&mut self) -> Result<String, LexError> {
        let line = self.line;
        let mut s = String::new();
        loop {
            match self.bump() {
                Some('*') if self.peek_char() == Some('/') => {
                    self.bump();
                    return Ok(s.trim().to_string());
                }
                Some(c) => s.push(c),
                None => return Err(LexError::UnterminatedComment(line)),
            }
        }
    }

    pub fn next_token(&mut self) -> Result<Spanned, LexError> {
        self.skip_whitespace();

        let start = self.offset();
        let line = self.line;
        let c = match self.bump() {
            Some(c) => c,
            None => {
                return Ok(Spanned {
                    token: Token::Eof,
                    start,
                    end: start,
                    line,
                });
            }
        };

        let token = match c {
            '\n' => Token::Newline,
            '{' => Token::LBrace,
            '}' => Token::RBrace,
            '(' => Token::LParen,
            ')' => Token::RParen,
            '[' => {
                if self.peek_char() == Some(']') {
                    self.bump();
                    Token::ArraySuffix
                } else {
                    Token::LBracket
                }
            }
            ']' => Token::RBracket,
            ',' => Token::Comma,
            ':' => Token::Colon,
            '.' => Token::Dot,
            '>' => Token::Gt,
            '<' => {
                if self.peek_char() == Some('>') {
                    self.bump();
                    Token::LtGt
                } else {
                    Token::Lt
                }
            }
            '-' => match self.peek_char() {
                Some(d) if d.is_ascii_digit() => Token::Num(self.read_number(c)),
                _ => Token::Dash,
            },
            '/' => match self.peek_char() {
                Some('/') => {
                    self.bump();
                    Token::Comment(self.read_line_comment())
                }
                Some('*') => {
                    self.bump();
                    Token::Comment(self.read_block_comment()?)
                }
                _ => return Err(LexError::UnexpectedChar(c, line)),
            },
            '#' => Token::Color(self.read_ident(c)),
            '"' | '\'' => Token::Str(self.read_string(c)?),
            '`' => Token::Expr(self.read_expression()?),
            c if c.is_ascii_digit() => {
                let raw = self.read_number(c);
                // names such as `2fa_enabled` may start with digits
                let word = self.peek_char().is_some_and(|n| n.is_alphanumeric() || n == '_');
                if word && !raw.contains('.') {
                    Token::Ident(self.continue_ident(raw))
                } else {
                    Token::Num(raw)
                }
            }
            c if c.is_alphabetic() || c == '_' => Token::Ident(self.read_ident(c)),
            _ => return Err(LexError::UnexpectedChar(c, line)),
        };

        let end = self.offset();
        Ok(Spanned {
            token,
            start,
            end,
            line,
        })
    }

    pub fn tokenize(mut self) -> Result<Vec<Spanned>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token()?;
            let done = tok.token == Token::Eof;
            tokens.push(tok);
            if done {
                break;
            }
        }
        Ok(tokens)
    }
}

/// Strip the leading newline and the common indentation of a `'''` string.
fn dedent(raw: &str) -> String {
    let body = raw.strip_prefix('\n').unwrap_or(raw);
    let body = body.trim_end_matches([' ', '\t', '\r', '\n']);
    let indent = body
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);
    body.lines()
        .map(|l| l.get(indent..).unwrap_or_else(|| l.trim_start()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        let config = GrammarConfig::line_oriented();
        Lexer::new(input, &config)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.token)
            .collect()
    }

    #[test]
    fn test_basic_tokens() {
        assert_eq!(
            tokens("Table users { }"),
            vec![
                Token::Ident("Table".into()),
                Token::Ident("users".into()),
                Token::LBrace,
                Token::RBrace,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_newlines_are_tokens() {
        assert_eq!(
            tokens("a\n\tb"),
            vec![
                Token::Ident("a".into()),
                Token::Newline,
                Token::Ident("b".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_literals() {
        assert_eq!(
            tokens("'x' \"y\" `now()` 3 3.0 -1"),
            vec![
                Token::Str("x".into()),
                Token::Str("y".into()),
                Token::Expr("now()".into()),
                Token::Num("3".into()),
                Token::Num("3.0".into()),
                Token::Num("-1".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_leading_digit_identifier() {
        assert_eq!(
            tokens("2fa_enabled 3d 42"),
            vec![
                Token::Ident("2fa_enabled".into()),
                Token::Ident("3d".into()),
                Token::Num("42".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_comments() {
        assert_eq!(
            tokens("// first\nid /* block */"),
            vec![
                Token::Comment("first".into()),
                Token::Newline,
                Token::Ident("id".into()),
                Token::Comment("block".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_relation_symbols() {
        assert_eq!(
            tokens("< > - <> [] [ ]"),
            vec![
                Token::Lt,
                Token::Gt,
                Token::Dash,
                Token::LtGt,
                Token::ArraySuffix,
                Token::LBracket,
                Token::RBracket,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_multiline_string() {
        let toks = tokens("'''\n    first\n      second\n    '''");
        assert_eq!(toks[0], Token::Str("first\n  second".into()));
    }

    #[test]
    fn test_spans_and_lines() {
        let config = GrammarConfig::line_oriented();
        let toks = Lexer::new("a\nvarchar(255)", &config).tokenize().unwrap();
        assert_eq!(toks[2].line, 2);
        assert_eq!((toks[2].start, toks[2].end), (2, 9));
    }

    #[test]
    fn test_custom_whitespace_excludes_tab() {
        let config = GrammarConfig::new(" ").unwrap();
        let err = Lexer::new("a\tb", &config).tokenize().unwrap_err();
        assert_eq!(err, LexError::UnexpectedChar('\t', 1));
    }

    #[test]
    fn test_unterminated_string() {
        let config = GrammarConfig::line_oriented();
        let err = Lexer::new("'abc\n'", &config).tokenize().unwrap_err();
        assert_eq!(err, LexError::UnterminatedString(1));
    }
}
