//! MOF tokenizer.
//!
//! [`Lexer`] is a lazy iterator over [`Spanned`] tokens that ends with a
//! single [`Token::Eof`]. Comments and whitespace never reach the parser.

use std::fmt;

use mofc_schema::{CimType, Flavor, Scope};

use crate::ast::Provenance;
use crate::error::CompileError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Any,
    As,
    Association,
    Class,
    DisableOverride,
    EnableOverride,
    False,
    Flavor,
    Indication,
    Instance,
    Method,
    Null,
    Of,
    Parameter,
    Pragma,
    Property,
    Qualifier,
    Ref,
    Reference,
    Restricted,
    Schema,
    Scope,
    ToSubclass,
    Translatable,
    True,
}

impl Keyword {
    /// Keywords are matched case-insensitively.
    pub fn from_word(word: &str) -> Option<Keyword> {
        let k = match word.to_ascii_lowercase().as_str() {
            "any" => Keyword::Any,
            "as" => Keyword::As,
            "association" => Keyword::Association,
            "class" => Keyword::Class,
            "disableoverride" => Keyword::DisableOverride,
            "enableoverride" => Keyword::EnableOverride,
            "false" => Keyword::False,
            "flavor" => Keyword::Flavor,
            "indication" => Keyword::Indication,
            "instance" => Keyword::Instance,
            "method" => Keyword::Method,
            "null" => Keyword::Null,
            "of" => Keyword::Of,
            "parameter" => Keyword::Parameter,
            "pragma" => Keyword::Pragma,
            "property" => Keyword::Property,
            "qualifier" => Keyword::Qualifier,
            "ref" => Keyword::Ref,
            "reference" => Keyword::Reference,
            "restricted" => Keyword::Restricted,
            "schema" => Keyword::Schema,
            "scope" => Keyword::Scope,
            "tosubclass" => Keyword::ToSubclass,
            "translatable" => Keyword::Translatable,
            "true" => Keyword::True,
            _ => return None,
        };
        Some(k)
    }

    pub fn as_flavor(&self) -> Option<Flavor> {
        match self {
            Keyword::EnableOverride => Some(Flavor::EnableOverride),
            Keyword::DisableOverride => Some(Flavor::DisableOverride),
            Keyword::ToSubclass => Some(Flavor::ToSubclass),
            Keyword::Restricted => Some(Flavor::Restricted),
            Keyword::Translatable => Some(Flavor::Translatable),
            _ => None,
        }
    }

    pub fn as_scope(&self) -> Option<Scope> {
        match self {
            Keyword::Schema => Some(Scope::Schema),
            Keyword::Class => Some(Scope::Class),
            Keyword::Association => Some(Scope::Association),
            Keyword::Indication => Some(Scope::Indication),
            Keyword::Qualifier => Some(Scope::Qualifier),
            Keyword::Property => Some(Scope::Property),
            Keyword::Reference => Some(Scope::Reference),
            Keyword::Method => Some(Scope::Method),
            Keyword::Parameter => Some(Scope::Parameter),
            Keyword::Any => Some(Scope::Any),
            _ => None,
        }
    }

    /// `true`, `false` and `null` are the only keywords that can never
    /// stand in for an identifier.
    pub fn is_reserved(&self) -> bool {
        matches!(self, Keyword::True | Keyword::False | Keyword::Null)
    }
}

/// Classification of a numeric literal; the value is converted later
/// against the declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberKind {
    Binary,
    Octal,
    Decimal,
    Hex,
    Real,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ident(String),
    Keyword(Keyword),
    /// A data type name (`object` lexes as `string`).
    DataType(CimType),
    /// `$name`, without the dollar sign.
    Alias(String),
    /// String literal content, escapes resolved.
    Str(String),
    Char(char),
    Number(NumberKind),
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Semicolon,
    Comma,
    Colon,
    Equals,
    Hash,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    /// Source text of the token exactly as written.
    pub lexeme: String,
    pub line: u32,
    pub column: u32,
}

impl Spanned {
    pub fn prov(&self, file: &str) -> Provenance {
        Provenance::new(file, self.line, self.column)
    }
}

/// How a token is named in diagnostics.
impl fmt::Display for Spanned {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.token {
            Token::Eof => f.write_str("end of input"),
            Token::Str(_) => write!(f, "string literal {}", self.lexeme),
            Token::Char(_) => write!(f, "char literal {}", self.lexeme),
            Token::Number(_) => write!(f, "number {}", self.lexeme),
            Token::Alias(_) => write!(f, "alias {}", self.lexeme),
            _ => write!(f, "'{}'", self.lexeme),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    src: &'a str,
    file: &'a str,
    pos: usize,
    line: u32,
    column: u32,
    finished: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str, file: &'a str) -> Self {
        Lexer {
            src,
            file,
            pos: 0,
            line: 1,
            column: 1,
            finished: false,
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.src[self.pos..].chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn eat_while(&mut self, pred: impl Fn(char) -> bool) -> usize {
        let mut n = 0;
        while self.peek().is_some_and(&pred) {
            self.bump();
            n += 1;
        }
        n
    }

    fn here(&self) -> Provenance {
        Provenance::new(self.file, self.line, self.column)
    }

    fn skip_trivia(&mut self) -> Result<(), CompileError> {
        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some(' ' | '\t' | '\r' | '\n' | '\u{c}' | '\u{feff}'), _) => {
                    self.bump();
                }
                (Some('/'), Some('/')) => {
                    self.eat_while(|c| c != '\n');
                }
                (Some('/'), Some('*')) => {
                    let start = self.here();
                    self.bump();
                    self.bump();
                    loop {
                        match (self.peek(), self.peek_at(1)) {
                            (None, _) => {
                                return Err(CompileError::lexical(
                                    &start,
                                    "unterminated block comment",
                                ))
                            }
                            (Some('*'), Some('/')) => {
                                self.bump();
                                self.bump();
                                break;
                            }
                            _ => {
                                self.bump();
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn next_token(&mut self) -> Result<Spanned, CompileError> {
        self.skip_trivia()?;
        let (line, column) = (self.line, self.column);
        let start = self.pos;
        let Some(c) = self.peek() else {
            return Ok(Spanned {
                token: Token::Eof,
                lexeme: String::new(),
                line,
                column,
            });
        };

        let token = match c {
            '{' | '}' | '[' | ']' | '(' | ')' | ';' | ',' | ':' | '=' | '#' => {
                self.bump();
                match c {
                    '{' => Token::LBrace,
                    '}' => Token::RBrace,
                    '[' => Token::LBracket,
                    ']' => Token::RBracket,
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    ';' => Token::Semicolon,
                    ',' => Token::Comma,
                    ':' => Token::Colon,
                    '=' => Token::Equals,
                    _ => Token::Hash,
                }
            }
            '"' => self.string_literal()?,
            '\'' => self.char_literal()?,
            '$' => {
                self.bump();
                match self.peek() {
                    Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                        let name_start = self.pos;
                        self.eat_while(is_ident_char);
                        Token::Alias(self.src[name_start..self.pos].to_string())
                    }
                    _ => {
                        return Err(CompileError::lexical(
                            &self.here(),
                            "expected an alias name after '$'",
                        ))
                    }
                }
            }
            '0'..='9' => self.number()?,
            '+' | '-' | '.' if self.starts_number() => self.number()?,
            c if c.is_ascii_alphabetic() || c == '_' => {
                self.eat_while(is_ident_char);
                let word = &self.src[start..self.pos];
                if let Some(t) = CimType::from_keyword(word) {
                    Token::DataType(t)
                } else if let Some(k) = Keyword::from_word(word) {
                    Token::Keyword(k)
                } else {
                    Token::Ident(word.to_string())
                }
            }
            other => {
                return Err(CompileError::lexical(
                    &self.here(),
                    format!("unexpected character '{}'", other.escape_default()),
                ))
            }
        };

        Ok(Spanned {
            token,
            lexeme: self.src[start..self.pos].to_string(),
            line,
            column,
        })
    }

    /// At a sign or dot: does a numeric literal start here?
    fn starts_number(&self) -> bool {
        let digit = |c: Option<char>| c.is_some_and(|c| c.is_ascii_digit());
        match self.peek() {
            Some('.') => digit(self.peek_at(1)),
            Some('+' | '-') => {
                digit(self.peek_at(1)) || (self.peek_at(1) == Some('.') && digit(self.peek_at(2)))
            }
            _ => false,
        }
    }

    fn number(&mut self) -> Result<Token, CompileError> {
        let start = self.here();
        let start_pos = self.pos;
        let src = self.src;
        if matches!(self.peek(), Some('+' | '-')) {
            self.bump();
        }

        let kind = if self.peek() == Some('0') && matches!(self.peek_at(1), Some('x' | 'X')) {
            self.bump();
            self.bump();
            if self.eat_while(|c| c.is_ascii_hexdigit()) == 0 {
                return Err(CompileError::lexical(
                    &start,
                    "hexadecimal literal has no digits",
                ));
            }
            NumberKind::Hex
        } else {
            let digits_start = self.pos;
            self.eat_while(|c| c.is_ascii_digit());
            let digits = &src[digits_start..self.pos];

            if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
                self.eat_while(|c| c.is_ascii_digit());
                if matches!(self.peek(), Some('e' | 'E')) {
                    let signed = matches!(self.peek_at(1), Some('+' | '-'));
                    let first = if signed { 2 } else { 1 };
                    if self.peek_at(first).is_some_and(|c| c.is_ascii_digit()) {
                        self.bump();
                        if signed {
                            self.bump();
                        }
                        self.eat_while(|c| c.is_ascii_digit());
                    }
                }
                NumberKind::Real
            } else if matches!(self.peek(), Some('b' | 'B'))
                && !digits.is_empty()
                && digits.chars().all(|c| c == '0' || c == '1')
            {
                self.bump();
                NumberKind::Binary
            } else if digits.len() > 1 && digits.starts_with('0') {
                if !digits.chars().all(|c| ('0'..='7').contains(&c)) {
                    return Err(CompileError::lexical(
                        &start,
                        format!("invalid octal literal '{}'", digits),
                    ));
                }
                NumberKind::Octal
            } else {
                NumberKind::Decimal
            }
        };

        if self.peek().is_some_and(is_ident_char) {
            self.eat_while(is_ident_char);
            return Err(CompileError::lexical(
                &start,
                format!("invalid numeric literal '{}'", &src[start_pos..self.pos]),
            ));
        }
        Ok(Token::Number(kind))
    }

    fn string_literal(&mut self) -> Result<Token, CompileError> {
        let start = self.here();
        self.bump();
        let mut s = String::new();
        loop {
            match self.peek() {
                None | Some('\n') => {
                    return Err(CompileError::lexical(&start, "unterminated string literal"))
                }
                Some('"') => {
                    self.bump();
                    return Ok(Token::Str(s));
                }
                Some('\\') => s.push(self.escape()?),
                Some(c) => {
                    self.bump();
                    s.push(c);
                }
            }
        }
    }

    fn char_literal(&mut self) -> Result<Token, CompileError> {
        let start = self.here();
        self.bump();
        let c = match self.peek() {
            None | Some('\n') => {
                return Err(CompileError::lexical(&start, "unterminated char literal"))
            }
            Some('\'') => return Err(CompileError::lexical(&start, "empty char literal")),
            Some('\\') => self.escape()?,
            Some(c) => {
                self.bump();
                c
            }
        };
        if self.peek() != Some('\'') {
            return Err(CompileError::lexical(
                &start,
                "char literal must contain exactly one character",
            ));
        }
        self.bump();
        Ok(Token::Char(c))
    }

    /// Consume a backslash escape and return the character it denotes.
    fn escape(&mut self) -> Result<char, CompileError> {
        let at = self.here();
        self.bump();
        let c = match self.bump() {
            Some('b') => '\u{8}',
            Some('t') => '\t',
            Some('n') => '\n',
            Some('f') => '\u{c}',
            Some('r') => '\r',
            Some('"') => '"',
            Some('\'') => '\'',
            Some('\\') => '\\',
            Some('x' | 'X') => {
                let digits_start = self.pos;
                let mut n = 0;
                while n < 4 && self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                    self.bump();
                    n += 1;
                }
                let digits = &self.src[digits_start..self.pos];
                u32::from_str_radix(digits, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| {
                        CompileError::lexical(&at, format!("invalid escape '\\x{}'", digits))
                    })?
            }
            Some(other) => {
                return Err(CompileError::lexical(
                    &at,
                    format!("unknown escape sequence '\\{}'", other.escape_default()),
                ))
            }
            None => return Err(CompileError::lexical(&at, "unterminated escape sequence")),
        };
        Ok(c)
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

impl Iterator for Lexer<'_> {
    type Item = Result<Spanned, CompileError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let result = self.next_token();
        match &result {
            Ok(Spanned {
                token: Token::Eof, ..
            })
            | Err(_) => self.finished = true,
            Ok(_) => {}
        }
        Some(result)
    }
}

/// Tokenize the whole input eagerly.
pub fn lex(src: &str, file: &str) -> Result<Vec<Spanned>, CompileError> {
    Lexer::new(src, file).collect()
}
