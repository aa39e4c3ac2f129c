use super::Parser;
use crate::ast::{RawQualifier, RawValue};
use crate::error::CompileError;
use crate::lexer::{Keyword, NumberKind, Token};

impl<'a> Parser<'a> {
    /// `[ qualifier (, qualifier)* ]`
    pub(super) fn qualifier_list(&mut self) -> Result<Vec<RawQualifier>, CompileError> {
        self.expect(&Token::LBracket, "'['")?;
        let mut qualifiers = Vec::new();
        loop {
            qualifiers.push(self.qualifier()?);
            if self.eat(&Token::Comma) {
                continue;
            }
            self.expect(&Token::RBracket, "',' or ']'")?;
            return Ok(qualifiers);
        }
    }

    fn qualifier(&mut self) -> Result<RawQualifier, CompileError> {
        let (name, prov) = self.take_ident("a qualifier name")?;
        let value = match self.peek() {
            Token::LParen => {
                self.advance();
                let v = self.constant()?;
                self.expect(&Token::RParen, "')'")?;
                Some(v)
            }
            Token::LBrace => Some(self.array_init()?),
            _ => None,
        };
        let mut flavors = Vec::new();
        if self.eat(&Token::Colon) {
            while let Token::Keyword(k) = self.peek() {
                let Some(flavor) = k.as_flavor() else { break };
                self.advance();
                flavors.push(flavor);
            }
            if flavors.is_empty() {
                return Err(self.err("a flavor"));
            }
        }
        Ok(RawQualifier {
            name,
            value,
            flavors,
            prov,
        })
    }

    /// constant | array initializer | alias
    pub(super) fn initializer(&mut self) -> Result<RawValue, CompileError> {
        match self.peek() {
            Token::LBrace => self.array_init(),
            Token::Alias(_) => Ok(RawValue::Alias(self.take_alias()?)),
            _ => self.constant(),
        }
    }

    fn array_init(&mut self) -> Result<RawValue, CompileError> {
        self.expect(&Token::LBrace, "'{'")?;
        let mut items = Vec::new();
        if self.eat(&Token::RBrace) {
            return Ok(RawValue::Array(items));
        }
        loop {
            let item = match self.peek() {
                Token::Alias(_) => RawValue::Alias(self.take_alias()?),
                _ => self.constant()?,
            };
            items.push(item);
            if self.eat(&Token::Comma) {
                continue;
            }
            self.expect(&Token::RBrace, "',' or '}'")?;
            return Ok(RawValue::Array(items));
        }
    }

    pub(super) fn constant(&mut self) -> Result<RawValue, CompileError> {
        let value = match self.peek().clone() {
            Token::Number(NumberKind::Real) => RawValue::Real(self.advance().lexeme),
            Token::Number(kind) => RawValue::Int {
                text: self.advance().lexeme,
                kind,
            },
            Token::Char(c) => {
                self.advance();
                RawValue::Char(c)
            }
            Token::Str(_) => RawValue::Str(self.strings()?),
            Token::Keyword(Keyword::True) => {
                self.advance();
                RawValue::Bool(true)
            }
            Token::Keyword(Keyword::False) => {
                self.advance();
                RawValue::Bool(false)
            }
            Token::Keyword(Keyword::Null) => {
                self.advance();
                RawValue::Null
            }
            _ => return Err(self.err("a constant value")),
        };
        Ok(value)
    }

    /// One or more adjacent string literals, concatenated.
    pub(super) fn strings(&mut self) -> Result<String, CompileError> {
        let mut s = match self.peek() {
            Token::Str(first) => first.clone(),
            _ => return Err(self.err("a string literal")),
        };
        self.advance();
        while let Token::Str(next) = self.peek() {
            s.push_str(next);
            self.advance();
        }
        Ok(s)
    }

    /// `[]` or `[N]` after a name.
    pub(super) fn array_spec(&mut self) -> Result<(bool, Option<u32>), CompileError> {
        if !self.eat(&Token::LBracket) {
            return Ok((false, None));
        }
        let size = match self.peek() {
            Token::Number(NumberKind::Decimal) => {
                let t = self.advance();
                let file = self.file;
                let n = t.lexeme.parse::<u32>().map_err(|_| {
                    CompileError::syntax(
                        &t.prov(file),
                        format!("invalid array size '{}'", t.lexeme),
                    )
                })?;
                Some(n)
            }
            _ => None,
        };
        self.expect(&Token::RBracket, "']'")?;
        Ok((true, size))
    }
}
