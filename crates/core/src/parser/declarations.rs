use super::Parser;
use crate::ast::{Production, Provenance, RawPragma, RawQualifierDecl};
use crate::error::CompileError;
use crate::lexer::{Keyword, Token};

impl<'a> Parser<'a> {
    /// `# pragma name ( "arg" , ... )` or `# pragma name "arg"`
    pub(super) fn pragma(&mut self, prov: Provenance) -> Result<Production, CompileError> {
        self.expect(&Token::Hash, "'#'")?;
        self.expect_keyword(Keyword::Pragma, "'pragma'")?;
        let (name, _) = self.take_ident("a pragma name")?;
        let mut args = Vec::new();
        if self.eat(&Token::LParen) {
            loop {
                args.push(self.strings()?);
                if self.eat(&Token::Comma) {
                    continue;
                }
                self.expect(&Token::RParen, "',' or ')'")?;
                break;
            }
        } else if matches!(self.peek(), Token::Str(_)) {
            args.push(self.strings()?);
        } else {
            return Err(self.err("'(' or a string literal"));
        }
        Ok(Production::Pragma(RawPragma { name, args, prov }))
    }

    /// `qualifier Name : type [array] [= default], Scope(...) [, Flavor(...)] ;`
    pub(super) fn qualifier_decl(&mut self, prov: Provenance) -> Result<Production, CompileError> {
        self.expect_keyword(Keyword::Qualifier, "'qualifier'")?;
        let (name, _) = self.take_ident("a qualifier name")?;
        self.expect(&Token::Colon, "':'")?;
        let cim_type = match self.peek() {
            Token::DataType(t) => {
                let t = t.clone();
                self.advance();
                t
            }
            _ => return Err(self.err("a data type")),
        };
        let (is_array, array_size) = self.array_spec()?;
        let default = if self.eat(&Token::Equals) {
            Some(self.initializer()?)
        } else {
            None
        };

        self.expect(&Token::Comma, "','")?;
        self.expect_keyword(Keyword::Scope, "'Scope'")?;
        self.expect(&Token::LParen, "'('")?;
        let mut scopes = Vec::new();
        loop {
            match self.peek() {
                Token::Keyword(k) if k.as_scope().is_some() => {
                    scopes.extend(k.as_scope());
                    self.advance();
                }
                _ => return Err(self.err("a scope name")),
            }
            if self.eat(&Token::Comma) {
                continue;
            }
            self.expect(&Token::RParen, "',' or ')'")?;
            break;
        }

        let mut flavors = Vec::new();
        if self.eat(&Token::Comma) {
            self.expect_keyword(Keyword::Flavor, "'Flavor'")?;
            self.expect(&Token::LParen, "'('")?;
            loop {
                match self.peek() {
                    Token::Keyword(k) if k.as_flavor().is_some() => {
                        flavors.extend(k.as_flavor());
                        self.advance();
                    }
                    _ => return Err(self.err("a flavor")),
                }
                if self.eat(&Token::Comma) {
                    continue;
                }
                self.expect(&Token::RParen, "',' or ')'")?;
                break;
            }
        }
        self.expect(&Token::Semicolon, "';'")?;

        Ok(Production::QualifierDecl(RawQualifierDecl {
            name,
            cim_type,
            is_array,
            array_size,
            default,
            scopes,
            flavors,
            prov,
        }))
    }
}
