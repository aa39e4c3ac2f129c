use mofc_schema::CimType;

use super::Parser;
use crate::ast::{Production, Provenance, RawClass, RawMethod, RawParameter, RawQualifier, RawProperty};
use crate::error::CompileError;
use crate::lexer::{Keyword, Token};

impl<'a> Parser<'a> {
    pub(super) fn class_decl(
        &mut self,
        qualifiers: Vec<RawQualifier>,
        prov: Provenance,
    ) -> Result<Production, CompileError> {
        self.expect_keyword(Keyword::Class, "'class'")?;
        let (name, _) = self.take_ident("a class name")?;
        let alias = self.alias_clause()?;
        let superclass = if self.eat(&Token::Colon) {
            Some(self.take_ident("a superclass name")?.0)
        } else {
            None
        };
        self.expect(&Token::LBrace, "'{'")?;

        let mut properties = Vec::new();
        let mut methods = Vec::new();
        while !self.eat(&Token::RBrace) {
            self.feature(&mut properties, &mut methods)?;
        }
        self.expect(&Token::Semicolon, "';'")?;

        Ok(Production::Class(RawClass {
            qualifiers,
            name,
            alias,
            superclass,
            properties,
            methods,
            prov,
        }))
    }

    /// `dataType` or `ClassName REF`.
    fn feature_type(&mut self, expected: &str) -> Result<CimType, CompileError> {
        if let Token::DataType(t) = self.peek() {
            let t = t.clone();
            self.advance();
            return Ok(t);
        }
        if Self::is_identifier(self.peek()) && *self.peek_nth(1) == Token::Keyword(Keyword::Ref) {
            let (class, _) = self.take_ident("a class name")?;
            self.advance();
            return Ok(CimType::Reference(class));
        }
        Err(self.err(expected))
    }

    fn feature(
        &mut self,
        properties: &mut Vec<RawProperty>,
        methods: &mut Vec<RawMethod>,
    ) -> Result<(), CompileError> {
        let qualifiers = if self.at(&Token::LBracket) {
            self.qualifier_list()?
        } else {
            Vec::new()
        };
        let cim_type = self.feature_type("a data type, a class reference or '}'")?;
        let (name, prov) = self.take_ident("a property or method name")?;

        if !cim_type.is_reference() && self.eat(&Token::LParen) {
            let mut parameters = Vec::new();
            if !self.eat(&Token::RParen) {
                loop {
                    parameters.push(self.parameter()?);
                    if self.eat(&Token::Comma) {
                        continue;
                    }
                    self.expect(&Token::RParen, "',' or ')'")?;
                    break;
                }
            }
            self.expect(&Token::Semicolon, "';'")?;
            methods.push(RawMethod {
                qualifiers,
                name,
                return_type: cim_type,
                parameters,
                prov,
            });
            return Ok(());
        }

        let (is_array, array_size) = self.array_spec()?;
        let default = if self.eat(&Token::Equals) {
            Some(self.initializer()?)
        } else {
            None
        };
        self.expect(&Token::Semicolon, "';'")?;
        properties.push(RawProperty {
            qualifiers,
            name,
            cim_type,
            is_array,
            array_size,
            default,
            prov,
        });
        Ok(())
    }

    fn parameter(&mut self) -> Result<RawParameter, CompileError> {
        let qualifiers = if self.at(&Token::LBracket) {
            self.qualifier_list()?
        } else {
            Vec::new()
        };
        let cim_type = self.feature_type("a parameter type")?;
        let (name, prov) = self.take_ident("a parameter name")?;
        let (is_array, array_size) = self.array_spec()?;
        Ok(RawParameter {
            qualifiers,
            name,
            cim_type,
            is_array,
            array_size,
            prov,
        })
    }
}
