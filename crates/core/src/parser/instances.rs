use super::Parser;
use crate::ast::{Production, Provenance, RawAssignment, RawInstance, RawQualifier};
use crate::error::CompileError;
use crate::lexer::{Keyword, Token};

impl<'a> Parser<'a> {
    /// `instance of Class [as $Alias] { [qualifiers] Name = value; ... };`
    pub(super) fn instance_decl(
        &mut self,
        qualifiers: Vec<RawQualifier>,
        prov: Provenance,
    ) -> Result<Production, CompileError> {
        self.expect_keyword(Keyword::Instance, "'instance'")?;
        self.expect_keyword(Keyword::Of, "'of'")?;
        let (class_name, _) = self.take_ident("a class name")?;
        let alias = self.alias_clause()?;
        self.expect(&Token::LBrace, "'{'")?;

        let mut assignments = Vec::new();
        while !self.eat(&Token::RBrace) {
            let qualifiers = if self.at(&Token::LBracket) {
                self.qualifier_list()?
            } else {
                Vec::new()
            };
            let (name, prov) = self.take_ident("a property name or '}'")?;
            self.expect(&Token::Equals, "'='")?;
            let value = self.initializer()?;
            self.expect(&Token::Semicolon, "';'")?;
            assignments.push(RawAssignment {
                qualifiers,
                name,
                value,
                prov,
            });
        }
        self.expect(&Token::Semicolon, "';'")?;

        Ok(Production::Instance(RawInstance {
            qualifiers,
            class_name,
            alias,
            assignments,
            prov,
        }))
    }
}
