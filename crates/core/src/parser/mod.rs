//! Predictive recursive-descent parser for MOF.
//!
//! Tokens are pulled lazily from the [`Lexer`]; [`Parser::next_production`]
//! yields one top-level production at a time so the caller can act on each
//! element before the rest of the file is read. Lookahead never exceeds two
//! tokens.

use std::collections::VecDeque;

use crate::ast::{Production, Provenance};
use crate::error::CompileError;
use crate::lexer::{Keyword, Lexer, Spanned, Token};

mod classes;
mod declarations;
mod instances;
mod values;

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    lookahead: VecDeque<Spanned>,
    file: &'a str,
    eof: Option<Spanned>,
    /// A lexer failure; the token stream ends in a synthetic `Eof` at the
    /// failing position and the error is reported in place of that token.
    lex_error: Option<CompileError>,
}

impl<'a> Parser<'a> {
    pub fn new(src: &'a str, file: &'a str) -> Self {
        Parser {
            lexer: Lexer::new(src, file),
            lookahead: VecDeque::new(),
            file,
            eof: None,
            lex_error: None,
        }
    }

    fn fill(&mut self, n: usize) {
        while self.lookahead.len() <= n {
            let next = match self.lexer.next() {
                Some(Ok(t)) => {
                    if t.token == Token::Eof {
                        self.eof = Some(t.clone());
                    }
                    t
                }
                Some(Err(e)) => {
                    let eof = Spanned {
                        token: Token::Eof,
                        lexeme: String::new(),
                        line: e.line,
                        column: e.column,
                    };
                    self.lex_error = Some(e);
                    self.eof = Some(eof.clone());
                    eof
                }
                None => self.eof_token(),
            };
            self.lookahead.push_back(next);
        }
    }

    fn eof_token(&self) -> Spanned {
        self.eof.clone().unwrap_or(Spanned {
            token: Token::Eof,
            lexeme: String::new(),
            line: 1,
            column: 1,
        })
    }

    fn cur(&mut self) -> &Spanned {
        self.fill(0);
        &self.lookahead[0]
    }

    fn peek(&mut self) -> &Token {
        &self.cur().token
    }

    fn peek_nth(&mut self, n: usize) -> &Token {
        self.fill(n);
        &self.lookahead[n].token
    }

    fn advance(&mut self) -> Spanned {
        self.fill(0);
        match self.lookahead.pop_front() {
            Some(t) => t,
            None => self.eof_token(),
        }
    }

    fn here(&mut self) -> Provenance {
        let file = self.file;
        self.cur().prov(file)
    }

    fn at(&mut self, tok: &Token) -> bool {
        self.peek() == tok
    }

    fn at_keyword(&mut self, kw: Keyword) -> bool {
        matches!(self.peek(), Token::Keyword(k) if *k == kw)
    }

    fn eat(&mut self, tok: &Token) -> bool {
        if self.at(tok) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, tok: &Token, expected: &str) -> Result<Spanned, CompileError> {
        if self.at(tok) {
            Ok(self.advance())
        } else {
            Err(self.err(expected))
        }
    }

    fn expect_keyword(&mut self, kw: Keyword, expected: &str) -> Result<Spanned, CompileError> {
        if self.at_keyword(kw) {
            Ok(self.advance())
        } else {
            Err(self.err(expected))
        }
    }

    /// Syntax error at the current token, or the pending lexical error if
    /// the token stream was cut short.
    fn err(&mut self, expected: &str) -> CompileError {
        let file = self.file;
        let cur = self.cur().clone();
        if cur.token == Token::Eof {
            if let Some(e) = &self.lex_error {
                return e.clone();
            }
        }
        CompileError::syntax(
            &cur.prov(file),
            format!("expected {}, found {}", expected, cur),
        )
    }

    fn is_identifier(tok: &Token) -> bool {
        match tok {
            Token::Ident(_) | Token::DataType(_) => true,
            Token::Keyword(k) => !k.is_reserved(),
            _ => false,
        }
    }

    /// An identifier; non-reserved keywords and type names qualify.
    fn take_ident(&mut self, expected: &str) -> Result<(String, Provenance), CompileError> {
        if Self::is_identifier(self.peek()) {
            let file = self.file;
            let t = self.advance();
            Ok((t.lexeme.clone(), t.prov(file)))
        } else {
            Err(self.err(expected))
        }
    }

    fn take_alias(&mut self) -> Result<String, CompileError> {
        if let Token::Alias(name) = self.peek() {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            Err(self.err("an alias ($name)"))
        }
    }

    /// `as $Alias`, if present.
    fn alias_clause(&mut self) -> Result<Option<String>, CompileError> {
        if self.at_keyword(Keyword::As) {
            self.advance();
            Ok(Some(self.take_alias()?))
        } else {
            Ok(None)
        }
    }

    /// The next top-level production, or `None` at end of input.
    pub fn next_production(&mut self) -> Result<Option<Production>, CompileError> {
        let start = self.here();
        match self.peek() {
            Token::Eof => match self.lex_error.take() {
                Some(e) => Err(e),
                None => Ok(None),
            },
            Token::Hash => self.pragma(start).map(Some),
            _ => {
                let qualifiers = if self.at(&Token::LBracket) {
                    self.qualifier_list()?
                } else {
                    Vec::new()
                };
                if self.at_keyword(Keyword::Class) {
                    self.class_decl(qualifiers, start).map(Some)
                } else if self.at_keyword(Keyword::Instance) {
                    self.instance_decl(qualifiers, start).map(Some)
                } else if qualifiers.is_empty() && self.at_keyword(Keyword::Qualifier) {
                    self.qualifier_decl(start).map(Some)
                } else if qualifiers.is_empty() {
                    Err(self.err("'#pragma', 'qualifier', 'class', 'instance' or '['"))
                } else {
                    Err(self.err("'class' or 'instance'"))
                }
            }
        }
    }
}

/// Parse a whole source text.
pub fn parse(src: &str, file: &str) -> Result<Vec<Production>, CompileError> {
    let mut parser = Parser::new(src, file);
    let mut out = Vec::new();
    while let Some(p) = parser.next_production()? {
        out.push(p);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::RawValue;
    use crate::error::ErrorKind;
    use crate::lexer::NumberKind;
    use mofc_schema::{CimType, Flavor, Scope};

    fn one(src: &str) -> Production {
        let mut all = parse(src, "t.mof").unwrap();
        assert_eq!(all.len(), 1, "{:?}", all);
        all.remove(0)
    }

    #[test]
    fn qualifier_declaration() {
        let Production::QualifierDecl(q) = one(
            "qualifier Values : string[] = {\"a\", \"b\"}, Scope(property, method), \
             Flavor(DisableOverride, Translatable);",
        ) else {
            panic!("expected qualifier declaration")
        };
        assert_eq!(q.name, "Values");
        assert_eq!(q.cim_type, CimType::String);
        assert!(q.is_array);
        assert_eq!(
            q.default,
            Some(RawValue::Array(vec![
                RawValue::Str("a".into()),
                RawValue::Str("b".into())
            ]))
        );
        assert_eq!(q.scopes, vec![Scope::Property, Scope::Method]);
        assert_eq!(q.flavors, vec![Flavor::DisableOverride, Flavor::Translatable]);
    }

    #[test]
    fn class_with_members() {
        let Production::Class(c) = one(
            "[Association, Description(\"a\" \"b\")]
             class CIM_Link as $L : CIM_Base {
                [Key] CIM_Foo REF Left;
                uint8 Bytes[4] = {1, 0x2};
                [Static] uint32 Run([In] string Arg, CIM_Foo ref Target, sint8 Many[]);
             };",
        ) else {
            panic!("expected class")
        };
        assert_eq!(c.name, "CIM_Link");
        assert_eq!(c.alias.as_deref(), Some("L"));
        assert_eq!(c.superclass.as_deref(), Some("CIM_Base"));
        assert_eq!(c.qualifiers.len(), 2);
        assert_eq!(c.qualifiers[0].value, None);
        assert_eq!(c.qualifiers[1].value, Some(RawValue::Str("ab".into())));
        assert_eq!(c.properties.len(), 2);
        assert_eq!(c.properties[0].cim_type, CimType::Reference("CIM_Foo".into()));
        assert_eq!(c.properties[1].array_size, Some(4));
        let m = &c.methods[0];
        assert_eq!(m.return_type, CimType::UInt32);
        assert_eq!(m.parameters.len(), 3);
        assert_eq!(m.parameters[1].cim_type, CimType::Reference("CIM_Foo".into()));
        assert!(m.parameters[2].is_array);
    }

    #[test]
    fn keywords_as_identifiers() {
        let Production::Class(c) = one("class Scope { string Property; boolean Flavor; };") else {
            panic!("expected class")
        };
        assert_eq!(c.name, "Scope");
        assert_eq!(c.properties[0].name, "Property");
        assert_eq!(c.properties[1].name, "Flavor");
    }

    #[test]
    fn instance_with_alias_and_values() {
        let Production::Instance(i) = one(
            "instance of CIM_Foo as $foo { Name = \"x\"; Ids = {}; Other = $bar; N = -0x1F; Pi = 3.5; None = null; };",
        ) else {
            panic!("expected instance")
        };
        assert_eq!(i.class_name, "CIM_Foo");
        assert_eq!(i.alias.as_deref(), Some("foo"));
        let values: Vec<&RawValue> = i.assignments.iter().map(|a| &a.value).collect();
        assert_eq!(values[0], &RawValue::Str("x".into()));
        assert_eq!(values[1], &RawValue::Array(vec![]));
        assert_eq!(values[2], &RawValue::Alias("bar".into()));
        assert_eq!(
            values[3],
            &RawValue::Int {
                text: "-0x1F".into(),
                kind: NumberKind::Hex
            }
        );
        assert_eq!(values[4], &RawValue::Real("3.5".into()));
        assert_eq!(values[5], &RawValue::Null);
    }

    #[test]
    fn pragma_forms() {
        let all = parse(
            "#pragma include (\"a.mof\")\n#pragma namespace \"root/\" \"x\"\n",
            "t.mof",
        )
        .unwrap();
        let Production::Pragma(p) = &all[0] else {
            panic!("expected pragma")
        };
        assert_eq!(p.name, "include");
        assert_eq!(p.args, vec!["a.mof".to_string()]);
        let Production::Pragma(p) = &all[1] else {
            panic!("expected pragma")
        };
        assert_eq!(p.args, vec!["root/x".to_string()]);
        assert_eq!(p.prov.line, 2);
    }

    #[test]
    fn qualifier_flavors_after_colon() {
        let Production::Class(c) = one("class A { [Key : DisableOverride ToSubclass] string K; };")
        else {
            panic!("expected class")
        };
        assert_eq!(
            c.properties[0].qualifiers[0].flavors,
            vec![Flavor::DisableOverride, Flavor::ToSubclass]
        );
    }

    #[test]
    fn unterminated_class_fails_at_end_of_input() {
        let err = parse("class Foo { string Name", "t.mof").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Syntax);
        assert_eq!((err.line, err.column), (1, 24));
        assert!(err.message.contains("end of input"), "{}", err.message);
    }

    #[test]
    fn missing_semicolon_reports_offending_token() {
        let err = parse("class Foo { string Name }", "t.mof").unwrap_err();
        assert_eq!((err.line, err.column), (1, 25));
        assert!(err.message.contains("';'"));
    }

    #[test]
    fn productions_before_an_error_are_yielded() {
        let mut parser = Parser::new("class A { }; class B { @ };", "t.mof");
        assert!(matches!(parser.next_production(), Ok(Some(Production::Class(_)))));
        let err = parser.next_production().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Lexical);
        assert_eq!(err.column, 24);
    }

    #[test]
    fn reserved_words_are_not_identifiers() {
        let err = parse("class true { };", "t.mof").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Syntax);
    }
}
