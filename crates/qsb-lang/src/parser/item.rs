//! Namespace, callable and type parsing.

use super::Parser;
use crate::ast::{AdjointSpec, Block, CallableDecl, CallableKind, Param, Program, TypeExpr};
use crate::error::{ParseError, ParseResult};
use crate::lexer::Token;

impl Parser {
    /// Parse the entire program.
    pub(super) fn parse_program(&mut self) -> ParseResult<Program> {
        let mut program = Program::default();
        while !self.is_eof() {
            if self.consume(&Token::Namespace) {
                let namespace = self.parse_dotted_name()?;
                self.expect(Token::LBrace)?;
                while !self.consume(&Token::RBrace) {
                    if self.is_eof() {
                        return Err(ParseError::UnexpectedEof("}".into()));
                    }
                    self.parse_item(&mut program, Some(&namespace))?;
                }
            } else {
                self.parse_item(&mut program, None)?;
            }
        }
        Ok(program)
    }

    /// Parse one namespace member.
    fn parse_item(&mut self, program: &mut Program, namespace: Option<&str>) -> ParseResult<()> {
        match self.peek() {
            Some(Token::Open | Token::Import) => {
                self.advance();
                program.opens.push(self.parse_dotted_name()?);
                self.skip_through_semicolon()
            }
            Some(Token::Export) => self.skip_through_semicolon(),
            Some(Token::At | Token::Operation | Token::Function) => {
                let mut decl = self.parse_callable_decl()?;
                decl.namespace = namespace.map(str::to_string);
                program.callables.push(decl);
                Ok(())
            }
            Some(Token::Identifier(word)) if word == "newtype" || word == "struct" => {
                Err(ParseError::Unsupported {
                    line: self.line(),
                    message: format!("'{word}' declarations"),
                })
            }
            _ => Err(self.unexpected("namespace item")),
        }
    }

    /// Skip tokens up to and including the next `;`.
    fn skip_through_semicolon(&mut self) -> ParseResult<()> {
        loop {
            match self.advance() {
                Some(Token::Semicolon) => return Ok(()),
                Some(_) => {}
                None => return Err(ParseError::UnexpectedEof(";".into())),
            }
        }
    }

    /// Parse attributes followed by an `operation` or `function` declaration.
    pub(super) fn parse_callable_decl(&mut self) -> ParseResult<CallableDecl> {
        let mut attributes = Vec::new();
        while self.consume(&Token::At) {
            attributes.push(self.parse_identifier()?);
            if self.consume(&Token::LParen) {
                let mut depth = 1;
                while depth > 0 {
                    match self.advance() {
                        Some(Token::LParen) => depth += 1,
                        Some(Token::RParen) => depth -= 1,
                        Some(_) => {}
                        None => return Err(ParseError::UnexpectedEof(")".into())),
                    }
                }
            }
        }

        let kind = match self.advance() {
            Some(Token::Operation) => CallableKind::Operation,
            Some(Token::Function) => CallableKind::Function,
            Some(other) => {
                return Err(ParseError::UnexpectedToken {
                    line: self.line(),
                    expected: "operation or function".into(),
                    found: other.to_string(),
                });
            }
            None => return Err(ParseError::UnexpectedEof("operation or function".into())),
        };

        let name = self.parse_identifier()?;
        if self.check(&Token::Lt) {
            return Err(ParseError::Unsupported {
                line: self.line(),
                message: format!("type parameters on '{name}'"),
            });
        }

        let params = self.parse_params()?;
        self.expect(Token::Colon)?;
        let return_type = self.parse_type()?;

        let characteristics = if self.consume(&Token::Is) {
            self.parse_characteristics()?
        } else {
            vec![]
        };
        let mut adjoint = characteristics
            .iter()
            .any(|c| c == "Adj")
            .then_some(AdjointSpec::Auto);

        self.expect(Token::LBrace)?;
        let body = if matches!(
            self.peek(),
            Some(Token::Body | Token::AdjointSpec | Token::ControlledSpec)
        ) {
            let (body, explicit_adjoint) = self.parse_specializations(&name)?;
            if explicit_adjoint.is_some() {
                adjoint = explicit_adjoint;
            }
            body
        } else {
            self.nested(Self::parse_block_contents)?
        };

        Ok(CallableDecl {
            name,
            namespace: None,
            kind,
            attributes,
            params,
            return_type,
            characteristics,
            adjoint,
            body,
        })
    }

    /// Parse a parenthesized parameter list.
    fn parse_params(&mut self) -> ParseResult<Vec<Param>> {
        self.expect(Token::LParen)?;
        let mut params = Vec::new();
        if self.consume(&Token::RParen) {
            return Ok(params);
        }
        loop {
            if self.check(&Token::LParen) {
                return Err(ParseError::Unsupported {
                    line: self.line(),
                    message: "nested tuple parameters".into(),
                });
            }
            let name = self.parse_identifier()?;
            self.expect(Token::Colon)?;
            let ty = self.parse_type()?;
            params.push(Param { name, ty });
            if !self.consume(&Token::Comma) {
                break;
            }
        }
        self.expect(Token::RParen)?;
        Ok(params)
    }

    /// Parse a type expression.
    pub(super) fn parse_type(&mut self) -> ParseResult<TypeExpr> {
        let mut ty = if self.consume(&Token::LParen) {
            if self.consume(&Token::RParen) {
                TypeExpr::unit()
            } else {
                let first = self.nested(Self::parse_type)?;
                if self.consume(&Token::FatArrow) || self.consume(&Token::Arrow) {
                    let output = self.nested(Self::parse_type)?;
                    if self.consume(&Token::Is) {
                        self.parse_characteristics()?;
                    }
                    self.expect(Token::RParen)?;
                    TypeExpr::Callable(Box::new(first), Box::new(output))
                } else {
                    let mut items = vec![first];
                    while self.consume(&Token::Comma) {
                        items.push(self.nested(Self::parse_type)?);
                    }
                    self.expect(Token::RParen)?;
                    if items.len() == 1 {
                        items.remove(0)
                    } else {
                        TypeExpr::Tuple(items)
                    }
                }
            }
        } else {
            TypeExpr::Named(self.parse_dotted_name()?)
        };

        while self.check(&Token::LBracket) && self.peek_nth(1) == Some(&Token::RBracket) {
            self.advance();
            self.advance();
            ty = TypeExpr::Array(Box::new(ty));
        }
        Ok(ty)
    }

    /// Parse `Adj + Ctl` after `is`.
    fn parse_characteristics(&mut self) -> ParseResult<Vec<String>> {
        let mut names = Vec::new();
        let mut depth = 0usize;
        loop {
            match self.peek() {
                Some(Token::Identifier(_)) => names.push(self.parse_identifier()?),
                Some(Token::Plus | Token::Star) => {
                    self.advance();
                }
                Some(Token::LParen) => {
                    depth += 1;
                    self.advance();
                }
                Some(Token::RParen) if depth > 0 => {
                    depth -= 1;
                    self.advance();
                }
                _ => break,
            }
        }
        if names.is_empty() {
            return Err(self.unexpected("functor characteristics"));
        }
        Ok(names)
    }

    /// Parse explicit specializations after the opening brace.
    fn parse_specializations(
        &mut self,
        name: &str,
    ) -> ParseResult<(Block, Option<AdjointSpec>)> {
        let mut body = None;
        let mut adjoint = None;

        while !self.consume(&Token::RBrace) {
            match self.advance() {
                Some(Token::Body) => {
                    if matches!(self.peek(), Some(Token::Identifier(w)) if w == "intrinsic") {
                        return Err(ParseError::Unsupported {
                            line: self.line(),
                            message: format!("intrinsic body on '{name}'"),
                        });
                    }
                    self.skip_spec_args()?;
                    self.expect(Token::LBrace)?;
                    body = Some(self.nested(Self::parse_block_contents)?);
                }
                Some(Token::AdjointSpec) => {
                    if self.check(&Token::ControlledSpec) {
                        self.advance();
                        self.skip_specialization()?;
                        continue;
                    }
                    match self.peek() {
                        Some(Token::Identifier(generator)) => {
                            adjoint = Some(match generator.as_str() {
                                "self" => AdjointSpec::SelfAdjoint,
                                "auto" | "invert" => AdjointSpec::Auto,
                                other => {
                                    return Err(ParseError::Unsupported {
                                        line: self.line(),
                                        message: format!("adjoint generator '{other}'"),
                                    });
                                }
                            });
                            self.advance();
                            self.expect(Token::Semicolon)?;
                        }
                        _ => {
                            self.skip_spec_args()?;
                            self.expect(Token::LBrace)?;
                            adjoint = Some(AdjointSpec::Explicit(
                                self.nested(Self::parse_block_contents)?,
                            ));
                        }
                    }
                }
                Some(Token::ControlledSpec) => self.skip_specialization()?,
                Some(other) => {
                    return Err(ParseError::UnexpectedToken {
                        line: self.line(),
                        expected: "specialization".into(),
                        found: other.to_string(),
                    });
                }
                None => return Err(ParseError::UnexpectedEof("}".into())),
            }
        }

        let body = body.ok_or_else(|| ParseError::Generic {
            line: self.line(),
            message: format!("'{name}' declares specializations without a body"),
        })?;
        Ok((body, adjoint))
    }

    /// Skip a `(...)` specialization argument list, if present.
    fn skip_spec_args(&mut self) -> ParseResult<()> {
        if !self.consume(&Token::LParen) {
            return Ok(());
        }
        while !self.consume(&Token::RParen) {
            if self.advance().is_none() {
                return Err(ParseError::UnexpectedEof(")".into()));
            }
        }
        Ok(())
    }

    /// Skip a specialization this parser keeps no record of, either a
    /// generator directive ending in `;` or an explicit block.
    fn skip_specialization(&mut self) -> ParseResult<()> {
        if self.consume(&Token::AdjointSpec) {
            return self.skip_specialization();
        }
        if matches!(self.peek(), Some(Token::Identifier(_))) {
            self.advance();
            self.expect(Token::Semicolon)?;
            return Ok(());
        }
        self.skip_spec_args()?;
        self.expect(Token::LBrace)?;
        self.nested(Self::parse_block_contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{AdjointSpec, TypeExpr};
    use crate::parse;

    #[test]
    fn test_parse_params_and_types() {
        let program = parse(
            "operation Apply(op : (Qubit => Unit is Adj), qs : Qubit[], n : Int) : (Result, Int)[] { [] }",
        )
        .unwrap();
        let decl = &program.callables[0];
        assert_eq!(decl.params.len(), 3);
        assert!(matches!(decl.params[0].ty, TypeExpr::Callable(_, _)));
        assert_eq!(
            decl.params[1].ty,
            TypeExpr::Array(Box::new(TypeExpr::Named("Qubit".into())))
        );
        assert!(matches!(decl.return_type, TypeExpr::Array(_)));
    }

    #[test]
    fn test_characteristics() {
        let program = parse("operation Prep(q : Qubit) : Unit is Adj + Ctl { H(q); }").unwrap();
        let decl = &program.callables[0];
        assert_eq!(decl.characteristics, vec!["Adj", "Ctl"]);
        assert!(matches!(decl.adjoint, Some(AdjointSpec::Auto)));
    }

    #[test]
    fn test_specializations() {
        let source = r"
            operation Flip(q : Qubit) : Unit is Adj + Ctl {
                body (...) { X(q); }
                adjoint self;
                controlled distribute;
            }
            operation Turn(q : Qubit) : Unit {
                body (...) { S(q); }
                adjoint (...) { Adjoint S(q); }
            }
        ";
        let program = parse(source).unwrap();
        assert!(matches!(
            program.callables[0].adjoint,
            Some(AdjointSpec::SelfAdjoint)
        ));
        assert_eq!(program.callables[0].body.stmts.len(), 1);
        assert!(matches!(
            program.callables[1].adjoint,
            Some(AdjointSpec::Explicit(_))
        ));
    }

    #[test]
    fn test_attributes_and_imports() {
        let source = r"
            import Std.Diagnostics.*;
            @Config(Unrestricted)
            @EntryPoint()
            operation Main() : Unit {}
        ";
        let program = parse(source).unwrap();
        assert_eq!(program.opens, vec!["Std.Diagnostics"]);
        assert_eq!(program.callables[0].attributes, vec!["Config", "EntryPoint"]);
    }

    #[test]
    fn test_unsupported_generics() {
        assert!(parse("function Id<'T>(x : 'T) : 'T { x }").is_err());
    }
}
