//! Recursive-descent parser for the Q# subset.

mod expression;
mod item;
mod statement;

use crate::ast::{Expr, Program};
use crate::error::{ParseError, ParseResult};
use crate::lexer::{SpannedToken, Token, tokenize};

/// Deepest syntactic nesting the parser accepts.
pub const MAX_NESTING: usize = 64;

/// Parse Q# source text into a [`Program`].
pub fn parse(source: &str) -> ParseResult<Program> {
    let mut parser = Parser::new(source)?;
    parser.parse_program()
}

/// Parse a standalone expression, e.g. `Foo()` or a block expression
/// `{ operation Foo() : Result { ... }; Foo() }`.
pub fn parse_expression(source: &str) -> ParseResult<Expr> {
    let mut parser = Parser::new(source)?;
    let expr = parser.parse_expression()?;
    parser.consume(&Token::Semicolon);
    if let Some(token) = parser.peek() {
        return Err(ParseError::UnexpectedToken {
            line: parser.line(),
            expected: "end of expression".into(),
            found: token.to_string(),
        });
    }
    Ok(expr)
}

/// Parser state.
pub(super) struct Parser {
    pub(super) tokens: Vec<SpannedToken>,
    pub(super) pos: usize,
    /// Byte offsets at which each source line starts.
    line_starts: Vec<usize>,
    /// Current nesting of blocks, expressions, patterns and types.
    depth: usize,
}

impl Parser {
    /// Create a new parser from source.
    fn new(source: &str) -> ParseResult<Self> {
        let line_starts: Vec<usize> = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();

        let mut tokens = Vec::new();
        for result in tokenize(source) {
            match result {
                Ok(t) => tokens.push(t),
                Err((span, message)) => {
                    let line = line_of(&line_starts, span.start);
                    return Err(ParseError::LexerError {
                        line,
                        column: span.start - line_starts[line - 1] + 1,
                        message,
                    });
                }
            }
        }

        Ok(Self {
            tokens,
            pos: 0,
            line_starts,
            depth: 0,
        })
    }

    /// The 1-based line of the current token (or of the last one at EOF).
    pub(super) fn line(&self) -> usize {
        let offset = self
            .tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(0, |t| t.span.start);
        line_of(&self.line_starts, offset)
    }

    /// Check if we've reached the end.
    pub(super) fn is_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Peek at the current token.
    pub(super) fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    /// Peek `n` tokens ahead of the current one.
    pub(super) fn peek_nth(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n).map(|t| &t.token)
    }

    /// Advance and return the current token.
    pub(super) fn advance(&mut self) -> Option<Token> {
        if self.is_eof() {
            return None;
        }
        let token = self.tokens[self.pos].token.clone();
        self.pos += 1;
        Some(token)
    }

    /// Expect a specific token.
    #[allow(clippy::needless_pass_by_value)]
    pub(super) fn expect(&mut self, expected: Token) -> ParseResult<()> {
        let line = self.line();
        let found = self
            .advance()
            .ok_or_else(|| ParseError::UnexpectedEof(expected.to_string()))?;

        if std::mem::discriminant(&found) != std::mem::discriminant(&expected) {
            return Err(ParseError::UnexpectedToken {
                line,
                expected: expected.to_string(),
                found: found.to_string(),
            });
        }
        Ok(())
    }

    /// Check if current token matches.
    pub(super) fn check(&self, token: &Token) -> bool {
        self.peek()
            .is_some_and(|t| std::mem::discriminant(t) == std::mem::discriminant(token))
    }

    /// Consume token if it matches.
    pub(super) fn consume(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Run `f` one nesting level deeper.
    pub(super) fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<T> {
        if self.depth >= MAX_NESTING {
            return Err(ParseError::NestingTooDeep {
                line: self.line(),
                limit: MAX_NESTING,
            });
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// Build an "unexpected token" error for the current position.
    pub(super) fn unexpected(&self, expected: &str) -> ParseError {
        match self.peek() {
            Some(found) => ParseError::UnexpectedToken {
                line: self.line(),
                expected: expected.into(),
                found: found.to_string(),
            },
            None => ParseError::UnexpectedEof(expected.into()),
        }
    }

    /// Parse an identifier.
    pub(super) fn parse_identifier(&mut self) -> ParseResult<String> {
        match self.peek() {
            Some(Token::Identifier(_)) => match self.advance() {
                Some(Token::Identifier(s)) => Ok(s),
                _ => Err(self.unexpected("identifier")),
            },
            _ => Err(self.unexpected("identifier")),
        }
    }

    /// Parse a dotted name such as `Microsoft.Quantum.Intrinsic`.
    pub(super) fn parse_dotted_name(&mut self) -> ParseResult<String> {
        let mut name = self.parse_identifier()?;
        while self.check(&Token::Dot) && matches!(self.peek_nth(1), Some(Token::Identifier(_))) {
            self.advance();
            name.push('.');
            name.push_str(&self.parse_identifier()?);
        }
        Ok(name)
    }
}

fn line_of(line_starts: &[usize], offset: usize) -> usize {
    match line_starts.binary_search(&offset) {
        Ok(i) => i + 1,
        Err(i) => i,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{CallableKind, Stmt};

    #[test]
    fn test_parse_bell_program() {
        let source = r"
            namespace Bell {
                open Microsoft.Quantum.Intrinsic;

                @EntryPoint()
                operation Main() : (Result, Result) {
                    use (q0, q1) = (Qubit(), Qubit());
                    H(q0);
                    CNOT(q0, q1);
                    (MResetZ(q0), MResetZ(q1))
                }
            }
        ";

        let program = parse(source).unwrap();
        assert_eq!(program.callables.len(), 1);
        assert_eq!(program.opens, vec!["Microsoft.Quantum.Intrinsic"]);

        let main = &program.callables[0];
        assert_eq!(main.name, "Main");
        assert_eq!(main.namespace.as_deref(), Some("Bell"));
        assert_eq!(main.kind, CallableKind::Operation);
        assert!(main.has_attribute("EntryPoint"));
        assert_eq!(main.body.stmts.len(), 3);
        assert!(main.body.tail.is_some());
    }

    #[test]
    fn test_parse_top_level_items() {
        let source = r#"
            function Double(x : Int) : Int { 2 * x }
            operation Run() : Unit { Message($"{Double(2)}"); }
        "#;
        let program = parse(source).unwrap();
        assert_eq!(program.callables.len(), 2);
        assert!(program.callables[0].namespace.is_none());
        assert_eq!(program.callables[0].kind, CallableKind::Function);
        assert_eq!(program.callables[0].params[0].name, "x");
    }

    #[test]
    fn test_parse_expression_block() {
        let expr = parse_expression(
            "{ operation Foo() : Result { use q = Qubit(); let r = M(q); Reset(q); r }; Foo() }",
        )
        .unwrap();
        let Expr::Block(block) = expr else {
            panic!("expected block expression");
        };
        assert!(matches!(block.stmts[0], Stmt::Callable(_)));
        assert!(block.tail.is_some());
    }

    #[test]
    fn test_line_numbers_in_errors() {
        let err = parse("operation Main() : Unit {\n  let x = ;\n}").unwrap_err();
        match err {
            ParseError::UnexpectedToken { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_lexer_error_position() {
        let err = parse("operation Main() : Unit {\n  let x = #;\n}").unwrap_err();
        match err {
            ParseError::LexerError { line, column, .. } => {
                assert_eq!(line, 2);
                assert_eq!(column, 11);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_trailing_garbage_in_expression() {
        assert!(parse_expression("Foo() Bar()").is_err());
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |n: usize| format!("{}1{}", "(".repeat(n), ")".repeat(n));

        // The outermost call takes one level.
        assert_eq!(parse_expression(&nested(MAX_NESTING - 1)).unwrap(), Expr::Int(1));

        for source in [
            nested(5000),
            format!("{}1", "- ".repeat(5000)),
            format!("1{}", " ^ 2".repeat(5000)),
            format!("{}{{}}{}", "{ ".repeat(5000), " }".repeat(5000)),
        ] {
            assert!(
                matches!(
                    parse_expression(&source),
                    Err(ParseError::NestingTooDeep { limit: MAX_NESTING, .. })
                ),
                "{}",
                &source[..16]
            );
        }
    }

    #[test]
    fn test_nested_callables_hit_the_limit() {
        let source = format!(
            "operation Main() : Unit {{ {} }}",
            "operation F() : Unit { ".repeat(500) + &"}".repeat(500)
        );
        assert!(matches!(
            parse(&source),
            Err(ParseError::NestingTooDeep { .. })
        ));
    }
}
