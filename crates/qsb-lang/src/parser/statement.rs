//! Statement and block parsing.

use super::Parser;
use crate::ast::{BinOp, Block, Expr, Pattern, QubitInit, Stmt};
use crate::error::{ParseError, ParseResult};
use crate::lexer::Token;

impl Parser {
    /// Parse a `{ ... }` block.
    pub(super) fn parse_block(&mut self) -> ParseResult<Block> {
        self.expect(Token::LBrace)?;
        self.nested(Self::parse_block_contents)
    }

    /// Parse block contents after the opening brace, through the closing one.
    pub(super) fn parse_block_contents(&mut self) -> ParseResult<Block> {
        let mut block = Block::default();
        loop {
            if self.consume(&Token::RBrace) {
                return Ok(block);
            }
            if self.is_eof() {
                return Err(ParseError::UnexpectedEof("}".into()));
            }
            // Stray semicolons are allowed, e.g. after a local callable.
            if self.consume(&Token::Semicolon) {
                continue;
            }

            match self.parse_statement()? {
                StmtOrTail::Stmt(stmt) => block.stmts.push(stmt),
                StmtOrTail::Tail(expr) => {
                    self.expect(Token::RBrace)?;
                    block.tail = Some(Box::new(expr));
                    return Ok(block);
                }
            }
        }
    }

    /// Parse a statement, or the trailing expression of a block.
    fn parse_statement(&mut self) -> ParseResult<StmtOrTail> {
        let token = self
            .peek()
            .cloned()
            .ok_or_else(|| ParseError::UnexpectedEof("statement".into()))?;

        let stmt = match token {
            Token::Let | Token::Mutable => self.parse_binding()?,
            Token::Set => self.parse_set()?,
            Token::Use | Token::Borrow => self.parse_use()?,
            Token::For => self.parse_for()?,
            Token::While => {
                self.advance();
                let condition = self.parse_expression()?;
                let body = self.parse_block()?;
                Stmt::While { condition, body }
            }
            Token::Repeat => self.parse_repeat()?,
            Token::Within => {
                self.advance();
                let within = self.parse_block()?;
                self.expect(Token::Apply)?;
                let apply = self.parse_block()?;
                Stmt::Within { within, apply }
            }
            Token::Return => {
                self.advance();
                let value = if self.check(&Token::Semicolon) {
                    Expr::Unit
                } else {
                    self.parse_expression()?
                };
                self.expect(Token::Semicolon)?;
                Stmt::Return(value)
            }
            Token::Fail => {
                self.advance();
                let message = self.parse_expression()?;
                self.expect(Token::Semicolon)?;
                Stmt::Fail(message)
            }
            Token::At | Token::Operation | Token::Function => {
                Stmt::Callable(Box::new(self.parse_callable_decl()?))
            }
            Token::If | Token::LBrace => {
                // Block-like expressions need no terminating semicolon.
                let expr = if token == Token::If {
                    self.parse_if_expr()?
                } else {
                    Expr::Block(self.parse_block()?)
                };
                if self.check(&Token::RBrace) {
                    return Ok(StmtOrTail::Tail(expr));
                }
                self.consume(&Token::Semicolon);
                Stmt::Expr(expr)
            }
            _ => {
                let expr = self.parse_expression()?;
                if self.consume(&Token::Semicolon) {
                    Stmt::Expr(expr)
                } else if self.check(&Token::RBrace) {
                    return Ok(StmtOrTail::Tail(expr));
                } else {
                    return Err(self.unexpected(";"));
                }
            }
        };
        Ok(StmtOrTail::Stmt(stmt))
    }

    /// Parse `let` and `mutable` bindings.
    fn parse_binding(&mut self) -> ParseResult<Stmt> {
        let mutable = matches!(self.advance(), Some(Token::Mutable));
        let pattern = self.parse_pattern()?;
        if self.consume(&Token::Colon) {
            self.parse_type()?;
        }
        self.expect(Token::Eq)?;
        let value = self.parse_expression()?;
        self.expect(Token::Semicolon)?;

        Ok(if mutable {
            Stmt::Mutable { pattern, value }
        } else {
            Stmt::Let { pattern, value }
        })
    }

    /// Parse `set` statements.
    fn parse_set(&mut self) -> ParseResult<Stmt> {
        self.expect(Token::Set)?;
        let target = self.parse_identifier()?;

        let op = match self.advance() {
            Some(Token::Eq) => None,
            Some(Token::PlusEq) => Some(BinOp::Add),
            Some(Token::MinusEq) => Some(BinOp::Sub),
            Some(Token::StarEq) => Some(BinOp::Mul),
            Some(Token::SlashEq) => Some(BinOp::Div),
            Some(Token::PercentEq) => Some(BinOp::Mod),
            Some(Token::CaretEq) => Some(BinOp::Pow),
            Some(Token::WithEq) => {
                let index = self.parse_expression()?;
                self.expect(Token::LArrow)?;
                let value = self.parse_expression()?;
                self.expect(Token::Semicolon)?;
                return Ok(Stmt::SetUpdate {
                    target,
                    index,
                    value,
                });
            }
            Some(other) => {
                return Err(ParseError::UnexpectedToken {
                    line: self.line(),
                    expected: "assignment operator".into(),
                    found: other.to_string(),
                });
            }
            None => return Err(ParseError::UnexpectedEof("assignment operator".into())),
        };

        let value = self.parse_expression()?;
        self.expect(Token::Semicolon)?;
        Ok(Stmt::Set { target, op, value })
    }

    /// Parse `use` and `borrow` statements.
    fn parse_use(&mut self) -> ParseResult<Stmt> {
        self.advance();
        let pattern = self.parse_pattern()?;
        self.expect(Token::Eq)?;
        let init = self.parse_qubit_init()?;

        let body = if self.check(&Token::LBrace) {
            Some(self.parse_block()?)
        } else {
            self.expect(Token::Semicolon)?;
            None
        };

        Ok(Stmt::Use {
            pattern,
            init,
            body,
        })
    }

    /// Parse `Qubit()`, `Qubit[n]` or a tuple of those.
    fn parse_qubit_init(&mut self) -> ParseResult<QubitInit> {
        if self.consume(&Token::LParen) {
            let mut items = vec![self.parse_qubit_init()?];
            while self.consume(&Token::Comma) {
                items.push(self.parse_qubit_init()?);
            }
            self.expect(Token::RParen)?;
            return Ok(if items.len() == 1 {
                items.remove(0)
            } else {
                QubitInit::Tuple(items)
            });
        }

        let name = self.parse_identifier()?;
        if name != "Qubit" {
            return Err(ParseError::UnexpectedToken {
                line: self.line(),
                expected: "Qubit() or Qubit[n]".into(),
                found: name,
            });
        }

        if self.consume(&Token::LBracket) {
            let size = self.parse_expression()?;
            self.expect(Token::RBracket)?;
            Ok(QubitInit::Array(Box::new(size)))
        } else {
            self.expect(Token::LParen)?;
            self.expect(Token::RParen)?;
            Ok(QubitInit::Single)
        }
    }

    /// Parse `for p in e { ... }`.
    fn parse_for(&mut self) -> ParseResult<Stmt> {
        self.expect(Token::For)?;
        let pattern = self.parse_pattern()?;
        if self.consume(&Token::Colon) {
            self.parse_type()?;
        }
        self.expect(Token::In)?;
        let iterable = self.parse_expression()?;
        let body = self.parse_block()?;
        Ok(Stmt::For {
            pattern,
            iterable,
            body,
        })
    }

    /// Parse `repeat { ... } until c fixup { ... }`.
    fn parse_repeat(&mut self) -> ParseResult<Stmt> {
        self.expect(Token::Repeat)?;
        let body = self.parse_block()?;
        self.expect(Token::Until)?;
        let until = self.parse_expression()?;
        let fixup = if self.consume(&Token::Fixup) {
            Some(self.parse_block()?)
        } else {
            self.expect(Token::Semicolon)?;
            None
        };
        Ok(Stmt::Repeat { body, until, fixup })
    }

    /// Parse a binding pattern.
    pub(super) fn parse_pattern(&mut self) -> ParseResult<Pattern> {
        if self.consume(&Token::LParen) {
            let mut items = Vec::new();
            if !self.check(&Token::RParen) {
                items.push(self.nested(Self::parse_pattern)?);
                while self.consume(&Token::Comma) {
                    items.push(self.nested(Self::parse_pattern)?);
                }
            }
            self.expect(Token::RParen)?;
            return Ok(Pattern::Tuple(items));
        }

        let name = self.parse_identifier()?;
        Ok(if name == "_" {
            Pattern::Discard
        } else {
            Pattern::Bind(name)
        })
    }
}

/// A parsed block element.
enum StmtOrTail {
    Stmt(Stmt),
    Tail(Expr),
}
