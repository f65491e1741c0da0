//! Expression parsing for Q#.

use super::Parser;
use crate::ast::{BinOp, Expr, Functor, InterpPart, Pauli, UnOp};
use crate::error::{ParseError, ParseResult};
use crate::lexer::Token;

impl Parser {
    /// Parse an expression, including ranges.
    pub(super) fn parse_expression(&mut self) -> ParseResult<Expr> {
        self.nested(Self::parse_range_expr)
    }

    fn parse_range_expr(&mut self) -> ParseResult<Expr> {
        if self.consume(&Token::Ellipsis) {
            let end = if self.starts_expression() {
                Some(Box::new(self.parse_update_expr()?))
            } else {
                None
            };
            return Ok(Expr::Range {
                start: None,
                step: None,
                end,
            });
        }

        let start = self.parse_update_expr()?;
        if self.consume(&Token::DotDot) {
            let second = self.parse_update_expr()?;
            let range = if self.consume(&Token::DotDot) {
                let end = self.parse_update_expr()?;
                Expr::Range {
                    start: Some(Box::new(start)),
                    step: Some(Box::new(second)),
                    end: Some(Box::new(end)),
                }
            } else if self.consume(&Token::Ellipsis) {
                Expr::Range {
                    start: Some(Box::new(start)),
                    step: Some(Box::new(second)),
                    end: None,
                }
            } else {
                Expr::Range {
                    start: Some(Box::new(start)),
                    step: None,
                    end: Some(Box::new(second)),
                }
            };
            return Ok(range);
        }
        if self.consume(&Token::Ellipsis) {
            return Ok(Expr::Range {
                start: Some(Box::new(start)),
                step: None,
                end: None,
            });
        }
        Ok(start)
    }

    /// Parse copy-and-update `a w/ i <- v`.
    fn parse_update_expr(&mut self) -> ParseResult<Expr> {
        let mut target = self.parse_ternary_expr()?;
        while self.consume(&Token::With) {
            let index = self.parse_ternary_expr()?;
            self.expect(Token::LArrow)?;
            let value = self.parse_ternary_expr()?;
            target = Expr::Update {
                target: Box::new(target),
                index: Box::new(index),
                value: Box::new(value),
            };
        }
        Ok(target)
    }

    /// Parse the conditional operator `c ? a | b` (right associative).
    fn parse_ternary_expr(&mut self) -> ParseResult<Expr> {
        let condition = self.parse_binary_expr(0)?;
        if !self.consume(&Token::Question) {
            return Ok(condition);
        }
        let then = self.nested(Self::parse_ternary_expr)?;
        self.expect(Token::Pipe)?;
        let otherwise = self.nested(Self::parse_ternary_expr)?;
        Ok(Expr::Ternary {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    /// Parse binary expression with precedence climbing.
    fn parse_binary_expr(&mut self, min_prec: u8) -> ParseResult<Expr> {
        let mut left = self.parse_unary_expr()?;

        while let Some(op) = self.peek_binary_op() {
            let prec = op_precedence(op);
            if prec < min_prec {
                break;
            }
            self.advance(); // consume operator

            // `^` is right associative
            let next_min = if op == BinOp::Pow { prec } else { prec + 1 };
            let right = self.nested(|p| p.parse_binary_expr(next_min))?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// Parse unary expression.
    fn parse_unary_expr(&mut self) -> ParseResult<Expr> {
        let op = match self.peek() {
            Some(Token::Minus) => Some(UnOp::Neg),
            Some(Token::Not | Token::Bang) => Some(UnOp::Not),
            Some(Token::BitNot) => Some(UnOp::BitNot),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let operand = self.nested(Self::parse_unary_expr)?;
            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
            });
        }
        if self.consume(&Token::Plus) {
            return self.nested(Self::parse_unary_expr);
        }

        let base = self.parse_functor_expr()?;
        self.parse_postfix(base)
    }

    /// Parse `Adjoint`/`Controlled` applied to a callable, without its call.
    fn parse_functor_expr(&mut self) -> ParseResult<Expr> {
        let functor = match self.peek() {
            Some(Token::Adjoint) => Functor::Adjoint,
            Some(Token::Controlled) => Functor::Controlled,
            _ => return self.parse_primary_expr(),
        };
        self.advance();
        let target = self.nested(Self::parse_functor_expr)?;
        Ok(Expr::Functor {
            functor,
            target: Box::new(target),
        })
    }

    /// Parse calls and indexing following a primary expression.
    fn parse_postfix(&mut self, mut expr: Expr) -> ParseResult<Expr> {
        loop {
            if self.consume(&Token::LParen) {
                let args = self.parse_expression_list(&Token::RParen)?;
                self.expect(Token::RParen)?;
                expr = Expr::Call {
                    callee: Box::new(expr),
                    args,
                };
            } else if self.consume(&Token::LBracket) {
                let index = self.parse_expression()?;
                self.expect(Token::RBracket)?;
                expr = Expr::Index {
                    target: Box::new(expr),
                    index: Box::new(index),
                };
            } else if self.check(&Token::ColonColon) {
                return Err(ParseError::Unsupported {
                    line: self.line(),
                    message: "field access".into(),
                });
            } else {
                return Ok(expr);
            }
        }
    }

    /// Parse primary expression.
    fn parse_primary_expr(&mut self) -> ParseResult<Expr> {
        let token = self
            .peek()
            .cloned()
            .ok_or_else(|| ParseError::UnexpectedEof("expression".into()))?;

        let literal = match &token {
            Token::IntLiteral(v) => Some(Expr::Int(*v)),
            Token::DoubleLiteral(v) => Some(Expr::Double(*v)),
            Token::StringLiteral(s) => Some(Expr::String(s.clone())),
            Token::True => Some(Expr::Bool(true)),
            Token::False => Some(Expr::Bool(false)),
            Token::Zero => Some(Expr::Result(false)),
            Token::One => Some(Expr::Result(true)),
            Token::PauliI => Some(Expr::Pauli(Pauli::I)),
            Token::PauliX => Some(Expr::Pauli(Pauli::X)),
            Token::PauliY => Some(Expr::Pauli(Pauli::Y)),
            Token::PauliZ => Some(Expr::Pauli(Pauli::Z)),
            _ => None,
        };
        if let Some(expr) = literal {
            self.advance();
            return Ok(expr);
        }

        match token {
            Token::InterpolatedString(raw) => {
                let line = self.line();
                self.advance();
                parse_interpolation(&raw, line)
            }
            Token::Identifier(_) => Ok(Expr::Path(self.parse_dotted_name()?)),
            Token::LParen => {
                self.advance();
                if self.consume(&Token::RParen) {
                    return Ok(Expr::Unit);
                }
                let first = self.parse_expression()?;
                if !self.consume(&Token::Comma) {
                    self.expect(Token::RParen)?;
                    return Ok(first);
                }
                let mut items = vec![first];
                items.extend(self.parse_expression_list(&Token::RParen)?);
                self.expect(Token::RParen)?;
                Ok(Expr::Tuple(items))
            }
            Token::LBracket => self.parse_array_expr(),
            Token::If => self.parse_if_expr(),
            Token::LBrace => Ok(Expr::Block(self.parse_block()?)),
            _ => Err(self.unexpected("expression")),
        }
    }

    /// Parse `[a, b]` or `[value, size = n]`.
    fn parse_array_expr(&mut self) -> ParseResult<Expr> {
        self.expect(Token::LBracket)?;
        if self.consume(&Token::RBracket) {
            return Ok(Expr::Array(vec![]));
        }

        let first = self.parse_expression()?;
        let is_sized = self.check(&Token::Comma)
            && matches!(self.peek_nth(1), Some(Token::Identifier(w)) if w == "size")
            && self.peek_nth(2) == Some(&Token::Eq);
        if is_sized {
            self.advance(); // ,
            self.advance(); // size
            self.advance(); // =
            let size = self.parse_expression()?;
            self.expect(Token::RBracket)?;
            return Ok(Expr::ArrayRepeat {
                value: Box::new(first),
                size: Box::new(size),
            });
        }

        let mut items = vec![first];
        if self.consume(&Token::Comma) {
            items.extend(self.parse_expression_list(&Token::RBracket)?);
        }
        self.expect(Token::RBracket)?;
        Ok(Expr::Array(items))
    }

    /// Parse an `if` / `elif` / `else` chain.
    pub(super) fn parse_if_expr(&mut self) -> ParseResult<Expr> {
        self.expect(Token::If)?;
        let mut branches = vec![(self.parse_expression()?, self.parse_block()?)];
        let mut otherwise = None;
        loop {
            if self.consume(&Token::Elif) {
                branches.push((self.parse_expression()?, self.parse_block()?));
            } else if self.consume(&Token::Else) {
                if self.check(&Token::If) {
                    // `else if` nests as a single-expression block.
                    let nested = self.parse_if_expr()?;
                    otherwise = Some(crate::ast::Block {
                        stmts: vec![],
                        tail: Some(Box::new(nested)),
                    });
                } else {
                    otherwise = Some(self.parse_block()?);
                }
                break;
            } else {
                break;
            }
        }
        Ok(Expr::If {
            branches,
            otherwise,
        })
    }

    /// Peek at binary operator.
    fn peek_binary_op(&self) -> Option<BinOp> {
        match self.peek()? {
            Token::Plus => Some(BinOp::Add),
            Token::Minus => Some(BinOp::Sub),
            Token::Star => Some(BinOp::Mul),
            Token::Slash => Some(BinOp::Div),
            Token::Percent => Some(BinOp::Mod),
            Token::Caret => Some(BinOp::Pow),
            Token::EqEq => Some(BinOp::Eq),
            Token::NotEq => Some(BinOp::NotEq),
            Token::Lt => Some(BinOp::Lt),
            Token::LtEq => Some(BinOp::LtEq),
            Token::Gt => Some(BinOp::Gt),
            Token::GtEq => Some(BinOp::GtEq),
            Token::And => Some(BinOp::And),
            Token::Or => Some(BinOp::Or),
            Token::BitAnd => Some(BinOp::BitAnd),
            Token::BitOr => Some(BinOp::BitOr),
            Token::BitXor => Some(BinOp::BitXor),
            Token::LShift => Some(BinOp::Shl),
            Token::RShift => Some(BinOp::Shr),
            _ => None,
        }
    }

    /// Parse a comma separated list up to (not including) `close`.
    pub(super) fn parse_expression_list(&mut self, close: &Token) -> ParseResult<Vec<Expr>> {
        let mut exprs = Vec::new();
        while !self.check(close) {
            exprs.push(self.parse_expression()?);
            if !self.consume(&Token::Comma) {
                break;
            }
        }
        Ok(exprs)
    }

    /// Whether the current token can begin an expression.
    fn starts_expression(&self) -> bool {
        !matches!(
            self.peek(),
            None | Some(
                Token::RBracket
                    | Token::RParen
                    | Token::RBrace
                    | Token::Comma
                    | Token::Semicolon
                    | Token::LBrace
            )
        )
    }
}

/// Get operator precedence.
fn op_precedence(op: BinOp) -> u8 {
    match op {
        BinOp::Or => 1,
        BinOp::And => 2,
        BinOp::Eq | BinOp::NotEq => 3,
        BinOp::Lt | BinOp::LtEq | BinOp::Gt | BinOp::GtEq => 4,
        BinOp::BitOr => 5,
        BinOp::BitXor => 6,
        BinOp::BitAnd => 7,
        BinOp::Shl | BinOp::Shr => 8,
        BinOp::Add | BinOp::Sub => 9,
        BinOp::Mul | BinOp::Div | BinOp::Mod => 10,
        BinOp::Pow => 11,
    }
}

/// Split the body of `$"..."` into text and embedded expressions.
fn parse_interpolation(raw: &str, line: usize) -> ParseResult<Expr> {
    let mut parts = Vec::new();
    let mut text = String::new();
    let mut chars = raw.char_indices();

    while let Some((start, c)) = chars.next() {
        if c != '{' {
            text.push(c);
            continue;
        }

        let mut depth = 1;
        let mut end = None;
        for (i, c) in chars.by_ref() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        end = Some(i);
                        break;
                    }
                }
                _ => {}
            }
        }
        let end = end.ok_or_else(|| ParseError::Generic {
            line,
            message: format!("unterminated '{{' in interpolated string \"{raw}\""),
        })?;

        if !text.is_empty() {
            parts.push(InterpPart::Text(std::mem::take(&mut text)));
        }
        parts.push(InterpPart::Expr(super::parse_expression(&raw[start + 1..end])?));
    }

    if !text.is_empty() {
        parts.push(InterpPart::Text(text));
    }
    Ok(Expr::Interpolated(parts))
}
