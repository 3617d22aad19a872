use crate::ast::*;
use crate::error::{ScriptError, ScriptResult};
use crate::lexer::{tokenize, Token};
use crate::value::number_value;
use serde_json::Value;
use std::ops::Range;

/// Deepest nesting of blocks, operators and sub-expressions a script may use
pub const MAX_NESTING: usize = 128;

/// Recursive-descent parser for behavior scripts
pub struct Parser<'src> {
    tokens: Vec<(Token<'src>, Range<usize>)>,
    pos: usize,
    source_len: usize,
    depth: usize,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> ScriptResult<Self> {
        Ok(Self {
            tokens: tokenize(source)?,
            pos: 0,
            source_len: source.len(),
            depth: 0,
        })
    }

    pub fn parse_script(&mut self) -> ScriptResult<Script> {
        let mut body = Vec::new();
        while !self.is_at_end() {
            body.push(self.parse_statement()?);
        }
        Ok(Script { body })
    }

    fn parse_statement(&mut self) -> ScriptResult<Stmt> {
        match self.peek() {
            Some((Token::Let, _)) => {
                self.advance();
                let name = self.expect_ident()?;
                self.expect(Token::Assign)?;
                let value = self.parse_expression()?;
                self.match_token(Token::Semi);
                Ok(Stmt::Let { name, value })
            }
            Some((Token::If, _)) => self.parse_if(),
            Some((Token::Return, _)) => {
                self.advance();
                self.match_token(Token::Semi);
                Ok(Stmt::Return)
            }
            Some((Token::Ident(name), _))
                if matches!(self.peek_ahead(1), Some((Token::Assign, _))) =>
            {
                let name = name.to_string();
                self.advance();
                self.advance();
                let value = self.parse_expression()?;
                self.match_token(Token::Semi);
                Ok(Stmt::Assign { name, value })
            }
            _ => {
                let expr = self.parse_expression()?;
                self.match_token(Token::Semi);
                Ok(Stmt::Expr(expr))
            }
        }
    }

    fn parse_if(&mut self) -> ScriptResult<Stmt> {
        let mark = self.enter()?;
        self.expect(Token::If)?;
        let condition = self.parse_expression()?;
        let then_branch = self.parse_block()?;

        let else_branch = if self.match_token(Token::Else) {
            if self.check(Token::If) {
                vec![self.parse_if()?]
            } else {
                self.parse_block()?
            }
        } else {
            Vec::new()
        };

        self.depth = mark;
        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn parse_block(&mut self) -> ScriptResult<Vec<Stmt>> {
        let mark = self.enter()?;
        self.expect(Token::LBrace)?;
        let mut body = Vec::new();
        while !self.check(Token::RBrace) && !self.is_at_end() {
            body.push(self.parse_statement()?);
        }
        self.expect(Token::RBrace)?;
        self.depth = mark;
        Ok(body)
    }

    fn parse_expression(&mut self) -> ScriptResult<Expr> {
        let mark = self.enter()?;
        let expr = self.parse_or_expression()?;
        self.depth = mark;
        Ok(expr)
    }

    // Each operator folded into `left` adds a level to the tree, so it
    // counts towards the nesting limit until the chain ends.

    fn parse_or_expression(&mut self) -> ScriptResult<Expr> {
        let mark = self.depth;
        let mut left = self.parse_and_expression()?;
        while self.match_token(Token::Or) {
            self.enter()?;
            let right = self.parse_and_expression()?;
            left = binary(left, BinaryOp::Or, right);
        }
        self.depth = mark;
        Ok(left)
    }

    fn parse_and_expression(&mut self) -> ScriptResult<Expr> {
        let mark = self.depth;
        let mut left = self.parse_equality_expression()?;
        while self.match_token(Token::And) {
            self.enter()?;
            let right = self.parse_equality_expression()?;
            left = binary(left, BinaryOp::And, right);
        }
        self.depth = mark;
        Ok(left)
    }

    fn parse_equality_expression(&mut self) -> ScriptResult<Expr> {
        let mark = self.depth;
        let mut left = self.parse_comparison_expression()?;
        while let Some(op) = self.match_equality_op() {
            self.enter()?;
            let right = self.parse_comparison_expression()?;
            left = binary(left, op, right);
        }
        self.depth = mark;
        Ok(left)
    }

    fn parse_comparison_expression(&mut self) -> ScriptResult<Expr> {
        let mark = self.depth;
        let mut left = self.parse_additive_expression()?;
        while let Some(op) = self.match_comparison_op() {
            self.enter()?;
            let right = self.parse_additive_expression()?;
            left = binary(left, op, right);
        }
        self.depth = mark;
        Ok(left)
    }

    fn parse_additive_expression(&mut self) -> ScriptResult<Expr> {
        let mark = self.depth;
        let mut left = self.parse_multiplicative_expression()?;
        while let Some(op) = self.match_additive_op() {
            self.enter()?;
            let right = self.parse_multiplicative_expression()?;
            left = binary(left, op, right);
        }
        self.depth = mark;
        Ok(left)
    }

    fn parse_multiplicative_expression(&mut self) -> ScriptResult<Expr> {
        let mark = self.depth;
        let mut left = self.parse_unary_expression()?;
        while let Some(op) = self.match_multiplicative_op() {
            self.enter()?;
            let right = self.parse_unary_expression()?;
            left = binary(left, op, right);
        }
        self.depth = mark;
        Ok(left)
    }

    fn parse_unary_expression(&mut self) -> ScriptResult<Expr> {
        let operator = if self.match_token(Token::Bang) {
            UnaryOp::Not
        } else if self.match_token(Token::Minus) {
            UnaryOp::Negate
        } else {
            return self.parse_postfix_expression();
        };
        let mark = self.enter()?;
        let operand = self.parse_unary_expression()?;
        self.depth = mark;
        Ok(Expr::Unary {
            operator,
            operand: Box::new(operand),
        })
    }

    /// Member access and indexing: `event.target.value`, `args["key"]`
    fn parse_postfix_expression(&mut self) -> ScriptResult<Expr> {
        let mark = self.depth;
        let mut expr = self.parse_primary_expression()?;
        loop {
            if self.match_token(Token::Dot) {
                self.enter()?;
                let property = self.expect_ident()?;
                expr = Expr::Member {
                    object: Box::new(expr),
                    property,
                };
            } else if self.match_token(Token::LBracket) {
                self.enter()?;
                let index = self.parse_expression()?;
                self.expect(Token::RBracket)?;
                expr = Expr::Index {
                    object: Box::new(expr),
                    index: Box::new(index),
                };
            } else {
                break;
            }
        }
        self.depth = mark;
        Ok(expr)
    }

    fn parse_primary_expression(&mut self) -> ScriptResult<Expr> {
        let expr = match self.peek() {
            Some((Token::Number(n), span)) => {
                let value = n.parse::<f64>().map_err(|_| {
                    ScriptError::unexpected_token(span.start, "number", n.to_string())
                })?;
                Expr::Literal(number_value(value))
            }
            Some((Token::String(s), _)) => Expr::Literal(Value::String(s.to_string())),
            Some((Token::True, _)) => Expr::Literal(Value::Bool(true)),
            Some((Token::False, _)) => Expr::Literal(Value::Bool(false)),
            Some((Token::Null, _)) => Expr::Literal(Value::Null),
            Some((Token::Ident(name), _)) => {
                let name = name.to_string();
                self.advance();
                if self.check(Token::LParen) {
                    return self.parse_function_call(name);
                }
                return Ok(Expr::Ident(name));
            }
            Some((Token::LParen, _)) => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(Token::RParen)?;
                return Ok(expr);
            }
            _ => {
                return Err(ScriptError::unexpected_token(
                    self.peek_span().start,
                    "expression",
                    self.format_peek(),
                ))
            }
        };
        self.advance();
        Ok(expr)
    }

    fn parse_function_call(&mut self, function: String) -> ScriptResult<Expr> {
        self.expect(Token::LParen)?;

        let mut arguments = Vec::new();
        while !self.check(Token::RParen) && !self.is_at_end() {
            arguments.push(self.parse_expression()?);
            if !self.match_token(Token::Comma) {
                break;
            }
        }
        self.expect(Token::RParen)?;

        Ok(Expr::Call {
            function,
            arguments,
        })
    }

    fn match_equality_op(&mut self) -> Option<BinaryOp> {
        if self.match_token(Token::EqEq) {
            Some(BinaryOp::Equals)
        } else if self.match_token(Token::NotEq) {
            Some(BinaryOp::NotEquals)
        } else {
            None
        }
    }

    fn match_comparison_op(&mut self) -> Option<BinaryOp> {
        if self.match_token(Token::Lte) {
            Some(BinaryOp::LessThanOrEqual)
        } else if self.match_token(Token::Gte) {
            Some(BinaryOp::GreaterThanOrEqual)
        } else if self.match_token(Token::Lt) {
            Some(BinaryOp::LessThan)
        } else if self.match_token(Token::Gt) {
            Some(BinaryOp::GreaterThan)
        } else {
            None
        }
    }

    fn match_additive_op(&mut self) -> Option<BinaryOp> {
        if self.match_token(Token::Plus) {
            Some(BinaryOp::Add)
        } else if self.match_token(Token::Minus) {
            Some(BinaryOp::Subtract)
        } else {
            None
        }
    }

    fn match_multiplicative_op(&mut self) -> Option<BinaryOp> {
        if self.match_token(Token::Star) {
            Some(BinaryOp::Multiply)
        } else if self.match_token(Token::Slash) {
            Some(BinaryOp::Divide)
        } else if self.match_token(Token::Percent) {
            Some(BinaryOp::Modulo)
        } else {
            None
        }
    }

    // Helper methods

    /// Step one level deeper, returning the depth to restore on the way out
    fn enter(&mut self) -> ScriptResult<usize> {
        let mark = self.depth;
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(ScriptError::NestingTooDeep {
                pos: self.peek_span().start,
                limit: MAX_NESTING,
            });
        }
        Ok(mark)
    }

    fn peek(&self) -> Option<&(Token<'src>, Range<usize>)> {
        self.tokens.get(self.pos)
    }

    fn peek_ahead(&self, offset: usize) -> Option<&(Token<'src>, Range<usize>)> {
        self.tokens.get(self.pos + offset)
    }

    fn advance(&mut self) -> Option<&(Token<'src>, Range<usize>)> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn check(&self, token: Token) -> bool {
        if let Some((t, _)) = self.peek() {
            std::mem::discriminant(t) == std::mem::discriminant(&token)
        } else {
            false
        }
    }

    fn match_token(&mut self, token: Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token) -> ScriptResult<()> {
        if self.check(token.clone()) {
            self.advance();
            Ok(())
        } else {
            Err(ScriptError::unexpected_token(
                self.peek_span().start,
                token.to_string(),
                self.format_peek(),
            ))
        }
    }

    fn expect_ident(&mut self) -> ScriptResult<String> {
        match self.peek() {
            Some((Token::Ident(s), _)) => {
                let val = s.to_string();
                self.advance();
                Ok(val)
            }
            _ => Err(ScriptError::unexpected_token(
                self.peek_span().start,
                "identifier",
                self.format_peek(),
            )),
        }
    }

    fn peek_span(&self) -> Range<usize> {
        self.peek()
            .map(|(_, span)| span.clone())
            .unwrap_or(self.source_len..self.source_len)
    }

    fn format_peek(&self) -> String {
        match self.peek() {
            Some((token, _)) => token.to_string(),
            None => "end of script".to_string(),
        }
    }
}

fn binary(left: Expr, operator: BinaryOp, right: Expr) -> Expr {
    Expr::Binary {
        left: Box::new(left),
        operator,
        right: Box::new(right),
    }
}

pub fn parse_script(source: &str) -> ScriptResult<Script> {
    Parser::new(source)?.parse_script()
}
