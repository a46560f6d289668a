//! Pratt (operator-precedence) parser.

use crate::ast::{BlockStmt, Expr, InfixOp, PrefixOp, Program, Stmt};
use crate::lexer::Lexer;
use crate::token::Token;

/// Binding powers, weakest to strongest.  Assignment sits just above
/// `Lowest` so that everything else binds tighter than `=`.
#[derive(Debug, PartialEq, PartialOrd, Clone, Copy)]
enum Precedence {
    Lowest,
    Assign,
    Equals,
    LessGreater,
    Sum,
    Product,
    Prefix,
    Call,
    Index,
}

fn token_precedence(token: &Token) -> Precedence {
    match token {
        Token::Assign => Precedence::Assign,
        Token::Eq | Token::NotEq => Precedence::Equals,
        Token::Lt | Token::Gt => Precedence::LessGreater,
        Token::Plus | Token::Minus => Precedence::Sum,
        Token::Asterisk | Token::Slash => Precedence::Product,
        Token::LParen => Precedence::Call,
        Token::LBracket => Precedence::Index,
        _ => Precedence::Lowest,
    }
}

fn infix_op(token: &Token) -> Option<InfixOp> {
    match token {
        Token::Plus => Some(InfixOp::Plus),
        Token::Minus => Some(InfixOp::Minus),
        Token::Asterisk => Some(InfixOp::Asterisk),
        Token::Slash => Some(InfixOp::Slash),
        Token::Lt => Some(InfixOp::Lt),
        Token::Gt => Some(InfixOp::Gt),
        Token::Eq => Some(InfixOp::Eq),
        Token::NotEq => Some(InfixOp::NotEq),
        _ => None,
    }
}

/// Turns a token stream into a [`Program`].
///
/// Parsing never fails outright: syntax errors are collected in an error
/// list and the parser resynchronises at the next statement boundary.  A
/// caller that finds the list non-empty treats the parse as failed.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    cur_token: Token,
    peek_token: Token,
    errors: Vec<String>,
}

impl<'a> Parser<'a> {
    pub fn new(lexer: Lexer<'a>) -> Parser<'a> {
        let mut parser = Parser {
            lexer,
            cur_token: Token::Eof,
            peek_token: Token::Eof,
            errors: vec![],
        };
        // Load cur_token and peek_token.
        parser.next_token();
        parser.next_token();
        parser
    }

    pub fn parse_program(&mut self) -> Program {
        let mut program = Program::default();
        while self.cur_token != Token::Eof {
            match self.parse_statement(false) {
                Some(stmt) => program.statements.push(stmt),
                None => self.synchronize(),
            }
            self.next_token();
        }
        program
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Parses one statement, consuming an optional trailing `;`.
    ///
    /// `in_block` controls the reading of a leading `{`: inside a block it
    /// opens a nested block, elsewhere it is a hash literal in expression
    /// context.
    fn parse_statement(&mut self, in_block: bool) -> Option<Stmt> {
        let stmt = self.parse_unterminated_statement(in_block)?;
        if self.peek_token == Token::Semicolon {
            self.next_token();
        }
        Some(stmt)
    }

    /// Parses one statement but leaves any trailing `;` to the caller.
    /// Used directly for the statements inside a `for` header.
    fn parse_unterminated_statement(&mut self, in_block: bool) -> Option<Stmt> {
        match self.cur_token {
            Token::Let => self.parse_binding_statement(false),
            Token::Var => self.parse_binding_statement(true),
            Token::Return => self.parse_return_statement(),
            Token::For => self.parse_for_statement(),
            Token::LBrace if in_block => Some(Stmt::Block(self.parse_block()?)),
            _ => Some(Stmt::Expr(self.parse_expression(Precedence::Lowest)?)),
        }
    }

    /// `let IDENT = <expr>` or `var IDENT = <expr>`.
    fn parse_binding_statement(&mut self, is_mutable: bool) -> Option<Stmt> {
        let name = match &self.peek_token {
            Token::Ident(name) => name.clone(),
            other => {
                self.errors.push(format!(
                    "expected next token to be IDENT, got {} instead",
                    other
                ));
                return None;
            }
        };
        self.next_token();
        if !self.expect_peek(&Token::Assign) {
            return None;
        }
        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;
        if is_mutable {
            Some(Stmt::Var(name, value))
        } else {
            Some(Stmt::Let(name, value))
        }
    }

    fn parse_return_statement(&mut self) -> Option<Stmt> {
        match self.peek_token {
            // `return` with no value, as in `return;` or `fn() { return }`.
            Token::Semicolon | Token::RBrace | Token::RParen | Token::Eof => {
                Some(Stmt::Return(None))
            }
            _ => {
                self.next_token();
                Some(Stmt::Return(Some(self.parse_expression(Precedence::Lowest)?)))
            }
        }
    }

    /// `for ( <stmt>? ; <expr> ; <stmt>? ) <block>`.  The parentheses and
    /// both semicolons are mandatory.
    fn parse_for_statement(&mut self) -> Option<Stmt> {
        if !self.expect_peek(&Token::LParen) {
            return None;
        }
        self.next_token();
        let init = if self.cur_token == Token::Semicolon {
            None
        } else {
            let stmt = self.parse_unterminated_statement(false)?;
            if !self.expect_peek(&Token::Semicolon) {
                return None;
            }
            Some(Box::new(stmt))
        };
        self.next_token();
        let cond = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(&Token::Semicolon) {
            return None;
        }
        let post = if self.peek_token == Token::RParen {
            None
        } else {
            self.next_token();
            Some(Box::new(self.parse_unterminated_statement(false)?))
        };
        if !self.expect_peek(&Token::RParen) {
            return None;
        }
        if !self.expect_peek(&Token::LBrace) {
            return None;
        }
        let body = self.parse_block()?;
        Some(Stmt::For {
            init,
            cond,
            post,
            body,
        })
    }

    /// Parses `{ stmt* }`.  The opening brace must be the current token; on
    /// success the closing brace is.
    fn parse_block(&mut self) -> Option<BlockStmt> {
        let mut block = BlockStmt::default();
        self.next_token();
        while self.cur_token != Token::RBrace {
            if self.cur_token == Token::Eof {
                self.errors
                    .push("expected next token to be }, got EOF instead".to_string());
                return None;
            }
            block.statements.push(self.parse_statement(true)?);
            self.next_token();
        }
        Some(block)
    }

    fn parse_expression(&mut self, precedence: Precedence) -> Option<Expr> {
        let mut left = self.parse_prefix()?;
        while self.peek_token != Token::Semicolon
            && precedence < token_precedence(&self.peek_token)
        {
            left = if let Some(op) = infix_op(&self.peek_token) {
                self.next_token();
                self.parse_infix(op, left)?
            } else {
                match self.peek_token {
                    Token::Assign => {
                        self.next_token();
                        self.parse_assign(left)?
                    }
                    Token::LParen => {
                        self.next_token();
                        self.parse_call(left)?
                    }
                    Token::LBracket => {
                        self.next_token();
                        self.parse_index(left)?
                    }
                    _ => return Some(left),
                }
            };
        }
        Some(left)
    }

    /// Null denotation: the handler for a token with no expression to its
    /// left.
    fn parse_prefix(&mut self) -> Option<Expr> {
        match self.cur_token.clone() {
            Token::Ident(name) => Some(Expr::Ident(name)),
            Token::Int(literal) => match literal.parse::<i64>() {
                Ok(value) => Some(Expr::Int(value)),
                Err(_) => {
                    self.errors
                        .push(format!("could not parse {} as integer", literal));
                    None
                }
            },
            Token::Str(value) => Some(Expr::Str(value)),
            Token::True => Some(Expr::Bool(true)),
            Token::False => Some(Expr::Bool(false)),
            Token::Bang => self.parse_prefix_expression(PrefixOp::Bang),
            Token::Minus => self.parse_prefix_expression(PrefixOp::Minus),
            Token::LParen => self.parse_grouped_expression(),
            Token::If => self.parse_if_expression(),
            Token::Function => self.parse_function_literal(),
            Token::LBracket => self.parse_array_literal(),
            Token::LBrace => self.parse_hash_literal(),
            other => {
                self.errors
                    .push(format!("no prefix parse function for {} found", other));
                None
            }
        }
    }

    fn parse_prefix_expression(&mut self, op: PrefixOp) -> Option<Expr> {
        self.next_token();
        let right = self.parse_expression(Precedence::Prefix)?;
        Some(Expr::Prefix(op, Box::new(right)))
    }

    fn parse_grouped_expression(&mut self) -> Option<Expr> {
        self.next_token();
        let expr = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(&Token::RParen) {
            return None;
        }
        Some(expr)
    }

    fn parse_if_expression(&mut self) -> Option<Expr> {
        if !self.expect_peek(&Token::LParen) {
            return None;
        }
        self.next_token();
        let cond = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(&Token::RParen) {
            return None;
        }
        if !self.expect_peek(&Token::LBrace) {
            return None;
        }
        let consequence = self.parse_block()?;
        let alternative = if self.peek_token == Token::Else {
            self.next_token();
            if !self.expect_peek(&Token::LBrace) {
                return None;
            }
            Some(self.parse_block()?)
        } else {
            None
        };
        Some(Expr::If {
            cond: Box::new(cond),
            consequence,
            alternative,
        })
    }

    fn parse_function_literal(&mut self) -> Option<Expr> {
        if !self.expect_peek(&Token::LParen) {
            return None;
        }
        let params = self.parse_function_params()?;
        if !self.expect_peek(&Token::LBrace) {
            return None;
        }
        let body = self.parse_block()?;
        Some(Expr::Function { params, body })
    }

    fn parse_function_params(&mut self) -> Option<Vec<String>> {
        let mut params = vec![];
        if self.peek_token == Token::RParen {
            self.next_token();
            return Some(params);
        }
        loop {
            self.next_token();
            match &self.cur_token {
                Token::Ident(name) => params.push(name.clone()),
                other => {
                    self.errors.push(format!(
                        "expected next token to be IDENT, got {} instead",
                        other
                    ));
                    return None;
                }
            }
            if self.peek_token != Token::Comma {
                break;
            }
            self.next_token();
        }
        if !self.expect_peek(&Token::RParen) {
            return None;
        }
        Some(params)
    }

    fn parse_array_literal(&mut self) -> Option<Expr> {
        Some(Expr::Array(self.parse_expression_list(Token::RBracket)?))
    }

    /// Comma-separated expressions up to (and consuming) `end`.  A trailing
    /// comma before `end` is accepted.
    fn parse_expression_list(&mut self, end: Token) -> Option<Vec<Expr>> {
        let mut list = vec![];
        while self.peek_token != end {
            self.next_token();
            list.push(self.parse_expression(Precedence::Lowest)?);
            if self.peek_token != end && !self.expect_peek(&Token::Comma) {
                return None;
            }
        }
        self.next_token();
        Some(list)
    }

    fn parse_hash_literal(&mut self) -> Option<Expr> {
        let mut pairs = vec![];
        while self.peek_token != Token::RBrace {
            self.next_token();
            let key = self.parse_expression(Precedence::Lowest)?;
            if !self.expect_peek(&Token::Colon) {
                return None;
            }
            self.next_token();
            let value = self.parse_expression(Precedence::Lowest)?;
            pairs.push((key, value));
            if self.peek_token != Token::RBrace && !self.expect_peek(&Token::Comma) {
                return None;
            }
        }
        self.next_token();
        Some(Expr::Hash(pairs))
    }

    /// Left denotation for binary operators.
    fn parse_infix(&mut self, op: InfixOp, left: Expr) -> Option<Expr> {
        let precedence = token_precedence(&self.cur_token);
        self.next_token();
        let right = self.parse_expression(precedence)?;
        Some(Expr::Infix(op, Box::new(left), Box::new(right)))
    }

    /// Left denotation for `=`.  Binds right to left, so the value is
    /// parsed one level below `Assign`; only an identifier may appear on
    /// the left.
    fn parse_assign(&mut self, left: Expr) -> Option<Expr> {
        let name = match left {
            Expr::Ident(name) => name,
            other => {
                self.errors
                    .push(format!("invalid assignment target: {}", other));
                return None;
            }
        };
        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;
        Some(Expr::Assign(name, Box::new(value)))
    }

    fn parse_call(&mut self, func: Expr) -> Option<Expr> {
        let args = self.parse_expression_list(Token::RParen)?;
        Some(Expr::Call {
            func: Box::new(func),
            args,
        })
    }

    fn parse_index(&mut self, left: Expr) -> Option<Expr> {
        self.next_token();
        let index = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(&Token::RBracket) {
            return None;
        }
        Some(Expr::Index(Box::new(left), Box::new(index)))
    }

    fn next_token(&mut self) {
        self.cur_token = std::mem::replace(&mut self.peek_token, self.lexer.next_token());
    }

    fn expect_peek(&mut self, expected: &Token) -> bool {
        if self.peek_token == *expected {
            self.next_token();
            true
        } else {
            self.errors.push(format!(
                "expected next token to be {}, got {} instead",
                expected, self.peek_token
            ));
            false
        }
    }

    /// After a syntax error, skip ahead to the next statement boundary so
    /// several errors can be reported in one pass.
    fn synchronize(&mut self) {
        loop {
            match self.cur_token {
                Token::Semicolon | Token::Eof => return,
                _ => {}
            }
            match self.peek_token {
                Token::Let | Token::Var | Token::Return | Token::For => return,
                _ => {}
            }
            self.next_token();
        }
    }
}
