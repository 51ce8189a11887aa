use crate::language::{
    ast::{BlockStatement, Expression, InfixOperator, PrefixOperator, Program, Statement},
    errors::SyntaxError,
    lexer::tokenize,
    span::Span,
    token::{Token, TokenKind},
};
use crate::stack::ensure_sufficient_stack;
use std::rc::Rc;

pub fn parse_source(source: &str) -> Result<Program, Vec<SyntaxError>> {
    let tokens = tokenize(source);
    parse(&tokens)
}

pub fn parse(tokens: &[Token]) -> Result<Program, Vec<SyntaxError>> {
    let mut parser = AstParser::new(tokens);
    let program = parser.parse_program();
    if parser.errors.is_empty() {
        Ok(program)
    } else {
        Err(parser.errors)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    Equals,
    LessGreater,
    Sum,
    Product,
    Prefix,
    Call,
}

fn precedence_of(kind: &TokenKind) -> Precedence {
    match kind {
        TokenKind::EqEq | TokenKind::BangEq => Precedence::Equals,
        TokenKind::Lt | TokenKind::Gt => Precedence::LessGreater,
        TokenKind::Plus | TokenKind::Minus => Precedence::Sum,
        TokenKind::Star | TokenKind::Slash => Precedence::Product,
        TokenKind::LParen => Precedence::Call,
        _ => Precedence::Lowest,
    }
}

fn infix_operator(kind: &TokenKind) -> Option<InfixOperator> {
    let op = match kind {
        TokenKind::Plus => InfixOperator::Add,
        TokenKind::Minus => InfixOperator::Sub,
        TokenKind::Star => InfixOperator::Mul,
        TokenKind::Slash => InfixOperator::Div,
        TokenKind::Lt => InfixOperator::Lt,
        TokenKind::Gt => InfixOperator::Gt,
        TokenKind::EqEq => InfixOperator::Eq,
        TokenKind::BangEq => InfixOperator::NotEq,
        _ => return None,
    };
    Some(op)
}

struct AstParser<'a> {
    tokens: &'a [Token],
    position: usize,
    last_span: Option<Span>,
    errors: Vec<SyntaxError>,
}

impl<'a> AstParser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            position: 0,
            last_span: None,
            errors: Vec::new(),
        }
    }

    fn parse_program(&mut self) -> Program {
        let mut statements = Vec::new();
        while !self.is_at_end() {
            match self.parse_statement() {
                Ok(stmt) => statements.push(stmt),
                Err(err) => {
                    self.report_error(err);
                    self.synchronize();
                }
            }
        }
        Program { statements }
    }

    fn parse_statement(&mut self) -> Result<Statement, SyntaxError> {
        match self.peek_kind() {
            Some(TokenKind::Let) => self.parse_let_statement(),
            Some(TokenKind::Return) => self.parse_return_statement(),
            _ => {
                let expr = self.parse_expression(Precedence::Lowest)?;
                self.skip_semicolon();
                Ok(Statement::Expression(expr))
            }
        }
    }

    fn parse_let_statement(&mut self) -> Result<Statement, SyntaxError> {
        self.advance();
        let name = self
            .expect_identifier("Expected a name after `let`")
            .map_err(|err| err.with_help(let_syntax_help()))?;
        self.consume(&TokenKind::Assign, "Expected `=` after the binding name")
            .map_err(|err| err.with_help(let_assignment_help(&name)))?;
        let value = self.parse_expression(Precedence::Lowest)?;
        self.skip_semicolon();
        Ok(Statement::Let { name, value })
    }

    fn parse_return_statement(&mut self) -> Result<Statement, SyntaxError> {
        self.advance();
        let value = self.parse_expression(Precedence::Lowest)?;
        self.skip_semicolon();
        Ok(Statement::Return(value))
    }

    fn parse_block(&mut self) -> Result<BlockStatement, SyntaxError> {
        ensure_sufficient_stack(|| self.parse_block_inner())
    }

    fn parse_block_inner(&mut self) -> Result<BlockStatement, SyntaxError> {
        self.consume(&TokenKind::LBrace, "Expected `{` to start a block")?;
        let mut statements = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            statements.push(self.parse_statement()?);
        }
        self.consume(&TokenKind::RBrace, "Expected `}` to close the block")?;
        Ok(BlockStatement { statements })
    }

    fn parse_expression(&mut self, precedence: Precedence) -> Result<Expression, SyntaxError> {
        ensure_sufficient_stack(|| self.parse_expression_inner(precedence))
    }

    fn parse_expression_inner(
        &mut self,
        precedence: Precedence,
    ) -> Result<Expression, SyntaxError> {
        let mut left = self.parse_prefix()?;

        while let Some(kind) = self.peek_kind() {
            if *kind == TokenKind::Semi || precedence >= precedence_of(kind) {
                break;
            }
            left = if *kind == TokenKind::LParen {
                self.parse_call(left)?
            } else {
                self.parse_infix(left)?
            };
        }

        Ok(left)
    }

    fn parse_prefix(&mut self) -> Result<Expression, SyntaxError> {
        let Some(token) = self.advance() else {
            return Err(self.error(
                "Unexpected end of input while reading expression",
                self.eof_span(),
            ));
        };
        match &token.kind {
            TokenKind::Identifier(name) => Ok(Expression::Identifier(name.clone())),
            TokenKind::Integer(digits) => digits
                .parse::<i64>()
                .map(Expression::IntegerLiteral)
                .map_err(|_| {
                    self.error(
                        format!("Integer literal `{digits}` does not fit in 64 bits"),
                        token.span,
                    )
                    .with_label("literal out of range")
                }),
            TokenKind::String(text) => Ok(Expression::StringLiteral(text.clone())),
            TokenKind::True => Ok(Expression::BooleanLiteral(true)),
            TokenKind::False => Ok(Expression::BooleanLiteral(false)),
            TokenKind::Bang => self.parse_prefix_operator(PrefixOperator::Bang),
            TokenKind::Minus => self.parse_prefix_operator(PrefixOperator::Minus),
            TokenKind::LParen => {
                let expr = self.parse_expression(Precedence::Lowest)?;
                self.consume(&TokenKind::RParen, "Expected `)` after expression")?;
                Ok(expr)
            }
            TokenKind::LBracket => Ok(Expression::ArrayLiteral(
                self.parse_expression_list(&TokenKind::RBracket, "Expected `]` after array elements")?,
            )),
            TokenKind::If => self.parse_if_expression(),
            TokenKind::Fn => self.parse_function_literal(),
            kind => Err(self.error(format!("Unexpected {kind} in expression"), token.span)),
        }
    }

    fn parse_prefix_operator(&mut self, operator: PrefixOperator) -> Result<Expression, SyntaxError> {
        let right = self.parse_expression(Precedence::Prefix)?;
        Ok(Expression::Prefix {
            operator,
            right: Box::new(right),
        })
    }

    fn parse_infix(&mut self, left: Expression) -> Result<Expression, SyntaxError> {
        let Some(token) = self.advance() else {
            return Err(self.error("Expected an operator", self.eof_span()));
        };
        let Some(operator) = infix_operator(&token.kind) else {
            return Err(self.error(
                format!("{} is not an infix operator", token.kind),
                token.span,
            ));
        };
        let right = self.parse_expression(precedence_of(&token.kind))?;
        Ok(Expression::Infix {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    fn parse_call(&mut self, function: Expression) -> Result<Expression, SyntaxError> {
        self.advance();
        let arguments =
            self.parse_expression_list(&TokenKind::RParen, "Expected `)` after call arguments")?;
        Ok(Expression::Call {
            function: Box::new(function),
            arguments,
        })
    }

    fn parse_expression_list(
        &mut self,
        end: &TokenKind,
        message: &str,
    ) -> Result<Vec<Expression>, SyntaxError> {
        let mut items = Vec::new();
        if self.check(end) {
            self.advance();
            return Ok(items);
        }
        loop {
            items.push(self.parse_expression(Precedence::Lowest)?);
            if self.check(&TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        self.consume(end, message)?;
        Ok(items)
    }

    fn parse_if_expression(&mut self) -> Result<Expression, SyntaxError> {
        let condition = self.parse_expression(Precedence::Lowest)?;
        let consequence = self.parse_block()?;
        let alternative = if self.check(&TokenKind::Else) {
            self.advance();
            Some(self.parse_block()?)
        } else {
            None
        };
        Ok(Expression::If {
            condition: Box::new(condition),
            consequence,
            alternative,
        })
    }

    fn parse_function_literal(&mut self) -> Result<Expression, SyntaxError> {
        self.consume(&TokenKind::LParen, "Expected `(` after `fn`")?;
        let mut parameters = Vec::new();
        if self.check(&TokenKind::RParen) {
            self.advance();
        } else {
            loop {
                parameters.push(self.expect_identifier("Expected a parameter name")?);
                if self.check(&TokenKind::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
            self.consume(&TokenKind::RParen, "Expected `)` after parameters")?;
        }
        let body = self.parse_block()?;
        Ok(Expression::FunctionLiteral {
            parameters,
            body: Rc::new(body),
        })
    }

    fn expect_identifier(&mut self, message: &str) -> Result<String, SyntaxError> {
        match self.peek_lex() {
            Some(Token {
                kind: TokenKind::Identifier(name),
                ..
            }) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            Some(token) => Err(self.error(format!("{}: found {}", message, token.kind), token.span)),
            None => Err(self.error(
                format!("{}: reached end of input", message),
                self.eof_span(),
            )),
        }
    }

    fn consume(&mut self, expected: &TokenKind, message: &str) -> Result<(), SyntaxError> {
        match self.peek_lex() {
            Some(token) if &token.kind == expected => {
                self.advance();
                Ok(())
            }
            Some(token) => Err(self.error(format!("{}: found {}", message, token.kind), token.span)),
            None => Err(self.error(
                format!("{}: reached end of input", message),
                self.eof_span(),
            )),
        }
    }

    fn skip_semicolon(&mut self) {
        if self.check(&TokenKind::Semi) {
            self.advance();
        }
    }

    fn peek_kind(&self) -> Option<&'a TokenKind> {
        self.peek_lex().map(|token| &token.kind)
    }

    fn peek_lex(&self) -> Option<&'a Token> {
        self.tokens.get(self.position)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.position);
        if let Some(lex) = token {
            self.position += 1;
            self.last_span = Some(lex.span);
        }
        token
    }

    fn check(&self, expected: &TokenKind) -> bool {
        matches!(self.peek_kind(), Some(kind) if kind == expected)
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.tokens.len()
    }

    fn eof_span(&self) -> Span {
        self.last_span
            .or_else(|| self.tokens.last().map(|token| token.span))
            .map(|span| span.after())
            .unwrap_or_default()
    }

    fn error(&self, message: impl Into<String>, span: Span) -> SyntaxError {
        SyntaxError::new(message, span)
    }

    fn report_error(&mut self, err: SyntaxError) {
        self.errors.push(err);
    }

    /// Skips past the next `;` or `}` so one mistake yields one error.
    fn synchronize(&mut self) {
        while let Some(token) = self.advance() {
            if matches!(token.kind, TokenKind::Semi | TokenKind::RBrace) {
                break;
            }
        }
    }
}

fn let_syntax_help() -> String {
    "Syntax: let <name> = <value>;".into()
}

fn let_assignment_help(name: &str) -> String {
    format!("Try: let {} = <value>;", name)
}
