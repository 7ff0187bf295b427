use std::fmt;

use crate::{
    ast::{
        BinOp, ColumnRef, Direction, Expr, FunctionArgs, Keyword, Limit, Literal, OrderingTerm,
        ResultColumn, SelectOption, SelectStatement, Source, Token, UnaryOp,
    },
    lexer::{LexError, Lexer, Position, SpannedToken},
};

/// Error raised when the input is not one complete SELECT statement.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub position: Position,
}

impl ParseError {
    pub fn new(message: impl Into<String>, position: Position) -> Self {
        ParseError {
            message: message.into(),
            position,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.message, self.position)
    }
}

impl std::error::Error for ParseError {}

impl From<LexError> for ParseError {
    fn from(e: LexError) -> Self {
        ParseError {
            message: e.message,
            position: e.position,
        }
    }
}

pub struct Parser {
    tokens: Vec<SpannedToken>,
    index: usize,
}

impl Parser {
    /// Tokenize the lexer's whole input up front.
    pub fn new(mut lexer: Lexer) -> Result<Self, ParseError> {
        let tokens = lexer.tokenize()?;
        Ok(Parser {
            tokens,
            index: 0,
        })
    }

    /// The token stream (always terminated by [`Token::Eof`]).
    pub fn tokens(&self) -> &[SpannedToken] {
        &self.tokens
    }

    fn current(&self) -> &Token {
        &self.tokens[self.index].token
    }

    fn peek(&self) -> &Token {
        let next = (self.index + 1).min(self.tokens.len() - 1);
        &self.tokens[next].token
    }

    fn current_position(&self) -> Position {
        self.tokens[self.index].start
    }

    fn advance(&mut self) {
        if self.index + 1 < self.tokens.len() {
            self.index += 1;
        }
    }

    fn check(&self, token: &Token) -> bool {
        self.current() == token
    }

    fn check_keyword(&self, keyword: Keyword) -> bool {
        self.check(&Token::Keyword(keyword))
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: Keyword) -> bool {
        self.eat(&Token::Keyword(keyword))
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let found = match self.current() {
            Token::Keyword(k) => format!("keyword {}", k.as_str()),
            Token::Eof => "end of input".to_string(),
            token => format!("'{}'", token),
        };
        ParseError::new(
            format!("Expected {} but found {}", expected, found),
            self.current_position(),
        )
    }

    fn expect(&mut self, expected: Token) -> Result<(), ParseError> {
        if self.eat(&expected) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{}'", expected)))
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<(), ParseError> {
        if self.eat_keyword(keyword) {
            Ok(())
        } else {
            Err(self.unexpected(keyword.as_str()))
        }
    }

    fn parse_identifier(&mut self, what: &str) -> Result<String, ParseError> {
        match self.current() {
            Token::Identifier(name) | Token::QuotedIdentifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            Token::Keyword(k) => Err(ParseError::new(
                format!(
                    "Expected {} but found reserved keyword {} (quote it as \"{}\")",
                    what,
                    k.as_str(),
                    k.as_str()
                ),
                self.current_position(),
            )),
            _ => Err(self.unexpected(what)),
        }
    }

    fn is_identifier(token: &Token) -> bool {
        matches!(token, Token::Identifier(_) | Token::QuotedIdentifier(_))
    }
}

// ============================================================================
// Statements
// ============================================================================

impl Parser {
    /// Parse a complete query: one SELECT statement, an optional `;`, then end
    /// of input.
    pub fn parse_query(&mut self) -> Result<SelectStatement, ParseError> {
        let statement = self.parse_select()?;
        self.eat(&Token::Semicolon);

        if !self.check(&Token::Eof) {
            return Err(self.unexpected("end of statement"));
        }
        Ok(statement)
    }

    fn parse_select(&mut self) -> Result<SelectStatement, ParseError> {
        self.expect_keyword(Keyword::Select)?;

        let option = if self.eat_keyword(Keyword::Distinct) {
            Some(SelectOption::Distinct)
        } else if self.eat_keyword(Keyword::All) {
            Some(SelectOption::All)
        } else {
            None
        };

        let mut columns = vec![self.parse_result_column()?];
        while self.eat(&Token::Comma) {
            columns.push(self.parse_result_column()?);
        }

        let source = if self.eat_keyword(Keyword::From) {
            Some(self.parse_source()?)
        } else {
            None
        };

        let where_clause = if self.eat_keyword(Keyword::Where) {
            Some(self.parse_expression()?)
        } else {
            None
        };

        if self.check_keyword(Keyword::Group) {
            return Err(ParseError::new(
                "GROUP BY is not supported",
                self.current_position(),
            ));
        }

        let having = if self.eat_keyword(Keyword::Having) {
            Some(self.parse_expression()?)
        } else {
            None
        };

        match self.current() {
            Token::Keyword(k @ (Keyword::Union | Keyword::Intersect | Keyword::Except)) => {
                return Err(ParseError::new(
                    format!("Compound SELECT ({}) is not supported", k.as_str()),
                    self.current_position(),
                ));
            }
            Token::Keyword(Keyword::Select) => {
                return Err(ParseError::new(
                    "Only one SELECT statement is allowed per query",
                    self.current_position(),
                ));
            }
            _ => {}
        }

        let mut order_by = vec![];
        if self.eat_keyword(Keyword::Order) {
            self.expect_keyword(Keyword::By)?;
            order_by.push(self.parse_ordering_term()?);
            while self.eat(&Token::Comma) {
                order_by.push(self.parse_ordering_term()?);
            }
        }

        let limit = if self.check_keyword(Keyword::Limit) {
            Some(self.parse_limit()?)
        } else {
            None
        };

        Ok(SelectStatement {
            option,
            columns,
            source,
            where_clause,
            having,
            order_by,
            limit,
        })
    }

    fn parse_result_column(&mut self) -> Result<ResultColumn, ParseError> {
        let position = self.current_position();

        if self.eat(&Token::Star) {
            return Ok(ResultColumn::Star { position });
        }

        // table.*
        if Self::is_identifier(self.current())
            && self.peek() == &Token::Dot
            && self.tokens.get(self.index + 2).map(|t| &t.token) == Some(&Token::Star)
        {
            let table = self.parse_identifier("table name")?;
            self.advance(); // consume '.'
            self.advance(); // consume '*'
            return Ok(ResultColumn::QualifiedStar { table, position });
        }

        let first = self.index;
        let expr = self.parse_expression()?;
        let text = expression_text(&self.tokens[first..self.index]);

        let alias = if self.eat_keyword(Keyword::As) {
            Some(self.parse_identifier("column alias")?)
        } else if Self::is_identifier(self.current()) {
            Some(self.parse_identifier("column alias")?)
        } else {
            None
        };

        Ok(ResultColumn::Expr {
            expr,
            alias,
            text,
            position,
        })
    }

    fn parse_source(&mut self) -> Result<Source, ParseError> {
        let first = self.parse_identifier("source name")?;
        let (database, name) = if self.eat(&Token::Dot) {
            (Some(first), self.parse_identifier("source name")?)
        } else {
            (None, first)
        };

        let alias = if self.eat_keyword(Keyword::As) {
            Some(self.parse_identifier("source alias")?)
        } else if Self::is_identifier(self.current()) {
            Some(self.parse_identifier("source alias")?)
        } else {
            None
        };

        Ok(Source {
            database,
            name,
            alias,
        })
    }

    fn parse_ordering_term(&mut self) -> Result<OrderingTerm, ParseError> {
        let position = self.current_position();
        let expr = self.parse_expression()?;

        let direction = if self.eat_keyword(Keyword::Asc) {
            Some(Direction::Asc)
        } else if self.eat_keyword(Keyword::Desc) {
            Some(Direction::Desc)
        } else {
            None
        };

        Ok(OrderingTerm {
            expr,
            direction,
            position,
        })
    }

    /// `LIMIT count`, `LIMIT count OFFSET offset` or `LIMIT offset, count`.
    fn parse_limit(&mut self) -> Result<Limit, ParseError> {
        let position = self.current_position();
        self.expect_keyword(Keyword::Limit)?;

        let first = self.parse_expression()?;

        if self.eat_keyword(Keyword::Offset) {
            let offset = self.parse_expression()?;
            Ok(Limit {
                count: first,
                offset: Some(offset),
                position,
            })
        } else if self.eat(&Token::Comma) {
            // Comma form lists the offset first
            let count = self.parse_expression()?;
            Ok(Limit {
                count,
                offset: Some(first),
                position,
            })
        } else {
            Ok(Limit {
                count: first,
                offset: None,
                position,
            })
        }
    }
}

// ============================================================================
// Expressions, loosest binding first
// ============================================================================

impl Parser {
    pub fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_or()
    }

    /// Parse a standalone expression followed by end of input.
    pub fn parse(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_expression()?;
        if !self.check(&Token::Eof) {
            return Err(self.unexpected("end of expression"));
        }
        Ok(expr)
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_and()?;

        while self.eat_keyword(Keyword::Or) {
            let right = self.parse_and()?;
            left = Expr::binary(BinOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_in_list()?;

        while self.eat_keyword(Keyword::And) {
            let right = self.parse_in_list()?;
            left = Expr::binary(BinOp::And, left, right);
        }
        Ok(left)
    }

    /// Postfix `[NOT] IN (a, b, ...)`.
    fn parse_in_list(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_between()?;

        loop {
            let negated = match self.current() {
                Token::Keyword(Keyword::In) => false,
                Token::NotIn => true,
                _ => break,
            };
            if self.peek() != &Token::LParen {
                break;
            }
            self.advance(); // consume IN
            self.advance(); // consume '('

            let list = self.parse_expression_list()?;
            self.expect(Token::RParen)?;

            left = Expr::InList {
                negated,
                value: Box::new(left),
                list,
            };
        }
        Ok(left)
    }

    /// Ternary `[NOT] BETWEEN low AND high`.
    fn parse_between(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_comparison()?;

        loop {
            let negated = match self.current() {
                Token::Keyword(Keyword::Between) => false,
                Token::NotBetween => true,
                _ => break,
            };
            self.advance();

            let low = self.parse_comparison()?;
            self.expect_keyword(Keyword::And)?;
            let high = self.parse_comparison()?;

            left = Expr::Between {
                negated,
                value: Box::new(left),
                low: Box::new(low),
                high: Box::new(high),
            };
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_relational()?;

        loop {
            let op = match self.current() {
                Token::Eq => BinOp::Equal,
                Token::EqEq => BinOp::EqualEqual,
                Token::NotEq => BinOp::NotEqual,
                Token::LtGt => BinOp::LessGreater,
                Token::Keyword(Keyword::Like) => BinOp::Like,
                Token::NotLike => BinOp::NotLike,
                Token::Keyword(Keyword::Regexp) => BinOp::Regexp,
                Token::NotRegexp => BinOp::NotRegexp,
                // A parenthesized list belongs to the IN-list tier
                Token::Keyword(Keyword::In) if self.peek() != &Token::LParen => BinOp::In,
                Token::NotIn if self.peek() != &Token::LParen => BinOp::NotIn,
                Token::Keyword(Keyword::Is) => {
                    self.advance();
                    if self.check(&Token::NotNullOp) {
                        // IS NOT NULL: the lexer fused NOT NULL
                        self.advance();
                        left = Expr::binary(BinOp::IsNot, left, Expr::Literal(Literal::Null));
                        continue;
                    }
                    let op = if self.eat_keyword(Keyword::Not) {
                        BinOp::IsNot
                    } else {
                        BinOp::Is
                    };
                    let right = self.parse_relational()?;
                    left = Expr::binary(op, left, right);
                    continue;
                }
                _ => break,
            };

            self.advance();
            let pattern_position = self.current_position();
            let right = self.parse_relational()?;
            if matches!(op, BinOp::Like | BinOp::NotLike)
                && !matches!(right, Expr::Literal(Literal::String(_)))
            {
                return Err(ParseError::new(
                    "LIKE pattern must be a string literal",
                    pattern_position,
                ));
            }
            left = Expr::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_bitwise()?;

        loop {
            let op = match self.current() {
                Token::Lt => BinOp::LessThan,
                Token::LtEq => BinOp::LessEqual,
                Token::Gt => BinOp::GreaterThan,
                Token::GtEq => BinOp::GreaterEqual,
                _ => break,
            };

            self.advance();
            let right = self.parse_bitwise()?;
            left = Expr::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_bitwise(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_additive()?;

        loop {
            let op = match self.current() {
                Token::ShiftLeft => BinOp::ShiftLeft,
                Token::ShiftRight => BinOp::ShiftRight,
                Token::Ampersand => BinOp::BitAnd,
                Token::Pipe => BinOp::BitOr,
                _ => break,
            };

            self.advance();
            let right = self.parse_additive()?;
            left = Expr::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.current() {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Subtract,
                _ => break,
            };

            self.advance();
            let right = self.parse_multiplicative()?;
            left = Expr::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_concat()?;

        loop {
            let op = match self.current() {
                Token::Star => BinOp::Multiply,
                Token::Slash => BinOp::Divide,
                Token::Percent => BinOp::Modulo,
                _ => break,
            };

            self.advance();
            let right = self.parse_concat()?;
            left = Expr::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_concat(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_postfix()?;

        while self.eat(&Token::Concat) {
            let right = self.parse_postfix()?;
            left = Expr::binary(BinOp::Concat, left, right);
        }
        Ok(left)
    }

    /// Postfix `ISNULL`, `NOTNULL`, `NOT NULL`.
    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut operand = self.parse_unary()?;

        loop {
            let op = match self.current() {
                Token::Keyword(Keyword::IsNull) => UnaryOp::IsNull,
                Token::Keyword(Keyword::NotNull) | Token::NotNullOp => UnaryOp::NotNull,
                _ => break,
            };
            self.advance();
            operand = Expr::unary(op, operand);
        }
        Ok(operand)
    }

    /// Prefix `- + ~ NOT`, right-associative.
    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.current() {
            Token::Minus => UnaryOp::Negate,
            Token::Plus => UnaryOp::Plus,
            Token::Tilde => UnaryOp::BitNot,
            Token::Keyword(Keyword::Not) => UnaryOp::Not,
            Token::NotNullOp => {
                // Prefix `NOT NULL` is negation applied to a NULL literal
                self.advance();
                return Ok(Expr::unary(UnaryOp::Not, Expr::Literal(Literal::Null)));
            }
            _ => return self.parse_primary(),
        };

        self.advance();
        let operand = self.parse_unary()?;
        Ok(Expr::unary(op, operand))
    }

    fn parse_expression_list(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut list = vec![self.parse_expression()?];
        while self.eat(&Token::Comma) {
            list.push(self.parse_expression()?);
        }
        Ok(list)
    }

    /// Parse primary expressions (atoms): literals, parameters, column
    /// references, function calls, `EXISTS (...)` and parenthesized groups.
    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let position = self.current_position();

        let literal = match self.current() {
            Token::Integer(n) => Some(Literal::Integer(*n)),
            Token::Real(d) => Some(Literal::Real(*d)),
            Token::Float(x) => Some(Literal::Float(*x)),
            Token::String(s) => Some(Literal::String(s.clone())),
            Token::Blob(hex) => Some(Literal::Blob(hex.clone())),
            Token::Keyword(Keyword::True) => Some(Literal::Boolean(true)),
            Token::Keyword(Keyword::False) => Some(Literal::Boolean(false)),
            Token::Keyword(Keyword::Null) => Some(Literal::Null),
            Token::Keyword(Keyword::CurrentTime) => Some(Literal::CurrentTime),
            Token::Keyword(Keyword::CurrentDate) => Some(Literal::CurrentDate),
            Token::Keyword(Keyword::CurrentTimestamp) => Some(Literal::CurrentTimestamp),
            _ => None,
        };
        if let Some(literal) = literal {
            self.advance();
            return Ok(Expr::Literal(literal));
        }

        match self.current().clone() {
            Token::Parameter(parameter) => {
                self.advance();
                Ok(Expr::Parameter {
                    parameter,
                    position,
                })
            }

            Token::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }

            Token::Keyword(Keyword::Exists) => {
                self.advance();
                self.expect(Token::LParen)?;
                let subquery = self.parse_select()?;
                self.expect(Token::RParen)?;
                Ok(Expr::Exists {
                    subquery: Box::new(subquery),
                    position,
                })
            }

            Token::Identifier(_) | Token::QuotedIdentifier(_) if self.peek() == &Token::LParen => {
                let name = self.parse_identifier("function name")?;
                self.advance(); // consume '('

                let args = if self.eat(&Token::Star) {
                    FunctionArgs::Star
                } else if self.check(&Token::RParen) {
                    FunctionArgs::List(vec![])
                } else {
                    FunctionArgs::List(self.parse_expression_list()?)
                };
                self.expect(Token::RParen)?;

                Ok(Expr::Function {
                    name,
                    args,
                    position,
                })
            }

            Token::Identifier(_) | Token::QuotedIdentifier(_) => self.parse_column_ref(),

            Token::Keyword(k) => Err(ParseError::new(
                format!(
                    "Unexpected reserved keyword {} in expression (quote identifiers as \"{}\")",
                    k.as_str(),
                    k.as_str()
                ),
                position,
            )),

            _ => Err(self.unexpected("an expression")),
        }
    }

    /// `[[db.]table.]column`
    fn parse_column_ref(&mut self) -> Result<Expr, ParseError> {
        let position = self.current_position();
        let mut parts = vec![self.parse_identifier("column name")?];

        while self.check(&Token::Dot) {
            if self.peek() == &Token::Star {
                return Err(ParseError::new(
                    "'table.*' is only allowed as a result column",
                    self.current_position(),
                ));
            }
            self.advance(); // consume '.'
            parts.push(self.parse_identifier("column name")?);
        }

        let column = match parts.len() {
            1 => ColumnRef::new(parts.remove(0)),
            2 => ColumnRef {
                database: None,
                column: parts.remove(1),
                table: Some(parts.remove(0)),
            },
            3 => ColumnRef {
                column: parts.remove(2),
                table: Some(parts.remove(1)),
                database: Some(parts.remove(0)),
            },
            _ => {
                return Err(ParseError::new(
                    "Column reference has more than two qualifiers",
                    position,
                ));
            }
        };
        Ok(Expr::Column(column))
    }
}

/// Canonical text of an expression's tokens.
///
/// Depends only on the token values, so comments, spacing and keyword case in
/// the source never change it: `1+1`, `1 /*c*/ + 1` and `1 + 1` all read
/// `1 + 1`.
fn expression_text(tokens: &[SpannedToken]) -> String {
    let mut text = String::new();
    let mut previous: Option<&Token> = None;
    let mut after_prefix = false;

    for SpannedToken { token, .. } in tokens {
        let spaced = match (previous, token) {
            (None, _) => false,
            _ if after_prefix => false,
            (_, Token::RParen | Token::Comma | Token::Dot) => false,
            (Some(Token::LParen | Token::Dot), _) => false,
            // function call
            (Some(Token::Identifier(_)), Token::LParen) => false,
            _ => true,
        };
        if spaced {
            text.push(' ');
        }
        text.push_str(&token.to_string());

        after_prefix = matches!(token, Token::Minus | Token::Plus | Token::Tilde)
            && !previous.is_some_and(ends_operand);
        previous = Some(token);
    }

    text
}

fn ends_operand(token: &Token) -> bool {
    matches!(
        token,
        Token::Integer(_)
            | Token::Real(_)
            | Token::Float(_)
            | Token::String(_)
            | Token::Blob(_)
            | Token::Parameter(_)
            | Token::Identifier(_)
            | Token::QuotedIdentifier(_)
            | Token::RParen
            | Token::NotNullOp
            | Token::Keyword(
                Keyword::True
                    | Keyword::False
                    | Keyword::Null
                    | Keyword::NotNull
                    | Keyword::IsNull
                    | Keyword::CurrentDate
                    | Keyword::CurrentTime
                    | Keyword::CurrentTimestamp
            )
    )
}
