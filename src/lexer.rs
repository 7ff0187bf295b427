use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::ast::{Keyword, Parameter, Token};

/// Location of a character in the query text.
///
/// `offset` counts characters from the start of the input; `line` and
/// `column` are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Default for Position {
    fn default() -> Self {
        Position {
            offset: 0,
            line: 1,
            column: 1,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Error raised while splitting the query text into tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub message: String,
    pub position: Position,
}

impl LexError {
    fn new(message: impl Into<String>, position: Position) -> Self {
        LexError {
            message: message.into(),
            position,
        }
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.message, self.position)
    }
}

impl std::error::Error for LexError {}

/// A token together with where it starts and the offset just past its end.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub start: Position,
    pub end: usize,
}

pub struct Lexer {
    input: Vec<char>,
    position: Position,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: Position::default(),
        }
    }

    /// Current location in the input.
    pub fn position(&self) -> Position {
        self.position
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position.offset).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position.offset + offset).copied()
    }

    fn advance(&mut self) {
        if let Some(ch) = self.current_char() {
            self.position.offset += 1;
            if ch == '\n' {
                self.position.line += 1;
                self.position.column = 1;
            } else {
                self.position.column += 1;
            }
        }
    }

    /// Skip whitespace, `-- line` comments and `/* block */` comments.
    fn skip_trivia(&mut self) -> Result<(), LexError> {
        loop {
            match (self.current_char(), self.peek_char(1)) {
                (Some(ch), _) if ch.is_whitespace() => self.advance(),
                (Some('-'), Some('-')) => {
                    while let Some(ch) = self.current_char() {
                        if ch == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                (Some('/'), Some('*')) => {
                    let start = self.position;
                    self.advance();
                    self.advance();
                    loop {
                        match (self.current_char(), self.peek_char(1)) {
                            (Some('*'), Some('/')) => {
                                self.advance();
                                self.advance();
                                break;
                            }
                            (Some(_), _) => self.advance(),
                            (None, _) => {
                                return Err(LexError::new("Unterminated block comment", start));
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn read_word(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    /// Read a quoted run where the quote character is escaped by doubling it.
    fn read_quoted(&mut self, quote: char, what: &str) -> Result<String, LexError> {
        let start = self.position;
        let mut result = String::new();
        self.advance(); // Consume opening quote

        while let Some(ch) = self.current_char() {
            self.advance();
            if ch == quote {
                if self.current_char() == Some(quote) {
                    result.push(quote);
                    self.advance();
                } else {
                    return Ok(result);
                }
            } else {
                result.push(ch);
            }
        }

        Err(LexError::new(format!("Unterminated {}", what), start))
    }

    fn read_number(&mut self) -> Result<Token, LexError> {
        let start = self.position;
        let mut text = String::new();
        let mut is_real = false;

        if self.current_char() == Some('.') {
            text.push('0');
        }

        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                text.push(ch);
                self.advance();
            } else if ch == '.' && !is_real && self.peek_char(1).is_some_and(|c| c.is_ascii_digit())
            {
                is_real = true;
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        // Exponent: e, e+, e- followed by at least one digit
        if matches!(self.current_char(), Some('e' | 'E')) {
            let digits_at = match self.peek_char(1) {
                Some('+' | '-') => 2,
                _ => 1,
            };
            if self.peek_char(digits_at).is_some_and(|c| c.is_ascii_digit()) {
                is_real = true;
                text.push('e');
                self.advance();
                if digits_at == 2 {
                    if let Some(sign) = self.current_char() {
                        text.push(sign);
                    }
                    self.advance();
                }
                while let Some(ch) = self.current_char() {
                    if !ch.is_ascii_digit() {
                        break;
                    }
                    text.push(ch);
                    self.advance();
                }
            }
        }

        if !is_real {
            if let Ok(n) = text.parse::<i64>() {
                return Ok(Token::Integer(n));
            }
        }

        let parsed = if text.contains('e') {
            Decimal::from_scientific(&text)
        } else {
            Decimal::from_str(&text)
        };
        if let Ok(d) = parsed {
            return Ok(Token::Real(d.normalize()));
        }

        // Beyond Decimal's 28 digits: carry the nearest double, as jq would
        match text.parse::<f64>() {
            Ok(f) if f.is_finite() => Ok(Token::Float(f)),
            _ => Err(LexError::new(
                format!("Numeric literal out of range: {}", text),
                start,
            )),
        }
    }

    fn read_parameter(&mut self) -> Result<Token, LexError> {
        let start = self.position;
        let prefix = self.current_char().unwrap_or('?');
        self.advance();

        if prefix == '?' {
            let mut digits = String::new();
            while let Some(ch) = self.current_char() {
                if !ch.is_ascii_digit() {
                    break;
                }
                digits.push(ch);
                self.advance();
            }
            if digits.is_empty() {
                return Ok(Token::Parameter(Parameter::Positional(None)));
            }
            return match digits.parse::<u32>() {
                Ok(n) if n > 0 => Ok(Token::Parameter(Parameter::Positional(Some(n)))),
                _ => Err(LexError::new(
                    format!("Invalid parameter number ?{}", digits),
                    start,
                )),
            };
        }

        let name = match self.current_char() {
            Some('"') => self.read_quoted('"', "quoted identifier")?,
            Some(ch) if ch.is_alphabetic() || ch == '_' => self.read_word().to_lowercase(),
            _ => {
                return Err(LexError::new(
                    format!("Expected parameter name after '{}'", prefix),
                    start,
                ));
            }
        };
        Ok(Token::Parameter(Parameter::Named { prefix, name }))
    }

    /// Scan the next raw token. `NOT` is always returned on its own here; see
    /// [`Lexer::tokenize`] for operator fusion.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_trivia()?;
        self.scan_token()
    }

    fn single(&mut self, token: Token) -> Result<Token, LexError> {
        self.advance();
        Ok(token)
    }

    fn double(&mut self, token: Token) -> Result<Token, LexError> {
        self.advance();
        self.advance();
        Ok(token)
    }

    fn scan_token(&mut self) -> Result<Token, LexError> {
        match self.current_char() {
            None => Ok(Token::Eof),
            Some('(') => self.single(Token::LParen),
            Some(')') => self.single(Token::RParen),
            Some(',') => self.single(Token::Comma),
            Some(';') => self.single(Token::Semicolon),
            Some('*') => self.single(Token::Star),
            Some('/') => self.single(Token::Slash),
            Some('%') => self.single(Token::Percent),
            Some('+') => self.single(Token::Plus),
            Some('-') => self.single(Token::Minus),
            Some('&') => self.single(Token::Ampersand),
            Some('~') => self.single(Token::Tilde),
            Some('|') => match self.peek_char(1) {
                Some('|') => self.double(Token::Concat),
                _ => self.single(Token::Pipe),
            },
            Some('<') => match self.peek_char(1) {
                Some('<') => self.double(Token::ShiftLeft),
                Some('=') => self.double(Token::LtEq),
                Some('>') => self.double(Token::LtGt),
                _ => self.single(Token::Lt),
            },
            Some('>') => match self.peek_char(1) {
                Some('>') => self.double(Token::ShiftRight),
                Some('=') => self.double(Token::GtEq),
                _ => self.single(Token::Gt),
            },
            Some('=') => match self.peek_char(1) {
                Some('=') => self.double(Token::EqEq),
                _ => self.single(Token::Eq),
            },
            Some('!') => match self.peek_char(1) {
                Some('=') => self.double(Token::NotEq),
                _ => Err(LexError::new(
                    "Unexpected '!' (did you mean '!=' or NOT?)",
                    self.position,
                )),
            },
            Some('\'') => Ok(Token::String(self.read_quoted('\'', "string literal")?)),
            Some('"') => Ok(Token::QuotedIdentifier(
                self.read_quoted('"', "quoted identifier")?,
            )),
            Some('x' | 'X') if self.peek_char(1) == Some('\'') => {
                let start = self.position;
                self.advance();
                let hex = self.read_quoted('\'', "blob literal")?;
                if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                    return Err(LexError::new(format!("Invalid blob literal x'{}'", hex), start));
                }
                Ok(Token::Blob(hex))
            }
            Some('?' | ':' | '@' | '$') => self.read_parameter(),
            Some('.') if self.peek_char(1).is_some_and(|c| c.is_ascii_digit()) => {
                self.read_number()
            }
            Some('.') => self.single(Token::Dot),
            Some(ch) if ch.is_ascii_digit() => self.read_number(),
            Some(ch) if ch.is_alphabetic() || ch == '_' => {
                let word = self.read_word();
                match Keyword::lookup(&word) {
                    Some(keyword) => Ok(Token::Keyword(keyword)),
                    None => Ok(Token::Identifier(word.to_lowercase())),
                }
            }
            Some(ch) => Err(LexError::new(
                format!("Unexpected character '{}'", ch),
                self.position,
            )),
        }
    }

    /// Split the whole input into tokens, ending with [`Token::Eof`].
    ///
    /// A `NOT` immediately followed by `NULL`, `BETWEEN`, `IN`, `LIKE` or
    /// `REGEXP` is fused into a single negated-operator token.
    pub fn tokenize(&mut self) -> Result<Vec<SpannedToken>, LexError> {
        let mut tokens: Vec<SpannedToken> = Vec::new();

        loop {
            self.skip_trivia()?;
            let start = self.position;
            let token = self.scan_token()?;
            let end = self.position.offset;
            let at_end = token == Token::Eof;

            let fused = match (tokens.last().map(|t| &t.token), &token) {
                (Some(Token::Keyword(Keyword::Not)), Token::Keyword(keyword)) => match keyword {
                    Keyword::Null => Some(Token::NotNullOp),
                    Keyword::Between => Some(Token::NotBetween),
                    Keyword::In => Some(Token::NotIn),
                    Keyword::Like => Some(Token::NotLike),
                    Keyword::Regexp => Some(Token::NotRegexp),
                    _ => None,
                },
                _ => None,
            };

            match (fused, tokens.last_mut()) {
                (Some(fused), Some(previous)) => {
                    previous.token = fused;
                    previous.end = end;
                }
                _ => tokens.push(SpannedToken { token, start, end }),
            }

            if at_end {
                return Ok(tokens);
            }
        }
    }
}

#[test]
fn test_keywords_are_case_insensitive() {
    let mut lexer = Lexer::new("select SeLeCt WHERE");
    assert_eq!(lexer.next_token().unwrap(), Token::Keyword(Keyword::Select));
    assert_eq!(lexer.next_token().unwrap(), Token::Keyword(Keyword::Select));
    assert_eq!(lexer.next_token().unwrap(), Token::Keyword(Keyword::Where));
    assert_eq!(lexer.next_token().unwrap(), Token::Eof);
}

#[test]
fn test_not_fusion() {
    let mut lexer = Lexer::new("a NOT LIKE 'x' AND NOT b");
    let tokens: Vec<Token> = lexer
        .tokenize()
        .unwrap()
        .into_iter()
        .map(|t| t.token)
        .collect();
    assert_eq!(
        tokens,
        vec![
            Token::Identifier("a".into()),
            Token::NotLike,
            Token::String("x".into()),
            Token::Keyword(Keyword::And),
            Token::Keyword(Keyword::Not),
            Token::Identifier("b".into()),
            Token::Eof,
        ]
    );
}
