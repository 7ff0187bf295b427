// tests/lexer_tests.rs

use mql_lang::ast::{Keyword, Parameter, Token};
use mql_lang::lexer::Lexer;
use rust_decimal::Decimal;
use std::str::FromStr;

fn tokens(input: &str) -> Vec<Token> {
    Lexer::new(input)
        .tokenize()
        .unwrap()
        .into_iter()
        .map(|t| t.token)
        .collect()
}

// ============================================================================
// Operators
// ============================================================================

#[test]
fn test_single_char_tokens() {
    let test_cases = vec![
        ("*", Token::Star),
        ("/", Token::Slash),
        ("%", Token::Percent),
        ("+", Token::Plus),
        ("-", Token::Minus),
        ("&", Token::Ampersand),
        ("|", Token::Pipe),
        ("~", Token::Tilde),
        ("<", Token::Lt),
        (">", Token::Gt),
        ("=", Token::Eq),
        ("(", Token::LParen),
        (")", Token::RParen),
        (",", Token::Comma),
        (".", Token::Dot),
        (";", Token::Semicolon),
    ];

    for (input, expected) in test_cases {
        let mut lexer = Lexer::new(input);
        let token = lexer.next_token().unwrap();
        assert_eq!(token, expected, "Failed for input: {}", input);
        assert_eq!(lexer.next_token().unwrap(), Token::Eof);
    }
}

#[test]
fn test_two_char_tokens() {
    let test_cases = vec![
        ("||", Token::Concat),
        ("<<", Token::ShiftLeft),
        (">>", Token::ShiftRight),
        ("<=", Token::LtEq),
        (">=", Token::GtEq),
        ("==", Token::EqEq),
        ("!=", Token::NotEq),
        ("<>", Token::LtGt),
    ];

    for (input, expected) in test_cases {
        let mut lexer = Lexer::new(input);
        assert_eq!(lexer.next_token().unwrap(), expected, "Failed for input: {}", input);
        assert_eq!(lexer.next_token().unwrap(), Token::Eof);
    }
}

#[test]
fn test_lone_bang_is_an_error() {
    let mut lexer = Lexer::new("a ! b");
    assert_eq!(lexer.next_token().unwrap(), Token::Identifier("a".into()));
    let err = lexer.next_token().unwrap_err();
    assert_eq!(err.position.column, 3);
}

// ============================================================================
// Literals
// ============================================================================

#[test]
fn test_integers() {
    assert_eq!(tokens("42"), vec![Token::Integer(42), Token::Eof]);
    assert_eq!(tokens("01"), vec![Token::Integer(1), Token::Eof]);
}

#[test]
fn test_reals() {
    let test_cases = vec![
        ("3.14", "3.14"),
        (".5", "0.5"),
        ("10E9", "10000000000"),
        ("2.50", "2.5"),
        ("1e-2", "0.01"),
    ];

    for (input, expected) in test_cases {
        assert_eq!(
            tokens(input),
            vec![Token::Real(Decimal::from_str(expected).unwrap()), Token::Eof],
            "Failed for input: {}",
            input
        );
    }
}

#[test]
fn test_integer_overflow_becomes_real() {
    assert_eq!(
        tokens("9223372036854775808"),
        vec![
            Token::Real(Decimal::from_str("9223372036854775808").unwrap()),
            Token::Eof
        ]
    );
}

#[test]
fn test_reals_beyond_decimal_range() {
    let test_cases = vec![
        ("1e30", 1e30),
        ("1.5e-40", 1.5e-40),
        (
            "99999999999999999999999999999999",
            "99999999999999999999999999999999".parse::<f64>().unwrap(),
        ),
    ];

    for (input, expected) in test_cases {
        assert_eq!(tokens(input), vec![Token::Float(expected), Token::Eof], "input: {}", input);
    }

    assert_eq!(Token::Float(1e30).to_string(), "1e30");
    assert_eq!(Token::Float(1.5e-40).to_string(), "1.5e-40");
}

#[test]
fn test_infinite_real_is_an_error() {
    let err = Lexer::new("1e400").tokenize().unwrap_err();
    assert!(err.message.contains("out of range"), "{}", err.message);
}

#[test]
fn test_string_literals() {
    assert_eq!(tokens("'hello'"), vec![Token::String("hello".into()), Token::Eof]);
    assert_eq!(
        tokens("'is ''scary'''"),
        vec![Token::String("is 'scary'".into()), Token::Eof]
    );
    assert_eq!(tokens("''"), vec![Token::String(String::new()), Token::Eof]);
}

#[test]
fn test_unterminated_string() {
    let err = Lexer::new("select 'abc").tokenize().unwrap_err();
    assert!(err.message.contains("Unterminated string literal"));
    assert_eq!(err.position.column, 8);
}

#[test]
fn test_blob_literals() {
    assert_eq!(tokens("x'C0FFEE'"), vec![Token::Blob("C0FFEE".into()), Token::Eof]);
    assert_eq!(tokens("X'00'"), vec![Token::Blob("00".into()), Token::Eof]);
    assert!(Lexer::new("x'XYZ'").tokenize().is_err());
    assert!(Lexer::new("x''").tokenize().is_err());
}

// ============================================================================
// Identifiers and Keywords
// ============================================================================

#[test]
fn test_bare_identifiers_fold_to_lower_case() {
    assert_eq!(
        tokens("SourceFile"),
        vec![Token::Identifier("sourcefile".into()), Token::Eof]
    );
}

#[test]
fn test_quoted_identifiers_keep_case() {
    assert_eq!(
        tokens(r#""File:ImageHeight""#),
        vec![Token::QuotedIdentifier("File:ImageHeight".into()), Token::Eof]
    );
    assert_eq!(
        tokens(r#""a""b""#),
        vec![Token::QuotedIdentifier("a\"b".into()), Token::Eof]
    );
}

#[test]
fn test_keywords() {
    let test_cases = vec![
        ("select", Keyword::Select),
        ("From", Keyword::From),
        ("WHERE", Keyword::Where),
        ("distinct", Keyword::Distinct),
        ("regexp", Keyword::Regexp),
        ("isnull", Keyword::IsNull),
        ("notnull", Keyword::NotNull),
        ("current_timestamp", Keyword::CurrentTimestamp),
        ("union", Keyword::Union),
    ];

    for (input, expected) in test_cases {
        assert_eq!(
            tokens(input),
            vec![Token::Keyword(expected), Token::Eof],
            "Failed for input: {}",
            input
        );
    }
}

// ============================================================================
// Parameters
// ============================================================================

#[test]
fn test_parameters() {
    assert_eq!(
        tokens("? ?3 :min @Max $x"),
        vec![
            Token::Parameter(Parameter::Positional(None)),
            Token::Parameter(Parameter::Positional(Some(3))),
            Token::Parameter(Parameter::Named {
                prefix: ':',
                name: "min".into()
            }),
            Token::Parameter(Parameter::Named {
                prefix: '@',
                name: "max".into()
            }),
            Token::Parameter(Parameter::Named {
                prefix: '$',
                name: "x".into()
            }),
            Token::Eof,
        ]
    );
}

#[test]
fn test_parameter_zero_is_invalid() {
    assert!(Lexer::new("?0").tokenize().is_err());
    assert!(Lexer::new(": x").tokenize().is_err());
}

// ============================================================================
// Negated Operators
// ============================================================================

#[test]
fn test_not_fuses_with_following_operator() {
    let test_cases = vec![
        ("NOT NULL", Token::NotNullOp),
        ("not between", Token::NotBetween),
        ("NOT IN", Token::NotIn),
        ("NOT LIKE", Token::NotLike),
        ("Not Regexp", Token::NotRegexp),
    ];

    for (input, expected) in test_cases {
        assert_eq!(tokens(input), vec![expected, Token::Eof], "Failed for input: {}", input);
    }
}

#[test]
fn test_not_fuses_across_comments() {
    assert_eq!(
        tokens("a NOT /* x */ LIKE 'b'"),
        vec![
            Token::Identifier("a".into()),
            Token::NotLike,
            Token::String("b".into()),
            Token::Eof
        ]
    );
}

#[test]
fn test_free_standing_not() {
    assert_eq!(
        tokens("NOT a"),
        vec![
            Token::Keyword(Keyword::Not),
            Token::Identifier("a".into()),
            Token::Eof
        ]
    );
}

// ============================================================================
// Comments and Positions
// ============================================================================

#[test]
fn test_comments_are_skipped() {
    assert_eq!(
        tokens("SELECT -- everything\n* /* all\nrows */"),
        vec![Token::Keyword(Keyword::Select), Token::Star, Token::Eof]
    );
}

#[test]
fn test_unterminated_block_comment() {
    assert!(Lexer::new("SELECT /* oops").tokenize().is_err());
}

#[test]
fn test_token_positions() {
    let spanned = Lexer::new("SELECT\n  \"a\"").tokenize().unwrap();
    assert_eq!(spanned[1].start.line, 2);
    assert_eq!(spanned[1].start.column, 3);
    assert_eq!(spanned[1].start.offset, 9);
    assert_eq!(spanned[1].end, 12);
}
