// tests/parser_tests.rs

use mql_lang::ast::{
    BinOp, ColumnRef, Direction, Expr, FunctionArgs, Literal, Parameter, ResultColumn,
    SelectOption, SelectStatement, UnaryOp,
};
use mql_lang::lexer::Lexer;
use mql_lang::parser::{ParseError, Parser};

fn parse_expr(input: &str) -> Expr {
    let lexer = Lexer::new(input);
    let mut parser = Parser::new(lexer).unwrap();
    parser.parse().unwrap()
}

fn parse_query(input: &str) -> Result<SelectStatement, ParseError> {
    let lexer = Lexer::new(input);
    let mut parser = Parser::new(lexer)?;
    parser.parse_query()
}

fn col(name: &str) -> Expr {
    Expr::Column(ColumnRef::new(name))
}

fn int(n: i64) -> Expr {
    Expr::Literal(Literal::Integer(n))
}

fn string(s: &str) -> Expr {
    Expr::Literal(Literal::String(s.to_string()))
}

// ============================================================================
// Precedence
// ============================================================================

#[test]
fn test_multiplication_binds_tighter_than_addition() {
    // Should be: Add(1, Multiply(2, 3))
    assert_eq!(
        parse_expr("1 + 2 * 3"),
        Expr::binary(BinOp::Add, int(1), Expr::binary(BinOp::Multiply, int(2), int(3)))
    );
}

#[test]
fn test_parentheses_override_precedence() {
    // Should be: Multiply(Add(1, 2), 3)
    assert_eq!(
        parse_expr("(1 + 2) * 3"),
        Expr::binary(BinOp::Multiply, Expr::binary(BinOp::Add, int(1), int(2)), int(3))
    );
}

#[test]
fn test_binary_operators_are_left_associative() {
    assert_eq!(
        parse_expr("1 - 1 - 1"),
        Expr::binary(BinOp::Subtract, Expr::binary(BinOp::Subtract, int(1), int(1)), int(1))
    );
}

#[test]
fn test_and_binds_tighter_than_or() {
    assert_eq!(
        parse_expr("a = 1 OR b = 2 AND c = 3"),
        Expr::binary(
            BinOp::Or,
            Expr::binary(BinOp::Equal, col("a"), int(1)),
            Expr::binary(
                BinOp::And,
                Expr::binary(BinOp::Equal, col("b"), int(2)),
                Expr::binary(BinOp::Equal, col("c"), int(3)),
            ),
        )
    );
}

#[test]
fn test_relational_binds_tighter_than_equality() {
    assert_eq!(
        parse_expr("a < 1 = b > 2"),
        Expr::binary(
            BinOp::Equal,
            Expr::binary(BinOp::LessThan, col("a"), int(1)),
            Expr::binary(BinOp::GreaterThan, col("b"), int(2)),
        )
    );
}

#[test]
fn test_concat_binds_tighter_than_multiplication() {
    assert_eq!(
        parse_expr("a * b || c"),
        Expr::binary(
            BinOp::Multiply,
            col("a"),
            Expr::binary(BinOp::Concat, col("b"), col("c"))
        )
    );
}

#[test]
fn test_unary_operators() {
    assert_eq!(parse_expr("-a"), Expr::unary(UnaryOp::Negate, col("a")));
    assert_eq!(
        parse_expr("- - a"),
        Expr::unary(UnaryOp::Negate, Expr::unary(UnaryOp::Negate, col("a")))
    );
    assert_eq!(parse_expr("~a"), Expr::unary(UnaryOp::BitNot, col("a")));
    assert_eq!(parse_expr("NOT a"), Expr::unary(UnaryOp::Not, col("a")));
}

#[test]
fn test_postfix_null_tests() {
    assert_eq!(parse_expr("a ISNULL"), Expr::unary(UnaryOp::IsNull, col("a")));
    assert_eq!(parse_expr("a NOTNULL"), Expr::unary(UnaryOp::NotNull, col("a")));
    assert_eq!(parse_expr("a NOT NULL"), Expr::unary(UnaryOp::NotNull, col("a")));
}

// ============================================================================
// Comparison Tier
// ============================================================================

#[test]
fn test_equality_spellings() {
    let test_cases = vec![
        ("a = 1", BinOp::Equal),
        ("a == 1", BinOp::EqualEqual),
        ("a != 1", BinOp::NotEqual),
        ("a <> 1", BinOp::LessGreater),
        ("a IS 1", BinOp::Is),
        ("a IS NOT 1", BinOp::IsNot),
    ];

    for (input, op) in test_cases {
        assert_eq!(
            parse_expr(input),
            Expr::binary(op, col("a"), int(1)),
            "Failed for input: {}",
            input
        );
    }
}

#[test]
fn test_is_not_null() {
    assert_eq!(
        parse_expr("a IS NOT NULL"),
        Expr::binary(BinOp::IsNot, col("a"), Expr::Literal(Literal::Null))
    );
    assert_eq!(
        parse_expr("a IS NULL"),
        Expr::binary(BinOp::Is, col("a"), Expr::Literal(Literal::Null))
    );
}

#[test]
fn test_negated_pattern_operators() {
    assert_eq!(
        parse_expr("a NOT LIKE 'x%'"),
        Expr::binary(BinOp::NotLike, col("a"), string("x%"))
    );
    assert_eq!(
        parse_expr("a NOT REGEXP 'x'"),
        Expr::binary(BinOp::NotRegexp, col("a"), string("x"))
    );
}

#[test]
fn test_not_before_comparison_is_prefix() {
    // Prefix NOT binds tightest, so it only wraps the column
    assert_eq!(
        parse_expr("NOT a = 1"),
        Expr::binary(BinOp::Equal, Expr::unary(UnaryOp::Not, col("a")), int(1))
    );
}

#[test]
fn test_binary_in_without_list() {
    assert_eq!(parse_expr("a IN b"), Expr::binary(BinOp::In, col("a"), col("b")));
}

// ============================================================================
// IN and BETWEEN
// ============================================================================

#[test]
fn test_in_list() {
    assert_eq!(
        parse_expr("a IN (256, 1000 + 500)"),
        Expr::InList {
            negated: false,
            value: Box::new(col("a")),
            list: vec![int(256), Expr::binary(BinOp::Add, int(1000), int(500))],
        }
    );
}

#[test]
fn test_not_in_list() {
    assert!(matches!(
        parse_expr("a NOT IN ('x', 'y')"),
        Expr::InList { negated: true, ref list, .. } if list.len() == 2
    ));
}

#[test]
fn test_between_consumes_its_and() {
    assert_eq!(
        parse_expr("a BETWEEN 1 AND 5 AND b = 2"),
        Expr::binary(
            BinOp::And,
            Expr::Between {
                negated: false,
                value: Box::new(col("a")),
                low: Box::new(int(1)),
                high: Box::new(int(5)),
            },
            Expr::binary(BinOp::Equal, col("b"), int(2)),
        )
    );
}

#[test]
fn test_not_between() {
    assert!(matches!(
        parse_expr("a NOT BETWEEN 1 AND 5"),
        Expr::Between { negated: true, .. }
    ));
}

#[test]
fn test_between_missing_and() {
    let lexer = Lexer::new("a BETWEEN 1 OR 5");
    let err = Parser::new(lexer).unwrap().parse().unwrap_err();
    assert!(err.message.contains("Expected AND"), "{}", err.message);
}

// ============================================================================
// Primaries
// ============================================================================

#[test]
fn test_qualified_column_refs() {
    assert_eq!(
        parse_expr("images.\"SourceFile\""),
        Expr::Column(ColumnRef {
            database: None,
            table: Some("images".into()),
            column: "SourceFile".into(),
        })
    );
    assert_eq!(
        parse_expr("db.images.height"),
        Expr::Column(ColumnRef {
            database: Some("db".into()),
            table: Some("images".into()),
            column: "height".into(),
        })
    );
}

#[test]
fn test_too_many_qualifiers() {
    let lexer = Lexer::new("a.b.c.d");
    assert!(Parser::new(lexer).unwrap().parse().is_err());
}

#[test]
fn test_function_calls() {
    assert!(matches!(
        parse_expr("lower(\"File:FileType\")"),
        Expr::Function { ref name, args: FunctionArgs::List(ref args), .. }
            if name == "lower" && args.len() == 1
    ));
    assert!(matches!(
        parse_expr("count(*)"),
        Expr::Function { args: FunctionArgs::Star, .. }
    ));
    assert!(matches!(
        parse_expr("random()"),
        Expr::Function { args: FunctionArgs::List(ref args), .. } if args.is_empty()
    ));
}

#[test]
fn test_keyword_literals() {
    assert_eq!(parse_expr("TRUE"), Expr::Literal(Literal::Boolean(true)));
    assert_eq!(parse_expr("false"), Expr::Literal(Literal::Boolean(false)));
    assert_eq!(parse_expr("Null"), Expr::Literal(Literal::Null));
    assert_eq!(parse_expr("CURRENT_DATE"), Expr::Literal(Literal::CurrentDate));
}

#[test]
fn test_parameters() {
    match parse_expr("a > :min") {
        Expr::Binary { op: BinOp::GreaterThan, left, right } => {
            assert_eq!(*left, col("a"));
            match *right {
                Expr::Parameter { parameter, position } => {
                    assert_eq!(
                        parameter,
                        Parameter::Named {
                            prefix: ':',
                            name: "min".into()
                        }
                    );
                    assert_eq!(position.column, 5);
                }
                other => panic!("expected parameter, got {:?}", other),
            }
        }
        other => panic!("expected comparison, got {:?}", other),
    }
}

#[test]
fn test_exists_subquery() {
    assert!(matches!(
        parse_expr("EXISTS (SELECT * WHERE a = 1)"),
        Expr::Exists { .. }
    ));
}

#[test]
fn test_reserved_keyword_as_column() {
    let lexer = Lexer::new("a = order");
    let err = Parser::new(lexer).unwrap().parse().unwrap_err();
    assert!(err.message.contains("reserved keyword ORDER"), "{}", err.message);
}

// ============================================================================
// SELECT Statements
// ============================================================================

#[test]
fn test_select_star() {
    let statement = parse_query("SELECT * From Database").unwrap();
    assert!(matches!(statement.columns[..], [ResultColumn::Star { .. }]));
    let source = statement.source.unwrap();
    assert_eq!(source.name, "database");
    assert!(statement.where_clause.is_none());
}

#[test]
fn test_from_is_optional() {
    let statement = parse_query("SELECT * WHERE 1").unwrap();
    assert!(statement.source.is_none());
    assert_eq!(statement.where_clause, Some(int(1)));
}

#[test]
fn test_result_columns_and_aliases() {
    let statement =
        parse_query(r#"SELECT "SourceFile" AS file, height h, "File:ImageWidth" * 2 FROM db.images"#)
            .unwrap();

    match &statement.columns[..] {
        [
            ResultColumn::Expr { alias: a1, expr: e1, .. },
            ResultColumn::Expr { alias: a2, .. },
            ResultColumn::Expr { alias: a3, text, .. },
        ] => {
            assert_eq!(a1.as_deref(), Some("file"));
            assert_eq!(e1, &col("SourceFile"));
            assert_eq!(a2.as_deref(), Some("h"));
            assert_eq!(a3, &None);
            assert_eq!(text, r#""File:ImageWidth" * 2"#);
        }
        other => panic!("unexpected columns: {:?}", other),
    }

    let source = statement.source.unwrap();
    assert_eq!(source.database.as_deref(), Some("db"));
    assert_eq!(source.name, "images");
}

#[test]
fn test_qualified_star_result_column() {
    let statement = parse_query("SELECT images.* FROM images").unwrap();
    assert!(matches!(
        &statement.columns[..],
        [ResultColumn::QualifiedStar { table, .. }] if table == "images"
    ));
}

#[test]
fn test_select_options() {
    assert_eq!(
        parse_query("SELECT DISTINCT a").unwrap().option,
        Some(SelectOption::Distinct)
    );
    assert_eq!(parse_query("SELECT ALL a").unwrap().option, Some(SelectOption::All));
    assert!(!parse_query("SELECT ALL a").unwrap().is_distinct());
}

#[test]
fn test_order_by() {
    let statement = parse_query("SELECT a, b ORDER BY a, 2 DESC").unwrap();
    assert_eq!(statement.order_by.len(), 2);
    assert_eq!(statement.order_by[0].expr, col("a"));
    assert_eq!(statement.order_by[0].direction, None);
    assert_eq!(statement.order_by[0].direction(), Direction::Asc);
    assert_eq!(statement.order_by[1].expr, int(2));
    assert_eq!(statement.order_by[1].direction, Some(Direction::Desc));
}

#[test]
fn test_limit_forms_normalize() {
    let offset_form = parse_query("SELECT a LIMIT 5 OFFSET 6").unwrap().limit.unwrap();
    let comma_form = parse_query("SELECT a LIMIT 6, 5").unwrap().limit.unwrap();
    assert_eq!(offset_form.count, int(5));
    assert_eq!(offset_form.offset, Some(int(6)));
    assert_eq!(comma_form.count, offset_form.count);
    assert_eq!(comma_form.offset, offset_form.offset);

    let bare = parse_query("SELECT a LIMIT 6").unwrap().limit.unwrap();
    assert_eq!(bare.count, int(6));
    assert_eq!(bare.offset, None);
}

#[test]
fn test_trailing_semicolon() {
    assert!(parse_query("SELECT *;").is_ok());
    assert!(parse_query("SELECT *; SELECT *").is_err());
}

#[test]
fn test_having_is_parsed() {
    let statement = parse_query("SELECT a WHERE a > 1 HAVING a > 2").unwrap();
    assert!(statement.having.is_some());
}

#[test]
fn test_group_by_is_rejected() {
    let err = parse_query("SELECT a GROUP BY a").unwrap_err();
    assert!(err.message.contains("GROUP BY"));
}

#[test]
fn test_compound_select_is_rejected() {
    for input in [
        "SELECT a UNION SELECT b",
        "SELECT a UNION ALL SELECT b",
        "SELECT a INTERSECT SELECT b",
        "SELECT a EXCEPT SELECT b",
    ] {
        let err = parse_query(input).unwrap_err();
        assert!(err.message.contains("Compound SELECT"), "Failed for input: {}", input);
    }
}

#[test]
fn test_error_reports_position() {
    let err = parse_query("SELECT a\nWHERE a >").unwrap_err();
    assert_eq!(err.position.line, 2);
    assert_eq!(err.position.column, 10);
    assert!(err.to_string().contains("line 2, column 10"));
}

#[test]
fn test_missing_select() {
    let err = parse_query("a FROM b").unwrap_err();
    assert!(err.message.contains("Expected SELECT"), "{}", err.message);
}

#[test]
fn test_trailing_garbage() {
    assert!(parse_query("SELECT a FROM b c d").is_err());
}
