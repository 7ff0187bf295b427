//! # MQL - Abstract Syntax Tree
//!
//! This module defines the parse tree for MQL, the SELECT dialect used to
//! query collections of per-file metadata records.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[expressions]** - Expression nodes (literals, column references, operations)
//! - **[operators]** - Unary and binary operators
//! - **[query]** - The SELECT statement: columns, WHERE, ORDER BY, LIMIT
//!
//! ## Quick Start
//!
//! ```text
//! SELECT "SourceFile" AS file FROM Database WHERE "File:ImageHeight" > 2315
//! ```
//!
//! ## Core Concepts
//!
//! ### Identifiers
//!
//! Bare identifiers are folded to lower case; double-quoted identifiers keep
//! their case. Metadata keys are usually mixed case (`File:FileType`), so they
//! are normally written quoted:
//!
//! ```text
//! SELECT SourceFile       -- looks up "sourcefile"
//! SELECT "SourceFile"     -- looks up "SourceFile"
//! ```
//!
//! ### Qualified Columns
//!
//! `db.table.column` and `table.column` are accepted, but only the trailing
//! column segment is used to look the value up in a record.
//!
//! ### Operator Precedence
//!
//! From loosest to tightest:
//!
//! ```text
//! OR
//! AND
//! IN (...) / NOT IN (...)
//! BETWEEN ... AND ... / NOT BETWEEN
//! = == != <> IS [NOT] IN LIKE REGEXP (and NOT variants)
//! < <= > >=
//! << >> & |
//! + -
//! * / %
//! ||
//! ISNULL NOTNULL NOT NULL
//! - + ~ NOT (prefix)
//! ```
//!
//! ## Examples
//!
//! ```text
//! SELECT * WHERE "File:FileType" LIKE 'j%g'
//! SELECT DISTINCT "File:FileType" AS type ORDER BY type
//! SELECT "SourceFile" WHERE "File:ImageHeight" NOT BETWEEN 256 AND 1500 LIMIT 6, 5
//! ```
pub mod expressions;
pub mod operators;
pub mod query;
pub mod tokens;

pub use expressions::{ColumnRef, Expr, FunctionArgs, Literal};
pub use operators::{BinOp, UnaryOp};
pub use query::{
    Direction, Limit, OrderingTerm, ResultColumn, SelectOption, SelectStatement, Source,
};
pub use tokens::{Keyword, Parameter, Token};
