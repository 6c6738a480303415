//! Display filter front end.
//!
//! Filters such as `ip.src == 10.0.0.0/8 and tcp.port in {80, 443}` are
//! scanned, parsed and resolved against a [`Scheme`] of protocol fields into
//! a typed [`FilterAst`], which can then be executed against the values of a
//! dissected packet stored in an [`ExecutionContext`].
//!
//! ```
//! use dfilter::ExecutionContext;
//! use std::net::IpAddr;
//!
//! let scheme = dfilter::Scheme! {
//!     ip.src: Ip,
//!     tcp.port: Int,
//! };
//!
//! let ast = scheme.parse("ip.src == 10.0.0.0/8 and tcp.port in {80, 443}").unwrap();
//!
//! let mut ctx = ExecutionContext::new(&scheme);
//! ctx.add_field_value("ip.src", IpAddr::from([10, 1, 2, 3])).unwrap();
//! ctx.add_field_value("tcp.port", 443).unwrap();
//!
//! assert_eq!(ast.execute(&ctx), Ok(true));
//! ```

#[macro_use]
mod lex;

#[macro_use]
mod scheme;

mod ast;
mod diagnostics;
mod execution_context;
mod location;
mod op;
mod rhs_types;
mod scanner;
mod strict_partial_ord;
mod types;

pub use self::{
    ast::{
        field_expr::{ComparisonExpr, ComparisonOpExpr, SetElement},
        logical_expr::{LogicalExpr, ParenthesizedExpr},
        parse::{FilterParser, ParseError, ParserSettings},
        range::{DRange, LayerSpec},
        value_expr::{FieldExpr, LiteralExpr, ValueExpr},
        FilterAst, SchemeMismatchError,
    },
    diagnostics::{Diagnostics, LogDiagnostics, Warning},
    execution_context::{ExecutionContext, SetFieldValueError},
    lex::LexErrorKind,
    location::Span,
    op::{ArithOp, LogicalOp, OrderingOp, Punct, Quantifier, TestOp, UnaryOp},
    rhs_types::{Bytes, IpLiteral, Literal, Regex},
    scanner::{LiteralShape, Mode, Scanner, Token, TokenKind, TokenStream},
    scheme::{Field, FieldRedefinitionError, Scheme, UnknownFieldError},
    types::{GetType, LhsValue, Type, TypeMismatchError},
};
