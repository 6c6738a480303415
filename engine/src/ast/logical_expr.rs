use super::{
    field_expr::{ComparisonExpr, ComparisonOpExpr},
    parse::Parser,
    value_expr::ValueExpr,
    Expr,
};
use crate::{
    execution_context::ExecutionContext,
    lex::LexError,
    location::Span,
    op::{LogicalOp, Punct, UnaryOp},
    scanner::TokenKind,
    scheme::Field,
};
use serde::Serialize;

/// A parenthesized expression.
#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize)]
#[serde(transparent)]
pub struct ParenthesizedExpr<'s> {
    /// The inner expression.
    pub expr: LogicalExpr<'s>,
    #[serde(skip)]
    pub span: Span,
}

/// LogicalExpr is a either a generic sub-expression
/// or a logical conjunction expression.
#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize)]
#[serde(untagged)]
pub enum LogicalExpr<'s> {
    /// Logical conjunction expression
    Combining {
        /// Logical operator
        op: LogicalOp,
        /// List of sub-expressions
        items: Vec<LogicalExpr<'s>>,
    },
    /// A comparison expression.
    Comparison(ComparisonExpr<'s>),
    /// A parenthesized expression.
    Parenthesized(Box<ParenthesizedExpr<'s>>),
    /// A unary expression.
    Unary {
        /// Unary operator.
        op: UnaryOp,
        /// Sub-expression.
        arg: Box<LogicalExpr<'s>>,
    },
}

impl<'s> LogicalExpr<'s> {
    fn peek_combining_op<'i>(
        parser: &mut Parser<'_, 's, 'i, '_>,
    ) -> Result<Option<LogicalOp>, LexError<'i>> {
        Ok(match parser.peek_kind()? {
            Some(TokenKind::Logical(op)) => Some(op),
            _ => None,
        })
    }

    /// Turns `(value)` back into a value when the parentheses turn out to
    /// wrap an operand rather than a test, as in `(tcp.port + 1) == 81`.
    fn into_value(self) -> Result<ValueExpr<'s>, Self> {
        match self {
            LogicalExpr::Comparison(ComparisonExpr {
                lhs,
                op: ComparisonOpExpr::IsTrue,
                ..
            }) => Ok(lhs),
            LogicalExpr::Parenthesized(parenthesized) => {
                let ParenthesizedExpr { expr, span } = *parenthesized;
                match expr.into_value() {
                    Ok(value) => Ok(ValueExpr::Parenthesized {
                        expr: Box::new(value),
                        span,
                    }),
                    Err(expr) => Err(LogicalExpr::Parenthesized(Box::new(ParenthesizedExpr {
                        expr,
                        span,
                    }))),
                }
            }
            expr => Err(expr),
        }
    }

    fn parse_simple_expr<'i>(parser: &mut Parser<'_, 's, 'i, '_>) -> Result<Self, LexError<'i>> {
        match parser.peek_kind()? {
            Some(TokenKind::Punct(Punct::LParen)) => {
                let open = parser.tokens.expect_token()?;
                let expr = Self::parse(parser)?;
                parser.expect_punct(Punct::RParen, ")")?;
                let span = parser.span_from(open.span.start);

                let continues_as_value = matches!(
                    parser.peek_kind()?,
                    Some(
                        TokenKind::Test(_)
                            | TokenKind::Arith(_)
                            | TokenKind::LBracket
                            | TokenKind::Hash
                            | TokenKind::Unary(UnaryOp::Not)
                    )
                );
                let expr = if continues_as_value {
                    match expr.into_value() {
                        Ok(value) => {
                            let first = ValueExpr::Parenthesized {
                                expr: Box::new(value),
                                span,
                            };
                            return Ok(LogicalExpr::Comparison(ComparisonExpr::parse(
                                parser,
                                Some(first),
                            )?));
                        }
                        Err(expr) => expr,
                    }
                } else {
                    expr
                };

                Ok(LogicalExpr::Parenthesized(Box::new(ParenthesizedExpr {
                    expr,
                    span,
                })))
            }
            Some(TokenKind::Unary(op)) => {
                parser.tokens.expect_token()?;
                let arg = Self::parse_simple_expr(parser)?;
                Ok(LogicalExpr::Unary {
                    op,
                    arg: Box::new(arg),
                })
            }
            _ => Ok(LogicalExpr::Comparison(ComparisonExpr::parse(parser, None)?)),
        }
    }

    fn parse_more_with_precedence<'i>(
        self,
        parser: &mut Parser<'_, 's, 'i, '_>,
        min_prec: Option<LogicalOp>,
        mut lookahead: Option<LogicalOp>,
    ) -> Result<Self, LexError<'i>> {
        let mut lhs = self;

        while let Some(op) = lookahead {
            parser.tokens.expect_token()?;
            let mut rhs = Self::parse_simple_expr(parser)?;

            loop {
                lookahead = Self::peek_combining_op(parser)?;
                if lookahead <= Some(op) {
                    break;
                }
                rhs = rhs.parse_more_with_precedence(parser, lookahead, lookahead)?;
            }

            match lhs {
                LogicalExpr::Combining {
                    op: lhs_op,
                    ref mut items,
                } if lhs_op == op => {
                    items.push(rhs);
                }
                _ => {
                    lhs = LogicalExpr::Combining {
                        op,
                        items: vec![lhs, rhs],
                    };
                }
            }

            if lookahead < min_prec {
                // pretend we haven't seen an operator if its precedence is
                // outside of our limits
                lookahead = None;
            }
        }

        Ok(lhs)
    }

    pub(crate) fn parse<'i>(parser: &mut Parser<'_, 's, 'i, '_>) -> Result<Self, LexError<'i>> {
        let lhs = Self::parse_simple_expr(parser)?;
        let lookahead = Self::peek_combining_op(parser)?;
        lhs.parse_more_with_precedence(parser, None, lookahead)
    }
}

impl<'s> Expr<'s> for LogicalExpr<'s> {
    fn uses(&self, field: Field<'s>) -> bool {
        match self {
            LogicalExpr::Comparison(comparison) => comparison.uses(field),
            LogicalExpr::Parenthesized(node) => node.expr.uses(field),
            LogicalExpr::Unary { arg, .. } => arg.uses(field),
            LogicalExpr::Combining { items, .. } => items.iter().any(|item| item.uses(field)),
        }
    }

    fn execute(&self, ctx: &ExecutionContext<'_>) -> bool {
        match self {
            LogicalExpr::Comparison(comparison) => comparison.execute(ctx),
            LogicalExpr::Parenthesized(node) => node.expr.execute(ctx),
            LogicalExpr::Unary {
                op: UnaryOp::Not,
                arg,
            } => !arg.execute(ctx),
            LogicalExpr::Combining { op, items } => match op {
                LogicalOp::And => items.iter().all(|item| item.execute(ctx)),
                LogicalOp::Or => items.iter().any(|item| item.execute(ctx)),
                LogicalOp::Xor => items
                    .iter()
                    .fold(false, |acc, item| acc ^ item.execute(ctx)),
            },
        }
    }
}

#[test]
#[allow(clippy::bool_assert_comparison)]
fn test() {
    use crate::{ast::parse::FilterParser, scheme::Scheme};

    let scheme = &Scheme! {
        t: Bool,
        f: Bool,
        n: Int,
    };

    let mut ctx = ExecutionContext::new(scheme);
    ctx.add_field_value("t", true).unwrap();
    ctx.add_field_value("n", 1).unwrap();

    let parse = |input| FilterParser::new(scheme).parse(input).unwrap();
    let run = |input| parse(input).execute(&ctx).unwrap();

    assert_json!(
        parse("t and n or not f"),
        {
            "op": "Or",
            "items": [
                {
                    "op": "And",
                    "items": [
                        { "lhs": { "field": "t" }, "op": "IsTrue" },
                        { "lhs": { "field": "n" }, "op": "IsTrue" }
                    ]
                },
                { "op": "Not", "arg": { "lhs": { "field": "f" }, "op": "IsTrue" } }
            ]
        }
    );

    assert_json!(
        parse("t && n && t || f"),
        {
            "op": "Or",
            "items": [
                {
                    "op": "And",
                    "items": [
                        { "lhs": { "field": "t" }, "op": "IsTrue" },
                        { "lhs": { "field": "n" }, "op": "IsTrue" },
                        { "lhs": { "field": "t" }, "op": "IsTrue" }
                    ]
                },
                { "lhs": { "field": "f" }, "op": "IsTrue" }
            ]
        }
    );

    assert_json!(
        parse("t or n xor f and t"),
        {
            "op": "Or",
            "items": [
                { "lhs": { "field": "t" }, "op": "IsTrue" },
                {
                    "op": "Xor",
                    "items": [
                        { "lhs": { "field": "n" }, "op": "IsTrue" },
                        {
                            "op": "And",
                            "items": [
                                { "lhs": { "field": "f" }, "op": "IsTrue" },
                                { "lhs": { "field": "t" }, "op": "IsTrue" }
                            ]
                        }
                    ]
                }
            ]
        }
    );

    assert_json!(
        parse("(n + 1) == 2"),
        { "lhs": { "expr": { "op": "Add", "lhs": { "field": "n" }, "rhs": 1 } }, "op": "AnyEq", "rhs": 2 }
    );
    assert_json!(
        parse("((n)) * 2 == 2"),
        {
            "lhs": { "op": "Mul", "lhs": { "expr": { "expr": { "field": "n" } } }, "rhs": 2 },
            "op": "AnyEq",
            "rhs": 2
        }
    );
    assert_json!(
        parse("(t and f)"),
        { "op": "And", "items": [{ "lhs": { "field": "t" }, "op": "IsTrue" }, { "lhs": { "field": "f" }, "op": "IsTrue" }] }
    );

    assert_eq!(run("t"), true);
    assert_eq!(run("f"), false);
    assert_eq!(run("t and f"), false);
    assert_eq!(run("t or f"), true);
    assert_eq!(run("t xor f"), true);
    assert_eq!(run("t xor t"), false);
    assert_eq!(run("t xor t xor t"), true);
    assert_eq!(run("!t"), false);
    assert_eq!(run("not not t"), true);
    assert_eq!(run("not (t and f)"), true);
    assert_eq!(run("(n + 1) == 2"), true);
    assert_eq!(run("(n) in {1, 2}"), true);

    let t = scheme.get_field("t").unwrap();
    let f = scheme.get_field("f").unwrap();
    let n = scheme.get_field("n").unwrap();
    let expr = parse("t and (n == 1)");
    assert!(expr.expression().uses(t));
    assert!(expr.expression().uses(n));
    assert!(!expr.expression().uses(f));
}
