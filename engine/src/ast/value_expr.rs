use super::{
    parse::Parser,
    range::{parse_range_list, DRange, LayerSpec},
};
use crate::{
    execution_context::ExecutionContext,
    lex::{LexError, LexErrorKind},
    location::Span,
    op::{ArithOp, Punct},
    rhs_types::{resolve_token, resolve_unparsed, Literal},
    scanner::TokenKind,
    scheme::Field,
    types::{GetType, LhsValue, Type},
};
use serde::Serialize;
use std::borrow::Cow;

/// A field, optionally restricted to some protocol layers.
#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize)]
pub struct FieldExpr<'s> {
    /// The resolved field.
    pub field: Field<'s>,
    /// Layer selector from a `#` suffix.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer: Option<LayerSpec>,
    #[serde(skip)]
    pub span: Span,
}

impl<'s> FieldExpr<'s> {
    fn select<'a>(&self, values: &'a [(u32, LhsValue<'_>)]) -> Vec<LhsValue<'a>> {
        values
            .iter()
            .filter(|(layer, _)| self.layer.as_ref().map_or(true, |spec| spec.contains(*layer)))
            .map(|(_, value)| value.as_ref())
            .collect()
    }
}

/// A constant, along with the text it was written as.
#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize)]
#[serde(transparent)]
pub struct LiteralExpr {
    /// The resolved value.
    pub value: Literal,
    /// The lexeme as written.
    #[serde(skip)]
    pub raw: String,
    #[serde(skip)]
    pub span: Span,
}

/// Anything that yields values: fields, constants and arithmetic on them.
#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize)]
#[serde(untagged)]
pub enum ValueExpr<'s> {
    /// `tcp.port`, `.tcp.port`, `ip.src#2`
    Field(FieldExpr<'s>),
    /// `$ip.src`, `${ip.src}`
    Reference {
        /// The referenced field.
        reference: FieldExpr<'s>,
    },
    /// A constant.
    Literal(LiteralExpr),
    /// `lhs op rhs`
    Arithmetic {
        /// Operator.
        op: ArithOp,
        /// Left operand.
        lhs: Box<ValueExpr<'s>>,
        /// Right operand.
        rhs: Box<ValueExpr<'s>>,
    },
    /// `-arg`
    Negate {
        /// Negated operand.
        negate: Box<ValueExpr<'s>>,
        #[serde(skip)]
        span: Span,
    },
    /// `(expr)`
    Parenthesized {
        /// Inner expression.
        expr: Box<ValueExpr<'s>>,
        #[serde(skip)]
        span: Span,
    },
    /// `operand[ranges]`
    Slice {
        /// Sliced operand.
        operand: Box<ValueExpr<'s>>,
        /// Selected byte ranges, concatenated in order.
        ranges: Vec<DRange>,
        #[serde(skip)]
        span: Span,
    },
}

impl<'s> ValueExpr<'s> {
    /// Region of the filter this expression was parsed from.
    pub fn span(&self) -> Span {
        match self {
            ValueExpr::Field(field) | ValueExpr::Reference { reference: field } => field.span,
            ValueExpr::Literal(literal) => literal.span,
            ValueExpr::Arithmetic { lhs, rhs, .. } => lhs.span().to(rhs.span()),
            ValueExpr::Negate { span, .. }
            | ValueExpr::Parenthesized { span, .. }
            | ValueExpr::Slice { span, .. } => *span,
        }
    }

    /// Type that unparsed words on the other side of a comparison should
    /// preferably resolve to.
    pub(crate) fn type_hint(&self) -> Option<Type> {
        match self {
            ValueExpr::Field(field) | ValueExpr::Reference { reference: field } => {
                Some(field.field.get_type())
            }
            ValueExpr::Literal(literal) => Some(literal.value.get_type()),
            ValueExpr::Arithmetic { lhs, .. } => lhs.type_hint(),
            ValueExpr::Negate { negate: arg, .. } | ValueExpr::Parenthesized { expr: arg, .. } => {
                arg.type_hint()
            }
            ValueExpr::Slice { .. } => Some(Type::Bytes),
        }
    }

    /// Whether this is a field or a reference on its own, which a bare test
    /// checks for presence.
    pub(crate) fn is_field(&self) -> bool {
        matches!(self, ValueExpr::Field(_) | ValueExpr::Reference { .. })
    }

    pub(crate) fn uses(&self, field: Field<'s>) -> bool {
        match self {
            ValueExpr::Field(expr) | ValueExpr::Reference { reference: expr } => {
                expr.field == field
            }
            ValueExpr::Literal(_) => false,
            ValueExpr::Arithmetic { lhs, rhs, .. } => lhs.uses(field) || rhs.uses(field),
            ValueExpr::Negate { negate: arg, .. }
            | ValueExpr::Parenthesized { expr: arg, .. }
            | ValueExpr::Slice { operand: arg, .. } => arg.uses(field),
        }
    }

    /// Parses a value expression, resolving unparsed words towards `hint`.
    pub(crate) fn parse<'i>(
        parser: &mut Parser<'_, 's, 'i, '_>,
        hint: Option<Type>,
    ) -> Result<Self, LexError<'i>> {
        Self::parse_additive(parser, None, hint)
    }

    /// Continues parsing after an already parsed primary expression.
    pub(crate) fn parse_after<'i>(
        parser: &mut Parser<'_, 's, 'i, '_>,
        first: Self,
    ) -> Result<Self, LexError<'i>> {
        Self::parse_additive(parser, Some(first), None)
    }

    fn next_arith_op<'i>(
        parser: &mut Parser<'_, 's, 'i, '_>,
        multiplicative: bool,
    ) -> Result<Option<ArithOp>, LexError<'i>> {
        let token = parser.tokens.next_if(|kind| match kind {
            TokenKind::Arith(op) => op.is_multiplicative() == multiplicative,
            _ => false,
        })?;
        Ok(match token.map(|token| token.kind) {
            Some(TokenKind::Arith(op)) => Some(op),
            _ => None,
        })
    }

    fn parse_additive<'i>(
        parser: &mut Parser<'_, 's, 'i, '_>,
        first: Option<Self>,
        hint: Option<Type>,
    ) -> Result<Self, LexError<'i>> {
        let mut lhs = Self::parse_multiplicative(parser, first, hint)?;
        while let Some(op) = Self::next_arith_op(parser, false)? {
            let rhs = Self::parse_multiplicative(parser, None, hint)?;
            lhs = ValueExpr::Arithmetic {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_multiplicative<'i>(
        parser: &mut Parser<'_, 's, 'i, '_>,
        first: Option<Self>,
        hint: Option<Type>,
    ) -> Result<Self, LexError<'i>> {
        let mut lhs = Self::parse_unary(parser, first, hint)?;
        while let Some(op) = Self::next_arith_op(parser, true)? {
            let rhs = Self::parse_unary(parser, None, hint)?;
            lhs = ValueExpr::Arithmetic {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_unary<'i>(
        parser: &mut Parser<'_, 's, 'i, '_>,
        first: Option<Self>,
        hint: Option<Type>,
    ) -> Result<Self, LexError<'i>> {
        if first.is_none() {
            let minus = parser
                .tokens
                .next_if(|kind| *kind == TokenKind::Arith(ArithOp::Sub))?;
            if let Some(minus) = minus {
                let arg = Self::parse_unary(parser, None, hint)?;
                return Ok(ValueExpr::Negate {
                    span: minus.span.to(arg.span()),
                    negate: Box::new(arg),
                });
            }
        }
        Self::parse_postfix(parser, first, hint)
    }

    fn parse_postfix<'i>(
        parser: &mut Parser<'_, 's, 'i, '_>,
        first: Option<Self>,
        hint: Option<Type>,
    ) -> Result<Self, LexError<'i>> {
        let mut expr = match first {
            Some(expr) => expr,
            None => Self::parse_primary(parser, hint)?,
        };

        loop {
            match parser.peek_kind()? {
                Some(TokenKind::Hash) => {
                    let hash = parser.tokens.expect_token()?;
                    expr = match expr {
                        ValueExpr::Field(field) if field.layer.is_none() => {
                            let layer = Self::parse_layer(parser)?;
                            ValueExpr::Field(FieldExpr {
                                layer: Some(layer),
                                span: field.span.to(parser.tokens.last_span()),
                                field: field.field,
                            })
                        }
                        ValueExpr::Reference { reference } if reference.layer.is_none() => {
                            let layer = Self::parse_layer(parser)?;
                            ValueExpr::Reference {
                                reference: FieldExpr {
                                    layer: Some(layer),
                                    span: reference.span.to(parser.tokens.last_span()),
                                    field: reference.field,
                                },
                            }
                        }
                        _ => return Err((LexErrorKind::LayerOnNonField, parser.text(hash.span))),
                    };
                }
                Some(TokenKind::LBracket) => {
                    parser.tokens.expect_token()?;
                    let ranges = parse_range_list(parser)?;
                    expr = ValueExpr::Slice {
                        span: expr.span().to(parser.tokens.last_span()),
                        operand: Box::new(expr),
                        ranges: ranges.into_iter().map(|(range, _)| range).collect(),
                    };
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_layer<'i>(parser: &mut Parser<'_, 's, 'i, '_>) -> Result<LayerSpec, LexError<'i>> {
        let token = parser.tokens.expect_token()?;
        match token.kind {
            TokenKind::LayerIndex => LayerSpec::parse_index(token.lexeme),
            TokenKind::LBracket => LayerSpec::from_ranges(parse_range_list(parser)?),
            _ => Err(parser.unexpected(&token)),
        }
    }

    fn parse_primary<'i>(
        parser: &mut Parser<'_, 's, 'i, '_>,
        hint: Option<Type>,
    ) -> Result<Self, LexError<'i>> {
        let token = parser.tokens.expect_token()?;
        match token.kind {
            TokenKind::Punct(Punct::LParen) => {
                let expr = Self::parse(parser, hint)?;
                parser.expect_punct(Punct::RParen, ")")?;
                Ok(ValueExpr::Parenthesized {
                    expr: Box::new(expr),
                    span: parser.span_from(token.span.start),
                })
            }
            TokenKind::Punct(Punct::Dollar) => {
                let braced = parser.tokens.eat_punct(Punct::LBrace)?.is_some();
                let name = parser.tokens.expect_token()?;
                if !matches!(name.kind, TokenKind::Field | TokenKind::Unparsed) {
                    return Err(parser.unexpected(&name));
                }
                let field = parser.field(&name)?;
                if braced {
                    parser.expect_punct(Punct::RBrace, "}")?;
                }
                Ok(ValueExpr::Reference {
                    reference: FieldExpr {
                        field,
                        layer: None,
                        span: parser.span_from(token.span.start),
                    },
                })
            }
            TokenKind::Field => Ok(ValueExpr::Field(FieldExpr {
                field: parser.field(&token)?,
                layer: None,
                span: token.span,
            })),
            TokenKind::Unparsed => {
                let field = parser.field(&token);
                let field_required = parser.peek_kind()? == Some(TokenKind::Hash);
                let field = match field {
                    Ok(field) => field,
                    Err(err) if field_required => return Err(err),
                    Err(err) => {
                        return resolve_unparsed(token.lexeme, hint)
                            .map(|value| {
                                ValueExpr::Literal(LiteralExpr {
                                    value,
                                    raw: token.lexeme.to_owned(),
                                    span: token.span,
                                })
                            })
                            .map_err(|_| err)
                    }
                };
                Ok(ValueExpr::Field(FieldExpr {
                    field,
                    layer: None,
                    span: token.span,
                }))
            }
            _ => match resolve_token(&token, hint) {
                Some(value) => Ok(ValueExpr::Literal(LiteralExpr {
                    value: value?,
                    raw: token.lexeme.to_owned(),
                    span: token.span,
                })),
                None => Err(parser.unexpected(&token)),
            },
        }
    }

    /// Values this expression yields in `ctx`. A field yields one value per
    /// selected occurrence; a missing field yields none.
    pub(crate) fn evaluate<'a>(&'a self, ctx: &'a ExecutionContext<'_>) -> Vec<LhsValue<'a>> {
        match self {
            ValueExpr::Field(field) => field.select(ctx.field_values(field.field)),
            ValueExpr::Reference { reference } => {
                reference.select(ctx.reference_values(reference.field))
            }
            ValueExpr::Literal(literal) => vec![literal.value.to_value()],
            ValueExpr::Parenthesized { expr, .. } => expr.evaluate(ctx),
            ValueExpr::Negate { negate, .. } => negate
                .evaluate(ctx)
                .into_iter()
                .filter_map(|value| match value {
                    LhsValue::Int(i) => i.checked_neg().map(LhsValue::Int),
                    LhsValue::Float(x) => Some(LhsValue::Float(-x)),
                    _ => None,
                })
                .collect(),
            ValueExpr::Arithmetic { op, lhs, rhs } => {
                let rhs = rhs.evaluate(ctx);
                lhs.evaluate(ctx)
                    .iter()
                    .flat_map(|lhs| rhs.iter().filter_map(move |rhs| arith(*op, lhs, rhs)))
                    .collect()
            }
            ValueExpr::Slice { operand, ranges, .. } => operand
                .evaluate(ctx)
                .iter()
                .filter_map(|value| {
                    let bytes = value.as_bytes()?;
                    let mut sliced = Vec::new();
                    for range in ranges {
                        sliced.extend_from_slice(&bytes[range.apply(bytes.len())?]);
                    }
                    Some(LhsValue::Bytes(Cow::Owned(sliced)))
                })
                .collect(),
        }
    }
}

fn as_float(value: &LhsValue<'_>) -> Option<f64> {
    match value {
        LhsValue::Int(i) => Some(*i as f64),
        LhsValue::Float(x) => Some(*x),
        _ => None,
    }
}

fn arith<'a>(op: ArithOp, lhs: &LhsValue<'_>, rhs: &LhsValue<'_>) -> Option<LhsValue<'a>> {
    if let (LhsValue::Int(lhs), LhsValue::Int(rhs)) = (lhs, rhs) {
        let (lhs, rhs) = (*lhs, *rhs);
        return match op {
            ArithOp::Add => lhs.checked_add(rhs),
            ArithOp::Sub => lhs.checked_sub(rhs),
            ArithOp::Mul => lhs.checked_mul(rhs),
            ArithOp::Div => lhs.checked_div(rhs),
            ArithOp::Mod => lhs.checked_rem(rhs),
            ArithOp::BitwiseAnd => Some(lhs & rhs),
        }
        .map(LhsValue::Int);
    }

    let (lhs, rhs) = (as_float(lhs)?, as_float(rhs)?);
    let res = match op {
        ArithOp::Add => lhs + rhs,
        ArithOp::Sub => lhs - rhs,
        ArithOp::Mul => lhs * rhs,
        ArithOp::Div if rhs != 0.0 => lhs / rhs,
        ArithOp::Mod if rhs != 0.0 => lhs % rhs,
        ArithOp::Div | ArithOp::Mod | ArithOp::BitwiseAnd => return None,
    };
    Some(LhsValue::Float(res))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ast::parse::ParserSettings, scanner::TokenStream, scheme::Scheme};
    use lazy_static::lazy_static;

    lazy_static! {
        static ref SCHEME: Scheme = Scheme! {
            tcp.port: Int,
            tcp.payload: Bytes,
            ip.src: Ip,
            frame.len: Int,
        };
    }

    fn parse(input: &str) -> Result<ValueExpr<'static>, LexError<'_>> {
        let settings = ParserSettings::default();
        let mut warnings = Vec::new();
        let mut parser = Parser {
            settings: &settings,
            scheme: &SCHEME,
            tokens: TokenStream::new(input, &mut warnings),
        };
        let expr = ValueExpr::parse(&mut parser, None)?;
        match parser.tokens.next()? {
            None => Ok(expr),
            Some(token) => Err(parser.unexpected(&token)),
        }
    }

    fn field(name: &str) -> Field<'static> {
        SCHEME.get_field(name).unwrap()
    }

    #[test]
    fn test_precedence() {
        let expr = parse("tcp.port + 2 * 3").unwrap();
        assert_json!(
            expr,
            {
                "op": "Add",
                "lhs": { "field": "tcp.port" },
                "rhs": { "op": "Mul", "lhs": 2, "rhs": 3 }
            }
        );
        assert_eq!(expr.span(), Span::new(0, 16));

        assert_json!(
            parse("-(1 - 2)").unwrap(),
            { "negate": { "expr": { "op": "Sub", "lhs": 1, "rhs": 2 } } }
        );
    }

    #[test]
    fn test_postfix() {
        let expr = parse("tcp.payload[0:2, -1]").unwrap();
        assert_json!(expr, { "operand": { "field": "tcp.payload" }, "ranges": ["0:2", "-1"] });
        assert_eq!(expr.span(), Span::new(0, 20));
        assert_eq!(expr.type_hint(), Some(Type::Bytes));

        let expr = parse("ip.src#2").unwrap();
        assert_eq!(
            expr,
            ValueExpr::Field(FieldExpr {
                field: field("ip.src"),
                layer: Some(LayerSpec::Index(2)),
                span: Span::new(0, 8),
            })
        );
        assert_json!(parse("ip.src#[1-2]").unwrap(), { "field": "ip.src", "layer": [{ "start": 1, "end": 2 }] });

        assert_err!(parse("ip.src#0"), LexErrorKind::InvalidLayerIndex, "0");
        assert_err!(parse("\"abc\"#1"), LexErrorKind::LayerOnNonField, "#");
        assert_err!(
            parse("tcp.payload[1:0]"),
            LexErrorKind::InvalidRange("1:0".into()),
            "1:0"
        );
    }

    #[test]
    fn test_references() {
        let expr = parse("${ip.src}").unwrap();
        assert_json!(expr, { "reference": { "field": "ip.src" } });
        assert_eq!(expr.span(), Span::new(0, 9));
        assert!(parse("$tcp.port").unwrap().uses(field("tcp.port")));
        assert_err!(
            parse("$bogus"),
            LexErrorKind::UnknownField(crate::scheme::UnknownFieldError {
                name: "bogus".into()
            }),
            "bogus"
        );
    }

    #[test]
    fn test_unparsed_words() {
        assert_eq!(
            parse("tcp.port").unwrap(),
            ValueExpr::Field(FieldExpr {
                field: field("tcp.port"),
                layer: None,
                span: Span::new(0, 8),
            })
        );
        let expr = parse("0x10").unwrap();
        assert_json!(expr, 16);
        match expr {
            ValueExpr::Literal(literal) => assert_eq!(literal.raw, "0x10"),
            expr => panic!("expected a literal, got {:?}", expr),
        }
        assert_err!(
            parse("bogus.field"),
            LexErrorKind::UnknownField(crate::scheme::UnknownFieldError {
                name: "bogus.field".into()
            }),
            "bogus.field"
        );
        assert_err!(
            parse("1 +"),
            LexErrorKind::UnexpectedEof,
            ""
        );
    }

    #[test]
    fn test_evaluate() {
        let mut ctx = ExecutionContext::new(&SCHEME);
        ctx.add_field_value("tcp.port", 80).unwrap();
        ctx.add_field_value_at_layer("tcp.port", 2, 443).unwrap();
        ctx.add_field_value("tcp.payload", &b"\x01\x02\x03\x04"[..]).unwrap();
        ctx.set_reference_value("tcp.port", 22).unwrap();

        let eval = |input: &str| {
            let expr = parse(input).unwrap();
            let values = expr
                .evaluate(&ctx)
                .into_iter()
                .map(LhsValue::into_owned)
                .collect::<Vec<_>>();
            values
        };

        assert_eq!(eval("tcp.port"), vec![LhsValue::Int(80), LhsValue::Int(443)]);
        assert_eq!(eval("tcp.port#2"), vec![LhsValue::Int(443)]);
        assert_eq!(eval("$tcp.port"), vec![LhsValue::Int(22)]);
        assert_eq!(eval("frame.len"), vec![]);
        assert_eq!(eval("tcp.port + 1"), vec![LhsValue::Int(81), LhsValue::Int(444)]);
        assert_eq!(eval("tcp.port & 0xff"), vec![LhsValue::Int(80), LhsValue::Int(187)]);
        assert_eq!(eval("7 / 2"), vec![LhsValue::Int(3)]);
        assert_eq!(eval("7 / 0"), vec![]);
        assert_eq!(eval("1 + 0.5"), vec![LhsValue::Float(1.5)]);
        assert_eq!(eval("-tcp.port#1"), vec![LhsValue::Int(-80)]);
        assert_eq!(
            eval("tcp.payload[1-2, 0]"),
            vec![LhsValue::from(vec![0x02, 0x03, 0x01])]
        );
        assert_eq!(eval("tcp.payload[-2:]"), vec![LhsValue::from(vec![0x03, 0x04])]);
        assert_eq!(eval("tcp.payload[2:5]"), vec![]);
    }
}
