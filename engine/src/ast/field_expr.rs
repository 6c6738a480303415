use super::{
    parse::Parser,
    value_expr::{LiteralExpr, ValueExpr},
    Expr,
};
use crate::{
    execution_context::ExecutionContext,
    lex::{LexError, LexErrorKind},
    location::Span,
    op::{Punct, Quantifier, TestOp, UnaryOp},
    rhs_types::{IpLiteral, Literal, Regex},
    scanner::TokenKind,
    scheme::Field,
    strict_partial_ord::StrictPartialOrd,
    types::{LhsValue, Type},
};
use memmem::{Searcher, TwoWaySearcher};
use serde::{Serialize, Serializer};
use std::{borrow::Cow, cmp::Ordering};

/// An element of an `in { ... }` set.
#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize)]
#[serde(untagged)]
pub enum SetElement<'s> {
    /// A single value.
    Value(ValueExpr<'s>),
    /// `start..end`, both ends included.
    Range {
        /// Lower bound.
        start: ValueExpr<'s>,
        /// Upper bound.
        end: ValueExpr<'s>,
    },
}

impl<'s> SetElement<'s> {
    fn uses(&self, field: Field<'s>) -> bool {
        match self {
            SetElement::Value(value) => value.uses(field),
            SetElement::Range { start, end } => start.uses(field) || end.uses(field),
        }
    }
}

/// The test applied to the left-hand side of a [`ComparisonExpr`].
#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize)]
#[serde(untagged)]
pub enum ComparisonOpExpr<'s> {
    /// A bare value: true when a field is present, or when a computed value
    /// is non-zero.
    #[serde(serialize_with = "serialize_is_true")]
    IsTrue,

    /// Equality and ordering tests.
    Test {
        /// Operator, one of the equality or ordering tests.
        op: TestOp,
        /// Right-hand side.
        rhs: ValueExpr<'s>,
    },

    /// `contains`
    #[serde(serialize_with = "serialize_contains")]
    Contains(ValueExpr<'s>),

    /// `matches` / `~`
    #[serde(serialize_with = "serialize_matches")]
    Matches(Regex),

    /// `in` / `not in`
    #[serde(serialize_with = "serialize_one_of")]
    OneOf {
        /// Whether this is `not in`.
        negated: bool,
        /// Set elements.
        set: Vec<SetElement<'s>>,
    },
}

fn serialize_op_rhs<T: Serialize, S: Serializer>(
    op: &'static str,
    rhs: &T,
    ser: S,
) -> Result<S::Ok, S::Error> {
    use serde::ser::SerializeStruct;

    let mut out = ser.serialize_struct("ComparisonOpExpr", 2)?;
    out.serialize_field("op", op)?;
    out.serialize_field("rhs", rhs)?;
    out.end()
}

fn serialize_is_true<S: Serializer>(ser: S) -> Result<S::Ok, S::Error> {
    use serde::ser::SerializeStruct;

    let mut out = ser.serialize_struct("ComparisonOpExpr", 1)?;
    out.serialize_field("op", "IsTrue")?;
    out.end()
}

fn serialize_contains<S: Serializer>(rhs: &ValueExpr<'_>, ser: S) -> Result<S::Ok, S::Error> {
    serialize_op_rhs("Contains", rhs, ser)
}

fn serialize_matches<S: Serializer>(rhs: &Regex, ser: S) -> Result<S::Ok, S::Error> {
    serialize_op_rhs("Matches", rhs, ser)
}

fn serialize_one_of<S: Serializer>(
    negated: &bool,
    set: &[SetElement<'_>],
    ser: S,
) -> Result<S::Ok, S::Error> {
    serialize_op_rhs(if *negated { "NotIn" } else { "In" }, &set, ser)
}

/// A test of a value expression, such as `tcp.port == 80` or a bare `tcp`.
#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize)]
pub struct ComparisonExpr<'s> {
    /// Tested expression.
    pub lhs: ValueExpr<'s>,

    /// Test applied to it.
    #[serde(flatten)]
    pub op: ComparisonOpExpr<'s>,

    #[serde(skip)]
    pub span: Span,
}

/// Right-hand side operand of an equality or membership test.
enum Operand<'a> {
    Value(LhsValue<'a>),
    /// An IP literal with a prefix length compares equal to every address
    /// of its network.
    Network(&'a IpLiteral),
}

impl Operand<'_> {
    fn compare(&self, lhs: &LhsValue<'_>) -> Option<Ordering> {
        match (self, lhs) {
            (Operand::Value(rhs), lhs) => lhs.strict_partial_cmp(rhs),
            (Operand::Network(network), LhsValue::Ip(addr)) if network.matches(addr) => {
                Some(Ordering::Equal)
            }
            (Operand::Network(network), LhsValue::Ip(addr)) => {
                addr.strict_partial_cmp(&network.addr())
            }
            (Operand::Network(_), _) => None,
        }
    }
}

fn operands<'a>(expr: &'a ValueExpr<'_>, ctx: &'a ExecutionContext<'_>) -> Vec<Operand<'a>> {
    match expr {
        ValueExpr::Literal(LiteralExpr {
            value: Literal::Ip(ip),
            ..
        }) if ip.prefix().is_some() => vec![Operand::Network(ip)],
        expr => expr.evaluate(ctx).into_iter().map(Operand::Value).collect(),
    }
}

/// Bytes searched for by `contains`: an integer in `0..=255` stands for a
/// single byte.
fn needle<'a>(value: &'a LhsValue<'_>) -> Option<Cow<'a, [u8]>> {
    match value {
        LhsValue::Int(i) => u8::try_from(*i).ok().map(|b| Cow::Owned(vec![b])),
        value => value.as_bytes(),
    }
}

impl<'s> ComparisonExpr<'s> {
    /// Parses a comparison. `first` is an already parsed primary expression
    /// the left-hand side starts with.
    pub(crate) fn parse<'i>(
        parser: &mut Parser<'_, 's, 'i, '_>,
        first: Option<ValueExpr<'s>>,
    ) -> Result<Self, LexError<'i>> {
        let start = match &first {
            Some(first) => first.span().start,
            None => parser.peek_start()?,
        };
        let lhs = match first {
            Some(first) => ValueExpr::parse_after(parser, first)?,
            None => ValueExpr::parse(parser, None)?,
        };
        let hint = lhs.type_hint();

        let op = match parser.peek_kind()? {
            Some(TokenKind::Test(op)) => {
                parser.tokens.expect_token()?;
                Self::parse_op(parser, op, hint)?
            }
            Some(TokenKind::Unary(UnaryOp::Not)) => {
                let not = parser.tokens.expect_token()?;
                match parser.tokens.next_if(|kind| *kind == TokenKind::Test(TestOp::In))? {
                    Some(_) => ComparisonOpExpr::OneOf {
                        negated: true,
                        set: Self::parse_set(parser, hint)?,
                    },
                    None => return Err(parser.unexpected(&not)),
                }
            }
            _ => ComparisonOpExpr::IsTrue,
        };

        if let Some(TokenKind::Test(_)) = parser.peek_kind()? {
            let token = parser.tokens.expect_token()?;
            return Err((LexErrorKind::ChainedComparison, parser.text(token.span)));
        }

        Ok(ComparisonExpr {
            lhs,
            op,
            span: parser.span_from(start),
        })
    }

    fn parse_op<'i>(
        parser: &mut Parser<'_, 's, 'i, '_>,
        op: TestOp,
        hint: Option<Type>,
    ) -> Result<ComparisonOpExpr<'s>, LexError<'i>> {
        Ok(match op {
            TestOp::Contains => ComparisonOpExpr::Contains(ValueExpr::parse(parser, hint)?),
            TestOp::Matches => {
                let token = parser.tokens.expect_token()?;
                match &token.kind {
                    TokenKind::String { value, .. } => {
                        let regex = Regex::new(value, parser.settings).map_err(|err| {
                            (LexErrorKind::ParseRegex(err), parser.text(token.span))
                        })?;
                        ComparisonOpExpr::Matches(regex)
                    }
                    _ => {
                        return Err((
                            LexErrorKind::ExpectedLiteral("string"),
                            parser.text(token.span),
                        ))
                    }
                }
            }
            TestOp::In => ComparisonOpExpr::OneOf {
                negated: false,
                set: Self::parse_set(parser, hint)?,
            },
            op => ComparisonOpExpr::Test {
                op,
                rhs: ValueExpr::parse(parser, hint)?,
            },
        })
    }

    fn parse_set<'i>(
        parser: &mut Parser<'_, 's, 'i, '_>,
        hint: Option<Type>,
    ) -> Result<Vec<SetElement<'s>>, LexError<'i>> {
        let open = parser.expect_punct(Punct::LBrace, "{")?;
        let mut set = Vec::new();
        let mut warned = false;

        loop {
            if let Some(close) = parser.tokens.eat_punct(Punct::RBrace)? {
                if set.is_empty() {
                    return Err((LexErrorKind::EmptySet, parser.text(open.span.to(close.span))));
                }
                return Ok(set);
            }

            let separated = set.is_empty() || parser.tokens.eat_punct(Punct::Comma)?.is_some();

            let start = ValueExpr::parse(parser, hint)?;
            if !separated && !warned {
                parser.warn("set elements should be separated by commas", start.span());
                warned = true;
            }

            set.push(match parser.tokens.eat_punct(Punct::DotDot)? {
                Some(_) => SetElement::Range {
                    start,
                    end: ValueExpr::parse(parser, hint)?,
                },
                None => SetElement::Value(start),
            });
        }
    }

}

impl<'s> Expr<'s> for ComparisonExpr<'s> {
    fn uses(&self, field: Field<'s>) -> bool {
        self.lhs.uses(field)
            || match &self.op {
                ComparisonOpExpr::IsTrue | ComparisonOpExpr::Matches(_) => false,
                ComparisonOpExpr::Test { rhs, .. } | ComparisonOpExpr::Contains(rhs) => {
                    rhs.uses(field)
                }
                ComparisonOpExpr::OneOf { set, .. } => set.iter().any(|elem| elem.uses(field)),
            }
    }

    fn execute(&self, ctx: &ExecutionContext<'_>) -> bool {
        let lhs = self.lhs.evaluate(ctx);

        match &self.op {
            ComparisonOpExpr::IsTrue if self.lhs.is_field() => !lhs.is_empty(),
            ComparisonOpExpr::IsTrue => lhs.iter().any(LhsValue::is_truthy),
            ComparisonOpExpr::Test { op, rhs } => {
                let (quantifier, ordering) = match op.ordering() {
                    Some(ordering) => ordering,
                    None => return false,
                };
                let rhs = operands(rhs, ctx);
                let test = |lhs: &LhsValue<'_>, rhs: &Operand<'_>| {
                    ordering.matches_opt(rhs.compare(lhs))
                };
                match quantifier {
                    Quantifier::Any => lhs.iter().any(|l| rhs.iter().any(|r| test(l, r))),
                    Quantifier::All => {
                        !lhs.is_empty()
                            && !rhs.is_empty()
                            && lhs.iter().all(|l| rhs.iter().all(|r| test(l, r)))
                    }
                }
            }
            ComparisonOpExpr::Contains(rhs) => {
                let rhs = rhs.evaluate(ctx);
                let needles = rhs.iter().filter_map(needle).collect::<Vec<_>>();
                lhs.iter().filter_map(LhsValue::as_bytes).any(|haystack| {
                    needles.iter().any(|needle| {
                        needle.is_empty()
                            || TwoWaySearcher::new(needle).search_in(&haystack).is_some()
                    })
                })
            }
            ComparisonOpExpr::Matches(regex) => lhs
                .iter()
                .filter_map(LhsValue::as_bytes)
                .any(|bytes| regex.is_match(&bytes)),
            ComparisonOpExpr::OneOf { negated, set } => {
                let set = set
                    .iter()
                    .map(|elem| match elem {
                        SetElement::Value(value) => (operands(value, ctx), Vec::new()),
                        SetElement::Range { start, end } => {
                            (operands(start, ctx), operands(end, ctx))
                        }
                    })
                    .collect::<Vec<_>>();

                let contains = |value: &LhsValue<'_>| {
                    set.iter().any(|(start, end)| {
                        if end.is_empty() {
                            start
                                .iter()
                                .any(|start| start.compare(value) == Some(Ordering::Equal))
                        } else {
                            start.iter().any(|start| {
                                matches!(start.compare(value), Some(Ordering::Equal | Ordering::Greater))
                            }) && end.iter().any(|end| {
                                matches!(end.compare(value), Some(Ordering::Equal | Ordering::Less))
                            })
                        }
                    })
                };

                if *negated {
                    !lhs.is_empty() && lhs.iter().all(|value| !contains(value))
                } else {
                    lhs.iter().any(contains)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ast::parse::ParserSettings, diagnostics::Warning, scanner::TokenStream, scheme::Scheme,
    };
    use lazy_static::lazy_static;
    use std::net::IpAddr;

    lazy_static! {
        static ref SCHEME: Scheme = Scheme! {
            tcp: Protocol,
            tcp.port: Int,
            tcp.payload: Bytes,
            ip.src: Ip,
            eth.src: Ether,
            http.host: Bytes,
            frame.len: Int,
        };
    }

    fn parse_with_warnings<'i>(
        input: &'i str,
        warnings: &mut Vec<Warning>,
    ) -> Result<ComparisonExpr<'static>, LexError<'i>> {
        let settings = ParserSettings::default();
        let mut parser = Parser {
            settings: &settings,
            scheme: &SCHEME,
            tokens: TokenStream::new(input, warnings),
        };
        let expr = ComparisonExpr::parse(&mut parser, None)?;
        match parser.tokens.next()? {
            None => Ok(expr),
            Some(token) => Err(parser.unexpected(&token)),
        }
    }

    fn parse(input: &str) -> Result<ComparisonExpr<'static>, LexError<'_>> {
        parse_with_warnings(input, &mut Vec::new())
    }

    fn context() -> ExecutionContext<'static> {
        let mut ctx = ExecutionContext::new(&SCHEME);
        ctx.add_field_value("tcp", &b"\x00\x50\x01\xbb"[..]).unwrap();
        ctx.add_field_value("tcp.port", 80).unwrap();
        ctx.add_field_value("tcp.port", 443).unwrap();
        ctx.add_field_value("tcp.payload", "GET / HTTP/1.1").unwrap();
        ctx.add_field_value("ip.src", IpAddr::from([192, 168, 0, 1]))
            .unwrap();
        ctx.add_field_value_at_layer("ip.src", 2, IpAddr::from([10, 0, 0, 1]))
            .unwrap();
        ctx.add_field_value("eth.src", [0, 0x11, 0x22, 0x33, 0x44, 0x55])
            .unwrap();
        ctx.add_field_value("http.host", "example.org").unwrap();
        ctx
    }

    fn execute(input: &str) -> bool {
        parse(input).unwrap().execute(&context())
    }

    #[test]
    fn test_serialize() {
        assert_json!(parse("tcp").unwrap(), { "lhs": { "field": "tcp" }, "op": "IsTrue" });
        assert_json!(
            parse("tcp.port eq 80").unwrap(),
            { "lhs": { "field": "tcp.port" }, "op": "AnyEq", "rhs": 80 }
        );
        assert_json!(
            parse("http.host matches \"^example\"").unwrap(),
            { "lhs": { "field": "http.host" }, "op": "Matches", "rhs": "^example" }
        );
        assert_json!(
            parse("tcp.port not in {80, 1..5}").unwrap(),
            {
                "lhs": { "field": "tcp.port" },
                "op": "NotIn",
                "rhs": [80, { "start": 1, "end": 5 }]
            }
        );
    }

    #[test]
    fn test_operator_synonyms() {
        for (a, b) in [
            ("tcp.port == 80", "tcp.port eq 80"),
            ("tcp.port == 80", "tcp.port any_eq 80"),
            ("tcp.port != 80", "tcp.port ne 80"),
            ("tcp.port != 80", "tcp.port all_ne 80"),
            ("tcp.port !== 80", "tcp.port any_ne 80"),
            ("tcp.port === 80", "tcp.port all_eq 80"),
            ("tcp.port > 80", "tcp.port gt 80"),
            ("tcp.port >= 80", "tcp.port ge 80"),
            ("tcp.port < 80", "tcp.port lt 80"),
            ("tcp.port <= 80", "tcp.port le 80"),
            ("tcp.port & 1", "tcp.port bitwise_and 1"),
        ] {
            // spans differ between spellings, so compare the trees
            assert_eq!(
                serde_json::to_value(parse(a).unwrap()).unwrap(),
                serde_json::to_value(parse(b).unwrap()).unwrap()
            );
        }
    }

    #[test]
    fn test_parse_errors() {
        assert_err!(
            parse("tcp.port == 1 == 2"),
            LexErrorKind::ChainedComparison,
            "=="
        );
        assert_err!(
            parse("http.host matches abc"),
            LexErrorKind::ExpectedLiteral("string"),
            "abc"
        );
        assert_err!(parse("tcp.port in {}"), LexErrorKind::EmptySet, "{}");
        assert_err!(
            parse("tcp.port in 80"),
            LexErrorKind::ExpectedLiteral("{"),
            "80"
        );
        assert_err!(
            parse("tcp.port not 80"),
            LexErrorKind::UnexpectedToken("not".into()),
            "not"
        );
        match parse("http.host matches \"(\"") {
            Err((LexErrorKind::ParseRegex(_), "\"(\"")) => {}
            res => panic!("expected a regex error, got {:?}", res),
        }
    }

    #[test]
    fn test_set_separators() {
        let mut warnings = Vec::new();
        let expr = parse_with_warnings("tcp.port in {80 443 8080}", &mut warnings).unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].span, Span::new(16, 3));
        assert_eq!(
            serde_json::to_value(expr).unwrap(),
            serde_json::to_value(parse("tcp.port in {80, 443, 8080}").unwrap()).unwrap()
        );
    }

    #[test]
    fn test_hints() {
        // a byte-typed field reads `10` as a single byte
        assert_json!(
            parse("tcp.payload[0] == 10").unwrap(),
            { "lhs": { "operand": { "field": "tcp.payload" }, "ranges": ["0"] }, "op": "AnyEq", "rhs": "10" }
        );
        assert_json!(parse("tcp.port == 10").unwrap(), { "lhs": { "field": "tcp.port" }, "op": "AnyEq", "rhs": 10 });
    }

    #[test]
    fn test_equality() {
        assert!(execute("tcp.port == 80"));
        assert!(execute("tcp.port == 443"));
        assert!(!execute("tcp.port === 80"));
        assert!(execute("tcp.port !== 80"));
        assert!(!execute("tcp.port != 80"));
        assert!(execute("tcp.port != 22"));
        assert!(execute("tcp.port > 400"));
        assert!(!execute("tcp.port > 443"));
        assert!(execute("tcp.port <= 80"));
        assert!(execute("eth.src == 00:11:22:33:44:55"));
        assert!(execute("eth.src == 0011.2233.4455"));
        assert!(execute("http.host == \"example.org\""));
        assert!(!execute("tcp.port == $tcp.port"));
    }

    #[test]
    fn test_missing_field() {
        assert!(!execute("frame.len == 1"));
        assert!(!execute("frame.len != 1"));
        assert!(!execute("frame.len === 1"));
        assert!(!execute("frame.len"));
        assert!(!execute("frame.len not in {1}"));
        assert!(execute("tcp"));
    }

    #[test]
    fn test_networks() {
        assert!(execute("ip.src == 192.168.0.1"));
        assert!(execute("ip.src == 192.168.0.0/16"));
        assert!(execute("ip.src == 10.1.2.3/8"));
        assert!(!execute("ip.src#1 == 10.0.0.0/8"));
        assert!(execute("ip.src#2 == 10.0.0.0/8"));
        assert!(execute("ip.src in {172.16.0.0/12 10.0.0.0/8}"));
        assert!(!execute("ip.src == ::1"));
    }

    #[test]
    fn test_contains_and_matches() {
        assert!(execute("tcp.payload contains \"HTTP\""));
        assert!(execute("tcp.payload contains 47:45:54"));
        assert!(!execute("tcp.payload contains \"POST\""));
        assert!(execute("tcp contains 0x50"));
        assert!(execute("tcp[0:2] == 00:50"));
        assert!(execute("http.host matches \"^exa.ple\\\\.org$\""));
        assert!(execute("http.host ~ r\"\\.org$\""));
        assert!(!execute("http.host matches \"^org\""));
    }

    #[test]
    fn test_membership() {
        assert!(execute("tcp.port in {22, 80}"));
        assert!(execute("tcp.port in {1..100}"));
        assert!(!execute("tcp.port in {1000..2000}"));
        assert!(!execute("tcp.port not in {80, 22}"));
        assert!(execute("tcp.port not in {1..10, 8080}"));
    }

    #[test]
    fn test_bare_values() {
        assert!(execute("tcp.port & 1"));
        assert!(!execute("tcp.port * 0"));
        assert!(execute("tcp.port - 80"));
    }

    #[test]
    fn test_uses() {
        let expr = parse("tcp.port in {frame.len, 1}").unwrap();
        assert!(expr.uses(SCHEME.get_field("tcp.port").unwrap()));
        assert!(expr.uses(SCHEME.get_field("frame.len").unwrap()));
        assert!(!expr.uses(SCHEME.get_field("ip.src").unwrap()));
    }
}
