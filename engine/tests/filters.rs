use dfilter::{ExecutionContext, FilterParser, LexErrorKind, Scheme, Warning};
use serde_json::json;
use std::net::IpAddr;

fn scheme() -> Scheme {
    dfilter::Scheme! {
        eth: Protocol,
        eth.addr: Ether,
        ip: Protocol,
        ip.src: Ip,
        ip.ttl: Int,
        tcp.port: Int,
        tcp.flags.syn: Bool,
        frame.time_delta: Float,
        http.host: Bytes,
        data: Bytes,
    }
}

fn context(scheme: &Scheme) -> ExecutionContext<'_> {
    let mut ctx = ExecutionContext::new(scheme);
    ctx.add_field_value("eth", &b"\x00\x11\x22\x33\x44\x55"[..])
        .unwrap();
    ctx.add_field_value("eth.addr", [0x00u8, 0x11, 0x22, 0x33, 0x44, 0x55])
        .unwrap();
    ctx.add_field_value("ip", &b"\x45\x00"[..]).unwrap();
    ctx.add_field_value_at_layer("ip.src", 1, IpAddr::from([10, 1, 2, 3]))
        .unwrap();
    ctx.add_field_value_at_layer("ip.src", 2, IpAddr::from([192, 168, 0, 1]))
        .unwrap();
    ctx.add_field_value("ip.ttl", 64).unwrap();
    ctx.add_field_value("tcp.port", 443).unwrap();
    ctx.add_field_value("tcp.port", 51000).unwrap();
    ctx.add_field_value("tcp.flags.syn", false).unwrap();
    ctx.add_field_value("frame.time_delta", 0.75).unwrap();
    ctx.add_field_value("http.host", "www.example.com").unwrap();
    ctx.add_field_value("data", &b"\xaa\xbb\xcc"[..]).unwrap();
    ctx
}

fn run(filter: &str) -> bool {
    let scheme = scheme();
    let ctx = context(&scheme);
    scheme
        .parse(filter)
        .unwrap_or_else(|err| panic!("{}", err))
        .execute(&ctx)
        .unwrap()
}

macro_rules! assert_parse_err {
    ($filter:expr, $kind:pat) => {{
        let scheme = crate::scheme();
        match scheme.parse($filter) {
            Err(err) => assert!(
                matches!(err.kind(), $kind),
                "unexpected error {:?} for {:?}",
                err.kind(),
                $filter
            ),
            Ok(ast) => panic!("{:?} unexpectedly parsed as {:?}", $filter, ast),
        }
    }};
}

#[test]
fn operator_synonyms() {
    let scheme = scheme();
    let json = |filter: &str| serde_json::to_value(scheme.parse(filter).unwrap()).unwrap();

    for filter in [
        "tcp.port == 443",
        "tcp.port eq 443",
        "tcp.port any_eq 443",
    ] {
        assert_eq!(
            json(filter),
            json!({ "lhs": { "field": "tcp.port" }, "op": "AnyEq", "rhs": 443 })
        );
    }

    assert_eq!(json("tcp.port != 80"), json("tcp.port ne 80"));
    assert_eq!(json("tcp.port !== 80"), json("tcp.port any_ne 80"));
    assert_eq!(json("ip.ttl ge 64 && ip.ttl le 64"), json("ip.ttl >= 64 and ip.ttl <= 64"));
    assert_eq!(json("http.host ~ \"example\""), json("http.host matches \"example\""));
    assert_eq!(json("!tcp.flags.syn"), json("not tcp.flags.syn"));
}

#[test]
fn comparisons() {
    assert!(run("tcp.port == 443"));
    assert!(run("tcp.port == 51000"));
    assert!(!run("tcp.port === 443"));
    assert!(run("tcp.port != 80"));
    assert!(!run("tcp.port != 443"));
    assert!(run("tcp.port !== 443"));
    assert!(run("tcp.port > 50000"));
    assert!(run("ip.ttl <= 64 and ip.ttl >= 64"));
    assert!(run("ip.ttl == 0x40"));
    assert!(run("ip.ttl == 0100"));
    assert!(run("frame.time_delta > 0.5"));
    assert!(run("frame.time_delta < 1"));
    assert!(run("http.host == \"www.example.com\""));
    assert!(run("http.host contains \"example\""));
    assert!(!run("http.host contains \"EXAMPLE\""));
    assert!(run("http.host matches \"^www\\\\.\""));
    assert!(run("not tcp.flags.syn"));
    assert!(run("tcp.flags.syn == false"));
}

#[test]
fn presence_and_logic() {
    assert!(run("tcp.port"));
    assert!(run("ip and eth"));
    assert!(run("tcp.flags.syn"));
    assert!(!run("tcp.flags.syn == 1"));
    assert!(run("tcp.port == 80 or http.host"));
    assert!(run("tcp.port == 80 xor ip.ttl == 64"));
    assert!(!run("(tcp.port == 443) ^^ (ip.ttl == 64)"));
}

#[test]
fn byte_separators() {
    for filter in [
        "eth.addr == 00:11:22:33:44:55",
        "eth.addr == 00-11-22-33-44-55",
        "eth.addr == 0011.2233.4455",
    ] {
        assert!(run(filter), "{}", filter);
    }

    assert!(run("data == aa:bb:cc"));
    assert!(run("data == aa-bb-cc"));
    assert!(run("data contains bb:cc"));
    assert!(run("data contains 0xbb"));
    assert!(!run("data contains 0xdd"));
}

#[test]
fn address_shaped_byte_strings() {
    let scheme = scheme();
    let mut ctx = ExecutionContext::new(&scheme);
    ctx.add_field_value("data", &b"\x01\x02\x03\x04\x05\x06\x07\x08"[..])
        .unwrap();
    let run = |filter: &str| {
        scheme
            .parse(filter)
            .unwrap_or_else(|err| panic!("{}", err))
            .execute(&ctx)
            .unwrap()
    };

    for sep in [":", "-", "."] {
        let pairs = |n: u8| {
            (1..=n)
                .map(|i| format!("{:02x}", i))
                .collect::<Vec<_>>()
                .join(sep)
        };
        let eight = format!("data == {}", pairs(8));
        let four = format!("data[0:4] == {}", pairs(4));
        assert!(run(&eight), "{}", eight);
        assert!(run(&four), "{}", four);
    }

    assert!(run("data contains 03.04.05.06"));
    assert!(run("data[0:4] in {01.02.03.04}"));
    assert!(!run("data == 01:02:03:04:05:06:07:09"));
}

#[test]
fn single_byte_against_integer() {
    assert!(run("ip.ttl == \"\\x40\""));
    assert!(!run("ip.ttl == ff"));
    assert!(run("ip.ttl < ff"));
    assert!(run("data[0] > 0x10"));
}

#[test]
fn addresses() {
    assert!(run("ip.src == 10.1.2.3"));
    assert!(run("ip.src == 10.0.0.0/8"));
    assert!(run("ip.src == 10.9.9.9/8"));
    assert!(!run("ip.src === 10.0.0.0/8"));
    assert!(run("ip.src in {172.16.0.0/12 192.168.0.0/16}"));
    assert!(run("ip.src#1 == 10.1.2.3"));
    assert!(!run("ip.src#1 == 192.168.0.1"));
    assert!(run("ip.src#2 == 192.168.0.1"));
    assert!(run("ip.src#[1-2] == 192.168.0.1"));
    assert!(!run("ip.src#3"));
    assert!(!run("ip.src == fe80::1"));

    assert_parse_err!("ip.src#0 == 10.0.0.1", LexErrorKind::InvalidLayerIndex);
}

#[test]
fn string_escapes() {
    let scheme = scheme();
    let mut ctx = ExecutionContext::new(&scheme);
    ctx.add_field_value("http.host", &b"\xff\"\xc3\xa9"[..])
        .unwrap();
    let run = |filter: &str| {
        scheme
            .parse(filter)
            .unwrap_or_else(|err| panic!("{}", err))
            .execute(&ctx)
            .unwrap()
    };

    assert!(run(r#"http.host == "\377\"\u00e9""#));
    assert!(run(r#"http.host == "\xff\x22\U000000e9""#));
    assert!(run(r#"http.host contains "\303""#));

    assert_parse_err!(r#"http.host == "\400""#, LexErrorKind::OctalEscapeOutOfRange);
    assert_parse_err!(
        r#"http.host == "\uD800""#,
        LexErrorKind::InvalidUniversalCharacterName(_)
    );
    assert_parse_err!(
        r#"http.host == "\u00""#,
        LexErrorKind::MalformedUniversalCharacterName { expected: 4 }
    );
    assert_parse_err!(r#"http.host == "www"#, LexErrorKind::MissingFinalQuote);
}

#[test]
fn raw_strings() {
    assert!(run(r#"http.host matches r"w+\.example""#));
    assert!(run(r#"http.host matches r"^\w+\.\w+\.com$""#));
    assert!(!run(r#"http.host == r"www\.example.com""#));
    assert!(run(r#"http.host contains "\u0077ww""#));

    let scheme = scheme();
    let mut ctx = ExecutionContext::new(&scheme);
    ctx.add_field_value("http.host", r#"\u0041\""#).unwrap();
    let run = |filter: &str| scheme.parse(filter).unwrap().execute(&ctx).unwrap();

    assert!(run(r#"http.host == r"\u0041\"""#));
    assert!(run(r#"http.host == R"\u0041\"""#));
    assert!(!run(r#"http.host == "\u0041\"""#));
}

#[test]
fn char_constants() {
    let scheme = scheme();
    let mut ctx = ExecutionContext::new(&scheme);
    ctx.add_field_value("ip.ttl", 65).unwrap();
    let run = |filter: &str| scheme.parse(filter).unwrap().execute(&ctx).unwrap();

    assert!(run("ip.ttl == 'A'"));
    assert!(run(r"ip.ttl == '\x41'"));
    assert!(run(r"ip.ttl == '\101'"));
    assert!(!run("ip.ttl == 'B'"));

    assert_parse_err!("ip.ttl == ''", LexErrorKind::EmptyCharConstant);
    assert_parse_err!("ip.ttl == 'ab'", LexErrorKind::CharConstantTooLong);
}

#[test]
fn slices_and_arithmetic() {
    assert!(run("data[0:2] == aa:bb"));
    assert!(run("data[1-2] == bb:cc"));
    assert!(run("data[-1] == \"\\xcc\""));
    assert!(run("data[0,2] == aa:cc"));
    assert!(!run("data[5:1]"));
    assert!(run("eth[0:3] == 00:11:22"));
    assert!(run("tcp.port + 1 == 444"));
    assert!(run("tcp.port & 0xff == 187"));
    assert!(run("-(ip.ttl) == -64"));
    assert!(run("ip.ttl * 2 == ip.ttl + 64"));

    assert_parse_err!("data[0:2 == aa:bb", LexErrorKind::MissingRightBracket);
    assert_parse_err!("tcp.port[0:2", LexErrorKind::MissingRightBracket);
}

#[test]
fn sets() {
    assert!(run("tcp.port in {80, 443}"));
    assert!(run("tcp.port in {1..1024}"));
    assert!(run("tcp.port not in {80, 8080}"));
    assert!(!run("tcp.port not in {443, 8080}"));
    assert!(run("http.host in {\"a\", \"www.example.com\"}"));

    assert_parse_err!("tcp.port in {}", LexErrorKind::EmptySet);
}

#[test]
fn warnings() {
    let scheme = scheme();
    let parser = FilterParser::new(&scheme);
    let mut warnings = Vec::<Warning>::new();

    let deprecated = parser
        .parse_with_diagnostics("tcp.port ~= 443", &mut warnings)
        .unwrap();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].span.start, 9);
    assert!(warnings[0].message.contains("!=="));
    assert_eq!(
        serde_json::to_value(&deprecated).unwrap(),
        serde_json::to_value(parser.parse("tcp.port !== 443").unwrap()).unwrap()
    );

    warnings.clear();
    parser
        .parse_with_diagnostics("tcp.port in {80 443 8080}", &mut warnings)
        .unwrap();
    assert_eq!(warnings.len(), 1);

    warnings.clear();
    parser
        .parse_with_diagnostics("tcp.port in {80, 443}", &mut warnings)
        .unwrap();
    assert!(warnings.is_empty());
}

#[test]
fn errors() {
    let scheme = scheme();

    let err = scheme.parse("bogus.field == 1").unwrap_err();
    match err.kind() {
        LexErrorKind::UnknownField(err) => assert_eq!(err.name, "bogus.field"),
        kind => panic!("unexpected error {:?}", kind),
    }
    assert_eq!(err.span().start, 0);
    assert_eq!(err.span().len, 11);

    assert_parse_err!("tcp.port == 1 == 2", LexErrorKind::ChainedComparison);
    assert!(scheme.parse("").is_err());
    assert!(scheme.parse("tcp.port ==").is_err());
    assert!(scheme.parse("(tcp.port").is_err());
    assert!(scheme.parse("tcp.port == 1 tcp.port").is_err());

    assert_eq!(
        scheme.parse("tcp.port == 1 and\nbogus").unwrap_err().to_string(),
        "Filter parsing error (2:1):\nbogus\n^^^^^ \"bogus\" is not a valid protocol or protocol field\n"
    );
}

#[test]
fn references() {
    let scheme = scheme();
    let mut ctx = context(&scheme);
    let ast = scheme.parse("tcp.port == ${tcp.port} + 1").unwrap();
    assert!(!ast.execute(&ctx).unwrap());

    ctx.set_reference_value("tcp.port", 442).unwrap();
    assert!(ast.execute(&ctx).unwrap());

    ctx.set_reference_value("ip.src", IpAddr::from([10, 1, 2, 3]))
        .unwrap();
    assert!(scheme.parse("ip.src == $ip.src").unwrap().execute(&ctx).unwrap());
    assert!(!scheme.parse("ip.src === $ip.src").unwrap().execute(&ctx).unwrap());
}

#[test]
fn parse_concurrently() {
    let scheme = scheme();
    let filters = [
        "tcp.port in {80, 443}",
        "ip.src == 10.0.0.0/8 and not tcp.flags.syn",
        "http.host matches \"^www\"",
        "data[0:2] == aa:bb",
    ];

    std::thread::scope(|s| {
        for filter in &filters {
            let scheme = &scheme;
            s.spawn(move || {
                let ctx = context(scheme);
                for _ in 0..16 {
                    let ast = scheme.parse(filter).unwrap();
                    assert!(ast.execute(&ctx).unwrap(), "{}", filter);
                }
            });
        }
    });
}
