use serde::Serialize;
use std::cmp::Ordering;

lex_enum!(
    /// A test operator as spelled in the filter. Symbolic and word forms
    /// are synonyms.
    TestOp {
        /// `===` / `all_eq`
        "===" | "all_eq" => AllEq,
        /// `==` / `eq` / `any_eq`
        "==" | "eq" | "any_eq" => AnyEq,
        /// `!==` / `any_ne`
        "!==" | "any_ne" => AnyNe,
        /// `!=` / `ne` / `all_ne`
        "!=" | "ne" | "all_ne" => AllNe,
        /// `>=` / `ge`
        ">=" | "ge" => GreaterThanEqual,
        /// `<=` / `le`
        "<=" | "le" => LessThanEqual,
        /// `>` / `gt`
        ">" | "gt" => GreaterThan,
        /// `<` / `lt`
        "<" | "lt" => LessThan,
        /// `contains`
        "contains" => Contains,
        /// `~` / `matches`
        "~" | "matches" => Matches,
        /// `in`
        "in" => In,
    }
);

/// Deprecated spelling of [`TestOp::AnyNe`].
pub const DEPRECATED_ANY_NE: &str = "~=";

lex_enum!(
    /// LogicalOp is an operator for a
    /// [`LogicalExpr`](crate::ast::logical_expr::LogicalExpr). Its ordering
    /// is defined by the operators' precedences in ascending order.
    #[derive(PartialOrd, Ord)] LogicalOp {
        /// `or` / `||` operator
        "or" | "||" => Or,
        /// `xor` / `^^` operator
        "xor" | "^^" => Xor,
        /// `and` / `&&` operator
        "and" | "&&" => And,
    }
);

lex_enum!(
    /// An operator that takes a single logical argument
    UnaryOp {
        /// `not` / `!` operator
        "not" | "!" => Not,
    }
);

lex_enum!(
    /// A binary arithmetic operator.
    ArithOp {
        /// `+`
        "+" => Add,
        /// `-`, also used as unary minus
        "-" => Sub,
        /// `*`
        "*" => Mul,
        /// `/`
        "/" => Div,
        /// `%`
        "%" => Mod,
        /// `&` / `bitwise_and`
        "&" | "bitwise_and" => BitwiseAnd,
    }
);

lex_enum!(
    /// Punctuation recognized in the default scanner mode.
    Punct {
        /// `(`
        "(" => LParen,
        /// `)`
        ")" => RParen,
        /// `{`
        "{" => LBrace,
        /// `}`
        "}" => RBrace,
        /// `,`
        "," => Comma,
        /// `$`
        "$" => Dollar,
        /// `..`
        ".." => DotDot,
    }
);

impl ArithOp {
    /// Binding power: multiplicative operators bind tighter than additive
    /// ones.
    pub fn is_multiplicative(self) -> bool {
        !matches!(self, ArithOp::Add | ArithOp::Sub)
    }
}

const LESS: u8 = 0b001;
const GREATER: u8 = 0b010;
const EQUAL: u8 = 0b100;

/// Ordering relation tested by a comparison.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize)]
#[repr(u8)]
pub enum OrderingOp {
    /// Equal
    Equal = EQUAL,
    /// Not equal
    NotEqual = LESS | GREATER,
    /// Greater than or equal
    GreaterThanEqual = GREATER | EQUAL,
    /// Less than or equal
    LessThanEqual = LESS | EQUAL,
    /// Greater than
    GreaterThan = GREATER,
    /// Less than
    LessThan = LESS,
}

impl OrderingOp {
    /// Determines whether the operator matches a given ordering.
    pub fn matches(self, ordering: Ordering) -> bool {
        let mask = self as u8;
        let flag = match ordering {
            Ordering::Less => LESS,
            Ordering::Greater => GREATER,
            Ordering::Equal => EQUAL,
        };
        mask & flag != 0
    }

    /// Same as [`OrderingOp::matches`] but for an optional ordering.
    pub fn matches_opt(self, ordering: Option<Ordering>) -> bool {
        match ordering {
            Some(ordering) => self.matches(ordering),
            // only `!=` should be true for incomparable types
            None => self == OrderingOp::NotEqual,
        }
    }
}

/// Whether a test must hold for any or for all occurrences of a repeated
/// field.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize)]
pub enum Quantifier {
    /// At least one pair of values satisfies the test.
    Any,
    /// Every pair of values satisfies the test.
    All,
}

impl TestOp {
    /// Splits an ordering test into its quantifier and relation.
    pub fn ordering(self) -> Option<(Quantifier, OrderingOp)> {
        Some(match self {
            TestOp::AnyEq => (Quantifier::Any, OrderingOp::Equal),
            TestOp::AllEq => (Quantifier::All, OrderingOp::Equal),
            TestOp::AnyNe => (Quantifier::Any, OrderingOp::NotEqual),
            TestOp::AllNe => (Quantifier::All, OrderingOp::NotEqual),
            TestOp::GreaterThan => (Quantifier::Any, OrderingOp::GreaterThan),
            TestOp::GreaterThanEqual => (Quantifier::Any, OrderingOp::GreaterThanEqual),
            TestOp::LessThan => (Quantifier::Any, OrderingOp::LessThan),
            TestOp::LessThanEqual => (Quantifier::Any, OrderingOp::LessThanEqual),
            TestOp::Contains | TestOp::Matches | TestOp::In => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lex::{Lex, LexErrorKind};

    #[test]
    fn test_synonyms() {
        for s in &["==", "eq", "any_eq"] {
            assert_ok!(TestOp::lex(s), TestOp::AnyEq);
        }
        for s in &["===", "all_eq"] {
            assert_ok!(TestOp::lex(s), TestOp::AllEq);
        }
        for s in &["!==", "any_ne"] {
            assert_ok!(TestOp::lex(s), TestOp::AnyNe);
        }
        for s in &["!=", "ne", "all_ne"] {
            assert_ok!(TestOp::lex(s), TestOp::AllNe);
        }
        assert_ok!(TestOp::lex("~"), TestOp::Matches);
        assert_ok!(TestOp::lex("matches"), TestOp::Matches);
        assert_ok!(LogicalOp::lex("&&"), LogicalOp::And);
        assert_ok!(LogicalOp::lex("^^"), LogicalOp::Xor);
        assert_ok!(ArithOp::lex("bitwise_and"), ArithOp::BitwiseAnd);
        assert_ok!(UnaryOp::lex("!"), UnaryOp::Not);
    }

    #[test]
    fn test_longer_spelling_first() {
        assert_ok!(TestOp::lex(">= 1"), TestOp::GreaterThanEqual, " 1");
        assert_ok!(TestOp::lex("!==x"), TestOp::AnyNe, "x");
        assert_err!(
            TestOp::lex("=x"),
            LexErrorKind::ExpectedName("TestOp"),
            "=x"
        );
    }

    #[test]
    fn test_ordering_op() {
        assert!(OrderingOp::GreaterThanEqual.matches(Ordering::Equal));
        assert!(!OrderingOp::GreaterThan.matches(Ordering::Equal));
        assert!(OrderingOp::NotEqual.matches_opt(None));
        assert!(!OrderingOp::Equal.matches_opt(None));
    }

    #[test]
    fn test_precedence() {
        assert!(LogicalOp::Or < LogicalOp::Xor);
        assert!(LogicalOp::Xor < LogicalOp::And);
        assert!(ArithOp::BitwiseAnd.is_multiplicative());
        assert!(!ArithOp::Sub.is_multiplicative());
    }
}
