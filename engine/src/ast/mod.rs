pub mod field_expr;
pub mod logical_expr;
pub mod parse;
pub mod range;
pub mod value_expr;

use self::logical_expr::LogicalExpr;
use crate::{
    execution_context::ExecutionContext,
    scheme::{Field, Scheme, UnknownFieldError},
};
use serde::Serialize;
use std::fmt::{self, Debug};
use thiserror::Error;

/// An error that occurs if a filter is executed against an
/// [`ExecutionContext`] built for a different [`Scheme`].
#[derive(Debug, PartialEq, Eq, Error)]
#[error("execution context doesn't match the scheme with which the filter was parsed")]
pub struct SchemeMismatchError;

/// Trait used to drive evaluation of an expression.
pub(crate) trait Expr<'s>: Sized + Eq + Debug + Serialize {
    /// Returns whether the expression reads the given field.
    fn uses(&self, field: Field<'s>) -> bool;

    /// Evaluates the expression against dissected values.
    fn execute(&self, ctx: &ExecutionContext<'_>) -> bool;
}

/// A parsed filter AST.
///
/// It's attached to its corresponding [`Scheme`](struct@Scheme) because all
/// parsed fields are represented as indices and are valid only when
/// [`ExecutionContext`] is created from the same scheme.
#[derive(PartialEq, Eq, Clone, Serialize)]
#[serde(transparent)]
pub struct FilterAst<'s> {
    #[serde(skip)]
    pub(crate) scheme: &'s Scheme,

    pub(crate) expr: LogicalExpr<'s>,
}

impl Debug for FilterAst<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.expr.fmt(f)
    }
}

impl<'s> FilterAst<'s> {
    /// Returns the associated scheme.
    #[inline]
    pub fn scheme(&self) -> &'s Scheme {
        self.scheme
    }

    /// Returns the top-level expression.
    #[inline]
    pub fn expression(&self) -> &LogicalExpr<'s> {
        &self.expr
    }

    /// Recursively checks whether a [`FilterAst`] uses a given field name.
    ///
    /// This is useful to lazily initialise expensive fields only if necessary.
    pub fn uses(&self, field_name: &str) -> Result<bool, UnknownFieldError> {
        self.scheme
            .get_field(field_name)
            .map(|field| self.expr.uses(field))
    }

    /// Executes the filter against the values in `ctx`.
    ///
    /// The AST isn't modified, so a filter may be executed by several
    /// threads at once.
    pub fn execute(&self, ctx: &ExecutionContext<'_>) -> Result<bool, SchemeMismatchError> {
        if self.scheme == ctx.scheme() {
            Ok(self.expr.execute(ctx))
        } else {
            Err(SchemeMismatchError)
        }
    }
}

#[test]
fn test_uses() {
    let scheme = Scheme! {
        tcp.port: Int,
        udp.port: Int,
        ip.src: Ip,
    };
    let ast = scheme.parse("tcp.port == 80 or ip.src in {10.0.0.0/8}").unwrap();
    assert_eq!(ast.uses("tcp.port"), Ok(true));
    assert_eq!(ast.uses("ip.src"), Ok(true));
    assert_eq!(ast.uses("udp.port"), Ok(false));
    assert_eq!(
        ast.uses("bogus"),
        Err(UnknownFieldError {
            name: "bogus".into()
        })
    );
}

#[test]
fn test_scheme_mismatch() {
    let scheme1 = Scheme! { foo: Int };
    let scheme2 = Scheme! { foo: Int };
    let ast = scheme1.parse("foo == 1").unwrap();
    let mut ctx = ExecutionContext::new(&scheme2);
    ctx.add_field_value("foo", 1).unwrap();

    assert_eq!(ast.execute(&ctx), Err(SchemeMismatchError));

    let mut ctx = ExecutionContext::new(&scheme1);
    ctx.add_field_value("foo", 1).unwrap();
    assert_eq!(ast.execute(&ctx), Ok(true));
}

#[test]
fn test_filter_ast_is_sync() {
    fn assert_sync<T: Send + Sync>() {}
    assert_sync::<FilterAst<'static>>();
}
