use crate::location::Span;
use std::fmt::{self, Display, Formatter};

/// A non-fatal notice produced while compiling a filter, such as the use of
/// deprecated syntax.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Warning {
    /// Human-readable description.
    pub message: String,
    /// Location of the offending text.
    pub span: Span,
}

impl Display for Warning {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} (column {})", self.message, self.span.start + 1)
    }
}

/// Receives warnings emitted during compilation.
///
/// Fatal problems are not reported here: they abort compilation and are
/// returned as a [`ParseError`](crate::ParseError).
pub trait Diagnostics {
    /// Records a non-fatal warning.
    fn warn(&mut self, warning: Warning);
}

/// Forwards warnings to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn warn(&mut self, warning: Warning) {
        log::warn!("{}", warning);
    }
}

impl Diagnostics for Vec<Warning> {
    fn warn(&mut self, warning: Warning) {
        self.push(warning);
    }
}

impl<D: Diagnostics + ?Sized> Diagnostics for &mut D {
    fn warn(&mut self, warning: Warning) {
        (**self).warn(warning)
    }
}
