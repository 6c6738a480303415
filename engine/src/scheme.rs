use crate::{
    ast::{parse::ParseError, FilterAst},
    types::{GetType, Type},
    FilterParser,
};
use fnv::FnvBuildHasher;
use indexmap::map::{Entry, IndexMap};
use serde::{Serialize, Serializer};
use std::{
    fmt::{self, Debug, Formatter},
    hash::{Hash, Hasher},
    ptr,
};
use thiserror::Error;

/// A handle to a field registered in a [`Scheme`].
///
/// The handle only borrows the scheme: the scheme owns the field descriptors
/// and must outlive every filter referencing them.
#[derive(PartialEq, Eq, Clone, Copy)]
pub struct Field<'s> {
    scheme: &'s Scheme,
    index: usize,
}

impl Serialize for Field<'_> {
    fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        self.name().serialize(ser)
    }
}

impl Debug for Field<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Hash for Field<'_> {
    fn hash<H: Hasher>(&self, h: &mut H) {
        self.index.hash(h)
    }
}

impl<'s> Field<'s> {
    /// Returns the field's name as recorded in the [`Scheme`].
    pub fn name(&self) -> &'s str {
        self.scheme.fields.get_index(self.index).map_or("", |(name, _)| name)
    }

    /// Get the field's index in the [`Scheme`] identifier table.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the [`Scheme`] to which this field belongs to.
    pub fn scheme(&self) -> &'s Scheme {
        self.scheme
    }
}

impl GetType for Field<'_> {
    fn get_type(&self) -> Type {
        self.scheme.fields[self.index]
    }
}

/// An error that occurs if an unregistered field name was queried from a
/// [`Scheme`].
#[derive(Debug, PartialEq, Eq, Error)]
#[error("\"{name}\" is not a valid protocol or protocol field")]
pub struct UnknownFieldError {
    /// The text that failed to resolve.
    pub name: String,
}

/// An error that occurs when previously defined field gets redefined.
#[derive(Debug, PartialEq, Eq, Error)]
#[error("attempt to redefine field {0}")]
pub struct FieldRedefinitionError(String);

/// The field registry a filter is compiled against.
///
/// A scheme maps protocol and field names to their [`Type`]. It is only read
/// while compiling and executing filters, so it can be shared between
/// threads compiling filters concurrently.
#[derive(Default)]
pub struct Scheme {
    fields: IndexMap<String, Type, FnvBuildHasher>,
}

impl PartialEq for Scheme {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self, other)
    }
}

impl Eq for Scheme {}

impl Debug for Scheme {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.fields.iter()).finish()
    }
}

impl<'s> Scheme {
    /// Creates an empty scheme.
    pub fn new() -> Self {
        Default::default()
    }

    /// Registers a field and its corresponding type.
    pub fn add_field<N: Into<String>>(
        &mut self,
        name: N,
        ty: Type,
    ) -> Result<(), FieldRedefinitionError> {
        match self.fields.entry(name.into()) {
            Entry::Occupied(entry) => Err(FieldRedefinitionError(entry.key().clone())),
            Entry::Vacant(entry) => {
                entry.insert(ty);
                Ok(())
            }
        }
    }

    /// Resolves a protocol or field name into a [`Field`] handle.
    pub fn get_field(&'s self, name: &str) -> Result<Field<'s>, UnknownFieldError> {
        self.fields
            .get_index_of(name)
            .map(|index| Field {
                scheme: self,
                index,
            })
            .ok_or_else(|| UnknownFieldError {
                name: name.to_owned(),
            })
    }

    /// Returns the number of registered fields.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Iterates over registered fields.
    pub fn fields(&'s self) -> impl ExactSizeIterator<Item = Field<'s>> + 's {
        (0..self.fields.len()).map(move |index| Field {
            scheme: self,
            index,
        })
    }

    /// Parses a filter into an AST form with default parser settings.
    pub fn parse<'i>(&'s self, input: &'i str) -> Result<FilterAst<'s>, ParseError<'i>> {
        FilterParser::new(self).parse(input)
    }
}

/// Builds a [`Scheme`] from `name: Type` pairs.
///
/// ```
/// let scheme = dfilter::Scheme! {
///     ip.src: Ip,
///     tcp.port: Int,
/// };
/// assert_eq!(scheme.field_count(), 2);
/// ```
#[macro_export]
macro_rules! Scheme {
    ($($ns:ident $(. $field:ident)*: $ty:ident),* $(,)*) => {{
        let mut scheme = $crate::Scheme::new();
        $(
            scheme
                .add_field(
                    concat!(stringify!($ns) $(, ".", stringify!($field))*),
                    $crate::Type::$ty,
                )
                .unwrap();
        )*
        scheme
    }};
}

#[test]
fn test_get_field() {
    let scheme = Scheme! {
        tcp: Protocol,
        tcp.port: Int,
        ip.src: Ip,
    };

    let field = scheme.get_field("tcp.port").unwrap();
    assert_eq!(field.name(), "tcp.port");
    assert_eq!(field.index(), 1);
    assert_eq!(field.get_type(), Type::Int);
    assert_eq!(scheme.get_field("tcp.port"), Ok(field));

    assert_eq!(
        scheme.get_field("bogus.field"),
        Err(UnknownFieldError {
            name: "bogus.field".into()
        })
    );
    assert_eq!(
        UnknownFieldError {
            name: "bogus.field".into()
        }
        .to_string(),
        "\"bogus.field\" is not a valid protocol or protocol field"
    );
}

#[test]
fn test_field_redefinition() {
    let mut scheme = Scheme! { tcp.port: Int };
    assert_eq!(
        scheme.add_field("tcp.port", Type::Bytes),
        Err(FieldRedefinitionError("tcp.port".into()))
    );
}

#[test]
fn test_scheme_is_sync() {
    fn assert_sync<T: Send + Sync>() {}
    assert_sync::<Scheme>();
    assert_sync::<Field<'static>>();
}
