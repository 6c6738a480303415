use crate::{
    scheme::{Field, Scheme, UnknownFieldError},
    types::{GetType, LhsValue, TypeMismatchError},
};
use thiserror::Error;

/// An error that occurs when storing a field value in an
/// [`ExecutionContext`].
#[derive(Debug, PartialEq, Eq, Error)]
pub enum SetFieldValueError {
    /// The field is not registered in the scheme.
    #[error("{0}")]
    UnknownField(#[from] UnknownFieldError),

    /// The value doesn't have the field's type.
    #[error("{0}")]
    TypeMismatch(#[from] TypeMismatchError),

    /// Layers are numbered from 1.
    #[error("layer 0 is invalid, layers are numbered from 1")]
    InvalidLayer,
}

/// An execution context stores an associated [`Scheme`](struct@Scheme) and
/// the dissected values to execute a [`FilterAst`](crate::FilterAst) against.
///
/// A field may occur several times, once per protocol layer it was found
/// in; occurrences are kept in insertion order together with their layer
/// number. Reference values are what `$field` evaluates to.
pub struct ExecutionContext<'e> {
    scheme: &'e Scheme,
    values: Box<[Vec<(u32, LhsValue<'e>)>]>,
    references: Box<[Vec<(u32, LhsValue<'e>)>]>,
}

impl<'e> ExecutionContext<'e> {
    /// Creates an execution context associated with a given scheme.
    ///
    /// This scheme will be used for resolving any field names and indices.
    pub fn new<'s: 'e>(scheme: &'s Scheme) -> Self {
        let empty = || vec![Vec::new(); scheme.field_count()].into_boxed_slice();
        ExecutionContext {
            scheme,
            values: empty(),
            references: empty(),
        }
    }

    /// Returns an associated scheme.
    pub fn scheme(&self) -> &'e Scheme {
        self.scheme
    }

    fn checked_field<'v>(
        &self,
        name: &str,
        layer: u32,
        value: &LhsValue<'v>,
    ) -> Result<Field<'e>, SetFieldValueError> {
        let field = self.scheme.get_field(name)?;
        if layer == 0 {
            return Err(SetFieldValueError::InvalidLayer);
        }
        let (expected, actual) = (field.get_type(), value.get_type());
        if !expected.accepts(actual) {
            return Err(TypeMismatchError { expected, actual }.into());
        }
        Ok(field)
    }

    /// Adds an occurrence of a field found in the first layer.
    pub fn add_field_value<V: Into<LhsValue<'e>>>(
        &mut self,
        name: &str,
        value: V,
    ) -> Result<(), SetFieldValueError> {
        self.add_field_value_at_layer(name, 1, value)
    }

    /// Adds an occurrence of a field found in the given layer.
    pub fn add_field_value_at_layer<V: Into<LhsValue<'e>>>(
        &mut self,
        name: &str,
        layer: u32,
        value: V,
    ) -> Result<(), SetFieldValueError> {
        let value = value.into();
        let field = self.checked_field(name, layer, &value)?;
        self.values[field.index()].push((layer, value));
        Ok(())
    }

    /// Sets the value `$name` refers to, replacing any previous one.
    pub fn set_reference_value<V: Into<LhsValue<'e>>>(
        &mut self,
        name: &str,
        value: V,
    ) -> Result<(), SetFieldValueError> {
        let value = value.into();
        let field = self.checked_field(name, 1, &value)?;
        self.references[field.index()] = vec![(1, value)];
        Ok(())
    }

    pub(crate) fn field_values(&self, field: Field<'_>) -> &[(u32, LhsValue<'e>)] {
        debug_assert!(self.scheme == field.scheme());
        self.values.get(field.index()).map_or(&[], Vec::as_slice)
    }

    pub(crate) fn reference_values(&self, field: Field<'_>) -> &[(u32, LhsValue<'e>)] {
        debug_assert!(self.scheme == field.scheme());
        self.references.get(field.index()).map_or(&[], Vec::as_slice)
    }
}

#[test]
fn test_field_value_type_mismatch() {
    use crate::types::Type;

    let scheme = Scheme! { foo: Int, frame: Protocol };

    let mut ctx = ExecutionContext::new(&scheme);

    assert_eq!(
        ctx.add_field_value("foo", LhsValue::Bool(false)),
        Err(SetFieldValueError::TypeMismatch(TypeMismatchError {
            expected: Type::Int,
            actual: Type::Bool
        }))
    );
    assert_eq!(
        ctx.add_field_value("bar", 1),
        Err(SetFieldValueError::UnknownField(UnknownFieldError {
            name: "bar".into()
        }))
    );
    assert_eq!(
        ctx.add_field_value_at_layer("foo", 0, 1),
        Err(SetFieldValueError::InvalidLayer)
    );
    assert_eq!(ctx.add_field_value("frame", &b"\x01\x02"[..]), Ok(()));
}

#[test]
fn test_occurrences() {
    let scheme = Scheme! { ip.src: Int };
    let field = scheme.get_field("ip.src").unwrap();

    let mut ctx = ExecutionContext::new(&scheme);
    ctx.add_field_value("ip.src", 1).unwrap();
    ctx.add_field_value_at_layer("ip.src", 2, 2).unwrap();
    ctx.set_reference_value("ip.src", 3).unwrap();

    assert_eq!(
        ctx.field_values(field),
        &[(1, LhsValue::Int(1)), (2, LhsValue::Int(2))]
    );
    assert_eq!(ctx.reference_values(field), &[(1, LhsValue::Int(3))]);
}
