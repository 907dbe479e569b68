//! The binding pipeline: lookup, default/required resolution, decryption,
//! coercion and assignment, one field at a time.

use std::collections::HashSet;

use crate::coerce::{coerce, CoercionError};
use crate::crypto::Decrypter;
use crate::error::BindError;
use crate::record::{Configurable, Field};
use crate::sources::Source;

/// What happened to a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// No lookup key; the field is not bound.
    Skipped,
    /// Absent from the source with no default and not required.
    Untouched,
    Assigned,
}

/// Decrypts the value of an encrypted field.
pub fn decrypt_value(
    key: &str,
    value: &str,
    decrypter: Option<&dyn Decrypter>,
) -> Result<String, BindError> {
    let decrypter = decrypter.ok_or_else(|| BindError::DecrypterMissing {
        key: key.to_string(),
    })?;

    decrypter
        .decrypt(value)
        .map_err(|source| BindError::DecryptionFailed {
            key: key.to_string(),
            source,
        })
}

/// Resolves and assigns one field of `target`.
pub fn bind_field<T, S>(
    target: &mut T,
    field: &Field<T>,
    source: &S,
    decrypter: Option<&dyn Decrypter>,
) -> Result<Outcome, BindError>
where
    S: Source + ?Sized,
{
    let spec = field.spec();
    if !spec.is_bound() {
        return Ok(Outcome::Skipped);
    }

    let mut resolved = match (source.get(&spec.key), &spec.default) {
        (Some(value), _) => value,
        (None, Some(default)) => default.clone(),
        (None, None) if spec.required => {
            return Err(BindError::RequiredKeyMissing {
                key: spec.key.clone(),
            })
        }
        (None, None) => return Ok(Outcome::Untouched),
    };

    if spec.encrypted {
        resolved = decrypt_value(&spec.key, &resolved, decrypter)?;
    }

    let coercion_failed = |source: CoercionError| BindError::CoercionFailed {
        key: spec.key.clone(),
        source,
    };
    let value = coerce(field.kind(), &resolved).map_err(coercion_failed)?;
    field.assign(target, value).map_err(coercion_failed)?;

    Ok(Outcome::Assigned)
}

/// Binds every annotated field of `target` from `source`.
///
/// Fields are processed in declaration order and the first failure aborts the
/// run. Fields bound before the failure keep their new values.
pub fn bind<T, S>(target: &mut T, source: &S, decrypter: Option<&dyn Decrypter>) -> Result<(), BindError>
where
    T: Configurable,
    S: Source + ?Sized,
{
    let type_name = std::any::type_name::<T>();
    let fields = T::fields();
    validate_fields(type_name, &fields)?;

    let _span = tracing::debug_span!("bind", record = type_name).entered();
    for field in &fields {
        let outcome = bind_field(target, field, source, decrypter)?;
        tracing::debug!(field = field.name(), key = %field.spec().key, ?outcome, "bound field");
    }

    Ok(())
}

fn validate_fields<T>(type_name: &'static str, fields: &[Field<T>]) -> Result<(), BindError> {
    let mut seen = HashSet::new();
    for field in fields {
        if !seen.insert(field.name()) {
            return Err(BindError::InvalidTarget {
                type_name,
                reason: format!("field {} is described more than once", field.name()),
            });
        }
    }
    Ok(())
}
