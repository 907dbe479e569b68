//! Field descriptor tables for bindable records.
//!
//! A record opts into binding by implementing [`Configurable`], usually via
//! the [`configurable!`](crate::configurable) macro. Each [`Field`] pairs the
//! parsed annotation with the destination [`Kind`] and a setter that stores a
//! coerced [`Value`] into the record.

use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};

use serde::de::DeserializeOwned;

use crate::coerce::{CoercionError, Kind, Value};
use crate::tags::FieldSpec;

/// A type that can be produced from a coerced configuration value.
pub trait ConfigValue: Sized {
    /// Destination shape used to drive coercion.
    fn kind() -> Kind;

    fn from_value(value: Value) -> Result<Self, CoercionError>;
}

fn mismatch<T: ConfigValue>(value: &Value) -> CoercionError {
    CoercionError::Mismatch {
        expected: T::kind(),
        found: value.describe(),
    }
}

impl ConfigValue for String {
    fn kind() -> Kind {
        Kind::Text
    }

    fn from_value(value: Value) -> Result<Self, CoercionError> {
        match value {
            Value::Text(text) => Ok(text),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl ConfigValue for bool {
    fn kind() -> Kind {
        Kind::Bool
    }

    fn from_value(value: Value) -> Result<Self, CoercionError> {
        match value {
            Value::Bool(flag) => Ok(flag),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

macro_rules! signed_config_value {
    ($($ty:ty),*) => {$(
        impl ConfigValue for $ty {
            fn kind() -> Kind {
                Kind::Int { bits: <$ty>::BITS }
            }

            fn from_value(value: Value) -> Result<Self, CoercionError> {
                match value {
                    Value::Int(n) => <$ty>::try_from(n).map_err(|e| CoercionError::Parse {
                        kind: Self::kind(),
                        value: n.to_string(),
                        reason: e.to_string(),
                    }),
                    other => Err(mismatch::<Self>(&other)),
                }
            }
        }
    )*};
}

macro_rules! unsigned_config_value {
    ($($ty:ty),*) => {$(
        impl ConfigValue for $ty {
            fn kind() -> Kind {
                Kind::Uint { bits: <$ty>::BITS }
            }

            fn from_value(value: Value) -> Result<Self, CoercionError> {
                match value {
                    Value::Uint(n) => <$ty>::try_from(n).map_err(|e| CoercionError::Parse {
                        kind: Self::kind(),
                        value: n.to_string(),
                        reason: e.to_string(),
                    }),
                    other => Err(mismatch::<Self>(&other)),
                }
            }
        }
    )*};
}

signed_config_value!(i8, i16, i32, i64, isize);
unsigned_config_value!(u8, u16, u32, u64, usize);

impl ConfigValue for f32 {
    fn kind() -> Kind {
        Kind::Float { bits: 32 }
    }

    fn from_value(value: Value) -> Result<Self, CoercionError> {
        match value {
            // Already rounded to f32 precision during coercion.
            Value::Float(n) => Ok(n as f32),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl ConfigValue for f64 {
    fn kind() -> Kind {
        Kind::Float { bits: 64 }
    }

    fn from_value(value: Value) -> Result<Self, CoercionError> {
        match value {
            Value::Float(n) => Ok(n),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl<T: ConfigValue> ConfigValue for Vec<T> {
    fn kind() -> Kind {
        Kind::Sequence(Box::new(T::kind()))
    }

    fn from_value(value: Value) -> Result<Self, CoercionError> {
        match value {
            Value::Sequence(items) => items
                .into_iter()
                .enumerate()
                .map(|(index, item)| {
                    T::from_value(item).map_err(|source| CoercionError::InvalidElement {
                        index,
                        source: Box::new(source),
                    })
                })
                .collect(),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

/// Converts mapping entries: keys through [`ConfigValue`], values through serde.
fn mapping_entries<K, V>(
    entries: Vec<(Value, serde_json::Value)>,
) -> impl Iterator<Item = Result<(K, V), CoercionError>>
where
    K: ConfigValue,
    V: DeserializeOwned,
{
    entries.into_iter().map(|(key, raw)| -> Result<(K, V), CoercionError> {
        let label = match &key {
            Value::Text(text) => text.clone(),
            other => format!("{other:?}"),
        };
        let value = serde_json::from_value(raw).map_err(|source| CoercionError::MapValue {
            key: label.clone(),
            source,
        })?;
        let key = K::from_value(key).map_err(|source| CoercionError::MapKey {
            key: label,
            source: Box::new(source),
        })?;
        Ok((key, value))
    })
}

impl<K, V, S> ConfigValue for HashMap<K, V, S>
where
    K: ConfigValue + Eq + Hash,
    V: DeserializeOwned,
    S: BuildHasher + Default,
{
    fn kind() -> Kind {
        Kind::Mapping(Box::new(K::kind()))
    }

    fn from_value(value: Value) -> Result<Self, CoercionError> {
        match value {
            Value::Mapping(entries) => mapping_entries(entries).collect(),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl<K, V> ConfigValue for BTreeMap<K, V>
where
    K: ConfigValue + Ord,
    V: DeserializeOwned,
{
    fn kind() -> Kind {
        Kind::Mapping(Box::new(K::kind()))
    }

    fn from_value(value: Value) -> Result<Self, CoercionError> {
        match value {
            Value::Mapping(entries) => mapping_entries(entries).collect(),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

type Setter<T> = Box<dyn Fn(&mut T, Value) -> Result<(), CoercionError>>;

/// Descriptor for one bindable field of `T`.
pub struct Field<T> {
    name: &'static str,
    spec: FieldSpec,
    kind: Kind,
    setter: Setter<T>,
}

impl<T: 'static> Field<T> {
    /// Builds a descriptor from the field name, its annotation and an accessor
    /// returning the field's storage.
    pub fn new<V, F>(name: &'static str, annotation: &str, accessor: F) -> Self
    where
        V: ConfigValue + 'static,
        F: Fn(&mut T) -> &mut V + 'static,
    {
        Field {
            name,
            spec: FieldSpec::parse(annotation),
            kind: V::kind(),
            setter: Box::new(move |target: &mut T, value: Value| -> Result<(), CoercionError> {
                *accessor(target) = V::from_value(value)?;
                Ok(())
            }),
        }
    }
}

impl<T> Field<T> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn spec(&self) -> &FieldSpec {
        &self.spec
    }

    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    /// Stores an already coerced value into the record.
    pub fn assign(&self, target: &mut T, value: Value) -> Result<(), CoercionError> {
        (self.setter)(target, value)
    }
}

impl<T> std::fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("spec", &self.spec)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// A record whose fields can be bound from a [`Source`](crate::Source).
pub trait Configurable: Sized + 'static {
    /// Field descriptors in declaration order.
    fn fields() -> Vec<Field<Self>>;
}

/// Implements [`Configurable`] for a struct by listing its bound fields.
///
/// ```
/// use config_provider::configurable;
///
/// #[derive(Default)]
/// struct AppConfig {
///     port: u16,
///     tags: Vec<String>,
/// }
///
/// configurable!(AppConfig {
///     port => "PORT,default=8000",
///     tags => "TAGS",
/// });
/// ```
#[macro_export]
macro_rules! configurable {
    ($ty:ty { $($field:ident => $annotation:expr),* $(,)? }) => {
        impl $crate::Configurable for $ty {
            fn fields() -> ::std::vec::Vec<$crate::Field<Self>> {
                ::std::vec![
                    $($crate::Field::new(
                        ::std::stringify!($field),
                        $annotation,
                        |target: &mut Self| &mut target.$field,
                    )),*
                ]
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};

    use super::{ConfigValue, Field};
    use crate::coerce::{coerce, CoercionError, Kind, Value};

    fn parse<T: ConfigValue>(raw: &str) -> Result<T, CoercionError> {
        T::from_value(coerce(&T::kind(), raw)?)
    }

    #[test]
    fn kinds_follow_rust_types() {
        assert_eq!(i16::kind(), Kind::Int { bits: 16 });
        assert_eq!(usize::kind(), Kind::Uint { bits: usize::BITS });
        assert_eq!(
            Vec::<f32>::kind(),
            Kind::Sequence(Box::new(Kind::Float { bits: 32 }))
        );
        assert_eq!(
            HashMap::<String, bool>::kind(),
            Kind::Mapping(Box::new(Kind::Text))
        );
    }

    #[test]
    fn builds_scalars() {
        assert_eq!(parse::<i32>("7").unwrap(), 7);
        assert_eq!(parse::<u16>("8000").unwrap(), 8000);
        assert_eq!(parse::<f32>("2.3").unwrap(), 2.3f32);
        assert!(parse::<bool>("true").unwrap());
        assert_eq!(parse::<String>("svc").unwrap(), "svc");
    }

    #[test]
    fn builds_nested_sequences() {
        let tags: Vec<String> = parse("a, b ,c").unwrap();
        assert_eq!(tags, vec!["a", "b", "c"]);
    }

    #[test]
    fn decodes_map_values_with_serde() {
        let flags: HashMap<String, bool> = parse(r#"{"a": true, "b": false}"#).unwrap();
        assert_eq!(flags.get("a"), Some(&true));
        assert_eq!(flags.get("b"), Some(&false));

        let nested: BTreeMap<String, Vec<u8>> = parse(r#"{"x": [1, 2, 3]}"#).unwrap();
        assert_eq!(nested["x"], vec![1, 2, 3]);
    }

    #[test]
    fn map_value_type_errors_name_the_key() {
        let err = parse::<HashMap<String, bool>>(r#"{"flag": "yes"}"#).unwrap_err();
        assert!(matches!(err, CoercionError::MapValue { ref key, .. } if key == "flag"));
    }

    #[test]
    fn mismatched_values_are_reported() {
        let err = bool::from_value(Value::Text("true".into())).unwrap_err();
        assert!(format!("{err}").contains("expected a bool value"));
    }

    #[derive(Default)]
    struct Sample {
        name: String,
        retries: u8,
    }

    #[test]
    fn field_setter_writes_through_accessor() {
        let field = Field::new("retries", "RETRIES,default=3", |s: &mut Sample| &mut s.retries);
        assert_eq!(field.name(), "retries");
        assert_eq!(field.spec().key, "RETRIES");
        assert_eq!(field.kind(), &Kind::Uint { bits: 8 });

        let mut sample = Sample::default();
        field.assign(&mut sample, Value::Uint(3)).unwrap();
        assert_eq!(sample.retries, 3);
        assert_eq!(sample.name, "");
    }
}
