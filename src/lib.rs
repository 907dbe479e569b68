//! Binds key/value configuration onto typed structs.
//!
//! A struct lists its bound fields with [`configurable!`], each with an
//! annotation like `PORT,default=8000` or `API_TOKEN,required,encrypted`.
//! [`bind`] then looks every key up in a [`Source`], falls back to the
//! default, decrypts marked fields with a [`Decrypter`] and coerces the string
//! into the field's type.

pub mod binder;
pub mod coerce;
pub mod crypto;
pub mod error;
pub mod provider;
pub mod record;
pub mod sources;
pub mod tags;

pub use binder::{bind, Outcome};
pub use coerce::{CoercionError, Kind, Value};
pub use crypto::{
    AesGcmCrypto, Algorithm, ChaChaCrypto, CryptoAlgorithm, CryptoError, Decrypter, Encrypter,
};
pub use error::{BindError, ErrorKind};
pub use provider::{ConfigProvider, ProviderError};
pub use record::{ConfigValue, Configurable, Field};
pub use sources::{EnvSource, PropertiesSource, Source, SourceError};
pub use tags::FieldSpec;
