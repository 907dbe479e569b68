//! Fluent front end over [`bind`](crate::bind).

use std::path::Path;

use thiserror::Error;

use crate::binder::bind;
use crate::crypto::{AesGcmCrypto, CryptoError, Decrypter};
use crate::error::BindError;
use crate::record::Configurable;
use crate::sources::{PropertiesSource, Source, SourceError};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("no configuration source was set")]
    MissingSource,
    #[error("unsupported file type: {0:?}")]
    UnsupportedFileType(String),
    #[error("source error: {0}")]
    Source(#[from] SourceError),
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),
    #[error(transparent)]
    Bind(#[from] BindError),
}

/// Collects a source and an optional decrypter, then loads records.
///
/// ```no_run
/// use config_provider::{configurable, ConfigProvider};
///
/// #[derive(Default)]
/// struct AppConfig {
///     name: String,
///     secret: String,
/// }
///
/// configurable!(AppConfig {
///     name => "NAME,default=app",
///     secret => "SECRET_KEY,encrypted",
/// });
///
/// let config: AppConfig = ConfigProvider::new()
///     .with_file("app.properties")?
///     .with_aes_gcm_decrypter("12345678901234567890123456789012")?
///     .build()?;
/// # Ok::<(), config_provider::ProviderError>(())
/// ```
#[derive(Default)]
pub struct ConfigProvider {
    source: Option<Box<dyn Source>>,
    decrypter: Option<Box<dyn Decrypter>>,
}

impl ConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, source: impl Source + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Picks a reader from the file extension.
    pub fn with_file(self, path: impl AsRef<Path>) -> Result<Self, ProviderError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "properties" => self.with_properties_file(path),
            _ => Err(ProviderError::UnsupportedFileType(extension)),
        }
    }

    pub fn with_properties_file(self, path: impl AsRef<Path>) -> Result<Self, ProviderError> {
        let source = PropertiesSource::from_path(path)?;
        Ok(self.with_source(source))
    }

    pub fn with_decrypter(mut self, decrypter: impl Decrypter + 'static) -> Self {
        self.decrypter = Some(Box::new(decrypter));
        self
    }

    /// Uses AES-256-GCM keyed with the bytes of `secret`.
    pub fn with_aes_gcm_decrypter(self, secret: &str) -> Result<Self, ProviderError> {
        let crypto = AesGcmCrypto::from_secret(secret)?;
        Ok(self.with_decrypter(crypto))
    }

    /// Binds `target` in place.
    pub fn load<T: Configurable>(&self, target: &mut T) -> Result<(), ProviderError> {
        let source = self.source.as_deref().ok_or(ProviderError::MissingSource)?;
        bind(target, source, self.decrypter.as_deref())?;
        Ok(())
    }

    /// Binds a fresh `T::default()`.
    pub fn build<T: Configurable + Default>(&self) -> Result<T, ProviderError> {
        let mut target = T::default();
        self.load(&mut target)?;
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::fs;

    use tempfile::TempDir;

    use super::{ConfigProvider, ProviderError};
    use crate::crypto::{AesGcmCrypto, Encrypter};

    const SECRET: &str = "12345678901234567890123456789012";

    #[derive(Debug, Default)]
    struct AppConfig {
        debug: bool,
        port: i32,
        name: String,
        secret_key: String,
        tags: Vec<String>,
        flags: HashMap<String, bool>,
    }

    crate::configurable!(AppConfig {
        debug => "DEBUG",
        port => "PORT,default=8080",
        name => "NAME,default=defaultName",
        secret_key => "SECRET_KEY,encrypted",
        tags => "TAGS",
        flags => "FLAGS",
    });

    #[test]
    fn loads_encrypted_properties_file() {
        let sealed = AesGcmCrypto::from_secret(SECRET)
            .unwrap()
            .encrypt("hunter2")
            .unwrap();
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("app.PROPERTIES");
        fs::write(
            &path,
            format!("DEBUG=true\nTAGS=a, b\nFLAGS={{\"x\": true}}\nSECRET_KEY={sealed}\n"),
        )
        .unwrap();

        let config: AppConfig = ConfigProvider::new()
            .with_file(&path)
            .expect("properties file")
            .with_aes_gcm_decrypter(SECRET)
            .expect("valid secret")
            .build()
            .expect("config should load");

        assert!(config.debug);
        assert_eq!(config.port, 8080);
        assert_eq!(config.name, "defaultName");
        assert_eq!(config.secret_key, "hunter2");
        assert_eq!(config.tags, vec!["a", "b"]);
        assert_eq!(config.flags.get("x"), Some(&true));
    }

    #[test]
    fn rejects_unknown_extensions() {
        let err = ConfigProvider::new().with_file("settings.yaml").err().unwrap();
        assert!(matches!(err, ProviderError::UnsupportedFileType(ref ext) if ext == "yaml"));
    }

    #[test]
    fn requires_a_source() {
        let err = ConfigProvider::new().build::<AppConfig>().unwrap_err();
        assert!(matches!(err, ProviderError::MissingSource));
    }

    #[test]
    fn rejects_short_secrets() {
        let err = ConfigProvider::new().with_aes_gcm_decrypter("short").err().unwrap();
        assert!(matches!(err, ProviderError::Crypto(_)));
    }

    #[test]
    fn bind_errors_pass_through() {
        let source: HashMap<String, String> = [("PORT".to_string(), "eighty".to_string())].into();
        let err = ConfigProvider::new()
            .with_source(source)
            .build::<AppConfig>()
            .unwrap_err();
        assert!(format!("{err}").contains("invalid value for PORT"));
    }
}
