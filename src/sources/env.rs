use super::Source;

/// Reads keys from the process environment, optionally under a prefix.
#[derive(Debug, Clone, Default)]
pub struct EnvSource {
    prefix: String,
}

impl EnvSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up `{prefix}{key}` instead of `key`.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Source for EnvSource {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(format!("{}{}", self.prefix, key)).ok()
    }
}
