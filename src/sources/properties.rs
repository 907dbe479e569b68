//! `key=value` properties files.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::{Source, SourceError};

/// Values parsed from a properties file.
///
/// Lines are `key=value`, split on the first `=` with both sides trimmed.
/// Blank lines and lines starting with `#` or `;` are skipped. A later
/// duplicate key replaces an earlier one.
#[derive(Debug, Clone, Default)]
pub struct PropertiesSource {
    values: HashMap<String, String>,
}

impl PropertiesSource {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let source = Self::parse(&content)?;
        tracing::debug!(path = %path.display(), keys = source.len(), "loaded properties file");
        Ok(source)
    }

    pub fn parse(content: &str) -> Result<Self, SourceError> {
        let mut values = HashMap::new();

        for (index, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            let (key, value) = line.split_once('=').ok_or_else(|| SourceError::MalformedLine {
                line: index + 1,
                content: line.to_string(),
            })?;
            values.insert(key.trim().to_string(), value.trim().to_string());
        }

        Ok(Self { values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Source for PropertiesSource {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}
