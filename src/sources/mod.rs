//! Key/value lookups the binder reads from.

mod env;
mod properties;

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;
use std::path::PathBuf;

use thiserror::Error;

pub use env::EnvSource;
pub use properties::PropertiesSource;

/// Read-only key/value lookup. `None` means the key is absent.
pub trait Source {
    fn get(&self, key: &str) -> Option<String>;
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("unable to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed line {line}: {content}")]
    MalformedLine { line: usize, content: String },
}

impl<S: BuildHasher> Source for HashMap<String, String, S> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

impl Source for BTreeMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        BTreeMap::get(self, key).cloned()
    }
}

impl<S: Source + ?Sized> Source for &S {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }
}

impl<S: Source + ?Sized> Source for Box<S> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};

    use super::Source;

    fn lookup(source: &dyn Source, key: &str) -> Option<String> {
        source.get(key)
    }

    #[test]
    fn maps_are_sources() {
        let hashed: HashMap<String, String> = [("A".to_string(), "1".to_string())].into();
        let ordered: BTreeMap<String, String> = [("B".to_string(), "2".to_string())].into();

        assert_eq!(lookup(&hashed, "A").as_deref(), Some("1"));
        assert_eq!(lookup(&hashed, "B"), None);
        assert_eq!(lookup(&ordered, "B").as_deref(), Some("2"));

        let boxed: Box<dyn Source> = Box::new(ordered);
        assert_eq!(lookup(&boxed, "B").as_deref(), Some("2"));
    }
}
