//! Field annotation parsing.
//!
//! An annotation has the shape `KEY[,default=VALUE][,required][,encrypted]`.
//! The first segment is always the lookup key; the remaining segments are
//! modifiers in any order. Segments that are not a known modifier are ignored
//! so annotations can carry extra hints for other tooling.

/// Binding directives derived from a single field annotation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSpec {
    /// Source lookup key. Empty means the field is not bound.
    pub key: String,
    /// Fallback used when the source has no value for `key`.
    pub default: Option<String>,
    pub required: bool,
    pub encrypted: bool,
}

/// One modifier segment of an annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier<'a> {
    Required,
    Encrypted,
    Default(&'a str),
    /// Anything else. Accepted and dropped.
    Unrecognized(&'a str),
}

impl<'a> Modifier<'a> {
    /// Classifies an already trimmed segment.
    pub fn parse(segment: &'a str) -> Self {
        match segment {
            "required" => Modifier::Required,
            "encrypted" => Modifier::Encrypted,
            _ => match segment.strip_prefix("default=") {
                Some(value) => Modifier::Default(value),
                None => Modifier::Unrecognized(segment),
            },
        }
    }
}

impl FieldSpec {
    /// Parses an annotation. An empty annotation yields an unbound spec.
    pub fn parse(annotation: &str) -> Self {
        if annotation.is_empty() {
            return FieldSpec::default();
        }

        let mut segments = annotation.split(',');
        let mut spec = FieldSpec {
            key: segments.next().unwrap_or_default().trim().to_string(),
            ..FieldSpec::default()
        };

        for segment in segments {
            match Modifier::parse(segment.trim()) {
                Modifier::Required => spec.required = true,
                Modifier::Encrypted => spec.encrypted = true,
                Modifier::Default(value) => {
                    spec.default = Some(value.to_string()).filter(|v| !v.is_empty());
                }
                Modifier::Unrecognized(other) => {
                    tracing::trace!(key = %spec.key, modifier = other, "ignoring unrecognized modifier");
                }
            }
        }

        spec
    }

    /// Whether the field takes part in binding at all.
    pub fn is_bound(&self) -> bool {
        !self.key.is_empty()
    }
}
