//! Field rules and schemas
//!
//! A `FieldRule` binds one output field to a regex, the capture group that
//! holds its value, and the type the value is read as. Rules are compiled once
//! and never mutated, so a schema can be shared by every worker without locks.

use regex::Regex;

/// How a captured value is interpreted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// The captured text as-is
    Text,

    /// An integer; grouping commas and surrounding whitespace are ignored
    Int,

    /// True iff `marker` occurs in the captured text
    Flag { marker: String },
}

/// Normalisation applied to the captured text before it is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transform {
    #[default]
    None,
    Trim,
}

impl Transform {
    pub fn apply<'a>(&self, raw: &'a str) -> &'a str {
        match self {
            Self::None => raw,
            Self::Trim => raw.trim(),
        }
    }
}

/// A named extraction rule for one field
#[derive(Debug, Clone)]
pub struct FieldRule {
    name: String,
    pattern: Regex,
    group: usize,
    kind: FieldKind,
    transform: Transform,
}

impl FieldRule {
    /// Compiles a rule reading capture group 1 of `pattern`
    ///
    /// # Errors
    ///
    /// Returns the regex error if `pattern` does not compile.
    pub fn new(name: impl Into<String>, pattern: &str, kind: FieldKind) -> Result<Self, regex::Error> {
        Ok(Self {
            name: name.into(),
            pattern: Regex::new(pattern)?,
            group: 1,
            kind,
            transform: Transform::None,
        })
    }

    /// Shorthand for a text rule
    pub fn text(name: impl Into<String>, pattern: &str) -> Result<Self, regex::Error> {
        Self::new(name, pattern, FieldKind::Text)
    }

    /// Shorthand for an integer rule
    pub fn int(name: impl Into<String>, pattern: &str) -> Result<Self, regex::Error> {
        Self::new(name, pattern, FieldKind::Int)
    }

    /// Shorthand for a presence-flag rule
    pub fn flag(
        name: impl Into<String>,
        pattern: &str,
        marker: impl Into<String>,
    ) -> Result<Self, regex::Error> {
        Self::new(
            name,
            pattern,
            FieldKind::Flag {
                marker: marker.into(),
            },
        )
    }

    /// Reads the value from a different capture group (0 is the whole match)
    pub fn with_group(mut self, group: usize) -> Self {
        self.group = group;
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    pub fn group(&self) -> usize {
        self.group
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }
}

/// An ordered, immutable list of field rules for one document type
#[derive(Debug, Clone, Default)]
pub struct FieldSchema {
    name: String,
    rules: Vec<FieldRule>,
}

impl FieldSchema {
    pub fn new(name: impl Into<String>, rules: Vec<FieldRule>) -> Self {
        Self {
            name: name.into(),
            rules,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
