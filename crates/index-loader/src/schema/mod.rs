//! Field mappings and schema conformance.
//!
//! A [`SchemaSet`] is the whitelist of fields a load cares about. Fields a
//! document carries beyond it are ignored. The set is built once from a list
//! of [`FieldMapping`]s and read-only afterwards.

mod validator;

pub use validator::SchemaValidator;

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use crate::datatype::SemanticType;

/// How one source field maps into the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    source_name: String,
    output_name: String,
    semantic_type: SemanticType,
}

impl FieldMapping {
    /// Map `name` to itself with the given type.
    pub fn new(name: impl Into<String>, semantic_type: SemanticType) -> Self {
        let name = name.into();
        Self {
            output_name: name.clone(),
            source_name: name,
            semantic_type,
        }
    }

    /// Write the field under a different name.
    pub fn with_output_name(mut self, output_name: impl Into<String>) -> Self {
        self.output_name = output_name.into();
        self
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn output_name(&self) -> &str {
        &self.output_name
    }

    pub fn semantic_type(&self) -> SemanticType {
        self.semantic_type
    }
}

/// Mappings keyed by source name, iterated in insertion order.
///
/// Inserting a source name twice keeps the first position and the last
/// mapping.
#[derive(Debug, Clone, Default)]
pub struct SchemaSet {
    mappings: Vec<FieldMapping>,
    positions: HashMap<String, usize>,
}

impl SchemaSet {
    /// Build a set from a list of mappings.
    pub fn new(mappings: impl IntoIterator<Item = FieldMapping>) -> Self {
        let mut set = Self::default();
        for mapping in mappings {
            match set.positions.get(mapping.source_name()) {
                Some(&pos) => set.mappings[pos] = mapping,
                None => {
                    set.positions
                        .insert(mapping.source_name().to_string(), set.mappings.len());
                    set.mappings.push(mapping);
                }
            }
        }
        set
    }

    /// Mapping for a source field.
    pub fn get(&self, source_name: &str) -> Option<&FieldMapping> {
        self.positions.get(source_name).map(|&pos| &self.mappings[pos])
    }

    /// Mappings in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldMapping> {
        self.mappings.iter()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

impl FromIterator<FieldMapping> for SchemaSet {
    fn from_iter<I: IntoIterator<Item = FieldMapping>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// A single schema problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// A declared field is absent or null.
    MissingField { field: String },
    /// A declared field does not conform to its type.
    TypeMismatch {
        field: String,
        expected: SemanticType,
    },
    /// Reshaping found no value for a declared field.
    MissingValue { field: String },
}

impl Violation {
    /// Source field the violation is about.
    pub fn field(&self) -> &str {
        match self {
            Violation::MissingField { field }
            | Violation::TypeMismatch { field, .. }
            | Violation::MissingValue { field } => field,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::MissingField { field } => {
                write!(f, "Property {} could not be found at data element", field)
            }
            Violation::TypeMismatch { field, expected } => {
                write!(f, "Data assigned to {} cannot be mapped to a {}", field, expected)
            }
            Violation::MissingValue { field } => {
                write!(f, "A value for {} could not be found", field)
            }
        }
    }
}

/// One or more mapped fields are missing or mistyped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    /// Every problem found, in schema order.
    pub violations: Vec<Violation>,
}

impl SchemaViolation {
    pub fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    pub fn single(violation: Violation) -> Self {
        Self {
            violations: vec![violation],
        }
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", v)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_name_defaults_to_source_name() {
        let mapping = FieldMapping::new("ts", SemanticType::Date);
        assert_eq!(mapping.output_name(), "ts");
        let renamed = mapping.with_output_name("timestamp");
        assert_eq!(renamed.source_name(), "ts");
        assert_eq!(renamed.output_name(), "timestamp");
    }

    #[test]
    fn test_duplicate_source_name_last_write_wins() {
        let set = SchemaSet::new(vec![
            FieldMapping::new("a", SemanticType::Text),
            FieldMapping::new("b", SemanticType::Long),
            FieldMapping::new("a", SemanticType::Keyword),
        ]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.get("a").unwrap().semantic_type(), SemanticType::Keyword);
        let order: Vec<&str> = set.iter().map(|m| m.source_name()).collect();
        assert_eq!(order, vec!["a", "b"]);
    }

    #[test]
    fn test_violation_messages_are_joined() {
        let err = SchemaViolation::new(vec![
            Violation::MissingField { field: "a".into() },
            Violation::TypeMismatch {
                field: "b".into(),
                expected: SemanticType::Integer,
            },
        ]);
        assert_eq!(
            err.to_string(),
            "Property a could not be found at data element, Data assigned to b cannot be mapped to a integer"
        );
    }
}
