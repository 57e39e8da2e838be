use std::sync::Arc;

use crate::core::{Document, Value};
use crate::datatype::TypeRegistry;

use super::{SchemaSet, SchemaViolation, Violation};

/// Checks documents against a schema and reports every problem at once.
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    registry: Arc<TypeRegistry>,
}

impl SchemaValidator {
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self { registry }
    }

    /// Validate one document.
    ///
    /// Absent and null fields are reported as missing; present fields whose
    /// value does not already conform to the declared type are reported as
    /// mismatches. Fields not in the schema are ignored.
    pub fn validate(
        &self,
        document: &Document,
        schema: &SchemaSet,
    ) -> Result<(), SchemaViolation> {
        let violations: Vec<Violation> = schema
            .iter()
            .filter_map(|mapping| match document.get(mapping.source_name()) {
                None | Some(Value::Null) => Some(Violation::MissingField {
                    field: mapping.source_name().to_string(),
                }),
                Some(value) if !self.registry.is_a(mapping.semantic_type(), value) => {
                    Some(Violation::TypeMismatch {
                        field: mapping.source_name().to_string(),
                        expected: mapping.semantic_type(),
                    })
                }
                Some(_) => None,
            })
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(SchemaViolation::new(violations))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Properties;
    use crate::datatype::SemanticType;
    use crate::schema::FieldMapping;

    fn validator() -> SchemaValidator {
        SchemaValidator::new(Arc::new(TypeRegistry::with_defaults()))
    }

    fn schema() -> SchemaSet {
        SchemaSet::new(vec![
            FieldMapping::new("name", SemanticType::Text),
            FieldMapping::new("age", SemanticType::Integer),
            FieldMapping::new("ip", SemanticType::Ip),
            FieldMapping::new("active", SemanticType::Boolean),
            FieldMapping::new("tags", SemanticType::Completion),
        ])
    }

    #[test]
    fn test_conforming_document_passes() {
        let doc = Document::new("1", Properties::new())
            .with("name", "ada")
            .with("age", 36i32)
            .with("ip", "10.0.0.1")
            .with("active", true)
            .with("tags", "math pioneer")
            .with("extra", "ignored");
        assert!(validator().validate(&doc, &schema()).is_ok());
    }

    #[test]
    fn test_aggregates_all_violations() {
        // missing: ip, active; mistyped: age
        let doc = Document::new("2", Properties::new())
            .with("name", "bob")
            .with("age", "forty")
            .with("tags", "x");
        let err = validator().validate(&doc, &schema()).unwrap_err();
        assert_eq!(err.violations.len(), 3);
        assert_eq!(
            err.violations,
            vec![
                Violation::TypeMismatch {
                    field: "age".into(),
                    expected: SemanticType::Integer
                },
                Violation::MissingField { field: "ip".into() },
                Violation::MissingField {
                    field: "active".into()
                },
            ]
        );
    }

    #[test]
    fn test_null_counts_as_missing() {
        let set = SchemaSet::new(vec![FieldMapping::new("a", SemanticType::Text)]);
        let doc = Document::new("3", Properties::new()).with("a", Value::Null);
        let err = validator().validate(&doc, &set).unwrap_err();
        assert_eq!(err.violations, vec![Violation::MissingField { field: "a".into() }]);
    }
}
