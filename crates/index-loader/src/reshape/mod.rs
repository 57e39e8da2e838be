//! Turning raw documents into index-ready property maps.
//!
//! Unlike [`SchemaValidator`](crate::schema::SchemaValidator), which collects
//! every problem for a pre-flight report, the reshaper is the enforcement
//! point: the first missing value or failed coercion rejects the whole page.

use std::sync::Arc;

use tracing::debug;

use crate::core::{Document, Properties, ReshapedBatch, Value};
use crate::datatype::TypeRegistry;
use crate::error::Result;
use crate::schema::{SchemaSet, SchemaViolation, Violation};

/// Applies a schema's coercions and renames to pages of documents.
#[derive(Debug, Clone)]
pub struct Reshaper {
    registry: Arc<TypeRegistry>,
    index_type: Option<String>,
}

impl Reshaper {
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self {
            registry,
            index_type: None,
        }
    }

    /// Tag every batch with the type the sink groups documents under.
    pub fn with_index_type(mut self, index_type: Option<String>) -> Self {
        self.index_type = index_type;
        self
    }

    /// Reshape a single document.
    pub fn reshape_document(&self, document: &Document, schema: &SchemaSet) -> Result<Properties> {
        let mut output = Properties::new();
        for mapping in schema.iter() {
            let raw = match document.get(mapping.source_name()) {
                None | Some(Value::Null) => {
                    return Err(SchemaViolation::single(Violation::MissingValue {
                        field: mapping.source_name().to_string(),
                    })
                    .into())
                }
                Some(raw) => raw,
            };
            let coerced = self.registry.coerce(mapping.semantic_type(), raw)?;
            output.insert(mapping.output_name().to_string(), coerced);
        }
        Ok(output)
    }

    /// Reshape a page of documents, failing on the first problem.
    pub fn reshape(&self, documents: &[Document], schema: &SchemaSet) -> Result<ReshapedBatch> {
        let reshaped = documents
            .iter()
            .map(|doc| self.reshape_document(doc, schema))
            .collect::<Result<Vec<_>>>()?;
        debug!("Reshaped {} documents", reshaped.len());
        Ok(ReshapedBatch {
            documents: reshaped,
            index_type: self.index_type.clone(),
        })
    }
}
