//! Documents before and after reshaping.

use serde::Serialize;

use super::value::{Properties, Value};

/// A raw document as produced by a reader.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Opaque identifier assigned by the reader.
    pub id: String,
    /// Untyped properties keyed by source field name.
    pub properties: Properties,
}

impl Document {
    /// Create a document from an identifier and its properties.
    pub fn new(id: impl Into<String>, properties: Properties) -> Self {
        Self {
            id: id.into(),
            properties,
        }
    }

    /// Look up a raw property by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Add a property, replacing any previous value.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }
}

/// The index-ready output of one page.
///
/// Each entry is keyed by output field name and holds coerced values only.
/// A batch is never mutated after the reshaper builds it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReshapedBatch {
    /// Output property maps, in reader order.
    pub documents: Vec<Properties>,
    /// Type the sink groups documents under, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_type: Option<String>,
}

impl ReshapedBatch {
    /// Number of documents in the batch.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Check if the batch has no documents.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
