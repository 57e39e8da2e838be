use crate::core::Value;

use super::{DataType, SemanticType, TypeError};

/// Free text and keywords. Any non-null value renders to its text form.
#[derive(Debug, Clone, Copy)]
pub struct TextType {
    semantic_type: SemanticType,
}

impl TextType {
    pub fn text() -> Self {
        Self {
            semantic_type: SemanticType::Text,
        }
    }

    pub fn keyword() -> Self {
        Self {
            semantic_type: SemanticType::Keyword,
        }
    }
}

impl DataType for TextType {
    fn semantic_type(&self) -> SemanticType {
        self.semantic_type
    }

    fn is_a(&self, value: &Value) -> bool {
        matches!(value, Value::Text(_))
    }

    fn coerce(&self, value: &Value) -> Result<Value, TypeError> {
        match value {
            Value::Null => Err(TypeError::new(value, self.semantic_type, "value is null")),
            Value::Text(s) => Ok(Value::Text(s.clone())),
            other => Ok(Value::Text(other.to_string())),
        }
    }
}
