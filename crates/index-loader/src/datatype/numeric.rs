use crate::core::Value;

use super::{DataType, SemanticType, TypeError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Width {
    Byte,
    Short,
    Integer,
    Long,
    Float,
    Double,
}

/// Fixed-width integer and floating point types.
///
/// A value of exactly the target width passes through. Strings are parsed at
/// that width. Everything else, including a number of a different width, is
/// rejected.
#[derive(Debug, Clone, Copy)]
pub struct NumericType {
    width: Width,
}

impl NumericType {
    pub fn byte() -> Self {
        Self { width: Width::Byte }
    }

    pub fn short() -> Self {
        Self { width: Width::Short }
    }

    pub fn integer() -> Self {
        Self {
            width: Width::Integer,
        }
    }

    pub fn long() -> Self {
        Self { width: Width::Long }
    }

    pub fn float() -> Self {
        Self { width: Width::Float }
    }

    pub fn double() -> Self {
        Self {
            width: Width::Double,
        }
    }

    fn parse(&self, raw: &str) -> Result<Value, String> {
        match self.width {
            Width::Byte => raw.parse::<i8>().map(Value::Byte).map_err(|e| e.to_string()),
            Width::Short => raw.parse::<i16>().map(Value::Short).map_err(|e| e.to_string()),
            Width::Integer => raw.parse::<i32>().map(Value::Int).map_err(|e| e.to_string()),
            Width::Long => raw.parse::<i64>().map(Value::Long).map_err(|e| e.to_string()),
            Width::Float => raw.parse::<f32>().map(Value::Float).map_err(|e| e.to_string()),
            Width::Double => raw.parse::<f64>().map(Value::Double).map_err(|e| e.to_string()),
        }
    }
}

impl DataType for NumericType {
    fn semantic_type(&self) -> SemanticType {
        match self.width {
            Width::Byte => SemanticType::Byte,
            Width::Short => SemanticType::Short,
            Width::Integer => SemanticType::Integer,
            Width::Long => SemanticType::Long,
            Width::Float => SemanticType::Float,
            Width::Double => SemanticType::Double,
        }
    }

    fn is_a(&self, value: &Value) -> bool {
        matches!(
            (self.width, value),
            (Width::Byte, Value::Byte(_))
                | (Width::Short, Value::Short(_))
                | (Width::Integer, Value::Int(_))
                | (Width::Long, Value::Long(_))
                | (Width::Float, Value::Float(_))
                | (Width::Double, Value::Double(_))
        )
    }

    fn coerce(&self, value: &Value) -> Result<Value, TypeError> {
        if self.is_a(value) {
            return Ok(value.clone());
        }
        match value {
            Value::Text(raw) => self
                .parse(raw)
                .map_err(|reason| TypeError::new(value, self.semantic_type(), reason)),
            _ => Err(TypeError::new(
                value,
                self.semantic_type(),
                format!("expected a {} or a numeric string", self.semantic_type()),
            )),
        }
    }
}
