use crate::core::Value;

use super::{DataType, SemanticType, TypeError};

/// Booleans, with `"true"`/`"false"` strings and `1`/`0` integers.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanType;

impl BooleanType {
    fn from_number(value: &Value, n: i64) -> Result<Value, TypeError> {
        match n {
            1 => Ok(Value::Bool(true)),
            0 => Ok(Value::Bool(false)),
            _ => Err(TypeError::new(
                value,
                SemanticType::Boolean,
                "only 1 and 0 map to a boolean",
            )),
        }
    }
}

impl DataType for BooleanType {
    fn semantic_type(&self) -> SemanticType {
        SemanticType::Boolean
    }

    fn is_a(&self, value: &Value) -> bool {
        matches!(value, Value::Bool(_))
    }

    fn coerce(&self, value: &Value) -> Result<Value, TypeError> {
        match value {
            Value::Bool(b) => Ok(Value::Bool(*b)),
            Value::Text(s) if s.eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
            Value::Text(s) if s.eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
            Value::Text(s) => match s.parse::<i32>() {
                Ok(n) => Self::from_number(value, i64::from(n)),
                Err(_) => Err(TypeError::new(
                    value,
                    SemanticType::Boolean,
                    "expected true, false, 1 or 0",
                )),
            },
            other => match other.as_integer() {
                Some(n) => Self::from_number(value, n),
                None => Err(TypeError::new(
                    value,
                    SemanticType::Boolean,
                    "expected a boolean, a string or an integer",
                )),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coerce(value: impl Into<Value>) -> Result<Value, TypeError> {
        BooleanType.coerce(&value.into())
    }

    #[test]
    fn test_strings_are_case_insensitive() {
        assert_eq!(coerce("TRUE").unwrap(), Value::Bool(true));
        assert_eq!(coerce("false").unwrap(), Value::Bool(false));
        assert_eq!(coerce("True").unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(coerce(1i32).unwrap(), Value::Bool(true));
        assert_eq!(coerce(0i64).unwrap(), Value::Bool(false));
        assert_eq!(coerce("1").unwrap(), Value::Bool(true));
        assert!(coerce(2i32).is_err());
        assert!(coerce("2").is_err());
    }

    #[test]
    fn test_rejects_other_values() {
        assert!(coerce("yes").is_err());
        assert!(coerce(1.0f64).is_err());
        assert!(BooleanType.coerce(&Value::Null).is_err());
    }

    #[test]
    fn test_is_a_requires_native_boolean() {
        assert!(BooleanType.is_a(&Value::Bool(false)));
        assert!(!BooleanType.is_a(&Value::from("true")));
        assert!(!BooleanType.is_a(&Value::Int(1)));
    }
}
