use std::net::IpAddr;

use crate::core::Value;

use super::{DataType, SemanticType, TypeError};

/// IPv4 and IPv6 literals. Validation only: the text is kept as given.
#[derive(Debug, Clone, Copy, Default)]
pub struct IpType;

impl DataType for IpType {
    fn semantic_type(&self) -> SemanticType {
        SemanticType::Ip
    }

    fn is_a(&self, value: &Value) -> bool {
        value
            .as_str()
            .map(|s| s.parse::<IpAddr>().is_ok())
            .unwrap_or(false)
    }

    fn coerce(&self, value: &Value) -> Result<Value, TypeError> {
        match value {
            Value::Text(s) => match s.parse::<IpAddr>() {
                Ok(_) => Ok(value.clone()),
                Err(e) => Err(TypeError::new(value, SemanticType::Ip, e.to_string())),
            },
            _ => Err(TypeError::new(
                value,
                SemanticType::Ip,
                "expected a string holding an IP address",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_v4_and_v6() {
        assert!(IpType.is_a(&Value::from("192.168.0.1")));
        assert!(IpType.is_a(&Value::from("::1")));
        assert_eq!(
            IpType.coerce(&Value::from("2001:db8::ff00:42:8329")).unwrap(),
            Value::from("2001:db8::ff00:42:8329")
        );
    }

    #[test]
    fn test_rejects_invalid_literals() {
        assert!(IpType.coerce(&Value::from("256.1.1.1")).is_err());
        assert!(IpType.coerce(&Value::from("localhost")).is_err());
        assert!(IpType.coerce(&Value::Long(3_232_235_521)).is_err());
    }
}
