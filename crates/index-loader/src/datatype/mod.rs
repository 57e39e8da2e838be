//! Semantic data types and value coercion.
//!
//! Every mapped field declares a [`SemanticType`]. The [`TypeRegistry`] holds
//! one [`DataType`] handler per semantic type and is built once per run, so
//! dispatch is a table lookup rather than a runtime type inspection.
//!
//! | Type | Accepts |
//! |------|---------|
//! | `boolean` | booleans, `"true"`/`"false"` (any case), integers `1`/`0` and their string forms |
//! | `byte`..`long`, `float`, `double` | the exact width, or a string parsed at that width |
//! | `text`, `keyword` | anything non-null, rendered as text |
//! | `date` | epoch milliseconds, dates, or strings in the configured format |
//! | `ip` | strings holding an IPv4 or IPv6 literal |
//! | `completion` | strings (expanded to suffixes), string lists, `{input: ...}` maps |

mod boolean;
mod completion;
mod date;
mod ip;
mod numeric;
mod registry;
mod text;

pub use boolean::BooleanType;
pub use completion::{completion_terms, CompletionType, COMPLETION_INPUT};
pub use date::{is_valid_locale, parse_time_zone, DateType};
pub use ip::IpType;
pub use numeric::NumericType;
pub use registry::TypeRegistry;
pub use text::TextType;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::Value;

/// Closed set of semantic types a field can be mapped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    Boolean,
    Completion,
    Keyword,
    Date,
    Text,
    Long,
    Integer,
    Short,
    Byte,
    Double,
    Float,
    Ip,
}

impl SemanticType {
    /// Every semantic type, in declaration order.
    pub const ALL: [SemanticType; 12] = [
        SemanticType::Boolean,
        SemanticType::Completion,
        SemanticType::Keyword,
        SemanticType::Date,
        SemanticType::Text,
        SemanticType::Long,
        SemanticType::Integer,
        SemanticType::Short,
        SemanticType::Byte,
        SemanticType::Double,
        SemanticType::Float,
        SemanticType::Ip,
    ];

    /// Lowercase name, as used in configuration and index mappings.
    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticType::Boolean => "boolean",
            SemanticType::Completion => "completion",
            SemanticType::Keyword => "keyword",
            SemanticType::Date => "date",
            SemanticType::Text => "text",
            SemanticType::Long => "long",
            SemanticType::Integer => "integer",
            SemanticType::Short => "short",
            SemanticType::Byte => "byte",
            SemanticType::Double => "double",
            SemanticType::Float => "float",
            SemanticType::Ip => "ip",
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SemanticType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        SemanticType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == lower)
            .ok_or_else(|| format!("unknown semantic type '{}'", s))
    }
}

/// A value could not be coerced to its declared semantic type.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Value '{value}' ({kind}) cannot be coerced to {target}: {reason}")]
pub struct TypeError {
    /// Rendered offending value.
    pub value: String,
    /// Runtime kind of the offending value.
    pub kind: &'static str,
    /// Type the value was declared as.
    pub target: SemanticType,
    /// Why the coercion failed.
    pub reason: String,
}

impl TypeError {
    /// Create a TypeError for `value`.
    pub fn new(value: &Value, target: SemanticType, reason: impl Into<String>) -> Self {
        Self {
            value: value.to_string(),
            kind: value.kind(),
            target,
            reason: reason.into(),
        }
    }
}

/// Parse and validation rules for one semantic type.
pub trait DataType: Send + Sync {
    /// The semantic type this handler implements.
    fn semantic_type(&self) -> SemanticType;

    /// Whether `value` already has the shape this type produces.
    fn is_a(&self, value: &Value) -> bool;

    /// Coerce `value` into this type.
    ///
    /// Coercing an already-coerced value returns an equal value.
    fn coerce(&self, value: &Value) -> Result<Value, TypeError>;
}
