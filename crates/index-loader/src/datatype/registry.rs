use std::collections::HashMap;

use crate::config::ParserSettings;
use crate::core::Value;
use crate::error::Result;

use super::{
    BooleanType, CompletionType, DataType, DateType, IpType, NumericType, SemanticType,
    TextType, TypeError,
};

/// Flat lookup table from semantic type to its handler.
///
/// Built once per run and read-only afterwards, so it can be shared across
/// tasks behind an `Arc`.
pub struct TypeRegistry {
    types: HashMap<SemanticType, Box<dyn DataType>>,
}

impl TypeRegistry {
    /// Build the registry, configuring date parsing from `settings`.
    pub fn new(settings: &ParserSettings) -> Result<Self> {
        Ok(Self::with_date_type(DateType::new(settings)?))
    }

    /// Registry with UTC dates in the default format.
    pub fn with_defaults() -> Self {
        Self::with_date_type(DateType::utc_default())
    }

    fn with_date_type(date: DateType) -> Self {
        let handlers: Vec<Box<dyn DataType>> = vec![
            Box::new(BooleanType),
            Box::new(CompletionType),
            Box::new(TextType::keyword()),
            Box::new(date),
            Box::new(TextType::text()),
            Box::new(NumericType::long()),
            Box::new(NumericType::integer()),
            Box::new(NumericType::short()),
            Box::new(NumericType::byte()),
            Box::new(NumericType::double()),
            Box::new(NumericType::float()),
            Box::new(IpType),
        ];
        let types = handlers
            .into_iter()
            .map(|h| (h.semantic_type(), h))
            .collect();
        Self { types }
    }

    /// Handler for a semantic type.
    pub fn get(&self, ty: SemanticType) -> Option<&dyn DataType> {
        self.types.get(&ty).map(|h| h.as_ref())
    }

    /// Whether `value` already conforms to `ty`.
    pub fn is_a(&self, ty: SemanticType, value: &Value) -> bool {
        self.get(ty).map(|h| h.is_a(value)).unwrap_or(false)
    }

    /// Coerce `value` to `ty`.
    pub fn coerce(
        &self,
        ty: SemanticType,
        value: &Value,
    ) -> std::result::Result<Value, TypeError> {
        match self.get(ty) {
            Some(handler) => handler.coerce(value),
            None => Err(TypeError::new(value, ty, "no handler registered")),
        }
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.types.keys().map(|t| t.as_str()).collect();
        names.sort_unstable();
        f.debug_struct("TypeRegistry").field("types", &names).finish()
    }
}
