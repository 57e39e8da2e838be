use crate::core::{Properties, Value};

use super::{DataType, SemanticType, TypeError};

/// Key holding the suggestion inputs in a completion value.
pub const COMPLETION_INPUT: &str = "input";

/// Expand a phrase into its left-to-right term suffixes.
///
/// `"quick brown fox"` becomes `["quick brown fox", "brown fox", "fox"]`.
/// Blank input yields no terms.
pub fn completion_terms(phrase: &str) -> Vec<String> {
    let words: Vec<&str> = phrase.split_whitespace().collect();
    (0..words.len()).map(|i| words[i..].join(" ")).collect()
}

/// Autocomplete suggestions, always coerced to `{"input": [terms...]}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompletionType;

impl CompletionType {
    fn input_map(terms: Vec<Value>, mut extra: Properties) -> Value {
        extra.insert(COMPLETION_INPUT.to_string(), Value::List(terms));
        Value::Map(extra)
    }

    /// Flatten list elements into text terms.
    fn collect_terms(
        &self,
        root: &Value,
        items: &[Value],
        out: &mut Vec<Value>,
    ) -> Result<(), TypeError> {
        for item in items {
            match item {
                Value::Text(s) => out.push(Value::Text(s.clone())),
                Value::List(nested) => self.collect_terms(root, nested, out)?,
                Value::Map(map) => match map.get(COMPLETION_INPUT) {
                    Some(Value::Text(s)) => out.push(Value::Text(s.clone())),
                    Some(Value::List(nested)) => self.collect_terms(root, nested, out)?,
                    _ => {
                        return Err(TypeError::new(
                            root,
                            SemanticType::Completion,
                            "nested map has no usable input",
                        ))
                    }
                },
                Value::Null | Value::Date(_) => {
                    return Err(TypeError::new(
                        root,
                        SemanticType::Completion,
                        format!("list element of kind {} is not a term", item.kind()),
                    ))
                }
                scalar => out.push(Value::Text(scalar.to_string())),
            }
        }
        Ok(())
    }
}

impl DataType for CompletionType {
    fn semantic_type(&self) -> SemanticType {
        SemanticType::Completion
    }

    fn is_a(&self, value: &Value) -> bool {
        match value {
            Value::Text(_) => true,
            Value::Map(map) => match map.get(COMPLETION_INPUT) {
                Some(Value::Text(_)) => true,
                Some(Value::List(items)) => items.iter().all(|i| matches!(i, Value::Text(_))),
                _ => false,
            },
            Value::List(items) => items.iter().all(|i| self.is_a(i)),
            _ => false,
        }
    }

    fn coerce(&self, value: &Value) -> Result<Value, TypeError> {
        match value {
            Value::Text(phrase) => Ok(Self::input_map(
                completion_terms(phrase).into_iter().map(Value::Text).collect(),
                Properties::new(),
            )),
            Value::List(items) => {
                let mut terms = Vec::with_capacity(items.len());
                self.collect_terms(value, items, &mut terms)?;
                Ok(Self::input_map(terms, Properties::new()))
            }
            Value::Map(map) => {
                let mut extra = map.clone();
                let terms = match extra.remove(COMPLETION_INPUT) {
                    Some(Value::Text(s)) => vec![Value::Text(s)],
                    Some(Value::List(items)) => {
                        let mut terms = Vec::with_capacity(items.len());
                        self.collect_terms(value, &items, &mut terms)?;
                        terms
                    }
                    _ => {
                        return Err(TypeError::new(
                            value,
                            SemanticType::Completion,
                            "map must hold a string or a list of strings under 'input'",
                        ))
                    }
                };
                Ok(Self::input_map(terms, extra))
            }
            _ => Err(TypeError::new(
                value,
                SemanticType::Completion,
                "expected a string, a list of strings or an input map",
            )),
        }
    }
}
