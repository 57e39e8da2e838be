//! Date coercion.
//!
//! Strings are parsed with a chrono format pattern. Patterns without an
//! offset specifier are read as local times in the configured zone; patterns
//! containing `%z` carry their own offset. A pattern that only describes a
//! calendar date yields midnight in the configured zone.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};

use crate::config::ParserSettings;
use crate::core::Value;
use crate::error::{LoadError, Result};

use super::{DataType, SemanticType, TypeError};

/// Dates from epoch milliseconds, existing dates or formatted strings.
#[derive(Debug, Clone)]
pub struct DateType {
    format: String,
    offset: FixedOffset,
    locale: String,
}

impl DateType {
    /// Build a date handler from parser settings.
    pub fn new(settings: &ParserSettings) -> Result<Self> {
        let offset = parse_time_zone(&settings.time_zone).ok_or_else(|| {
            LoadError::Config(format!(
                "parser.time_zone must be UTC or a fixed offset like +02:00, got '{}'",
                settings.time_zone
            ))
        })?;
        if !is_valid_locale(&settings.locale) {
            return Err(LoadError::Config(format!(
                "parser.locale must look like 'en' or 'en_US', got '{}'",
                settings.locale
            )));
        }
        if settings.date_format.trim().is_empty() {
            return Err(LoadError::Config("parser.date_format is required".into()));
        }
        Ok(Self {
            format: settings.date_format.clone(),
            offset,
            locale: settings.locale.clone(),
        })
    }

    /// Handler using UTC and the default `%Y-%m-%d %H:%M:%S` format.
    pub fn utc_default() -> Self {
        let settings = ParserSettings::default();
        Self {
            format: settings.date_format,
            offset: Utc.fix(),
            locale: settings.locale,
        }
    }

    /// Format pattern used for strings.
    pub fn format(&self) -> &str {
        &self.format
    }

    /// Offset applied to strings without their own zone.
    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Configured locale tag.
    pub fn locale(&self) -> &str {
        &self.locale
    }

    fn parse_str(&self, raw: &str) -> std::result::Result<DateTime<Utc>, String> {
        if self.format.contains("%z") || self.format.contains("%:z") || self.format.contains("%#z")
        {
            return DateTime::parse_from_str(raw, &self.format)
                .map(|d| d.with_timezone(&Utc))
                .map_err(|e| e.to_string());
        }

        let naive = match NaiveDateTime::parse_from_str(raw, &self.format) {
            Ok(naive) => naive,
            Err(e) => NaiveDate::parse_from_str(raw, &self.format)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .ok_or_else(|| e.to_string())?,
        };

        self.offset
            .from_local_datetime(&naive)
            .single()
            .map(|d| d.with_timezone(&Utc))
            .ok_or_else(|| format!("'{}' has no single instant in {}", raw, self.offset))
    }
}

impl DataType for DateType {
    fn semantic_type(&self) -> SemanticType {
        SemanticType::Date
    }

    fn is_a(&self, value: &Value) -> bool {
        matches!(value, Value::Date(_))
    }

    fn coerce(&self, value: &Value) -> std::result::Result<Value, TypeError> {
        match value {
            Value::Date(d) => Ok(Value::Date(*d)),
            Value::Int(_) | Value::Long(_) => {
                let millis = value.as_integer().unwrap_or_default();
                Utc.timestamp_millis_opt(millis)
                    .single()
                    .map(Value::Date)
                    .ok_or_else(|| {
                        TypeError::new(value, SemanticType::Date, "epoch milliseconds out of range")
                    })
            }
            Value::Text(raw) => self
                .parse_str(raw)
                .map(Value::Date)
                .map_err(|reason| TypeError::new(value, SemanticType::Date, reason)),
            _ => Err(TypeError::new(
                value,
                SemanticType::Date,
                "expected epoch milliseconds, a date or a formatted string",
            )),
        }
    }
}

/// Parse a zone name into a fixed offset.
///
/// Accepts `UTC`, `GMT`, `Z` and offsets such as `+02:00`, `-0530`, `+01`
/// optionally prefixed with `UTC` or `GMT`.
pub fn parse_time_zone(zone: &str) -> Option<FixedOffset> {
    let zone = zone.trim();
    let upper = zone.to_ascii_uppercase();
    if matches!(upper.as_str(), "UTC" | "GMT" | "Z") {
        return Some(Utc.fix());
    }

    let rest = upper
        .strip_prefix("UTC")
        .or_else(|| upper.strip_prefix("GMT"))
        .unwrap_or(&upper);
    if !rest.is_ascii() {
        return None;
    }

    let (sign, digits) = match rest.chars().next()? {
        '+' => (1, &rest[1..]),
        '-' => (-1, &rest[1..]),
        _ => return None,
    };

    let (hours, minutes) = match digits.split_once(':') {
        Some((h, m)) => (h, m),
        None if digits.len() == 4 => digits.split_at(2),
        None => (digits, "0"),
    };
    if hours.is_empty() || hours.len() > 2 || minutes.len() > 2 {
        return None;
    }
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 18 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Check a locale tag of the form `ll`, `ll_CC` or `ll-CC`.
pub fn is_valid_locale(locale: &str) -> bool {
    let mut parts = locale.split(['_', '-']);
    let language = parts.next().unwrap_or_default();
    let language_ok = (2..=3).contains(&language.len())
        && language.chars().all(|c| c.is_ascii_lowercase());
    let region_ok = match parts.next() {
        None => true,
        Some(region) => {
            (region.len() == 2 && region.chars().all(|c| c.is_ascii_uppercase()))
                || (region.len() == 3 && region.chars().all(|c| c.is_ascii_digit()))
        }
    };
    language_ok && region_ok && parts.next().is_none()
}
