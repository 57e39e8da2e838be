//! Configuration validation.

use std::collections::HashSet;

use super::Config;
use crate::datatype::{is_valid_locale, parse_time_zone};
use crate::error::{LoadError, Result};
use crate::schema::SchemaSet;

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    // Source validation
    if config.source.dir.as_os_str().is_empty() {
        return Err(LoadError::Config("source.dir is required".into()));
    }

    // Target validation
    if config.target.url.is_empty() {
        return Err(LoadError::Config("target.url is required".into()));
    }
    if let Err(e) = reqwest::Url::parse(&config.target.url) {
        return Err(LoadError::Config(format!(
            "target.url '{}' is not a valid URL: {}",
            config.target.url, e
        )));
    }
    if config.target.index.is_empty() {
        return Err(LoadError::Config("target.index is required".into()));
    }
    if config.target.password.is_some() && config.target.username.is_none() {
        return Err(LoadError::Config(
            "target.password requires target.username".into(),
        ));
    }
    if config.target.request_timeout_secs == 0 {
        return Err(LoadError::Config(
            "target.request_timeout_secs must be at least 1".into(),
        ));
    }

    // Parser validation
    if parse_time_zone(&config.parser.time_zone).is_none() {
        return Err(LoadError::Config(format!(
            "parser.time_zone must be UTC or a fixed offset like +02:00, got '{}'",
            config.parser.time_zone
        )));
    }
    if !is_valid_locale(&config.parser.locale) {
        return Err(LoadError::Config(format!(
            "parser.locale must look like 'en' or 'en_US', got '{}'",
            config.parser.locale
        )));
    }
    if config.parser.date_format.trim().is_empty() {
        return Err(LoadError::Config("parser.date_format is required".into()));
    }

    // Bulk and queue validation
    if config.bulk.max_elements_per_bulk <= 0 {
        return Err(LoadError::Config(
            "bulk.max_elements_per_bulk must be at least 1".into(),
        ));
    }
    if config.queue.capacity > 0 && config.queue.timeout_ms == 0 {
        return Err(LoadError::Config(
            "queue.timeout_ms must be at least 1 when queue.capacity is set".into(),
        ));
    }

    // Backup validation
    if let Some(backup) = &config.backup {
        if backup.dir.as_os_str().is_empty() {
            return Err(LoadError::Config("backup.dir is required".into()));
        }
        if let Some(0) = backup.timeout_ms {
            return Err(LoadError::Config(
                "backup.timeout_ms must be at least 1".into(),
            ));
        }
    }

    // Mapping validation
    if config.mappings.is_empty() {
        return Err(LoadError::Config(
            "mappings must declare at least one field".into(),
        ));
    }
    for (i, mapping) in config.mappings.iter().enumerate() {
        if mapping.name.is_empty() {
            return Err(LoadError::Config(format!(
                "mappings[{}].name is required",
                i
            )));
        }
        if let Some(output) = &mapping.output_name {
            if output.is_empty() {
                return Err(LoadError::Config(format!(
                    "mappings[{}].output_name cannot be empty",
                    i
                )));
            }
        }
    }

    // A repeated source name replaces the earlier mapping, so only the
    // effective mappings can collide on output.
    let schema = SchemaSet::new(config.field_mappings());
    let mut outputs = HashSet::new();
    for mapping in schema.iter() {
        if !outputs.insert(mapping.output_name()) {
            return Err(LoadError::Config(format!(
                "mapping '{}' writes output field '{}' more than once",
                mapping.source_name(),
                mapping.output_name()
            )));
        }
    }

    Ok(())
}
