//! Document sources.
//!
//! [`JsonDirectorySource`] treats every `*.json` file in a directory as one
//! reader. Each file holds a single top-level JSON array of objects.

mod json;

pub use json::{JsonDirectorySource, JsonFileReader};
