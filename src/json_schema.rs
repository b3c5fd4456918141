//! JSON Schema generation for CLI output types.
//!
//! Covers every command that supports --json output; exported via the
//! `schema` subcommand.

use schemars::{schema_for, Schema};
use std::collections::BTreeMap;

/// All schemas, keyed by command name. BTreeMap keeps the output diffable.
pub fn all_schemas() -> BTreeMap<&'static str, Schema> {
    let mut schemas = BTreeMap::new();
    schemas.insert(
        "generate",
        schema_for!(crate::cmd::GenerateJsonOutput),
    );
    schemas.insert("plan", schema_for!(crate::cmd::PlanJsonOutput));
    schemas.insert("verify", schema_for!(crate::cmd::VerifyJsonOutput));
    schemas
}

/// Generate a single schema by command name.
pub fn get_schema(command: &str) -> Option<Schema> {
    all_schemas().remove(command)
}

/// List all available schema names.
pub fn schema_names() -> Vec<&'static str> {
    all_schemas().keys().copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_names() {
        assert_eq!(schema_names(), vec!["generate", "plan", "verify"]);
    }

    #[test]
    fn test_generate_schema_describes_statistics() {
        let schema = get_schema("generate").unwrap();
        let value = serde_json::to_value(&schema).unwrap();
        let text = value.to_string();
        assert!(text.contains("statistics"));
        assert!(text.contains("per_tier"));
        assert!(get_schema("split").is_none());
    }
}
