// SPDX-FileCopyrightText: 2026 Atlas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin settings checked against the manifest's config schema.
//!
//! Findings are advisory. The runtime logs them and passes the settings to
//! the plugin unchanged.

use std::collections::BTreeMap;
use std::fmt;

use atlas_core::{ConfigSchema, SchemaType};
use serde_json::{Map, Value};

/// Placeholder written over secret values before they are logged.
pub const REDACTED: &str = "[REDACTED]";

/// One mismatch between settings and schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsIssue {
    /// Dotted path to the offending setting, e.g. `auth.token` or `tags[2]`.
    pub path: String,
    pub message: String,
}

impl fmt::Display for SettingsIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Checks settings against a schema and returns every issue found.
pub fn check_settings(
    schema: &BTreeMap<String, ConfigSchema>,
    settings: &Map<String, Value>,
) -> Vec<SettingsIssue> {
    let mut issues = Vec::new();
    check_object("", schema, settings, &mut issues);
    issues
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn check_object(
    prefix: &str,
    schema: &BTreeMap<String, ConfigSchema>,
    settings: &Map<String, Value>,
    issues: &mut Vec<SettingsIssue>,
) {
    for (name, field) in schema {
        let path = join(prefix, name);
        match settings.get(name) {
            Some(value) => check_value(&path, field, value, issues),
            None if field.required && field.default.is_none() => issues.push(SettingsIssue {
                path,
                message: "required setting is missing".to_string(),
            }),
            None => {}
        }
    }

    for key in settings.keys() {
        if !schema.contains_key(key) {
            issues.push(SettingsIssue {
                path: join(prefix, key),
                message: "setting is not declared in the plugin's config schema".to_string(),
            });
        }
    }
}

fn matches_type(kind: SchemaType, value: &Value) -> bool {
    match kind {
        SchemaType::String => value.is_string(),
        SchemaType::Number => value.is_number(),
        SchemaType::Integer => value.is_i64() || value.is_u64(),
        SchemaType::Boolean => value.is_boolean(),
        SchemaType::Array => value.is_array(),
        SchemaType::Object => value.is_object(),
    }
}

fn check_value(path: &str, field: &ConfigSchema, value: &Value, issues: &mut Vec<SettingsIssue>) {
    if !matches_type(field.kind, value) {
        issues.push(SettingsIssue {
            path: path.to_string(),
            message: format!("expected {}", field.kind),
        });
        return;
    }

    match value {
        Value::Array(items) => {
            if let Some(item_schema) = &field.items {
                for (index, item) in items.iter().enumerate() {
                    check_value(&format!("{path}[{index}]"), item_schema, item, issues);
                }
            }
        }
        Value::Object(object) => {
            if let Some(properties) = &field.properties {
                check_object(path, properties, object, issues);
            }
        }
        _ => {}
    }
}

/// Copy of `settings` with every schema-marked secret replaced by [`REDACTED`].
pub fn redact_secrets(
    schema: &BTreeMap<String, ConfigSchema>,
    settings: &Map<String, Value>,
) -> Map<String, Value> {
    let mut redacted = settings.clone();
    for (name, field) in schema {
        if let Some(value) = redacted.get_mut(name) {
            redact_value(field, value);
        }
    }
    redacted
}

fn redact_value(field: &ConfigSchema, value: &mut Value) {
    if field.secret {
        *value = Value::String(REDACTED.to_string());
        return;
    }
    match (value, &field.properties, &field.items) {
        (Value::Object(inner), Some(properties), _) => *inner = redact_secrets(properties, inner),
        (Value::Array(elements), _, Some(item_schema)) => {
            for element in elements {
                redact_value(item_schema, element);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> BTreeMap<String, ConfigSchema> {
        serde_json::from_value(json!({
            "token": { "type": "string", "required": true, "secret": true },
            "depth": { "type": "integer", "default": 2 },
            "tags": { "type": "array", "items": { "type": "string" } },
            "auth": {
                "type": "object",
                "properties": {
                    "user": { "type": "string", "required": true },
                    "password": { "type": "string", "secret": true }
                }
            }
        }))
        .unwrap()
    }

    fn settings(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn valid_settings_have_no_issues() {
        let issues = check_settings(
            &schema(),
            &settings(json!({
                "token": "t",
                "depth": 3,
                "tags": ["a", "b"],
                "auth": { "user": "u", "password": "p" }
            })),
        );
        assert!(issues.is_empty(), "{issues:?}");
    }

    #[test]
    fn every_issue_is_reported_with_its_path() {
        let issues = check_settings(
            &schema(),
            &settings(json!({
                "depth": 1.5,
                "tags": ["a", 7],
                "auth": {},
                "extra": true
            })),
        );
        let paths: Vec<&str> = issues.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, vec!["auth.user", "depth", "tags[1]", "token", "extra"]);
        assert!(issues[1].to_string().contains("expected integer"));
    }

    #[test]
    fn required_with_default_may_be_omitted() {
        let schema: BTreeMap<String, ConfigSchema> = serde_json::from_value(json!({
            "mode": { "type": "string", "required": true, "default": "fast" }
        }))
        .unwrap();
        assert!(check_settings(&schema, &Map::new()).is_empty());
    }

    #[test]
    fn secrets_are_redacted_recursively() {
        let redacted = redact_secrets(
            &schema(),
            &settings(json!({
                "token": "sk-123",
                "depth": 3,
                "auth": { "user": "u", "password": "hunter2" }
            })),
        );
        assert_eq!(redacted["token"], REDACTED);
        assert_eq!(redacted["depth"], 3);
        assert_eq!(redacted["auth"]["user"], "u");
        assert_eq!(redacted["auth"]["password"], REDACTED);
    }

    #[test]
    fn secrets_inside_array_elements_are_redacted() {
        let schema: BTreeMap<String, ConfigSchema> = serde_json::from_value(json!({
            "accounts": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "user": { "type": "string" },
                        "password": { "type": "string", "secret": true }
                    }
                }
            },
            "keys": { "type": "array", "items": { "type": "string", "secret": true } }
        }))
        .unwrap();

        let redacted = redact_secrets(
            &schema,
            &settings(json!({
                "accounts": [{ "user": "a", "password": "hunter2" }, { "user": "b" }],
                "keys": ["k1", "k2"]
            })),
        );

        assert_eq!(
            Value::Object(redacted),
            json!({
                "accounts": [{ "user": "a", "password": REDACTED }, { "user": "b" }],
                "keys": [REDACTED, REDACTED]
            })
        );
    }
}
