//! Conversion between XML trees and the REST API's JSON "dict" shape.
//!
//! The mapping follows the convention the appliance uses in its REST
//! payloads:
//!
//! - attributes become keys prefixed with `@` (`name="x"` → `"@name": "x"`)
//! - text of an element with attributes or children lives under `#text`
//! - a leaf without attributes collapses to its text (or `null` when empty)
//! - repeated child tags become arrays
//!
//! Because a single `<entry>` would otherwise collapse to an object, callers
//! list tags that must always be arrays in [`DictOptions::force_list`].
//! Likewise an empty `<devices/>` would read back as `null`; containers
//! registered with [`DictOptions::container`] become `{"entry": []}` instead.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::tree::XmlNode;

const TEXT_KEY: &str = "#text";

/// Errors raised when a JSON value cannot be expressed as XML.
#[derive(Debug, Error)]
pub enum DictError {
    #[error("attribute {key} on <{tag}> must be a scalar, got {value}")]
    Attribute {
        tag: String,
        key: String,
        value: Value,
    },
    #[error("<{tag}> cannot be built from a nested array")]
    NestedArray { tag: String },
}

/// Options controlling XML → JSON conversion.
#[derive(Debug, Clone, Default)]
pub struct DictOptions {
    /// Child tags that are always emitted as arrays, even with one element.
    pub force_list: Vec<String>,
    /// `(container, list tag)` pairs: an empty container element converts
    /// to `{list_tag: []}` rather than `null`.
    pub containers: Vec<(String, String)>,
}

impl DictOptions {
    /// Options used for configuration objects: `entry` and `member` lists.
    pub fn config_lists() -> Self {
        Self {
            force_list: vec!["entry".to_string(), "member".to_string()],
            containers: Vec::new(),
        }
    }

    /// Register `tag` as a container of `list_tag` children.
    pub fn container(mut self, tag: &str, list_tag: &str) -> Self {
        self.containers.push((tag.to_string(), list_tag.to_string()));
        self
    }

    fn forces(&self, tag: &str) -> bool {
        self.force_list.iter().any(|t| t == tag)
    }

    fn list_tag_of(&self, tag: &str) -> Option<&str> {
        self.containers
            .iter()
            .find(|(container, _)| container == tag)
            .map(|(_, list)| list.as_str())
    }
}

/// Convert the content of a node, without the wrapping tag key.
pub fn content_value(node: &XmlNode, opts: &DictOptions) -> Value {
    if node.attributes.is_empty() && node.children.is_empty() {
        if let (None, Some(list_tag)) = (&node.text, opts.list_tag_of(&node.tag)) {
            let mut map = Map::new();
            map.insert(list_tag.to_string(), Value::Array(Vec::new()));
            return Value::Object(map);
        }
        return node
            .text
            .as_ref()
            .map_or(Value::Null, |text| Value::String(text.clone()));
    }

    let mut map = Map::new();
    for (key, value) in &node.attributes {
        map.insert(format!("@{key}"), Value::String(value.clone()));
    }
    if let Some(text) = &node.text {
        map.insert(TEXT_KEY.to_string(), Value::String(text.clone()));
    }

    for child in &node.children {
        let value = content_value(child, opts);
        match map.get_mut(&child.tag) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None if opts.forces(&child.tag) => {
                map.insert(child.tag.clone(), Value::Array(vec![value]));
            }
            None => {
                map.insert(child.tag.clone(), value);
            }
        }
    }
    Value::Object(map)
}

/// Build an XML node named `tag` from a JSON value.
pub fn from_value(tag: &str, value: &Value) -> Result<XmlNode, DictError> {
    let mut node = XmlNode::new(tag);
    match value {
        Value::Null => {}
        Value::Bool(_) | Value::Number(_) | Value::String(_) => {
            node.text = scalar_text(value);
        }
        Value::Array(_) => {
            return Err(DictError::NestedArray {
                tag: tag.to_string(),
            })
        }
        Value::Object(map) => {
            for (key, child) in map {
                if let Some(attr) = key.strip_prefix('@') {
                    let text = scalar_text(child).ok_or_else(|| DictError::Attribute {
                        tag: tag.to_string(),
                        key: attr.to_string(),
                        value: child.clone(),
                    })?;
                    node.attributes.insert(attr.to_string(), text);
                } else if key == TEXT_KEY {
                    node.text = scalar_text(child);
                } else if let Value::Array(items) = child {
                    for item in items {
                        node.children.push(from_value(key, item)?);
                    }
                } else {
                    node.children.push(from_value(key, child)?);
                }
            }
        }
    }
    Ok(node)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::{content_value, from_value, DictError, DictOptions};
    use crate::parser::parse_str;

    #[test]
    fn single_entry_is_forced_into_a_list() {
        let node = parse_str(
            r#"<devices><entry name="0001"><variable/></entry></devices>"#,
        )
        .expect("parse");

        assert_eq!(
            content_value(&node, &DictOptions::config_lists()),
            json!({"entry": [{"@name": "0001", "variable": null}]})
        );
        assert_eq!(
            content_value(&node, &DictOptions::default()),
            json!({"entry": {"@name": "0001", "variable": null}})
        );
    }

    #[test]
    fn empty_registered_containers_become_empty_lists() {
        let node = parse_str(
            r#"<entry name="S"><templates/><devices></devices><note/></entry>"#,
        )
        .expect("parse");
        let opts = DictOptions::config_lists()
            .container("templates", "member")
            .container("devices", "entry");

        assert_eq!(
            content_value(&node, &opts),
            json!({"@name": "S", "templates": {"member": []}, "devices": {"entry": []}, "note": null})
        );
    }

    #[test]
    fn repeated_children_become_arrays() {
        let node = parse_str("<templates><member>A</member><member>B</member></templates>")
            .expect("parse");
        assert_eq!(
            content_value(&node, &DictOptions::default()),
            json!({"member": ["A", "B"]})
        );
    }

    #[test]
    fn builds_entry_with_attributes_and_lists() {
        let node = from_value(
            "entry",
            &json!({
                "@name": "$mgmt_ip",
                "type": {"ip-netmask": "10.0.0.1/32"},
                "tags": {"member": ["a", "b"]}
            }),
        )
        .expect("build");

        assert_eq!(node.attr("name"), Some("$mgmt_ip"));
        assert_eq!(node.get_text(&["type", "ip-netmask"]), Some("10.0.0.1/32"));
        assert_eq!(node.get_child("tags").expect("tags").member_texts(), vec!["a", "b"]);
    }

    #[test]
    fn rejects_object_attribute() {
        let err = from_value("entry", &json!({"@name": {"x": 1}})).expect_err("should fail");
        assert!(matches!(err, DictError::Attribute { key, .. } if key == "name"));
    }
}
