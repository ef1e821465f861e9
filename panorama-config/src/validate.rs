//! Structural checks for untyped template-stack payloads.
//!
//! These run on raw JSON before it is adopted into the typed model, so a
//! malformed payload from a caller or from the appliance is reported with
//! the offending item instead of a generic decode error. Each check returns
//! `false` on the first problem and logs why at debug level.

use serde_json::Value;
use tracing::debug;

use crate::variables::VariableType;

/// Check a `{"member": [...]}` templates block.
pub fn validate_templates_structure(templates: &Value) -> bool {
    let Some(obj) = templates.as_object() else {
        debug!("templates is not an object");
        return false;
    };
    match obj.get("member") {
        Some(Value::Array(_)) => true,
        Some(other) => {
            debug!(member = %other, "templates member is not a list");
            false
        }
        None => {
            debug!("templates has no member key");
            false
        }
    }
}

/// Check a `{"entry": [...]}` variable block.
///
/// A missing, `null`, or empty-string `entry` counts as an empty block.
pub fn validate_variable_structure(variable: &Value) -> bool {
    let Some(obj) = variable.as_object() else {
        debug!("variable is not an object");
        return false;
    };

    let items = match obj.get("entry") {
        None | Some(Value::Null) => return true,
        Some(Value::String(s)) if s.is_empty() => return true,
        Some(Value::Array(items)) => items,
        Some(_) => {
            debug!("variable entry is not a list");
            return false;
        }
    };

    items.iter().all(validate_variable_item)
}

fn validate_variable_item(item: &Value) -> bool {
    let (Some(name), Some(ty)) = (item.get("@name"), item.get("type")) else {
        debug!(%item, "missing keys @name and type");
        return false;
    };

    let Some(ty) = ty.as_object().filter(|t| t.len() == 1) else {
        debug!(%name, ty = %ty, "type must be an object with exactly one key");
        return false;
    };
    let Some((tag, value)) = ty.iter().next() else {
        return false;
    };

    let Ok(tag) = tag.parse::<VariableType>() else {
        debug!(%name, %tag, "type tag is not an allowed variable type");
        return false;
    };

    if tag.is_secret() {
        validate_pre_shared_key(name, value)
    } else if value.is_string() {
        true
    } else {
        debug!(%name, %tag, %value, "variable value must be a string");
        false
    }
}

fn validate_pre_shared_key(name: &Value, value: &Value) -> bool {
    let Some(psk) = value.as_object() else {
        debug!(%name, %value, "pre-shared-key value must be an object");
        return false;
    };
    if !psk.contains_key("key") && !psk.contains_key("value") {
        debug!(%name, %value, "pre-shared-key must contain 'key' or 'value'");
        return false;
    }
    for field in ["key", "value"] {
        if let Some(v) = psk.get(field) {
            if !v.is_string() {
                debug!(%name, field, value = %v, "pre-shared-key field must be a string");
                return false;
            }
        }
    }
    true
}

/// Check a `{"entry": [...]}` devices block, including each device's own
/// variable block when its `entry` is non-empty.
pub fn validate_devices_structure(devices: &Value) -> bool {
    let Some(items) = devices.get("entry").and_then(Value::as_array) else {
        debug!("devices must be an object with an entry list");
        return false;
    };

    items.iter().all(|item| {
        if item.get("@name").is_none() {
            debug!(%item, "device entry has no @name");
            return false;
        }
        match item.get("variable") {
            None => true,
            Some(block @ Value::Object(_)) if block.get("entry").map_or(true, is_blank) => true,
            Some(block @ Value::Object(_)) => validate_variable_structure(block),
            Some(other) => {
                debug!(device = %item["@name"], variable = %other, "device variable is not an object");
                false
            }
        }
    })
}

/// `null`, `false`, zero, and empty strings, lists and objects.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{validate_devices_structure, validate_templates_structure, validate_variable_structure};

    #[test]
    fn empty_variable_containers_are_valid() {
        assert!(validate_variable_structure(&json!({"entry": []})));
        assert!(validate_variable_structure(&json!({})));
        assert!(validate_variable_structure(&json!({"entry": null})));
        assert!(validate_variable_structure(&json!({"entry": ""})));
        assert!(!validate_variable_structure(&json!([])));
        assert!(!validate_variable_structure(&json!({"entry": {"@name": "$x"}})));
    }

    #[test]
    fn variable_items_need_name_and_single_key_type() {
        assert!(!validate_variable_structure(&json!({"entry": [{"@name": "$x"}]})));
        assert!(!validate_variable_structure(&json!({"entry": [{"type": {"fqdn": "a"}}]})));
        assert!(!validate_variable_structure(
            &json!({"entry": [{"@name": "$x", "type": {"fqdn": "a", "hostname": "b"}}]})
        ));
        assert!(!validate_variable_structure(&json!({"entry": [{"@name": "$x", "type": {}}]})));
        assert!(!validate_variable_structure(&json!({"entry": [{"@name": "$x", "type": "fqdn"}]})));
        assert!(validate_variable_structure(
            &json!({"entry": [{"@name": "$x", "type": {"fqdn": "a.example"}}]})
        ));
    }

    #[test]
    fn unknown_tags_and_non_string_values_are_rejected() {
        assert!(!validate_variable_structure(
            &json!({"entry": [{"@name": "$x", "type": {"ip-address": "1.1.1.1"}}]})
        ));
        assert!(!validate_variable_structure(
            &json!({"entry": [{"@name": "$x", "type": {"as-number": 65000}}]})
        ));
    }

    #[test]
    fn pre_shared_key_needs_key_or_value_strings() {
        let psk = |v: serde_json::Value| json!({"entry": [{"@name": "$psk", "type": {"pre-shared-key": v}}]});

        assert!(validate_variable_structure(&psk(json!({"key": "-AQ=="}))));
        assert!(validate_variable_structure(&psk(json!({"value": "secret"}))));
        assert!(!validate_variable_structure(&psk(json!("secret"))));
        assert!(!validate_variable_structure(&psk(json!({}))));
        assert!(!validate_variable_structure(&psk(json!({"value": 42}))));
        assert!(!validate_variable_structure(&psk(json!({"key": "-AQ==", "value": null}))));
    }

    #[test]
    fn templates_need_member_list() {
        assert!(validate_templates_structure(&json!({"member": []})));
        assert!(!validate_templates_structure(&json!({"member": "Base"})));
        assert!(!validate_templates_structure(&json!({})));
        assert!(!validate_templates_structure(&json!(["Base"])));
    }

    #[test]
    fn devices_validate_nested_variables() {
        assert!(validate_devices_structure(&json!({"entry": []})));
        assert!(validate_devices_structure(&json!({"entry": [{"@name": "0001", "variable": {}}]})));
        assert!(!validate_devices_structure(&json!({"entry": [{"variable": {}}]})));
        assert!(!validate_devices_structure(&json!({"entry": [{"@name": "0001", "variable": "x"}]})));
        assert!(!validate_devices_structure(&json!({"entry": [{
            "@name": "0001",
            "variable": {"entry": [{"@name": "$x", "type": {"fqdn": 1}}]}
        }]})));
        assert!(!validate_devices_structure(&json!({"devices": []})));
    }

    #[test]
    fn blank_device_variable_entries_are_not_inspected() {
        for blank in [json!({}), json!(""), json!([]), json!(null)] {
            assert!(validate_devices_structure(&json!({"entry": [{
                "@name": "0001",
                "variable": {"entry": blank}
            }]})));
        }
        assert!(!validate_devices_structure(&json!({"entry": [{
            "@name": "0001",
            "variable": {"entry": {"@name": "$x"}}
        }]})));
    }
}
