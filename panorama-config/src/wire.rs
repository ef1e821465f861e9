//! Serde helpers for the REST API's container shapes.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Deserialize an `entry`/`member` list that may arrive as `null`, `""`,
/// `{}`, a single object, or an array.
pub(crate) fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Value::deserialize(deserializer)?;
    let items = match raw {
        Value::Null => Vec::new(),
        Value::String(s) if s.is_empty() => Vec::new(),
        Value::Object(map) if map.is_empty() => Vec::new(),
        Value::Array(items) => items,
        single => vec![single],
    };
    items
        .into_iter()
        .map(|item| serde_json::from_value(item).map_err(serde::de::Error::custom))
        .collect()
}

/// `{"member": [...]}` container of plain names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberList {
    #[serde(default, deserialize_with = "lenient_list")]
    pub member: Vec<String>,
}

impl MemberList {
    pub fn contains(&self, name: &str) -> bool {
        self.member.iter().any(|m| m == name)
    }
}

impl From<Vec<String>> for MemberList {
    fn from(member: Vec<String>) -> Self {
        Self { member }
    }
}

/// An `{"@name": ...}` entry. Other keys are carried through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedEntry {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NamedEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extra: Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::MemberList;

    #[test]
    fn member_list_accepts_single_string_and_null() {
        let single: MemberList = serde_json::from_value(json!({"member": "Base"})).expect("single");
        assert_eq!(single.member, vec!["Base"]);

        let empty: MemberList = serde_json::from_value(json!({"member": null})).expect("null");
        assert!(empty.member.is_empty());

        let missing: MemberList = serde_json::from_value(json!({})).expect("missing");
        assert!(missing.member.is_empty());

        let blank: MemberList = serde_json::from_value(json!({"member": {}})).expect("blank");
        assert!(blank.member.is_empty());
    }
}
