//! Template-stack variable types and values.
//!
//! Variables exist at two levels. The stack carries *definitions* (a name
//! and a type tag with a default value) and every device in the stack may
//! carry *assignments* for the same names. Both levels share the wire shape
//!
//! ```json
//! {"@name": "$mgmt_ip", "type": {"ip-netmask": "10.0.0.1/32"}}
//! ```
//!
//! where `type` always holds exactly one key. The key is the type tag; its
//! value is a plain string for every tag except `pre-shared-key`, which holds
//! a `{"key": ..., "value": ...}` object.

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::ModelError;
use crate::wire::lenient_list;

/// The fixed set of variable type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VariableType {
    IpNetmask,
    IpRange,
    Hostname,
    Ipv4Subnet,
    Ipv6Subnet,
    PreSharedKey,
    Fqdn,
    GroupId,
    DevicePriority,
    DeviceId,
    Interface,
    AsNumber,
    QosProfile,
    EgressMax,
    LinkTag,
}

impl VariableType {
    pub const ALL: [VariableType; 15] = [
        VariableType::IpNetmask,
        VariableType::IpRange,
        VariableType::Hostname,
        VariableType::Ipv4Subnet,
        VariableType::Ipv6Subnet,
        VariableType::PreSharedKey,
        VariableType::Fqdn,
        VariableType::GroupId,
        VariableType::DevicePriority,
        VariableType::DeviceId,
        VariableType::Interface,
        VariableType::AsNumber,
        VariableType::QosProfile,
        VariableType::EgressMax,
        VariableType::LinkTag,
    ];

    /// Wire tag, e.g. `ip-netmask`.
    pub fn as_str(self) -> &'static str {
        match self {
            VariableType::IpNetmask => "ip-netmask",
            VariableType::IpRange => "ip-range",
            VariableType::Hostname => "hostname",
            VariableType::Ipv4Subnet => "ipv4-subnet",
            VariableType::Ipv6Subnet => "ipv6-subnet",
            VariableType::PreSharedKey => "pre-shared-key",
            VariableType::Fqdn => "fqdn",
            VariableType::GroupId => "group-id",
            VariableType::DevicePriority => "device-priority",
            VariableType::DeviceId => "device-id",
            VariableType::Interface => "interface",
            VariableType::AsNumber => "as-number",
            VariableType::QosProfile => "qos-profile",
            VariableType::EgressMax => "egress-max",
            VariableType::LinkTag => "link-tag",
        }
    }

    /// Only pre-shared keys carry a structured value.
    pub fn is_secret(self) -> bool {
        self == VariableType::PreSharedKey
    }
}

impl FromStr for VariableType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VariableType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ModelError::UnknownVariableType(s.to_string()))
    }
}

impl Display for VariableType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for VariableType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Value of a `pre-shared-key` variable. At least one field must be set:
/// `key` holds the appliance-encrypted form, `value` the cleartext.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreSharedKey {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl PreSharedKey {
    pub fn cleartext(value: impl Into<String>) -> Self {
        Self {
            key: None,
            value: Some(value.into()),
        }
    }

    pub fn encrypted(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            value: None,
        }
    }

    fn is_set(&self) -> bool {
        self.key.is_some() || self.value.is_some()
    }
}

/// Raw value supplied for a variable before it is bound to a type tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariableValue {
    Text(String),
    PreSharedKey(PreSharedKey),
}

impl From<&str> for VariableValue {
    fn from(value: &str) -> Self {
        VariableValue::Text(value.to_string())
    }
}

impl From<String> for VariableValue {
    fn from(value: String) -> Self {
        VariableValue::Text(value)
    }
}

impl From<PreSharedKey> for VariableValue {
    fn from(value: PreSharedKey) -> Self {
        VariableValue::PreSharedKey(value)
    }
}

impl Display for VariableValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            VariableValue::Text(text) => f.write_str(text),
            VariableValue::PreSharedKey(psk) if psk.key.is_some() => f.write_str("<encrypted>"),
            VariableValue::PreSharedKey(_) => f.write_str("<cleartext>"),
        }
    }
}

/// A type tag bound to a value of the matching kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedValue {
    tag: VariableType,
    value: VariableValue,
}

impl TypedValue {
    /// Bind `value` to `tag`.
    ///
    /// A plain string given for `pre-shared-key` is taken as the cleartext
    /// `value` field. A pre-shared key given for any other tag is rejected,
    /// as is a pre-shared key with neither field set.
    pub fn new(tag: VariableType, value: impl Into<VariableValue>) -> Result<Self, ModelError> {
        let value = match (tag.is_secret(), value.into()) {
            (true, VariableValue::Text(text)) => {
                VariableValue::PreSharedKey(PreSharedKey::cleartext(text))
            }
            (true, VariableValue::PreSharedKey(psk)) if !psk.is_set() => {
                return Err(ModelError::ValueMismatch {
                    tag,
                    expected: "a dict with 'key' or 'value'",
                })
            }
            (false, VariableValue::PreSharedKey(_)) => {
                return Err(ModelError::ValueMismatch {
                    tag,
                    expected: "a string",
                })
            }
            (_, value) => value,
        };
        Ok(Self { tag, value })
    }

    /// Empty value of the right kind, used for definitions derived from a
    /// device whose concrete values should not leak into the stack.
    pub fn placeholder(tag: VariableType) -> Self {
        let value = if tag.is_secret() {
            VariableValue::PreSharedKey(PreSharedKey::cleartext(""))
        } else {
            VariableValue::Text(String::new())
        };
        Self { tag, value }
    }

    pub fn tag(&self) -> VariableType {
        self.tag
    }

    pub fn value(&self) -> &VariableValue {
        &self.value
    }
}

impl Serialize for TypedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match &self.value {
            VariableValue::Text(text) => map.serialize_entry(self.tag.as_str(), text)?,
            VariableValue::PreSharedKey(psk) => map.serialize_entry(self.tag.as_str(), psk)?,
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for TypedValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
        if raw.len() != 1 {
            return Err(D::Error::custom(format!(
                "variable type must have exactly one key, found {}",
                raw.len()
            )));
        }
        let Some((tag, value)) = raw.into_iter().next() else {
            return Err(D::Error::custom("variable type is empty"));
        };
        let tag: VariableType = tag.parse().map_err(D::Error::custom)?;
        let value = match value {
            Value::String(text) if !tag.is_secret() => VariableValue::Text(text),
            Value::Object(_) if tag.is_secret() => {
                VariableValue::PreSharedKey(serde_json::from_value(value).map_err(D::Error::custom)?)
            }
            other => {
                return Err(D::Error::custom(format!(
                    "invalid value {other} for variable type {tag}"
                )))
            }
        };
        TypedValue::new(tag, value).map_err(D::Error::custom)
    }
}

/// A named variable: either a stack-level definition or a device assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableEntry {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "type")]
    pub value: TypedValue,
}

impl VariableEntry {
    pub fn new(name: impl Into<String>, value: TypedValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// `{"entry": [...]}` container of variables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableBlock {
    #[serde(default, deserialize_with = "lenient_list")]
    pub entry: Vec<VariableEntry>,
}

impl VariableBlock {
    pub fn get(&self, name: &str) -> Option<&VariableEntry> {
        self.entry.iter().find(|e| e.name == name)
    }

    /// Type tag of the first entry named `name`.
    pub fn type_of(&self, name: &str) -> Option<VariableType> {
        self.get(name).map(|e| e.value.tag())
    }

    /// Replace the value of an existing entry or append a new one. Returns
    /// `true` when an entry was replaced.
    pub fn upsert(&mut self, name: &str, value: TypedValue) -> bool {
        if let Some(existing) = self.entry.iter_mut().find(|e| e.name == name) {
            existing.value = value;
            return true;
        }
        self.entry.push(VariableEntry::new(name, value));
        false
    }

    /// Remove the first entry named `name`.
    pub fn remove(&mut self, name: &str) -> bool {
        match self.entry.iter().position(|e| e.name == name) {
            Some(idx) => {
                self.entry.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entry.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VariableEntry> {
        self.entry.iter()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::{PreSharedKey, TypedValue, VariableBlock, VariableType, VariableValue};
    use crate::error::ModelError;

    #[test]
    fn parses_every_wire_tag() {
        for tag in VariableType::ALL {
            assert_eq!(tag.as_str().parse::<VariableType>(), Ok(tag));
        }
        assert_eq!(
            "ip-address".parse::<VariableType>(),
            Err(ModelError::UnknownVariableType("ip-address".to_string()))
        );
    }

    #[test]
    fn type_serializes_as_wire_tag() {
        assert_eq!(
            serde_json::to_value([VariableType::IpNetmask, VariableType::PreSharedKey])
                .expect("json"),
            json!(["ip-netmask", "pre-shared-key"])
        );
    }

    #[test]
    fn plain_string_for_pre_shared_key_becomes_cleartext_value() {
        let typed = TypedValue::new(VariableType::PreSharedKey, "s3cret").expect("typed");
        assert_eq!(
            serde_json::to_value(&typed).expect("json"),
            json!({"pre-shared-key": {"value": "s3cret"}})
        );
    }

    #[test]
    fn pre_shared_key_rejected_for_other_tags_and_when_empty() {
        let err = TypedValue::new(VariableType::Hostname, PreSharedKey::cleartext("x"))
            .expect_err("hostname needs text");
        assert!(matches!(err, ModelError::ValueMismatch { tag: VariableType::Hostname, .. }));

        let err = TypedValue::new(VariableType::PreSharedKey, PreSharedKey::default())
            .expect_err("empty psk");
        assert!(matches!(err, ModelError::ValueMismatch { tag: VariableType::PreSharedKey, .. }));
    }

    #[test]
    fn deserialize_rejects_multi_key_and_wrong_kind() {
        let multi = serde_json::from_value::<TypedValue>(json!({"fqdn": "a", "hostname": "b"}));
        assert!(multi.is_err());

        let wrong = serde_json::from_value::<TypedValue>(json!({"fqdn": {"value": "a"}}));
        assert!(wrong.is_err());

        let psk: TypedValue =
            serde_json::from_value(json!({"pre-shared-key": {"key": "-AQ=="}})).expect("psk");
        assert_eq!(
            psk.value(),
            &VariableValue::PreSharedKey(PreSharedKey::encrypted("-AQ=="))
        );
    }

    #[test]
    fn upsert_replaces_in_place() {
        let mut block = VariableBlock::default();
        let v1 = TypedValue::new(VariableType::Fqdn, "a.example").expect("v1");
        let v2 = TypedValue::new(VariableType::Fqdn, "b.example").expect("v2");

        assert!(!block.upsert("$peer", v1));
        assert!(block.upsert("$peer", v2.clone()));
        assert_eq!(block.entry.len(), 1);
        assert_eq!(block.get("$peer").map(|e| &e.value), Some(&v2));
        assert!(block.remove("$peer"));
        assert!(!block.remove("$peer"));
    }
}
