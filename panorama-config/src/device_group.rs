use pan_xml::DictOptions;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::ModelError;
use crate::object::{
    validate_description, validate_name, validate_serial, PanoramaObject, MAX_SERIAL_LENGTH,
};
use crate::wire::{lenient_list, MemberList, NamedEntry};

/// `to-sw-version` value meaning "do not pin a software version".
pub const NO_SW_VERSION: &str = "None";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDevices {
    #[serde(default, deserialize_with = "lenient_list")]
    pub entry: Vec<NamedEntry>,
}

fn default_sw_version() -> String {
    NO_SW_VERSION.to_string()
}

/// A Panorama device group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceGroup {
    #[serde(rename = "@name")]
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default)]
    devices: GroupDevices,
    #[serde(
        rename = "reference-templates",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    reference_templates: Option<MemberList>,
    #[serde(
        rename = "authorization-code",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    authorization_code: Option<String>,
    #[serde(
        rename = "to-sw-version",
        default = "default_sw_version",
        skip_serializing_if = "is_unpinned"
    )]
    to_sw_version: String,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

fn is_unpinned(version: &str) -> bool {
    version == NO_SW_VERSION
}

impl DeviceGroup {
    pub fn new(name: impl Into<String>) -> Result<Self, ModelError> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self {
            name,
            description: None,
            devices: GroupDevices::default(),
            reference_templates: None,
            authorization_code: None,
            to_sw_version: default_sw_version(),
            extra: Map::new(),
        })
    }

    pub fn set_description(&mut self, description: Option<&str>) -> Result<(), ModelError> {
        if let Some(d) = description {
            validate_description(d)?;
        }
        self.description = description.map(str::to_string);
        Ok(())
    }

    pub fn devices(&self) -> impl Iterator<Item = &str> {
        self.devices.entry.iter().map(|d| d.name.as_str())
    }

    pub fn reference_templates(&self) -> Option<&[String]> {
        self.reference_templates.as_ref().map(|m| m.member.as_slice())
    }

    pub fn authorization_code(&self) -> Option<&str> {
        self.authorization_code.as_deref()
    }

    pub fn to_sw_version(&self) -> &str {
        &self.to_sw_version
    }

    /// Set or clear the authorization code. Empty input clears it.
    pub fn set_authorization_code(&mut self, code: Option<&str>) -> Result<(), ModelError> {
        match code.filter(|c| !c.is_empty()) {
            Some(code) => {
                validate_serial(code, MAX_SERIAL_LENGTH)?;
                self.authorization_code = Some(code.to_string());
            }
            None => self.authorization_code = None,
        }
        Ok(())
    }

    /// Pin a target software version. Empty input resets to `"None"`.
    pub fn set_to_sw_version(&mut self, version: Option<&str>) {
        self.to_sw_version = version
            .filter(|v| !v.is_empty())
            .unwrap_or(NO_SW_VERSION)
            .to_string();
    }

    /// Replace the reference templates without checking the appliance.
    /// An empty list clears them. See
    /// [`PanoramaClient::assign_reference_templates`](crate::client::PanoramaClient::assign_reference_templates)
    /// for the checked variant.
    pub fn set_reference_templates(&mut self, templates: Vec<String>) -> Result<(), ModelError> {
        if templates.is_empty() {
            self.reference_templates = None;
            return Ok(());
        }
        if templates.iter().any(String::is_empty) {
            return Err(ModelError::Empty {
                field: "reference template",
            });
        }
        self.reference_templates = Some(MemberList::from(templates));
        Ok(())
    }

    /// Add a reference template once; a repeat is logged and ignored.
    pub fn add_reference_template(&mut self, template: &str) -> Result<(), ModelError> {
        if template.is_empty() {
            return Err(ModelError::Empty {
                field: "template_name",
            });
        }
        let refs = self.reference_templates.get_or_insert_with(MemberList::default);
        if refs.contains(template) {
            warn!(
                template,
                device_group = %self.name,
                "template already exists in the reference templates"
            );
            return Ok(());
        }
        refs.member.push(template.to_string());
        Ok(())
    }

    /// Add a firewall by serial. Repeats are not filtered.
    pub fn add_device(&mut self, serial: &str) -> Result<(), ModelError> {
        if serial.is_empty() {
            return Err(ModelError::Empty {
                field: "serial number",
            });
        }
        self.devices.entry.push(NamedEntry::new(serial));
        Ok(())
    }

    /// XML API xpath of the read-only `parent-dg` node for this group.
    pub fn parent_dg_xpath(&self) -> String {
        format!(
            "/config/readonly/devices/entry[@name=\"localhost.localdomain\"]/device-group/entry[@name=\"{}\"]/parent-dg",
            self.name
        )
    }
}

impl PanoramaObject for DeviceGroup {
    const RESOURCE: &'static str = "DeviceGroups";
    const XML_CONTAINER: &'static str = "device-group";

    fn dict_options() -> DictOptions {
        DictOptions::config_lists().container("devices", "entry")
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::DeviceGroup;
    use crate::error::ModelError;
    use crate::object::PanoramaObject;

    #[test]
    fn new_group_serializes_defaults() {
        let dg = DeviceGroup::new("Branches").expect("dg");
        assert_eq!(
            dg.to_value().expect("json"),
            json!({"@name": "Branches", "devices": {"entry": []}})
        );
    }

    #[test]
    fn pinned_sw_version_is_written() {
        let mut dg = DeviceGroup::new("Branches").expect("dg");
        dg.set_to_sw_version(Some("11.1.2"));
        assert_eq!(dg.to_value().expect("json")["to-sw-version"], json!("11.1.2"));

        dg.set_to_sw_version(None);
        assert!(dg.to_value().expect("json").get("to-sw-version").is_none());
    }

    #[test]
    fn unmodeled_keys_survive_round_trip() {
        let raw = json!({
            "@name": "DG",
            "devices": {"entry": [{"@name": "0001", "vsys": {"member": ["vsys2"]}}]},
            "master-device": {"device": "0002"}
        });
        let mut dg = DeviceGroup::from_value(raw.clone()).expect("decode");
        assert_eq!(dg.to_value().expect("json"), raw);

        dg.add_device("0003").expect("add");
        assert_eq!(
            dg.to_value().expect("json"),
            json!({
                "@name": "DG",
                "devices": {"entry": [
                    {"@name": "0001", "vsys": {"member": ["vsys2"]}},
                    {"@name": "0003"}
                ]},
                "master-device": {"device": "0002"}
            })
        );
    }

    #[test]
    fn add_reference_template_is_idempotent() {
        let mut dg = DeviceGroup::new("Branches").expect("dg");
        dg.add_reference_template("Branch-Stack").expect("first");
        dg.add_reference_template("Branch-Stack").expect("repeat");
        dg.add_reference_template("Branch-Base").expect("second");

        assert_eq!(
            dg.reference_templates(),
            Some(&["Branch-Stack".to_string(), "Branch-Base".to_string()][..])
        );
        assert_eq!(
            dg.add_reference_template(""),
            Err(ModelError::Empty { field: "template_name" })
        );
    }

    #[test]
    fn add_device_allows_repeats_but_not_empty() {
        let mut dg = DeviceGroup::new("Branches").expect("dg");
        dg.add_device("0001").expect("add");
        dg.add_device("0001").expect("repeat");
        assert_eq!(dg.devices().collect::<Vec<_>>(), vec!["0001", "0001"]);
        assert!(dg.add_device("").is_err());
    }

    #[test]
    fn scalar_setters_validate() {
        let mut dg = DeviceGroup::new("Branches").expect("dg");

        dg.set_authorization_code(Some("I1234567")).expect("code");
        assert_eq!(dg.authorization_code(), Some("I1234567"));
        assert!(dg.set_authorization_code(Some("bad code!")).is_err());
        dg.set_authorization_code(None).expect("clear");
        assert_eq!(dg.authorization_code(), None);

        dg.set_to_sw_version(Some("11.1.2"));
        assert_eq!(dg.to_sw_version(), "11.1.2");
        dg.set_to_sw_version(Some(""));
        assert_eq!(dg.to_sw_version(), "None");
    }

    #[test]
    fn decodes_rest_entry() {
        let dg = DeviceGroup::from_value(json!({
            "@name": "Branches",
            "devices": {"entry": {"@name": "0001"}},
            "reference-templates": {"member": ["Branch-Stack"]}
        }))
        .expect("decode");
        assert_eq!(dg.devices().collect::<Vec<_>>(), vec!["0001"]);
        assert_eq!(dg.to_sw_version(), "None");
        assert_eq!(
            dg.parent_dg_xpath(),
            r#"/config/readonly/devices/entry[@name="localhost.localdomain"]/device-group/entry[@name="Branches"]/parent-dg"#
        );
    }
}
