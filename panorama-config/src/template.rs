use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ModelError;
use crate::object::{validate_description, validate_name, PanoramaObject};

const DEFAULT_VSYS: &str = "vsys1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSettings {
    #[serde(rename = "default-vsys")]
    pub default_vsys: String,
}

impl Default for TemplateSettings {
    fn default() -> Self {
        Self {
            default_vsys: DEFAULT_VSYS.to_string(),
        }
    }
}

/// A Panorama template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    #[serde(rename = "@name")]
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default)]
    settings: TemplateSettings,
    /// The template's `config` subtree and any other keys, passed through.
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl Template {
    pub fn new(name: impl Into<String>) -> Result<Self, ModelError> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self {
            name,
            description: None,
            settings: TemplateSettings::default(),
            extra: Map::new(),
        })
    }

    pub fn settings(&self) -> &TemplateSettings {
        &self.settings
    }

    pub fn set_description(&mut self, description: Option<&str>) -> Result<(), ModelError> {
        if let Some(d) = description {
            validate_description(d)?;
        }
        self.description = description.map(str::to_string);
        Ok(())
    }

    /// Set the default vsys; the name must start with `vsys`.
    pub fn set_default_vsys(&mut self, vsys: &str) -> Result<(), ModelError> {
        if !vsys.starts_with("vsys") {
            return Err(ModelError::InvalidVsys(vsys.to_string()));
        }
        self.settings.default_vsys = vsys.to_string();
        Ok(())
    }

    /// Set settings from a raw payload: either a vsys name or an object
    /// carrying `default-vsys`.
    pub fn set_settings(&mut self, settings: &Value) -> Result<(), ModelError> {
        match settings {
            Value::String(vsys) => self.set_default_vsys(vsys),
            Value::Object(map) => match map.get("default-vsys") {
                Some(Value::String(vsys)) => {
                    self.settings.default_vsys = vsys.clone();
                    Ok(())
                }
                Some(_) => Err(ModelError::WrongType {
                    field: "default-vsys",
                    expected: "str",
                }),
                None => Err(ModelError::InvalidStructure { field: "settings" }),
            },
            _ => Err(ModelError::WrongType {
                field: "settings",
                expected: "str or dict",
            }),
        }
    }
}

impl PanoramaObject for Template {
    const RESOURCE: &'static str = "Templates";
    const XML_CONTAINER: &'static str = "template";

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::Template;
    use crate::error::ModelError;
    use crate::object::PanoramaObject;

    #[test]
    fn defaults_to_vsys1() {
        let template = Template::new("Branch-Base").expect("template");
        assert_eq!(
            template.to_value().expect("json"),
            json!({"@name": "Branch-Base", "settings": {"default-vsys": "vsys1"}})
        );
    }

    #[test]
    fn config_subtree_is_passed_through() {
        let raw = json!({
            "@name": "Branch-Base",
            "settings": {"default-vsys": "vsys1"},
            "config": {"devices": {"entry": [{"@name": "localhost.localdomain"}]}}
        });
        let template = Template::from_value(raw.clone()).expect("decode");
        assert_eq!(template.to_value().expect("json"), raw);
    }

    #[test]
    fn settings_accept_vsys_string_or_object() {
        let mut template = Template::new("Branch-Base").expect("template");

        template.set_settings(&json!("vsys2")).expect("string");
        assert_eq!(template.settings().default_vsys, "vsys2");

        template
            .set_settings(&json!({"default-vsys": "vsys3"}))
            .expect("object");
        assert_eq!(template.settings().default_vsys, "vsys3");

        assert_eq!(
            template.set_settings(&json!("shared")),
            Err(ModelError::InvalidVsys("shared".to_string()))
        );
        assert!(matches!(
            template.set_settings(&json!(3)),
            Err(ModelError::WrongType { field: "settings", .. })
        ));
        assert!(template.set_settings(&json!({"vsys": "vsys1"})).is_err());
    }

    #[test]
    fn xml_entry_carries_name_attribute() {
        let template = Template::new("Branch-Base").expect("template");
        let xml = template.to_xml().expect("xml");
        assert_eq!(xml.attr("name"), Some("Branch-Base"));
        assert_eq!(xml.get_text(&["settings", "default-vsys"]), Some("vsys1"));
        assert_eq!(
            template.xpath(),
            "/config/devices/entry[@name='localhost.localdomain']/template/entry[@name='Branch-Base']"
        );
    }
}
