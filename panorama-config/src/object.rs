//! Behaviour shared by every Panorama configuration object.

use pan_xml::{content_value, from_value, DictOptions, XmlNode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::ModelError;

pub const MAX_NAME_LENGTH: usize = 63;
pub const MAX_DESCRIPTION_LENGTH: usize = 255;
pub const MAX_SERIAL_LENGTH: usize = 63;

/// Panorama's own device entry in the configuration tree.
pub const LOCAL_DEVICE_XPATH: &str = "/config/devices/entry[@name='localhost.localdomain']";

/// A named object stored under the Panorama configuration tree.
pub trait PanoramaObject: Serialize + DeserializeOwned {
    /// REST resource under `/restapi/<version>/Panorama/`.
    const RESOURCE: &'static str;
    /// Element name of the container under the local device node.
    const XML_CONTAINER: &'static str;

    fn name(&self) -> &str;

    fn description(&self) -> Option<&str> {
        None
    }

    /// Structural checks run on the raw payload before decoding.
    fn check_value(_value: &Value) -> Result<(), ModelError> {
        Ok(())
    }

    /// Decode an object from its REST JSON entry.
    fn from_value(value: Value) -> Result<Self, ModelError> {
        Self::check_value(&value)?;
        let object: Self =
            serde_json::from_value(value).map_err(|e| ModelError::decode(Self::RESOURCE, e))?;
        validate_name(object.name())?;
        if let Some(description) = object.description() {
            validate_description(description)?;
        }
        Ok(object)
    }

    /// Encode the object as its REST JSON entry.
    fn to_value(&self) -> Result<Value, ModelError> {
        serde_json::to_value(self).map_err(|e| ModelError::decode(Self::RESOURCE, e))
    }

    /// Encode the object as an XML `<entry name="...">` element.
    fn to_xml(&self) -> Result<XmlNode, ModelError> {
        from_value("entry", &self.to_value()?).map_err(|e| ModelError::decode(Self::RESOURCE, e))
    }

    /// XML → JSON options for this object's entry. Containers listed here
    /// read back as empty lists when the element is empty.
    fn dict_options() -> DictOptions {
        DictOptions::config_lists()
    }

    /// Convert an `<entry>` element into the REST JSON shape.
    fn xml_to_value(entry: &XmlNode) -> Value {
        content_value(entry, &Self::dict_options())
    }

    /// Decode an object from an XML API `<entry>` element.
    fn from_xml(entry: &XmlNode) -> Result<Self, ModelError> {
        Self::from_value(Self::xml_to_value(entry))
    }

    /// XML API xpath of the entry called `name`.
    fn xpath_for(name: &str) -> String {
        format!(
            "{LOCAL_DEVICE_XPATH}/{}/entry[@name='{name}']",
            Self::XML_CONTAINER
        )
    }

    /// XML API xpath of this object's entry.
    fn xpath(&self) -> String {
        Self::xpath_for(self.name())
    }
}

pub fn validate_name(name: &str) -> Result<(), ModelError> {
    let reason = if name.is_empty() {
        "name cannot be empty".to_string()
    } else if name.chars().count() > MAX_NAME_LENGTH {
        format!("name exceeds {MAX_NAME_LENGTH} characters")
    } else {
        return Ok(());
    };
    Err(ModelError::InvalidName {
        name: name.to_string(),
        reason,
    })
}

pub fn validate_description(description: &str) -> Result<(), ModelError> {
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(ModelError::DescriptionTooLong {
            max: MAX_DESCRIPTION_LENGTH,
        });
    }
    Ok(())
}

/// Serial numbers and authorization codes: ASCII letters, digits and
/// dashes, at most `max` characters.
pub fn validate_serial(serial: &str, max: usize) -> Result<(), ModelError> {
    let reason = if serial.is_empty() {
        "serial cannot be empty".to_string()
    } else if serial.len() > max {
        format!("serial exceeds {max} characters")
    } else if let Some(bad) = serial
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-'))
    {
        format!("unexpected character {bad:?}")
    } else {
        return Ok(());
    };
    Err(ModelError::InvalidSerial {
        serial: serial.to_string(),
        reason,
    })
}
