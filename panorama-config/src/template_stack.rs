//! Template stacks: ordered templates, assigned devices, and the two-level
//! variable model.

use pan_xml::DictOptions;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::ModelError;
use crate::object::{validate_description, validate_name, PanoramaObject};
use crate::validate::{
    validate_devices_structure, validate_templates_structure, validate_variable_structure,
};
use crate::variables::{TypedValue, VariableBlock, VariableEntry, VariableType, VariableValue};
use crate::wire::{lenient_list, MemberList};

/// A device assigned to a stack, with optional per-device variable values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackDevice {
    #[serde(rename = "@name")]
    pub serial: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable: Option<VariableBlock>,
    /// Device keys not modeled here, such as `vsys`, kept for write-back.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StackDevice {
    pub fn new(serial: impl Into<String>) -> Self {
        Self {
            serial: serial.into(),
            variable: None,
            extra: Map::new(),
        }
    }

    /// Variables assigned on this device, normalizing a missing block.
    pub fn variables_mut(&mut self) -> &mut VariableBlock {
        self.variable.get_or_insert_with(VariableBlock::default)
    }

    pub fn variable_type(&self, name: &str) -> Option<VariableType> {
        self.variable.as_ref().and_then(|block| block.type_of(name))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackDevices {
    #[serde(default, deserialize_with = "lenient_list")]
    pub entry: Vec<StackDevice>,
}

/// A device assignment whose type tag disagrees with the stack definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeConflict {
    pub device: String,
    pub variable: String,
    pub defined: VariableType,
    pub assigned: VariableType,
}

/// A Panorama template stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateStack {
    #[serde(rename = "@name")]
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default)]
    templates: MemberList,
    #[serde(default)]
    devices: StackDevices,
    #[serde(default)]
    variable: VariableBlock,
    /// Everything else on the entry (`settings`, `user-group-source`, ...).
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl TemplateStack {
    pub fn new(name: impl Into<String>) -> Result<Self, ModelError> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self {
            name,
            description: None,
            templates: MemberList::default(),
            devices: StackDevices::default(),
            variable: VariableBlock::default(),
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

    pub fn templates(&self) -> &[String] {
        &self.templates.member
    }

    pub fn devices(&self) -> &[StackDevice] {
        &self.devices.entry
    }

    pub fn device(&self, serial: &str) -> Option<&StackDevice> {
        self.devices.entry.iter().find(|d| d.serial == serial)
    }

    pub fn variables(&self) -> &VariableBlock {
        &self.variable
    }

    pub fn uses_template(&self, template: &str) -> bool {
        self.templates.contains(template)
    }

    /// Replace the templates block from a raw `{"member": [...]}` payload.
    pub fn set_templates(&mut self, templates: Value) -> Result<(), ModelError> {
        if !validate_templates_structure(&templates) {
            return Err(ModelError::InvalidStructure { field: "templates" });
        }
        self.templates =
            serde_json::from_value(templates).map_err(|e| ModelError::decode("templates", e))?;
        Ok(())
    }

    /// Replace the devices block from a raw `{"entry": [...]}` payload.
    pub fn set_devices(&mut self, devices: Value) -> Result<(), ModelError> {
        if !validate_devices_structure(&devices) {
            return Err(ModelError::InvalidStructure { field: "devices" });
        }
        self.devices =
            serde_json::from_value(devices).map_err(|e| ModelError::decode("devices", e))?;
        Ok(())
    }

    /// Replace the stack-level variable definitions from a raw payload.
    pub fn set_variable(&mut self, variable: Value) -> Result<(), ModelError> {
        if !validate_variable_structure(&variable) {
            return Err(ModelError::InvalidStructure { field: "variable" });
        }
        self.variable =
            serde_json::from_value(variable).map_err(|e| ModelError::decode("variable", e))?;
        Ok(())
    }

    /// Append a template to the stack. Order matters on the appliance, and
    /// duplicates are passed through unchanged.
    pub fn add_template_member(&mut self, template: impl Into<String>) {
        self.templates.member.push(template.into());
    }

    /// Append a device, optionally with a raw variable block.
    ///
    /// Returns `false` without touching the stack when the variable block is
    /// malformed. The serial is not checked for duplicates.
    pub fn add_device(&mut self, serial: &str, variables: Option<&Value>) -> bool {
        let mut device = StackDevice::new(serial);
        if let Some(raw) = variables {
            if !validate_variable_structure(raw) {
                debug!(device = serial, variables = %raw, "invalid variable structure, not adding");
                return false;
            }
            match serde_json::from_value::<VariableBlock>(raw.clone()) {
                Ok(block) => device.variable = Some(block),
                Err(err) => {
                    debug!(device = serial, %err, "variable block did not decode, not adding");
                    return false;
                }
            }
        }
        self.devices.entry.push(device);
        true
    }

    /// Remove the first device with this serial.
    pub fn remove_device(&mut self, serial: &str) -> bool {
        match self.devices.entry.iter().position(|d| d.serial == serial) {
            Some(idx) => {
                self.devices.entry.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Define or redefine a stack-level variable.
    pub fn update_variable(&mut self, name: &str, value: TypedValue) {
        self.variable.upsert(name, value);
    }

    /// Type tag for `name`: stack definitions first, then the first device
    /// that assigns it.
    pub fn infer_variable_type(&self, name: &str) -> Option<VariableType> {
        self.variable.type_of(name).or_else(|| {
            self.devices
                .entry
                .iter()
                .find_map(|device| device.variable_type(name))
        })
    }

    /// Assign a per-device value, inferring the type from the stack.
    ///
    /// When the device is not in the stack it is added first, unless
    /// `create_device_if_missing` is false, in which case nothing changes and
    /// `Ok(false)` is returned. A plain string for a `pre-shared-key`
    /// variable is stored as its cleartext value.
    pub fn set_device_variable_value(
        &mut self,
        serial: &str,
        name: &str,
        value: impl Into<VariableValue>,
        create_device_if_missing: bool,
    ) -> Result<bool, ModelError> {
        let tag = self
            .infer_variable_type(name)
            .ok_or_else(|| ModelError::UndefinedVariable {
                variable: name.to_string(),
                stack: self.name.clone(),
            })?;
        let typed = TypedValue::new(tag, value)?;

        if self.device(serial).is_none() && create_device_if_missing {
            self.add_device(serial, None);
        }
        Ok(self.update_device_variable(serial, name, typed))
    }

    /// Create or replace a variable on the first device with this serial.
    /// Returns `false` when no such device exists.
    pub fn update_device_variable(&mut self, serial: &str, name: &str, value: TypedValue) -> bool {
        let Some(device) = self.devices.entry.iter_mut().find(|d| d.serial == serial) else {
            return false;
        };
        device.variables_mut().upsert(name, value);
        true
    }

    /// Remove a variable from the first device with this serial.
    pub fn remove_device_variable(&mut self, serial: &str, name: &str) -> bool {
        self.devices
            .entry
            .iter_mut()
            .find(|d| d.serial == serial)
            .and_then(|d| d.variable.as_mut())
            .is_some_and(|block| block.remove(name))
    }

    /// Rebuild the stack-level definitions from the first device's
    /// assignments, with empty values.
    ///
    /// Returns `None` when the stack has no devices.
    pub fn variables_from_first_device(&mut self) -> Option<Vec<VariableEntry>> {
        let first = self.devices.entry.first()?;
        let derived: Vec<VariableEntry> = first
            .variable
            .iter()
            .flat_map(VariableBlock::iter)
            .map(|v| VariableEntry::new(v.name.clone(), TypedValue::placeholder(v.value.tag())))
            .collect();
        self.variable.entry = derived.clone();
        Some(derived)
    }

    /// Device assignments whose type tag differs from the stack definition.
    pub fn type_conflicts(&self) -> Vec<TypeConflict> {
        let mut conflicts = Vec::new();
        for device in &self.devices.entry {
            for assigned in device.variable.iter().flat_map(VariableBlock::iter) {
                let Some(defined) = self.variable.type_of(&assigned.name) else {
                    continue;
                };
                if defined != assigned.value.tag() {
                    conflicts.push(TypeConflict {
                        device: device.serial.clone(),
                        variable: assigned.name.clone(),
                        defined,
                        assigned: assigned.value.tag(),
                    });
                }
            }
        }
        conflicts
    }

    /// `(serial, variable)` pairs assigned on a device but not defined on
    /// the stack.
    pub fn undefined_assignments(&self) -> Vec<(String, String)> {
        self.devices
            .entry
            .iter()
            .flat_map(|device| {
                device
                    .variable
                    .iter()
                    .flat_map(VariableBlock::iter)
                    .filter(|v| self.variable.get(&v.name).is_none())
                    .map(|v| (device.serial.clone(), v.name.clone()))
            })
            .collect()
    }
}

impl PanoramaObject for TemplateStack {
    const RESOURCE: &'static str = "TemplateStacks";
    const XML_CONTAINER: &'static str = "template-stack";

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn dict_options() -> DictOptions {
        DictOptions::config_lists()
            .container("templates", "member")
            .container("devices", "entry")
            .container("variable", "entry")
    }

    fn check_value(value: &Value) -> Result<(), ModelError> {
        if let Some(templates) = value.get("templates") {
            if !validate_templates_structure(templates) {
                return Err(ModelError::InvalidStructure { field: "templates" });
            }
        }
        if let Some(devices) = value.get("devices") {
            if !validate_devices_structure(devices) {
                return Err(ModelError::InvalidStructure { field: "devices" });
            }
        }
        if let Some(variable) = value.get("variable") {
            if !validate_variable_structure(variable) {
                return Err(ModelError::InvalidStructure { field: "variable" });
            }
        }
        Ok(())
    }
}
