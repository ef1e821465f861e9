//! Synchronous client for the Panorama REST and XML APIs.
//!
//! Objects are exchanged through the REST API
//! (`/restapi/<version>/Panorama/<Resource>?name=<n>`), authenticated with
//! the `X-PAN-KEY` header. Lookups the REST API does not expose, such as a
//! device group's parent, go through the XML API (`/api/?type=config`).

mod envelope;
mod transport;

use pan_xml::{parse_str, write_compact, XmlNode};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::config::{ClientConfig, ConfigError};
use crate::device_group::DeviceGroup;
use crate::error::ModelError;
use crate::object::PanoramaObject;
use crate::template::Template;
use crate::template_stack::TemplateStack;
use crate::variables::VariableEntry;

use envelope::{xml_error_message, RestEnvelope};
pub use envelope::OBJECT_NOT_PRESENT;
pub use transport::{HttpRequest, HttpResponse, Method, ReqwestTransport, Transport, TransportError};

const API_KEY_HEADER: &str = "X-PAN-KEY";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("API error (code {}): {message}", .code.as_deref().unwrap_or("none"))]
    Api {
        code: Option<String>,
        message: String,
    },
    #[error("failed to decode response: {0}")]
    Decode(String),
    #[error("failed to parse XML response: {0}")]
    Xml(#[from] pan_xml::ParseError),
    #[error("failed to build XML element: {0}")]
    XmlWrite(#[from] pan_xml::WriteError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("there is no template or template stack called {name} on {host}")]
    MissingReference { name: String, host: String },
    #[error("{resource} {name} is not present on the appliance")]
    NotPresent { resource: &'static str, name: String },
}

pub struct PanoramaClient {
    base_url: String,
    api_version: String,
    api_key: String,
    transport: Box<dyn Transport>,
}

impl PanoramaClient {
    /// Build a client with the blocking HTTP transport.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        let transport = ReqwestTransport::new(config)?;
        Ok(Self::with_transport(
            config.base_url()?,
            &config.api_version,
            config.api_key()?,
            transport,
        ))
    }

    pub fn with_transport(
        base_url: impl Into<String>,
        api_version: &str,
        api_key: impl Into<String>,
        transport: impl Transport + 'static,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_version: api_version.to_string(),
            api_key: api_key.into(),
            transport: Box::new(transport),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn rest_url<T: PanoramaObject>(&self) -> String {
        format!(
            "{}/restapi/{}/Panorama/{}",
            self.base_url,
            self.api_version,
            T::RESOURCE
        )
    }

    fn rest_request<T: PanoramaObject>(&self, method: Method) -> HttpRequest {
        HttpRequest::new(method, self.rest_url::<T>()).header(API_KEY_HEADER, self.api_key.as_str())
    }

    /// Send a REST request and decode the envelope. HTTP errors that still
    /// carry a JSON envelope are returned as envelopes so callers can look at
    /// the PAN-OS code.
    fn send_rest(&self, request: &HttpRequest) -> Result<RestEnvelope, ClientError> {
        debug!(method = ?request.method, url = %request.url, query = ?request.query, "REST request");
        let resp = self.transport.send(request)?;
        match serde_json::from_str::<RestEnvelope>(&resp.body) {
            Ok(envelope) => Ok(envelope),
            Err(_) if !resp.is_success() => Err(ClientError::Http {
                status: resp.status,
                body: resp.body,
            }),
            Err(err) => Err(ClientError::Decode(err.to_string())),
        }
    }

    fn expect_success(envelope: RestEnvelope) -> Result<RestEnvelope, ClientError> {
        if envelope.is_success() {
            Ok(envelope)
        } else {
            Err(ClientError::Api {
                code: envelope.code(),
                message: envelope.error_message(),
            })
        }
    }

    /// Fetch one object by name; `None` when it does not exist.
    pub fn get<T: PanoramaObject>(&self, name: &str) -> Result<Option<T>, ClientError> {
        let request = self.rest_request::<T>(Method::Get).query("name", name);
        let envelope = self.send_rest(&request)?;
        if !envelope.is_success() && envelope.is_not_present() {
            return Ok(None);
        }
        let entries = Self::expect_success(envelope)?.into_entries();
        match entries.into_iter().next() {
            Some(value) => Ok(Some(T::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Fetch every object of this kind.
    pub fn list<T: PanoramaObject>(&self) -> Result<Vec<T>, ClientError> {
        let request = self.rest_request::<T>(Method::Get);
        let entries = Self::expect_success(self.send_rest(&request)?)?.into_entries();
        entries
            .into_iter()
            .map(|value| T::from_value(value).map_err(ClientError::from))
            .collect()
    }

    pub fn create<T: PanoramaObject>(&self, object: &T) -> Result<(), ClientError> {
        self.write_rest(Method::Post, object)
    }

    /// Replace the object on the appliance with the local copy.
    pub fn edit<T: PanoramaObject>(&self, object: &T) -> Result<(), ClientError> {
        self.write_rest(Method::Put, object)
    }

    fn write_rest<T: PanoramaObject>(&self, method: Method, object: &T) -> Result<(), ClientError> {
        let request = self
            .rest_request::<T>(method)
            .query("name", object.name())
            .json(json!({ "entry": object.to_value()? }));
        Self::expect_success(self.send_rest(&request)?)?;
        Ok(())
    }

    pub fn delete<T: PanoramaObject>(&self, name: &str) -> Result<(), ClientError> {
        let request = self.rest_request::<T>(Method::Delete).query("name", name);
        Self::expect_success(self.send_rest(&request)?)?;
        Ok(())
    }

    /// Replace the local object with the appliance's copy.
    pub fn refresh<T: PanoramaObject>(&self, object: &mut T) -> Result<(), ClientError> {
        match self.get::<T>(object.name())? {
            Some(fresh) => {
                *object = fresh;
                Ok(())
            }
            None => Err(ClientError::NotPresent {
                resource: T::RESOURCE,
                name: object.name().to_string(),
            }),
        }
    }

    /// Run an XML API config request and return the `<response>` node.
    fn xml_config(&self, action: &str, xpath: &str, element: Option<String>) -> Result<XmlNode, ClientError> {
        let mut request = HttpRequest::new(Method::Get, format!("{}/api/", self.base_url))
            .query("type", "config")
            .query("action", action)
            .query("xpath", xpath)
            .query("key", self.api_key.as_str());
        if let Some(element) = element {
            request = request.query("element", element);
        }
        debug!(action, xpath, "XML API request");

        let resp = self.transport.send(&request)?;
        if !resp.is_success() {
            return Err(ClientError::Http {
                status: resp.status,
                body: resp.body,
            });
        }
        let root = parse_str(&resp.body)?;
        if root.attr("status") != Some("success") {
            return Err(ClientError::Api {
                code: root.attr("code").map(str::to_string),
                message: xml_error_message(&root),
            });
        }
        Ok(root)
    }

    /// Fetch one object through the XML API `get` action; `None` when the
    /// result holds no entry.
    pub fn get_xml<T: PanoramaObject>(&self, name: &str) -> Result<Option<T>, ClientError> {
        let root = self.xml_config("get", &T::xpath_for(name), None)?;
        match root.get_child("result").and_then(|r| r.get_child("entry")) {
            Some(entry) => Ok(Some(T::from_xml(entry)?)),
            None => Ok(None),
        }
    }

    /// Push an object through the XML API `edit` action.
    pub fn edit_xml<T: PanoramaObject>(&self, object: &T) -> Result<(), ClientError> {
        let element = write_compact(&object.to_xml()?)?;
        self.xml_config("edit", &object.xpath(), Some(element))?;
        Ok(())
    }

    /// Parent of a device group, `"shared"` for a top-level group.
    pub fn try_parent_device_group(&self, device_group: &DeviceGroup) -> Result<String, ClientError> {
        let root = self.xml_config("get", &device_group.parent_dg_xpath(), None)?;
        Ok(root
            .get_text(&["result", "parent-dg"])
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or("shared")
            .to_string())
    }

    /// Like [`try_parent_device_group`](Self::try_parent_device_group), but
    /// failures are logged and reported as `None`.
    pub fn parent_device_group(&self, device_group: &DeviceGroup) -> Option<String> {
        match self.try_parent_device_group(device_group) {
            Ok(parent) => Some(parent),
            Err(ClientError::Api { message, .. }) => {
                error!(device_group = device_group.name(), %message, "could not get parent device group");
                None
            }
            Err(err) => {
                error!(device_group = device_group.name(), %err, "parent device group lookup failed");
                None
            }
        }
    }

    /// Names of the template stacks that include `template`.
    pub fn template_stacks_containing(&self, template: &str) -> Result<Vec<String>, ClientError> {
        Ok(self
            .list::<TemplateStack>()?
            .into_iter()
            .filter(|stack| stack.uses_template(template))
            .map(|stack| stack.name().to_string())
            .collect())
    }

    /// Set a device group's reference templates after checking that each
    /// name exists as a template or template stack.
    pub fn assign_reference_templates(
        &self,
        device_group: &mut DeviceGroup,
        templates: Vec<String>,
    ) -> Result<(), ClientError> {
        for name in &templates {
            if self.get::<Template>(name)?.is_some() {
                continue;
            }
            if self.get::<TemplateStack>(name)?.is_some() {
                continue;
            }
            return Err(ClientError::MissingReference {
                name: name.clone(),
                host: self.base_url.clone(),
            });
        }
        device_group.set_reference_templates(templates)?;
        Ok(())
    }

    /// Rebuild the stack's variable definitions from its first device,
    /// refreshing from the appliance first when the stack has no devices.
    pub fn sync_variables_from_device(
        &self,
        stack: &mut TemplateStack,
    ) -> Result<Vec<VariableEntry>, ClientError> {
        if let Some(derived) = stack.variables_from_first_device() {
            return Ok(derived);
        }
        self.refresh(stack)?;
        match stack.variables_from_first_device() {
            Some(derived) => Ok(derived),
            None => {
                warn!(stack = stack.name(), "no devices found in template stack");
                Ok(Vec::new())
            }
        }
    }
}
