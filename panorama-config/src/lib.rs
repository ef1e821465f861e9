//! Typed models and a client for Panorama configuration objects.
//!
//! Panorama manages fleets of firewalls through three kinds of objects this
//! crate knows about:
//!
//! - [`template::Template`] — a named block of device/network settings
//! - [`template_stack::TemplateStack`] — an ordered list of templates, the
//!   devices they apply to, and the variables that parameterize them
//! - [`device_group::DeviceGroup`] — firewalls grouped under shared policy
//!
//! # Variables
//!
//! Template stacks carry a two-level variable system. The stack *defines*
//! each variable with a type tag (see [`variables::VariableType`]) and a
//! default, and each device may *assign* its own value. Assignments take
//! their type from the definition, so callers only supply a serial, a
//! variable name and a value:
//!
//! ```ignore
//! use panorama_config::template_stack::TemplateStack;
//! use panorama_config::variables::{TypedValue, VariableType};
//!
//! let mut stack = TemplateStack::new("Branch-Stack")?;
//! stack.update_variable("$mgmt_ip", TypedValue::new(VariableType::IpNetmask, "0.0.0.0/0")?);
//! stack.set_device_variable_value("013201001234", "$mgmt_ip", "10.1.2.3/32", true)?;
//! client.edit(&stack)?;
//! ```
//!
//! # Layout
//!
//! - [`validate`] — structural checks on raw JSON payloads
//! - [`check`] — whole-stack findings report
//! - [`object`] — naming rules and REST/XML encoding shared by all objects
//! - [`client`] — REST and XML API access over a pluggable transport
//! - [`config`] — TOML connection profiles

pub mod check;
pub mod client;
pub mod config;
pub mod device_group;
pub mod error;
pub mod object;
pub mod template;
pub mod template_stack;
pub mod validate;
pub mod variables;
mod wire;

pub use error::ModelError;
pub use wire::{MemberList, NamedEntry};
