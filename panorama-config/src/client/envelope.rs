//! REST and XML API response envelopes.

use pan_xml::XmlNode;
use serde::Deserialize;
use serde_json::Value;

use crate::wire::lenient_list;

/// PAN-OS error code for "Object Not Present".
pub const OBJECT_NOT_PRESENT: &str = "5";

#[derive(Debug, Deserialize)]
pub(crate) struct RestEnvelope {
    #[serde(rename = "@status")]
    pub status: String,
    #[serde(rename = "@code", default)]
    pub code: Option<Value>,
    #[serde(default)]
    pub result: Option<RestResult>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RestResult {
    #[serde(default, deserialize_with = "lenient_list")]
    pub entry: Vec<Value>,
}

impl RestEnvelope {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }

    pub fn code(&self) -> Option<String> {
        match &self.code {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn is_not_present(&self) -> bool {
        self.code().as_deref() == Some(OBJECT_NOT_PRESENT)
    }

    /// Top-level message plus every `description` found in `details`.
    pub fn error_message(&self) -> String {
        let mut parts: Vec<String> = self.message.iter().cloned().collect();
        if let Some(details) = &self.details {
            collect_descriptions(details, &mut parts);
        }
        if parts.is_empty() {
            "unknown error".to_string()
        } else {
            parts.join("; ")
        }
    }

    pub fn into_entries(self) -> Vec<Value> {
        self.result.map(|r| r.entry).unwrap_or_default()
    }
}

fn collect_descriptions(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                match (key.as_str(), child) {
                    ("description", Value::String(text)) => out.push(text.clone()),
                    _ => collect_descriptions(child, out),
                }
            }
        }
        Value::Array(items) => items.iter().for_each(|item| collect_descriptions(item, out)),
        _ => {}
    }
}

/// Message text of an XML API error response: `<msg>` text, or its
/// `<line>` children joined.
pub(crate) fn xml_error_message(response: &XmlNode) -> String {
    let Some(msg) = response
        .get_child("msg")
        .or_else(|| response.get_child("result").and_then(|r| r.get_child("msg")))
    else {
        return "unknown error".to_string();
    };
    if let Some(text) = msg.text.as_deref() {
        return text.trim().to_string();
    }
    let lines: Vec<&str> = msg
        .get_children("line")
        .into_iter()
        .filter_map(|line| line.text.as_deref())
        .map(str::trim)
        .collect();
    if lines.is_empty() {
        "unknown error".to_string()
    } else {
        lines.join("; ")
    }
}
