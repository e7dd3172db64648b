//! Raw input document as written by hand, before normalization.

use std::fmt;

use serde::Deserialize;
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Telecommand,
    Telemetry,
}

impl MessageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::Telecommand => "telecommand",
            MessageKind::Telemetry => "telemetry",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Document {
    #[serde(default)]
    pub telecommands: Vec<RawMessage>,
    #[serde(default, alias = "telemetry")]
    pub telemetries: Vec<RawMessage>,
}

impl Document {
    pub fn from_json_str(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn message_count(&self) -> usize {
        self.telecommands.len() + self.telemetries.len()
    }
}

/// One telecommand or telemetry entry. Which lists are meaningful depends on
/// the category it was listed under.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct RawMessage {
    pub name: String,
    pub id: u32,
    #[serde(default)]
    pub description: Option<String>,
    /// Telecommand inputs.
    #[serde(default)]
    pub arguments: Option<Vec<RawField>>,
    /// Telemetry inputs.
    #[serde(default)]
    pub parameters: Option<Vec<RawField>>,
    /// Legacy single response field.
    #[serde(default, rename = "return")]
    pub legacy_return: Option<RawField>,
    #[serde(default)]
    pub returns: Option<Vec<RawField>>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct RawField {
    pub name: String,
    #[serde(rename = "type")]
    pub type_tag: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "enumName")]
    pub enum_name: Option<String>,
    #[serde(default)]
    pub values: Option<Vec<String>>,
    #[serde(default, rename = "stringLength", alias = "size")]
    pub string_length: Option<u64>,
    #[serde(default)]
    pub length: Option<u64>,
    #[serde(default)]
    pub default: Option<Value>,
}
