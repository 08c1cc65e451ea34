//! Wire codec for row keys, column names, cell values and filter values.
//!
//! The REST gateway transports every binary field as standard base64 text.
//! An [`Encoding`] decides how a textual [`Value`] maps to the bytes it stands
//! for, and how decoded bytes are handed back to the caller.

use crate::error::{HBaseLinkError, Result};
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Character encoding used to interpret textual values.
///
/// [`Encoding::Raw`] disables text conversion: decoded fields are returned as
/// [`Value::Bytes`] exactly as stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    #[default]
    Utf8,
    Latin1,
    Hex,
    Raw,
}

impl FromStr for Encoding {
    type Err = HBaseLinkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" => Ok(Encoding::Utf8),
            "latin1" | "binary" | "iso-8859-1" => Ok(Encoding::Latin1),
            "hex" => Ok(Encoding::Hex),
            "raw" | "none" | "null" | "buffer" => Ok(Encoding::Raw),
            other => Err(HBaseLinkError::ConfigurationError(format!(
                "Unsupported encoding '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Encoding::Utf8 => "utf8",
            Encoding::Latin1 => "latin1",
            Encoding::Hex => "hex",
            Encoding::Raw => "raw",
        };
        f.write_str(name)
    }
}

/// A row key, column, cell value or filter operand.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Text(String),
    Bytes(Vec<u8>),
}

impl Value {
    /// The bytes this value stands for under `encoding`.
    pub fn to_bytes(&self, encoding: Encoding) -> Result<Vec<u8>> {
        match self {
            Value::Bytes(bytes) => Ok(bytes.clone()),
            Value::Text(text) => match encoding {
                Encoding::Utf8 | Encoding::Raw => Ok(text.as_bytes().to_vec()),
                Encoding::Latin1 => latin1_to_bytes(text),
                Encoding::Hex => hex::decode(text).map_err(|e| {
                    HBaseLinkError::EncodingError(format!("'{}' is not a valid hex value: {}", text, e))
                }),
            },
        }
    }

    /// Interpret raw bytes according to `encoding`.
    ///
    /// Bytes that are not valid UTF-8 stay [`Value::Bytes`] under
    /// [`Encoding::Utf8`].
    pub fn from_bytes(bytes: Vec<u8>, encoding: Encoding) -> Self {
        match encoding {
            Encoding::Raw => Value::Bytes(bytes),
            Encoding::Utf8 => match String::from_utf8(bytes) {
                Ok(text) => Value::Text(text),
                Err(e) => Value::Bytes(e.into_bytes()),
            },
            Encoding::Latin1 => Value::Text(bytes.iter().map(|&b| b as char).collect()),
            Encoding::Hex => Value::Text(hex::encode(&bytes)),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            Value::Bytes(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Value::Text(text) => text.is_empty(),
            Value::Bytes(bytes) => bytes.is_empty(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(text) => f.write_str(text),
            Value::Bytes(bytes) => f.write_str(&String::from_utf8_lossy(bytes)),
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Bytes(bytes)
    }
}

impl From<&[u8]> for Value {
    fn from(bytes: &[u8]) -> Self {
        Value::Bytes(bytes.to_vec())
    }
}

/// Converts values to and from their base64 wire text under a fixed encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValueCodec {
    encoding: Encoding,
}

impl ValueCodec {
    pub fn new(encoding: Encoding) -> Self {
        Self { encoding }
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn encode(&self, value: &Value) -> Result<String> {
        let bytes = value.to_bytes(self.encoding)?;
        Ok(general_purpose::STANDARD.encode(bytes))
    }

    pub fn decode(&self, wire: &str) -> Result<Value> {
        let bytes = general_purpose::STANDARD
            .decode(wire.as_bytes())
            .map_err(|e| HBaseLinkError::EncodingError(format!("invalid base64 '{}': {}", wire, e)))?;
        Ok(Value::from_bytes(bytes, self.encoding))
    }
}

fn latin1_to_bytes(text: &str) -> Result<Vec<u8>> {
    text.chars()
        .map(|c| {
            u8::try_from(u32::from(c)).map_err(|_| {
                HBaseLinkError::EncodingError(format!("'{}' is not a latin1 character", c))
            })
        })
        .collect()
}
