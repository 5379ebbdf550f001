use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// An attribute document: attribute names mapped to their values.
///
/// Attribute order carries no meaning to the store. Documents are kept ordered by name so that
/// equal documents compare, print, and serialize identically.
pub type Document = BTreeMap<String, AttributeValue>;

/// A single attribute value, in the store's tagged form.
///
/// Serializes to the store's JSON wire shape, e.g. `{"S":"x1"}`, `{"N":"5"}`, or
/// `{"NS":["1","2"]}`. Binary payloads are base64 text in human-readable formats and raw bytes
/// in binary ones.
///
/// There is no "absent" variant: an absent value is an attribute that was never inserted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeValue {
    /// A number, in canonical decimal form.
    N(String),
    /// A non-empty string.
    S(String),
    /// A non-empty binary blob.
    B(#[serde(with = "binary")] Vec<u8>),
    /// A non-empty set of numbers, in canonical decimal form.
    NS(Vec<String>),
    /// A non-empty set of strings.
    SS(Vec<String>),
    /// A nested document.
    M(Document),
}

impl AttributeValue {
    /// The store's type descriptor for this value (`"N"`, `"S"`, `"B"`, `"NS"`, `"SS"`, or
    /// `"M"`).
    pub fn type_descriptor(&self) -> &'static str {
        match *self {
            AttributeValue::N(_) => "N",
            AttributeValue::S(_) => "S",
            AttributeValue::B(_) => "B",
            AttributeValue::NS(_) => "NS",
            AttributeValue::SS(_) => "SS",
            AttributeValue::M(_) => "M",
        }
    }

    pub fn is_n(&self) -> bool {
        matches!(self, AttributeValue::N(_))
    }

    pub fn is_s(&self) -> bool {
        matches!(self, AttributeValue::S(_))
    }

    pub fn is_b(&self) -> bool {
        matches!(self, AttributeValue::B(_))
    }

    pub fn is_ns(&self) -> bool {
        matches!(self, AttributeValue::NS(_))
    }

    pub fn is_ss(&self) -> bool {
        matches!(self, AttributeValue::SS(_))
    }

    pub fn is_m(&self) -> bool {
        matches!(self, AttributeValue::M(_))
    }

    pub fn as_n(&self) -> Option<&str> {
        if let AttributeValue::N(ref val) = *self {
            Some(val)
        } else {
            None
        }
    }

    pub fn as_s(&self) -> Option<&str> {
        if let AttributeValue::S(ref val) = *self {
            Some(val)
        } else {
            None
        }
    }

    pub fn as_b(&self) -> Option<&[u8]> {
        if let AttributeValue::B(ref val) = *self {
            Some(val)
        } else {
            None
        }
    }

    pub fn as_ns(&self) -> Option<&[String]> {
        if let AttributeValue::NS(ref val) = *self {
            Some(val)
        } else {
            None
        }
    }

    pub fn as_ss(&self) -> Option<&[String]> {
        if let AttributeValue::SS(ref val) = *self {
            Some(val)
        } else {
            None
        }
    }

    pub fn as_m(&self) -> Option<&Document> {
        if let AttributeValue::M(ref val) = *self {
            Some(val)
        } else {
            None
        }
    }
}

impl From<crate::Number> for AttributeValue {
    fn from(v: crate::Number) -> Self {
        AttributeValue::N(v.to_string())
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        AttributeValue::S(v.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        AttributeValue::S(v)
    }
}

impl From<Vec<u8>> for AttributeValue {
    fn from(v: Vec<u8>) -> Self {
        AttributeValue::B(v)
    }
}

impl From<Document> for AttributeValue {
    fn from(v: Document) -> Self {
        AttributeValue::M(v)
    }
}

mod binary {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&STANDARD.encode(bytes))
        } else {
            serde_bytes::serialize(bytes, serializer)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        if deserializer.is_human_readable() {
            let text = String::deserialize(deserializer)?;
            STANDARD.decode(text).map_err(de::Error::custom)
        } else {
            serde_bytes::deserialize(deserializer)
        }
    }
}
