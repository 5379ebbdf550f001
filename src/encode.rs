//! Value encoding.
//!
//! Every encoder produces a canonical string for its value, and inserts an attribute into the
//! output document when one is given. Elements of sequences and values inside records nested
//! below the top level are encoded with no output document, purely for their string form.

use std::collections::HashSet;

use tracing::trace;

use crate::attribute::{AttributeValue, Document};
use crate::classify::{Classifier, Encoder};
use crate::driver::{FieldDescriptor, FieldSink};
use crate::error::{Error, Result};
use crate::schema::KeyType;
use crate::shape::{Attribute, View};

impl Encoder {
    /// Encode `value` as the attribute `name`.
    ///
    /// If `out` is given, the attribute is inserted into it, unless the value is absent or
    /// empty. The canonical string form is returned either way.
    pub fn encode(
        &self,
        classifier: &Classifier,
        out: Option<&mut Document>,
        name: &str,
        value: &dyn Attribute,
    ) -> Result<String> {
        match *self {
            Encoder::Numeric => {
                let num = match value.view() {
                    View::Number(num) => num,
                    view => return Err(unexpected("Number", &view)),
                };
                let canonical = num.to_string();
                if let Some(out) = out {
                    out.insert(name.to_string(), AttributeValue::N(canonical.clone()));
                }
                Ok(canonical)
            }
            Encoder::String => {
                let s = match value.view() {
                    View::Str(s) => s,
                    view => return Err(unexpected("Str", &view)),
                };
                if let Some(out) = out {
                    if !s.is_empty() {
                        out.insert(name.to_string(), AttributeValue::S(s.to_string()));
                    }
                }
                Ok(s.to_string())
            }
            Encoder::Bytes => {
                let bytes = match value.view() {
                    View::Bytes(bytes) => bytes,
                    view => return Err(unexpected("Bytes", &view)),
                };
                if bytes.is_empty() {
                    return Ok("[]".to_string());
                }
                let canonical = hex_form(&bytes);
                if let Some(out) = out {
                    out.insert(name.to_string(), AttributeValue::B(bytes.into_owned()));
                }
                Ok(canonical)
            }
            Encoder::Sequence { ref elem, numeric } => {
                let items = match value.view() {
                    View::Seq(items) => items,
                    view => return Err(unexpected("Seq", &view)),
                };
                if items.is_empty() {
                    return Ok("[]".to_string());
                }
                let mut canonical = Vec::with_capacity(items.len());
                let mut members = Vec::with_capacity(items.len());
                let mut seen = HashSet::with_capacity(items.len());
                for item in items {
                    let s = elem.encode(classifier, None, name, item)?;
                    // Sets can't hold empty or repeated members
                    if !s.is_empty() && seen.insert(s.clone()) {
                        members.push(s.clone());
                    }
                    canonical.push(s);
                }
                if let Some(out) = out {
                    if !members.is_empty() {
                        let set = if numeric {
                            AttributeValue::NS(members)
                        } else {
                            AttributeValue::SS(members)
                        };
                        out.insert(name.to_string(), set);
                    }
                }
                Ok(format!("[{}]", canonical.join(",")))
            }
            Encoder::Map { value: ref value_enc } => {
                let entries = match value.view() {
                    View::Map(entries) => entries,
                    view => return Err(unexpected("Map", &view)),
                };
                let mut nested = Document::new();
                let mut canonical = Vec::with_capacity(entries.len());
                for (k, v) in entries {
                    let key = match k.view() {
                        View::Str(key) => key,
                        view => return Err(unexpected("Str", &view)),
                    };
                    let s = value_enc.encode(classifier, Some(&mut nested), key, v)?;
                    canonical.push(format!("{}:{}", key, s));
                }
                if let Some(out) = out {
                    out.insert(name.to_string(), AttributeValue::M(nested));
                }
                Ok(format!("{{{}}}", canonical.join(",")))
            }
            Encoder::Indirect(ref inner) => match value.view() {
                View::Indirect(Some(v)) => inner.encode(classifier, out, name, v),
                View::Indirect(None) => Ok(String::new()),
                view => Err(unexpected("Indirect", &view)),
            },
            Encoder::Record(record) => {
                let values = match value.view() {
                    View::Record(values) => values,
                    view => return Err(unexpected("Record", &view)),
                };
                let layout = classifier.layout(record)?;
                let index = layout.partition().ok_or(Error::MissingKey {
                    record: record.name(),
                })?;
                let (field, field_value) = match (layout.fields().get(index), values.get(index)) {
                    (Some(field), Some(v)) => (field, *v),
                    _ => {
                        return Err(Error::MalformedStructure(format!(
                            "{} is missing the value of its partition key",
                            record.name()
                        )))
                    }
                };
                let key = classifier
                    .classify(field.ty)
                    .encode(classifier, None, &field.name, field_value)?;
                if let Some(out) = out {
                    if !key.is_empty() {
                        out.insert(name.to_string(), AttributeValue::S(key.clone()));
                    }
                }
                Ok(key)
            }
            Encoder::Unsupported(ty) => Err(Error::UnsupportedKind(ty)),
        }
    }
}

fn unexpected(expected: &str, view: &View) -> Error {
    Error::MalformedStructure(format!(
        "expected a {} view, got {}",
        expected,
        view.name()
    ))
}

/// Lowercase hex bytes, separated by spaces and wrapped in brackets.
fn hex_form(bytes: &[u8]) -> String {
    let hex: Vec<String> = bytes.iter().map(|b| format!("{:02x}", b)).collect();
    format!("[{}]", hex.join(" "))
}

/// Collects a record's fields into an attribute document.
#[derive(Clone, Debug, Default)]
pub(crate) struct ValueSink {
    item: Document,
}

impl ValueSink {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn into_document(self) -> Document {
        self.item
    }
}

impl FieldSink for ValueSink {
    fn needs_values(&self) -> bool {
        true
    }

    fn record_value_field(
        &mut self,
        classifier: &Classifier,
        field: &FieldDescriptor,
        value: &dyn Attribute,
    ) -> Result<()> {
        let canonical =
            classifier
                .classify(field.ty)
                .encode(classifier, Some(&mut self.item), &field.name, value)?;
        trace!(field = %field.name, canonical = %canonical, "encoded value");
        Ok(())
    }

    fn record_key_field(&mut self, _: &FieldDescriptor, _: KeyType) -> Result<()> {
        Ok(())
    }
}
