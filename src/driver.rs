//! The record driver.
//!
//! Both documents and key schemas are built by walking a record's direct fields once, in
//! declaration order, and handing each field to a [`FieldSink`]. The sink decides what the walk
//! produces; the driver enforces the structural rules shared by both:
//!
//! - At most one level of indirection above the record is unwrapped.
//! - Exactly one field is the partition key, and at most one is the sort key.
//! - Attribute names are unique within the record, and never a reserved key-role token.

use std::collections::HashSet;

use tracing::trace;

use crate::classify::Classifier;
use crate::error::{Error, Result};
use crate::schema::KeyType;
use crate::shape::{Attribute, RecordHandle, Shape, TypeHandle, View};
use crate::tag::{parse_tag, PARTITION_KEY, SORT_KEY};

/// The part a field plays in the record's primary key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyRole {
    None,
    Partition,
    Sort,
}

impl KeyRole {
    pub fn key_type(&self) -> Option<KeyType> {
        match *self {
            KeyRole::None => None,
            KeyRole::Partition => Some(KeyType::Hash),
            KeyRole::Sort => Some(KeyType::Range),
        }
    }
}

/// A record field, resolved from its declaration and tag.
#[derive(Clone, Debug)]
pub struct FieldDescriptor {
    /// The attribute name: the tag's alternate name if given, else the field's own name.
    pub name: String,
    pub role: KeyRole,
    pub ty: TypeHandle,
}

/// The resolved fields of a record type.
#[derive(Clone, Debug)]
pub struct RecordLayout {
    record: RecordHandle,
    fields: Vec<FieldDescriptor>,
    partition: Option<usize>,
    sort: Option<usize>,
}

impl RecordLayout {
    /// Resolve every field tag of a record.
    ///
    /// Fails if a resolved name is `HASH` or `RANGE` (usually a tag missing its leading comma),
    /// if two fields resolve to the same name, or if a key role is claimed twice. A missing
    /// partition key is left for the driver to report.
    pub(crate) fn resolve(record: RecordHandle) -> Result<Self> {
        let defs = record.fields();
        let mut fields = Vec::with_capacity(defs.len());
        let mut names = HashSet::with_capacity(defs.len());
        let mut partition = None;
        let mut sort = None;
        for (index, def) in defs.into_iter().enumerate() {
            let (alt_name, options) = parse_tag(def.tag);
            if alt_name == PARTITION_KEY || alt_name == SORT_KEY {
                return Err(Error::InvalidFieldName(format!(
                    "{}.{} can't be named {} (is the tag missing a leading comma?)",
                    record.name(),
                    def.name,
                    alt_name
                )));
            }
            let name = if alt_name.is_empty() {
                def.name
            } else {
                alt_name
            };
            if !names.insert(name) {
                return Err(Error::InvalidFieldName(format!(
                    "{}.{} reuses the attribute name {}",
                    record.name(),
                    def.name,
                    name
                )));
            }

            let role = if options.contains(PARTITION_KEY) {
                KeyRole::Partition
            } else if options.contains(SORT_KEY) {
                KeyRole::Sort
            } else {
                KeyRole::None
            };
            let claimed = match role {
                KeyRole::Partition => Some((&mut partition, PARTITION_KEY)),
                KeyRole::Sort => Some((&mut sort, SORT_KEY)),
                KeyRole::None => None,
            };
            if let Some((slot, key_type)) = claimed {
                if slot.is_some() {
                    return Err(Error::DuplicateKey {
                        record: record.name(),
                        key_type,
                    });
                }
                *slot = Some(index);
            }

            fields.push(FieldDescriptor {
                name: name.to_string(),
                role,
                ty: def.ty,
            });
        }
        Ok(Self {
            record,
            fields,
            partition,
            sort,
        })
    }

    pub fn record(&self) -> RecordHandle {
        self.record
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Index of the partition key field, if one was declared.
    pub fn partition(&self) -> Option<usize> {
        self.partition
    }

    /// Index of the sort key field, if one was declared.
    pub fn sort(&self) -> Option<usize> {
        self.sort
    }
}

/// Receives the fields of a record as the driver walks it.
pub(crate) trait FieldSink {
    /// Whether this sink needs field values. A sink that does can't be driven by a type alone.
    fn needs_values(&self) -> bool;

    /// Called for every field, in declaration order, when the driver has a value to walk.
    fn record_value_field(
        &mut self,
        classifier: &Classifier,
        field: &FieldDescriptor,
        value: &dyn Attribute,
    ) -> Result<()>;

    /// Called for every field that has a key role, in declaration order.
    fn record_key_field(&mut self, field: &FieldDescriptor, key_type: KeyType) -> Result<()>;
}

/// Walk a record, feeding its fields to `sink`.
///
/// `ty` is the type being encoded. It must be a record, or a single level of indirection to
/// one. If `value` is given, it must be a value of `ty`; if not, only the type is walked and
/// `sink` must not need values. Returns the record's handle.
pub(crate) fn encode<S: FieldSink + ?Sized>(
    classifier: &Classifier,
    sink: &mut S,
    ty: TypeHandle,
    value: Option<&dyn Attribute>,
) -> Result<RecordHandle> {
    // Allow one level of indirection
    let (ty, value) = match ty.shape() {
        Shape::Indirect(inner) => match value.map(|v| v.view()) {
            None => (inner, None),
            Some(View::Indirect(Some(v))) => (inner, Some(v)),
            Some(View::Indirect(None)) => {
                return Err(Error::MalformedStructure(format!(
                    "can't encode an absent {}",
                    ty.name()
                )))
            }
            Some(view) => return Err(mismatch(ty, &view)),
        },
        _ => (ty, value),
    };

    let record = direct_record(ty)?;
    let values = match value.map(|v| v.view()) {
        Some(View::Record(values)) => Some(values),
        Some(view) => return Err(mismatch(ty, &view)),
        None if sink.needs_values() => {
            return Err(Error::InvalidEncoderContext(format!(
                "a value is required to encode {}",
                record.name()
            )))
        }
        None => None,
    };

    let layout = classifier.layout(record)?;
    if let Some(ref values) = values {
        if values.len() != layout.fields().len() {
            return Err(Error::MalformedStructure(format!(
                "{} declares {} fields but has {} values",
                record.name(),
                layout.fields().len(),
                values.len()
            )));
        }
    }

    let mut found_partition = false;
    for (index, field) in layout.fields().iter().enumerate() {
        trace!(record = record.name(), field = %field.name, role = ?field.role, "encoding field");
        if let Some(ref values) = values {
            sink.record_value_field(classifier, field, values[index])?;
        }
        if let Some(key_type) = field.role.key_type() {
            sink.record_key_field(field, key_type)?;
        }
        found_partition = found_partition || field.role == KeyRole::Partition;
    }
    if !found_partition {
        return Err(Error::MissingKey {
            record: record.name(),
        });
    }
    Ok(record)
}

/// Find the record a type encodes as, unwrapping at most one level of indirection.
pub(crate) fn record_of(ty: TypeHandle) -> Result<RecordHandle> {
    match ty.shape() {
        Shape::Indirect(inner) => direct_record(inner),
        _ => direct_record(ty),
    }
}

fn direct_record(ty: TypeHandle) -> Result<RecordHandle> {
    match ty.shape() {
        Shape::Record(record) => Ok(record),
        Shape::Indirect(_) => Err(Error::MalformedStructure(format!(
            "only one level of indirection is allowed above a record, got {}",
            ty.name()
        ))),
        _ => Err(Error::MalformedStructure(format!(
            "only records can be encoded, got {}",
            ty.name()
        ))),
    }
}

fn mismatch(ty: TypeHandle, view: &View) -> Error {
    Error::MalformedStructure(format!(
        "{} produced a {} view that doesn't match its shape",
        ty.name(),
        view.name()
    ))
}
