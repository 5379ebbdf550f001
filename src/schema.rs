//! Key schema derivation.
//!
//! Only a record's direct fields take part, and only those carrying a key role. Every key field
//! gets a key schema element and an attribute definition declaring its scalar type.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::classify::Classifier;
use crate::driver::{FieldDescriptor, FieldSink};
use crate::error::Result;
use crate::shape::{Attribute, TypeHandle};

/// The role of a key attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyType {
    /// Partition key.
    #[serde(rename = "HASH")]
    Hash,
    /// Sort key.
    #[serde(rename = "RANGE")]
    Range,
}

impl KeyType {
    pub fn as_str(&self) -> &'static str {
        match *self {
            KeyType::Hash => crate::tag::PARTITION_KEY,
            KeyType::Range => crate::tag::SORT_KEY,
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The scalar type declared for a key attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarAttributeType {
    N,
    S,
    B,
}

impl ScalarAttributeType {
    /// Pick the declared type for a key field: `N` if it is numeric once indirection is
    /// removed, `B` if it is a byte blob, and `S` for everything else.
    pub fn of(ty: TypeHandle) -> Self {
        if ty.is_numeric() {
            ScalarAttributeType::N
        } else if ty.is_bytes() {
            ScalarAttributeType::B
        } else {
            ScalarAttributeType::S
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeySchemaElement {
    pub attribute_name: String,
    pub key_type: KeyType,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AttributeDefinition {
    pub attribute_name: String,
    pub attribute_type: ScalarAttributeType,
}

/// Read and write capacity to provision for a new table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProvisionedThroughput {
    pub read_capacity_units: i64,
    pub write_capacity_units: i64,
}

/// The key schema of a record type.
///
/// The partition key always comes first, in both lists.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SchemaDescriptor {
    pub key_schema: Vec<KeySchemaElement>,
    pub attribute_definitions: Vec<AttributeDefinition>,
}

impl SchemaDescriptor {
    /// Derive the key schema of `T`, which must be a record or a single level of indirection
    /// to one.
    pub fn of<T: Attribute>(classifier: &Classifier) -> Result<Self> {
        let mut sink = SchemaSink::default();
        crate::driver::encode(classifier, &mut sink, TypeHandle::of::<T>(), None)?;
        Ok(sink.schema)
    }

    /// Look up the key schema element with the given role.
    pub fn key(&self, key_type: KeyType) -> Option<&KeySchemaElement> {
        self.key_schema.iter().find(|k| k.key_type == key_type)
    }
}

/// Collects key fields into a schema descriptor. Never needs values.
#[derive(Clone, Debug, Default)]
pub(crate) struct SchemaSink {
    schema: SchemaDescriptor,
}

impl FieldSink for SchemaSink {
    fn needs_values(&self) -> bool {
        false
    }

    fn record_value_field(
        &mut self,
        _: &Classifier,
        _: &FieldDescriptor,
        _: &dyn Attribute,
    ) -> Result<()> {
        Ok(())
    }

    fn record_key_field(&mut self, field: &FieldDescriptor, key_type: KeyType) -> Result<()> {
        let element = KeySchemaElement {
            attribute_name: field.name.clone(),
            key_type,
        };
        let definition = AttributeDefinition {
            attribute_name: field.name.clone(),
            attribute_type: ScalarAttributeType::of(field.ty),
        };
        // The partition key goes first, even if declared after the sort key
        let schema = &mut self.schema;
        if key_type == KeyType::Hash {
            schema.key_schema.insert(0, element);
            schema.attribute_definitions.insert(0, definition);
        } else {
            schema.key_schema.push(element);
            schema.attribute_definitions.push(definition);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;
    use crate::Error;
    use serde_json::json;

    record! {
        struct Event {
            when: i64 => "When,RANGE",
            note: String,
            source: String => "Source,HASH",
        }
    }

    record! {
        struct Blob {
            digest: Vec<u8> => ",HASH",
            size: Option<u64> => ",RANGE",
        }
    }

    record! {
        struct Plain {
            name: String => "Name",
        }
    }

    #[test]
    fn partition_first() {
        let c = Classifier::new();
        let schema = SchemaDescriptor::of::<Event>(&c).unwrap();
        assert_eq!(
            schema.key_schema,
            vec![
                KeySchemaElement {
                    attribute_name: "Source".to_string(),
                    key_type: KeyType::Hash,
                },
                KeySchemaElement {
                    attribute_name: "When".to_string(),
                    key_type: KeyType::Range,
                },
            ]
        );
        assert_eq!(
            schema.attribute_definitions,
            vec![
                AttributeDefinition {
                    attribute_name: "Source".to_string(),
                    attribute_type: ScalarAttributeType::S,
                },
                AttributeDefinition {
                    attribute_name: "When".to_string(),
                    attribute_type: ScalarAttributeType::N,
                },
            ]
        );
        assert_eq!(schema.key(KeyType::Range).unwrap().attribute_name, "When");
    }

    #[test]
    fn attribute_types() {
        let c = Classifier::new();
        let schema = SchemaDescriptor::of::<Blob>(&c).unwrap();
        let types: Vec<_> = schema
            .attribute_definitions
            .iter()
            .map(|d| d.attribute_type)
            .collect();
        assert_eq!(types, vec![ScalarAttributeType::B, ScalarAttributeType::N]);
        // Indirection is fine above the record too
        assert_eq!(SchemaDescriptor::of::<Box<Blob>>(&c).unwrap(), schema);
    }

    #[test]
    fn needs_partition_key() {
        let c = Classifier::new();
        assert!(matches!(
            SchemaDescriptor::of::<Plain>(&c),
            Err(Error::MissingKey { record: "Plain" })
        ));
        assert!(matches!(
            SchemaDescriptor::of::<String>(&c),
            Err(Error::MalformedStructure(_))
        ));
    }

    #[test]
    fn wire_shape() {
        let c = Classifier::new();
        let schema = SchemaDescriptor::of::<Event>(&c).unwrap();
        assert_eq!(
            serde_json::to_value(&schema).unwrap(),
            json!({
                "KeySchema": [
                    { "AttributeName": "Source", "KeyType": "HASH" },
                    { "AttributeName": "When", "KeyType": "RANGE" },
                ],
                "AttributeDefinitions": [
                    { "AttributeName": "Source", "AttributeType": "S" },
                    { "AttributeName": "When", "AttributeType": "N" },
                ],
            })
        );
        assert_eq!(KeyType::Hash.to_string(), "HASH");
    }
}
