//! Requests handed to a [`Transport`](crate::Transport).
//!
//! Both serialize to the store's JSON request shape.

use serde::{Deserialize, Serialize};

use crate::attribute::Document;
use crate::schema::{AttributeDefinition, KeySchemaElement, ProvisionedThroughput, SchemaDescriptor};

/// A whole-item write.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutItemInput {
    pub item: Document,
    pub table_name: String,
}

/// A table creation request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateTableInput {
    pub table_name: String,
    pub key_schema: Vec<KeySchemaElement>,
    pub attribute_definitions: Vec<AttributeDefinition>,
    pub provisioned_throughput: ProvisionedThroughput,
}

impl CreateTableInput {
    pub fn new(table_name: String, schema: SchemaDescriptor, write: i64, read: i64) -> Self {
        Self {
            table_name,
            key_schema: schema.key_schema,
            attribute_definitions: schema.attribute_definitions,
            provisioned_throughput: ProvisionedThroughput {
                read_capacity_units: read,
                write_capacity_units: write,
            },
        }
    }
}
