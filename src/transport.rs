//! The boundary to the store.
//!
//! Encoding never performs I/O. Requests built by the encoders are handed to a [`Transport`],
//! whose errors are passed back to the caller unchanged as [`Error::Transport`].
//!
//! [`Error::Transport`]: crate::Error::Transport

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use crate::attribute::{AttributeValue, Document};
use crate::request::{CreateTableInput, PutItemInput};
use crate::schema::KeySchemaElement;

/// Error type returned by transports.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Something that can carry requests to the store.
pub trait Transport {
    /// Names of the tables that currently exist.
    fn list_table_names(&self) -> Result<Vec<String>, BoxError>;

    fn create_table(&self, input: &CreateTableInput) -> Result<(), BoxError>;

    fn put_item(&self, input: &PutItemInput) -> Result<(), BoxError>;
}

#[derive(Debug)]
struct Table {
    definition: CreateTableInput,
    items: Vec<Document>,
}

impl Table {
    /// Pull the key attributes out of an item. Fails if any are missing.
    fn key_of(&self, item: &Document) -> Result<Vec<AttributeValue>, BoxError> {
        self.definition
            .key_schema
            .iter()
            .map(|KeySchemaElement { attribute_name, .. }| {
                item.get(attribute_name).cloned().ok_or_else(|| {
                    BoxError::from(format!(
                        "item for {} is missing key attribute {}",
                        self.definition.table_name, attribute_name
                    ))
                })
            })
            .collect()
    }
}

/// An in-process store, for tests and demos.
///
/// Tables must be created before items are put into them. Putting an item whose key matches an
/// existing item replaces it.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    tables: Mutex<BTreeMap<String, Table>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// The creation request a table was made from, if it exists.
    pub fn table(&self, name: &str) -> Option<CreateTableInput> {
        self.lock().get(name).map(|t| t.definition.clone())
    }

    /// All items in a table, in the order they were first put. Empty if the table doesn't
    /// exist.
    pub fn items(&self, name: &str) -> Vec<Document> {
        self.lock()
            .get(name)
            .map(|t| t.items.clone())
            .unwrap_or_default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Table>> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Transport for MemoryTransport {
    fn list_table_names(&self) -> Result<Vec<String>, BoxError> {
        Ok(self.lock().keys().cloned().collect())
    }

    fn create_table(&self, input: &CreateTableInput) -> Result<(), BoxError> {
        let mut tables = self.lock();
        if tables.contains_key(&input.table_name) {
            return Err(format!("table {} already exists", input.table_name).into());
        }
        tables.insert(
            input.table_name.clone(),
            Table {
                definition: input.clone(),
                items: Vec::new(),
            },
        );
        Ok(())
    }

    fn put_item(&self, input: &PutItemInput) -> Result<(), BoxError> {
        let mut tables = self.lock();
        let table = tables
            .get_mut(&input.table_name)
            .ok_or_else(|| format!("table {} doesn't exist", input.table_name))?;
        let key = table.key_of(&input.item)?;
        let mut existing = None;
        for (index, item) in table.items.iter().enumerate() {
            if table.key_of(item)? == key {
                existing = Some(index);
                break;
            }
        }
        match existing {
            Some(index) => table.items[index] = input.item.clone(),
            None => table.items.push(input.item.clone()),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{AttributeDefinition, KeyType, ScalarAttributeType, SchemaDescriptor};

    fn definition(name: &str) -> CreateTableInput {
        let schema = SchemaDescriptor {
            key_schema: vec![KeySchemaElement {
                attribute_name: "ID".to_string(),
                key_type: KeyType::Hash,
            }],
            attribute_definitions: vec![AttributeDefinition {
                attribute_name: "ID".to_string(),
                attribute_type: ScalarAttributeType::S,
            }],
        };
        CreateTableInput::new(name.to_string(), schema, 1, 1)
    }

    fn put(id: &str, note: &str) -> PutItemInput {
        let mut item = Document::new();
        item.insert("ID".to_string(), AttributeValue::from(id));
        item.insert("Note".to_string(), AttributeValue::from(note));
        PutItemInput {
            item,
            table_name: "t_Items".to_string(),
        }
    }

    #[test]
    fn tables() {
        let store = MemoryTransport::new();
        assert!(store.list_table_names().unwrap().is_empty());
        store.create_table(&definition("t_Items")).unwrap();
        assert_eq!(store.list_table_names().unwrap(), vec!["t_Items".to_string()]);
        assert!(store.create_table(&definition("t_Items")).is_err());
        assert_eq!(store.table("t_Items"), Some(definition("t_Items")));
        assert_eq!(store.table("t_Other"), None);
    }

    #[test]
    fn items_replace_by_key() {
        let store = MemoryTransport::new();
        assert!(store.put_item(&put("a", "first")).is_err(), "No table to put into yet");
        store.create_table(&definition("t_Items")).unwrap();
        store.put_item(&put("a", "first")).unwrap();
        store.put_item(&put("b", "second")).unwrap();
        store.put_item(&put("a", "third")).unwrap();
        let items = store.items("t_Items");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["Note"].as_s(), Some("third"));
        assert_eq!(items[1]["ID"].as_s(), Some("b"));
    }

    #[test]
    fn items_need_keys() {
        let store = MemoryTransport::new();
        store.create_table(&definition("t_Items")).unwrap();
        let mut input = put("a", "note");
        input.item.remove("ID");
        assert!(store.put_item(&input).is_err());
        assert!(store.items("t_Items").is_empty());
    }
}
