//! dyna-pack converts Rust values into the tagged attribute documents of a DynamoDB-style
//! key/value store, and derives table key schemas from the same types.
//!
//! Types take part by implementing [`Attribute`]. Integers, strings, byte buffers, sequences,
//! string-keyed maps and `Option`/`Box`/`Arc` are supported out of the box. Records are declared
//! with the [`record!`] macro, where each field may carry a tag of the form
//! `[alt-name][,option]*`:
//!
//! - The alternate name, if present, is used as the attribute name instead of the field name.
//! - The `HASH` option marks the record's partition key. Every record needs exactly one.
//! - The `RANGE` option marks the record's optional sort key.
//!
//! ```
//! use dyna_pack::{create_table, put_item, record, MemoryTransport, Naming};
//!
//! record! {
//!     pub struct Book {
//!         pub isbn: String => "ISBN,HASH",
//!         pub title: String => "Title",
//!         pub pages: u32 => "Pages",
//!         pub tags: Vec<String> => "Tags",
//!     }
//! }
//!
//! let naming = Naming::new("library");
//! let store = MemoryTransport::new();
//! let table = create_table::<Book, _>(&store, &naming, 5, 5).unwrap();
//! assert_eq!(table.table_name, "library_Books");
//!
//! let book = Book {
//!     isbn: "978-0".into(),
//!     title: "Dune".into(),
//!     pages: 412,
//!     tags: Vec::new(),
//! };
//! let input = put_item(&store, &naming, &book).unwrap();
//! // Empty strings and sequences are never written
//! assert!(!input.item.contains_key("Tags"));
//! assert_eq!(input.item["Pages"].as_n(), Some("412"));
//! ```
//!
//! Encoding itself performs no I/O. Requests are handed to a [`Transport`], and table names
//! follow the convention `<prefix>_<TypeName>s`, with the prefix held by a [`Naming`]
//! configuration (usually loaded from the `DYNAPACK_PREFIX` environment variable).
//!
//! The encoder for each concrete type is resolved once and cached in a [`Classifier`]. Logging
//! goes through [`tracing`]; no subscriber is installed by this crate.

#[macro_use]
mod macros;

mod api;
mod attribute;
mod classify;
mod driver;
mod encode;
mod error;
mod naming;
mod number;
mod request;
mod schema;
mod shape;
mod tag;
mod transport;

pub use self::api::{create_table, derive_schema, marshal, put_item, table_name, Codec};
pub use self::attribute::{AttributeValue, Document};
pub use self::classify::{Classifier, Encoder};
pub use self::driver::{FieldDescriptor, KeyRole, RecordLayout};
pub use self::error::{Error, Result};
pub use self::naming::{Naming, PREFIX_ENV};
pub use self::number::Number;
pub use self::request::{CreateTableInput, PutItemInput};
pub use self::schema::{
    AttributeDefinition, KeySchemaElement, KeyType, ProvisionedThroughput, ScalarAttributeType,
    SchemaDescriptor,
};
pub use self::shape::{Attribute, FieldDef, Record, RecordHandle, Shape, TypeHandle, View};
pub use self::tag::{parse_tag, TagOptions, PARTITION_KEY, SORT_KEY};
pub use self::transport::{BoxError, MemoryTransport, Transport};
