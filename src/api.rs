use tracing::{info, warn};

use crate::classify::Classifier;
use crate::driver;
use crate::encode::ValueSink;
use crate::error::{Error, Result};
use crate::naming::Naming;
use crate::request::{CreateTableInput, PutItemInput};
use crate::schema::SchemaDescriptor;
use crate::shape::{Attribute, TypeHandle};
use crate::transport::Transport;

/// An encoding session: a dispatch cache and a naming configuration.
///
/// The free functions in this crate use the process-wide [`Classifier`] and take the naming
/// configuration as an argument. A `Codec` bundles the two, and can use a private classifier.
#[derive(Clone, Copy, Debug)]
pub struct Codec<'a> {
    classifier: &'a Classifier,
    naming: &'a Naming,
}

impl<'a> Codec<'a> {
    /// A session using the process-wide classifier.
    pub fn new(naming: &'a Naming) -> Self {
        Self::with_classifier(Classifier::global(), naming)
    }

    pub fn with_classifier(classifier: &'a Classifier, naming: &'a Naming) -> Self {
        Self { classifier, naming }
    }

    pub fn classifier(&self) -> &'a Classifier {
        self.classifier
    }

    pub fn naming(&self) -> &'a Naming {
        self.naming
    }

    /// The table name for records of type `T`, which must be a record or a single level of
    /// indirection to one.
    pub fn table_name<T: Attribute>(&self) -> Result<String> {
        let record = driver::record_of(TypeHandle::of::<T>())?;
        self.naming.table_name(record.name())
    }

    /// Encode a record into a whole-item write for its table.
    pub fn marshal<T: Attribute>(&self, value: &T) -> Result<PutItemInput> {
        let mut sink = ValueSink::new();
        let record = driver::encode(self.classifier, &mut sink, TypeHandle::of::<T>(), Some(value))?;
        Ok(PutItemInput {
            item: sink.into_document(),
            table_name: self.naming.table_name(record.name())?,
        })
    }

    /// Derive a table creation request for records of type `T`, with the given write and read
    /// capacity.
    ///
    /// Fails with [`Error::TableAlreadyExists`] if the transport already lists the table.
    pub fn derive_schema<T: Attribute, X: Transport + ?Sized>(
        &self,
        transport: &X,
        write: i64,
        read: i64,
    ) -> Result<CreateTableInput> {
        let table_name = self.table_name::<T>()?;
        if transport.list_table_names()?.contains(&table_name) {
            warn!(table = %table_name, "table already exists");
            return Err(Error::TableAlreadyExists(table_name));
        }
        let schema = SchemaDescriptor::of::<T>(self.classifier)?;
        Ok(CreateTableInput::new(table_name, schema, write, read))
    }

    /// Derive the table for records of type `T` and ask the transport to create it. Returns the
    /// request that was sent.
    pub fn create_table<T: Attribute, X: Transport + ?Sized>(
        &self,
        transport: &X,
        write: i64,
        read: i64,
    ) -> Result<CreateTableInput> {
        let input = self.derive_schema::<T, X>(transport, write, read)?;
        transport.create_table(&input)?;
        info!(table = %input.table_name, read, write, "created table");
        Ok(input)
    }

    /// Encode a record and write it through the transport. Returns the request that was sent.
    pub fn put_item<T: Attribute, X: Transport + ?Sized>(
        &self,
        transport: &X,
        value: &T,
    ) -> Result<PutItemInput> {
        let input = self.marshal(value)?;
        transport.put_item(&input)?;
        info!(table = %input.table_name, attributes = input.item.len(), "put item");
        Ok(input)
    }
}

/// Encode a record into a whole-item write for its table.
///
/// ```
/// use dyna_pack::{marshal, record, AttributeValue, Naming};
///
/// record! {
///     pub struct Record {
///         pub id: String => "ID,HASH",
///         pub count: i64 => "Count",
///     }
/// }
///
/// let naming = Naming::new("test");
/// let input = marshal(&Record { id: "x1".into(), count: 5 }, &naming).unwrap();
/// assert_eq!(input.table_name, "test_Records");
/// assert_eq!(input.item["ID"], AttributeValue::S("x1".into()));
/// assert_eq!(input.item["Count"], AttributeValue::N("5".into()));
/// ```
pub fn marshal<T: Attribute>(value: &T, naming: &Naming) -> Result<PutItemInput> {
    Codec::new(naming).marshal(value)
}

/// Derive a table creation request for records of type `T`. See [`Codec::derive_schema`].
pub fn derive_schema<T: Attribute, X: Transport + ?Sized>(
    transport: &X,
    naming: &Naming,
    write: i64,
    read: i64,
) -> Result<CreateTableInput> {
    Codec::new(naming).derive_schema::<T, X>(transport, write, read)
}

/// Derive and create the table for records of type `T`. See [`Codec::create_table`].
pub fn create_table<T: Attribute, X: Transport + ?Sized>(
    transport: &X,
    naming: &Naming,
    write: i64,
    read: i64,
) -> Result<CreateTableInput> {
    Codec::new(naming).create_table::<T, X>(transport, write, read)
}

/// Encode a record and write it through the transport. See [`Codec::put_item`].
pub fn put_item<T: Attribute, X: Transport + ?Sized>(
    transport: &X,
    naming: &Naming,
    value: &T,
) -> Result<PutItemInput> {
    Codec::new(naming).put_item(transport, value)
}

/// The table name for records of type `T`.
pub fn table_name<T: Attribute>(naming: &Naming) -> Result<String> {
    Codec::new(naming).table_name::<T>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{AttributeValue, Document};
    use crate::record;
    use crate::schema::{KeyType, ScalarAttributeType};
    use crate::transport::{BoxError, MemoryTransport};
    use rand::Rng;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    record! {
        struct Record {
            id: String => "ID,HASH",
            count: i64 => "Count",
        }
    }

    record! {
        struct Profile {
            user: String => ",HASH",
            revision: u32 => ",RANGE",
            bio: String,
            avatar: Vec<u8> => "Avatar",
            scores: Vec<i64>,
            tags: Vec<String>,
            attrs: BTreeMap<String, String>,
            nickname: Option<String>,
            owner: Option<Box<Record>>,
        }
    }

    record! {
        struct Node {
            id: String => ",HASH",
            next: Option<Box<Node>>,
        }
    }

    record! {
        struct Anonymous {
            note: String,
        }
    }

    /// A transport whose every call fails
    struct Broken;

    impl Transport for Broken {
        fn list_table_names(&self) -> std::result::Result<Vec<String>, BoxError> {
            Err("connection refused".into())
        }

        fn create_table(&self, _: &CreateTableInput) -> std::result::Result<(), BoxError> {
            Err("connection refused".into())
        }

        fn put_item(&self, _: &PutItemInput) -> std::result::Result<(), BoxError> {
            Err("connection refused".into())
        }
    }

    fn word<R: Rng>(rng: &mut R) -> String {
        let len = rng.gen_range(0..6);
        (0..len).map(|_| rng.gen_range('a'..='z')).collect()
    }

    fn random_profile<R: Rng>(rng: &mut R) -> Profile {
        let mut attrs = BTreeMap::new();
        for _ in 0..rng.gen_range(0..4) {
            attrs.insert(word(rng), word(rng));
        }
        Profile {
            user: word(rng),
            revision: rng.gen(),
            bio: word(rng),
            avatar: (0..rng.gen_range(0..8)).map(|_| rng.gen()).collect(),
            scores: (0..rng.gen_range(0..5)).map(|_| rng.gen()).collect(),
            tags: (0..rng.gen_range(0..5)).map(|_| word(rng)).collect(),
            attrs,
            nickname: if rng.gen() { Some(word(rng)) } else { None },
            owner: if rng.gen() {
                Some(Box::new(Record {
                    id: word(rng),
                    count: rng.gen(),
                }))
            } else {
                None
            },
        }
    }

    #[test]
    fn simple_record() {
        let naming = Naming::new("test");
        let input = marshal(
            &Record {
                id: "x1".to_string(),
                count: 5,
            },
            &naming,
        )
        .unwrap();
        let mut expected = Document::new();
        expected.insert("ID".to_string(), AttributeValue::S("x1".to_string()));
        expected.insert("Count".to_string(), AttributeValue::N("5".to_string()));
        assert_eq!(input.item, expected);
        assert_eq!(input.table_name, "test_Records");
        assert_eq!(table_name::<Record>(&naming).unwrap(), "test_Records");
        assert_eq!(table_name::<Box<Record>>(&naming).unwrap(), "test_Records");
    }

    #[test]
    fn full_record() {
        let naming = Naming::new("test");
        let mut attrs = BTreeMap::new();
        attrs.insert("a".to_string(), "1".to_string());
        let profile = Profile {
            user: "u".to_string(),
            revision: 0,
            bio: String::new(),
            avatar: vec![0xDE, 0xAD],
            scores: vec![1, 2, 3],
            tags: Vec::new(),
            attrs,
            nickname: None,
            owner: Some(Box::new(Record {
                id: "r1".to_string(),
                count: 9,
            })),
        };
        let item = marshal(&profile, &naming).unwrap().item;
        let names: Vec<_> = item.keys().map(|k| k.as_str()).collect();
        assert_eq!(names, vec!["Avatar", "attrs", "owner", "revision", "scores", "user"]);
        assert_eq!(item["revision"].as_n(), Some("0"));
        assert_eq!(item["Avatar"].as_b(), Some(&[0xDE, 0xAD][..]));
        assert_eq!(
            item["scores"],
            AttributeValue::NS(vec!["1".to_string(), "2".to_string(), "3".to_string()])
        );
        assert_eq!(item["attrs"].as_m().unwrap()["a"].as_s(), Some("1"));
        assert_eq!(item["owner"].as_s(), Some("r1"));
    }

    #[test]
    fn self_referential() {
        let naming = Naming::new("test");
        let node = Node {
            id: "a".to_string(),
            next: Some(Box::new(Node {
                id: "b".to_string(),
                next: None,
            })),
        };
        let item = marshal(&node, &naming).unwrap().item;
        assert_eq!(item["id"].as_s(), Some("a"));
        assert_eq!(item["next"].as_s(), Some("b"));
    }

    #[test]
    fn rejects_bad_targets() {
        let naming = Naming::new("test");
        let err = marshal(
            &Anonymous {
                note: "n".to_string(),
            },
            &naming,
        )
        .unwrap_err();
        assert!(matches!(err, Error::MissingKey { record: "Anonymous" }));
        assert!(matches!(marshal(&5i64, &naming), Err(Error::MalformedStructure(_))));
        assert!(matches!(
            marshal(&None::<Record>, &naming),
            Err(Error::MalformedStructure(_))
        ));
        let double = Some(Box::new(Record {
            id: "x".to_string(),
            count: 1,
        }));
        assert!(matches!(marshal(&double, &naming), Err(Error::MalformedStructure(_))));
        assert!(matches!(
            table_name::<String>(&naming),
            Err(Error::MalformedStructure(_))
        ));
    }

    #[test]
    fn idempotent() {
        let naming = Naming::new("test");
        let mut rng = rand::thread_rng();
        for _ in 0..64 {
            let profile = random_profile(&mut rng);
            let first = marshal(&profile, &naming).unwrap();
            let second = marshal(&profile, &naming).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn classification_is_cached() {
        let classifier = Classifier::new();
        let naming = Naming::new("test");
        let codec = Codec::with_classifier(&classifier, &naming);
        let record = Record {
            id: "x".to_string(),
            count: 1,
        };
        codec.marshal(&record).unwrap();
        let classified = classifier.classifications();
        assert_eq!(classified, 2, "One classification each for String and i64");
        assert_eq!(classifier.layout_resolutions(), 1);
        for _ in 0..10 {
            codec.marshal(&record).unwrap();
        }
        assert_eq!(classifier.classifications(), classified);
        assert_eq!(classifier.layout_resolutions(), 1);
    }

    #[test]
    fn concurrent_marshal() {
        let classifier = Arc::new(Classifier::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let classifier = classifier.clone();
                std::thread::spawn(move || {
                    let naming = Naming::new("test");
                    let codec = Codec::with_classifier(&classifier, &naming);
                    codec
                        .marshal(&Record {
                            id: format!("id{}", i),
                            count: i,
                        })
                        .unwrap()
                })
            })
            .collect();
        for (i, handle) in handles.into_iter().enumerate() {
            let input = handle.join().unwrap();
            assert_eq!(input.item["ID"].as_s(), Some(format!("id{}", i).as_str()));
        }
    }

    #[test]
    fn schema_and_tables() {
        let naming = Naming::new("test");
        let store = MemoryTransport::new();
        let input = derive_schema::<Profile, _>(&store, &naming, 5, 10).unwrap();
        assert_eq!(input.table_name, "test_Profiles");
        assert_eq!(input.key_schema.len(), 2);
        assert_eq!(input.key_schema[0].key_type, KeyType::Hash);
        assert_eq!(input.key_schema[0].attribute_name, "user");
        assert_eq!(input.attribute_definitions[1].attribute_type, ScalarAttributeType::N);
        assert_eq!(input.provisioned_throughput.write_capacity_units, 5);
        assert_eq!(input.provisioned_throughput.read_capacity_units, 10);
        // Deriving doesn't create anything
        assert!(store.list_table_names().unwrap().is_empty());

        let created = create_table::<Profile, _>(&store, &naming, 5, 10).unwrap();
        assert_eq!(created, input);
        assert_eq!(store.table("test_Profiles"), Some(input));
        assert!(matches!(
            derive_schema::<Profile, _>(&store, &naming, 5, 10),
            Err(Error::TableAlreadyExists(name)) if name == "test_Profiles"
        ));
    }

    #[test]
    fn put_items() {
        let naming = Naming::new("test");
        let store = MemoryTransport::new();
        create_table::<Record, _>(&store, &naming, 1, 1).unwrap();
        for count in 0..3 {
            put_item(
                &store,
                &naming,
                &Record {
                    id: "same".to_string(),
                    count,
                },
            )
            .unwrap();
        }
        let items = store.items("test_Records");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["Count"].as_n(), Some("2"));
    }

    #[test]
    fn transport_errors_pass_through() {
        let naming = Naming::new("test");
        let err = derive_schema::<Record, _>(&Broken, &naming, 1, 1).unwrap_err();
        match err {
            Error::Transport(inner) => assert_eq!(inner.to_string(), "connection refused"),
            other => panic!("expected a transport error, got {}", other),
        }
        let record = Record {
            id: "x".to_string(),
            count: 1,
        };
        assert!(matches!(
            put_item(&Broken, &naming, &record),
            Err(Error::Transport(_))
        ));
        // Through a trait object too
        let dynamic: &dyn Transport = &Broken;
        assert!(matches!(
            create_table::<Record, dyn Transport>(dynamic, &naming, 1, 1),
            Err(Error::Transport(_))
        ));
    }
}
