use std::fmt;

use crate::transport::BoxError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug)]
pub enum Error {
    /// A value's type falls outside the supported categories: floating point, booleans,
    /// characters, unit, or maps whose keys aren't strings. Carries the offending type's name.
    UnsupportedKind(&'static str),
    /// A record declares no field tagged as the partition key.
    MissingKey { record: &'static str },
    /// A record declares more than one field with the same key role. `key_type` is the tag
    /// option that was repeated (`HASH` or `RANGE`).
    DuplicateKey {
        record: &'static str,
        key_type: &'static str,
    },
    /// A field's resolved attribute name is a reserved key-role token, or collides with the
    /// attribute name of another field in the same record.
    InvalidFieldName(String),
    /// The record driver was handed a sink that can't work with the supplied target, such as a
    /// value sink with no value to read from. This is a programming error, not bad input.
    InvalidEncoderContext(String),
    /// An absent reference or a non-record value was supplied where a record was required, or
    /// an `Attribute` implementation reported a view that doesn't match its shape.
    MalformedStructure(String),
    /// A table with the derived name is already known to the store.
    TableAlreadyExists(String),
    /// The derived table name breaks the store's naming rules.
    InvalidTableName(String),
    /// Naming configuration couldn't be loaded from the environment.
    Config(String),
    /// The transport collaborator failed. Passed through unchanged.
    Transport(BoxError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::UnsupportedKind(ty) => write!(f, "Unsupported kind: {}", ty),
            Error::MissingKey { record } => {
                write!(f, "Record {} has no field tagged as the partition key (HASH)", record)
            }
            Error::DuplicateKey { record, key_type } => write!(
                f,
                "Record {} has more than one field tagged as {}",
                record, key_type
            ),
            Error::InvalidFieldName(ref name) => write!(f, "Invalid attribute name: {}", name),
            Error::InvalidEncoderContext(ref err) => write!(f, "Invalid encoder context: {}", err),
            Error::MalformedStructure(ref err) => write!(f, "Malformed structure: {}", err),
            Error::TableAlreadyExists(ref name) => write!(f, "Table {} already exists", name),
            Error::InvalidTableName(ref name) => write!(f, "Invalid table name: {}", name),
            Error::Config(ref err) => write!(f, "Configuration error: {}", err),
            Error::Transport(ref err) => write!(f, "Transport failure: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Error::Transport(ref err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl std::convert::From<BoxError> for Error {
    fn from(e: BoxError) -> Self {
        Self::Transport(e)
    }
}
