use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;

use crate::error::{Error, Result};

/// Environment variable holding the table name prefix.
pub const PREFIX_ENV: &str = "DYNAPACK_PREFIX";

static GLOBAL: OnceCell<Naming> = OnceCell::new();

static TABLE_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.\-]{3,255}$").unwrap());

/// Table naming configuration.
///
/// A record type `T` is stored in the table `<prefix>_<T>s`: with the prefix `prod`, a `Record`
/// type lives in `prod_Records`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Naming {
    prefix: String,
}

impl Naming {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Load the prefix from the `DYNAPACK_PREFIX` environment variable. An empty value is
    /// accepted; a missing or non-unicode one is an error.
    pub fn from_env() -> Result<Self> {
        Self::from_var(PREFIX_ENV)
    }

    fn from_var(key: &str) -> Result<Self> {
        std::env::var(key)
            .map(Self::new)
            .map_err(|e| Error::Config(format!("{} is not usable as a table prefix: {}", key, e)))
    }

    /// The process-wide naming configuration, loaded from the environment on first use.
    ///
    /// # Panics
    ///
    /// Panics if `DYNAPACK_PREFIX` isn't set. There's no sensible table to write to without it.
    pub fn global() -> &'static Naming {
        Self::load_once(&GLOBAL, PREFIX_ENV)
    }

    fn load_once<'c>(cell: &'c OnceCell<Naming>, key: &str) -> &'c Naming {
        cell.get_or_init(|| match Self::from_var(key) {
            Ok(naming) => naming,
            Err(e) => panic!("no table prefix configured: {}", e),
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Build the table name for a record type name. Fails if the result breaks the store's
    /// table naming rules: 3 to 255 characters from `[A-Za-z0-9_.-]`.
    pub fn table_name(&self, type_name: &str) -> Result<String> {
        let name = format!("{}_{}s", self.prefix, type_name);
        if !TABLE_NAME.is_match(&name) {
            return Err(Error::InvalidTableName(name));
        }
        Ok(name)
    }
}
