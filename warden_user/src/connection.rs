//! # Connection Resolution
//!
//! Turns a connection descriptor into a handle to a specific database. A
//! descriptor is either an explicit URL or the name of an entry in an
//! externally supplied [`ConnectionConfig`]; named entries may carry a bare
//! host descriptor plus a separate database name.
//!
//! ## Important Notes
//!
//! * Resolution failures are configuration errors and surface before a store
//!   can be constructed
//! * A database name must be determinable from the URL path or the named
//!   entry; there is no built-in default

use std::collections::HashMap;

use mongodb::options::ClientOptions;
use mongodb::{Client, Database};
use serde::{Deserialize, Serialize};

use crate::misc::AccountError;

const URL_SCHEME: &str = "mongodb://";
const URL_SRV_SCHEME: &str = "mongodb+srv://";

/// Used when constructing the identity store
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ConnectionSource {
    /// An explicit connection URL carrying the database name in its path.
    /// URL format: mongodb://[username:password@]host[:port]/database or
    /// mongodb+srv://host/database
    Url(String),
    /// The name of an entry in the external configuration
    Named(String),
}

impl ConnectionSource {
    /// Creates a new [`ConnectionSource`] given the provided `descriptor`.
    /// Anything carrying a recognized URL scheme is taken verbatim; all other
    /// descriptors are treated as configuration entry names
    pub fn new<T: Into<String>>(descriptor: T) -> Self {
        let descriptor = descriptor.into();
        if descriptor.starts_with(URL_SCHEME) || descriptor.starts_with(URL_SRV_SCHEME) {
            ConnectionSource::Url(descriptor)
        } else {
            ConnectionSource::Named(descriptor)
        }
    }
}

/// A named connection descriptor from the external configuration source
#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct ConnectionEntry {
    /// Either a full connection URL or a bare `host[:port]` descriptor
    pub descriptor: String,
    /// Database name for descriptors that do not carry one in a URL path
    pub database: Option<String>,
}

impl ConnectionEntry {
    pub fn new<T: Into<String>>(descriptor: T) -> Self {
        Self {
            descriptor: descriptor.into(),
            database: None,
        }
    }

    pub fn with_database<T: Into<String>>(mut self, database: T) -> Self {
        self.database = Some(database.into());
        self
    }
}

/// Maps entry names to connection descriptors. The host application decides
/// where this is deserialized from
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ConnectionConfig {
    entries: HashMap<String, ConnectionEntry>,
}

impl ConnectionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry<T: Into<String>>(mut self, name: T, entry: ConnectionEntry) -> Self {
        let _ = self.entries.insert(name.into(), entry);
        self
    }

    pub fn entry(&self, name: &str) -> Option<&ConnectionEntry> {
        self.entries.get(name)
    }
}

/// Resolves a connection source against the configuration, returning a handle
/// to the target database. The database name is taken from the URL path when
/// present, falling back to the named entry's `database` field
pub async fn resolve_database(
    source: &ConnectionSource,
    config: &ConnectionConfig,
) -> Result<Database, AccountError> {
    let (descriptor, database_hint) = match source {
        ConnectionSource::Url(url) => (url.clone(), None),
        ConnectionSource::Named(name) => {
            let entry = config.entry(name).ok_or_else(|| {
                AccountError::Configuration(format!("no connection entry named '{name}'"))
            })?;
            (entry.descriptor.clone(), entry.database.clone())
        }
    };

    let url = if descriptor.starts_with(URL_SCHEME) || descriptor.starts_with(URL_SRV_SCHEME) {
        descriptor
    } else {
        // bare host descriptors from named entries, e.g. "db0:27017,db1:27017"
        format!("{URL_SCHEME}{descriptor}")
    };

    let options = ClientOptions::parse(&url)
        .await
        .map_err(|err| AccountError::Configuration(format!("invalid connection URL: {err}")))?;

    let database = options
        .default_database
        .clone()
        .or(database_hint)
        .ok_or_else(|| {
            AccountError::Configuration(
                "a database name could not be determined from the connection descriptor"
                    .to_string(),
            )
        })?;

    let client = Client::with_options(options)?;
    Ok(client.database(&database))
}
