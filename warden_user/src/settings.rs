use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct StoreSettings {
    /// Name of the collection holding one document per account
    pub collection_name: String,
    /// When enabled, the store maintains lowercase mirror fields on every
    /// write and resolves username/email lookups against them. Existing
    /// documents gain the mirrors on their next write; no migration is
    /// required to turn this on.
    pub case_insensitive_lookup: bool,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            collection_name: DEFAULT_COLLECTION_NAME.to_string(),
            case_insensitive_lookup: false,
        }
    }
}

impl StoreSettings {
    pub fn with_collection_name<T: Into<String>>(mut self, name: T) -> Self {
        self.collection_name = name.into();
        self
    }

    pub fn with_case_insensitive_lookup(mut self, enabled: bool) -> Self {
        self.case_insensitive_lookup = enabled;
        self
    }
}

/// Collection used when none is named in the settings
pub const DEFAULT_COLLECTION_NAME: &str = "users";
