//! Lazy query surface over the account collection, for callers needing
//! predicates beyond the fixed operation set. Nothing is sent to the backing
//! store until the query is executed.

use futures::TryStreamExt;
use mongodb::bson::Document;
use mongodb::options::{CountOptions, FindOptions};
use mongodb::{Collection, Cursor};

use crate::account::IdentityAccount;
use crate::misc::AccountError;

/// A filterable view of the whole account collection. Obtained through
/// [`IdentityStore::all_accounts`]; executed with [`stream`], [`collect`],
/// [`first`], or [`count`]
///
/// [`IdentityStore::all_accounts`]: crate::store::IdentityStore::all_accounts
/// [`stream`]: Self::stream
/// [`collect`]: Self::collect
/// [`first`]: Self::first
/// [`count`]: Self::count
#[derive(Clone, Debug)]
pub struct AccountQuery {
    collection: Collection<IdentityAccount>,
    filter: Document,
    limit: Option<i64>,
    skip: Option<u64>,
    sort: Option<Document>,
}

impl AccountQuery {
    pub(crate) fn new(collection: Collection<IdentityAccount>) -> Self {
        Self {
            collection,
            filter: Document::new(),
            limit: None,
            skip: None,
            sort: None,
        }
    }

    /// Restricts the query to documents matching `filter`
    pub fn filter(mut self, filter: Document) -> Self {
        self.filter = filter;
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn sort(mut self, sort: Document) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Executes the query, returning a cursor that yields matching accounts
    /// as they are read
    pub async fn stream(self) -> Result<Cursor<IdentityAccount>, AccountError> {
        let options = FindOptions::builder()
            .limit(self.limit)
            .skip(self.skip)
            .sort(self.sort)
            .build();

        self.collection
            .find(self.filter, options)
            .await
            .map_err(AccountError::from)
    }

    /// Executes the query and drains the cursor into a vector
    pub async fn collect(self) -> Result<Vec<IdentityAccount>, AccountError> {
        self.stream()
            .await?
            .try_collect()
            .await
            .map_err(AccountError::from)
    }

    /// Executes the query and returns the first matching account, if any
    pub async fn first(self) -> Result<Option<IdentityAccount>, AccountError> {
        self.limit(1)
            .stream()
            .await?
            .try_next()
            .await
            .map_err(AccountError::from)
    }

    /// Counts the documents the query would yield
    pub async fn count(self) -> Result<u64, AccountError> {
        let options = CountOptions::builder()
            .limit(self.limit.map(|limit| limit as u64))
            .skip(self.skip)
            .build();

        self.collection
            .count_documents(self.filter, options)
            .await
            .map_err(AccountError::from)
    }
}
