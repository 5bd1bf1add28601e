//! # Identity Store
//!
//! The Identity Store is the sole point of contact between callers and the
//! backing account collection. It provides a unified interface for account
//! creation, lookup, mutation, and deletion against a document database.
//!
//! ## Features
//!
//! * **Account Persistence**
//!   - Insert, whole-document replace with upsert, delete
//!   - Timestamps stamped by the store, never by the caller
//!   - Email lowercased before every write
//!
//! * **Lookup Protocol**
//!   - By id, username, email, or external-login pair
//!   - Optional case-insensitive username/email resolution through
//!     lowercase mirror fields
//!
//! * **Sub-Collection Mutators**
//!   - Claims, logins, and roles edited in memory with set semantics
//!   - One explicit update persists the batch of edits
//!
//! ## Usage Example
//!
//! ```rust
//! use warden_user::prelude::*;
//!
//! async fn example() -> Result<(), AccountError> {
//!     let config = ConnectionConfig::new().with_entry(
//!         "identity",
//!         ConnectionEntry::new("mongodb://127.0.0.1:27017/accounts"),
//!     );
//!
//!     let store = IdentityStore::connect(
//!         ConnectionSource::new("identity"),
//!         &config,
//!         StoreSettings::default(),
//!     )
//!     .await?;
//!
//!     let mut account = IdentityAccount::new("alice");
//!     store.set_email(&mut account, "Alice@example.com").await?;
//!     store.add_to_role(&mut account, "Admin").await?;
//!     store.create_account(&mut account).await?;
//!
//!     let found = store.find_by_username("alice").await?;
//!     assert!(found.is_some());
//!     Ok(())
//! }
//! ```
//!
//! ## Important Notes
//!
//! * One store instance may be used concurrently; it holds only a database
//!   handle and a disposed flag
//! * Concurrent updates to the same account are last-writer-wins at the
//!   document level; no optimistic-concurrency token exists
//! * Any operation on a disposed store fails with [`AccountError::Disposed`]
//! * Transient backing-store faults propagate to the caller unchanged
//!
//! ## Related Components
//!
//! * `IdentityAccount` - The per-user document
//! * `AccountQuery` - Ad-hoc queries over the collection
//! * `ConnectionSource` / `ConnectionConfig` - Connection resolution

use std::sync::atomic::{AtomicBool, Ordering};

use mongodb::bson::doc;
use mongodb::options::ReplaceOptions;
use mongodb::{Collection, Database};

use crate::account::{IdentityAccount, IdentityClaim, IdentityLogin};
use crate::connection::{resolve_database, ConnectionConfig, ConnectionSource};
use crate::misc::{present_timestamp, AccountError};
use crate::query::AccountQuery;
use crate::settings::StoreSettings;

/// The store for identity accounts held in a single backing collection.
/// Wraps an externally owned database handle; disposing the store never
/// closes the connection itself.
pub struct IdentityStore {
    db: Database,
    accounts: Collection<IdentityAccount>,
    settings: StoreSettings,
    disposed: AtomicBool,
}

impl IdentityStore {
    /// Wraps an existing database handle. Performs no I/O
    pub fn new(database: Database, settings: StoreSettings) -> Self {
        let accounts = database.collection::<IdentityAccount>(&settings.collection_name);
        Self {
            db: database,
            accounts,
            settings,
            disposed: AtomicBool::new(false),
        }
    }

    /// Resolves the connection source, verifies the database is reachable,
    /// and returns a ready store. Configuration problems fail here, before
    /// the store can be used
    pub async fn connect(
        source: ConnectionSource,
        config: &ConnectionConfig,
        settings: StoreSettings,
    ) -> Result<Self, AccountError> {
        let database = resolve_database(&source, config).await?;
        let this = Self::new(database, settings);

        let _ = this
            .db
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|err| {
                AccountError::msg(format!("unable to reach the backing database: {err}"))
            })?;

        log::info!(target: "warden", "Successfully established connection to backend {source:?}");
        Ok(this)
    }

    /// Returns the wrapped database handle
    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    /// Marks the store unusable. Idempotent; the database handle itself is
    /// owned externally and stays open
    pub fn dispose(&self) {
        self.disposed.store(true, Ordering::Release);
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    fn check_open(&self) -> Result<(), AccountError> {
        if self.is_disposed() {
            Err(AccountError::Disposed)
        } else {
            Ok(())
        }
    }

    /// Stamps the creation and modification timestamps and inserts the
    /// document. No uniqueness check is performed on username or email
    pub async fn create_account(&self, account: &mut IdentityAccount) -> Result<(), AccountError> {
        self.check_open()?;

        let now = present_timestamp();
        account.date_created = now;
        account.date_last_modified = now;
        account.normalize_email();
        account.apply_lowercase_mirrors(self.settings.case_insensitive_lookup);

        log::trace!(target: "warden", "Inserting account {}", account.id());
        let _ = self.accounts.insert_one(&*account, None).await?;
        Ok(())
    }

    /// Looks an account up by the hex form of its id. A malformed id is a
    /// caller error, not a missing document
    pub async fn find_by_id(&self, id: &str) -> Result<Option<IdentityAccount>, AccountError> {
        self.check_open()?;

        let id = mongodb::bson::oid::ObjectId::parse_str(id)
            .map_err(|_| AccountError::InvalidId(format!("'{id}' is not a valid account id")))?;

        self.accounts
            .find_one(doc! { "_id": id }, None)
            .await
            .map_err(AccountError::from)
    }

    /// Looks an account up by username, case-insensitively when the store is
    /// configured for it
    pub async fn find_by_username(
        &self,
        user_name: &str,
    ) -> Result<Option<IdentityAccount>, AccountError> {
        self.check_open()?;

        // a blank username reads as absent; find_by_email rejects blank
        // input instead
        if user_name.trim().is_empty() {
            return Ok(None);
        }

        let filter = if self.settings.case_insensitive_lookup {
            doc! { "lowercaseUserName": user_name.to_lowercase() }
        } else {
            doc! { "userName": user_name }
        };

        self.accounts
            .find_one(filter, None)
            .await
            .map_err(AccountError::from)
    }

    /// Looks an account up by email address. Blank input is a usage error
    pub async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<IdentityAccount>, AccountError> {
        self.check_open()?;

        if email.trim().is_empty() {
            return Err(AccountError::InvalidArgument(
                "email cannot be empty".to_string(),
            ));
        }

        let filter = if self.settings.case_insensitive_lookup {
            doc! { "lowercaseEmail": email.to_lowercase() }
        } else {
            doc! { "email": email }
        };

        self.accounts
            .find_one(filter, None)
            .await
            .map_err(AccountError::from)
    }

    /// Finds the account owning the external login. Both fields must match
    /// within the same array element
    pub async fn find_by_login(
        &self,
        login_provider: &str,
        provider_key: &str,
    ) -> Result<Option<IdentityAccount>, AccountError> {
        self.check_open()?;

        let filter = doc! {
            "logins": {
                "$elemMatch": {
                    "loginProvider": login_provider,
                    "providerKey": provider_key,
                }
            }
        };

        self.accounts
            .find_one(filter, None)
            .await
            .map_err(AccountError::from)
    }

    /// Refreshes the modification timestamp and replaces the whole document
    /// matched by id, inserting it if absent. The upsert tolerates records
    /// created out-of-band with client-generated ids
    pub async fn update_account(&self, account: &mut IdentityAccount) -> Result<(), AccountError> {
        self.check_open()?;

        account.date_last_modified = present_timestamp();
        account.normalize_email();
        account.apply_lowercase_mirrors(self.settings.case_insensitive_lookup);

        log::trace!(target: "warden", "Replacing account {}", account.id());
        let options = ReplaceOptions::builder().upsert(true).build();
        let _ = self
            .accounts
            .replace_one(doc! { "_id": account.id() }, &*account, options)
            .await?;
        Ok(())
    }

    /// Removes the account's document
    pub async fn delete_account(&self, account: &IdentityAccount) -> Result<(), AccountError> {
        self.check_open()?;

        log::trace!(target: "warden", "Deleting account {}", account.id());
        let _ = self
            .accounts
            .delete_one(doc! { "_id": account.id() }, None)
            .await?;
        Ok(())
    }

    /// Removes every account document, returning the number removed. Meant
    /// for test-fixture reset
    pub async fn purge(&self) -> Result<usize, AccountError> {
        self.check_open()?;

        let result = self.accounts.delete_many(doc! {}, None).await?;
        log::trace!(target: "warden", "Purged {} account(s)", result.deleted_count);
        Ok(result.deleted_count as usize)
    }

    /// Exposes the whole collection as a lazily filterable query
    pub fn all_accounts(&self) -> Result<AccountQuery, AccountError> {
        self.check_open()?;
        Ok(AccountQuery::new(self.accounts.clone()))
    }

    /// Adds a claim to the in-memory record; a duplicate (type, value) pair
    /// is ignored. Persisted by the next update
    pub async fn add_claim(
        &self,
        account: &mut IdentityAccount,
        claim_type: &str,
        claim_value: &str,
    ) -> Result<(), AccountError> {
        self.check_open()?;
        let _ = account.add_claim(claim_type, claim_value);
        Ok(())
    }

    pub async fn claims(
        &self,
        account: &IdentityAccount,
    ) -> Result<Vec<IdentityClaim>, AccountError> {
        self.check_open()?;
        Ok(account.claims().to_vec())
    }

    /// Removes a claim from the in-memory record; removing an absent pair is
    /// a no-op
    pub async fn remove_claim(
        &self,
        account: &mut IdentityAccount,
        claim_type: &str,
        claim_value: &str,
    ) -> Result<(), AccountError> {
        self.check_open()?;
        let _ = account.remove_claim(claim_type, claim_value);
        Ok(())
    }

    /// Links an external login to the in-memory record; a duplicate
    /// (provider, key) pair is ignored
    pub async fn add_login(
        &self,
        account: &mut IdentityAccount,
        login_provider: &str,
        provider_key: &str,
    ) -> Result<(), AccountError> {
        self.check_open()?;
        let _ = account.add_login(login_provider, provider_key);
        Ok(())
    }

    pub async fn logins(
        &self,
        account: &IdentityAccount,
    ) -> Result<Vec<IdentityLogin>, AccountError> {
        self.check_open()?;
        Ok(account.logins().to_vec())
    }

    pub async fn remove_login(
        &self,
        account: &mut IdentityAccount,
        login_provider: &str,
        provider_key: &str,
    ) -> Result<(), AccountError> {
        self.check_open()?;
        let _ = account.remove_login(login_provider, provider_key);
        Ok(())
    }

    /// Adds the account to a role; membership comparisons are
    /// case-insensitive, so no member may differ from another only by case
    pub async fn add_to_role(
        &self,
        account: &mut IdentityAccount,
        role: &str,
    ) -> Result<(), AccountError> {
        self.check_open()?;
        let _ = account.add_to_role(role);
        Ok(())
    }

    pub async fn roles(&self, account: &IdentityAccount) -> Result<Vec<String>, AccountError> {
        self.check_open()?;
        Ok(account.roles().to_vec())
    }

    pub async fn is_in_role(
        &self,
        account: &IdentityAccount,
        role: &str,
    ) -> Result<bool, AccountError> {
        self.check_open()?;
        Ok(account.is_in_role(role))
    }

    pub async fn remove_from_role(
        &self,
        account: &mut IdentityAccount,
        role: &str,
    ) -> Result<(), AccountError> {
        self.check_open()?;
        let _ = account.remove_from_role(role);
        Ok(())
    }

    pub async fn password_hash(
        &self,
        account: &IdentityAccount,
    ) -> Result<Option<String>, AccountError> {
        self.check_open()?;
        Ok(account.password_hash().map(str::to_string))
    }

    /// Reports whether a hash is present, not whether it is well-formed
    pub async fn has_password(&self, account: &IdentityAccount) -> Result<bool, AccountError> {
        self.check_open()?;
        Ok(account.password_hash().is_some())
    }

    /// Stores the caller-supplied hash verbatim; `None` clears it, leaving
    /// an account with no password set
    pub async fn set_password_hash(
        &self,
        account: &mut IdentityAccount,
        password_hash: Option<&str>,
    ) -> Result<(), AccountError> {
        self.check_open()?;
        account.set_password_hash(password_hash.map(str::to_string));
        Ok(())
    }

    pub async fn security_stamp(
        &self,
        account: &IdentityAccount,
    ) -> Result<Option<String>, AccountError> {
        self.check_open()?;
        Ok(account.security_stamp().map(str::to_string))
    }

    /// Replaces the security stamp wholesale; the value is opaque to this
    /// layer
    pub async fn set_security_stamp(
        &self,
        account: &mut IdentityAccount,
        stamp: &str,
    ) -> Result<(), AccountError> {
        self.check_open()?;
        account.set_security_stamp(stamp);
        Ok(())
    }

    pub async fn email(&self, account: &IdentityAccount) -> Result<Option<String>, AccountError> {
        self.check_open()?;
        Ok(account.email().map(str::to_string))
    }

    pub async fn email_confirmed(&self, account: &IdentityAccount) -> Result<bool, AccountError> {
        self.check_open()?;
        Ok(account.email_confirmed())
    }

    /// Assigns the email, lowercased. Blank input is a usage error
    pub async fn set_email(
        &self,
        account: &mut IdentityAccount,
        email: &str,
    ) -> Result<(), AccountError> {
        self.check_open()?;

        if email.trim().is_empty() {
            return Err(AccountError::InvalidArgument(
                "email cannot be empty".to_string(),
            ));
        }

        account.set_email(email);
        Ok(())
    }

    pub async fn set_email_confirmed(
        &self,
        account: &mut IdentityAccount,
        confirmed: bool,
    ) -> Result<(), AccountError> {
        self.check_open()?;
        account.set_email_confirmed(confirmed);
        Ok(())
    }
}
