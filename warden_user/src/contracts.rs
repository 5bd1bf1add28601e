//! # Framework Store Contracts
//!
//! The calling framework consumes the identity store through narrow,
//! capability-scoped contracts rather than the full inherent surface. Each
//! trait below covers one capability and is implemented by [`IdentityStore`]
//! by delegation, so a framework component can hold `&dyn ClaimStore` or
//! `&dyn RoleStore` without seeing the rest of the operation set.
//!
//! ## Important Notes
//!
//! * Lockout is explicitly out of scope for this store; every
//!   [`LockoutStore`] method fails with [`AccountError::Unimplemented`]
//!   rather than fabricating defaults
//! * All implementations first check the disposed flag, like the inherent
//!   operations they delegate to

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::account::{IdentityAccount, IdentityClaim, IdentityLogin};
use crate::misc::AccountError;
use crate::store::IdentityStore;

/// Account lifecycle and primary lookups
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn create_account(&self, account: &mut IdentityAccount) -> Result<(), AccountError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<IdentityAccount>, AccountError>;
    async fn find_by_username(
        &self,
        user_name: &str,
    ) -> Result<Option<IdentityAccount>, AccountError>;
    async fn update_account(&self, account: &mut IdentityAccount) -> Result<(), AccountError>;
    async fn delete_account(&self, account: &IdentityAccount) -> Result<(), AccountError>;
}

/// Claim sub-collection edits, in memory until the next update
#[async_trait]
pub trait ClaimStore: Send + Sync {
    async fn add_claim(
        &self,
        account: &mut IdentityAccount,
        claim_type: &str,
        claim_value: &str,
    ) -> Result<(), AccountError>;
    async fn claims(&self, account: &IdentityAccount) -> Result<Vec<IdentityClaim>, AccountError>;
    async fn remove_claim(
        &self,
        account: &mut IdentityAccount,
        claim_type: &str,
        claim_value: &str,
    ) -> Result<(), AccountError>;
}

/// External-login sub-collection edits and owner lookup
#[async_trait]
pub trait LoginStore: Send + Sync {
    async fn add_login(
        &self,
        account: &mut IdentityAccount,
        login_provider: &str,
        provider_key: &str,
    ) -> Result<(), AccountError>;
    async fn logins(&self, account: &IdentityAccount) -> Result<Vec<IdentityLogin>, AccountError>;
    async fn remove_login(
        &self,
        account: &mut IdentityAccount,
        login_provider: &str,
        provider_key: &str,
    ) -> Result<(), AccountError>;
    async fn find_by_login(
        &self,
        login_provider: &str,
        provider_key: &str,
    ) -> Result<Option<IdentityAccount>, AccountError>;
}

/// Role membership with case-insensitive comparisons
#[async_trait]
pub trait RoleStore: Send + Sync {
    async fn add_to_role(
        &self,
        account: &mut IdentityAccount,
        role: &str,
    ) -> Result<(), AccountError>;
    async fn roles(&self, account: &IdentityAccount) -> Result<Vec<String>, AccountError>;
    async fn is_in_role(&self, account: &IdentityAccount, role: &str)
        -> Result<bool, AccountError>;
    async fn remove_from_role(
        &self,
        account: &mut IdentityAccount,
        role: &str,
    ) -> Result<(), AccountError>;
}

/// Password-hash storage; hashing itself is the caller's job
#[async_trait]
pub trait PasswordStore: Send + Sync {
    async fn password_hash(
        &self,
        account: &IdentityAccount,
    ) -> Result<Option<String>, AccountError>;
    async fn has_password(&self, account: &IdentityAccount) -> Result<bool, AccountError>;
    async fn set_password_hash(
        &self,
        account: &mut IdentityAccount,
        password_hash: Option<&str>,
    ) -> Result<(), AccountError>;
}

/// Security-stamp storage, stored and returned verbatim
#[async_trait]
pub trait SecurityStampStore: Send + Sync {
    async fn security_stamp(
        &self,
        account: &IdentityAccount,
    ) -> Result<Option<String>, AccountError>;
    async fn set_security_stamp(
        &self,
        account: &mut IdentityAccount,
        stamp: &str,
    ) -> Result<(), AccountError>;
}

/// Email storage and lookup
#[async_trait]
pub trait EmailStore: Send + Sync {
    async fn email(&self, account: &IdentityAccount) -> Result<Option<String>, AccountError>;
    async fn email_confirmed(&self, account: &IdentityAccount) -> Result<bool, AccountError>;
    async fn set_email(
        &self,
        account: &mut IdentityAccount,
        email: &str,
    ) -> Result<(), AccountError>;
    async fn set_email_confirmed(
        &self,
        account: &mut IdentityAccount,
        confirmed: bool,
    ) -> Result<(), AccountError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<IdentityAccount>, AccountError>;
}

/// Account lockout and throttling. Not supported by this store
#[async_trait]
pub trait LockoutStore: Send + Sync {
    async fn lockout_end_date(
        &self,
        account: &IdentityAccount,
    ) -> Result<Option<DateTime<Utc>>, AccountError>;
    async fn set_lockout_end_date(
        &self,
        account: &mut IdentityAccount,
        lockout_end: Option<DateTime<Utc>>,
    ) -> Result<(), AccountError>;
    async fn access_failed_count(&self, account: &IdentityAccount) -> Result<i32, AccountError>;
    async fn increment_access_failed_count(
        &self,
        account: &mut IdentityAccount,
    ) -> Result<i32, AccountError>;
    async fn reset_access_failed_count(
        &self,
        account: &mut IdentityAccount,
    ) -> Result<(), AccountError>;
    async fn lockout_enabled(&self, account: &IdentityAccount) -> Result<bool, AccountError>;
    async fn set_lockout_enabled(
        &self,
        account: &mut IdentityAccount,
        enabled: bool,
    ) -> Result<(), AccountError>;
}

#[async_trait]
impl AccountStore for IdentityStore {
    async fn create_account(&self, account: &mut IdentityAccount) -> Result<(), AccountError> {
        IdentityStore::create_account(self, account).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<IdentityAccount>, AccountError> {
        IdentityStore::find_by_id(self, id).await
    }

    async fn find_by_username(
        &self,
        user_name: &str,
    ) -> Result<Option<IdentityAccount>, AccountError> {
        IdentityStore::find_by_username(self, user_name).await
    }

    async fn update_account(&self, account: &mut IdentityAccount) -> Result<(), AccountError> {
        IdentityStore::update_account(self, account).await
    }

    async fn delete_account(&self, account: &IdentityAccount) -> Result<(), AccountError> {
        IdentityStore::delete_account(self, account).await
    }
}

#[async_trait]
impl ClaimStore for IdentityStore {
    async fn add_claim(
        &self,
        account: &mut IdentityAccount,
        claim_type: &str,
        claim_value: &str,
    ) -> Result<(), AccountError> {
        IdentityStore::add_claim(self, account, claim_type, claim_value).await
    }

    async fn claims(&self, account: &IdentityAccount) -> Result<Vec<IdentityClaim>, AccountError> {
        IdentityStore::claims(self, account).await
    }

    async fn remove_claim(
        &self,
        account: &mut IdentityAccount,
        claim_type: &str,
        claim_value: &str,
    ) -> Result<(), AccountError> {
        IdentityStore::remove_claim(self, account, claim_type, claim_value).await
    }
}

#[async_trait]
impl LoginStore for IdentityStore {
    async fn add_login(
        &self,
        account: &mut IdentityAccount,
        login_provider: &str,
        provider_key: &str,
    ) -> Result<(), AccountError> {
        IdentityStore::add_login(self, account, login_provider, provider_key).await
    }

    async fn logins(&self, account: &IdentityAccount) -> Result<Vec<IdentityLogin>, AccountError> {
        IdentityStore::logins(self, account).await
    }

    async fn remove_login(
        &self,
        account: &mut IdentityAccount,
        login_provider: &str,
        provider_key: &str,
    ) -> Result<(), AccountError> {
        IdentityStore::remove_login(self, account, login_provider, provider_key).await
    }

    async fn find_by_login(
        &self,
        login_provider: &str,
        provider_key: &str,
    ) -> Result<Option<IdentityAccount>, AccountError> {
        IdentityStore::find_by_login(self, login_provider, provider_key).await
    }
}

#[async_trait]
impl RoleStore for IdentityStore {
    async fn add_to_role(
        &self,
        account: &mut IdentityAccount,
        role: &str,
    ) -> Result<(), AccountError> {
        IdentityStore::add_to_role(self, account, role).await
    }

    async fn roles(&self, account: &IdentityAccount) -> Result<Vec<String>, AccountError> {
        IdentityStore::roles(self, account).await
    }

    async fn is_in_role(
        &self,
        account: &IdentityAccount,
        role: &str,
    ) -> Result<bool, AccountError> {
        IdentityStore::is_in_role(self, account, role).await
    }

    async fn remove_from_role(
        &self,
        account: &mut IdentityAccount,
        role: &str,
    ) -> Result<(), AccountError> {
        IdentityStore::remove_from_role(self, account, role).await
    }
}

#[async_trait]
impl PasswordStore for IdentityStore {
    async fn password_hash(
        &self,
        account: &IdentityAccount,
    ) -> Result<Option<String>, AccountError> {
        IdentityStore::password_hash(self, account).await
    }

    async fn has_password(&self, account: &IdentityAccount) -> Result<bool, AccountError> {
        IdentityStore::has_password(self, account).await
    }

    async fn set_password_hash(
        &self,
        account: &mut IdentityAccount,
        password_hash: Option<&str>,
    ) -> Result<(), AccountError> {
        IdentityStore::set_password_hash(self, account, password_hash).await
    }
}

#[async_trait]
impl SecurityStampStore for IdentityStore {
    async fn security_stamp(
        &self,
        account: &IdentityAccount,
    ) -> Result<Option<String>, AccountError> {
        IdentityStore::security_stamp(self, account).await
    }

    async fn set_security_stamp(
        &self,
        account: &mut IdentityAccount,
        stamp: &str,
    ) -> Result<(), AccountError> {
        IdentityStore::set_security_stamp(self, account, stamp).await
    }
}

#[async_trait]
impl EmailStore for IdentityStore {
    async fn email(&self, account: &IdentityAccount) -> Result<Option<String>, AccountError> {
        IdentityStore::email(self, account).await
    }

    async fn email_confirmed(&self, account: &IdentityAccount) -> Result<bool, AccountError> {
        IdentityStore::email_confirmed(self, account).await
    }

    async fn set_email(
        &self,
        account: &mut IdentityAccount,
        email: &str,
    ) -> Result<(), AccountError> {
        IdentityStore::set_email(self, account, email).await
    }

    async fn set_email_confirmed(
        &self,
        account: &mut IdentityAccount,
        confirmed: bool,
    ) -> Result<(), AccountError> {
        IdentityStore::set_email_confirmed(self, account, confirmed).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<IdentityAccount>, AccountError> {
        IdentityStore::find_by_email(self, email).await
    }
}

const LOCKOUT_UNSUPPORTED: &str = "account lockout is not supported by this store";

#[async_trait]
impl LockoutStore for IdentityStore {
    async fn lockout_end_date(
        &self,
        _account: &IdentityAccount,
    ) -> Result<Option<DateTime<Utc>>, AccountError> {
        Err(AccountError::Unimplemented(LOCKOUT_UNSUPPORTED))
    }

    async fn set_lockout_end_date(
        &self,
        _account: &mut IdentityAccount,
        _lockout_end: Option<DateTime<Utc>>,
    ) -> Result<(), AccountError> {
        Err(AccountError::Unimplemented(LOCKOUT_UNSUPPORTED))
    }

    async fn access_failed_count(&self, _account: &IdentityAccount) -> Result<i32, AccountError> {
        Err(AccountError::Unimplemented(LOCKOUT_UNSUPPORTED))
    }

    async fn increment_access_failed_count(
        &self,
        _account: &mut IdentityAccount,
    ) -> Result<i32, AccountError> {
        Err(AccountError::Unimplemented(LOCKOUT_UNSUPPORTED))
    }

    async fn reset_access_failed_count(
        &self,
        _account: &mut IdentityAccount,
    ) -> Result<(), AccountError> {
        Err(AccountError::Unimplemented(LOCKOUT_UNSUPPORTED))
    }

    async fn lockout_enabled(&self, _account: &IdentityAccount) -> Result<bool, AccountError> {
        Err(AccountError::Unimplemented(LOCKOUT_UNSUPPORTED))
    }

    async fn set_lockout_enabled(
        &self,
        _account: &mut IdentityAccount,
        _enabled: bool,
    ) -> Result<(), AccountError> {
        Err(AccountError::Unimplemented(LOCKOUT_UNSUPPORTED))
    }
}

#[cfg(test)]
mod tests {
    use super::{AccountStore, LockoutStore, RoleStore};
    use crate::account::IdentityAccount;
    use crate::misc::AccountError;
    use crate::settings::StoreSettings;
    use crate::store::IdentityStore;
    use mongodb::Client;

    async fn lazy_store() -> IdentityStore {
        let client = Client::with_uri_str("mongodb://127.0.0.1:27017")
            .await
            .unwrap();
        IdentityStore::new(client.database("warden_unit"), StoreSettings::default())
    }

    #[tokio::test]
    async fn contracts_are_usable_as_trait_objects() {
        let store = lazy_store().await;
        let mut account = IdentityAccount::new("alice");

        let accounts: &dyn AccountStore = &store;
        assert!(accounts.find_by_username("").await.unwrap().is_none());

        let roles: &dyn RoleStore = &store;
        roles.add_to_role(&mut account, "Admin").await.unwrap();
        assert!(roles.is_in_role(&account, "admin").await.unwrap());
    }

    #[tokio::test]
    async fn lockout_operations_fail_loudly() {
        let store = lazy_store().await;
        let mut account = IdentityAccount::new("alice");
        let lockout: &dyn LockoutStore = &store;

        assert!(matches!(
            lockout.lockout_end_date(&account).await.unwrap_err(),
            AccountError::Unimplemented(_)
        ));
        assert!(matches!(
            lockout
                .increment_access_failed_count(&mut account)
                .await
                .unwrap_err(),
            AccountError::Unimplemented(_)
        ));
        assert!(matches!(
            lockout.lockout_enabled(&account).await.unwrap_err(),
            AccountError::Unimplemented(_)
        ));
    }
}
