//! # Identity Account Management
//!
//! This module defines the per-user account document and the in-memory
//! mutators for its claim, login, and role sub-collections. Each account is
//! stored as a single document; the document is both the unit of storage and
//! the unit of consistency.
//!
//! ## Features
//!
//! * **Account Document**
//!   - BSON object id primary key
//!   - Credentials, security stamp, and email confirmation state
//!   - Creation and modification timestamps stamped by the store
//!
//! * **Sub-Collections**
//!   - Claims: set-add keyed on the (type, value) pair
//!   - External logins: set-add keyed on the (provider, key) pair
//!   - Roles: case-insensitive membership throughout
//!
//! ## Important Notes
//!
//! * Sub-collection mutators change only the in-memory record; nothing
//!   reaches the backing store until [`IdentityStore::update_account`]
//!   persists the whole document
//! * The `id` field is immutable once assigned
//! * Lowercase mirror fields are maintained by the store and serialized only
//!   when present, so disabled deployments keep their original schema
//!
//! ## Related Components
//!
//! * `IdentityStore` - Persists and looks up account documents
//! * `AccountQuery` - Ad-hoc queries over the account collection
//!
//! [`IdentityStore::update_account`]: crate::store::IdentityStore::update_account

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::misc::present_timestamp;

/// A (type, value) assertion attached to an account
#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IdentityClaim {
    pub claim_type: String,
    pub claim_value: String,
}

/// A (provider, key) pair linking an account to a third-party identity
#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IdentityLogin {
    pub login_provider: String,
    pub provider_key: String,
}

/// The per-user document holding credentials, claims, external logins, roles,
/// and timestamps.
///
/// The `id`, timestamp, and sub-collection fields are private. The id is
/// assigned once at construction; the timestamps are stamped exclusively by
/// the store; the sub-collections enforce set semantics through their
/// mutators.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct IdentityAccount {
    #[serde(rename = "_id")]
    pub(crate) id: ObjectId,
    pub(crate) user_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) lowercase_user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) lowercase_email: Option<String>,
    #[serde(default)]
    pub(crate) email_confirmed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) password_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) security_stamp: Option<String>,
    #[serde(default)]
    pub(crate) claims: Vec<IdentityClaim>,
    #[serde(default)]
    pub(crate) logins: Vec<IdentityLogin>,
    #[serde(default)]
    pub(crate) roles: Vec<String>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub(crate) date_created: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub(crate) date_last_modified: DateTime<Utc>,
}

impl IdentityAccount {
    /// Creates a new account with a fresh object id. The timestamps are
    /// provisional until the store stamps them on insert.
    pub fn new<T: Into<String>>(user_name: T) -> Self {
        let now = present_timestamp();
        Self {
            id: ObjectId::new(),
            user_name: user_name.into(),
            lowercase_user_name: None,
            email: None,
            lowercase_email: None,
            email_confirmed: false,
            password_hash: None,
            security_stamp: None,
            claims: Vec::new(),
            logins: Vec::new(),
            roles: Vec::new(),
            date_created: now,
            date_last_modified: now,
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn set_user_name<T: Into<String>>(&mut self, user_name: T) {
        self.user_name = user_name.into();
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn email_confirmed(&self) -> bool {
        self.email_confirmed
    }

    pub fn password_hash(&self) -> Option<&str> {
        self.password_hash.as_deref()
    }

    pub fn security_stamp(&self) -> Option<&str> {
        self.security_stamp.as_deref()
    }

    pub fn date_created(&self) -> DateTime<Utc> {
        self.date_created
    }

    pub fn date_last_modified(&self) -> DateTime<Utc> {
        self.date_last_modified
    }

    pub fn claims(&self) -> &[IdentityClaim] {
        &self.claims
    }

    /// Adds the (type, value) pair unless an identical pair is already
    /// present. Returns whether the record changed.
    pub fn add_claim(&mut self, claim_type: &str, claim_value: &str) -> bool {
        if self.has_claim(claim_type, claim_value) {
            return false;
        }

        self.claims.push(IdentityClaim {
            claim_type: claim_type.to_string(),
            claim_value: claim_value.to_string(),
        });

        true
    }

    /// Removes the matching (type, value) pair. Removing an absent pair is a
    /// no-op. Returns whether the record changed.
    pub fn remove_claim(&mut self, claim_type: &str, claim_value: &str) -> bool {
        let before = self.claims.len();
        self.claims
            .retain(|c| !(c.claim_type == claim_type && c.claim_value == claim_value));
        self.claims.len() != before
    }

    fn has_claim(&self, claim_type: &str, claim_value: &str) -> bool {
        self.claims
            .iter()
            .any(|c| c.claim_type == claim_type && c.claim_value == claim_value)
    }

    pub fn logins(&self) -> &[IdentityLogin] {
        &self.logins
    }

    /// Adds the (provider, key) pair unless an identical pair is already
    /// present. Returns whether the record changed.
    pub fn add_login(&mut self, login_provider: &str, provider_key: &str) -> bool {
        if self.has_login(login_provider, provider_key) {
            return false;
        }

        self.logins.push(IdentityLogin {
            login_provider: login_provider.to_string(),
            provider_key: provider_key.to_string(),
        });

        true
    }

    /// Removes the matching (provider, key) pair. Returns whether the record
    /// changed.
    pub fn remove_login(&mut self, login_provider: &str, provider_key: &str) -> bool {
        let before = self.logins.len();
        self.logins
            .retain(|l| !(l.login_provider == login_provider && l.provider_key == provider_key));
        self.logins.len() != before
    }

    fn has_login(&self, login_provider: &str, provider_key: &str) -> bool {
        self.logins
            .iter()
            .any(|l| l.login_provider == login_provider && l.provider_key == provider_key)
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    /// Adds the role unless a member differing only by case already exists.
    /// Returns whether the record changed.
    pub fn add_to_role(&mut self, role: &str) -> bool {
        if self.is_in_role(role) {
            return false;
        }

        self.roles.push(role.to_string());
        true
    }

    /// Removes every member matching the role case-insensitively. Returns
    /// whether the record changed.
    pub fn remove_from_role(&mut self, role: &str) -> bool {
        let before = self.roles.len();
        self.roles.retain(|r| !roles_match(r, role));
        self.roles.len() != before
    }

    /// Case-insensitive membership check
    pub fn is_in_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| roles_match(r, role))
    }

    pub(crate) fn set_password_hash(&mut self, password_hash: Option<String>) {
        self.password_hash = password_hash;
    }

    pub(crate) fn set_security_stamp<T: Into<String>>(&mut self, stamp: T) {
        self.security_stamp = Some(stamp.into());
    }

    pub(crate) fn set_email_confirmed(&mut self, confirmed: bool) {
        self.email_confirmed = confirmed;
    }

    pub(crate) fn set_email<T: Into<String>>(&mut self, email: T) {
        self.email = Some(email.into().to_lowercase());
    }

    /// Emails are persisted lowercased regardless of how the caller assigned
    /// them
    pub(crate) fn normalize_email(&mut self) {
        if let Some(email) = self.email.as_mut() {
            *email = email.to_lowercase();
        }
    }

    /// Refreshes or strips the lowercase mirror fields depending on whether
    /// the deployment opted into case-insensitive lookup
    pub(crate) fn apply_lowercase_mirrors(&mut self, enabled: bool) {
        if enabled {
            self.lowercase_user_name = Some(self.user_name.to_lowercase());
            self.lowercase_email = self.email.as_ref().map(|e| e.to_lowercase());
        } else {
            self.lowercase_user_name = None;
            self.lowercase_email = None;
        }
    }
}

fn roles_match(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::IdentityAccount;
    use rstest::rstest;

    #[test]
    fn claims_are_a_set_over_type_and_value() {
        let mut account = IdentityAccount::new("alice");
        assert!(account.add_claim("scope", "read"));
        assert!(!account.add_claim("scope", "read"));
        assert!(account.add_claim("scope", "write"));
        assert_eq!(account.claims().len(), 2);

        assert!(!account.remove_claim("scope", "admin"));
        assert!(account.remove_claim("scope", "read"));
        assert_eq!(account.claims().len(), 1);
    }

    #[test]
    fn logins_are_a_set_over_provider_and_key() {
        let mut account = IdentityAccount::new("alice");
        assert!(account.add_login("google", "key-1"));
        assert!(!account.add_login("google", "key-1"));
        assert!(account.add_login("google", "key-2"));
        assert!(account.add_login("github", "key-1"));
        assert_eq!(account.logins().len(), 3);

        assert!(account.remove_login("google", "key-2"));
        assert!(!account.remove_login("google", "key-2"));
        assert_eq!(account.logins().len(), 2);
    }

    #[rstest]
    #[case("admin")]
    #[case("Admin")]
    #[case("ADMIN")]
    fn role_membership_is_case_insensitive(#[case] probe: &str) {
        let mut account = IdentityAccount::new("alice");
        assert!(account.add_to_role("Admin"));
        assert!(account.is_in_role(probe));
    }

    #[test]
    fn roles_differing_only_by_case_collapse() {
        let mut account = IdentityAccount::new("alice");
        assert!(account.add_to_role("Admin"));
        assert!(!account.add_to_role("admin"));
        assert!(!account.add_to_role("ADMIN"));
        assert_eq!(account.roles().len(), 1);
        assert_eq!(account.roles()[0], "Admin");

        assert!(account.remove_from_role("aDmIn"));
        assert!(account.roles().is_empty());
    }

    #[test]
    fn new_accounts_start_with_matching_timestamps() {
        let account = IdentityAccount::new("alice");
        assert_eq!(account.date_created(), account.date_last_modified());
        assert!(account.email().is_none());
        assert!(account.password_hash().is_none());
    }
}
