//! # Warden Identity Store
//!
//! A MongoDB-backed persistence adapter for user-identity records. This crate
//! stores credentials, external logins, role memberships, and claims as one
//! document per account, and exposes the fixed operation set an
//! account-management framework expects from its user store.
//!
//! ## Features
//!
//! * **Account Storage**:
//!   - One document per account in a single named collection
//!   - Whole-document updates with upsert semantics
//!   - Store-managed creation and modification timestamps
//!
//! * **Lookup Protocol**:
//!   - Resolution by id, username, email, or external-login pair
//!   - Optional case-insensitive username/email indexing via lowercase
//!     mirror fields, enabled per deployment without a schema migration
//!
//! * **Sub-Collections**:
//!   - Claims, logins, and roles held on the in-memory record
//!   - Set semantics on every insertion; case-insensitive roles
//!   - A single explicit update persists the batch of edits
//!
//! * **Connection Resolution**:
//!   - Explicit URLs or named configuration entries
//!   - Database name resolved from the URL path or the entry itself
//!
//! ## Architecture
//!
//! ```text
//! caller
//! └── IdentityStore (operation set + disposed flag)
//!     ├── ConnectionSource / ConnectionConfig -> Database handle
//!     ├── IdentityAccount (unit of storage and consistency)
//!     └── AccountQuery (lazy ad-hoc queries)
//! ```
//!
//! ## Important Notes
//!
//! * Password hashing, token generation, and lockout are the caller's
//!   concern; this layer stores what it is given
//! * No optimistic-concurrency token exists; concurrent updates to one
//!   account are last-writer-wins at the document level
//! * Lookups that find nothing return `Ok(None)`; absence is not an error
//!
//! ## Related Components
//!
//! * [`warden_logging`]: Log subscriber setup for binaries and tests
//!
//! [`warden_logging`]: https://docs.rs/warden_logging

#![forbid(unsafe_code)]
#![deny(
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    variant_size_differences,
    unused_features,
    unused_results
)]
#![allow(rustdoc::broken_intra_doc_links)]

/// Standard imports for this library
pub mod prelude {
    pub use crate::account::*;
    pub use crate::connection::*;
    pub use crate::contracts::*;
    pub use crate::misc::*;
    pub use crate::query::*;
    pub use crate::settings::*;
    pub use crate::store::*;
}

/// The per-user account document and its in-memory sub-collection mutators
pub mod account;
/// Resolving connection descriptors into database handles
pub mod connection;
/// The capability-scoped contracts consumed by the calling framework
pub mod contracts;
/// For errors
pub mod misc;
/// Lazy queries over the whole account collection
pub mod query;
/// Deployment-time store settings
pub mod settings;
/// The identity store operation set
pub mod store;
