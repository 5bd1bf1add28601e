//! Round-trip tests against a live MongoDB instance.
//!
//! Set `WARDEN_TEST_MONGODB` to a connection URL (for example
//! `mongodb://127.0.0.1:27017`) to enable these; they skip cleanly when the
//! variable is unset. Each test owns a collection and purges it first.

use std::time::Duration;

use mongodb::bson::doc;
use mongodb::Client;
use warden_user::prelude::*;

const TEST_DB: &str = "warden_roundtrip";

async fn store_or_skip(collection: &str, settings: StoreSettings) -> Option<IdentityStore> {
    let Ok(url) = std::env::var("WARDEN_TEST_MONGODB") else {
        eprintln!("WARDEN_TEST_MONGODB not set; skipping round-trip test");
        return None;
    };

    warden_logging::setup_log_no_panic_hook();

    let client = Client::with_uri_str(&url).await.unwrap();
    let store = IdentityStore::new(
        client.database(TEST_DB),
        settings.with_collection_name(collection),
    );
    let _ = store.purge().await.unwrap();
    Some(store)
}

#[tokio::test]
async fn create_then_find_by_id_round_trips() {
    let Some(store) = store_or_skip("create_find", StoreSettings::default()).await else {
        return;
    };

    let mut account = IdentityAccount::new("alice");
    store
        .set_email(&mut account, "Alice@Example.COM")
        .await
        .unwrap();
    store
        .set_password_hash(&mut account, Some("AQAAAAEAACcQ"))
        .await
        .unwrap();
    store.create_account(&mut account).await.unwrap();

    let found = store
        .find_by_id(&account.id().to_hex())
        .await
        .unwrap()
        .expect("inserted account must be found");

    assert_eq!(found.user_name(), "alice");
    assert_eq!(found.email(), Some("alice@example.com"));
    assert_eq!(found.password_hash(), Some("AQAAAAEAACcQ"));
    assert_eq!(found.date_created(), account.date_created());
    assert_eq!(found.date_created(), found.date_last_modified());
}

#[tokio::test]
async fn update_reflects_changes_and_advances_modified() {
    let Some(store) = store_or_skip("update", StoreSettings::default()).await else {
        return;
    };

    let mut account = IdentityAccount::new("bob");
    store
        .set_email(&mut account, "bob@example.com")
        .await
        .unwrap();
    store.create_account(&mut account).await.unwrap();

    let created = account.date_created();
    let modified_before = account.date_last_modified();

    // BSON datetimes carry millisecond precision; step past it
    tokio::time::sleep(Duration::from_millis(5)).await;

    store
        .set_email(&mut account, "robert@example.com")
        .await
        .unwrap();
    store.update_account(&mut account).await.unwrap();

    let found = store
        .find_by_id(&account.id().to_hex())
        .await
        .unwrap()
        .expect("updated account must be found");

    assert_eq!(found.email(), Some("robert@example.com"));
    assert_eq!(found.date_created(), created);
    assert!(found.date_last_modified() > modified_before);
}

#[tokio::test]
async fn update_upserts_records_created_out_of_band() {
    let Some(store) = store_or_skip("upsert", StoreSettings::default()).await else {
        return;
    };

    // never inserted through create_account
    let mut account = IdentityAccount::new("carol");
    store.update_account(&mut account).await.unwrap();

    let found = store.find_by_id(&account.id().to_hex()).await.unwrap();
    assert!(found.is_some());
}

#[tokio::test]
async fn username_lookup_is_exact_by_default() {
    let Some(store) = store_or_skip("username_exact", StoreSettings::default()).await else {
        return;
    };

    let mut account = IdentityAccount::new("Dave");
    store.create_account(&mut account).await.unwrap();

    assert!(store.find_by_username("Dave").await.unwrap().is_some());
    assert!(store.find_by_username("dave").await.unwrap().is_none());
}

#[tokio::test]
async fn username_and_email_lookups_ignore_case_when_enabled() {
    let settings = StoreSettings::default().with_case_insensitive_lookup(true);
    let Some(store) = store_or_skip("username_ci", settings).await else {
        return;
    };

    let mut account = IdentityAccount::new("Erin");
    store
        .set_email(&mut account, "Erin@Example.com")
        .await
        .unwrap();
    store.create_account(&mut account).await.unwrap();

    assert!(store.find_by_username("ERIN").await.unwrap().is_some());
    assert!(store.find_by_username("erin").await.unwrap().is_some());
    assert!(store
        .find_by_email("ERIN@EXAMPLE.COM")
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn login_lookup_matches_both_fields_in_one_element() {
    let Some(store) = store_or_skip("logins", StoreSettings::default()).await else {
        return;
    };

    let mut account = IdentityAccount::new("frank");
    store
        .add_login(&mut account, "github", "key-1")
        .await
        .unwrap();
    store
        .add_login(&mut account, "google", "key-2")
        .await
        .unwrap();
    store.create_account(&mut account).await.unwrap();

    let found = store.find_by_login("github", "key-1").await.unwrap();
    assert_eq!(found.map(|a| a.id()), Some(account.id()));

    assert!(store.find_by_login("github", "key-9").await.unwrap().is_none());
    // provider and key from different elements must not combine
    assert!(store.find_by_login("github", "key-2").await.unwrap().is_none());
}

#[tokio::test]
async fn delete_then_find_returns_none() {
    let Some(store) = store_or_skip("delete", StoreSettings::default()).await else {
        return;
    };

    let mut account = IdentityAccount::new("grace");
    store.create_account(&mut account).await.unwrap();
    assert!(store
        .find_by_id(&account.id().to_hex())
        .await
        .unwrap()
        .is_some());

    store.delete_account(&account).await.unwrap();
    assert!(store
        .find_by_id(&account.id().to_hex())
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn sub_collection_edits_persist_only_through_update() {
    let Some(store) = store_or_skip("deferred", StoreSettings::default()).await else {
        return;
    };

    let mut account = IdentityAccount::new("heidi");
    store.create_account(&mut account).await.unwrap();

    store
        .add_claim(&mut account, "scope", "read")
        .await
        .unwrap();
    store.add_to_role(&mut account, "Admin").await.unwrap();

    // nothing persisted yet
    let stored = store
        .find_by_id(&account.id().to_hex())
        .await
        .unwrap()
        .unwrap();
    assert!(stored.claims().is_empty());
    assert!(stored.roles().is_empty());

    store.update_account(&mut account).await.unwrap();

    let stored = store
        .find_by_id(&account.id().to_hex())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.claims().len(), 1);
    assert!(stored.is_in_role("admin"));
}

#[tokio::test]
async fn all_accounts_supports_ad_hoc_queries() {
    let Some(store) = store_or_skip("queries", StoreSettings::default()).await else {
        return;
    };

    for name in ["ivan", "judy", "mallory"] {
        let mut account = IdentityAccount::new(name);
        store.create_account(&mut account).await.unwrap();
    }

    assert_eq!(store.all_accounts().unwrap().count().await.unwrap(), 3);

    let matched = store
        .all_accounts()
        .unwrap()
        .filter(doc! { "userName": "judy" })
        .collect()
        .await
        .unwrap();
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].user_name(), "judy");

    let purged = store.purge().await.unwrap();
    assert_eq!(purged, 3);
    assert_eq!(store.all_accounts().unwrap().count().await.unwrap(), 0);
}
