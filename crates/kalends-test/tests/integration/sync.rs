//! Change log and sync-collection behavior.

use kalends_db::db::store::DavStore;
use kalends_service::caldav::service::calendar::get_changes_for_calendar;
use kalends_service::caldav::service::object::{
    create_calendar_object, delete_calendar_object, update_calendar_object,
};
use kalends_service::dav::sync::format_token;
use kalends_service::error::ServiceError;
use kalends_test::ics;
use kalends_test::store::new_calendar;

fn event(uid: &str) -> Vec<u8> {
    ics::simple_event(uid, "20250110T090000Z", "20250110T100000Z")
}

store_test!(fresh_calendar_initial_sync);
async fn fresh_calendar_initial_sync(store: &dyn DavStore) {
    let calendar = new_calendar(store).await.unwrap();
    let changes = get_changes_for_calendar(store, calendar.collection_id, "", None)
        .await
        .unwrap()
        .unwrap();
    assert!(changes.is_empty());
    assert_eq!(changes.sync_token, 1);
    assert!(!changes.result_truncated);
}

store_test!(token_advances_once_per_mutation);
async fn token_advances_once_per_mutation(store: &dyn DavStore) {
    let calendar = new_calendar(store).await.unwrap();
    let id = calendar.instance_id;

    create_calendar_object(store, id, "a.ics", &event("a")).await.unwrap();
    create_calendar_object(store, id, "b.ics", &event("b")).await.unwrap();
    update_calendar_object(store, id, "a.ics", &event("a")).await.unwrap();
    delete_calendar_object(store, id, "b.ics").await.unwrap();
    assert_eq!(store.current_token(calendar.collection_id).await.unwrap(), Some(5));

    // Rejected writes do not advance the token.
    assert!(create_calendar_object(store, id, "a.ics", &event("a")).await.is_err());
    assert!(delete_calendar_object(store, id, "missing.ics").await.is_err());
    assert!(create_calendar_object(store, id, "bad.ics", b"garbage").await.is_err());
    assert_eq!(store.current_token(calendar.collection_id).await.unwrap(), Some(5));
}

store_test!(last_operation_per_uri_wins);
async fn last_operation_per_uri_wins(store: &dyn DavStore) {
    let calendar = new_calendar(store).await.unwrap();
    let id = calendar.instance_id;
    let before = store.current_token(calendar.collection_id).await.unwrap().unwrap();

    create_calendar_object(store, id, "x.ics", &event("x")).await.unwrap();
    update_calendar_object(store, id, "x.ics", &event("x")).await.unwrap();
    create_calendar_object(store, id, "y.ics", &event("y")).await.unwrap();

    let changes = get_changes_for_calendar(store, calendar.collection_id, &before.to_string(), None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(changes.added, vec!["y.ics"]);
    assert_eq!(changes.modified, vec!["x.ics"]);
    assert!(changes.deleted.is_empty());
    assert_eq!(changes.sync_token, before + 3);

    // The prefixed form of the same token is equivalent, and repeating the
    // request without writes in between is idempotent.
    let again = get_changes_for_calendar(store, calendar.collection_id, &format_token(before), None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(again, changes);

    let caught_up = get_changes_for_calendar(store, calendar.collection_id, &format_token(changes.sync_token), None)
        .await
        .unwrap()
        .unwrap();
    assert!(caught_up.is_empty());
    assert_eq!(caught_up.sync_token, changes.sync_token);
}

store_test!(deleted_members_are_reported);
async fn deleted_members_are_reported(store: &dyn DavStore) {
    let calendar = new_calendar(store).await.unwrap();
    let id = calendar.instance_id;
    create_calendar_object(store, id, "gone.ics", &event("gone")).await.unwrap();
    let after_create = store.current_token(calendar.collection_id).await.unwrap().unwrap();
    delete_calendar_object(store, id, "gone.ics").await.unwrap();

    let changes = get_changes_for_calendar(store, calendar.collection_id, &after_create.to_string(), None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(changes.deleted, vec!["gone.ics"]);

    let initial = get_changes_for_calendar(store, calendar.collection_id, "", None)
        .await
        .unwrap()
        .unwrap();
    assert!(initial.added.is_empty());
}

store_test!(limit_truncates_and_resumes);
async fn limit_truncates_and_resumes(store: &dyn DavStore) {
    let calendar = new_calendar(store).await.unwrap();
    for n in 0..5 {
        let uri = format!("{n}.ics");
        create_calendar_object(store, calendar.instance_id, &uri, &event(&uri)).await.unwrap();
    }

    let first = get_changes_for_calendar(store, calendar.collection_id, "1", Some(2))
        .await
        .unwrap()
        .unwrap();
    assert!(first.result_truncated);
    assert_eq!(first.added, vec!["0.ics", "1.ics"]);
    assert_eq!(first.sync_token, 3);

    let rest = get_changes_for_calendar(store, calendar.collection_id, &first.sync_token.to_string(), Some(10))
        .await
        .unwrap()
        .unwrap();
    assert!(!rest.result_truncated);
    assert_eq!(rest.added, vec!["2.ics", "3.ics", "4.ics"]);
    assert_eq!(rest.sync_token, 6);
}

store_test!(unknown_collection_and_bad_tokens);
async fn unknown_collection_and_bad_tokens(store: &dyn DavStore) {
    let missing = get_changes_for_calendar(store, uuid::Uuid::new_v4(), "1", None).await.unwrap();
    assert_eq!(missing, None);

    let calendar = new_calendar(store).await.unwrap();
    for token in ["-1", "abc", "http://example.com/sync/1"] {
        assert!(matches!(
            get_changes_for_calendar(store, calendar.collection_id, token, None).await,
            Err(ServiceError::InvalidSyncToken(_))
        ));
    }
}
