//! Concurrent writers on one collection.

use futures::future::join_all;

use kalends_db::db::store::DavStore;
use kalends_service::caldav::service::calendar::get_changes_for_calendar;
use kalends_service::caldav::service::object::create_calendar_object;
use kalends_test::ics;
use kalends_test::store::new_calendar;

const WRITERS: usize = 16;

store_test!(concurrent_writes_get_distinct_tokens);
async fn concurrent_writes_get_distinct_tokens(store: &dyn DavStore) {
    let calendar = new_calendar(store).await.unwrap();
    let payloads: Vec<(String, Vec<u8>)> = (0..WRITERS)
        .map(|n| {
            let uri = format!("{n:02}.ics");
            let payload = ics::simple_event(&uri, "20250101T100000Z", "20250101T110000Z");
            (uri, payload)
        })
        .collect();

    let writes = join_all(payloads.iter().map(|(uri, payload)| {
        create_calendar_object(store, calendar.instance_id, uri, payload)
    }))
    .await;

    let mut tokens: Vec<i64> = writes.into_iter().map(|write| write.unwrap().token).collect();
    tokens.sort_unstable();
    let expected: Vec<i64> = (1..=i64::try_from(WRITERS).unwrap()).collect();
    assert_eq!(tokens, expected);

    let current = store.current_token(calendar.collection_id).await.unwrap().unwrap();
    assert_eq!(current, i64::try_from(WRITERS).unwrap() + 1);

    let changes = get_changes_for_calendar(store, calendar.collection_id, "1", None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(changes.added.len(), WRITERS);
    assert_eq!(changes.sync_token, current);
}
