//! Calendar object writes and the fields derived from them.

use kalends_core::constants::OCCURRENCE_HORIZON;
use kalends_core::types::ComponentType;
use kalends_db::db::store::DavStore;
use kalends_db::model::object::DavObject;
use kalends_service::caldav::service::object::{
    create_calendar_object, get_calendar_object, get_multiple_calendar_objects,
    list_calendar_objects, update_calendar_object,
};
use kalends_service::dav::etag::generate_etag;
use kalends_service::error::ServiceError;
use kalends_test::ics::{self, ComponentBuilder};
use kalends_test::store::new_calendar;

const JAN_1_2024: i64 = 1_704_067_200;
const HOUR: i64 = 3_600;
const DAY: i64 = 86_400;

async fn store_and_load(store: &dyn DavStore, payload: &[u8]) -> DavObject {
    let calendar = new_calendar(store).await.unwrap();
    create_calendar_object(store, calendar.instance_id, "object.ics", payload)
        .await
        .unwrap();
    get_calendar_object(store, calendar.collection_id, "object.ics")
        .await
        .unwrap()
        .unwrap()
}

store_test!(timed_event_span);
async fn timed_event_span(store: &dyn DavStore) {
    let payload = ics::simple_event("timed", "20240101T100000Z", "20240101T110000Z");
    let object = store_and_load(store, &payload).await;
    assert_eq!(object.first_occurrence, Some(JAN_1_2024 + 10 * HOUR));
    assert_eq!(object.last_occurrence, Some(JAN_1_2024 + 11 * HOUR));
    assert_eq!(object.component_type.map(ComponentType::from), Some(ComponentType::VEvent));
    assert_eq!(object.uid.as_deref(), Some("timed"));
    assert_eq!(object.etag, generate_etag(&payload));
    assert_eq!(object.size, i64::try_from(payload.len()).unwrap());
    assert_eq!(object.data, payload);
}

store_test!(all_day_event_lasts_one_day);
async fn all_day_event_lasts_one_day(store: &dyn DavStore) {
    let payload = ics::calendar([ComponentBuilder::event("all-day").start("20240101")]);
    let object = store_and_load(store, &payload).await;
    assert_eq!(object.first_occurrence, Some(JAN_1_2024));
    assert_eq!(object.last_occurrence, Some(JAN_1_2024 + DAY));
}

store_test!(duration_and_timezone);
async fn duration_and_timezone(store: &dyn DavStore) {
    let payload = ics::calendar([
        ComponentBuilder::timezone("Europe/Berlin", "+0100"),
        ComponentBuilder::event("berlin")
            .prop("DTSTART;TZID=Europe/Berlin", "20240101T100000")
            .duration("PT90M"),
    ]);
    let object = store_and_load(store, &payload).await;
    assert_eq!(object.first_occurrence, Some(JAN_1_2024 + 9 * HOUR));
    assert_eq!(object.last_occurrence, Some(JAN_1_2024 + 9 * HOUR + 90 * 60));
}

store_test!(bounded_recurrence_with_exception);
async fn bounded_recurrence_with_exception(store: &dyn DavStore) {
    let master = ComponentBuilder::event("daily")
        .start("20240101T100000Z")
        .end("20240101T110000Z")
        .rrule("FREQ=DAILY;COUNT=3")
        .exdate("20240103T100000Z");
    let counted = store_and_load(store, &ics::calendar([master.clone()])).await;
    assert_eq!(counted.first_occurrence, Some(JAN_1_2024 + 10 * HOUR));
    assert_eq!(counted.last_occurrence, Some(JAN_1_2024 + DAY + 11 * HOUR));

    let moved = ComponentBuilder::event("daily")
        .recurrence_id("20240102T100000Z")
        .start("20240110T100000Z")
        .end("20240110T110000Z");
    let overridden = store_and_load(store, &ics::calendar([master, moved])).await;
    assert_eq!(overridden.last_occurrence, Some(JAN_1_2024 + 9 * DAY + 11 * HOUR));
}

store_test!(unbounded_recurrence_stops_at_horizon);
async fn unbounded_recurrence_stops_at_horizon(store: &dyn DavStore) {
    let payload = ics::calendar([ComponentBuilder::event("weekly")
        .start("20240101T100000Z")
        .end("20240101T110000Z")
        .rrule("FREQ=WEEKLY")]);
    let object = store_and_load(store, &payload).await;
    assert_eq!(object.last_occurrence, Some(OCCURRENCE_HORIZON));

    // An occurrence ending exactly on the horizon is the last one counted.
    let boundary = ics::calendar([ComponentBuilder::event("boundary")
        .start("20371231T230000Z")
        .end("20380101T000000Z")
        .rrule("FREQ=DAILY;COUNT=5")]);
    let object = store_and_load(store, &boundary).await;
    assert_eq!(object.last_occurrence, Some(OCCURRENCE_HORIZON));
}

store_test!(todos_have_no_occurrence_span);
async fn todos_have_no_occurrence_span(store: &dyn DavStore) {
    let payload = ics::calendar([ComponentBuilder::todo("task").due("20240105T120000Z")]);
    let object = store_and_load(store, &payload).await;
    assert_eq!(object.component_type.map(ComponentType::from), Some(ComponentType::VTodo));
    assert_eq!(object.first_occurrence, None);
    assert_eq!(object.last_occurrence, None);
}

store_test!(malformed_payloads_are_rejected);
async fn malformed_payloads_are_rejected(store: &dyn DavStore) {
    let calendar = new_calendar(store).await.unwrap();
    let rejected = [
        ics::calendar([ComponentBuilder::timezone("Europe/Berlin", "+0100")]),
        ics::calendar([ComponentBuilder::new("VEVENT").start("20240101T100000Z")]),
        ics::calendar([ComponentBuilder::event("no-start").summary("x")]),
        ics::calendar([ComponentBuilder::event("bad-rule").start("20240101T100000Z").rrule("FREQ=SOMETIMES")]),
        b"BEGIN:VCARD\r\nEND:VCARD\r\n".to_vec(),
    ];
    for payload in rejected {
        let result = create_calendar_object(store, calendar.instance_id, "x.ics", &payload).await;
        assert!(
            matches!(result, Err(ServiceError::MalformedPayload(_))),
            "{}",
            String::from_utf8_lossy(&payload)
        );
    }
    assert!(list_calendar_objects(store, calendar.collection_id).await.unwrap().is_empty());
}

store_test!(update_recomputes_fields);
async fn update_recomputes_fields(store: &dyn DavStore) {
    let calendar = new_calendar(store).await.unwrap();
    let first = ics::simple_event("moving", "20240101T100000Z", "20240101T110000Z");
    let second = ics::simple_event("moving", "20240102T100000Z", "20240102T120000Z");
    let created = create_calendar_object(store, calendar.instance_id, "m.ics", &first)
        .await
        .unwrap();
    let updated = update_calendar_object(store, calendar.instance_id, "m.ics", &second)
        .await
        .unwrap();
    assert_ne!(created.etag, updated.etag);
    assert_eq!(updated.token, created.token + 1);

    let object = get_calendar_object(store, calendar.collection_id, "m.ics")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(object.first_occurrence, Some(JAN_1_2024 + DAY + 10 * HOUR));
    assert_eq!(object.last_occurrence, Some(JAN_1_2024 + DAY + 12 * HOUR));

    let listed = list_calendar_objects(store, calendar.collection_id).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].etag, updated.etag);

    let fetched = get_multiple_calendar_objects(
        store,
        calendar.collection_id,
        &["m.ics".to_owned(), "other.ics".to_owned()],
    )
    .await
    .unwrap();
    assert_eq!(fetched.len(), 1);
}
