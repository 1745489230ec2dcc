//! calendar-query planning against stored objects.

use chrono::{TimeZone, Utc};

use kalends_core::types;
use kalends_db::db::enums::ComponentType;
use kalends_db::db::store::DavStore;
use kalends_db::model::object::NewDavObject;
use kalends_rfc::rfc::filter::{CalendarFilter, CompFilter, PropFilter, TextMatch, TimeRange};
use kalends_service::caldav::query::calendar_query;
use kalends_service::caldav::service::calendar::CalendarInfo;
use kalends_service::caldav::service::object::create_calendar_object;
use kalends_service::error::ServiceError;
use kalends_test::ics::{self, ComponentBuilder};
use kalends_test::store::new_calendar;

fn day(day: u32) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, day, 0, 0, 0).unwrap()
}

async fn seeded(store: &dyn DavStore) -> CalendarInfo {
    let calendar = new_calendar(store).await.unwrap();
    let objects = [
        ("early.ics", ics::simple_event("early", "20250102T090000Z", "20250102T100000Z")),
        (
            "standup.ics",
            ics::calendar([ComponentBuilder::event("standup")
                .start("20250110T090000Z")
                .end("20250110T091500Z")
                .summary("Daily Standup")
                .child(ComponentBuilder::alarm("-PT10M"))]),
        ),
        ("late.ics", ics::simple_event("late", "20250120T090000Z", "20250120T100000Z")),
        (
            "weekly.ics",
            ics::calendar([ComponentBuilder::event("weekly")
                .start("20250101T120000Z")
                .end("20250101T130000Z")
                .rrule("FREQ=WEEKLY;COUNT=4")]),
        ),
        ("task.ics", ics::calendar([ComponentBuilder::todo("task").due("20250115T120000Z")])),
    ];
    for (uri, payload) in objects {
        create_calendar_object(store, calendar.instance_id, uri, &payload)
            .await
            .unwrap();
    }
    calendar
}

async fn run(store: &dyn DavStore, calendar: &CalendarInfo, filter: &CalendarFilter) -> Vec<String> {
    let mut uris = calendar_query(store, calendar.collection_id, filter).await.unwrap();
    uris.sort();
    uris
}

fn events() -> CompFilter {
    CompFilter::new("VEVENT")
}

store_test!(component_type_filters);
async fn component_type_filters(store: &dyn DavStore) {
    let calendar = seeded(store).await;

    let all = run(store, &calendar, &CalendarFilter::vcalendar()).await;
    assert_eq!(all.len(), 5);

    let todos = run(store, &calendar, &CalendarFilter::vcalendar().with_comp(CompFilter::new("VTODO"))).await;
    assert_eq!(todos, vec!["task.ics"]);

    let event_uris = run(store, &calendar, &CalendarFilter::vcalendar().with_comp(events())).await;
    assert_eq!(event_uris, vec!["early.ics", "late.ics", "standup.ics", "weekly.ics"]);

    let no_todo = CalendarFilter::vcalendar().with_comp(CompFilter::new("VTODO").not_defined());
    assert_eq!(run(store, &calendar, &no_todo).await.len(), 4);

    let polls = CalendarFilter::vcalendar().with_comp(CompFilter::new("VPOLL"));
    assert!(run(store, &calendar, &polls).await.is_empty());

    let both = CalendarFilter::vcalendar()
        .with_comp(events())
        .with_comp(CompFilter::new("VTODO"));
    assert!(run(store, &calendar, &both).await.is_empty());
}

store_test!(time_ranges_use_occurrences);
async fn time_ranges_use_occurrences(store: &dyn DavStore) {
    let calendar = seeded(store).await;

    let after = CalendarFilter::vcalendar().with_comp(events().with_time_range(TimeRange::from(day(16))));
    assert_eq!(run(store, &calendar, &after).await, vec!["late.ics", "weekly.ics"]);

    let before = CalendarFilter::vcalendar().with_comp(events().with_time_range(TimeRange::until(day(3))));
    assert_eq!(run(store, &calendar, &before).await, vec!["early.ics", "weekly.ics"]);

    // The weekly event spans Jan 1 to Jan 22 but has no instance in Jan 9-14.
    let window = CalendarFilter::vcalendar()
        .with_comp(events().with_time_range(TimeRange::new(day(9), day(14))));
    assert_eq!(run(store, &calendar, &window).await, vec!["standup.ics"]);

    let todo_window = CalendarFilter::vcalendar()
        .with_comp(CompFilter::new("VTODO").with_time_range(TimeRange::new(day(15), day(16))));
    assert_eq!(run(store, &calendar, &todo_window).await, vec!["task.ics"]);
}

store_test!(single_bound_range_skips_post_filter);
async fn single_bound_range_skips_post_filter(store: &dyn DavStore) {
    let calendar = new_calendar(store).await.unwrap();
    let start = day(10).timestamp();
    // Index columns only; the payload itself would never parse.
    store
        .insert_object(NewDavObject {
            collection_id: calendar.collection_id,
            uri: "indexed.ics".to_owned(),
            data: b"not a calendar".to_vec(),
            etag: "x".to_owned(),
            size: 14,
            last_modified: Utc::now(),
            component_type: Some(ComponentType(types::ComponentType::VEvent)),
            first_occurrence: Some(start),
            last_occurrence: Some(start + 3_600),
            uid: Some("indexed".to_owned()),
        })
        .await
        .unwrap();

    let open = CalendarFilter::vcalendar().with_comp(events().with_time_range(TimeRange::from(day(9))));
    assert_eq!(run(store, &calendar, &open).await, vec!["indexed.ics"]);

    let bounded = CalendarFilter::vcalendar()
        .with_comp(events().with_time_range(TimeRange::new(day(9), day(11))));
    assert!(run(store, &calendar, &bounded).await.is_empty());
}

store_test!(property_and_alarm_filters);
async fn property_and_alarm_filters(store: &dyn DavStore) {
    let calendar = seeded(store).await;

    let summary = CalendarFilter::vcalendar().with_comp(
        events().with_prop_filter(PropFilter::new("SUMMARY").with_text_match(TextMatch::contains("standup"))),
    );
    assert_eq!(run(store, &calendar, &summary).await, vec!["standup.ics"]);

    let octet = CalendarFilter::vcalendar().with_comp(events().with_prop_filter(
        PropFilter::new("SUMMARY").with_text_match(TextMatch::contains("standup").with_collation("i;octet")),
    ));
    assert!(run(store, &calendar, &octet).await.is_empty());

    let untitled = CalendarFilter::vcalendar()
        .with_comp(events().with_prop_filter(PropFilter::new("SUMMARY").not_defined()));
    assert_eq!(
        run(store, &calendar, &untitled).await,
        vec!["early.ics", "late.ics", "weekly.ics"]
    );

    let alarm = CalendarFilter::vcalendar().with_comp(
        events().with_comp_filter(
            CompFilter::new("VALARM")
                .with_time_range(TimeRange::new(day(10), Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap())),
        ),
    );
    assert_eq!(run(store, &calendar, &alarm).await, vec!["standup.ics"]);
}

store_test!(query_errors);
async fn query_errors(store: &dyn DavStore) {
    let missing = calendar_query(store, uuid::Uuid::new_v4(), &CalendarFilter::vcalendar()).await;
    assert!(matches!(missing, Err(ServiceError::UnknownCollection(_))));

    let calendar = seeded(store).await;
    let bad_collation = CalendarFilter::vcalendar().with_comp(events().with_prop_filter(
        PropFilter::new("SUMMARY").with_text_match(TextMatch::equals("x").with_collation("i;klingon")),
    ));
    assert!(matches!(
        calendar_query(store, calendar.collection_id, &bad_collation).await,
        Err(ServiceError::ValidationError(_))
    ));
}
