//! Collection lifecycle, address books, subscriptions and the scheduling inbox.

use kalends_core::constants::{
    PROP_CALENDAR_ORDER, PROP_DISPLAYNAME, PROP_SCHEDULE_CALENDAR_TRANSP, PROP_SUBSCRIPTION_SOURCE,
};
use kalends_core::types::ComponentType;
use kalends_db::db::store::DavStore;
use kalends_service::caldav::service::calendar::{
    NewCalendarProps, create_calendar, delete_calendar, get_changes_for_calendar, list_calendars,
    update_calendar,
};
use kalends_service::caldav::service::object::{create_calendar_object, get_calendar_object};
use kalends_service::caldav::service::scheduling::{
    create_scheduling_object, delete_scheduling_object, list_scheduling_objects,
};
use kalends_service::caldav::service::subscription::{
    create_subscription, delete_subscription, list_subscriptions, update_subscription,
};
use kalends_service::carddav::service::addressbook::{
    get_changes_for_address_book, list_address_books, update_address_book,
};
use kalends_service::carddav::service::card::{create_card, delete_card, get_card, list_cards};
use kalends_service::dav::property::PropPatch;
use kalends_service::error::ServiceError;
use kalends_test::ics;
use kalends_test::store::{new_address_book, unique_principal};

store_test!(calendars_are_listed_by_order);
async fn calendars_are_listed_by_order(store: &dyn DavStore) {
    let principal = unique_principal();
    for (uri, order) in [("b", "2"), ("a", "2"), ("c", "1")] {
        let props = NewCalendarProps {
            properties: PropPatch::new().set(PROP_CALENDAR_ORDER, order),
            ..NewCalendarProps::default()
        };
        create_calendar(store, &principal, uri, props).await.unwrap();
    }
    let uris: Vec<String> = list_calendars(store, &principal)
        .await
        .unwrap()
        .into_iter()
        .map(|calendar| calendar.uri)
        .collect();
    assert_eq!(uris, vec!["c", "a", "b"]);
}

store_test!(calendar_properties_round_trip);
async fn calendar_properties_round_trip(store: &dyn DavStore) {
    let principal = unique_principal();
    let props = NewCalendarProps {
        supported_components: Some(vec![ComponentType::VTodo]),
        properties: PropPatch::new()
            .set(PROP_DISPLAYNAME, "Tasks")
            .set(PROP_SCHEDULE_CALENDAR_TRANSP, "Transparent"),
    };
    let calendar = create_calendar(store, &principal, "tasks", props).await.unwrap();
    assert_eq!(calendar.supported_components, vec!["VTODO"]);
    assert!(calendar.transparent);

    let patch = PropPatch::new()
        .remove(PROP_DISPLAYNAME)
        .remove(PROP_SCHEDULE_CALENDAR_TRANSP);
    let updated = update_calendar(store, calendar.instance_id, &patch).await.unwrap();
    assert_eq!(updated.display_name, None);
    assert!(!updated.transparent);

    let invalid = PropPatch::new().set(PROP_CALENDAR_ORDER, "soon");
    assert!(matches!(
        update_calendar(store, calendar.instance_id, &invalid).await,
        Err(ServiceError::InvalidPropertyValue { .. })
    ));

    // Property changes do not touch the change log.
    let changes = get_changes_for_calendar(store, calendar.collection_id, "1", None)
        .await
        .unwrap()
        .unwrap();
    assert!(changes.is_empty());
}

store_test!(deleting_a_calendar_cascades);
async fn deleting_a_calendar_cascades(store: &dyn DavStore) {
    let principal = unique_principal();
    let calendar = create_calendar(store, &principal, "doomed", NewCalendarProps::default())
        .await
        .unwrap();
    let payload = ics::simple_event("doomed", "20250101T100000Z", "20250101T110000Z");
    create_calendar_object(store, calendar.instance_id, "e.ics", &payload)
        .await
        .unwrap();

    delete_calendar(store, calendar.instance_id).await.unwrap();
    assert!(list_calendars(store, &principal).await.unwrap().is_empty());
    assert!(store.get_object(calendar.collection_id, "e.ics").await.unwrap().is_none());
    assert!(matches!(
        get_calendar_object(store, calendar.collection_id, "e.ics").await,
        Err(ServiceError::UnknownCollection(_))
    ));
    assert_eq!(store.current_token(calendar.collection_id).await.unwrap(), None);
    assert!(store.changes_between(calendar.collection_id, 0, i64::MAX).await.unwrap().is_empty());
    assert!(matches!(
        delete_calendar(store, calendar.instance_id).await,
        Err(ServiceError::NotFound(_))
    ));

    // The uri is free again.
    create_calendar(store, &principal, "doomed", NewCalendarProps::default())
        .await
        .unwrap();
}

store_test!(address_books_track_cards);
async fn address_books_track_cards(store: &dyn DavStore) {
    let book = new_address_book(store).await.unwrap();
    assert_eq!(book.sync_token, 1);

    let card = ics::vcard("Bob");
    create_card(store, book.instance_id, "bob.vcf", &card).await.unwrap();
    create_card(store, book.instance_id, "eve.vcf", &ics::vcard("Eve")).await.unwrap();
    delete_card(store, book.instance_id, "eve.vcf").await.unwrap();

    let stored = get_card(store, book.collection_id, "bob.vcf").await.unwrap().unwrap();
    assert_eq!(stored.data, card);
    assert_eq!(stored.uid, None);
    assert_eq!(list_cards(store, book.collection_id).await.unwrap().len(), 1);

    let initial = get_changes_for_address_book(store, book.collection_id, "", None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(initial.added, vec!["bob.vcf"]);
    assert_eq!(initial.sync_token, 4);

    let renamed = update_address_book(
        store,
        book.instance_id,
        &PropPatch::new().set(PROP_DISPLAYNAME, "Friends"),
    )
    .await
    .unwrap();
    assert_eq!(renamed.display_name.as_deref(), Some("Friends"));
    assert!(matches!(
        update_address_book(store, book.instance_id, &PropPatch::new().set(PROP_CALENDAR_ORDER, "1")).await,
        Err(ServiceError::UnsupportedProperty(_))
    ));

    // An address book is not reachable through calendar operations.
    assert!(matches!(
        update_calendar(store, book.instance_id, &PropPatch::new()).await,
        Err(ServiceError::NotFound(_))
    ));
    assert_eq!(list_address_books(store, &unique_principal()).await.unwrap(), Vec::new());
}

store_test!(subscriptions_and_inbox);
async fn subscriptions_and_inbox(store: &dyn DavStore) {
    let principal = unique_principal();
    let props = PropPatch::new().set(PROP_SUBSCRIPTION_SOURCE, "webcal://example.com/feed.ics");
    let subscription = create_subscription(store, &principal, "feed", &props).await.unwrap();
    assert!(matches!(
        create_subscription(store, &principal, "feed", &props).await,
        Err(ServiceError::Conflict(_))
    ));

    let moved = PropPatch::new().set(PROP_SUBSCRIPTION_SOURCE, "https://example.com/feed.ics");
    let updated = update_subscription(store, subscription.subscription.id, &moved)
        .await
        .unwrap();
    assert_eq!(updated.subscription.source, "https://example.com/feed.ics");
    assert_eq!(list_subscriptions(store, &principal).await.unwrap(), vec![updated]);
    delete_subscription(store, subscription.subscription.id).await.unwrap();
    assert!(list_subscriptions(store, &principal).await.unwrap().is_empty());

    let message = ics::simple_event("invite", "20250101T100000Z", "20250101T110000Z");
    create_scheduling_object(store, &principal, "invite.ics", &message).await.unwrap();
    assert_eq!(list_scheduling_objects(store, &principal).await.unwrap().len(), 1);
    delete_scheduling_object(store, &principal, "invite.ics").await.unwrap();
    assert!(list_scheduling_objects(store, &principal).await.unwrap().is_empty());
}
