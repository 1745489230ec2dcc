//! Shared calendars.

use kalends_db::db::enums::{InviteStatus, ShareAccess};
use kalends_db::db::store::DavStore;
use kalends_service::caldav::service::calendar::{delete_calendar, list_calendars};
use kalends_service::caldav::service::object::{
    create_calendar_object, delete_calendar_object, get_calendar_object, get_calendar_object_by_uid,
};
use kalends_service::caldav::service::sharing::{Sharee, get_invites, update_invites};
use kalends_service::error::ServiceError;
use kalends_test::ics;
use kalends_test::store::{new_calendar, unique_principal};

fn share(principal: &str, access: ShareAccess) -> Sharee {
    Sharee {
        href: format!("mailto:{}@example.com", principal.replace('/', "-")),
        principal: Some(principal.to_owned()),
        access,
        display_name: None,
    }
}

store_test!(sharees_write_through_their_instance);
async fn sharees_write_through_their_instance(store: &dyn DavStore) {
    let calendar = new_calendar(store).await.unwrap();
    let writer = unique_principal();
    let reader = unique_principal();
    update_invites(
        store,
        calendar.instance_id,
        &[share(&writer, ShareAccess::ReadWrite), share(&reader, ShareAccess::Read)],
    )
    .await
    .unwrap();

    let writer_view = list_calendars(store, &writer).await.unwrap().remove(0);
    let reader_view = list_calendars(store, &reader).await.unwrap().remove(0);
    assert!(!writer_view.read_only);
    assert!(reader_view.read_only);

    let payload = ics::simple_event("shared", "20250101T100000Z", "20250101T110000Z");
    create_calendar_object(store, writer_view.instance_id, "shared.ics", &payload)
        .await
        .unwrap();
    assert!(get_calendar_object(store, calendar.collection_id, "shared.ics").await.unwrap().is_some());
    assert!(matches!(
        delete_calendar_object(store, reader_view.instance_id, "shared.ics").await,
        Err(ServiceError::Forbidden(_))
    ));

    // UID lookup only covers calendars the principal owns.
    assert_eq!(
        get_calendar_object_by_uid(store, &writer, "shared").await.unwrap(),
        None
    );
    let owner = calendar.principal_uri.clone().unwrap();
    assert_eq!(
        get_calendar_object_by_uid(store, &owner, "shared").await.unwrap(),
        Some(format!("{}/shared.ics", calendar.uri))
    );
}

store_test!(sharee_delete_keeps_the_calendar);
async fn sharee_delete_keeps_the_calendar(store: &dyn DavStore) {
    let calendar = new_calendar(store).await.unwrap();
    let sharee = unique_principal();
    update_invites(store, calendar.instance_id, &[share(&sharee, ShareAccess::Read)])
        .await
        .unwrap();
    let view = list_calendars(store, &sharee).await.unwrap().remove(0);

    delete_calendar(store, view.instance_id).await.unwrap();
    assert!(list_calendars(store, &sharee).await.unwrap().is_empty());
    assert_eq!(store.current_token(calendar.collection_id).await.unwrap(), Some(1));

    let invites = get_invites(store, calendar.collection_id).await.unwrap();
    assert_eq!(invites.len(), 1);
    assert_eq!(invites[0].access, ShareAccess::Owner);
}

store_test!(owner_delete_removes_sharees);
async fn owner_delete_removes_sharees(store: &dyn DavStore) {
    let calendar = new_calendar(store).await.unwrap();
    let sharee = unique_principal();
    update_invites(store, calendar.instance_id, &[share(&sharee, ShareAccess::ReadWrite)])
        .await
        .unwrap();

    delete_calendar(store, calendar.instance_id).await.unwrap();
    assert!(list_calendars(store, &sharee).await.unwrap().is_empty());
    assert!(matches!(
        get_invites(store, calendar.collection_id).await,
        Err(ServiceError::UnknownCollection(_))
    ));
}

store_test!(invite_updates);
async fn invite_updates(store: &dyn DavStore) {
    let calendar = new_calendar(store).await.unwrap();
    let sharee = unique_principal();
    let mut invite = share(&sharee, ShareAccess::Read);
    update_invites(store, calendar.instance_id, std::slice::from_ref(&invite))
        .await
        .unwrap();

    invite.access = ShareAccess::ReadWrite;
    invite.display_name = Some("Sam".to_owned());
    update_invites(store, calendar.instance_id, std::slice::from_ref(&invite))
        .await
        .unwrap();

    let invites = get_invites(store, calendar.collection_id).await.unwrap();
    let current = invites.iter().find(|candidate| candidate.href == invite.href).unwrap();
    assert_eq!(current.access, ShareAccess::ReadWrite);
    assert_eq!(current.display_name.as_deref(), Some("Sam"));
    assert_eq!(current.invite_status, InviteStatus::Accepted);
    assert_eq!(list_calendars(store, &sharee).await.unwrap().len(), 1);

    let stranger = Sharee {
        href: format!("mailto:{}@example.com", uuid::Uuid::new_v4()),
        principal: None,
        access: ShareAccess::Read,
        display_name: None,
    };
    update_invites(store, calendar.instance_id, std::slice::from_ref(&stranger))
        .await
        .unwrap();
    let invites = get_invites(store, calendar.collection_id).await.unwrap();
    let invalid = invites.iter().find(|candidate| candidate.href == stranger.href).unwrap();
    assert_eq!(invalid.invite_status, InviteStatus::Invalid);

    invite.access = ShareAccess::NoAccess;
    update_invites(store, calendar.instance_id, &[invite]).await.unwrap();
    assert!(list_calendars(store, &sharee).await.unwrap().is_empty());
}
