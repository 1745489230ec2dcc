//! Per-principal scheduling inbox.

use kalends_db::db::store::DavStore;
use kalends_db::model::scheduling::{DavSchedulingObject, NewDavSchedulingObject};

use crate::dav::etag::{generate_etag, payload_size};
use crate::error::{ServiceError, ServiceResult};

/// ## Summary
/// Delivers an iTIP message to a principal's inbox.
///
/// ## Errors
/// Returns [`ServiceError::Conflict`] if the uri is taken.
#[tracing::instrument(skip(store, data), fields(size = data.len()))]
pub async fn create_scheduling_object(
    store: &dyn DavStore,
    principal_uri: &str,
    uri: &str,
    data: &[u8],
) -> ServiceResult<DavSchedulingObject> {
    let object = NewDavSchedulingObject {
        id: uuid::Uuid::new_v4(),
        principal_uri: principal_uri.to_owned(),
        uri: uri.to_owned(),
        data: data.to_vec(),
        etag: generate_etag(data),
        size: payload_size(data),
        last_modified: chrono::Utc::now(),
    };
    store.insert_scheduling_object(object).await.map_err(|err| {
        if err.is_unique_violation() {
            ServiceError::Conflict(format!("{principal_uri}/{uri} already exists"))
        } else {
            err.into()
        }
    })
}

/// ## Errors
/// Returns database errors.
pub async fn get_scheduling_object(
    store: &dyn DavStore,
    principal_uri: &str,
    uri: &str,
) -> ServiceResult<Option<DavSchedulingObject>> {
    Ok(store.get_scheduling_object(principal_uri, uri).await?)
}

/// ## Errors
/// Returns database errors.
pub async fn list_scheduling_objects(
    store: &dyn DavStore,
    principal_uri: &str,
) -> ServiceResult<Vec<DavSchedulingObject>> {
    Ok(store.list_scheduling_objects(principal_uri).await?)
}

/// ## Errors
/// Returns [`ServiceError::NotFound`] if the message does not exist.
pub async fn delete_scheduling_object(
    store: &dyn DavStore,
    principal_uri: &str,
    uri: &str,
) -> ServiceResult<()> {
    if store.delete_scheduling_object(principal_uri, uri).await? {
        Ok(())
    } else {
        Err(ServiceError::NotFound(format!("{principal_uri}/{uri}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kalends_db::db::memory::MemoryStore;

    const REQUEST: &[u8] = b"BEGIN:VCALENDAR\r\nMETHOD:REQUEST\r\nEND:VCALENDAR\r\n";

    #[test_log::test(tokio::test)]
    async fn inbox_lifecycle() {
        let store = MemoryStore::new();
        let created = create_scheduling_object(&store, "principals/bob", "invite.ics", REQUEST)
            .await
            .unwrap();
        assert_eq!(created.etag, generate_etag(REQUEST));
        assert_eq!(created.size, payload_size(REQUEST));

        assert!(matches!(
            create_scheduling_object(&store, "principals/bob", "invite.ics", REQUEST).await,
            Err(ServiceError::Conflict(_))
        ));
        assert!(get_scheduling_object(&store, "principals/alice", "invite.ics")
            .await
            .unwrap()
            .is_none());
        assert_eq!(list_scheduling_objects(&store, "principals/bob").await.unwrap().len(), 1);

        delete_scheduling_object(&store, "principals/bob", "invite.ics").await.unwrap();
        assert!(matches!(
            delete_scheduling_object(&store, "principals/bob", "invite.ics").await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
