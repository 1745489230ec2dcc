//! Store fixtures.
//!
//! Every scenario runs against [`MemoryStore`]; the PostgreSQL variant needs
//! `DATABASE_URL` and shares one migrated schema across tests, so fixtures
//! always use fresh principals and collection uris.

use tokio::sync::OnceCell;

use kalends_db::db::connection::{DbPool, create_pool};
use kalends_db::db::memory::MemoryStore;
use kalends_db::db::migrate::apply_schema;
use kalends_db::db::pg::PgStore;
use kalends_service::caldav::service::calendar::{CalendarInfo, NewCalendarProps, create_calendar};
use kalends_service::carddav::service::addressbook::{AddressBookInfo, create_address_book};
use kalends_service::dav::property::PropPatch;

static PG_POOL: OnceCell<DbPool> = OnceCell::const_new();

#[must_use]
pub fn memory_store() -> MemoryStore {
    MemoryStore::new()
}

/// ## Summary
/// A [`PgStore`] on `DATABASE_URL` with pending migrations applied once per process.
///
/// ## Errors
/// Returns an error if `DATABASE_URL` is unset or the database is unreachable.
pub async fn postgres_store() -> anyhow::Result<PgStore> {
    let pool = PG_POOL
        .get_or_try_init(|| async {
            let url = std::env::var("DATABASE_URL")?;
            apply_schema(&url).await?;
            create_pool(&url, 8).await
        })
        .await?;
    Ok(PgStore::new(pool.clone()))
}

/// A principal uri no other test uses.
#[must_use]
pub fn unique_principal() -> String {
    format!("principals/{}", uuid::Uuid::new_v4())
}

/// ## Summary
/// Creates a calendar with default components for a fresh principal.
///
/// ## Errors
/// Returns service errors from calendar creation.
pub async fn new_calendar(
    store: &dyn kalends_db::db::store::DavStore,
) -> anyhow::Result<CalendarInfo> {
    let principal = unique_principal();
    Ok(create_calendar(store, &principal, "calendar", NewCalendarProps::default()).await?)
}

/// ## Summary
/// Creates an empty address book for a fresh principal.
///
/// ## Errors
/// Returns service errors from address book creation.
pub async fn new_address_book(
    store: &dyn kalends_db::db::store::DavStore,
) -> anyhow::Result<AddressBookInfo> {
    let principal = unique_principal();
    Ok(create_address_book(store, &principal, "contacts", &PropPatch::new()).await?)
}
