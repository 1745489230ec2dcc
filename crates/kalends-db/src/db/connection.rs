//! Postgres connection pooling.

use std::time::Duration;

use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::Pool;

pub type DbPool = Pool<AsyncPgConnection>;

/// Time a caller waits for a free connection before giving up.
const CHECKOUT_TIMEOUT: Duration = Duration::from_secs(10);

/// ## Summary
/// Builds a `bb8` pool of `size` async Postgres connections.
///
/// All connections are opened eagerly so a wrong URL fails at startup.
///
/// ## Errors
/// Returns an error if the initial connections cannot be established.
#[tracing::instrument(skip(database_url), fields(pool_size = size))]
pub async fn create_pool(database_url: &str, size: u32) -> anyhow::Result<DbPool> {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);

    let pool = Pool::builder()
        .max_size(size)
        .min_idle(Some(size))
        .connection_timeout(CHECKOUT_TIMEOUT)
        .idle_timeout(None)
        .build(manager)
        .await?;

    let state = pool.state();
    tracing::info!(
        connections = state.connections,
        idle = state.idle_connections,
        "Connection pool ready"
    );
    Ok(pool)
}
