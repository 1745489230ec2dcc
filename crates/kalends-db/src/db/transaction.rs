//! Transaction helper for store operations.
//!
//! ```rust,ignore
//! use diesel_async::scoped_futures::ScopedFutureExt;
//!
//! with_transaction(&mut conn, |tx| async move {
//!     let token = query::collection::bump_token(tx, collection_id).await?;
//!     query::change::insert_change(tx, &change).await?;
//!     Ok(token)
//! }.scope_boxed()).await?;
//! ```

use diesel_async::{AsyncConnection, AsyncPgConnection, scoped_futures::ScopedBoxFuture};

use crate::error::{DbError, DbResult};

/// ## Summary
/// Runs a database transaction and returns the closure result.
///
/// ## Errors
/// Returns any error produced by the closure, or errors raised while starting
/// or committing the transaction.
pub async fn with_transaction<'a, T, F>(conn: &'a mut AsyncPgConnection, callback: F) -> DbResult<T>
where
    F: for<'r> FnOnce(&'r mut AsyncPgConnection) -> ScopedBoxFuture<'a, 'r, DbResult<T>> + Send + 'a,
    T: Send + 'a,
{
    conn.transaction::<T, DbError, F>(callback).await
}
