//! Integration scenarios for the storage and service layers.
//!
//! Each scenario is an `async fn(&dyn DavStore)` run once against the
//! in-memory store and once (ignored by default) against PostgreSQL.

/// Generates a `memory` and a `postgres` test for a scenario.
macro_rules! store_test {
    ($name:ident) => {
        mod $name {
            #[test_log::test(tokio::test)]
            async fn memory() {
                let store = kalends_test::store::memory_store();
                super::$name(&store).await;
            }

            #[test_log::test(tokio::test)]
            #[ignore = "requires PostgreSQL; set DATABASE_URL"]
            async fn postgres() {
                let store = kalends_test::store::postgres_store()
                    .await
                    .expect("DATABASE_URL must point at a reachable database");
                super::$name(&store).await;
            }
        }
    };
}

mod collections;
mod concurrency;
mod objects;
mod query;
mod sharing;
mod sync;
