//! Postgres pool construction

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use animelog_core::config::DatabaseSection;

/// Upper bound on waiting for a free connection before a request fails.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// Pool with the default `[database]` settings for `database_url`.
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let section = DatabaseSection {
        url: database_url.to_string(),
        ..DatabaseSection::default()
    };
    connect(&section).await
}

pub async fn create_pool_with_options(
    database_url: &str,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    connect(&DatabaseSection {
        url: database_url.to_string(),
        max_connections,
    })
    .await
}

/// Connect using the `[database]` config section.
pub async fn connect(section: &DatabaseSection) -> Result<PgPool, sqlx::Error> {
    tracing::debug!(
        url = %section.redacted_url(),
        max_connections = section.max_connections,
        "connecting to postgres"
    );
    PgPoolOptions::new()
        .max_connections(section.max_connections.max(1))
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(&section.url)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    // Run with: DATABASE_URL=postgres://... cargo test -p animelog-server -- --ignored
    #[tokio::test]
    #[ignore = "requires database"]
    async fn pool_acquires_connection() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = create_pool_with_options(&url, 2)
            .await
            .expect("pool creation failed");

        let (one,): (i32,) = sqlx::query_as("SELECT 1")
            .fetch_one(&pool)
            .await
            .expect("query failed");
        assert_eq!(one, 1);
    }
}
