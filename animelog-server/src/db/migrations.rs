//! Schema setup for users and tracked media
//!
//! Idempotent: safe to run on every start. `repair_indexes` is the
//! maintenance pass for databases created before the compound uniqueness
//! rule existed.

use once_cell::sync::Lazy;
use regex::Regex;
use sqlx::{FromRow, PgPool};

use super::repos::DbError;

/// Unique index on `mal_id` alone: blocks two users from tracking the same title.
static LEGACY_MAL_ID_UNIQUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^CREATE UNIQUE INDEX \S+ ON \S+ USING btree \(mal_id\)$")
        .expect("invalid legacy index regex")
});

/// Index row from `pg_indexes`
#[derive(Debug, Clone, FromRow)]
pub struct IndexInfo {
    pub table_name: String,
    pub index_name: String,
    pub definition: String,
}

/// Outcome of [`repair_indexes`]
#[derive(Debug, Clone, Default)]
pub struct RepairReport {
    pub dropped: Vec<String>,
    pub indexes: Vec<IndexInfo>,
}

/// Create tables, constraints and indexes.
pub async fn run(pool: &PgPool) -> Result<(), DbError> {
    tracing::info!("Running animelog migrations...");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            username TEXT NOT NULL,
            email TEXT NOT NULL,
            password_hash TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            CONSTRAINT users_username_key UNIQUE (username),
            CONSTRAINT users_email_key UNIQUE (email)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS anime (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            mal_id BIGINT NOT NULL CHECK (mal_id > 0),
            title TEXT NOT NULL,
            total_episodes INTEGER,
            cover_image TEXT,
            synopsis TEXT,
            api_status TEXT,
            api_score DOUBLE PRECISION,
            trailer_url TEXT,
            source TEXT,
            genres TEXT[] NOT NULL DEFAULT '{}',
            aired_from TIMESTAMPTZ,
            aired_to TIMESTAMPTZ,
            user_status TEXT NOT NULL DEFAULT 'Plan to Watch'
                CHECK (user_status IN ('Watching', 'Completed', 'Dropped', 'Plan to Watch')),
            episodes_watched INTEGER NOT NULL DEFAULT 0 CHECK (episodes_watched >= 0),
            user_score DOUBLE PRECISION CHECK (user_score BETWEEN 0 AND 10),
            user_notes TEXT NOT NULL DEFAULT '',
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS manga (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            mal_id BIGINT NOT NULL CHECK (mal_id > 0),
            title TEXT NOT NULL,
            title_english TEXT,
            total_chapters INTEGER,
            total_volumes INTEGER,
            cover_image TEXT,
            synopsis TEXT,
            api_status TEXT,
            api_score DOUBLE PRECISION,
            source TEXT,
            genres TEXT[] NOT NULL DEFAULT '{}',
            published_from TIMESTAMPTZ,
            published_to TIMESTAMPTZ,
            user_status TEXT NOT NULL DEFAULT 'Plan to Read'
                CHECK (user_status IN ('Reading', 'Completed', 'Dropped', 'Plan to Read')),
            chapters_read INTEGER NOT NULL DEFAULT 0 CHECK (chapters_read >= 0),
            user_score DOUBLE PRECISION CHECK (user_score BETWEEN 0 AND 10),
            user_notes TEXT NOT NULL DEFAULT '',
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    for table in ["anime", "manga"] {
        ensure_compound_unique(pool, table).await?;

        sqlx::query(&format!(
            "CREATE INDEX IF NOT EXISTS {table}_user_created_idx ON {table} (user_id, created_at DESC)"
        ))
        .execute(pool)
        .await?;
    }

    tracing::info!("animelog migrations complete");
    Ok(())
}

/// Add `UNIQUE (user_id, mal_id)` to a table that predates it.
async fn ensure_compound_unique(pool: &PgPool, table: &'static str) -> Result<(), DbError> {
    let constraint = format!("{table}_user_mal_key");
    let exists: (bool,) =
        sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_constraint WHERE conname = $1)")
            .bind(&constraint)
            .fetch_one(pool)
            .await?;

    if !exists.0 {
        tracing::info!(table, constraint = %constraint, "adding compound unique constraint");
        sqlx::query(&format!(
            "ALTER TABLE {table} ADD CONSTRAINT {constraint} UNIQUE (user_id, mal_id)"
        ))
        .execute(pool)
        .await?;
    }
    Ok(())
}

/// List indexes on the media tables.
pub async fn list_indexes(pool: &PgPool) -> Result<Vec<IndexInfo>, DbError> {
    let rows = sqlx::query_as::<_, IndexInfo>(
        r#"
        SELECT tablename::text AS table_name,
               indexname::text AS index_name,
               indexdef AS definition
        FROM pg_indexes
        WHERE schemaname = current_schema()
          AND tablename IN ('anime', 'manga')
        ORDER BY tablename, indexname
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Drop global `mal_id` unique indexes, then re-run migrations so the
/// per-user compound constraint exists.
pub async fn repair_indexes(pool: &PgPool) -> Result<RepairReport, DbError> {
    let mut report = RepairReport::default();

    for index in list_indexes(pool).await? {
        if !is_legacy_unique(&index.definition) {
            continue;
        }

        tracing::warn!(
            table = %index.table_name,
            index = %index.index_name,
            "dropping legacy mal_id unique index"
        );
        let table = quote_ident(&index.table_name);
        let name = quote_ident(&index.index_name);
        // Constraint-backed indexes can only go via their constraint.
        sqlx::query(&format!("ALTER TABLE {table} DROP CONSTRAINT IF EXISTS {name}"))
            .execute(pool)
            .await?;
        sqlx::query(&format!("DROP INDEX IF EXISTS {name}"))
            .execute(pool)
            .await?;
        report.dropped.push(index.index_name);
    }

    run(pool).await?;
    report.indexes = list_indexes(pool).await?;
    Ok(report)
}

fn is_legacy_unique(definition: &str) -> bool {
    LEGACY_MAL_ID_UNIQUE.is_match(definition.trim())
}

fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_global_mal_id_unique() {
        assert!(is_legacy_unique(
            "CREATE UNIQUE INDEX anime_mal_id_key ON public.anime USING btree (mal_id)"
        ));
    }

    #[test]
    fn keeps_compound_and_plain_indexes() {
        assert!(!is_legacy_unique(
            "CREATE UNIQUE INDEX anime_user_mal_key ON public.anime USING btree (user_id, mal_id)"
        ));
        assert!(!is_legacy_unique(
            "CREATE INDEX manga_mal_idx ON public.manga USING btree (mal_id)"
        ));
    }

    #[test]
    fn quotes_identifiers() {
        assert_eq!(quote_ident("anime"), "\"anime\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn migrations_are_idempotent() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = crate::db::create_pool(&url).await.expect("pool");
        run(&pool).await.expect("first run");
        run(&pool).await.expect("second run");

        let report = repair_indexes(&pool).await.expect("repair");
        assert!(report
            .indexes
            .iter()
            .any(|i| i.index_name == "anime_user_mal_key"));
    }
}
