use crate::config::Config;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub async fn create_pool(cfg: &Config) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(cfg.db_max_connections)
        .acquire_timeout(cfg.db_connect_timeout)
        .idle_timeout(cfg.db_idle_timeout)
        .connect(&cfg.database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
