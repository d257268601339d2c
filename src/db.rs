use sqlx::{postgres::PgPoolOptions, PgPool};

pub struct Database {
    pub pool: PgPool,
}

impl Database {
    pub async fn new(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        // Connectivity check; schema comes from migrations/ (sqlx migrate run)
        sqlx::query("SELECT 1").execute(&pool).await?;

        Ok(Self { pool })
    }
}
