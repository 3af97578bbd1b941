//! Schema migration: a fixed, ordered list of idempotent SQL
//! statements executed in a single connection at startup.

mod migrations;

use sqlx::PgPool;

use crate::Result;

pub struct Migrator<'a> {
    pool: &'a PgPool,
}

impl<'a> Migrator<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn run(&self) -> Result<()> {
        for statement in migrations::MIGRATIONS {
            sqlx::query(statement).execute(self.pool).await?;
        }
        Ok(())
    }
}
