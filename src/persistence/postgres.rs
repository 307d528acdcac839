use super::*;
use r2d2_postgres::{postgres::NoTls, PostgresConnectionManager};
use tracing::info;

pub type PostgresPool = r2d2::Pool<PostgresConnectionManager<NoTls>>;
pub type PostgresConnection = r2d2::PooledConnection<PostgresConnectionManager<NoTls>>;
pub type PostgresTransaction<'a> = ::postgres::Transaction<'a>;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS items (
    id BIGSERIAL PRIMARY KEY,
    name TEXT NOT NULL,
    provided_by TEXT NOT NULL,
    description TEXT NOT NULL,
    value BIGINT NOT NULL CHECK (value >= 0),
    min_bid BIGINT NOT NULL CHECK (min_bid >= 0)
);

CREATE TABLE IF NOT EXISTS bids (
    id BIGSERIAL PRIMARY KEY,
    item_id BIGINT NOT NULL REFERENCES items (id),
    round_id BIGINT NOT NULL CHECK (round_id >= 0),
    amount BIGINT NOT NULL CHECK (amount >= 0),
    created_at TIMESTAMPTZ NOT NULL,
    UNIQUE (item_id, amount)
);
"#;

#[derive(Debug, Clone)]
pub struct PostgresPersistence {
    pool: PostgresPool,
}

impl PostgresPersistence {
    pub fn connect(config: ::postgres::Config) -> Result<Self> {
        let manager = PostgresConnectionManager::new(config, NoTls);
        Ok(Self {
            pool: r2d2::Pool::new(manager)?,
        })
    }

    /// Create the tables if they don't exist yet
    pub fn migrate(&self) -> Result<()> {
        info!("migrating tables");
        self.get_connection()?.batch_execute(SCHEMA)?;
        info!("migrating tables complete");
        Ok(())
    }
}

impl Persistence for PostgresPersistence {
    type Connection = PostgresConnection;

    fn get_connection(&self) -> Result<Self::Connection> {
        Ok(self.pool.get()?)
    }
}

impl Connection for PostgresConnection {
    type Transaction<'a> = PostgresTransaction<'a>
    where
        Self: 'a;

    fn start_transaction(&mut self) -> Result<PostgresTransaction<'_>> {
        Ok(self.transaction()?)
    }
}

impl<'a> Transaction for PostgresTransaction<'a> {
    fn commit(self) -> Result<()> {
        Ok(::postgres::Transaction::commit(self)?)
    }
}

/// Postgres has no unsigned integers; all ids and amounts are stored as `BIGINT`
pub(crate) fn to_sql_int(value: u64) -> Result<i64> {
    Ok(i64::try_from(value)?)
}

pub(crate) fn from_sql_int(value: i64) -> Result<u64> {
    Ok(u64::try_from(value)?)
}
