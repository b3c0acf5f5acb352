//! The persistence gateway: a thin layer over `tokio-postgres` with a
//! prepared statement cache and a small connection pool.
use std::collections::HashMap;
use std::env;
use std::hash::BuildHasher;

use async_trait::async_trait;
use postgres_types::ToSql;
pub use postgres_types::Type as SqlType;
use tokio_postgres::{NoTls, Row, Statement, Transaction};

use crate::error::DbError;

mod pool;

pub use pool::{get, init, Connect};

pub fn get_postgres_url() -> String {
    env::var("DATABASE_URL").expect("Failed to load Postgres connect URL")
}

pub struct CrcBuilder;

impl BuildHasher for CrcBuilder {
    type Hasher = crc32fast::Hasher;

    fn build_hasher(&self) -> crc32fast::Hasher {
        crc32fast::Hasher::new()
    }
}

pub struct Client {
    pub client: tokio_postgres::Client,
    prepared: HashMap<&'static str, Statement, CrcBuilder>,
}

impl Client {
    pub async fn new() -> Result<Client, DbError> {
        let config = get_postgres_url().parse().expect("Failed to parse Postgres connect URL");
        Client::with_config(&config).await
    }

    pub async fn with_config(config: &tokio_postgres::Config) -> Result<Client, DbError> {
        let (client, connection) = config.connect(NoTls).await?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                log::error!("database connection error: {}", e);
            }
        });
        let prepared = HashMap::with_capacity_and_hasher(16, CrcBuilder);
        Ok(Client { client, prepared })
    }

    pub fn is_broken(&self) -> bool {
        self.client.is_closed()
    }

    async fn prepare(&mut self, source: &'static str, types: &[SqlType]) -> Result<Statement, DbError> {
        if let Some(statement) = self.prepared.get(source) {
            return Ok(statement.clone());
        }
        let statement = self.client.prepare_typed(source, types).await?;
        self.prepared.insert(source, statement.clone());
        Ok(statement)
    }

    pub async fn transaction(&mut self) -> Result<Transaction<'_>, DbError> {
        self.client.transaction().await
    }
}

#[async_trait]
pub trait Querist: Send {
    async fn query_typed(
        &mut self,
        source: &'static str,
        types: &[SqlType],
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, DbError>;

    async fn execute_typed(
        &mut self,
        source: &'static str,
        types: &[SqlType],
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<u64, DbError>;

    async fn query(&mut self, source: &'static str, params: &[&(dyn ToSql + Sync)]) -> Result<Vec<Row>, DbError> {
        self.query_typed(source, &[], params).await
    }

    async fn query_one_typed(
        &mut self,
        source: &'static str,
        types: &[SqlType],
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Option<Row>, DbError> {
        let rows = self.query_typed(source, types, params).await?;
        Ok(rows.into_iter().next())
    }

    async fn query_one(
        &mut self,
        source: &'static str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Option<Row>, DbError> {
        self.query_one_typed(source, &[], params).await
    }

    async fn execute(&mut self, source: &'static str, params: &[&(dyn ToSql + Sync)]) -> Result<u64, DbError> {
        self.execute_typed(source, &[], params).await
    }
}

#[async_trait]
impl Querist for Client {
    async fn query_typed(
        &mut self,
        source: &'static str,
        types: &[SqlType],
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, DbError> {
        let statement = self.prepare(source, types).await?;
        self.client.query(&statement, params).await
    }

    async fn execute_typed(
        &mut self,
        source: &'static str,
        types: &[SqlType],
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<u64, DbError> {
        let statement = self.prepare(source, types).await?;
        self.client.execute(&statement, params).await
    }
}

#[async_trait]
impl Querist for Transaction<'_> {
    async fn query_typed(
        &mut self,
        source: &'static str,
        types: &[SqlType],
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, DbError> {
        let statement = self.prepare_typed(source, types).await?;
        Transaction::query(self, &statement, params).await
    }

    async fn execute_typed(
        &mut self,
        source: &'static str,
        types: &[SqlType],
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<u64, DbError> {
        let statement = self.prepare_typed(source, types).await?;
        Transaction::execute(self, &statement, params).await
    }
}
