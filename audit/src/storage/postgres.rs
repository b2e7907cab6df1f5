use std::sync::Arc;

use audit_config::shared::PgConnectionConfig;
use tokio_postgres::error::SqlState;
use tokio_postgres::{Client, NoTls};
use tracing::{error, info};

use crate::error::{AuditError, AuditResult};
use crate::storage::base::Storage;
use crate::types::{TweetRecord, UserMapping};

const CREATE_TWEETS_TABLE: &str = "
    create table if not exists tweets (
        tweet_id bigint primary key,
        author_id bigint not null,
        author_name text not null,
        tweet_text text not null
    )";

const CREATE_ID_NAME_MAPPING_TABLE: &str = "
    create table if not exists id_name_mapping (
        author_id bigint primary key,
        author_name text not null
    )";

/// Postgres-backed [`Storage`].
///
/// Holds a single connection driven by a background task; clones share the
/// connection.
#[derive(Debug, Clone)]
pub struct PostgresStorage {
    client: Arc<Client>,
}

impl PostgresStorage {
    /// Connects to the configured database.
    ///
    /// The connection driver is spawned onto the current runtime and logs if
    /// the connection terminates with an error.
    pub async fn connect(config: &PgConnectionConfig) -> AuditResult<Self> {
        let (client, connection) = config.with_db().connect(NoTls).await?;

        tokio::spawn(async move {
            if let Err(err) = connection.await {
                error!(error = %err, "postgres connection terminated");
            }
        });

        info!(host = %config.host, database = %config.name, "connected to postgres");

        Ok(Self {
            client: Arc::new(client),
        })
    }
}

impl Storage for PostgresStorage {
    async fn init_schema(&self) -> AuditResult<()> {
        self.client.execute(CREATE_TWEETS_TABLE, &[]).await?;
        self.client
            .execute(CREATE_ID_NAME_MAPPING_TABLE, &[])
            .await?;

        Ok(())
    }

    async fn load_user_directory(&self) -> AuditResult<Vec<UserMapping>> {
        let rows = self
            .client
            .query("select author_id, author_name from id_name_mapping", &[])
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| UserMapping {
                author_id: row.get(0),
                author_name: row.get(1),
            })
            .collect())
    }

    async fn upsert_user_mappings(&self, mappings: Vec<UserMapping>) -> AuditResult<()> {
        let statement = self
            .client
            .prepare(
                "insert into id_name_mapping (author_id, author_name) values ($1, $2)
                 on conflict (author_id) do update set author_name = excluded.author_name",
            )
            .await?;

        for mapping in &mappings {
            self.client
                .execute(&statement, &[&mapping.author_id, &mapping.author_name])
                .await?;
        }

        Ok(())
    }

    async fn insert_tweet(&self, record: &TweetRecord) -> AuditResult<()> {
        let result = self
            .client
            .execute(
                "insert into tweets (tweet_id, author_id, author_name, tweet_text)
                 values ($1, $2, $3, $4)",
                &[
                    &record.tweet_id,
                    &record.author_id,
                    &record.author_name,
                    &record.text,
                ],
            )
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) if err.code() == Some(&SqlState::UNIQUE_VIOLATION) => {
                Err(AuditError::DuplicateRecord {
                    tweet_id: record.tweet_id,
                })
            }
            Err(err) => Err(err.into()),
        }
    }
}
