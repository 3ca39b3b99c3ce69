use std::collections::HashMap;

use async_trait::async_trait;
use futures_util::StreamExt;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    AggregateId, EventEnvelope, EventId, EventStoreError, Position, Result, Version,
    store::{EventStore, EventStream, validate_batch},
};

/// Advisory lock key taken by every append. Positions come from a sequence,
/// so appends are serialized to make them visible in position order.
const APPEND_LOCK_KEY: i64 = 0x636d_735f_6576;

const SELECT_EVENTS: &str = r#"
    SELECT id, stream_id, aggregate_type, event_type, version, position, timestamp, payload, metadata
    FROM events
"#;

/// PostgreSQL-backed event store implementation.
#[derive(Clone)]
pub struct PostgresEventStore {
    pool: PgPool,
}

impl PostgresEventStore {
    /// Creates a new PostgreSQL event store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to `database_url` and returns a store on a fresh pool.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn row_to_event(row: PgRow) -> Result<EventEnvelope> {
        let metadata_json: serde_json::Value = row.try_get("metadata")?;
        let metadata: HashMap<String, serde_json::Value> = serde_json::from_value(metadata_json)?;

        Ok(EventEnvelope {
            event_id: EventId::from_uuid(row.try_get::<Uuid, _>("id")?),
            event_type: row.try_get("event_type")?,
            stream_id: AggregateId::from_uuid(row.try_get::<Uuid, _>("stream_id")?),
            aggregate_type: row.try_get("aggregate_type")?,
            version: Version::new(row.try_get("version")?),
            position: Position::new(row.try_get("position")?),
            timestamp: row.try_get("timestamp")?,
            payload: row.try_get("payload")?,
            metadata,
        })
    }
}

#[async_trait]
impl EventStore for PostgresEventStore {
    async fn initialize(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        tracing::info!("event store migrations applied");
        Ok(())
    }

    async fn append(
        &self,
        stream_id: AggregateId,
        expected_version: Version,
        events: Vec<EventEnvelope>,
    ) -> Result<Version> {
        validate_batch(stream_id, expected_version, &events)?;

        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(APPEND_LOCK_KEY)
            .execute(&mut *tx)
            .await?;

        let current: Option<i64> =
            sqlx::query_scalar("SELECT MAX(version) FROM events WHERE stream_id = $1")
                .bind(stream_id.as_uuid())
                .fetch_one(&mut *tx)
                .await?;

        let actual = Version::new(current.unwrap_or(0));
        if actual != expected_version {
            return Err(EventStoreError::Conflict {
                stream_id,
                expected: expected_version,
                actual,
            });
        }

        let count = events.len();
        let mut new_version = actual;
        for event in &events {
            let metadata_json = serde_json::to_value(&event.metadata)?;

            sqlx::query(
                r#"
                INSERT INTO events (id, stream_id, aggregate_type, event_type, version, timestamp, payload, metadata)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(event.event_id.as_uuid())
            .bind(stream_id.as_uuid())
            .bind(&event.aggregate_type)
            .bind(&event.event_type)
            .bind(event.version.as_i64())
            .bind(event.timestamp)
            .bind(&event.payload)
            .bind(metadata_json)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.constraint() == Some("unique_stream_version")
                {
                    return EventStoreError::Conflict {
                        stream_id,
                        expected: expected_version,
                        actual: event.version,
                    };
                }
                EventStoreError::Database(e)
            })?;

            new_version = event.version;
        }

        tx.commit().await?;

        metrics::counter!("events_appended").increment(count as u64);
        tracing::debug!(%stream_id, %new_version, count, "appended events");

        Ok(new_version)
    }

    async fn read_stream(
        &self,
        stream_id: AggregateId,
        from_version: Version,
    ) -> Result<Vec<EventEnvelope>> {
        let sql = format!("{SELECT_EVENTS} WHERE stream_id = $1 AND version >= $2 ORDER BY version ASC");
        let rows = sqlx::query(&sql)
            .bind(stream_id.as_uuid())
            .bind(from_version.as_i64())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_event).collect()
    }

    async fn stream_version(&self, stream_id: AggregateId) -> Result<Option<Version>> {
        let version: Option<i64> =
            sqlx::query_scalar("SELECT MAX(version) FROM events WHERE stream_id = $1")
                .bind(stream_id.as_uuid())
                .fetch_one(&self.pool)
                .await?;

        Ok(version.map(Version::new))
    }

    async fn stream_all_from(&self, after: Position) -> Result<EventStream> {
        // Collected up front so the stream does not borrow the pool's connection.
        let sql = format!("{SELECT_EVENTS} WHERE position > $1 ORDER BY position ASC");
        let rows = sqlx::query(&sql)
            .bind(after.as_i64())
            .fetch_all(&self.pool)
            .await?;

        let stream = futures_util::stream::iter(rows).map(Self::row_to_event);
        Ok(Box::pin(stream))
    }
}
