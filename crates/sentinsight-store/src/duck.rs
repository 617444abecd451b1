//! DuckDB-backed opinion store.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use arrow::array::{Array, Int64Array, LargeStringArray, StringArray, StringViewArray};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use chrono::NaiveDate;
use duckdb::types::Value;
use duckdb::{Connection, params_from_iter};
use sentinsight_core::{
    Categorization, Opinion, OpinionId, PendingOn, PendingOpinion, Scope, SentimentAnnotation,
};
use tracing::{debug, info};

use crate::{StoreError, WorkRepository};

const SCHEMA: &str = "
    CREATE SEQUENCE IF NOT EXISTS opinion_seq;
    CREATE TABLE IF NOT EXISTS opinions (
        seq BIGINT DEFAULT nextval('opinion_seq'),
        id VARCHAR PRIMARY KEY,
        comment VARCHAR NOT NULL,
        professor_id BIGINT NOT NULL,
        course VARCHAR NOT NULL,
        review_date DATE NOT NULL,
        sentiment VARCHAR,
        sentiment_analyzed BOOLEAN NOT NULL DEFAULT false,
        categorization VARCHAR,
        categorization_analyzed BOOLEAN NOT NULL DEFAULT false
    );
";

/// DuckDB store holding one row per opinion.
///
/// Annotation sub-records are stored as JSON text in the `sentiment` and
/// `categorization` columns, with their `analyzed` flags mirrored into
/// boolean columns for the pending predicates. Rows are returned in insertion
/// order (`seq`).
///
/// Use [`open`](Self::open) for in-memory and [`open_persistent`](Self::open_persistent)
/// for file-backed storage that survives across process restarts. Repository
/// queries run on the blocking thread pool.
pub struct DuckStore {
    conn: Arc<Mutex<Connection>>,
}

impl DuckStore {
    /// Open an in-memory DuckDB database with the opinion schema.
    pub fn open() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    /// Open or create a persistent DuckDB database at the given path.
    pub fn open_persistent(path: &Path) -> Result<Self, StoreError> {
        let store = Self::init(Connection::open(path)?)?;
        info!(path = %path.display(), opinions = store.len()?, "opened opinion store");
        Ok(store)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        lock(&self.conn)
    }

    /// Run `f` against the connection on the blocking thread pool.
    async fn blocking<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || f(&*lock(&conn)?))
            .await
            .map_err(|e| StoreError::Other(format!("duckdb task: {e}")))?
    }

    // ── Documents ──

    pub fn insert_opinion(&self, opinion: &Opinion) -> Result<(), StoreError> {
        insert_row(&*self.conn()?, opinion)
    }

    /// Insert many opinions in one transaction, returning how many were stored.
    /// A failure such as a duplicate id rolls back the whole set.
    pub fn insert_opinions(&self, opinions: &[Opinion]) -> Result<usize, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        for opinion in opinions {
            insert_row(&tx, opinion)?;
        }
        tx.commit()?;
        info!(count = opinions.len(), "imported opinions");
        Ok(opinions.len())
    }

    pub fn get_opinion(&self, id: &OpinionId) -> Result<Option<Opinion>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, comment, professor_id, course,
                    strftime(review_date, '%Y-%m-%d') AS review_date,
                    sentiment, categorization
             FROM opinions WHERE id = ?",
        )?;
        let batches: Vec<RecordBatch> = stmt.query_arrow([id.as_str()])?.collect();
        let Some(batch) = batches.iter().find(|b| b.num_rows() > 0) else {
            return Ok(None);
        };
        opinion_from_row(batch, 0).map(Some)
    }

    /// Number of stored opinions.
    pub fn len(&self) -> Result<usize, StoreError> {
        let conn = self.conn()?;
        Ok(count(&conn, "SELECT count(*)::BIGINT FROM opinions", vec![])? as usize)
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl WorkRepository for DuckStore {
    async fn fetch_pending(
        &self,
        scope: &Scope,
        on: PendingOn,
        limit: usize,
        skip: usize,
    ) -> Result<Vec<PendingOpinion>, StoreError> {
        let (filter, values) = scope_filter(scope);
        let sql = format!(
            "SELECT id, comment FROM opinions
             WHERE NOT {} AND {filter}
             ORDER BY seq
             LIMIT {limit} OFFSET {skip}",
            analyzed_column(on)
        );

        let pending = self
            .blocking(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let batches: Vec<RecordBatch> =
                    stmt.query_arrow(params_from_iter(values))?.collect();

                let mut pending = Vec::new();
                for batch in &batches {
                    for row in 0..batch.num_rows() {
                        pending.push(PendingOpinion {
                            id: OpinionId::new(required_string(batch, 0, row)?),
                            comment: required_string(batch, 1, row)?,
                        });
                    }
                }
                Ok(pending)
            })
            .await?;
        debug!(scope = %scope, on = %on, count = pending.len(), "fetched pending");
        Ok(pending)
    }

    async fn count_pending(&self, scope: &Scope, on: PendingOn) -> Result<u64, StoreError> {
        let (filter, values) = scope_filter(scope);
        let sql = format!(
            "SELECT count(*)::BIGINT FROM opinions WHERE NOT {} AND {filter}",
            analyzed_column(on)
        );
        let n = self.blocking(move |conn| count(conn, &sql, values)).await?;
        Ok(n as u64)
    }

    async fn apply_annotation(
        &self,
        id: &OpinionId,
        sentiment: Option<&SentimentAnnotation>,
        categorization: Option<&Categorization>,
    ) -> Result<bool, StoreError> {
        let mut sets = Vec::new();
        let mut values = Vec::new();
        if let Some(s) = sentiment {
            sets.push("sentiment = ?, sentiment_analyzed = ?");
            values.push(Value::Text(serde_json::to_string(s)?));
            values.push(Value::Boolean(s.analyzed));
        }
        if let Some(c) = categorization {
            sets.push("categorization = ?, categorization_analyzed = ?");
            values.push(Value::Text(serde_json::to_string(c)?));
            values.push(Value::Boolean(c.analyzed));
        }
        if sets.is_empty() {
            return Ok(false);
        }
        values.push(Value::Text(id.as_str().to_string()));

        let sql = format!("UPDATE opinions SET {} WHERE id = ?", sets.join(", "));
        let modified = self
            .blocking(move |conn| Ok(conn.execute(&sql, params_from_iter(values))?))
            .await?;
        Ok(modified > 0)
    }
}

// ── SQL helpers ──

fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>, StoreError> {
    conn.lock()
        .map_err(|_| StoreError::Other("duckdb connection lock poisoned".into()))
}

fn insert_row(conn: &Connection, opinion: &Opinion) -> Result<(), StoreError> {
    let sentiment = opinion
        .sentiment
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;
    let categorization = opinion
        .categorization
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    let values = vec![
        Value::Text(opinion.id.as_str().to_string()),
        Value::Text(opinion.comment.clone()),
        Value::BigInt(opinion.professor_id),
        Value::Text(opinion.course.clone()),
        Value::Text(opinion.review_date.format("%Y-%m-%d").to_string()),
        sentiment.map_or(Value::Null, Value::Text),
        Value::Boolean(opinion.sentiment_analyzed()),
        categorization.map_or(Value::Null, Value::Text),
        Value::Boolean(opinion.categorization_analyzed()),
    ];

    let exists = count(
        conn,
        "SELECT count(*)::BIGINT FROM opinions WHERE id = ?",
        vec![Value::Text(opinion.id.as_str().to_string())],
    )?;
    if exists > 0 {
        return Err(StoreError::Duplicate(opinion.id.clone()));
    }
    conn.execute(
        "INSERT INTO opinions (id, comment, professor_id, course, review_date,
            sentiment, sentiment_analyzed, categorization, categorization_analyzed)
         VALUES (?, ?, ?, ?, CAST(? AS DATE), ?, ?, ?, ?)",
        params_from_iter(values),
    )?;
    Ok(())
}

fn analyzed_column(on: PendingOn) -> &'static str {
    match on {
        PendingOn::Sentiment => "sentiment_analyzed",
        PendingOn::Categorization => "categorization_analyzed",
    }
}

fn scope_filter(scope: &Scope) -> (&'static str, Vec<Value>) {
    match scope {
        Scope::All => ("TRUE", vec![]),
        Scope::Professor(id) => ("professor_id = ?", vec![Value::BigInt(*id)]),
        Scope::Course(pattern) => (
            "strpos(lower(course), lower(?)) > 0",
            vec![Value::Text(pattern.clone())],
        ),
    }
}

fn count(conn: &Connection, sql: &str, values: Vec<Value>) -> Result<i64, StoreError> {
    let mut stmt = conn.prepare(sql)?;
    let batches: Vec<RecordBatch> = stmt.query_arrow(params_from_iter(values))?.collect();
    let batch = batches.first().ok_or(StoreError::NoResults)?;
    let col = batch
        .column(0)
        .as_any()
        .downcast_ref::<Int64Array>()
        .ok_or_else(|| StoreError::Other("count column not i64".into()))?;
    Ok(col.value(0))
}

// ── Arrow decoding ──

fn get_string(col: &dyn Array, row: usize) -> Option<String> {
    if col.is_null(row) {
        return None;
    }
    col.as_any()
        .downcast_ref::<StringArray>()
        .map(|arr| arr.value(row).to_string())
        .or_else(|| {
            col.as_any()
                .downcast_ref::<LargeStringArray>()
                .map(|arr| arr.value(row).to_string())
        })
        .or_else(|| {
            col.as_any()
                .downcast_ref::<StringViewArray>()
                .map(|arr| arr.value(row).to_string())
        })
}

fn required_string(batch: &RecordBatch, col: usize, row: usize) -> Result<String, StoreError> {
    get_string(batch.column(col).as_ref(), row).ok_or_else(|| {
        StoreError::Other(format!(
            "column {} is null or not a string",
            batch.schema().field(col).name()
        ))
    })
}

fn opinion_from_row(batch: &RecordBatch, row: usize) -> Result<Opinion, StoreError> {
    let professor_id = batch
        .column(2)
        .as_any()
        .downcast_ref::<Int64Array>()
        .ok_or_else(|| StoreError::Other("professor_id column not i64".into()))?
        .value(row);
    let review_date = NaiveDate::parse_from_str(&required_string(batch, 4, row)?, "%Y-%m-%d")
        .map_err(|e| StoreError::Other(format!("review_date: {e}")))?;
    let sentiment = get_string(batch.column(5).as_ref(), row)
        .map(|json| serde_json::from_str(&json))
        .transpose()?;
    let categorization = get_string(batch.column(6).as_ref(), row)
        .map(|json| serde_json::from_str(&json))
        .transpose()?;

    Ok(Opinion {
        id: OpinionId::new(required_string(batch, 0, row)?),
        comment: required_string(batch, 1, row)?,
        professor_id,
        course: required_string(batch, 3, row)?,
        review_date,
        sentiment,
        categorization,
    })
}
