use chrono::{DateTime, NaiveDate, Utc};
use filemon_core::models::{
    AcquirerType, FileRecord, FileStatus, NewFileRecord, RecordType, TransactionRecord,
};
use filemon_core::AppError;
use sqlx::{PgPool, Postgres};
use std::collections::HashMap;
use uuid::Uuid;

const FILE_COLUMNS: &str = "id, file_name, received_at, expires_at, status, backup_path, \
     content_hash, size_bytes, acquirer_type, error_message";

/// Trait for file record repository operations
///
/// Writes are visible once each call returns; `commit` exists for
/// implementations that stage changes and defaults to a no-op.
#[async_trait::async_trait]
pub trait FileRecordRepository: Send + Sync {
    async fn exists_by_hash(&self, content_hash: &str) -> Result<bool, AppError>;

    /// Insert a record and its transactions, returning it with its assigned id.
    ///
    /// Fails with `AppError::DuplicateContent` when the content hash is taken.
    async fn add(&self, record: NewFileRecord) -> Result<FileRecord, AppError>;

    /// Fetch a record without its transactions.
    async fn get_by_id(&self, id: Uuid) -> Result<Option<FileRecord>, AppError>;

    async fn get_by_id_with_transactions(&self, id: Uuid) -> Result<Option<FileRecord>, AppError>;

    /// Records whose `expires_at` is set and not after `as_of`, without transactions.
    async fn list_expired(&self, as_of: DateTime<Utc>) -> Result<Vec<FileRecord>, AppError>;

    /// Delete a record; its transactions go with it.
    async fn delete(&self, record: &FileRecord) -> Result<(), AppError>;

    /// Record counts per status. Every status is present, with 0 when unused.
    async fn count_by_status(&self) -> Result<HashMap<FileStatus, i64>, AppError>;

    /// Every record with its transactions, newest first.
    async fn list_all_ordered_by_received_desc(&self) -> Result<Vec<FileRecord>, AppError>;

    async fn commit(&self) -> Result<(), AppError> {
        Ok(())
    }
}

/// Row type for the file_records table
#[derive(Debug, sqlx::FromRow)]
struct FileRecordRow {
    id: Uuid,
    file_name: String,
    received_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    status: FileStatus,
    backup_path: String,
    content_hash: String,
    size_bytes: i64,
    acquirer_type: AcquirerType,
    error_message: Option<String>,
}

impl FileRecordRow {
    fn into_record(self, transactions: Vec<TransactionRecord>) -> FileRecord {
        FileRecord {
            id: self.id,
            file_name: self.file_name,
            received_at: self.received_at,
            expires_at: self.expires_at,
            status: self.status,
            backup_path: self.backup_path,
            content_hash: self.content_hash,
            size_bytes: self.size_bytes,
            acquirer_type: self.acquirer_type,
            error_message: self.error_message,
            transactions,
        }
    }
}

/// Row type for the transaction_records table
#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    file_id: Uuid,
    record_type: RecordType,
    establishment: String,
    processing_date: NaiveDate,
    period_start: NaiveDate,
    period_end: NaiveDate,
    sequence: String,
    company: String,
}

impl From<TransactionRow> for TransactionRecord {
    fn from(row: TransactionRow) -> Self {
        TransactionRecord {
            record_type: row.record_type,
            establishment: row.establishment,
            processing_date: row.processing_date,
            period_start: row.period_start,
            period_end: row.period_end,
            sequence: row.sequence,
            company: row.company,
        }
    }
}

fn group_transactions(rows: Vec<TransactionRow>) -> HashMap<Uuid, Vec<TransactionRecord>> {
    let mut grouped: HashMap<Uuid, Vec<TransactionRecord>> = HashMap::new();
    for row in rows {
        grouped.entry(row.file_id).or_default().push(row.into());
    }
    grouped
}

fn status_counts(rows: Vec<(FileStatus, i64)>) -> HashMap<FileStatus, i64> {
    let mut counts: HashMap<FileStatus, i64> = [FileStatus::Received, FileStatus::NotReceived]
        .into_iter()
        .map(|status| (status, 0))
        .collect();
    for (status, count) in rows {
        counts.insert(status, count);
    }
    counts
}

fn map_insert_error(err: sqlx::Error, content_hash: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return AppError::DuplicateContent(content_hash.to_string());
        }
    }
    AppError::Database(err)
}

#[derive(Clone)]
pub struct PostgresFileRecordRepository {
    pool: PgPool,
}

impl PostgresFileRecordRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_transactions(
        &self,
        file_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<TransactionRecord>>, AppError> {
        if file_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<Postgres, TransactionRow>(
            r#"
            SELECT file_id, record_type, establishment, processing_date,
                   period_start, period_end, sequence, company
            FROM transaction_records
            WHERE file_id = ANY($1)
            ORDER BY file_id, position
            "#,
        )
        .bind(file_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(group_transactions(rows))
    }
}

#[async_trait::async_trait]
impl FileRecordRepository for PostgresFileRecordRepository {
    #[tracing::instrument(skip(self), fields(db.table = "file_records", db.operation = "select"))]
    async fn exists_by_hash(&self, content_hash: &str) -> Result<bool, AppError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM file_records WHERE content_hash = $1)")
                .bind(content_hash)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    #[tracing::instrument(
        skip(self, record),
        fields(db.table = "file_records", db.operation = "insert", content_hash = %record.content_hash)
    )]
    async fn add(&self, record: NewFileRecord) -> Result<FileRecord, AppError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            INSERT INTO file_records (
                file_name, received_at, expires_at, status, backup_path,
                content_hash, size_bytes, acquirer_type, error_message
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            FILE_COLUMNS
        );
        let row = sqlx::query_as::<Postgres, FileRecordRow>(&sql)
            .bind(&record.file_name)
            .bind(record.received_at)
            .bind(record.expires_at)
            .bind(record.status)
            .bind(&record.backup_path)
            .bind(&record.content_hash)
            .bind(record.size_bytes)
            .bind(record.acquirer_type)
            .bind(&record.error_message)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_insert_error(e, &record.content_hash))?;

        for (position, transaction) in record.transactions.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO transaction_records (
                    file_id, position, record_type, establishment, processing_date,
                    period_start, period_end, sequence, company
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(row.id)
            .bind(position as i32)
            .bind(transaction.record_type)
            .bind(&transaction.establishment)
            .bind(transaction.processing_date)
            .bind(transaction.period_start)
            .bind(transaction.period_end)
            .bind(&transaction.sequence)
            .bind(&transaction.company)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::debug!(
            file_id = %row.id,
            transactions = record.transactions.len(),
            "File record inserted"
        );
        Ok(row.into_record(record.transactions))
    }

    #[tracing::instrument(skip(self), fields(db.table = "file_records", db.operation = "select", db.record_id = %id))]
    async fn get_by_id(&self, id: Uuid) -> Result<Option<FileRecord>, AppError> {
        let sql = format!("SELECT {} FROM file_records WHERE id = $1", FILE_COLUMNS);
        let row = sqlx::query_as::<Postgres, FileRecordRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|row| row.into_record(Vec::new())))
    }

    #[tracing::instrument(skip(self), fields(db.table = "file_records", db.operation = "select", db.record_id = %id))]
    async fn get_by_id_with_transactions(&self, id: Uuid) -> Result<Option<FileRecord>, AppError> {
        let Some(record) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        let mut transactions = self.load_transactions(&[id]).await?;
        let transactions = transactions.remove(&id).unwrap_or_default();
        Ok(Some(FileRecord {
            transactions,
            ..record
        }))
    }

    #[tracing::instrument(skip(self), fields(db.table = "file_records", db.operation = "select"))]
    async fn list_expired(&self, as_of: DateTime<Utc>) -> Result<Vec<FileRecord>, AppError> {
        let sql = format!(
            "SELECT {} FROM file_records \
             WHERE expires_at IS NOT NULL AND expires_at <= $1 \
             ORDER BY expires_at",
            FILE_COLUMNS
        );
        let rows = sqlx::query_as::<Postgres, FileRecordRow>(&sql)
            .bind(as_of)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| row.into_record(Vec::new()))
            .collect())
    }

    #[tracing::instrument(skip(self, record), fields(db.table = "file_records", db.operation = "delete", db.record_id = %record.id))]
    async fn delete(&self, record: &FileRecord) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM file_records WHERE id = $1")
            .bind(record.id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            tracing::debug!(file_id = %record.id, "File record already deleted");
        }
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "file_records", db.operation = "select"))]
    async fn count_by_status(&self) -> Result<HashMap<FileStatus, i64>, AppError> {
        let rows = sqlx::query_as::<Postgres, (FileStatus, i64)>(
            "SELECT status, COUNT(*) FROM file_records GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(status_counts(rows))
    }

    #[tracing::instrument(skip(self), fields(db.table = "file_records", db.operation = "select"))]
    async fn list_all_ordered_by_received_desc(&self) -> Result<Vec<FileRecord>, AppError> {
        let sql = format!(
            "SELECT {} FROM file_records ORDER BY received_at DESC, id",
            FILE_COLUMNS
        );
        let rows = sqlx::query_as::<Postgres, FileRecordRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let mut transactions = self.load_transactions(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let children = transactions.remove(&row.id).unwrap_or_default();
                row.into_record(children)
            })
            .collect())
    }
}
