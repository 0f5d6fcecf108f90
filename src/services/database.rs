//! PostgreSQL-backed receivable store.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Receivable, ReceivableStatus};
use crate::services::store::ReceivableStore;

const RECEIVABLE_COLUMNS: &str = "id, client_id, project_id, description, invoice_reference, \
     issue_date, due_date, received_date, amount_expected, amount_received, status, blocker_reason";

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new connection pool.
    #[instrument(skip(database_url))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    /// Fetch document references for a batch of receivables and zip them
    /// onto the rows.
    async fn attach_references(
        &self,
        rows: Vec<ReceivableRow>,
    ) -> Result<Vec<Receivable>, AppError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let refs: Vec<(Uuid, String)> = sqlx::query_as(
            "SELECT receivable_id, document_reference \
             FROM receivable_document_references WHERE receivable_id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to load document references: {}", e))
        })?;

        let mut by_id: HashMap<Uuid, Vec<String>> = HashMap::new();
        for (receivable_id, reference) in refs {
            by_id.entry(receivable_id).or_default().push(reference);
        }

        rows.into_iter()
            .map(|row| {
                let references = by_id.remove(&row.id).unwrap_or_default();
                row.into_receivable(references)
            })
            .collect()
    }
}

#[derive(Debug, FromRow)]
struct ReceivableRow {
    id: Uuid,
    client_id: Uuid,
    project_id: Uuid,
    description: String,
    invoice_reference: Option<String>,
    issue_date: NaiveDate,
    due_date: NaiveDate,
    received_date: Option<NaiveDate>,
    amount_expected: Decimal,
    amount_received: Decimal,
    status: String,
    blocker_reason: Option<String>,
}

impl ReceivableRow {
    fn into_receivable(self, document_references: Vec<String>) -> Result<Receivable, AppError> {
        let status = self.status.parse::<ReceivableStatus>().map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Corrupt status for row {}: {}", self.id, e))
        })?;

        Ok(Receivable {
            id: self.id,
            client_id: self.client_id,
            project_id: self.project_id,
            description: self.description,
            invoice_reference: self.invoice_reference,
            issue_date: self.issue_date,
            due_date: self.due_date,
            received_date: self.received_date,
            amount_expected: self.amount_expected,
            amount_received: self.amount_received,
            status,
            blocker_reason: self.blocker_reason,
            document_references,
        })
    }
}

#[async_trait]
impl ReceivableStore for Database {
    #[instrument(skip(self, receivable), fields(id = %receivable.id))]
    async fn insert(&self, receivable: Receivable) -> Result<Receivable, AppError> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to open transaction: {}", e))
        })?;

        sqlx::query(
            "INSERT INTO receivables (id, client_id, project_id, description, invoice_reference, \
             issue_date, due_date, received_date, amount_expected, amount_received, status, blocker_reason) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(receivable.id)
        .bind(receivable.client_id)
        .bind(receivable.project_id)
        .bind(&receivable.description)
        .bind(&receivable.invoice_reference)
        .bind(receivable.issue_date)
        .bind(receivable.due_date)
        .bind(receivable.received_date)
        .bind(receivable.amount_expected)
        .bind(receivable.amount_received)
        .bind(receivable.status.as_str())
        .bind(&receivable.blocker_reason)
        .execute(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!(
                    "Invoice reference already in use by another receivable"
                ))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to insert receivable: {}", e)),
        })?;

        for reference in &receivable.document_references {
            sqlx::query(
                "INSERT INTO receivable_document_references (receivable_id, document_reference) \
                 VALUES ($1, $2)",
            )
            .bind(receivable.id)
            .bind(reference)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!(
                    "Failed to insert document reference: {}",
                    e
                ))
            })?;
        }

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit insert: {}", e))
        })?;

        info!(id = %receivable.id, "Receivable persisted");
        Ok(receivable)
    }

    #[instrument(skip(self))]
    async fn get(&self, id: Uuid) -> Result<Option<Receivable>, AppError> {
        let row: Option<ReceivableRow> = sqlx::query_as(&format!(
            "SELECT {} FROM receivables WHERE id = $1",
            RECEIVABLE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get receivable: {}", e)))?;

        match row {
            Some(row) => {
                let mut receivables = self.attach_references(vec![row]).await?;
                Ok(receivables.pop())
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    async fn list_all(&self) -> Result<Vec<Receivable>, AppError> {
        let rows: Vec<ReceivableRow> = sqlx::query_as(&format!(
            "SELECT {} FROM receivables ORDER BY due_date, id",
            RECEIVABLE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list receivables: {}", e))
        })?;

        self.attach_references(rows).await
    }

    #[instrument(skip(self))]
    async fn list_by_status(&self, status: ReceivableStatus) -> Result<Vec<Receivable>, AppError> {
        let rows: Vec<ReceivableRow> = sqlx::query_as(&format!(
            "SELECT {} FROM receivables WHERE status = $1 ORDER BY due_date, id",
            RECEIVABLE_COLUMNS
        ))
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list by status: {}", e))
        })?;

        self.attach_references(rows).await
    }

    #[instrument(skip(self, excluded))]
    async fn list_overdue(
        &self,
        as_of: NaiveDate,
        excluded: &[ReceivableStatus],
    ) -> Result<Vec<Receivable>, AppError> {
        let excluded: Vec<&str> = excluded.iter().map(|s| s.as_str()).collect();
        let rows: Vec<ReceivableRow> = sqlx::query_as(&format!(
            "SELECT {} FROM receivables \
             WHERE due_date < $1 AND status <> ALL($2) ORDER BY due_date, id",
            RECEIVABLE_COLUMNS
        ))
        .bind(as_of)
        .bind(&excluded)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list overdue: {}", e))
        })?;

        self.attach_references(rows).await
    }

    #[instrument(skip(self))]
    async fn list_with_blockers(&self) -> Result<Vec<Receivable>, AppError> {
        let rows: Vec<ReceivableRow> = sqlx::query_as(&format!(
            "SELECT {} FROM receivables \
             WHERE blocker_reason IS NOT NULL AND blocker_reason <> '' ORDER BY due_date, id",
            RECEIVABLE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list blocked: {}", e))
        })?;

        self.attach_references(rows).await
    }

    #[instrument(skip(self, receivable), fields(id = %receivable.id))]
    async fn update(&self, receivable: Receivable) -> Result<Option<Receivable>, AppError> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to open transaction: {}", e))
        })?;

        let updated = sqlx::query(
            "UPDATE receivables SET client_id = $2, project_id = $3, description = $4, \
             invoice_reference = $5, issue_date = $6, due_date = $7, received_date = $8, \
             amount_expected = $9, amount_received = $10, status = $11, blocker_reason = $12 \
             WHERE id = $1",
        )
        .bind(receivable.id)
        .bind(receivable.client_id)
        .bind(receivable.project_id)
        .bind(&receivable.description)
        .bind(&receivable.invoice_reference)
        .bind(receivable.issue_date)
        .bind(receivable.due_date)
        .bind(receivable.received_date)
        .bind(receivable.amount_expected)
        .bind(receivable.amount_received)
        .bind(receivable.status.as_str())
        .bind(&receivable.blocker_reason)
        .execute(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!(
                    "Invoice reference already in use by another receivable"
                ))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to update receivable: {}", e)),
        })?;

        if updated.rows_affected() == 0 {
            tx.rollback().await.ok();
            return Ok(None);
        }

        // The document list is replaced wholesale on every update.
        sqlx::query("DELETE FROM receivable_document_references WHERE receivable_id = $1")
            .bind(receivable.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!(
                    "Failed to clear document references: {}",
                    e
                ))
            })?;

        for reference in &receivable.document_references {
            sqlx::query(
                "INSERT INTO receivable_document_references (receivable_id, document_reference) \
                 VALUES ($1, $2)",
            )
            .bind(receivable.id)
            .bind(reference)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!(
                    "Failed to insert document reference: {}",
                    e
                ))
            })?;
        }

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit update: {}", e))
        })?;

        Ok(Some(receivable))
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM receivables WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete receivable: {}", e))
            })?;

        Ok(result.rows_affected() > 0)
    }
}
