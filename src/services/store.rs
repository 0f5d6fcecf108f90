//! Receivable persistence contract, plus the in-memory store used by tests
//! and local development.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Receivable, ReceivableStatus};

#[async_trait]
pub trait ReceivableStore: Send + Sync {
    async fn insert(&self, receivable: Receivable) -> Result<Receivable, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<Receivable>, AppError>;

    async fn list_all(&self) -> Result<Vec<Receivable>, AppError>;

    async fn list_by_status(&self, status: ReceivableStatus) -> Result<Vec<Receivable>, AppError>;

    /// `due_date < as_of AND status NOT IN excluded`.
    async fn list_overdue(
        &self,
        as_of: NaiveDate,
        excluded: &[ReceivableStatus],
    ) -> Result<Vec<Receivable>, AppError>;

    /// Records whose blocker reason is set and non-empty.
    async fn list_with_blockers(&self) -> Result<Vec<Receivable>, AppError>;

    /// Full replace of the mutable fields, id immutable. Returns `None` when
    /// the id is unknown.
    async fn update(&self, receivable: Receivable) -> Result<Option<Receivable>, AppError>;

    /// Physical removal. Returns `false` when the id is unknown.
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}

/// In-memory store backing tests and local runs without a database.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<Uuid, Receivable>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// `invoice_reference` is unique when present, matching the database
/// constraint.
fn invoice_reference_taken(
    records: &HashMap<Uuid, Receivable>,
    receivable: &Receivable,
) -> bool {
    match receivable.invoice_reference.as_deref() {
        Some(reference) => records.values().any(|other| {
            other.id != receivable.id && other.invoice_reference.as_deref() == Some(reference)
        }),
        None => false,
    }
}

fn invoice_reference_conflict() -> AppError {
    AppError::Conflict(anyhow::anyhow!(
        "Invoice reference already in use by another receivable"
    ))
}

#[async_trait]
impl ReceivableStore for MemoryStore {
    async fn insert(&self, receivable: Receivable) -> Result<Receivable, AppError> {
        let mut records = self.records.write().await;
        if invoice_reference_taken(&records, &receivable) {
            return Err(invoice_reference_conflict());
        }
        records.insert(receivable.id, receivable.clone());
        Ok(receivable)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Receivable>, AppError> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Receivable>, AppError> {
        Ok(self.records.read().await.values().cloned().collect())
    }

    async fn list_by_status(&self, status: ReceivableStatus) -> Result<Vec<Receivable>, AppError> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .filter(|r| r.status == status)
            .cloned()
            .collect())
    }

    async fn list_overdue(
        &self,
        as_of: NaiveDate,
        excluded: &[ReceivableStatus],
    ) -> Result<Vec<Receivable>, AppError> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .filter(|r| r.due_date < as_of && !excluded.contains(&r.status))
            .cloned()
            .collect())
    }

    async fn list_with_blockers(&self) -> Result<Vec<Receivable>, AppError> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .filter(|r| r.blocker_reason.as_deref().is_some_and(|b| !b.is_empty()))
            .cloned()
            .collect())
    }

    async fn update(&self, receivable: Receivable) -> Result<Option<Receivable>, AppError> {
        let mut records = self.records.write().await;
        if !records.contains_key(&receivable.id) {
            return Ok(None);
        }
        if invoice_reference_taken(&records, &receivable) {
            return Err(invoice_reference_conflict());
        }
        records.insert(receivable.id, receivable.clone());
        Ok(Some(receivable))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.records.write().await.remove(&id).is_some())
    }
}
