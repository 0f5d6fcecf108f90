//! Business rules for the receivable lifecycle: creation defaults, status
//! transitions, aggregate sums, and the owned document-reference list.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{
    Receivable, ReceivableInput, ReceivableStatus, StatusPatch, COLLECTIBLE_STATUSES,
    SETTLED_STATUSES,
};
use crate::services::documents::DocumentStorage;
use crate::services::store::ReceivableStore;

#[derive(Clone)]
pub struct ReceivableService {
    store: Arc<dyn ReceivableStore>,
    documents: Arc<dyn DocumentStorage>,
}

impl ReceivableService {
    pub fn new(store: Arc<dyn ReceivableStore>, documents: Arc<dyn DocumentStorage>) -> Self {
        Self { store, documents }
    }

    /// Create a new receivable. Any client-supplied id is ignored; status
    /// and amount received default-fill when absent.
    pub async fn create(&self, input: ReceivableInput) -> Result<Receivable, AppError> {
        let (client_id, project_id) = required_references(&input)?;
        validate_amounts(input.amount_expected, input.amount_received)?;

        let receivable = Receivable {
            id: Uuid::new_v4(),
            client_id,
            project_id,
            description: input.description,
            invoice_reference: input.invoice_reference,
            issue_date: input.issue_date,
            due_date: input.due_date,
            received_date: input.received_date,
            amount_expected: input.amount_expected,
            amount_received: input.amount_received.unwrap_or(Decimal::ZERO),
            status: input.status.unwrap_or(ReceivableStatus::Pending),
            blocker_reason: input.blocker_reason,
            document_references: input.document_references.unwrap_or_default(),
        };

        let stored = self.store.insert(receivable).await?;
        tracing::info!(id = %stored.id, client_id = %stored.client_id, project_id = %stored.project_id, "Receivable created");
        Ok(stored)
    }

    pub async fn get(&self, id: Uuid) -> Result<Receivable, AppError> {
        self.store.get(id).await?.ok_or_else(|| not_found(id))
    }

    pub async fn list_all(&self) -> Result<Vec<Receivable>, AppError> {
        self.store.list_all().await
    }

    pub async fn list_by_status(
        &self,
        status: ReceivableStatus,
    ) -> Result<Vec<Receivable>, AppError> {
        self.store.list_by_status(status).await
    }

    /// Receivables whose due date has passed and whose stored status is not
    /// settled. The stored status and this predicate are independent: a
    /// record still marked PENDING counts as overdue once its due date is
    /// behind us.
    pub async fn list_overdue(&self) -> Result<Vec<Receivable>, AppError> {
        let today = Utc::now().date_naive();
        self.store.list_overdue(today, &SETTLED_STATUSES).await
    }

    pub async fn list_blocked(&self) -> Result<Vec<Receivable>, AppError> {
        self.store.list_with_blockers().await
    }

    /// Full replacement of every mutable field. The id is immutable and an
    /// absent amount received resets to zero.
    pub async fn update(&self, id: Uuid, input: ReceivableInput) -> Result<Receivable, AppError> {
        let existing = self.get(id).await?;
        let (client_id, project_id) = required_references(&input)?;
        validate_amounts(input.amount_expected, input.amount_received)?;

        let updated = Receivable {
            id: existing.id,
            client_id,
            project_id,
            description: input.description,
            invoice_reference: input.invoice_reference,
            issue_date: input.issue_date,
            due_date: input.due_date,
            received_date: input.received_date,
            amount_expected: input.amount_expected,
            amount_received: input.amount_received.unwrap_or(Decimal::ZERO),
            status: input.status.unwrap_or(ReceivableStatus::Pending),
            blocker_reason: input.blocker_reason,
            document_references: input.document_references.unwrap_or_default(),
        };

        let stored = self
            .store
            .update(updated)
            .await?
            .ok_or_else(|| not_found(id))?;
        tracing::info!(%id, "Receivable updated");
        Ok(stored)
    }

    /// Partial update of status, payment details, and blocker reason. No
    /// transition graph is enforced: any status may follow any other.
    pub async fn patch_status(&self, id: Uuid, patch: StatusPatch) -> Result<Receivable, AppError> {
        let mut receivable = self.get(id).await?;

        receivable.status = patch.status;

        if let Some(date) = patch.received_date {
            receivable.received_date = Some(date);
        }

        if let Some(amount) = patch.amount_received {
            if amount < Decimal::ZERO {
                return Err(AppError::BadRequest(anyhow::anyhow!(
                    "Amount received cannot be negative"
                )));
            }
            // Absolute total received to date, not an increment.
            receivable.amount_received = amount;
        }

        if let Some(reason) = patch.blocker_reason {
            // Tri-state: an omitted parameter leaves the blocker untouched,
            // a blank value clears it.
            receivable.blocker_reason = if reason.trim().is_empty() {
                None
            } else {
                Some(reason)
            };
        }

        let stored = self
            .store
            .update(receivable)
            .await?
            .ok_or_else(|| not_found(id))?;
        tracing::info!(%id, status = %stored.status, "Receivable status patched");
        Ok(stored)
    }

    /// Physical removal; no cascade checks against other services.
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if !self.store.delete(id).await? {
            return Err(not_found(id));
        }
        tracing::info!(%id, "Receivable deleted");
        Ok(())
    }

    /// Total amount still expected across collectible statuses. Per-record
    /// remainders are floored at zero so over-payments never reduce the sum.
    pub async fn total_pending_amount(&self) -> Result<Decimal, AppError> {
        let receivables = self.store.list_all().await?;
        Ok(receivables
            .iter()
            .filter(|r| COLLECTIBLE_STATUSES.contains(&r.status))
            .map(Receivable::outstanding_amount)
            .sum())
    }

    /// Total amount outstanding on overdue records, selected by the overdue
    /// query rather than the stored status.
    pub async fn total_overdue_amount(&self) -> Result<Decimal, AppError> {
        let overdue = self.list_overdue().await?;
        Ok(overdue.iter().map(Receivable::outstanding_amount).sum())
    }

    /// Store a supporting document and append its reference.
    pub async fn add_document(
        &self,
        id: Uuid,
        file_name: &str,
        data: Vec<u8>,
    ) -> Result<String, AppError> {
        let mut receivable = self.get(id).await?;

        let reference = self.documents.store(file_name, data).await?;
        receivable.document_references.push(reference.clone());

        self.store
            .update(receivable)
            .await?
            .ok_or_else(|| not_found(id))?;
        tracing::info!(%id, %reference, "Document reference added");
        Ok(reference)
    }

    /// Remove a document reference by value. Removing an absent reference is
    /// a logged no-op so clients can retry deletions safely.
    pub async fn remove_document(&self, id: Uuid, reference: &str) -> Result<(), AppError> {
        let mut receivable = self.get(id).await?;

        let before = receivable.document_references.len();
        receivable.document_references.retain(|r| r != reference);
        if receivable.document_references.len() == before {
            tracing::warn!(%id, %reference, "Document reference not present, nothing removed");
            return Ok(());
        }

        self.store
            .update(receivable)
            .await?
            .ok_or_else(|| not_found(id))?;

        // The reference is already gone from the record, so a storage-side
        // failure must not fail the request; the orphaned file is logged
        // for cleanup instead.
        if let Err(e) = self.documents.delete(reference).await {
            tracing::warn!(%id, %reference, error = %e, "Stored document could not be deleted");
        }
        tracing::info!(%id, %reference, "Document reference removed");
        Ok(())
    }

    /// Snapshot of the document reference list.
    pub async fn document_references(&self, id: Uuid) -> Result<Vec<String>, AppError> {
        Ok(self.get(id).await?.document_references)
    }
}

fn required_references(input: &ReceivableInput) -> Result<(Uuid, Uuid), AppError> {
    match (input.client_id, input.project_id) {
        (Some(client_id), Some(project_id)) => Ok((client_id, project_id)),
        _ => Err(AppError::BadRequest(anyhow::anyhow!(
            "Client ID and Project ID are required"
        ))),
    }
}

fn validate_amounts(expected: Decimal, received: Option<Decimal>) -> Result<(), AppError> {
    if expected <= Decimal::ZERO {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Amount expected must be positive"
        )));
    }
    if received.is_some_and(|amount| amount < Decimal::ZERO) {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Amount received cannot be negative"
        )));
    }
    Ok(())
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(anyhow::anyhow!("Receivable not found with ID: {}", id))
}
