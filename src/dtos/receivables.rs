use crate::models::{Receivable, ReceivableInput, ReceivableStatus};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Body for `POST /receivables` and `PUT /receivables/{id}`. Any
/// client-supplied id is ignored; the service generates its own.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReceivableRequest {
    pub client_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    #[validate(length(min = 1, max = 300))]
    pub description: String,
    #[validate(length(max = 100))]
    pub invoice_reference: Option<String>,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub received_date: Option<NaiveDate>,
    pub amount_expected: Decimal,
    pub amount_received: Option<Decimal>,
    pub status: Option<ReceivableStatus>,
    #[validate(length(max = 1000))]
    pub blocker_reason: Option<String>,
    #[serde(default)]
    pub document_references: Option<Vec<String>>,
}

impl From<ReceivableRequest> for ReceivableInput {
    fn from(request: ReceivableRequest) -> Self {
        ReceivableInput {
            client_id: request.client_id,
            project_id: request.project_id,
            description: request.description,
            invoice_reference: request.invoice_reference,
            issue_date: request.issue_date,
            due_date: request.due_date,
            received_date: request.received_date,
            amount_expected: request.amount_expected,
            amount_received: request.amount_received,
            status: request.status,
            blocker_reason: request.blocker_reason,
            document_references: request.document_references,
        }
    }
}

/// Wire representation of a stored receivable.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivableResponse {
    pub id: Uuid,
    pub client_id: Uuid,
    pub project_id: Uuid,
    pub description: String,
    pub invoice_reference: Option<String>,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub received_date: Option<NaiveDate>,
    pub amount_expected: Decimal,
    pub amount_received: Decimal,
    pub status: ReceivableStatus,
    pub blocker_reason: Option<String>,
    pub document_references: Vec<String>,
}

impl From<Receivable> for ReceivableResponse {
    fn from(receivable: Receivable) -> Self {
        ReceivableResponse {
            id: receivable.id,
            client_id: receivable.client_id,
            project_id: receivable.project_id,
            description: receivable.description,
            invoice_reference: receivable.invoice_reference,
            issue_date: receivable.issue_date,
            due_date: receivable.due_date,
            received_date: receivable.received_date,
            amount_expected: receivable.amount_expected,
            amount_received: receivable.amount_received,
            status: receivable.status,
            blocker_reason: receivable.blocker_reason,
            document_references: receivable.document_references,
        }
    }
}

/// Query filters for `GET /receivables`. `hasBlocker=true` takes precedence
/// over the status filter, matching the original endpoint behavior.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub status: Option<ReceivableStatus>,
    pub has_blocker: Option<bool>,
}

/// Query parameters for `PATCH /receivables/{id}/status`.
///
/// `blockerReason` carries a tri-state contract: omitting the parameter
/// leaves the stored blocker untouched, while an explicitly empty value
/// clears it. `Option<String>` preserves that distinction through the query
/// string (`blockerReason=` deserializes to `Some("")`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusPatchParams {
    pub status: ReceivableStatus,
    pub received_date: Option<NaiveDate>,
    pub amount_received: Option<Decimal>,
    pub blocker_reason: Option<String>,
}
