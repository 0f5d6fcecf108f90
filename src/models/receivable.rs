//! Receivable domain model.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of an account receivable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReceivableStatus {
    /// Invoice issued, waiting for payment.
    Pending,
    /// Full payment received.
    Received,
    /// Partial payment received.
    PartiallyReceived,
    /// Past due date, not fully paid.
    Overdue,
    /// Client is disputing the charge.
    InDispute,
    /// Deemed uncollectible.
    WrittenOff,
    /// Invoice canceled before payment.
    Canceled,
}

impl ReceivableStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReceivableStatus::Pending => "PENDING",
            ReceivableStatus::Received => "RECEIVED",
            ReceivableStatus::PartiallyReceived => "PARTIALLY_RECEIVED",
            ReceivableStatus::Overdue => "OVERDUE",
            ReceivableStatus::InDispute => "IN_DISPUTE",
            ReceivableStatus::WrittenOff => "WRITTEN_OFF",
            ReceivableStatus::Canceled => "CANCELED",
        }
    }
}

impl std::str::FromStr for ReceivableStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(ReceivableStatus::Pending),
            "RECEIVED" => Ok(ReceivableStatus::Received),
            "PARTIALLY_RECEIVED" => Ok(ReceivableStatus::PartiallyReceived),
            "OVERDUE" => Ok(ReceivableStatus::Overdue),
            "IN_DISPUTE" => Ok(ReceivableStatus::InDispute),
            "WRITTEN_OFF" => Ok(ReceivableStatus::WrittenOff),
            "CANCELED" => Ok(ReceivableStatus::Canceled),
            other => Err(format!("unknown receivable status: {}", other)),
        }
    }
}

impl std::fmt::Display for ReceivableStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statuses that still expect money to arrive; these feed the pending-amount
/// summary.
pub const COLLECTIBLE_STATUSES: [ReceivableStatus; 4] = [
    ReceivableStatus::Pending,
    ReceivableStatus::Overdue,
    ReceivableStatus::PartiallyReceived,
    ReceivableStatus::InDispute,
];

/// Settled/terminal statuses excluded from the overdue computation. A record
/// in any other status with a past due date counts as overdue no matter what
/// its stored status says.
pub const SETTLED_STATUSES: [ReceivableStatus; 3] = [
    ReceivableStatus::Received,
    ReceivableStatus::WrittenOff,
    ReceivableStatus::Canceled,
];

/// An account receivable: an amount owed by a client for a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receivable {
    pub id: Uuid,
    pub client_id: Uuid,
    pub project_id: Uuid,
    pub description: String,
    /// Invoice number sent to the client, unique when present.
    pub invoice_reference: Option<String>,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    /// Set once payment is recorded, never cleared by a patch.
    pub received_date: Option<NaiveDate>,
    pub amount_expected: Decimal,
    /// Cumulative total received to date, not a delta.
    pub amount_received: Decimal,
    pub status: ReceivableStatus,
    /// Why payment is stalled; presence drives the blocked-receivables query.
    pub blocker_reason: Option<String>,
    /// Opaque references to supporting documents held by the document
    /// storage service.
    pub document_references: Vec<String>,
}

impl Receivable {
    /// Amount still outstanding, floored at zero so over-payment never
    /// yields a negative remainder.
    pub fn outstanding_amount(&self) -> Decimal {
        (self.amount_expected - self.amount_received).max(Decimal::ZERO)
    }
}

/// Input for creating or fully replacing a receivable. The client and project
/// references stay optional here so the service layer can reject their
/// absence explicitly instead of failing at deserialization.
#[derive(Debug, Clone)]
pub struct ReceivableInput {
    pub client_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub description: String,
    pub invoice_reference: Option<String>,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub received_date: Option<NaiveDate>,
    pub amount_expected: Decimal,
    pub amount_received: Option<Decimal>,
    pub status: Option<ReceivableStatus>,
    pub blocker_reason: Option<String>,
    pub document_references: Option<Vec<String>>,
}

/// Partial status update. `received_date` and `amount_received` are applied
/// only when supplied; `amount_received` is an absolute total. The blocker
/// reason is tri-state: `None` leaves the stored value untouched, a blank
/// string clears it, anything else replaces it.
#[derive(Debug, Clone)]
pub struct StatusPatch {
    pub status: ReceivableStatus,
    pub received_date: Option<NaiveDate>,
    pub amount_received: Option<Decimal>,
    pub blocker_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(expected: Decimal, received: Decimal) -> Receivable {
        Receivable {
            id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            description: "Invoice #INV-123 - Phase 1 Payment".to_string(),
            invoice_reference: None,
            issue_date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2024, 2, 10).unwrap(),
            received_date: None,
            amount_expected: expected,
            amount_received: received,
            status: ReceivableStatus::Pending,
            blocker_reason: None,
            document_references: Vec::new(),
        }
    }

    #[test]
    fn outstanding_amount_is_expected_minus_received() {
        let r = sample(Decimal::new(5000_00, 2), Decimal::new(2500_00, 2));
        assert_eq!(r.outstanding_amount(), Decimal::new(2500_00, 2));
    }

    #[test]
    fn outstanding_amount_floors_overpayment_at_zero() {
        let r = sample(Decimal::new(100_00, 2), Decimal::new(150_00, 2));
        assert_eq!(r.outstanding_amount(), Decimal::ZERO);
    }

    #[test]
    fn status_round_trips_through_text() {
        for status in [
            ReceivableStatus::Pending,
            ReceivableStatus::Received,
            ReceivableStatus::PartiallyReceived,
            ReceivableStatus::Overdue,
            ReceivableStatus::InDispute,
            ReceivableStatus::WrittenOff,
            ReceivableStatus::Canceled,
        ] {
            assert_eq!(status.as_str().parse::<ReceivableStatus>(), Ok(status));
        }
        assert!("SETTLED".parse::<ReceivableStatus>().is_err());
    }
}
