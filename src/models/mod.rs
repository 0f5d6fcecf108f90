mod receivable;

pub use receivable::{
    Receivable, ReceivableInput, ReceivableStatus, StatusPatch, COLLECTIBLE_STATUSES,
    SETTLED_STATUSES,
};
