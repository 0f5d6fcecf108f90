mod receivables;

pub use receivables::{ListParams, ReceivableRequest, ReceivableResponse, StatusPatchParams};
