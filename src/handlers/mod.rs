pub mod health;
pub mod receivables;
