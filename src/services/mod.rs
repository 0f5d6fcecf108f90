pub mod auth_client;
pub mod database;
pub mod documents;
pub mod jwt;
pub mod policy;
pub mod receivable;
pub mod store;
