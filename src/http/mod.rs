//! Admin surface & auth validator (spec.md §4.7, §6 "Admin request/response").

pub mod admin;
pub mod auth_validate;
pub mod health;
pub mod response;
pub mod stats_signals;

pub use response::ApiError;
