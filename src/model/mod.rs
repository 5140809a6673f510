pub mod auth;
pub mod comment;
pub mod common;
pub mod dashboard;
pub mod global_error;
pub mod issue;
pub mod taxonomy;
pub mod vote;

pub use auth::{Actor, Claims};
pub use global_error::{AppError, ErrorCode, ErrorKind, ValidationFieldError};
