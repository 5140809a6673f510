pub mod base_time;

pub mod category;
pub mod comment;
pub mod issue;
pub mod location;
pub mod user;
pub mod vote;
