pub mod comment;
pub mod dashboard;
pub mod issue;
pub mod tree;
pub mod vote;
