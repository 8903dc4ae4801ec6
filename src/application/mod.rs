//! Application services orchestrating domain rules over the repositories.

pub mod accounts;
pub mod admin;
pub mod comments;
pub mod error;
pub mod feed;
pub mod pagination;
pub mod posts;
pub mod repos;
