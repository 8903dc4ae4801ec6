//! Domain layer types and invariants.

pub mod accounts;
pub mod entities;
pub mod error;
pub mod posts;
pub mod slug;
pub mod taxonomy;
pub mod visibility;
