//! Blogicum: a server-rendered blog with categories, locations, comments and
//! author-only drafts.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
pub mod util;
