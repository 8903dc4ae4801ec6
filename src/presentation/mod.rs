//! Askama view models and templates for the public and admin listeners.

pub mod admin;
pub mod views;
