//! Application services for the administrative surface.

pub mod moderation;
pub mod taxonomy;

pub use moderation::{AdminPostFilter, ModerationError, ModerationService};
pub use taxonomy::{AdminTaxonomyError, AdminTaxonomyService};
