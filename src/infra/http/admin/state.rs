use std::sync::Arc;

use crate::application::admin::{AdminTaxonomyService, ModerationService};
use crate::application::repos::HealthRepo;

use super::super::SiteContext;

#[derive(Clone)]
pub struct AdminState {
    pub taxonomy: Arc<AdminTaxonomyService>,
    pub moderation: Arc<ModerationService>,
    pub health: Arc<dyn HealthRepo>,
    pub site: Arc<SiteContext>,
}
