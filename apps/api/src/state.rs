use std::sync::Arc;

use crate::config::Config;
use crate::extraction::pipeline::CvProcessor;
use crate::extraction::SkillTaxonomy;
use crate::matching::{TaskMatcher, WorkloadCalculator};
use crate::store::{CandidateDirectory, DocumentStore, ProfileStore};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Loaded once at startup, read-only afterwards.
    pub taxonomy: Arc<SkillTaxonomy>,
    pub cv_processor: CvProcessor,
    pub profiles: Arc<dyn ProfileStore>,
    pub directory: Arc<dyn CandidateDirectory>,
    pub documents: Arc<dyn DocumentStore>,
    /// Pluggable matcher. Default: WeightedSkillMatcher.
    pub matcher: Arc<dyn TaskMatcher>,
    pub workload: WorkloadCalculator,
}
