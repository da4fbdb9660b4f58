use std::sync::Arc;

use crate::business_logic::aggregator::PatternAggregator;
use crate::services::upstream::UpstreamClient;

#[derive(Clone)]
pub struct AppState {
    pub upstream: Arc<UpstreamClient>,
    pub aggregator: PatternAggregator,
}
