use std::sync::Arc;

use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::handlers::HandlerRegistry;
use crate::observability::Metrics;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: HandlerRegistry,
    pub dispatcher: Dispatcher,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(config: Config, registry: HandlerRegistry) -> Self {
        let metrics = Arc::new(Metrics::new());
        let dispatcher = Dispatcher::new(registry.clone(), metrics.clone())
            .with_deadline(config.dispatch.deadline());

        Self {
            config: Arc::new(config),
            registry,
            dispatcher,
            metrics,
        }
    }
}
