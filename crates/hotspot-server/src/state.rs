use std::sync::Arc;

use hotspot_analytics::Engine;
use hotspot_scheduler::Scheduler;
use hotspot_store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub engine: Arc<Engine>,
    pub scheduler: Arc<Scheduler>,
}
