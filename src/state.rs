use crate::modules::video::repository::AssetRepository;
use crate::modules::video::storage_path::StorageLayout;
use crate::workers::scheduler::ConversionScheduler;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn AssetRepository>,
    pub scheduler: Arc<ConversionScheduler>,
    pub layout: StorageLayout,
}

impl AppState {
    pub fn new(
        repository: Arc<dyn AssetRepository>,
        scheduler: Arc<ConversionScheduler>,
        layout: StorageLayout,
    ) -> Self {
        Self {
            repository,
            scheduler,
            layout,
        }
    }
}
