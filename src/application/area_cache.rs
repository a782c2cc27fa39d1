use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::errors::GatewayError;
use crate::domain::order::{Area, AreaId};
use crate::domain::ports::AreaDirectory;

/// Areas of one view, fetched once when the view mounts.
pub struct AreaCache<D> {
    directory: Arc<D>,
    areas: Option<HashMap<AreaId, Area>>,
}

impl<D: AreaDirectory> AreaCache<D> {
    pub fn new(directory: Arc<D>) -> Self {
        Self {
            directory,
            areas: None,
        }
    }

    /// Fetches the areas on first use; later calls are served from memory.
    pub async fn load(&mut self) -> Result<&HashMap<AreaId, Area>, GatewayError> {
        if self.areas.is_none() {
            self.refresh().await?;
        }
        Ok(self.areas.get_or_insert_with(HashMap::new))
    }

    pub async fn refresh(&mut self) -> Result<(), GatewayError> {
        let areas = self.directory.list_areas().await?;
        log::debug!("Loaded {} areas", areas.len());
        self.areas = Some(areas.into_iter().map(|a| (a.id, a)).collect());
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.areas.is_some()
    }

    pub fn get(&self, id: AreaId) -> Option<&Area> {
        self.areas.as_ref()?.get(&id)
    }

    /// Display name, or `Area <id>` when unknown or not loaded.
    pub fn name_of(&self, id: AreaId) -> String {
        self.get(id)
            .map(|a| a.name.clone())
            .unwrap_or_else(|| format!("Area {}", id))
    }
}
