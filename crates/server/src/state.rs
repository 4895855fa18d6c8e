use std::sync::Arc;

use cbs_client::CbsClient;
use db::{MemoryStore, ObjectStore, SqliteStore, StoreError};
use inventory_client::{InventoryClient, InventoryClientError};
use topology::{InventorySource, SliceManager, SliceOrchestrator, Solver};

use crate::config::{ServiceConfig, StoreConfig};

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error(transparent)]
    Inventory(#[from] InventoryClientError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Shared handles the routes work against
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<SliceOrchestrator>,
    pub slices: Arc<SliceManager>,
}

impl AppState {
    pub fn new(
        inventory: Arc<dyn InventorySource>,
        solver: Arc<dyn Solver>,
        store: Arc<dyn ObjectStore>,
        solver_address: Option<String>,
    ) -> Self {
        let mut orchestrator = SliceOrchestrator::new(inventory.clone(), solver);
        if let Some(address) = solver_address {
            orchestrator = orchestrator.with_solver_address(address);
        }
        let orchestrator = Arc::new(orchestrator);
        let slices = Arc::new(SliceManager::new(orchestrator.clone(), store, inventory));

        Self {
            orchestrator,
            slices,
        }
    }

    /// Wire up the real inventory, solver and store clients
    pub async fn from_config(config: &ServiceConfig) -> Result<Self, StateError> {
        let inventory =
            InventoryClient::with_timeout(&config.inventory_url, config.request_timeout())?;
        tracing::info!("using inventory at {}", inventory.base_url());

        let store: Arc<dyn ObjectStore> = match &config.store {
            StoreConfig::Memory => {
                tracing::info!("slices are kept in memory");
                Arc::new(MemoryStore::new())
            }
            StoreConfig::Sqlite { path } => {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() && !parent.exists() {
                        std::fs::create_dir_all(parent)?;
                    }
                }
                Arc::new(SqliteStore::connect(path).await?)
            }
        };

        Ok(Self::new(
            Arc::new(inventory),
            Arc::new(CbsClient::new()),
            store,
            config.solver_address.clone(),
        ))
    }
}
