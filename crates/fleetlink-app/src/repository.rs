//! Store adapters for the persistence layer

use std::path::PathBuf;
use std::sync::Arc;

use fleetlink_store::FleetStore;
use fleetlink_types::Result;

use crate::config::Config;

/// Open the fleet store configured in `config`
pub fn open_fleet_store(config: &Config) -> Result<Arc<FleetStore>> {
    let store_dir = config.store_dir()?;
    open_fleet_store_at(store_dir)
}

/// Open the fleet store at a custom directory
pub fn open_fleet_store_at(store_dir: PathBuf) -> Result<Arc<FleetStore>> {
    FleetStore::open(store_dir).map(Arc::new)
}
